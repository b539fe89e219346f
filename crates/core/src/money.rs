//! Fixed-point money and percentages.
//!
//! All monetary arithmetic happens on integer cents. Floating-point values only
//! exist at the boundaries (JSON payloads), where they are rounded to the
//! nearest cent with [`round2`] exactly once.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Largest accepted magnitude, in cents (10 trillion currency units).
const MAX_CENTS: i64 = 1_000_000_000_000_000;

/// Round to two decimal places, half away from zero.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Integer division rounding half away from zero.
fn div_round(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if 2 * remainder.abs() >= denominator.abs() {
        if (numerator < 0) == (denominator < 0) {
            quotient + 1
        } else {
            quotient - 1
        }
    } else {
        quotient
    }
}

/// A signed amount in the smallest currency unit (cents).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Convert a decimal amount (e.g. `33.335`) to cents, rounding half away from zero.
    pub fn from_f64(amount: f64) -> DomainResult<Self> {
        if !amount.is_finite() {
            return Err(DomainError::validation(format!(
                "amount must be a finite number, got {amount}"
            )));
        }
        let scaled = (round2(amount) * 100.0).round();
        if scaled.abs() > MAX_CENTS as f64 {
            return Err(DomainError::validation(format!(
                "amount {amount} is out of range"
            )));
        }
        Ok(Self(scaled as i64))
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Total of `amounts`, or `None` if it leaves the `i64` range.
    pub fn checked_sum<I>(amounts: I) -> Option<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts.into_iter().try_fold(Money::ZERO, Money::checked_add)
    }

    /// Divide into `parts` and round the quotient to the nearest cent.
    pub fn split_rounded(self, parts: usize) -> DomainResult<Money> {
        if parts == 0 {
            return Err(DomainError::validation("cannot divide an amount into zero parts"));
        }
        Ok(Money(div_round(self.0 as i128, parts as i128) as i64))
    }

    /// `self * pct / 100`, rounded to the nearest cent.
    pub fn percent(self, pct: Percentage) -> Money {
        let scaled = self.0 as i128 * pct.hundredths() as i128;
        Money(div_round(scaled, Percentage::SCALE as i128 * 100) as i64)
    }

    /// `self * n`, used to total `n` identical shares.
    pub fn times(self, n: usize) -> Money {
        Money(self.0 * n as i64)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

/// JSON carries decimal currency units (`12.5`), never raw cents.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Money::from_f64(raw).map_err(serde::de::Error::custom)
    }
}

/// A percentage with two decimal places of precision (`33.33%` is 3333 hundredths).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Percentage(i64);

impl ValueObject for Percentage {}

impl Percentage {
    const SCALE: i64 = 100;

    pub const HUNDRED: Percentage = Percentage(100 * Self::SCALE);

    pub const fn from_hundredths(hundredths: i64) -> Self {
        Self(hundredths)
    }

    pub const fn hundredths(self) -> i64 {
        self.0
    }

    /// Percentages are non-negative with at most two decimal places.
    ///
    /// Finer values are rejected rather than rounded, so a set of
    /// percentages that misses 100 by less than 0.01 still fails the sum check.
    pub fn from_f64(pct: f64) -> DomainResult<Self> {
        if !pct.is_finite() || pct < 0.0 {
            return Err(DomainError::validation(format!(
                "percentage must be a non-negative number, got {pct}"
            )));
        }
        let raw = pct * Self::SCALE as f64;
        let scaled = raw.round();
        if (raw - scaled).abs() > 1e-6 {
            return Err(DomainError::validation(format!(
                "percentage {pct} has more than two decimal places"
            )));
        }
        if scaled > (1000 * Self::SCALE) as f64 {
            return Err(DomainError::validation(format!("percentage {pct} is out of range")));
        }
        Ok(Self(scaled as i64))
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / Self::SCALE, self.0 % Self::SCALE)
    }
}

impl Add for Percentage {
    type Output = Percentage;

    fn add(self, rhs: Percentage) -> Percentage {
        Percentage(self.0 + rhs.0)
    }
}

impl Sum for Percentage {
    fn sum<I: Iterator<Item = Percentage>>(iter: I) -> Percentage {
        iter.fold(Percentage::default(), Add::add)
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Percentage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Percentage::from_f64(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert_eq!(round2(33.335_000_1), 33.34);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(10.0 / 3.0), 3.33);
    }

    #[test]
    fn from_f64_lands_on_the_nearest_cent() {
        assert_eq!(Money::from_f64(100.0).unwrap().cents(), 10_000);
        assert_eq!(Money::from_f64(0.1 + 0.2).unwrap().cents(), 30);
        assert_eq!(Money::from_f64(-12.004).unwrap().cents(), -1200);
    }

    #[test]
    fn from_f64_rejects_non_finite_and_huge_amounts() {
        assert!(Money::from_f64(f64::NAN).is_err());
        assert!(Money::from_f64(f64::INFINITY).is_err());
        assert!(Money::from_f64(1e20).is_err());
    }

    #[test]
    fn display_always_shows_two_decimals() {
        assert_eq!(Money::from_cents(9000).to_string(), "90.00");
        assert_eq!(Money::from_cents(-1205).to_string(), "-12.05");
        assert_eq!(Money::from_cents(7).to_string(), "0.07");
        assert_eq!(Money::from_cents(-7).to_string(), "-0.07");
    }

    #[test]
    fn split_rounded_rounds_half_away_from_zero() {
        let total = Money::from_cents(10_000);
        assert_eq!(total.split_rounded(3).unwrap().cents(), 3333);
        assert_eq!(Money::from_cents(5).split_rounded(2).unwrap().cents(), 3);
        assert_eq!(Money::from_cents(-5).split_rounded(2).unwrap().cents(), -3);
        assert!(total.split_rounded(0).is_err());
    }

    #[test]
    fn percent_rounds_per_share() {
        let total = Money::from_cents(1000);
        let third = Percentage::from_f64(33.33).unwrap();
        assert_eq!(total.percent(third).cents(), 333);
        assert_eq!(total.percent(Percentage::HUNDRED), total);
    }

    #[test]
    fn percentage_sum_is_exact() {
        let parts = [33.33, 33.33, 33.34]
            .into_iter()
            .map(|p| Percentage::from_f64(p).unwrap())
            .sum::<Percentage>();
        assert_eq!(parts, Percentage::HUNDRED);
        assert!(Percentage::from_f64(-1.0).is_err());
    }

    #[test]
    fn percentage_rejects_sub_hundredth_precision() {
        assert!(matches!(
            Percentage::from_f64(50.004),
            Err(DomainError::Validation(msg)) if msg.contains("more than two decimal places")
        ));
        assert!(Percentage::from_f64(12.3456).is_err());
        assert_eq!(Percentage::from_f64(0.07).unwrap().hundredths(), 7);
        assert_eq!(Percentage::from_f64(14.29).unwrap().hundredths(), 1429);
    }

    #[test]
    fn checked_sum_reports_overflow_instead_of_wrapping() {
        let amounts = [Money::from_cents(1250), Money::from_cents(-250), Money::from_cents(9000)];
        assert_eq!(Money::checked_sum(amounts), Some(Money::from_cents(10_000)));
        assert_eq!(Money::checked_sum([]), Some(Money::ZERO));

        let huge = std::iter::repeat(Money::from_cents(MAX_CENTS)).take(10_000);
        assert_eq!(Money::checked_sum(huge), None);
    }

    #[test]
    fn money_json_uses_decimal_units() {
        let json = serde_json::to_string(&Money::from_cents(1250)).unwrap();
        assert_eq!(json, "12.5");
        let back: Money = serde_json::from_str("33.333").unwrap();
        assert_eq!(back.cents(), 3333);
    }

    proptest! {
        #[test]
        fn cents_survive_the_decimal_boundary(cents in -1_000_000_000i64..1_000_000_000i64) {
            let money = Money::from_cents(cents);
            prop_assert_eq!(Money::from_f64(money.to_f64()).unwrap(), money);
        }
    }
}
