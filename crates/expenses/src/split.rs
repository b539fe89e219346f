//! Split strategies: turn a total and a participant list into per-user obligations.
//!
//! Every strategy upholds the same conservation invariant: the owed amounts sum
//! to the total, to the cent. A rounding residual is always pushed onto the
//! first participant in input order, never spread across participants.

use serde::{Deserialize, Serialize};

use splitledger_core::{DomainError, DomainResult, Money, Percentage, UserId};

use crate::expense::{SplitMethod, SplitShare};

/// A resolved participant as supplied by the caller.
///
/// `percentage` is only read by [`PercentageSplit`], `amount_owed` only by
/// [`ManualSplit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantShare {
    pub user_id: UserId,
    pub amount_paid: Money,
    pub percentage: Option<Percentage>,
    pub amount_owed: Option<Money>,
}

impl ParticipantShare {
    pub fn paying(user_id: UserId, amount_paid: Money) -> Self {
        Self {
            user_id,
            amount_paid,
            percentage: None,
            amount_owed: None,
        }
    }

    pub fn with_percentage(mut self, percentage: Percentage) -> Self {
        self.percentage = Some(percentage);
        self
    }

    pub fn with_amount_owed(mut self, amount_owed: Money) -> Self {
        self.amount_owed = Some(amount_owed);
        self
    }
}

/// A splitting policy.
pub trait SplitStrategy: Send + Sync {
    fn method(&self) -> SplitMethod;

    fn calculate(&self, total: Money, participants: &[ParticipantShare]) -> DomainResult<Vec<SplitShare>>;
}

/// Everyone owes `round2(total / n)`; the first participant absorbs the remainder.
#[derive(Debug, Default, Clone, Copy)]
pub struct EqualSplit;

/// Each participant owes `round2(total * pct / 100)`; percentages must sum to exactly 100.
#[derive(Debug, Default, Clone, Copy)]
pub struct PercentageSplit;

/// Each participant states what they owe; the stated amounts must sum to the total.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualSplit;

impl SplitMethod {
    pub fn strategy(self) -> &'static dyn SplitStrategy {
        match self {
            SplitMethod::Equal => &EqualSplit,
            SplitMethod::Percentage => &PercentageSplit,
            SplitMethod::Manual => &ManualSplit,
        }
    }
}

/// Dispatch to the strategy for `method`.
pub fn calculate_splits(
    method: SplitMethod,
    total: Money,
    participants: &[ParticipantShare],
) -> DomainResult<Vec<SplitShare>> {
    let splits = method.strategy().calculate(total, participants)?;
    tracing::trace!(method = %method, %total, participants = splits.len(), "splits calculated");
    Ok(splits)
}

impl SplitStrategy for EqualSplit {
    fn method(&self) -> SplitMethod {
        SplitMethod::Equal
    }

    fn calculate(&self, total: Money, participants: &[ParticipantShare]) -> DomainResult<Vec<SplitShare>> {
        if participants.is_empty() {
            return Err(DomainError::validation("equal split requires participants"));
        }

        let n = participants.len();
        let per_user = total.split_rounded(n)?;
        let first_share = total - per_user.times(n - 1);
        if first_share.is_negative() {
            return Err(DomainError::validation(format!(
                "equal split of {total} across {n} participants leaves a negative share ({first_share}) for the first participant"
            )));
        }

        let splits = participants
            .iter()
            .enumerate()
            .map(|(i, p)| SplitShare {
                user_id: p.user_id,
                amount_paid: p.amount_paid,
                amount_owed: if i == 0 { first_share } else { per_user },
            })
            .collect::<Vec<_>>();

        ensure_conserved(self.method(), total, &splits)?;
        Ok(splits)
    }
}

impl SplitStrategy for PercentageSplit {
    fn method(&self) -> SplitMethod {
        SplitMethod::Percentage
    }

    fn calculate(&self, total: Money, participants: &[ParticipantShare]) -> DomainResult<Vec<SplitShare>> {
        if participants.is_empty() {
            return Err(DomainError::validation("percentage split requires percentages"));
        }

        let percentages = participants
            .iter()
            .map(|p| {
                p.percentage.ok_or_else(|| {
                    DomainError::validation(format!(
                        "percentage split requires a percentage for user {}",
                        p.user_id
                    ))
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;

        let total_percentage: Percentage = percentages.iter().copied().sum();
        if total_percentage != Percentage::HUNDRED {
            return Err(DomainError::validation(format!(
                "percentage split total must be 100% (got {total_percentage})"
            )));
        }

        let mut splits = participants
            .iter()
            .zip(&percentages)
            .map(|(p, pct)| SplitShare {
                user_id: p.user_id,
                amount_paid: p.amount_paid,
                amount_owed: total.percent(*pct),
            })
            .collect::<Vec<_>>();

        let residual = total - checked_total(&splits, |s| s.amount_owed)?;
        if !residual.is_zero() {
            let first = &mut splits[0];
            first.amount_owed += residual;
            if first.amount_owed.is_negative() {
                return Err(DomainError::validation(format!(
                    "rounding residual {residual} cannot be absorbed by the first participant (user {})",
                    first.user_id
                )));
            }
        }

        ensure_conserved(self.method(), total, &splits)?;
        Ok(splits)
    }
}

impl SplitStrategy for ManualSplit {
    fn method(&self) -> SplitMethod {
        SplitMethod::Manual
    }

    fn calculate(&self, total: Money, participants: &[ParticipantShare]) -> DomainResult<Vec<SplitShare>> {
        if participants.is_empty() {
            return Err(DomainError::validation("manual split requires manual amounts"));
        }

        let splits = participants
            .iter()
            .map(|p| {
                let owed = p.amount_owed.ok_or_else(|| {
                    DomainError::validation(format!(
                        "manual split requires an amount owed for user {}",
                        p.user_id
                    ))
                })?;
                Ok(SplitShare {
                    user_id: p.user_id,
                    amount_paid: p.amount_paid,
                    amount_owed: owed,
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;

        let total_owed = checked_total(&splits, |s| s.amount_owed)?;
        if total_owed != total {
            return Err(DomainError::validation(format!(
                "manual split amounts ({total_owed}) must sum up to total amount ({total})"
            )));
        }

        Ok(splits)
    }
}

/// Total of one amount column, rejecting sums outside the `i64` cent range.
pub(crate) fn checked_total<F>(splits: &[SplitShare], amount: F) -> DomainResult<Money>
where
    F: Fn(&SplitShare) -> Money,
{
    Money::checked_sum(splits.iter().map(amount))
        .ok_or_else(|| DomainError::validation("split amounts overflow the supported range"))
}

fn ensure_conserved(method: SplitMethod, total: Money, splits: &[SplitShare]) -> DomainResult<()> {
    let owed = checked_total(splits, |s| s.amount_owed)?;
    if owed != total {
        return Err(DomainError::validation(format!(
            "rounding error: sum of {method} split amounts ({owed}) does not match total amount ({total})"
        )));
    }
    Ok(())
}
