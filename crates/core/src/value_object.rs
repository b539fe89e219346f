//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**: two `Money`
/// amounts of 1250 cents are the same amount, wherever they came from. To
/// "modify" one, build a new value.
///
/// ```ignore
/// let a = Money::from_cents(1250);
/// let b = Money::from_cents(1000) + Money::from_cents(250);
/// assert_eq!(a, b);
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
