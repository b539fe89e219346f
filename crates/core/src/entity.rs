//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Users and persisted expenses are entities; money amounts and balance pairs
/// are value objects.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + Ord + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
