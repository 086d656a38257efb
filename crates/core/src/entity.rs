//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Every catalog entity carries an `active` flag that decides whether it is
/// visible through the default read surface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + Ord + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;

    /// Whether the entity is visible in default listings.
    fn is_active(&self) -> bool;
}
