//! Entity identification.
//!
//! Every scene object a trigger can observe or an action can touch has a
//! unique `EntityId`. The runtime never interprets the value; the world
//! allocates ids in increasing order so iteration and spawning stay
//! deterministic.
//!
//! ```
//! use rust_triggers::core::EntityId;
//!
//! let door = EntityId::new(7);
//! assert_eq!(door.raw(), 7);
//! assert_eq!(door.to_string(), "Entity(7)");
//! ```

use serde::{Deserialize, Serialize};

/// Unique identifier for a scene object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Create a new entity ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The id following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_follows_raw_value() {
        assert!(EntityId::new(1) < EntityId::new(2));
        assert_eq!(EntityId::new(4).next(), EntityId::new(5));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", EntityId(42)), "Entity(42)");
    }

    #[test]
    fn test_serialization() {
        let id = EntityId(123);
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
