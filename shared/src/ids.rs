//! Player identity.

use serde::{Deserialize, Serialize};
use std::num::NonZeroU64;

/// Handle allocated monotonically by the server; never reused.
///
/// Zero is reserved as the "empty slot" sentinel for [`crate::collections::PlayerMap`]
/// and is therefore not a representable `PlayerId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(NonZeroU64);

impl PlayerId {
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(PlayerId)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for PlayerId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.get().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = u64::deserialize(deserializer)?;
        NonZeroU64::new(raw)
            .map(PlayerId)
            .ok_or_else(|| serde::de::Error::custom("PlayerId must be non-zero"))
    }
}

/// Monotonic allocator for `PlayerId`s. Lives on the server; ids are never reused.
#[derive(Debug, Default)]
pub struct PlayerIdAllocator {
    next: u64,
}

impl PlayerIdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn allocate(&mut self) -> PlayerId {
        let id = PlayerId::new(self.next).expect("allocator never produces zero");
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_a_valid_player_id() {
        assert!(PlayerId::new(0).is_none());
    }

    #[test]
    fn allocator_never_reuses_ids() {
        let mut alloc = PlayerIdAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        assert_ne!(a, b);
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);
    }

    #[test]
    fn roundtrips_through_bincode() {
        let id = PlayerId::new(42).unwrap();
        let bytes = bincode::serialize(&id).unwrap();
        let decoded: PlayerId = bincode::deserialize(&bytes).unwrap();
        assert_eq!(id, decoded);
    }
}
