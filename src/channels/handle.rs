//! Channel and subscription identifiers.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an event channel, unique within the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(u64);

impl ChannelId {
    pub(crate) fn next() -> Self {
        Self(NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Channel({})", self.0)
    }
}

/// Returned by `subscribe`; pass it back to `unsubscribe`.
///
/// A handle only removes subscriptions on the channel that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    pub(crate) channel: ChannelId,
    pub(crate) slot: u64,
}

impl SubscriptionHandle {
    /// The channel this handle belongs to.
    #[must_use]
    pub fn channel(&self) -> ChannelId {
        self.channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_ids_are_unique() {
        let a = ChannelId::next();
        let b = ChannelId::next();
        assert_ne!(a, b);
        assert!(b.raw() > a.raw());
    }
}
