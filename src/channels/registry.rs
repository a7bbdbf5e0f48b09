//! Named channels created from configuration.
//!
//! Configured channels carry a [`Payload`] and declare which
//! [`PayloadKind`] they accept. Listeners and raise actions refer to them by
//! name; the registry resolves those names while the scene is built.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::core::{Clock, ConfigError, Payload, PayloadKind};

use super::channel::EventChannel;

/// A configured channel and its declared payload kind.
#[derive(Clone, Debug)]
pub struct ConfiguredChannel {
    pub channel: Rc<EventChannel<Payload>>,
    pub payload: PayloadKind,
}

/// Name-keyed storage for configured channels.
#[derive(Clone, Debug, Default)]
pub struct ChannelRegistry {
    channels: FxHashMap<String, ConfiguredChannel>,
    /// Names in definition order, for stable iteration.
    order: Vec<String>,
}

impl ChannelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a channel.
    pub fn create(
        &mut self,
        name: &str,
        description: &str,
        payload: PayloadKind,
        clock: &Clock,
        max_depth: usize,
    ) -> Result<Rc<EventChannel<Payload>>, ConfigError> {
        if self.channels.contains_key(name) {
            return Err(ConfigError::DuplicateChannel(name.to_string()));
        }
        let channel = EventChannel::new(name)
            .with_description(description)
            .with_clock(clock.clone())
            .with_max_depth(max_depth)
            .shared();
        self.insert(Rc::clone(&channel), payload)?;
        Ok(channel)
    }

    /// Register an existing channel under its own name.
    pub fn insert(&mut self, channel: Rc<EventChannel<Payload>>, payload: PayloadKind) -> Result<(), ConfigError> {
        let name = channel.name().to_string();
        if self.channels.contains_key(&name) {
            return Err(ConfigError::DuplicateChannel(name));
        }
        self.order.push(name.clone());
        self.channels.insert(name, ConfiguredChannel { channel, payload });
        Ok(())
    }

    /// Look up a channel by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rc<EventChannel<Payload>>> {
        self.channels.get(name).map(|c| &c.channel)
    }

    /// Look up a channel by name, or `UnknownChannel`.
    pub fn resolve(&self, name: &str) -> Result<&ConfiguredChannel, ConfigError> {
        self.channels
            .get(name)
            .ok_or_else(|| ConfigError::UnknownChannel(name.to_string()))
    }

    /// Look up a channel and check that it accepts `payload`.
    pub fn resolve_for(&self, name: &str, payload: &Payload) -> Result<Rc<EventChannel<Payload>>, ConfigError> {
        let configured = self.resolve(name)?;
        let found = payload.kind();
        if configured.payload != found {
            return Err(ConfigError::PayloadMismatch {
                channel: name.to_string(),
                expected: configured.payload,
                found,
            });
        }
        Ok(Rc::clone(&configured.channel))
    }

    /// Move every channel of `other` into this registry.
    pub fn merge(&mut self, mut other: ChannelRegistry) -> Result<(), ConfigError> {
        if let Some(dup) = other.order.iter().find(|n| self.channels.contains_key(*n)) {
            return Err(ConfigError::DuplicateChannel(dup.clone()));
        }
        for name in other.order.drain(..) {
            if let Some(configured) = other.channels.remove(&name) {
                self.order.push(name.clone());
                self.channels.insert(name, configured);
            }
        }
        Ok(())
    }

    /// Iterate channels in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &ConfiguredChannel> {
        self.order.iter().filter_map(|name| self.channels.get(name))
    }

    /// Reset counters on every channel.
    pub fn reset_all(&self) {
        for configured in self.channels.values() {
            configured.channel.reset();
        }
    }

    /// Number of channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::DEFAULT_MAX_DISPATCH_DEPTH;
    use crate::core::EntityId;

    fn registry_with(names: &[(&str, PayloadKind)]) -> ChannelRegistry {
        let clock = Clock::new();
        let mut registry = ChannelRegistry::new();
        for (name, kind) in names {
            registry
                .create(name, "", *kind, &clock, DEFAULT_MAX_DISPATCH_DEPTH)
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_create_and_resolve() {
        let registry = registry_with(&[("Door", PayloadKind::None), ("Score", PayloadKind::Int)]);
        assert_eq!(registry.len(), 2);
        assert!(registry.get("Door").is_some());
        assert_eq!(registry.resolve("Score").unwrap().payload, PayloadKind::Int);
        assert_eq!(
            registry.resolve("Gate").unwrap_err(),
            ConfigError::UnknownChannel("Gate".into())
        );
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = registry_with(&[("Door", PayloadKind::None)]);
        let err = registry
            .create("Door", "", PayloadKind::None, &Clock::new(), 8)
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateChannel("Door".into()));
    }

    #[test]
    fn test_resolve_for_checks_payload_kind() {
        let registry = registry_with(&[("Hit", PayloadKind::Entity)]);
        assert!(registry.resolve_for("Hit", &Payload::Entity(EntityId(1))).is_ok());
        assert_eq!(
            registry.resolve_for("Hit", &Payload::None).unwrap_err(),
            ConfigError::PayloadMismatch {
                channel: "Hit".into(),
                expected: PayloadKind::Entity,
                found: PayloadKind::None,
            }
        );
    }

    #[test]
    fn test_iteration_follows_definition_order() {
        let registry = registry_with(&[
            ("C", PayloadKind::None),
            ("A", PayloadKind::None),
            ("B", PayloadKind::None),
        ]);
        let names: Vec<_> = registry.iter().map(|c| c.channel.name().to_string()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_merge() {
        let mut a = registry_with(&[("A", PayloadKind::None)]);
        let b = registry_with(&[("B", PayloadKind::None)]);
        a.merge(b).unwrap();
        assert_eq!(a.len(), 2);

        let dup = registry_with(&[("A", PayloadKind::None)]);
        assert_eq!(a.merge(dup).unwrap_err(), ConfigError::DuplicateChannel("A".into()));
    }
}
