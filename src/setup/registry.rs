//! Factories for downstream condition and action kinds.
//!
//! Built-in kinds are variants of [`crate::setup::ConditionSpec`] and
//! [`crate::setup::ActionSpec`]. A `custom` entry names a factory
//! registered here; the factory turns its parameters into a
//! [`ConditionCheck`] or [`ActionEffect`].

use rustc_hash::FxHashMap;

use crate::actions::ActionEffect;
use crate::channels::ChannelRegistry;
use crate::conditions::ConditionCheck;
use crate::core::ConfigError;

use super::params::Params;

/// Builds a custom condition from its parameters.
pub type ConditionFactory = Box<dyn Fn(&Params) -> Result<Box<dyn ConditionCheck>, ConfigError>>;

/// Builds a custom action effect from its parameters. The session's channels
/// are available for effects that raise events.
pub type ActionFactory = Box<dyn Fn(&Params, &ChannelRegistry) -> Result<Box<dyn ActionEffect>, ConfigError>>;

/// Name-keyed table of custom kind factories.
#[derive(Default)]
pub struct KindRegistry {
    conditions: FxHashMap<String, ConditionFactory>,
    actions: FxHashMap<String, ActionFactory>,
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a condition factory, replacing any with the same name.
    pub fn register_condition<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Params) -> Result<Box<dyn ConditionCheck>, ConfigError> + 'static,
    {
        self.conditions.insert(name.into(), Box::new(factory));
    }

    /// Register an action factory, replacing any with the same name.
    pub fn register_action<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Params, &ChannelRegistry) -> Result<Box<dyn ActionEffect>, ConfigError> + 'static,
    {
        self.actions.insert(name.into(), Box::new(factory));
    }

    /// Register a condition factory (builder pattern).
    #[must_use]
    pub fn with_condition<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&Params) -> Result<Box<dyn ConditionCheck>, ConfigError> + 'static,
    {
        self.register_condition(name, factory);
        self
    }

    /// Register an action factory (builder pattern).
    #[must_use]
    pub fn with_action<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&Params, &ChannelRegistry) -> Result<Box<dyn ActionEffect>, ConfigError> + 'static,
    {
        self.register_action(name, factory);
        self
    }

    #[must_use]
    pub fn has_condition(&self, name: &str) -> bool {
        self.conditions.contains_key(name)
    }

    #[must_use]
    pub fn has_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Build a custom condition, or `UnknownConditionKind`.
    pub fn create_condition(&self, name: &str, params: &Params) -> Result<Box<dyn ConditionCheck>, ConfigError> {
        let factory = self
            .conditions
            .get(name)
            .ok_or_else(|| ConfigError::UnknownConditionKind(name.to_string()))?;
        factory(params)
    }

    /// Build a custom action effect, or `UnknownActionKind`.
    pub fn create_action(
        &self,
        name: &str,
        params: &Params,
        channels: &ChannelRegistry,
    ) -> Result<Box<dyn ActionEffect>, ConfigError> {
        let factory = self
            .actions
            .get(name)
            .ok_or_else(|| ConfigError::UnknownActionKind(name.to_string()))?;
        factory(params, channels)
    }
}

impl std::fmt::Debug for KindRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut conditions: Vec<_> = self.conditions.keys().collect();
        conditions.sort();
        let mut actions: Vec<_> = self.actions.keys().collect();
        actions.sort();
        f.debug_struct("KindRegistry")
            .field("conditions", &conditions)
            .field("actions", &actions)
            .finish()
    }
}
