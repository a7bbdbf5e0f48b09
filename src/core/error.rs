//! Error types.
//!
//! [`ConfigError`] is returned while a scene is being built: the entity that
//! failed to resolve is not created. [`RuntimeError`] describes failures that
//! happen while the scene is live; these are recovered at the trigger,
//! action and dispatch boundaries, logged, and never returned from
//! `try_fire`, `raise` or `execute`.

use thiserror::Error;

use super::entity::EntityId;
use super::payload::PayloadKind;

/// A trigger, listener or channel configuration that cannot be resolved.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown condition kind `{0}`")]
    UnknownConditionKind(String),

    #[error("unknown action kind `{0}`")]
    UnknownActionKind(String),

    #[error("unknown event channel `{0}`")]
    UnknownChannel(String),

    #[error("event channel `{0}` is already defined")]
    DuplicateChannel(String),

    #[error("no entity named `{0}`")]
    UnknownEntity(String),

    #[error("trigger id {0} is already in use")]
    DuplicateTrigger(u32),

    #[error("channel `{channel}` carries {expected} payloads, action raises {found}")]
    PayloadMismatch {
        channel: String,
        expected: PayloadKind,
        found: PayloadKind,
    },

    #[error("invalid parameter `{param}` for `{kind}`: {reason}")]
    InvalidParameter {
        kind: String,
        param: String,
        reason: String,
    },

    #[error("`{field}` must be non-negative, got {value}")]
    NegativeDuration { field: String, value: f32 },
}

/// A failure while the scene is running.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("condition `{condition}` failed to evaluate: {reason}")]
    Evaluation { condition: String, reason: String },

    #[error("action `{action}` failed: {reason}")]
    Execution { action: String, reason: String },

    #[error("handler panicked: {0}")]
    HandlerPanic(String),

    #[error("dispatch depth limit {limit} exceeded while raising `{channel}`")]
    DepthExceeded { channel: String, limit: usize },

    #[error("listener `{0}` received an event raised while replaying its deferred events")]
    ListenerReentered(String),

    #[error("{0} does not exist")]
    MissingEntity(EntityId),

    #[error("action target could not be resolved from the context")]
    UnresolvedTarget,

    #[error("prefab `{0}` is not registered")]
    UnknownPrefab(String),

    #[error("{0}")]
    Custom(String),
}

impl RuntimeError {
    /// Convert a caught panic payload into an error.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::HandlerPanic(message)
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
