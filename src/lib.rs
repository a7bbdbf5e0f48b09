//! # rust-triggers
//!
//! A tick-driven runtime for gameplay scripting: triggers evaluate
//! conditions and run actions, actions raise event channels, and listeners
//! bound to channels run actions of their own.
//!
//! ## Design Principles
//!
//! 1. **Single-threaded and synchronous**: a raise delivers to every
//!    subscriber before it returns. Time only moves when the host ticks.
//!
//! 2. **Decoupled by channels**: a trigger never references its listeners.
//!    Channels hold handlers, not owners, and subscriptions end explicitly.
//!
//! 3. **Configuration over code**: scenes are serde data, resolved by a
//!    [`setup::BuildContext`] that rejects the whole scene on any error.
//!
//! ## Modules
//!
//! - `core`: entities, context, payloads, clock, RNG, world, errors
//! - `channels`: typed publish/subscribe channels and their registry
//! - `conditions`: predicates over a stimulus context
//! - `actions`: instant and gradual scene effects with delay and lifecycle
//! - `triggers`: condition-gated, cooldown-limited action runners
//! - `listeners`: channel-bound action runners
//! - `setup`: scene configuration and custom kind factories
//! - `runtime`: the host-facing tick loop and diagnostics

pub mod core;
pub mod channels;
pub mod conditions;
pub mod actions;
pub mod triggers;
pub mod listeners;
pub mod setup;
pub mod runtime;

// Re-export commonly used types
pub use crate::core::{
    Clock, ConfigError, Context, EntityId, Payload, PayloadKind, RuntimeConfig, RuntimeError, StimulusKind, Vec3,
    World, WorldHandle,
};

pub use crate::channels::{ChannelRegistry, EventChannel, RaiseOutcome, SubscriptionHandle, VoidChannel};

pub use crate::conditions::{Condition, ConditionCheck, ConditionKind};

pub use crate::actions::{Action, ActionEffect, ActionKind, ActionState, Easing, Target};

pub use crate::triggers::{FireOutcome, RejectReason, Trigger, TriggerId, TriggerRegistry, TriggerState};

pub use crate::listeners::Listener;

pub use crate::setup::{BuildContext, KindRegistry, SceneConfig};

pub use crate::runtime::{Runtime, RuntimeSnapshot};
