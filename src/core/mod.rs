//! Core runtime types: entities, context, payloads, time, RNG, world, errors.
//!
//! Everything here is leaf data shared by the channel, condition, action,
//! trigger and listener modules.

pub mod entity;
pub mod math;
pub mod payload;
pub mod context;
pub mod clock;
pub mod rng;
pub mod world;
pub mod config;
pub mod error;

pub use entity::EntityId;
pub use math::Vec3;
pub use payload::{Payload, PayloadKind};
pub use context::{Context, IntoContext, StimulusKind};
pub use clock::{Clock, TIME_EPSILON};
pub use rng::ScriptRng;
pub use world::{AudioCue, EntityRecord, Prefab, Transform, World, WorldHandle};
pub use config::RuntimeConfig;
pub use error::{ConfigError, RuntimeError, RuntimeResult};
