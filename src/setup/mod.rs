//! Configuration: serde scene data and the pipeline that builds it.
//!
//! ## Key Components
//!
//! - [`SceneConfig`] and friends: plain data, any serde format.
//! - [`KindRegistry`]: factories for `custom` condition and action kinds.
//! - [`BuildContext`]: one configuration session; resolves channel names and
//!   kinds, reporting a [`crate::core::ConfigError`] for anything it cannot
//!   resolve.
//!
//! ## Example Usage
//!
//! ```
//! use rust_triggers::core::{Clock, RuntimeConfig, World};
//! use rust_triggers::setup::{BuildContext, KindRegistry, SceneConfig};
//!
//! let scene: SceneConfig = serde_json::from_str(r#"{
//!     "channels": [ { "name": "DoorOpened" } ],
//!     "triggers": [ {
//!         "name": "Door",
//!         "can_repeat": false,
//!         "conditions": [ { "kind": "tag_equals", "tag": "Player" } ],
//!         "actions": [ { "kind": "raise_events", "channels": ["DoorOpened"] } ]
//!     } ]
//! }"#).unwrap();
//!
//! let kinds = KindRegistry::new();
//! let clock = Clock::new();
//! let world = World::with_clock(42, clock.clone()).into_handle();
//! let built = BuildContext::new(&kinds, world, clock, RuntimeConfig::default())
//!     .build_scene(&scene)
//!     .unwrap();
//!
//! assert_eq!(built.triggers.len(), 1);
//! assert!(built.channels.get("DoorOpened").is_some());
//! ```

mod builder;
mod config;
mod params;
mod registry;

pub use builder::{BuildContext, BuiltScene};
pub use config::{
    ActionConfig, ActionSpec, ChannelConfig, ConditionConfig, ConditionSpec, ListenerConfig, SceneConfig,
    TriggerConfig, TweenConfig,
};
pub use params::{ParamValue, Params};
pub use registry::{ActionFactory, ConditionFactory, KindRegistry};
