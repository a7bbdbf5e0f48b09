//! The runtime: one scene's world, clock, channels, triggers and listeners.
//!
//! The host calls [`Runtime::notify`] (or [`Runtime::stimulate`]) when an
//! object reaches a trigger, and [`Runtime::tick`] once per frame. Ticks run
//! triggers in registration order, then listeners in load order.
//!
//! ## Example Usage
//!
//! ```
//! use rust_triggers::core::StimulusKind;
//! use rust_triggers::runtime::Runtime;
//! use rust_triggers::setup::{KindRegistry, SceneConfig};
//!
//! let scene: SceneConfig = serde_json::from_str(r#"{
//!     "channels": [ { "name": "Alarm" } ],
//!     "triggers": [ {
//!         "id": 7,
//!         "name": "Tripwire",
//!         "cooldown": 1.0,
//!         "actions": [ { "kind": "raise_events", "channels": ["Alarm"] } ]
//!     } ]
//! }"#).unwrap();
//!
//! let mut runtime = Runtime::default();
//! let ids = runtime.load(&scene, &KindRegistry::new()).unwrap();
//! let thief = runtime.world().borrow_mut().spawn("Thief", "Npc");
//!
//! assert!(runtime.notify(ids[0], thief, StimulusKind::Enter).unwrap().is_fired());
//! assert!(!runtime.notify(ids[0], thief, StimulusKind::Enter).unwrap().is_fired());
//!
//! runtime.tick(1.0);
//! assert!(runtime.notify(ids[0], thief, StimulusKind::Enter).unwrap().is_fired());
//! assert_eq!(runtime.snapshot().channel("Alarm").unwrap().raised_count, 2);
//! ```

mod runner;
mod snapshot;

pub use runner::Runtime;
pub use snapshot::{ChannelSnapshot, ListenerSnapshot, RuntimeSnapshot, TriggerSnapshot};
