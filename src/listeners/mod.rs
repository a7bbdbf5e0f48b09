//! Listeners: run actions when a channel is raised.
//!
//! ## Example Usage
//!
//! ```
//! use std::rc::Rc;
//!
//! use rust_triggers::actions::{ActionKind, ActivationMode, Target};
//! use rust_triggers::channels::VoidChannel;
//! use rust_triggers::core::World;
//! use rust_triggers::listeners::Listener;
//!
//! let mut world = World::new(1);
//! let gate = world.spawn("Gate", "Door");
//! let world = world.into_handle();
//!
//! let opened = VoidChannel::new("GateOpened").shared();
//! let mut hide_gate = Listener::new("Hide gate", Rc::clone(&world)).with_action(ActionKind::SetActive {
//!     target: Target::Entity(gate),
//!     mode: ActivationMode::Disable,
//! });
//! hide_gate.bind(&opened);
//!
//! opened.raise_void();
//! assert!(!world.borrow().get(gate).unwrap().active);
//! ```

mod listener;

pub use listener::Listener;
