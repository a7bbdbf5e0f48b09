//! Actions: delayed, possibly gradual effects.
//!
//! An [`Action`] wraps an [`ActionKind`] with a start delay and a lifecycle
//! (`Idle → Scheduled → Executing → Idle`). Owners call
//! [`Action::execute`] to start a cycle and [`Action::tick`] every frame to
//! advance delays and interpolations. Nothing runs in the background.
//!
//! ## Example Usage
//!
//! ```
//! use rust_triggers::actions::{Action, ActionKind, ActionState, Target};
//! use rust_triggers::core::{StimulusKind, Vec3, World};
//!
//! let mut world = World::new(1);
//! let door = world.spawn("Door", "Door");
//! let ctx = world.context_for(door, StimulusKind::Manual);
//! let world = world.into_handle();
//!
//! let mut open = Action::new(ActionKind::move_to(Target::Actor, Vec3::new(0.0, 3.0, 0.0), 1.0))
//!     .with_delay(0.5);
//!
//! open.execute(&ctx, &world);
//! assert_eq!(open.state(), ActionState::Scheduled);
//!
//! open.tick(0.5, &world); // delay elapses, tween starts
//! open.tick(1.0, &world); // tween completes
//! assert_eq!(open.state(), ActionState::Idle);
//! assert_eq!(world.borrow().get(door).unwrap().transform.position, Vec3::new(0.0, 3.0, 0.0));
//! ```

mod action;
mod kind;
mod tween;

pub use action::{Action, ActionState, Reentry};
pub use kind::{ActionEffect, ActionKind, ActivationMode, EffectStatus, RaiseChannel, Target, TransformTween};
pub use tween::Easing;
