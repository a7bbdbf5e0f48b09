//! Triggers: condition-guarded action lists.
//!
//! A [`Trigger`] is offered stimuli through [`Trigger::try_fire`]. It fires
//! when it is idle, has not been consumed, accepts the stimulus kind, and its
//! enabled conditions are satisfied (AND by default, OR with
//! [`Trigger::require_any`]). Firing executes every action in order and
//! starts the cooldown, which [`Trigger::tick`] counts down.
//!
//! ## Example Usage
//!
//! ```
//! use rust_triggers::actions::{ActionKind, Target};
//! use rust_triggers::conditions::ConditionKind;
//! use rust_triggers::core::{StimulusKind, Vec3, World};
//! use rust_triggers::triggers::{FireOutcome, RejectReason, Trigger, TriggerId};
//!
//! let mut world = World::new(42);
//! let player = world.spawn("Hero", "Player");
//! let ctx = world.context_for(player, StimulusKind::Enter);
//! let world = world.into_handle();
//!
//! let mut pad = Trigger::new(TriggerId::new(1), "Jump pad")
//!     .with_condition(ConditionKind::TagEquals("Player".into()))
//!     .with_cooldown(1.0)
//!     .with_action(ActionKind::move_to(Target::Actor, Vec3::new(0.0, 5.0, 0.0), 0.0));
//!
//! assert_eq!(pad.try_fire(&ctx, &world), FireOutcome::Fired);
//! assert_eq!(pad.try_fire(&ctx, &world), FireOutcome::Rejected(RejectReason::CoolingDown));
//!
//! pad.tick(1.0, &world);
//! assert_eq!(pad.try_fire(&ctx, &world), FireOutcome::Fired);
//! ```

mod registry;
mod trigger;

pub use registry::TriggerRegistry;
pub use trigger::{FireOutcome, RejectReason, Trigger, TriggerId, TriggerState};
