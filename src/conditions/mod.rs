//! Conditions: predicates a trigger checks before firing.
//!
//! A condition is a kind (what it tests) wrapped in a shared envelope
//! (`enabled`, `invert`, diagnostics). Kinds form a closed sum type for the
//! built-in checks plus [`ConditionKind::Custom`] for downstream ones; new
//! kinds never require changes to [`crate::triggers::Trigger`].
//!
//! ## Example Usage
//!
//! ```
//! use rust_triggers::conditions::{Condition, ConditionKind, LayerMask};
//! use rust_triggers::core::{Context, EntityId, StimulusKind};
//!
//! let ctx = Context::new(StimulusKind::Enter)
//!     .with_actor(EntityId(1))
//!     .with_tag("Player")
//!     .with_layer(2);
//!
//! let mut is_player = Condition::new(ConditionKind::TagEquals("Player".into()));
//! let mut not_enemy_layer = Condition::new(ConditionKind::Layer(LayerMask::of(&[5]))).inverted();
//!
//! assert!(is_player.evaluate(&ctx));
//! assert!(not_enemy_layer.evaluate(&ctx));
//! ```

mod condition;
mod kind;

pub use condition::Condition;
pub use kind::{ConditionCheck, ConditionKind, DistanceMode, LayerMask};
