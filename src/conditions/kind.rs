//! Built-in condition kinds and the extension trait.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::core::{Context, EntityId, RuntimeResult, StimulusKind, Vec3};

use super::condition::Condition;

/// A set of layers, one bit per layer (0..32).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// A mask matching nothing.
    pub const NONE: Self = Self(0);
    /// A mask matching every layer.
    pub const ALL: Self = Self(u32::MAX);

    /// A mask with the given layers set. Layers above 31 are ignored.
    #[must_use]
    pub fn of(layers: &[u8]) -> Self {
        layers.iter().fold(Self::NONE, |mask, &layer| mask.with(layer))
    }

    /// Add a layer (builder pattern).
    #[must_use]
    pub fn with(self, layer: u8) -> Self {
        if layer < 32 {
            Self(self.0 | (1 << layer))
        } else {
            self
        }
    }

    /// Check whether a layer is in the mask.
    #[must_use]
    pub fn contains(self, layer: u8) -> bool {
        layer < 32 && self.0 & (1 << layer) != 0
    }
}

/// How a distance condition compares against its threshold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMode {
    /// Actor is at most `threshold` away.
    #[default]
    Within,
    /// Actor is more than `threshold` away.
    Beyond,
}

/// A condition kind supplied by downstream code.
///
/// Register a factory for it in [`crate::setup::KindRegistry`] to make it
/// available to configuration.
pub trait ConditionCheck {
    /// Kind name, used in logs and diagnostics.
    fn kind(&self) -> &str;

    /// Compute the raw predicate. Errors are treated as `false` by the caller.
    fn check(&mut self, ctx: &Context) -> RuntimeResult<bool>;

    /// Called when the owning trigger fires with `ctx`. Checks that
    /// remember what they have seen record it here, so a rejected fire
    /// leaves them unchanged.
    fn on_fire(&mut self, _ctx: &Context) {}

    /// Clear accumulated state. Stateless checks keep the default.
    fn reset(&mut self) {}
}

/// What a condition tests.
pub enum ConditionKind {
    /// Always true.
    Always,

    /// Always false.
    Never,

    /// Actor tag equals the value.
    TagEquals(String),

    /// Actor tag is one of the values.
    TagIn(Vec<String>),

    /// Actor is a specific entity.
    ActorIs(EntityId),

    /// Actor layer is in the mask.
    Layer(LayerMask),

    /// Distance from the actor to `from` (or the context origin when `None`)
    /// compared against `threshold`.
    Distance {
        mode: DistanceMode,
        threshold: f32,
        from: Option<Vec3>,
    },

    /// The stimulus is of a given kind.
    Stimulus(StimulusKind),

    /// True until the owning trigger has fired for the actor, false
    /// afterwards, until reset.
    FirstContact { seen: FxHashSet<EntityId> },

    /// Every nested condition passes. Empty is true.
    All(Vec<Condition>),

    /// At least one nested condition passes. Empty is false.
    Any(Vec<Condition>),

    /// Downstream-defined check.
    Custom(Box<dyn ConditionCheck>),
}

impl ConditionKind {
    /// A fresh first-contact condition.
    #[must_use]
    pub fn first_contact() -> Self {
        Self::FirstContact {
            seen: FxHashSet::default(),
        }
    }

    /// A within-distance condition measured from the context origin.
    #[must_use]
    pub fn within(threshold: f32) -> Self {
        Self::Distance {
            mode: DistanceMode::Within,
            threshold,
            from: None,
        }
    }

    /// Short kind name for logs.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Always => "always",
            Self::Never => "never",
            Self::TagEquals(_) => "tag_equals",
            Self::TagIn(_) => "tag_in",
            Self::ActorIs(_) => "actor_is",
            Self::Layer(_) => "layer",
            Self::Distance { .. } => "distance",
            Self::Stimulus(_) => "stimulus",
            Self::FirstContact { .. } => "first_contact",
            Self::All(_) => "all",
            Self::Any(_) => "any",
            Self::Custom(check) => check.kind(),
        }
    }

    /// Compute the raw predicate, before `enabled` and `invert` apply.
    ///
    /// Missing context data (no tag, layer or position) yields `false`.
    pub(crate) fn raw(&mut self, ctx: &Context) -> RuntimeResult<bool> {
        let result = match self {
            Self::Always => true,
            Self::Never => false,
            Self::TagEquals(tag) => ctx.has_tag(tag),
            Self::TagIn(tags) => ctx
                .tag
                .as_deref()
                .is_some_and(|tag| tags.iter().any(|t| t == tag)),
            Self::ActorIs(entity) => ctx.actor == Some(*entity),
            Self::Layer(mask) => ctx.layer.is_some_and(|layer| mask.contains(layer)),
            Self::Distance {
                mode,
                threshold,
                from,
            } => match (ctx.position, from.or(ctx.origin)) {
                (Some(position), Some(origin)) => {
                    let distance = position.distance(origin);
                    match mode {
                        DistanceMode::Within => distance <= *threshold,
                        DistanceMode::Beyond => distance > *threshold,
                    }
                }
                _ => false,
            },
            Self::Stimulus(kind) => ctx.stimulus == *kind,
            Self::FirstContact { seen } => ctx.actor.is_some_and(|actor| !seen.contains(&actor)),
            Self::All(conditions) => conditions.iter_mut().all(|c| c.evaluate(ctx)),
            Self::Any(conditions) => conditions.iter_mut().any(|c| c.evaluate(ctx)),
            Self::Custom(check) => return check.check(ctx),
        };
        Ok(result)
    }

    /// Record what a fire with `ctx` should be remembered by.
    pub(crate) fn commit(&mut self, ctx: &Context) {
        match self {
            Self::FirstContact { seen } => {
                if let Some(actor) = ctx.actor {
                    seen.insert(actor);
                }
            }
            Self::All(conditions) | Self::Any(conditions) => {
                conditions.iter_mut().for_each(|c| c.commit(ctx));
            }
            Self::Custom(check) => check.on_fire(ctx),
            _ => {}
        }
    }

    pub(crate) fn reset(&mut self) {
        match self {
            Self::FirstContact { seen } => seen.clear(),
            Self::All(conditions) | Self::Any(conditions) => {
                conditions.iter_mut().for_each(Condition::reset);
            }
            Self::Custom(check) => check.reset(),
            _ => {}
        }
    }
}

impl std::fmt::Debug for ConditionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Always => f.write_str("Always"),
            Self::Never => f.write_str("Never"),
            Self::TagEquals(tag) => f.debug_tuple("TagEquals").field(tag).finish(),
            Self::TagIn(tags) => f.debug_tuple("TagIn").field(tags).finish(),
            Self::ActorIs(id) => f.debug_tuple("ActorIs").field(id).finish(),
            Self::Layer(mask) => f.debug_tuple("Layer").field(mask).finish(),
            Self::Distance {
                mode,
                threshold,
                from,
            } => f
                .debug_struct("Distance")
                .field("mode", mode)
                .field("threshold", threshold)
                .field("from", from)
                .finish(),
            Self::Stimulus(kind) => f.debug_tuple("Stimulus").field(kind).finish(),
            Self::FirstContact { seen } => f.debug_struct("FirstContact").field("seen", &seen.len()).finish(),
            Self::All(conditions) => f.debug_tuple("All").field(conditions).finish(),
            Self::Any(conditions) => f.debug_tuple("Any").field(conditions).finish(),
            Self::Custom(check) => f.debug_tuple("Custom").field(&check.kind()).finish(),
        }
    }
}
