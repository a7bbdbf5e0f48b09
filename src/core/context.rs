//! Stimulus context.
//!
//! A [`Context`] is the data an external stimulus hands to a trigger: who
//! caused it and where. Conditions read it, actions resolve their targets
//! from it, and listeners derive one from each channel payload they receive.

use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use super::math::Vec3;
use super::payload::Payload;

/// The kind of stimulus that produced a context.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StimulusKind {
    /// An object entered the trigger's volume.
    Enter,
    /// An object left the trigger's volume.
    Exit,
    /// An object remained inside the volume this tick.
    Stay,
    /// A proximity threshold was crossed.
    Proximity,
    /// A timer elapsed.
    Timer,
    /// Fired by hand (tests, inspector hooks).
    #[default]
    Manual,
    /// Delivered through an event channel.
    Event,
}

/// Stimulus data passed through `try_fire`, `evaluate` and `execute`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// What produced this context.
    pub stimulus: StimulusKind,

    /// The object that caused the stimulus.
    pub actor: Option<EntityId>,

    /// Tag of the actor, captured at stimulus time.
    pub tag: Option<String>,

    /// Layer of the actor, captured at stimulus time.
    pub layer: Option<u8>,

    /// Position of the actor, captured at stimulus time.
    pub position: Option<Vec3>,

    /// The object reacting to the stimulus (the trigger's owner).
    pub source: Option<EntityId>,

    /// Position of the reacting object.
    pub origin: Option<Vec3>,

    /// Payload of the channel raise that produced this context, if any.
    pub payload: Payload,
}

impl Context {
    /// Create an empty context for a stimulus kind.
    pub fn new(stimulus: StimulusKind) -> Self {
        Self {
            stimulus,
            ..Self::default()
        }
    }

    /// Set the actor (builder pattern).
    #[must_use]
    pub fn with_actor(mut self, actor: EntityId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Set the actor tag (builder pattern).
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Set the actor layer (builder pattern).
    #[must_use]
    pub fn with_layer(mut self, layer: u8) -> Self {
        self.layer = Some(layer);
        self
    }

    /// Set the actor position (builder pattern).
    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the reacting object (builder pattern).
    #[must_use]
    pub fn with_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the reacting object's position (builder pattern).
    #[must_use]
    pub fn with_origin(mut self, origin: Vec3) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Attach a payload (builder pattern).
    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Check whether the actor carries a tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag.as_deref() == Some(tag)
    }
}

/// Conversion from a channel payload to the context a listener's actions run with.
pub trait IntoContext {
    fn to_context(&self) -> Context;
}

impl IntoContext for () {
    fn to_context(&self) -> Context {
        Context::new(StimulusKind::Event)
    }
}

impl IntoContext for Context {
    fn to_context(&self) -> Context {
        self.clone()
    }
}

impl IntoContext for EntityId {
    fn to_context(&self) -> Context {
        Context::new(StimulusKind::Event).with_actor(*self)
    }
}

impl IntoContext for Payload {
    fn to_context(&self) -> Context {
        let mut ctx = Context::new(StimulusKind::Event).with_payload(self.clone());
        match self {
            Payload::Entity(id) => ctx.actor = Some(*id),
            Payload::Vector(v) => ctx.position = Some(*v),
            Payload::Text(tag) => ctx.tag = Some(tag.clone()),
            _ => {}
        }
        ctx
    }
}
