//! Serializable scene configuration.
//!
//! These types are the boundary with the authoring layer. They carry names
//! and parameters only; [`super::BuildContext`] resolves them into live
//! channels, triggers and listeners.

use serde::{Deserialize, Serialize};

use crate::actions::{ActivationMode, Easing, Reentry, Target};
use crate::conditions::DistanceMode;
use crate::core::{EntityId, Payload, PayloadKind, Prefab, StimulusKind, Vec3};

use super::params::Params;

fn default_true() -> bool {
    true
}

fn default_volume() -> f32 {
    1.0
}

/// Everything one scene defines.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub channels: Vec<ChannelConfig>,
    pub prefabs: Vec<Prefab>,
    pub triggers: Vec<TriggerConfig>,
    pub listeners: Vec<ListenerConfig>,
}

/// A named event channel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Payload kind the channel accepts.
    #[serde(default)]
    pub payload: PayloadKind,
}

impl ChannelConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the payload kind (builder pattern).
    #[must_use]
    pub fn with_payload(mut self, payload: PayloadKind) -> Self {
        self.payload = payload;
        self
    }
}

/// A trigger definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Explicit id; 0 lets the runtime allocate one.
    #[serde(default)]
    pub id: u32,
    pub name: String,
    /// Name of the owning object in the world.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub conditions: Vec<ConditionConfig>,
    #[serde(default = "default_true")]
    pub require_all: bool,
    #[serde(default = "default_true")]
    pub can_repeat: bool,
    #[serde(default)]
    pub cooldown: f32,
    #[serde(default)]
    pub actions: Vec<ActionConfig>,
    /// Accepted stimulus kinds; empty accepts all.
    #[serde(default)]
    pub responds_to: Vec<StimulusKind>,
    #[serde(default)]
    pub debug: bool,
}

impl TriggerConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            source: None,
            conditions: Vec::new(),
            require_all: true,
            can_repeat: true,
            cooldown: 0.0,
            actions: Vec::new(),
            responds_to: Vec::new(),
            debug: false,
        }
    }
}

/// A condition and its envelope flags.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionConfig {
    #[serde(flatten)]
    pub spec: ConditionSpec,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub invert: bool,
}

impl From<ConditionSpec> for ConditionConfig {
    fn from(spec: ConditionSpec) -> Self {
        Self {
            spec,
            name: None,
            enabled: true,
            invert: false,
        }
    }
}

/// Condition kinds, tagged by `kind`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConditionSpec {
    Always,
    Never,
    TagEquals {
        tag: String,
    },
    TagIn {
        tags: Vec<String>,
    },
    ActorIs {
        entity: EntityId,
    },
    Layer {
        layers: Vec<u8>,
    },
    Distance {
        #[serde(default)]
        mode: DistanceMode,
        threshold: f32,
        #[serde(default)]
        from: Option<Vec3>,
    },
    Stimulus {
        stimulus: StimulusKind,
    },
    FirstContact,
    All {
        conditions: Vec<ConditionConfig>,
    },
    Any {
        conditions: Vec<ConditionConfig>,
    },
    /// A kind registered in [`super::KindRegistry`].
    Custom {
        name: String,
        #[serde(default)]
        params: Params,
    },
}

/// An action, its delay and re-entry policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionConfig {
    #[serde(flatten)]
    pub spec: ActionSpec,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub delay: f32,
    #[serde(default)]
    pub reentry: Reentry,
}

impl ActionConfig {
    /// Set the delay (builder pattern).
    #[must_use]
    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }
}

impl From<ActionSpec> for ActionConfig {
    fn from(spec: ActionSpec) -> Self {
        Self {
            spec,
            name: None,
            delay: 0.0,
            reentry: Reentry::Restart,
        }
    }
}

/// Parameters shared by move, rotate and scale.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TweenConfig {
    #[serde(default)]
    pub target: Target,
    pub to: Vec3,
    #[serde(default)]
    pub relative: bool,
    #[serde(default)]
    pub duration: f32,
    #[serde(default)]
    pub easing: Easing,
}

/// Action kinds, tagged by `kind`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionSpec {
    Move(TweenConfig),
    Rotate(TweenConfig),
    Scale(TweenConfig),
    SetMaterial {
        #[serde(default)]
        target: Target,
        param: String,
        to: f32,
        #[serde(default)]
        duration: f32,
        #[serde(default)]
        easing: Easing,
    },
    SetActive {
        #[serde(default)]
        target: Target,
        #[serde(default)]
        mode: ActivationMode,
    },
    PlayAudio {
        clips: Vec<String>,
        #[serde(default = "default_volume")]
        volume: f32,
        #[serde(default)]
        pitch_jitter: f32,
        #[serde(default)]
        target: Option<Target>,
    },
    RaiseEvents {
        channels: Vec<String>,
        #[serde(default)]
        payload: Payload,
        #[serde(default)]
        forward_actor: bool,
    },
    Spawn {
        prefab: String,
        #[serde(default)]
        at: Option<Target>,
        #[serde(default)]
        offset: Vec3,
    },
    Destroy {
        #[serde(default)]
        target: Target,
    },
    Log {
        message: String,
    },
    Sequence {
        steps: Vec<ActionConfig>,
    },
    /// A kind registered in [`super::KindRegistry`].
    Custom {
        name: String,
        #[serde(default)]
        params: Params,
    },
}

/// A listener bound to a configured channel by name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListenerConfig {
    pub name: String,
    pub channel: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub actions: Vec<ActionConfig>,
}
