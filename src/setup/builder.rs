//! Resolving configuration into live objects.
//!
//! A [`BuildContext`] is scoped to one configuration session. It owns the
//! channels created during the session and resolves names against them, so
//! references between newly created channels, triggers and listeners never
//! go through global state. Any unresolvable reference fails the build with
//! a [`ConfigError`] and the object is not created.

use std::rc::Rc;

use smallvec::SmallVec;
use tracing::debug;

use crate::actions::{Action, ActionKind, TransformTween};
use crate::channels::{ChannelRegistry, EventChannel};
use crate::conditions::{Condition, ConditionKind, LayerMask};
use crate::core::{Clock, ConfigError, Payload, PayloadKind, RuntimeConfig, WorldHandle};
use crate::listeners::Listener;
use crate::triggers::{Trigger, TriggerId};

use super::config::{
    ActionConfig, ActionSpec, ChannelConfig, ConditionConfig, ConditionSpec, ListenerConfig, SceneConfig,
    TriggerConfig, TweenConfig,
};
use super::registry::KindRegistry;

/// Objects produced by [`BuildContext::build_scene`].
#[derive(Debug)]
pub struct BuiltScene {
    pub channels: ChannelRegistry,
    pub triggers: Vec<Trigger>,
    pub listeners: Vec<Listener<Payload>>,
}

/// One configuration session.
pub struct BuildContext<'a> {
    kinds: &'a KindRegistry,
    channels: ChannelRegistry,
    world: WorldHandle,
    clock: Clock,
    config: RuntimeConfig,
}

fn non_negative(field: &str, value: f32) -> Result<f32, ConfigError> {
    if value < 0.0 || value.is_nan() {
        Err(ConfigError::NegativeDuration {
            field: field.to_string(),
            value,
        })
    } else {
        Ok(value)
    }
}

fn invalid(kind: &str, param: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidParameter {
        kind: kind.to_string(),
        param: param.to_string(),
        reason: reason.to_string(),
    }
}

impl<'a> BuildContext<'a> {
    /// Start a session with no channels.
    pub fn new(kinds: &'a KindRegistry, world: WorldHandle, clock: Clock, config: RuntimeConfig) -> Self {
        Self {
            kinds,
            channels: ChannelRegistry::new(),
            world,
            clock,
            config,
        }
    }

    /// Resolve names against existing channels as well (builder pattern).
    #[must_use]
    pub fn with_channels(mut self, channels: ChannelRegistry) -> Self {
        self.channels = channels;
        self
    }

    /// Channels known to this session.
    #[must_use]
    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    /// End the session and take its channels.
    #[must_use]
    pub fn into_channels(self) -> ChannelRegistry {
        self.channels
    }

    /// Create a channel.
    pub fn add_channel(&mut self, config: &ChannelConfig) -> Result<Rc<EventChannel<Payload>>, ConfigError> {
        if config.name.is_empty() {
            return Err(invalid("channel", "name", "must not be empty"));
        }
        let channel = self.channels.create(
            &config.name,
            &config.description,
            config.payload,
            &self.clock,
            self.config.max_dispatch_depth,
        )?;
        debug!(channel = %config.name, payload = %config.payload, "channel created");
        Ok(channel)
    }

    /// Build a condition.
    pub fn build_condition(&self, config: &ConditionConfig) -> Result<Condition, ConfigError> {
        let kind = match &config.spec {
            ConditionSpec::Always => ConditionKind::Always,
            ConditionSpec::Never => ConditionKind::Never,
            ConditionSpec::TagEquals { tag } => ConditionKind::TagEquals(tag.clone()),
            ConditionSpec::TagIn { tags } => ConditionKind::TagIn(tags.clone()),
            ConditionSpec::ActorIs { entity } => ConditionKind::ActorIs(*entity),
            ConditionSpec::Layer { layers } => {
                if let Some(layer) = layers.iter().find(|&&l| l >= 32) {
                    return Err(invalid("layer", "layers", &format!("layer {layer} is out of range 0..32")));
                }
                ConditionKind::Layer(LayerMask::of(layers))
            }
            ConditionSpec::Distance { mode, threshold, from } => ConditionKind::Distance {
                mode: *mode,
                threshold: non_negative("threshold", *threshold)?,
                from: *from,
            },
            ConditionSpec::Stimulus { stimulus } => ConditionKind::Stimulus(*stimulus),
            ConditionSpec::FirstContact => ConditionKind::first_contact(),
            ConditionSpec::All { conditions } => ConditionKind::All(self.build_conditions(conditions)?),
            ConditionSpec::Any { conditions } => ConditionKind::Any(self.build_conditions(conditions)?),
            ConditionSpec::Custom { name, params } => ConditionKind::Custom(self.kinds.create_condition(name, params)?),
        };

        let mut condition = Condition::new(kind);
        if let Some(name) = &config.name {
            condition = condition.with_name(name.clone());
        }
        condition.set_enabled(config.enabled);
        condition.set_inverted(config.invert);
        Ok(condition)
    }

    fn build_conditions(&self, configs: &[ConditionConfig]) -> Result<Vec<Condition>, ConfigError> {
        configs.iter().map(|c| self.build_condition(c)).collect()
    }

    fn build_tween(&self, tween: &TweenConfig) -> Result<TransformTween, ConfigError> {
        Ok(TransformTween {
            target: tween.target.clone(),
            to: tween.to,
            relative: tween.relative,
            duration: non_negative("duration", tween.duration)?,
            easing: tween.easing,
        })
    }

    /// Build an action.
    pub fn build_action(&self, config: &ActionConfig) -> Result<Action, ConfigError> {
        let kind = match &config.spec {
            ActionSpec::Move(tween) => ActionKind::Move(self.build_tween(tween)?),
            ActionSpec::Rotate(tween) => ActionKind::Rotate(self.build_tween(tween)?),
            ActionSpec::Scale(tween) => ActionKind::Scale(self.build_tween(tween)?),
            ActionSpec::SetMaterial {
                target,
                param,
                to,
                duration,
                easing,
            } => {
                if param.is_empty() {
                    return Err(invalid("set_material", "param", "must not be empty"));
                }
                ActionKind::SetMaterial {
                    target: target.clone(),
                    param: param.clone(),
                    to: *to,
                    duration: non_negative("duration", *duration)?,
                    easing: *easing,
                }
            }
            ActionSpec::SetActive { target, mode } => ActionKind::SetActive {
                target: target.clone(),
                mode: *mode,
            },
            ActionSpec::PlayAudio {
                clips,
                volume,
                pitch_jitter,
                target,
            } => {
                if clips.is_empty() {
                    return Err(invalid("play_audio", "clips", "at least one clip is required"));
                }
                ActionKind::PlayAudio {
                    clips: clips.clone(),
                    volume: non_negative("volume", *volume)?,
                    pitch_jitter: non_negative("pitch_jitter", *pitch_jitter)?,
                    target: target.clone(),
                }
            }
            ActionSpec::RaiseEvents {
                channels,
                payload,
                forward_actor,
            } => ActionKind::RaiseEvents {
                channels: self.resolve_raise_targets(channels, payload, *forward_actor)?,
                payload: payload.clone(),
                forward_actor: *forward_actor,
            },
            ActionSpec::Spawn { prefab, at, offset } => ActionKind::Spawn {
                prefab: prefab.clone(),
                at: at.clone(),
                offset: *offset,
            },
            ActionSpec::Destroy { target } => ActionKind::Destroy { target: target.clone() },
            ActionSpec::Log { message } => ActionKind::Log {
                message: message.clone(),
            },
            ActionSpec::Sequence { steps } => ActionKind::Sequence(self.build_actions(steps)?),
            ActionSpec::Custom { name, params } => {
                ActionKind::Custom(self.kinds.create_action(name, params, &self.channels)?)
            }
        };

        let mut action = Action::new(kind)
            .with_delay(non_negative("delay", config.delay)?)
            .with_reentry(config.reentry);
        if let Some(name) = &config.name {
            action = action.with_name(name.clone());
        }
        Ok(action)
    }

    fn build_actions(&self, configs: &[ActionConfig]) -> Result<Vec<Action>, ConfigError> {
        configs.iter().map(|c| self.build_action(c)).collect()
    }

    fn resolve_raise_targets(
        &self,
        names: &[String],
        payload: &Payload,
        forward_actor: bool,
    ) -> Result<SmallVec<[Rc<EventChannel<Payload>>; 2]>, ConfigError> {
        let mut resolved = SmallVec::new();
        for name in names {
            let configured = self.channels.resolve(name)?;
            let accepted = configured.payload == payload.kind()
                || (forward_actor && configured.payload == PayloadKind::Entity);
            if !accepted {
                return Err(ConfigError::PayloadMismatch {
                    channel: name.clone(),
                    expected: configured.payload,
                    found: if forward_actor {
                        PayloadKind::Entity
                    } else {
                        payload.kind()
                    },
                });
            }
            resolved.push(Rc::clone(&configured.channel));
        }
        Ok(resolved)
    }

    /// Build a trigger. Id 0 is left for the runtime to allocate.
    pub fn build_trigger(&self, config: &TriggerConfig) -> Result<Trigger, ConfigError> {
        let mut trigger = Trigger::new(TriggerId::new(config.id), config.name.clone())
            .with_require_all(config.require_all)
            .with_repeat(config.can_repeat)
            .with_cooldown(non_negative("cooldown", config.cooldown)?)
            .with_debug(config.debug || self.config.debug);

        if let Some(source) = &config.source {
            let entity = self
                .world
                .try_borrow()
                .ok()
                .and_then(|w| w.find_by_name(source))
                .ok_or_else(|| ConfigError::UnknownEntity(source.clone()))?;
            trigger = trigger.with_source(entity);
        }
        for stimulus in &config.responds_to {
            trigger = trigger.responds_to(*stimulus);
        }
        for condition in &config.conditions {
            trigger = trigger.with_condition(self.build_condition(condition)?);
        }
        for action in &config.actions {
            trigger = trigger.with_action(self.build_action(action)?);
        }
        Ok(trigger)
    }

    /// Build a listener and bind it to its channel.
    pub fn build_listener(&self, config: &ListenerConfig) -> Result<Listener<Payload>, ConfigError> {
        let channel = Rc::clone(&self.channels.resolve(&config.channel)?.channel);
        let actions = self.build_actions(&config.actions)?;

        let mut listener = Listener::new(config.name.clone(), Rc::clone(&self.world)).with_enabled(config.enabled);
        for action in actions {
            listener = listener.with_action(action);
        }
        listener.bind(&channel);
        Ok(listener)
    }

    /// Build a whole scene: channels, then triggers, then listeners. Prefabs
    /// are registered into the world once everything else resolved. On error
    /// nothing built by this call survives; listeners already bound are
    /// dropped and unbind themselves.
    pub fn build_scene(mut self, scene: &SceneConfig) -> Result<BuiltScene, ConfigError> {
        for channel in &scene.channels {
            self.add_channel(channel)?;
        }

        let triggers = scene
            .triggers
            .iter()
            .map(|t| self.build_trigger(t))
            .collect::<Result<Vec<_>, _>>()?;
        let listeners = scene
            .listeners
            .iter()
            .map(|l| self.build_listener(l))
            .collect::<Result<Vec<_>, _>>()?;

        let mut world = self
            .world
            .try_borrow_mut()
            .map_err(|_| invalid("scene", "prefabs", "world is borrowed"))?;
        for prefab in &scene.prefabs {
            world.register_prefab(prefab.clone());
        }
        drop(world);

        debug!(
            channels = scene.channels.len(),
            triggers = triggers.len(),
            listeners = listeners.len(),
            "scene built"
        );
        Ok(BuiltScene {
            channels: self.channels,
            triggers,
            listeners,
        })
    }
}

impl std::fmt::Debug for BuildContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("kinds", self.kinds)
            .field("channels", &self.channels.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Target;
    use crate::core::{EntityId, StimulusKind, Vec3, World};

    fn session(kinds: &KindRegistry) -> BuildContext<'_> {
        let clock = Clock::new();
        let world = World::with_clock(1, clock.clone()).into_handle();
        BuildContext::new(kinds, world, clock, RuntimeConfig::default())
    }

    fn raise_config(channel: &str, payload: Payload) -> ActionConfig {
        ActionSpec::RaiseEvents {
            channels: vec![channel.into()],
            payload,
            forward_actor: false,
        }
        .into()
    }

    #[test]
    fn test_unknown_channel_rejected() {
        let kinds = KindRegistry::new();
        let ctx = session(&kinds);
        let err = ctx.build_action(&raise_config("Missing", Payload::None)).unwrap_err();
        assert_eq!(err, ConfigError::UnknownChannel("Missing".into()));
    }

    #[test]
    fn test_payload_mismatch_rejected() {
        let kinds = KindRegistry::new();
        let mut ctx = session(&kinds);
        ctx.add_channel(&ChannelConfig::new("Score").with_payload(PayloadKind::Int))
            .unwrap();

        assert!(ctx.build_action(&raise_config("Score", Payload::Int(5))).is_ok());
        assert!(matches!(
            ctx.build_action(&raise_config("Score", Payload::Text("x".into()))),
            Err(ConfigError::PayloadMismatch { .. })
        ));
    }

    #[test]
    fn test_forward_actor_needs_entity_channel() {
        let kinds = KindRegistry::new();
        let mut ctx = session(&kinds);
        ctx.add_channel(&ChannelConfig::new("Hit").with_payload(PayloadKind::Entity))
            .unwrap();
        ctx.add_channel(&ChannelConfig::new("Ping")).unwrap();

        let forward = |channel: &str| -> ActionConfig {
            ActionSpec::RaiseEvents {
                channels: vec![channel.into()],
                payload: Payload::None,
                forward_actor: true,
            }
            .into()
        };
        assert!(ctx.build_action(&forward("Hit")).is_ok());
        assert!(ctx.build_action(&forward("Ping")).is_err());
    }

    #[test]
    fn test_negative_durations_rejected() {
        let kinds = KindRegistry::new();
        let ctx = session(&kinds);

        let delayed = ActionConfig::from(ActionSpec::Log { message: "x".into() }).with_delay(-1.0);
        assert_eq!(
            ctx.build_action(&delayed).unwrap_err(),
            ConfigError::NegativeDuration {
                field: "delay".into(),
                value: -1.0
            }
        );

        let mut trigger = TriggerConfig::new("T");
        trigger.cooldown = -0.5;
        assert!(matches!(
            ctx.build_trigger(&trigger),
            Err(ConfigError::NegativeDuration { .. })
        ));
    }

    #[test]
    fn test_unknown_custom_kinds_rejected() {
        let kinds = KindRegistry::new();
        let ctx = session(&kinds);

        let mut trigger = TriggerConfig::new("T");
        trigger.conditions.push(
            ConditionSpec::Custom {
                name: "moon_phase".into(),
                params: Default::default(),
            }
            .into(),
        );
        assert_eq!(
            ctx.build_trigger(&trigger).unwrap_err(),
            ConfigError::UnknownConditionKind("moon_phase".into())
        );
    }

    #[test]
    fn test_trigger_source_resolved_by_name() {
        let kinds = KindRegistry::new();
        let ctx = session(&kinds);
        let door = ctx.world.borrow_mut().spawn("Door", "Door");

        let mut config = TriggerConfig::new("Door trigger");
        config.source = Some("Door".into());
        assert_eq!(ctx.build_trigger(&config).unwrap().source(), Some(door));

        config.source = Some("Window".into());
        assert_eq!(
            ctx.build_trigger(&config).unwrap_err(),
            ConfigError::UnknownEntity("Window".into())
        );
    }

    #[test]
    fn test_condition_envelope_flags() {
        let kinds = KindRegistry::new();
        let ctx = session(&kinds);
        let config = ConditionConfig {
            spec: ConditionSpec::TagEquals { tag: "Player".into() },
            name: Some("is player".into()),
            enabled: true,
            invert: true,
        };
        let mut condition = ctx.build_condition(&config).unwrap();
        assert_eq!(condition.name(), "is player");

        let player = crate::core::Context::new(StimulusKind::Enter)
            .with_actor(EntityId(1))
            .with_tag("Player");
        assert!(!condition.evaluate(&player));
    }

    #[test]
    fn test_build_scene_wires_listener_to_new_channel() {
        let kinds = KindRegistry::new();
        let ctx = session(&kinds);
        let world = Rc::clone(&ctx.world);
        let lamp = world.borrow_mut().spawn("Lamp", "Prop");

        let scene = SceneConfig {
            channels: vec![ChannelConfig::new("LightsOn")],
            listeners: vec![ListenerConfig {
                name: "Lamp".into(),
                channel: "LightsOn".into(),
                enabled: true,
                actions: vec![ActionSpec::Move(TweenConfig {
                    target: Target::Entity(lamp),
                    to: Vec3::new(0.0, 1.0, 0.0),
                    ..TweenConfig::default()
                })
                .into()],
            }],
            ..SceneConfig::default()
        };

        let built = ctx.build_scene(&scene).unwrap();
        let channel = built.channels.get("LightsOn").unwrap();
        channel.raise(Payload::None);
        assert_eq!(built.listeners[0].received_count(), 1);
        assert_eq!(
            world.borrow().get(lamp).unwrap().transform.position,
            Vec3::new(0.0, 1.0, 0.0)
        );
    }

    #[test]
    fn test_failed_scene_leaves_no_subscribers() {
        let kinds = KindRegistry::new();
        let existing = EventChannel::<Payload>::new("Existing").shared();
        let mut channels = ChannelRegistry::new();
        channels.insert(Rc::clone(&existing), PayloadKind::None).unwrap();
        let ctx = session(&kinds).with_channels(channels);

        let scene = SceneConfig {
            listeners: vec![
                ListenerConfig {
                    name: "Ok".into(),
                    channel: "Existing".into(),
                    enabled: true,
                    actions: vec![],
                },
                ListenerConfig {
                    name: "Broken".into(),
                    channel: "Nowhere".into(),
                    enabled: true,
                    actions: vec![],
                },
            ],
            ..SceneConfig::default()
        };

        assert_eq!(
            ctx.build_scene(&scene).unwrap_err(),
            ConfigError::UnknownChannel("Nowhere".into())
        );
        assert_eq!(existing.subscriber_count(), 0);
    }
}
