//! Built-in action kinds, targets, and the extension trait.

use std::cell::RefMut;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::info;

use crate::channels::EventChannel;
use crate::core::{Context, EntityId, EntityRecord, Payload, RuntimeError, RuntimeResult, Vec3, World, WorldHandle};

use super::action::Action;
use super::tween::{Easing, TweenClock};

/// Which object an action affects, resolved against the context at run time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// The entity that caused the stimulus.
    #[default]
    Actor,
    /// The object that reacted (the trigger's owner).
    Source,
    /// A fixed entity.
    Entity(EntityId),
    /// The first entity with this name.
    Named(String),
}

impl Target {
    /// Resolve to an existing entity.
    pub fn resolve(&self, ctx: &Context, world: &World) -> RuntimeResult<EntityId> {
        let id = match self {
            Self::Actor => ctx.actor.ok_or(RuntimeError::UnresolvedTarget)?,
            Self::Source => ctx.source.ok_or(RuntimeError::UnresolvedTarget)?,
            Self::Entity(id) => *id,
            Self::Named(name) => world.find_by_name(name).ok_or(RuntimeError::UnresolvedTarget)?,
        };
        if world.contains(id) {
            Ok(id)
        } else {
            Err(RuntimeError::MissingEntity(id))
        }
    }
}

/// How a set-active action changes activation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationMode {
    #[default]
    Enable,
    Disable,
    Toggle,
}

impl ActivationMode {
    fn apply(self, active: bool) -> bool {
        match self {
            Self::Enable => true,
            Self::Disable => false,
            Self::Toggle => !active,
        }
    }
}

/// An interpolated change to one transform property.
#[derive(Clone, Debug, PartialEq)]
pub struct TransformTween {
    pub target: Target,
    /// Final value, or a delta added to the current value when `relative`.
    pub to: Vec3,
    pub relative: bool,
    /// Seconds. Zero applies the change immediately.
    pub duration: f32,
    pub easing: Easing,
}

impl TransformTween {
    /// Tween `target` to an absolute value with linear easing.
    pub fn to(target: Target, to: Vec3, duration: f32) -> Self {
        Self {
            target,
            to,
            relative: false,
            duration,
            easing: Easing::Linear,
        }
    }

    /// Tween `target` by a delta with linear easing.
    pub fn by(target: Target, delta: Vec3, duration: f32) -> Self {
        Self {
            relative: true,
            ..Self::to(target, delta, duration)
        }
    }

    /// Set the easing curve (builder pattern).
    #[must_use]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// Whether a custom effect is still running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectStatus {
    Finished,
    Running,
}

/// An action effect supplied by downstream code.
///
/// Effects must not hold a borrow of the world while raising a channel;
/// handlers further down the chain borrow it too.
pub trait ActionEffect {
    /// Kind name, used in logs and diagnostics.
    fn kind(&self) -> &str;

    /// Start the effect.
    fn begin(&mut self, ctx: &Context, world: &WorldHandle) -> RuntimeResult<EffectStatus>;

    /// Advance a running effect.
    fn tick(&mut self, _dt: f32, _world: &WorldHandle) -> RuntimeResult<EffectStatus> {
        Ok(EffectStatus::Finished)
    }

    /// Abandon a running effect. Already-applied changes stay.
    fn stop(&mut self) {}
}

/// A custom effect that raises a typed channel with a fixed payload.
pub struct RaiseChannel<T: Clone + 'static> {
    channel: Rc<EventChannel<T>>,
    payload: T,
}

impl<T: Clone + 'static> RaiseChannel<T> {
    pub fn new(channel: Rc<EventChannel<T>>, payload: T) -> Self {
        Self { channel, payload }
    }
}

impl<T: Clone + 'static> ActionEffect for RaiseChannel<T> {
    fn kind(&self) -> &str {
        "raise_channel"
    }

    fn begin(&mut self, _ctx: &Context, _world: &WorldHandle) -> RuntimeResult<EffectStatus> {
        self.channel.raise(self.payload.clone());
        Ok(EffectStatus::Finished)
    }
}

/// What an action does once its delay has elapsed.
pub enum ActionKind {
    /// Interpolate position.
    Move(TransformTween),

    /// Interpolate euler rotation (degrees).
    Rotate(TransformTween),

    /// Interpolate scale.
    Scale(TransformTween),

    /// Interpolate a material parameter. Unset parameters start from 0.
    SetMaterial {
        target: Target,
        param: String,
        to: f32,
        duration: f32,
        easing: Easing,
    },

    /// Change activation.
    SetActive { target: Target, mode: ActivationMode },

    /// Play one clip, chosen with the world RNG.
    PlayAudio {
        clips: Vec<String>,
        volume: f32,
        /// Pitch varies in `1 ± pitch_jitter`.
        pitch_jitter: f32,
        /// Where the sound plays; the context origin when `None`.
        target: Option<Target>,
    },

    /// Raise each channel in order.
    RaiseEvents {
        channels: SmallVec<[Rc<EventChannel<Payload>>; 2]>,
        payload: Payload,
        /// Send the context actor as an entity payload instead of `payload`.
        forward_actor: bool,
    },

    /// Instantiate a prefab at `at` (the context origin when `None`) plus `offset`.
    Spawn {
        prefab: String,
        at: Option<Target>,
        offset: Vec3,
    },

    /// Remove the target from the world.
    Destroy { target: Target },

    /// Write a message to the log.
    Log { message: String },

    /// Run nested actions one after another.
    Sequence(Vec<Action>),

    /// Downstream-defined effect.
    Custom(Box<dyn ActionEffect>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TransformProperty {
    Position,
    Rotation,
    Scale,
}

impl TransformProperty {
    fn read(self, record: &EntityRecord) -> Vec3 {
        match self {
            Self::Position => record.transform.position,
            Self::Rotation => record.transform.rotation,
            Self::Scale => record.transform.scale,
        }
    }

    fn write(self, record: &mut EntityRecord, value: Vec3) {
        match self {
            Self::Position => record.transform.position = value,
            Self::Rotation => record.transform.rotation = value,
            Self::Scale => record.transform.scale = value,
        }
    }
}

/// Progress of a gradual effect between ticks.
#[derive(Debug)]
pub(crate) enum Running {
    Transform {
        entity: EntityId,
        property: TransformProperty,
        from: Vec3,
        to: Vec3,
        clock: TweenClock,
    },
    Material {
        entity: EntityId,
        param: String,
        from: f32,
        to: f32,
        clock: TweenClock,
    },
    Sequence {
        index: usize,
        ctx: Context,
    },
    Custom,
}

pub(crate) fn world_mut(world: &WorldHandle) -> RuntimeResult<RefMut<'_, World>> {
    world
        .try_borrow_mut()
        .map_err(|_| RuntimeError::Custom("world is already borrowed".into()))
}

/// Skip past finished steps, starting each next one. Returns `true` when the
/// whole sequence is done.
fn drive_sequence(steps: &mut [Action], index: &mut usize, ctx: &Context, world: &WorldHandle) -> bool {
    while let Some(step) = steps.get(*index) {
        if step.is_executing() {
            return false;
        }
        *index += 1;
        if let Some(next) = steps.get_mut(*index) {
            next.execute(ctx, world);
        }
    }
    true
}

impl ActionKind {
    /// Move to an absolute position over `duration` seconds.
    pub fn move_to(target: Target, to: Vec3, duration: f32) -> Self {
        Self::Move(TransformTween::to(target, to, duration))
    }

    /// Raise one channel with a fixed payload.
    pub fn raise(channel: Rc<EventChannel<Payload>>, payload: Payload) -> Self {
        let mut channels = SmallVec::new();
        channels.push(channel);
        Self::RaiseEvents {
            channels,
            payload,
            forward_actor: false,
        }
    }

    /// Log a message.
    pub fn log(message: impl Into<String>) -> Self {
        Self::Log {
            message: message.into(),
        }
    }

    /// Short kind name for logs.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Move(_) => "move",
            Self::Rotate(_) => "rotate",
            Self::Scale(_) => "scale",
            Self::SetMaterial { .. } => "set_material",
            Self::SetActive { .. } => "set_active",
            Self::PlayAudio { .. } => "play_audio",
            Self::RaiseEvents { .. } => "raise_events",
            Self::Spawn { .. } => "spawn",
            Self::Destroy { .. } => "destroy",
            Self::Log { .. } => "log",
            Self::Sequence(_) => "sequence",
            Self::Custom(effect) => effect.kind(),
        }
    }

    /// Start the effect. `None` means it finished immediately.
    pub(crate) fn begin(&mut self, ctx: &Context, world: &WorldHandle) -> RuntimeResult<Option<Running>> {
        match self {
            Self::Move(tween) => begin_transform(tween, TransformProperty::Position, ctx, world),
            Self::Rotate(tween) => begin_transform(tween, TransformProperty::Rotation, ctx, world),
            Self::Scale(tween) => begin_transform(tween, TransformProperty::Scale, ctx, world),
            Self::SetMaterial {
                target,
                param,
                to,
                duration,
                easing,
            } => {
                let mut w = world_mut(world)?;
                let entity = target.resolve(ctx, &w)?;
                let record = w.require_mut(entity)?;
                if *duration <= 0.0 {
                    record.material.insert(param.clone(), *to);
                    return Ok(None);
                }
                Ok(Some(Running::Material {
                    entity,
                    param: param.clone(),
                    from: record.material_param(param, 0.0),
                    to: *to,
                    clock: TweenClock::new(*duration, *easing),
                }))
            }
            Self::SetActive { target, mode } => {
                let mut w = world_mut(world)?;
                let entity = target.resolve(ctx, &w)?;
                let record = w.require_mut(entity)?;
                record.active = mode.apply(record.active);
                Ok(None)
            }
            Self::PlayAudio {
                clips,
                volume,
                pitch_jitter,
                target,
            } => {
                let mut w = world_mut(world)?;
                let position = match target {
                    Some(target) => {
                        let entity = target.resolve(ctx, &w)?;
                        w.get(entity).map(|r| r.transform.position)
                    }
                    None => ctx.origin,
                };
                let rng = w.rng_mut();
                let index = rng
                    .choose_index(clips.len())
                    .ok_or_else(|| RuntimeError::Custom("no audio clips to play".into()))?;
                let pitch = 1.0 + rng.jitter(*pitch_jitter);
                w.play_audio(clips[index].clone(), *volume, pitch, position);
                Ok(None)
            }
            Self::RaiseEvents {
                channels,
                payload,
                forward_actor,
            } => {
                let payload = match (*forward_actor, ctx.actor) {
                    (true, Some(actor)) => Payload::Entity(actor),
                    _ => payload.clone(),
                };
                for channel in channels.iter() {
                    channel.raise(payload.clone());
                }
                Ok(None)
            }
            Self::Spawn { prefab, at, offset } => {
                let mut w = world_mut(world)?;
                let base = match at {
                    Some(target) => {
                        let entity = target.resolve(ctx, &w)?;
                        w.get(entity).map_or(Vec3::ZERO, |r| r.transform.position)
                    }
                    None => ctx.origin.unwrap_or(Vec3::ZERO),
                };
                w.spawn_prefab(prefab, base + *offset)?;
                Ok(None)
            }
            Self::Destroy { target } => {
                let mut w = world_mut(world)?;
                let entity = target.resolve(ctx, &w)?;
                w.despawn(entity);
                Ok(None)
            }
            Self::Log { message } => {
                info!(actor = ?ctx.actor, stimulus = ?ctx.stimulus, "{message}");
                Ok(None)
            }
            Self::Sequence(steps) => {
                let Some(first) = steps.first_mut() else {
                    return Ok(None);
                };
                first.execute(ctx, world);
                let mut index = 0;
                if drive_sequence(steps, &mut index, ctx, world) {
                    Ok(None)
                } else {
                    Ok(Some(Running::Sequence {
                        index,
                        ctx: ctx.clone(),
                    }))
                }
            }
            Self::Custom(effect) => match effect.begin(ctx, world)? {
                EffectStatus::Finished => Ok(None),
                EffectStatus::Running => Ok(Some(Running::Custom)),
            },
        }
    }

    /// Advance a running effect. Returns `true` once it has finished.
    pub(crate) fn tick(&mut self, running: &mut Running, dt: f32, world: &WorldHandle) -> RuntimeResult<bool> {
        match (self, running) {
            (
                _,
                Running::Transform {
                    entity,
                    property,
                    from,
                    to,
                    clock,
                },
            ) => {
                let (t, done) = clock.advance(dt);
                let value = if done { *to } else { from.lerp(*to, t) };
                let mut w = world_mut(world)?;
                property.write(w.require_mut(*entity)?, value);
                Ok(done)
            }
            (
                _,
                Running::Material {
                    entity,
                    param,
                    from,
                    to,
                    clock,
                },
            ) => {
                let (t, done) = clock.advance(dt);
                let value = if done { *to } else { *from + (*to - *from) * t };
                let mut w = world_mut(world)?;
                w.require_mut(*entity)?.material.insert(param.clone(), value);
                Ok(done)
            }
            (Self::Sequence(steps), Running::Sequence { index, ctx }) => {
                if let Some(step) = steps.get_mut(*index) {
                    step.tick(dt, world);
                }
                Ok(drive_sequence(steps, index, ctx, world))
            }
            (Self::Custom(effect), Running::Custom) => Ok(effect.tick(dt, world)? == EffectStatus::Finished),
            _ => Ok(true),
        }
    }

    /// Abandon the current run.
    pub(crate) fn stop(&mut self, was_running: bool) {
        match self {
            Self::Sequence(steps) => steps.iter_mut().for_each(Action::stop),
            Self::Custom(effect) if was_running => effect.stop(),
            _ => {}
        }
    }
}

fn begin_transform(
    tween: &TransformTween,
    property: TransformProperty,
    ctx: &Context,
    world: &WorldHandle,
) -> RuntimeResult<Option<Running>> {
    let mut w = world_mut(world)?;
    let entity = tween.target.resolve(ctx, &w)?;
    let record = w.require_mut(entity)?;
    let from = property.read(record);
    let to = if tween.relative { from + tween.to } else { tween.to };

    if tween.duration <= 0.0 {
        property.write(record, to);
        return Ok(None);
    }
    Ok(Some(Running::Transform {
        entity,
        property,
        from,
        to,
        clock: TweenClock::new(tween.duration, tween.easing),
    }))
}

impl std::fmt::Debug for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Move(tween) => f.debug_tuple("Move").field(tween).finish(),
            Self::Rotate(tween) => f.debug_tuple("Rotate").field(tween).finish(),
            Self::Scale(tween) => f.debug_tuple("Scale").field(tween).finish(),
            Self::SetMaterial { target, param, to, .. } => f
                .debug_struct("SetMaterial")
                .field("target", target)
                .field("param", param)
                .field("to", to)
                .finish(),
            Self::SetActive { target, mode } => f
                .debug_struct("SetActive")
                .field("target", target)
                .field("mode", mode)
                .finish(),
            Self::PlayAudio { clips, .. } => f.debug_struct("PlayAudio").field("clips", clips).finish(),
            Self::RaiseEvents { channels, payload, .. } => {
                let names: Vec<&str> = channels.iter().map(|c| c.name()).collect();
                f.debug_struct("RaiseEvents")
                    .field("channels", &names)
                    .field("payload", payload)
                    .finish()
            }
            Self::Spawn { prefab, .. } => f.debug_struct("Spawn").field("prefab", prefab).finish(),
            Self::Destroy { target } => f.debug_struct("Destroy").field("target", target).finish(),
            Self::Log { message } => f.debug_struct("Log").field("message", message).finish(),
            Self::Sequence(steps) => f.debug_tuple("Sequence").field(steps).finish(),
            Self::Custom(effect) => f.debug_tuple("Custom").field(&effect.kind()).finish(),
        }
    }
}
