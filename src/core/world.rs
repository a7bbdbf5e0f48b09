//! In-memory scene model.
//!
//! The `World` stands in for the engine side of the boundary: it holds the
//! objects actions mutate (transform, activation, material parameters), the
//! prefabs they can spawn, and a log of audio cues they played. Physics,
//! rendering and scene placement stay outside the runtime; an engine
//! integration mirrors these records into its own objects.
//!
//! ```
//! use rust_triggers::core::{StimulusKind, Vec3, World};
//!
//! let mut world = World::new(42);
//! let player = world.spawn("Hero", "Player");
//! world.get_mut(player).unwrap().transform.position = Vec3::new(1.0, 0.0, 0.0);
//!
//! let ctx = world.context_for(player, StimulusKind::Enter);
//! assert!(ctx.has_tag("Player"));
//! assert_eq!(ctx.position, Some(Vec3::new(1.0, 0.0, 0.0)));
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use im::Vector;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::clock::Clock;
use super::context::{Context, StimulusKind};
use super::entity::EntityId;
use super::error::RuntimeError;
use super::math::Vec3;
use super::rng::ScriptRng;

/// Shared handle to the world, held by the runtime and by bound listeners.
pub type WorldHandle = Rc<RefCell<World>>;

/// Position, euler rotation (degrees) and scale of an object.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

/// A scene object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub name: String,
    pub tag: String,
    pub layer: u8,
    pub active: bool,
    pub transform: Transform,
    /// Named float material parameters (opacity, emission, ...).
    pub material: FxHashMap<String, f32>,
}

impl EntityRecord {
    /// Read a material parameter, or a default when unset.
    #[must_use]
    pub fn material_param(&self, param: &str, default: f32) -> f32 {
        self.material.get(param).copied().unwrap_or(default)
    }
}

/// Template for objects created by spawn actions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prefab {
    pub name: String,
    pub tag: String,
    pub layer: u8,
    pub scale: Option<Vec3>,
    pub material: FxHashMap<String, f32>,
}

impl Prefab {
    /// Create a prefab with a name and tag.
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Set the layer (builder pattern).
    #[must_use]
    pub fn with_layer(mut self, layer: u8) -> Self {
        self.layer = layer;
        self
    }
}

/// A played audio clip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudioCue {
    pub clip: String,
    pub volume: f32,
    pub pitch: f32,
    pub position: Option<Vec3>,
    pub time: f64,
}

/// The scene objects, prefabs and audio log actions operate on.
#[derive(Clone, Debug)]
pub struct World {
    entities: FxHashMap<EntityId, EntityRecord>,
    prefabs: FxHashMap<String, Prefab>,
    audio: Vector<AudioCue>,
    next_id: EntityId,
    rng: ScriptRng,
    clock: Clock,
}

impl World {
    /// Create an empty world with its own clock.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_clock(seed, Clock::new())
    }

    /// Create an empty world sharing an existing clock.
    #[must_use]
    pub fn with_clock(seed: u64, clock: Clock) -> Self {
        Self {
            entities: FxHashMap::default(),
            prefabs: FxHashMap::default(),
            audio: Vector::new(),
            next_id: EntityId::new(1),
            rng: ScriptRng::new(seed),
            clock,
        }
    }

    /// Wrap the world in a shared handle.
    #[must_use]
    pub fn into_handle(self) -> WorldHandle {
        Rc::new(RefCell::new(self))
    }

    fn alloc_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }

    /// Create a new active object at the origin.
    pub fn spawn(&mut self, name: impl Into<String>, tag: impl Into<String>) -> EntityId {
        let id = self.alloc_id();
        self.entities.insert(
            id,
            EntityRecord {
                id,
                name: name.into(),
                tag: tag.into(),
                layer: 0,
                active: true,
                transform: Transform::default(),
                material: FxHashMap::default(),
            },
        );
        id
    }

    /// Instantiate a registered prefab at a position.
    pub fn spawn_prefab(&mut self, prefab: &str, position: Vec3) -> Result<EntityId, RuntimeError> {
        let template = self
            .prefabs
            .get(prefab)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownPrefab(prefab.to_string()))?;

        let id = self.spawn(template.name, template.tag);
        if let Some(record) = self.entities.get_mut(&id) {
            record.layer = template.layer;
            record.transform.position = position;
            if let Some(scale) = template.scale {
                record.transform.scale = scale;
            }
            record.material = template.material;
        }
        Ok(id)
    }

    /// Remove an object.
    pub fn despawn(&mut self, id: EntityId) -> Option<EntityRecord> {
        self.entities.remove(&id)
    }

    /// Register a prefab, replacing any with the same name.
    pub fn register_prefab(&mut self, prefab: Prefab) {
        self.prefabs.insert(prefab.name.clone(), prefab);
    }

    /// Get an object.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&EntityRecord> {
        self.entities.get(&id)
    }

    /// Get a mutable object.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut EntityRecord> {
        self.entities.get_mut(&id)
    }

    /// Get a mutable object or a `MissingEntity` error.
    pub fn require_mut(&mut self, id: EntityId) -> Result<&mut EntityRecord, RuntimeError> {
        self.entities.get_mut(&id).ok_or(RuntimeError::MissingEntity(id))
    }

    /// Check whether an object exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Find the first object with a name (lowest id wins).
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.entities
            .values()
            .filter(|e| e.name == name)
            .map(|e| e.id)
            .min()
    }

    /// All object ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the world has no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Record an audio cue at the current time.
    pub fn play_audio(&mut self, clip: impl Into<String>, volume: f32, pitch: f32, position: Option<Vec3>) {
        let time = self.clock.now();
        self.audio.push_back(AudioCue {
            clip: clip.into(),
            volume,
            pitch,
            position,
            time,
        });
    }

    /// Audio cues played so far, oldest first.
    #[must_use]
    pub fn audio_log(&self) -> &Vector<AudioCue> {
        &self.audio
    }

    /// The world RNG.
    pub fn rng_mut(&mut self) -> &mut ScriptRng {
        &mut self.rng
    }

    /// Current scene time.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Build a stimulus context from an actor's current record.
    ///
    /// Unknown actors produce a context carrying only the id.
    #[must_use]
    pub fn context_for(&self, actor: EntityId, stimulus: StimulusKind) -> Context {
        let mut ctx = Context::new(stimulus).with_actor(actor);
        if let Some(record) = self.entities.get(&actor) {
            ctx.tag = Some(record.tag.clone());
            ctx.layer = Some(record.layer);
            ctx.position = Some(record.transform.position);
        }
        ctx
    }

    /// Like [`World::context_for`], also filling in the reacting object.
    #[must_use]
    pub fn context_between(&self, actor: EntityId, source: EntityId, stimulus: StimulusKind) -> Context {
        let mut ctx = self.context_for(actor, stimulus).with_source(source);
        if let Some(record) = self.entities.get(&source) {
            ctx.origin = Some(record.transform.position);
        }
        ctx
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(42)
    }
}
