//! The tick-driven host for a scene.

use std::rc::Rc;

use rustc_hash::FxHashSet;
use tracing::{debug, info, trace};

use crate::channels::{ChannelRegistry, EventChannel};
use crate::core::{
    Clock, ConfigError, Context, EntityId, Payload, PayloadKind, RuntimeConfig, StimulusKind, World, WorldHandle,
};
use crate::listeners::Listener;
use crate::setup::{BuildContext, ChannelConfig, KindRegistry, SceneConfig};
use crate::triggers::{FireOutcome, Trigger, TriggerId, TriggerRegistry};

use super::snapshot::{ChannelSnapshot, ListenerSnapshot, RuntimeSnapshot, TriggerSnapshot};

/// Owns a world, its clock, and every configured channel, trigger and
/// listener, and drives them from an external per-frame tick.
#[derive(Debug)]
pub struct Runtime {
    config: RuntimeConfig,
    clock: Clock,
    world: WorldHandle,
    channels: ChannelRegistry,
    triggers: TriggerRegistry,
    listeners: Vec<Listener<Payload>>,
    ticks: u64,
}

impl Runtime {
    /// Create a runtime with an empty world.
    pub fn new(config: RuntimeConfig) -> Self {
        let clock = Clock::new();
        let world = World::with_clock(config.seed, clock.clone());
        Self {
            config,
            clock,
            world: world.into_handle(),
            channels: ChannelRegistry::new(),
            triggers: TriggerRegistry::new(),
            listeners: Vec::new(),
            ticks: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Current scene time in seconds.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    #[must_use]
    pub fn world(&self) -> &WorldHandle {
        &self.world
    }

    /// Start a configuration session that sees this runtime's channels.
    #[must_use]
    pub fn build_context<'a>(&self, kinds: &'a KindRegistry) -> BuildContext<'a> {
        BuildContext::new(kinds, Rc::clone(&self.world), self.clock.clone(), self.config.clone())
            .with_channels(self.channels.clone())
    }

    /// Build and add a scene. Either everything in it is added or nothing is.
    /// Returns the ids of the new triggers in definition order.
    ///
    /// Explicit trigger ids are checked before anything is built; triggers
    /// with id 0 take ids no explicit trigger in the scene claims.
    pub fn load(&mut self, scene: &SceneConfig, kinds: &KindRegistry) -> Result<Vec<TriggerId>, ConfigError> {
        let mut seen = FxHashSet::default();
        for config in scene.triggers.iter().filter(|t| t.id != 0) {
            let id = TriggerId::new(config.id);
            if self.triggers.get(id).is_some() || !seen.insert(id) {
                return Err(ConfigError::DuplicateTrigger(config.id));
            }
        }

        let built = self.build_context(kinds).build_scene(scene)?;
        let ids = self.triggers.register_all(built.triggers)?;
        self.channels = built.channels;
        self.listeners.extend(built.listeners);

        info!(
            channels = self.channels.len(),
            triggers = self.triggers.len(),
            listeners = self.listeners.len(),
            "scene loaded"
        );
        Ok(ids)
    }

    /// Create a configured channel.
    pub fn add_channel(&mut self, config: &ChannelConfig) -> Result<Rc<EventChannel<Payload>>, ConfigError> {
        if config.name.is_empty() {
            return Err(ConfigError::InvalidParameter {
                kind: "channel".into(),
                param: "name".into(),
                reason: "must not be empty".into(),
            });
        }
        self.channels.create(
            &config.name,
            &config.description,
            config.payload,
            &self.clock,
            self.config.max_dispatch_depth,
        )
    }

    /// Register a channel built in code.
    pub fn insert_channel(&mut self, channel: Rc<EventChannel<Payload>>, payload: PayloadKind) -> Result<(), ConfigError> {
        self.channels.insert(channel, payload)
    }

    /// Add a trigger built in code.
    pub fn add_trigger(&mut self, mut trigger: Trigger) -> Result<TriggerId, ConfigError> {
        if self.config.debug {
            trigger.set_debug(true);
        }
        self.triggers.register(trigger)
    }

    /// Add a listener built in code. It is ticked with the runtime.
    pub fn add_listener(&mut self, listener: Listener<Payload>) {
        self.listeners.push(listener);
    }

    /// Remove listeners by name, unbinding them. Returns how many were removed.
    pub fn remove_listener(&mut self, name: &str) -> usize {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.name() != name);
        before - self.listeners.len()
    }

    /// Offer a stimulus to one trigger. `None` if the id is unknown.
    pub fn stimulate(&mut self, id: TriggerId, ctx: &Context) -> Option<FireOutcome> {
        self.triggers.stimulate(id, ctx, &self.world)
    }

    /// Offer a stimulus to every trigger in registration order.
    pub fn stimulate_all(&mut self, ctx: &Context) -> Vec<(TriggerId, FireOutcome)> {
        self.triggers.stimulate_all(ctx, &self.world)
    }

    /// Report that `actor` produced a stimulus at trigger `id`, e.g. entered
    /// its volume. The context is captured from the actor's current record.
    pub fn notify(&mut self, id: TriggerId, actor: EntityId, stimulus: StimulusKind) -> Option<FireOutcome> {
        let ctx = self.world.try_borrow().ok()?.context_for(actor, stimulus);
        self.stimulate(id, &ctx)
    }

    /// Fire a trigger regardless of its state and conditions.
    pub fn force_fire(&mut self, id: TriggerId, ctx: &Context) -> Option<FireOutcome> {
        let world = Rc::clone(&self.world);
        self.triggers.get_mut(id).map(|t| t.force_fire(ctx, &world))
    }

    /// Advance time: the clock first, then triggers in registration order,
    /// then listeners in load order.
    pub fn tick(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.clock.advance(dt);
        self.triggers.tick_all(dt, &self.world);
        for listener in &self.listeners {
            listener.tick(dt);
        }
        self.ticks += 1;
        trace!(tick = self.ticks, time = self.clock.now(), "tick");
    }

    /// Remove an object and every trigger it owns.
    pub fn destroy_entity(&mut self, entity: EntityId) -> bool {
        self.triggers.remove_for_source(entity);
        let removed = self
            .world
            .try_borrow_mut()
            .map(|mut w| w.despawn(entity).is_some())
            .unwrap_or(false);
        debug!(%entity, removed, "entity destroyed");
        removed
    }

    /// Reset every trigger, stop every listener's actions and clear channel
    /// counters. Time keeps running.
    pub fn reset_all(&mut self) {
        self.triggers.reset_all();
        for listener in &self.listeners {
            listener.stop_all();
        }
        self.channels.reset_all();
    }

    #[must_use]
    pub fn channel(&self, name: &str) -> Option<&Rc<EventChannel<Payload>>> {
        self.channels.get(name)
    }

    #[must_use]
    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    #[must_use]
    pub fn trigger(&self, id: TriggerId) -> Option<&Trigger> {
        self.triggers.get(id)
    }

    pub fn trigger_mut(&mut self, id: TriggerId) -> Option<&mut Trigger> {
        self.triggers.get_mut(id)
    }

    #[must_use]
    pub fn triggers(&self) -> &TriggerRegistry {
        &self.triggers
    }

    /// First listener with a name.
    #[must_use]
    pub fn listener(&self, name: &str) -> Option<&Listener<Payload>> {
        self.listeners.iter().find(|l| l.name() == name)
    }

    #[must_use]
    pub fn listeners(&self) -> &[Listener<Payload>] {
        &self.listeners
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Capture diagnostics for every channel, trigger and listener.
    #[must_use]
    pub fn snapshot(&self) -> RuntimeSnapshot {
        let channels = self
            .channels
            .iter()
            .map(|configured| {
                let channel = &configured.channel;
                ChannelSnapshot {
                    name: channel.name().to_string(),
                    description: channel.description().to_string(),
                    active: channel.is_active(),
                    subscribers: channel.subscriber_count(),
                    raised_count: channel.raised_count(),
                    failure_count: channel.failure_count(),
                    last_raised_time: channel.last_raised_time(),
                }
            })
            .collect();

        let triggers = self
            .triggers
            .iter()
            .map(|t| TriggerSnapshot {
                id: t.id(),
                name: t.name().to_string(),
                state: t.state(),
                has_fired: t.has_fired(),
                fire_count: t.fire_count(),
                rejected_count: t.rejected_count(),
                last_rejection: t.last_rejection(),
                cooldown_remaining: t.cooldown_remaining(),
                is_executing: t.is_executing(),
            })
            .collect();

        let listeners = self
            .listeners
            .iter()
            .map(|l| ListenerSnapshot {
                name: l.name().to_string(),
                channel: l.channel().map(|c| c.name().to_string()),
                enabled: l.is_enabled(),
                received_count: l.received_count(),
                is_executing: l.is_executing(),
            })
            .collect();

        RuntimeSnapshot {
            time: self.clock.now(),
            ticks: self.ticks,
            channels,
            triggers,
            listeners,
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}
