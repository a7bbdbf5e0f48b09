//! Trigger registry.
//!
//! The registry stores triggers in registration order and offers stimuli to
//! them. Ticks and broadcast stimuli visit triggers in that order, so a scene
//! always resolves the same way.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::{ConfigError, Context, EntityId, WorldHandle};

use super::trigger::{FireOutcome, Trigger, TriggerId};

/// Storage and lookup for triggers.
#[derive(Debug, Default)]
pub struct TriggerRegistry {
    triggers: FxHashMap<TriggerId, Trigger>,
    /// Ids in registration order.
    order: Vec<TriggerId>,
    /// Next id to allocate.
    next_id: u32,
}

impl TriggerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Register a trigger, allocating an id when it has id 0.
    pub fn register(&mut self, mut trigger: Trigger) -> Result<TriggerId, ConfigError> {
        if trigger.id().raw() == 0 {
            let mut candidate = self.next_id.max(1);
            while self.triggers.contains_key(&TriggerId::new(candidate)) {
                candidate += 1;
            }
            trigger.set_id(TriggerId::new(candidate));
        }

        let id = trigger.id();
        if self.triggers.contains_key(&id) {
            return Err(ConfigError::DuplicateTrigger(id.raw()));
        }
        if id.raw() >= self.next_id {
            self.next_id = id.raw() + 1;
        }

        self.order.push(id);
        self.triggers.insert(id, trigger);
        Ok(id)
    }

    /// Register a batch of triggers, all or nothing.
    ///
    /// Explicit ids are reserved before any id-0 trigger gets one, so the
    /// order of triggers in the batch never decides whether it fits. On
    /// error the registry is unchanged.
    pub fn register_all(&mut self, triggers: Vec<Trigger>) -> Result<Vec<TriggerId>, ConfigError> {
        let mut taken = FxHashSet::default();
        for trigger in triggers.iter().filter(|t| t.id().raw() != 0) {
            let id = trigger.id();
            if self.triggers.contains_key(&id) || !taken.insert(id) {
                return Err(ConfigError::DuplicateTrigger(id.raw()));
            }
        }

        let mut candidate = self.next_id.max(1);
        let mut planned = Vec::with_capacity(triggers.len());
        for mut trigger in triggers {
            if trigger.id().raw() == 0 {
                while self.triggers.contains_key(&TriggerId::new(candidate)) || taken.contains(&TriggerId::new(candidate)) {
                    candidate += 1;
                }
                trigger.set_id(TriggerId::new(candidate));
                taken.insert(trigger.id());
            }
            planned.push(trigger);
        }

        let mut ids = Vec::with_capacity(planned.len());
        for trigger in planned {
            let id = trigger.id();
            self.next_id = self.next_id.max(id.raw() + 1);
            self.order.push(id);
            self.triggers.insert(id, trigger);
            ids.push(id);
        }
        Ok(ids)
    }

    /// Remove a trigger. Its running actions are stopped.
    pub fn unregister(&mut self, id: TriggerId) -> Option<Trigger> {
        let mut trigger = self.triggers.remove(&id)?;
        self.order.retain(|&other| other != id);
        trigger.reset();
        Some(trigger)
    }

    /// Get a trigger by ID.
    #[must_use]
    pub fn get(&self, id: TriggerId) -> Option<&Trigger> {
        self.triggers.get(&id)
    }

    /// Get a mutable trigger by ID.
    pub fn get_mut(&mut self, id: TriggerId) -> Option<&mut Trigger> {
        self.triggers.get_mut(&id)
    }

    /// Offer a stimulus to one trigger. `None` if the id is unknown.
    pub fn stimulate(&mut self, id: TriggerId, ctx: &Context, world: &WorldHandle) -> Option<FireOutcome> {
        self.triggers.get_mut(&id).map(|t| t.try_fire(ctx, world))
    }

    /// Offer a stimulus to every trigger in registration order.
    pub fn stimulate_all(&mut self, ctx: &Context, world: &WorldHandle) -> Vec<(TriggerId, FireOutcome)> {
        let mut outcomes = Vec::with_capacity(self.order.len());
        for id in &self.order {
            if let Some(trigger) = self.triggers.get_mut(id) {
                outcomes.push((*id, trigger.try_fire(ctx, world)));
            }
        }
        outcomes
    }

    /// Tick every trigger in registration order.
    pub fn tick_all(&mut self, dt: f32, world: &WorldHandle) {
        for id in &self.order {
            if let Some(trigger) = self.triggers.get_mut(id) {
                trigger.tick(dt, world);
            }
        }
    }

    /// Reset every trigger.
    pub fn reset_all(&mut self) {
        self.triggers.values_mut().for_each(Trigger::reset);
    }

    /// Triggers owned by a source object.
    pub fn triggers_for_source(&self, source: EntityId) -> Vec<&Trigger> {
        self.iter().filter(|t| t.source() == Some(source)).collect()
    }

    /// Remove all triggers owned by a source object.
    pub fn remove_for_source(&mut self, source: EntityId) {
        let to_remove: Vec<_> = self
            .iter()
            .filter(|t| t.source() == Some(source))
            .map(Trigger::id)
            .collect();

        for id in to_remove {
            self.unregister(id);
        }
    }

    /// Enable or disable a trigger.
    pub fn set_enabled(&mut self, id: TriggerId, enabled: bool) {
        if let Some(trigger) = self.triggers.get_mut(&id) {
            if enabled {
                trigger.enable();
            } else {
                trigger.disable();
            }
        }
    }

    /// Get total trigger count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Iterate triggers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Trigger> {
        self.order.iter().filter_map(|id| self.triggers.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::ConditionKind;
    use crate::core::{StimulusKind, World};
    use crate::triggers::{RejectReason, TriggerState};

    fn world_with_player() -> (WorldHandle, Context) {
        let mut world = World::new(1);
        let player = world.spawn("Hero", "Player");
        let ctx = world.context_for(player, StimulusKind::Enter);
        (world.into_handle(), ctx)
    }

    #[test]
    fn test_register_allocates_ids() {
        let mut registry = TriggerRegistry::new();
        let a = registry.register(Trigger::new(TriggerId(0), "A")).unwrap();
        let b = registry.register(Trigger::new(TriggerId(0), "B")).unwrap();
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_register_with_explicit_id() {
        let mut registry = TriggerRegistry::new();
        registry.register(Trigger::new(TriggerId(5), "Five")).unwrap();
        assert_eq!(
            registry.register(Trigger::new(TriggerId(5), "Again")).unwrap_err(),
            ConfigError::DuplicateTrigger(5)
        );
        let next = registry.register(Trigger::new(TriggerId(0), "Next")).unwrap();
        assert_eq!(next, TriggerId(6));
    }

    #[test]
    fn test_register_all_reserves_explicit_ids_first() {
        let mut registry = TriggerRegistry::new();
        let ids = registry
            .register_all(vec![Trigger::new(TriggerId(0), "A"), Trigger::new(TriggerId(1), "B")])
            .unwrap();
        assert_eq!(ids, vec![TriggerId(2), TriggerId(1)]);
        assert_eq!(registry.get(TriggerId(2)).unwrap().name(), "A");

        let order: Vec<_> = registry.iter().map(Trigger::id).collect();
        assert_eq!(order, ids);
    }

    #[test]
    fn test_register_all_is_all_or_nothing() {
        let mut registry = TriggerRegistry::new();
        registry.register(Trigger::new(TriggerId(3), "Existing")).unwrap();

        let err = registry
            .register_all(vec![Trigger::new(TriggerId(0), "New"), Trigger::new(TriggerId(3), "Clash")])
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateTrigger(3));
        let err = registry
            .register_all(vec![Trigger::new(TriggerId(7), "X"), Trigger::new(TriggerId(7), "Y")])
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateTrigger(7));
        assert_eq!(registry.len(), 1);

        let next = registry.register(Trigger::new(TriggerId(0), "Next")).unwrap();
        assert_eq!(next, TriggerId(4));
    }

    #[test]
    fn test_stimulate_all_in_registration_order() {
        let (world, ctx) = world_with_player();
        let mut registry = TriggerRegistry::new();
        registry.register(Trigger::new(TriggerId(9), "Late")).unwrap();
        registry
            .register(Trigger::new(TriggerId(2), "Picky").with_condition(ConditionKind::TagEquals("Enemy".into())))
            .unwrap();

        let outcomes = registry.stimulate_all(&ctx, &world);
        assert_eq!(
            outcomes,
            vec![
                (TriggerId(9), FireOutcome::Fired),
                (TriggerId(2), FireOutcome::Rejected(RejectReason::ConditionsUnmet)),
            ]
        );
        assert_eq!(registry.stimulate(TriggerId(77), &ctx, &world), None);
    }

    #[test]
    fn test_remove_for_source() {
        let mut registry = TriggerRegistry::new();
        registry
            .register(Trigger::new(TriggerId(1), "Owned").with_source(EntityId(4)))
            .unwrap();
        registry.register(Trigger::new(TriggerId(2), "Global")).unwrap();

        assert_eq!(registry.triggers_for_source(EntityId(4)).len(), 1);
        registry.remove_for_source(EntityId(4));
        assert_eq!(registry.len(), 1);
        assert!(registry.get(TriggerId(1)).is_none());
    }

    #[test]
    fn test_set_enabled() {
        let mut registry = TriggerRegistry::new();
        let id = registry.register(Trigger::new(TriggerId(0), "T")).unwrap();
        registry.set_enabled(id, false);
        assert_eq!(registry.get(id).unwrap().state(), TriggerState::Disabled);
        registry.set_enabled(id, true);
        assert_eq!(registry.get(id).unwrap().state(), TriggerState::Idle);
    }
}
