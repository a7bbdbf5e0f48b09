//! Trigger definition and firing state machine.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, info};

use crate::actions::Action;
use crate::conditions::Condition;
use crate::core::{Context, EntityId, StimulusKind, WorldHandle, TIME_EPSILON};

/// Unique identifier for a trigger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TriggerId(pub u32);

impl TriggerId {
    /// Create a new trigger ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Trigger({})", self.0)
    }
}

/// Firing state of a trigger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerState {
    #[default]
    Idle,
    CoolingDown,
    Disabled,
}

/// Why a stimulus did not fire a trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    Disabled,
    CoolingDown,
    /// A one-shot trigger that has already fired.
    Consumed,
    /// The stimulus kind is not one the trigger responds to.
    StimulusFiltered,
    ConditionsUnmet,
}

/// Result of offering a stimulus to a trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FireOutcome {
    Fired,
    Rejected(RejectReason),
}

impl FireOutcome {
    #[must_use]
    pub fn is_fired(self) -> bool {
        self == Self::Fired
    }

    /// The rejection reason, if any.
    #[must_use]
    pub fn rejection(self) -> Option<RejectReason> {
        match self {
            Self::Fired => None,
            Self::Rejected(reason) => Some(reason),
        }
    }
}

/// A trigger: conditions guarding an ordered list of actions.
///
/// Triggers watch for stimuli offered through [`Trigger::try_fire`] and run
/// their actions when the conditions are met.
#[derive(Debug)]
pub struct Trigger {
    id: TriggerId,
    name: String,

    /// The object this trigger belongs to. Used to fill in the context's
    /// source and origin when the stimulus does not name them.
    source: Option<EntityId>,

    conditions: SmallVec<[Condition; 4]>,
    /// AND the enabled conditions when `true`, OR them when `false`.
    require_all: bool,
    can_repeat: bool,
    cooldown: f32,
    actions: Vec<Action>,
    /// Stimulus kinds accepted; empty accepts every kind.
    responds_to: SmallVec<[StimulusKind; 2]>,
    debug: bool,

    state: TriggerState,
    has_fired: bool,
    cooldown_remaining: f32,
    fire_count: u64,
    rejected_count: u64,
    last_rejection: Option<RejectReason>,
}

impl Trigger {
    /// Create a repeatable trigger with no conditions, actions or cooldown.
    pub fn new(id: TriggerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            source: None,
            conditions: SmallVec::new(),
            require_all: true,
            can_repeat: true,
            cooldown: 0.0,
            actions: Vec::new(),
            responds_to: SmallVec::new(),
            debug: false,
            state: TriggerState::Idle,
            has_fired: false,
            cooldown_remaining: 0.0,
            fire_count: 0,
            rejected_count: 0,
            last_rejection: None,
        }
    }

    /// Set the owning object (builder pattern).
    #[must_use]
    pub fn with_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }

    /// Add a condition (builder pattern).
    #[must_use]
    pub fn with_condition(mut self, condition: impl Into<Condition>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    /// Fire when any enabled condition passes instead of all (builder pattern).
    #[must_use]
    pub fn require_any(mut self) -> Self {
        self.require_all = false;
        self
    }

    /// Set whether the enabled conditions are ANDed (builder pattern).
    #[must_use]
    pub fn with_require_all(mut self, require_all: bool) -> Self {
        self.require_all = require_all;
        self
    }

    /// Fire at most once until reset (builder pattern).
    #[must_use]
    pub fn once(mut self) -> Self {
        self.can_repeat = false;
        self
    }

    /// Set whether the trigger may fire more than once (builder pattern).
    #[must_use]
    pub fn with_repeat(mut self, can_repeat: bool) -> Self {
        self.can_repeat = can_repeat;
        self
    }

    /// Set the cooldown in seconds (builder pattern). Negative values are
    /// treated as zero.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: f32) -> Self {
        self.cooldown = cooldown.max(0.0);
        self
    }

    /// Add an action (builder pattern).
    #[must_use]
    pub fn with_action(mut self, action: impl Into<Action>) -> Self {
        self.actions.push(action.into());
        self
    }

    /// Accept a stimulus kind (builder pattern). Without any, every kind is accepted.
    #[must_use]
    pub fn responds_to(mut self, stimulus: StimulusKind) -> Self {
        if !self.responds_to.contains(&stimulus) {
            self.responds_to.push(stimulus);
        }
        self
    }

    /// Log each evaluation at info level (builder pattern).
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Offer a stimulus. Fires when the trigger is idle, not consumed, the
    /// stimulus passes the filter and the conditions are satisfied.
    pub fn try_fire(&mut self, ctx: &Context, world: &WorldHandle) -> FireOutcome {
        if let Some(reason) = self.gate(ctx) {
            return self.reject(reason);
        }

        let ctx = self.prepare(ctx, world);
        if !self.conditions_met(&ctx) {
            return self.reject(RejectReason::ConditionsUnmet);
        }

        self.fire(&ctx, world);
        FireOutcome::Fired
    }

    /// Fire regardless of conditions, state and consumption. The fire is
    /// still recorded and the cooldown still starts.
    pub fn force_fire(&mut self, ctx: &Context, world: &WorldHandle) -> FireOutcome {
        debug!(trigger = %self.name, "forced fire");
        let ctx = self.prepare(ctx, world);
        self.fire(&ctx, world);
        FireOutcome::Fired
    }

    /// Count down the cooldown and advance owned actions.
    pub fn tick(&mut self, dt: f32, world: &WorldHandle) {
        if self.state == TriggerState::CoolingDown {
            self.cooldown_remaining -= dt.max(0.0);
            if self.cooldown_remaining <= TIME_EPSILON {
                self.cooldown_remaining = 0.0;
                self.state = TriggerState::Idle;
                debug!(trigger = %self.name, "cooldown finished");
            }
        }
        for action in &mut self.actions {
            action.tick(dt, world);
        }
    }

    /// Stop responding to stimuli. Running actions continue.
    pub fn disable(&mut self) {
        self.state = TriggerState::Disabled;
    }

    /// Resume responding. A disabled trigger returns to idle and any
    /// interrupted cooldown is dropped; other states are unchanged.
    pub fn enable(&mut self) {
        if self.state == TriggerState::Disabled {
            self.state = TriggerState::Idle;
            self.cooldown_remaining = 0.0;
        }
    }

    /// Return to a fresh idle state: clears `has_fired` and the cooldown,
    /// stops actions and resets condition memory.
    pub fn reset(&mut self) {
        self.state = TriggerState::Idle;
        self.has_fired = false;
        self.cooldown_remaining = 0.0;
        self.last_rejection = None;
        self.actions.iter_mut().for_each(Action::stop);
        self.conditions.iter_mut().for_each(Condition::reset);
    }

    fn gate(&self, ctx: &Context) -> Option<RejectReason> {
        match self.state {
            TriggerState::Disabled => Some(RejectReason::Disabled),
            TriggerState::CoolingDown => Some(RejectReason::CoolingDown),
            TriggerState::Idle if !self.can_repeat && self.has_fired => Some(RejectReason::Consumed),
            TriggerState::Idle if !self.responds_to.is_empty() && !self.responds_to.contains(&ctx.stimulus) => {
                Some(RejectReason::StimulusFiltered)
            }
            TriggerState::Idle => None,
        }
    }

    /// Fill in source and origin from the owning object.
    fn prepare<'a>(&self, ctx: &'a Context, world: &WorldHandle) -> Cow<'a, Context> {
        let Some(source) = self.source else {
            return Cow::Borrowed(ctx);
        };
        if ctx.source.is_some() {
            return Cow::Borrowed(ctx);
        }
        let mut owned = ctx.clone().with_source(source);
        if owned.origin.is_none() {
            owned.origin = world
                .try_borrow()
                .ok()
                .and_then(|w| w.get(source).map(|r| r.transform.position));
        }
        Cow::Owned(owned)
    }

    /// Short-circuits in declaration order.
    fn conditions_met(&mut self, ctx: &Context) -> bool {
        let debug = self.debug;
        let name = &self.name;
        let mut enabled = self.conditions.iter_mut().filter(|c| c.is_enabled()).peekable();
        if enabled.peek().is_none() {
            return true;
        }

        let mut check = |condition: &mut Condition| {
            let result = condition.evaluate(ctx);
            if debug {
                info!(trigger = %name, condition = condition.name(), result, "condition evaluated");
            }
            result
        };
        let met = if self.require_all {
            enabled.all(&mut check)
        } else {
            enabled.any(&mut check)
        };
        if debug {
            info!(trigger = %self.name, met, "conditions aggregated");
        }
        met
    }

    fn reject(&mut self, reason: RejectReason) -> FireOutcome {
        self.rejected_count += 1;
        self.last_rejection = Some(reason);
        if self.debug {
            info!(trigger = %self.name, ?reason, "trigger rejected");
        }
        FireOutcome::Rejected(reason)
    }

    fn fire(&mut self, ctx: &Context, world: &WorldHandle) {
        self.has_fired = true;
        self.fire_count += 1;
        self.last_rejection = None;
        if self.can_repeat && self.cooldown > 0.0 {
            self.state = TriggerState::CoolingDown;
            self.cooldown_remaining = self.cooldown;
        }
        debug!(
            trigger = %self.name,
            fire_count = self.fire_count,
            actions = self.actions.len(),
            "trigger fired"
        );

        for condition in &mut self.conditions {
            condition.commit(ctx);
        }
        for action in &mut self.actions {
            action.execute(ctx, world);
        }
    }

    #[must_use]
    pub fn id(&self) -> TriggerId {
        self.id
    }

    /// Replace the id. Used by registries that allocate ids.
    pub(crate) fn set_id(&mut self, id: TriggerId) {
        self.id = id;
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn source(&self) -> Option<EntityId> {
        self.source
    }

    #[must_use]
    pub fn state(&self) -> TriggerState {
        self.state
    }

    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.has_fired
    }

    #[must_use]
    pub fn fire_count(&self) -> u64 {
        self.fire_count
    }

    #[must_use]
    pub fn rejected_count(&self) -> u64 {
        self.rejected_count
    }

    #[must_use]
    pub fn last_rejection(&self) -> Option<RejectReason> {
        self.last_rejection
    }

    #[must_use]
    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }

    #[must_use]
    pub fn cooldown_remaining(&self) -> f32 {
        self.cooldown_remaining
    }

    #[must_use]
    pub fn can_repeat(&self) -> bool {
        self.can_repeat
    }

    #[must_use]
    pub fn requires_all(&self) -> bool {
        self.require_all
    }

    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Mutable access to the conditions, e.g. to toggle one at run time.
    pub fn conditions_mut(&mut self) -> &mut [Condition] {
        &mut self.conditions
    }

    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// `true` while any owned action is scheduled or executing.
    #[must_use]
    pub fn is_executing(&self) -> bool {
        self.actions.iter().any(Action::is_executing)
    }

    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }
}
