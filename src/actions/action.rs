//! The action envelope: delay, lifecycle and failure recovery.

use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::clock::reached;
use crate::core::{Context, RuntimeError, RuntimeResult, WorldHandle};

use super::kind::{ActionKind, Running};

/// Lifecycle state of an action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionState {
    #[default]
    Idle,
    /// Waiting for the delay to elapse.
    Scheduled,
    /// The effect has started and not yet finished.
    Executing,
}

/// What `execute` does while the action is already busy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reentry {
    /// Stop the current cycle and start a new one.
    #[default]
    Restart,
    /// Keep the current cycle and drop the new request.
    Ignore,
}

/// A unit of effect with an optional start delay.
///
/// Actions are driven by their owner: `execute` starts a cycle and `tick`
/// advances it. Effect errors and panics never escape; they return the
/// action to `Idle` and are counted in [`Action::failure_count`].
#[derive(Debug)]
pub struct Action {
    name: String,
    kind: ActionKind,
    delay: f32,
    reentry: Reentry,
    state: ActionState,
    elapsed: f32,
    pending: Option<Context>,
    running: Option<Running>,
    execution_count: u64,
    failure_count: u64,
}

impl Action {
    /// Create an undelayed action named after its kind.
    pub fn new(kind: ActionKind) -> Self {
        Self {
            name: kind.name().to_string(),
            kind,
            delay: 0.0,
            reentry: Reentry::Restart,
            state: ActionState::Idle,
            elapsed: 0.0,
            pending: None,
            running: None,
            execution_count: 0,
            failure_count: 0,
        }
    }

    /// Set the name used in logs (builder pattern).
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the start delay in seconds (builder pattern). Negative values are
    /// treated as zero.
    #[must_use]
    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    /// Set the re-entry policy (builder pattern).
    #[must_use]
    pub fn with_reentry(mut self, reentry: Reentry) -> Self {
        self.reentry = reentry;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    #[must_use]
    pub fn delay(&self) -> f32 {
        self.delay
    }

    #[must_use]
    pub fn reentry(&self) -> Reentry {
        self.reentry
    }

    #[must_use]
    pub fn state(&self) -> ActionState {
        self.state
    }

    /// `true` while scheduled or executing.
    #[must_use]
    pub fn is_executing(&self) -> bool {
        self.state != ActionState::Idle
    }

    /// Number of accepted `execute` calls.
    #[must_use]
    pub fn execution_count(&self) -> u64 {
        self.execution_count
    }

    /// Number of cycles that ended in an error or panic.
    #[must_use]
    pub fn failure_count(&self) -> u64 {
        self.failure_count
    }

    /// Start a cycle with the given context.
    ///
    /// With a delay the action becomes `Scheduled`; otherwise the effect
    /// begins now. Instant effects finish before this returns.
    pub fn execute(&mut self, ctx: &Context, world: &WorldHandle) {
        if self.is_executing() {
            match self.reentry {
                Reentry::Ignore => {
                    debug!(action = %self.name, "action busy, execute ignored");
                    return;
                }
                Reentry::Restart => {
                    debug!(action = %self.name, "action busy, restarting");
                    self.stop();
                }
            }
        }

        self.execution_count += 1;
        if self.delay > 0.0 {
            debug!(action = %self.name, delay = self.delay, "action scheduled");
            self.state = ActionState::Scheduled;
            self.elapsed = 0.0;
            self.pending = Some(ctx.clone());
            return;
        }
        self.begin(ctx, world);
    }

    /// Advance the delay timer or the running effect by `dt` seconds.
    pub fn tick(&mut self, dt: f32, world: &WorldHandle) {
        match self.state {
            ActionState::Idle => {}
            ActionState::Scheduled => {
                self.elapsed += dt.max(0.0);
                if reached(self.elapsed, self.delay) {
                    let ctx = self.pending.take().unwrap_or_default();
                    self.begin(&ctx, world);
                }
            }
            ActionState::Executing => {
                let Some(mut running) = self.running.take() else {
                    self.finish();
                    return;
                };
                let kind = &mut self.kind;
                let result = panic::catch_unwind(AssertUnwindSafe(|| kind.tick(&mut running, dt, world)))
                    .unwrap_or_else(|p| Err(RuntimeError::from_panic(p)));
                match result {
                    Ok(true) => self.finish(),
                    Ok(false) => self.running = Some(running),
                    Err(err) => self.fail(err),
                }
            }
        }
    }

    /// Cancel any pending or running cycle. Valid in every state; partial
    /// effects already applied are kept.
    pub fn stop(&mut self) {
        if self.state == ActionState::Idle && self.running.is_none() {
            return;
        }
        let was_running = self.running.take().is_some();
        self.kind.stop(was_running);
        self.state = ActionState::Idle;
        self.elapsed = 0.0;
        self.pending = None;
    }

    fn begin(&mut self, ctx: &Context, world: &WorldHandle) {
        debug!(action = %self.name, kind = self.kind.name(), "action started");
        self.state = ActionState::Executing;
        self.elapsed = 0.0;

        let kind = &mut self.kind;
        let result: RuntimeResult<Option<Running>> =
            panic::catch_unwind(AssertUnwindSafe(|| kind.begin(ctx, world)))
                .unwrap_or_else(|p| Err(RuntimeError::from_panic(p)));
        match result {
            Ok(Some(running)) => self.running = Some(running),
            Ok(None) => self.finish(),
            Err(err) => self.fail(err),
        }
    }

    fn finish(&mut self) {
        self.state = ActionState::Idle;
        self.running = None;
        self.pending = None;
    }

    fn fail(&mut self, err: RuntimeError) {
        self.failure_count += 1;
        let err = RuntimeError::Execution {
            action: self.name.clone(),
            reason: err.to_string(),
        };
        warn!(action = %self.name, error = %err, "action failed");
        self.kind.stop(false);
        self.finish();
    }
}

impl From<ActionKind> for Action {
    fn from(kind: ActionKind) -> Self {
        Self::new(kind)
    }
}
