//! The condition contract.
//!
//! Every condition kind shares one evaluation envelope:
//!
//! - disabled ⇒ `true`, whatever `invert` says (a disabled condition never
//!   blocks a trigger)
//! - enabled ⇒ `raw ^ invert`
//! - a failing or panicking raw check counts as `false` and is logged

use std::panic::{self, AssertUnwindSafe};

use tracing::warn;

use crate::core::{Context, RuntimeError, RuntimeResult};

use super::kind::ConditionKind;

/// A configured predicate over a [`Context`].
#[derive(Debug)]
pub struct Condition {
    name: String,
    kind: ConditionKind,
    enabled: bool,
    invert: bool,
    evaluations: u64,
    failures: u64,
    last_result: Option<bool>,
}

impl Condition {
    /// Create an enabled, non-inverted condition named after its kind.
    pub fn new(kind: ConditionKind) -> Self {
        Self {
            name: kind.name().to_string(),
            kind,
            enabled: true,
            invert: false,
            evaluations: 0,
            failures: 0,
            last_result: None,
        }
    }

    /// Set the name used in logs (builder pattern).
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Invert the raw result (builder pattern).
    #[must_use]
    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    /// Start disabled (builder pattern).
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// The condition's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The condition's kind.
    #[must_use]
    pub fn kind(&self) -> &ConditionKind {
        &self.kind
    }

    /// Whether the condition takes part in evaluation.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the condition.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether the raw result is inverted.
    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.invert
    }

    /// Set result inversion.
    pub fn set_inverted(&mut self, invert: bool) {
        self.invert = invert;
    }

    /// Evaluate, reporting raw-check failures to the caller.
    pub fn try_evaluate(&mut self, ctx: &Context) -> RuntimeResult<bool> {
        if !self.enabled {
            return Ok(true);
        }

        self.evaluations += 1;
        let kind = &mut self.kind;
        let raw = panic::catch_unwind(AssertUnwindSafe(|| kind.raw(ctx)))
            .unwrap_or_else(|p| Err(RuntimeError::from_panic(p)));

        match raw {
            Ok(raw) => {
                let result = raw != self.invert;
                self.last_result = Some(result);
                Ok(result)
            }
            Err(err) => {
                self.failures += 1;
                self.last_result = Some(false);
                Err(RuntimeError::Evaluation {
                    condition: self.name.clone(),
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Evaluate. Failures are logged and count as `false`.
    pub fn evaluate(&mut self, ctx: &Context) -> bool {
        match self.try_evaluate(ctx) {
            Ok(result) => result,
            Err(err) => {
                warn!(condition = %self.name, error = %err, "condition evaluation failed");
                false
            }
        }
    }

    /// Record a fire of the owning trigger. Disabled conditions keep no
    /// memory of it.
    pub fn commit(&mut self, ctx: &Context) {
        if self.enabled {
            self.kind.commit(ctx);
        }
    }

    /// Clear kind-local memory and diagnostics.
    pub fn reset(&mut self) {
        self.kind.reset();
        self.evaluations = 0;
        self.failures = 0;
        self.last_result = None;
    }

    /// Number of enabled evaluations since the last reset.
    #[must_use]
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Number of failed evaluations since the last reset.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Result of the most recent enabled evaluation.
    #[must_use]
    pub fn last_result(&self) -> Option<bool> {
        self.last_result
    }
}

impl From<ConditionKind> for Condition {
    fn from(kind: ConditionKind) -> Self {
        Self::new(kind)
    }
}
