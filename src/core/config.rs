//! Runtime configuration.
//!
//! Scene content (channels, triggers, listeners) is authored data handled by
//! [`crate::setup`]. `RuntimeConfig` holds the knobs of the engine itself.

use serde::{Deserialize, Serialize};

use crate::channels::DEFAULT_MAX_DISPATCH_DEPTH;

/// Engine-wide settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Maximum nesting of channel raises on one call stack.
    /// A raise past this depth is dropped and reported.
    pub max_dispatch_depth: usize,

    /// Seed for the world RNG.
    pub seed: u64,

    /// Log every trigger evaluation at `info` level, regardless of the
    /// per-trigger debug flag.
    pub debug: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_dispatch_depth: DEFAULT_MAX_DISPATCH_DEPTH,
            seed: 42,
            debug: false,
        }
    }
}

impl RuntimeConfig {
    /// Set the dispatch depth limit.
    #[must_use]
    pub fn with_max_dispatch_depth(mut self, depth: usize) -> Self {
        self.max_dispatch_depth = depth;
        self
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enable global debug logging.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
