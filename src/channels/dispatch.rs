//! Dispatch depth tracking.
//!
//! A raise can run handlers that raise again (trigger → event → listener →
//! action → event ...). The depth of those nested raises is counted per
//! thread across all channels, so a cycle through several channels is
//! bounded by the same limit as a channel raising itself.

use std::cell::Cell;

/// Default limit on nested raises.
pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 32;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// RAII marker for one level of nested dispatch.
pub(crate) struct DepthGuard {
    _private: (),
}

impl DepthGuard {
    /// Enter one level, or `None` if `limit` levels are already active.
    pub(crate) fn enter(limit: usize) -> Option<Self> {
        DEPTH.with(|depth| {
            let current = depth.get();
            if current >= limit {
                None
            } else {
                depth.set(current + 1);
                Some(Self { _private: () })
            }
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Number of raises currently on this thread's call stack.
#[must_use]
pub fn current_depth() -> usize {
    DEPTH.with(Cell::get)
}
