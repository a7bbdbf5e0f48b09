//! Event channels.
//!
//! A channel is a named broadcast point. Raising it calls every subscribed
//! handler synchronously, in subscription order, on the caller's stack.
//! Handlers may subscribe or unsubscribe (on this or any channel) while a
//! raise is in progress; the raise iterates a snapshot of the subscriber
//! list taken when it started and skips entries removed since.

use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use im::Vector;
use tracing::{debug, error, trace, warn};

use crate::core::{Clock, RuntimeError, RuntimeResult};

use super::dispatch::{DepthGuard, DEFAULT_MAX_DISPATCH_DEPTH};
use super::handle::{ChannelId, SubscriptionHandle};

type Handler<T> = Rc<dyn Fn(&T) -> RuntimeResult<()>>;

struct Subscription<T> {
    slot: u64,
    handler: Handler<T>,
}

impl<T> Clone for Subscription<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot,
            handler: Rc::clone(&self.handler),
        }
    }
}

/// What a raise did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaiseOutcome {
    /// Handlers ran. `failed` of them returned an error or panicked.
    Delivered { delivered: usize, failed: usize },
    /// The channel is inactive; nothing ran.
    Inactive,
    /// The nesting limit was reached; nothing ran.
    DepthExceeded,
}

impl RaiseOutcome {
    /// Whether handlers were invoked.
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    /// Number of handlers that returned successfully.
    #[must_use]
    pub fn delivered(&self) -> usize {
        match self {
            Self::Delivered { delivered, .. } => *delivered,
            _ => 0,
        }
    }

    /// Number of handlers that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        match self {
            Self::Delivered { failed, .. } => *failed,
            _ => 0,
        }
    }
}

/// A named broadcast point carrying payloads of type `T`.
///
/// Channels are shared through `Rc` and mutated through `&self`, so a
/// handler can hold the channel it listens on.
pub struct EventChannel<T: Clone + 'static> {
    id: ChannelId,
    name: String,
    description: String,
    active: Cell<bool>,
    raised_count: Cell<u64>,
    failure_count: Cell<u64>,
    last_raised_time: Cell<Option<f64>>,
    last_payload: RefCell<Option<T>>,
    subscribers: RefCell<Vector<Subscription<T>>>,
    next_slot: Cell<u64>,
    max_depth: Cell<usize>,
    clock: Clock,
}

/// A channel without a payload.
pub type VoidChannel = EventChannel<()>;

impl<T: Clone + 'static> EventChannel<T> {
    /// Create an active channel with its own clock.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ChannelId::next(),
            name: name.into(),
            description: String::new(),
            active: Cell::new(true),
            raised_count: Cell::new(0),
            failure_count: Cell::new(0),
            last_raised_time: Cell::new(None),
            last_payload: RefCell::new(None),
            subscribers: RefCell::new(Vector::new()),
            next_slot: Cell::new(0),
            max_depth: Cell::new(DEFAULT_MAX_DISPATCH_DEPTH),
            clock: Clock::new(),
        }
    }

    /// Add a description (builder pattern).
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Read raise times from a shared clock (builder pattern).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Set the nesting limit checked by this channel's raises (builder pattern).
    #[must_use]
    pub fn with_max_depth(self, depth: usize) -> Self {
        self.max_depth.set(depth);
        self
    }

    /// Wrap in an `Rc` for sharing with triggers and listeners.
    #[must_use]
    pub fn shared(self) -> Rc<Self> {
        Rc::new(self)
    }

    /// The channel's identity.
    #[must_use]
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// The channel's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The channel's description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Register a handler. Returns the handle used to remove it.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionHandle
    where
        F: Fn(&T) -> RuntimeResult<()> + 'static,
    {
        let slot = self.next_slot.get();
        self.next_slot.set(slot + 1);
        self.subscribers.borrow_mut().push_back(Subscription {
            slot,
            handler: Rc::new(handler),
        });
        trace!(channel = %self.name, slot, "subscribed");
        SubscriptionHandle {
            channel: self.id,
            slot,
        }
    }

    fn position(&self, slot: u64) -> Option<usize> {
        // Slots are issued in increasing order and removal keeps order.
        self.subscribers
            .borrow()
            .binary_search_by(|sub| sub.slot.cmp(&slot))
            .ok()
    }

    /// Remove a handler. Returns whether it was subscribed.
    ///
    /// Removing twice, or with another channel's handle, is a no-op.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        if handle.channel != self.id {
            return false;
        }
        match self.position(handle.slot) {
            Some(index) => {
                self.subscribers.borrow_mut().remove(index);
                trace!(channel = %self.name, slot = handle.slot, "unsubscribed");
                true
            }
            None => false,
        }
    }

    /// Check whether a handle is currently subscribed here.
    #[must_use]
    pub fn is_subscribed(&self, handle: SubscriptionHandle) -> bool {
        handle.channel == self.id && self.position(handle.slot).is_some()
    }

    /// Number of subscribed handlers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// Broadcast a payload to every subscriber.
    ///
    /// Never returns an error: handler failures and panics are caught per
    /// handler, logged, and counted in the outcome.
    pub fn raise(&self, payload: T) -> RaiseOutcome {
        if !self.active.get() {
            trace!(channel = %self.name, "inactive channel ignored raise");
            return RaiseOutcome::Inactive;
        }

        let limit = self.max_depth.get();
        let Some(_guard) = DepthGuard::enter(limit) else {
            let err = RuntimeError::DepthExceeded {
                channel: self.name.clone(),
                limit,
            };
            self.failure_count.set(self.failure_count.get() + 1);
            error!(channel = %self.name, error = %err, "raise dropped");
            return RaiseOutcome::DepthExceeded;
        };

        self.raised_count.set(self.raised_count.get() + 1);
        self.last_raised_time.set(Some(self.clock.now()));
        *self.last_payload.borrow_mut() = Some(payload.clone());

        let snapshot = self.subscribers.borrow().clone();
        debug!(channel = %self.name, subscribers = snapshot.len(), "raise");

        let mut delivered = 0;
        let mut failed = 0;
        for sub in snapshot.iter() {
            if self.position(sub.slot).is_none() {
                trace!(channel = %self.name, slot = sub.slot, "skipping handler removed mid-raise");
                continue;
            }

            let handler = Rc::clone(&sub.handler);
            let result = panic::catch_unwind(AssertUnwindSafe(|| handler(&payload)))
                .unwrap_or_else(|p| Err(RuntimeError::from_panic(p)));

            match result {
                Ok(()) => delivered += 1,
                Err(err) => {
                    failed += 1;
                    self.failure_count.set(self.failure_count.get() + 1);
                    warn!(channel = %self.name, slot = sub.slot, error = %err, "handler failed");
                }
            }
        }

        RaiseOutcome::Delivered { delivered, failed }
    }

    /// Clear counters and payload history. Subscribers and `active` are kept.
    pub fn reset(&self) {
        self.raised_count.set(0);
        self.failure_count.set(0);
        self.last_raised_time.set(None);
        *self.last_payload.borrow_mut() = None;
    }

    /// Activate or deactivate the channel.
    pub fn set_active(&self, active: bool) {
        self.active.set(active);
    }

    /// Whether raises are delivered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Number of delivered raises since creation or the last reset.
    #[must_use]
    pub fn raised_count(&self) -> u64 {
        self.raised_count.get()
    }

    /// Number of handler failures and dropped raises since the last reset.
    #[must_use]
    pub fn failure_count(&self) -> u64 {
        self.failure_count.get()
    }

    /// Clock time of the last delivered raise.
    #[must_use]
    pub fn last_raised_time(&self) -> Option<f64> {
        self.last_raised_time.get()
    }

    /// Payload of the last delivered raise. Diagnostic only.
    #[must_use]
    pub fn last_payload(&self) -> Option<T> {
        self.last_payload.borrow().clone()
    }
}

impl EventChannel<()> {
    /// Raise a channel that carries no payload.
    pub fn raise_void(&self) -> RaiseOutcome {
        self.raise(())
    }
}

impl<T: Clone + 'static> std::fmt::Debug for EventChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("active", &self.active.get())
            .field("raised_count", &self.raised_count.get())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::dispatch::current_depth;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Box<dyn Fn(&()) -> RuntimeResult<()>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log2 = Rc::clone(&log);
        let make = move |label: &'static str| -> Box<dyn Fn(&()) -> RuntimeResult<()>> {
            let log = Rc::clone(&log2);
            Box::new(move |_: &()| {
                log.borrow_mut().push(label);
                Ok(())
            })
        };
        (log, make)
    }

    #[test]
    fn test_dispatch_in_subscription_order() {
        let channel = VoidChannel::new("Door");
        let (log, make) = recorder();
        channel.subscribe(make("a"));
        channel.subscribe(make("b"));
        channel.subscribe(make("c"));

        let outcome = channel.raise_void();

        assert_eq!(outcome, RaiseOutcome::Delivered { delivered: 3, failed: 0 });
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
        assert_eq!(channel.raised_count(), 1);
    }

    #[test]
    fn test_inactive_channel_does_nothing() {
        let channel = VoidChannel::new("Door");
        let (log, make) = recorder();
        channel.subscribe(make("a"));
        channel.set_active(false);

        assert_eq!(channel.raise_void(), RaiseOutcome::Inactive);
        assert!(log.borrow().is_empty());
        assert_eq!(channel.raised_count(), 0);
        assert_eq!(channel.last_raised_time(), None);

        channel.set_active(true);
        assert!(channel.raise_void().is_delivered());
        assert_eq!(*log.borrow(), vec!["a"]);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let channel = VoidChannel::new("Door");
        let (log, make) = recorder();
        let handle = channel.subscribe(make("a"));

        assert!(channel.is_subscribed(handle));
        assert!(channel.unsubscribe(handle));
        assert!(!channel.unsubscribe(handle));
        assert!(!channel.is_subscribed(handle));

        channel.raise_void();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_foreign_handle_ignored() {
        let a = VoidChannel::new("A");
        let b = VoidChannel::new("B");
        let handle = a.subscribe(|_| Ok(()));
        assert!(!b.unsubscribe(handle));
        assert_eq!(a.subscriber_count(), 1);
    }

    #[test]
    fn test_failing_handler_does_not_block_others() {
        let channel = VoidChannel::new("Door");
        let (log, make) = recorder();
        channel.subscribe(make("a"));
        channel.subscribe(|_| Err(RuntimeError::Custom("nope".into())));
        channel.subscribe(|_| panic!("handler exploded"));
        channel.subscribe(make("d"));

        let outcome = channel.raise_void();

        assert_eq!(outcome, RaiseOutcome::Delivered { delivered: 2, failed: 2 });
        assert_eq!(*log.borrow(), vec!["a", "d"]);
        assert_eq!(channel.failure_count(), 2);
        assert_eq!(current_depth(), 0);
    }

    #[test]
    fn test_unsubscribe_unvisited_handler_mid_raise() {
        let channel = Rc::new(VoidChannel::new("Door"));
        let (log, make) = recorder();
        let victim: Rc<Cell<Option<SubscriptionHandle>>> = Rc::new(Cell::new(None));

        {
            let channel_ref = Rc::downgrade(&channel);
            let victim = Rc::clone(&victim);
            let log = Rc::clone(&log);
            channel.subscribe(move |_| {
                log.borrow_mut().push("remover");
                if let (Some(ch), Some(handle)) = (channel_ref.upgrade(), victim.get()) {
                    ch.unsubscribe(handle);
                }
                Ok(())
            });
        }
        victim.set(Some(channel.subscribe(make("victim"))));
        channel.subscribe(make("after"));

        channel.raise_void();
        assert_eq!(*log.borrow(), vec!["remover", "after"]);

        // Re-subscribing restores delivery on later raises.
        victim.set(None);
        channel.subscribe(make("victim"));
        log.borrow_mut().clear();
        channel.raise_void();
        assert_eq!(*log.borrow(), vec!["remover", "after", "victim"]);
    }

    #[test]
    fn test_subscribe_mid_raise_waits_for_next_raise() {
        let channel = Rc::new(VoidChannel::new("Door"));
        let count = Rc::new(Cell::new(0));
        {
            let weak = Rc::downgrade(&channel);
            let count = Rc::clone(&count);
            let added = Cell::new(false);
            channel.subscribe(move |_| {
                if !added.replace(true) {
                    if let Some(ch) = weak.upgrade() {
                        let count = Rc::clone(&count);
                        ch.subscribe(move |_| {
                            count.set(count.get() + 1);
                            Ok(())
                        });
                    }
                }
                Ok(())
            });
        }

        channel.raise_void();
        assert_eq!(count.get(), 0);
        channel.raise_void();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_typed_payload_and_reset() {
        let clock = Clock::new();
        let channel = EventChannel::<i32>::new("Score").with_clock(clock.clone());
        let total = Rc::new(Cell::new(0));
        {
            let total = Rc::clone(&total);
            channel.subscribe(move |v: &i32| {
                total.set(total.get() + *v);
                Ok(())
            });
        }

        clock.advance(2.0);
        channel.raise(5);
        channel.raise(7);

        assert_eq!(total.get(), 12);
        assert_eq!(channel.raised_count(), 2);
        assert_eq!(channel.last_payload(), Some(7));
        assert_eq!(channel.last_raised_time(), Some(2.0));

        channel.reset();
        assert_eq!(channel.raised_count(), 0);
        assert_eq!(channel.last_payload(), None);
        assert_eq!(channel.last_raised_time(), None);
        assert_eq!(channel.subscriber_count(), 1);
        assert!(channel.is_active());
    }

    #[test]
    fn test_self_raising_handler_is_bounded() {
        let channel = Rc::new(VoidChannel::new("Echo").with_max_depth(4));
        let calls = Rc::new(Cell::new(0));
        let dropped = Rc::new(Cell::new(0));
        {
            let weak = Rc::downgrade(&channel);
            let calls = Rc::clone(&calls);
            let dropped = Rc::clone(&dropped);
            channel.subscribe(move |_| {
                calls.set(calls.get() + 1);
                if let Some(ch) = weak.upgrade() {
                    if ch.raise_void() == RaiseOutcome::DepthExceeded {
                        dropped.set(dropped.get() + 1);
                    }
                }
                Ok(())
            });
        }

        channel.raise_void();

        assert_eq!(calls.get(), 4);
        assert_eq!(dropped.get(), 1);
        assert_eq!(channel.raised_count(), 4);
        assert_eq!(current_depth(), 0);
    }
}
