//! Event channel integration tests.
//!
//! These tests cover dispatch order, mid-raise subscription changes, nested
//! raise bounds, and channels driving listeners.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rust_triggers::actions::{ActionEffect, ActionKind, EffectStatus};
use rust_triggers::channels::{EventChannel, RaiseOutcome, SubscriptionHandle, VoidChannel};
use rust_triggers::core::{Context, Payload, RuntimeResult, World, WorldHandle};
use rust_triggers::listeners::Listener;

type Log = Rc<RefCell<Vec<String>>>;

/// Records its label each time it begins.
struct Record {
    label: &'static str,
    log: Log,
}

impl ActionEffect for Record {
    fn kind(&self) -> &str {
        "record"
    }

    fn begin(&mut self, _ctx: &Context, _world: &WorldHandle) -> RuntimeResult<EffectStatus> {
        self.log.borrow_mut().push(self.label.to_string());
        Ok(EffectStatus::Finished)
    }
}

fn record(label: &'static str, log: &Log) -> ActionKind {
    ActionKind::Custom(Box::new(Record {
        label,
        log: Rc::clone(log),
    }))
}

fn labels(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

/// Two listeners on one channel: one raise runs each action once, in
/// subscription order.
#[test]
fn test_door_channel_with_two_listeners() {
    let world = World::new(1).into_handle();
    let door: Rc<EventChannel<Payload>> = EventChannel::new("Door").shared();
    let log: Log = Rc::default();

    let mut opener = Listener::new("Listener1", Rc::clone(&world)).with_action(record("open", &log));
    let mut sound = Listener::new("Listener2", Rc::clone(&world)).with_action(record("play_sound", &log));
    opener.bind(&door);
    sound.bind(&door);

    let outcome = door.raise(Payload::None);

    assert_eq!(outcome, RaiseOutcome::Delivered { delivered: 2, failed: 0 });
    assert_eq!(labels(&log), vec!["open", "play_sound"]);
    assert_eq!(door.raised_count(), 1);
    assert_eq!(opener.received_count(), 1);
    assert_eq!(sound.received_count(), 1);
}

/// Handlers run in the order they subscribed.
#[test]
fn test_dispatch_follows_subscription_order() {
    let channel = VoidChannel::new("Order").shared();
    let seen = Rc::new(RefCell::new(Vec::new()));

    for i in 0..5 {
        let seen = Rc::clone(&seen);
        channel.subscribe(move |_| {
            seen.borrow_mut().push(i);
            Ok(())
        });
    }

    channel.raise_void();
    assert_eq!(*seen.borrow(), vec![0, 1, 2, 3, 4]);
}

/// Unsubscribing a handler that has not run yet skips it for this raise
/// only. Subscribing it again restores delivery.
#[test]
fn test_unsubscribe_during_raise() {
    let channel = VoidChannel::new("Mid").shared();
    let later_calls = Rc::new(Cell::new(0));
    let later_handle: Rc<Cell<Option<SubscriptionHandle>>> = Rc::default();

    let weak = Rc::downgrade(&channel);
    let target = Rc::clone(&later_handle);
    channel.subscribe(move |_| {
        if let (Some(channel), Some(handle)) = (weak.upgrade(), target.take()) {
            channel.unsubscribe(handle);
        }
        Ok(())
    });

    let subscribe_later = |channel: &VoidChannel| {
        let calls = Rc::clone(&later_calls);
        channel.subscribe(move |_| {
            calls.set(calls.get() + 1);
            Ok(())
        })
    };
    later_handle.set(Some(subscribe_later(&*channel)));

    assert_eq!(channel.raise_void(), RaiseOutcome::Delivered { delivered: 1, failed: 0 });
    assert_eq!(later_calls.get(), 0);

    // Gone for future raises too, until it subscribes again.
    channel.raise_void();
    assert_eq!(later_calls.get(), 0);

    subscribe_later(&*channel);
    channel.raise_void();
    assert_eq!(later_calls.get(), 1);
}

/// A handler added mid-raise first runs on the next raise.
#[test]
fn test_subscribe_during_raise() {
    let channel = VoidChannel::new("Grow").shared();
    let added_calls = Rc::new(Cell::new(0));
    let added = Rc::new(Cell::new(false));

    let weak = Rc::downgrade(&channel);
    let calls = Rc::clone(&added_calls);
    let once = Rc::clone(&added);
    channel.subscribe(move |_| {
        if !once.replace(true) {
            if let Some(channel) = weak.upgrade() {
                let calls = Rc::clone(&calls);
                channel.subscribe(move |_| {
                    calls.set(calls.get() + 1);
                    Ok(())
                });
            }
        }
        Ok(())
    });

    channel.raise_void();
    assert_eq!(added_calls.get(), 0);
    channel.raise_void();
    assert_eq!(added_calls.get(), 1);
}

/// One failing handler does not stop the rest.
#[test]
fn test_failing_handler_is_isolated() {
    let channel = VoidChannel::new("Faulty").shared();
    let after = Rc::new(Cell::new(false));

    channel.subscribe(|_| Err(rust_triggers::core::RuntimeError::Custom("boom".into())));
    channel.subscribe(|_| panic!("handler panicked"));
    let flag = Rc::clone(&after);
    channel.subscribe(move |_| {
        flag.set(true);
        Ok(())
    });

    assert_eq!(channel.raise_void(), RaiseOutcome::Delivered { delivered: 1, failed: 2 });
    assert!(after.get());
    assert_eq!(channel.failure_count(), 2);
}

/// A channel that re-raises itself stops at the depth limit instead of
/// overflowing the stack.
#[test]
fn test_self_raise_is_bounded() {
    let channel = EventChannel::<u32>::new("Echo").with_max_depth(4).shared();
    let calls = Rc::new(Cell::new(0));

    let weak = Rc::downgrade(&channel);
    let counter = Rc::clone(&calls);
    channel.subscribe(move |depth| {
        counter.set(counter.get() + 1);
        if let Some(channel) = weak.upgrade() {
            channel.raise(depth + 1);
        }
        Ok(())
    });

    assert!(channel.raise(0).is_delivered());
    assert_eq!(calls.get(), 4);
    assert_eq!(channel.raised_count(), 4);
    assert_eq!(channel.failure_count(), 1);
    assert_eq!(rust_triggers::channels::current_depth(), 0);
}

/// Inactive channels drop raises without counting them.
#[test]
fn test_inactive_channel() {
    let channel = VoidChannel::new("Muted").shared();
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    channel.subscribe(move |_| {
        counter.set(counter.get() + 1);
        Ok(())
    });

    channel.set_active(false);
    assert_eq!(channel.raise_void(), RaiseOutcome::Inactive);
    assert_eq!(calls.get(), 0);
    assert_eq!(channel.raised_count(), 0);

    channel.set_active(true);
    channel.raise_void();
    assert_eq!(calls.get(), 1);
}

/// A cycle through two listeners is replayed once after the first listener's
/// actions return, then the second lap is rejected and the outer raise still
/// completes.
#[test]
fn test_listener_cycle_is_rejected() {
    let world = World::new(1).into_handle();
    let ping: Rc<EventChannel<Payload>> = EventChannel::new("Ping").shared();
    let pong: Rc<EventChannel<Payload>> = EventChannel::new("Pong").shared();

    let mut a = Listener::new("A", Rc::clone(&world)).with_action(ActionKind::raise(Rc::clone(&pong), Payload::None));
    let mut b = Listener::new("B", Rc::clone(&world)).with_action(ActionKind::raise(Rc::clone(&ping), Payload::None));
    a.bind(&ping);
    b.bind(&pong);

    ping.raise(Payload::None);

    assert_eq!(ping.raised_count(), 3);
    assert_eq!(pong.raised_count(), 2);
    assert_eq!(ping.failure_count(), 1);
    assert_eq!(pong.failure_count(), 0);
    assert_eq!(a.received_count(), 2);
    assert_eq!(b.received_count(), 2);
}
