//! Channel-bound action lists.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::actions::{Action, ActionState};
use crate::channels::{EventChannel, SubscriptionHandle};
use crate::core::{Context, IntoContext, RuntimeError, RuntimeResult, WorldHandle};

/// The part of a listener its channel handler reaches through a weak
/// reference.
///
/// Flags and counters live in cells so they stay readable while actions run.
/// Each action sits in its own `RefCell` and is borrowed only while it is
/// being started, ticked or stopped.
#[derive(Debug)]
struct ListenerCore {
    name: String,
    actions: RefCell<Vec<RefCell<Action>>>,
    enabled: Cell<bool>,
    received: Cell<u64>,
    /// Set while the listener starts or ticks its actions.
    busy: Cell<bool>,
    /// Set while deferred receipts are replayed.
    replaying: Cell<bool>,
    deferred: RefCell<VecDeque<Context>>,
    world: WorldHandle,
}

impl ListenerCore {
    /// Fill in actor data the payload did not carry from the world.
    fn enrich(&self, mut ctx: Context) -> Context {
        let Some(actor) = ctx.actor else {
            return ctx;
        };
        if let Ok(world) = self.world.try_borrow() {
            if let Some(record) = world.get(actor) {
                ctx.tag.get_or_insert_with(|| record.tag.clone());
                ctx.layer.get_or_insert(record.layer);
                ctx.position.get_or_insert(record.transform.position);
            }
        }
        ctx
    }

    /// Handle one event from the channel or from [`Listener::receive`].
    ///
    /// An event arriving while the listener is busy is queued and replayed
    /// once the running actions return. An event raised by a replay itself
    /// is rejected.
    fn deliver(&self, ctx: Context) -> RuntimeResult<()> {
        if !self.enabled.get() {
            trace!(listener = %self.name, "disabled listener ignored event");
            return Ok(());
        }
        if self.busy.get() {
            if self.replaying.get() {
                return Err(RuntimeError::ListenerReentered(self.name.clone()));
            }
            trace!(listener = %self.name, "event deferred until running actions return");
            self.deferred.borrow_mut().push_back(ctx);
            return Ok(());
        }
        self.run(|core| core.start(ctx));
        Ok(())
    }

    fn run(&self, f: impl FnOnce(&Self)) {
        self.busy.set(true);
        f(self);

        self.replaying.set(true);
        loop {
            let next = self.deferred.borrow_mut().pop_front();
            let Some(ctx) = next else {
                break;
            };
            if self.enabled.get() {
                self.start(ctx);
            }
        }
        self.replaying.set(false);
        self.busy.set(false);
    }

    fn start(&self, ctx: Context) {
        self.received.set(self.received.get() + 1);
        debug!(listener = %self.name, "listener received event");
        let ctx = self.enrich(ctx);
        self.each_action(|action| action.execute(&ctx, &self.world));
    }

    fn each_action(&self, mut f: impl FnMut(&mut Action)) {
        let Ok(actions) = self.actions.try_borrow() else {
            warn!(listener = %self.name, "action list is being modified; call ignored");
            return;
        };
        for (index, cell) in actions.iter().enumerate() {
            match cell.try_borrow_mut() {
                Ok(mut action) => f(&mut action),
                Err(_) => warn!(listener = %self.name, index, "action is already running; skipped"),
            }
        }
    }
}

/// Runs an ordered list of actions each time a bound channel is raised.
///
/// The listener owns its actions; the channel only holds a handler with a
/// weak reference to them, so dropping the listener is enough to detach it.
/// An event that reaches the listener while its own actions are running is
/// deferred until they return, so a delayed action may re-raise its own
/// channel every time it fires. A cycle that comes back again from the
/// deferred run is rejected with [`RuntimeError::ListenerReentered`].
pub struct Listener<T: IntoContext + Clone + 'static> {
    core: Rc<ListenerCore>,
    binding: Option<(Rc<EventChannel<T>>, SubscriptionHandle)>,
}

impl<T: IntoContext + Clone + 'static> Listener<T> {
    /// Create an enabled, unbound listener acting on `world`.
    pub fn new(name: impl Into<String>, world: WorldHandle) -> Self {
        Self {
            core: Rc::new(ListenerCore {
                name: name.into(),
                actions: RefCell::new(Vec::new()),
                enabled: Cell::new(true),
                received: Cell::new(0),
                busy: Cell::new(false),
                replaying: Cell::new(false),
                deferred: RefCell::new(VecDeque::new()),
                world,
            }),
            binding: None,
        }
    }

    /// Add an action (builder pattern).
    #[must_use]
    pub fn with_action(self, action: impl Into<Action>) -> Self {
        match self.core.actions.try_borrow_mut() {
            Ok(mut actions) => actions.push(RefCell::new(action.into())),
            Err(_) => warn!(listener = %self.core.name, "listener is busy dispatching; action not added"),
        }
        self
    }

    /// Start enabled or disabled (builder pattern).
    #[must_use]
    pub fn with_enabled(self, enabled: bool) -> Self {
        self.set_enabled(enabled);
        self
    }

    fn read<R>(&self, f: impl FnOnce(&[RefCell<Action>]) -> R) -> Option<R> {
        self.core.actions.try_borrow().ok().map(|actions| f(&actions))
    }

    /// Subscribe to `channel`, replacing any existing binding.
    pub fn bind(&mut self, channel: &Rc<EventChannel<T>>) -> SubscriptionHandle {
        self.unbind();

        let weak: Weak<ListenerCore> = Rc::downgrade(&self.core);
        let handle = channel.subscribe(move |payload: &T| -> RuntimeResult<()> {
            match weak.upgrade() {
                Some(core) => core.deliver(payload.to_context()),
                None => Ok(()),
            }
        });

        debug!(listener = %self.name(), channel = channel.name(), "listener bound");
        self.binding = Some((Rc::clone(channel), handle));
        handle
    }

    /// Remove the subscription. Returns whether the listener was bound.
    pub fn unbind(&mut self) -> bool {
        match self.binding.take() {
            Some((channel, handle)) => {
                channel.unsubscribe(handle);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// The channel this listener is bound to.
    #[must_use]
    pub fn channel(&self) -> Option<&Rc<EventChannel<T>>> {
        self.binding.as_ref().map(|(channel, _)| channel)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// A disabled listener ignores events but keeps advancing running actions.
    pub fn set_enabled(&self, enabled: bool) {
        self.core.enabled.set(enabled);
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.core.enabled.get()
    }

    /// Run the actions as if the bound channel had delivered `payload`.
    pub fn receive(&self, payload: &T) {
        if let Err(err) = self.core.deliver(payload.to_context()) {
            warn!(listener = %self.core.name, error = %err, "event rejected");
        }
    }

    /// Advance owned actions.
    ///
    /// Events raised by the actions while they advance are handled after
    /// the last action has been ticked.
    pub fn tick(&self, dt: f32) {
        if self.core.busy.get() {
            warn!(listener = %self.core.name, "listener is busy dispatching; tick ignored");
            return;
        }
        self.core.run(|core| core.each_action(|action| action.tick(dt, &core.world)));
    }

    /// Stop every owned action and drop deferred events.
    pub fn stop_all(&self) {
        self.core.deferred.borrow_mut().clear();
        self.core.each_action(Action::stop);
    }

    /// Number of events handled while enabled.
    #[must_use]
    pub fn received_count(&self) -> u64 {
        self.core.received.get()
    }

    /// `true` while any owned action is scheduled or executing.
    ///
    /// An action that is on the call stack right now counts as executing.
    #[must_use]
    pub fn is_executing(&self) -> bool {
        self.read(|actions| {
            actions
                .iter()
                .any(|cell| cell.try_borrow().map_or(true, |action| action.is_executing()))
        })
        .unwrap_or(false)
    }

    #[must_use]
    pub fn action_count(&self) -> usize {
        self.read(|actions| actions.len()).unwrap_or(0)
    }

    /// Lifecycle state of each owned action, in order.
    ///
    /// An action that is on the call stack right now reports `Executing`.
    #[must_use]
    pub fn action_states(&self) -> Vec<ActionState> {
        self.read(|actions| {
            actions
                .iter()
                .map(|cell| cell.try_borrow().map_or(ActionState::Executing, |action| action.state()))
                .collect()
        })
        .unwrap_or_default()
    }
}

impl<T: IntoContext + Clone + 'static> Drop for Listener<T> {
    fn drop(&mut self) {
        self.unbind();
    }
}

impl<T: IntoContext + Clone + 'static> std::fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("name", &self.name())
            .field("bound_to", &self.channel().map(|c| c.name().to_string()))
            .field("received", &self.received_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ActionKind, ActivationMode, Target};
    use crate::channels::{RaiseOutcome, VoidChannel};
    use crate::core::{EntityId, Payload, Vec3, World};

    fn world() -> WorldHandle {
        World::new(1).into_handle()
    }

    #[test]
    fn test_bound_listener_runs_actions() {
        let world = world();
        let lamp = world.borrow_mut().spawn("Lamp", "Prop");
        let channel = VoidChannel::new("Switch").shared();

        let mut listener = Listener::new("Lamp toggle", Rc::clone(&world)).with_action(ActionKind::SetActive {
            target: Target::Entity(lamp),
            mode: ActivationMode::Toggle,
        });
        listener.bind(&channel);

        channel.raise_void();
        assert_eq!(listener.received_count(), 1);
        assert!(!world.borrow().get(lamp).unwrap().active);
    }

    #[test]
    fn test_disabled_listener_ignores_events() {
        let world = world();
        let channel = VoidChannel::new("Switch").shared();
        let mut listener = Listener::new("Idle", world).with_enabled(false);
        listener.bind(&channel);

        channel.raise_void();
        assert_eq!(listener.received_count(), 0);
    }

    #[test]
    fn test_rebind_moves_subscription() {
        let world = world();
        let a = VoidChannel::new("A").shared();
        let b = VoidChannel::new("B").shared();
        let mut listener = Listener::new("Mover", world);

        listener.bind(&a);
        listener.bind(&b);
        assert_eq!(a.subscriber_count(), 0);
        assert_eq!(b.subscriber_count(), 1);

        assert!(listener.unbind());
        assert!(!listener.unbind());
        assert_eq!(b.subscriber_count(), 0);
    }

    #[test]
    fn test_drop_unbinds() {
        let channel = VoidChannel::new("Switch").shared();
        {
            let mut listener = Listener::new("Short lived", world());
            listener.bind(&channel);
            assert_eq!(channel.subscriber_count(), 1);
        }
        assert_eq!(channel.subscriber_count(), 0);
        assert_eq!(channel.raise_void(), RaiseOutcome::Delivered { delivered: 0, failed: 0 });
    }

    #[test]
    fn test_payload_becomes_context() {
        let world = world();
        let crate_id = world.borrow_mut().spawn("Crate", "Prop");
        let channel = EventChannel::<EntityId>::new("Pushed").shared();

        let mut listener = Listener::new("Push", Rc::clone(&world))
            .with_action(ActionKind::move_to(Target::Actor, Vec3::new(1.0, 0.0, 0.0), 1.0));
        listener.bind(&channel);

        channel.raise(crate_id);
        assert!(listener.is_executing());
        listener.tick(1.0);
        assert!(!listener.is_executing());
        assert_eq!(
            world.borrow().get(crate_id).unwrap().transform.position,
            Vec3::new(1.0, 0.0, 0.0)
        );
    }

    #[test]
    fn test_self_cycle_is_rejected() {
        let world = world();
        let channel = EventChannel::<Payload>::new("Echo").shared();
        let mut listener = Listener::new("Echo", world)
            .with_action(ActionKind::raise(Rc::clone(&channel), Payload::None));
        listener.bind(&channel);

        // The echo is deferred once; the echo of the replay is rejected.
        let outcome = channel.raise(Payload::None);
        assert_eq!(outcome, RaiseOutcome::Delivered { delivered: 1, failed: 0 });
        assert_eq!(listener.received_count(), 2);
        assert_eq!(channel.raised_count(), 3);
        assert_eq!(channel.failure_count(), 1);
    }

    #[test]
    fn test_delayed_self_raise_rearms_every_tick() {
        let world = world();
        let channel = EventChannel::<Payload>::new("Pulse").shared();
        let mut listener = Listener::new("Pulser", world)
            .with_action(Action::new(ActionKind::raise(Rc::clone(&channel), Payload::None)).with_delay(1.0));
        listener.bind(&channel);

        channel.raise(Payload::None);
        for _ in 0..3 {
            listener.tick(1.0);
        }
        assert_eq!(channel.raised_count(), 4);
        assert_eq!(listener.received_count(), 4);
        assert_eq!(channel.failure_count(), 0);
        assert_eq!(listener.action_states(), vec![ActionState::Scheduled]);
    }

    #[test]
    fn test_state_is_readable_while_dispatching() {
        let world = world();
        let source = EventChannel::<Payload>::new("Go").shared();
        let side = EventChannel::<Payload>::new("Side").shared();
        let mut listener = Listener::new("Watched", world)
            .with_action(ActionKind::raise(Rc::clone(&side), Payload::None))
            .with_action(Action::new(ActionKind::log("later")).with_delay(5.0));
        listener.bind(&source);
        let listener = Rc::new(listener);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let (weak, sink) = (Rc::downgrade(&listener), Rc::clone(&seen));
        side.subscribe(move |_| {
            if let Some(listener) = weak.upgrade() {
                sink.borrow_mut().push((
                    listener.received_count(),
                    listener.is_executing(),
                    listener.action_states(),
                ));
            }
            Ok(())
        });

        source.raise(Payload::None);
        assert_eq!(
            *seen.borrow(),
            vec![(1, true, vec![ActionState::Executing, ActionState::Idle])]
        );

        listener.stop_all();
        assert!(!listener.is_executing());
    }

    #[test]
    fn test_stop_all() {
        let world = world();
        let channel = VoidChannel::new("Go").shared();
        let mut listener = Listener::new("Slow", world).with_action(Action::new(ActionKind::log("later")).with_delay(5.0));
        listener.bind(&channel);

        channel.raise_void();
        assert_eq!(listener.action_states(), vec![ActionState::Scheduled]);
        listener.stop_all();
        assert_eq!(listener.action_states(), vec![ActionState::Idle]);
    }
}
