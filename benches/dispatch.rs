use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use rust_triggers::actions::ActionKind;
use rust_triggers::channels::{EventChannel, VoidChannel};
use rust_triggers::conditions::ConditionKind;
use rust_triggers::core::{Payload, StimulusKind, World};
use rust_triggers::listeners::Listener;
use rust_triggers::triggers::{Trigger, TriggerId};

fn bench_raise(c: &mut Criterion) {
    let mut group = c.benchmark_group("raise");
    for subscribers in [1usize, 16, 256] {
        let channel = VoidChannel::new("Bench").shared();
        for _ in 0..subscribers {
            channel.subscribe(|_| Ok(()));
        }
        group.bench_with_input(BenchmarkId::from_parameter(subscribers), &channel, |b, channel| {
            b.iter(|| black_box(channel.raise_void()));
        });
    }
    group.finish();
}

fn bench_trigger_to_listener(c: &mut Criterion) {
    let mut world = World::new(1);
    let hero = world.spawn("Hero", "Player");
    let door = world.spawn("Door", "Door");
    let world = world.into_handle();

    let channel: Rc<EventChannel<Payload>> = EventChannel::new("Opened").shared();
    let mut listeners: Vec<Listener<Payload>> = (0..8)
        .map(|i| Listener::new(format!("L{i}"), Rc::clone(&world)).with_action(ActionKind::log("opened")))
        .collect();
    for listener in &mut listeners {
        listener.bind(&channel);
    }

    let mut trigger = Trigger::new(TriggerId(1), "Door")
        .with_source(door)
        .with_condition(ConditionKind::TagEquals("Player".into()))
        .with_condition(ConditionKind::within(10.0))
        .with_action(ActionKind::raise(Rc::clone(&channel), Payload::None));
    let ctx = world.borrow().context_for(hero, StimulusKind::Enter);

    c.bench_function("try_fire_to_8_listeners", |b| {
        b.iter(|| black_box(trigger.try_fire(&ctx, &world)));
    });
}

criterion_group!(benches, bench_raise, bench_trigger_to_listener);
criterion_main!(benches);
