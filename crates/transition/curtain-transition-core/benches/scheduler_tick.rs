use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use curtain_transition_core::{
    ChainDirection, DeltaTime, Ease, EffectKind, Engine, EngineConfig, Item, ItemId, NoInput, Tween, UpdatePhase,
};

/// A root with `count` chained children, each carrying two tweens.
fn build(count: usize) -> (Engine, ItemId) {
    let mut engine = Engine::new(EngineConfig {
        emit_initial_effects: false,
        ..EngineConfig::default()
    });
    let mut root = Item::new("root");
    root.config.child_chain_mode = true;
    root.config.chain_directions = [ChainDirection::Middle2End; 2];
    let root = engine.add_item(root);
    for i in 0..count {
        let child = Item::new(format!("child/{i}"))
            .with_tween(Tween::new(EffectKind::Alpha, Ease::OutQuad))
            .with_tween(Tween::new(EffectKind::Position, Ease::InOutBack));
        let child = engine.add_item(child);
        engine.attach(child, root).expect("attach");
    }
    (engine, root)
}

fn tick_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler_tick");
    for count in [10, 100, 1000] {
        group.bench_function(format!("{count}_children"), |b| {
            b.iter_batched(
                || {
                    let (mut engine, root) = build(count);
                    engine.open_branch(root);
                    engine
                },
                |mut engine| {
                    for _ in 0..30 {
                        engine.tick(UpdatePhase::Update, DeltaTime::uniform(1.0 / 60.0), &NoInput);
                        black_box(engine.take_outputs());
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn easing_benchmark(c: &mut Criterion) {
    c.bench_function("ease_all_kinds", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for kind in Ease::ALL {
                acc += curtain_transition_core::easing::evaluate(black_box(0.37), 1.0, kind);
            }
            black_box(acc)
        })
    });
}

criterion_group!(benches, tick_benchmark, easing_benchmark);
criterion_main!(benches);
