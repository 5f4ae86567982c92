use curtain_transition_core::{
    ActivationMode, ChainDirection, DeltaTime, Ease, EffectKind, Engine, EngineConfig, Event, Item, ItemState,
    NoInput, Tween, UpdatePhase, Value,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn step(engine: &mut Engine, dt: f32) {
    engine.tick(UpdatePhase::Update, DeltaTime::uniform(dt), &NoInput);
}

#[test]
fn delayed_open_example() {
    let mut engine = Engine::new(EngineConfig::default());
    let mut item = Item::new("panel").with_tween(Tween::new(EffectKind::Alpha, Ease::Linear));
    item.config.delays = [0.0, 0.5];
    item.config.durations = [1.0, 1.0];
    let id = engine.add_item(item);
    engine.open(id);

    for _ in 0..9 {
        step(&mut engine, 0.1);
    }
    let it = engine.item(id).unwrap();
    assert_eq!(it.state(), ItemState::Opening);
    assert!(it.state_chg_time() <= 0.0);
    approx(it.time(), 0.4, 1e-4);

    step(&mut engine, 1.0);
    let it = engine.item(id).unwrap();
    assert_eq!(it.state(), ItemState::Opened);
    assert_eq!(it.child_count_without_loops(), 0);
    let out = engine.take_outputs();
    assert_eq!(out.latest("panel", EffectKind::Alpha), Some(&Value::Float(1.0)));
    let opened = out.events.iter().filter(|e| matches!(e, Event::Opened { .. })).count();
    assert_eq!(opened, 1);
}

#[test]
fn immediate_mode_snaps_mid_transition() {
    let mut engine = Engine::new(EngineConfig::default());
    let id = engine.add_item(Item::new("panel").with_tween(Tween::new(EffectKind::Alpha, Ease::Linear)));
    engine.open(id);
    step(&mut engine, 0.1);
    step(&mut engine, 0.3);
    assert_eq!(engine.item(id).unwrap().state(), ItemState::Opening);
    engine.take_outputs();

    engine.activate(id, ActivationMode::OpenImmediately);
    let it = engine.item(id).unwrap();
    assert_eq!(it.state(), ItemState::Opened);
    assert_eq!(it.time(), 1.0);
    assert!(!engine.scheduler().is_registered(id));
    assert_eq!(
        engine.outputs().latest("panel", EffectKind::Alpha),
        Some(&Value::Float(1.0))
    );

    engine.activate(id, ActivationMode::CloseImmediately);
    assert_eq!(engine.item(id).unwrap().state(), ItemState::Closed);
    assert_eq!(engine.item(id).unwrap().time(), 0.0);
}

#[test]
fn close_branch_immediately_snaps_descendants() {
    let mut engine = Engine::new(EngineConfig::default());
    let root = engine.add_item(Item::new("root"));
    let mid = engine.add_item(Item::new("mid"));
    let leaf = engine.add_item(Item::new("leaf"));
    engine.attach(mid, root).unwrap();
    engine.attach(leaf, mid).unwrap();
    engine.activate(root, ActivationMode::OpenBranchImmediately);
    for id in [root, mid, leaf] {
        assert_eq!(engine.item(id).unwrap().state(), ItemState::Opened);
    }
    assert_eq!(engine.item(root).unwrap().child_state_count(ItemState::Opened), 1);

    engine.activate(root, ActivationMode::CloseBranchImmediately);
    for id in [root, mid, leaf] {
        assert_eq!(engine.item(id).unwrap().state(), ItemState::Closed);
    }
    assert_eq!(engine.item(mid).unwrap().child_state_count(ItemState::Closed), 1);
    assert!(engine.scheduler().is_empty());
}

#[test]
fn zero_duration_takes_the_immediate_path() {
    let mut engine = Engine::new(EngineConfig::default());
    let mut item = Item::new("flash");
    item.config.durations = [0.0, 0.0];
    let id = engine.add_item(item);
    assert!(engine.open(id));
    assert_eq!(engine.item(id).unwrap().state(), ItemState::Opened);
    assert!(engine.close(id));
    assert_eq!(engine.item(id).unwrap().state(), ItemState::Closed);
}

#[test]
fn settled_items_leave_the_scheduler() {
    let mut engine = Engine::new(EngineConfig::default());
    let ids: Vec<_> = (0..4)
        .map(|i| {
            let mut item = Item::new(format!("i{i}"));
            item.config.durations = [0.2, 0.2 * (i + 1) as f32];
            engine.add_item(item)
        })
        .collect();
    for &id in &ids {
        engine.open(id);
    }
    assert_eq!(engine.scheduler().len(UpdatePhase::Update), 4);
    for _ in 0..30 {
        step(&mut engine, 0.05);
    }
    assert!(engine.scheduler().is_empty());
    for &id in &ids {
        assert_eq!(engine.item(id).unwrap().state(), ItemState::Opened);
    }
}

#[test]
fn chained_children_start_in_sibling_order() {
    let mut engine = Engine::new(EngineConfig::default());
    let mut root = Item::new("list");
    root.config.child_chain_mode = true;
    root.config.chain_directions = [ChainDirection::Last2First, ChainDirection::First2Last];
    root.config.chain_delays = [0.1, 0.1];
    root.config.first_child_delay = [0.0, 0.0];
    let root = engine.add_item(root);
    let rows: Vec<_> = (0..3)
        .map(|i| {
            let row = engine.add_item(Item::new(format!("row{i}")));
            engine.attach(row, root).unwrap();
            row
        })
        .collect();
    let opens: Vec<f32> = rows.iter().map(|&r| engine.item(r).unwrap().config.delays[1]).collect();
    let closes: Vec<f32> = rows.iter().map(|&r| engine.item(r).unwrap().config.delays[0]).collect();
    for (got, want) in opens.iter().zip([0.0, 0.1, 0.2]) {
        approx(*got, want, 1e-6);
    }
    for (got, want) in closes.iter().zip([0.2, 0.1, 0.0]) {
        approx(*got, want, 1e-6);
    }

    engine.detach(rows[0]).unwrap();
    approx(engine.item(rows[1]).unwrap().config.delays[1], 0.0, 1e-6);
    approx(engine.item(rows[2]).unwrap().config.delays[1], 0.1, 1e-6);
}

#[test]
fn infinite_loop_keeps_ticking() {
    let mut engine = Engine::new(EngineConfig::default());
    let mut item = Item::new("pulse");
    item.config.loops = -1;
    item.config.loop_mode = ActivationMode::Close;
    item.config.activations = [ActivationMode::Close, ActivationMode::Open];
    item.config.durations = [0.25, 0.25];
    let id = engine.add_item(item);
    engine.open(id);
    let mut opened = 0;
    let mut closed = 0;
    for _ in 0..80 {
        step(&mut engine, 0.05);
        for event in engine.take_outputs().events {
            match event {
                Event::Opened { .. } => opened += 1,
                Event::Closed { .. } => closed += 1,
                _ => {}
            }
        }
    }
    assert!(opened >= 3, "opened {opened} times");
    assert!(closed >= 3, "closed {closed} times");
    assert!(engine.scheduler().is_registered(id));
}

#[test]
fn manual_evaluation_filters_by_direction() {
    let mut engine = Engine::new(EngineConfig::default());
    let item = Item::new("scrub")
        .with_tween(Tween::new(EffectKind::Alpha, Ease::Linear))
        .with_tween(
            Tween::new(EffectKind::Number, Ease::Linear)
                .with_direction(curtain_transition_core::TweenDirection::Close),
        );
    let id = engine.add_item(item);
    engine.take_outputs();
    engine.evaluate(id, 0.5, Some(curtain_transition_core::ItemKey::Opened));
    let out = engine.take_outputs();
    assert!(out.latest("scrub", EffectKind::Alpha).is_some());
    assert!(out.latest("scrub", EffectKind::Number).is_none());
    assert_eq!(engine.item(id).unwrap().state(), ItemState::Slave);

    // Activation brings a slaved item back under the scheduler.
    engine.open(id);
    assert_eq!(engine.item(id).unwrap().state(), ItemState::Opening);
    assert!(engine.scheduler().is_registered(id));
}

#[test]
fn finished_loops_stop_ticking() {
    let mut engine = Engine::new(EngineConfig::default());
    let mut item = Item::new("blink");
    item.config.loops = 2;
    item.config.loop_mode = ActivationMode::Open;
    item.config.durations = [0.2, 0.2];
    let id = engine.add_item(item);
    engine.open(id);
    for _ in 0..20 {
        step(&mut engine, 0.05);
    }
    assert_eq!(engine.item(id).unwrap().state(), ItemState::Opened);
    assert!(!engine.scheduler().is_registered(id));

    // Closing and reopening arms the loops again.
    engine.close(id);
    for _ in 0..20 {
        step(&mut engine, 0.05);
    }
    assert_eq!(engine.item(id).unwrap().state(), ItemState::Closed);
    engine.open(id);
    for _ in 0..20 {
        step(&mut engine, 0.05);
    }
    assert_eq!(engine.item(id).unwrap().state(), ItemState::Opened);
    assert!(!engine.scheduler().is_registered(id));
}
