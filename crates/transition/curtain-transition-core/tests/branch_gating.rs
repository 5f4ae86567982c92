use curtain_transition_core::{DeltaTime, Engine, EngineConfig, Item, ItemId, ItemState, NoInput, UpdatePhase};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// Binary fractions keep time accumulation exact.
const DT: f32 = 0.125;

struct Run {
    parent_opened: usize,
    parent_time_full: usize,
    last_child_opened: usize,
}

fn build(rng: &mut StdRng, children: usize, parent_duration: f32) -> (Engine, ItemId, Vec<ItemId>) {
    let mut engine = Engine::new(EngineConfig::default());
    let mut parent = Item::new("parent");
    parent.config.durations = [parent_duration, parent_duration];
    let parent = engine.add_item(parent);
    let kids = (0..children)
        .map(|i| {
            let mut child = Item::new(format!("child{i}"));
            child.config.delays[1] = rng.random_range(0..12) as f32 * DT;
            child.config.durations[1] = rng.random_range(1..16) as f32 * DT;
            let id = engine.add_item(child);
            engine.attach(id, parent).unwrap();
            id
        })
        .collect();
    (engine, parent, kids)
}

fn run(engine: &mut Engine, parent: ItemId, kids: &[ItemId]) -> Run {
    let mut parent_time_full = None;
    let mut child_opened = vec![None; kids.len()];
    for tick in 1..=200 {
        engine.tick(UpdatePhase::Update, DeltaTime::uniform(DT), &NoInput);
        for (slot, &kid) in child_opened.iter_mut().zip(kids) {
            if slot.is_none() && engine.item(kid).unwrap().state() == ItemState::Opened {
                *slot = Some(tick);
            }
        }
        let p = engine.item(parent).unwrap();
        if parent_time_full.is_none() && p.time() >= 1.0 {
            parent_time_full = Some(tick);
        }
        if p.state() == ItemState::Opened {
            // Nothing may still be moving when the parent settles.
            for &kid in kids {
                assert_eq!(engine.item(kid).unwrap().state(), ItemState::Opened);
            }
            return Run {
                parent_opened: tick,
                parent_time_full: parent_time_full.unwrap(),
                last_child_opened: child_opened.iter().map(|t| t.unwrap()).max().unwrap_or(0),
            };
        }
    }
    panic!("parent never opened");
}

#[test]
fn parent_waits_for_every_child() {
    for seed in 0..25 {
        let mut rng = StdRng::seed_from_u64(seed);
        let children = rng.random_range(1..7);
        let parent_duration = rng.random_range(1..10) as f32 * DT;
        let (mut engine, parent, kids) = build(&mut rng, children, parent_duration);
        engine.open_branch(parent);
        let r = run(&mut engine, parent, &kids);
        assert!(r.parent_opened >= r.parent_time_full, "seed {seed}");
        assert!(r.parent_opened >= r.last_child_opened, "seed {seed}");
        // Settles no later than one tick after its last blocker.
        assert!(r.parent_opened <= r.parent_time_full.max(r.last_child_opened) + 1, "seed {seed}");
        assert!(engine.scheduler().is_empty(), "seed {seed}");
    }
}

#[test]
fn children_started_before_the_parent_still_gate_it() {
    let mut rng = StdRng::seed_from_u64(99);
    let (mut engine, parent, kids) = build(&mut rng, 4, DT);
    // Children register first, so they tick before the parent.
    for &kid in &kids {
        engine.open(kid);
    }
    engine.open(parent);
    let r = run(&mut engine, parent, &kids);
    assert!(r.parent_opened >= r.last_child_opened);
    assert!(r.parent_opened <= r.parent_time_full.max(r.last_child_opened) + 1);
}

#[test]
fn looping_children_do_not_gate() {
    let mut engine = Engine::new(EngineConfig::default());
    let parent = engine.add_item(Item::new("parent"));
    let mut spinner = Item::new("spinner");
    spinner.config.loops = -1;
    spinner.config.durations = [4.0, 4.0];
    let spinner = engine.add_item(spinner);
    engine.attach(spinner, parent).unwrap();
    engine.open_branch(parent);
    for _ in 0..12 {
        engine.tick(UpdatePhase::Update, DeltaTime::uniform(DT), &NoInput);
    }
    assert_eq!(engine.item(parent).unwrap().state(), ItemState::Opened);
    assert_eq!(engine.item(spinner).unwrap().state(), ItemState::Opening);
}
