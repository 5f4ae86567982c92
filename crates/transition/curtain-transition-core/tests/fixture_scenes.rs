use curtain_test_fixtures::{profiles, scenes};
use curtain_transition_core::{
    ChainDirection, Engine, EngineConfig, ItemState, KeyCode, ManualClock, NoInput, PressedKeys, Profile, SceneDesc,
    TweenMode,
};

fn build(name: &str) -> (Engine, curtain_transition_core::SceneHandles) {
    let scene: SceneDesc = scenes::load(name).expect("scene fixture");
    let mut engine = Engine::new(EngineConfig::default());
    let handles = engine.build_scene(&scene).expect("scene builds");
    (engine, handles)
}

#[test]
fn menu_scene_opens_default_state() {
    let (mut engine, h) = build("menu");
    let menu = h.item("menu").unwrap();
    let children = engine.active_children(menu);
    assert_eq!(children.len(), 3);
    let delays: Vec<f32> = children.iter().map(|&c| engine.item(c).unwrap().config.delays[1]).collect();
    assert!(delays.windows(2).all(|w| w[0] < w[1]), "{delays:?}");

    engine.start();
    let clock = ManualClock::new(1.0 / 30.0, 1.0 / 60.0);
    for _ in 0..90 {
        engine.frame(&clock, &NoInput);
    }
    assert_eq!(engine.item(menu).unwrap().state(), ItemState::Opened);
    for c in children {
        assert_eq!(engine.item(c).unwrap().state(), ItemState::Opened);
    }
    assert_eq!(engine.item(h.item("settings").unwrap()).unwrap().state(), ItemState::Closed);
    assert!(engine.scheduler().is_empty());
}

#[test]
fn menu_scene_switches_on_key() {
    let (mut engine, h) = build("menu");
    engine.start();
    let clock = ManualClock::new(1.0 / 30.0, 1.0 / 60.0);
    for _ in 0..60 {
        engine.frame(&clock, &NoInput);
    }
    let keys: PressedKeys = [KeyCode(50)].into_iter().collect();
    engine.frame(&clock, &keys);
    for _ in 0..60 {
        engine.frame(&clock, &NoInput);
    }
    let core = engine.core(h.core("screens").unwrap()).unwrap();
    assert_eq!(core.current_state().unwrap().name, "settings");
    assert_eq!(engine.item(h.item("menu").unwrap()).unwrap().state(), ItemState::Closed);
    assert_eq!(engine.item(h.item("settings").unwrap()).unwrap().state(), ItemState::Opened);
}

#[test]
fn random_chain_delays_stay_in_range() {
    let (engine, h) = build("chain-branch");
    let root = h.item("root").unwrap();
    assert_eq!(engine.item(root).unwrap().config.chain_directions[1], ChainDirection::Random);
    for child in engine.active_children(root) {
        let d = engine.item(child).unwrap().config.delays[1];
        // r in [1, 4) with step 0.1 and no first-child offset.
        assert!((0.1 - 1e-6..0.4).contains(&d), "{d}");
    }
}

#[test]
fn profiles_apply_to_scene_items() {
    let (mut engine, h) = build("menu");
    let play = h.item("play").unwrap();
    let profile: Profile = profiles::load("fade-in").expect("profile fixture");
    engine.apply_profile(play, &profile).unwrap();
    let item = engine.item(play).unwrap();
    assert_eq!(item.config.durations, [0.2, 0.4]);
    assert_eq!(item.tweens[0].mode, TweenMode::Multiple);
    assert_eq!(item.state(), ItemState::Closed);
    // The parent's chain still drives the delay.
    assert_eq!(item.parent(), Some(h.item("menu").unwrap()));

    let slide = Profile::from_json(&profiles::json("slide-in").unwrap()).unwrap();
    let settings = h.item("settings").unwrap();
    engine.apply_profile(settings, &slide).unwrap();
    let path = engine.item(settings).unwrap().path.as_ref().unwrap();
    assert_eq!(path.len(), 4);
    assert!(!path.spaced_points().is_empty());
}
