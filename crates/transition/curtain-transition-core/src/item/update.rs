//! Per-tick item update: delay countdown, time advance, gated completion,
//! loops, keyboard presses and the button pulse.

use crate::engine::Engine;
use crate::ids::ItemId;
use crate::inputs::InputSource;
use crate::item::{ItemKey, ItemState};
use crate::outputs::Event;
use crate::scheduler::DeltaTime;

impl Engine {
    /// Advance one registered item by one tick. `depth` counts same-tick
    /// re-entries caused by immediate-close loop modes.
    pub(crate) fn update_item(&mut self, id: ItemId, delta: DeltaTime, depth: u32, input: &dyn InputSource) {
        let Some(item) = self.item_mut(id) else {
            return;
        };
        if !item.enabled {
            return;
        }
        let dt = if item.config.time_scaled { delta.scaled } else { delta.unscaled };
        item.delta_time = dt;

        let state = item.state;
        match state {
            ItemState::Opening => self.advance_transition(id, ItemKey::Opened, dt, input),
            ItemState::Closing => self.advance_transition(id, ItemKey::Closed, dt, input),
            ItemState::Closed => {
                let keep = item.loop_activated;
                let looping = item.current_loops > 0 || item.config.loops < 0;
                let mode = item.config.activations[ItemKey::Opened.index()];
                if !keep {
                    self.scheduler.unregister(id);
                }
                if !looping {
                    if let Some(item) = self.item_mut(id) {
                        item.loop_activated = false;
                    }
                    return;
                }
                self.activate(id, mode);
                if let Some(item) = self.item_mut(id) {
                    item.loop_activated = true;
                    item.state_chg_time = 0.0;
                }
            }
            ItemState::Opened => {
                self.update_input(id, input);
                let Some(item) = self.item_mut(id) else {
                    return;
                };
                if item.config.loops != 0 {
                    if !item.loop_activated {
                        item.loop_activated = true;
                        item.current_loops = item.config.loops;
                    }
                    if item.current_loops > 0 || item.config.loops < 0 {
                        let saved = item.time;
                        let mode = item.config.loop_mode;
                        self.activate(id, mode);
                        let Some(item) = self.item_mut(id) else {
                            return;
                        };
                        item.loop_activated = true;
                        if item.config.loops > 0 {
                            item.current_loops -= 1;
                        }
                        if mode.is_immediate_close() {
                            item.time = saved - 1.0;
                            if depth < self.config.max_loop_reentrancy {
                                self.update_item(id, delta, depth + 1, input);
                                return;
                            }
                            let limit = self.config.max_loop_reentrancy;
                            log::error!("{id:?}: loop re-entrancy limit {limit} exceeded");
                            self.outputs.push_event(Event::ConfigurationError {
                                item: Some(id),
                                message: format!("loop re-entrancy limit {limit} exceeded"),
                            });
                        }
                    } else if !item.needs_polling() {
                        self.scheduler.unregister(id);
                    }
                } else if !item.needs_polling() {
                    self.scheduler.unregister(id);
                }
            }
            ItemState::Slave => {}
        }

        self.update_button(id, dt);
    }

    /// Opening or closing tick towards `key`.
    fn advance_transition(&mut self, id: ItemId, key: ItemKey, dt: f32, input: &dyn InputSource) {
        let epsilon = self.config.delay_epsilon;
        let Some(item) = self.item_mut(id) else {
            return;
        };
        let k = key.index();
        let opening = key == ItemKey::Opened;

        if item.delay_pending {
            item.state_chg_time -= dt;
            if item.state_chg_time > epsilon {
                return;
            }
            item.state_chg_time = item.state_chg_time.min(0.0);
            item.delay_pending = false;
            item.reset_blends();
            if item.branch_mode && !item.config.child_before[k] {
                self.activate_children(id, key);
            }
        } else {
            let duration = item.config.durations[k];
            let step = if duration > 0.0 { dt / duration } else { 1.0 };
            item.time += if opening { step } else { -step };

            // Completion waits for every counted child to settle too.
            let terminal = if opening { ItemState::Opened } else { ItemState::Closed };
            let children_settled = item.child_state_count(terminal) == item.child_count_without_loops;
            if opening && item.time >= 1.0 {
                item.time = 1.0;
                if children_settled {
                    let keep = item.needs_polling();
                    self.set_state(id, ItemState::Opened);
                    if !keep {
                        self.scheduler.unregister(id);
                    }
                }
            } else if !opening && item.time <= 0.0 {
                item.time = 0.0;
                if children_settled {
                    let keep = item.loop_activated;
                    self.set_state(id, ItemState::Closed);
                    if !keep {
                        self.scheduler.unregister(id);
                    }
                }
            }
        }

        if opening {
            self.update_input(id, input);
        }
        if let Some((item, outputs)) = self.item_and_outputs(id) {
            item.run_tweens(outputs);
        }
    }

    /// Count down the button pulse and drive button tweens on the item and
    /// its branch.
    pub(crate) fn update_button(&mut self, id: ItemId, dt: f32) {
        let value = match self.item_and_outputs(id) {
            Some((item, outputs)) if item.button_evaluation > 0.0 => {
                item.button_evaluation = (item.button_evaluation - dt).max(0.0);
                item.run_button_tweens(outputs);
                item.button_evaluation
            }
            _ => return,
        };
        for child in self.descendants(id) {
            if let Some((c, outputs)) = self.item_and_outputs(child) {
                c.button_evaluation = value;
                c.run_button_tweens(outputs);
            }
        }
    }

    /// Keyboard bindings press an interactive item.
    pub(crate) fn update_input(&mut self, id: ItemId, input: &dyn InputSource) {
        let Some(item) = self.item(id) else {
            return;
        };
        if !item.config.interactions || item.config.keyboard.is_empty() || !input.any_key_down() {
            return;
        }
        if item.config.keyboard.iter().any(|&key| input.key_down(key)) {
            self.press(id);
        }
    }

    /// Start a button pulse on an opening or opened item. The pulse length
    /// spreads over the branch; direct children that are idle start their
    /// own.
    pub fn press(&mut self, id: ItemId) {
        let Some(item) = self.item(id) else {
            log::warn!("press: unknown item {id:?}");
            return;
        };
        if !item.state.is_open_like() {
            return;
        }
        let phase = item.config.update_phase;
        if item.button_evaluation <= 0.0 {
            let duration = item.config.button_duration;
            for target in std::iter::once(id).chain(self.descendants(id)) {
                if let Some(it) = self.item_mut(target) {
                    it.button_evaluation = duration;
                }
            }
        }
        for child in self.active_children(id) {
            if let Some(c) = self.item_mut(child) {
                if c.button_evaluation <= 0.0 {
                    c.button_evaluation = c.config.button_duration;
                }
            }
        }
        self.scheduler.register(id, phase);
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::curve::CustomCurve;
    use crate::easing::Ease;
    use crate::effects::EffectKind;
    use crate::engine::Engine;
    use crate::inputs::{KeyCode, NoInput, PressedKeys};
    use crate::item::{ActivationMode, Item, ItemState};
    use crate::outputs::Event;
    use crate::scheduler::{DeltaTime, UpdatePhase};
    use crate::tween::{Tween, TweenDirection};

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    fn step(engine: &mut Engine, dt: f32) {
        engine.tick(UpdatePhase::Update, DeltaTime::uniform(dt), &NoInput);
    }

    #[test]
    fn delay_then_advance() {
        let mut engine = Engine::new(EngineConfig::default());
        let mut item = Item::new("panel");
        item.config.delays[1] = 0.5;
        let id = engine.add_item(item);
        engine.open(id);
        for _ in 0..9 {
            step(&mut engine, 0.1);
        }
        let it = engine.item(id).unwrap();
        assert_eq!(it.state(), ItemState::Opening);
        assert!(it.state_chg_time() <= 0.0);
        approx(it.time(), 0.4, 1e-4);

        step(&mut engine, 2.0);
        let it = engine.item(id).unwrap();
        assert_eq!(it.state(), ItemState::Opened);
        assert_eq!(it.time(), 1.0);
        assert!(!engine.scheduler().is_registered(id));
    }

    #[test]
    fn closing_completes_and_unregisters() {
        let mut engine = Engine::new(EngineConfig::default());
        let id = engine.add_item(Item::new("panel"));
        engine.activate(id, ActivationMode::OpenImmediately);
        engine.close(id);
        step(&mut engine, 0.0);
        step(&mut engine, 0.6);
        step(&mut engine, 0.6);
        assert_eq!(engine.item(id).unwrap().state(), ItemState::Closed);
        assert!(!engine.scheduler().is_registered(id));
    }

    #[test]
    fn finite_loops_reopen_then_settle() {
        let mut engine = Engine::new(EngineConfig::default());
        let mut item = Item::new("blink");
        item.config.loops = 2;
        item.config.loop_mode = ActivationMode::CloseImmediately;
        item.config.activations[1] = ActivationMode::Open;
        let id = engine.add_item(item);
        engine.open(id);

        let mut opened = 0;
        for _ in 0..40 {
            step(&mut engine, 0.25);
            let events = engine.take_outputs().events;
            opened += events.iter().filter(|e| matches!(e, Event::Opened { .. })).count();
        }
        // Two loop rounds: the first reopens, the second leaves it closed.
        assert_eq!(opened, 2);
        assert_eq!(engine.item(id).unwrap().state(), ItemState::Closed);
        assert_eq!(engine.item(id).unwrap().current_loops(), 0);
        assert!(!engine.scheduler().is_registered(id));
    }

    #[test]
    fn reentrancy_limit_reports_configuration_error() {
        let mut engine = Engine::new(EngineConfig {
            max_loop_reentrancy: 0,
            ..EngineConfig::default()
        });
        let mut item = Item::new("spin");
        item.config.loops = -1;
        item.config.loop_mode = ActivationMode::CloseImmediately;
        let id = engine.add_item(item);
        engine.activate(id, ActivationMode::OpenImmediately);
        engine.scheduler_mut().register(id, UpdatePhase::Update);
        step(&mut engine, 0.1);
        let events = engine.take_outputs().events;
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::ConfigurationError { item: Some(i), .. } if *i == id)));
    }

    #[test]
    fn press_runs_button_tweens_until_pulse_ends() {
        let mut engine = Engine::new(EngineConfig::default());
        let mut item = Item::new("button").with_tween(
            Tween::new(EffectKind::Number, Ease::Linear)
                .with_direction(TweenDirection::Button)
                .with_curve(CustomCurve::linear(0.0, 0.0, 1.0, 1.0)),
        );
        item.config.button_duration = 0.5;
        let id = engine.add_item(item);
        engine.press(id);
        assert_eq!(engine.item(id).unwrap().button_evaluation(), 0.0);

        engine.activate(id, ActivationMode::OpenImmediately);
        engine.press(id);
        assert_eq!(engine.item(id).unwrap().button_evaluation(), 0.5);
        engine.take_outputs();

        step(&mut engine, 0.25);
        let out = engine.take_outputs();
        let change = out.changes.iter().find(|c| c.effect == EffectKind::Number).unwrap();
        approx(change.eased, 0.5, 1e-4);

        step(&mut engine, 0.5);
        step(&mut engine, 0.1);
        assert_eq!(engine.item(id).unwrap().button_evaluation(), 0.0);
        assert!(!engine.scheduler().is_registered(id));
    }

    #[test]
    fn keyboard_presses_opened_item() {
        let mut engine = Engine::new(EngineConfig::default());
        let mut item = Item::new("button");
        item.config.keyboard = vec![KeyCode(32)];
        let id = engine.add_item(item);
        engine.activate(id, ActivationMode::OpenImmediately);
        engine.scheduler_mut().register(id, UpdatePhase::Update);
        let keys: PressedKeys = [KeyCode(32)].into_iter().collect();
        engine.tick(UpdatePhase::Update, DeltaTime::uniform(0.1), &keys);
        approx(engine.item(id).unwrap().button_evaluation(), 0.4, 1e-6);
    }

    #[test]
    fn unscaled_items_ignore_time_scale() {
        let mut engine = Engine::new(EngineConfig::default());
        let mut item = Item::new("hud");
        item.config.time_scaled = false;
        let id = engine.add_item(item);
        engine.open(id);
        step(&mut engine, 0.0);
        engine.tick(
            UpdatePhase::Update,
            DeltaTime {
                scaled: 0.0,
                unscaled: 0.25,
            },
            &NoInput,
        );
        approx(engine.item(id).unwrap().time(), 0.25, 1e-6);
    }
}
