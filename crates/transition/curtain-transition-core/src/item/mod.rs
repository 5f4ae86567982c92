//! Items: nodes of the transition hierarchy.
//!
//! An [`Item`] owns its configuration, keyframes, tweens and optional path,
//! plus the runtime state the engine drives (state, progress, delay
//! countdown, loop and button counters). Parent/child links are arena ids;
//! everything that touches more than one item lives on the engine, split
//! over `activation`, `update` and `chain`.

pub mod activation;
pub mod chain;
pub mod update;

use serde::{Deserialize, Serialize};

use crate::effects::{evaluate_effect, EffectContext, EffectKeys, EffectKind, RotationMode};
use crate::ids::ItemId;
use crate::inputs::KeyCode;
use crate::outputs::{EffectChange, Outputs, TargetHandle};
use crate::path::Path;
use crate::scheduler::UpdatePhase;
use crate::tween::{Tween, TweenDirection};

pub use activation::{ActivationMode, Direction, Scope, Timing};
pub use chain::{chain_delay, ChainDirection};

/// Transition state of an item.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemState {
    #[default]
    Closed,
    Opening,
    Opened,
    Closing,
    /// Driven by manual evaluation; not ticked.
    Slave,
}

impl ItemState {
    /// Slot in a parent's child counters. `Slave` is not counted.
    #[inline]
    pub fn counter_index(self) -> Option<usize> {
        match self {
            ItemState::Closed => Some(0),
            ItemState::Opening => Some(1),
            ItemState::Opened => Some(2),
            ItemState::Closing => Some(3),
            ItemState::Slave => None,
        }
    }

    /// Opening or opened.
    #[inline]
    pub fn is_open_like(self) -> bool {
        matches!(self, ItemState::Opening | ItemState::Opened)
    }

    /// Closing or closed.
    #[inline]
    pub fn is_closed_like(self) -> bool {
        matches!(self, ItemState::Closing | ItemState::Closed)
    }
}

/// Index into per-direction pairs: `[closed, opened]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKey {
    Closed,
    Opened,
}

impl ItemKey {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            ItemKey::Closed => 0,
            ItemKey::Opened => 1,
        }
    }
}

/// Which end of a button pulse counts as pressed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonDirection {
    #[default]
    Open2Close,
    Close2Open,
}

/// Per-item tunables. Pairs are indexed by [`ItemKey`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemConfig {
    /// Run once by `Engine::start`.
    pub start_action: ActivationMode,
    /// Modes used by plain open/close requests.
    pub activations: [ActivationMode; 2],
    pub delays: [f32; 2],
    pub durations: [f32; 2],
    /// Fire children as soon as the branch activation starts instead of
    /// after this item's delay.
    pub child_before: [bool; 2],
    /// Children's delays are computed from their sibling order.
    pub child_chain_mode: bool,
    pub chain_directions: [ChainDirection; 2],
    pub chain_delays: [f32; 2],
    pub first_child_delay: [f32; 2],
    /// Scale a chained child's delay by the progress already made.
    pub brake_chain_delay: bool,
    pub ignore_children: bool,
    pub ignore_parent: bool,
    /// Loop count after opening; negative loops forever.
    pub loops: i32,
    pub loop_mode: ActivationMode,
    pub update_phase: UpdatePhase,
    pub time_scaled: bool,
    pub rotation_mode: RotationMode,
    pub button_duration: f32,
    pub button_direction: ButtonDirection,
    /// Keys that press this item while it is open.
    pub keyboard: Vec<KeyCode>,
    /// Report opening/opened as interactive.
    pub interactions: bool,
}

impl Default for ItemConfig {
    fn default() -> Self {
        Self {
            start_action: ActivationMode::CloseBranchImmediately,
            activations: [ActivationMode::CloseBranch, ActivationMode::OpenBranch],
            delays: [0.0, 0.0],
            durations: [1.0, 1.0],
            child_before: [false, false],
            child_chain_mode: false,
            chain_directions: [ChainDirection::First2Last; 2],
            chain_delays: [0.2, 0.2],
            first_child_delay: [0.2, 0.2],
            brake_chain_delay: true,
            ignore_children: false,
            ignore_parent: false,
            loops: 0,
            loop_mode: ActivationMode::Disabled,
            update_phase: UpdatePhase::Update,
            time_scaled: true,
            rotation_mode: RotationMode::Quaternion,
            button_duration: 0.5,
            button_direction: ButtonDirection::Open2Close,
            keyboard: Vec::new(),
            interactions: true,
        }
    }
}

impl ItemConfig {
    #[inline]
    pub fn open_delay(&self) -> f32 {
        self.delays[1]
    }

    #[inline]
    pub fn close_delay(&self) -> f32 {
        self.delays[0]
    }

    #[inline]
    pub fn open_duration(&self) -> f32 {
        self.durations[1]
    }

    #[inline]
    pub fn close_duration(&self) -> f32 {
        self.durations[0]
    }
}

/// A node of the hierarchy.
#[derive(Clone, Debug)]
pub struct Item {
    pub(crate) id: ItemId,
    pub(crate) target: TargetHandle,
    pub(crate) enabled: bool,
    pub config: ItemConfig,
    pub keys: EffectKeys,
    pub tweens: Vec<Tween>,
    pub path: Option<Path>,

    pub(crate) state: ItemState,
    pub(crate) time: f32,
    pub(crate) state_chg_time: f32,
    pub(crate) delay_pending: bool,
    pub(crate) branch_mode: bool,
    pub(crate) loop_activated: bool,
    pub(crate) current_loops: i32,
    pub(crate) button_evaluation: f32,
    pub(crate) evaluation: f32,
    pub(crate) delta_time: f32,

    pub(crate) parent: Option<ItemId>,
    pub(crate) children: Vec<ItemId>,
    /// 1-based position among the parent's active children.
    pub(crate) sibling_index: usize,
    pub(crate) child_state_counts: [u32; 4],
    pub(crate) child_count_without_loops: u32,
}

impl Item {
    /// New closed item driving `target`, with default configuration.
    pub fn new(target: impl Into<TargetHandle>) -> Self {
        Self {
            id: ItemId(u32::MAX),
            target: target.into(),
            enabled: true,
            config: ItemConfig::default(),
            keys: EffectKeys::default(),
            tweens: Vec::new(),
            path: None,
            state: ItemState::Closed,
            time: 0.0,
            state_chg_time: 0.0,
            delay_pending: false,
            branch_mode: false,
            loop_activated: false,
            current_loops: 0,
            button_evaluation: 0.0,
            evaluation: 0.0,
            delta_time: 0.0,
            parent: None,
            children: Vec::new(),
            sibling_index: 1,
            child_state_counts: [0; 4],
            child_count_without_loops: 0,
        }
    }

    pub fn with_config(mut self, config: ItemConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_keys(mut self, keys: EffectKeys) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_tween(mut self, tween: Tween) -> Self {
        self.tweens.push(tween);
        self
    }

    pub fn with_path(mut self, path: Path) -> Self {
        self.path = Some(path);
        self
    }

    #[inline]
    pub fn id(&self) -> ItemId {
        self.id
    }

    #[inline]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn state(&self) -> ItemState {
        self.state
    }

    /// Normalized progress in [0, 1].
    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Remaining delay; zero or below once the delay has expired.
    #[inline]
    pub fn state_chg_time(&self) -> f32 {
        self.state_chg_time
    }

    #[inline]
    pub fn is_delay_pending(&self) -> bool {
        self.delay_pending
    }

    #[inline]
    pub fn is_branch_mode(&self) -> bool {
        self.branch_mode
    }

    #[inline]
    pub fn loop_activated(&self) -> bool {
        self.loop_activated
    }

    #[inline]
    pub fn current_loops(&self) -> i32 {
        self.current_loops
    }

    #[inline]
    pub fn button_evaluation(&self) -> f32 {
        self.button_evaluation
    }

    /// Last value written by a `Time` effect.
    #[inline]
    pub fn evaluation(&self) -> f32 {
        self.evaluation
    }

    /// Delta applied on the most recent tick.
    #[inline]
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    #[inline]
    pub fn parent(&self) -> Option<ItemId> {
        self.parent
    }

    /// Direct children in attach order, including disabled ones.
    #[inline]
    pub fn children(&self) -> &[ItemId] {
        &self.children
    }

    #[inline]
    pub fn sibling_index(&self) -> usize {
        self.sibling_index
    }

    /// Number of counted children currently in `state`.
    pub fn child_state_count(&self, state: ItemState) -> u32 {
        state.counter_index().map_or(0, |i| self.child_state_counts[i])
    }

    #[inline]
    pub fn child_count_without_loops(&self) -> u32 {
        self.child_count_without_loops
    }

    /// Whether this item takes part in its parent's counters.
    #[inline]
    pub(crate) fn counts_for_parent(&self) -> bool {
        self.enabled && self.config.loops == 0 && !self.config.ignore_parent
    }

    /// Current transition duration: the opening/closing duration while
    /// moving, 1 when opened or slaved, 0 when closed.
    pub fn duration(&self) -> f32 {
        match self.state {
            ItemState::Opening => self.config.open_duration(),
            ItemState::Closing => self.config.close_duration(),
            ItemState::Opened | ItemState::Slave => 1.0,
            ItemState::Closed => 0.0,
        }
    }

    /// Whether an opened item still needs ticks after settling.
    pub(crate) fn needs_polling(&self) -> bool {
        self.loops_pending() || self.button_evaluation > 0.0 || !self.config.keyboard.is_empty()
    }

    /// Infinite loops, or finite ones not yet used up.
    pub(crate) fn loops_pending(&self) -> bool {
        match self.config.loops {
            0 => false,
            l if l < 0 => true,
            _ => !(self.loop_activated && self.current_loops == 0),
        }
    }

    pub(crate) fn reset_blends(&mut self) {
        for tween in &mut self.tweens {
            tween.reset_blend();
        }
    }

    /// Run the tweens accepted in the current state for one tick.
    pub(crate) fn run_tweens(&mut self, outputs: &mut Outputs) {
        let state = self.state;
        let (time, dt, duration) = (self.time, self.delta_time, self.duration());
        let Item {
            id,
            target,
            keys,
            path,
            config,
            tweens,
            evaluation,
            ..
        } = self;
        let ctx = EffectContext {
            keys: &*keys,
            path: path.as_ref(),
            rotation_mode: config.rotation_mode,
        };
        for tween in tweens.iter_mut() {
            if !tween.accepts(state) {
                continue;
            }
            let eased = tween.advance(time, state, dt, duration);
            emit(*id, target, &ctx, tween, eased, evaluation, outputs);
        }
    }

    /// Evaluate every enabled tween at `time`, e.g. after an immediate
    /// activation.
    pub(crate) fn apply_all(&mut self, time: f32, outputs: &mut Outputs) {
        let state = self.state;
        let duration = self.duration();
        let Item {
            id,
            target,
            keys,
            path,
            config,
            tweens,
            evaluation,
            ..
        } = self;
        let ctx = EffectContext {
            keys: &*keys,
            path: path.as_ref(),
            rotation_mode: config.rotation_mode,
        };
        for tween in tweens.iter() {
            if !tween.enabled {
                continue;
            }
            let eased = tween.evaluate(time, tween.ease_for(state), duration);
            emit(*id, target, &ctx, tween, eased, evaluation, outputs);
        }
    }

    /// Manual evaluation at `time`, optionally filtered to the tweens of one
    /// direction. The item must already be slaved.
    pub(crate) fn evaluate_manual(&mut self, time: f32, direction: Option<ItemKey>, outputs: &mut Outputs) {
        let duration = self.duration();
        let Item {
            id,
            target,
            keys,
            path,
            config,
            tweens,
            evaluation,
            ..
        } = self;
        let ctx = EffectContext {
            keys: &*keys,
            path: path.as_ref(),
            rotation_mode: config.rotation_mode,
        };
        for tween in tweens.iter() {
            let ease = match direction {
                None if tween.enabled => tween.ease,
                None => continue,
                Some(key) => {
                    let opened = key == ItemKey::Opened;
                    if !tween.accepts_key(opened) {
                        continue;
                    }
                    if opened {
                        tween.ease
                    } else {
                        tween.ease_for(ItemState::Closed)
                    }
                }
            };
            let eased = tween.evaluate(time, ease, duration);
            emit(*id, target, &ctx, tween, eased, evaluation, outputs);
        }
    }

    /// Drive button-direction tweens from the pulse countdown.
    pub(crate) fn run_button_tweens(&mut self, outputs: &mut Outputs) {
        let progress = if self.config.button_duration > 0.0 {
            (self.button_evaluation / self.config.button_duration).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let progress = match self.config.button_direction {
            ButtonDirection::Open2Close => progress,
            ButtonDirection::Close2Open => 1.0 - progress,
        };
        let duration = self.duration();
        let Item {
            id,
            target,
            keys,
            path,
            config,
            tweens,
            evaluation,
            ..
        } = self;
        let ctx = EffectContext {
            keys: &*keys,
            path: path.as_ref(),
            rotation_mode: config.rotation_mode,
        };
        for tween in tweens.iter() {
            if !tween.enabled || tween.direction != TweenDirection::Button {
                continue;
            }
            let eased = tween.evaluate(progress, tween.ease, duration);
            emit(*id, target, &ctx, tween, eased, evaluation, outputs);
        }
    }
}

fn emit(
    id: ItemId,
    target: &TargetHandle,
    ctx: &EffectContext,
    tween: &Tween,
    eased: f32,
    evaluation: &mut f32,
    outputs: &mut Outputs,
) {
    if tween.effect == EffectKind::Time {
        *evaluation = eased;
    }
    if let Some(value) = evaluate_effect(ctx, tween.effect, tween.property.as_ref(), eased) {
        outputs.push_change(EffectChange {
            item: id,
            target: target.clone(),
            effect: tween.effect,
            eased,
            value,
        });
    }
}
