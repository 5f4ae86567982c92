//! Activation modes and the engine operations that start transitions.
//!
//! A mode combines a direction (open, close, toggle), a scope (the item
//! alone or its whole branch) and a timing (normal or immediate). Normal
//! activations arm the delay and hand the item to the scheduler; immediate
//! ones snap to the terminal state and write effects in the same call.

use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::ids::ItemId;
use crate::item::{ItemKey, ItemState};
use crate::outputs::Event;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationMode {
    #[default]
    Disabled,
    Open,
    Close,
    OpenClose,
    OpenBranch,
    CloseBranch,
    OpenCloseBranch,
    OpenImmediately,
    CloseImmediately,
    OpenCloseImmediately,
    OpenBranchImmediately,
    CloseBranchImmediately,
    OpenCloseBranchImmediately,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Open,
    Close,
    /// Open when closed or closing, close otherwise.
    Toggle,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    Item,
    Branch,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timing {
    Normal,
    Immediate,
}

impl ActivationMode {
    pub const ALL: [ActivationMode; 13] = [
        ActivationMode::Disabled,
        ActivationMode::Open,
        ActivationMode::Close,
        ActivationMode::OpenClose,
        ActivationMode::OpenBranch,
        ActivationMode::CloseBranch,
        ActivationMode::OpenCloseBranch,
        ActivationMode::OpenImmediately,
        ActivationMode::CloseImmediately,
        ActivationMode::OpenCloseImmediately,
        ActivationMode::OpenBranchImmediately,
        ActivationMode::CloseBranchImmediately,
        ActivationMode::OpenCloseBranchImmediately,
    ];

    pub fn direction(self) -> Option<Direction> {
        use ActivationMode::*;
        match self {
            Disabled => None,
            Open | OpenBranch | OpenImmediately | OpenBranchImmediately => Some(Direction::Open),
            Close | CloseBranch | CloseImmediately | CloseBranchImmediately => Some(Direction::Close),
            OpenClose | OpenCloseBranch | OpenCloseImmediately | OpenCloseBranchImmediately => {
                Some(Direction::Toggle)
            }
        }
    }

    pub fn scope(self) -> Option<Scope> {
        use ActivationMode::*;
        match self {
            Disabled => None,
            Open | Close | OpenClose | OpenImmediately | CloseImmediately | OpenCloseImmediately => {
                Some(Scope::Item)
            }
            _ => Some(Scope::Branch),
        }
    }

    pub fn timing(self) -> Option<Timing> {
        use ActivationMode::*;
        match self {
            Disabled => None,
            Open | Close | OpenClose | OpenBranch | CloseBranch | OpenCloseBranch => Some(Timing::Normal),
            _ => Some(Timing::Immediate),
        }
    }

    /// Inverse of the three accessors above.
    pub fn compose(direction: Direction, scope: Scope, timing: Timing) -> Self {
        use ActivationMode::*;
        match (timing, scope, direction) {
            (Timing::Normal, Scope::Item, Direction::Open) => Open,
            (Timing::Normal, Scope::Item, Direction::Close) => Close,
            (Timing::Normal, Scope::Item, Direction::Toggle) => OpenClose,
            (Timing::Normal, Scope::Branch, Direction::Open) => OpenBranch,
            (Timing::Normal, Scope::Branch, Direction::Close) => CloseBranch,
            (Timing::Normal, Scope::Branch, Direction::Toggle) => OpenCloseBranch,
            (Timing::Immediate, Scope::Item, Direction::Open) => OpenImmediately,
            (Timing::Immediate, Scope::Item, Direction::Close) => CloseImmediately,
            (Timing::Immediate, Scope::Item, Direction::Toggle) => OpenCloseImmediately,
            (Timing::Immediate, Scope::Branch, Direction::Open) => OpenBranchImmediately,
            (Timing::Immediate, Scope::Branch, Direction::Close) => CloseBranchImmediately,
            (Timing::Immediate, Scope::Branch, Direction::Toggle) => OpenCloseBranchImmediately,
        }
    }

    /// Loop modes that need a same-tick re-run of the item update.
    #[inline]
    pub fn is_immediate_close(self) -> bool {
        matches!(self, ActivationMode::CloseImmediately | ActivationMode::CloseBranchImmediately)
    }
}

impl Engine {
    /// Trigger `mode` on `item`. Unknown ids are ignored.
    pub fn activate(&mut self, item: ItemId, mode: ActivationMode) {
        let Some(it) = self.item_mut(item) else {
            log::warn!("activate: unknown item {item:?}");
            return;
        };
        it.loop_activated = false;
        let (Some(direction), Some(scope), Some(timing)) = (mode.direction(), mode.scope(), mode.timing()) else {
            return;
        };
        match (scope, timing) {
            (Scope::Item, Timing::Normal) => {
                self.transition(item, direction);
            }
            (Scope::Branch, Timing::Normal) => self.transition_branch(item, direction),
            (Scope::Item, Timing::Immediate) => self.snap(item, direction),
            (Scope::Branch, Timing::Immediate) => self.snap_branch(item, direction),
        }
    }

    /// Start opening `item`. Returns true when it opened immediately
    /// because both its open delay and duration are zero.
    pub fn open(&mut self, item: ItemId) -> bool {
        let brake = self.brakes_chain(item);
        let Some(it) = self.item_mut(item) else {
            return false;
        };
        if it.config.open_delay() == 0.0 && it.config.open_duration() == 0.0 {
            self.snap(item, Direction::Open);
            return true;
        }
        if it.state.is_open_like() {
            return false;
        }
        let mut wait = it.config.open_delay();
        if brake {
            wait *= 1.0 - it.time;
        }
        it.state_chg_time = wait;
        it.delay_pending = true;
        it.branch_mode = false;
        let phase = it.config.update_phase;
        self.set_state(item, ItemState::Opening);
        self.scheduler.register(item, phase);
        false
    }

    /// Start closing `item`. Returns true when it closed immediately.
    pub fn close(&mut self, item: ItemId) -> bool {
        let brake = self.brakes_chain(item);
        let Some(it) = self.item_mut(item) else {
            return false;
        };
        it.loop_activated = false;
        if it.config.close_delay() == 0.0 && it.config.close_duration() == 0.0 {
            self.snap(item, Direction::Close);
            return true;
        }
        if it.state.is_closed_like() {
            return false;
        }
        let mut wait = it.config.close_delay();
        if brake {
            wait *= it.time;
        }
        it.state_chg_time = wait;
        it.delay_pending = true;
        it.branch_mode = false;
        let phase = it.config.update_phase;
        self.set_state(item, ItemState::Closing);
        self.scheduler.register(item, phase);
        false
    }

    /// Open when closed or closing, close otherwise.
    pub fn toggle(&mut self, item: ItemId) -> bool {
        match self.item(item).map(|it| it.state.is_closed_like()) {
            Some(true) => self.open(item),
            Some(false) => self.close(item),
            None => false,
        }
    }

    fn transition(&mut self, item: ItemId, direction: Direction) -> bool {
        match direction {
            Direction::Open => self.open(item),
            Direction::Close => self.close(item),
            Direction::Toggle => self.toggle(item),
        }
    }

    fn transition_branch(&mut self, item: ItemId, direction: Direction) {
        let key = match direction {
            Direction::Toggle => {
                self.toggle(item);
                for child in self.active_children(item) {
                    self.activate(child, ActivationMode::OpenCloseBranch);
                }
                return;
            }
            Direction::Open => ItemKey::Opened,
            Direction::Close => ItemKey::Closed,
        };
        let immediate = self.transition(item, direction);
        let Some(it) = self.item_mut(item) else {
            return;
        };
        it.branch_mode = true;
        // An immediate item never ticks, so its delay never expires to
        // release the children.
        if it.config.child_before[key.index()] || immediate {
            self.activate_children(item, key);
        }
    }

    fn snap(&mut self, item: ItemId, direction: Direction) {
        let open = match (direction, self.item(item)) {
            (_, None) => return,
            (Direction::Open, _) => true,
            (Direction::Close, _) => false,
            (Direction::Toggle, Some(it)) => it.state.is_closed_like(),
        };
        self.scheduler.unregister(item);
        self.set_state(item, if open { ItemState::Opened } else { ItemState::Closed });
        let t = if open { 1.0 } else { 0.0 };
        if let Some((it, outputs)) = self.item_and_outputs(item) {
            it.time = t;
            it.apply_all(t, outputs);
            it.state_chg_time = 0.0;
            it.delay_pending = false;
        }
    }

    fn snap_branch(&mut self, item: ItemId, direction: Direction) {
        self.snap(item, direction);
        for child in self.active_children(item) {
            self.snap_branch(child, direction);
        }
    }

    pub fn open_immediately(&mut self, item: ItemId) {
        self.activate(item, ActivationMode::OpenImmediately);
    }

    pub fn close_immediately(&mut self, item: ItemId) {
        self.activate(item, ActivationMode::CloseImmediately);
    }

    pub fn open_branch(&mut self, item: ItemId) {
        self.activate(item, ActivationMode::OpenBranch);
    }

    pub fn close_branch(&mut self, item: ItemId) {
        self.activate(item, ActivationMode::CloseBranch);
    }

    /// Activate every active child with its own configured mode for `key`.
    pub fn activate_children(&mut self, item: ItemId, key: ItemKey) {
        for child in self.active_children(item) {
            let Some(mode) = self.item(child).map(|c| c.config.activations[key.index()]) else {
                continue;
            };
            self.activate(child, mode);
        }
    }

    pub fn open_children(&mut self, item: ItemId) {
        self.activate_children(item, ItemKey::Opened);
    }

    pub fn close_children(&mut self, item: ItemId) {
        self.activate_children(item, ItemKey::Closed);
    }

    /// Whether `item`'s delays are scaled by progress: its parent chains
    /// children with the brake enabled.
    fn brakes_chain(&self, item: ItemId) -> bool {
        self.item(item)
            .and_then(|it| it.parent)
            .and_then(|p| self.item(p))
            .is_some_and(|p| p.config.child_chain_mode && p.config.brake_chain_delay)
    }

    /// Move `item` to `to`, keeping the parent's child counters in step and
    /// emitting the change. Setting the current state again is a no-op.
    pub(crate) fn set_state(&mut self, item: ItemId, to: ItemState) {
        let Some(it) = self.item(item) else {
            return;
        };
        let from = it.state;
        if from == to {
            return;
        }
        let interactive = it.config.interactions && to.is_open_like();
        if let Some(parent) = self.counting_parent(item) {
            if let Some(p) = self.item_mut(parent) {
                if let Some(i) = from.counter_index() {
                    p.child_state_counts[i] = p.child_state_counts[i].saturating_sub(1);
                }
                if let Some(i) = to.counter_index() {
                    p.child_state_counts[i] += 1;
                }
            }
        }
        if let Some(it) = self.item_mut(item) {
            it.state = to;
        }
        log::debug!("{item:?}: {from:?} -> {to:?}");
        self.outputs.push_event(Event::StateChanged {
            item,
            from,
            to,
            interactive,
        });
        let edge = match to {
            ItemState::Opening => Event::Opening { item },
            ItemState::Opened => Event::Opened { item },
            ItemState::Closing => Event::Closing { item },
            ItemState::Closed => Event::Closed { item },
            ItemState::Slave => return,
        };
        self.outputs.push_event(edge);
    }
}
