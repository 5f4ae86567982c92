//! Output contracts from the engine.
//!
//! Outputs carry the effect values written this tick, keyed by the item's
//! target handle, and a separate list of semantic events. Hosts either
//! drain the buffer themselves or hand it an [`EffectSink`].

use serde::{Deserialize, Serialize};

use curtain_api_core::Value;

use crate::effects::EffectKind;
use crate::ids::{CoreId, ItemId};
use crate::item::ItemState;

/// Stable string key identifying the host object an item drives.
pub type TargetHandle = String;

/// One effect write for an item this tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectChange {
    pub item: ItemId,
    pub target: TargetHandle,
    pub effect: EffectKind,
    /// Eased scalar the value was derived from.
    pub eased: f32,
    pub value: Value,
}

/// Discrete signals emitted while activating, ticking and selecting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Event {
    StateChanged {
        item: ItemId,
        from: ItemState,
        to: ItemState,
        /// Host widgets should accept interaction (opening or opened).
        interactive: bool,
    },
    Opening {
        item: ItemId,
    },
    Opened {
        item: ItemId,
    },
    Closing {
        item: ItemId,
    },
    Closed {
        item: ItemId,
    },
    StateSelected {
        core: CoreId,
        state: String,
    },
    FirstStateSelected {
        core: CoreId,
        state: String,
    },
    LastStateSelected {
        core: CoreId,
        state: String,
    },
    CurrentStateClosed {
        core: CoreId,
        state: String,
    },
    IncorrectState {
        core: CoreId,
        requested: Option<String>,
    },
    StateOpened {
        core: CoreId,
        state: String,
    },
    StateClosed {
        core: CoreId,
        state: String,
    },
    ConfigurationError {
        item: Option<ItemId>,
        message: String,
    },
}

/// Host side of effect dispatch.
pub trait EffectSink {
    fn apply_effect(&mut self, change: &EffectChange);
}

impl<F: FnMut(&EffectChange)> EffectSink for F {
    fn apply_effect(&mut self, change: &EffectChange) {
        self(change)
    }
}

/// Accumulated changes and events; drained by `Engine::take_outputs`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub changes: Vec<EffectChange>,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.changes.clear();
        self.events.clear();
    }

    #[inline]
    pub fn push_change(&mut self, change: EffectChange) {
        self.changes.push(change);
    }

    #[inline]
    pub fn push_event(&mut self, event: Event) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.events.is_empty()
    }

    /// Feed every change, in order, to `sink`.
    pub fn apply_to<S: EffectSink + ?Sized>(&self, sink: &mut S) {
        for change in &self.changes {
            sink.apply_effect(change);
        }
    }

    /// Last value written to `target` for `effect`, if any.
    pub fn latest(&self, target: &str, effect: EffectKind) -> Option<&Value> {
        self.changes
            .iter()
            .rev()
            .find(|c| c.target == target && c.effect == effect)
            .map(|c| &c.value)
    }
}
