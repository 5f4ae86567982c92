//! Scheduler context: which items receive ticks, per update phase, plus
//! the registered cores. Owned by one engine; nothing here is global.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::ids::{CoreId, ItemId};

/// Update pass an item is ticked in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdatePhase {
    /// Fixed-step pass, runs first in a frame.
    Fixed,
    /// Main pass; cores poll input here.
    #[default]
    Update,
    /// Runs after the main pass.
    Late,
}

impl UpdatePhase {
    /// Frame order.
    pub const ALL: [UpdatePhase; 3] = [UpdatePhase::Fixed, UpdatePhase::Update, UpdatePhase::Late];

    #[inline]
    fn slot(self) -> usize {
        match self {
            UpdatePhase::Fixed => 0,
            UpdatePhase::Update => 1,
            UpdatePhase::Late => 2,
        }
    }
}

/// Elapsed time for one phase, with and without the host's time scale.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaTime {
    pub scaled: f32,
    pub unscaled: f32,
}

impl DeltaTime {
    /// Same value for scaled and unscaled time.
    pub fn uniform(dt: f32) -> Self {
        Self {
            scaled: dt,
            unscaled: dt,
        }
    }
}

/// Per-phase delta provider.
pub trait ClockSource {
    fn delta_time(&self, phase: UpdatePhase) -> DeltaTime;
}

/// Clock with fixed values, for headless hosts and tests.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ManualClock {
    pub frame: DeltaTime,
    pub fixed: DeltaTime,
}

impl ManualClock {
    pub fn new(frame: f32, fixed: f32) -> Self {
        Self {
            frame: DeltaTime::uniform(frame),
            fixed: DeltaTime::uniform(fixed),
        }
    }

    pub fn with_time_scale(mut self, scale: f32) -> Self {
        self.frame.scaled = self.frame.unscaled * scale;
        self.fixed.scaled = self.fixed.unscaled * scale;
        self
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(1.0 / 60.0, 0.02)
    }
}

impl ClockSource for ManualClock {
    fn delta_time(&self, phase: UpdatePhase) -> DeltaTime {
        match phase {
            UpdatePhase::Fixed => self.fixed,
            UpdatePhase::Update | UpdatePhase::Late => self.frame,
        }
    }
}

/// Membership lists. Items keep registration order within a phase.
#[derive(Debug, Default)]
pub struct Scheduler {
    lists: [Vec<ItemId>; 3],
    members: HashMap<ItemId, UpdatePhase>,
    cores: Vec<CoreId>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `item` to `phase`. Returns false if it was already registered.
    pub fn register(&mut self, item: ItemId, phase: UpdatePhase) -> bool {
        if self.members.contains_key(&item) {
            return false;
        }
        self.members.insert(item, phase);
        self.lists[phase.slot()].push(item);
        log::trace!("scheduler: {item:?} joined {phase:?}");
        true
    }

    /// Remove `item` from whichever phase holds it.
    pub fn unregister(&mut self, item: ItemId) -> bool {
        let Some(phase) = self.members.remove(&item) else {
            return false;
        };
        let list = &mut self.lists[phase.slot()];
        if let Some(pos) = list.iter().position(|&i| i == item) {
            list.remove(pos);
        }
        log::trace!("scheduler: {item:?} left {phase:?}");
        true
    }

    #[inline]
    pub fn is_registered(&self, item: ItemId) -> bool {
        self.members.contains_key(&item)
    }

    #[inline]
    pub fn phase_of(&self, item: ItemId) -> Option<UpdatePhase> {
        self.members.get(&item).copied()
    }

    pub fn items(&self, phase: UpdatePhase) -> &[ItemId] {
        &self.lists[phase.slot()]
    }

    #[inline]
    pub fn len(&self, phase: UpdatePhase) -> usize {
        self.lists[phase.slot()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Copy of a phase list; a tick walks this so registrations made
    /// during the tick start on the next one.
    pub(crate) fn snapshot(&self, phase: UpdatePhase) -> Vec<ItemId> {
        self.lists[phase.slot()].clone()
    }

    pub fn add_core(&mut self, core: CoreId) {
        if !self.cores.contains(&core) {
            self.cores.push(core);
        }
    }

    pub fn remove_core(&mut self, core: CoreId) {
        self.cores.retain(|&c| c != core);
    }

    pub fn cores(&self) -> &[CoreId] {
        &self.cores
    }

    /// Drop every membership (items and cores).
    pub fn clear(&mut self) {
        for list in &mut self.lists {
            list.clear();
        }
        self.members.clear();
        self.cores.clear();
    }
}
