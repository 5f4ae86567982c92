//! Cores: exclusive selectors over named states.
//!
//! A [`Core`] holds an ordered list of [`State`]s; each state bundles
//! activators (an item plus optional override modes). Selecting a state
//! closes every other state and opens the chosen one.
//!
//! Core methods never touch items. They record what should happen as an
//! ordered list of [`PlanStep`]s which the engine then runs, so selection
//! logic stays independent of the item arena.

use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::ids::{CoreId, ItemId};
use crate::inputs::{InputSource, KeyCode};
use crate::item::{ActivationMode, ItemKey};
use crate::outputs::Event;

/// What to do when a selection names no enabled state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncorrectStateAction {
    #[default]
    OpenDefault,
    DoNothing,
    CloseAll,
}

/// How an activator drives its item.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Activation {
    Mode(ActivationMode),
    /// The item's own configured mode for that direction.
    Configured(ItemKey),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ActivationCommand {
    pub item: ItemId,
    pub activation: Activation,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PlanStep {
    Activate(ActivationCommand),
    Emit(Event),
}

/// One item inside a state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Activator {
    pub item: ItemId,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    /// Use `modes` instead of the item's configured activations.
    #[serde(default)]
    pub override_modes: bool,
    /// `[close, open]`.
    #[serde(default = "activator_modes_default")]
    pub modes: [ActivationMode; 2],
}

fn enabled_default() -> bool {
    true
}

fn activator_modes_default() -> [ActivationMode; 2] {
    [ActivationMode::CloseBranch, ActivationMode::OpenBranch]
}

impl Activator {
    pub fn new(item: ItemId) -> Self {
        Self {
            item,
            enabled: true,
            override_modes: false,
            modes: activator_modes_default(),
        }
    }

    pub fn with_modes(mut self, modes: [ActivationMode; 2]) -> Self {
        self.modes = modes;
        self
    }

    fn command(&self, key: ItemKey) -> ActivationCommand {
        let activation = if self.override_modes {
            Activation::Mode(self.modes[key.index()])
        } else {
            Activation::Configured(key)
        };
        ActivationCommand {
            item: self.item,
            activation,
        }
    }
}

/// A named selection inside a core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct State {
    pub name: String,
    pub enabled: bool,
    pub(crate) is_default: bool,
    /// Drive every activator with the state's override modes.
    pub override_modes: bool,
    pub mode_open_override: ActivationMode,
    pub mode_close_override: ActivationMode,
    pub activators: Vec<Activator>,
    /// Keys that select this state.
    pub keys: Vec<KeyCode>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            name: "new state".to_string(),
            enabled: true,
            is_default: false,
            override_modes: false,
            mode_open_override: ActivationMode::OpenBranch,
            mode_close_override: ActivationMode::CloseBranch,
            activators: Vec::new(),
            keys: Vec::new(),
        }
    }
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_activator(mut self, activator: Activator) -> Self {
        self.activators.push(activator);
        self
    }

    #[inline]
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// Case-insensitive name match.
    pub fn matches(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    pub fn add_item(&mut self, activator: Activator) {
        self.activators.push(activator);
    }

    pub fn remove_item(&mut self, item: ItemId) {
        self.activators.retain(|a| a.item != item);
    }

    pub fn add_selection_key(&mut self, key: KeyCode) {
        if !self.keys.contains(&key) {
            self.keys.push(key);
        }
    }

    pub fn remove_selection_key(&mut self, key: KeyCode) {
        self.keys.retain(|&k| k != key);
    }

    fn drive(&self, key: ItemKey, plan: &mut Vec<PlanStep>) {
        let override_mode = match key {
            ItemKey::Opened => self.mode_open_override,
            ItemKey::Closed => self.mode_close_override,
        };
        for activator in self.activators.iter().filter(|a| a.enabled) {
            let command = if self.override_modes {
                ActivationCommand {
                    item: activator.item,
                    activation: Activation::Mode(override_mode),
                }
            } else {
                activator.command(key)
            };
            plan.push(PlanStep::Activate(command));
        }
    }

    fn open(&self, core: CoreId, plan: &mut Vec<PlanStep>) {
        if !self.enabled {
            return;
        }
        self.drive(ItemKey::Opened, plan);
        plan.push(PlanStep::Emit(Event::StateOpened {
            core,
            state: self.name.clone(),
        }));
    }

    fn close(&self, core: CoreId, plan: &mut Vec<PlanStep>) {
        if !self.enabled {
            return;
        }
        self.drive(ItemKey::Closed, plan);
        plan.push(PlanStep::Emit(Event::StateClosed {
            core,
            state: self.name.clone(),
        }));
    }

    fn activate(&self, mode: ActivationMode, force: bool, plan: &mut Vec<PlanStep>) {
        if !force && !self.enabled {
            return;
        }
        for activator in self.activators.iter().filter(|a| a.enabled) {
            plan.push(PlanStep::Activate(ActivationCommand {
                item: activator.item,
                activation: Activation::Mode(mode),
            }));
        }
    }
}

/// Exclusive selector. At most one state is current.
#[derive(Clone, Debug, PartialEq)]
pub struct Core {
    pub(crate) id: CoreId,
    pub name: String,
    pub incorrect_action: IncorrectStateAction,
    /// Poll state selection keys each frame.
    pub use_input: bool,
    /// Emit selection events.
    pub use_events: bool,
    states: Vec<State>,
    current: Option<usize>,
}

impl Core {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CoreId(u32::MAX),
            name: name.into(),
            incorrect_action: IncorrectStateAction::OpenDefault,
            use_input: true,
            use_events: false,
            states: Vec::new(),
            current: None,
        }
    }

    #[inline]
    pub fn id(&self) -> CoreId {
        self.id
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub(crate) fn states_mut(&mut self) -> &mut [State] {
        &mut self.states
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn count_enabled(&self) -> usize {
        self.states.iter().filter(|s| s.enabled).count()
    }

    /// First state with a case-insensitive name match, enabled or not.
    pub fn state(&self, name: &str) -> Option<&State> {
        self.states.iter().find(|s| s.matches(name))
    }

    pub fn state_mut(&mut self, name: &str) -> Option<&mut State> {
        self.states.iter_mut().find(|s| s.matches(name))
    }

    pub fn state_at(&self, index: usize) -> Option<&State> {
        self.states.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.states.iter().position(|s| s.matches(name))
    }

    #[inline]
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_state(&self) -> Option<&State> {
        self.current.and_then(|i| self.states.get(i))
    }

    pub fn first_enabled(&self) -> Option<usize> {
        self.states.iter().position(|s| s.enabled)
    }

    pub fn last_enabled(&self) -> Option<usize> {
        self.states.iter().rposition(|s| s.enabled)
    }

    pub fn default_index(&self) -> Option<usize> {
        self.states.iter().position(|s| s.is_default)
    }

    pub fn default_state(&self) -> Option<&State> {
        self.default_index().map(|i| &self.states[i])
    }

    /// Append a state; returns its index.
    pub fn add_state(&mut self, state: State) -> usize {
        self.states.push(state);
        self.states.len() - 1
    }

    /// Remove every state matching `name`.
    pub fn remove_state(&mut self, name: &str) -> usize {
        let before = self.states.len();
        let current = self.current.map(|i| self.states[i].name.clone());
        self.states.retain(|s| !s.matches(name));
        self.current = current.and_then(|n| self.states.iter().position(|s| s.name == n));
        before - self.states.len()
    }

    pub fn remove_state_at(&mut self, index: usize) -> Option<State> {
        if index >= self.states.len() {
            return None;
        }
        self.current = match self.current {
            Some(c) if c == index => None,
            Some(c) if c > index => Some(c - 1),
            other => other,
        };
        Some(self.states.remove(index))
    }

    /// Mark the enabled state `name` as default, or clear the default with
    /// `None`. An unknown name also leaves no default.
    pub fn set_default_state(&mut self, name: Option<&str>) {
        for state in &mut self.states {
            state.is_default = false;
        }
        let Some(name) = name else {
            return;
        };
        if let Some(state) = self.states.iter_mut().find(|s| s.enabled && s.matches(name)) {
            state.is_default = true;
        }
    }

    pub(crate) fn select(&mut self, name: &str, plan: &mut Vec<PlanStep>) {
        match self.states.iter().position(|s| s.enabled && s.matches(name)) {
            Some(index) => self.select_resolved(index, plan),
            None => self.select_incorrect(Some(name.to_string()), plan),
        }
    }

    pub(crate) fn select_index(&mut self, index: usize, plan: &mut Vec<PlanStep>) {
        match self.states.get(index).map(|s| s.enabled) {
            Some(true) => self.select_resolved(index, plan),
            Some(false) => {
                let requested = Some(self.states[index].name.clone());
                self.select_incorrect(requested, plan)
            }
            None => self.select_incorrect(None, plan),
        }
    }

    fn select_target(&mut self, target: Option<usize>, plan: &mut Vec<PlanStep>) {
        match target {
            Some(index) => self.select_index(index, plan),
            None => self.select_incorrect(None, plan),
        }
    }

    fn select_resolved(&mut self, index: usize, plan: &mut Vec<PlanStep>) {
        self.current = Some(index);
        let selected = &self.states[index];
        log::debug!("core '{}': select '{}'", self.name, selected.name);
        for state in self.states.iter().filter(|s| !s.matches(&selected.name)) {
            state.close(self.id, plan);
        }
        selected.open(self.id, plan);

        if !self.use_events {
            return;
        }
        let name = selected.name.clone();
        plan.push(PlanStep::Emit(Event::StateSelected {
            core: self.id,
            state: name.clone(),
        }));
        if self.first_enabled() == Some(index) || index == 0 {
            plan.push(PlanStep::Emit(Event::FirstStateSelected {
                core: self.id,
                state: name.clone(),
            }));
        }
        if self.last_enabled() == Some(index) || index + 1 == self.states.len() {
            plan.push(PlanStep::Emit(Event::LastStateSelected { core: self.id, state: name }));
        }
    }

    fn select_incorrect(&mut self, requested: Option<String>, plan: &mut Vec<PlanStep>) {
        log::warn!("core '{}': no enabled state {:?}", self.name, requested);
        self.current = None;
        match self.incorrect_action {
            IncorrectStateAction::OpenDefault => {
                if let Some(index) = self.default_index().filter(|&i| self.states[i].enabled) {
                    self.select_resolved(index, plan);
                }
            }
            IncorrectStateAction::CloseAll => {
                for state in &self.states {
                    state.close(self.id, plan);
                }
            }
            IncorrectStateAction::DoNothing => {}
        }
        if self.use_events {
            plan.push(PlanStep::Emit(Event::IncorrectState {
                core: self.id,
                requested,
            }));
        }
    }

    pub(crate) fn select_default(&mut self, plan: &mut Vec<PlanStep>) {
        if let Some(index) = self.default_index() {
            let name = self.states[index].name.clone();
            self.select(&name, plan);
        }
    }

    pub(crate) fn select_next(&mut self, plan: &mut Vec<PlanStep>) {
        if self.current == self.last_enabled() || self.states.len() <= 1 {
            return;
        }
        let target = match self.current {
            None => (!self.states.is_empty()).then_some(0),
            Some(c) => (c + 1 < self.states.len()).then_some(c + 1),
        };
        self.select_target(target, plan);
    }

    pub(crate) fn select_next_enabled(&mut self, plan: &mut Vec<PlanStep>) {
        if self.current == self.last_enabled() || self.count_enabled() <= 1 {
            return;
        }
        let from = self.current.map_or(0, |c| c + 1);
        let target = (from..self.states.len()).find(|&i| self.states[i].enabled);
        self.select_target(target, plan);
    }

    pub(crate) fn select_previous(&mut self, plan: &mut Vec<PlanStep>) {
        let first = (!self.states.is_empty()).then_some(0);
        if self.current == first || self.states.len() <= 1 {
            return;
        }
        let target = match self.current {
            None => self.states.len().checked_sub(1),
            Some(c) => c.checked_sub(1),
        };
        self.select_target(target, plan);
    }

    pub(crate) fn select_previous_enabled(&mut self, plan: &mut Vec<PlanStep>) {
        if self.current == self.first_enabled() || self.count_enabled() <= 1 {
            return;
        }
        let to = self.current.unwrap_or(self.states.len());
        let target = (0..to).rev().find(|&i| self.states[i].enabled);
        self.select_target(target, plan);
    }

    pub(crate) fn close_all(&mut self, plan: &mut Vec<PlanStep>) {
        for state in &self.states {
            state.close(self.id, plan);
        }
        if let Some(current) = self.current.take() {
            if self.use_events {
                plan.push(PlanStep::Emit(Event::CurrentStateClosed {
                    core: self.id,
                    state: self.states[current].name.clone(),
                }));
            }
        }
    }

    pub(crate) fn close_state(&mut self, name: &str, plan: &mut Vec<PlanStep>) -> bool {
        let Some(index) = self.index_of(name) else {
            return false;
        };
        self.states[index].close(self.id, plan);
        if self.current == Some(index) {
            self.current = None;
            if self.use_events {
                plan.push(PlanStep::Emit(Event::CurrentStateClosed {
                    core: self.id,
                    state: self.states[index].name.clone(),
                }));
            }
        }
        true
    }

    pub(crate) fn activate_state(&self, name: &str, mode: ActivationMode, force: bool, plan: &mut Vec<PlanStep>) -> bool {
        match self.state(name) {
            Some(state) => {
                state.activate(mode, force, plan);
                true
            }
            None => false,
        }
    }

    /// Keyboard selection: each enabled state whose key went down selects
    /// itself, in list order.
    pub(crate) fn update(&mut self, input: &dyn InputSource, plan: &mut Vec<PlanStep>) {
        if !self.use_input || !input.any_key_down() {
            return;
        }
        let hits: Vec<String> = self
            .states
            .iter()
            .filter(|s| s.enabled && s.keys.iter().any(|&k| input.key_down(k)))
            .map(|s| s.name.clone())
            .collect();
        for name in hits {
            self.select(&name, plan);
        }
    }
}

impl Engine {
    /// Register a core; it is polled for input on every update phase.
    pub fn add_core(&mut self, mut core: Core) -> CoreId {
        let id = self.ids.alloc_core();
        core.id = id;
        let slot = id.index();
        if self.cores.len() <= slot {
            self.cores.resize_with(slot + 1, || None);
        }
        self.cores[slot] = Some(core);
        self.scheduler.add_core(id);
        id
    }

    pub fn remove_core(&mut self, id: CoreId) -> Option<Core> {
        self.scheduler.remove_core(id);
        self.cores.get_mut(id.index()).and_then(Option::take)
    }

    pub fn core(&self, id: CoreId) -> Option<&Core> {
        self.cores.get(id.index()).and_then(Option::as_ref)
    }

    pub fn core_mut(&mut self, id: CoreId) -> Option<&mut Core> {
        self.cores.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Run `f` against a core and execute the plan it records.
    fn with_core<R>(&mut self, id: CoreId, f: impl FnOnce(&mut Core, &mut Vec<PlanStep>) -> R) -> Option<R> {
        let Some(core) = self.cores.get_mut(id.index()).and_then(Option::as_mut) else {
            log::warn!("unknown core {id:?}");
            return None;
        };
        let mut plan = Vec::new();
        let result = f(core, &mut plan);
        self.run_plan(plan);
        Some(result)
    }

    pub(crate) fn run_plan(&mut self, plan: Vec<PlanStep>) {
        for step in plan {
            match step {
                PlanStep::Activate(command) => {
                    let mode = match command.activation {
                        Activation::Mode(mode) => Some(mode),
                        Activation::Configured(key) => self.item(command.item).map(|it| it.config.activations[key.index()]),
                    };
                    match mode {
                        Some(mode) => self.activate(command.item, mode),
                        None => log::warn!("activator refers to unknown item {:?}", command.item),
                    }
                }
                PlanStep::Emit(event) => self.outputs.push_event(event),
            }
        }
    }

    /// Add a state driving `items`; each activator starts with the item's
    /// configured modes. Returns the state index.
    pub fn add_state(&mut self, core: CoreId, name: &str, items: &[ItemId]) -> Option<usize> {
        let mut state = State::new(name);
        for &item in items {
            state.add_item(self.activator_for(item));
        }
        self.core_mut(core).map(|c| c.add_state(state))
    }

    /// Add `item` to the state `name` of `core`.
    pub fn add_activator(&mut self, core: CoreId, name: &str, item: ItemId) -> bool {
        let activator = self.activator_for(item);
        match self.core_mut(core).and_then(|c| c.state_mut(name)) {
            Some(state) => {
                state.add_item(activator);
                true
            }
            None => false,
        }
    }

    fn activator_for(&self, item: ItemId) -> Activator {
        let activator = Activator::new(item);
        match self.item(item) {
            Some(it) => activator.with_modes(it.config.activations),
            None => activator,
        }
    }

    /// Open state `name` and close every other state of `core`.
    ///
    /// Disabled states are left as they are: one that was open before it
    /// was disabled stays open next to the selection.
    pub fn select_state(&mut self, core: CoreId, name: &str) {
        self.with_core(core, |c, plan| c.select(name, plan));
    }

    pub fn select_state_index(&mut self, core: CoreId, index: usize) {
        self.with_core(core, |c, plan| c.select_index(index, plan));
    }

    pub fn select_default_state(&mut self, core: CoreId) {
        self.with_core(core, |c, plan| c.select_default(plan));
    }

    pub fn select_next(&mut self, core: CoreId) {
        self.with_core(core, |c, plan| c.select_next(plan));
    }

    pub fn select_next_enabled(&mut self, core: CoreId) {
        self.with_core(core, |c, plan| c.select_next_enabled(plan));
    }

    pub fn select_previous(&mut self, core: CoreId) {
        self.with_core(core, |c, plan| c.select_previous(plan));
    }

    pub fn select_previous_enabled(&mut self, core: CoreId) {
        self.with_core(core, |c, plan| c.select_previous_enabled(plan));
    }

    pub fn close_all(&mut self, core: CoreId) {
        self.with_core(core, |c, plan| c.close_all(plan));
    }

    pub fn close_state(&mut self, core: CoreId, name: &str) -> bool {
        self.with_core(core, |c, plan| c.close_state(name, plan)).unwrap_or(false)
    }

    /// Drive every enabled activator of state `name` with `mode`. Disabled
    /// states are skipped unless `force` is set.
    pub fn activate_state(&mut self, core: CoreId, name: &str, mode: ActivationMode, force: bool) -> bool {
        self.with_core(core, |c, plan| c.activate_state(name, mode, force, plan))
            .unwrap_or(false)
    }

    pub(crate) fn update_core(&mut self, core: CoreId, input: &dyn InputSource) {
        self.with_core(core, |c, plan| c.update(input, plan));
    }
}
