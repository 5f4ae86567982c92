//! Engine: data ownership and the public API.
//!
//! One engine is one independent simulation. It owns the item and core
//! arenas, the scheduler context, the seeded rng used by random chains and
//! the outputs buffer. Activation, per-tick update, chains and cores add
//! their operations to `Engine` from their own modules.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::EngineConfig;
use crate::error::TransitionError;
use crate::ids::{IdAllocator, ItemId};
use crate::inputs::InputSource;
use crate::item::{Item, ItemKey, ItemState};
use crate::outputs::Outputs;
use crate::scheduler::{ClockSource, DeltaTime, Scheduler, UpdatePhase};
use crate::selector::Core;

#[derive(Debug)]
pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) ids: IdAllocator,
    pub(crate) items: Vec<Option<Item>>,
    pub(crate) cores: Vec<Option<Core>>,
    pub(crate) scheduler: Scheduler,
    pub(crate) rng: StdRng,
    pub(crate) outputs: Outputs,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.random_seed),
            config,
            ids: IdAllocator::new(),
            items: Vec::new(),
            cores: Vec::new(),
            scheduler: Scheduler::new(),
            outputs: Outputs::default(),
        }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Direct access for hosts that manage tick membership themselves.
    #[inline]
    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Drop every item and core and start over with a fresh rng.
    pub fn reset(&mut self) {
        self.items.clear();
        self.cores.clear();
        self.scheduler.clear();
        self.ids.reset();
        self.outputs.clear();
        self.rng = StdRng::seed_from_u64(self.config.random_seed);
    }

    // ----- items -----

    /// Insert a closed, unattached item.
    pub fn add_item(&mut self, mut item: Item) -> ItemId {
        let id = self.ids.alloc_item();
        item.id = id;
        item.parent = None;
        item.children.clear();
        item.sibling_index = 1;
        item.child_state_counts = [0; 4];
        item.child_count_without_loops = 0;
        if let Some(path) = item.path.as_mut() {
            path.set_sampling(self.config.dynamic_path_sampling);
        }
        if self.config.emit_initial_effects {
            item.apply_all(0.0, &mut self.outputs);
        }
        let slot = id.index();
        if self.items.len() <= slot {
            self.items.resize_with(slot + 1, || None);
        }
        self.items[slot] = Some(item);
        id
    }

    /// Remove an item. Its children become roots and cores stop
    /// referring to it.
    pub fn remove_item(&mut self, id: ItemId) -> Option<Item> {
        self.item(id)?;
        if let Err(err) = self.detach(id) {
            log::warn!("remove_item: {err}");
        }
        self.scheduler.unregister(id);
        let mut item = self.items.get_mut(id.index()).and_then(Option::take)?;
        for &child in &item.children {
            if let Some(c) = self.item_mut(child) {
                c.parent = None;
                c.sibling_index = 1;
            }
        }
        item.children.clear();
        for core in self.cores.iter_mut().flatten() {
            for state in core.states_mut() {
                state.remove_item(id);
            }
        }
        Some(item)
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id.index()).and_then(Option::as_ref)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Live items in id order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().flatten()
    }

    pub(crate) fn item_and_outputs(&mut self, id: ItemId) -> Option<(&mut Item, &mut Outputs)> {
        let item = self.items.get_mut(id.index()).and_then(Option::as_mut)?;
        Some((item, &mut self.outputs))
    }

    /// Enabled children in attach order.
    pub fn active_children(&self, id: ItemId) -> Vec<ItemId> {
        let Some(item) = self.item(id) else {
            return Vec::new();
        };
        item.children
            .iter()
            .copied()
            .filter(|&c| self.item(c).is_some_and(|c| c.enabled))
            .collect()
    }

    /// Active descendants, depth first.
    pub fn descendants(&self, id: ItemId) -> Vec<ItemId> {
        let mut out = Vec::new();
        let mut stack = self.active_children(id);
        stack.reverse();
        while let Some(next) = stack.pop() {
            out.push(next);
            let mut children = self.active_children(next);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Disabled items are skipped by ticks and leave their parent's child
    /// set until re-enabled.
    pub fn set_enabled(&mut self, id: ItemId, enabled: bool) {
        let Some(item) = self.item_mut(id) else {
            log::warn!("set_enabled: unknown item {id:?}");
            return;
        };
        if item.enabled == enabled {
            return;
        }
        item.enabled = enabled;
        let parent = item.parent;
        if !enabled {
            self.scheduler.unregister(id);
        }
        if let Some(parent) = parent {
            self.relink(parent);
        }
    }

    pub fn set_loops(&mut self, id: ItemId, loops: i32) {
        let Some(item) = self.item_mut(id) else {
            return;
        };
        item.config.loops = loops;
        item.current_loops = 0;
        item.loop_activated = false;
        if let Some(parent) = item.parent {
            self.recount_children(parent);
        }
    }

    // ----- hierarchy -----

    /// Make `child` the last child of `parent`. Links are refused (with a
    /// warning) when the child ignores its parent or the parent ignores
    /// its children.
    pub fn attach(&mut self, child: ItemId, parent: ItemId) -> Result<(), TransitionError> {
        let c = self.item(child).ok_or(TransitionError::UnknownItem(child))?;
        let p = self.item(parent).ok_or(TransitionError::UnknownItem(parent))?;
        if c.config.ignore_parent || p.config.ignore_children {
            log::warn!("attach: {child:?} -> {parent:?} refused by ignore flags");
            return Ok(());
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(TransitionError::HierarchyCycle { child, parent });
        }
        if c.parent == Some(parent) {
            return Ok(());
        }
        self.detach(child)?;
        if let Some(p) = self.item_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.item_mut(child) {
            c.parent = Some(parent);
        }
        self.relink(parent);
        Ok(())
    }

    /// Make `child` a root. Detaching a root is a no-op.
    pub fn detach(&mut self, child: ItemId) -> Result<(), TransitionError> {
        let c = self.item_mut(child).ok_or(TransitionError::UnknownItem(child))?;
        let Some(parent) = c.parent.take() else {
            return Ok(());
        };
        c.sibling_index = 1;
        if let Some(p) = self.item_mut(parent) {
            p.children.retain(|&x| x != child);
        }
        self.relink(parent);
        Ok(())
    }

    fn is_ancestor_or_self(&self, candidate: ItemId, of: ItemId) -> bool {
        let mut cursor = Some(of);
        while let Some(id) = cursor {
            if id == candidate {
                return true;
            }
            cursor = self.item(id).and_then(|i| i.parent);
        }
        false
    }

    /// Parent whose counters track `item`, if any.
    pub(crate) fn counting_parent(&self, item: ItemId) -> Option<ItemId> {
        let i = self.item(item)?;
        if !i.counts_for_parent() {
            return None;
        }
        let parent = i.parent?;
        let p = self.item(parent)?;
        (!p.config.ignore_children).then_some(parent)
    }

    fn relink(&mut self, parent: ItemId) {
        self.recount_children(parent);
        self.update_chain_delays(parent, ItemKey::Closed);
        self.update_chain_delays(parent, ItemKey::Opened);
    }

    /// Rebuild sibling indices and the per-state child counters of `parent`
    /// from its active children.
    pub fn recount_children(&mut self, parent: ItemId) {
        let children = self.active_children(parent);
        let Some(ignore_children) = self.item(parent).map(|p| p.config.ignore_children) else {
            return;
        };
        let mut counts = [0u32; 4];
        let mut without_loops = 0;
        for (i, &child) in children.iter().enumerate() {
            let Some(c) = self.item_mut(child) else {
                continue;
            };
            c.sibling_index = i + 1;
            if ignore_children || !c.counts_for_parent() {
                continue;
            }
            without_loops += 1;
            if let Some(slot) = c.state.counter_index() {
                counts[slot] += 1;
            }
        }
        if let Some(p) = self.item_mut(parent) {
            p.child_state_counts = counts;
            p.child_count_without_loops = without_loops;
        }
    }

    /// Recompute counters and chain delays through the subtree of `root`.
    pub fn refresh(&mut self, root: ItemId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            self.relink(id);
            stack.extend(self.active_children(id));
        }
    }

    /// Refresh every root.
    pub fn refresh_all(&mut self) {
        let roots: Vec<ItemId> = self.items().filter(|i| i.parent.is_none()).map(|i| i.id).collect();
        for root in roots {
            self.refresh(root);
        }
    }

    // ----- manual evaluation -----

    /// Take `id` out of automatic ticking and evaluate its tweens at
    /// `time`, optionally only those of one direction.
    pub fn evaluate(&mut self, id: ItemId, time: f32, direction: Option<ItemKey>) {
        if self.item(id).is_none() {
            log::warn!("evaluate: unknown item {id:?}");
            return;
        }
        self.scheduler.unregister(id);
        self.set_state(id, ItemState::Slave);
        if let Some((item, outputs)) = self.item_and_outputs(id) {
            item.time = time;
            item.evaluate_manual(time, direction, outputs);
        }
    }

    pub fn evaluate_branch(&mut self, id: ItemId, time: f32, direction: Option<ItemKey>) {
        self.evaluate(id, time, direction);
        for child in self.active_children(id) {
            self.evaluate_branch(child, time, direction);
        }
    }

    // ----- driving -----

    /// Two-phase startup: refresh the hierarchy, run every item's start
    /// action, then select each core's default state.
    pub fn start(&mut self) {
        self.refresh_all();
        let items: Vec<(ItemId, _)> = self.items().map(|i| (i.id, i.config.start_action)).collect();
        for (id, mode) in items {
            self.activate(id, mode);
        }
        let cores: Vec<_> = self.cores.iter().flatten().map(|c| c.id).collect();
        for core in cores {
            self.select_default_state(core);
        }
    }

    /// Tick every item registered in `phase`, in registration order. Items
    /// registered during the tick start on the next one. Cores poll input
    /// during the update phase.
    pub fn tick(&mut self, phase: UpdatePhase, delta: DeltaTime, input: &dyn InputSource) {
        for id in self.scheduler.snapshot(phase) {
            if self.scheduler.phase_of(id) != Some(phase) {
                continue;
            }
            self.update_item(id, delta, 0, input);
        }
        if phase == UpdatePhase::Update {
            for core in self.scheduler.cores().to_vec() {
                self.update_core(core, input);
            }
        }
    }

    /// Run fixed, update and late phases and drain the outputs.
    pub fn frame(&mut self, clock: &dyn ClockSource, input: &dyn InputSource) -> Outputs {
        for phase in UpdatePhase::ALL {
            self.tick(phase, clock.delta_time(phase), input);
        }
        self.take_outputs()
    }

    #[inline]
    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    pub fn take_outputs(&mut self) -> Outputs {
        std::mem::take(&mut self.outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Ease;
    use crate::effects::EffectKind;
    use crate::inputs::NoInput;
    use crate::item::ActivationMode;
    use crate::scheduler::ManualClock;
    use crate::tween::Tween;
    use curtain_api_core::Value;

    fn engine() -> Engine {
        Engine::new(EngineConfig::default())
    }

    #[test]
    fn add_item_writes_closed_effects() {
        let mut e = engine();
        let id = e.add_item(Item::new("fade").with_tween(Tween::new(EffectKind::Alpha, Ease::Linear)));
        let out = e.take_outputs();
        assert_eq!(out.latest("fade", EffectKind::Alpha), Some(&Value::Float(0.0)));
        assert_eq!(e.item(id).unwrap().state(), ItemState::Closed);
    }

    #[test]
    fn attach_rejects_cycles() {
        let mut e = engine();
        let a = e.add_item(Item::new("a"));
        let b = e.add_item(Item::new("b"));
        e.attach(b, a).unwrap();
        assert!(matches!(e.attach(a, b), Err(TransitionError::HierarchyCycle { .. })));
        assert!(matches!(e.attach(a, a), Err(TransitionError::HierarchyCycle { .. })));
    }

    #[test]
    fn attach_respects_ignore_flags() {
        let mut e = engine();
        let mut lonely = Item::new("lonely");
        lonely.config.ignore_parent = true;
        let parent = e.add_item(Item::new("parent"));
        let child = e.add_item(lonely);
        e.attach(child, parent).unwrap();
        assert!(e.item(parent).unwrap().children().is_empty());
        assert!(e.item(child).unwrap().parent().is_none());
    }

    #[test]
    fn reparenting_moves_counters() {
        let mut e = engine();
        let a = e.add_item(Item::new("a"));
        let b = e.add_item(Item::new("b"));
        let c = e.add_item(Item::new("c"));
        e.attach(c, a).unwrap();
        assert_eq!(e.item(a).unwrap().child_count_without_loops(), 1);
        e.attach(c, b).unwrap();
        assert_eq!(e.item(a).unwrap().child_count_without_loops(), 0);
        assert_eq!(e.item(b).unwrap().child_state_count(ItemState::Closed), 1);
        assert_eq!(e.item(c).unwrap().parent(), Some(b));
    }

    #[test]
    fn disabled_and_looping_children_are_not_counted() {
        let mut e = engine();
        let root = e.add_item(Item::new("root"));
        let kids: Vec<_> = (0..3).map(|i| e.add_item(Item::new(format!("k{i}")))).collect();
        for &k in &kids {
            e.attach(k, root).unwrap();
        }
        e.set_enabled(kids[0], false);
        e.set_loops(kids[1], -1);
        let r = e.item(root).unwrap();
        assert_eq!(r.child_count_without_loops(), 1);
        assert_eq!(r.child_state_count(ItemState::Closed), 1);
        assert_eq!(e.active_children(root), vec![kids[1], kids[2]]);
        assert_eq!(e.item(kids[2]).unwrap().sibling_index(), 2);
    }

    #[test]
    fn remove_item_orphans_children() {
        let mut e = engine();
        let a = e.add_item(Item::new("a"));
        let b = e.add_item(Item::new("b"));
        let c = e.add_item(Item::new("c"));
        e.attach(b, a).unwrap();
        e.attach(c, b).unwrap();
        assert!(e.remove_item(b).is_some());
        assert!(e.item(b).is_none());
        assert!(e.item(c).unwrap().parent().is_none());
        assert!(e.item(a).unwrap().children().is_empty());
        assert!(e.remove_item(b).is_none());
    }

    #[test]
    fn evaluate_slaves_and_unregisters() {
        let mut e = engine();
        let id = e.add_item(Item::new("scrub").with_tween(Tween::new(EffectKind::Alpha, Ease::Linear)));
        e.open(id);
        e.take_outputs();
        e.evaluate(id, 0.25, None);
        assert_eq!(e.item(id).unwrap().state(), ItemState::Slave);
        assert!(!e.scheduler().is_registered(id));
        let out = e.take_outputs();
        assert_eq!(out.latest("scrub", EffectKind::Alpha), Some(&Value::Float(0.25)));
    }

    #[test]
    fn frame_runs_phases_in_order_and_drains() {
        let mut e = engine();
        let mut fixed = Item::new("physics");
        fixed.config.update_phase = UpdatePhase::Fixed;
        let id = e.add_item(fixed);
        e.activate(id, ActivationMode::Open);
        assert_eq!(e.scheduler().phase_of(id), Some(UpdatePhase::Fixed));
        let clock = ManualClock::new(0.1, 0.5);
        e.frame(&clock, &NoInput);
        let out = e.frame(&clock, &NoInput);
        assert!(out.events.is_empty());
        assert!((e.item(id).unwrap().time() - 0.5).abs() < 1e-6);
        assert!(e.outputs().is_empty());
    }

    #[test]
    fn start_runs_start_actions() {
        let mut e = engine();
        let mut item = Item::new("intro");
        item.config.start_action = ActivationMode::OpenImmediately;
        let id = e.add_item(item);
        e.start();
        assert_eq!(e.item(id).unwrap().state(), ItemState::Opened);
    }
}
