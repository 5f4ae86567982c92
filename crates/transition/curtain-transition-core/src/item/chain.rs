//! Chain delays: staggering a parent's children by sibling order.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::ids::ItemId;
use crate::item::ItemKey;

/// Order in which a chained parent's children start.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainDirection {
    #[default]
    First2Last,
    Last2First,
    Middle2End,
    End2Middle,
    Sync,
    Random,
}

/// Delay of the child at 1-based `index` among `count` siblings.
///
/// `delay` is the step between consecutive children and
/// `first_child_delay` the delay of the first one to start.
pub fn chain_delay<R: Rng + ?Sized>(
    direction: ChainDirection,
    index: usize,
    count: usize,
    delay: f32,
    first_child_delay: f32,
    rng: &mut R,
) -> f32 {
    let offset = delay - first_child_delay;
    let i = index as f32;
    let n = count as f32;
    let middle = (n + 1.0) * 0.5;
    let steps = match direction {
        ChainDirection::First2Last => i,
        ChainDirection::Last2First => n - i + 1.0,
        ChainDirection::Middle2End => ((count % 2) as f32 + (middle - i).abs()).ceil(),
        ChainDirection::End2Middle => middle - (middle - i).abs(),
        ChainDirection::Sync => 1.0,
        ChainDirection::Random => {
            let upper = count.saturating_sub(1);
            if upper > 1 {
                rng.random_range(1..upper) as f32
            } else {
                1.0
            }
        }
    };
    steps * delay - offset
}

impl Engine {
    /// Recompute the delays of `parent`'s children for direction `key` when
    /// the parent runs in chain mode.
    pub fn update_chain_delays(&mut self, parent: ItemId, key: ItemKey) {
        let Some(p) = self.item(parent) else {
            return;
        };
        if !p.config.child_chain_mode {
            return;
        }
        let k = key.index();
        let (direction, delay, first) = (
            p.config.chain_directions[k],
            p.config.chain_delays[k],
            p.config.first_child_delay[k],
        );
        let children = self.active_children(parent);
        let count = children.len();
        for child in children {
            let index = match self.item(child) {
                Some(c) => c.sibling_index,
                None => continue,
            };
            let value = chain_delay(direction, index, count, delay, first, &mut self.rng);
            if let Some(c) = self.item_mut(child) {
                c.config.delays[k] = value;
            }
        }
    }
}
