//! Errors surfaced by configuration entry points.
//!
//! Runtime calls (activation, ticking, state selection) never fail; they
//! clamp or ignore and log instead.

use crate::ids::{CoreId, ItemId};

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum TransitionError {
    #[error("unknown item {0:?}")]
    UnknownItem(ItemId),

    #[error("unknown core {0:?}")]
    UnknownCore(CoreId),

    #[error("core {core:?} has no state '{name}'")]
    UnknownState { core: CoreId, name: String },

    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    HierarchyCycle { child: ItemId, parent: ItemId },

    #[error("path needs 3k+1 points (or 3k when looped, k >= 1), got {count}")]
    InvalidPathPoints { count: usize, looped: bool },

    #[error("profile version {found} is not compatible with {expected}")]
    ProfileVersion { found: String, expected: String },

    #[error("duplicate item name '{0}' in scene")]
    DuplicateName(String),

    #[error("parent chain of '{0}' loops back on itself")]
    ParentCycle(String),

    #[error("'{owner}' refers to unknown item '{name}'")]
    UnknownName { owner: String, name: String },

    #[error("loop re-entrancy limit {limit} exceeded on {item:?}")]
    LoopReentrancy { item: ItemId, limit: u32 },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
