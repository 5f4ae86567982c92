//! Profiles: versioned snapshots of an item's configuration.
//!
//! A profile carries everything an item is tuned with (config, keyframes,
//! tweens, path) but none of its runtime state or links, so one profile
//! can be stamped onto many items.

use serde::{Deserialize, Serialize};

use crate::effects::EffectKeys;
use crate::engine::Engine;
use crate::error::TransitionError;
use crate::ids::ItemId;
use crate::item::{ActivationMode, Item, ItemConfig, ItemKey};
use crate::path::Path;
use crate::tween::Tween;

/// Version written into new profiles.
pub const PROFILE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub version: String,
    pub config: ItemConfig,
    pub keys: EffectKeys,
    pub tweens: Vec<Tween>,
    pub path: Option<Path>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            version: PROFILE_VERSION.to_string(),
            config: ItemConfig::default(),
            keys: EffectKeys::default(),
            tweens: Vec::new(),
            path: None,
        }
    }
}

impl Profile {
    /// Snapshot the tunables of `item`.
    pub fn capture(item: &Item) -> Self {
        Self {
            version: PROFILE_VERSION.to_string(),
            config: item.config.clone(),
            keys: item.keys.clone(),
            tweens: item.tweens.clone(),
            path: item.path.clone(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, TransitionError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, TransitionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Profiles are compatible when major and minor match. A missing
    /// version is read as the current one.
    pub fn check_version(&self) -> Result<(), TransitionError> {
        if self.version.is_empty() || major_minor(&self.version) == major_minor(PROFILE_VERSION) {
            return Ok(());
        }
        Err(TransitionError::ProfileVersion {
            found: self.version.clone(),
            expected: PROFILE_VERSION.to_string(),
        })
    }
}

fn major_minor(version: &str) -> (&str, &str) {
    let mut parts = version.split('.');
    (parts.next().unwrap_or(""), parts.next().unwrap_or(""))
}

impl Engine {
    /// Replace the tunables of `item` with `profile` and close its branch
    /// immediately so the new keyframes take effect.
    pub fn apply_profile(&mut self, item: ItemId, profile: &Profile) -> Result<(), TransitionError> {
        profile.check_version()?;
        let sampling = self.config.dynamic_path_sampling;
        let it = self.item_mut(item).ok_or(TransitionError::UnknownItem(item))?;
        it.config = profile.config.clone();
        it.keys = profile.keys.clone();
        it.tweens = profile.tweens.clone();
        it.path = profile.path.clone();
        if let Some(path) = it.path.as_mut() {
            path.set_sampling(sampling);
            path.update_spaced_points();
        }
        it.current_loops = 0;
        it.loop_activated = false;
        let parent = it.parent;
        if let Some(parent) = parent {
            self.recount_children(parent);
            self.update_chain_delays(parent, ItemKey::Closed);
            self.update_chain_delays(parent, ItemKey::Opened);
        }
        self.recount_children(item);
        self.update_chain_delays(item, ItemKey::Closed);
        self.update_chain_delays(item, ItemKey::Opened);
        self.activate(item, ActivationMode::CloseBranchImmediately);
        Ok(())
    }
}
