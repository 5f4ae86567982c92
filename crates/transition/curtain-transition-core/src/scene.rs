//! Scene descriptions: a serializable hierarchy plus cores, built into an
//! engine in one validated step.
//!
//! Items are referred to by unique name; parents and state members name
//! items from the same description.

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::effects::EffectKeys;
use crate::engine::Engine;
use crate::error::TransitionError;
use crate::ids::{CoreId, ItemId};
use crate::inputs::KeyCode;
use crate::item::{ActivationMode, Item, ItemConfig};
use crate::path::Path;
use crate::selector::{Activator, Core, IncorrectStateAction, State};
use crate::tween::Tween;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDesc {
    pub items: Vec<ItemDesc>,
    pub cores: Vec<CoreDesc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemDesc {
    pub name: String,
    /// Host target; defaults to the item name.
    pub target: Option<String>,
    pub parent: Option<String>,
    pub enabled: bool,
    pub config: ItemConfig,
    pub keys: EffectKeys,
    pub tweens: Vec<Tween>,
    pub path: Option<Path>,
}

impl Default for ItemDesc {
    fn default() -> Self {
        Self {
            name: String::new(),
            target: None,
            parent: None,
            enabled: true,
            config: ItemConfig::default(),
            keys: EffectKeys::default(),
            tweens: Vec::new(),
            path: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreDesc {
    pub name: String,
    pub incorrect_action: IncorrectStateAction,
    pub use_input: bool,
    pub use_events: bool,
    pub states: Vec<StateDesc>,
}

impl Default for CoreDesc {
    fn default() -> Self {
        Self {
            name: String::new(),
            incorrect_action: IncorrectStateAction::OpenDefault,
            use_input: true,
            use_events: false,
            states: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateDesc {
    pub name: String,
    pub items: Vec<String>,
    pub default: bool,
    pub enabled: bool,
    pub override_modes: bool,
    pub mode_open_override: ActivationMode,
    pub mode_close_override: ActivationMode,
    pub keys: Vec<KeyCode>,
}

impl Default for StateDesc {
    fn default() -> Self {
        let state = State::default();
        Self {
            name: state.name,
            items: Vec::new(),
            default: false,
            enabled: state.enabled,
            override_modes: state.override_modes,
            mode_open_override: state.mode_open_override,
            mode_close_override: state.mode_close_override,
            keys: Vec::new(),
        }
    }
}

/// Name lookup for what [`Engine::build_scene`] created.
#[derive(Clone, Debug, Default)]
pub struct SceneHandles {
    pub items: HashMap<String, ItemId>,
    pub cores: HashMap<String, CoreId>,
}

impl SceneHandles {
    pub fn item(&self, name: &str) -> Option<ItemId> {
        self.items.get(name).copied()
    }

    pub fn core(&self, name: &str) -> Option<CoreId> {
        self.cores.get(name).copied()
    }
}

impl SceneDesc {
    pub fn from_json(json: &str) -> Result<Self, TransitionError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, TransitionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check names, references and the parent graph without touching an
    /// engine.
    pub fn validate(&self) -> Result<(), TransitionError> {
        let mut names = HashSet::new();
        for item in &self.items {
            if !names.insert(item.name.as_str()) {
                return Err(TransitionError::DuplicateName(item.name.clone()));
            }
        }
        let parents: HashMap<&str, &str> = self
            .items
            .iter()
            .filter_map(|i| i.parent.as_deref().map(|p| (i.name.as_str(), p)))
            .collect();
        for (&child, &parent) in &parents {
            if !names.contains(parent) {
                return Err(unknown(child, parent));
            }
        }
        for core in &self.cores {
            for state in &core.states {
                for name in &state.items {
                    if !names.contains(name.as_str()) {
                        return Err(unknown(&format!("{}/{}", core.name, state.name), name));
                    }
                }
            }
        }
        for item in &self.items {
            let mut seen = HashSet::new();
            let mut cursor = Some(item.name.as_str());
            while let Some(name) = cursor {
                if !seen.insert(name) {
                    return Err(TransitionError::ParentCycle(item.name.clone()));
                }
                cursor = parents.get(name).copied();
            }
        }
        Ok(())
    }
}

fn unknown(owner: &str, name: &str) -> TransitionError {
    TransitionError::UnknownName {
        owner: owner.to_string(),
        name: name.to_string(),
    }
}

impl Engine {
    /// Validate `scene` and add its items and cores. Nothing is added when
    /// validation fails.
    pub fn build_scene(&mut self, scene: &SceneDesc) -> Result<SceneHandles, TransitionError> {
        scene.validate()?;
        let mut handles = SceneHandles::default();
        for desc in &scene.items {
            let target = desc.target.clone().unwrap_or_else(|| desc.name.clone());
            let mut item = Item::new(target).with_config(desc.config.clone()).with_keys(desc.keys.clone());
            item.tweens = desc.tweens.clone();
            item.path = desc.path.clone();
            item.enabled = desc.enabled;
            let id = self.add_item(item);
            handles.items.insert(desc.name.clone(), id);
        }
        for desc in &scene.items {
            let (Some(parent), Some(&child)) = (desc.parent.as_deref(), handles.items.get(&desc.name)) else {
                continue;
            };
            if let Some(&parent) = handles.items.get(parent) {
                self.attach(child, parent)?;
            }
        }
        for desc in &scene.cores {
            let mut core = Core::new(desc.name.clone());
            core.incorrect_action = desc.incorrect_action;
            core.use_input = desc.use_input;
            core.use_events = desc.use_events;
            let mut default = None;
            for sd in &desc.states {
                let mut state = State::new(sd.name.clone());
                state.enabled = sd.enabled;
                state.override_modes = sd.override_modes;
                state.mode_open_override = sd.mode_open_override;
                state.mode_close_override = sd.mode_close_override;
                state.keys = sd.keys.clone();
                for name in &sd.items {
                    if let Some(&id) = handles.items.get(name) {
                        let modes = self.item(id).map(|i| i.config.activations);
                        let activator = Activator::new(id);
                        state.add_item(match modes {
                            Some(modes) => activator.with_modes(modes),
                            None => activator,
                        });
                    }
                }
                if sd.default && default.is_none() {
                    default = Some(sd.name.clone());
                }
                core.add_state(state);
            }
            core.set_default_state(default.as_deref());
            let id = self.add_core(core);
            handles.cores.insert(desc.name.clone(), id);
        }
        log::debug!(
            "built scene: {} items, {} cores",
            handles.items.len(),
            handles.cores.len()
        );
        Ok(handles)
    }
}
