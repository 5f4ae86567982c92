//! Input contract consumed by items (keyboard button presses) and cores
//! (keyboard state selection).

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

/// Host key code. The engine only compares codes for equality.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyCode(pub u32);

/// Per-frame keyboard state provided by the host.
pub trait InputSource {
    /// Any key went down this frame.
    fn any_key_down(&self) -> bool;
    /// `key` went down this frame (edge, not level).
    fn key_down(&self, key: KeyCode) -> bool;
}

/// Headless input: nothing is ever pressed.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoInput;

impl InputSource for NoInput {
    fn any_key_down(&self) -> bool {
        false
    }

    fn key_down(&self, _key: KeyCode) -> bool {
        false
    }
}

/// Keys pressed during the current frame. Clear between frames.
#[derive(Clone, Debug, Default)]
pub struct PressedKeys {
    keys: HashSet<KeyCode>,
}

impl PressedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: KeyCode) {
        self.keys.insert(key);
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

impl FromIterator<KeyCode> for PressedKeys {
    fn from_iter<I: IntoIterator<Item = KeyCode>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl InputSource for PressedKeys {
    fn any_key_down(&self) -> bool {
        !self.keys.is_empty()
    }

    fn key_down(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressed_keys_report_edges() {
        let mut keys: PressedKeys = [KeyCode(32)].into_iter().collect();
        assert!(keys.any_key_down());
        assert!(keys.key_down(KeyCode(32)));
        assert!(!keys.key_down(KeyCode(13)));
        keys.clear();
        assert!(!keys.any_key_down());
        assert!(!NoInput.any_key_down());
    }
}
