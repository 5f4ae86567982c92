//! Capturing keyframes from the host's current values.

use curtain_api_core::Value;

use crate::effects::EffectKind;
use crate::engine::Engine;
use crate::ids::ItemId;
use crate::item::ItemKey;
use crate::outputs::TargetHandle;

/// Host side of keyframe capture: reports the current value of an effect
/// on a target, or `None` when the target has no such property.
pub trait CaptureSource {
    fn capture(&self, target: &TargetHandle, effect: EffectKind) -> Option<Value>;
}

impl<F: Fn(&TargetHandle, EffectKind) -> Option<Value>> CaptureSource for F {
    fn capture(&self, target: &TargetHandle, effect: EffectKind) -> Option<Value> {
        self(target, effect)
    }
}

/// Effects polled by [`Engine::capture`], in order. `Transform` comes first
/// so that the individual parts override it when a host reports both.
const CAPTURED: [EffectKind; 12] = [
    EffectKind::Transform,
    EffectKind::Position,
    EffectKind::Rotation,
    EffectKind::Scale,
    EffectKind::Rect,
    EffectKind::Alpha,
    EffectKind::Color,
    EffectKind::ImageFill,
    EffectKind::Text,
    EffectKind::Number,
    EffectKind::Light,
    EffectKind::Range,
];

impl Engine {
    /// Copy the host's current values into keyframe slot `key` of `item`.
    ///
    /// A captured position also moves the matching end anchor of the
    /// item's path (the first anchor for closed, the last for opened, the
    /// shared one when looped). Returns how many values were stored.
    pub fn capture(&mut self, item: ItemId, key: ItemKey, source: &dyn CaptureSource) -> usize {
        let Some(it) = self.item_mut(item) else {
            log::warn!("capture: unknown item {item:?}");
            return 0;
        };
        let slot = key.index();
        let mut stored = 0;
        let mut position = None;
        for effect in CAPTURED {
            let Some(value) = source.capture(&it.target, effect) else {
                continue;
            };
            if !it.keys.store(slot, effect, &value) {
                log::warn!("capture: {effect:?} on '{}' returned a mismatched value", it.target);
                continue;
            }
            stored += 1;
            match (effect, &value) {
                (EffectKind::Position, Value::Vec3(p)) => position = Some(*p),
                (EffectKind::Transform, Value::Transform { pos, .. }) => position = Some(*pos),
                _ => {}
            }
        }
        if let (Some(pos), Some(path)) = (position, it.path.as_mut()) {
            if path.enabled && !path.is_empty() {
                let anchor = if path.looped() || key == ItemKey::Closed {
                    0
                } else {
                    path.len() - 1
                };
                let local = path.frame.to_local(pos);
                path.set_point(anchor, local, true);
                path.update_spaced_points();
            }
        }
        log::debug!("captured {stored} values into {item:?} {key:?}");
        stored
    }
}
