//! Effect kinds and the mapping from an eased value to a host [`Value`].
//!
//! Every item stores a pair of keyframes per effect ([`EffectKeys`], index 0
//! is the closed pose, index 1 the opened pose). A tween produces an eased
//! scalar; [`evaluate_effect`] turns that scalar into the value the host
//! should write for the tween's effect.

use serde::{Deserialize, Serialize};

use curtain_api_core::{lerp_value, lerp_value_clamped, Value};

use crate::curve::CustomCurve;
use crate::math::{self, Quat, Vec3};
use crate::path::Path;

/// Upper bound for light intensity and range style effects.
pub const RANGE_LIMIT: f32 = 1000.0;

/// Which bound property a tween drives.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Position, rotation and scale together.
    Transform,
    Position,
    Rotation,
    Scale,
    /// Alpha lerped between the alpha keyframes.
    #[default]
    Alpha,
    /// The eased value itself used as alpha.
    DirectAlpha,
    Color,
    ImageFill,
    Text,
    Number,
    /// Rect offsets, anchors and anchored position.
    Rect,
    Volume,
    /// Light, sound and sphere ranges.
    Range,
    Light,
    Gradient,
    /// Rect size delta.
    RectDelta,
    /// Writes the eased value into the item's evaluation slot.
    Time,
    /// Typed material property carried by the tween.
    Property,
}

/// How rotation keyframes are interpolated.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationMode {
    #[default]
    Quaternion,
    Euler,
    /// Orient along the item's path.
    Path,
}

/// Closed/opened keyframe pairs for every built-in effect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectKeys {
    pub positions: [Vec3; 2],
    pub rotations: [Quat; 2],
    /// Euler angles in degrees.
    pub euler_rotations: [Vec3; 2],
    pub scales: [Vec3; 2],
    pub colors: [[f32; 4]; 2],
    pub alphas: [f32; 2],
    pub image_fills: [f32; 2],
    pub numbers: [f32; 2],
    pub texts: [String; 2],
    /// Offset min (xy) and offset max (zw).
    pub rects: [[f32; 4]; 2],
    /// Anchor min (xy) and anchor max (zw).
    pub anchors: [[f32; 4]; 2],
    pub anchor_positions: [[f32; 2]; 2],
    pub intensities: [f32; 2],
    pub light_range: [f32; 2],
    pub sound_range: [f32; 2],
    pub sphere_range: [f32; 2],
}

impl Default for EffectKeys {
    fn default() -> Self {
        Self {
            positions: [math::ZERO; 2],
            rotations: [math::IDENTITY; 2],
            euler_rotations: [math::ZERO; 2],
            scales: [[1.0; 3]; 2],
            colors: [[1.0; 4]; 2],
            alphas: [0.0, 1.0],
            image_fills: [0.0, 1.0],
            numbers: [0.0, 100.0],
            texts: [String::new(), String::new()],
            rects: [[0.0; 4]; 2],
            anchors: [[0.0; 4]; 2],
            anchor_positions: [[0.0; 2]; 2],
            intensities: [0.0, 1.0],
            light_range: [0.0, 1.0],
            sound_range: [0.0, 1.0],
            sphere_range: [0.0, 1.0],
        }
    }
}

impl EffectKeys {
    /// Store a captured host value into keyframe slot `slot` (0 closed,
    /// 1 opened). Returns false when the value does not fit the effect.
    pub fn store(&mut self, slot: usize, effect: EffectKind, value: &Value) -> bool {
        if slot > 1 {
            return false;
        }
        match (effect, value) {
            (EffectKind::Transform, Value::Transform { pos, rot, scale }) => {
                self.positions[slot] = *pos;
                self.rotations[slot] = *rot;
                self.scales[slot] = *scale;
            }
            (EffectKind::Position, Value::Vec3(v)) => self.positions[slot] = *v,
            (EffectKind::Rotation, Value::Quat(q)) => self.rotations[slot] = *q,
            (EffectKind::Rotation, Value::Vec3(e)) => self.euler_rotations[slot] = *e,
            (EffectKind::Scale, Value::Vec3(v)) => self.scales[slot] = *v,
            (EffectKind::Alpha | EffectKind::DirectAlpha, Value::Float(a)) => self.alphas[slot] = *a,
            (EffectKind::Color, Value::ColorRgba(c)) => self.colors[slot] = *c,
            (EffectKind::ImageFill, Value::Float(f)) => self.image_fills[slot] = *f,
            (EffectKind::Text, Value::Text(s)) => self.texts[slot] = s.clone(),
            (EffectKind::Number, Value::Float(n)) => self.numbers[slot] = *n,
            (EffectKind::Rect | EffectKind::RectDelta, Value::Vector(v)) if v.len() >= 10 => {
                self.rects[slot] = [v[0], v[1], v[2], v[3]];
                self.anchors[slot] = [v[4], v[5], v[6], v[7]];
                self.anchor_positions[slot] = [v[8], v[9]];
            }
            (EffectKind::Range, Value::Vec3(r)) => {
                self.light_range[slot] = r[0];
                self.sound_range[slot] = r[1];
                self.sphere_range[slot] = r[2];
            }
            (EffectKind::Light, Value::Vector(v)) if v.len() >= 6 => {
                self.intensities[slot] = v[0];
                self.light_range[slot] = v[1];
                self.colors[slot] = [v[2], v[3], v[4], v[5]];
            }
            _ => return false,
        }
        true
    }
}

/// Value kinds a material property can carry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "keys")]
pub enum PropertyKeys {
    Float([f32; 2]),
    Integer([i32; 2]),
    Color([[f32; 4]; 2]),
    Vec2([[f32; 2]; 2]),
    Vec3([Vec3; 2]),
    Vec4([[f32; 4]; 2]),
    Curve(CustomCurve),
}

/// Named material property driven by a `Property` tween.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialProperty {
    pub name: String,
    pub keys: PropertyKeys,
}

impl MaterialProperty {
    pub fn new(name: impl Into<String>, keys: PropertyKeys) -> Self {
        Self {
            name: name.into(),
            keys,
        }
    }

    pub fn evaluate(&self, t: f32) -> Value {
        match &self.keys {
            PropertyKeys::Float([a, b]) => Value::Float(lerp(*a, *b, t)),
            PropertyKeys::Integer([a, b]) => Value::Float(lerp(*a as f32, *b as f32, t).round()),
            PropertyKeys::Color([a, b]) => lerp_value(&Value::ColorRgba(*a), &Value::ColorRgba(*b), t),
            PropertyKeys::Vec2([a, b]) => lerp_value(&Value::Vec2(*a), &Value::Vec2(*b), t),
            PropertyKeys::Vec3([a, b]) => lerp_value(&Value::Vec3(*a), &Value::Vec3(*b), t),
            PropertyKeys::Vec4([a, b]) => lerp_value(&Value::Vec4(*a), &Value::Vec4(*b), t),
            PropertyKeys::Curve(curve) => Value::Float(curve.evaluate(t)),
        }
    }
}

/// Item data an effect reads besides the eased value.
#[derive(Copy, Clone, Debug)]
pub struct EffectContext<'a> {
    pub keys: &'a EffectKeys,
    pub path: Option<&'a Path>,
    pub rotation_mode: RotationMode,
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
fn lerp2(a: [f32; 2], b: [f32; 2], t: f32) -> [f32; 2] {
    [lerp(a[0], b[0], t), lerp(a[1], b[1], t)]
}

fn active_path<'a>(ctx: &EffectContext<'a>) -> Option<&'a Path> {
    ctx.path.filter(|p| p.enabled)
}

fn position(ctx: &EffectContext, t: f32) -> Vec3 {
    match active_path(ctx) {
        Some(path) => path.evaluate_position(t),
        None => math::lerp(ctx.keys.positions[0], ctx.keys.positions[1], t),
    }
}

fn rotation_quat(ctx: &EffectContext, t: f32) -> Quat {
    let keys = ctx.keys;
    match ctx.rotation_mode {
        RotationMode::Path => match active_path(ctx) {
            Some(path) => path.evaluate_rotation(t),
            None => keys.rotations[0],
        },
        RotationMode::Quaternion => curtain_api_core::nlerp_quat(keys.rotations[0], keys.rotations[1], t),
        RotationMode::Euler => math::quat_from_euler_degrees(math::lerp(
            keys.euler_rotations[0],
            keys.euler_rotations[1],
            t,
        )),
    }
}

fn scale(keys: &EffectKeys, t: f32) -> Vec3 {
    math::lerp(keys.scales[0], keys.scales[1], t)
}

fn range(pair: [f32; 2], t: f32) -> f32 {
    lerp(pair[0], pair[1], t).clamp(0.0, RANGE_LIMIT)
}

/// Host value for `effect` at eased value `t`. `Property` tweens without a
/// property yield `None`.
pub fn evaluate_effect(
    ctx: &EffectContext,
    effect: EffectKind,
    property: Option<&MaterialProperty>,
    t: f32,
) -> Option<Value> {
    let keys = ctx.keys;
    let value = match effect {
        EffectKind::Transform => Value::Transform {
            pos: position(ctx, t),
            rot: rotation_quat(ctx, t),
            scale: scale(keys, t),
        },
        EffectKind::Position => Value::Vec3(position(ctx, t)),
        EffectKind::Rotation => match ctx.rotation_mode {
            RotationMode::Euler => lerp_value(
                &Value::Vec3(keys.euler_rotations[0]),
                &Value::Vec3(keys.euler_rotations[1]),
                t,
            ),
            _ => Value::Quat(rotation_quat(ctx, t)),
        },
        EffectKind::Scale => Value::Vec3(scale(keys, t)),
        EffectKind::Alpha => lerp_value_clamped(&Value::Float(keys.alphas[0]), &Value::Float(keys.alphas[1]), t),
        EffectKind::DirectAlpha => Value::Float(t),
        EffectKind::Color => lerp_value(&Value::ColorRgba(keys.colors[0]), &Value::ColorRgba(keys.colors[1]), t),
        EffectKind::ImageFill => lerp_value_clamped(
            &Value::Float(keys.image_fills[0]),
            &Value::Float(keys.image_fills[1]),
            t,
        ),
        EffectKind::Text => Value::Text(text_lerp(&keys.texts[0], &keys.texts[1], t)),
        EffectKind::Number => Value::Float(lerp(keys.numbers[0], keys.numbers[1], t)),
        EffectKind::Rect => {
            let (a, b) = (keys.rects[0], keys.rects[1]);
            let (c, d) = (keys.anchors[0], keys.anchors[1]);
            let offset_min = lerp2([a[0], a[1]], [b[0], b[1]], t);
            let offset_max = lerp2([a[2], a[3]], [b[2], b[3]], t);
            let anchor_min = lerp2([c[0], c[1]], [d[0], d[1]], t);
            let anchor_max = lerp2([c[2], c[3]], [d[2], d[3]], t);
            let anchored = lerp2(keys.anchor_positions[0], keys.anchor_positions[1], t);
            Value::Vector(vec![
                offset_min[0],
                offset_min[1],
                offset_max[0],
                offset_max[1],
                anchor_min[0],
                anchor_min[1],
                anchor_max[0],
                anchor_max[1],
                anchored[0],
                anchored[1],
            ])
        }
        EffectKind::RectDelta => {
            let (a, b) = (keys.rects[0], keys.rects[1]);
            let max = lerp2([a[2], a[3]], [b[2], b[3]], t);
            let min = lerp2([a[0], a[1]], [b[0], b[1]], t);
            Value::Vec2([max[0] - min[0], max[1] - min[1]])
        }
        EffectKind::Volume => Value::Float(t.clamp(0.0, 1.0)),
        EffectKind::Range => Value::Vec3([
            range(keys.light_range, t),
            range(keys.sound_range, t),
            range(keys.sphere_range, t),
        ]),
        EffectKind::Light => {
            let color = lerp_value(&Value::ColorRgba(keys.colors[0]), &Value::ColorRgba(keys.colors[1]), t);
            let rgba = match color {
                Value::ColorRgba(c) => c,
                _ => keys.colors[1],
            };
            Value::Vector(vec![
                range(keys.intensities, t),
                range(keys.light_range, t),
                rgba[0],
                rgba[1],
                rgba[2],
                rgba[3],
            ])
        }
        EffectKind::Gradient | EffectKind::Time => Value::Float(t),
        EffectKind::Property => return property.map(|p| p.evaluate(t)),
    };
    Some(value)
}

/// Progressive text reveal from `a` to `b`, line by line. Each line takes
/// an equal share of `t` and reveals `b` over `a` from the left.
pub fn text_lerp(a: &str, b: &str, t: f32) -> String {
    if a == b || t == 0.0 {
        return a.to_string();
    }
    if t == 1.0 {
        return b.to_string();
    }

    let a_lines: Vec<&str> = a.split('\n').collect();
    let b_lines: Vec<&str> = b.split('\n').collect();
    let count = a_lines.len().max(b_lines.len());
    let line_duration = 1.0 / count as f32;

    let mut lines = Vec::with_capacity(count);
    for i in 0..count {
        let line_time = 1.0 - ((line_duration * (i + 1) as f32 - t) / line_duration).clamp(0.0, 1.0);
        let from = a_lines.get(i).copied().unwrap_or("");
        let to = b_lines.get(i).copied().unwrap_or("");
        lines.push(blend_line(from, to, line_time));
    }
    lines.join("\n").trim_end_matches('\n').to_string()
}

fn blend_line(a: &str, b: &str, t: f32) -> String {
    if a == b || t == 0.0 {
        return a.to_string();
    }
    if t == 1.0 {
        return b.to_string();
    }
    let mut a: Vec<char> = a.chars().collect();
    let mut b: Vec<char> = b.chars().collect();
    let max = a.len().max(b.len());
    a.resize(max, ' ');
    b.resize(max, ' ');

    let revealed = ((max as f32 * t).ceil() as usize).min(max);
    let mut out: String = b[..revealed].iter().collect();
    out.extend(&a[revealed..]);
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathLerpMode;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    fn ctx(keys: &EffectKeys) -> EffectContext<'_> {
        EffectContext {
            keys,
            path: None,
            rotation_mode: RotationMode::Quaternion,
        }
    }

    #[test]
    fn alpha_is_clamped_position_is_not() {
        let mut keys = EffectKeys::default();
        keys.positions = [[0.0; 3], [10.0, 0.0, 0.0]];
        let c = ctx(&keys);
        assert_eq!(evaluate_effect(&c, EffectKind::Alpha, None, 1.4), Some(Value::Float(1.0)));
        match evaluate_effect(&c, EffectKind::Position, None, 1.5) {
            Some(Value::Vec3(p)) => approx(p[0], 15.0, 1e-5),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn ranges_clamp_to_limit() {
        let mut keys = EffectKeys::default();
        keys.light_range = [0.0, 2000.0];
        keys.sound_range = [10.0, -10.0];
        match evaluate_effect(&ctx(&keys), EffectKind::Range, None, 1.0) {
            Some(Value::Vec3(r)) => {
                approx(r[0], RANGE_LIMIT, 1e-3);
                approx(r[1], 0.0, 1e-6);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rect_delta_is_size_of_offsets() {
        let mut keys = EffectKeys::default();
        keys.rects = [[0.0, 0.0, 10.0, 20.0], [0.0, 0.0, 30.0, 40.0]];
        assert_eq!(
            evaluate_effect(&ctx(&keys), EffectKind::RectDelta, None, 0.5),
            Some(Value::Vec2([20.0, 30.0]))
        );
    }

    #[test]
    fn property_without_binding_is_skipped() {
        let keys = EffectKeys::default();
        assert_eq!(evaluate_effect(&ctx(&keys), EffectKind::Property, None, 0.5), None);
        let prop = MaterialProperty::new("_Glow", PropertyKeys::Integer([0, 10]));
        assert_eq!(
            evaluate_effect(&ctx(&keys), EffectKind::Property, Some(&prop), 0.46),
            Some(Value::Float(5.0))
        );
    }

    #[test]
    fn path_drives_position_when_enabled() {
        let mut keys = EffectKeys::default();
        keys.positions = [[5.0; 3], [5.0; 3]];
        let mut path = Path::between([0.0; 3], [10.0, 0.0, 0.0]);
        path.set_lerp_mode(PathLerpMode::Dynamic);
        let c = EffectContext {
            keys: &keys,
            path: Some(&path),
            rotation_mode: RotationMode::Path,
        };
        match evaluate_effect(&c, EffectKind::Position, None, 1.0) {
            Some(Value::Vec3(p)) => approx(p[0], 10.0, 1e-3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn capture_store_rejects_mismatched_values() {
        let mut keys = EffectKeys::default();
        assert!(keys.store(1, EffectKind::Scale, &Value::vec3(2.0, 2.0, 2.0)));
        assert_eq!(keys.scales[1], [2.0; 3]);
        assert!(!keys.store(1, EffectKind::Scale, &Value::f(2.0)));
        assert!(!keys.store(2, EffectKind::Alpha, &Value::f(0.5)));
    }

    #[test]
    fn text_reveals_from_left() {
        assert_eq!(text_lerp("abcd", "wxyz", 0.0), "abcd");
        assert_eq!(text_lerp("abcd", "wxyz", 0.5), "wxcd");
        assert_eq!(text_lerp("abcd", "wxyz", 1.0), "wxyz");
        assert_eq!(text_lerp("", "hello", 0.3), "he");
    }

    #[test]
    fn text_lines_reveal_in_sequence() {
        let out = text_lerp("aa\nbb", "cc\ndd", 0.5);
        assert_eq!(out, "cc\nbb");
    }
}
