//! Interpolation between two keyframe [`Value`]s.
//! - f32 lerp for floats, vectors and colors (unclamped by default)
//! - normalized quaternion lerp along the shortest arc
//! - transform TRS blending (pos/scale lerp, rot nlerp)
//! - elementwise blending for generic Vector
//! - step blending for Text and mismatched kinds (left while t < 0.5)

use crate::Value;

#[inline]
fn lerp_f(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn lerp_array<const N: usize>(a: &[f32; N], b: &[f32; N], t: f32) -> [f32; N] {
    let mut out = [0.0f32; N];
    for i in 0..N {
        out[i] = lerp_f(a[i], b[i], t);
    }
    out
}

fn normalize_quat(q: [f32; 4]) -> [f32; 4] {
    let mag = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
    if mag == 0.0 {
        [0.0, 0.0, 0.0, 1.0]
    } else {
        [q[0] / mag, q[1] / mag, q[2] / mag, q[3] / mag]
    }
}

/// Normalized lerp between two quaternions, taking the shorter arc.
/// `t` is not clamped.
#[inline]
pub fn nlerp_quat(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    let dot = a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3];
    let b = if dot < 0.0 {
        [-b[0], -b[1], -b[2], -b[3]]
    } else {
        b
    };
    normalize_quat(lerp_array(&a, &b, t))
}

fn blend_vector(a: &[f32], b: &[f32], t: f32) -> Vec<f32> {
    let n = a.len().max(b.len());
    (0..n)
        .map(|i| {
            let ai = a.get(i).copied().unwrap_or(0.0);
            let bi = b.get(i).copied().unwrap_or(0.0);
            lerp_f(ai, bi, t)
        })
        .collect()
}

/// Interpolate two values without clamping `t`, so overshooting curves
/// (back, elastic) extrapolate past the keyframes.
pub fn lerp_value(a: &Value, b: &Value, t: f32) -> Value {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => Value::Float(lerp_f(*x, *y, t)),
        (Value::Vec2(x), Value::Vec2(y)) => Value::Vec2(lerp_array(x, y, t)),
        (Value::Vec3(x), Value::Vec3(y)) => Value::Vec3(lerp_array(x, y, t)),
        (Value::Vec4(x), Value::Vec4(y)) => Value::Vec4(lerp_array(x, y, t)),
        (Value::ColorRgba(x), Value::ColorRgba(y)) => Value::ColorRgba(lerp_array(x, y, t)),
        (Value::Quat(x), Value::Quat(y)) => Value::Quat(nlerp_quat(*x, *y, t)),
        (
            Value::Transform {
                pos: ap,
                rot: ar,
                scale: ascale,
            },
            Value::Transform {
                pos: bp,
                rot: br,
                scale: bscale,
            },
        ) => Value::Transform {
            pos: lerp_array(ap, bp, t),
            rot: nlerp_quat(*ar, *br, t),
            scale: lerp_array(ascale, bscale, t),
        },
        (Value::Vector(x), Value::Vector(y)) => Value::Vector(blend_vector(x, y, t)),
        // Text and mismatched kinds step.
        _ => {
            if t < 0.5 {
                a.clone()
            } else {
                b.clone()
            }
        }
    }
}

/// Same as [`lerp_value`] with `t` clamped to [0, 1].
#[inline]
pub fn lerp_value_clamped(a: &Value, b: &Value, t: f32) -> Value {
    lerp_value(a, b, t.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    #[test]
    fn float_lerp_extrapolates_unless_clamped() {
        let a = Value::Float(0.0);
        let b = Value::Float(10.0);
        assert_eq!(lerp_value(&a, &b, 1.5), Value::Float(15.0));
        assert_eq!(lerp_value_clamped(&a, &b, 1.5), Value::Float(10.0));
    }

    #[test]
    fn quat_nlerp_takes_short_arc_and_stays_unit() {
        let a = [0.0, 0.0, 0.0, 1.0];
        let b = [0.0, 0.0, 0.0, -1.0];
        let q = nlerp_quat(a, b, 0.5);
        let len = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
        approx(len, 1.0, 1e-6);
        approx(q[3].abs(), 1.0, 1e-6);
    }

    #[test]
    fn mismatched_kinds_step_at_half() {
        let a = Value::Float(1.0);
        let b = Value::Text("x".into());
        assert_eq!(lerp_value(&a, &b, 0.49), a);
        assert_eq!(lerp_value(&a, &b, 0.5), b);
    }

    #[test]
    fn vectors_of_different_length_pad_with_zero() {
        let a = Value::Vector(vec![2.0]);
        let b = Value::Vector(vec![4.0, 2.0]);
        assert_eq!(lerp_value(&a, &b, 0.5), Value::Vector(vec![3.0, 1.0]));
    }
}
