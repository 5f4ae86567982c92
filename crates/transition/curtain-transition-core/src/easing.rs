//! Easing library: Penner-style curves over (t, b, c, d).
//!
//! `t` is elapsed time, `b` the start value, `c` the change and `d` the
//! duration. Every function is pure; identical inputs give bit-identical
//! outputs. `OutIn` variants are composed from the `Out` and `In` halves of
//! their family rather than written out separately.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Named curve kinds. `Custom` is a sentinel: the caller evaluates its own
/// curve instead (see [`crate::curve::CustomCurve`]).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ease {
    Linear,
    NoneZero,
    NoneOne,
    Custom,
    InQuad,
    OutQuad,
    #[default]
    InOutQuad,
    OutInQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    OutInCubic,
    InQuart,
    OutQuart,
    InOutQuart,
    OutInQuart,
    InQuint,
    OutQuint,
    InOutQuint,
    OutInQuint,
    InSine,
    OutSine,
    InOutSine,
    OutInSine,
    InExpo,
    OutExpo,
    InOutExpo,
    OutInExpo,
    InCirc,
    OutCirc,
    InOutCirc,
    OutInCirc,
    InElastic,
    OutElastic,
    InOutElastic,
    OutInElastic,
    InBack,
    OutBack,
    InOutBack,
    OutInBack,
    InBounce,
    OutBounce,
    InOutBounce,
    OutInBounce,
}

/// Curve family shared by the four directional variants.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Family {
    Quad,
    Cubic,
    Quart,
    Quint,
    Sine,
    Expo,
    Circ,
    Elastic,
    Back,
    Bounce,
}

/// Which part of the family curve a variant uses.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    In,
    Out,
    InOut,
    OutIn,
}

pub const FAMILIES: [Family; 10] = [
    Family::Quad,
    Family::Cubic,
    Family::Quart,
    Family::Quint,
    Family::Sine,
    Family::Expo,
    Family::Circ,
    Family::Elastic,
    Family::Back,
    Family::Bounce,
];

type EaseFn = fn(f32, f32, f32, f32) -> f32;

impl Ease {
    /// Every kind in declaration order.
    pub const ALL: [Ease; 44] = [
        Ease::Linear,
        Ease::NoneZero,
        Ease::NoneOne,
        Ease::Custom,
        Ease::InQuad,
        Ease::OutQuad,
        Ease::InOutQuad,
        Ease::OutInQuad,
        Ease::InCubic,
        Ease::OutCubic,
        Ease::InOutCubic,
        Ease::OutInCubic,
        Ease::InQuart,
        Ease::OutQuart,
        Ease::InOutQuart,
        Ease::OutInQuart,
        Ease::InQuint,
        Ease::OutQuint,
        Ease::InOutQuint,
        Ease::OutInQuint,
        Ease::InSine,
        Ease::OutSine,
        Ease::InOutSine,
        Ease::OutInSine,
        Ease::InExpo,
        Ease::OutExpo,
        Ease::InOutExpo,
        Ease::OutInExpo,
        Ease::InCirc,
        Ease::OutCirc,
        Ease::InOutCirc,
        Ease::OutInCirc,
        Ease::InElastic,
        Ease::OutElastic,
        Ease::InOutElastic,
        Ease::OutInElastic,
        Ease::InBack,
        Ease::OutBack,
        Ease::InOutBack,
        Ease::OutInBack,
        Ease::InBounce,
        Ease::OutBounce,
        Ease::InOutBounce,
        Ease::OutInBounce,
    ];

    /// Split a family variant into (family, shape). `None` for Linear,
    /// the two constants and Custom.
    pub fn parts(self) -> Option<(Family, Shape)> {
        let idx = Ease::ALL.iter().position(|e| *e == self)?;
        if idx < 4 {
            return None;
        }
        let rel = idx - 4;
        let shape = match rel % 4 {
            0 => Shape::In,
            1 => Shape::Out,
            2 => Shape::InOut,
            _ => Shape::OutIn,
        };
        Some((FAMILIES[rel / 4], shape))
    }

    /// Inverse of [`Ease::parts`].
    pub fn compose(family: Family, shape: Shape) -> Ease {
        let f = FAMILIES.iter().position(|x| *x == family).unwrap_or(0);
        let s = match shape {
            Shape::In => 0,
            Shape::Out => 1,
            Shape::InOut => 2,
            Shape::OutIn => 3,
        };
        Ease::ALL[4 + f * 4 + s]
    }
}

/// Evaluate `kind` at `time` over `duration`, mapping to [0, 1]
/// (overshooting kinds leave that range mid-curve). `Custom` yields 0.
/// A non-positive duration jumps straight to the end value once `time`
/// reaches zero.
pub fn evaluate(time: f32, duration: f32, kind: Ease) -> f32 {
    if duration <= 0.0 {
        let t = if time >= 0.0 { 1.0 } else { 0.0 };
        return ease(kind, t, 0.0, 1.0, 1.0);
    }
    ease(kind, time, 0.0, 1.0, duration)
}

/// Evaluate `kind` with explicit start value `b` and change `c`.
pub fn ease(kind: Ease, t: f32, b: f32, c: f32, d: f32) -> f32 {
    match kind {
        Ease::Linear => linear(t, b, c, d),
        Ease::NoneZero => b,
        Ease::NoneOne => b + c,
        Ease::Custom => 0.0,
        other => match other.parts() {
            Some((family, shape)) => ease_family(family, shape, t, b, c, d),
            None => b,
        },
    }
}

/// Evaluate one shape of a family.
pub fn ease_family(family: Family, shape: Shape, t: f32, b: f32, c: f32, d: f32) -> f32 {
    let (fin, fout, finout) = family_fns(family);
    match shape {
        Shape::In => fin(t, b, c, d),
        Shape::Out => fout(t, b, c, d),
        Shape::InOut => finout(t, b, c, d),
        Shape::OutIn => out_in(fout, fin, t, b, c, d),
    }
}

fn family_fns(family: Family) -> (EaseFn, EaseFn, EaseFn) {
    match family {
        Family::Quad => (in_quad, out_quad, in_out_quad),
        Family::Cubic => (in_cubic, out_cubic, in_out_cubic),
        Family::Quart => (in_quart, out_quart, in_out_quart),
        Family::Quint => (in_quint, out_quint, in_out_quint),
        Family::Sine => (in_sine, out_sine, in_out_sine),
        Family::Expo => (in_expo, out_expo, in_out_expo),
        Family::Circ => (in_circ, out_circ, in_out_circ),
        Family::Elastic => (in_elastic, out_elastic, in_out_elastic),
        Family::Back => (in_back, out_back, in_out_back),
        Family::Bounce => (in_bounce, out_bounce, in_out_bounce),
    }
}

/// First half runs `out` at half amplitude, second half runs `inn` offset
/// by half amplitude.
#[inline]
fn out_in(out: EaseFn, inn: EaseFn, t: f32, b: f32, c: f32, d: f32) -> f32 {
    if t < d / 2.0 {
        out(t * 2.0, b, c / 2.0, d)
    } else {
        inn(t * 2.0 - d, b + c / 2.0, c / 2.0, d)
    }
}

#[inline]
pub fn linear(t: f32, b: f32, c: f32, d: f32) -> f32 {
    c * t / d + b
}

pub fn in_quad(t: f32, b: f32, c: f32, d: f32) -> f32 {
    let t = t / d;
    c * t * t + b
}

pub fn out_quad(t: f32, b: f32, c: f32, d: f32) -> f32 {
    let t = t / d;
    -c * t * (t - 2.0) + b
}

pub fn in_out_quad(t: f32, b: f32, c: f32, d: f32) -> f32 {
    let t = t / (d / 2.0);
    if t < 1.0 {
        return c / 2.0 * t * t + b;
    }
    let t = t - 1.0;
    -c / 2.0 * (t * (t - 2.0) - 1.0) + b
}

pub fn in_cubic(t: f32, b: f32, c: f32, d: f32) -> f32 {
    let t = t / d;
    c * t * t * t + b
}

pub fn out_cubic(t: f32, b: f32, c: f32, d: f32) -> f32 {
    let t = t / d - 1.0;
    c * (t * t * t + 1.0) + b
}

pub fn in_out_cubic(t: f32, b: f32, c: f32, d: f32) -> f32 {
    let t = t / (d / 2.0);
    if t < 1.0 {
        return c / 2.0 * t * t * t + b;
    }
    let t = t - 2.0;
    c / 2.0 * (t * t * t + 2.0) + b
}

pub fn in_quart(t: f32, b: f32, c: f32, d: f32) -> f32 {
    let t = t / d;
    c * t * t * t * t + b
}

pub fn out_quart(t: f32, b: f32, c: f32, d: f32) -> f32 {
    let t = t / d - 1.0;
    -c * (t * t * t * t - 1.0) + b
}

pub fn in_out_quart(t: f32, b: f32, c: f32, d: f32) -> f32 {
    let t = t / (d / 2.0);
    if t < 1.0 {
        return c / 2.0 * t * t * t * t + b;
    }
    let t = t - 2.0;
    -c / 2.0 * (t * t * t * t - 2.0) + b
}

pub fn in_quint(t: f32, b: f32, c: f32, d: f32) -> f32 {
    let t = t / d;
    c * t * t * t * t * t + b
}

pub fn out_quint(t: f32, b: f32, c: f32, d: f32) -> f32 {
    let t = t / d - 1.0;
    c * (t * t * t * t * t + 1.0) + b
}

pub fn in_out_quint(t: f32, b: f32, c: f32, d: f32) -> f32 {
    let t = t / (d / 2.0);
    if t < 1.0 {
        return c / 2.0 * t * t * t * t * t + b;
    }
    let t = t - 2.0;
    c / 2.0 * (t * t * t * t * t + 2.0) + b
}

pub fn in_sine(t: f32, b: f32, c: f32, d: f32) -> f32 {
    -c * (t / d * (PI / 2.0)).cos() + c + b
}

pub fn out_sine(t: f32, b: f32, c: f32, d: f32) -> f32 {
    c * (t / d * (PI / 2.0)).sin() + b
}

pub fn in_out_sine(t: f32, b: f32, c: f32, d: f32) -> f32 {
    -c / 2.0 * ((PI * t / d).cos() - 1.0) + b
}

// The 0.001 offset keeps the curve continuous with its endpoints; both
// ends are pinned exactly.
pub fn in_expo(t: f32, b: f32, c: f32, d: f32) -> f32 {
    if t == 0.0 {
        b
    } else if t == d {
        b + c
    } else {
        c * 2f32.powf(10.0 * (t / d - 1.0)) + b - c * 0.001
    }
}

pub fn out_expo(t: f32, b: f32, c: f32, d: f32) -> f32 {
    if t == d {
        b + c
    } else {
        c * 1.001 * (-(2f32.powf(-10.0 * t / d)) + 1.0) + b
    }
}

pub fn in_out_expo(t: f32, b: f32, c: f32, d: f32) -> f32 {
    if t == 0.0 {
        return b;
    }
    if t == d {
        return b + c;
    }
    let t = t / (d / 2.0);
    if t < 1.0 {
        return c / 2.0 * 2f32.powf(10.0 * (t - 1.0)) + b - c * 0.0005;
    }
    let t = t - 1.0;
    c / 2.0 * 1.0005 * (-(2f32.powf(-10.0 * t)) + 2.0) + b
}

pub fn in_circ(t: f32, b: f32, c: f32, d: f32) -> f32 {
    let t = t / d;
    -c * ((1.0 - t * t).max(0.0).sqrt() - 1.0) + b
}

pub fn out_circ(t: f32, b: f32, c: f32, d: f32) -> f32 {
    let t = t / d - 1.0;
    c * (1.0 - t * t).max(0.0).sqrt() + b
}

pub fn in_out_circ(t: f32, b: f32, c: f32, d: f32) -> f32 {
    let t = t / (d / 2.0);
    if t < 1.0 {
        return -c / 2.0 * ((1.0 - t * t).max(0.0).sqrt() - 1.0) + b;
    }
    let t = t - 2.0;
    c / 2.0 * ((1.0 - t * t).max(0.0).sqrt() + 1.0) + b
}

pub fn in_elastic(t: f32, b: f32, c: f32, d: f32) -> f32 {
    if t == 0.0 {
        return b;
    }
    let t = t / d;
    if t == 1.0 {
        return b + c;
    }
    let p = d * 0.3;
    let s = p / 4.0;
    let t = t - 1.0;
    -(c * 2f32.powf(10.0 * t) * ((t * d - s) * (2.0 * PI) / p).sin()) + b
}

pub fn out_elastic(t: f32, b: f32, c: f32, d: f32) -> f32 {
    if t == 0.0 {
        return b;
    }
    let t = t / d;
    if t == 1.0 {
        return b + c;
    }
    let p = d * 0.3;
    let s = p / 4.0;
    c * 2f32.powf(-10.0 * t) * ((t * d - s) * (2.0 * PI) / p).sin() + c + b
}

pub fn in_out_elastic(t: f32, b: f32, c: f32, d: f32) -> f32 {
    if t == 0.0 {
        return b;
    }
    let t = t / (d / 2.0);
    if t == 2.0 {
        return b + c;
    }
    let p = d * (0.3 * 1.5);
    let s = p / 4.0;
    if t < 1.0 {
        let t = t - 1.0;
        return -0.5 * (c * 2f32.powf(10.0 * t) * ((t * d - s) * (2.0 * PI) / p).sin()) + b;
    }
    let t = t - 1.0;
    c * 2f32.powf(-10.0 * t) * ((t * d - s) * (2.0 * PI) / p).sin() * 0.5 + c + b
}

const BACK_S: f32 = 1.70158;

pub fn in_back(t: f32, b: f32, c: f32, d: f32) -> f32 {
    let t = t / d;
    c * t * t * ((BACK_S + 1.0) * t - BACK_S) + b
}

pub fn out_back(t: f32, b: f32, c: f32, d: f32) -> f32 {
    let t = t / d - 1.0;
    c * (t * t * ((BACK_S + 1.0) * t + BACK_S) + 1.0) + b
}

pub fn in_out_back(t: f32, b: f32, c: f32, d: f32) -> f32 {
    let s = BACK_S * 1.525;
    let t = t / (d / 2.0);
    if t < 1.0 {
        return c / 2.0 * (t * t * ((s + 1.0) * t - s)) + b;
    }
    let t = t - 2.0;
    c / 2.0 * (t * t * ((s + 1.0) * t + s) + 2.0) + b
}

pub fn out_bounce(t: f32, b: f32, c: f32, d: f32) -> f32 {
    let t = t / d;
    if t < 1.0 / 2.75 {
        c * (7.5625 * t * t) + b
    } else if t < 2.0 / 2.75 {
        let t = t - 1.5 / 2.75;
        c * (7.5625 * t * t + 0.75) + b
    } else if t < 2.5 / 2.75 {
        let t = t - 2.25 / 2.75;
        c * (7.5625 * t * t + 0.9375) + b
    } else {
        let t = t - 2.625 / 2.75;
        c * (7.5625 * t * t + 0.984375) + b
    }
}

pub fn in_bounce(t: f32, b: f32, c: f32, d: f32) -> f32 {
    c - out_bounce(d - t, 0.0, c, d) + b
}

pub fn in_out_bounce(t: f32, b: f32, c: f32, d: f32) -> f32 {
    if t < d / 2.0 {
        in_bounce(t * 2.0, 0.0, c, d) * 0.5 + b
    } else {
        out_bounce(t * 2.0 - d, 0.0, c, d) * 0.5 + c * 0.5 + b
    }
}

/// Unity-style smoothstep between `from` and `to`.
#[inline]
pub fn smooth_step(from: f32, to: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    let t = -2.0 * t * t * t + 3.0 * t * t;
    to * t + from * (1.0 - t)
}
