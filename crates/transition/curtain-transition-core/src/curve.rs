//! User-supplied easing curves: cubic Hermite keyframes.

use serde::{Deserialize, Serialize};

/// One curve key with incoming/outgoing slopes.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: f32,
    #[serde(default)]
    pub out_tangent: f32,
}

impl CurveKey {
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            in_tangent: 0.0,
            out_tangent: 0.0,
        }
    }
}

/// Piecewise cubic Hermite curve. Keys are kept sorted by time; outside
/// the key range the curve holds its first/last value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomCurve {
    keys: Vec<CurveKey>,
}

impl Default for CustomCurve {
    /// Ease in/out from (0, 0) to (1, 1).
    fn default() -> Self {
        Self::ease_in_out(0.0, 0.0, 1.0, 1.0)
    }
}

impl CustomCurve {
    pub fn new(mut keys: Vec<CurveKey>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    pub fn ease_in_out(t0: f32, v0: f32, t1: f32, v1: f32) -> Self {
        Self::new(vec![CurveKey::new(t0, v0), CurveKey::new(t1, v1)])
    }

    pub fn linear(t0: f32, v0: f32, t1: f32, v1: f32) -> Self {
        let slope = if t1 != t0 { (v1 - v0) / (t1 - t0) } else { 0.0 };
        Self::new(vec![
            CurveKey {
                time: t0,
                value: v0,
                in_tangent: slope,
                out_tangent: slope,
            },
            CurveKey {
                time: t1,
                value: v1,
                in_tangent: slope,
                out_tangent: slope,
            },
        ])
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    pub fn add_key(&mut self, key: CurveKey) {
        let at = self.keys.partition_point(|k| k.time <= key.time);
        self.keys.insert(at, key);
    }

    pub fn evaluate(&self, time: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return 0.0,
        };
        if time.is_nan() || time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }
        let hi = self.keys.partition_point(|k| k.time <= time);
        let a = &self.keys[hi - 1];
        let b = &self.keys[hi];
        let dt = b.time - a.time;
        if dt <= 0.0 {
            return b.value;
        }
        let s = (time - a.time) / dt;
        let s2 = s * s;
        let s3 = s2 * s;
        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;
        h00 * a.value + h10 * dt * a.out_tangent + h01 * b.value + h11 * dt * b.in_tangent
    }
}
