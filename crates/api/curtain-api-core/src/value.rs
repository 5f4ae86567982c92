//! Value: the payload an engine hands to its host for one effect write.
//! All numeric types use f32.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse kind of a [`Value`], handy for dispatch and validation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Quat,
    ColorRgba,
    Transform,
    Vector,
    Text,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    /// Scalar float
    Float(f32),

    /// 2D vector
    Vec2([f32; 2]),

    /// 3D vector (positions, euler angles, scales)
    Vec3([f32; 3]),

    /// 4D vector
    Vec4([f32; 4]),

    /// Quaternion (x, y, z, w)
    Quat([f32; 4]),

    /// RGBA color
    ColorRgba([f32; 4]),

    /// Transform with position, rotation (quat), scale
    Transform {
        pos: [f32; 3],
        rot: [f32; 4], // quat (x,y,z,w)
        scale: [f32; 3],
    },

    /// Generic, variable-length numeric vector
    Vector(Vec<f32>),

    /// Text; interpolated by progressive reveal in the engine
    Text(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ValueError {
    #[error("expected a {expected:?} value, found {found:?}")]
    KindMismatch { expected: ValueKind, found: ValueKind },
}

impl Value {
    /// Return the coarse kind of this value.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Float(_) => ValueKind::Float,
            Value::Vec2(_) => ValueKind::Vec2,
            Value::Vec3(_) => ValueKind::Vec3,
            Value::Vec4(_) => ValueKind::Vec4,
            Value::Quat(_) => ValueKind::Quat,
            Value::ColorRgba(_) => ValueKind::ColorRgba,
            Value::Transform { .. } => ValueKind::Transform,
            Value::Vector(_) => ValueKind::Vector,
            Value::Text(_) => ValueKind::Text,
        }
    }

    /// Fail unless this value has the given kind.
    pub fn ensure_kind(&self, expected: ValueKind) -> Result<(), ValueError> {
        let found = self.kind();
        if found == expected {
            Ok(())
        } else {
            Err(ValueError::KindMismatch { expected, found })
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<[f32; 3]> {
        match self {
            Value::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_quat(&self) -> Option<[f32; 4]> {
        match self {
            Value::Quat(q) => Some(*q),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convenience constructors
    pub fn f(v: f32) -> Self {
        Value::Float(v)
    }

    pub fn vec3(x: f32, y: f32, z: f32) -> Self {
        Value::Vec3([x, y, z])
    }

    pub fn quat(x: f32, y: f32, z: f32, w: f32) -> Self {
        Value::Quat([x, y, z, w])
    }

    pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Value::ColorRgba([r, g, b, a])
    }

    pub fn transform(pos: [f32; 3], rot: [f32; 4], scale: [f32; 3]) -> Self {
        Value::Transform { pos, rot, scale }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_uses_type_and_data_tags() {
        let v = Value::vec3(1.0, 2.0, 3.0);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["type"], "Vec3");
        assert_eq!(json["data"][2], 3.0);
        let back: Value = serde_json::from_value(json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn ensure_kind_reports_mismatch() {
        let err = Value::f(1.0).ensure_kind(ValueKind::Vec3).unwrap_err();
        assert_eq!(
            err,
            ValueError::KindMismatch {
                expected: ValueKind::Vec3,
                found: ValueKind::Float
            }
        );
        assert!(Value::rgba(1.0, 1.0, 1.0, 1.0)
            .ensure_kind(ValueKind::ColorRgba)
            .is_ok());
    }
}
