//! Curtain API core: the value contract shared by the transition engine and
//! host adapters.
//!
//! Engines describe what to write as [`Value`]s; adapters map them onto
//! concrete widgets, transforms or materials.

pub mod blend;
pub mod value;

pub use blend::{lerp_value, lerp_value_clamped, nlerp_quat};
pub use value::{Value, ValueError, ValueKind};
