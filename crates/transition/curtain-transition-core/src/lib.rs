//! Curtain transition core (engine-agnostic)
//!
//! Hierarchical open/close transitions for UI and scene objects. Items
//! form a parent/child tree and move between closed and opened through
//! eased tweens, optional bezier paths and chained child delays; cores
//! select exactly one named state at a time over a set of items.
//!
//! The engine never touches host objects. It reads time and input through
//! [`ClockSource`] and [`InputSource`] and writes [`EffectChange`]s and
//! [`Event`]s into an [`Outputs`] buffer for an adapter to apply.

pub mod capture;
pub mod config;
pub mod curve;
pub mod easing;
pub mod effects;
pub mod engine;
pub mod error;
pub mod ids;
pub mod inputs;
pub mod item;
pub mod math;
pub mod outputs;
pub mod path;
pub mod profile;
pub mod scene;
pub mod scheduler;
pub mod selector;
pub mod tween;

// Re-exports for consumers (adapters)
pub use capture::CaptureSource;
pub use config::EngineConfig;
pub use curve::{CurveKey, CustomCurve};
pub use easing::{Ease, Family, Shape};
pub use effects::{EffectKeys, EffectKind, MaterialProperty, PropertyKeys, RotationMode};
pub use engine::Engine;
pub use error::TransitionError;
pub use ids::{CoreId, ItemId};
pub use inputs::{InputSource, KeyCode, NoInput, PressedKeys};
pub use item::{
    chain_delay, ActivationMode, ButtonDirection, ChainDirection, Direction, Item, ItemConfig, ItemKey, ItemState,
    Scope, Timing,
};
pub use outputs::{EffectChange, EffectSink, Event, Outputs, TargetHandle};
pub use path::{Path, PathFrame, PathLerpMode, PathNormal};
pub use profile::{Profile, PROFILE_VERSION};
pub use scene::{CoreDesc, ItemDesc, SceneDesc, SceneHandles, StateDesc};
pub use scheduler::{ClockSource, DeltaTime, ManualClock, Scheduler, UpdatePhase};
pub use selector::{Activator, Core, IncorrectStateAction, State};
pub use tween::{Tween, TweenDirection, TweenMode};
pub use curtain_api_core::{Value, ValueKind};
