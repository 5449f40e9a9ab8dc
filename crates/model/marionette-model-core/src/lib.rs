#![allow(dead_code)]
//! marionette-model-core: runtime for parametric 2D character models.
//!
//! A [`BaseModel`] owns one [`Model`] and composes, every frame, a main motion, an
//! expression overlay, an autonomous eye blink, drag/tilt input offsets, lip-sync,
//! pendulum physics and pose-group switching into the model's [`ParameterStore`].
//! Assets arrive through a [`Platform`] implementation and are decoded from JSON.

pub mod assets;
pub mod base_model;
pub mod config;
pub mod error;
pub mod eye_blink;
pub mod ids;
pub mod inputs;
pub mod matrix;
pub mod model;
pub mod motion;
pub mod params;
pub mod physics;
pub mod platform;
pub mod pose;

pub use base_model::BaseModel;
pub use config::{Config, EyeBlinkConfig, MotionConfig, PhysicsConfig, PoseConfig};
pub use error::ModelError;
pub use eye_blink::{EyeBlink, EyePhase};
pub use ids::{MotionHandle, TextureId};
pub use inputs::{InputBinding, InputSource, InputState};
pub use matrix::ModelMatrix;
pub use model::{Drawable, Model, Rect};
pub use motion::player::{MotionPlayer, MotionPriority, MotionQueueEntry};
pub use motion::{Motion, MotionKind};
pub use params::{ParameterDef, ParameterStore, PartDef};
pub use physics::Physics;
pub use platform::{MemoryPlatform, Platform};
pub use pose::{Pose, PoseGroup};

/// Crate result alias.
pub type Result<T> = std::result::Result<T, ModelError>;
