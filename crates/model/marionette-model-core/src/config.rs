//! Runtime configuration for marionette-model-core.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::inputs::{default_input_bindings, InputBinding};

/// Top-level configuration, nested per component.
/// Every section has defaults so a partial JSON document is accepted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub motion: MotionConfig,
    pub eye_blink: EyeBlinkConfig,
    pub physics: PhysicsConfig,
    pub pose: PoseConfig,
    /// Parameter receiving the lip-sync value.
    pub lip_sync_param: String,
    /// Drag/accel offsets applied after the eye blink.
    pub inputs: Vec<InputBinding>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            motion: MotionConfig::default(),
            eye_blink: EyeBlinkConfig::default(),
            physics: PhysicsConfig::default(),
            pose: PoseConfig::default(),
            lip_sync_param: "PARAM_MOUTH_OPEN_Y".to_string(),
            inputs: default_input_bindings(),
        }
    }
}

impl Config {
    /// Parse a (possibly partial) JSON configuration document.
    pub fn from_json_str(s: &str) -> Result<Self, ModelError> {
        serde_json::from_str(s).map_err(|e| ModelError::decode("config", e.to_string()))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MotionConfig {
    /// Fade-out used for a superseded entry whose motion declares none.
    pub default_fade_out_ms: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            default_fade_out_ms: 1000.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EyeBlinkConfig {
    pub left_param: String,
    pub right_param: String,
    /// Mean idle time between blinks; the actual wait is uniform in [0, 2 * interval).
    pub interval_ms: f32,
    pub closing_ms: f32,
    pub closed_ms: f32,
    pub opening_ms: f32,
    /// Multiplier on the right eye ratio.
    pub right_eye_scale: f32,
    /// Fixed seed for reproducible blink timing.
    pub seed: Option<u64>,
}

impl Default for EyeBlinkConfig {
    fn default() -> Self {
        Self {
            left_param: "PARAM_EYE_L_OPEN".to_string(),
            right_param: "PARAM_EYE_R_OPEN".to_string(),
            interval_ms: 4000.0,
            closing_ms: 100.0,
            closed_ms: 50.0,
            opening_ms: 150.0,
            right_eye_scale: 1.0,
            seed: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Largest integration step; longer frames are split into sub-steps.
    pub max_step_ms: f32,
    /// Elapsed time beyond this is dropped (host stalls, paused clocks).
    pub max_elapsed_ms: f32,
    /// Gravity rotation in degrees at `accel_x == 1`.
    pub accel_gravity_deg: f32,
    /// Relative gravity gain at `accel_z == 1`.
    pub accel_gravity_z: f32,
    /// Base displacement at `accel_y == 1`.
    pub accel_offset: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            max_step_ms: 1000.0 / 60.0,
            max_elapsed_ms: 250.0,
            accel_gravity_deg: 30.0,
            accel_gravity_z: 0.5,
            accel_offset: 0.1,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PoseConfig {
    pub fade_ms: f32,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self { fade_ms: 500.0 }
    }
}
