//! Serialized asset shapes (JSON) for models, motions, expressions, poses and physics.
//!
//! These are the decoder outputs: plain serde structs mirroring the files on disk.
//! Runtime types are built from them by `Model::from_data`, `Motion::standard_from_data`,
//! `Motion::expression_from_data`, `Pose::from_data` and `Physics::from_data`, which is
//! where structural checks happen.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::params::{ParameterDef, PartDef};

/// Decode a JSON asset, tagging errors with the path it was loaded from.
pub fn decode_json<T: DeserializeOwned>(path: &str, bytes: &[u8]) -> Result<T, ModelError> {
    serde_json::from_slice(bytes).map_err(|e| ModelError::decode(path, e.to_string()))
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ModelData {
    pub canvas_width: f32,
    pub canvas_height: f32,
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,
    #[serde(default)]
    pub parts: Vec<PartDef>,
    #[serde(default)]
    pub drawables: Vec<DrawableDef>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DrawableDef {
    pub id: String,
    #[serde(default)]
    pub part: Option<String>,
    /// Initial transformed points in canvas space.
    #[serde(default)]
    pub points: Vec<[f32; 2]>,
}

/// One key on a motion curve; `t` in milliseconds from the motion start.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Keyframe {
    #[serde(rename = "t")]
    pub time_ms: f32,
    #[serde(rename = "v")]
    pub value: f32,
}

impl Keyframe {
    pub fn new(time_ms: f32, value: f32) -> Self {
        Self { time_ms, value }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CurveData {
    pub param: String,
    pub keys: Vec<Keyframe>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MotionData {
    #[serde(default)]
    pub fade_in_ms: Option<f32>,
    #[serde(default)]
    pub fade_out_ms: Option<f32>,
    #[serde(default, rename = "loop")]
    pub looping: bool,
    /// Defaults to the time of the last key across all curves.
    #[serde(default)]
    pub duration_ms: Option<f32>,
    #[serde(default)]
    pub curves: Vec<CurveData>,
}

/// How an expression value combines with the parameter underneath.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionCalc {
    /// Adds `val - def`.
    #[default]
    Add,
    /// Multiplies by `val / def`.
    Mult,
    /// Blends toward `val`.
    Set,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExpressionParamData {
    pub id: String,
    pub val: f32,
    #[serde(default)]
    pub def: Option<f32>,
    #[serde(default)]
    pub calc: ExpressionCalc,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ExpressionData {
    #[serde(default)]
    pub fade_in_ms: Option<f32>,
    #[serde(default)]
    pub fade_out_ms: Option<f32>,
    #[serde(default)]
    pub params: Vec<ExpressionParamData>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PosePartData {
    pub id: String,
    /// Parts that mirror this part's opacity.
    #[serde(default)]
    pub link: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PoseGroupData {
    /// Defaults to the first part id.
    #[serde(default)]
    pub name: Option<String>,
    pub group: Vec<PosePartData>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PoseData {
    /// Overrides `Config::pose.fade_ms` for this pose set.
    #[serde(default)]
    pub fade_ms: Option<f32>,
    #[serde(default)]
    pub parts_visible: Vec<PoseGroupData>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicsSourceKind {
    /// Moves the anchor horizontally.
    X,
    /// Moves the anchor vertically.
    Y,
    /// Rotates gravity, in degrees.
    Angle,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicsTargetKind {
    /// Pendulum angle from rest, in degrees.
    Angle,
    /// Angular velocity, in degrees per second.
    #[serde(rename = "angle_v")]
    AngularVelocity,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PhysicsSourceData {
    pub id: String,
    pub ptype: PhysicsSourceKind,
    #[serde(default = "one")]
    pub scale: f32,
    #[serde(default = "one")]
    pub weight: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PhysicsTargetData {
    pub id: String,
    pub ptype: PhysicsTargetKind,
    #[serde(default = "one")]
    pub scale: f32,
    #[serde(default = "one")]
    pub weight: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PhysicsSetupData {
    /// Link length between anchor and tip.
    pub length: f32,
    /// Air resistance coefficient.
    #[serde(default)]
    pub regist: f32,
    pub mass: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PhysicsHairData {
    #[serde(default)]
    pub comment: Option<String>,
    pub setup: PhysicsSetupData,
    #[serde(default)]
    pub src: Vec<PhysicsSourceData>,
    #[serde(default)]
    pub targets: Vec<PhysicsTargetData>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PhysicsData {
    /// Gravity acceleration in link-length units per second squared.
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    #[serde(default)]
    pub physics_hair: Vec<PhysicsHairData>,
}

fn one() -> f32 {
    1.0
}

fn default_gravity() -> f32 {
    9.8
}
