//! BaseModel: owns a model, its assets and the per-frame parameter pipeline.
//!
//! Frame order in [`BaseModel::update`]:
//! saved snapshot -> main motion -> snapshot -> expression -> eye blink -> input
//! offsets -> lip-sync -> physics -> pose. Later stages observe and override what earlier
//! ones wrote. The snapshot taken after the main motion is what keeps a pose in place
//! once its motion has ended.

use std::sync::Arc;

use hashbrown::HashMap;
use log::{debug, error, info, warn};

use crate::assets::{decode_json, ExpressionData, MotionData, PhysicsData, PoseData};
use crate::config::Config;
use crate::error::ModelError;
use crate::eye_blink::EyeBlink;
use crate::ids::MotionHandle;
use crate::inputs::{apply_input_bindings, InputState};
use crate::matrix::ModelMatrix;
use crate::model::{Model, Rect};
use crate::motion::player::{MotionPlayer, MotionPriority};
use crate::motion::Motion;
use crate::params::ParameterStore;
use crate::physics::Physics;
use crate::platform::Platform;
use crate::pose::Pose;

fn logged<T>(what: &str, path: &str, res: Result<T, ModelError>) -> Result<T, ModelError> {
    if let Err(e) = &res {
        error!("failed to load {what} '{path}' [{}]: {e}", e.category());
    }
    res
}

/// Configured parameter ids (eye blink, lip-sync, input bindings) the model lacks.
fn unbound_params(cfg: &Config, params: &ParameterStore) -> Vec<String> {
    let configured = [
        &cfg.eye_blink.left_param,
        &cfg.eye_blink.right_param,
        &cfg.lip_sync_param,
    ]
    .into_iter()
    .chain(cfg.inputs.iter().map(|b| &b.param));

    let mut missing: Vec<String> = Vec::new();
    for id in configured {
        if !params.contains(id) && !missing.contains(id) {
            missing.push(id.clone());
        }
    }
    missing
}

pub struct BaseModel<P: Platform> {
    platform: P,
    cfg: Config,

    model: Option<Model>,
    matrix: Option<ModelMatrix>,

    main: MotionPlayer,
    expression: MotionPlayer,
    motions: HashMap<String, Arc<Motion>>,
    expressions: HashMap<String, Arc<Motion>>,
    eye_blink: EyeBlink,
    physics: Option<Physics>,
    pose: Option<Pose>,

    unbound: Vec<String>,

    input: InputState,
    lip_sync: bool,
    lip_sync_value: f32,

    initialized: bool,
    updating: bool,
}

impl<P: Platform> BaseModel<P> {
    pub fn new(platform: P, cfg: Config) -> Self {
        Self {
            platform,
            main: MotionPlayer::new("main", &cfg.motion),
            expression: MotionPlayer::new("expression", &cfg.motion),
            eye_blink: EyeBlink::new(&cfg.eye_blink),
            cfg,
            model: None,
            matrix: None,
            motions: HashMap::new(),
            expressions: HashMap::new(),
            physics: None,
            pose: None,
            unbound: Vec::new(),
            input: InputState::default(),
            lip_sync: false,
            lip_sync_value: 0.0,
            initialized: false,
            updating: false,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    // ---- lifecycle flags (host owned) ----

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn set_initialized(&mut self, v: bool) {
        self.initialized = v;
    }

    #[inline]
    pub fn is_updating(&self) -> bool {
        self.updating
    }

    pub fn set_updating(&mut self, v: bool) {
        self.updating = v;
    }

    // ---- inputs ----

    /// Device tilt, nominally in [-1, 1] per axis. Not clamped.
    pub fn set_accel(&mut self, x: f32, y: f32, z: f32) {
        self.input.accel = [x, y, z];
    }

    /// Drag position, nominally in [-1, 1] per axis. Not clamped.
    pub fn set_drag(&mut self, x: f32, y: f32) {
        self.input.drag = [x, y];
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn set_lip_sync(&mut self, enabled: bool) {
        self.lip_sync = enabled;
    }

    pub fn set_lip_sync_value(&mut self, value: f32) {
        self.lip_sync_value = value;
    }

    // ---- loading ----

    /// Load the model. On success every asset and player bound to a previous model is
    /// dropped; on failure nothing changes.
    pub fn load_model_data(&mut self, path: &str) -> Result<(), ModelError> {
        let mut model = logged("model", path, self.platform.load_model(path))?;
        model.params_mut().save();
        let matrix = ModelMatrix::fit_canvas(model.canvas_width(), model.canvas_height());
        info!(
            "loaded model '{path}': {} parameters, {} drawables, canvas {}x{}",
            model.params().len(),
            model.drawables().len(),
            model.canvas_width(),
            model.canvas_height()
        );
        let unbound = unbound_params(&self.cfg, model.params());
        for id in &unbound {
            warn!("model '{path}' has no parameter '{id}'; its configured driver writes nothing");
        }

        self.main.stop_all_motions();
        self.expression.stop_all_motions();
        self.motions.clear();
        self.expressions.clear();
        self.physics = None;
        self.pose = None;
        self.eye_blink = EyeBlink::new(&self.cfg.eye_blink);
        self.unbound = unbound;
        self.model = Some(model);
        self.matrix = Some(matrix);
        Ok(())
    }

    pub fn load_texture(&mut self, slot: usize, path: &str) -> Result<(), ModelError> {
        let Some(model) = self.model.as_mut() else {
            return logged("texture", path, Err(ModelError::ModelNotLoaded));
        };
        logged(
            "texture",
            path,
            self.platform.load_texture(model, slot, path),
        )
    }

    fn read_asset<T: serde::de::DeserializeOwned>(&mut self, path: &str) -> Result<T, ModelError> {
        if self.model.is_none() {
            return Err(ModelError::ModelNotLoaded);
        }
        let bytes = self.platform.load_bytes(path)?;
        decode_json(path, &bytes)
    }

    fn build_motion(&mut self, path: &str) -> Result<Arc<Motion>, ModelError> {
        let data: MotionData = self.read_asset(path)?;
        let motion = Motion::standard_from_data(data)?;
        if let Some(model) = &self.model {
            motion.check_params(model.params(), &format!("motion '{path}'"))?;
        }
        Ok(Arc::new(motion))
    }

    fn build_expression(&mut self, path: &str) -> Result<Arc<Motion>, ModelError> {
        let data: ExpressionData = self.read_asset(path)?;
        let motion = Motion::expression_from_data(data)?;
        if let Some(model) = &self.model {
            motion.check_params(model.params(), &format!("expression '{path}'"))?;
        }
        Ok(Arc::new(motion))
    }

    /// Load a standard motion; registered under `name` when one is given.
    pub fn load_motion(
        &mut self,
        name: Option<&str>,
        path: &str,
    ) -> Result<Arc<Motion>, ModelError> {
        let motion = logged("motion", path, self.build_motion(path))?;
        if let Some(name) = name {
            debug!("registered motion '{name}' from '{path}'");
            self.motions.insert(name.to_string(), Arc::clone(&motion));
        }
        Ok(motion)
    }

    pub fn load_expression(&mut self, name: &str, path: &str) -> Result<Arc<Motion>, ModelError> {
        let motion = logged("expression", path, self.build_expression(path))?;
        debug!("registered expression '{name}' from '{path}'");
        self.expressions
            .insert(name.to_string(), Arc::clone(&motion));
        Ok(motion)
    }

    pub fn load_pose(&mut self, path: &str) -> Result<(), ModelError> {
        let res = self.read_asset::<PoseData>(path).and_then(|data| {
            let params = self
                .model
                .as_ref()
                .ok_or(ModelError::ModelNotLoaded)?
                .params();
            Pose::from_data(data, &self.cfg.pose, params)
        });
        self.pose = Some(logged("pose", path, res)?);
        Ok(())
    }

    /// A malformed rig loads as disabled physics; only IO and decode errors are returned.
    pub fn load_physics(&mut self, path: &str) -> Result<(), ModelError> {
        let data: PhysicsData = logged("physics", path, self.read_asset(path))?;
        let params = self
            .model
            .as_ref()
            .ok_or(ModelError::ModelNotLoaded)?
            .params();
        self.physics = Some(Physics::from_data(data, &self.cfg.physics, params));
        Ok(())
    }

    // ---- playback ----

    /// Start a registered motion on the main player, honoring the reservation protocol.
    /// `Force` always wins; other priorities must beat the reserved and current ones.
    pub fn start_motion(&mut self, name: &str, priority: MotionPriority) -> Option<MotionHandle> {
        let Some(motion) = self.motions.get(name).cloned() else {
            warn!("start_motion: unknown motion '{name}'");
            return None;
        };
        if priority != MotionPriority::Force && !self.main.reserve_motion(priority) {
            debug!("start_motion: '{name}' at {priority:?} rejected");
            return None;
        }
        self.main.start_motion_prio(motion, priority)
    }

    /// Cross-fade to a registered expression. Returns false for unknown names.
    pub fn set_expression(&mut self, name: &str) -> bool {
        match self.expressions.get(name).cloned() {
            Some(exp) => self.expression.start_motion(exp, false).is_some(),
            None => {
                warn!("set_expression: unknown expression '{name}'");
                false
            }
        }
    }

    pub fn set_pose(&mut self, group: &str, part_index: usize) -> Result<(), ModelError> {
        match self.pose.as_mut() {
            Some(pose) => pose.set_pose(group, part_index),
            None => Err(ModelError::not_found("pose group", group)),
        }
    }

    pub fn stop_all_motions(&mut self) {
        self.main.stop_all_motions();
        self.expression.stop_all_motions();
    }

    // ---- queries ----

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> Option<&mut Model> {
        self.model.as_mut()
    }

    pub fn model_matrix(&self) -> Option<&ModelMatrix> {
        self.matrix.as_ref()
    }

    pub fn model_matrix_mut(&mut self) -> Option<&mut ModelMatrix> {
        self.matrix.as_mut()
    }

    pub fn main_motion_manager(&self) -> &MotionPlayer {
        &self.main
    }

    pub fn main_motion_manager_mut(&mut self) -> &mut MotionPlayer {
        &mut self.main
    }

    pub fn expression_manager(&self) -> &MotionPlayer {
        &self.expression
    }

    pub fn expression_manager_mut(&mut self) -> &mut MotionPlayer {
        &mut self.expression
    }

    pub fn motion(&self, name: &str) -> Option<&Arc<Motion>> {
        self.motions.get(name)
    }

    pub fn expression(&self, name: &str) -> Option<&Arc<Motion>> {
        self.expressions.get(name)
    }

    /// Parameter ids named by the config but absent from the loaded model.
    pub fn unbound_config_params(&self) -> &[String] {
        &self.unbound
    }

    pub fn eye_blink(&self) -> &EyeBlink {
        &self.eye_blink
    }

    pub fn physics(&self) -> Option<&Physics> {
        self.physics.as_ref()
    }

    pub fn pose(&self) -> Option<&Pose> {
        self.pose.as_ref()
    }

    pub fn pose_mut(&mut self) -> Option<&mut Pose> {
        self.pose.as_mut()
    }

    /// Bounding box of a drawable's transformed points in canvas space.
    pub fn get_simple_rect(&self, draw_id: &str) -> Option<Rect> {
        let model = self.model.as_ref()?;
        let idx = model.drawable_index(draw_id)?;
        Rect::from_points(model.transformed_points(idx)?)
    }

    /// Rectangle hit test of a viewport-space point. Hidden drawables never hit.
    pub fn hit_test_simple(&self, draw_id: &str, x: f32, y: f32) -> bool {
        let (Some(model), Some(matrix)) = (&self.model, &self.matrix) else {
            return false;
        };
        if !model.is_drawable_visible(draw_id) {
            return false;
        }
        let Some(rect) = self.get_simple_rect(draw_id) else {
            return false;
        };
        rect.contains(matrix.invert_transform_x(x), matrix.invert_transform_y(y))
    }

    // ---- frame ----

    /// Run one frame of the parameter pipeline at `now_ms`. No-op without a model.
    pub fn update(&mut self, now_ms: u64) {
        let Some(model) = self.model.as_mut() else {
            return;
        };
        let params = model.params_mut();

        params.load_saved();
        self.main.update(params, now_ms);
        params.save();

        self.expression.update(params, now_ms);
        self.eye_blink.update(params, now_ms);
        apply_input_bindings(params, &self.input, &self.cfg.inputs);

        if self.lip_sync {
            params.set_value(&self.cfg.lip_sync_param, self.lip_sync_value, 1.0);
        }
        if let Some(physics) = self.physics.as_mut() {
            physics.update(params, &self.input, now_ms);
        }
        if let Some(pose) = self.pose.as_mut() {
            pose.update(params, now_ms);
        }
    }
}
