//! Pendulum physics for secondary motion (hair, ribbons, accessories).
//!
//! Each hair is an anchor point mass driven by source parameters and a tip point mass
//! hanging from it on a rigid link. Gravity is rotated and scaled by the host's tilt input.
//! Integration is semi-implicit Euler followed by projection back onto the link; the
//! tip velocity is then re-derived from the projected displacement. Frames longer than
//! `max_step_ms` are split into equal sub-steps.
//!
//! Configuration problems never raise: the component is built disabled and `update`
//! does nothing.

use log::{debug, warn};

use crate::assets::{PhysicsData, PhysicsSourceKind, PhysicsTargetKind};
use crate::config::PhysicsConfig;
use crate::inputs::InputState;
use crate::params::ParameterStore;

#[derive(Clone, Debug)]
struct Source {
    param: String,
    kind: PhysicsSourceKind,
    scale: f32,
    weight: f32,
}

#[derive(Clone, Debug)]
struct Target {
    param: String,
    kind: PhysicsTargetKind,
    scale: f32,
    weight: f32,
}

#[derive(Clone, Debug)]
pub struct Hair {
    length: f32,
    regist: f32,
    mass: f32,
    sources: Vec<Source>,
    targets: Vec<Target>,

    anchor: [f32; 2],
    tip: [f32; 2],
    tip_velocity: [f32; 2],
    gravity_angle_deg: f32,
    angle_deg: f32,
    angular_velocity_deg: f32,
}

impl Hair {
    fn rest(&mut self) {
        self.anchor = [0.0, 0.0];
        self.tip = [0.0, -self.length];
        self.tip_velocity = [0.0, 0.0];
        self.gravity_angle_deg = 0.0;
        self.angle_deg = 0.0;
        self.angular_velocity_deg = 0.0;
    }

    /// Tip angle from straight down, in degrees; positive towards +x.
    pub fn angle_deg(&self) -> f32 {
        self.angle_deg
    }

    pub fn angular_velocity_deg(&self) -> f32 {
        self.angular_velocity_deg
    }

    pub fn tip(&self) -> [f32; 2] {
        self.tip
    }

    fn read_sources(&mut self, params: &ParameterStore) -> [f32; 2] {
        let mut anchor = self.anchor;
        for src in &self.sources {
            let Some(raw) = params.value(&src.param) else {
                continue;
            };
            let value = raw * src.scale;
            match src.kind {
                PhysicsSourceKind::X => anchor[0] += (value - anchor[0]) * src.weight,
                PhysicsSourceKind::Y => anchor[1] += (value - anchor[1]) * src.weight,
                PhysicsSourceKind::Angle => {
                    self.gravity_angle_deg += (value - self.gravity_angle_deg) * src.weight
                }
            }
        }
        anchor
    }

    fn step(&mut self, anchor: [f32; 2], gravity: [f32; 2], dt: f32) {
        self.anchor = anchor;
        let prev = self.tip;

        let ax = gravity[0] - self.regist * self.tip_velocity[0] / self.mass;
        let ay = gravity[1] - self.regist * self.tip_velocity[1] / self.mass;
        self.tip_velocity[0] += ax * dt;
        self.tip_velocity[1] += ay * dt;
        self.tip[0] += self.tip_velocity[0] * dt;
        self.tip[1] += self.tip_velocity[1] * dt;

        let dx = self.tip[0] - anchor[0];
        let dy = self.tip[1] - anchor[1];
        let len = (dx * dx + dy * dy).sqrt();
        if len > f32::EPSILON {
            self.tip = [
                anchor[0] + dx / len * self.length,
                anchor[1] + dy / len * self.length,
            ];
        } else {
            self.tip = [anchor[0], anchor[1] - self.length];
        }
        self.tip_velocity = [(self.tip[0] - prev[0]) / dt, (self.tip[1] - prev[1]) / dt];
    }

    fn measure_angle(&self) -> f32 {
        let dx = self.tip[0] - self.anchor[0];
        let dy = self.tip[1] - self.anchor[1];
        dx.atan2(-dy).to_degrees()
    }

    fn write_targets(&self, params: &mut ParameterStore) {
        for t in &self.targets {
            let value = match t.kind {
                PhysicsTargetKind::Angle => self.angle_deg,
                PhysicsTargetKind::AngularVelocity => self.angular_velocity_deg,
            };
            params.set_value(&t.param, value * t.scale, t.weight);
        }
    }
}

#[derive(Clone, Debug)]
pub struct Physics {
    enabled: bool,
    gravity: f32,
    hairs: Vec<Hair>,
    cfg: PhysicsConfig,
    last_update_ms: Option<u64>,
}

impl Physics {
    /// A component that never writes anything.
    pub fn disabled(cfg: &PhysicsConfig) -> Self {
        Self {
            enabled: false,
            gravity: 0.0,
            hairs: Vec::new(),
            cfg: cfg.clone(),
            last_update_ms: None,
        }
    }

    /// Build the rig. Empty, non-finite or non-positive setups, and ids missing from
    /// `params`, produce a disabled component with a warning.
    pub fn from_data(data: PhysicsData, cfg: &PhysicsConfig, params: &ParameterStore) -> Self {
        if data.physics_hair.is_empty() {
            warn!("physics: no hair groups, physics disabled");
            return Self::disabled(cfg);
        }
        if !data.gravity.is_finite() || cfg.max_step_ms <= 0.0 {
            warn!("physics: invalid gravity or step size, physics disabled");
            return Self::disabled(cfg);
        }

        let mut hairs = Vec::with_capacity(data.physics_hair.len());
        for (i, h) in data.physics_hair.into_iter().enumerate() {
            let s = &h.setup;
            let valid = s.length.is_finite()
                && s.length > 0.0
                && s.mass.is_finite()
                && s.mass > 0.0
                && s.regist.is_finite()
                && s.regist >= 0.0;
            if !valid {
                warn!("physics: hair {i} has an invalid setup {s:?}, physics disabled");
                return Self::disabled(cfg);
            }
            let unknown = h
                .src
                .iter()
                .map(|x| x.id.as_str())
                .chain(h.targets.iter().map(|x| x.id.as_str()))
                .find(|id| !params.contains(id));
            if let Some(id) = unknown {
                warn!("physics: hair {i} references unknown parameter '{id}', physics disabled");
                return Self::disabled(cfg);
            }

            let mut hair = Hair {
                length: s.length,
                regist: s.regist,
                mass: s.mass,
                sources: h
                    .src
                    .into_iter()
                    .map(|x| Source {
                        param: x.id,
                        kind: x.ptype,
                        scale: x.scale,
                        weight: x.weight,
                    })
                    .collect(),
                targets: h
                    .targets
                    .into_iter()
                    .map(|x| Target {
                        param: x.id,
                        kind: x.ptype,
                        scale: x.scale,
                        weight: x.weight,
                    })
                    .collect(),
                anchor: [0.0; 2],
                tip: [0.0; 2],
                tip_velocity: [0.0; 2],
                gravity_angle_deg: 0.0,
                angle_deg: 0.0,
                angular_velocity_deg: 0.0,
            };
            hair.rest();
            hairs.push(hair);
        }
        debug!("physics: {} hair group(s)", hairs.len());

        Self {
            enabled: true,
            gravity: data.gravity,
            hairs,
            cfg: cfg.clone(),
            last_update_ms: None,
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn hairs(&self) -> &[Hair] {
        &self.hairs
    }

    /// Return every hair to rest and forget the last update time.
    pub fn reset(&mut self) {
        for hair in &mut self.hairs {
            hair.rest();
        }
        self.last_update_ms = None;
    }

    /// Simulate up to `now_ms` and write target parameters.
    pub fn update(&mut self, params: &mut ParameterStore, input: &InputState, now_ms: u64) {
        if !self.enabled {
            return;
        }
        let elapsed_ms = match self.last_update_ms {
            Some(last) => (now_ms.saturating_sub(last) as f32).min(self.cfg.max_elapsed_ms),
            None => 0.0,
        };
        self.last_update_ms = Some(now_ms);

        let steps = (elapsed_ms / self.cfg.max_step_ms).ceil().max(0.0) as u32;
        let accel = input.accel;
        let gravity_mag = (self.gravity * (1.0 + accel[2] * self.cfg.accel_gravity_z)).max(0.0);

        for hair in &mut self.hairs {
            let mut target_anchor = hair.read_sources(params);
            target_anchor[1] += accel[1] * self.cfg.accel_offset;

            if steps > 0 {
                let dt = elapsed_ms / 1000.0 / steps as f32;
                let theta = (hair.gravity_angle_deg + accel[0] * self.cfg.accel_gravity_deg)
                    .to_radians();
                let gravity = [gravity_mag * theta.sin(), -gravity_mag * theta.cos()];
                let from = hair.anchor;
                let last_angle = hair.angle_deg;
                for i in 1..=steps {
                    let f = i as f32 / steps as f32;
                    let anchor = [
                        from[0] + (target_anchor[0] - from[0]) * f,
                        from[1] + (target_anchor[1] - from[1]) * f,
                    ];
                    hair.step(anchor, gravity, dt);
                }
                hair.angle_deg = hair.measure_angle();
                hair.angular_velocity_deg = (hair.angle_deg - last_angle) / (elapsed_ms / 1000.0);
            }
            hair.write_targets(params);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{
        PhysicsHairData, PhysicsSetupData, PhysicsSourceData, PhysicsTargetData,
    };
    use crate::params::ParameterDef;

    fn params() -> ParameterStore {
        ParameterStore::from_defs(&[
            ParameterDef::new("PARAM_ANGLE_X", -30.0, 30.0, 0.0),
            ParameterDef::new("PARAM_HAIR", -90.0, 90.0, 0.0),
        ])
        .unwrap()
    }

    fn data(length: f32) -> PhysicsData {
        PhysicsData {
            gravity: 9.8,
            physics_hair: vec![PhysicsHairData {
                comment: None,
                setup: PhysicsSetupData {
                    length,
                    regist: 2.0,
                    mass: 1.0,
                },
                src: vec![PhysicsSourceData {
                    id: "PARAM_ANGLE_X".into(),
                    ptype: PhysicsSourceKind::X,
                    scale: 0.01,
                    weight: 1.0,
                }],
                targets: vec![PhysicsTargetData {
                    id: "PARAM_HAIR".into(),
                    ptype: PhysicsTargetKind::Angle,
                    scale: 1.0,
                    weight: 1.0,
                }],
            }],
        }
    }

    #[test]
    fn zero_length_disables() {
        let physics = Physics::from_data(data(0.0), &PhysicsConfig::default(), &params());
        assert!(!physics.is_enabled());
    }

    #[test]
    fn unknown_target_disables() {
        let mut d = data(1.0);
        d.physics_hair[0].targets[0].id = "PARAM_TAIL".into();
        let physics = Physics::from_data(d, &PhysicsConfig::default(), &params());
        assert!(!physics.is_enabled());
    }

    #[test]
    fn rest_without_input() {
        let mut p = params();
        let mut physics = Physics::from_data(data(1.0), &PhysicsConfig::default(), &p);
        p.set_value("PARAM_HAIR", 12.0, 1.0);
        for t in (0..2000).step_by(16) {
            physics.update(&mut p, &InputState::default(), t);
        }
        assert!(p.value("PARAM_HAIR").unwrap().abs() < 1e-3);
    }

    #[test]
    fn disabled_update_is_noop() {
        let mut p = params();
        p.set_value("PARAM_HAIR", 12.0, 1.0);
        let mut physics = Physics::disabled(&PhysicsConfig::default());
        physics.update(&mut p, &InputState::default(), 100);
        assert_eq!(p.value("PARAM_HAIR"), Some(12.0));
    }
}
