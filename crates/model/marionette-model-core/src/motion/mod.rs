//! Motions: immutable parameter animations, and the player that cross-fades them.
//!
//! A [`Motion`] is either a keyframed standard motion or an expression. The variant is
//! fixed at load time; the player only asks it for its fades, its local time and its
//! contributions.

pub mod accumulate;
pub mod player;
pub mod sampling;

use serde::{Deserialize, Serialize};

use crate::assets::{ExpressionCalc, ExpressionData, Keyframe, MotionData};
use crate::error::ModelError;
use crate::params::ParameterStore;

use accumulate::Accumulator;
use sampling::sample_curve;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionKind {
    Standard,
    Expression,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MotionCurve {
    pub param: String,
    pub keys: Vec<Keyframe>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StandardMotion {
    pub curves: Vec<MotionCurve>,
    pub duration_ms: f32,
    pub looping: bool,
    pub fade_in_ms: f32,
    pub fade_out_ms: Option<f32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExpressionTarget {
    pub param: String,
    /// Already converted: the delta for `Add`, the factor for `Mult`, the target for `Set`.
    pub value: f32,
    pub calc: ExpressionCalc,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExpressionMotion {
    pub targets: Vec<ExpressionTarget>,
    pub fade_in_ms: f32,
    pub fade_out_ms: Option<f32>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Motion {
    Standard(StandardMotion),
    Expression(ExpressionMotion),
}

fn check_fade(name: &str, v: Option<f32>) -> Result<(), ModelError> {
    match v {
        Some(ms) if !ms.is_finite() || ms < 0.0 => Err(ModelError::invalid(format!(
            "{name} must be finite and >= 0, got {ms}"
        ))),
        _ => Ok(()),
    }
}

impl Motion {
    /// Build a standard motion, checking key times are finite, non-negative and non-decreasing.
    pub fn standard_from_data(data: MotionData) -> Result<Self, ModelError> {
        check_fade("fade_in_ms", data.fade_in_ms)?;
        check_fade("fade_out_ms", data.fade_out_ms)?;

        let mut last_key = 0.0f32;
        for curve in &data.curves {
            let mut prev = f32::NEG_INFINITY;
            for k in &curve.keys {
                if !k.time_ms.is_finite() || k.time_ms < 0.0 || !k.value.is_finite() {
                    return Err(ModelError::invalid(format!(
                        "key on '{}' must be finite with t >= 0",
                        curve.param
                    )));
                }
                if k.time_ms < prev {
                    return Err(ModelError::invalid(format!(
                        "key times must be non-decreasing on '{}'",
                        curve.param
                    )));
                }
                prev = k.time_ms;
            }
            if let Some(k) = curve.keys.last() {
                last_key = last_key.max(k.time_ms);
            }
        }

        let duration_ms = match data.duration_ms {
            Some(d) if !d.is_finite() || d < 0.0 => {
                return Err(ModelError::invalid(format!(
                    "duration_ms must be finite and >= 0, got {d}"
                )))
            }
            Some(d) => d,
            None => last_key,
        };

        Ok(Motion::Standard(StandardMotion {
            curves: data
                .curves
                .into_iter()
                .map(|c| MotionCurve {
                    param: c.param,
                    keys: c.keys,
                })
                .collect(),
            duration_ms,
            looping: data.looping,
            fade_in_ms: data.fade_in_ms.unwrap_or(0.0),
            fade_out_ms: data.fade_out_ms,
        }))
    }

    /// Build an expression. `add` stores `val - def`, `mult` stores `val / def`
    /// (`def` defaults to 0 and 1 respectively; a zero `def` for `mult` counts as 1).
    pub fn expression_from_data(data: ExpressionData) -> Result<Self, ModelError> {
        check_fade("fade_in_ms", data.fade_in_ms)?;
        check_fade("fade_out_ms", data.fade_out_ms)?;

        let mut targets = Vec::with_capacity(data.params.len());
        for p in data.params {
            if !p.val.is_finite() {
                return Err(ModelError::invalid(format!(
                    "expression value for '{}' must be finite",
                    p.id
                )));
            }
            let value = match p.calc {
                ExpressionCalc::Add => p.val - p.def.unwrap_or(0.0),
                ExpressionCalc::Mult => match p.def {
                    Some(d) if d != 0.0 => p.val / d,
                    _ => p.val,
                },
                ExpressionCalc::Set => p.val,
            };
            targets.push(ExpressionTarget {
                param: p.id,
                value,
                calc: p.calc,
            });
        }
        Ok(Motion::Expression(ExpressionMotion {
            targets,
            fade_in_ms: data.fade_in_ms.unwrap_or(0.0),
            fade_out_ms: data.fade_out_ms,
        }))
    }

    pub fn kind(&self) -> MotionKind {
        match self {
            Motion::Standard(_) => MotionKind::Standard,
            Motion::Expression(_) => MotionKind::Expression,
        }
    }

    pub fn fade_in_ms(&self) -> f32 {
        match self {
            Motion::Standard(m) => m.fade_in_ms,
            Motion::Expression(e) => e.fade_in_ms,
        }
    }

    /// Declared fade-out; `None` defers to the player's default.
    pub fn fade_out_ms(&self) -> Option<f32> {
        match self {
            Motion::Standard(m) => m.fade_out_ms,
            Motion::Expression(e) => e.fade_out_ms,
        }
    }

    /// `None` for expressions, which hold until replaced.
    pub fn duration_ms(&self) -> Option<f32> {
        match self {
            Motion::Standard(m) => Some(m.duration_ms),
            Motion::Expression(_) => None,
        }
    }

    pub fn is_looping(&self) -> bool {
        matches!(self, Motion::Standard(m) if m.looping)
    }

    /// A motion that writes nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Motion::Standard(m) => m.curves.iter().all(|c| c.keys.is_empty()),
            Motion::Expression(e) => e.targets.is_empty(),
        }
    }

    pub fn param_ids(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            Motion::Standard(m) => Box::new(m.curves.iter().map(|c| c.param.as_str())),
            Motion::Expression(e) => Box::new(e.targets.iter().map(|t| t.param.as_str())),
        }
    }

    /// Fail with `UnknownParameter` if the motion writes an id the model lacks.
    pub fn check_params(&self, params: &ParameterStore, asset: &str) -> Result<(), ModelError> {
        match self.param_ids().find(|id| !params.contains(id)) {
            Some(id) => Err(ModelError::UnknownParameter {
                asset: asset.to_string(),
                id: id.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Map elapsed playback time to the motion's local cursor.
    /// Returns `(local_ms, finished)`; looping motions never finish.
    pub fn local_time(&self, elapsed_ms: f32) -> (f32, bool) {
        match self {
            Motion::Standard(m) => {
                if m.looping {
                    if m.duration_ms > 0.0 {
                        (elapsed_ms % m.duration_ms, false)
                    } else {
                        (0.0, false)
                    }
                } else {
                    (elapsed_ms.min(m.duration_ms), elapsed_ms >= m.duration_ms)
                }
            }
            Motion::Expression(_) => (elapsed_ms, false),
        }
    }

    /// Push this motion's contributions at `local_ms` with blend weight `weight`.
    /// Ids missing from `params` are skipped.
    pub fn contribute(
        &self,
        params: &ParameterStore,
        local_ms: f32,
        weight: f32,
        acc: &mut Accumulator,
    ) {
        match self {
            Motion::Standard(m) => {
                for curve in &m.curves {
                    if curve.keys.is_empty() {
                        continue;
                    }
                    if let Some(idx) = params.index_of(&curve.param) {
                        acc.add_set(idx, sample_curve(&curve.keys, local_ms), weight);
                    }
                }
            }
            Motion::Expression(e) => {
                for t in &e.targets {
                    let Some(idx) = params.index_of(&t.param) else {
                        continue;
                    };
                    match t.calc {
                        ExpressionCalc::Add => acc.add_delta(idx, t.value, weight),
                        ExpressionCalc::Mult => acc.add_factor(idx, t.value, weight),
                        ExpressionCalc::Set => acc.add_set(idx, t.value, weight),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{CurveData, ExpressionParamData};

    fn ramp(looping: bool) -> Motion {
        Motion::standard_from_data(MotionData {
            looping,
            curves: vec![CurveData {
                param: "PARAM_ANGLE_X".into(),
                keys: vec![Keyframe::new(0.0, 0.0), Keyframe::new(1000.0, 10.0)],
            }],
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn duration_defaults_to_last_key() {
        let m = ramp(false);
        assert_eq!(m.duration_ms(), Some(1000.0));
        assert_eq!(m.kind(), MotionKind::Standard);
        assert_eq!(m.fade_in_ms(), 0.0);
        assert_eq!(m.fade_out_ms(), None);
    }

    #[test]
    fn local_time_clamps_or_wraps() {
        assert_eq!(ramp(false).local_time(1500.0), (1000.0, true));
        assert_eq!(ramp(false).local_time(999.0), (999.0, false));
        assert_eq!(ramp(true).local_time(1500.0), (500.0, false));
    }

    #[test]
    fn unsorted_keys_are_rejected() {
        let err = Motion::standard_from_data(MotionData {
            curves: vec![CurveData {
                param: "P".into(),
                keys: vec![Keyframe::new(10.0, 0.0), Keyframe::new(5.0, 1.0)],
            }],
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidAsset { .. }));
    }

    #[test]
    fn expression_values_are_relative_to_def() {
        let m = Motion::expression_from_data(ExpressionData {
            params: vec![
                ExpressionParamData {
                    id: "A".into(),
                    val: 0.8,
                    def: Some(0.5),
                    calc: ExpressionCalc::Add,
                },
                ExpressionParamData {
                    id: "B".into(),
                    val: 0.5,
                    def: Some(0.0),
                    calc: ExpressionCalc::Mult,
                },
            ],
            ..Default::default()
        })
        .unwrap();
        let Motion::Expression(e) = &m else {
            panic!("expected expression");
        };
        assert!((e.targets[0].value - 0.3).abs() < 1e-6);
        assert_eq!(e.targets[1].value, 0.5);
        assert_eq!(m.duration_ms(), None);
        assert_eq!(m.local_time(1e9), (1e9, false));
    }

    #[test]
    fn empty_motions() {
        assert!(Motion::standard_from_data(MotionData::default())
            .unwrap()
            .is_empty());
        assert!(!ramp(false).is_empty());
    }
}
