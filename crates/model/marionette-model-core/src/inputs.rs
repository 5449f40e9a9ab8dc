//! Host-supplied input values (device tilt, drag) and their parameter bindings.

use serde::{Deserialize, Serialize};

use crate::params::ParameterStore;

/// Tilt and drag values as last set by the host. Nominally in [-1, 1]; not clamped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    pub accel: [f32; 3],
    pub drag: [f32; 2],
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    DragX,
    DragY,
    /// Product of both drag axes; tilts the head along the diagonal.
    DragXy,
    AccelX,
    AccelY,
    AccelZ,
}

impl InputSource {
    #[inline]
    pub fn read(self, state: &InputState) -> f32 {
        match self {
            InputSource::DragX => state.drag[0],
            InputSource::DragY => state.drag[1],
            InputSource::DragXy => state.drag[0] * state.drag[1],
            InputSource::AccelX => state.accel[0],
            InputSource::AccelY => state.accel[1],
            InputSource::AccelZ => state.accel[2],
        }
    }
}

/// Adds `source * scale` to `param` every frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputBinding {
    pub param: String,
    pub source: InputSource,
    pub scale: f32,
}

impl InputBinding {
    pub fn new(param: impl Into<String>, source: InputSource, scale: f32) -> Self {
        Self {
            param: param.into(),
            source,
            scale,
        }
    }
}

pub(crate) fn default_input_bindings() -> Vec<InputBinding> {
    vec![
        InputBinding::new("PARAM_ANGLE_X", InputSource::DragX, 30.0),
        InputBinding::new("PARAM_ANGLE_Y", InputSource::DragY, 30.0),
        InputBinding::new("PARAM_ANGLE_Z", InputSource::DragXy, -30.0),
        InputBinding::new("PARAM_BODY_ANGLE_X", InputSource::DragX, 10.0),
        InputBinding::new("PARAM_EYE_BALL_X", InputSource::DragX, 1.0),
        InputBinding::new("PARAM_EYE_BALL_Y", InputSource::DragY, 1.0),
        InputBinding::new("PARAM_ANGLE_Z", InputSource::AccelX, 10.0),
    ]
}

/// Apply all bindings additively. Bindings to parameters the model lacks are skipped.
pub fn apply_input_bindings(
    params: &mut ParameterStore,
    state: &InputState,
    bindings: &[InputBinding],
) {
    for binding in bindings {
        let value = binding.source.read(state) * binding.scale;
        if value != 0.0 {
            params.add_value(&binding.param, value, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParameterDef;

    #[test]
    fn drag_offsets_are_additive_and_skip_unknown() {
        let mut params = ParameterStore::from_defs(&[
            ParameterDef::new("PARAM_ANGLE_X", -30.0, 30.0, 0.0),
            ParameterDef::new("PARAM_ANGLE_Z", -30.0, 30.0, 0.0),
        ])
        .unwrap();
        params.set_value("PARAM_ANGLE_X", 5.0, 1.0);

        let state = InputState {
            accel: [0.0; 3],
            drag: [0.5, -1.0],
        };
        apply_input_bindings(&mut params, &state, &default_input_bindings());

        assert_eq!(params.value("PARAM_ANGLE_X"), Some(20.0));
        // drag_xy = -0.5, scale -30
        assert_eq!(params.value("PARAM_ANGLE_Z"), Some(15.0));
        assert_eq!(params.value("PARAM_EYE_BALL_X"), None);
    }
}
