//! Model handle: parameter table, parts, drawables and texture slots.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::assets::ModelData;
use crate::error::ModelError;
use crate::ids::TextureId;
use crate::params::ParameterStore;

/// Axis-aligned rectangle in canvas space. `top` is the smaller y.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Rect {
    /// Bounds of a point list, or `None` when it is empty.
    pub fn from_points(points: &[[f32; 2]]) -> Option<Self> {
        let first = points.first()?;
        let mut rect = Rect {
            left: first[0],
            right: first[0],
            top: first[1],
            bottom: first[1],
        };
        for p in &points[1..] {
            rect.left = rect.left.min(p[0]);
            rect.right = rect.right.max(p[0]);
            rect.top = rect.top.min(p[1]);
            rect.bottom = rect.bottom.max(p[1]);
        }
        Some(rect)
    }

    /// Inclusive containment.
    #[inline]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        self.left <= x && x <= self.right && self.top <= y && y <= self.bottom
    }

    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }
}

/// A drawable region. Points are in canvas space, as last transformed by the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct Drawable {
    pub id: String,
    pub part: Option<String>,
    pub points: Vec<[f32; 2]>,
}

#[derive(Clone, Debug)]
pub struct Model {
    canvas_width: f32,
    canvas_height: f32,
    params: ParameterStore,
    drawables: Vec<Drawable>,
    drawable_index: HashMap<String, usize>,
    textures: HashMap<usize, TextureId>,
}

impl Model {
    /// Build a model from decoded data, checking ids and canvas size.
    pub fn from_data(data: ModelData) -> Result<Self, ModelError> {
        if !(data.canvas_width > 0.0 && data.canvas_height > 0.0) {
            return Err(ModelError::invalid(format!(
                "canvas must be positive, got {}x{}",
                data.canvas_width, data.canvas_height
            )));
        }
        let params = ParameterStore::from_defs(&data.parameters)?.with_parts(&data.parts)?;

        let mut drawables = Vec::with_capacity(data.drawables.len());
        let mut drawable_index = HashMap::with_capacity(data.drawables.len());
        for d in data.drawables {
            if let Some(part) = &d.part {
                if !params.contains_part(part) {
                    return Err(ModelError::UnknownPart {
                        asset: format!("drawable '{}'", d.id),
                        id: part.clone(),
                    });
                }
            }
            if drawable_index.contains_key(&d.id) {
                return Err(ModelError::invalid(format!(
                    "duplicate drawable id '{}'",
                    d.id
                )));
            }
            drawable_index.insert(d.id.clone(), drawables.len());
            drawables.push(Drawable {
                id: d.id,
                part: d.part,
                points: d.points,
            });
        }

        Ok(Self {
            canvas_width: data.canvas_width,
            canvas_height: data.canvas_height,
            params,
            drawables,
            drawable_index,
            textures: HashMap::new(),
        })
    }

    #[inline]
    pub fn canvas_width(&self) -> f32 {
        self.canvas_width
    }

    #[inline]
    pub fn canvas_height(&self) -> f32 {
        self.canvas_height
    }

    #[inline]
    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    #[inline]
    pub fn params_mut(&mut self) -> &mut ParameterStore {
        &mut self.params
    }

    pub fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    pub fn drawable_index(&self, id: &str) -> Option<usize> {
        self.drawable_index.get(id).copied()
    }

    pub fn drawable(&self, id: &str) -> Option<&Drawable> {
        self.drawable_index(id).map(|i| &self.drawables[i])
    }

    pub fn transformed_points(&self, idx: usize) -> Option<&[[f32; 2]]> {
        self.drawables.get(idx).map(|d| d.points.as_slice())
    }

    /// Renderer hook: replace a drawable's transformed points after deformation.
    pub fn set_transformed_points(&mut self, id: &str, points: Vec<[f32; 2]>) -> bool {
        match self.drawable_index(id) {
            Some(i) => {
                self.drawables[i].points = points;
                true
            }
            None => false,
        }
    }

    /// A drawable is visible unless its owning part is at zero opacity.
    pub fn is_drawable_visible(&self, id: &str) -> bool {
        match self.drawable(id) {
            Some(d) => d
                .part
                .as_deref()
                .map_or(true, |p| self.params.is_part_visible(p)),
            None => false,
        }
    }

    pub fn bind_texture(&mut self, slot: usize, texture: TextureId) {
        self.textures.insert(slot, texture);
    }

    pub fn texture(&self, slot: usize) -> Option<TextureId> {
        self.textures.get(&slot).copied()
    }
}
