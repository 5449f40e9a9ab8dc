//! ParameterStore: the model's named-parameter vector and part-opacity canvas.
//!
//! Every component of the frame pipeline writes through this store. Writers address
//! parameters by id; unknown ids are reported through the return value and never panic.
//! Asset loaders check ids up front, so a miss at runtime only happens for optional
//! bindings (eye blink, lip-sync, input offsets) on models that lack those parameters.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Declaration of one model parameter.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ParameterDef {
    pub id: String,
    #[serde(default = "ParameterDef::default_min")]
    pub min: f32,
    #[serde(default = "ParameterDef::default_max")]
    pub max: f32,
    #[serde(default)]
    pub default: f32,
}

impl ParameterDef {
    pub fn new(id: impl Into<String>, min: f32, max: f32, default: f32) -> Self {
        Self {
            id: id.into(),
            min,
            max,
            default,
        }
    }

    fn default_min() -> f32 {
        -1.0
    }

    fn default_max() -> f32 {
        1.0
    }
}

/// Declaration of one model part (a group of drawables toggled together).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PartDef {
    pub id: String,
    #[serde(default = "PartDef::default_opacity")]
    pub opacity: f32,
}

impl PartDef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            opacity: 1.0,
        }
    }

    fn default_opacity() -> f32 {
        1.0
    }
}

#[derive(Clone, Debug, Default)]
pub struct ParameterStore {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    values: Vec<f32>,
    mins: Vec<f32>,
    maxs: Vec<f32>,
    defaults: Vec<f32>,
    saved: Vec<f32>,

    part_ids: Vec<String>,
    part_index: HashMap<String, usize>,
    part_opacity: Vec<f32>,
}

impl ParameterStore {
    /// Build a store from parameter declarations. Values start at their defaults.
    pub fn from_defs(defs: &[ParameterDef]) -> Result<Self, ModelError> {
        let mut store = Self::default();
        for def in defs {
            if store.index.contains_key(&def.id) {
                return Err(ModelError::invalid(format!(
                    "duplicate parameter id '{}'",
                    def.id
                )));
            }
            if def.min.is_nan() || def.max.is_nan() || def.min > def.max {
                return Err(ModelError::invalid(format!(
                    "parameter '{}' has min {} > max {}",
                    def.id, def.min, def.max
                )));
            }
            let default = def.default.clamp(def.min, def.max);
            store.index.insert(def.id.clone(), store.ids.len());
            store.ids.push(def.id.clone());
            store.values.push(default);
            store.mins.push(def.min);
            store.maxs.push(def.max);
            store.defaults.push(default);
        }
        store.saved = store.values.clone();
        Ok(store)
    }

    /// Register the part table.
    pub fn with_parts(mut self, parts: &[PartDef]) -> Result<Self, ModelError> {
        for part in parts {
            if self.part_index.contains_key(&part.id) {
                return Err(ModelError::invalid(format!(
                    "duplicate part id '{}'",
                    part.id
                )));
            }
            self.part_index.insert(part.id.clone(), self.part_ids.len());
            self.part_ids.push(part.id.clone());
            self.part_opacity.push(part.opacity.clamp(0.0, 1.0));
        }
        Ok(self)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn value(&self, id: &str) -> Option<f32> {
        self.index_of(id).map(|i| self.values[i])
    }

    pub fn default_value(&self, id: &str) -> Option<f32> {
        self.index_of(id).map(|i| self.defaults[i])
    }

    pub fn range(&self, id: &str) -> Option<(f32, f32)> {
        self.index_of(id).map(|i| (self.mins[i], self.maxs[i]))
    }

    #[inline]
    fn clamp_at(&self, idx: usize, v: f32) -> f32 {
        v.clamp(self.mins[idx], self.maxs[idx])
    }

    /// `current + (value - current) * weight`; weight 1 overrides.
    pub fn set_value(&mut self, id: &str, value: f32, weight: f32) -> bool {
        match self.index_of(id) {
            Some(i) => {
                self.set_value_at(i, value, weight);
                true
            }
            None => false,
        }
    }

    /// `current + value * weight`
    pub fn add_value(&mut self, id: &str, value: f32, weight: f32) -> bool {
        match self.index_of(id) {
            Some(i) => {
                self.add_value_at(i, value, weight);
                true
            }
            None => false,
        }
    }

    /// `current * (1 + (value - 1) * weight)`
    pub fn multiply_value(&mut self, id: &str, value: f32, weight: f32) -> bool {
        match self.index_of(id) {
            Some(i) => {
                self.multiply_value_at(i, value, weight);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn value_at(&self, idx: usize) -> f32 {
        self.values[idx]
    }

    #[inline]
    pub fn set_value_at(&mut self, idx: usize, value: f32, weight: f32) {
        let cur = self.values[idx];
        let next = if weight >= 1.0 {
            value
        } else {
            cur + (value - cur) * weight
        };
        self.values[idx] = self.clamp_at(idx, next);
    }

    #[inline]
    pub fn add_value_at(&mut self, idx: usize, value: f32, weight: f32) {
        let next = self.values[idx] + value * weight;
        self.values[idx] = self.clamp_at(idx, next);
    }

    #[inline]
    pub fn multiply_value_at(&mut self, idx: usize, value: f32, weight: f32) {
        let next = self.values[idx] * (1.0 + (value - 1.0) * weight);
        self.values[idx] = self.clamp_at(idx, next);
    }

    pub fn reset_to_defaults(&mut self) {
        self.values.copy_from_slice(&self.defaults);
    }

    /// Snapshot current values; restored by [`ParameterStore::load_saved`].
    pub fn save(&mut self) {
        self.saved.copy_from_slice(&self.values);
    }

    pub fn load_saved(&mut self) {
        self.values.copy_from_slice(&self.saved);
    }

    // ---- parts ----

    #[inline]
    pub fn part_index_of(&self, id: &str) -> Option<usize> {
        self.part_index.get(id).copied()
    }

    #[inline]
    pub fn contains_part(&self, id: &str) -> bool {
        self.part_index.contains_key(id)
    }

    pub fn part_ids(&self) -> impl Iterator<Item = &str> {
        self.part_ids.iter().map(String::as_str)
    }

    pub fn part_opacity(&self, id: &str) -> Option<f32> {
        self.part_index_of(id).map(|i| self.part_opacity[i])
    }

    pub fn set_part_opacity(&mut self, id: &str, opacity: f32) -> bool {
        match self.part_index_of(id) {
            Some(i) => {
                self.part_opacity[i] = opacity.clamp(0.0, 1.0);
                true
            }
            None => false,
        }
    }

    /// Parts at zero opacity are neither drawn nor hit-tested. Unknown parts count as visible.
    pub fn is_part_visible(&self, id: &str) -> bool {
        self.part_opacity(id).map_or(true, |o| o > 0.0)
    }
}
