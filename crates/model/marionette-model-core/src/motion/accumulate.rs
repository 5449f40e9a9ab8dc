//! Accumulation of per-parameter contributions from the entries of one player.
//!
//! Set contributions are blended with the value already in the store:
//! `sum(w_i * v_i) + (1 - sum(w_i)) * current`, or the normalized weighted mean once the
//! total weight reaches 1. Add and multiply contributions are applied afterwards.

use hashbrown::HashMap;

use crate::params::ParameterStore;

#[derive(Clone, Debug)]
struct AccumEntry {
    set_sum: f32,
    set_w: f32,
    add_sum: f32,
    mult: f32,
}

impl Default for AccumEntry {
    fn default() -> Self {
        Self {
            set_sum: 0.0,
            set_w: 0.0,
            add_sum: 0.0,
            mult: 1.0,
        }
    }
}

/// Accumulates contributions keyed by parameter index.
#[derive(Default, Debug)]
pub struct Accumulator {
    map: HashMap<usize, AccumEntry>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn add_set(&mut self, idx: usize, value: f32, weight: f32) {
        if weight <= 0.0 {
            return;
        }
        let e = self.map.entry(idx).or_default();
        e.set_sum += value * weight;
        e.set_w += weight;
    }

    pub fn add_delta(&mut self, idx: usize, delta: f32, weight: f32) {
        if weight <= 0.0 {
            return;
        }
        self.map.entry(idx).or_default().add_sum += delta * weight;
    }

    pub fn add_factor(&mut self, idx: usize, factor: f32, weight: f32) {
        if weight <= 0.0 {
            return;
        }
        self.map.entry(idx).or_default().mult *= 1.0 + (factor - 1.0) * weight;
    }

    /// Write the blended result into the store.
    pub fn apply(self, params: &mut ParameterStore) {
        for (idx, e) in self.map {
            if e.set_w > 0.0 {
                params.set_value_at(idx, e.set_sum / e.set_w, e.set_w.min(1.0));
            }
            if e.add_sum != 0.0 {
                params.add_value_at(idx, e.add_sum, 1.0);
            }
            if e.mult != 1.0 {
                params.multiply_value_at(idx, e.mult, 1.0);
            }
        }
    }
}
