//! ModelMatrix: canvas space to logical viewport.
//!
//! Stored as a column-major 4x4 so it can be handed to a renderer as-is; only the
//! scale (`tr[0]`, `tr[5]`) and translation (`tr[12]`, `tr[13]`) terms are ever non-identity.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelMatrix {
    tr: [f32; 16],
    width: f32,
    height: f32,
}

const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

impl ModelMatrix {
    /// Identity transform for a canvas of `width` x `height`.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            tr: IDENTITY,
            width,
            height,
        }
    }

    /// Fit the canvas so its longer axis spans [-1, 1], centered on the origin.
    pub fn fit_canvas(width: f32, height: f32) -> Self {
        let mut m = Self::new(width, height);
        if width > height {
            m.set_width(2.0);
        } else {
            m.set_height(2.0);
        }
        m.set_center_position(0.0, 0.0);
        m
    }

    #[inline]
    pub fn array(&self) -> &[f32; 16] {
        &self.tr
    }

    #[inline]
    pub fn canvas_width(&self) -> f32 {
        self.width
    }

    #[inline]
    pub fn canvas_height(&self) -> f32 {
        self.height
    }

    #[inline]
    pub fn scale_x(&self) -> f32 {
        self.tr[0]
    }

    #[inline]
    pub fn scale_y(&self) -> f32 {
        self.tr[5]
    }

    #[inline]
    pub fn translate_x(&self) -> f32 {
        self.tr[12]
    }

    #[inline]
    pub fn translate_y(&self) -> f32 {
        self.tr[13]
    }

    #[inline]
    pub fn transform_x(&self, src: f32) -> f32 {
        self.tr[0] * src + self.tr[12]
    }

    #[inline]
    pub fn transform_y(&self, src: f32) -> f32 {
        self.tr[5] * src + self.tr[13]
    }

    #[inline]
    pub fn invert_transform_x(&self, src: f32) -> f32 {
        (src - self.tr[12]) / self.tr[0]
    }

    #[inline]
    pub fn invert_transform_y(&self, src: f32) -> f32 {
        (src - self.tr[13]) / self.tr[5]
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.tr[0] = sx;
        self.tr[5] = sy;
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.tr[12] = x;
        self.tr[13] = y;
    }

    pub fn multiply_scale(&mut self, factor: f32) {
        self.tr[0] *= factor;
        self.tr[5] *= factor;
        self.tr[12] *= factor;
        self.tr[13] *= factor;
    }

    /// Uniform scale so the canvas is `w` wide in viewport units.
    pub fn set_width(&mut self, w: f32) {
        let s = w / self.width;
        self.scale(s, s);
    }

    /// Uniform scale so the canvas is `h` tall in viewport units.
    pub fn set_height(&mut self, h: f32) {
        let s = h / self.height;
        self.scale(s, s);
    }

    /// Place the canvas' top-left corner.
    pub fn set_position(&mut self, x: f32, y: f32) {
        self.translate(x, y);
    }

    pub fn set_center_position(&mut self, x: f32, y: f32) {
        self.set_center_x(x);
        self.set_center_y(y);
    }

    pub fn set_x(&mut self, x: f32) {
        self.tr[12] = x;
    }

    pub fn set_y(&mut self, y: f32) {
        self.tr[13] = y;
    }

    pub fn set_center_x(&mut self, x: f32) {
        let w = self.width * self.scale_x();
        self.tr[12] = x - w / 2.0;
    }

    pub fn set_center_y(&mut self, y: f32) {
        let h = self.height * self.scale_y();
        self.tr[13] = y - h / 2.0;
    }

    pub fn set_left(&mut self, x: f32) {
        self.set_x(x);
    }

    pub fn set_right(&mut self, x: f32) {
        let w = self.width * self.scale_x();
        self.tr[12] = x - w;
    }

    pub fn set_top(&mut self, y: f32) {
        self.set_y(y);
    }

    pub fn set_bottom(&mut self, y: f32) {
        let h = self.height * self.scale_y();
        self.tr[13] = y - h;
    }
}
