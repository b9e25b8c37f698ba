//! Fill color as supplied by the host, and its GPU-side uniform.
//!
//! Hosts speak 8-bit channels (`0..=255`) with an optional alpha already in
//! `0.0..=1.0`. The shader wants every component in `0.0..=1.0`.

use crate::backend::GlBackend;
use serde::{Deserialize, Serialize};

/// A host color: RGB in `0..=255`, alpha in `0.0..=1.0`.
///
/// Values are not validated here; [`ColorUniform::set`] clamps them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    /// `None` means opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<f32>,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: None }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a: Some(a) }
    }

    /// Build from a `[r, g, b]` or `[r, g, b, a]` slice (a JS `Float32Array`).
    pub fn from_slice(components: &[f32]) -> Option<Self> {
        match *components {
            [r, g, b] => Some(Self::rgb(r, g, b)),
            [r, g, b, a] => Some(Self::rgba(r, g, b, a)),
            _ => None,
        }
    }
}

impl Default for Color {
    /// Mid gray, the painter's initial fill.
    fn default() -> Self {
        Self::rgb(128.0, 128.0, 128.0)
    }
}

// ─── Normalization ────────────────────────────────────────────────────────

fn normalize_channel(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 255.0) / 255.0
}

fn clamp_alpha(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

// ─── Uniform ──────────────────────────────────────────────────────────────

/// The current fill color, normalized, plus the cached `color` location.
///
/// Every stored component is in `0.0..=1.0`.
#[derive(Debug, Clone)]
pub struct ColorUniform<L> {
    value: [f32; 4],
    location: Option<L>,
}

impl<L: Clone> ColorUniform<L> {
    /// `location` is resolved once from the linked program. A program that
    /// optimized the uniform away yields `None` and uploads become no-ops.
    pub fn new(location: Option<L>, initial: Color) -> Self {
        let mut uniform = Self {
            value: [0.0, 0.0, 0.0, 1.0],
            location,
        };
        uniform.set_color(initial);
        uniform
    }

    /// Store `rgb / 255` and `alpha` (opaque when omitted), clamping
    /// out-of-range and NaN input.
    pub fn set(&mut self, rgb: [f32; 3], alpha: Option<f32>) {
        let [r, g, b] = rgb.map(normalize_channel);
        let a = alpha.map_or(1.0, clamp_alpha);
        self.value = [r, g, b, a];
        log::trace!("color uniform = {:?}", self.value);
    }

    pub fn set_color(&mut self, color: Color) {
        self.set([color.r, color.g, color.b], color.a);
    }

    pub fn value(&self) -> [f32; 4] {
        self.value
    }

    pub fn rgb(&self) -> [f32; 3] {
        [self.value[0], self.value[1], self.value[2]]
    }

    /// Write the vector to the program currently in use.
    pub fn upload<G>(&self, gl: &mut G)
    where
        G: GlBackend<UniformLocation = L>,
    {
        match &self.location {
            Some(location) => gl.uniform4f(location, self.value),
            None => log::trace!("color uniform inactive, upload skipped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn uniform(color: Color) -> ColorUniform<u32> {
        ColorUniform::new(Some(0), color)
    }

    #[test]
    fn rgb_is_divided_by_255() {
        for value in [0u8, 1, 17, 64, 128, 200, 254, 255] {
            let v = value as f32;
            let u = uniform(Color::rgb(v, 255.0 - v, v / 2.0));
            assert_eq!(
                u.rgb(),
                [v / 255.0, (255.0 - v) / 255.0, (v / 2.0) / 255.0]
            );
        }
    }

    #[test]
    fn alpha_passes_through_untouched() {
        let u = uniform(Color::rgba(0.0, 0.0, 0.0, 0.25));
        assert_eq!(u.value()[3], 0.25);
    }

    #[test]
    fn omitted_alpha_is_opaque() {
        let u = uniform(Color::rgb(10.0, 20.0, 30.0));
        assert_eq!(u.value()[3], 1.0);
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        let u = uniform(Color::rgba(-40.0, 300.0, f32::NAN, 7.5));
        assert_eq!(u.value(), [0.0, 1.0, 0.0, 1.0]);

        let u = uniform(Color::rgba(f32::INFINITY, f32::NEG_INFINITY, 0.0, f32::NAN));
        assert_eq!(u.value(), [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn from_slice_accepts_three_or_four_components() {
        assert_eq!(
            Color::from_slice(&[255.0, 0.0, 0.0]),
            Some(Color::rgb(255.0, 0.0, 0.0))
        );
        assert_eq!(
            Color::from_slice(&[0.0, 255.0, 0.0, 0.5]),
            Some(Color::rgba(0.0, 255.0, 0.0, 0.5))
        );
        assert_eq!(Color::from_slice(&[1.0, 0.0]), None);
        assert_eq!(Color::from_slice(&[]), None);
    }

    #[test]
    fn color_deserializes_without_alpha() {
        let color: Color = serde_json::from_str(r#"{"r":1,"g":2,"b":3}"#).unwrap();
        assert_eq!(color, Color::rgb(1.0, 2.0, 3.0));
    }
}
