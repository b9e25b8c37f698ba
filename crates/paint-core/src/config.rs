//! Painter configuration.
//!
//! Everything has a default; hosts override individual fields through JSON
//! (`Painter.withConfig` in the browser bridge).

use crate::color::Color;
use crate::error::PaintError;
use serde::{Deserialize, Serialize};

/// GPU adapter hint forwarded to `getContext`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowerPreference {
    Default,
    #[default]
    HighPerformance,
    LowPower,
}

/// WebGL context creation attributes.
///
/// Serializes with the attribute names `getContext` expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextOptions {
    pub alpha: bool,
    pub antialias: bool,
    pub depth: bool,
    pub power_preference: PowerPreference,
    pub preserve_drawing_buffer: bool,
    pub premultiplied_alpha: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            alpha: true,
            antialias: true,
            depth: true,
            power_preference: PowerPreference::HighPerformance,
            preserve_drawing_buffer: false,
            premultiplied_alpha: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PainterConfig {
    /// Fill used by the first render. Default: **128, 128, 128**.
    pub initial_color: Color,

    /// Normalized RGBA the surface is cleared to before each draw.
    /// Default: opaque white.
    pub clear_color: [f32; 4],

    pub context: ContextOptions,
}

impl Default for PainterConfig {
    fn default() -> Self {
        Self {
            initial_color: Color::default(),
            clear_color: [1.0, 1.0, 1.0, 1.0],
            context: ContextOptions::default(),
        }
    }
}

impl PainterConfig {
    /// Parse a (possibly partial) JSON configuration.
    ///
    /// # Errors
    /// `PaintError::Config` with the serde message on malformed input.
    pub fn from_json(json: &str) -> Result<Self, PaintError> {
        serde_json::from_str(json).map_err(|e| PaintError::Config(e.to_string()))
    }
}
