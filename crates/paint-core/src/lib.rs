//! Platform-independent core of the WebGL2 painter.
//!
//! GPU access goes through [`GlBackend`], the drawing surface and its host
//! element through [`Surface`] and [`Container`]. The browser bridge lives in
//! `paint-wasm`. The `headless` feature adds a recording backend for tests.

pub mod backend;
pub mod brush;
pub mod buffer;
pub mod color;
pub mod config;
pub mod error;
pub mod events;
#[cfg(any(test, feature = "headless"))]
pub mod headless;
pub mod painter;
pub mod shader;
pub mod surface;

pub use backend::GlBackend;
pub use brush::Brush;
pub use color::{Color, ColorUniform};
pub use config::{ContextOptions, PainterConfig, PowerPreference};
pub use error::PaintError;
pub use events::{EventKind, PointerState, SurfaceEvent};
pub use painter::Painter;
pub use shader::{ShaderProgram, ShaderProgramBuilder, ShaderStage};
pub use surface::{CanvasHost, Container, Surface, Viewport};
