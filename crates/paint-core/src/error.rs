//! Error taxonomy for the painter lifecycle.
//!
//! Construction-time variants are fatal and surface to the caller of
//! `Painter::initialize`. Invalid color input is never an error: it is clamped.

use crate::shader::ShaderStage;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PaintError {
    /// The host cannot provide a drawing surface or a WebGL2 context.
    #[error("Rendering context unavailable: {0}")]
    ContextUnavailable(String),

    #[error("Unable to compile {stage} shader:\n{log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("Unable to link shader program:\n{log}")]
    ShaderLink { log: String },

    /// A resize or pointer listener could not be registered.
    #[error("Unable to register {0} listener")]
    EventSubscription(String),

    #[error("Painter used after dispose")]
    UseAfterDispose,

    /// A host call re-entered while the painter was already borrowed.
    #[error("Painter is busy")]
    Busy,

    #[error("Invalid painter configuration: {0}")]
    Config(String),
}

impl PaintError {
    /// True for errors raised while bringing a painter up.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::ContextUnavailable(_)
                | Self::ShaderCompile { .. }
                | Self::ShaderLink { .. }
                | Self::EventSubscription(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_carries_stage_and_log() {
        let err = PaintError::ShaderCompile {
            stage: ShaderStage::Fragment,
            log: "ERROR: 0:3: 'colour' : undeclared identifier".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Unable to compile fragment shader"));
        assert!(msg.contains("undeclared identifier"));
        assert!(err.is_construction_error());
    }

    #[test]
    fn use_after_dispose_is_not_a_construction_error() {
        assert!(!PaintError::UseAfterDispose.is_construction_error());
    }
}
