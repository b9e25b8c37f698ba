//! Shader sources and the compile → link pipeline.
//!
//! A failed step deletes every object it created before returning, so a
//! failed build leaves no GPU handle behind.

use crate::backend::GlBackend;
use crate::error::PaintError;
use std::collections::HashMap;
use std::fmt;

/// Name of the fill color uniform in [`FRAGMENT_SHADER_SRC`].
pub const COLOR_UNIFORM: &str = "color";

/// Name of the vertex position attribute in [`VERTEX_SHADER_SRC`].
pub const POSITION_ATTRIBUTE: &str = "position";

pub const VERTEX_SHADER_SRC: &str = r#"#version 300 es

#ifdef GL_FRAGMENT_PRECISION_HIGH
    precision highp float;
#else
    precision mediump float;
#endif

in vec4 position;
void main() {
    gl_Position = position;
}
"#;

pub const FRAGMENT_SHADER_SRC: &str = r#"#version 300 es

#ifdef GL_FRAGMENT_PRECISION_HIGH
    precision highp float;
#else
    precision mediump float;
#endif

uniform vec4 color;
out vec4 out_color;
void main() {
    out_color = color;
}
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

// ─── Linked program ──────────────────────────────────────────────────────

/// A linked program with its two shaders and resolved locations.
///
/// Immutable after [`ShaderProgramBuilder::build`]. Released explicitly via
/// [`ShaderProgram::release`]; dropping it does not touch the GPU.
pub struct ShaderProgram<G: GlBackend> {
    vertex: G::Shader,
    fragment: G::Shader,
    program: G::Program,
    uniforms: HashMap<String, G::UniformLocation>,
    position: u32,
}

impl<G: GlBackend> ShaderProgram<G> {
    pub fn uniform(&self, name: &str) -> Option<&G::UniformLocation> {
        self.uniforms.get(name)
    }

    /// Location of the `position` attribute.
    pub fn position_attribute(&self) -> u32 {
        self.position
    }

    pub fn bind(&self, gl: &mut G) {
        gl.use_program(Some(&self.program));
    }

    /// Detach and delete both shaders, then delete the program.
    pub fn release(&self, gl: &mut G) {
        gl.detach_shader(&self.program, &self.vertex);
        gl.detach_shader(&self.program, &self.fragment);
        gl.delete_shader(&self.vertex);
        gl.delete_shader(&self.fragment);
        gl.delete_program(&self.program);
        log::debug!("shader program released");
    }
}

// ─── Builder ─────────────────────────────────────────────────────────────

pub struct ShaderProgramBuilder<'a, G: GlBackend> {
    gl: &'a mut G,
}

impl<'a, G: GlBackend> ShaderProgramBuilder<'a, G> {
    pub fn new(gl: &'a mut G) -> Self {
        Self { gl }
    }

    /// Compile `source` as a `stage` shader.
    ///
    /// # Errors
    /// `PaintError::ShaderCompile` with the compiler's info log. The failed
    /// shader object is deleted.
    pub fn compile(&mut self, source: &str, stage: ShaderStage) -> Result<G::Shader, PaintError> {
        let shader = self
            .gl
            .create_shader(stage)
            .ok_or_else(|| PaintError::ShaderCompile {
                stage,
                log: "Unable to create shader object".to_string(),
            })?;
        self.gl.shader_source(&shader, source);
        self.gl.compile_shader(&shader);

        if self.gl.shader_compiled(&shader) {
            log::debug!("{stage} shader compiled");
            return Ok(shader);
        }

        let log = self
            .gl
            .shader_info_log(&shader)
            .filter(|log| !log.trim().is_empty())
            .unwrap_or_else(|| "Unknown error creating shader".to_string());
        self.gl.delete_shader(&shader);
        Err(PaintError::ShaderCompile { stage, log })
    }

    /// Link a vertex and a fragment shader into a program.
    ///
    /// # Errors
    /// `PaintError::ShaderLink` with the linker's info log. The program
    /// object is deleted; the shaders are left to the caller.
    pub fn link(
        &mut self,
        vertex: &G::Shader,
        fragment: &G::Shader,
    ) -> Result<G::Program, PaintError> {
        let program = self
            .gl
            .create_program()
            .ok_or_else(|| PaintError::ShaderLink {
                log: "Unable to create program object".to_string(),
            })?;
        self.gl.attach_shader(&program, vertex);
        self.gl.attach_shader(&program, fragment);
        self.gl.link_program(&program);

        if self.gl.program_linked(&program) {
            log::debug!("shader program linked");
            return Ok(program);
        }

        let log = self
            .gl
            .program_info_log(&program)
            .filter(|log| !log.trim().is_empty())
            .unwrap_or_else(|| "Unknown error linking program".to_string());
        self.gl.detach_shader(&program, vertex);
        self.gl.detach_shader(&program, fragment);
        self.gl.delete_program(&program);
        Err(PaintError::ShaderLink { log })
    }

    /// Compile both stages, link, and resolve the `color` uniform and the
    /// `position` attribute.
    pub fn build(
        mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<ShaderProgram<G>, PaintError> {
        let vertex = self.compile(vertex_src, ShaderStage::Vertex)?;

        let fragment = match self.compile(fragment_src, ShaderStage::Fragment) {
            Ok(shader) => shader,
            Err(e) => {
                self.gl.delete_shader(&vertex);
                return Err(e);
            }
        };

        let program = match self.link(&vertex, &fragment) {
            Ok(program) => program,
            Err(e) => {
                self.gl.delete_shader(&vertex);
                self.gl.delete_shader(&fragment);
                return Err(e);
            }
        };

        let mut uniforms = HashMap::new();
        match self.gl.uniform_location(&program, COLOR_UNIFORM) {
            Some(location) => {
                uniforms.insert(COLOR_UNIFORM.to_string(), location);
            }
            None => log::warn!("uniform `{COLOR_UNIFORM}` is not active"),
        }

        let position = self
            .gl
            .attrib_location(&program, POSITION_ATTRIBUTE)
            .unwrap_or_else(|| {
                log::warn!("attribute `{POSITION_ATTRIBUTE}` is not active, using 0");
                0
            });

        Ok(ShaderProgram {
            vertex,
            fragment,
            program,
            uniforms,
            position,
        })
    }

    /// Build the flat-fill program from the built-in sources.
    pub fn build_default(self) -> Result<ShaderProgram<G>, PaintError> {
        self.build(VERTEX_SHADER_SRC, FRAGMENT_SHADER_SRC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{Faults, GlCall, HeadlessGl, new_ledger};
    use pretty_assertions::assert_eq;

    #[test]
    fn builds_program_and_resolves_color_uniform() {
        let ledger = new_ledger();
        let mut gl = HeadlessGl::new(ledger.clone(), Faults::default());
        let program = ShaderProgramBuilder::new(&mut gl).build_default().unwrap();

        assert!(program.uniform(COLOR_UNIFORM).is_some());
        assert!(program.uniform("u_time").is_none());
        // context + 2 shaders + program
        assert_eq!(ledger.borrow().live_handles(), 4);

        program.release(&mut gl);
        assert_eq!(ledger.borrow().live_handles(), 1);
    }

    #[test]
    fn compile_failure_carries_log_and_deletes_shader() {
        let ledger = new_ledger();
        let faults = Faults {
            compile_failure: Some(ShaderStage::Vertex),
            ..Faults::default()
        };
        let mut gl = HeadlessGl::new(ledger.clone(), faults);
        let err = ShaderProgramBuilder::new(&mut gl)
            .compile(VERTEX_SHADER_SRC, ShaderStage::Vertex)
            .err()
            .unwrap();

        match err {
            PaintError::ShaderCompile { stage, log } => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(log.contains("syntax error"), "log was {log:?}");
            }
            other => panic!("expected ShaderCompile, got {other:?}"),
        }
        assert_eq!(ledger.borrow().live_handles(), 1);
    }

    #[test]
    fn fragment_failure_releases_vertex_shader() {
        let ledger = new_ledger();
        let faults = Faults {
            compile_failure: Some(ShaderStage::Fragment),
            ..Faults::default()
        };
        let mut gl = HeadlessGl::new(ledger.clone(), faults);
        let result = ShaderProgramBuilder::new(&mut gl).build_default();

        assert!(matches!(
            result,
            Err(PaintError::ShaderCompile {
                stage: ShaderStage::Fragment,
                ..
            })
        ));
        assert_eq!(ledger.borrow().live_handles(), 1);
    }

    #[test]
    fn link_failure_releases_everything() {
        let ledger = new_ledger();
        let faults = Faults {
            link_failure: true,
            ..Faults::default()
        };
        let mut gl = HeadlessGl::new(ledger.clone(), faults);
        let result = ShaderProgramBuilder::new(&mut gl).build_default();

        match result {
            Err(PaintError::ShaderLink { log }) => assert!(log.contains("link")),
            Err(other) => panic!("expected ShaderLink, got {other:?}"),
            Ok(_) => panic!("expected ShaderLink, got a program"),
        }
        assert_eq!(ledger.borrow().live_handles(), 1);
    }

    #[test]
    fn vertex_stage_compiles_before_fragment() {
        let ledger = new_ledger();
        let mut gl = HeadlessGl::new(ledger.clone(), Faults::default());
        ShaderProgramBuilder::new(&mut gl).build_default().unwrap();

        let creates: Vec<GlCall> = ledger
            .borrow()
            .calls()
            .iter()
            .filter(|c| matches!(c, GlCall::CreateShader(_)))
            .cloned()
            .collect();
        assert_eq!(
            creates,
            vec![
                GlCall::CreateShader(ShaderStage::Vertex),
                GlCall::CreateShader(ShaderStage::Fragment),
            ]
        );
    }
}
