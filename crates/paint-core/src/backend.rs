//! The GPU seam.
//!
//! `GlBackend` is the subset of the WebGL2 API the painter issues. Implemented
//! by the browser bridge over `WebGl2RenderingContext` and by
//! `headless::HeadlessGl` for tests. Handle types are opaque to the
//! core; the core never creates or compares them.

use crate::shader::ShaderStage;

pub trait GlBackend {
    type Shader;
    type Program;
    type Buffer;
    type UniformLocation: Clone;

    // ─── Shaders ─────────────────────────────────────────────────────────

    fn create_shader(&mut self, stage: ShaderStage) -> Option<Self::Shader>;
    fn shader_source(&mut self, shader: &Self::Shader, source: &str);
    fn compile_shader(&mut self, shader: &Self::Shader);
    fn shader_compiled(&self, shader: &Self::Shader) -> bool;
    fn shader_info_log(&self, shader: &Self::Shader) -> Option<String>;
    fn delete_shader(&mut self, shader: &Self::Shader);

    // ─── Programs ────────────────────────────────────────────────────────

    fn create_program(&mut self) -> Option<Self::Program>;
    fn attach_shader(&mut self, program: &Self::Program, shader: &Self::Shader);
    fn detach_shader(&mut self, program: &Self::Program, shader: &Self::Shader);
    fn link_program(&mut self, program: &Self::Program);
    fn program_linked(&self, program: &Self::Program) -> bool;
    fn program_info_log(&self, program: &Self::Program) -> Option<String>;
    fn delete_program(&mut self, program: &Self::Program);
    fn use_program(&mut self, program: Option<&Self::Program>);
    fn uniform_location(
        &self,
        program: &Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation>;
    /// `None` when the attribute is inactive in the linked program.
    fn attrib_location(&self, program: &Self::Program, name: &str) -> Option<u32>;
    fn uniform4f(&mut self, location: &Self::UniformLocation, value: [f32; 4]);

    // ─── Buffers ─────────────────────────────────────────────────────────

    fn create_buffer(&mut self) -> Option<Self::Buffer>;
    fn bind_array_buffer(&mut self, buffer: Option<&Self::Buffer>);
    /// Upload to the bound array buffer with static usage.
    fn buffer_static_data(&mut self, data: &[f32]);
    fn delete_buffer(&mut self, buffer: &Self::Buffer);
    fn vertex_attrib_pointer(&mut self, location: u32, components: i32, stride: i32, offset: i32);
    fn enable_vertex_attrib_array(&mut self, location: u32);

    // ─── Frame state ─────────────────────────────────────────────────────

    /// `BLEND` with `ONE, ONE_MINUS_SRC_ALPHA` (premultiplied alpha).
    fn enable_blending(&mut self);
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);
    fn clear(&mut self, color: [f32; 4]);
    fn draw_triangles(&mut self, first: i32, count: i32);
    /// Pop the oldest pending GPU error code, if any.
    fn take_error(&mut self) -> Option<u32>;

    /// Release the context itself. No call may follow.
    fn lose_context(&mut self);
}
