//! `GlBackend` over a browser `WebGl2RenderingContext`.

use paint_core::{GlBackend, ShaderStage};
use wasm_bindgen::JsCast;
use web_sys::{
    WebGl2RenderingContext as GL, WebGlBuffer, WebGlProgram, WebGlShader, WebGlUniformLocation,
    WebglLoseContext,
};

pub struct WebGl {
    gl: GL,
}

impl WebGl {
    pub fn new(gl: GL) -> Self {
        Self { gl }
    }
}

impl GlBackend for WebGl {
    type Shader = WebGlShader;
    type Program = WebGlProgram;
    type Buffer = WebGlBuffer;
    type UniformLocation = WebGlUniformLocation;

    fn create_shader(&mut self, stage: ShaderStage) -> Option<WebGlShader> {
        let shader_type = match stage {
            ShaderStage::Vertex => GL::VERTEX_SHADER,
            ShaderStage::Fragment => GL::FRAGMENT_SHADER,
        };
        self.gl.create_shader(shader_type)
    }

    fn shader_source(&mut self, shader: &WebGlShader, source: &str) {
        self.gl.shader_source(shader, source);
    }

    fn compile_shader(&mut self, shader: &WebGlShader) {
        self.gl.compile_shader(shader);
    }

    fn shader_compiled(&self, shader: &WebGlShader) -> bool {
        self.gl
            .get_shader_parameter(shader, GL::COMPILE_STATUS)
            .as_bool()
            .unwrap_or(false)
    }

    fn shader_info_log(&self, shader: &WebGlShader) -> Option<String> {
        self.gl.get_shader_info_log(shader)
    }

    fn delete_shader(&mut self, shader: &WebGlShader) {
        self.gl.delete_shader(Some(shader));
    }

    fn create_program(&mut self) -> Option<WebGlProgram> {
        self.gl.create_program()
    }

    fn attach_shader(&mut self, program: &WebGlProgram, shader: &WebGlShader) {
        self.gl.attach_shader(program, shader);
    }

    fn detach_shader(&mut self, program: &WebGlProgram, shader: &WebGlShader) {
        self.gl.detach_shader(program, shader);
    }

    fn link_program(&mut self, program: &WebGlProgram) {
        self.gl.link_program(program);
    }

    fn program_linked(&self, program: &WebGlProgram) -> bool {
        self.gl
            .get_program_parameter(program, GL::LINK_STATUS)
            .as_bool()
            .unwrap_or(false)
    }

    fn program_info_log(&self, program: &WebGlProgram) -> Option<String> {
        self.gl.get_program_info_log(program)
    }

    fn delete_program(&mut self, program: &WebGlProgram) {
        self.gl.delete_program(Some(program));
    }

    fn use_program(&mut self, program: Option<&WebGlProgram>) {
        self.gl.use_program(program);
    }

    fn uniform_location(&self, program: &WebGlProgram, name: &str) -> Option<WebGlUniformLocation> {
        self.gl.get_uniform_location(program, name)
    }

    fn attrib_location(&self, program: &WebGlProgram, name: &str) -> Option<u32> {
        // -1 for inactive attributes
        u32::try_from(self.gl.get_attrib_location(program, name)).ok()
    }

    fn uniform4f(&mut self, location: &WebGlUniformLocation, value: [f32; 4]) {
        self.gl.uniform4fv_with_f32_array(Some(location), &value);
    }

    fn create_buffer(&mut self) -> Option<WebGlBuffer> {
        self.gl.create_buffer()
    }

    fn bind_array_buffer(&mut self, buffer: Option<&WebGlBuffer>) {
        self.gl.bind_buffer(GL::ARRAY_BUFFER, buffer);
    }

    fn buffer_static_data(&mut self, data: &[f32]) {
        let array = js_sys::Float32Array::from(data);
        self.gl
            .buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &array, GL::STATIC_DRAW);
    }

    fn delete_buffer(&mut self, buffer: &WebGlBuffer) {
        self.gl.delete_buffer(Some(buffer));
    }

    fn vertex_attrib_pointer(&mut self, location: u32, components: i32, stride: i32, offset: i32) {
        self.gl
            .vertex_attrib_pointer_with_i32(location, components, GL::FLOAT, false, stride, offset);
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        self.gl.enable_vertex_attrib_array(location);
    }

    fn enable_blending(&mut self) {
        self.gl.enable(GL::BLEND);
        self.gl.blend_func(GL::ONE, GL::ONE_MINUS_SRC_ALPHA);
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.gl.viewport(x, y, width, height);
    }

    fn clear(&mut self, [r, g, b, a]: [f32; 4]) {
        self.gl.clear_color(r, g, b, a);
        self.gl.clear(GL::COLOR_BUFFER_BIT);
    }

    fn draw_triangles(&mut self, first: i32, count: i32) {
        self.gl.draw_arrays(GL::TRIANGLES, first, count);
    }

    fn take_error(&mut self) -> Option<u32> {
        match self.gl.get_error() {
            GL::NO_ERROR => None,
            code => Some(code),
        }
    }

    fn lose_context(&mut self) {
        match self.gl.get_extension("WEBGL_lose_context") {
            Ok(Some(extension)) => extension.unchecked_into::<WebglLoseContext>().lose_context(),
            _ => log::debug!("WEBGL_lose_context unavailable, context left to the GC"),
        }
    }
}
