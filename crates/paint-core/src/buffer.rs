//! Static vertex geometry for the filled surface.

use crate::backend::GlBackend;
use crate::error::PaintError;

/// Two counter-clockwise triangles covering clip space, 2 floats per vertex.
pub const FULL_SURFACE_QUAD: [f32; 12] = [
    -1.0, -1.0, //
    1.0, -1.0, //
    1.0, 1.0, //
    -1.0, -1.0, //
    1.0, 1.0, //
    -1.0, 1.0, //
];

/// How the vertex shader reads one vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    pub components: i32,
    /// Bytes between consecutive vertices.
    pub stride: i32,
}

impl VertexLayout {
    pub const fn tightly_packed(components: i32) -> Self {
        Self {
            components,
            stride: components * std::mem::size_of::<f32>() as i32,
        }
    }
}

/// A GPU array buffer uploaded once with static usage.
///
/// There is no re-upload path: the only constructor is [`RenderBuffer::upload`].
pub struct RenderBuffer<G: GlBackend> {
    buffer: G::Buffer,
    vertex_count: i32,
    layout: VertexLayout,
}

impl<G: GlBackend> RenderBuffer<G> {
    /// Allocate a buffer and upload `vertices`, `components` floats per vertex.
    ///
    /// # Errors
    /// `PaintError::ContextUnavailable` when the context refuses to allocate
    /// (typically a lost context).
    pub fn upload(gl: &mut G, vertices: &[f32], components: i32) -> Result<Self, PaintError> {
        let buffer = gl
            .create_buffer()
            .ok_or_else(|| PaintError::ContextUnavailable("Failed to create buffer".to_string()))?;
        gl.bind_array_buffer(Some(&buffer));
        gl.buffer_static_data(vertices);

        let vertex_count = vertices.len() as i32 / components.max(1);
        log::debug!("vertex buffer uploaded: {vertex_count} vertices");

        Ok(Self {
            buffer,
            vertex_count,
            layout: VertexLayout::tightly_packed(components),
        })
    }

    /// Bind the buffer and point attribute `location` at it.
    pub fn bind_attribute(&self, gl: &mut G, location: u32) {
        gl.bind_array_buffer(Some(&self.buffer));
        gl.vertex_attrib_pointer(location, self.layout.components, self.layout.stride, 0);
        gl.enable_vertex_attrib_array(location);
    }

    pub fn draw(&self, gl: &mut G) {
        gl.draw_triangles(0, self.vertex_count);
    }

    pub fn vertex_count(&self) -> i32 {
        self.vertex_count
    }

    pub fn layout(&self) -> VertexLayout {
        self.layout
    }

    pub fn release(&self, gl: &mut G) {
        gl.bind_array_buffer(None);
        gl.delete_buffer(&self.buffer);
        log::debug!("vertex buffer released");
    }
}
