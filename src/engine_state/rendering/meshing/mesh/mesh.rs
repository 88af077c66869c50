//! Mesh data structures for chunk geometry.
//!
//! A chunk mesh is three independent triangle streams. Each stream is a plain
//! vertex array plus a `u32` index array local to that stream; the arena adds
//! the stream's vertex base at draw time.

use crate::engine_state::rendering::vertex::{BillboardVertex, Vertex};

/// One vertex + index stream made of quads.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshStream<V> {
    /// The vertex data of this stream
    pub vertices: Vec<V>,
    /// The index data of this stream, two triangles per quad
    pub indices: Vec<u32>,
}

impl<V: Copy> MeshStream<V> {
    /// Creates an empty stream.
    pub fn new() -> Self {
        MeshStream {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Appends one quad given in `ll, lr, ul, ur` order.
    pub fn push_quad(&mut self, corners: [V; 4]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&corners);
        self.indices.extend(generate_face_indices(base));
    }

    /// Number of quads in the stream.
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Whether the stream holds no geometry.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl<V: Copy> Default for MeshStream<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Generates index data for a quad whose first vertex is `base`.
///
/// # Returns
/// Six indices forming the triangles `(0, 3, 1)` and `(0, 2, 3)` of the quad.
pub fn generate_face_indices(base: u32) -> [u32; 6] {
    [base, base + 3, base + 1, base, base + 2, base + 3]
}

/// The complete meshed geometry of one chunk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkMesh {
    /// Faces of solid, transparent and leaves blocks
    pub opaque: MeshStream<Vertex>,
    /// Faces of liquid blocks
    pub liquid: MeshStream<Vertex>,
    /// Crossed quads of billboard blocks
    pub billboard: MeshStream<BillboardVertex>,
}

impl ChunkMesh {
    /// Total quads over all three streams.
    pub fn quad_count(&self) -> usize {
        self.opaque.quad_count() + self.liquid.quad_count() + self.billboard.quad_count()
    }

    /// Whether all three streams are empty.
    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.liquid.is_empty() && self.billboard.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_local_to_the_stream() {
        let mut stream = MeshStream::new();
        stream.push_quad([1u8, 2, 3, 4]);
        stream.push_quad([5u8, 6, 7, 8]);
        assert_eq!(stream.quad_count(), 2);
        assert_eq!(&stream.indices[6..], &[4, 7, 5, 4, 6, 7]);
    }
}
