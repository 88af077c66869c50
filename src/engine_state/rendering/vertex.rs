//! Vertex data structures and layouts for chunk geometry.
//!
//! Two formats exist: a compact integer vertex for axis-aligned block faces
//! (opaque and liquid streams) and a float vertex for the crossed billboard quads,
//! whose corners do not sit on the voxel grid.

use crate::engine_state::voxels::block::block_side::FaceDirection;

/// A corner of an axis-aligned block face.
///
/// # Memory Layout
/// - Position: 3x u16, chunk-local, `0..=width` and `0..=height` (6 bytes)
/// - Direction: u16 face tag (2 bytes)
/// - Atlas: 2x u8 atlas cell coordinates (2 bytes)
/// - Padding: 2 bytes
///
/// Total size: 12 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Chunk-local corner position
    pub position: [u16; 3],
    /// Face tag: North=0, South=1, West=2, East=3, Bottom=4, Top=5
    pub direction: u16,
    /// Atlas cell coordinates
    pub atlas: [u8; 2],
    _padding: [u8; 2],
}

impl Vertex {
    /// Creates a new vertex.
    ///
    /// # Arguments
    /// * `position` - Chunk-local corner position
    /// * `atlas` - Atlas cell coordinates of this corner
    /// * `direction` - The face this corner belongs to
    pub fn new(position: [u16; 3], atlas: [u8; 2], direction: FaceDirection) -> Self {
        Vertex {
            position,
            direction: direction.tag() as u16,
            atlas,
            _padding: [0; 2],
        }
    }

    /// The face this corner belongs to.
    ///
    /// # Returns
    /// `None` if the tag was corrupted.
    pub fn direction(&self) -> Option<FaceDirection> {
        u8::try_from(self.direction)
            .ok()
            .and_then(FaceDirection::from_tag)
    }

    /// Returns the vertex buffer layout description for the shader pipeline.
    ///
    /// # Shader Attributes
    /// - `location = 0`: position and direction (vec4<u32>, unpacked from u16)
    /// - `location = 1`: atlas cell (vec2<u32>, unpacked from u8)
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Uint16x4,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[u16; 4]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Uint8x2,
                },
            ],
        }
    }
}

/// A corner of a crossed billboard quad.
///
/// # Memory Layout
/// - Position: 3x f32, chunk-local (12 bytes)
/// - Atlas: 2x u8 (2 bytes)
/// - Direction: u8, always the North tag (1 byte)
/// - Padding: 1 byte
///
/// Total size: 16 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BillboardVertex {
    /// Chunk-local corner position
    pub position: [f32; 3],
    /// Atlas cell coordinates
    pub atlas: [u8; 2],
    /// Face tag used for shading
    pub direction: u8,
    _padding: u8,
}

impl BillboardVertex {
    /// Creates a new billboard vertex.
    pub fn new(position: [f32; 3], atlas: [u8; 2]) -> Self {
        BillboardVertex {
            position,
            atlas,
            direction: FaceDirection::North.tag(),
            _padding: 0,
        }
    }

    /// Returns the vertex buffer layout description for the billboard pipeline.
    ///
    /// # Shader Attributes
    /// - `location = 0`: position (vec3<f32>)
    /// - `location = 1`: atlas cell, direction and padding (vec4<u32>)
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BillboardVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Uint8x4,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_are_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 12);
        assert_eq!(std::mem::size_of::<BillboardVertex>(), 16);
        assert_eq!(Vertex::desc().array_stride, 12);
        assert_eq!(BillboardVertex::desc().array_stride, 16);
    }

    #[test]
    fn direction_tag_survives_bytes() {
        let vertex = Vertex::new([1, 2, 3], [4, 5], FaceDirection::East);
        let bytes = bytemuck::bytes_of(&vertex).to_vec();
        let restored: Vertex = bytemuck::pod_read_unaligned(&bytes);
        assert_eq!(restored.direction(), Some(FaceDirection::East));
        assert_eq!(restored.position, [1, 2, 3]);
    }
}
