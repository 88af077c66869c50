//! Geometry production for the voxel engine.
//!
//! This module turns voxels into the vertex and index streams a renderer draws:
//! the packed vertex formats and their `wgpu` layouts, and the surface mesher.
//! Drawing itself is left to the renderer that consumes the arenas.

pub mod meshing;
pub mod vertex;

pub use vertex::Vertex;
