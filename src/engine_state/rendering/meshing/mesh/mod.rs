//! Mesh generation primitives for chunk geometry.
//!
//! # Architecture
//! - [`ChunkMesh`]: The three triangle streams produced for one chunk
//! - [`Face`]: A single axis-aligned quad of a voxel with its corners
//! - [`ExposureVolume`]: Padded visibility flags used to cull hidden faces
//!
//! # Performance Considerations
//! - Output size is proportional to the number of exposed faces, not to volume
//! - Visibility lookups never branch on chunk edges thanks to the padding

mod culling;
mod face;
mod mesh;

pub use culling::ExposureVolume;
pub use face::{billboard_quads, Face};
pub use mesh::*;
