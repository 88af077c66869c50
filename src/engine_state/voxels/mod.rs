//! # Voxel Engine Core
//!
//! Voxel data, terrain generation and the chunk streaming pipeline.
//!
//! ## Architecture
//!
//! * **Block**: block identifiers, rendering classes and the block registry
//! * **Chunk**: full-height columns of voxels and their lifecycle flags
//! * **Generation**: deterministic terrain from noise plus surface stamps
//! * **World**: the chunk table
//! * **Tasks**: the background build job (generate, then mesh)
//! * **Streamer**: decides which chunks exist and hands meshes to the arenas
//!
//! ## Data Flow
//!
//! 1. The streamer creates chunks around the viewer and queues build jobs
//! 2. A worker generates the chunk's voxels if it has none
//! 3. The worker meshes the chunk against its generated neighbors and publishes
//!    the mesh on the chunk
//! 4. The streamer uploads published meshes into the geometry arenas
//!
//! ## Thread Safety
//!
//! * Voxels sit behind a shared/exclusive lock; meshing reads, edits write
//! * The chunk table is mutated only by the streamer
//! * Geometry arenas are only touched by the streamer's thread

pub mod block;
pub mod chunk;
pub mod generation;
pub mod streamer;
pub mod tasks;
pub mod world;
