#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Streamer
//!
//! Chunk streaming, procedural generation and surface meshing for an effectively
//! infinite voxel terrain built from full-height chunk columns.
//!
//! The crate keeps a bounded set of chunks alive around a moving viewer, builds
//! their voxels and meshes on a background worker pool, and packs the resulting
//! triangle streams into a handful of large geometry buffers that a renderer can
//! draw from directly.
//!
//! ## Key Modules
//!
//! * `core` - Shared-ownership resource containers used across threads
//! * `engine_state` - The streaming pipeline: voxels, generation, meshing, geometry arenas
//!   and the worker pool
//!
//! ## Architecture
//!
//! The pipeline is split into leaf-first components:
//! * `VoxelStore` holds the block identifiers of one chunk column (dense or run-length)
//! * `TerrainGenerator` fills a store deterministically from noise and surface stamps
//! * `SurfaceMesher` turns a store plus its four neighbors into opaque, liquid and
//!   billboard triangle streams
//! * `GeometryArena` appends those streams into growable buffers and hands out
//!   offset/size handles
//! * `ChunkStreamer` decides which chunks exist, schedules their jobs and adopts finished
//!   meshes on the thread that owns the geometry buffers
//!
//! ## Usage
//!
//! ```no_run
//! use cgmath::Point3;
//! use voxel_streamer::engine_state::{config::WorldConfig, EngineState};
//!
//! let config = WorldConfig::default();
//! let mut engine = EngineState::headless(&config).unwrap();
//! loop {
//!     engine.tick(Point3::new(0.0, 80.0, 0.0)).unwrap();
//!     for chunk in engine.render_list() {
//!         // Issue draw calls from chunk.geometry at chunk.origin
//!         let _ = chunk;
//!     }
//! }
//! ```
//!
//! ## Performance Considerations
//!
//! * Only faces adjacent to see-through cells are emitted
//! * Workers block on a channel and never poll
//! * Idle chunks can be compacted to run-length storage
//! * Geometry is uploaded in bulk into a few large buffers instead of one per chunk

use log::info;

pub mod core;
pub mod engine_state;

/// Initializes the process-wide logger.
///
/// Log output goes to stdout and is filtered through the `RUST_LOG` environment
/// variable, e.g. `RUST_LOG=voxel_streamer=debug`.
pub fn init_logger() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");
}
