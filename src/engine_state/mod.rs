//! # Engine State Module
//!
//! Assembles the streaming pipeline into one owner that a frame loop drives.
//!
//! ## Key Components
//!
//! * `EngineState` - Owns the streamer and the geometry arenas it uploads into
//! * `buffer_state` - Geometry arenas on host memory or GPU buffers
//! * `config` - World settings and their JSON loader
//! * `rendering` - Vertex formats and surface meshing
//! * `task_management` - The worker pool
//! * `voxels` - Voxel data, generation, the chunk table and the streamer
//!
//! ## Architecture
//!
//! `EngineState` is generic over the arena backend so the same pipeline runs
//! headless against [`buffer_state::HostBuffer`] and on a device against
//! [`buffer_state::gpu_buffer::GpuBuffer`]. The state is owned by whatever runs
//! the frame loop; nothing is reachable through globals.
//!
//! ## Performance Considerations
//!
//! * Generation and meshing run on the worker pool
//! * Uploads are batched into the per-tick `prepare_render` pass
//! * Chunk loading and unloading follow the viewer's chunk, not its exact position

use std::{io, sync::Arc};

use cgmath::Point3;
use log::info;
use thiserror::Error;
use wgpu::{Device, Queue};

use buffer_state::{
    chunk_arenas::{ArenaStats, ChunkArenas},
    gpu_buffer::GpuBuffer,
    ArenaError, GeometryBuffer, HostBuffer,
};
use config::{ConfigError, WorldConfig};
use voxels::{
    block::{BlockRegistry, VoxelId},
    streamer::{ChunkDrawData, ChunkStreamer, StreamerStats},
};

pub mod buffer_state;
pub mod config;
pub mod rendering;
pub mod task_management;
pub mod voxels;

/// Errors surfaced to the owner of the frame loop.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration could not be applied
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A geometry upload failed
    #[error(transparent)]
    Arena(#[from] ArenaError),
    /// The worker pool could not be started
    #[error("could not start chunk workers: {0}")]
    Workers(#[from] io::Error),
}

/// The streaming pipeline plus the arenas its meshes live in.
///
/// # Examples
///
/// ```no_run
/// use cgmath::Point3;
/// use voxel_streamer::engine_state::{config::WorldConfig, EngineState};
///
/// let mut engine = EngineState::headless(&WorldConfig::default()).unwrap();
/// engine.tick(Point3::new(0.0, 80.0, 0.0)).unwrap();
/// let visible = engine.render_list();
/// # let _ = visible;
/// ```
pub struct EngineState<B> {
    /// Chunk streaming and scheduling
    pub streamer: ChunkStreamer,
    /// Geometry storage for every ready chunk
    pub arenas: ChunkArenas<B>,
}

impl EngineState<HostBuffer> {
    /// An engine whose geometry stays in main memory.
    pub fn headless(config: &WorldConfig) -> Result<Self, EngineError> {
        let streamer = ChunkStreamer::new(config, BlockRegistry::standard())?;
        info!("Starting headless engine");
        Ok(EngineState {
            streamer,
            arenas: ChunkArenas::host(config.arena.initial_capacity),
        })
    }
}

impl EngineState<GpuBuffer> {
    /// An engine whose geometry is uploaded to `device`.
    ///
    /// # Arguments
    /// * `device` - The device owning the arena buffers
    /// * `queue` - The queue used for uploads; `tick` must run on the thread that
    ///   owns it
    /// * `config` - World settings
    pub fn new_gpu(
        device: Arc<Device>,
        queue: Arc<Queue>,
        config: &WorldConfig,
    ) -> Result<Self, EngineError> {
        let streamer = ChunkStreamer::new(config, BlockRegistry::standard())?;
        info!(
            "Starting engine, max buffer size {} bytes",
            device.limits().max_buffer_size
        );
        Ok(EngineState {
            streamer,
            arenas: ChunkArenas::gpu(device, queue, config.arena.initial_capacity),
        })
    }
}

impl<B: GeometryBuffer> EngineState<B> {
    /// Advances streaming for the current viewer position.
    pub fn tick(&mut self, viewer: Point3<f32>) -> Result<(), EngineError> {
        self.streamer.update(viewer, &mut self.arenas)?;
        Ok(())
    }

    /// Draw data of every ready chunk.
    pub fn render_list(&self) -> Vec<ChunkDrawData> {
        self.streamer.render_list()
    }

    /// Edits one voxel at a world position.
    pub fn place_or_remove_block(&mut self, x: i32, y: i32, z: i32, id: VoxelId) -> bool {
        self.streamer.place_or_remove_block(x, y, z, id)
    }

    /// Streamer and arena counters.
    pub fn stats(&self) -> (StreamerStats, ArenaStats) {
        (self.streamer.stats(), self.arenas.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_spawn_failures_are_reported() {
        let error: EngineError = io::Error::new(io::ErrorKind::OutOfMemory, "no threads").into();
        assert!(matches!(error, EngineError::Workers(_)));
        assert_eq!(error.to_string(), "could not start chunk workers: no threads");
    }

    #[test]
    fn invalid_configs_are_rejected_before_workers_start() {
        let mut config = WorldConfig::default();
        config.dimensions.width = 0;
        let result = EngineState::headless(&config);
        assert!(matches!(
            result,
            Err(EngineError::Config(ConfigError::InvalidDimensions { .. }))
        ));
    }
}
