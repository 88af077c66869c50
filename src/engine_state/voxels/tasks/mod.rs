//! # Voxel Task System
//!
//! Background jobs of the chunk pipeline. There is a single job type, the chunk
//! build, which generates a chunk's voxels on first run and (re)meshes it
//! against whatever neighbors are available.
//!
//! Every job is published through [`BuildContext::enqueue`], which deduplicates
//! requests per chunk: a chunk with an outstanding request is never queued twice.

use std::sync::Arc;

use log::trace;

use crate::engine_state::{
    rendering::meshing::SurfaceMesher,
    task_management::TaskQueue,
    voxels::{chunk::Chunk, generation::TerrainGenerator, world::World},
};

pub mod chunk_build_task;

use chunk_build_task::ChunkBuildTask;

/// Everything a build job needs besides the chunk itself.
pub struct BuildContext {
    /// The chunk table, used to resolve neighbors
    pub world: World,
    /// Where follow-up jobs are published
    pub queue: TaskQueue,
    /// Voxel source for chunks that have none yet
    pub generator: Arc<TerrainGenerator>,
    /// Mesh builder
    pub mesher: SurfaceMesher,
}

impl BuildContext {
    /// Requests a rebuild of `chunk`, publishing a job unless one is already
    /// outstanding.
    ///
    /// # Returns
    /// `true` if a new job was published.
    pub fn enqueue(self: &Arc<Self>, chunk: Arc<Chunk>) -> bool {
        if !chunk.request_rebuild() {
            return false;
        }
        self.publish(chunk)
    }

    /// Publishes a job for a chunk whose request flag is already set.
    pub(crate) fn publish(self: &Arc<Self>, chunk: Arc<Chunk>) -> bool {
        trace!("Queueing build of chunk {:?}", chunk.coordinate);
        self.queue
            .publish(Box::new(ChunkBuildTask::new(self.clone(), chunk)))
    }
}
