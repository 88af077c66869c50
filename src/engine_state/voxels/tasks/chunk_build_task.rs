//! # Chunk Build Task
//!
//! Generates a chunk's voxels if it has none, then meshes it against its
//! generated neighbors and publishes the result for the coordinator to upload.
//!
//! A build is skipped when:
//! - the chunk was marked for deletion (checked before and after taking the
//!   build lock)
//! - another worker holds the chunk's build lock; that worker republishes the
//!   chunk if a request arrived while it was busy
//! - nothing changed since the last mesh: no rebuild request, same neighbor set,
//!   no boundary change. Every scheduled build carries a request, so this only
//!   absorbs duplicate jobs for a chunk that is already current.

use std::sync::Arc;

use log::{debug, trace};
use web_time::Instant;

use crate::engine_state::{
    rendering::meshing::ChunkNeighbors,
    task_management::task::Task,
    voxels::{block::block_side::FaceDirection, chunk::Chunk},
};

use super::BuildContext;

/// Builds one chunk.
pub struct ChunkBuildTask {
    context: Arc<BuildContext>,
    chunk: Arc<Chunk>,
}

impl ChunkBuildTask {
    /// Creates a build job for `chunk`.
    pub fn new(context: Arc<BuildContext>, chunk: Arc<Chunk>) -> Self {
        ChunkBuildTask { context, chunk }
    }

    fn build(&self) {
        let chunk = &self.chunk;
        let context = &self.context;
        let requested = chunk.take_rebuild_request();

        if chunk.is_marked_for_delete() {
            return;
        }

        if !chunk.is_generated() {
            let started = Instant::now();
            let store = context.generator.generate(chunk.coordinate);
            chunk.store_generated_voxels(store);
            trace!(
                "Generated chunk {:?} in {:?}",
                chunk.coordinate,
                started.elapsed()
            );
        }

        let mut neighbors = ChunkNeighbors::none();
        let mut present = Vec::with_capacity(4);
        for face in FaceDirection::horizontal() {
            let Some(neighbor) = context.world.live_neighbor(chunk.coordinate, face) else {
                continue;
            };
            if let Some(slice) = neighbor.boundary(face.opposite()) {
                neighbors.set(face, slice);
                present.push((face, neighbor));
            }
        }

        let presence = neighbors.presence();
        let edge_update = chunk.take_edge_update();
        // Duplicate job: the request it was published for is already built.
        let unchanged = chunk.is_meshed() && presence == chunk.neighbor_presence();
        if unchanged && !requested && !edge_update {
            trace!("Chunk {:?} is up to date", chunk.coordinate);
            return;
        }

        let started = Instant::now();
        let Some(voxels) = chunk.snapshot_voxels() else {
            return;
        };
        let mesh = context.mesher.mesh(&voxels, &neighbors);
        let quads = mesh.quad_count();
        chunk.store_neighbor_presence(presence);
        chunk.publish_mesh(mesh);
        trace!(
            "Meshed chunk {:?} ({} quads) in {:?}",
            chunk.coordinate,
            quads,
            started.elapsed()
        );

        for (face, neighbor) in present {
            let knows_us = neighbor.neighbor_presence()[face.opposite().horizontal_index()];
            if edge_update || !knows_us {
                context.enqueue(neighbor);
            }
        }
    }
}

impl Task for ChunkBuildTask {
    fn process(&self) {
        if self.chunk.is_marked_for_delete() {
            return;
        }

        {
            let Some(_guard) = self.chunk.try_begin_build() else {
                trace!(
                    "Chunk {:?} is being built elsewhere, dropping job",
                    self.chunk.coordinate
                );
                return;
            };
            self.build();
        }
        self.republish_if_requested();
    }
}

impl ChunkBuildTask {
    // A request that arrived while the lock was held had its job dropped.
    fn republish_if_requested(&self) {
        if self.chunk.rebuild_requested() && !self.chunk.is_marked_for_delete() {
            debug!(
                "Chunk {:?} changed during its build, rebuilding",
                self.chunk.coordinate
            );
            self.context.publish(self.chunk.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::{
        rendering::meshing::SurfaceMesher,
        task_management::TaskManager,
        voxels::{
            block::BlockRegistry,
            chunk::{ChunkCoordinate, ChunkDimensions},
            generation::{noise_settings::TerrainSettings, TerrainGenerator},
            world::World,
        },
    };

    fn context(manager: &TaskManager) -> Arc<BuildContext> {
        let registry = BlockRegistry::standard();
        let generator = TerrainGenerator::new(
            1,
            TerrainSettings::flat(),
            ChunkDimensions::new(4, 16),
            &registry,
        )
        .unwrap();
        Arc::new(BuildContext {
            world: World::new(),
            queue: manager.queue(),
            generator: Arc::new(generator),
            mesher: SurfaceMesher::new(registry),
        })
    }

    // Runs jobs inline, without the pool, so the test controls ordering.
    fn run(context: &Arc<BuildContext>, chunk: &Arc<Chunk>) {
        chunk.request_rebuild();
        ChunkBuildTask::new(context.clone(), chunk.clone()).build();
    }

    #[test]
    fn first_build_generates_and_meshes() {
        let manager = TaskManager::new(1).unwrap();
        let context = context(&manager);
        let chunk = context.world.insert(ChunkCoordinate::new(0, 0)).unwrap();

        run(&context, &chunk);

        assert!(chunk.is_generated());
        assert!(chunk.is_meshed());
        assert!(chunk.has_pending_mesh());
        assert_eq!(chunk.mesh_revision(), 1);
    }

    #[test]
    fn unchanged_chunk_is_not_remeshed() {
        let manager = TaskManager::new(1).unwrap();
        let context = context(&manager);
        let chunk = context.world.insert(ChunkCoordinate::new(0, 0)).unwrap();
        run(&context, &chunk);

        ChunkBuildTask::new(context.clone(), chunk.clone()).build();
        assert_eq!(chunk.mesh_revision(), 1);
    }

    #[test]
    fn new_neighbor_triggers_remesh_of_both() {
        let manager = TaskManager::new(1).unwrap();
        let context = context(&manager);
        let origin = context.world.insert(ChunkCoordinate::new(0, 0)).unwrap();
        let east = context.world.insert(ChunkCoordinate::new(1, 0)).unwrap();
        run(&context, &origin);
        run(&context, &east);

        assert_eq!(east.neighbor_presence(), [false, false, true, false]);

        // The east chunk generated, so a rebuild of the origin went to the pool.
        for _ in 0..500 {
            if manager.is_idle() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        assert!(manager.is_idle());
        assert_eq!(origin.mesh_revision(), 2);
        assert_eq!(origin.neighbor_presence(), [false, false, false, true]);
        assert_eq!(east.mesh_revision(), 1);
    }

    #[test]
    fn contended_job_is_rebuilt_by_the_lock_holder() {
        let manager = TaskManager::new(1).unwrap();
        let context = context(&manager);
        let chunk = context.world.insert(ChunkCoordinate::new(0, 0)).unwrap();
        run(&context, &chunk);
        assert_eq!(chunk.mesh_revision(), 1);

        let holder = ChunkBuildTask::new(context.clone(), chunk.clone());
        {
            let _guard = chunk.try_begin_build().unwrap();
            assert!(chunk.request_rebuild());
            ChunkBuildTask::new(context.clone(), chunk.clone()).process();
            assert_eq!(chunk.mesh_revision(), 1);
            assert!(chunk.rebuild_requested());
        }

        holder.republish_if_requested();
        for _ in 0..500 {
            if manager.is_idle() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        assert!(manager.is_idle());
        assert!(!chunk.rebuild_requested());
        assert_eq!(chunk.mesh_revision(), 2);
    }

    #[test]
    fn marked_chunks_are_skipped() {
        let manager = TaskManager::new(1).unwrap();
        let context = context(&manager);
        let chunk = context.world.insert(ChunkCoordinate::new(0, 0)).unwrap();
        chunk.mark_for_delete();
        ChunkBuildTask::new(context.clone(), chunk.clone()).process();
        assert!(!chunk.is_generated());
    }
}
