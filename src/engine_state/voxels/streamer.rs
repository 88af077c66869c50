//! # Chunk Streamer
//!
//! Keeps the set of loaded chunks matched to the viewer position and moves each
//! chunk through its lifecycle.
//!
//! ## Architecture
//!
//! The streamer runs on the coordinator thread, the only thread that touches
//! the geometry arenas. Each [`ChunkStreamer::update`]:
//! 1. Recomputes the visible set when the viewer enters a new chunk (or the
//!    render distance changed), creating and queueing missing chunks ring by
//!    ring outward from the viewer
//! 2. Uploads meshes published by workers into the arenas
//! 3. Evicts out-of-range chunks once they are ready, releasing their geometry
//! 4. Compacts chunks that dropped out of the recently touched set
//!
//! Workers own generation and meshing; see [`super::tasks`].
//!
//! ## Performance Considerations
//!
//! * The visible set is only recomputed when the viewer changes chunk
//! * Mesh handoff is a flag check per chunk; uploads happen only for chunks with
//!   a published mesh

use std::{
    collections::HashSet,
    num::NonZeroUsize,
    sync::Arc,
};

use cgmath::Point3;
use log::{debug, info, trace};
use lru::LruCache;

use crate::engine_state::{
    buffer_state::{
        chunk_arenas::{ChunkArenas, ChunkGeometry},
        ArenaError, GeometryBuffer,
    },
    config::WorldConfig,
    rendering::meshing::SurfaceMesher,
    task_management::TaskManager,
    EngineError,
};

use super::{
    block::{block_side::FaceDirection, BlockRegistry, VoxelId},
    chunk::{Chunk, ChunkCoordinate, ChunkDimensions},
    generation::TerrainGenerator,
    tasks::BuildContext,
    world::World,
};

/// What the renderer needs to draw one ready chunk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkDrawData {
    /// Key of the chunk
    pub coordinate: ChunkCoordinate,
    /// World-space position of the chunk's local origin
    pub origin: Point3<f32>,
    /// Arena handles of the chunk's streams
    pub geometry: ChunkGeometry,
}

/// Counters describing the streamer's current state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamerStats {
    /// Chunks in the table
    pub loaded: usize,
    /// Chunks whose geometry is uploaded
    pub ready: usize,
    /// Chunks using run-length storage
    pub compact: usize,
    /// Build jobs queued or running
    pub pending_jobs: usize,
    /// Out-of-range chunks waiting to become ready before eviction
    pub awaiting_eviction: usize,
}

/// Every coordinate within `render_distance` of `center`, innermost ring first.
///
/// Distance is Euclidean in chunk units.
pub fn coordinates_within(center: ChunkCoordinate, render_distance: u32) -> Vec<ChunkCoordinate> {
    let radius = render_distance as i32;
    let limit = (render_distance as i64).pow(2);
    let mut coordinates = Vec::new();

    for ring in 0..=radius {
        for dx in -ring..=ring {
            for dz in -ring..=ring {
                if dx.abs().max(dz.abs()) != ring {
                    continue;
                }
                let coordinate = center.offset(dx, dz);
                if coordinate.distance_squared(center) <= limit {
                    coordinates.push(coordinate);
                }
            }
        }
    }
    coordinates
}

/// Streams chunk columns around a moving viewer.
pub struct ChunkStreamer {
    registry: BlockRegistry,
    dimensions: ChunkDimensions,
    render_distance: u32,
    world: World,
    context: Arc<BuildContext>,
    center: Option<ChunkCoordinate>,
    visibility_dirty: bool,
    out_of_range: HashSet<ChunkCoordinate>,
    recently_touched: Option<LruCache<ChunkCoordinate, ()>>,
    tasks: TaskManager,
}

impl ChunkStreamer {
    /// Creates a streamer and starts its worker pool.
    ///
    /// # Arguments
    /// * `config` - World settings
    /// * `registry` - Block metadata shared with generation and meshing
    ///
    /// # Returns
    /// An error if the configuration is invalid, names unknown blocks, or the
    /// worker threads could not be started.
    pub fn new(config: &WorldConfig, registry: BlockRegistry) -> Result<Self, EngineError> {
        config.validate()?;
        let generator = TerrainGenerator::new(
            config.seed,
            config.terrain.clone(),
            config.dimensions,
            &registry,
        )?;
        Self::with_generator(config, registry, generator)
    }

    /// Creates a streamer around an already configured generator.
    ///
    /// The generator's dimensions take precedence over `config.dimensions`.
    pub fn with_generator(
        config: &WorldConfig,
        registry: BlockRegistry,
        generator: TerrainGenerator,
    ) -> Result<Self, EngineError> {
        let dimensions = generator.dimensions();
        let tasks = TaskManager::new(config.worker_threads())?;
        let world = World::new();
        let context = Arc::new(BuildContext {
            world: world.clone(),
            queue: tasks.queue(),
            generator: Arc::new(generator),
            mesher: SurfaceMesher::new(registry),
        });
        let recently_touched = NonZeroUsize::new(config.compaction.hot_chunks)
            .filter(|_| config.compaction.enabled)
            .map(LruCache::new);

        info!(
            "Chunk streamer ready: {}x{} columns, render distance {}",
            dimensions.width, dimensions.height, config.render_distance
        );

        Ok(ChunkStreamer {
            registry,
            dimensions,
            render_distance: config.render_distance,
            world,
            context,
            center: None,
            visibility_dirty: true,
            out_of_range: HashSet::new(),
            recently_touched,
            tasks,
        })
    }

    /// Advances streaming by one tick.
    ///
    /// Must be called from the thread that owns `arenas`.
    ///
    /// # Arguments
    /// * `viewer` - World-space viewer position
    /// * `arenas` - Where finished meshes are uploaded and evicted geometry released
    ///
    /// # Returns
    /// The arena error if an upload could not grow its buffer.
    pub fn update<B: GeometryBuffer>(
        &mut self,
        viewer: Point3<f32>,
        arenas: &mut ChunkArenas<B>,
    ) -> Result<(), ArenaError> {
        let center = ChunkCoordinate::containing(viewer, self.dimensions.width);
        if self.visibility_dirty || self.center != Some(center) {
            self.center = Some(center);
            self.visibility_dirty = false;
            self.refresh_visible_set(center);
        }

        self.prepare_render(arenas)?;
        self.evict_out_of_range(arenas);
        Ok(())
    }

    fn refresh_visible_set(&mut self, center: ChunkCoordinate) {
        let mut created = 0;
        for coordinate in coordinates_within(center, self.render_distance) {
            if let Some(chunk) = self.world.insert(coordinate) {
                self.context.enqueue(chunk);
                created += 1;
            }
        }

        let limit = (self.render_distance as i64).pow(2);
        for coordinate in self.world.coordinates() {
            if coordinate.distance_squared(center) > limit {
                self.out_of_range.insert(coordinate);
            }
        }

        debug!(
            "Viewer entered chunk {:?}: {} chunks created, {} out of range",
            center,
            created,
            self.out_of_range.len()
        );
    }

    fn in_range(&self, coordinate: ChunkCoordinate) -> bool {
        match self.center {
            Some(center) => {
                coordinate.distance_squared(center) <= (self.render_distance as i64).pow(2)
            }
            None => false,
        }
    }

    fn evict_out_of_range<B: GeometryBuffer>(&mut self, arenas: &mut ChunkArenas<B>) {
        let candidates: Vec<ChunkCoordinate> = self.out_of_range.iter().copied().collect();
        for coordinate in candidates {
            if self.in_range(coordinate) {
                self.out_of_range.remove(&coordinate);
                continue;
            }
            match self.world.get_chunk_at(coordinate) {
                Some(chunk) if chunk.is_ready() => {
                    self.evict(&chunk, arenas);
                    self.out_of_range.remove(&coordinate);
                }
                Some(_) => {}
                None => {
                    self.out_of_range.remove(&coordinate);
                }
            }
        }
    }

    fn evict<B: GeometryBuffer>(&mut self, chunk: &Arc<Chunk>, arenas: &mut ChunkArenas<B>) {
        chunk.mark_for_delete();
        self.world.remove(chunk.coordinate);
        arenas.release(&mut chunk.geometry());
        if let Some(recently_touched) = self.recently_touched.as_mut() {
            recently_touched.pop(&chunk.coordinate);
        }
        trace!("Evicted chunk {:?}", chunk.coordinate);

        // Neighbors meshed against this chunk must now treat the seam as open.
        for face in FaceDirection::horizontal() {
            if let Some(neighbor) = self.world.live_neighbor(chunk.coordinate, face) {
                self.context.enqueue(neighbor);
            }
        }
    }

    /// Uploads every mesh published since the last call.
    ///
    /// Must be called from the thread that owns `arenas`.
    ///
    /// # Returns
    /// The number of chunks that became ready.
    pub fn prepare_render<B: GeometryBuffer>(
        &mut self,
        arenas: &mut ChunkArenas<B>,
    ) -> Result<usize, ArenaError> {
        let mut adopted = 0;
        for chunk in self.world.chunks() {
            if chunk.adopt_pending_mesh(|mesh, geometry| arenas.upload_mesh(mesh, geometry))? {
                adopted += 1;
                self.touch(chunk.coordinate);
            }
        }
        if adopted > 0 {
            trace!("Adopted {} meshes", adopted);
        }
        Ok(adopted)
    }

    fn touch(&mut self, coordinate: ChunkCoordinate) {
        let Some(recently_touched) = self.recently_touched.as_mut() else {
            return;
        };
        let Some((idle, _)) = recently_touched.push(coordinate, ()) else {
            return;
        };
        if idle == coordinate {
            return;
        }
        if let Some(chunk) = self.world.get_chunk_at(idle) {
            if chunk.try_compact_voxels() {
                trace!("Compacted idle chunk {:?}", idle);
            }
        }
    }

    /// Writes one voxel and schedules the chunk for remeshing.
    ///
    /// Edits on the column's X/Z boundary also remesh the adjacent neighbor.
    ///
    /// # Arguments
    /// * `coordinate` - Chunk to edit
    /// * `x`, `y`, `z` - Local position inside the chunk
    /// * `id` - New block
    ///
    /// # Returns
    /// `false` if the chunk is not loaded, is being deleted, or has no voxels yet.
    ///
    /// # Panics
    /// Panics if the position lies outside the chunk or `id` is not registered.
    pub fn update_block(
        &mut self,
        coordinate: ChunkCoordinate,
        x: usize,
        y: usize,
        z: usize,
        id: VoxelId,
    ) -> bool {
        assert!(self.registry.contains(id), "unregistered block id {id}");
        let Some(chunk) = self
            .world
            .get_chunk_at(coordinate)
            .filter(|chunk| !chunk.is_marked_for_delete())
        else {
            return false;
        };
        if !chunk.set_block(x, y, z, id) {
            return false;
        }
        if self.dimensions.is_on_boundary(x, z) {
            chunk.set_edge_update();
        }
        trace!("Set ({}, {}, {}) in chunk {:?} to {}", x, y, z, coordinate, id);
        self.context.enqueue(chunk);
        self.touch(coordinate);
        true
    }

    /// Writes one voxel at a world position.
    ///
    /// # Returns
    /// `false` if the position is outside the vertical extent or its chunk cannot
    /// be edited right now.
    pub fn place_or_remove_block(&mut self, world_x: i32, world_y: i32, world_z: i32, id: VoxelId) -> bool {
        if world_y < 0 || world_y as usize >= self.dimensions.height {
            return false;
        }
        let (coordinate, x, z) =
            ChunkCoordinate::resolve_block(world_x, world_z, self.dimensions.width);
        self.update_block(coordinate, x, world_y as usize, z, id)
    }

    /// Reads one voxel at a world position.
    ///
    /// # Returns
    /// `None` if the position is outside the vertical extent or its chunk has no
    /// voxels.
    pub fn block_at(&self, world_x: i32, world_y: i32, world_z: i32) -> Option<VoxelId> {
        if world_y < 0 || world_y as usize >= self.dimensions.height {
            return None;
        }
        let (coordinate, x, z) =
            ChunkCoordinate::resolve_block(world_x, world_z, self.dimensions.width);
        self.world
            .get_chunk_at(coordinate)?
            .block(x, world_y as usize, z)
    }

    /// Draw data of every ready chunk, nearest first.
    ///
    /// A chunk waiting for a newer mesh is listed with its previous geometry.
    pub fn render_list(&self) -> Vec<ChunkDrawData> {
        let mut list: Vec<ChunkDrawData> = self
            .world
            .chunks()
            .into_iter()
            .filter(|chunk| chunk.is_ready() && !chunk.is_marked_for_delete())
            .map(|chunk| ChunkDrawData {
                coordinate: chunk.coordinate,
                origin: chunk.coordinate.world_origin(self.dimensions),
                geometry: *chunk.geometry(),
            })
            .collect();
        if let Some(center) = self.center {
            list.sort_by_key(|draw| draw.coordinate.distance_squared(center));
        }
        list
    }

    /// Changes the render distance. Takes effect on the next update.
    pub fn set_render_distance(&mut self, render_distance: u32) {
        if render_distance != self.render_distance {
            info!("Render distance changed to {}", render_distance);
            self.render_distance = render_distance;
            self.visibility_dirty = true;
        }
    }

    /// Current render distance in chunks.
    pub fn render_distance(&self) -> u32 {
        self.render_distance
    }

    /// The chunk the viewer was in at the last update.
    pub fn center(&self) -> Option<ChunkCoordinate> {
        self.center
    }

    /// Size of every chunk column.
    pub fn dimensions(&self) -> ChunkDimensions {
        self.dimensions
    }

    /// A loaded chunk.
    pub fn chunk(&self, coordinate: ChunkCoordinate) -> Option<Arc<Chunk>> {
        self.world.get_chunk_at(coordinate)
    }

    /// Coordinates of every loaded chunk.
    pub fn loaded_coordinates(&self) -> Vec<ChunkCoordinate> {
        self.world.coordinates()
    }

    /// Whether all work has drained: no jobs, every chunk ready with its latest
    /// mesh uploaded, nothing left to evict.
    pub fn is_settled(&self) -> bool {
        self.tasks.is_idle()
            && self.out_of_range.is_empty()
            && self
                .world
                .chunks()
                .iter()
                .all(|chunk| chunk.is_ready() && !chunk.has_pending_mesh())
    }

    /// Current counters.
    pub fn stats(&self) -> StreamerStats {
        let chunks = self.world.chunks();
        StreamerStats {
            loaded: chunks.len(),
            ready: chunks.iter().filter(|chunk| chunk.is_ready()).count(),
            compact: chunks.iter().filter(|chunk| chunk.is_compact()).count(),
            pending_jobs: self.tasks.pending(),
            awaiting_eviction: self.out_of_range.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rings_cover_a_disc() {
        let origin = ChunkCoordinate::new(0, 0);
        let coordinates = coordinates_within(origin, 2);
        assert_eq!(coordinates.len(), 13);
        assert_eq!(coordinates[0], origin);
        assert!(coordinates.contains(&ChunkCoordinate::new(0, -2)));
        assert!(!coordinates.contains(&ChunkCoordinate::new(2, 1)));
        assert_eq!(coordinates_within(origin, 0), vec![origin]);
    }

    #[test]
    fn rings_are_ordered_outward() {
        let center = ChunkCoordinate::new(5, -3);
        let rings: Vec<i32> = coordinates_within(center, 4)
            .iter()
            .map(|c| (c.x - center.x).abs().max((c.z - center.z).abs()))
            .collect();
        assert!(rings.windows(2).all(|pair| pair[0] <= pair[1]));
    }
}
