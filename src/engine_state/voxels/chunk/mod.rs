//! # Chunk Module
//!
//! A chunk is one full-height column of voxels together with the state the
//! streamer tracks for it.
//!
//! ## Lifecycle
//!
//! `Unscheduled → Queued → VoxelsGenerated → Meshed → Ready → MarkedForDelete`,
//! after which the chunk is dropped from the table and freed once the last worker
//! lets go of it.
//!
//! ## Locking
//!
//! * `voxels` is a shared/exclusive lock: workers copy the voxels out under a
//!   read lock and mesh the copy, edits and generation take the write lock.
//! * `build_lock` is only ever try-acquired. A worker that loses the race drops its
//!   job instead of waiting.
//! * `pending_mesh` serializes the handoff between the worker that publishes a
//!   mesh and the coordinator that uploads it. `ready` only goes from false to
//!   true, while it is held; a chunk keeps drawing its previous geometry until
//!   the replacement is uploaded.
//! * `geometry` is only touched by the coordinator.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Mutex, MutexGuard, TryLockError,
};

use cgmath::Point3;
use serde::{Deserialize, Serialize};

use crate::{
    core::MtResource,
    engine_state::{
        buffer_state::chunk_arenas::ChunkGeometry,
        rendering::meshing::ChunkMesh,
        voxels::block::{block_side::FaceDirection, VoxelId},
    },
};

pub mod chunk_creation;
pub mod chunk_iteration;
pub mod voxel_store;

pub use voxel_store::{BoundarySlice, VoxelStore};

/// Default column width in voxels.
pub const CHUNK_WIDTH: usize = 32;
/// Default column height in voxels.
pub const CHUNK_HEIGHT: usize = 256;

/// Size of a chunk column.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkDimensions {
    /// Extent along X and Z
    pub width: usize,
    /// Extent along Y
    pub height: usize,
}

impl ChunkDimensions {
    /// Creates a column size.
    pub const fn new(width: usize, height: usize) -> Self {
        ChunkDimensions { width, height }
    }

    /// Number of cells in one horizontal layer.
    pub fn plane(&self) -> usize {
        self.width * self.width
    }

    /// Number of cells in the column.
    pub fn volume(&self) -> usize {
        self.plane() * self.height
    }

    /// Whether `(x, z)` lies on the outermost ring of the column.
    pub fn is_on_boundary(&self, x: usize, z: usize) -> bool {
        x == 0 || z == 0 || x + 1 == self.width || z + 1 == self.width
    }
}

impl Default for ChunkDimensions {
    fn default() -> Self {
        ChunkDimensions::new(CHUNK_WIDTH, CHUNK_HEIGHT)
    }
}

/// Key of a chunk column in chunk units.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoordinate {
    /// Column index along X
    pub x: i32,
    /// Column index along Z
    pub z: i32,
}

impl ChunkCoordinate {
    /// Creates a coordinate.
    pub const fn new(x: i32, z: i32) -> Self {
        ChunkCoordinate { x, z }
    }

    /// The column containing a world-space point.
    pub fn containing(position: Point3<f32>, width: usize) -> Self {
        let width = width as f32;
        ChunkCoordinate::new(
            (position.x / width).floor() as i32,
            (position.z / width).floor() as i32,
        )
    }

    /// Splits a world block position into its column and the local X/Z inside it.
    pub fn resolve_block(world_x: i32, world_z: i32, width: usize) -> (Self, usize, usize) {
        let width = width as i32;
        (
            ChunkCoordinate::new(world_x.div_euclid(width), world_z.div_euclid(width)),
            world_x.rem_euclid(width) as usize,
            world_z.rem_euclid(width) as usize,
        )
    }

    /// The coordinate `dx`, `dz` columns away.
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        ChunkCoordinate::new(self.x + dx, self.z + dz)
    }

    /// The adjacent column across a horizontal face.
    pub fn neighbor(self, face: FaceDirection) -> Self {
        let offset = face.offset();
        self.offset(offset.x, offset.z)
    }

    /// Squared Euclidean distance in chunk units.
    pub fn distance_squared(self, other: ChunkCoordinate) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dz * dz
    }

    /// Position of the column's (0, 0, 0) corner in world space.
    pub fn world_origin(self, dimensions: ChunkDimensions) -> Point3<f32> {
        Point3::new(
            (self.x as i64 * dimensions.width as i64) as f32,
            0.0,
            (self.z as i64 * dimensions.width as i64) as f32,
        )
    }
}

/// Coarse lifecycle stage derived from a chunk's flags.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChunkState {
    /// Created but never scheduled
    Unscheduled,
    /// Waiting for a worker
    Queued,
    /// Voxels exist, no mesh yet
    VoxelsGenerated,
    /// A mesh is waiting to be uploaded
    Meshed,
    /// Geometry is uploaded and drawable
    Ready,
    /// Slated for removal; excluded from scheduling and rendering
    MarkedForDelete,
}

/// One column's voxels, flags and geometry handles.
pub struct Chunk {
    /// Key of this column
    pub coordinate: ChunkCoordinate,
    voxels: MtResource<Option<VoxelStore>>,
    build_lock: Mutex<()>,
    generated: AtomicBool,
    meshed: AtomicBool,
    ready: AtomicBool,
    marked_for_delete: AtomicBool,
    edge_update: AtomicBool,
    rebuild_requested: AtomicBool,
    neighbor_presence: [AtomicBool; 4],
    mesh_revision: AtomicU64,
    pending_mesh: Mutex<Option<ChunkMesh>>,
    geometry: Mutex<ChunkGeometry>,
}

impl Chunk {
    /// Creates an unscheduled chunk with no voxels.
    pub fn new(coordinate: ChunkCoordinate) -> Self {
        Chunk {
            coordinate,
            voxels: MtResource::new(None),
            build_lock: Mutex::new(()),
            generated: AtomicBool::new(false),
            meshed: AtomicBool::new(false),
            ready: AtomicBool::new(false),
            marked_for_delete: AtomicBool::new(false),
            edge_update: AtomicBool::new(false),
            rebuild_requested: AtomicBool::new(false),
            neighbor_presence: Default::default(),
            mesh_revision: AtomicU64::new(0),
            pending_mesh: Mutex::new(None),
            geometry: Mutex::new(ChunkGeometry::default()),
        }
    }

    /// Current lifecycle stage.
    pub fn state(&self) -> ChunkState {
        if self.is_marked_for_delete() {
            ChunkState::MarkedForDelete
        } else if self.has_pending_mesh() {
            ChunkState::Meshed
        } else if self.is_ready() {
            ChunkState::Ready
        } else if self.is_meshed() {
            ChunkState::Meshed
        } else if self.is_generated() {
            ChunkState::VoxelsGenerated
        } else if self.rebuild_requested() {
            ChunkState::Queued
        } else {
            ChunkState::Unscheduled
        }
    }

    /// Whether the voxels have been populated.
    pub fn is_generated(&self) -> bool {
        self.generated.load(Ordering::Acquire)
    }

    /// Whether a mesh has been built since the last rebuild request.
    pub fn is_meshed(&self) -> bool {
        self.meshed.load(Ordering::Acquire)
    }

    /// Whether geometry has been uploaded and is safe to draw.
    ///
    /// Stays set while a newer mesh waits for upload.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Whether the chunk is slated for removal.
    pub fn is_marked_for_delete(&self) -> bool {
        self.marked_for_delete.load(Ordering::Acquire)
    }

    /// Excludes the chunk from all further scheduling and rendering.
    pub fn mark_for_delete(&self) {
        self.marked_for_delete.store(true, Ordering::Release);
    }

    /// Number of meshes published for this chunk so far.
    pub fn mesh_revision(&self) -> u64 {
        self.mesh_revision.load(Ordering::Acquire)
    }

    /// Whether a rebuild was requested and not yet picked up by a worker.
    pub fn rebuild_requested(&self) -> bool {
        self.rebuild_requested.load(Ordering::Acquire)
    }

    /// Flags the chunk for a rebuild.
    ///
    /// # Returns
    /// `true` when the caller must publish a job: the chunk is live and no
    /// request was outstanding.
    pub(crate) fn request_rebuild(&self) -> bool {
        if self.is_marked_for_delete() {
            return false;
        }
        self.meshed.store(false, Ordering::Release);
        !self.rebuild_requested.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn take_rebuild_request(&self) -> bool {
        self.rebuild_requested.swap(false, Ordering::AcqRel)
    }

    /// Try-acquires the per-chunk build lock.
    pub(crate) fn try_begin_build(&self) -> Option<MutexGuard<'_, ()>> {
        match self.build_lock.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::WouldBlock) => None,
            Err(TryLockError::Poisoned(error)) => panic!("chunk build lock poisoned: {error}"),
        }
    }

    /// Marks that the column boundary changed and neighbors must remesh.
    pub(crate) fn set_edge_update(&self) {
        self.edge_update.store(true, Ordering::Release);
    }

    pub(crate) fn take_edge_update(&self) -> bool {
        self.edge_update.swap(false, Ordering::AcqRel)
    }

    /// Which neighbors (indexed by horizontal face) were present at the last mesh.
    pub fn neighbor_presence(&self) -> [bool; 4] {
        std::array::from_fn(|i| self.neighbor_presence[i].load(Ordering::Acquire))
    }

    pub(crate) fn store_neighbor_presence(&self, presence: [bool; 4]) {
        for (flag, present) in self.neighbor_presence.iter().zip(presence) {
            flag.store(present, Ordering::Release);
        }
    }

    /// Installs freshly generated voxels.
    pub(crate) fn store_generated_voxels(&self, store: VoxelStore) {
        *self.voxels.get_mut() = Some(store);
        self.generated.store(true, Ordering::Release);
        self.set_edge_update();
    }

    /// Reads one voxel.
    ///
    /// # Returns
    /// `None` while the chunk has no voxels.
    pub fn block(&self, x: usize, y: usize, z: usize) -> Option<VoxelId> {
        self.voxels.get().as_ref().map(|store| store.get(x, y, z))
    }

    /// Writes one voxel.
    ///
    /// # Returns
    /// `false` while the chunk has no voxels.
    pub(crate) fn set_block(&self, x: usize, y: usize, z: usize, id: VoxelId) -> bool {
        match self.voxels.get_mut().as_mut() {
            Some(store) => {
                store.set(x, y, z, id);
                true
            }
            None => false,
        }
    }

    /// Dense copy of the voxels, taken under the shared lock.
    pub fn snapshot_voxels(&self) -> Option<VoxelStore> {
        self.with_voxels(|store| VoxelStore::from_dense(store.dimensions(), store.to_dense()))
    }

    /// Runs `f` against the voxels under the shared lock.
    pub fn with_voxels<R>(&self, f: impl FnOnce(&VoxelStore) -> R) -> Option<R> {
        self.voxels.get().as_ref().map(f)
    }

    /// Copies the layer of voxels a neighbor across `face` sees.
    pub fn boundary(&self, face: FaceDirection) -> Option<BoundarySlice> {
        self.with_voxels(|store| store.boundary(face))
    }

    /// Switches the voxels to run-length storage unless a worker is reading them.
    ///
    /// # Returns
    /// `true` if the store is compact afterwards.
    pub(crate) fn try_compact_voxels(&self) -> bool {
        match self.voxels.try_get_mut() {
            Some(mut voxels) => match voxels.as_mut() {
                Some(store) => {
                    store.compact();
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    /// Whether the voxels currently use run-length storage.
    pub fn is_compact(&self) -> bool {
        self.with_voxels(VoxelStore::is_compact).unwrap_or(false)
    }

    /// Hands a finished mesh to the coordinator.
    pub(crate) fn publish_mesh(&self, mesh: ChunkMesh) {
        let mut pending = self.pending_mesh.lock().unwrap();
        *pending = Some(mesh);
        self.meshed.store(true, Ordering::Release);
        self.mesh_revision.fetch_add(1, Ordering::AcqRel);
    }

    /// Whether a published mesh is waiting for upload.
    pub fn has_pending_mesh(&self) -> bool {
        self.pending_mesh.lock().unwrap().is_some()
    }

    /// Uploads the pending mesh with `upload` and marks the chunk ready.
    ///
    /// `upload` replaces the previous geometry in place, so the chunk stays
    /// drawable across the swap. On error the pending mesh is dropped and the
    /// previous geometry is kept.
    ///
    /// # Returns
    /// `Ok(true)` if a mesh was adopted, `Ok(false)` if there was nothing to do.
    pub(crate) fn adopt_pending_mesh<E>(
        &self,
        upload: impl FnOnce(&ChunkMesh, &mut ChunkGeometry) -> Result<(), E>,
    ) -> Result<bool, E> {
        let mut pending = self.pending_mesh.lock().unwrap();
        if self.is_marked_for_delete() || !self.is_generated() {
            return Ok(false);
        }
        let Some(mesh) = pending.take() else {
            return Ok(false);
        };
        upload(&mesh, &mut self.geometry.lock().unwrap())?;
        self.ready.store(true, Ordering::Release);
        Ok(true)
    }

    /// Arena handles of the uploaded geometry.
    pub fn geometry(&self) -> MutexGuard<'_, ChunkGeometry> {
        self.geometry.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::{AIR, STONE_BLOCK};

    #[test]
    fn resolves_negative_world_positions() {
        let (coordinate, x, z) = ChunkCoordinate::resolve_block(-1, 33, 32);
        assert_eq!(coordinate, ChunkCoordinate::new(-1, 1));
        assert_eq!((x, z), (31, 1));

        let viewer = Point3::new(-0.5, 70.0, 31.9);
        assert_eq!(
            ChunkCoordinate::containing(viewer, 32),
            ChunkCoordinate::new(-1, 0)
        );
    }

    #[test]
    fn neighbors_follow_face_offsets() {
        let origin = ChunkCoordinate::new(2, 2);
        assert_eq!(origin.neighbor(FaceDirection::North), ChunkCoordinate::new(2, 1));
        assert_eq!(origin.neighbor(FaceDirection::East), ChunkCoordinate::new(3, 2));
    }

    #[test]
    fn state_follows_lifecycle() {
        let chunk = Chunk::new(ChunkCoordinate::new(0, 0));
        assert_eq!(chunk.state(), ChunkState::Unscheduled);

        assert!(chunk.request_rebuild());
        assert!(!chunk.request_rebuild());
        assert_eq!(chunk.state(), ChunkState::Queued);

        let mut store = VoxelStore::new(ChunkDimensions::new(2, 2));
        store.set(0, 0, 0, STONE_BLOCK);
        chunk.store_generated_voxels(store);
        assert!(chunk.take_rebuild_request());
        assert_eq!(chunk.state(), ChunkState::VoxelsGenerated);
        assert!(chunk.take_edge_update());

        chunk.publish_mesh(ChunkMesh::default());
        assert_eq!(chunk.state(), ChunkState::Meshed);

        let adopted = chunk.adopt_pending_mesh(|_, _| Ok::<(), ()>(())).unwrap();
        assert!(adopted);
        assert_eq!(chunk.state(), ChunkState::Ready);
        assert_eq!(chunk.block(0, 0, 0), Some(STONE_BLOCK));

        chunk.mark_for_delete();
        assert!(!chunk.request_rebuild());
        assert_eq!(chunk.state(), ChunkState::MarkedForDelete);
    }

    #[test]
    fn stays_ready_while_a_new_mesh_waits() {
        let chunk = Chunk::new(ChunkCoordinate::new(0, 0));
        chunk.store_generated_voxels(VoxelStore::new(ChunkDimensions::new(2, 2)));
        chunk.publish_mesh(ChunkMesh::default());
        assert!(chunk.adopt_pending_mesh(|_, _| Ok::<(), ()>(())).unwrap());

        assert!(chunk.request_rebuild());
        chunk.publish_mesh(ChunkMesh::default());
        assert!(chunk.is_ready());
        assert_eq!(chunk.state(), ChunkState::Meshed);

        assert!(chunk.adopt_pending_mesh(|_, _| Ok::<(), ()>(())).unwrap());
        assert!(!chunk.has_pending_mesh());
        assert_eq!(chunk.state(), ChunkState::Ready);
        assert_eq!(chunk.mesh_revision(), 2);
    }

    #[test]
    fn snapshots_are_dense_and_detached() {
        let chunk = Chunk::new(ChunkCoordinate::new(0, 0));
        let mut store = VoxelStore::new(ChunkDimensions::new(2, 3));
        store.set(1, 0, 1, STONE_BLOCK);
        chunk.store_generated_voxels(store);
        assert!(chunk.try_compact_voxels());

        let snapshot = chunk.snapshot_voxels().unwrap();
        assert!(!snapshot.is_compact());
        assert_eq!(snapshot.get(1, 0, 1), STONE_BLOCK);

        // The lock is free again and later edits leave the copy alone.
        assert!(chunk.set_block(1, 0, 1, AIR));
        assert_eq!(snapshot.get(1, 0, 1), STONE_BLOCK);
        assert!(chunk.is_compact());
    }
}
