//! # World Module
//!
//! The chunk table: the single authoritative map from `ChunkCoordinate` to
//! `Chunk`.
//!
//! ## Ownership
//!
//! Only the streamer inserts and removes entries. Workers hold a clone of the
//! table handle and only read it to resolve neighbors. Chunks are handed out as
//! `Arc<Chunk>`, so a worker that still holds a chunk after it was evicted keeps
//! it alive until the job ends.
//!
//! ## Performance Considerations
//!
//! - Lookups are a hash probe under a read lock; the lock is never held while
//!   meshing
//! - Inserts and removals take the write lock briefly on the coordinator thread

use std::{collections::HashMap, sync::Arc};

use crate::core::MtResource;

use super::{
    block::block_side::FaceDirection,
    chunk::{Chunk, ChunkCoordinate},
};

/// A sparse map of loaded chunk columns.
#[derive(Clone, Default)]
pub struct World {
    chunks: MtResource<HashMap<ChunkCoordinate, Arc<Chunk>>>,
}

impl World {
    /// Creates an empty table.
    pub fn new() -> Self {
        World {
            chunks: MtResource::new(HashMap::new()),
        }
    }

    /// Retrieves the chunk at the given coordinate.
    ///
    /// # Returns
    /// A shared handle to the chunk, or `None` if it is not loaded.
    pub fn get_chunk_at(&self, coordinate: ChunkCoordinate) -> Option<Arc<Chunk>> {
        self.chunks.get().get(&coordinate).cloned()
    }

    /// Whether a chunk is loaded at the coordinate.
    pub fn contains(&self, coordinate: ChunkCoordinate) -> bool {
        self.chunks.get().contains_key(&coordinate)
    }

    /// Creates a chunk at the coordinate unless one exists.
    ///
    /// # Returns
    /// The new chunk, or `None` if the coordinate was already loaded.
    pub fn insert(&self, coordinate: ChunkCoordinate) -> Option<Arc<Chunk>> {
        let mut chunks = self.chunks.get_mut();
        if chunks.contains_key(&coordinate) {
            return None;
        }
        let chunk = Arc::new(Chunk::new(coordinate));
        chunks.insert(coordinate, chunk.clone());
        Some(chunk)
    }

    /// Drops the table's handle to a chunk.
    pub fn remove(&self, coordinate: ChunkCoordinate) -> Option<Arc<Chunk>> {
        self.chunks.get_mut().remove(&coordinate)
    }

    /// Snapshot of every loaded coordinate.
    pub fn coordinates(&self) -> Vec<ChunkCoordinate> {
        self.chunks.get().keys().copied().collect()
    }

    /// Snapshot of every loaded chunk.
    pub fn chunks(&self) -> Vec<Arc<Chunk>> {
        self.chunks.get().values().cloned().collect()
    }

    /// Number of loaded chunks.
    pub fn len(&self) -> usize {
        self.chunks.get().len()
    }

    /// Whether no chunk is loaded.
    pub fn is_empty(&self) -> bool {
        self.chunks.get().is_empty()
    }

    /// The neighbor across `face` if it is loaded and not being deleted.
    pub fn live_neighbor(&self, coordinate: ChunkCoordinate, face: FaceDirection) -> Option<Arc<Chunk>> {
        self.get_chunk_at(coordinate.neighbor(face))
            .filter(|chunk| !chunk.is_marked_for_delete())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent() {
        let world = World::new();
        let origin = ChunkCoordinate::new(0, 0);
        assert!(world.insert(origin).is_some());
        assert!(world.insert(origin).is_none());
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn neighbors_being_deleted_are_hidden() {
        let world = World::new();
        let origin = ChunkCoordinate::new(0, 0);
        world.insert(origin);
        let east = world.insert(origin.neighbor(FaceDirection::East)).unwrap();

        assert!(world.live_neighbor(origin, FaceDirection::East).is_some());
        east.mark_for_delete();
        assert!(world.live_neighbor(origin, FaceDirection::East).is_none());
        assert!(world.live_neighbor(origin, FaceDirection::West).is_none());

        world.remove(east.coordinate);
        assert!(!world.contains(east.coordinate));
        assert_eq!(world.coordinates(), vec![origin]);
    }
}
