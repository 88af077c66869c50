//! # Buffer State Module
//!
//! Append-only geometry arenas that pack many chunks' triangle streams into a
//! few large buffers and hand out `{offset, size}` handles into them.
//!
//! ## Architecture
//!
//! * [`GeometryBuffer`] abstracts the storage behind an arena: a growable byte
//!   buffer. [`HostBuffer`] keeps the bytes in memory, [`gpu_buffer::GpuBuffer`]
//!   keeps them in a `wgpu` buffer.
//! * [`GeometryArena`] allocates at the tail of one buffer and grows it
//!   geometrically when it runs out of space. Existing contents survive growth
//!   and issued offsets never move.
//! * [`chunk_arenas::ChunkArenas`] groups six arenas (vertices and indices for
//!   each of the three streams) and uploads whole chunk meshes.
//!
//! ## Reclamation
//!
//! `remove` only forgets a node. The byte range it covered is never reused or
//! compacted, so heavy chunk churn grows the buffers without bound; the wasted
//! amount is reported by [`GeometryArena::leaked_bytes`].
//!
//! ## Performance Considerations
//!
//! * Appends are O(1) apart from the occasional growth copy
//! * Growth is at least 1.5x so the amortized copy cost per byte is constant

use std::collections::HashMap;

use log::debug;
use thiserror::Error;

pub mod chunk_arenas;
pub mod gpu_buffer;

/// Offsets and sizes are kept multiples of this many bytes, as buffer copies
/// and queue writes require.
pub const ARENA_ALIGNMENT: u64 = wgpu::COPY_BUFFER_ALIGNMENT;

/// Errors raised by arena storage.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArenaError {
    /// The buffer would have to grow past what the backend allows.
    #[error("arena needs {requested} bytes but the backend allows at most {limit}")]
    CapacityExceeded {
        /// Capacity that was asked for
        requested: u64,
        /// Largest capacity the backend supports
        limit: u64,
    },
    /// A write fell outside the buffer.
    #[error("write of {len} bytes at offset {offset} exceeds capacity {capacity}")]
    OutOfBounds {
        /// Start of the write
        offset: u64,
        /// Length of the write
        len: u64,
        /// Capacity of the buffer
        capacity: u64,
    },
}

/// Usage counters of an arena's buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferAnalytics {
    /// Total memory allocated for the buffer in bytes
    pub allocated_memory: u64,
    /// Bytes below the arena tail, live or not
    pub used_memory: u64,
    /// Number of times the buffer has been written to
    pub times_written: u64,
    /// Number of times the buffer has been reallocated
    pub times_grown: u64,
}

/// A growable byte buffer an arena can allocate from.
pub trait GeometryBuffer {
    /// Current size in bytes.
    fn capacity(&self) -> u64;

    /// Reallocates to `new_capacity` bytes, keeping the current contents.
    ///
    /// `new_capacity` is always larger than the current capacity and a multiple
    /// of [`ARENA_ALIGNMENT`].
    fn grow(&mut self, new_capacity: u64) -> Result<(), ArenaError>;

    /// Copies `data` to `offset`.
    fn write(&mut self, offset: u64, data: &[u8]) -> Result<(), ArenaError>;
}

/// Handle to one allocation inside an arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryNode {
    /// Identifier unique within the issuing arena
    pub id: u64,
    /// Byte offset of the allocation
    pub offset: u64,
    /// Size of the stored data in bytes
    pub size: u64,
}

fn align(bytes: u64) -> u64 {
    bytes.div_ceil(ARENA_ALIGNMENT) * ARENA_ALIGNMENT
}

/// Append-only allocator over one growable buffer.
pub struct GeometryArena<B> {
    label: &'static str,
    buffer: B,
    tail: u64,
    next_id: u64,
    nodes: HashMap<u64, GeometryNode>,
    live_bytes: u64,
    analytics: BufferAnalytics,
}

impl<B: GeometryBuffer> GeometryArena<B> {
    /// Creates an arena over `buffer`.
    ///
    /// # Arguments
    /// * `label` - Name used in log messages
    /// * `buffer` - Backing storage; its current capacity is the initial size
    pub fn new(label: &'static str, buffer: B) -> Self {
        let analytics = BufferAnalytics {
            allocated_memory: buffer.capacity(),
            ..Default::default()
        };
        GeometryArena {
            label,
            buffer,
            tail: 0,
            next_id: 0,
            nodes: HashMap::new(),
            live_bytes: 0,
            analytics,
        }
    }

    /// Appends `data` at the tail, growing the buffer if needed.
    ///
    /// # Returns
    /// A handle whose offset stays valid until the node is removed, or the
    /// backend's error if the buffer could not grow.
    pub fn add(&mut self, data: &[u8]) -> Result<GeometryNode, ArenaError> {
        let size = data.len() as u64;
        let offset = self.tail;
        let needed = offset + align(size);
        let capacity = self.buffer.capacity();

        if needed > capacity {
            let target = align((capacity + capacity / 2).max(needed));
            debug!(
                "Growing {} arena from {} to {} bytes",
                self.label, capacity, target
            );
            self.buffer.grow(target)?;
            self.analytics.allocated_memory = self.buffer.capacity();
            self.analytics.times_grown += 1;
        }

        if size > 0 {
            self.buffer.write(offset, data)?;
            self.analytics.times_written += 1;
        }

        let node = GeometryNode {
            id: self.next_id,
            offset,
            size,
        };
        self.next_id += 1;
        self.tail = needed;
        self.live_bytes += align(size);
        self.analytics.used_memory = self.tail;
        self.nodes.insert(node.id, node);
        Ok(node)
    }

    /// Forgets a node. Its bytes are not reclaimed.
    ///
    /// # Returns
    /// `false` if the node was not live in this arena.
    pub fn remove(&mut self, node: &GeometryNode) -> bool {
        match self.nodes.remove(&node.id) {
            Some(removed) => {
                self.live_bytes -= align(removed.size);
                true
            }
            None => false,
        }
    }

    /// Whether the node is live in this arena.
    pub fn contains(&self, node: &GeometryNode) -> bool {
        self.nodes.get(&node.id) == Some(node)
    }

    /// Number of live nodes.
    pub fn live_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Offset at which the next allocation will start.
    pub fn tail(&self) -> u64 {
        self.tail
    }

    /// Current buffer size in bytes.
    pub fn capacity(&self) -> u64 {
        self.buffer.capacity()
    }

    /// Bytes below the tail that belong to removed nodes.
    pub fn leaked_bytes(&self) -> u64 {
        self.tail - self.live_bytes
    }

    /// Usage counters.
    pub fn analytics(&self) -> BufferAnalytics {
        self.analytics
    }

    /// The backing buffer.
    pub fn buffer(&self) -> &B {
        &self.buffer
    }
}

/// A geometry buffer kept in main memory.
///
/// Used when no graphics device is available (headless runs and tests) and as a
/// reference for what a GPU backend must do.
#[derive(Debug, Clone, Default)]
pub struct HostBuffer {
    bytes: Vec<u8>,
    limit: Option<u64>,
}

impl HostBuffer {
    /// Creates a zeroed buffer of `capacity` bytes.
    pub fn new(capacity: u64) -> Self {
        HostBuffer {
            bytes: vec![0; align(capacity) as usize],
            limit: None,
        }
    }

    /// Caps how far the buffer may grow.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Reads back `node`'s bytes.
    pub fn read(&self, node: &GeometryNode) -> &[u8] {
        &self.bytes[node.offset as usize..(node.offset + node.size) as usize]
    }
}

impl GeometryBuffer for HostBuffer {
    fn capacity(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn grow(&mut self, new_capacity: u64) -> Result<(), ArenaError> {
        if let Some(limit) = self.limit.filter(|limit| new_capacity > *limit) {
            return Err(ArenaError::CapacityExceeded {
                requested: new_capacity,
                limit,
            });
        }
        self.bytes.resize(new_capacity as usize, 0);
        Ok(())
    }

    fn write(&mut self, offset: u64, data: &[u8]) -> Result<(), ArenaError> {
        let end = offset + data.len() as u64;
        if end > self.capacity() {
            return Err(ArenaError::OutOfBounds {
                offset,
                len: data.len() as u64,
                capacity: self.capacity(),
            });
        }
        self.bytes[offset as usize..end as usize].copy_from_slice(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena(capacity: u64) -> GeometryArena<HostBuffer> {
        GeometryArena::new("test", HostBuffer::new(capacity))
    }

    #[test]
    fn growth_is_geometric_and_keeps_contents() {
        let mut arena = arena(16);
        let first = arena.add(&[1; 12]).unwrap();
        let second = arena.add(&[2; 8]).unwrap();

        assert_eq!(arena.capacity(), 24);
        assert_eq!(arena.analytics().times_grown, 1);
        assert_eq!((first.offset, second.offset), (0, 12));
        assert_eq!(arena.buffer().read(&first), &[1; 12]);
        assert_eq!(arena.buffer().read(&second), &[2; 8]);

        let large = arena.add(&[3; 100]).unwrap();
        assert_eq!(arena.capacity(), 120);
        assert_eq!(arena.buffer().read(&first), &[1; 12]);
        assert_eq!(arena.buffer().read(&large), &[3; 100]);
    }

    #[test]
    fn offsets_are_aligned() {
        let mut arena = arena(64);
        arena.add(&[7; 5]).unwrap();
        let next = arena.add(&[8; 4]).unwrap();
        assert_eq!(next.offset, 8);
        assert_eq!(arena.tail(), 12);
    }

    #[test]
    fn removal_does_not_reclaim() {
        let mut arena = arena(64);
        let first = arena.add(&[1; 16]).unwrap();
        let second = arena.add(&[2; 16]).unwrap();

        assert!(arena.remove(&first));
        assert!(!arena.remove(&first));
        assert!(!arena.contains(&first));
        assert!(arena.contains(&second));

        let third = arena.add(&[3; 16]).unwrap();
        assert_eq!(third.offset, 32);
        assert_eq!(arena.leaked_bytes(), 16);
        assert_eq!(arena.live_nodes(), 2);
        assert_eq!(arena.buffer().read(&second), &[2; 16]);
    }

    #[test]
    fn backend_limits_surface_as_errors() {
        let mut arena = GeometryArena::new("test", HostBuffer::new(8).with_limit(32));
        arena.add(&[0; 8]).unwrap();
        let error = arena.add(&[0; 64]).unwrap_err();
        assert_eq!(
            error,
            ArenaError::CapacityExceeded {
                requested: 72,
                limit: 32
            }
        );
        assert_eq!(arena.tail(), 8);
    }

    #[test]
    fn empty_data_gets_a_node() {
        let mut arena = arena(0);
        let node = arena.add(&[]).unwrap();
        assert_eq!(node.size, 0);
        assert_eq!(arena.capacity(), 0);
        assert!(arena.contains(&node));
    }
}
