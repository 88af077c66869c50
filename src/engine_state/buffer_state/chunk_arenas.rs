//! # Chunk Arenas Module
//!
//! Uploads chunk meshes into six arenas: a vertex arena and an index arena for
//! each of the opaque, liquid and billboard streams. A chunk's uploaded geometry
//! is described by a [`ChunkGeometry`] of up to three [`StreamHandle`]s.

use std::sync::Arc;

use bytemuck::NoUninit;
use log::trace;
use wgpu::{BufferUsages, Device, Queue};

use crate::engine_state::rendering::{
    meshing::{ChunkMesh, MeshStream},
    vertex::{BillboardVertex, Vertex},
};

use super::{
    gpu_buffer::GpuBuffer, ArenaError, BufferAnalytics, GeometryArena, GeometryBuffer,
    GeometryNode, HostBuffer,
};

/// The three triangle streams of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Solid, transparent and leaves faces
    Opaque,
    /// Liquid faces
    Liquid,
    /// Crossed billboard quads
    Billboard,
}

impl StreamKind {
    /// Every stream, in draw order.
    pub fn all() -> [StreamKind; 3] {
        [StreamKind::Opaque, StreamKind::Billboard, StreamKind::Liquid]
    }

    fn labels(self) -> (&'static str, &'static str) {
        match self {
            StreamKind::Opaque => ("Opaque Vertex Arena", "Opaque Index Arena"),
            StreamKind::Liquid => ("Liquid Vertex Arena", "Liquid Index Arena"),
            StreamKind::Billboard => ("Billboard Vertex Arena", "Billboard Index Arena"),
        }
    }
}

/// Where one uploaded stream lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHandle {
    /// Allocation in the vertex arena
    pub vertices: GeometryNode,
    /// Allocation in the index arena
    pub indices: GeometryNode,
    /// Index of the stream's first vertex in the vertex arena
    pub vertex_base: u32,
    /// Index of the stream's first index in the index arena
    pub first_index: u32,
    /// Number of indices to draw
    pub index_count: u32,
}

/// Arena handles of one chunk's uploaded streams. Empty streams have no handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkGeometry {
    /// Opaque stream
    pub opaque: Option<StreamHandle>,
    /// Liquid stream
    pub liquid: Option<StreamHandle>,
    /// Billboard stream
    pub billboard: Option<StreamHandle>,
}

impl ChunkGeometry {
    /// The handle of one stream.
    pub fn handle(&self, kind: StreamKind) -> Option<StreamHandle> {
        match kind {
            StreamKind::Opaque => self.opaque,
            StreamKind::Liquid => self.liquid,
            StreamKind::Billboard => self.billboard,
        }
    }

    fn handle_mut(&mut self, kind: StreamKind) -> &mut Option<StreamHandle> {
        match kind {
            StreamKind::Opaque => &mut self.opaque,
            StreamKind::Liquid => &mut self.liquid,
            StreamKind::Billboard => &mut self.billboard,
        }
    }

    /// Whether nothing is uploaded.
    pub fn is_empty(&self) -> bool {
        self.opaque.is_none() && self.liquid.is_none() && self.billboard.is_none()
    }
}

/// A vertex arena and an index arena used together for one stream kind.
pub struct StreamArena<B> {
    /// Vertex storage
    pub vertices: GeometryArena<B>,
    /// Index storage
    pub indices: GeometryArena<B>,
    vertex_size: u64,
}

impl<B: GeometryBuffer> StreamArena<B> {
    fn upload<V: NoUninit>(&mut self, stream: &MeshStream<V>) -> Result<StreamHandle, ArenaError> {
        let vertices = self.vertices.add(bytemuck::cast_slice(&stream.vertices))?;
        let indices = match self.indices.add(bytemuck::cast_slice(&stream.indices)) {
            Ok(indices) => indices,
            Err(error) => {
                self.vertices.remove(&vertices);
                return Err(error);
            }
        };
        debug_assert_eq!(vertices.offset % self.vertex_size, 0);

        Ok(StreamHandle {
            vertices,
            indices,
            vertex_base: (vertices.offset / self.vertex_size) as u32,
            first_index: (indices.offset / std::mem::size_of::<u32>() as u64) as u32,
            index_count: stream.indices.len() as u32,
        })
    }

    fn release(&mut self, handle: &StreamHandle) {
        self.vertices.remove(&handle.vertices);
        self.indices.remove(&handle.indices);
    }
}

/// Aggregate usage of all six arenas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Summed counters of every arena
    pub analytics: BufferAnalytics,
    /// Bytes held by removed nodes
    pub leaked_bytes: u64,
    /// Live allocations
    pub live_nodes: usize,
}

/// The six arenas all chunk geometry is uploaded into.
pub struct ChunkArenas<B> {
    opaque: StreamArena<B>,
    liquid: StreamArena<B>,
    billboard: StreamArena<B>,
}

impl<B: GeometryBuffer> ChunkArenas<B> {
    /// Creates the arenas, asking `make_buffer` for each backing buffer.
    ///
    /// # Arguments
    /// * `make_buffer` - Called with the stream kind, `true` for the vertex buffer
    ///   or `false` for the index buffer, and the arena label
    pub fn new(mut make_buffer: impl FnMut(StreamKind, bool, &'static str) -> B) -> Self {
        let mut arena = |kind: StreamKind, vertex_size: usize| {
            let (vertex_label, index_label) = kind.labels();
            StreamArena {
                vertices: GeometryArena::new(vertex_label, make_buffer(kind, true, vertex_label)),
                indices: GeometryArena::new(index_label, make_buffer(kind, false, index_label)),
                vertex_size: vertex_size as u64,
            }
        };
        ChunkArenas {
            opaque: arena(StreamKind::Opaque, std::mem::size_of::<Vertex>()),
            liquid: arena(StreamKind::Liquid, std::mem::size_of::<Vertex>()),
            billboard: arena(StreamKind::Billboard, std::mem::size_of::<BillboardVertex>()),
        }
    }

    /// The arenas of one stream kind.
    pub fn stream(&self, kind: StreamKind) -> &StreamArena<B> {
        match kind {
            StreamKind::Opaque => &self.opaque,
            StreamKind::Liquid => &self.liquid,
            StreamKind::Billboard => &self.billboard,
        }
    }

    fn stream_mut(&mut self, kind: StreamKind) -> &mut StreamArena<B> {
        match kind {
            StreamKind::Opaque => &mut self.opaque,
            StreamKind::Liquid => &mut self.liquid,
            StreamKind::Billboard => &mut self.billboard,
        }
    }

    /// Replaces a chunk's uploaded geometry with `mesh`.
    ///
    /// The previous handles are released only once every stream is uploaded. On
    /// error the streams uploaded so far are released and `geometry` is left
    /// untouched.
    pub fn upload_mesh(&mut self, mesh: &ChunkMesh, geometry: &mut ChunkGeometry) -> Result<(), ArenaError> {
        let mut uploaded = ChunkGeometry::default();
        if let Err(error) = self.upload_streams(mesh, &mut uploaded) {
            self.release(&mut uploaded);
            return Err(error);
        }
        self.release(geometry);
        *geometry = uploaded;

        trace!(
            "Uploaded {} opaque, {} liquid and {} billboard quads",
            mesh.opaque.quad_count(),
            mesh.liquid.quad_count(),
            mesh.billboard.quad_count()
        );
        Ok(())
    }

    fn upload_streams(&mut self, mesh: &ChunkMesh, uploaded: &mut ChunkGeometry) -> Result<(), ArenaError> {
        if !mesh.opaque.is_empty() {
            uploaded.opaque = Some(self.opaque.upload(&mesh.opaque)?);
        }
        if !mesh.liquid.is_empty() {
            uploaded.liquid = Some(self.liquid.upload(&mesh.liquid)?);
        }
        if !mesh.billboard.is_empty() {
            uploaded.billboard = Some(self.billboard.upload(&mesh.billboard)?);
        }
        Ok(())
    }

    /// Returns a chunk's geometry to the arenas and clears its handles.
    pub fn release(&mut self, geometry: &mut ChunkGeometry) {
        for kind in StreamKind::all() {
            if let Some(handle) = geometry.handle_mut(kind).take() {
                self.stream_mut(kind).release(&handle);
            }
        }
    }

    /// Usage over all six arenas.
    pub fn stats(&self) -> ArenaStats {
        let mut stats = ArenaStats::default();
        for kind in StreamKind::all() {
            let stream = self.stream(kind);
            for arena in [&stream.vertices, &stream.indices] {
                let analytics = arena.analytics();
                stats.analytics.allocated_memory += analytics.allocated_memory;
                stats.analytics.used_memory += analytics.used_memory;
                stats.analytics.times_written += analytics.times_written;
                stats.analytics.times_grown += analytics.times_grown;
                stats.leaked_bytes += arena.leaked_bytes();
                stats.live_nodes += arena.live_nodes();
            }
        }
        stats
    }
}

impl ChunkArenas<HostBuffer> {
    /// Arenas kept in main memory, each starting at `initial_capacity` bytes.
    pub fn host(initial_capacity: u64) -> Self {
        ChunkArenas::new(|_, _, _| HostBuffer::new(initial_capacity))
    }
}

impl ChunkArenas<GpuBuffer> {
    /// Arenas kept in GPU buffers, each starting at `initial_capacity` bytes.
    pub fn gpu(device: Arc<Device>, queue: Arc<Queue>, initial_capacity: u64) -> Self {
        ChunkArenas::new(|_, is_vertex, label| {
            let usage = if is_vertex {
                BufferUsages::VERTEX
            } else {
                BufferUsages::INDEX
            };
            GpuBuffer::new(device.clone(), queue.clone(), label, usage, initial_capacity)
        })
    }
}
