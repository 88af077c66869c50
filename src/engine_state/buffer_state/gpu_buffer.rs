//! # GPU Buffer Module
//!
//! A [`GeometryBuffer`] backed by a `wgpu::Buffer`.
//!
//! Growth allocates a larger buffer and copies the old contents over on the GPU,
//! so issued offsets stay valid. The old buffer is dropped once the copy has been
//! submitted; `wgpu` keeps it alive until the copy completes.
//!
//! All methods must be called from the thread that owns the graphics context.

use std::sync::Arc;

use wgpu::{Buffer, BufferUsages, Device, Queue};

use super::{ArenaError, GeometryBuffer, ARENA_ALIGNMENT};

/// A growable GPU buffer.
pub struct GpuBuffer {
    device: Arc<Device>,
    queue: Arc<Queue>,
    label: &'static str,
    usage: BufferUsages,
    buffer: Buffer,
    capacity: u64,
}

impl GpuBuffer {
    /// Creates a buffer.
    ///
    /// # Arguments
    /// * `device` - Device the buffer lives on
    /// * `queue` - Queue used for writes and growth copies
    /// * `label` - Debug label
    /// * `usage` - Intended usage; copy usages are added automatically
    /// * `capacity` - Initial size in bytes
    pub fn new(
        device: Arc<Device>,
        queue: Arc<Queue>,
        label: &'static str,
        usage: BufferUsages,
        capacity: u64,
    ) -> Self {
        let usage = usage | BufferUsages::COPY_DST | BufferUsages::COPY_SRC;
        let capacity = capacity.max(ARENA_ALIGNMENT).div_ceil(ARENA_ALIGNMENT) * ARENA_ALIGNMENT;
        let buffer = Self::allocate(&device, label, usage, capacity);
        GpuBuffer {
            device,
            queue,
            label,
            usage,
            buffer,
            capacity,
        }
    }

    fn allocate(device: &Device, label: &'static str, usage: BufferUsages, size: u64) -> Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        })
    }

    /// The current `wgpu` buffer, for binding in draw calls.
    ///
    /// The buffer object changes whenever the arena grows, so callers must not
    /// cache it across frames.
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }
}

impl GeometryBuffer for GpuBuffer {
    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn grow(&mut self, new_capacity: u64) -> Result<(), ArenaError> {
        let limit = self.device.limits().max_buffer_size;
        if new_capacity > limit {
            return Err(ArenaError::CapacityExceeded {
                requested: new_capacity,
                limit,
            });
        }

        let grown = Self::allocate(&self.device, self.label, self.usage, new_capacity);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Arena Growth Encoder"),
            });
        encoder.copy_buffer_to_buffer(&self.buffer, 0, &grown, 0, self.capacity);
        self.queue.submit(Some(encoder.finish()));

        self.buffer = grown;
        self.capacity = new_capacity;
        Ok(())
    }

    fn write(&mut self, offset: u64, data: &[u8]) -> Result<(), ArenaError> {
        let len = data.len() as u64;
        if offset + len > self.capacity {
            return Err(ArenaError::OutOfBounds {
                offset,
                len,
                capacity: self.capacity,
            });
        }
        if len % ARENA_ALIGNMENT == 0 {
            self.queue.write_buffer(&self.buffer, offset, data);
        } else {
            let mut padded = data.to_vec();
            padded.resize(len.div_ceil(ARENA_ALIGNMENT) as usize * ARENA_ALIGNMENT as usize, 0);
            self.queue.write_buffer(&self.buffer, offset, &padded);
        }
        Ok(())
    }
}
