//! Face visibility lookup for one chunk and its four seams.
//!
//! The volume stores two flags per cell in padded bit vectors: one cell of
//! padding on every side holds the neighbor boundaries (or air, for absent
//! neighbors and above/below the column), so a neighbor lookup never branches
//! on whether it crossed the chunk edge.

use bitvec::prelude::BitVec;

use crate::engine_state::voxels::{
    block::{block_side::FaceDirection, block_type::BlockClass, BlockRegistry},
    chunk::{ChunkDimensions, VoxelStore},
};

use super::super::ChunkNeighbors;

/// Per-cell see-through and liquid flags of a chunk plus its seams.
pub struct ExposureVolume {
    width: usize,
    height: usize,
    see_through: BitVec,
    liquid: BitVec,
}

impl ExposureVolume {
    /// Builds the volume from a chunk and whatever neighbors are available.
    pub fn build(store: &VoxelStore, neighbors: &ChunkNeighbors, registry: &BlockRegistry) -> Self {
        let ChunkDimensions { width, height } = store.dimensions();
        let size = (width + 2) * (height + 2) * (width + 2);
        let mut volume = ExposureVolume {
            width,
            height,
            see_through: BitVec::repeat(true, size),
            liquid: BitVec::repeat(false, size),
        };

        for (index, id) in store.iter().enumerate() {
            let (x, y, z) = store.coordinate_of(index);
            volume.mark(x as isize, y as isize, z as isize, registry.class(id));
        }

        let w = width as isize;
        for face in FaceDirection::horizontal() {
            let Some(slice) = neighbors.get(face) else {
                continue;
            };
            for y in 0..height {
                for along in 0..width {
                    let a = along as isize;
                    let (x, z) = match face {
                        FaceDirection::North => (a, -1),
                        FaceDirection::South => (a, w),
                        FaceDirection::West => (-1, a),
                        FaceDirection::East => (w, a),
                        FaceDirection::Bottom | FaceDirection::Top => unreachable!(),
                    };
                    volume.mark(x, y as isize, z, registry.class(slice.get(along, y)));
                }
            }
        }

        volume
    }

    fn index(&self, x: isize, y: isize, z: isize) -> usize {
        let padded_width = self.width + 2;
        let padded_plane = padded_width * (self.height + 2);
        (x + 1) as usize + padded_width * (y + 1) as usize + padded_plane * (z + 1) as usize
    }

    fn mark(&mut self, x: isize, y: isize, z: isize, class: BlockClass) {
        let index = self.index(x, y, z);
        self.see_through.set(index, class.is_see_through());
        self.liquid.set(index, class.is_liquid());
    }

    fn neighbor_index(&self, x: usize, y: usize, z: usize, face: FaceDirection) -> usize {
        let offset = face.offset();
        self.index(
            x as isize + offset.x as isize,
            y as isize + offset.y as isize,
            z as isize + offset.z as isize,
        )
    }

    /// Whether the face of a block of `class` at `(x, y, z)` pointing towards
    /// `face` can be seen.
    pub fn exposes(&self, class: BlockClass, x: usize, y: usize, z: usize, face: FaceDirection) -> bool {
        let index = self.neighbor_index(x, y, z, face);
        self.see_through[index] || (self.liquid[index] && !class.is_liquid())
    }

    /// Whether the cell next to `(x, y, z)` across `face` holds a liquid.
    pub fn neighbor_is_liquid(&self, x: usize, y: usize, z: usize, face: FaceDirection) -> bool {
        self.liquid[self.neighbor_index(x, y, z, face)]
    }
}
