//! # Voxel Store
//!
//! Block-identifier storage for one chunk column.
//!
//! Cells are addressed by `index(x, y, z) = y·width² + x + z·width`. The store has
//! two interchangeable backings:
//! - a dense array with O(1) access, used while a chunk is being generated,
//!   meshed or edited
//! - a run-length list of `{length, id}` pairs in index order, used to shrink
//!   chunks that have been idle for a while
//!
//! Both backings answer every query identically; callers never need to know
//! which one is active.

use crate::engine_state::voxels::block::{block_side::FaceDirection, VoxelId, AIR};

use super::{
    chunk_creation::{RunBuilder, VoxelRun},
    chunk_iteration::VoxelIter,
    ChunkDimensions,
};

#[derive(Clone, Debug)]
enum Backing {
    Dense(Vec<VoxelId>),
    Compact(Vec<VoxelRun>),
}

/// The voxels of one chunk column.
#[derive(Clone, Debug)]
pub struct VoxelStore {
    dimensions: ChunkDimensions,
    backing: Backing,
}

impl VoxelStore {
    /// Creates a dense store filled with air.
    pub fn new(dimensions: ChunkDimensions) -> Self {
        VoxelStore {
            dimensions,
            backing: Backing::Dense(vec![AIR; dimensions.volume()]),
        }
    }

    /// Wraps an existing dense array.
    ///
    /// # Panics
    /// Panics if `ids` does not hold exactly one entry per cell.
    pub fn from_dense(dimensions: ChunkDimensions, ids: Vec<VoxelId>) -> Self {
        assert_eq!(
            ids.len(),
            dimensions.volume(),
            "dense voxel array does not match {dimensions:?}"
        );
        VoxelStore {
            dimensions,
            backing: Backing::Dense(ids),
        }
    }

    /// Size of the column.
    pub fn dimensions(&self) -> ChunkDimensions {
        self.dimensions
    }

    /// Linear index of a local coordinate.
    ///
    /// # Panics
    /// Panics if the coordinate lies outside the column.
    pub fn index_of(&self, x: usize, y: usize, z: usize) -> usize {
        let ChunkDimensions { width, height } = self.dimensions;
        assert!(
            x < width && y < height && z < width,
            "voxel coordinate ({x}, {y}, {z}) outside {width}x{height}x{width} column"
        );
        y * width * width + x + z * width
    }

    /// Local coordinate of a linear index; the inverse of [`VoxelStore::index_of`].
    ///
    /// # Panics
    /// Panics if the index lies outside the column.
    pub fn coordinate_of(&self, index: usize) -> (usize, usize, usize) {
        let width = self.dimensions.width;
        assert!(
            index < self.dimensions.volume(),
            "voxel index {index} outside column of {} cells",
            self.dimensions.volume()
        );
        let plane = width * width;
        let y = index / plane;
        let rest = index % plane;
        (rest % width, y, rest / width)
    }

    /// Reads one cell.
    ///
    /// O(1) on the dense backing, O(runs) on the compact backing.
    ///
    /// # Panics
    /// Panics if the coordinate lies outside the column.
    pub fn get(&self, x: usize, y: usize, z: usize) -> VoxelId {
        let index = self.index_of(x, y, z);
        match &self.backing {
            Backing::Dense(ids) => ids[index],
            Backing::Compact(runs) => runs[locate_run(runs, index).0].id,
        }
    }

    /// Writes one cell.
    ///
    /// On the compact backing the containing run is split around the cell and
    /// merged with equal neighbors afterwards, so runs stay maximal.
    ///
    /// # Panics
    /// Panics if the coordinate lies outside the column.
    pub fn set(&mut self, x: usize, y: usize, z: usize, id: VoxelId) {
        let index = self.index_of(x, y, z);
        match &mut self.backing {
            Backing::Dense(ids) => ids[index] = id,
            Backing::Compact(runs) => set_in_runs(runs, index, id),
        }
    }

    /// Iterates every cell in index order.
    pub fn iter(&self) -> VoxelIter<'_> {
        match &self.backing {
            Backing::Dense(ids) => VoxelIter::dense(ids),
            Backing::Compact(runs) => VoxelIter::runs(runs),
        }
    }

    /// Whether the run-length backing is active.
    pub fn is_compact(&self) -> bool {
        matches!(self.backing, Backing::Compact(_))
    }

    /// Number of runs the column would compact to, or is compacted to.
    pub fn run_count(&self) -> usize {
        match &self.backing {
            Backing::Dense(ids) => {
                let mut builder = RunBuilder::new();
                ids.iter().for_each(|id| builder.push(*id));
                builder.finish().len()
            }
            Backing::Compact(runs) => runs.len(),
        }
    }

    /// Switches to the run-length backing. Does nothing if already compact.
    pub fn compact(&mut self) {
        if let Backing::Dense(ids) = &self.backing {
            let mut builder = RunBuilder::new();
            ids.iter().for_each(|id| builder.push(*id));
            self.backing = Backing::Compact(builder.finish());
        }
    }

    /// Switches to the dense backing. Does nothing if already dense.
    pub fn expand(&mut self) {
        if self.is_compact() {
            self.backing = Backing::Dense(self.to_dense());
        }
    }

    /// Copies every cell into a dense array in index order.
    pub fn to_dense(&self) -> Vec<VoxelId> {
        match &self.backing {
            Backing::Dense(ids) => ids.clone(),
            Backing::Compact(_) => self.iter().collect(),
        }
    }

    /// Approximate heap bytes used by the active backing.
    pub fn memory_bytes(&self) -> usize {
        match &self.backing {
            Backing::Dense(ids) => ids.len() * std::mem::size_of::<VoxelId>(),
            Backing::Compact(runs) => runs.len() * std::mem::size_of::<VoxelRun>(),
        }
    }

    /// Copies the outermost layer of cells on one horizontal side.
    ///
    /// The slice is what a neighboring chunk sees when it looks across the seam:
    /// `boundary(East)` holds the cells at `x = width - 1`, `boundary(North)` the
    /// cells at `z = 0`, and so on.
    ///
    /// # Panics
    /// Panics for `Top` and `Bottom`.
    pub fn boundary(&self, face: FaceDirection) -> BoundarySlice {
        let ChunkDimensions { width, height } = self.dimensions;
        let edge = width - 1;
        // First index of the slice in a layer, and the step between its cells.
        let (origin, stride) = match face {
            FaceDirection::North => (0, 1),
            FaceDirection::South => (edge * width, 1),
            FaceDirection::West => (0, width),
            FaceDirection::East => (edge, width),
            FaceDirection::Bottom | FaceDirection::Top => {
                panic!("{face:?} is not a column boundary")
            }
        };
        let indices = (0..height).flat_map(move |y| {
            (0..width).map(move |along| y * width * width + origin + along * stride)
        });

        let cells: Vec<VoxelId> = match &self.backing {
            Backing::Dense(ids) => indices.map(|index| ids[index]).collect(),
            // Slice indices only ever increase, so one pass over the runs suffices.
            Backing::Compact(runs) => {
                let mut remaining = runs.iter();
                let mut id = AIR;
                let mut end = 0;
                indices
                    .map(|index| {
                        while index >= end {
                            let Some(run) = remaining.next() else {
                                panic!("voxel index {index} past the end of {end} run-length cells");
                            };
                            id = run.id;
                            end += run.length as usize;
                        }
                        id
                    })
                    .collect()
            }
        };

        BoundarySlice {
            face,
            dimensions: self.dimensions,
            cells,
        }
    }
}

impl PartialEq for VoxelStore {
    fn eq(&self, other: &Self) -> bool {
        self.dimensions == other.dimensions && self.iter().eq(other.iter())
    }
}

impl Eq for VoxelStore {}

/// One side layer of a column, copied out for a neighbor to mesh against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundarySlice {
    /// Which side of the source column the cells come from
    pub face: FaceDirection,
    dimensions: ChunkDimensions,
    cells: Vec<VoxelId>,
}

impl BoundarySlice {
    /// Reads a cell by its position along the seam and its height.
    ///
    /// `along` is the X coordinate for North/South slices and the Z coordinate
    /// for West/East slices.
    pub fn get(&self, along: usize, y: usize) -> VoxelId {
        self.cells[y * self.dimensions.width + along]
    }

    /// Size of the column the slice was taken from.
    pub fn dimensions(&self) -> ChunkDimensions {
        self.dimensions
    }
}

/// Finds the run containing `index`.
///
/// # Returns
/// The run's position in `runs` and the index of its first cell.
fn locate_run(runs: &[VoxelRun], index: usize) -> (usize, usize) {
    let mut start = 0;
    for (position, run) in runs.iter().enumerate() {
        let end = start + run.length as usize;
        if index < end {
            return (position, start);
        }
        start = end;
    }
    panic!("voxel index {index} past the end of {start} run-length cells");
}

fn set_in_runs(runs: &mut Vec<VoxelRun>, index: usize, id: VoxelId) {
    let (position, start) = locate_run(runs, index);
    let run = runs[position];
    if run.id == id {
        return;
    }

    let before = (index - start) as u32;
    let after = run.length - before - 1;

    let mut replacement = Vec::with_capacity(3);
    if before > 0 {
        replacement.push(VoxelRun {
            length: before,
            id: run.id,
        });
    }
    replacement.push(VoxelRun { length: 1, id });
    if after > 0 {
        replacement.push(VoxelRun {
            length: after,
            id: run.id,
        });
    }
    runs.splice(position..=position, replacement);

    let mut single = position + usize::from(before > 0);
    if single + 1 < runs.len() && runs[single + 1].id == id {
        runs[single].length += runs[single + 1].length;
        runs.remove(single + 1);
    }
    if single > 0 && runs[single - 1].id == id {
        runs[single - 1].length += runs[single].length;
        runs.remove(single);
        single -= 1;
    }
    debug_assert!(runs[single].id == id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::{DIRT_BLOCK, STONE_BLOCK, WATER};

    fn small() -> ChunkDimensions {
        ChunkDimensions::new(4, 6)
    }

    fn layered() -> VoxelStore {
        let mut store = VoxelStore::new(small());
        for x in 0..4 {
            for z in 0..4 {
                for y in 0..2 {
                    store.set(x, y, z, STONE_BLOCK);
                }
                store.set(x, 2, z, DIRT_BLOCK);
            }
        }
        store
    }

    #[test]
    fn index_round_trips_for_every_cell() {
        let store = VoxelStore::new(ChunkDimensions::new(5, 7));
        for y in 0..7 {
            for z in 0..5 {
                for x in 0..5 {
                    let index = store.index_of(x, y, z);
                    assert_eq!(store.coordinate_of(index), (x, y, z));
                }
            }
        }
    }

    #[test]
    fn index_follows_layout_formula() {
        let store = VoxelStore::new(ChunkDimensions::default());
        assert_eq!(store.index_of(3, 2, 5), 2 * 32 * 32 + 3 + 5 * 32);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn out_of_range_access_panics() {
        VoxelStore::new(small()).get(4, 0, 0);
    }

    #[test]
    fn compaction_is_transparent() {
        let mut store = layered();
        let dense = store.to_dense();

        store.compact();
        assert!(store.is_compact());
        assert_eq!(store.run_count(), 3);
        assert_eq!(store.to_dense(), dense);
        assert_eq!(store.get(1, 2, 3), DIRT_BLOCK);
        assert_eq!(store.get(1, 5, 3), AIR);

        store.expand();
        assert!(!store.is_compact());
        assert_eq!(store.to_dense(), dense);
    }

    #[test]
    fn set_on_runs_splits_and_merges() {
        let mut dense = layered();
        let mut compact = layered();
        compact.compact();

        let edits = [
            (0, 0, 0, WATER),
            (3, 3, 3, WATER),
            (0, 0, 0, STONE_BLOCK),
            (2, 2, 1, STONE_BLOCK),
            (3, 5, 3, DIRT_BLOCK),
            (0, 0, 0, AIR),
        ];
        for (x, y, z, id) in edits {
            dense.set(x, y, z, id);
            compact.set(x, y, z, id);
            assert_eq!(compact.to_dense(), dense.to_dense());
        }

        // Undoing the one-cell splits restores the original run count.
        compact.set(0, 0, 0, STONE_BLOCK);
        compact.set(3, 3, 3, AIR);
        compact.set(2, 2, 1, DIRT_BLOCK);
        compact.set(3, 5, 3, AIR);
        assert_eq!(compact.run_count(), 3);
        assert_eq!(compact, layered());
    }

    #[test]
    fn boundary_slices_pick_the_outer_layer() {
        let mut store = VoxelStore::new(small());
        store.set(3, 1, 2, WATER);
        store.set(1, 4, 0, DIRT_BLOCK);

        let east = store.boundary(FaceDirection::East);
        assert_eq!(east.get(2, 1), WATER);
        assert_eq!(east.get(1, 1), AIR);

        let north = store.boundary(FaceDirection::North);
        assert_eq!(north.get(1, 4), DIRT_BLOCK);

        store.compact();
        assert_eq!(store.boundary(FaceDirection::East), east);
        assert_eq!(store.boundary(FaceDirection::North), north);
    }

    #[test]
    fn compact_boundaries_match_dense_ones() {
        let mut dense = layered();
        dense.set(0, 3, 2, WATER);
        dense.set(3, 1, 0, AIR);
        dense.set(2, 5, 3, DIRT_BLOCK);
        dense.set(3, 4, 3, WATER);
        let mut compact = dense.clone();
        compact.compact();

        for face in FaceDirection::horizontal() {
            assert_eq!(compact.boundary(face), dense.boundary(face), "{face:?}");
        }
        assert!(compact.is_compact());
    }
}
