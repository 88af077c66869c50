//! # Chunk Creation Module
//!
//! Builder for the run-length backing of a `VoxelStore`.
//!
//! Identifiers are pushed one at a time in index order (the same order in which
//! the dense array is laid out) and consecutive equal identifiers are folded into
//! a single run as they arrive.

use crate::engine_state::voxels::block::VoxelId;

/// A run of identical voxels in index order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VoxelRun {
    /// Number of consecutive cells, never zero
    pub length: u32,
    /// Identifier shared by every cell of the run
    pub id: VoxelId,
}

/// Folds a stream of identifiers into runs.
#[derive(Default)]
pub struct RunBuilder {
    runs: Vec<VoxelRun>,
}

impl RunBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        RunBuilder { runs: Vec::new() }
    }

    /// Appends one cell.
    pub fn push(&mut self, id: VoxelId) {
        self.push_run(id, 1);
    }

    /// Appends `length` cells holding `id`.
    pub fn push_run(&mut self, id: VoxelId, length: u32) {
        if length == 0 {
            return;
        }
        match self.runs.last_mut() {
            Some(last) if last.id == id => last.length += length,
            _ => self.runs.push(VoxelRun { length, id }),
        }
    }

    /// Returns the collected runs.
    pub fn finish(mut self) -> Vec<VoxelRun> {
        self.runs.shrink_to_fit();
        self.runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_adjacent_cells() {
        let mut builder = RunBuilder::new();
        for id in [3, 3, 3, 0, 0, 3] {
            builder.push(id);
        }
        builder.push_run(3, 4);
        builder.push_run(9, 0);

        assert_eq!(
            builder.finish(),
            vec![
                VoxelRun { length: 3, id: 3 },
                VoxelRun { length: 2, id: 0 },
                VoxelRun { length: 5, id: 3 },
            ]
        );
    }
}
