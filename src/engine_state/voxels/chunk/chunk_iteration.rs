//! # Chunk Iteration Module
//!
//! An iterator over every cell of a `VoxelStore` in index order, independent of
//! whether the store is dense or run-length compacted.

use std::slice;

use crate::engine_state::voxels::block::VoxelId;

use super::chunk_creation::VoxelRun;

/// Yields the identifier of every cell, in index order.
///
/// On a compacted store each run is expanded lazily, so iterating is O(cells)
/// for both backings while random access on runs is O(runs) per cell.
pub enum VoxelIter<'a> {
    /// Walks the dense array directly.
    Dense(slice::Iter<'a, VoxelId>),
    /// Expands runs one cell at a time.
    Runs {
        /// Runs not yet started
        runs: slice::Iter<'a, VoxelRun>,
        /// Identifier of the run being expanded
        current: VoxelId,
        /// Cells left in the run being expanded
        remaining: u32,
    },
}

impl<'a> VoxelIter<'a> {
    pub(super) fn dense(ids: &'a [VoxelId]) -> Self {
        VoxelIter::Dense(ids.iter())
    }

    pub(super) fn runs(runs: &'a [VoxelRun]) -> Self {
        VoxelIter::Runs {
            runs: runs.iter(),
            current: 0,
            remaining: 0,
        }
    }
}

impl Iterator for VoxelIter<'_> {
    type Item = VoxelId;

    fn next(&mut self) -> Option<VoxelId> {
        match self {
            VoxelIter::Dense(ids) => ids.next().copied(),
            VoxelIter::Runs {
                runs,
                current,
                remaining,
            } => {
                while *remaining == 0 {
                    let run = runs.next()?;
                    *current = run.id;
                    *remaining = run.length;
                }
                *remaining -= 1;
                Some(*current)
            }
        }
    }
}
