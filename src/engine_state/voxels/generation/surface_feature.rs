//! # Surface Feature Module
//!
//! Stamps are fixed block patterns (ponds, trees, grass, flowers) that the
//! generator places on the surface wherever their gating noise allows.
//!
//! Cells are stored layer by layer, bottom to top; within a layer `x` is the
//! slow axis and `z` the fast one, so cell `(x, y, z)` lives at
//! `y · size_x · size_z + x · size_z + z`.

use crate::engine_state::voxels::block::{
    VoxelId, AIR, DIRT_BLOCK, GRASS, GRASS_BLOCK, LEAVES, LOG, ORANGE_TULIP, PINK_TULIP, POPPY,
    TALL_GRASS_BOTTOM, TALL_GRASS_TOP, WATER, WHITE_TULIP,
};

use super::noise_settings::NoiseSettings;

/// One stamp definition.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceFeature {
    /// Human readable name, used in logs
    pub name: &'static str,
    /// Gating field sampled at the anchor column
    pub noise: NoiseSettings,
    /// Extent `[x, y, z]` of the stamp
    pub size: [usize; 3],
    /// Offset `[x, y, z]` of the stamp's first cell from the anchor surface point
    pub offset: [i32; 3],
    blocks: Vec<VoxelId>,
    replace: Vec<bool>,
}

impl SurfaceFeature {
    /// Creates a stamp.
    ///
    /// # Panics
    /// Panics if `blocks` or `replace` does not hold exactly one entry per cell.
    pub fn new(
        name: &'static str,
        noise: NoiseSettings,
        size: [usize; 3],
        offset: [i32; 3],
        blocks: Vec<VoxelId>,
        replace: Vec<bool>,
    ) -> Self {
        let cells = size[0] * size[1] * size[2];
        assert_eq!(blocks.len(), cells, "stamp {name} has the wrong number of blocks");
        assert_eq!(replace.len(), cells, "stamp {name} has the wrong number of flags");
        SurfaceFeature {
            name,
            noise,
            size,
            offset,
            blocks,
            replace,
        }
    }

    /// A one-wide column stamp that only fills empty cells.
    pub fn column(name: &'static str, noise: NoiseSettings, blocks: &[VoxelId]) -> Self {
        SurfaceFeature::new(
            name,
            noise,
            [1, blocks.len(), 1],
            [0, 0, 0],
            blocks.to_vec(),
            vec![false; blocks.len()],
        )
    }

    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        y * self.size[0] * self.size[2] + x * self.size[2] + z
    }

    /// Block written at stamp cell `(x, y, z)`.
    pub fn block(&self, x: usize, y: usize, z: usize) -> VoxelId {
        self.blocks[self.index(x, y, z)]
    }

    /// Whether stamp cell `(x, y, z)` overwrites whatever is there, rather than
    /// only filling air.
    pub fn replaces(&self, x: usize, y: usize, z: usize) -> bool {
        self.replace[self.index(x, y, z)]
    }

    /// The value a cell should hold after stamping over `current`.
    pub fn resolve(&self, x: usize, y: usize, z: usize, current: VoxelId) -> VoxelId {
        if self.replaces(x, y, z) || current == AIR {
            self.block(x, y, z)
        } else {
            current
        }
    }

    /// The built-in stamps, in placement order.
    pub fn standard_set() -> Vec<SurfaceFeature> {
        vec![
            pond(),
            tree(),
            SurfaceFeature::column(
                "tall_grass",
                NoiseSettings::gate(1.23, 1.0, 4.34, 0.6),
                &[GRASS_BLOCK, TALL_GRASS_BOTTOM, TALL_GRASS_TOP],
            ),
            SurfaceFeature::column(
                "grass",
                NoiseSettings::gate(2.65, 1.0, 8.54, 0.5),
                &[GRASS_BLOCK, GRASS],
            ),
            SurfaceFeature::column(
                "poppy",
                NoiseSettings::gate(5.32, 1.0, 3.67, 0.8),
                &[GRASS_BLOCK, POPPY],
            ),
            SurfaceFeature::column(
                "white_tulip",
                NoiseSettings::gate(5.57, 1.0, 7.654, 0.8),
                &[GRASS_BLOCK, WHITE_TULIP],
            ),
            SurfaceFeature::column(
                "pink_tulip",
                NoiseSettings::gate(4.94, 1.0, 2.23, 0.8),
                &[GRASS_BLOCK, PINK_TULIP],
            ),
            SurfaceFeature::column(
                "orange_tulip",
                NoiseSettings::gate(6.32, 1.0, 8.2, 0.85),
                &[GRASS_BLOCK, ORANGE_TULIP],
            ),
        ]
    }
}

const W: VoxelId = WATER;
const G: VoxelId = GRASS_BLOCK;
const T: bool = true;
const F: bool = false;

#[rustfmt::skip]
const POND_BLOCKS: [VoxelId; 147] = [
    0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, W, W, 0, 0,
    0, 0, W, W, W, 0, 0,
    0, 0, 0, W, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0,

    0, G, W, W, G, 0, 0,
    0, G, W, W, W, G, 0,
    G, W, W, W, W, W, G,
    G, W, W, W, W, W, G,
    G, W, W, W, W, W, G,
    0, G, W, W, W, G, 0,
    0, 0, G, W, G, 0, 0,

    0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0,
];

#[rustfmt::skip]
const POND_REPLACE: [bool; 147] = [
    F, F, F, F, F, F, F,
    F, F, F, F, F, F, F,
    F, F, F, T, T, F, F,
    F, F, T, T, T, F, F,
    F, F, F, T, F, F, F,
    F, F, F, F, F, F, F,
    F, F, F, F, F, F, F,

    F, F, T, T, F, F, F,
    F, F, T, T, T, F, F,
    F, T, T, T, T, T, F,
    F, T, T, T, T, T, F,
    F, T, T, T, T, T, F,
    F, F, T, T, T, F, F,
    F, F, F, T, F, F, F,

    F, F, T, T, F, F, F,
    F, F, T, T, T, T, F,
    F, T, T, T, T, T, F,
    F, T, T, T, T, T, F,
    F, T, T, T, T, T, F,
    F, F, T, T, T, F, F,
    F, F, F, T, F, F, F,
];

fn pond() -> SurfaceFeature {
    SurfaceFeature::new(
        "pond",
        NoiseSettings::gate(0.43, 1.0, 2.35, 0.85),
        [7, 3, 7],
        [-3, -2, -3],
        POND_BLOCKS.to_vec(),
        POND_REPLACE.to_vec(),
    )
}

fn tree() -> SurfaceFeature {
    const TRUNK_HEIGHT: usize = 5;
    let size = [5, 7, 5];
    let mut blocks = vec![AIR; size[0] * size[1] * size[2]];
    let mut replace = vec![false; blocks.len()];
    let layer = size[0] * size[2];
    let center = 2 * size[2] + 2;

    for y in 0..size[1] {
        for x in 0..size[0] {
            for z in 0..size[2] {
                let (dx, dz) = (x.abs_diff(2), z.abs_diff(2));
                let id = match y {
                    0 if dx == 0 && dz == 0 => DIRT_BLOCK,
                    1..=4 if dx == 0 && dz == 0 => LOG,
                    3 | 4 if !(dx == 2 && dz == 2) => LEAVES,
                    5 | 6 if dx + dz <= 1 => LEAVES,
                    _ => AIR,
                };
                blocks[y * layer + x * size[2] + z] = id;
            }
        }
        if y < TRUNK_HEIGHT {
            replace[y * layer + center] = true;
        }
    }

    SurfaceFeature::new(
        "tree",
        NoiseSettings::gate(4.23, 1.0, 8.54, 0.8),
        size,
        [-2, 0, -2],
        blocks,
        replace,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_has_trunk_and_canopy() {
        let tree = tree();
        assert_eq!(tree.block(2, 0, 2), DIRT_BLOCK);
        for y in 1..5 {
            assert_eq!(tree.block(2, y, 2), LOG);
            assert!(tree.replaces(2, y, 2));
        }
        assert_eq!(tree.block(0, 3, 0), AIR);
        assert_eq!(tree.block(0, 3, 1), LEAVES);
        assert_eq!(tree.block(2, 6, 2), LEAVES);
        assert_eq!(tree.block(1, 6, 1), AIR);
        assert!(!tree.replaces(2, 5, 2));
    }

    #[test]
    fn fill_only_cells_keep_ground() {
        let pond = pond();
        // rim cell: grass, fill-only
        assert_eq!(pond.resolve(0, 1, 1, DIRT_BLOCK), DIRT_BLOCK);
        assert_eq!(pond.resolve(0, 1, 1, AIR), GRASS_BLOCK);
        // basin cell: water, replacing
        assert_eq!(pond.resolve(3, 1, 3, DIRT_BLOCK), WATER);
    }

    #[test]
    fn standard_set_is_ordered() {
        let names: Vec<_> = SurfaceFeature::standard_set()
            .iter()
            .map(|feature| feature.name)
            .collect();
        assert_eq!(&names[..3], &["pond", "tree", "tall_grass"]);
        assert_eq!(names.len(), 8);
    }
}
