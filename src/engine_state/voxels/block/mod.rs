//! # Block Module
//!
//! Block identifiers and the read-only registry that maps each identifier to its
//! rendering class, texture-atlas cells and display name.
//!
//! Identifiers are dense `u16` indices into a static table; `0` is always air.

use phf::phf_map;

pub mod block_side;
pub mod block_type;

use block_side::FaceDirection;
use block_type::BlockClass;

/// The integer stored per voxel.
pub type VoxelId = u16;

/// Empty space.
pub const AIR: VoxelId = 0;
/// Plain dirt.
pub const DIRT_BLOCK: VoxelId = 1;
/// Dirt with a grass top.
pub const GRASS_BLOCK: VoxelId = 2;
/// Stone, the deep fill block.
pub const STONE_BLOCK: VoxelId = 3;
/// Tree trunk.
pub const LOG: VoxelId = 4;
/// Tree canopy.
pub const LEAVES: VoxelId = 5;
/// Short grass billboard.
pub const GRASS: VoxelId = 6;
/// Lower half of tall grass.
pub const TALL_GRASS_BOTTOM: VoxelId = 7;
/// Upper half of tall grass.
pub const TALL_GRASS_TOP: VoxelId = 8;
/// Red flower.
pub const POPPY: VoxelId = 9;
/// White flower.
pub const WHITE_TULIP: VoxelId = 10;
/// Pink flower.
pub const PINK_TULIP: VoxelId = 11;
/// Orange flower.
pub const ORANGE_TULIP: VoxelId = 12;
/// Still water.
pub const WATER: VoxelId = 13;
/// Still lava.
pub const LAVA: VoxelId = 14;
/// Sand, used at and below the waterline.
pub const SAND: VoxelId = 15;
/// Glass.
pub const GLASS: VoxelId = 16;
/// Coal ore.
pub const COAL_ORE: VoxelId = 17;
/// Iron ore.
pub const IRON_ORE: VoxelId = 18;

/// A rectangle of texture-atlas cells, in atlas grid units.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AtlasRect {
    /// Lower corner `[x, y]`
    pub min: [u8; 2],
    /// Upper corner `[x, y]`
    pub max: [u8; 2],
}

impl AtlasRect {
    /// A single atlas cell at `(x, y)`.
    pub const fn cell(x: u8, y: u8) -> Self {
        AtlasRect {
            min: [x, y],
            max: [x + 1, y + 1],
        }
    }
}

/// Metadata of one block type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// Display name, also the key used by configuration files
    pub name: &'static str,
    /// Rendering class
    pub class: BlockClass,
    /// Atlas cells of the top face
    pub top: AtlasRect,
    /// Atlas cells of the bottom face
    pub bottom: AtlasRect,
    /// Atlas cells of the four side faces
    pub side: AtlasRect,
}

impl Block {
    /// A block that uses the same atlas cell on every face.
    pub const fn uniform(name: &'static str, class: BlockClass, x: u8, y: u8) -> Self {
        Block {
            name,
            class,
            top: AtlasRect::cell(x, y),
            bottom: AtlasRect::cell(x, y),
            side: AtlasRect::cell(x, y),
        }
    }

    /// A block with distinct top, bottom and side cells.
    pub const fn faced(
        name: &'static str,
        class: BlockClass,
        top: AtlasRect,
        bottom: AtlasRect,
        side: AtlasRect,
    ) -> Self {
        Block {
            name,
            class,
            top,
            bottom,
            side,
        }
    }

    /// Atlas cells used for the given face.
    pub fn atlas_for(&self, face: FaceDirection) -> AtlasRect {
        match face {
            FaceDirection::Top => self.top,
            FaceDirection::Bottom => self.bottom,
            _ => self.side,
        }
    }
}

/// The standard block table, indexed by `VoxelId`.
static STANDARD_BLOCKS: [Block; 19] = [
    Block::uniform("air", BlockClass::Transparent, 0, 15),
    Block::uniform("dirt_block", BlockClass::Solid, 2, 0),
    Block::faced(
        "grass_block",
        BlockClass::Solid,
        AtlasRect::cell(0, 0),
        AtlasRect::cell(2, 0),
        AtlasRect::cell(1, 0),
    ),
    Block::uniform("stone_block", BlockClass::Solid, 3, 0),
    Block::faced(
        "log",
        BlockClass::Solid,
        AtlasRect::cell(5, 0),
        AtlasRect::cell(5, 0),
        AtlasRect::cell(4, 0),
    ),
    Block::uniform("leaves", BlockClass::Leaves, 6, 0),
    Block::uniform("grass", BlockClass::Billboard, 7, 0),
    Block::uniform("tall_grass_bottom", BlockClass::Billboard, 8, 0),
    Block::uniform("tall_grass_top", BlockClass::Billboard, 9, 0),
    Block::uniform("poppy", BlockClass::Billboard, 10, 0),
    Block::uniform("white_tulip", BlockClass::Billboard, 11, 0),
    Block::uniform("pink_tulip", BlockClass::Billboard, 12, 0),
    Block::uniform("orange_tulip", BlockClass::Billboard, 13, 0),
    Block::uniform("water", BlockClass::Liquid, 14, 0),
    Block::uniform("lava", BlockClass::Liquid, 15, 0),
    Block::uniform("sand", BlockClass::Solid, 0, 1),
    Block::uniform("glass", BlockClass::Transparent, 1, 1),
    Block::uniform("coal_ore", BlockClass::Solid, 2, 1),
    Block::uniform("iron_ore", BlockClass::Solid, 3, 1),
];

/// Name lookup for the standard block table.
static STANDARD_BLOCK_IDS: phf::Map<&'static str, VoxelId> = phf_map! {
    "air" => AIR,
    "dirt_block" => DIRT_BLOCK,
    "grass_block" => GRASS_BLOCK,
    "stone_block" => STONE_BLOCK,
    "log" => LOG,
    "leaves" => LEAVES,
    "grass" => GRASS,
    "tall_grass_bottom" => TALL_GRASS_BOTTOM,
    "tall_grass_top" => TALL_GRASS_TOP,
    "poppy" => POPPY,
    "white_tulip" => WHITE_TULIP,
    "pink_tulip" => PINK_TULIP,
    "orange_tulip" => ORANGE_TULIP,
    "water" => WATER,
    "lava" => LAVA,
    "sand" => SAND,
    "glass" => GLASS,
    "coal_ore" => COAL_ORE,
    "iron_ore" => IRON_ORE,
};

/// Read-only lookup from `VoxelId` to block metadata.
///
/// The registry only borrows static tables, so it is `Copy` and can be handed to
/// every worker without reference counting.
#[derive(Copy, Clone)]
pub struct BlockRegistry {
    blocks: &'static [Block],
    names: &'static phf::Map<&'static str, VoxelId>,
}

impl BlockRegistry {
    /// The registry of the built-in block table.
    pub fn standard() -> Self {
        BlockRegistry {
            blocks: &STANDARD_BLOCKS,
            names: &STANDARD_BLOCK_IDS,
        }
    }

    /// Looks up a block.
    ///
    /// # Panics
    /// Panics if `id` is not a registered identifier. Voxel stores only ever hold
    /// registered identifiers, so this indicates a bug in the caller.
    pub fn lookup(&self, id: VoxelId) -> &Block {
        match self.blocks.get(id as usize) {
            Some(block) => block,
            None => panic!("unregistered block id {id}"),
        }
    }

    /// Shorthand for `lookup(id).class`.
    pub fn class(&self, id: VoxelId) -> BlockClass {
        self.lookup(id).class
    }

    /// Whether `id` names a registered block.
    pub fn contains(&self, id: VoxelId) -> bool {
        (id as usize) < self.blocks.len()
    }

    /// Resolves a block by its display name.
    pub fn id_by_name(&self, name: &str) -> Option<VoxelId> {
        self.names.get(name).copied()
    }

    /// Number of registered blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the registry is empty. The standard registry never is.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_map_agrees_with_table() {
        let registry = BlockRegistry::standard();
        for id in 0..registry.len() as VoxelId {
            let name = registry.lookup(id).name;
            assert_eq!(registry.id_by_name(name), Some(id), "{name}");
        }
        assert_eq!(registry.id_by_name("bedrock"), None);
    }

    #[test]
    fn air_is_transparent() {
        assert_eq!(BlockRegistry::standard().class(AIR), BlockClass::Transparent);
    }

    #[test]
    #[should_panic(expected = "unregistered block id")]
    fn unknown_ids_fail_fast() {
        BlockRegistry::standard().lookup(4000);
    }
}
