//! # Terrain Generation Module
//!
//! Deterministic procedural terrain. A `TerrainGenerator` maps a chunk
//! coordinate to a fully populated `VoxelStore` and never fails once built.
//!
//! ## Pipeline
//!
//! 1. **Height field**: surface octaves of 2D noise are summed onto the base height.
//! 2. **Vertical fill**: each cell is sky (air, or water at or below the waterline),
//!    cave (carved air below the surface), ore (first matching ore layer), or
//!    ground classified by depth below the surface.
//! 3. **Surface features**: every stamp is tried at every anchor column whose
//!    footprint reaches into this chunk and written clipped to the chunk bounds.
//!    Anchors are allowed outside the chunk so that a tree rooted in a neighbor
//!    still shows its canopy here.

use log::trace;
use noise::OpenSimplex;

use crate::engine_state::config::ConfigError;

use super::{
    block::{BlockRegistry, VoxelId, AIR, DIRT_BLOCK, GRASS_BLOCK, SAND, STONE_BLOCK, WATER},
    chunk::{ChunkCoordinate, ChunkDimensions, VoxelStore},
};

pub mod noise_settings;
pub mod surface_feature;

use noise_settings::{NoiseSettings, TerrainSettings};
use surface_feature::SurfaceFeature;

/// Depth below the surface down to which the near-surface block is used.
const NEAR_SURFACE_DEPTH: i32 = 9;
/// A feature anchor must be at least this far above the waterline.
const FEATURE_CLEARANCE: i32 = 2;

struct ResolvedOre {
    noise: NoiseSettings,
    block: VoxelId,
    max_height: i32,
}

/// Generates chunk voxels from a seed and a set of terrain settings.
pub struct TerrainGenerator {
    noise: OpenSimplex,
    settings: TerrainSettings,
    ores: Vec<ResolvedOre>,
    features: Vec<SurfaceFeature>,
    dimensions: ChunkDimensions,
}

impl TerrainGenerator {
    /// Creates a generator with the standard surface features.
    ///
    /// # Arguments
    /// * `seed` - Seed of every noise field
    /// * `settings` - Terrain parameters
    /// * `dimensions` - Size of the generated columns
    /// * `registry` - Used to resolve ore block names
    ///
    /// # Returns
    /// `ConfigError::UnknownBlock` if an ore layer names a block the registry does
    /// not know.
    pub fn new(
        seed: u32,
        settings: TerrainSettings,
        dimensions: ChunkDimensions,
        registry: &BlockRegistry,
    ) -> Result<Self, ConfigError> {
        let ores = settings
            .ores
            .iter()
            .map(|ore| {
                let block = registry
                    .id_by_name(&ore.block)
                    .ok_or_else(|| ConfigError::UnknownBlock(ore.block.clone()))?;
                Ok(ResolvedOre {
                    noise: ore.noise,
                    block,
                    max_height: ore.max_height,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(TerrainGenerator {
            noise: OpenSimplex::new(seed),
            settings,
            ores,
            features: SurfaceFeature::standard_set(),
            dimensions,
        })
    }

    /// Replaces the stamp list.
    pub fn with_features(mut self, features: Vec<SurfaceFeature>) -> Self {
        self.features = features;
        self
    }

    /// Size of the generated columns.
    pub fn dimensions(&self) -> ChunkDimensions {
        self.dimensions
    }

    /// Active terrain parameters.
    pub fn settings(&self) -> &TerrainSettings {
        &self.settings
    }

    /// Surface height of world column `(x, z)`.
    pub fn surface_height(&self, x: i32, z: i32) -> i32 {
        let height = self
            .settings
            .surface
            .iter()
            .map(|octave| octave.sample_2d(&self.noise, x, z))
            .sum::<f64>();
        (self.settings.base_height as f64 + height).floor() as i32
    }

    /// Whether any cave layer carves world position `(x, y, z)`.
    pub fn is_cave(&self, x: i32, y: i32, z: i32) -> bool {
        self.settings
            .caves
            .iter()
            .any(|cave| y <= cave.max_height && cave.noise.passes_3d(&self.noise, x, y, z))
    }

    fn ore_at(&self, x: i32, y: i32, z: i32) -> Option<VoxelId> {
        self.ores
            .iter()
            .find(|ore| y <= ore.max_height && ore.noise.passes_3d(&self.noise, x, y, z))
            .map(|ore| ore.block)
    }

    /// Block at world position `(x, y, z)` before features, given the column's surface.
    fn classify(&self, x: i32, y: i32, z: i32, surface: i32) -> VoxelId {
        let water_level = self.settings.water_level;
        if y > surface {
            return if y <= water_level { WATER } else { AIR };
        }
        if self.is_cave(x, y, z) {
            return AIR;
        }
        if let Some(ore) = self.ore_at(x, y, z) {
            return ore;
        }

        let submerged = surface < water_level;
        match surface - y {
            0 if submerged => SAND,
            0 => GRASS_BLOCK,
            1..=NEAR_SURFACE_DEPTH if submerged => SAND,
            1..=NEAR_SURFACE_DEPTH => DIRT_BLOCK,
            _ => STONE_BLOCK,
        }
    }

    /// Produces the voxels of one column.
    pub fn generate(&self, coordinate: ChunkCoordinate) -> VoxelStore {
        let ChunkDimensions { width, height } = self.dimensions;
        let origin_x = coordinate.x * width as i32;
        let origin_z = coordinate.z * width as i32;

        let mut ids = vec![AIR; self.dimensions.volume()];
        for z in 0..width {
            for x in 0..width {
                let (world_x, world_z) = (origin_x + x as i32, origin_z + z as i32);
                let surface = self.surface_height(world_x, world_z);
                for y in 0..height {
                    ids[y * width * width + x + z * width] =
                        self.classify(world_x, y as i32, world_z, surface);
                }
            }
        }

        let mut store = VoxelStore::from_dense(self.dimensions, ids);
        if self.settings.features_enabled {
            for feature in &self.features {
                self.stamp_feature(coordinate, feature, &mut store);
            }
        }
        store
    }

    /// Tries `feature` at every anchor whose footprint overlaps this chunk.
    fn stamp_feature(&self, coordinate: ChunkCoordinate, feature: &SurfaceFeature, store: &mut VoxelStore) {
        let ChunkDimensions { width, height } = self.dimensions;
        let (width, height) = (width as i32, height as i32);
        let origin_x = coordinate.x * width;
        let origin_z = coordinate.z * width;
        let [size_x, size_y, size_z] = feature.size.map(|extent| extent as i32);
        let [offset_x, offset_y, offset_z] = feature.offset;

        let mut placed = 0usize;
        for anchor_x in (1 - size_x - offset_x)..(width - offset_x) {
            for anchor_z in (1 - size_z - offset_z)..(width - offset_z) {
                let (world_x, world_z) = (origin_x + anchor_x, origin_z + anchor_z);
                let surface = self.surface_height(world_x, world_z);

                let bottom = surface + offset_y;
                if bottom >= height || bottom + size_y <= 0 {
                    continue;
                }
                if surface < self.settings.water_level + FEATURE_CLEARANCE {
                    continue;
                }
                if self.is_cave(world_x, surface, world_z) {
                    continue;
                }
                if !feature.noise.passes_2d(&self.noise, world_x, world_z) {
                    continue;
                }

                for fy in 0..size_y {
                    let y = bottom + fy;
                    if !(0..height).contains(&y) {
                        continue;
                    }
                    for fx in 0..size_x {
                        let x = anchor_x + offset_x + fx;
                        if !(0..width).contains(&x) {
                            continue;
                        }
                        for fz in 0..size_z {
                            let z = anchor_z + offset_z + fz;
                            if !(0..width).contains(&z) {
                                continue;
                            }
                            let (x, y, z) = (x as usize, y as usize, z as usize);
                            let (cx, cy, cz) = (fx as usize, fy as usize, fz as usize);
                            let current = store.get(x, y, z);
                            let resolved = feature.resolve(cx, cy, cz, current);
                            if resolved != current {
                                store.set(x, y, z, resolved);
                            }
                        }
                    }
                }
                placed += 1;
            }
        }

        if placed > 0 {
            trace!(
                "Placed {} {} stamp(s) touching chunk ({}, {})",
                placed,
                feature.name,
                coordinate.x,
                coordinate.z
            );
        }
    }
}
