//! # Configuration Module
//!
//! `WorldConfig` gathers every tunable of the streaming pipeline. All fields
//! have defaults, so a JSON file only needs to name what it changes:
//!
//! ```json
//! { "seed": 7, "render_distance": 8, "terrain": { "water_level": 60 } }
//! ```

use std::{fs, io, num::NonZeroUsize, path::Path, thread};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::voxels::{chunk::ChunkDimensions, generation::noise_settings::TerrainSettings};

/// Errors raised while loading or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] io::Error),
    /// The configuration file is not valid JSON for `WorldConfig`.
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A block name did not resolve through the block registry.
    #[error("unknown block \"{0}\"")]
    UnknownBlock(String),
    /// The chunk dimensions cannot describe a column.
    #[error("invalid chunk dimensions {width}x{height}")]
    InvalidDimensions {
        /// Configured width
        width: usize,
        /// Configured height
        height: usize,
    },
}

/// When idle chunks are compacted to run-length storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionConfig {
    /// Whether compaction runs at all
    pub enabled: bool,
    /// How many recently touched chunks stay dense
    pub hot_chunks: usize,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        CompactionConfig {
            enabled: true,
            hot_chunks: 64,
        }
    }
}

/// Geometry arena sizing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Starting size of each of the six arenas in bytes
    pub initial_capacity: u64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        ArenaConfig {
            initial_capacity: 4 * 1024 * 1024,
        }
    }
}

/// Every setting of a streamed world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Seed of the terrain noise
    pub seed: u32,
    /// Radius of the loaded area, in chunks
    pub render_distance: u32,
    /// Worker threads; 0 uses the available hardware parallelism
    pub worker_count: usize,
    /// Size of a chunk column
    pub dimensions: ChunkDimensions,
    /// Terrain shape
    pub terrain: TerrainSettings,
    /// Idle-chunk compaction
    pub compaction: CompactionConfig,
    /// Geometry arena sizing
    pub arena: ArenaConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            seed: 0,
            render_distance: 16,
            worker_count: 0,
            dimensions: ChunkDimensions::default(),
            terrain: TerrainSettings::default(),
            compaction: CompactionConfig::default(),
            arena: ArenaConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Parses a configuration from JSON.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: WorldConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration file.
    ///
    /// # Arguments
    /// * `path` - JSON file to read
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Checks settings that cannot be expressed in the types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ChunkDimensions { width, height } = self.dimensions;
        // Vertex positions are packed as u16, corners included.
        let fits = |extent: usize| extent > 0 && extent < u16::MAX as usize;
        if !fits(width) || !fits(height) {
            return Err(ConfigError::InvalidDimensions { width, height });
        }
        Ok(())
    }

    /// The number of worker threads to start.
    pub fn worker_threads(&self) -> usize {
        if self.worker_count > 0 {
            return self.worker_count;
        }
        thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    }
}
