//! # Noise Settings Module
//!
//! Tunable parameters of the terrain generator. Every struct here is plain data
//! that deserializes from the world configuration file; missing fields fall back
//! to the built-in world.

use noise::NoiseFn;
use serde::{Deserialize, Serialize};

/// One layer of a noise field.
///
/// A sample at world position `p` is `noise(p · frequency + offset) · amplitude`.
/// `chance` is the threshold a sample must exceed for threshold tests (caves,
/// ores, feature gates); surface octaves ignore it.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    /// Scale applied to world coordinates
    pub frequency: f64,
    /// Scale applied to the sample
    pub amplitude: f64,
    /// Phase shift added to each scaled coordinate
    pub offset: f64,
    /// Threshold for threshold tests
    pub chance: f64,
}

impl NoiseSettings {
    /// A layer with no threshold.
    pub const fn octave(frequency: f64, amplitude: f64, offset: f64) -> Self {
        NoiseSettings {
            frequency,
            amplitude,
            offset,
            chance: 0.0,
        }
    }

    /// A layer used as a threshold test.
    pub const fn gate(frequency: f64, amplitude: f64, offset: f64, chance: f64) -> Self {
        NoiseSettings {
            frequency,
            amplitude,
            offset,
            chance,
        }
    }

    /// Samples a 2D field at world column `(x, z)`.
    pub fn sample_2d(&self, noise: &impl NoiseFn<f64, 2>, x: i32, z: i32) -> f64 {
        noise.get([self.scale(x), self.scale(z)]) * self.amplitude
    }

    /// Samples a 3D field at world position `(x, y, z)`.
    pub fn sample_3d(&self, noise: &impl NoiseFn<f64, 3>, x: i32, y: i32, z: i32) -> f64 {
        noise.get([self.scale(x), self.scale(y), self.scale(z)]) * self.amplitude
    }

    /// Whether a 2D sample exceeds `chance`.
    pub fn passes_2d(&self, noise: &impl NoiseFn<f64, 2>, x: i32, z: i32) -> bool {
        self.sample_2d(noise, x, z) > self.chance
    }

    /// Whether a 3D sample exceeds `chance`.
    pub fn passes_3d(&self, noise: &impl NoiseFn<f64, 3>, x: i32, y: i32, z: i32) -> bool {
        self.sample_3d(noise, x, y, z) > self.chance
    }

    fn scale(&self, coordinate: i32) -> f64 {
        coordinate as f64 * self.frequency + self.offset
    }
}

impl Default for NoiseSettings {
    fn default() -> Self {
        NoiseSettings::gate(0.05, 1.0, 0.0, 0.5)
    }
}

/// A 3D threshold field that carves air out of the ground.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaveLayer {
    /// The carving field
    pub noise: NoiseSettings,
    /// World height above which the layer never carves
    pub max_height: i32,
}

impl Default for CaveLayer {
    fn default() -> Self {
        CaveLayer {
            noise: NoiseSettings::gate(0.05, 1.0, 0.0, 0.5),
            max_height: 100,
        }
    }
}

/// A 3D threshold field that replaces ground with an ore block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OreLayer {
    /// The placement field
    pub noise: NoiseSettings,
    /// Registry name of the placed block
    pub block: String,
    /// World height above which the ore never appears
    pub max_height: i32,
}

impl OreLayer {
    fn new(noise: NoiseSettings, block: &str, max_height: i32) -> Self {
        OreLayer {
            noise,
            block: block.to_owned(),
            max_height,
        }
    }
}

impl Default for OreLayer {
    fn default() -> Self {
        OreLayer::new(NoiseSettings::gate(0.075, 1.0, 8.54, 0.75), "coal_ore", 50)
    }
}

/// The full set of terrain parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
    /// Height the surface octaves are added to
    pub base_height: i32,
    /// Sky cells at or below this height are water
    pub water_level: i32,
    /// Octaves summed into the surface height
    pub surface: Vec<NoiseSettings>,
    /// Cave fields; any one of them carves
    pub caves: Vec<CaveLayer>,
    /// Ore fields; the first match wins
    pub ores: Vec<OreLayer>,
    /// Whether surface features are stamped
    pub features_enabled: bool,
}

impl TerrainSettings {
    /// A perfectly flat world at the waterline with no caves, ores or features.
    pub fn flat() -> Self {
        TerrainSettings {
            surface: Vec::new(),
            caves: Vec::new(),
            ores: Vec::new(),
            features_enabled: false,
            ..Default::default()
        }
    }
}

impl Default for TerrainSettings {
    fn default() -> Self {
        TerrainSettings {
            base_height: 64,
            water_level: 64,
            surface: vec![
                NoiseSettings::octave(0.01, 20.0, 64.0),
                NoiseSettings::octave(0.05, 3.0, 64.0),
            ],
            caves: vec![CaveLayer::default()],
            ores: vec![
                OreLayer::default(),
                OreLayer::new(NoiseSettings::gate(0.09, 1.0, 3.21, 0.8), "iron_ore", 32),
            ],
            features_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings: TerrainSettings =
            serde_json::from_str(r#"{ "water_level": 40, "caves": [] }"#).unwrap();
        assert_eq!(settings.water_level, 40);
        assert_eq!(settings.base_height, 64);
        assert!(settings.caves.is_empty());
        assert_eq!(settings.ores.len(), 2);
        assert_eq!(settings.ores[1].block, "iron_ore");
    }

    #[test]
    fn flat_world_has_no_fields() {
        let flat = TerrainSettings::flat();
        assert!(flat.surface.is_empty() && flat.caves.is_empty() && flat.ores.is_empty());
        assert!(!flat.features_enabled);
    }
}
