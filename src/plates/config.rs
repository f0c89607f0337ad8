//! Heightmap synthesis configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the Voronoi-plate / fBm heightmap stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoronoiConfig {
    /// World seed; plate RNGs derive from `seed + plate_index`.
    pub seed: u64,
    /// Number of Voronoi plates (24-36 typical).
    pub num_plates: usize,
    /// Sharpness of the ridge term along plate boundaries.
    pub ridge_strength: f32,
    /// Blend factor between the plate field (0.0) and pure fBm (1.0).
    pub fbm_blend: f32,
    /// Base frequency of the gradient noise.
    pub fbm_frequency: f32,
    /// Number of fBm octaves.
    pub fbm_octaves: u32,
    /// Frequency multiplier per octave.
    pub fbm_lacunarity: f32,
    /// Amplitude decay per octave.
    pub fbm_gain: f32,
}

impl Default for VoronoiConfig {
    fn default() -> Self {
        Self {
            seed: 424242,
            num_plates: 32,
            ridge_strength: 1.0,
            fbm_blend: 0.42,
            fbm_frequency: 0.0035,
            fbm_octaves: 5,
            fbm_lacunarity: 2.0,
            fbm_gain: 0.5,
        }
    }
}

impl VoronoiConfig {
    /// Creates a configuration with the given seed and defaults elsewhere.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }
}
