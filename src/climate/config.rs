//! Climate synthesis configuration.

use serde::{Deserialize, Serialize};

/// Configuration for temperature/moisture field synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateConfig {
    /// World seed; the two noise tables derive from `seed ^ 0xA5A5A5` and
    /// `seed ^ 0x5A5A5A` so temperature and moisture are independent.
    pub seed: u64,
    /// Base noise frequency shared by both fields.
    pub base_frequency: f32,
    /// fBm octaves.
    pub octaves: u32,
    /// Frequency multiplier per octave.
    pub lacunarity: f32,
    /// Amplitude decay per octave.
    pub gain: f32,
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            seed: 424242,
            base_frequency: 0.0025,
            octaves: 4,
            lacunarity: 2.0,
            gain: 0.6,
        }
    }
}

impl ClimateConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }
}
