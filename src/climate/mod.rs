//! Climate field synthesis: temperature and moisture.
//!
//! Temperature mixes low-frequency noise with a latitudinal factor that
//! peaks at the map equator; moisture is noise damped by elevation so
//! highlands trend dry. Both fields are computed once from the post-S1
//! heightmap and read-only afterwards.

mod config;

pub use config::ClimateConfig;

use rayon::prelude::*;

use crate::grid::Grid2D;
use crate::noise::PerlinNoise;

/// Temperature and moisture grids, both in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct ClimateFields {
    pub temperature: Grid2D<f32>,
    pub moisture: Grid2D<f32>,
}

/// Computes both climate fields from the heightmap, parallel over cells.
pub fn compute_climate(heights: &Grid2D<f32>, config: &ClimateConfig) -> ClimateFields {
    let w = heights.width() as usize;
    let h = heights.height();
    let temp_noise = PerlinNoise::new(config.seed ^ 0xA5A5A5);
    let moist_noise = PerlinNoise::new(config.seed ^ 0x5A5A5A);

    let elevations = heights.as_slice();
    let cells: Vec<(f32, f32)> = (0..elevations.len())
        .into_par_iter()
        .map(|i| {
            let x = (i % w) as f32;
            let y = (i / w) as f32;

            let t = temp_noise.fbm(
                x + 100.0,
                y + 100.0,
                config.base_frequency * 1.2,
                config.octaves,
                config.lacunarity,
                config.gain,
            );
            let t = (t + 1.0) * 0.5;
            let lat_factor = 1.0 - (y / h as f32 * 2.0 - 1.0).abs();
            let temperature = (t * 0.6 + 0.4 * lat_factor).clamp(0.0, 1.0);

            let m = moist_noise.fbm(
                x - 100.0,
                y - 100.0,
                config.base_frequency * 1.5,
                config.octaves,
                config.lacunarity,
                config.gain,
            );
            let m = (m + 1.0) * 0.5;
            let moisture = (m * (0.6 + 0.4 * (1.0 - elevations[i]))).clamp(0.0, 1.0);

            (temperature, moisture)
        })
        .collect();

    let (temperature, moisture): (Vec<f32>, Vec<f32>) = cells.into_iter().unzip();
    ClimateFields {
        temperature: Grid2D::from_vec(heights.width(), heights.height(), temperature),
        moisture: Grid2D::from_vec(heights.width(), heights.height(), moisture),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_normalized() {
        let heights = Grid2D::from_fn(32, 32, |x, y| ((x + y) as f32 / 64.0).min(1.0));
        let out = compute_climate(&heights, &ClimateConfig::with_seed(5));
        assert!(out
            .temperature
            .as_slice()
            .iter()
            .all(|&v| (0.0..=1.0).contains(&v)));
        assert!(out
            .moisture
            .as_slice()
            .iter()
            .all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn climate_is_deterministic_for_seed() {
        let heights = Grid2D::new(16, 16, 0.5f32);
        let cfg = ClimateConfig::with_seed(11);
        let a = compute_climate(&heights, &cfg);
        let b = compute_climate(&heights, &cfg);
        assert_eq!(a.temperature.as_slice(), b.temperature.as_slice());
        assert_eq!(a.moisture.as_slice(), b.moisture.as_slice());
    }

    #[test]
    fn higher_terrain_never_increases_moisture() {
        // Same noise draw per cell, different elevation damping.
        let cfg = ClimateConfig::with_seed(23);
        let low = compute_climate(&Grid2D::new(16, 16, 0.0f32), &cfg);
        let high = compute_climate(&Grid2D::new(16, 16, 1.0f32), &cfg);
        for (lo, hi) in low
            .moisture
            .as_slice()
            .iter()
            .zip(high.moisture.as_slice())
        {
            assert!(hi <= lo);
        }
    }
}
