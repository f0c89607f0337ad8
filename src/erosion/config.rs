//! Hydraulic erosion parameters.

use serde::{Deserialize, Serialize};

/// Parameters for the droplet erosion simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ErosionParams {
    /// World seed; each droplet derives its own stream from it.
    pub world_seed: u64,
    /// Number of droplets to simulate.
    pub num_droplets: usize,
    /// Maximum lifetime of a droplet in steps.
    pub max_steps: u32,
    /// Distance moved per step in cell units.
    pub step_size: f32,

    pub init_speed: f32,
    pub init_water: f32,
    /// Blend between previous direction (1.0) and downhill gradient (0.0).
    pub inertia: f32,
    pub gravity: f32,
    /// Water fraction lost per step.
    pub evaporate_rate: f32,
    /// Droplet dies below this water volume.
    pub min_water: f32,
    /// Droplet dies below this speed.
    pub min_speed: f32,

    /// Sediment capacity factor (Kc).
    pub capacity_factor: f32,
    /// Erosion rate (Ks).
    pub erode_rate: f32,
    /// Deposition rate (Kd).
    pub deposit_rate: f32,
    /// Upper bound on material removed in one step.
    pub max_erode_per_step: f32,

    /// Accumulator buffer count. Droplets are partitioned into this many
    /// contiguous ranges and the reduction walks them in index order, so a
    /// fixed (seed, droplets, workers) triple reproduces bit-identically.
    /// `0` means one per rayon thread.
    pub workers: usize,
}

impl Default for ErosionParams {
    fn default() -> Self {
        Self {
            world_seed: 424242,
            num_droplets: 200_000,
            max_steps: 45,
            step_size: 1.0,

            init_speed: 1.0,
            init_water: 1.0,
            inertia: 0.3,
            gravity: 9.81,
            evaporate_rate: 0.015,
            min_water: 0.01,
            min_speed: 0.01,

            capacity_factor: 8.0,
            erode_rate: 0.5,
            deposit_rate: 0.3,
            max_erode_per_step: 0.1,

            workers: 0,
        }
    }
}

impl ErosionParams {
    /// Droplet count for a map of `width * height` cells at the given
    /// fraction, floored at 1000.
    pub fn droplets_for_area(fraction: f32, width: u32, height: u32) -> usize {
        let cells = (width as f64) * (height as f64);
        ((fraction as f64 * cells).ceil() as usize).max(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn droplet_count_has_floor() {
        assert_eq!(ErosionParams::droplets_for_area(0.4, 8, 8), 1000);
        assert_eq!(ErosionParams::droplets_for_area(0.4, 512, 512), 104_858);
    }
}
