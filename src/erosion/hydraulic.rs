//! Droplet-based hydraulic erosion.
//!
//! Droplets walk the heightfield carrying sediment. No droplet writes to the
//! heightmap while simulating: each worker accumulates erosion and deposition
//! into private f64 grids, and a fixed-order reduction applies the net delta
//! once all droplets have terminated. This keeps the stage free of atomics
//! and bit-reproducible for a fixed worker count.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::erosion::ErosionParams;
use crate::grid::Grid2D;
use crate::rng::item_seed;

/// Aggregate totals from one erosion run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErosionStats {
    pub total_eroded: f64,
    pub total_deposited: f64,
    pub applied_droplets: usize,
}

/// Per-cell sediment totals plus run statistics.
#[derive(Debug, Clone)]
pub struct ErosionOutputs {
    pub eroded: Grid2D<f64>,
    pub deposited: Grid2D<f64>,
    pub stats: ErosionStats,
}

/// Bilinear height sample at a fractional position, clamped to the domain.
fn sample_bilinear(heights: &Grid2D<f32>, fx: f32, fy: f32) -> f32 {
    let w = heights.width();
    let h = heights.height();
    let fx = fx.clamp(0.0, (w - 1) as f32);
    let fy = fy.clamp(0.0, (h - 1) as f32);

    let x0 = fx.floor() as u32;
    let y0 = fy.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let sx = fx - x0 as f32;
    let sy = fy - y0 as f32;

    let v00 = *heights.get(x0, y0);
    let v10 = *heights.get(x1, y0);
    let v01 = *heights.get(x0, y1);
    let v11 = *heights.get(x1, y1);

    let a = v00 * (1.0 - sx) + v10 * sx;
    let b = v01 * (1.0 - sx) + v11 * sx;
    a * (1.0 - sy) + b * sy
}

/// Height plus central-difference gradient from four half-step samples.
fn sample_height_and_gradient(heights: &Grid2D<f32>, pos: Vec2) -> (f32, Vec2) {
    const EPS: f32 = 1.0;
    let here = sample_bilinear(heights, pos.x, pos.y);
    let hx = sample_bilinear(heights, pos.x + EPS, pos.y);
    let lx = sample_bilinear(heights, pos.x - EPS, pos.y);
    let hy = sample_bilinear(heights, pos.x, pos.y + EPS);
    let ly = sample_bilinear(heights, pos.x, pos.y - EPS);
    let grad = Vec2::new((hx - lx) * 0.5 / EPS, (hy - ly) * 0.5 / EPS);
    (here, grad)
}

/// Splits `amount` over the four cells enclosing `(fx, fy)` by bilinear
/// weights, clamped to valid indices at the domain edges.
fn accumulate_quad(buf: &mut [f64], width: u32, height: u32, fx: f32, fy: f32, amount: f64) {
    if amount == 0.0 {
        return;
    }
    let fx = fx.clamp(0.0, (width - 1) as f32);
    let fy = fy.clamp(0.0, (height - 1) as f32);

    let x0 = fx.floor() as u32;
    let y0 = fy.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let sx = (fx - x0 as f32) as f64;
    let sy = (fy - y0 as f32) as f64;

    let w = width as usize;
    buf[y0 as usize * w + x0 as usize] += amount * (1.0 - sx) * (1.0 - sy);
    buf[y0 as usize * w + x1 as usize] += amount * sx * (1.0 - sy);
    buf[y1 as usize * w + x0 as usize] += amount * (1.0 - sx) * sy;
    buf[y1 as usize * w + x1 as usize] += amount * sx * sy;
}

fn simulate_droplet(
    heights: &Grid2D<f32>,
    params: &ErosionParams,
    droplet_index: usize,
    erode_buf: &mut [f64],
    deposit_buf: &mut [f64],
) {
    let w = heights.width();
    let h = heights.height();
    let mut rng = SmallRng::seed_from_u64(item_seed(params.world_seed, droplet_index as u64));

    let mut pos = Vec2::new(
        rng.random::<f32>() * (w - 1) as f32,
        rng.random::<f32>() * (h - 1) as f32,
    );
    let mut dir = Vec2::ZERO;
    let mut speed = params.init_speed;
    let mut water = params.init_water;
    let mut sediment = 0.0f32;

    for _ in 0..params.max_steps {
        let (height_here, grad) = sample_height_and_gradient(heights, pos);

        dir = dir * params.inertia - grad * (1.0 - params.inertia);
        let mut len = dir.length();
        if len == 0.0 {
            // Flat spot: nudge in a random direction so the droplet keeps moving.
            let theta = rng.random::<f32>() * std::f32::consts::TAU;
            dir = Vec2::new(theta.cos(), theta.sin()) * 1e-6;
            len = dir.length();
        }
        dir /= len;

        pos += dir * params.step_size;
        if pos.x < 0.0 || pos.x > (w - 1) as f32 || pos.y < 0.0 || pos.y > (h - 1) as f32 {
            break;
        }

        let new_height = sample_bilinear(heights, pos.x, pos.y);
        let delta_h = new_height - height_here;

        speed = (speed * speed + (-delta_h) * params.gravity).max(0.0).sqrt();
        let slope = (-delta_h / params.step_size).max(1e-6);
        let capacity = (params.capacity_factor * speed * water * slope).max(0.0);

        if sediment > capacity {
            let deposit = (params.deposit_rate * (sediment - capacity)).min(sediment);
            accumulate_quad(deposit_buf, w, h, pos.x, pos.y, deposit as f64);
            sediment -= deposit;
        } else {
            // Never remove more than one step's cap or the column's height.
            let erode = (params.erode_rate * params.capacity_factor * (capacity - sediment))
                .min(params.max_erode_per_step)
                .min(new_height.max(0.0));
            if erode > 0.0 {
                accumulate_quad(erode_buf, w, h, pos.x, pos.y, erode as f64);
                sediment += erode;
            }
        }

        water *= 1.0 - params.evaporate_rate;
        if water < params.min_water || speed < params.min_speed {
            break;
        }
    }
}

/// Runs the droplet simulation, applying the net delta to `heights` in place
/// (clamped at zero) and returning the per-cell totals.
pub fn run_hydraulic_erosion(heights: &mut Grid2D<f32>, params: &ErosionParams) -> ErosionOutputs {
    let width = heights.width();
    let height = heights.height();
    let n_cells = heights.len();
    let n_droplets = params.num_droplets;

    let workers = if params.workers == 0 {
        rayon::current_num_threads()
    } else {
        params.workers
    }
    .max(1);
    let chunk = n_droplets.div_ceil(workers).max(1);

    // One private accumulator pair per worker range.
    let frozen: &Grid2D<f32> = heights;
    let buffers: Vec<(Vec<f64>, Vec<f64>)> = (0..workers)
        .into_par_iter()
        .map(|wi| {
            let mut erode_buf = vec![0.0f64; n_cells];
            let mut deposit_buf = vec![0.0f64; n_cells];
            let start = wi * chunk;
            let end = ((wi + 1) * chunk).min(n_droplets);
            for di in start..end {
                simulate_droplet(frozen, params, di, &mut erode_buf, &mut deposit_buf);
            }
            (erode_buf, deposit_buf)
        })
        .collect();

    // Reduce in worker order so float summation order is fixed.
    let mut final_erode = vec![0.0f64; n_cells];
    let mut final_deposit = vec![0.0f64; n_cells];
    for (erode_buf, deposit_buf) in &buffers {
        for i in 0..n_cells {
            final_erode[i] += erode_buf[i];
            final_deposit[i] += deposit_buf[i];
        }
    }

    let mut stats = ErosionStats {
        applied_droplets: n_droplets,
        ..Default::default()
    };
    let cells = heights.as_mut_slice();
    for i in 0..n_cells {
        stats.total_eroded += final_erode[i];
        stats.total_deposited += final_deposit[i];
        let new_h = cells[i] as f64 + final_deposit[i] - final_erode[i];
        cells[i] = new_h.max(0.0) as f32;
    }

    ErosionOutputs {
        eroded: Grid2D::from_vec(width, height, final_erode),
        deposited: Grid2D::from_vec(width, height, final_deposit),
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plates::{PlateField, VoronoiConfig};

    fn test_heights(size: u32, seed: u64) -> Grid2D<f32> {
        PlateField::new(size, size, VoronoiConfig::with_seed(seed)).generate()
    }

    fn params(droplets: usize) -> ErosionParams {
        ErosionParams {
            world_seed: 42,
            num_droplets: droplets,
            workers: 2,
            ..Default::default()
        }
    }

    #[test]
    fn zero_droplets_leave_heights_untouched() {
        let mut heights = test_heights(64, 42);
        let before = heights.clone();
        let out = run_hydraulic_erosion(&mut heights, &params(0));
        assert_eq!(heights.as_slice(), before.as_slice());
        assert_eq!(out.stats.total_eroded, 0.0);
        assert_eq!(out.stats.total_deposited, 0.0);
    }

    #[test]
    fn heights_stay_non_negative() {
        let mut heights = test_heights(32, 7);
        run_hydraulic_erosion(&mut heights, &params(5000));
        assert!(heights.as_slice().iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn height_delta_matches_deposit_minus_erode() {
        let mut heights = test_heights(32, 13);
        let before = heights.clone();
        let out = run_hydraulic_erosion(&mut heights, &params(5000));

        for i in 0..heights.len() {
            let expected = (before.as_slice()[i] as f64 + out.deposited.as_slice()[i]
                - out.eroded.as_slice()[i])
                .max(0.0);
            let got = heights.as_slice()[i] as f64;
            assert!(
                (got - expected).abs() < 1e-5,
                "cell {i}: got {got}, expected {expected}"
            );
        }
    }

    #[test]
    fn fixed_worker_count_is_bit_reproducible() {
        let mut a = test_heights(32, 99);
        let mut b = a.clone();
        let p = params(4000);
        let oa = run_hydraulic_erosion(&mut a, &p);
        let ob = run_hydraulic_erosion(&mut b, &p);
        assert_eq!(a.as_slice(), b.as_slice());
        assert_eq!(oa.eroded.as_slice(), ob.eroded.as_slice());
        assert_eq!(oa.deposited.as_slice(), ob.deposited.as_slice());
    }

    #[test]
    fn stats_totals_match_grid_sums() {
        let mut heights = test_heights(24, 3);
        let out = run_hydraulic_erosion(&mut heights, &params(2000));
        let erode_sum: f64 = out.eroded.as_slice().iter().sum();
        let deposit_sum: f64 = out.deposited.as_slice().iter().sum();
        assert!((out.stats.total_eroded - erode_sum).abs() < 1e-9);
        assert!((out.stats.total_deposited - deposit_sum).abs() < 1e-9);
    }
}
