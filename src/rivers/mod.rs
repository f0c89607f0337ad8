//! River extraction and carving: D8 flow routing, accumulation, channels.
//!
//! Flow accumulation processes cells in elevation-descending order, which is
//! a valid topological order because a cell only ever flows to a strictly
//! lower neighbor. Pits (no lower neighbor) are terminal sinks; no filling
//! is performed.

mod config;

pub use config::RiverParams;

use std::collections::VecDeque;

use rayon::prelude::*;

use crate::grid::Grid2D;

/// D8 neighbor offsets; even indices are cardinal (distance 1), odd are
/// diagonal (distance √2).
const DX: [i32; 8] = [1, 1, 0, -1, -1, -1, 0, 1];
const DY: [i32; 8] = [0, 1, 1, 1, 0, -1, -1, -1];

/// Outputs of the river stage. The carved heightmap is mutated in place.
#[derive(Debug, Clone)]
pub struct RiverOutputs {
    /// Downstream cell index per cell, or -1 for sinks.
    pub flow_dir: Grid2D<i32>,
    /// Contributing cells draining through each cell, >= 1 everywhere.
    pub flow_accum: Grid2D<f32>,
    /// 255 where accumulation meets the threshold, 0 elsewhere.
    pub river_mask: Grid2D<u8>,
}

/// Steepest-descent D8 flow direction for every cell.
pub fn compute_flow_directions(heights: &Grid2D<f32>) -> Grid2D<i32> {
    let w = heights.width() as i32;
    let h = heights.height() as i32;
    let cells = heights.as_slice();
    let diag_dist = 2.0f32.sqrt();

    let dirs: Vec<i32> = (0..cells.len())
        .into_par_iter()
        .map(|i| {
            let x = (i as i32) % w;
            let y = (i as i32) / w;
            let here = cells[i];

            let mut best = -1i32;
            let mut best_drop = 0.0f32;
            for k in 0..8 {
                let nx = x + DX[k];
                let ny = y + DY[k];
                if nx < 0 || nx >= w || ny < 0 || ny >= h {
                    continue;
                }
                let ni = (ny * w + nx) as usize;
                let dist = if k % 2 == 0 { 1.0 } else { diag_dist };
                let drop = (here - cells[ni]) / dist;
                if drop > best_drop {
                    best_drop = drop;
                    best = ni as i32;
                }
            }
            best
        })
        .collect();

    Grid2D::from_vec(heights.width(), heights.height(), dirs)
}

/// Contributing area per cell, given downstream indices.
pub fn compute_flow_accumulation(heights: &Grid2D<f32>, flow_dir: &Grid2D<i32>) -> Grid2D<f32> {
    assert!(heights.same_dims(flow_dir), "flow grids must share dims");
    let cells = heights.as_slice();

    let mut order: Vec<u32> = (0..cells.len() as u32).collect();
    order.par_sort_unstable_by(|&a, &b| {
        cells[b as usize]
            .partial_cmp(&cells[a as usize])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Every cell contributes at least its own area.
    let mut accum = vec![1.0f32; cells.len()];
    let dirs = flow_dir.as_slice();
    for &i in &order {
        let d = dirs[i as usize];
        if d >= 0 {
            accum[d as usize] += accum[i as usize];
        }
    }

    Grid2D::from_vec(heights.width(), heights.height(), accum)
}

/// Binary river mask (0/255) from accumulation.
pub fn river_mask_from_accum(accum: &Grid2D<f32>, threshold: f32) -> Grid2D<u8> {
    accum.map(|&a| if a >= threshold { 255 } else { 0 })
}

/// 4-connected BFS distance from the river cells; `i32::MAX` where unreachable.
fn distance_from_rivers(mask: &Grid2D<u8>) -> Vec<i32> {
    let w = mask.width() as i32;
    let h = mask.height() as i32;
    let cells = mask.as_slice();

    let mut dist = vec![i32::MAX; cells.len()];
    let mut queue: VecDeque<usize> = VecDeque::new();
    // All river cells start at distance 0; seed order does not matter.
    for (i, &m) in cells.iter().enumerate() {
        if m != 0 {
            dist[i] = 0;
            queue.push_back(i);
        }
    }

    while let Some(cur) = queue.pop_front() {
        let cx = (cur as i32) % w;
        let cy = (cur as i32) / w;
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let nx = cx + dx;
            let ny = cy + dy;
            if nx < 0 || nx >= w || ny < 0 || ny >= h {
                continue;
            }
            let ni = (ny * w + nx) as usize;
            if dist[ni] > dist[cur] + 1 {
                dist[ni] = dist[cur] + 1;
                queue.push_back(ni);
            }
        }
    }

    dist
}

/// Carves channels into `heights` around the river network.
///
/// Depth grows logarithmically with accumulation, width with its square
/// root; the cut falls off linearly with BFS distance and heights clamp at
/// zero so carving never underflows the domain.
pub fn carve_channels(
    heights: &mut Grid2D<f32>,
    flow_accum: &Grid2D<f32>,
    river_mask: &Grid2D<u8>,
    params: &RiverParams,
) {
    let dist = distance_from_rivers(river_mask);
    let accum = flow_accum.as_slice();
    let min_d = params.min_channel_depth as f64;
    let max_d = params.max_channel_depth as f64;
    let width_mul = params.width_multiplier as f64;

    heights
        .as_mut_slice()
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, cell)| {
            if dist[i] == i32::MAX {
                return;
            }
            let flow = accum[i] as f64;
            let width = width_mul * flow.max(1.0).sqrt();
            let depth = (min_d + (max_d - min_d) * (flow.ln_1p() / 8.0).min(1.0)).clamp(min_d, max_d);
            let falloff = if dist[i] == 0 {
                1.0
            } else {
                let radius = width.max(1.0);
                (1.0 - dist[i] as f64 / (radius * 1.5)).max(0.0)
            };
            *cell = ((*cell as f64) - depth * falloff).max(0.0) as f32;
        });
}

/// Full river stage: directions, accumulation, mask, carve.
pub fn generate_rivers(heights: &mut Grid2D<f32>, params: &RiverParams) -> RiverOutputs {
    let flow_dir = compute_flow_directions(heights);
    let flow_accum = compute_flow_accumulation(heights, &flow_dir);
    let river_mask = river_mask_from_accum(&flow_accum, params.flow_accum_threshold);
    carve_channels(heights, &flow_accum, &river_mask, params);
    RiverOutputs {
        flow_dir,
        flow_accum,
        river_mask,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_terrain_has_no_flow() {
        let heights = Grid2D::new(16, 16, 0.5f32);
        let dirs = compute_flow_directions(&heights);
        assert!(dirs.as_slice().iter().all(|&d| d == -1));

        let accum = compute_flow_accumulation(&heights, &dirs);
        assert!(accum.as_slice().iter().all(|&a| a == 1.0));

        let mask = river_mask_from_accum(&accum, 200.0);
        assert!(mask.as_slice().iter().all(|&m| m == 0));
    }

    #[test]
    fn north_ramp_flows_north_with_arithmetic_accumulation() {
        // Height increases with y, so every cell below the top row drains to
        // its northern neighbor and each column accumulates 1, 2, 3, ...
        let size = 32u32;
        let heights = Grid2D::from_fn(size, size, |_, y| y as f32 / size as f32);
        let dirs = compute_flow_directions(&heights);
        for y in 1..size {
            for x in 0..size {
                let expected = ((y - 1) * size + x) as i32;
                assert_eq!(*dirs.get(x, y), expected, "cell ({x},{y})");
            }
        }
        for x in 0..size {
            assert_eq!(*dirs.get(x, 0), -1);
        }

        let accum = compute_flow_accumulation(&heights, &dirs);
        for y in 0..size {
            for x in 0..size {
                assert_eq!(*accum.get(x, y), (size - y) as f32);
            }
        }
    }

    #[test]
    fn mask_cell_count_matches_threshold_count() {
        let size = 128u32;
        let heights = crate::plates::PlateField::new(
            size,
            size,
            crate::plates::VoronoiConfig::with_seed(7),
        )
        .generate();
        let dirs = compute_flow_directions(&heights);
        let accum = compute_flow_accumulation(&heights, &dirs);
        let mask = river_mask_from_accum(&accum, 200.0);

        let masked = mask.as_slice().iter().filter(|&&m| m == 255).count();
        let above = accum.as_slice().iter().filter(|&&a| a >= 200.0).count();
        assert_eq!(masked, above);
        assert!(mask.as_slice().iter().all(|&m| m == 0 || m == 255));
    }

    #[test]
    fn carving_never_raises_terrain() {
        let size = 64u32;
        let mut heights = Grid2D::from_fn(size, size, |x, y| {
            0.3 + 0.5 * ((x as f32 / size as f32).sin() * (y as f32 / size as f32)).abs()
        });
        let before = heights.clone();
        let params = RiverParams {
            flow_accum_threshold: 4.0,
            ..Default::default()
        };
        generate_rivers(&mut heights, &params);

        for (after, before) in heights.as_slice().iter().zip(before.as_slice()) {
            assert!(after <= before);
            assert!(*after >= 0.0);
        }
    }

    #[test]
    fn degenerate_single_cell_grid() {
        let mut heights = Grid2D::new(1, 1, 0.7f32);
        let out = generate_rivers(&mut heights, &RiverParams::default());
        assert_eq!(*out.flow_dir.get(0, 0), -1);
        assert_eq!(*out.flow_accum.get(0, 0), 1.0);
        assert_eq!(*out.river_mask.get(0, 0), 0);
        assert_eq!(*heights.get(0, 0), 0.7);
    }
}
