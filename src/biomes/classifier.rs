//! Weighted biome scoring over climate, elevation, slope and water features.

use std::collections::VecDeque;

use rayon::prelude::*;
use thiserror::Error;

use super::{Biome, BiomeDef, ClassifierOptions, BIOME_COUNT};
use crate::grid::Grid2D;

/// Errors from biome classification.
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("input grids disagree on dimensions: expected {expected_w}x{expected_h}, got {got_w}x{got_h}")]
    DimensionMismatch {
        expected_w: u32,
        expected_h: u32,
        got_w: u32,
        got_h: u32,
    },
    #[error("biome definition set is empty")]
    EmptyDefinitions,
}

/// Multi-source 4-connected BFS distance from `sources`; unreachable cells
/// keep `i32::MAX`.
pub(crate) fn distance_map_bfs(width: u32, height: u32, sources: &[bool]) -> Vec<i32> {
    let w = width as i32;
    let h = height as i32;
    let mut dist = vec![i32::MAX; sources.len()];
    let mut queue: VecDeque<usize> = VecDeque::new();

    for (i, &s) in sources.iter().enumerate() {
        if s {
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

/// Normalized slope magnitude in `[0, 1]` from central differences.
pub fn slope_map(heights: &Grid2D<f32>, expected_max_gradient: f32) -> Grid2D<f32> {
    let w = heights.width() as i32;
    let h = heights.height() as i32;
    let cells = heights.as_slice();

    let data: Vec<f32> = (0..cells.len())
        .into_par_iter()
        .map(|i| {
            let x = (i as i32) % w;
            let y = (i as i32) / w;
            let here = cells[i];
            let sample = |sx: i32, sy: i32| -> f32 {
                if sx < 0 || sx >= w || sy < 0 || sy >= h {
                    here
                } else {
                    cells[(sy * w + sx) as usize]
                }
            };
            let gx = (sample(x + 1, y) - sample(x - 1, y)) * 0.5;
            let gy = (sample(x, y + 1) - sample(x, y - 1)) * 0.5;
            let grad = (gx * gx + gy * gy).sqrt();
            (grad / expected_max_gradient.max(1e-6)).clamp(0.0, 1.0)
        })
        .collect();

    Grid2D::from_vec(heights.width(), heights.height(), data)
}

/// Score in `[0, ~2]` for one biome at one cell; 0 when a hard gate fails.
fn score_biome(
    def: &BiomeDef,
    elevation: f32,
    temperature: f32,
    moisture: f32,
    slope: f32,
    near_coast: bool,
    near_river: bool,
    opts: &ClassifierOptions,
) -> f32 {
    let adj_temp = (temperature * def.temperature_modifier).clamp(0.0, 1.0);
    let adj_moist = (moisture * def.moisture_modifier).clamp(0.0, 1.0);

    if def.requires_water && opts.requires_water {
        let near_water = elevation <= opts.lake_height_threshold || near_coast || near_river;
        if !near_water {
            return 0.0;
        }
    }
    if def.requires_high_elevation && elevation < def.pref_min_elevation {
        return 0.0;
    }

    let range_score = |value: f32, lo: f32, hi: f32| -> f32 {
        if value >= lo && value <= hi {
            1.0
        } else {
            let d = (value - lo).abs().min((value - hi).abs());
            (-d * 8.0).exp()
        }
    };

    let elev_score = range_score(elevation, def.pref_min_elevation, def.pref_max_elevation);
    let moist_score = range_score(adj_moist, def.pref_min_moisture, def.pref_max_moisture);
    let temp_score = range_score(adj_temp, def.pref_min_temperature, def.pref_max_temperature);

    let ds = (slope - def.pref_slope).abs() / def.slope_tolerance.max(1e-6);
    let slope_score = (-ds * 4.0).exp();

    let coast_boost = if def.prefers_coast {
        if near_coast {
            1.5
        } else {
            0.85
        }
    } else {
        1.0
    };
    let river_boost = if def.prefers_river && near_river {
        1.35
    } else {
        1.0
    };

    let weight_sum = def.weight_elevation
        + def.weight_moisture
        + def.weight_temperature
        + def.weight_slope
        + def.weight_coastal
        + def.weight_river;
    let weighted = (def.weight_elevation * elev_score
        + def.weight_moisture * moist_score
        + def.weight_temperature * temp_score
        + def.weight_slope * slope_score
        + def.weight_coastal * if near_coast { 1.0 } else { 0.0 }
        + def.weight_river * if near_river { 1.0 } else { 0.0 })
        / weight_sum.max(1e-6);

    let mut score = weighted * coast_boost * river_boost;

    // Very wet biomes collapse in arid cells.
    if def.pref_min_moisture > 0.7 && adj_moist < 0.15 {
        score *= 0.07;
    }

    score
}

/// Picks the best-scoring biome; ties resolve to the earlier definition.
/// Falls back to Grassland when nothing scores meaningfully.
fn choose_best_biome(
    defs: &[BiomeDef],
    elevation: f32,
    temperature: f32,
    moisture: f32,
    slope: f32,
    near_coast: bool,
    near_river: bool,
    opts: &ClassifierOptions,
) -> Biome {
    let mut best = Biome::Unknown;
    let mut best_score = -1.0f32;
    for def in defs {
        let s = score_biome(
            def, elevation, temperature, moisture, slope, near_coast, near_river, opts,
        );
        if s > best_score {
            best_score = s;
            best = def.id;
        }
    }
    if best_score <= 1e-5 {
        if defs.iter().any(|d| d.id == Biome::Grassland) {
            return Biome::Grassland;
        }
    }
    best
}

/// 3x3 majority filter, `iterations` sequential double-buffered passes.
/// Ties keep the center value.
pub fn majority_filter(map: &mut Grid2D<Biome>, iterations: u32) {
    if iterations == 0 {
        return;
    }
    let w = map.width() as i32;
    let h = map.height() as i32;

    for _ in 0..iterations {
        let src = map.as_slice().to_vec();
        map.as_mut_slice()
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, cell)| {
                let x = (i as i32) % w;
                let y = (i as i32) / w;

                let mut counts = [0u32; BIOME_COUNT];
                for oy in -1..=1 {
                    for ox in -1..=1 {
                        let nx = x + ox;
                        let ny = y + oy;
                        if nx < 0 || nx >= w || ny < 0 || ny >= h {
                            continue;
                        }
                        counts[src[(ny * w + nx) as usize].as_u8() as usize] += 1;
                    }
                }

                let center = src[i].as_u8() as usize;
                let mut best = center;
                let mut best_count = counts[center];
                for (v, &c) in counts.iter().enumerate() {
                    if c > best_count {
                        best = v;
                        best_count = c;
                    }
                }
                *cell = Biome::from_u8(best as u8);
            });
    }
}

/// Classifies every cell, then smooths with the majority filter.
pub fn classify_biome_map(
    heights: &Grid2D<f32>,
    temperature: &Grid2D<f32>,
    moisture: &Grid2D<f32>,
    river_mask: Option<&Grid2D<u8>>,
    defs: &[BiomeDef],
    opts: &ClassifierOptions,
) -> Result<Grid2D<Biome>, ClassifyError> {
    let mismatch = |g_w: u32, g_h: u32| ClassifyError::DimensionMismatch {
        expected_w: heights.width(),
        expected_h: heights.height(),
        got_w: g_w,
        got_h: g_h,
    };
    if !heights.same_dims(temperature) {
        return Err(mismatch(temperature.width(), temperature.height()));
    }
    if !heights.same_dims(moisture) {
        return Err(mismatch(moisture.width(), moisture.height()));
    }
    if let Some(r) = river_mask {
        if !heights.same_dims(r) {
            return Err(mismatch(r.width(), r.height()));
        }
    }
    if defs.is_empty() {
        return Err(ClassifyError::EmptyDefinitions);
    }

    let w = heights.width();
    let h = heights.height();
    let elevations = heights.as_slice();

    let ocean_sources: Vec<bool> = elevations
        .iter()
        .map(|&e| e < opts.ocean_height_threshold)
        .collect();
    let coast_dist = distance_map_bfs(w, h, &ocean_sources);
    // Coastal means close to the waterline, so open water itself is excluded.
    let near_coast: Vec<bool> = coast_dist
        .iter()
        .map(|&d| d > 0 && d <= opts.coast_distance_tiles)
        .collect();

    let river_cells: Option<Vec<bool>> =
        river_mask.map(|r| r.as_slice().iter().map(|&m| m != 0).collect());
    let near_river: Vec<bool> = match &river_cells {
        Some(sources) => {
            let dist = distance_map_bfs(w, h, sources);
            dist.iter()
                .zip(sources)
                .map(|(&d, &on)| on || d <= opts.river_distance_tiles)
                .collect()
        }
        None => vec![false; elevations.len()],
    };

    let slope = slope_map(heights, opts.expected_max_gradient);
    let slopes = slope.as_slice();
    let temps = temperature.as_slice();
    let moists = moisture.as_slice();

    let chosen: Vec<Biome> = (0..elevations.len())
        .into_par_iter()
        .map(|i| {
            choose_best_biome(
                defs,
                elevations[i],
                temps[i],
                moists[i],
                slopes[i],
                near_coast[i],
                near_river[i],
                opts,
            )
        })
        .collect();

    let mut map = Grid2D::from_vec(w, h, chosen);
    majority_filter(&mut map, opts.smoothing_iterations);
    Ok(map)
}
