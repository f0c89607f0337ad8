//! Surface object placement: density-driven scattering with spacing rules.
//!
//! Each cell draws candidates from its biome's object list through a
//! per-cell random stream, so the candidate set is a pure function of
//! (seed, cell, config). Accepted instances go through a spatial hash under
//! a single mutex that enforces per-def minimum spacing; acceptance order
//! under concurrency is the only non-deterministic part, and the
//! `deterministic` flag serializes the row loop to remove it.

mod config;

pub use config::{ClusterDef, ObjectDef, PlacementConfig};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use glam::Vec2;
use rayon::prelude::*;

use crate::biomes::Biome;
use crate::grid::Grid2D;
use crate::rng::{cell_state, rand01};

/// One placed object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInstance {
    pub id: u32,
    pub name: String,
    pub model: String,
    pub cell_x: u32,
    pub cell_y: u32,
    pub world_x: f32,
    pub world_y: f32,
    pub world_z: f32,
    pub yaw: f32,
    pub scale: f32,
    pub biome: String,
}

/// Raw central-difference gradient magnitude, border-clamped.
///
/// Unlike the biome classifier's slope map this is not normalized; object
/// slope filters are expressed against the raw gradient.
pub fn gradient_map(heights: &Grid2D<f32>) -> Grid2D<f32> {
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
            (gx * gx + gy * gy).sqrt()
        })
        .collect();

    Grid2D::from_vec(heights.width(), heights.height(), data)
}

/// Standing-water mask: 255 at or below the lake threshold, else 0.
///
/// Ocean-flood-reachable cells and isolated basins both sit below the lake
/// threshold, so the union reduces to the threshold test.
pub fn water_mask(heights: &Grid2D<f32>, lake_threshold: f32) -> Grid2D<u8> {
    heights.map(|&h| if h <= lake_threshold { 255 } else { 0 })
}

/// BFS tile distance to the nearest water cell; `i32::MAX` on dry maps.
pub fn coast_distance(water: &Grid2D<u8>) -> Grid2D<i32> {
    let sources: Vec<bool> = water.as_slice().iter().map(|&m| m != 0).collect();
    let dist = crate::biomes::distance_map_bfs(water.width(), water.height(), &sources);
    Grid2D::from_vec(water.width(), water.height(), dist)
}

struct PlacedState {
    instances: Vec<ObjectInstance>,
    hash_cells: Vec<Vec<u32>>,
}

/// Scatters objects over the biome map.
pub struct ObjectPlacer<'a> {
    width: u32,
    height: u32,
    world_size_m: f32,
    cell_size_m: f32,
    grid_w: i32,
    grid_h: i32,
    config: &'a PlacementConfig,
}

impl<'a> ObjectPlacer<'a> {
    pub fn new(width: u32, height: u32, config: &'a PlacementConfig) -> Self {
        let world_size_m = if config.world_size_m > 0.0 {
            config.world_size_m
        } else {
            width as f32
        };
        let cell_size_m = world_size_m / width.max(height) as f32;
        // Hash cells at least as large as the largest configured spacing
        // keep every potential conflict inside the 5x5 neighborhood.
        // Cluster children only halve distances, so they never raise the
        // requirement.
        let max_min_distance = config
            .biome_objects
            .values()
            .flatten()
            .map(|d| d.min_distance_m)
            .fold(config.default_min_distance_m, f32::max);
        let grid_w = ((world_size_m / max_min_distance.max(0.5)).ceil() as i32).max(1);
        Self {
            width,
            height,
            world_size_m,
            cell_size_m,
            grid_w,
            grid_h: grid_w,
            config,
        }
    }

    pub fn cell_size_m(&self) -> f32 {
        self.cell_size_m
    }

    fn hash_index(&self, wx: f32, wy: f32) -> usize {
        let gx = ((wx / self.world_size_m * self.grid_w as f32).floor() as i32)
            .clamp(0, self.grid_w - 1);
        let gy = ((wy / self.world_size_m * self.grid_h as f32).floor() as i32)
            .clamp(0, self.grid_h - 1);
        (gy * self.grid_w + gx) as usize
    }

    fn placement_probability(
        &self,
        def: &ObjectDef,
        elevation: f32,
        slope: f32,
        is_water: bool,
        coast_tiles: i32,
    ) -> f32 {
        let cell_area = self.cell_size_m * self.cell_size_m;
        let p_base = def.density_per_1000m2 / 1000.0 * cell_area;
        if p_base <= 0.0 {
            return 0.0;
        }
        if elevation < def.elevation_min || elevation > def.elevation_max {
            return 0.0;
        }
        if slope < def.slope_min || slope > def.slope_max {
            return 0.0;
        }
        if def.requires_water && !is_water {
            return 0.0;
        }

        let mut boost = 1.0;
        if def.prefers_coast && (0..=3).contains(&coast_tiles) {
            boost += 0.65 * (1.0 - coast_tiles as f32 / 3.0);
        }

        let slope_penalty = if slope > 0.6 {
            0.3
        } else if slope > 0.3 {
            0.6
        } else {
            1.0
        };

        (p_base * boost * slope_penalty).min(0.95)
    }

    #[allow(clippy::too_many_arguments)]
    fn attempt_place(
        &self,
        x: u32,
        y: u32,
        def: &ObjectDef,
        biome_name: &str,
        heights: &Grid2D<f32>,
        slope: &Grid2D<f32>,
        water: &Grid2D<u8>,
        coast: &Grid2D<i32>,
        seed_state: &mut u64,
        shared: &Mutex<PlacedState>,
        placed_count: &AtomicUsize,
        allow_cluster: bool,
    ) -> bool {
        let elevation = *heights.get(x, y);
        let sl = *slope.get(x, y);
        let is_water = *water.get(x, y) != 0;
        let coast_tiles = *coast.get(x, y);

        let p = self.placement_probability(def, elevation, sl, is_water, coast_tiles);
        if p <= 0.0 {
            return false;
        }

        // High probabilities take one Bernoulli draw; tiny ones approximate a
        // Poisson count with a few small trials.
        let success = if p > 0.2 {
            rand01(seed_state) <= p
        } else {
            let trials = ((p * 10.0).ceil() as u32).max(1);
            (0..trials).any(|_| rand01(seed_state) <= p)
        };
        if !success {
            return false;
        }

        let jx = rand01(seed_state) - 0.5;
        let jy = rand01(seed_state) - 0.5;
        let wx = (x as f32 + 0.5 + jx * 0.9) * self.cell_size_m;
        let wy = (y as f32 + 0.5 + jy * 0.9) * self.cell_size_m;
        let yaw = rand01(seed_state) * def.yaw_variance_deg;
        let scale = def.scale_min + rand01(seed_state) * (def.scale_max - def.scale_min);

        let created = {
            let mut state = shared.lock().expect("placement mutex poisoned");
            if placed_count.load(Ordering::Relaxed) >= self.config.global_max_instances {
                return false;
            }

            // Conflict scan over the 5x5 hash neighborhood.
            let gidx = self.hash_index(wx, wy);
            let gx = (gidx as i32) % self.grid_w;
            let gy = (gidx as i32) / self.grid_w;
            let here = Vec2::new(wx, wy);
            let min_d2 = def.min_distance_m * def.min_distance_m;
            for oy in -2..=2 {
                for ox in -2..=2 {
                    let nx = gx + ox;
                    let ny = gy + oy;
                    if nx < 0 || ny < 0 || nx >= self.grid_w || ny >= self.grid_h {
                        continue;
                    }
                    for &pid in &state.hash_cells[(ny * self.grid_w + nx) as usize] {
                        let other = &state.instances[pid as usize];
                        let d2 = here.distance_squared(Vec2::new(other.world_x, other.world_y));
                        if d2 < min_d2 {
                            return false;
                        }
                    }
                }
            }

            let id = state.instances.len() as u32;
            state.instances.push(ObjectInstance {
                id,
                name: def.name.clone(),
                model: def.model.clone(),
                cell_x: x,
                cell_y: y,
                world_x: wx,
                world_y: wy,
                world_z: elevation,
                yaw,
                scale,
                biome: biome_name.to_string(),
            });
            state.hash_cells[gidx].push(id);
            placed_count.fetch_add(1, Ordering::Relaxed);
            (id, wx, wy)
        };

        if allow_cluster {
            if let Some(cluster) = &def.cluster {
                let mut child = def.clone();
                child.min_distance_m = (def.min_distance_m * 0.5).max(0.4);
                child.cluster = None; // depth is 1

                for c in 0..cluster.count {
                    let mut cluster_seed = (created.0 as u64)
                        .wrapping_mul(1009)
                        .wrapping_add((c as u64).wrapping_mul(7919))
                        .wrapping_add(self.config.seed);
                    let ang = rand01(&mut cluster_seed) * std::f32::consts::TAU;
                    let rad = rand01(&mut cluster_seed) * cluster.radius;
                    let cx = created.1 + ang.cos() * rad;
                    let cy = created.2 + ang.sin() * rad;
                    let px = ((cx / self.cell_size_m).floor() as i64).clamp(0, self.width as i64 - 1)
                        as u32;
                    let py = ((cy / self.cell_size_m).floor() as i64)
                        .clamp(0, self.height as i64 - 1) as u32;
                    self.attempt_place(
                        px,
                        py,
                        &child,
                        biome_name,
                        heights,
                        slope,
                        water,
                        coast,
                        &mut cluster_seed,
                        shared,
                        placed_count,
                        false,
                    );
                }
            }
        }

        true
    }

    /// Places objects for every cell of the biome map and returns the
    /// accepted instances.
    pub fn place(
        &self,
        heights: &Grid2D<f32>,
        slope: &Grid2D<f32>,
        water: &Grid2D<u8>,
        coast: &Grid2D<i32>,
        biomes: &Grid2D<Biome>,
    ) -> Vec<ObjectInstance> {
        let shared = Mutex::new(PlacedState {
            instances: Vec::new(),
            hash_cells: vec![Vec::new(); (self.grid_w * self.grid_h) as usize],
        });
        let placed_count = AtomicUsize::new(0);

        let process_row = |y: u32| {
            if placed_count.load(Ordering::Relaxed) >= self.config.global_max_instances {
                return;
            }
            for x in 0..self.width {
                if placed_count.load(Ordering::Relaxed) >= self.config.global_max_instances {
                    break;
                }
                let biome_name = biomes.get(x, y).name();
                let Some(candidates) = self.config.biome_objects.get(biome_name) else {
                    continue;
                };

                let mut seed_state = cell_state(self.config.seed, x, y);
                for def in candidates {
                    if placed_count.load(Ordering::Relaxed) >= self.config.global_max_instances {
                        break;
                    }
                    self.attempt_place(
                        x,
                        y,
                        def,
                        biome_name,
                        heights,
                        slope,
                        water,
                        coast,
                        &mut seed_state,
                        &shared,
                        &placed_count,
                        true,
                    );
                }
            }
        };

        if self.config.deterministic {
            for y in 0..self.height {
                process_row(y);
            }
        } else {
            (0..self.height).into_par_iter().for_each(process_row);
        }

        shared
            .into_inner()
            .expect("placement mutex poisoned")
            .instances
    }
}
