//! Procedural terrain generation pipeline.
//!
//! Given a deterministic seed and a target grid size, the pipeline produces
//! a coherent world: a normalized elevation field, a carved river network,
//! a per-cell biome classification and a set of placed surface objects.
//! Six stages feed each other's outputs over dense 2D grids; each stage is
//! internally data-parallel and deterministic under a fixed seed and worker
//! count.

pub mod biomes;
pub mod climate;
pub mod erosion;
pub mod export;
pub mod grid;
pub mod noise;
pub mod objects;
pub mod pipeline;
pub mod plates;
pub mod rivers;
pub mod rng;
pub mod world;

pub use biomes::{Biome, BiomeDef, ClassifierOptions};
pub use climate::ClimateConfig;
pub use erosion::{ErosionParams, ErosionStats};
pub use grid::Grid2D;
pub use objects::{ObjectInstance, PlacementConfig};
pub use pipeline::{generate, Pipeline, PipelineConfig, PipelineError, PipelineResult};
pub use plates::VoronoiConfig;
pub use rivers::RiverParams;
pub use world::World;
