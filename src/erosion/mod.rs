//! Hydraulic erosion stage: droplet simulation over the heightmap.

mod config;
mod hydraulic;

pub use config::ErosionParams;
pub use hydraulic::{run_hydraulic_erosion, ErosionOutputs, ErosionStats};
