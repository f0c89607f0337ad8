//! River extraction and carving parameters.

use serde::{Deserialize, Serialize};

/// Parameters for flow accumulation thresholding and channel carving.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiverParams {
    /// Minimum contributing cells for a cell to count as river.
    pub flow_accum_threshold: f32,
    /// Channel depth at minimal accumulation.
    pub min_channel_depth: f32,
    /// Channel depth cap at high accumulation.
    pub max_channel_depth: f32,
    /// Scales channel width from the square root of accumulation.
    pub width_multiplier: f32,
}

impl Default for RiverParams {
    fn default() -> Self {
        Self {
            flow_accum_threshold: 200.0,
            min_channel_depth: 0.4,
            max_channel_depth: 6.0,
            width_multiplier: 0.002,
        }
    }
}

impl RiverParams {
    /// Defaults with the accumulation threshold scaled to the map width:
    /// 200 below 1024, 1000 below 2048, 4000 from 2048 up.
    pub fn scaled_to(width: u32) -> Self {
        let flow_accum_threshold = if width >= 2048 {
            4000.0
        } else if width >= 1024 {
            1000.0
        } else {
            200.0
        };
        Self {
            flow_accum_threshold,
            ..Default::default()
        }
    }
}
