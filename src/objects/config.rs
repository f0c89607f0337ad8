//! Object placement configuration (JSON-shaped).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Optional cluster block: children spawned around an accepted parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterDef {
    pub count: u32,
    pub radius: f32,
}

impl Default for ClusterDef {
    fn default() -> Self {
        Self {
            count: 3,
            radius: 2.0,
        }
    }
}

/// One placeable object type with its density, filters and spacing rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectDef {
    pub name: String,
    /// Asset path; empty means a placeholder marker.
    pub model: String,
    pub placeholder: bool,
    /// Expected instances per 1000 square meters.
    pub density_per_1000m2: f32,
    /// Minimum spacing between instances of this def, in meters.
    pub min_distance_m: f32,
    pub scale_min: f32,
    pub scale_max: f32,
    pub yaw_variance_deg: f32,
    pub elevation_min: f32,
    pub elevation_max: f32,
    pub slope_min: f32,
    pub slope_max: f32,
    pub requires_water: bool,
    pub prefers_coast: bool,
    pub cluster: Option<ClusterDef>,
}

impl Default for ObjectDef {
    fn default() -> Self {
        Self {
            name: "obj".to_string(),
            model: String::new(),
            placeholder: false,
            density_per_1000m2: 0.0,
            min_distance_m: 1.0,
            scale_min: 1.0,
            scale_max: 1.0,
            yaw_variance_deg: 180.0,
            elevation_min: 0.0,
            elevation_max: 1.0,
            slope_min: 0.0,
            slope_max: 10.0,
            requires_water: false,
            prefers_coast: false,
            cluster: None,
        }
    }
}

/// Top-level placement file: `{ seed, global_max_instances,
/// default_min_distance_m, biome_objects: { biome name: [ObjectDef, ...] } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub seed: u64,
    pub global_max_instances: usize,
    /// Sizes the spatial hash; should be at least the typical min distance.
    pub default_min_distance_m: f32,
    /// World extent in meters; `0` means one meter per map cell.
    pub world_size_m: f32,
    /// Run the row loop serially for byte-stable output.
    pub deterministic: bool,
    pub biome_objects: HashMap<String, Vec<ObjectDef>>,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            seed: 424242,
            global_max_instances: 500_000,
            default_min_distance_m: 2.0,
            world_size_m: 0.0,
            deterministic: false,
            biome_objects: HashMap::new(),
        }
    }
}

impl PlacementConfig {
    /// Parses a placement file, ignoring unknown keys and defaulting
    /// missing ones.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_placement_file_with_partial_defs() {
        let json = r#"{
            "seed": 7,
            "global_max_instances": 1000,
            "biome_objects": {
                "Grassland": [
                    {"name": "oak", "density_per_1000m2": 40.0,
                     "min_distance_m": 2.5,
                     "cluster": {"count": 4, "radius": 3.0}},
                    {"name": "boulder"}
                ]
            }
        }"#;
        let cfg = PlacementConfig::from_json(json).unwrap();
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.global_max_instances, 1000);
        assert_eq!(cfg.default_min_distance_m, 2.0);

        let defs = &cfg.biome_objects["Grassland"];
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].cluster.as_ref().unwrap().count, 4);
        assert_eq!(defs[1].density_per_1000m2, 0.0);
        assert_eq!(defs[1].yaw_variance_deg, 180.0);
    }
}
