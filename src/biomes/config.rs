//! Classifier options and biome definition loading.

use serde::{Deserialize, Serialize};

use super::BiomeDef;

/// Tuning knobs for biome classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierOptions {
    /// Tiles from the waterline within which a cell counts as coastal.
    pub coast_distance_tiles: i32,
    /// Tiles from a river cell within which a cell counts as riverine.
    pub river_distance_tiles: i32,
    /// Heights below this are ocean.
    pub ocean_height_threshold: f32,
    /// Heights below this can hold standing water (lakes, swamps).
    pub lake_height_threshold: f32,
    /// Gradient magnitude that maps to slope 1.0.
    pub expected_max_gradient: f32,
    /// Majority-filter passes applied after scoring.
    pub smoothing_iterations: u32,
    /// If false, `requires_water` gates are ignored.
    pub requires_water: bool,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            coast_distance_tiles: 3,
            river_distance_tiles: 2,
            ocean_height_threshold: 0.35,
            lake_height_threshold: 0.45,
            expected_max_gradient: 0.18,
            smoothing_iterations: 1,
            requires_water: true,
        }
    }
}

/// Parses a biome definition array from JSON.
///
/// Unknown keys are ignored and missing fields take the documented
/// defaults. Returns the built-in table if the array is empty.
pub fn load_biome_defs(json: &str) -> Result<Vec<BiomeDef>, serde_json::Error> {
    let defs: Vec<BiomeDef> = serde_json::from_str(json)?;
    if defs.is_empty() {
        return Ok(super::default_biomes());
    }
    Ok(defs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biomes::Biome;

    #[test]
    fn loads_partial_records_with_defaults() {
        let json = r#"[
            {"id": "Grassland", "name": "Grassland", "pref_min_moisture": 0.25,
             "some_future_key": 3}
        ]"#;
        let defs = load_biome_defs(json).unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].id, Biome::Grassland);
        assert_eq!(defs[0].pref_min_moisture, 0.25);
        assert_eq!(defs[0].pref_max_moisture, 1.0);
        assert_eq!(defs[0].weight_moisture, 1.5);
    }

    #[test]
    fn accepts_spaced_tag_names() {
        let json = r#"[{"id": "Tropical Rainforest"}, {"id": "Snow/Ice"}]"#;
        let defs = load_biome_defs(json).unwrap();
        assert_eq!(defs[0].id, Biome::TropicalRainforest);
        assert_eq!(defs[1].id, Biome::Snow);
    }

    #[test]
    fn empty_array_falls_back_to_builtin_table() {
        let defs = load_biome_defs("[]").unwrap();
        assert_eq!(defs.len(), 15);
    }
}
