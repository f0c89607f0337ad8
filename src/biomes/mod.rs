//! Biome library: tags, per-tag scoring definitions, default table.

mod classifier;
mod config;

pub use classifier::{classify_biome_map, majority_filter, slope_map, ClassifyError};
pub(crate) use classifier::distance_map_bfs;
pub use config::{load_biome_defs, ClassifierOptions};

use serde::{Deserialize, Serialize};

/// Biome classification tag. The `u8` value is stable and used for
/// storage, smoothing histograms and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Biome {
    Ocean = 0,
    Beach = 1,
    Lake = 2,
    Desert = 3,
    Savanna = 4,
    Grassland = 5,
    Shrubland = 6,
    #[serde(alias = "Tropical Rainforest")]
    TropicalRainforest = 7,
    #[serde(alias = "Seasonal Forest")]
    SeasonalForest = 8,
    #[serde(alias = "Boreal Forest")]
    BorealForest = 9,
    Tundra = 10,
    #[serde(alias = "Snow/Ice")]
    Snow = 11,
    Rocky = 12,
    Mountain = 13,
    Swamp = 14,
    Mangrove = 15,
    Unknown = 16,
}

/// Number of distinct tags, `Unknown` included.
pub const BIOME_COUNT: usize = 17;

impl Biome {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Inverse of [`as_u8`](Self::as_u8); out-of-range values map to `Unknown`.
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => Biome::Ocean,
            1 => Biome::Beach,
            2 => Biome::Lake,
            3 => Biome::Desert,
            4 => Biome::Savanna,
            5 => Biome::Grassland,
            6 => Biome::Shrubland,
            7 => Biome::TropicalRainforest,
            8 => Biome::SeasonalForest,
            9 => Biome::BorealForest,
            10 => Biome::Tundra,
            11 => Biome::Snow,
            12 => Biome::Rocky,
            13 => Biome::Mountain,
            14 => Biome::Swamp,
            15 => Biome::Mangrove,
            _ => Biome::Unknown,
        }
    }

    /// Display name, also used as the key into placement configuration.
    pub fn name(self) -> &'static str {
        match self {
            Biome::Ocean => "Ocean",
            Biome::Beach => "Beach",
            Biome::Lake => "Lake",
            Biome::Desert => "Desert",
            Biome::Savanna => "Savanna",
            Biome::Grassland => "Grassland",
            Biome::Shrubland => "Shrubland",
            Biome::TropicalRainforest => "Tropical Rainforest",
            Biome::SeasonalForest => "Seasonal Forest",
            Biome::BorealForest => "Boreal Forest",
            Biome::Tundra => "Tundra",
            Biome::Snow => "Snow/Ice",
            Biome::Rocky => "Rocky",
            Biome::Mountain => "Mountain",
            Biome::Swamp => "Swamp",
            Biome::Mangrove => "Mangrove",
            Biome::Unknown => "Unknown",
        }
    }

    /// RGB preview color for map export.
    pub fn preview_rgb(self) -> [u8; 3] {
        match self {
            Biome::Ocean => [24, 64, 160],
            Biome::Beach => [238, 214, 175],
            Biome::Lake => [36, 120, 200],
            Biome::Desert => [210, 180, 140],
            Biome::Savanna => [189, 183, 107],
            Biome::Grassland => [130, 200, 80],
            Biome::Shrubland => [152, 170, 96],
            Biome::TropicalRainforest => [16, 120, 45],
            Biome::SeasonalForest => [34, 139, 34],
            Biome::BorealForest => [80, 120, 70],
            Biome::Tundra => [180, 190, 200],
            Biome::Snow => [240, 240, 250],
            Biome::Rocky => [140, 130, 120],
            Biome::Mountain => [120, 120, 140],
            Biome::Swamp => [34, 85, 45],
            Biome::Mangrove => [31, 90, 42],
            Biome::Unknown => [255, 0, 255],
        }
    }
}

/// Scoring definition for one biome: preference ranges, hard gates,
/// modifiers and per-feature weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeDef {
    pub id: Biome,
    pub name: String,

    pub moisture_modifier: f32,
    pub temperature_modifier: f32,

    pub pref_min_elevation: f32,
    pub pref_max_elevation: f32,
    pub pref_slope: f32,
    pub slope_tolerance: f32,
    pub pref_min_moisture: f32,
    pub pref_max_moisture: f32,
    pub pref_min_temperature: f32,
    pub pref_max_temperature: f32,

    pub prefers_coast: bool,
    pub requires_water: bool,
    pub requires_high_elevation: bool,
    pub prefers_river: bool,

    pub weight_elevation: f32,
    pub weight_moisture: f32,
    pub weight_temperature: f32,
    pub weight_slope: f32,
    pub weight_coastal: f32,
    pub weight_river: f32,
}

impl Default for BiomeDef {
    fn default() -> Self {
        Self {
            id: Biome::Unknown,
            name: String::new(),

            moisture_modifier: 1.0,
            temperature_modifier: 1.0,

            pref_min_elevation: 0.0,
            pref_max_elevation: 1.0,
            pref_slope: 0.0,
            slope_tolerance: 1.0,
            pref_min_moisture: 0.0,
            pref_max_moisture: 1.0,
            pref_min_temperature: 0.0,
            pref_max_temperature: 1.0,

            prefers_coast: false,
            requires_water: false,
            requires_high_elevation: false,
            prefers_river: false,

            weight_elevation: 1.0,
            weight_moisture: 1.5,
            weight_temperature: 1.0,
            weight_slope: 0.7,
            weight_coastal: 1.2,
            weight_river: 1.0,
        }
    }
}

impl BiomeDef {
    fn named(id: Biome) -> Self {
        Self {
            id,
            name: id.name().to_string(),
            ..Default::default()
        }
    }
}

/// The built-in biome definition table.
///
/// Shrubland carries no default definition and participates only when
/// supplied through an external definition file.
pub fn default_biomes() -> Vec<BiomeDef> {
    vec![
        BiomeDef {
            requires_water: true,
            pref_max_elevation: 0.35,
            weight_elevation: 2.0,
            weight_moisture: 0.5,
            weight_temperature: 0.5,
            ..BiomeDef::named(Biome::Ocean)
        },
        BiomeDef {
            prefers_coast: true,
            pref_min_elevation: 0.35,
            pref_max_elevation: 0.45,
            weight_coastal: 2.0,
            weight_elevation: 1.5,
            ..BiomeDef::named(Biome::Beach)
        },
        BiomeDef {
            requires_water: true,
            pref_min_elevation: 0.35,
            pref_max_elevation: 0.45,
            weight_elevation: 2.0,
            ..BiomeDef::named(Biome::Lake)
        },
        BiomeDef {
            requires_water: true,
            prefers_coast: true,
            pref_min_elevation: 0.35,
            pref_max_elevation: 0.45,
            pref_min_moisture: 0.7,
            pref_max_moisture: 1.0,
            weight_coastal: 2.0,
            weight_moisture: 2.0,
            ..BiomeDef::named(Biome::Mangrove)
        },
        BiomeDef {
            pref_min_elevation: 0.45,
            pref_max_elevation: 0.8,
            pref_min_moisture: 0.0,
            pref_max_moisture: 0.3,
            pref_min_temperature: 0.4,
            pref_max_temperature: 1.0,
            weight_moisture: 2.0,
            weight_temperature: 1.5,
            weight_elevation: 1.0,
            ..BiomeDef::named(Biome::Desert)
        },
        BiomeDef {
            pref_min_elevation: 0.45,
            pref_max_elevation: 0.7,
            pref_min_moisture: 0.2,
            pref_max_moisture: 0.5,
            pref_min_temperature: 0.5,
            pref_max_temperature: 1.0,
            weight_moisture: 1.5,
            weight_temperature: 1.2,
            weight_elevation: 1.0,
            ..BiomeDef::named(Biome::Savanna)
        },
        BiomeDef {
            pref_min_elevation: 0.45,
            pref_max_elevation: 0.7,
            pref_min_moisture: 0.3,
            pref_max_moisture: 0.7,
            pref_min_temperature: 0.2,
            pref_max_temperature: 0.8,
            weight_moisture: 1.5,
            weight_temperature: 1.0,
            weight_elevation: 1.0,
            ..BiomeDef::named(Biome::Grassland)
        },
        BiomeDef {
            pref_min_elevation: 0.45,
            pref_max_elevation: 0.8,
            pref_min_moisture: 0.7,
            pref_max_moisture: 1.0,
            pref_min_temperature: 0.6,
            pref_max_temperature: 1.0,
            weight_moisture: 2.5,
            weight_temperature: 1.5,
            weight_elevation: 1.0,
            ..BiomeDef::named(Biome::TropicalRainforest)
        },
        BiomeDef {
            pref_min_elevation: 0.45,
            pref_max_elevation: 0.8,
            pref_min_moisture: 0.5,
            pref_max_moisture: 1.0,
            pref_min_temperature: 0.3,
            pref_max_temperature: 0.9,
            weight_moisture: 2.0,
            weight_temperature: 1.2,
            weight_elevation: 1.0,
            ..BiomeDef::named(Biome::SeasonalForest)
        },
        BiomeDef {
            pref_min_elevation: 0.6,
            pref_max_elevation: 0.9,
            pref_min_moisture: 0.4,
            pref_max_moisture: 0.8,
            pref_min_temperature: 0.0,
            pref_max_temperature: 0.6,
            weight_moisture: 1.8,
            weight_temperature: 1.5,
            weight_elevation: 1.2,
            ..BiomeDef::named(Biome::BorealForest)
        },
        BiomeDef {
            pref_min_elevation: 0.7,
            pref_max_elevation: 0.9,
            pref_min_moisture: 0.2,
            pref_max_moisture: 0.6,
            pref_min_temperature: 0.0,
            pref_max_temperature: 0.4,
            weight_elevation: 1.5,
            weight_temperature: 2.0,
            weight_moisture: 1.0,
            ..BiomeDef::named(Biome::Tundra)
        },
        BiomeDef {
            requires_high_elevation: true,
            pref_min_elevation: 0.9,
            pref_max_elevation: 1.0,
            pref_min_temperature: 0.0,
            pref_max_temperature: 0.3,
            weight_elevation: 2.0,
            weight_temperature: 2.0,
            ..BiomeDef::named(Biome::Snow)
        },
        BiomeDef {
            requires_high_elevation: true,
            pref_min_elevation: 0.8,
            pref_max_elevation: 1.0,
            pref_slope: 0.3,
            slope_tolerance: 0.5,
            weight_elevation: 2.5,
            weight_slope: 2.0,
            ..BiomeDef::named(Biome::Rocky)
        },
        BiomeDef {
            requires_high_elevation: true,
            pref_min_elevation: 0.8,
            pref_max_elevation: 1.0,
            weight_elevation: 3.0,
            weight_moisture: 0.5,
            weight_temperature: 0.8,
            ..BiomeDef::named(Biome::Mountain)
        },
        BiomeDef {
            requires_water: true,
            pref_min_elevation: 0.35,
            pref_max_elevation: 0.5,
            pref_min_moisture: 0.8,
            pref_max_moisture: 1.0,
            pref_min_temperature: 0.3,
            pref_max_temperature: 0.8,
            weight_moisture: 2.5,
            weight_elevation: 1.5,
            weight_temperature: 1.0,
            ..BiomeDef::named(Biome::Swamp)
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trips_through_u8() {
        for v in 0..BIOME_COUNT as u8 {
            assert_eq!(Biome::from_u8(v).as_u8(), v);
        }
        assert_eq!(Biome::from_u8(200), Biome::Unknown);
    }

    #[test]
    fn default_table_has_fifteen_entries() {
        let defs = default_biomes();
        assert_eq!(defs.len(), 15);
        assert!(defs.iter().all(|d| d.id != Biome::Unknown));
        assert!(defs.iter().all(|d| d.id != Biome::Shrubland));
        assert!(defs.iter().any(|d| d.id == Biome::Grassland));
    }

    #[test]
    fn names_match_placement_keys() {
        assert_eq!(Biome::TropicalRainforest.name(), "Tropical Rainforest");
        assert_eq!(Biome::Snow.name(), "Snow/Ice");
    }
}
