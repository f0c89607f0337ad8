//! Generation stage trait and pipeline orchestration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::biomes::{
    classify_biome_map, BiomeDef, ClassifierOptions, ClassifyError,
};
use crate::climate::{compute_climate, ClimateConfig};
use crate::erosion::{run_hydraulic_erosion, ErosionParams};
use crate::objects::{
    coast_distance, gradient_map, water_mask, ObjectPlacer, PlacementConfig,
};
use crate::plates::{PlateField, VoronoiConfig};
use crate::rivers::{generate_rivers, RiverParams};
use crate::world::World;

/// Unique identifier for generation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    /// Base heightmap synthesis (S1).
    Heightmap,
    /// Temperature/moisture synthesis (S2).
    Climate,
    /// Droplet hydraulic erosion (S3).
    Erosion,
    /// Flow accumulation and channel carving (S4).
    Rivers,
    /// Biome classification (S5).
    Biomes,
    /// Surface object placement (S6).
    Placement,
}

impl StageId {
    /// Returns the short name of the stage.
    pub fn name(&self) -> &'static str {
        match self {
            StageId::Heightmap => "heightmap",
            StageId::Climate => "climate",
            StageId::Erosion => "erosion",
            StageId::Rivers => "rivers",
            StageId::Biomes => "biomes",
            StageId::Placement => "placement",
        }
    }
}

/// Errors that can occur during pipeline execution.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(
        "dimension mismatch: expected {expected_w}x{expected_h}, got {got_w}x{got_h}"
    )]
    DimensionMismatch {
        expected_w: u32,
        expected_h: u32,
        got_w: u32,
        got_h: u32,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("sink write failed: {0}")]
    IoFailure(#[from] std::io::Error),
    #[error("numeric invariant violated after stage '{stage}': {detail}")]
    NumericInvariant { stage: String, detail: String },
    #[error("stage '{0}' requires '{1}' to run first")]
    MissingDependency(String, String),
}

impl From<ClassifyError> for PipelineError {
    fn from(err: ClassifyError) -> Self {
        match err {
            ClassifyError::DimensionMismatch {
                expected_w,
                expected_h,
                got_w,
                got_h,
            } => PipelineError::DimensionMismatch {
                expected_w,
                expected_h,
                got_w,
                got_h,
            },
            ClassifyError::EmptyDefinitions => {
                PipelineError::InvalidConfig("biome definition set is empty".to_string())
            }
        }
    }
}

/// Top-level pipeline configuration assembled by the caller (CLI flags or a
/// JSON document); stage configs derive from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub width: u32,
    pub height: u32,
    pub seed: u32,

    pub num_plates: usize,
    pub fbm_blend: f32,
    pub fbm_frequency: f32,
    pub fbm_octaves: u32,

    pub ocean_height_threshold: f32,
    pub lake_height_threshold: f32,
    pub coast_distance_tiles: i32,
    pub smoothing_iterations: u32,

    /// Droplets per cell; the count floors at 1000.
    pub erosion_droplet_fraction: f32,
    /// Explicit river threshold; `None` auto-scales with map width.
    pub river_accum_threshold: Option<f32>,

    /// Worker threads; `0` uses every available core.
    pub threads: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            seed: 424242,

            num_plates: 36,
            fbm_blend: 0.42,
            fbm_frequency: 0.0035,
            fbm_octaves: 5,

            ocean_height_threshold: 0.35,
            lake_height_threshold: 0.45,
            coast_distance_tiles: 3,
            smoothing_iterations: 1,

            erosion_droplet_fraction: 0.4,
            river_accum_threshold: None,

            threads: 0,
        }
    }
}

impl PipelineConfig {
    /// Checks value ranges, reporting the first violation.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.width == 0 || self.height == 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.num_plates == 0 {
            return Err(PipelineError::InvalidConfig(
                "num_plates must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.fbm_blend) {
            return Err(PipelineError::InvalidConfig(format!(
                "fbm_blend must be in [0, 1], got {}",
                self.fbm_blend
            )));
        }
        if self.erosion_droplet_fraction < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "erosion_droplet_fraction must be non-negative, got {}",
                self.erosion_droplet_fraction
            )));
        }
        Ok(())
    }

    pub fn voronoi_config(&self) -> VoronoiConfig {
        VoronoiConfig {
            seed: self.seed as u64,
            num_plates: self.num_plates,
            fbm_blend: self.fbm_blend,
            fbm_frequency: self.fbm_frequency,
            fbm_octaves: self.fbm_octaves,
            ..Default::default()
        }
    }

    pub fn climate_config(&self) -> ClimateConfig {
        ClimateConfig::with_seed(self.seed as u64)
    }

    pub fn erosion_params(&self) -> ErosionParams {
        ErosionParams {
            world_seed: self.seed as u64,
            num_droplets: ErosionParams::droplets_for_area(
                self.erosion_droplet_fraction,
                self.width,
                self.height,
            ),
            ..Default::default()
        }
    }

    pub fn river_params(&self) -> RiverParams {
        let mut params = RiverParams::scaled_to(self.width);
        if let Some(threshold) = self.river_accum_threshold {
            params.flow_accum_threshold = threshold;
        }
        params
    }

    pub fn classifier_options(&self) -> ClassifierOptions {
        ClassifierOptions {
            coast_distance_tiles: self.coast_distance_tiles,
            ocean_height_threshold: self.ocean_height_threshold,
            lake_height_threshold: self.lake_height_threshold,
            smoothing_iterations: self.smoothing_iterations,
            ..Default::default()
        }
    }
}

/// Final grids and instance list returned by [`generate`].
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub heights: crate::grid::Grid2D<f32>,
    pub temperature: Option<crate::grid::Grid2D<f32>>,
    pub moisture: Option<crate::grid::Grid2D<f32>>,
    pub eroded: Option<crate::grid::Grid2D<f64>>,
    pub deposited: Option<crate::grid::Grid2D<f64>>,
    pub erosion_stats: Option<crate::erosion::ErosionStats>,
    pub flow_accum: Option<crate::grid::Grid2D<f32>>,
    pub river_mask: Option<crate::grid::Grid2D<u8>>,
    pub biomes: Option<crate::grid::Grid2D<crate::biomes::Biome>>,
    pub objects: Vec<crate::objects::ObjectInstance>,
}

impl From<World> for PipelineResult {
    fn from(world: World) -> Self {
        Self {
            heights: world.heights,
            temperature: world.temperature,
            moisture: world.moisture,
            eroded: world.eroded,
            deposited: world.deposited,
            erosion_stats: world.erosion_stats,
            flow_accum: world.flow_accum,
            river_mask: world.river_mask,
            biomes: world.biomes,
            objects: world.objects,
        }
    }
}

/// Trait for implementing generation stages.
///
/// Each stage transforms the world in place, building on previous stages.
pub trait GenerationStage: Send + Sync {
    /// Returns the unique identifier for this stage.
    fn id(&self) -> StageId;

    /// Returns a human-readable name for the stage.
    fn name(&self) -> &str;

    /// Returns the stage IDs that must execute before this stage.
    fn dependencies(&self) -> &[StageId] {
        &[]
    }

    /// Executes the stage, mutating the world in place.
    fn execute(&self, world: &mut World) -> Result<(), PipelineError>;
}

fn check_heights_finite(world: &World, stage: &str) -> Result<(), PipelineError> {
    if world.heights.has_non_finite() {
        return Err(PipelineError::NumericInvariant {
            stage: stage.to_string(),
            detail: "heightmap contains NaN or infinite values".to_string(),
        });
    }
    Ok(())
}

/// Orchestrates generation stages in strict order.
pub struct Pipeline {
    stages: Vec<Box<dyn GenerationStage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Adds a stage to the pipeline.
    pub fn add_stage<S: GenerationStage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Executes all stages in order.
    pub fn run(&self, world: &mut World) -> Result<(), PipelineError> {
        self.run_with_callbacks(world, |_, _, _| {}, |_, _, _| {})
    }

    /// Executes all stages with start/complete callbacks for progress
    /// reporting.
    pub fn run_with_callbacks<F1, F2>(
        &self,
        world: &mut World,
        mut on_stage_start: F1,
        mut on_stage_complete: F2,
    ) -> Result<(), PipelineError>
    where
        F1: FnMut(&str, usize, usize),
        F2: FnMut(&str, usize, usize),
    {
        let total = self.stages.len();
        let mut completed: Vec<StageId> = Vec::new();

        for (i, stage) in self.stages.iter().enumerate() {
            on_stage_start(stage.name(), i, total);

            for dep in stage.dependencies() {
                if !completed.contains(dep) {
                    return Err(PipelineError::MissingDependency(
                        stage.name().to_string(),
                        dep.name().to_string(),
                    ));
                }
            }

            stage.execute(world)?;
            completed.push(stage.id());

            on_stage_complete(stage.name(), i, total);
        }

        Ok(())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// S1: Voronoi-plate heightmap synthesis.
pub struct HeightmapStage {
    pub config: VoronoiConfig,
}

impl HeightmapStage {
    pub fn new(config: VoronoiConfig) -> Self {
        Self { config }
    }
}

impl GenerationStage for HeightmapStage {
    fn id(&self) -> StageId {
        StageId::Heightmap
    }

    fn name(&self) -> &str {
        "Heightmap Synthesis"
    }

    fn execute(&self, world: &mut World) -> Result<(), PipelineError> {
        let field = PlateField::new(world.width(), world.height(), self.config.clone());
        world.heights = field.generate();
        check_heights_finite(world, self.name())
    }
}

/// S2: temperature/moisture synthesis.
pub struct ClimateStage {
    pub config: ClimateConfig,
}

impl ClimateStage {
    pub fn new(config: ClimateConfig) -> Self {
        Self { config }
    }
}

impl GenerationStage for ClimateStage {
    fn id(&self) -> StageId {
        StageId::Climate
    }

    fn name(&self) -> &str {
        "Climate Synthesis"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Heightmap]
    }

    fn execute(&self, world: &mut World) -> Result<(), PipelineError> {
        let fields = compute_climate(&world.heights, &self.config);
        world.temperature = Some(fields.temperature);
        world.moisture = Some(fields.moisture);
        Ok(())
    }
}

/// S3: droplet hydraulic erosion.
pub struct ErosionStage {
    pub params: ErosionParams,
}

impl ErosionStage {
    pub fn new(params: ErosionParams) -> Self {
        Self { params }
    }
}

impl GenerationStage for ErosionStage {
    fn id(&self) -> StageId {
        StageId::Erosion
    }

    fn name(&self) -> &str {
        "Hydraulic Erosion"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Heightmap]
    }

    fn execute(&self, world: &mut World) -> Result<(), PipelineError> {
        let outputs = run_hydraulic_erosion(&mut world.heights, &self.params);
        world.eroded = Some(outputs.eroded);
        world.deposited = Some(outputs.deposited);
        world.erosion_stats = Some(outputs.stats);
        check_heights_finite(world, self.name())
    }
}

/// S4: river extraction and carving.
pub struct RiverStage {
    pub params: RiverParams,
}

impl RiverStage {
    pub fn new(params: RiverParams) -> Self {
        Self { params }
    }
}

impl GenerationStage for RiverStage {
    fn id(&self) -> StageId {
        StageId::Rivers
    }

    fn name(&self) -> &str {
        "River Network"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Heightmap]
    }

    fn execute(&self, world: &mut World) -> Result<(), PipelineError> {
        let outputs = generate_rivers(&mut world.heights, &self.params);
        world.flow_accum = Some(outputs.flow_accum);
        world.river_mask = Some(outputs.river_mask);
        check_heights_finite(world, self.name())
    }
}

/// S5: biome classification.
pub struct BiomeStage {
    pub defs: Vec<BiomeDef>,
    pub options: ClassifierOptions,
}

impl BiomeStage {
    pub fn new(defs: Vec<BiomeDef>, options: ClassifierOptions) -> Self {
        Self { defs, options }
    }
}

impl GenerationStage for BiomeStage {
    fn id(&self) -> StageId {
        StageId::Biomes
    }

    fn name(&self) -> &str {
        "Biome Classification"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Climate]
    }

    fn execute(&self, world: &mut World) -> Result<(), PipelineError> {
        let (Some(temperature), Some(moisture)) = (&world.temperature, &world.moisture) else {
            return Err(PipelineError::MissingDependency(
                self.name().to_string(),
                StageId::Climate.name().to_string(),
            ));
        };
        let map = classify_biome_map(
            &world.heights,
            temperature,
            moisture,
            world.river_mask.as_ref(),
            &self.defs,
            &self.options,
        )?;
        world.biomes = Some(map);
        Ok(())
    }
}

/// S6: surface object placement.
pub struct PlacementStage {
    pub config: PlacementConfig,
    pub lake_height_threshold: f32,
}

impl PlacementStage {
    pub fn new(config: PlacementConfig, lake_height_threshold: f32) -> Self {
        Self {
            config,
            lake_height_threshold,
        }
    }
}

impl GenerationStage for PlacementStage {
    fn id(&self) -> StageId {
        StageId::Placement
    }

    fn name(&self) -> &str {
        "Object Placement"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Biomes]
    }

    fn execute(&self, world: &mut World) -> Result<(), PipelineError> {
        let Some(biomes) = &world.biomes else {
            return Err(PipelineError::MissingDependency(
                self.name().to_string(),
                StageId::Biomes.name().to_string(),
            ));
        };

        let slope = gradient_map(&world.heights);
        let water = water_mask(&world.heights, self.lake_height_threshold);
        let coast = coast_distance(&water);

        let placer = ObjectPlacer::new(world.width(), world.height(), &self.config);
        world.objects = placer.place(&world.heights, &slope, &water, &coast, biomes);
        Ok(())
    }
}

/// Runs the whole pipeline for one configuration and returns the final
/// grids plus the instance list.
///
/// Placement is skipped silently when `placement` is `None` (no placement
/// file present).
pub fn generate(
    config: &PipelineConfig,
    defs: &[BiomeDef],
    placement: Option<&PlacementConfig>,
) -> Result<PipelineResult, PipelineError> {
    config.validate()?;

    let mut world = World::new(config.width, config.height);
    let mut pipeline = Pipeline::new();
    pipeline.add_stage(HeightmapStage::new(config.voronoi_config()));
    pipeline.add_stage(ClimateStage::new(config.climate_config()));
    pipeline.add_stage(ErosionStage::new(config.erosion_params()));
    pipeline.add_stage(RiverStage::new(config.river_params()));
    pipeline.add_stage(BiomeStage::new(
        defs.to_vec(),
        config.classifier_options(),
    ));
    if let Some(placement) = placement {
        pipeline.add_stage(PlacementStage::new(
            placement.clone(),
            config.lake_height_threshold,
        ));
    }

    pipeline.run(&mut world)?;
    Ok(world.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biomes::{default_biomes, Biome};

    fn small_config() -> PipelineConfig {
        PipelineConfig {
            width: 32,
            height: 32,
            seed: 42,
            ..Default::default()
        }
    }

    #[test]
    fn full_pipeline_produces_all_outputs() {
        let result = generate(&small_config(), &default_biomes(), None).unwrap();

        assert!(result
            .heights
            .as_slice()
            .iter()
            .all(|&v| v.is_finite() && v >= 0.0));

        let temperature = result.temperature.unwrap();
        let moisture = result.moisture.unwrap();
        let flow_accum = result.flow_accum.unwrap();
        let river_mask = result.river_mask.unwrap();
        let biomes = result.biomes.unwrap();

        assert!(result.heights.same_dims(&temperature));
        assert!(result.heights.same_dims(&moisture));
        assert!(result.heights.same_dims(&flow_accum));
        assert!(result.heights.same_dims(&river_mask));
        assert!(result.heights.same_dims(&biomes));

        assert!(flow_accum.as_slice().iter().all(|&f| f >= 1.0));
        assert!(river_mask.as_slice().iter().all(|&m| m == 0 || m == 255));
        assert!(biomes.as_slice().iter().all(|&b| b != Biome::Unknown));
    }

    #[test]
    fn equal_seeds_reproduce_byte_identical_grids() {
        let config = small_config();
        let defs = default_biomes();
        let a = generate(&config, &defs, None).unwrap();
        let b = generate(&config, &defs, None).unwrap();

        assert_eq!(a.heights.as_slice(), b.heights.as_slice());
        assert_eq!(
            a.temperature.unwrap().as_slice(),
            b.temperature.unwrap().as_slice()
        );
        assert_eq!(
            a.moisture.unwrap().as_slice(),
            b.moisture.unwrap().as_slice()
        );
        assert_eq!(
            a.flow_accum.unwrap().as_slice(),
            b.flow_accum.unwrap().as_slice()
        );
        assert_eq!(
            a.river_mask.unwrap().as_slice(),
            b.river_mask.unwrap().as_slice()
        );
        assert_eq!(a.biomes.unwrap().as_slice(), b.biomes.unwrap().as_slice());
    }

    #[test]
    fn degenerate_single_cell_world_runs_clean() {
        let config = PipelineConfig {
            width: 1,
            height: 1,
            seed: 7,
            num_plates: 2,
            ..Default::default()
        };
        let result = generate(&config, &default_biomes(), None).unwrap();
        assert_eq!(result.flow_accum.unwrap().as_slice(), &[1.0]);
        assert_ne!(result.biomes.unwrap().as_slice()[0], Biome::Unknown);
    }

    #[test]
    fn invalid_dimensions_are_rejected() {
        let config = PipelineConfig {
            width: 0,
            ..Default::default()
        };
        let err = generate(&config, &default_biomes(), None).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
    }

    #[test]
    fn empty_biome_defs_are_rejected() {
        let err = generate(&small_config(), &[], None).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
    }

    #[test]
    fn missing_dependency_is_reported() {
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(BiomeStage::new(
            default_biomes(),
            ClassifierOptions::default(),
        ));
        let mut world = World::new(8, 8);
        let err = pipeline.run(&mut world).unwrap_err();
        assert!(matches!(err, PipelineError::MissingDependency(_, _)));
    }

    #[test]
    fn stage_callbacks_fire_in_order() {
        let config = PipelineConfig {
            width: 8,
            height: 8,
            seed: 1,
            ..Default::default()
        };
        let mut world = World::new(config.width, config.height);
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(HeightmapStage::new(config.voronoi_config()));
        pipeline.add_stage(ClimateStage::new(config.climate_config()));

        let mut started = Vec::new();
        let mut finished = Vec::new();
        pipeline
            .run_with_callbacks(
                &mut world,
                |name, i, total| {
                    assert_eq!(total, 2);
                    started.push((name.to_string(), i));
                },
                |name, i, _| finished.push((name.to_string(), i)),
            )
            .unwrap();

        assert_eq!(started[0].0, "Heightmap Synthesis");
        assert_eq!(finished[1].0, "Climate Synthesis");
    }
}
