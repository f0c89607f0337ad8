//! Pipeline orchestration: stage trait, dependency checks, configuration.

mod stage;

pub use stage::{
    generate, BiomeStage, ClimateStage, ErosionStage, GenerationStage, HeightmapStage, Pipeline,
    PipelineConfig, PipelineError, PipelineResult, PlacementStage, RiverStage, StageId,
};
