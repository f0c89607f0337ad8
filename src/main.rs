//! Terragen CLI - procedural terrain pipeline driver.
//!
//! Assembles a `PipelineConfig` from flags (or a JSON config file), runs
//! the six-stage pipeline and writes the resulting maps through a
//! directory sink.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;

use terragen::biomes::{default_biomes, load_biome_defs, BiomeDef};
use terragen::export::{export_result, DirSink, RasterFormat};
use terragen::objects::PlacementConfig;
use terragen::pipeline::{
    BiomeStage, ClimateStage, ErosionStage, HeightmapStage, Pipeline, PipelineConfig,
    PlacementStage, RiverStage,
};
use terragen::world::World;

/// Procedural terrain generator: plates, climate, erosion, rivers, biomes,
/// object placement.
#[derive(Parser)]
#[command(name = "terragen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a world and export its maps.
    Generate {
        /// Map width in cells.
        #[arg(long, default_value = "512")]
        width: u32,

        /// Map height in cells.
        #[arg(long, default_value = "512")]
        height: u32,

        /// Worker threads (0 = all cores).
        #[arg(long, default_value = "0")]
        threads: usize,

        /// Random seed for reproducible generation.
        #[arg(short, long)]
        seed: Option<u32>,

        /// Run identifier; outputs land in `<output>/<run_id>`.
        #[arg(long)]
        run_id: Option<String>,

        /// Output directory for generated files.
        #[arg(short, long, default_value = "./out")]
        output: PathBuf,

        /// Raster export format.
        #[arg(short, long, default_value = "ppm")]
        format: OutputFormat,

        /// Load the full pipeline configuration from a JSON file instead of
        /// the generation flags below.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of Voronoi plates.
        #[arg(long, default_value = "36")]
        num_plates: usize,

        /// Blend between plate field (0.0) and fBm (1.0).
        #[arg(long, default_value = "0.42")]
        fbm_blend: f32,

        /// Base noise frequency.
        #[arg(long, default_value = "0.0035")]
        fbm_frequency: f32,

        /// Number of noise octaves.
        #[arg(long, default_value = "5")]
        fbm_octaves: u32,

        /// Erosion droplets as a fraction of cell count (minimum 1000).
        #[arg(long, default_value = "0.4")]
        droplet_fraction: f32,

        /// River threshold in contributing cells (default scales with width).
        #[arg(long)]
        river_threshold: Option<f32>,

        /// Heights below this are ocean.
        #[arg(long, default_value = "0.35")]
        ocean_threshold: f32,

        /// Heights below this can hold standing water.
        #[arg(long, default_value = "0.45")]
        lake_threshold: f32,

        /// Coastal proximity radius in tiles.
        #[arg(long, default_value = "3")]
        coast_tiles: i32,

        /// Majority-filter passes on the biome map.
        #[arg(long, default_value = "1")]
        smoothing_iterations: u32,

        /// Biome definition file (JSON array); built-in table if absent.
        #[arg(long)]
        biomes: Option<PathBuf>,

        /// Object placement file (JSON); placement is skipped if absent.
        #[arg(long)]
        objects: Option<PathBuf>,

        /// Run object placement serially for byte-stable output.
        #[arg(long)]
        serial_placement: bool,
    },

    /// Display memory estimates for a map configuration.
    Info {
        /// Map width in cells.
        #[arg(long, default_value = "512")]
        width: u32,

        /// Map height in cells.
        #[arg(long, default_value = "512")]
        height: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Binary PPM (P6).
    Ppm,
    /// 8-bit RGB PNG.
    Png,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            width,
            height,
            threads,
            seed,
            run_id,
            output,
            format,
            config,
            num_plates,
            fbm_blend,
            fbm_frequency,
            fbm_octaves,
            droplet_fraction,
            river_threshold,
            ocean_threshold,
            lake_threshold,
            coast_tiles,
            smoothing_iterations,
            biomes,
            objects,
            serial_placement,
        } => {
            let pipeline_config = match config {
                Some(path) => load_pipeline_config(&path),
                None => PipelineConfig {
                    width,
                    height,
                    seed: seed.unwrap_or_else(time_seed),
                    num_plates,
                    fbm_blend,
                    fbm_frequency,
                    fbm_octaves,
                    ocean_height_threshold: ocean_threshold,
                    lake_height_threshold: lake_threshold,
                    coast_distance_tiles: coast_tiles,
                    smoothing_iterations,
                    erosion_droplet_fraction: droplet_fraction,
                    river_accum_threshold: river_threshold,
                    threads,
                },
            };
            run_generate(
                pipeline_config,
                run_id,
                output,
                format,
                biomes,
                objects,
                serial_placement,
            );
        }
        Commands::Info { width, height } => run_info(width, height),
    }
}

fn time_seed() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u32)
        .unwrap_or(424242)
}

fn load_pipeline_config(path: &PathBuf) -> PipelineConfig {
    let text = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading config {}: {}", path.display(), e);
        std::process::exit(1);
    });
    serde_json::from_str(&text).unwrap_or_else(|e| {
        eprintln!("Error: invalid config {}: {}", path.display(), e);
        std::process::exit(1);
    })
}

fn load_biome_defs_or_default(path: Option<&PathBuf>) -> Vec<BiomeDef> {
    let Some(path) = path else {
        return default_biomes();
    };
    let Ok(text) = std::fs::read_to_string(path) else {
        eprintln!(
            "[WARN] biome file {} not readable, using built-in definitions",
            path.display()
        );
        return default_biomes();
    };
    load_biome_defs(&text).unwrap_or_else(|e| {
        eprintln!("Error: invalid biome file {}: {}", path.display(), e);
        std::process::exit(1);
    })
}

fn load_placement(path: Option<&PathBuf>, serial: bool) -> Option<PlacementConfig> {
    let path = path?;
    if !path.exists() {
        eprintln!(
            "[WARN] placement file {} not found, skipping object placement",
            path.display()
        );
        return None;
    }
    let text = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading placement file {}: {}", path.display(), e);
        std::process::exit(1);
    });
    let mut config = PlacementConfig::from_json(&text).unwrap_or_else(|e| {
        eprintln!("Error: invalid placement file {}: {}", path.display(), e);
        std::process::exit(1);
    });
    config.deterministic = config.deterministic || serial;
    Some(config)
}

fn run_generate(
    config: PipelineConfig,
    run_id: Option<String>,
    output: PathBuf,
    format: OutputFormat,
    biomes: Option<PathBuf>,
    objects: Option<PathBuf>,
    serial_placement: bool,
) {
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    if config.width > 8192 || config.height > 8192 {
        eprintln!("Error: dimensions must be at most 8192");
        std::process::exit(1);
    }

    if config.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build_global()
            .unwrap_or_else(|e| {
                eprintln!("Error configuring thread pool: {}", e);
                std::process::exit(1);
            });
    }

    let defs = load_biome_defs_or_default(biomes.as_ref());
    let placement = load_placement(objects.as_ref(), serial_placement);

    let output = match &run_id {
        Some(id) => output.join(id),
        None => output,
    };

    println!("Terragen - Procedural Terrain Pipeline");
    println!("=======================================");
    println!("Map: {}x{} cells", config.width, config.height);
    println!("Seed: {}", config.seed);
    println!(
        "Threads: {}",
        if config.threads == 0 {
            rayon::current_num_threads()
        } else {
            config.threads
        }
    );
    println!("Droplets: {}", config.erosion_params().num_droplets);
    println!("Output: {}", output.display());

    let start = Instant::now();

    let mut world = World::new(config.width, config.height);
    let mut pipeline = Pipeline::new();
    pipeline.add_stage(HeightmapStage::new(config.voronoi_config()));
    pipeline.add_stage(ClimateStage::new(config.climate_config()));
    pipeline.add_stage(ErosionStage::new(config.erosion_params()));
    pipeline.add_stage(RiverStage::new(config.river_params()));
    pipeline.add_stage(BiomeStage::new(defs, config.classifier_options()));
    match placement {
        Some(placement) => {
            pipeline.add_stage(PlacementStage::new(
                placement,
                config.lake_height_threshold,
            ));
        }
        None => println!("Object placement: SKIPPED (no placement file)"),
    }

    pipeline
        .run_with_callbacks(
            &mut world,
            |name, i, total| println!("  [{}/{}] Starting: {}", i + 1, total, name),
            |name, i, total| println!("  [{}/{}] Completed: {}", i + 1, total, name),
        )
        .unwrap_or_else(|e| {
            eprintln!("Error during generation: {}", e);
            std::process::exit(1);
        });

    if let Some(stats) = &world.erosion_stats {
        println!(
            "Erosion: {} droplets, eroded {:.4}, deposited {:.4}",
            stats.applied_droplets, stats.total_eroded, stats.total_deposited
        );
    }
    if !world.objects.is_empty() {
        println!("Placed objects: {}", world.objects.len());
    }

    let gen_time = start.elapsed();
    println!("Generation completed in {:.2?}", gen_time);

    let (min_h, max_h) = world.heights.value_range();
    println!("Height range: [{:.4}, {:.4}]", min_h, max_h);

    println!("\nExporting maps...");
    let export_start = Instant::now();

    let raster_format = match format {
        OutputFormat::Ppm => RasterFormat::Ppm,
        OutputFormat::Png => RasterFormat::Png,
    };
    let mut sink = DirSink::new(&output, raster_format);
    let result: terragen::PipelineResult = world.into();
    export_result(&result, &mut sink).unwrap_or_else(|e| {
        eprintln!("Error exporting maps: {}", e);
        std::process::exit(1);
    });

    println!("Export completed in {:.2?}", export_start.elapsed());
    println!("\nTotal time: {:.2?}", start.elapsed());
    println!("Done!");
}

fn run_info(width: u32, height: u32) {
    let cells = (width as u64) * (height as u64);

    let bytes_heights = cells * 4;
    let bytes_climate = cells * 8; // temperature + moisture, f32 each
    let bytes_erosion = cells * 16; // eroded + deposited, f64 each
    let bytes_rivers = cells * 5; // flow accumulation f32 + mask u8
    let bytes_biomes = cells; // one tag per cell
    let total = bytes_heights + bytes_climate + bytes_erosion + bytes_rivers + bytes_biomes;

    let mb = |b: u64| b as f64 / 1024.0 / 1024.0;

    println!("Terragen - Map Configuration Info");
    println!("==================================");
    println!();
    println!("Map: {}x{} cells ({} total)", width, height, cells);
    println!(
        "Default droplet count: {}",
        terragen::ErosionParams::droplets_for_area(0.4, width, height)
    );
    println!();
    println!("Memory usage (in-memory grids):");
    println!("  Heights:   {:>12} bytes ({:.2} MB)", bytes_heights, mb(bytes_heights));
    println!("  Climate:   {:>12} bytes ({:.2} MB)", bytes_climate, mb(bytes_climate));
    println!("  Erosion:   {:>12} bytes ({:.2} MB)", bytes_erosion, mb(bytes_erosion));
    println!("  Rivers:    {:>12} bytes ({:.2} MB)", bytes_rivers, mb(bytes_rivers));
    println!("  Biomes:    {:>12} bytes ({:.2} MB)", bytes_biomes, mb(bytes_biomes));
    println!("  Total:     {:>12} bytes ({:.2} MB)", total, mb(total));
    println!();
    println!("Raster export size (PPM, RGB): {} bytes per map", cells * 3 + 15);
}
