//! Output sinks: raw RGB rasters and the object CSV stream.
//!
//! The core pipeline never touches the filesystem; callers hand the final
//! grids to a [`Sink`] at stage boundaries.

mod csv;
mod png;
mod ppm;
mod render;

pub use csv::write_objects_csv;
pub use png::write_rgb_png;
pub use ppm::{write_ppm, write_ppm_file};
pub use render::{biome_to_rgb, height_to_rgb, mask_to_rgb, objects_to_rgb, scalar_to_rgb};

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use thiserror::Error;

use crate::objects::ObjectInstance;
use crate::pipeline::PipelineResult;

/// Errors that can occur while writing outputs.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// Receives the pipeline's outputs as raw 8-bit RGB buffers (row-major,
/// top-to-bottom) and CSV row streams.
pub trait Sink {
    fn write_rgb(
        &mut self,
        name: &str,
        width: u32,
        height: u32,
        rgb: &[u8],
    ) -> Result<(), ExportError>;

    fn write_objects_csv(
        &mut self,
        name: &str,
        objects: &[ObjectInstance],
    ) -> Result<(), ExportError>;
}

/// On-disk raster encoding used by [`DirSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    /// Binary PPM (`P6`), the default.
    Ppm,
    /// 8-bit RGB PNG.
    Png,
}

/// Writes every output into one directory, rasters as `<name>.ppm`/`.png`
/// and tables as `<name>.csv`.
pub struct DirSink {
    dir: PathBuf,
    format: RasterFormat,
}

impl DirSink {
    pub fn new(dir: impl Into<PathBuf>, format: RasterFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }
}

impl Sink for DirSink {
    fn write_rgb(
        &mut self,
        name: &str,
        width: u32,
        height: u32,
        rgb: &[u8],
    ) -> Result<(), ExportError> {
        std::fs::create_dir_all(&self.dir)?;
        match self.format {
            RasterFormat::Ppm => {
                let path = self.dir.join(format!("{name}.ppm"));
                write_ppm_file(&path, width, height, rgb)?;
            }
            RasterFormat::Png => {
                let path = self.dir.join(format!("{name}.png"));
                write_rgb_png(&path, width, height, rgb)?;
            }
        }
        Ok(())
    }

    fn write_objects_csv(
        &mut self,
        name: &str,
        objects: &[ObjectInstance],
    ) -> Result<(), ExportError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{name}.csv"));
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        write_objects_csv(&mut writer, objects)?;
        Ok(())
    }
}

/// Renders and writes every map the pipeline produced.
pub fn export_result(result: &PipelineResult, sink: &mut dyn Sink) -> Result<(), ExportError> {
    let w = result.heights.width();
    let h = result.heights.height();

    sink.write_rgb("height", w, h, &height_to_rgb(&result.heights))?;

    if let Some(biomes) = &result.biomes {
        sink.write_rgb("biome", w, h, &biome_to_rgb(biomes))?;
    }
    if let Some(eroded) = &result.eroded {
        sink.write_rgb("erosion_eroded", w, h, &scalar_to_rgb(eroded))?;
    }
    if let Some(deposited) = &result.deposited {
        sink.write_rgb("erosion_deposited", w, h, &scalar_to_rgb(deposited))?;
    }
    if let Some(mask) = &result.river_mask {
        sink.write_rgb("river_map", w, h, &mask_to_rgb(mask))?;
    }
    if !result.objects.is_empty() {
        sink.write_rgb("objects_map", w, h, &objects_to_rgb(w, h, &result.objects))?;
        sink.write_objects_csv("objects", &result.objects)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biomes::default_biomes;
    use crate::pipeline::{generate, PipelineConfig};
    use tempfile::tempdir;

    #[test]
    fn dir_sink_writes_all_maps() {
        let config = PipelineConfig {
            width: 16,
            height: 16,
            seed: 3,
            ..Default::default()
        };
        let result = generate(&config, &default_biomes(), None).unwrap();

        let dir = tempdir().unwrap();
        let mut sink = DirSink::new(dir.path(), RasterFormat::Ppm);
        export_result(&result, &mut sink).unwrap();

        for name in [
            "height.ppm",
            "biome.ppm",
            "erosion_eroded.ppm",
            "erosion_deposited.ppm",
            "river_map.ppm",
        ] {
            assert!(dir.path().join(name).exists(), "{name} missing");
        }
    }

    #[test]
    fn dir_sink_writes_png_when_requested() {
        let config = PipelineConfig {
            width: 8,
            height: 8,
            seed: 3,
            ..Default::default()
        };
        let result = generate(&config, &default_biomes(), None).unwrap();

        let dir = tempdir().unwrap();
        let mut sink = DirSink::new(dir.path(), RasterFormat::Png);
        export_result(&result, &mut sink).unwrap();
        assert!(dir.path().join("height.png").exists());
    }
}
