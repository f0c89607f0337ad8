//! PNG raster writer for RGB map exports.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};

use super::ExportError;

/// Writes an 8-bit RGB PNG from a raw row-major buffer.
pub fn write_rgb_png(path: &Path, width: u32, height: u32, rgb: &[u8]) -> Result<(), ExportError> {
    if rgb.len() != (width as usize) * (height as usize) * 3 {
        return Err(ExportError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!(
                "RGB buffer length {} does not match {}x{} image",
                rgb.len(),
                width,
                height
            ),
        )));
    }

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder =
        PngEncoder::new_with_quality(writer, CompressionType::Default, FilterType::Adaptive);
    encoder.write_image(rgb, width, height, ExtendedColorType::Rgb8)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn png_export_smoke() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("height.png");
        let rgb = vec![128u8; 8 * 8 * 3];
        write_rgb_png(&path, 8, 8, &rgb).unwrap();
        assert!(path.exists());
        assert!(path.metadata().unwrap().len() > 0);
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.png");
        assert!(write_rgb_png(&path, 4, 4, &[0u8; 3]).is_err());
    }
}
