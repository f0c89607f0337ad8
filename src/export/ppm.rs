//! Binary PPM (P6) writer, the default raster format.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes a `P6` image: `P6\n<W> <H>\n255\n` followed by raw RGB rows,
/// top-to-bottom.
pub fn write_ppm<W: Write>(out: &mut W, width: u32, height: u32, rgb: &[u8]) -> io::Result<()> {
    if rgb.len() != (width as usize) * (height as usize) * 3 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "RGB buffer length {} does not match {}x{} image",
                rgb.len(),
                width,
                height
            ),
        ));
    }
    write!(out, "P6\n{} {}\n255\n", width, height)?;
    out.write_all(rgb)
}

/// Writes a `P6` image to a file.
pub fn write_ppm_file(path: &Path, width: u32, height: u32, rgb: &[u8]) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_ppm(&mut writer, width, height, rgb)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_payload_are_correct() {
        let mut out = Vec::new();
        let rgb = [10u8, 20, 30, 40, 50, 60];
        write_ppm(&mut out, 2, 1, &rgb).unwrap();
        assert!(out.starts_with(b"P6\n2 1\n255\n"));
        assert_eq!(&out[out.len() - 6..], &rgb);
    }

    #[test]
    fn wrong_buffer_length_is_rejected() {
        let mut out = Vec::new();
        let err = write_ppm(&mut out, 2, 2, &[0u8; 3]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
