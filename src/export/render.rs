//! Grid-to-RGB rendering for raster sinks.

use crate::biomes::Biome;
use crate::grid::Grid2D;
use crate::objects::ObjectInstance;

/// Grayscale render of a normalized heightmap.
pub fn height_to_rgb(heights: &Grid2D<f32>) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(heights.len() * 3);
    for &h in heights.as_slice() {
        let v = (h.clamp(0.0, 1.0) * 255.0) as u8;
        rgb.extend_from_slice(&[v, v, v]);
    }
    rgb
}

/// Grayscale render of a non-negative scalar field, normalized by its
/// maximum (all-zero fields render black).
pub fn scalar_to_rgb(field: &Grid2D<f64>) -> Vec<u8> {
    let max = field
        .as_slice()
        .iter()
        .fold(0.0f64, |acc, &v| acc.max(v))
        .max(1e-12);
    let mut rgb = Vec::with_capacity(field.len() * 3);
    for &v in field.as_slice() {
        let g = ((v / max).clamp(0.0, 1.0) * 255.0) as u8;
        rgb.extend_from_slice(&[g, g, g]);
    }
    rgb
}

/// Biome palette render.
pub fn biome_to_rgb(biomes: &Grid2D<Biome>) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(biomes.len() * 3);
    for &b in biomes.as_slice() {
        rgb.extend_from_slice(&b.preview_rgb());
    }
    rgb
}

/// White-on-black render of a binary mask.
pub fn mask_to_rgb(mask: &Grid2D<u8>) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(mask.len() * 3);
    for &m in mask.as_slice() {
        let v = if m != 0 { 255 } else { 0 };
        rgb.extend_from_slice(&[v, v, v]);
    }
    rgb
}

/// Debug render of placed objects: one colored pixel per instance on a
/// white background, color keyed by a hash of the object name.
pub fn objects_to_rgb(width: u32, height: u32, objects: &[ObjectInstance]) -> Vec<u8> {
    let mut rgb = vec![255u8; (width as usize) * (height as usize) * 3];
    for inst in objects {
        if inst.cell_x >= width || inst.cell_y >= height {
            continue;
        }
        let mut hash = 0u32;
        for c in inst.name.bytes() {
            hash = hash.wrapping_mul(131).wrapping_add(c as u32);
        }
        let idx = ((inst.cell_y as usize) * (width as usize) + (inst.cell_x as usize)) * 3;
        rgb[idx] = (hash & 255) as u8;
        rgb[idx + 1] = ((hash >> 8) & 255) as u8;
        rgb[idx + 2] = ((hash >> 16) & 255) as u8;
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_render_is_gray_and_sized() {
        let g = Grid2D::from_fn(4, 2, |x, _| x as f32 / 4.0);
        let rgb = height_to_rgb(&g);
        assert_eq!(rgb.len(), 4 * 2 * 3);
        assert_eq!(&rgb[0..3], &[0, 0, 0]);
        for px in rgb.chunks(3) {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
        }
    }

    #[test]
    fn scalar_render_normalizes_by_max() {
        let mut g = Grid2D::new(2, 1, 0.0f64);
        g.set(1, 0, 0.5);
        let rgb = scalar_to_rgb(&g);
        assert_eq!(&rgb[0..3], &[0, 0, 0]);
        assert_eq!(&rgb[3..6], &[255, 255, 255]);
    }

    #[test]
    fn mask_render_is_binary() {
        let mut g = Grid2D::new(2, 1, 0u8);
        g.set(1, 0, 255);
        let rgb = mask_to_rgb(&g);
        assert_eq!(&rgb[0..6], &[0, 0, 0, 255, 255, 255]);
    }

    #[test]
    fn objects_render_marks_cells() {
        let inst = ObjectInstance {
            id: 0,
            name: "oak".to_string(),
            model: String::new(),
            cell_x: 1,
            cell_y: 0,
            world_x: 1.5,
            world_y: 0.5,
            world_z: 0.5,
            yaw: 0.0,
            scale: 1.0,
            biome: "Grassland".to_string(),
        };
        let rgb = objects_to_rgb(2, 1, &[inst]);
        assert_eq!(&rgb[0..3], &[255, 255, 255]);
        assert_ne!(&rgb[3..6], &[255, 255, 255]);
    }
}
