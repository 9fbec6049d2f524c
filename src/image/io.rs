//! Grayscale I/O helpers for tools and tests.
//!
//! - [`load_grayscale_f32`]: read a PNG/JPEG/etc. into a `[0, 1]` float plane.
//! - [`save_grayscale_f32`]: write a float plane to a grayscale PNG.

use super::Plane;
use image::{GrayImage, Luma};
use std::path::Path;

/// Load an image from disk and convert it to a normalised float plane.
pub fn load_grayscale_f32(path: &Path) -> Result<Plane, String> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to open {}: {e}", path.display()))?
        .into_luma8();
    let w = img.width() as usize;
    let h = img.height() as usize;
    let data = img.into_raw().iter().map(|&v| v as f32 / 255.0).collect();
    Ok(Plane::from_vec(w, h, data))
}

/// Save a float plane to a grayscale PNG, clamping to `[0, 1]`.
pub fn save_grayscale_f32(plane: &Plane, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }

    let mut out = GrayImage::new(plane.w as u32, plane.h as u32);
    for y in 0..plane.h {
        let row = plane.row(y);
        for (x, &px) in row.iter().enumerate() {
            let v = (px * 255.0).clamp(0.0, 255.0);
            out.put_pixel(x as u32, y as u32, Luma([v as u8]));
        }
    }
    out.save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}
