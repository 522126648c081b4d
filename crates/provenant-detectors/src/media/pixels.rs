//! Pixel-level image statistics

use image::{ImageReader, RgbImage};
use provenant_core::{Error, Result};
use std::io::Cursor;

/// Regions per side of the texture grid
pub const GRID: u32 = 4;

/// Read `(width, height)` from the image header without decoding pixels
pub fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()
        .map_err(|e| Error::decode(format!("Failed to read image dimensions: {}", e)))
}

/// Decode to 8-bit RGB
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage> {
    let image = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()
        .map_err(|e| Error::decode(format!("Failed to decode image: {}", e)))?;
    Ok(image.into_rgb8())
}

/// Texture uniformity over a 4×4 grid of regions.
///
/// `1 - min(std(region_stds) / (mean(region_stds) + 1e-6), 1)`, where each
/// region's std-dev is taken over all of its channel values. Returns `None`
/// when the image is too small for every region to hold a pixel.
pub fn texture_uniformity(image: &RgbImage) -> Option<f64> {
    let (width, height) = image.dimensions();
    let cell_w = (width / GRID).max(1);
    let cell_h = (height / GRID).max(1);

    let mut region_stds = Vec::with_capacity((GRID * GRID) as usize);
    for row in 0..GRID {
        for col in 0..GRID {
            let y0 = row * cell_h;
            let x0 = col * cell_w;
            let y1 = (y0 + cell_h).min(height);
            let x1 = (x0 + cell_w).min(width);
            if y0 >= y1 || x0 >= x1 {
                return None;
            }
            region_stds.push(region_std(image, x0, x1, y0, y1));
        }
    }

    let spread = crate::stats::std_dev(&region_stds);
    let mean = crate::stats::mean(&region_stds);
    Some(1.0 - (spread / (mean + 1e-6)).min(1.0))
}

fn region_std(image: &RgbImage, x0: u32, x1: u32, y0: u32, y1: u32) -> f64 {
    let mut count = 0u64;
    let mut sum = 0f64;
    for y in y0..y1 {
        for x in x0..x1 {
            for &v in image.get_pixel(x, y).0.iter() {
                sum += f64::from(v);
                count += 1;
            }
        }
    }
    let mean = sum / count as f64;

    let mut sq = 0f64;
    for y in y0..y1 {
        for x in x0..x1 {
            for &v in image.get_pixel(x, y).0.iter() {
                sq += (f64::from(v) - mean).powi(2);
            }
        }
    }
    (sq / count as f64).sqrt()
}
