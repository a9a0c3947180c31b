//! Shared test utilities for the imagequery unit tests.
//!
//! Synthetic images stand in for photo fixtures: they are deterministic, tiny,
//! and cover the color types the operations care about (RGB, RGBA with
//! varying alpha, grayscale).

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

// =========================================================================
// Synthetic images
// =========================================================================

/// RGB image with a horizontal red ramp and a vertical green ramp.
pub fn gradient_rgb(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(2).saturating_sub(1)).min(255) as u8,
            (y * 255 / height.max(2).saturating_sub(1)).min(255) as u8,
            128,
        ])
    }))
}

/// RGBA image whose alpha ramps left to right.
pub fn translucent_rgba(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            200,
            (y * 7 % 256) as u8,
            40,
            (x * 255 / width.max(2).saturating_sub(1)).min(255) as u8,
        ])
    }))
}

/// Single-channel image with a diagonal ramp.
pub fn gray_ramp(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_fn(width, height, |x, y| {
        Luma([((x + y) * 8 % 256) as u8])
    }))
}

/// Solid RGB image.
pub fn solid_rgb(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
}

/// Gray level `low` left of `width / 2`, `high` from there on.
pub fn step_edge(width: u32, height: u32, low: u8, high: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgb([low; 3])
        } else {
            Rgb([high; 3])
        }
    }))
}

// =========================================================================
// Assertions
// =========================================================================

/// Per-pixel RGBA of `img` at (`x`, `y`).
pub fn rgba_at(img: &DynamicImage, x: u32, y: u32) -> [u8; 4] {
    img.to_rgba8().get_pixel(x, y).0
}

/// Sum of absolute channel differences between two horizontally adjacent
/// pixels, e.g. straddling the edge of [`step_edge`]; a rough contrast measure.
pub fn edge_contrast(img: &DynamicImage, x: u32, y: u32) -> i32 {
    let rgba = img.to_rgba8();
    let a = rgba.get_pixel(x, y).0;
    let b = rgba.get_pixel(x + 1, y).0;
    (0..3).map(|c| (a[c] as i32 - b[c] as i32).abs()).sum()
}
