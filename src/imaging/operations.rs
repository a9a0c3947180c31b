//! Pixel operations on decoded images.
//!
//! Each function takes the current image and returns the transformed one;
//! recording descriptors and validating arguments happens in
//! [`query`](crate::query). Operations that need per-channel math work on an
//! RGBA copy and convert back with [`restore_color`], so a grayscale image
//! stays grayscale and an opaque image does not grow an alpha channel.

use super::calculations::{aligned_offset, center_crop_origin, cover_region};
use super::params::{HAlign, TextParams, VAlign};
use crate::color::Color;
use ab_glyph::{FontVec, PxScale};
use image::imageops::{self, FilterType};
use image::{ColorType, DynamicImage, ImageBuffer, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};

/// Convert an RGBA working buffer back to `target`'s channel layout.
///
/// 16-bit and float layouts come back as their 8-bit equivalents.
pub fn restore_color(target: ColorType, rgba: RgbaImage) -> DynamicImage {
    let working = DynamicImage::ImageRgba8(rgba);
    match (target.has_color(), target.has_alpha()) {
        (false, false) => DynamicImage::ImageLuma8(working.to_luma8()),
        (false, true) => DynamicImage::ImageLumaA8(working.to_luma_alpha8()),
        (true, false) => DynamicImage::ImageRgb8(working.to_rgb8()),
        (true, true) => working,
    }
}

/// Layout able to hold both `base` and `top` without losing color or alpha
/// that `base` had.
fn combined_color(base: ColorType, top_has_color: bool) -> ColorType {
    match (base.has_color() || top_has_color, base.has_alpha()) {
        (false, false) => ColorType::L8,
        (false, true) => ColorType::La8,
        (true, false) => ColorType::Rgb8,
        (true, true) => ColorType::Rgba8,
    }
}

/// Luminance conversion; alpha survives as L+A.
pub fn grayscale(img: &DynamicImage) -> DynamicImage {
    img.grayscale()
}

/// Color inversion; alpha is untouched.
pub fn invert(img: &DynamicImage) -> DynamicImage {
    let mut inverted = img.clone();
    inverted.invert();
    inverted
}

/// Resample to exactly `width`×`height`.
pub fn resize_exact(
    img: &DynamicImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> DynamicImage {
    img.resize_exact(width, height, filter)
}

/// Crop the centered region with the target's aspect ratio, then resample it
/// to exactly `width`×`height`.
///
/// Equivalent to covering the target and center-cropping, but no intermediate
/// image is larger than the source or the result.
pub fn fit(img: &DynamicImage, width: u32, height: u32, filter: FilterType) -> DynamicImage {
    let source = (img.width(), img.height());
    let region = cover_region(source, (width, height));
    let (x, y) = center_crop_origin(source, region);
    img.crop_imm(x, y, region.0, region.1)
        .resize_exact(width, height, filter)
}

/// Composite `top` onto `base` at the aligned position.
///
/// `top` is alpha-blended when it has an alpha channel and copied verbatim
/// otherwise. Parts of `top` falling outside `base` are clipped.
pub fn paste(
    base: &DynamicImage,
    top: &DynamicImage,
    h_align: HAlign,
    v_align: VAlign,
) -> DynamicImage {
    let x = aligned_offset(base.width(), top.width(), h_align.anchor());
    let y = aligned_offset(base.height(), top.height(), v_align.anchor());

    let mut canvas = base.to_rgba8();
    let layer = top.to_rgba8();
    if top.color().has_alpha() {
        imageops::overlay(&mut canvas, &layer, x, y);
    } else {
        imageops::replace(&mut canvas, &layer, x, y);
    }
    restore_color(combined_color(base.color(), top.color().has_color()), canvas)
}

/// Canvas of `width`×`height` filled with `color`.
pub fn blank(width: u32, height: u32, color: Color) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, color.to_rgba()))
}

/// Unsharp-mask style sharpness adjustment:
/// `out = orig + factor * (orig - blur(orig, sigma))`.
///
/// Positive factors exaggerate detail, negative factors move toward the
/// blurred copy (`-1.0` is exactly the blur). Alpha is untouched.
pub fn sharpness(img: &DynamicImage, factor: f32, sigma: f32) -> DynamicImage {
    if factor == 0.0 {
        return img.clone();
    }
    let original = img.to_rgba8();
    let blurred = imageops::blur(&original, sigma);

    let adjusted = ImageBuffer::from_fn(original.width(), original.height(), |x, y| {
        let Rgba([r, g, b, a]) = *original.get_pixel(x, y);
        let Rgba([br, bg, bb, _]) = *blurred.get_pixel(x, y);
        let adjust = |channel: u8, smooth: u8| -> u8 {
            let detail = channel as f32 - smooth as f32;
            (channel as f32 + factor * detail).round().clamp(0.0, 255.0) as u8
        };
        Rgba([adjust(r, br), adjust(g, bg), adjust(b, bb), a])
    });
    restore_color(img.color(), adjusted)
}

/// Draw one line of text, horizontally aligned, `params.v_offset` pixels
/// below the top edge.
pub fn text(
    img: &DynamicImage,
    content: &str,
    font: &FontVec,
    params: &TextParams,
) -> DynamicImage {
    let scale = PxScale::from(params.size);
    let (text_w, _) = text_size(scale, font, content);
    let x = aligned_offset(img.width(), text_w, params.h_align.anchor());

    let mut canvas = img.to_rgba8();
    draw_text_mut(
        &mut canvas,
        params.color.to_rgba(),
        x as i32,
        params.v_offset,
        scale,
        font,
        content,
    );
    let c = params.color;
    let colored_text = !(c.r == c.g && c.g == c.b);
    restore_color(combined_color(img.color(), colored_text), canvas)
}
