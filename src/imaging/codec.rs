//! Decoding and encoding through the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Detect format | `image::guess_format` (magic bytes) |
//! | Decode | `image::load_from_memory_with_format` |
//! | Output format | `ImageFormat::from_extension` on the destination name |
//! | Encode JPEG | `image::codecs::jpeg::JpegEncoder` with the configured quality |
//! | Encode anything else | `DynamicImage::write_to` with encoder defaults |

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("unsupported output format: {0}")]
    Unsupported(String),
    #[error("decode failed: {0}")]
    Decode(image::ImageError),
    #[error("encode failed: {0}")]
    Encode(image::ImageError),
}

/// Output format for a destination name, judged by its extension.
///
/// Fails for unknown extensions and for formats whose encoder is not
/// compiled in.
pub fn output_format(name: &str) -> Result<ImageFormat, CodecError> {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    match ImageFormat::from_extension(ext) {
        Some(format) if format.writing_enabled() => Ok(format),
        _ => Err(CodecError::Unsupported(if ext.is_empty() {
            format!("'{name}' has no extension")
        } else {
            ext.to_lowercase()
        })),
    }
}

/// Decode raw bytes, returning the image together with the detected format.
pub fn decode(bytes: &[u8]) -> Result<(DynamicImage, ImageFormat), CodecError> {
    let format = image::guess_format(bytes).map_err(CodecError::Decode)?;
    let image = image::load_from_memory_with_format(bytes, format).map_err(CodecError::Decode)?;
    Ok((image, format))
}

/// Encode `img` as `format`.
///
/// JPEG has no alpha channel: images with alpha are flattened to RGB/L first
/// (the alpha values are dropped, not composited).
pub fn encode(
    img: &DynamicImage,
    format: ImageFormat,
    jpeg_quality: u8,
) -> Result<Vec<u8>, CodecError> {
    let mut buffer = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            let flattened = flatten_for_jpeg(img);
            let encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality);
            flattened
                .write_with_encoder(encoder)
                .map_err(CodecError::Encode)?;
        }
        other => {
            img.write_to(&mut Cursor::new(&mut buffer), other)
                .map_err(CodecError::Encode)?;
        }
    }
    Ok(buffer)
}

fn flatten_for_jpeg(img: &DynamicImage) -> DynamicImage {
    match img.color() {
        ColorType::L8 | ColorType::Rgb8 => img.clone(),
        ColorType::La8 | ColorType::L16 | ColorType::La16 => {
            DynamicImage::ImageLuma8(img.to_luma8())
        }
        _ => DynamicImage::ImageRgb8(img.to_rgb8()),
    }
}

/// MIME type for a format, e.g. `image/jpeg`.
pub fn mime_type(format: ImageFormat) -> &'static str {
    format.to_mime_type()
}

/// Canonical file extension for a format, e.g. `jpg`.
pub fn extension(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("bin")
}
