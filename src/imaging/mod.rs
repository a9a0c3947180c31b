//! Image processing on top of the `image` and `imageproc` crates.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode / detect format** | `image::guess_format` + `load_from_memory_with_format` |
//! | **Encode** | `JpegEncoder` (configured quality), `write_to` otherwise |
//! | **Resize / scale** | `resize_exact` with the configured filter |
//! | **Fit** | center `crop_imm` to the target aspect + `resize_exact` |
//! | **Paste** | `imageops::overlay` (alpha) / `imageops::replace` (opaque) |
//! | **Sharpness** | `imageops::blur` + per-pixel detail scaling |
//! | **Text** | `imageproc::drawing::draw_text_mut` with an `ab_glyph` font |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for placement and dimension math (unit testable)
//! - **Parameters**: Alignment and text layout types
//! - **Codec**: Format detection, decoding, encoding
//! - **Operations**: Pixel transformations over `DynamicImage`

mod calculations;
pub mod codec;
pub mod operations;
mod params;

pub use calculations::{
    aligned_offset, center_crop_origin, cover_region, proportional_height, rect_within,
};
pub use codec::CodecError;
pub use params::{AlignError, Anchor, HAlign, TextParams, VAlign};
