//! The image handle.
//!
//! An [`ImageQuery`] owns one decoded image plus the record of everything done
//! to it. Transformations consume the handle and hand it back, so chains read
//! left to right:
//!
//! ```no_run
//! # use imagequery::{HAlign, ImageQuery, Settings, VAlign};
//! # fn main() -> Result<(), imagequery::QueryError> {
//! let settings = Settings::default();
//! let logo = ImageQuery::open("logos/tux.png", &settings)?;
//!
//! ImageQuery::open("photos/lynx.jpg", &settings)?
//!     .mirror()
//!     .flip()
//!     .resize(400, Some(300))?
//!     .paste(&logo, HAlign::Right, VAlign::Bottom)
//!     .save("derived/lynx.jpg")?;
//! # Ok(())
//! # }
//! ```
//!
//! To branch a chain, `clone()` the handle first; clones share nothing
//! mutable. A transformation that fails consumes the handle, so there is no
//! half-transformed state to observe afterwards.

use crate::color::{Color, ColorError};
use crate::config::Settings;
use crate::imaging::{
    self, AlignError, CodecError, HAlign, TextParams, VAlign, codec, operations,
};
use crate::naming::{self, Operation, Source};
use crate::storage::{FileSystemStorage, Storage, StorageError, StoredFile};
use ab_glyph::FontVec;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("'{0}' not found")]
    NotFound(String),
    #[error("failed to decode '{name}': {source}")]
    Decode {
        name: String,
        source: image::ImageError,
    },
    #[error("failed to encode '{name}': {reason}")]
    Encode { name: String, reason: String },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("storage error for '{name}': {source}")]
    Storage { name: String, source: StorageError },
}

impl From<ColorError> for QueryError {
    fn from(err: ColorError) -> Self {
        QueryError::InvalidArgument(err.to_string())
    }
}

impl From<AlignError> for QueryError {
    fn from(err: AlignError) -> Self {
        QueryError::InvalidArgument(err.to_string())
    }
}

fn open_error(name: &str, err: StorageError) -> QueryError {
    match err {
        StorageError::NotFound(_) => QueryError::NotFound(name.to_string()),
        StorageError::SuspiciousName(_) => QueryError::InvalidArgument(err.to_string()),
        StorageError::Io(_) => QueryError::Storage {
            name: name.to_string(),
            source: err,
        },
    }
}

fn decode_error(name: &str, err: CodecError) -> QueryError {
    match err {
        CodecError::Decode(source) | CodecError::Encode(source) => QueryError::Decode {
            name: name.to_string(),
            source,
        },
        CodecError::Unsupported(reason) => QueryError::Encode {
            name: name.to_string(),
            reason,
        },
    }
}

fn encode_error(name: &str, err: impl fmt::Display) -> QueryError {
    QueryError::Encode {
        name: name.to_string(),
        reason: err.to_string(),
    }
}

/// A decoded image plus the chain of operations that produced it.
#[derive(Clone)]
pub struct ImageQuery {
    image: DynamicImage,
    source: Source,
    operations: Vec<Operation>,
    format: ImageFormat,
    storage: Arc<dyn Storage>,
    settings: Settings,
}

impl ImageQuery {
    // -- Construction ---------------------------------------------------------

    /// Load `name` from the default storage: a [`FileSystemStorage`] rooted at
    /// `settings.media_root`.
    pub fn open(name: &str, settings: &Settings) -> Result<Self, QueryError> {
        let storage: Arc<dyn Storage> = Arc::new(FileSystemStorage::new(&settings.media_root));
        Self::open_with_storage(name, storage, settings)
    }

    /// Load `name` from `storage`, which also becomes the default target of
    /// [`save`](Self::save).
    #[instrument(skip(storage, settings))]
    pub fn open_with_storage(
        name: &str,
        storage: Arc<dyn Storage>,
        settings: &Settings,
    ) -> Result<Self, QueryError> {
        let bytes = storage.open(name).map_err(|e| open_error(name, e))?;
        let (image, format) = codec::decode(&bytes).map_err(|e| decode_error(name, e))?;
        debug!(
            width = image.width(),
            height = image.height(),
            ?format,
            "Image loaded"
        );
        Ok(Self {
            image,
            source: Source::Name(name.to_string()),
            operations: Vec::new(),
            format,
            storage,
            settings: settings.clone(),
        })
    }

    /// Load whatever file a stored-file field points at.
    pub fn from_field<F: StoredFile + ?Sized>(
        field: &F,
        settings: &Settings,
    ) -> Result<Self, QueryError> {
        let name = field.name();
        if name.is_empty() {
            return Err(QueryError::InvalidArgument(
                "field has no file associated with it".into(),
            ));
        }
        Self::open_with_storage(name, field.storage(), settings)
    }

    /// Wrap an already-decoded image. Saved as PNG unless told otherwise.
    ///
    /// The identifier shows `in-memory`; the digest covers the pixels, so
    /// different images never share a cache name.
    pub fn from_image(image: DynamicImage, settings: &Settings) -> Self {
        let fingerprint = naming::fingerprint(&image);
        Self {
            image,
            source: Source::Memory { fingerprint },
            operations: Vec::new(),
            format: ImageFormat::Png,
            storage: Arc::new(FileSystemStorage::new(&settings.media_root)),
            settings: settings.clone(),
        }
    }

    /// Blank RGBA canvas. `color` defaults to `settings.images.blank_color`
    /// (transparent black unless configured).
    pub fn new_blank(
        width: u32,
        height: u32,
        color: Option<Color>,
        settings: &Settings,
    ) -> Result<Self, QueryError> {
        check_dimension(settings, "width", width)?;
        check_dimension(settings, "height", height)?;
        let color = color.unwrap_or(settings.images.blank_color);
        debug!(width, height, %color, "Blank canvas created");
        Ok(Self {
            image: operations::blank(width, height, color),
            source: Source::Blank {
                width,
                height,
                color,
            },
            operations: Vec::new(),
            format: ImageFormat::Png,
            storage: Arc::new(FileSystemStorage::new(&settings.media_root)),
            settings: settings.clone(),
        })
    }

    // -- Transformations (consume self, return Self) --------------------------

    fn apply(mut self, op: Operation, f: impl FnOnce(&DynamicImage) -> DynamicImage) -> Self {
        debug!(operation = %op, "Applying operation");
        self.image = f(&self.image);
        self.operations.push(op);
        self
    }

    fn filter(&self) -> FilterType {
        self.settings.images.filter.into()
    }

    /// Convert to luminance, keeping alpha if present.
    pub fn grayscale(self) -> Self {
        self.apply(Operation::new("grayscale"), operations::grayscale)
    }

    /// Flip horizontally.
    pub fn mirror(self) -> Self {
        self.apply(Operation::new("mirror"), DynamicImage::fliph)
    }

    /// Flip vertically.
    pub fn flip(self) -> Self {
        self.apply(Operation::new("flip"), DynamicImage::flipv)
    }

    /// Invert every color channel; alpha is untouched.
    pub fn invert(self) -> Self {
        self.apply(Operation::new("invert"), operations::invert)
    }

    /// Resample to `width`×`height`. Without a height the aspect ratio is
    /// kept. Upsampling is allowed.
    pub fn resize(self, width: u32, height: Option<u32>) -> Result<Self, QueryError> {
        check_dimension(&self.settings, "width", width)?;
        let mut op = Operation::new("resize").arg(width);
        let target_height = match height {
            Some(h) => {
                op = op.arg(h);
                h
            }
            None => imaging::proportional_height(self.size(), width),
        };
        check_dimension(&self.settings, "height", target_height)?;
        let filter = self.filter();
        Ok(self.apply(op, |img| {
            operations::resize_exact(img, width, target_height, filter)
        }))
    }

    /// Same pixels as `resize(width, Some(height))`, recorded under its own
    /// name.
    pub fn scale(self, width: u32, height: u32) -> Result<Self, QueryError> {
        check_dimension(&self.settings, "width", width)?;
        check_dimension(&self.settings, "height", height)?;
        let filter = self.filter();
        let op = Operation::new("scale").arg(width).arg(height);
        Ok(self.apply(op, |img| operations::resize_exact(img, width, height, filter)))
    }

    /// Cover `width`×`height` keeping the aspect ratio, then center-crop to
    /// exactly that size.
    pub fn fit(self, width: u32, height: u32) -> Result<Self, QueryError> {
        check_dimension(&self.settings, "width", width)?;
        check_dimension(&self.settings, "height", height)?;
        let filter = self.filter();
        let op = Operation::new("fit").arg(width).arg(height);
        Ok(self.apply(op, |img| operations::fit(img, width, height, filter)))
    }

    /// Cut out the `width`×`height` rectangle whose top-left corner is at
    /// (`x`, `y`). The rectangle must lie inside the image.
    pub fn crop(self, x: u32, y: u32, width: u32, height: u32) -> Result<Self, QueryError> {
        check_dimension(&self.settings, "width", width)?;
        check_dimension(&self.settings, "height", height)?;
        if !imaging::rect_within(self.size(), x, y, width, height) {
            let (w, h) = self.size();
            return Err(QueryError::InvalidArgument(format!(
                "crop {width}x{height}+{x}+{y} exceeds {w}x{h} image"
            )));
        }
        let op = Operation::new("crop").arg(x).arg(y).arg(width).arg(height);
        Ok(self.apply(op, |img| img.crop_imm(x, y, width, height)))
    }

    /// Composite `other`'s current image onto this one. `other` is left
    /// untouched; its identifier becomes part of this handle's, its digest
    /// part of this handle's digest.
    pub fn paste(self, other: &ImageQuery, h_align: HAlign, v_align: VAlign) -> Self {
        let op = Operation::new("paste")
            .quoted(&other.identifier())
            .arg(h_align)
            .arg(v_align)
            .fingerprint(other.digest());
        self.apply(op, |img| {
            operations::paste(img, &other.image, h_align, v_align)
        })
    }

    /// A new handle the same size as this one, filled with `color`.
    ///
    /// The receiver is not modified. The new handle keeps this handle's
    /// format and storage.
    pub fn blank(&self, color: Color) -> Self {
        let (width, height) = self.size();
        debug!(width, height, %color, "Blank copy created");
        Self {
            image: operations::blank(width, height, color),
            source: Source::Blank {
                width,
                height,
                color,
            },
            operations: Vec::new(),
            format: self.format,
            storage: Arc::clone(&self.storage),
            settings: self.settings.clone(),
        }
    }

    /// Sharpen (`factor > 0`) or soften (`factor < 0`); `0` leaves the pixels
    /// alone. The magnitude scales the effect.
    pub fn sharpness(self, factor: f32) -> Result<Self, QueryError> {
        if !factor.is_finite() {
            return Err(QueryError::InvalidArgument(format!(
                "sharpness factor must be finite, got {factor}"
            )));
        }
        let sigma = self.settings.images.sharpen_sigma;
        let op = Operation::new("sharpness").arg(factor);
        Ok(self.apply(op, |img| operations::sharpness(img, factor, sigma)))
    }

    /// Draw `content` with the font file at `font_path`, horizontally aligned
    /// and `v_offset` pixels below the top edge.
    pub fn text(
        self,
        content: &str,
        h_align: HAlign,
        v_offset: i32,
        font_path: impl AsRef<Path>,
        font_size: f32,
        color: Color,
    ) -> Result<Self, QueryError> {
        let font_path = font_path.as_ref();
        if !(font_size.is_finite() && font_size > 0.0) {
            return Err(QueryError::InvalidArgument(format!(
                "font size must be positive, got {font_size}"
            )));
        }
        let font = load_font(font_path)?;
        let params = TextParams {
            h_align,
            v_offset,
            size: font_size,
            color,
        };
        let op = Operation::new("text")
            .quoted(content)
            .arg(h_align)
            .arg(v_offset)
            .quoted(&font_path.display().to_string())
            .arg(font_size)
            .arg(color);
        Ok(self.apply(op, |img| operations::text(img, content, &font, &params)))
    }

    // -- Output ---------------------------------------------------------------

    /// Encode for `destination`'s extension and write it through the storage
    /// this handle was loaded from.
    pub fn save(&self, destination: &str) -> Result<&Self, QueryError> {
        self.save_to(destination, self.storage.as_ref())
    }

    /// Encode for `destination`'s extension and write it through `storage`.
    #[instrument(skip(self, storage), fields(source = %self.source))]
    pub fn save_to(&self, destination: &str, storage: &dyn Storage) -> Result<&Self, QueryError> {
        let format = codec::output_format(destination).map_err(|e| encode_error(destination, e))?;
        let bytes = self.encode_for(destination, format)?;
        storage.save(destination, &bytes).map_err(|e| match e {
            StorageError::SuspiciousName(_) => QueryError::InvalidArgument(e.to_string()),
            other => encode_error(destination, other),
        })?;
        info!(bytes = bytes.len(), ?format, "Image saved");
        Ok(self)
    }

    /// Encoded bytes of the current image in `format`.
    pub fn encode(&self, format: ImageFormat) -> Result<Vec<u8>, QueryError> {
        self.encode_for(&self.source.to_string(), format)
    }

    fn encode_for(&self, name: &str, format: ImageFormat) -> Result<Vec<u8>, QueryError> {
        codec::encode(&self.image, format, self.settings.images.jpeg_quality)
            .map_err(|e| encode_error(name, e))
    }

    /// Storage name this handle's result is cached under; see
    /// [`naming::cache_name`].
    pub fn cache_name(&self) -> String {
        let file_name = match self.source.file_name() {
            Some(name) => name.to_string(),
            None => format!("image.{}", codec::extension(self.format)),
        };
        naming::cache_name(&self.settings.cache_prefix, &self.digest(), &file_name)
    }

    /// Write the result to [`cache_name`](Self::cache_name) in the default
    /// storage unless it is already there. Returns the cache name.
    pub fn save_cached(&self) -> Result<String, QueryError> {
        let name = self.cache_name();
        if self.storage.exists(&name) {
            info!(%name, "Cached image already present");
            return Ok(name);
        }
        self.save(&name)?;
        Ok(name)
    }

    // -- Accessors ------------------------------------------------------------

    /// `(width, height)` of the current image.
    pub fn size(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// MIME type of the format detected at load time.
    pub fn mimetype(&self) -> &'static str {
        codec::mime_type(self.format)
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Deterministic description of source plus operations; see
    /// [`naming::identifier`].
    pub fn identifier(&self) -> String {
        naming::identifier(&self.source, &self.operations)
    }

    /// SHA-256 hex of source plus operations; see [`naming::digest`].
    pub fn digest(&self) -> String {
        naming::digest(&self.source, &self.operations)
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the handle and return the underlying `DynamicImage`.
    pub fn into_image(self) -> DynamicImage {
        self.image
    }
}

/// Handles are equal when they describe the same derived artifact.
impl PartialEq for ImageQuery {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.operations == other.operations
    }
}

impl fmt::Debug for ImageQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageQuery")
            .field("identifier", &self.identifier())
            .field("size", &self.size())
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

fn check_dimension(settings: &Settings, what: &str, value: u32) -> Result<(), QueryError> {
    let max = settings.images.max_dimension;
    if value == 0 || value > max {
        return Err(QueryError::InvalidArgument(format!(
            "{what} must be between 1 and {max}, got {value}"
        )));
    }
    Ok(())
}

fn load_font(path: &Path) -> Result<FontVec, QueryError> {
    let bytes = std::fs::read(path).map_err(|e| {
        QueryError::InvalidArgument(format!("cannot read font {}: {e}", path.display()))
    })?;
    FontVec::try_from_vec(bytes).map_err(|e| {
        QueryError::InvalidArgument(format!("{} is not a usable font: {e}", path.display()))
    })
}
