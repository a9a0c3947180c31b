//! Library settings.
//!
//! Handles loading, validating, and merging `imagequery.toml`. Stock defaults
//! are overridden by whatever keys the user file sets.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! media_root = "media"              # Root of the default filesystem storage
//! cache_prefix = "cache/imagequery" # Where save_cached() puts derived images
//!
//! [images]
//! jpeg_quality = 75                 # JPEG encoder quality (1-100)
//! filter = "lanczos3"               # Resampling filter for resize/scale/fit
//! max_dimension = 10000             # Largest width/height any operation may request
//! blank_color = "#00000000"         # Fill for blank canvases created without a color
//! sharpen_sigma = 1.0               # Blur radius sharpness() measures detail against
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::color::Color;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the settings file looked up by [`load_config`].
pub const CONFIG_FILENAME: &str = "imagequery.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Settings loaded from `imagequery.toml`.
///
/// All fields have defaults; a user file only needs the values it wants to
/// override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Root directory of the default [`FileSystemStorage`](crate::FileSystemStorage).
    pub media_root: PathBuf,
    /// Storage prefix for [`ImageQuery::save_cached`](crate::ImageQuery::save_cached).
    pub cache_prefix: String,
    /// Encoding and operation settings.
    pub images: ImagesConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("media"),
            cache_prefix: "cache/imagequery".to_string(),
            images: ImagesConfig::default(),
        }
    }
}

impl Settings {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.images.jpeg_quality) {
            return Err(ConfigError::Validation(
                "images.jpeg_quality must be 1-100".into(),
            ));
        }
        if self.images.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "images.max_dimension must be non-zero".into(),
            ));
        }
        if self.images.sharpen_sigma.is_nan() || self.images.sharpen_sigma <= 0.0 {
            return Err(ConfigError::Validation(
                "images.sharpen_sigma must be positive".into(),
            ));
        }
        if self.cache_prefix.split('/').any(|part| part == "..") {
            return Err(ConfigError::Validation(
                "cache_prefix must not contain '..'".into(),
            ));
        }
        Ok(())
    }
}

/// Encoding and operation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// JPEG encoder quality (1 = worst, 100 = best).
    pub jpeg_quality: u8,
    /// Resampling filter used by resize, scale and fit.
    pub filter: ResampleFilter,
    /// Upper bound on any requested width or height.
    pub max_dimension: u32,
    /// Fill color for blank canvases created without an explicit color.
    pub blank_color: Color,
    /// Gaussian sigma of the blurred copy `sharpness()` compares against.
    pub sharpen_sigma: f32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 75,
            filter: ResampleFilter::default(),
            max_dimension: 10_000,
            blank_color: Color::rgba(0, 0, 0, 0),
            sharpen_sigma: 1.0,
        }
    }
}

/// Serializable mirror of [`image::imageops::FilterType`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl From<ResampleFilter> for FilterType {
    fn from(filter: ResampleFilter) -> Self {
        match filter {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Gaussian => FilterType::Gaussian,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// `Settings::default()` as a TOML table, the bottom layer every override
/// file is laid over.
pub fn defaults_table() -> toml::Value {
    toml::Value::try_from(Settings::default()).expect("default settings must serialize")
}

/// Lay `overrides` over `base`.
///
/// Nested tables such as `[images]` combine key by key, so a file that sets
/// only `images.jpeg_quality` keeps every other image default. Any other
/// value in `overrides` wins outright.
pub fn overlay_settings(base: toml::Value, overrides: toml::Value) -> toml::Value {
    match (base, overrides) {
        (toml::Value::Table(mut table), toml::Value::Table(overrides)) => {
            for (key, value) in overrides {
                let layered = match table.remove(&key) {
                    Some(existing) => overlay_settings(existing, value),
                    None => value,
                };
                table.insert(key, layered);
            }
            toml::Value::Table(table)
        }
        (_, value) => value,
    }
}

/// Parse `imagequery.toml` in `dir` without interpreting it.
///
/// A missing file is not an error: it means "no overrides".
pub fn read_settings_file(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let content = match fs::read_to_string(dir.join(CONFIG_FILENAME)) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(toml::from_str(&content)?))
}

/// Settings from the stock defaults plus optional overrides, validated.
pub fn settings_with_overrides(overrides: Option<toml::Value>) -> Result<Settings, ConfigError> {
    let table = match overrides {
        Some(overrides) => overlay_settings(defaults_table(), overrides),
        None => defaults_table(),
    };
    let settings: Settings = table.try_into()?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings for a media directory: stock defaults, overridden by its
/// `imagequery.toml` if present. Unknown keys and out-of-range values fail.
pub fn load_config(dir: &Path) -> Result<Settings, ConfigError> {
    settings_with_overrides(read_settings_file(dir)?)
}

/// Returns a fully-commented stock `imagequery.toml`.
pub fn stock_config_toml() -> &'static str {
    r##"# imagequery settings
# ===================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Root directory of the default filesystem storage. Names passed to
# ImageQuery::open are resolved against it; absolute names are used as-is.
media_root = "media"

# Storage prefix under which save_cached() writes derived images, as
# <cache_prefix>/<sha256 of the operation chain>/<file name>.
cache_prefix = "cache/imagequery"

[images]
# JPEG encoder quality, 1 (worst) to 100 (best).
jpeg_quality = 75

# Resampling filter for resize, scale and fit:
# nearest, triangle, catmull_rom, gaussian, lanczos3
filter = "lanczos3"

# Largest width or height an operation may request.
max_dimension = 10000

# Fill for blank canvases created without a color (transparent black).
blank_color = "#00000000"

# Gaussian sigma of the blurred copy that sharpness() measures detail against.
sharpen_sigma = 1.0
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_settings_values() {
        let s = Settings::default();
        assert_eq!(s.media_root, PathBuf::from("media"));
        assert_eq!(s.cache_prefix, "cache/imagequery");
        assert_eq!(s.images.jpeg_quality, 75);
        assert_eq!(s.images.filter, ResampleFilter::Lanczos3);
        assert_eq!(s.images.blank_color, Color::rgba(0, 0, 0, 0));
        assert!(s.validate().is_ok());
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[images]
jpeg_quality = 90
"##;
        let s: Settings = toml::from_str(toml).unwrap();
        assert_eq!(s.images.jpeg_quality, 90);
        assert_eq!(s.images.filter, ResampleFilter::Lanczos3);
        assert_eq!(s.media_root, PathBuf::from("media"));
    }

    #[test]
    fn parse_filter_and_color() {
        let toml = r##"
[images]
filter = "catmull_rom"
blank_color = "#ffffff"
"##;
        let s: Settings = toml::from_str(toml).unwrap();
        assert_eq!(s.images.filter, ResampleFilter::CatmullRom);
        assert_eq!(s.images.blank_color, Color::rgb(255, 255, 255));
        assert_eq!(FilterType::from(s.images.filter), FilterType::CatmullRom);
    }

    #[test]
    fn unknown_keys_rejected() {
        let result: Result<Settings, _> = toml::from_str("media_rot = \"x\"");
        assert!(result.is_err());
        let result: Result<Settings, _> = toml::from_str("[images]\nquality = 3");
        assert!(result.is_err());
    }

    #[test]
    fn malformed_color_rejected() {
        let result: Result<Settings, _> = toml::from_str("[images]\nblank_color = \"#zz\"");
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut s = Settings::default();
        s.images.jpeg_quality = 0;
        assert!(matches!(s.validate(), Err(ConfigError::Validation(_))));

        let mut s = Settings::default();
        s.images.max_dimension = 0;
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.images.sharpen_sigma = 0.0;
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.cache_prefix = "cache/../../etc".into();
        assert!(s.validate().is_err());
    }

    #[test]
    fn overlay_keeps_untouched_image_defaults() {
        let overrides: toml::Value = toml::from_str("[images]\nmax_dimension = 512").unwrap();
        let s: Settings = overlay_settings(defaults_table(), overrides)
            .try_into()
            .unwrap();
        assert_eq!(s.images.max_dimension, 512);
        assert_eq!(s.images.jpeg_quality, 75);
        assert_eq!(s.cache_prefix, "cache/imagequery");
    }

    #[test]
    fn settings_without_overrides_are_defaults() {
        assert_eq!(settings_with_overrides(None).unwrap(), Settings::default());
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(load_config(tmp.path()).unwrap(), Settings::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "media_root = \"/srv/media\"\n[images]\njpeg_quality = 88\n",
        )
        .unwrap();
        let s = load_config(tmp.path()).unwrap();
        assert_eq!(s.media_root, PathBuf::from("/srv/media"));
        assert_eq!(s.images.jpeg_quality, 88);
    }

    #[test]
    fn load_config_validates() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "[images]\njpeg_quality = 101\n",
        )
        .unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn load_config_reports_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "images = [").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let s: Settings = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(s, Settings::default());
    }
}
