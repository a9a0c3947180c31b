//! Deterministic names for derived images.
//!
//! Every handle carries a [`Source`] and the ordered list of [`Operation`]s
//! applied to it. Those two things, and nothing else, decide the handle's
//! identity:
//!
//! - **identifier**: human-readable, `source|op(args)|op(args)`. A handle with
//!   no operations is identified by its source alone, so an untouched
//!   `photos/a.jpg` is just `"photos/a.jpg"`.
//! - **digest**: SHA-256 of the source and each operation descriptor,
//!   NUL-separated, as lowercase hex. Used as a cache key. Unlike the
//!   identifier it also covers what the text form cannot tell apart: the
//!   pixels of in-memory sources (see [`fingerprint`]), the kind of source,
//!   and the content of pasted in-memory images.
//! - **cache name**: `<prefix>/<digest>/<file name>`, the storage name a
//!   derived image is written under by
//!   [`ImageQuery::save_cached`](crate::ImageQuery::save_cached).
//!
//! Operation names are part of the identity even when two operations produce
//! the same pixels: `scale(100,100)` and `resize(100,100)` never collide.
//! Free-form arguments (text, font paths, other handles' identifiers) are
//! rendered quoted and escaped so commas or pipes inside them cannot make two
//! different chains print the same.

use crate::color::Color;
use image::DynamicImage;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// Where a handle's image came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    /// Loaded from storage under this name.
    Name(String),
    /// Wrapped from an already-decoded image; `fingerprint` identifies its
    /// pixels.
    Memory { fingerprint: String },
    /// A freshly created canvas.
    Blank {
        width: u32,
        height: u32,
        color: Color,
    },
}

impl Source {
    /// Base file name used in cache names, if the source has one.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Source::Name(name) => Path::new(name).file_name().and_then(|f| f.to_str()),
            Source::Memory { .. } | Source::Blank { .. } => None,
        }
    }

    /// Unambiguous form hashed into the digest, tagged with the source kind.
    fn digest_key(&self) -> String {
        match self {
            Source::Name(name) => format!("name:{name}"),
            Source::Memory { fingerprint } => format!("memory:{fingerprint}"),
            Source::Blank {
                width,
                height,
                color,
            } => format!("blank:{width}x{height},{color}"),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Name(name) => f.write_str(name),
            Source::Memory { .. } => f.write_str("in-memory"),
            Source::Blank {
                width,
                height,
                color,
            } => write!(f, "blank({width}x{height},{color})"),
        }
    }
}

/// One recorded transformation: a name plus its canonically rendered
/// arguments.
///
/// `fingerprint` is hashed into the digest but not displayed; `paste` puts
/// the pasted handle's digest there.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Operation {
    pub name: &'static str,
    pub args: Vec<String>,
    pub fingerprint: Option<String>,
}

impl Operation {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            args: Vec::new(),
            fingerprint: None,
        }
    }

    pub fn fingerprint(mut self, value: impl Into<String>) -> Self {
        self.fingerprint = Some(value.into());
        self
    }

    /// Append an argument rendered with `Display`.
    pub fn arg(mut self, value: impl fmt::Display) -> Self {
        self.args.push(value.to_string());
        self
    }

    /// Append a free-form string argument, quoted and escaped.
    pub fn quoted(mut self, value: &str) -> Self {
        self.args.push(format!("{value:?}"));
        self
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.args.join(","))
    }
}

/// Human-readable identity of `source` transformed by `operations`.
pub fn identifier(source: &Source, operations: &[Operation]) -> String {
    let mut id = source.to_string();
    for op in operations {
        id.push('|');
        id.push_str(&op.to_string());
    }
    id
}

/// SHA-256 of `source` and `operations`, returned as a hex string.
pub fn digest(source: &Source, operations: &[Operation]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"source\0");
    hasher.update(source.digest_key().as_bytes());
    for op in operations {
        hasher.update(b"\0op\0");
        hasher.update(op.to_string().as_bytes());
        if let Some(fingerprint) = &op.fingerprint {
            hasher.update(b"\0fingerprint\0");
            hasher.update(fingerprint.as_bytes());
        }
    }
    format!("{:x}", hasher.finalize())
}

/// SHA-256 hex of an image's dimensions, channel layout and raw samples.
pub fn fingerprint(image: &DynamicImage) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image.width().to_le_bytes());
    hasher.update(image.height().to_le_bytes());
    hasher.update(format!("{:?}", image.color()).as_bytes());
    hasher.update(b"\0");
    hasher.update(image.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Storage name for a derived image: `<prefix>/<digest>/<file_name>`.
pub fn cache_name(prefix: &str, digest: &str, file_name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        format!("{digest}/{file_name}")
    } else {
        format!("{prefix}/{digest}/{file_name}")
    }
}
