//! # ImageQuery
//!
//! Chainable image handles. Open an image from a storage backend, apply a
//! sequence of operations, and write the result somewhere:
//!
//! ```no_run
//! # use imagequery::{ImageQuery, Settings};
//! # fn main() -> Result<(), imagequery::QueryError> {
//! let settings = Settings::default();
//! let thumb = ImageQuery::open("photos/lynx.jpg", &settings)?
//!     .grayscale()
//!     .fit(200, 200)?;
//! thumb.save("thumbs/lynx.jpg")?;
//! println!("{}", thumb.identifier()); // photos/lynx.jpg|grayscale()|fit(200,200)
//! # Ok(())
//! # }
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`query`] | The [`ImageQuery`] handle: constructors, transformations, output |
//! | [`naming`] | Source and operation descriptors, identifier, digest, cache names |
//! | [`storage`] | The [`Storage`] trait, [`FileSystemStorage`], stored-file fields |
//! | [`imaging`] | Pixel operations, placement math and codec on top of `image`/`imageproc` |
//! | [`color`] | Color values and their textual forms |
//! | [`config`] | `imagequery.toml` loading, merging and validation |
//!
//! # Design Decisions
//!
//! ## Handles Are Values
//!
//! Every transformation consumes the handle and returns a new one. Nothing a
//! caller holds is ever mutated behind its back; to branch a chain, clone it.
//! `paste` borrows the other handle and leaves it alone.
//!
//! ## Identity From the Recipe, Not the Pixels
//!
//! Two handles are the same derived image when they have the same source and
//! the same ordered list of operations with the same arguments. Operation
//! names count: `scale(100,100)` and `resize(100,100)` produce identical
//! pixels but different identifiers. The SHA-256 digest of that recipe names
//! the cache entry, so a cached derivative can be reused without decoding
//! anything.
//!
//! ## Format Follows the File Name
//!
//! The input format is detected from the bytes; the output format comes from
//! the destination's extension. Lossless outputs of an untouched image are
//! byte-stable; JPEG output is deterministic for a given quality setting.
//!
//! ## Config Layering
//!
//! Settings resolve as stock defaults, overlaid by an `imagequery.toml` if
//! one exists, then validated. Unknown keys are rejected so typos surface
//! immediately. See [`config::load_config`].

pub mod color;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod query;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use color::Color;
pub use config::Settings;
pub use imaging::{HAlign, VAlign};
pub use query::{ImageQuery, QueryError};
pub use storage::{FieldFile, FileSystemStorage, Storage, StoredFile};
