//! Common [scalar data types][data types] used in font files
//!
//! These are the building blocks shared by the reading and writing code in
//! `edit-fonts`. Each type knows how to convert itself to and from its raw
//! big-endian representation via the [`Scalar`] trait.
//!
//! [data types]: https://docs.microsoft.com/en-us/typography/opentype/spec/otff#data-types

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

mod fixed;
mod glyph_id;
mod longdatetime;
mod raw;
mod tag;
mod version;


pub use fixed::Fixed;
pub use glyph_id::GlyphId;
pub use longdatetime::LongDateTime;
pub use raw::Scalar;
pub use tag::{InvalidTag, Tag};
pub use version::{MajorMinor, Version16Dot16};

/// The SFNT version for fonts containing TrueType outlines.
pub const TT_SFNT_VERSION: u32 = 0x00010000;
/// The SFNT version used by some legacy Apple TrueType fonts ('true').
pub const TRUE_SFNT_VERSION: u32 = 0x74727565;
/// The SFNT version for fonts containing CFF outlines ('OTTO').
pub const CFF_SFNT_VERSION: u32 = 0x4F54544F;
/// The header tag for a font collection file.
pub const TTC_HEADER_TAG: Tag = Tag::new(b"ttcf");
