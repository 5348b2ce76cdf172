//! Reading, modifying and writing font files
//!
//! This crate opens a TrueType or OpenType font file for editing. Tables are
//! loaded lazily: opening a font reads only the [table directory] and the
//! `head` and `maxp` tables, and every other table is read from the source
//! the first time it is accessed.
//!
//! Some values in a font are derived from others; the font bounding box in
//! `head`, for instance, is the union of the bounding boxes of the glyphs in
//! `glyf`. Modifying a table marks it *dirty*, and [`Font::update`]
//! recomputes derived values in dependency order (see [`graph`]). Writing
//! updates the font if needed, then re-encodes the tables that changed and
//! copies all others byte for byte.
//!
//! Only a basic set of tables is understood (see [`tables`]); any other table
//! is carried through as opaque bytes.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), edit_fonts::Error> {
//! # let path_to_my_font_file = std::path::Path::new("");
//! use edit_fonts::{tables::hhea::Hhea, Font};
//!
//! let mut font = Font::open(path_to_my_font_file)?;
//! font.table_mut::<Hhea>()?.line_gap = 100;
//! let bytes = font.to_bytes()?;
//! # Ok(())
//! # }
//! ```
//!
//! [table directory]: https://learn.microsoft.com/en-us/typography/opentype/spec/otff#table-directory

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod directory;
mod error;
mod font;
pub mod font_builder;
mod font_data;
pub mod graph;
mod read;
mod registry;
mod source;
mod table;
pub mod tables;
mod update;
pub mod validate;
mod write;

pub use directory::{TableDirectory, TableRecord};
pub use error::Error;
pub use font::{Font, WriteOptions};
pub use font_builder::FontBuilder;
pub use font_data::{Cursor, FontData};
pub use graph::{DependencyGraph, GraphError};
pub use read::ReadError;
pub use registry::{LoadContext, UpdateContext};
pub use source::ByteSource;
pub use table::{Table, TableState};
pub use tables::{AnyTable, FontTable};
pub use update::UpdateReport;
pub use write::{dump_table, EncodeError, FontWrite, TableWriter};

/// Public re-export of the font-types crate.
pub extern crate font_types as types;
