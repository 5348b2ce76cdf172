//! A single font table and its lifecycle

use std::sync::Arc;

use font_types::Tag;

use crate::tables::{AnyTable, Summary};

/// How much of a table has been loaded.
///
/// States only advance, in the order listed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableState {
    /// Known from the table directory; nothing has been read.
    Unloaded,
    /// The raw bytes have been read, and any shallow summary computed.
    RawLoaded,
    /// The bytes have been decoded into structured data.
    Structured,
}

/// One table in a font.
///
/// A table carries two flags. `dirty` means its recompute step must run on
/// the next update; `modified` means its structured data no longer matches
/// its raw bytes and must be encoded when the font is written.
#[derive(Clone, Debug)]
pub struct Table {
    tag: Tag,
    pub(crate) raw: Option<Arc<[u8]>>,
    pub(crate) summary: Option<Summary>,
    pub(crate) data: Option<AnyTable>,
    pub(crate) dirty: bool,
    pub(crate) modified: bool,
}

impl Table {
    /// A table listed in the directory, not yet read.
    pub(crate) fn unloaded(tag: Tag) -> Self {
        Table {
            tag,
            raw: None,
            summary: None,
            data: None,
            dirty: false,
            modified: false,
        }
    }

    /// A table created by the caller.
    pub(crate) fn authored(tag: Tag, data: AnyTable) -> Self {
        Table {
            tag,
            raw: None,
            summary: None,
            data: Some(data),
            dirty: true,
            modified: true,
        }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn state(&self) -> TableState {
        if self.data.is_some() {
            TableState::Structured
        } else if self.raw.is_some() {
            TableState::RawLoaded
        } else {
            TableState::Unloaded
        }
    }

    /// `true` if this table's recompute step will run on the next update.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// `true` if this table will be re-encoded on the next write.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// The bytes this table was loaded from, or last written as.
    pub fn raw_bytes(&self) -> Option<&[u8]> {
        self.raw.as_deref()
    }

    /// The structured data, if the table has been decoded.
    pub fn data(&self) -> Option<&AnyTable> {
        self.data.as_ref()
    }

    /// The summary computed by the family's shallow load, if any.
    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }
}
