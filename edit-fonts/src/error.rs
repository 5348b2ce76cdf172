//! The error type for font operations

use font_types::Tag;

use crate::{
    directory::ContainerError, graph::GraphError, read::ReadError, validate::ValidationReport,
    write::EncodeError,
};

/// Errors that can occur when loading, updating or writing a font.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The byte source could not be read, or the sink could not be written.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// The file does not have a valid table directory.
    #[error("malformed font container: {0}")]
    MalformedContainer(#[from] ContainerError),
    /// A table's bytes could not be decoded.
    ///
    /// Only this table is affected; it keeps its raw bytes and decoding can
    /// be retried.
    #[error("failed to decode '{tag}' table: {reason}")]
    TableDecode { tag: Tag, reason: ReadError },
    /// A table required for writing is absent.
    #[error("font has no '{0}' table")]
    IncompleteFont(Tag),
    /// A recompute step dirtied a table that had already been updated in
    /// the same pass.
    ///
    /// This indicates an error in the dependency declarations.
    #[error("recomputing '{recomputed}' dirtied '{dirtied}', which was already updated")]
    OrderingViolation { recomputed: Tag, dirtied: Tag },
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// Structured access to a table that is not in the font.
    #[error("no '{0}' table in font")]
    MissingTable(Tag),
    /// Typed access to a table holding data of a different family.
    #[error("'{tag}' table does not contain {expected} data")]
    WrongFamily { tag: Tag, expected: &'static str },
    /// A table was accessed while its own recompute step was running.
    #[error("'{0}' table is being recomputed")]
    TableBusy(Tag),
    /// A table's data cannot be represented in the binary format.
    #[error("failed to encode '{tag}' table: {reason}")]
    Encode { tag: Tag, reason: EncodeError },
    /// The optional validation pass found problems.
    #[error("{0}")]
    ValidationFailed(ValidationReport),
}
