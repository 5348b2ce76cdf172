//! The table directory at the start of every font file

use font_types::{Tag, CFF_SFNT_VERSION, TRUE_SFNT_VERSION, TTC_HEADER_TAG, TT_SFNT_VERSION};
use indexmap::IndexMap;

use crate::{font_data::FontData, read::ReadError, source::ByteSource, Error};

pub(crate) const HEADER_LEN: usize = 12;
pub(crate) const TABLE_RECORD_LEN: usize = 16;

/// Reasons a file cannot be interpreted as a font container.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ContainerError {
    #[error("file is too short to contain a table directory")]
    Truncated,
    #[error("unrecognized sfnt version 0x{0:08X}")]
    InvalidSfntVersion(u32),
    #[error("font collections are not supported")]
    Collection,
    #[error("table '{0}' is listed more than once")]
    DuplicateTag(Tag),
    #[error("table '{tag}' (offset {offset}, length {length}) extends past the end of the file")]
    RecordOutOfBounds { tag: Tag, offset: u32, length: u32 },
}

/// The location of one table within the file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TableRecord {
    pub tag: Tag,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

/// The parsed [table directory] of a font file.
///
/// Records are kept in the order they appear in the file.
///
/// [table directory]: https://learn.microsoft.com/en-us/typography/opentype/spec/otff#table-directory
#[derive(Clone, Debug, Default)]
pub struct TableDirectory {
    sfnt_version: u32,
    records: IndexMap<Tag, TableRecord>,
}

impl TableDirectory {
    /// Parse the directory at the start of `source`.
    pub fn read(source: &mut dyn ByteSource) -> Result<Self, Error> {
        let file_len = source.byte_len()?;
        if file_len < HEADER_LEN as u64 {
            return Err(ContainerError::Truncated.into());
        }
        let header = source.read_range(0, HEADER_LEN)?;
        let header = FontData::new(&header);
        let sfnt_version: u32 = header.read_at(0).map_err(truncated)?;
        if sfnt_version == TTC_HEADER_TAG.to_u32() {
            return Err(ContainerError::Collection.into());
        }
        if ![TT_SFNT_VERSION, TRUE_SFNT_VERSION, CFF_SFNT_VERSION].contains(&sfnt_version) {
            return Err(ContainerError::InvalidSfntVersion(sfnt_version).into());
        }
        let num_tables: u16 = header.read_at(4).map_err(truncated)?;
        let records_len = num_tables as usize * TABLE_RECORD_LEN;
        if ((HEADER_LEN + records_len) as u64) > file_len {
            return Err(ContainerError::Truncated.into());
        }
        let raw_records = source.read_range(HEADER_LEN as u64, records_len)?;
        let mut cursor = FontData::new(&raw_records).cursor();

        let mut records = IndexMap::with_capacity(num_tables as usize);
        for _ in 0..num_tables {
            let record = TableRecord {
                tag: cursor.read().map_err(truncated)?,
                checksum: cursor.read().map_err(truncated)?,
                offset: cursor.read().map_err(truncated)?,
                length: cursor.read().map_err(truncated)?,
            };
            if record.offset as u64 + record.length as u64 > file_len {
                return Err(ContainerError::RecordOutOfBounds {
                    tag: record.tag,
                    offset: record.offset,
                    length: record.length,
                }
                .into());
            }
            if records.insert(record.tag, record).is_some() {
                return Err(ContainerError::DuplicateTag(record.tag).into());
            }
        }
        log::debug!(
            "read table directory: version 0x{sfnt_version:08X}, {} tables",
            records.len()
        );
        Ok(TableDirectory {
            sfnt_version,
            records,
        })
    }

    pub fn sfnt_version(&self) -> u32 {
        self.sfnt_version
    }

    pub fn get(&self, tag: Tag) -> Option<&TableRecord> {
        self.records.get(&tag)
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.records.contains_key(&tag)
    }

    /// Records in file order.
    pub fn records(&self) -> impl Iterator<Item = &TableRecord> + '_ {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn truncated(_: ReadError) -> Error {
    ContainerError::Truncated.into()
}

/// Calculate a [table checksum].
///
/// The data is treated as a sequence of big-endian `u32`s, with a short final
/// chunk padded with zeros.
///
/// [table checksum]: https://learn.microsoft.com/en-us/typography/opentype/spec/otff#calculating-checksums
pub fn compute_checksum(table: &[u8]) -> u32 {
    let mut chunks = table.chunks_exact(4);
    let mut sum = 0u32;
    for chunk in chunks.by_ref() {
        let word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        sum = sum.wrapping_add(word);
    }
    let rem = chunks.remainder();
    if !rem.is_empty() {
        let mut last = [0u8; 4];
        last[..rem.len()].copy_from_slice(rem);
        sum = sum.wrapping_add(u32::from_be_bytes(last));
    }
    sum
}
