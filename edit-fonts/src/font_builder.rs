//!  Assembling tables into a font file

use std::borrow::Cow;

use font_types::{Tag, TT_SFNT_VERSION};

use crate::{
    directory::{compute_checksum, HEADER_LEN, TABLE_RECORD_LEN},
    tables::{head::Head, FontTable},
    write::{FontWrite, TableWriter},
};

const CHECKSUM_ADJUSTMENT_MAGIC: u32 = 0xB1B0_AFBA;
// offset of checkSumAdjustment in head
const CHECKSUM_ADJUSTMENT_POS: usize = 8;

/// Build a font file from some set of tables.
///
/// Table bodies are written in the order they were added; the directory
/// records are sorted by tag.
#[derive(Debug, Clone)]
pub struct FontBuilder<'a> {
    sfnt_version: u32,
    tables: Vec<(Tag, Cow<'a, [u8]>)>,
    keep_checksum_adjustment: bool,
}

/// The binary search parameters of the table directory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchRange {
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
}

impl SearchRange {
    /// Compute the fields for `n_items` records of `item_size` bytes.
    pub fn compute(n_items: usize, item_size: usize) -> Self {
        if n_items == 0 {
            return Self::default();
        }
        let entry_selector = n_items.ilog2() as usize;
        let search_range = (1 << entry_selector) * item_size;
        let range_shift = n_items * item_size - search_range;
        SearchRange {
            search_range: search_range.try_into().unwrap_or(u16::MAX),
            entry_selector: entry_selector as u16,
            range_shift: range_shift.try_into().unwrap_or(u16::MAX),
        }
    }
}

impl Default for FontBuilder<'_> {
    fn default() -> Self {
        Self::new(TT_SFNT_VERSION)
    }
}

impl<'a> FontBuilder<'a> {
    /// Create a new builder to compile a binary font
    pub fn new(sfnt_version: u32) -> Self {
        FontBuilder {
            sfnt_version,
            tables: Vec::new(),
            keep_checksum_adjustment: false,
        }
    }

    /// A builder method to add raw data for the provided tag
    ///
    /// Replaces any data previously added for this tag.
    pub fn add_raw(&mut self, tag: Tag, data: impl Into<Cow<'a, [u8]>>) -> &mut Self {
        let data = data.into();
        match self.tables.iter_mut().find(|(t, _)| *t == tag) {
            Some(existing) => existing.1 = data,
            None => self.tables.push((tag, data)),
        }
        self
    }

    /// Returns `true` if the builder contains a table with this tag.
    pub fn contains(&self, tag: Tag) -> bool {
        self.tables.iter().any(|(t, _)| *t == tag)
    }

    /// Write `head.checkSumAdjustment` as provided, rather than computing it.
    pub fn keep_checksum_adjustment(&mut self, keep: bool) -> &mut Self {
        self.keep_checksum_adjustment = keep;
        self
    }

    /// Assemble all the tables into a binary font file with a [Table Directory].
    ///
    /// [Table Directory]: https://learn.microsoft.com/en-us/typography/opentype/spec/otff#table-directory
    pub fn build(&self) -> Vec<u8> {
        let header_len = HEADER_LEN + self.tables.len() * TABLE_RECORD_LEN;

        let mut position = header_len as u32;
        let mut head_offset = None;
        let mut records: Vec<_> = self
            .tables
            .iter()
            .map(|(tag, data)| {
                let offset = position;
                let length = data.len() as u32;
                position += round4(data.len()) as u32;
                let checksum = if *tag == Head::TAG {
                    head_offset = Some(offset as usize);
                    head_checksum(data)
                } else {
                    compute_checksum(data)
                };
                (*tag, checksum, offset, length)
            })
            .collect();
        records.sort_by_key(|(tag, ..)| *tag);

        let computed = SearchRange::compute(records.len(), TABLE_RECORD_LEN);
        let mut writer = TableWriter::default();
        self.sfnt_version.write_into(&mut writer);
        (records.len() as u16).write_into(&mut writer);
        computed.search_range.write_into(&mut writer);
        computed.entry_selector.write_into(&mut writer);
        computed.range_shift.write_into(&mut writer);
        for (tag, checksum, offset, length) in &records {
            tag.write_into(&mut writer);
            checksum.write_into(&mut writer);
            offset.write_into(&mut writer);
            length.write_into(&mut writer);
        }

        let mut data = writer.into_data();
        for (_, table) in &self.tables {
            data.extend_from_slice(table);
            let rem = round4(table.len()) - table.len();
            let padding = [0u8; 4];
            data.extend_from_slice(&padding[..rem]);
        }

        if let (Some(head_offset), false) = (head_offset, self.keep_checksum_adjustment) {
            let pos = head_offset + CHECKSUM_ADJUSTMENT_POS;
            if let Some(field) = data.get_mut(pos..pos + 4) {
                field.copy_from_slice(&[0; 4]);
                let adjustment = CHECKSUM_ADJUSTMENT_MAGIC.wrapping_sub(compute_checksum(&data));
                data[pos..pos + 4].copy_from_slice(&adjustment.to_be_bytes());
            }
        }
        data
    }
}

/// <https://github.com/google/woff2/blob/a0d0ed7da27b708c0a4e96ad7a998bddc933c06e/src/round.h#L19>
fn round4(sz: usize) -> usize {
    (sz + 3) & !3
}

// The head checksum is computed with checkSumAdjustment set to zero.
fn head_checksum(head: &[u8]) -> u32 {
    let adjustment = head
        .get(CHECKSUM_ADJUSTMENT_POS..CHECKSUM_ADJUSTMENT_POS + 4)
        .map(compute_checksum)
        .unwrap_or(0);
    compute_checksum(head).wrapping_sub(adjustment)
}
