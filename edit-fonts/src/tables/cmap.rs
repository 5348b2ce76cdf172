//! the [cmap] table
//!
//! [cmap]: https://docs.microsoft.com/en-us/typography/opentype/spec/cmap

use std::collections::BTreeMap;

use font_types::{GlyphId, Tag};

use super::FontTable;
use crate::{
    font_builder::SearchRange,
    font_data::FontData,
    read::ReadError,
    registry::LoadContext,
    write::{EncodeError, FontWrite, TableWriter},
    Error,
};

// https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#windows-platform-platform-id--3
const WINDOWS_PLATFORM: u16 = 3;
const WINDOWS_BMP_ENCODING: u16 = 1;
const WINDOWS_FULL_REPERTOIRE_ENCODING: u16 = 10;

// https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#unicode-platform-platform-id--0
const UNICODE_PLATFORM: u16 = 0;
const UNICODE_BMP_ENCODING: u16 = 3;
const UNICODE_FULL_REPERTOIRE_ENCODING: u16 = 4;

const MAX_CODEPOINT: u32 = 0x10FFFF;

/// The [cmap] table, as a map from Unicode codepoints to glyphs.
///
/// Only Unicode subtables (platform 0, and Windows encodings 1 and 10) in
/// formats 4 and 12 are read. When the table is written it contains a
/// format 4 subtable for the Basic Multilingual Plane and, if needed, a
/// format 12 subtable for the full repertoire, shared between the Unicode
/// and Windows platforms.
///
/// A codepoint mapped explicitly to `.notdef` (glyph 0) is kept, and is
/// distinct from an unmapped codepoint.
///
/// [cmap]: https://docs.microsoft.com/en-us/typography/opentype/spec/cmap
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cmap {
    mappings: BTreeMap<u32, GlyphId>,
}

impl Cmap {
    pub fn from_mappings(mappings: impl IntoIterator<Item = (u32, GlyphId)>) -> Self {
        Cmap {
            mappings: mappings.into_iter().collect(),
        }
    }

    /// The glyph for a codepoint.
    pub fn map(&self, codepoint: u32) -> Option<GlyphId> {
        self.mappings.get(&codepoint).copied()
    }

    /// Map a codepoint to a glyph, returning the previous glyph.
    pub fn insert(&mut self, codepoint: u32, gid: GlyphId) -> Option<GlyphId> {
        self.mappings.insert(codepoint, gid)
    }

    pub fn remove(&mut self, codepoint: u32) -> Option<GlyphId> {
        self.mappings.remove(&codepoint)
    }

    /// All mappings, in codepoint order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, GlyphId)> + '_ {
        self.mappings.iter().map(|(cp, gid)| (*cp, *gid))
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    fn read_subtable(&mut self, data: FontData) -> Result<(), ReadError> {
        let format: u16 = data.read_at(0)?;
        match format {
            4 => self.read_format_4(data),
            12 => self.read_format_12(data),
            other => {
                log::warn!("skipping unsupported cmap subtable format {other}");
                Ok(())
            }
        }
    }

    fn read_format_4(&mut self, data: FontData) -> Result<(), ReadError> {
        let seg_count = data.read_at::<u16>(6)? as usize / 2;
        let end_codes: Vec<u16> = data.read_array(14, seg_count)?;
        let start_codes: Vec<u16> = data.read_array(16 + 2 * seg_count, seg_count)?;
        let id_deltas: Vec<i16> = data.read_array(16 + 4 * seg_count, seg_count)?;
        let range_offsets_pos = 16 + 6 * seg_count;
        let id_range_offsets: Vec<u16> = data.read_array(range_offsets_pos, seg_count)?;

        for (i, (start, end)) in start_codes.iter().zip(&end_codes).enumerate() {
            if *start == 0xFFFF || start > end {
                continue;
            }
            let delta = id_deltas[i];
            let range_offset = id_range_offsets[i] as usize;
            for cp in *start..=*end {
                let gid = if range_offset == 0 {
                    cp.wrapping_add_signed(delta)
                } else {
                    let pos = range_offsets_pos
                        + 2 * i
                        + range_offset
                        + 2 * (cp - start) as usize;
                    // zero in glyphIdArray means the codepoint is not mapped
                    match data.read_at::<u16>(pos)? {
                        0 => continue,
                        gid => gid.wrapping_add_signed(delta),
                    }
                };
                self.mappings.entry(cp as u32).or_insert(GlyphId::new(gid));
            }
        }
        Ok(())
    }

    fn read_format_12(&mut self, data: FontData) -> Result<(), ReadError> {
        let num_groups = data.read_at::<u32>(12)? as usize;
        let groups: Vec<u32> = data.read_array(16, num_groups.saturating_mul(3))?;
        for group in groups.chunks_exact(3) {
            let (start, end, start_gid) = (group[0], group[1].min(MAX_CODEPOINT), group[2]);
            for cp in start..=end {
                let Ok(gid) = u16::try_from(start_gid as u64 + (cp - start) as u64) else {
                    break;
                };
                self.mappings.entry(cp).or_insert(GlyphId::new(gid));
            }
        }
        Ok(())
    }

    /// A format 4 subtable for the codepoints in the BMP, if there are any.
    fn create_format_4(&self) -> Result<Option<Vec<u8>>, EncodeError> {
        let mut end_code = Vec::new();
        let mut start_code = Vec::new();
        let mut id_deltas = Vec::new();

        let mut prev: Option<(u16, u16)> = None;
        for (cp, gid) in self.mappings.range(..=0xFFFF) {
            let current = (*cp as u16, gid.to_u16());
            let next_in_run = prev.and_then(|(cp, gid)| Some((cp.checked_add(1)?, gid.checked_add(1)?)));
            match end_code.last_mut() {
                Some(last) if next_in_run == Some(current) => *last = current.0,
                _ => {
                    start_code.push(current.0);
                    end_code.push(current.0);
                    id_deltas.push(current.1.wrapping_sub(current.0) as i16);
                }
            }
            prev = Some(current);
        }

        if start_code.is_empty() {
            return Ok(None);
        }
        // close out
        if end_code.last() != Some(&0xFFFF) {
            start_code.push(0xFFFF);
            end_code.push(0xFFFF);
            id_deltas.push(1);
        }

        let seg_count = u16::try_from(start_code.len())
            .map_err(|_| EncodeError("too many cmap format 4 segments"))?;
        let length = u16::try_from(16 + 8 * seg_count as usize)
            .map_err(|_| EncodeError("cmap format 4 subtable overflows"))?;
        let computed = SearchRange::compute(seg_count as usize, 2);

        let mut writer = TableWriter::default();
        4u16.write_into(&mut writer);
        length.write_into(&mut writer);
        0u16.write_into(&mut writer); // language
        (seg_count * 2).write_into(&mut writer);
        computed.search_range.write_into(&mut writer);
        computed.entry_selector.write_into(&mut writer);
        computed.range_shift.write_into(&mut writer);
        end_code.write_into(&mut writer);
        0u16.write_into(&mut writer); // reservedPad
        start_code.write_into(&mut writer);
        id_deltas.write_into(&mut writer);
        // our idRangeOffsets are all 0, so glyphIdArray is unused
        vec![0u16; seg_count as usize].write_into(&mut writer);
        Ok(Some(writer.into_data()))
    }

    /// A format 12 subtable covering every codepoint.
    fn create_format_12(&self) -> Vec<u8> {
        let mut groups: Vec<(u32, u32, u32)> = Vec::new();
        for (cp, gid) in self.iter() {
            let gid = gid.to_u16() as u32;
            match groups.last_mut() {
                Some((start, end, start_gid))
                    if *end + 1 == cp && *start_gid + (cp - *start) == gid =>
                {
                    *end = cp
                }
                _ => groups.push((cp, cp, gid)),
            }
        }

        let mut writer = TableWriter::default();
        12u16.write_into(&mut writer);
        0u16.write_into(&mut writer); // reserved
        (16 + 12 * groups.len() as u32).write_into(&mut writer);
        0u32.write_into(&mut writer); // language
        (groups.len() as u32).write_into(&mut writer);
        for (start, end, gid) in groups {
            [start, end, gid].write_into(&mut writer);
        }
        writer.into_data()
    }
}

impl FontTable for Cmap {
    const TAG: Tag = Tag::new(b"cmap");

    type Args = ();

    fn read_args(_ctx: &mut LoadContext) -> Result<(), Error> {
        Ok(())
    }

    fn decode(data: FontData, _args: &()) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let _version: u16 = cursor.read()?;
        let num_tables: u16 = cursor.read()?;
        let mut offsets = Vec::new();
        for _ in 0..num_tables {
            let platform: u16 = cursor.read()?;
            let encoding: u16 = cursor.read()?;
            let offset: u32 = cursor.read()?;
            let is_unicode = platform == UNICODE_PLATFORM
                || (platform == WINDOWS_PLATFORM
                    && matches!(
                        encoding,
                        WINDOWS_BMP_ENCODING | WINDOWS_FULL_REPERTOIRE_ENCODING
                    ));
            if !is_unicode {
                log::debug!("ignoring cmap subtable ({platform}, {encoding})");
            } else if !offsets.contains(&offset) {
                offsets.push(offset);
            }
        }

        let mut cmap = Cmap::default();
        for offset in offsets {
            let subtable = data
                .split_off(offset as usize)
                .ok_or(ReadError::OutOfBounds)?;
            cmap.read_subtable(subtable)?;
        }
        Ok(cmap)
    }

    fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        if self.mappings.keys().any(|cp| *cp > MAX_CODEPOINT) {
            return Err(EncodeError("codepoint beyond U+10FFFF"));
        }
        let bmp = self.create_format_4()?;
        let full = self
            .mappings
            .range(0x10000..)
            .next()
            .map(|_| self.create_format_12());

        let mut records = Vec::new();
        let mut subtables = Vec::new();
        let num_records = 2 * (bmp.is_some() as u32 + full.is_some() as u32);
        let mut offset = 4 + 8 * num_records;
        let bmp_offset = bmp.as_ref().map(|data| {
            let this = offset;
            offset += data.len() as u32;
            this
        });
        let full_offset = full.as_ref().map(|_| offset);

        // in order of (platform id, encoding id)
        if let Some(off) = bmp_offset {
            records.push((UNICODE_PLATFORM, UNICODE_BMP_ENCODING, off));
        }
        if let Some(off) = full_offset {
            records.push((UNICODE_PLATFORM, UNICODE_FULL_REPERTOIRE_ENCODING, off));
        }
        if let Some(off) = bmp_offset {
            records.push((WINDOWS_PLATFORM, WINDOWS_BMP_ENCODING, off));
        }
        if let Some(off) = full_offset {
            records.push((WINDOWS_PLATFORM, WINDOWS_FULL_REPERTOIRE_ENCODING, off));
        }
        subtables.extend(bmp);
        subtables.extend(full);

        let mut writer = TableWriter::default();
        0u16.write_into(&mut writer); // version
        (records.len() as u16).write_into(&mut writer);
        for (platform, encoding, offset) in records {
            platform.write_into(&mut writer);
            encoding.write_into(&mut writer);
            offset.write_into(&mut writer);
        }
        for subtable in subtables {
            writer.write_slice(&subtable);
        }
        Ok(writer.into_data())
    }

    any_table_conversions!(Cmap);
}

#[cfg(test)]
mod tests {
    use font_test_data::{bebuffer::BeBuffer, ttf};
    use pretty_assertions::assert_eq;

    use super::*;

    fn gid(raw: u16) -> GlyphId {
        GlyphId::new(raw)
    }

    #[test]
    fn decode_fixture() {
        let data = ttf::cmap();
        let cmap = Cmap::decode(FontData::new(&data), &()).unwrap();
        assert_eq!(cmap.len(), 3);
        assert_eq!(cmap.map(0x41), Some(gid(1)));
        assert_eq!(cmap.map(0xC1), Some(gid(2)));
        assert_eq!(cmap.map(0x20), Some(gid(3)));
        assert_eq!(cmap.map(0x42), None);
    }

    #[test]
    fn encode_matches_fixture() {
        let data = ttf::cmap();
        let cmap = Cmap::decode(FontData::new(&data), &()).unwrap();
        assert_eq!(cmap.encode().unwrap(), data.as_slice());
    }

    #[test]
    fn runs_share_segments() {
        let cmap = Cmap::from_mappings((0x61..=0x7A).map(|cp| (cp, gid(cp as u16 - 0x60))));
        let dumped = cmap.encode().unwrap();
        // one segment plus the closing one
        let seg_count_x2 = u16::from_be_bytes([dumped[20 + 6], dumped[20 + 7]]);
        assert_eq!(seg_count_x2, 4);
        assert_eq!(Cmap::decode(FontData::new(&dumped), &()).unwrap(), cmap);
    }

    #[test]
    fn supplementary_codepoints() {
        let cmap = Cmap::from_mappings([(0x41, gid(1)), (0x1F600, gid(2)), (0x1F601, gid(3))]);
        let dumped = cmap.encode().unwrap();
        assert_eq!(u16::from_be_bytes([dumped[2], dumped[3]]), 4);
        let reloaded = Cmap::decode(FontData::new(&dumped), &()).unwrap();
        assert_eq!(reloaded, cmap);
    }

    #[test]
    fn only_supplementary() {
        let cmap = Cmap::from_mappings([(0x10000, gid(5))]);
        let dumped = cmap.encode().unwrap();
        assert_eq!(u16::from_be_bytes([dumped[2], dumped[3]]), 2);
        assert_eq!(Cmap::decode(FontData::new(&dumped), &()).unwrap(), cmap);
    }

    #[test]
    fn notdef_mappings_are_kept() {
        let cmap = Cmap::from_mappings([(0x20, gid(0)), (0x41, gid(1)), (0xA4A5E, gid(0))]);
        let dumped = cmap.encode().unwrap();
        let reloaded = Cmap::decode(FontData::new(&dumped), &()).unwrap();
        assert_eq!(reloaded.map(0x20), Some(GlyphId::NOTDEF));
        assert_eq!(reloaded.map(0xA4A5E), Some(GlyphId::NOTDEF));
        assert_eq!(reloaded.map(0x21), None);
        assert_eq!(reloaded, cmap);
    }

    #[test]
    fn range_offset_lookup() {
        // one segment 0x30..=0x31 using glyphIdArray, plus the closing segment
        let data = BeBuffer::new()
            .push(0u16)
            .push(1u16)
            .extend([3u16, 1])
            .push(12u32)
            .push(4u16) // format
            .push(36u16) // length
            .push(0u16)
            .push(4u16) // segCountX2
            .extend([4u16, 1, 0])
            .extend([0x31u16, 0xFFFF]) // endCode
            .push(0u16)
            .extend([0x30u16, 0xFFFF]) // startCode
            .extend([0i16, 1]) // idDelta
            .extend([4u16, 0]) // idRangeOffset: skip to glyphIdArray
            .extend([7u16, 0]); // glyphIdArray
        let cmap = Cmap::decode(FontData::new(&data), &()).unwrap();
        assert_eq!(cmap.map(0x30), Some(gid(7)));
        assert_eq!(cmap.map(0x31), None);
    }

    #[test]
    fn mac_subtables_are_skipped() {
        let data = BeBuffer::new()
            .push(0u16)
            .push(1u16)
            .extend([1u16, 0])
            .push(12u32)
            .push(0u16); // format 0, never read
        let cmap = Cmap::decode(FontData::new(&data), &()).unwrap();
        assert!(cmap.is_empty());
        assert!(cmap.encode().unwrap().len() == 4);
    }
}
