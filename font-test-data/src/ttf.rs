//! A small, hand-assembled TrueType font.
//!
//! The font has four glyphs:
//!
//! | gid | name   | outline                       | advance | cmap   |
//! |-----|--------|-------------------------------|---------|--------|
//! | 0   | .notdef| rectangle (50, 0)..(450, 700) | 500     |        |
//! | 1   | A      | triangle (0, 0)..(500, 700)   | 600     | U+0041 |
//! | 2   | Aacute | composite of glyph 1          | 600     | U+00C1 |
//! | 3   | space  | empty                         | 600     | U+0020 |
//!
//! All derived values (bounding boxes, `hhea` extents, `maxp` maxima,
//! `xAvgCharWidth`) are consistent with the outlines and metrics, and the
//! file carries correct checksums. Table bodies are laid out in the
//! recommended TrueType order rather than in tag order.

use font_types::{Fixed, LongDateTime, MajorMinor, Tag, Version16Dot16};

use crate::bebuffer::BeBuffer;

pub const NUM_GLYPHS: u16 = 4;
pub const UNITS_PER_EM: u16 = 1000;

pub const HEAD: Tag = Tag::new(b"head");
pub const HHEA: Tag = Tag::new(b"hhea");
pub const MAXP: Tag = Tag::new(b"maxp");
pub const OS2: Tag = Tag::new(b"OS/2");
pub const HMTX: Tag = Tag::new(b"hmtx");
pub const CMAP: Tag = Tag::new(b"cmap");
pub const LOCA: Tag = Tag::new(b"loca");
pub const GLYF: Tag = Tag::new(b"glyf");
pub const NAME: Tag = Tag::new(b"name");
pub const POST: Tag = Tag::new(b"post");

const ON_CURVE: u8 = 0x01;

/// The complete font file.
pub fn simple_font() -> Vec<u8> {
    assemble(&tables())
}

/// The tables of [`simple_font`], in file order.
pub fn tables() -> Vec<(Tag, Vec<u8>)> {
    vec![
        (HEAD, head().into_vec()),
        (HHEA, hhea().into_vec()),
        (MAXP, maxp().into_vec()),
        (OS2, os2().into_vec()),
        (HMTX, hmtx().into_vec()),
        (CMAP, cmap().into_vec()),
        (LOCA, loca().into_vec()),
        (GLYF, glyf().into_vec()),
        (NAME, name().into_vec()),
        (POST, post().into_vec()),
    ]
}

/// Build a font file from tables, in the given body order.
///
/// The directory is sorted by tag, each table is padded to four bytes and
/// `head.checkSumAdjustment` is filled in if a `head` table is present.
pub fn assemble(tables: &[(Tag, Vec<u8>)]) -> Vec<u8> {
    let header_len = 12 + 16 * tables.len();
    let mut offsets = Vec::with_capacity(tables.len());
    let mut pos = header_len;
    for (_, data) in tables {
        offsets.push(pos);
        pos += (data.len() + 3) & !3;
    }

    let mut records: Vec<_> = tables
        .iter()
        .zip(&offsets)
        .map(|((tag, data), offset)| (*tag, checksum(data), *offset as u32, data.len() as u32))
        .collect();
    records.sort_by_key(|(tag, ..)| *tag);

    let n = tables.len() as u16;
    let entry_selector = if n == 0 { 0 } else { 15 - n.leading_zeros() as u16 };
    let search_range = (1u16 << entry_selector) * 16;
    let mut buf = BeBuffer::new()
        .push(0x0001_0000u32)
        .push(n)
        .push(search_range)
        .push(entry_selector)
        .push(n * 16 - search_range);
    for (tag, checksum, offset, length) in records {
        buf = buf.push(tag).push(checksum).push(offset).push(length);
    }
    for (_, data) in tables {
        buf = buf.extend_bytes(data).align(4);
    }

    let mut font = buf.into_vec();
    if let Some(i) = tables.iter().position(|(tag, _)| *tag == HEAD) {
        let adjustment_pos = offsets[i] + 8;
        let adjustment = 0xB1B0_AFBAu32.wrapping_sub(checksum(&font));
        font[adjustment_pos..adjustment_pos + 4].copy_from_slice(&adjustment.to_be_bytes());
    }
    font
}

/// Sum of big-endian u32 words, with the tail padded with zeros.
pub fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

pub fn head() -> BeBuffer {
    BeBuffer::new()
        .push(MajorMinor::VERSION_1_0)
        .push(Fixed::ONE) // fontRevision
        .push(0u32) // checkSumAdjustment
        .push(0x5F0F_3CF5u32) // magicNumber
        .push(0x000Bu16) // flags
        .push(UNITS_PER_EM)
        .push(LongDateTime::new(3_600_000_000)) // created
        .push(LongDateTime::new(3_600_000_000)) // modified
        .extend([0i16, 0, 500, 700]) // xMin, yMin, xMax, yMax
        .push(0u16) // macStyle
        .push(8u16) // lowestRecPPEM
        .push(2i16) // fontDirectionHint
        .push(0i16) // indexToLocFormat: short
        .push(0i16) // glyphDataFormat
}

pub fn hhea() -> BeBuffer {
    BeBuffer::new()
        .push(MajorMinor::VERSION_1_0)
        .push(800i16) // ascender
        .push(-200i16) // descender
        .push(0i16) // lineGap
        .push(600u16) // advanceWidthMax
        .push(0i16) // minLeftSideBearing
        .push(50i16) // minRightSideBearing
        .push(500i16) // xMaxExtent
        .push(1i16) // caretSlopeRise
        .push(0i16) // caretSlopeRun
        .push(0i16) // caretOffset
        .extend([0i16; 4]) // reserved
        .push(0i16) // metricDataFormat
        .push(3u16) // numberOfHMetrics
}

pub fn maxp() -> BeBuffer {
    BeBuffer::new()
        .push(Version16Dot16::VERSION_1_0)
        .push(NUM_GLYPHS)
        .push(4u16) // maxPoints
        .push(1u16) // maxContours
        .push(3u16) // maxCompositePoints
        .push(1u16) // maxCompositeContours
        .push(2u16) // maxZones
        .push(0u16) // maxTwilightPoints
        .push(0u16) // maxStorage
        .push(0u16) // maxFunctionDefs
        .push(0u16) // maxInstructionDefs
        .push(0u16) // maxStackElements
        .push(0u16) // maxSizeOfInstructions
        .push(1u16) // maxComponentElements
        .push(1u16) // maxComponentDepth
}

/// A version 0 `OS/2` table (78 bytes).
pub fn os2() -> BeBuffer {
    BeBuffer::new()
        .push(0u16) // version
        .push(575i16) // xAvgCharWidth
        .push(400u16) // usWeightClass
        .push(5u16) // usWidthClass
        .push(0u16) // fsType
        .extend([650i16, 600, 0, 75]) // subscript size and offset
        .extend([650i16, 600, 0, 350]) // superscript size and offset
        .push(50i16) // yStrikeoutSize
        .push(300i16) // yStrikeoutPosition
        .push(0i16) // sFamilyClass
        .extend([0u8; 10]) // panose
        .extend([0u32; 4]) // ulUnicodeRange1-4
        .push(Tag::new(b"NONE")) // achVendID
        .push(0x0040u16) // fsSelection: REGULAR
        .push(0x0020u16) // usFirstCharIndex
        .push(0x00C1u16) // usLastCharIndex
        .push(800i16) // sTypoAscender
        .push(-200i16) // sTypoDescender
        .push(0i16) // sTypoLineGap
        .push(800u16) // usWinAscent
        .push(200u16) // usWinDescent
}

pub fn hmtx() -> BeBuffer {
    BeBuffer::new()
        .extend([500u16, 50, 600, 0, 600, 0]) // three long metrics
        .push(0i16) // lsb of glyph 3
}

/// Format 4 subtable shared by the (0, 3) and (3, 1) encoding records.
pub fn cmap() -> BeBuffer {
    BeBuffer::new()
        .push(0u16) // version
        .push(2u16) // numTables
        .extend([0u16, 3])
        .push(20u32)
        .extend([3u16, 1])
        .push(20u32)
        // format 4
        .push(4u16)
        .push(48u16) // length
        .push(0u16) // language
        .push(8u16) // segCountX2
        .push(8u16) // searchRange
        .push(2u16) // entrySelector
        .push(0u16) // rangeShift
        .extend([0x20u16, 0x41, 0xC1, 0xFFFF]) // endCode
        .push(0u16) // reservedPad
        .extend([0x20u16, 0x41, 0xC1, 0xFFFF]) // startCode
        .extend([3i16 - 0x20, 1 - 0x41, 2 - 0xC1, 1]) // idDelta
        .extend([0u16; 4]) // idRangeOffset
}

pub fn loca() -> BeBuffer {
    BeBuffer::new().extend([0u16, 17, 32, 41, 41])
}

pub fn glyf() -> BeBuffer {
    BeBuffer::new()
        // .notdef
        .push(1i16)
        .extend([50i16, 0, 450, 700])
        .push(3u16) // endPtsOfContours
        .push(0u16) // instructionLength
        .extend([ON_CURVE; 4])
        .extend([50i16, 400, 0, -400])
        .extend([0i16, 0, 700, 0])
        // A
        .push(1i16)
        .extend([0i16, 0, 500, 700])
        .push(2u16)
        .push(0u16)
        .extend([ON_CURVE; 3])
        .extend([0i16, 500, -250])
        .extend([0i16, 0, 700])
        .align(2)
        // Aacute
        .push(-1i16)
        .extend([0i16, 0, 500, 700])
        .push(0x0003u16) // ARG_1_AND_2_ARE_WORDS | ARGS_ARE_XY_VALUES
        .push(1u16) // glyphIndex
        .extend([0i16, 0])
    // space has no outline
}

/// Windows English names for family and subfamily.
pub fn name() -> BeBuffer {
    let family = utf16be("Test");
    let subfamily = utf16be("Regular");
    BeBuffer::new()
        .push(0u16) // version
        .push(2u16) // count
        .push(30u16) // storageOffset
        .extend([3u16, 1, 0x409, 1])
        .push(family.len() as u16)
        .push(0u16)
        .extend([3u16, 1, 0x409, 2])
        .push(subfamily.len() as u16)
        .push(family.len() as u16)
        .extend_bytes(&family)
        .extend_bytes(&subfamily)
}

pub fn post() -> BeBuffer {
    BeBuffer::new()
        .push(Version16Dot16::VERSION_3_0)
        .push(Fixed::ZERO) // italicAngle
        .push(-75i16) // underlinePosition
        .push(50i16) // underlineThickness
        .extend([0u32; 5]) // isFixedPitch, min/max mem
}

fn utf16be(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_be_bytes).collect()
}
