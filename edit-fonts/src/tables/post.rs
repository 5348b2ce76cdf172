//! The [post (PostScript)][post] table
//!
//! [post]: https://docs.microsoft.com/en-us/typography/opentype/spec/post

use font_types::{Fixed, Tag, Version16Dot16};

use super::FontTable;
use crate::{
    font_data::FontData,
    read::ReadError,
    registry::LoadContext,
    write::{EncodeError, FontWrite, TableWriter},
    Error,
};

/// The [post] table.
///
/// Glyph names (in versions 2.0 and 2.5) are kept as bytes.
///
/// [post]: https://docs.microsoft.com/en-us/typography/opentype/spec/post
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Post {
    pub version: Version16Dot16,
    pub italic_angle: Fixed,
    pub underline_position: i16,
    pub underline_thickness: i16,
    pub is_fixed_pitch: u32,
    pub min_mem_type42: u32,
    pub max_mem_type42: u32,
    pub min_mem_type1: u32,
    pub max_mem_type1: u32,
    /// Everything after the header.
    pub glyph_names: Vec<u8>,
}

impl Default for Post {
    fn default() -> Self {
        Post {
            version: Version16Dot16::VERSION_3_0,
            italic_angle: Fixed::ZERO,
            underline_position: 0,
            underline_thickness: 0,
            is_fixed_pitch: 0,
            min_mem_type42: 0,
            max_mem_type42: 0,
            min_mem_type1: 0,
            max_mem_type1: 0,
            glyph_names: Vec::new(),
        }
    }
}

impl FontTable for Post {
    const TAG: Tag = Tag::new(b"post");

    type Args = ();

    fn read_args(_ctx: &mut LoadContext) -> Result<(), Error> {
        Ok(())
    }

    fn decode(data: FontData, _args: &()) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        Ok(Post {
            version: cursor.read()?,
            italic_angle: cursor.read()?,
            underline_position: cursor.read()?,
            underline_thickness: cursor.read()?,
            is_fixed_pitch: cursor.read()?,
            min_mem_type42: cursor.read()?,
            max_mem_type42: cursor.read()?,
            min_mem_type1: cursor.read()?,
            max_mem_type1: cursor.read()?,
            glyph_names: cursor.remaining().to_vec(),
        })
    }

    fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut writer = TableWriter::default();
        self.version.write_into(&mut writer);
        self.italic_angle.write_into(&mut writer);
        self.underline_position.write_into(&mut writer);
        self.underline_thickness.write_into(&mut writer);
        [
            self.is_fixed_pitch,
            self.min_mem_type42,
            self.max_mem_type42,
            self.min_mem_type1,
            self.max_mem_type1,
        ]
        .write_into(&mut writer);
        writer.write_slice(&self.glyph_names);
        Ok(writer.into_data())
    }

    any_table_conversions!(Post);
}

#[cfg(test)]
mod tests {
    use font_test_data::ttf;

    use super::*;

    #[test]
    fn decode_fixture() {
        let data = ttf::post();
        let post = Post::decode(FontData::new(&data), &()).unwrap();
        assert_eq!(post.version, Version16Dot16::VERSION_3_0);
        assert_eq!(post.underline_position, -75);
        assert!(post.glyph_names.is_empty());
        assert_eq!(post.encode().unwrap(), data.as_slice());
    }

    #[test]
    fn names_are_kept() {
        let post = Post {
            version: Version16Dot16::VERSION_2_0,
            glyph_names: vec![0, 1, 0, 0],
            ..Default::default()
        };
        let dumped = post.encode().unwrap();
        assert_eq!(dumped.len(), 36);
        assert_eq!(Post::decode(FontData::new(&dumped), &()).unwrap(), post);
    }
}
