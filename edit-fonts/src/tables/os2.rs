//! The [OS/2 (OS/2 and Windows Metrics)][os2] table
//!
//! [os2]: https://docs.microsoft.com/en-us/typography/opentype/spec/os2

use font_types::Tag;

use super::{hmtx::Hmtx, FontTable};
use crate::{
    font_data::FontData,
    read::ReadError,
    registry::{LoadContext, UpdateContext},
    write::{EncodeError, FontWrite, TableWriter},
    Error,
};

/// The [OS/2] table.
///
/// The leading fields are decoded; everything after `fs_type` is kept as
/// bytes and written back unchanged.
///
/// [OS/2]: https://docs.microsoft.com/en-us/typography/opentype/spec/os2
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Os2 {
    pub version: u16,
    /// The average advance width of all glyphs with a non-zero advance.
    pub x_avg_char_width: i16,
    pub us_weight_class: u16,
    pub us_width_class: u16,
    pub fs_type: u16,
    /// The rest of the table, starting at `ySubscriptXSize`.
    pub remainder: Vec<u8>,
}

impl Os2 {
    /// The size of a complete version 0 table.
    pub const VERSION_0_LEN: usize = 78;
}

impl FontTable for Os2 {
    const TAG: Tag = Tag::new(b"OS/2");
    const UPSTREAM: &'static [Tag] = &[Hmtx::TAG];
    const RECOMPUTES: bool = true;

    type Args = ();

    fn read_args(_ctx: &mut LoadContext) -> Result<(), Error> {
        Ok(())
    }

    fn decode(data: FontData, _args: &()) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        Ok(Os2 {
            version: cursor.read()?,
            x_avg_char_width: cursor.read()?,
            us_weight_class: cursor.read()?,
            us_width_class: cursor.read()?,
            fs_type: cursor.read()?,
            remainder: cursor.remaining().to_vec(),
        })
    }

    fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut writer = TableWriter::default();
        self.version.write_into(&mut writer);
        self.x_avg_char_width.write_into(&mut writer);
        self.us_weight_class.write_into(&mut writer);
        self.us_width_class.write_into(&mut writer);
        self.fs_type.write_into(&mut writer);
        writer.write_slice(&self.remainder);
        Ok(writer.into_data())
    }

    /// `xAvgCharWidth` is the rounded mean of all non-zero advances.
    fn recompute(&mut self, ctx: &mut UpdateContext) -> Result<(), Error> {
        let Some(hmtx) = ctx.table::<Hmtx>()? else {
            return Ok(());
        };
        let (sum, count) = hmtx
            .iter()
            .filter(|metric| metric.advance != 0)
            .fold((0u64, 0u64), |(sum, count), metric| {
                (sum + metric.advance as u64, count + 1)
            });
        if count > 0 {
            let avg = (sum as f64 / count as f64).round();
            self.x_avg_char_width = avg.min(i16::MAX as f64) as i16;
        }
        Ok(())
    }

    any_table_conversions!(Os2);
}

#[cfg(test)]
mod tests {
    use font_test_data::ttf;

    use super::*;

    #[test]
    fn decode_fixture() {
        let data = ttf::os2();
        let os2 = Os2::decode(FontData::new(&data), &()).unwrap();
        assert_eq!(os2.version, 0);
        assert_eq!(os2.x_avg_char_width, 575);
        assert_eq!(os2.us_weight_class, 400);
        assert_eq!(os2.remainder.len(), Os2::VERSION_0_LEN - 10);
        assert_eq!(os2.encode().unwrap(), data.as_slice());
    }

    #[test]
    fn truncated() {
        let data = [0u8; 6];
        assert!(matches!(
            Os2::decode(FontData::new(&data), &()),
            Err(ReadError::OutOfBounds)
        ));
    }
}
