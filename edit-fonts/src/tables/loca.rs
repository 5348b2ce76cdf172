//! The [loca (Index to Location)][loca] table
//!
//! [loca]: https://docs.microsoft.com/en-us/typography/opentype/spec/loca

use font_types::Tag;

use super::{glyf::Glyf, head::Head, FontTable};
use crate::{
    font_data::FontData,
    read::ReadError,
    registry::{LoadContext, UpdateContext},
    write::{EncodeError, TableWriter},
    Error,
};

/// The [loca] table.
///
/// Offsets are always stored as byte offsets into `glyf`, and converted
/// when reading or writing the short format.
///
/// [loca]: https://docs.microsoft.com/en-us/typography/opentype/spec/loca
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Loca {
    offsets: Vec<u32>,
    format: LocaFormat,
}

/// Whether or not the 'loca' table uses short or long offsets.
///
/// This flag is stored in the 'head' table's [indexToLocFormat][locformat] field.
///
/// [locformat]: super::head::Head::index_to_loc_format
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LocaFormat {
    #[default]
    Short = 0,
    Long = 1,
}

impl LocaFormat {
    /// The smallest format that can represent these offsets.
    pub fn new(loca: &[u32]) -> LocaFormat {
        const MAX_SHORT_LOCA_VALUE: u32 = 0x20000;
        if loca.last().copied().unwrap_or_default() < MAX_SHORT_LOCA_VALUE
            && loca.iter().all(|offset| offset % 2 == 0)
        {
            LocaFormat::Short
        } else {
            LocaFormat::Long
        }
    }

    /// Interpret the `head.indexToLocFormat` field.
    pub fn from_head_field(value: i16) -> Option<LocaFormat> {
        match value {
            0 => Some(LocaFormat::Short),
            1 => Some(LocaFormat::Long),
            _ => None,
        }
    }
}

impl Loca {
    /// Create a new loca table from byte offsets.
    ///
    /// The format is the smallest one that fits.
    pub fn new(offsets: Vec<u32>) -> Self {
        let format = LocaFormat::new(&offsets);
        Loca { offsets, format }
    }

    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// Replace the offsets, choosing the format again.
    pub fn set_offsets(&mut self, offsets: Vec<u32>) {
        *self = Loca::new(offsets);
    }

    pub fn format(&self) -> LocaFormat {
        self.format
    }

    /// The number of glyphs these offsets describe.
    pub fn num_glyphs(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }
}

impl FontTable for Loca {
    const TAG: Tag = Tag::new(b"loca");
    const UPSTREAM: &'static [Tag] = &[Glyf::TAG];
    const RECOMPUTES: bool = true;

    type Args = LocaFormat;

    fn read_args(ctx: &mut LoadContext) -> Result<LocaFormat, Error> {
        let value = ctx.table::<Head>()?.index_to_loc_format;
        LocaFormat::from_head_field(value).ok_or(Error::TableDecode {
            tag: Self::TAG,
            reason: ReadError::InvalidFormat(value as i64),
        })
    }

    fn decode(data: FontData, format: &LocaFormat) -> Result<Self, ReadError> {
        let offsets = match format {
            LocaFormat::Short => {
                if data.len() % 2 != 0 {
                    return Err(ReadError::InvalidArrayLen);
                }
                data.read_array::<u16>(0, data.len() / 2)?
                    .into_iter()
                    .map(|off| off as u32 * 2)
                    .collect()
            }
            LocaFormat::Long => {
                if data.len() % 4 != 0 {
                    return Err(ReadError::InvalidArrayLen);
                }
                data.read_array::<u32>(0, data.len() / 4)?
            }
        };
        Ok(Loca {
            offsets,
            format: *format,
        })
    }

    fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut writer = TableWriter::default();
        match self.format {
            LocaFormat::Long => self.offsets.iter().for_each(|off| writer.write_scalar(*off)),
            LocaFormat::Short => {
                for off in &self.offsets {
                    if off % 2 != 0 || off / 2 > u16::MAX as u32 {
                        return Err(EncodeError("offset does not fit the short loca format"));
                    }
                    writer.write_scalar((off / 2) as u16);
                }
            }
        }
        Ok(writer.into_data())
    }

    /// The format is the smallest one that fits the offsets.
    fn recompute(&mut self, _ctx: &mut UpdateContext) -> Result<(), Error> {
        self.format = LocaFormat::new(&self.offsets);
        Ok(())
    }

    any_table_conversions!(Loca);
}

#[cfg(test)]
mod tests {
    use font_test_data::ttf;

    use super::*;

    #[test]
    fn decode_short() {
        let data = ttf::loca();
        let loca = Loca::decode(FontData::new(&data), &LocaFormat::Short).unwrap();
        assert_eq!(loca.offsets(), &[0, 34, 64, 82, 82]);
        assert_eq!(loca.num_glyphs(), 4);
        assert_eq!(loca.encode().unwrap(), data.as_slice());
    }

    #[test]
    fn odd_length_is_rejected() {
        let data = [0u8, 0, 0];
        assert!(matches!(
            Loca::decode(FontData::new(&data), &LocaFormat::Short),
            Err(ReadError::InvalidArrayLen)
        ));
    }

    #[test]
    fn format_choice() {
        assert_eq!(LocaFormat::new(&[0, 2, 4]), LocaFormat::Short);
        assert_eq!(LocaFormat::new(&[0, 3]), LocaFormat::Long);
        assert_eq!(LocaFormat::new(&[0, 0x20000]), LocaFormat::Long);
        assert_eq!(LocaFormat::new(&[]), LocaFormat::Short);
    }

    #[test]
    fn long_roundtrip() {
        let loca = Loca::new(vec![0, 0x30000, 0x30001]);
        assert_eq!(loca.format(), LocaFormat::Long);
        let dumped = loca.encode().unwrap();
        assert_eq!(dumped.len(), 12);
        assert_eq!(Loca::decode(FontData::new(&dumped), &LocaFormat::Long).unwrap(), loca);
    }

    #[test]
    fn unrepresentable_short() {
        let mut loca = Loca::new(vec![0, 2]);
        loca.offsets.push(0x40000);
        assert!(loca.encode().is_err());
    }
}
