//! The [head (Font Header)][head] table
//!
//! [head]: https://docs.microsoft.com/en-us/typography/opentype/spec/head

use font_types::{Fixed, LongDateTime, MajorMinor, Tag};

use super::{glyf::Glyf, hmtx::Hmtx, loca::Loca, FontTable};
use crate::{
    font_data::FontData,
    read::ReadError,
    registry::{LoadContext, UpdateContext},
    validate::{Validate, ValidationCtx},
    write::{dump_table, EncodeError, FontWrite, TableWriter},
    Error,
};

/// The expected value of [`Head::magic_number`].
pub const MAGIC_NUMBER: u32 = 0x5F0F_3CF5;

const HEAD_LEN: usize = 54;

/// The [head] table.
///
/// [head]: https://docs.microsoft.com/en-us/typography/opentype/spec/head
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Head {
    pub version: MajorMinor,
    pub font_revision: Fixed,
    /// Written as part of the font, never by this table.
    pub checksum_adjustment: u32,
    pub magic_number: u32,
    pub flags: u16,
    pub units_per_em: u16,
    pub created: LongDateTime,
    pub modified: LongDateTime,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub mac_style: u16,
    pub lowest_rec_ppem: u16,
    pub font_direction_hint: i16,
    /// 0 for short loca offsets, 1 for long.
    pub index_to_loc_format: i16,
    pub glyph_data_format: i16,
}

impl Default for Head {
    fn default() -> Self {
        Head {
            version: MajorMinor::VERSION_1_0,
            font_revision: Fixed::ONE,
            checksum_adjustment: 0,
            magic_number: MAGIC_NUMBER,
            flags: 0,
            units_per_em: 1000,
            created: LongDateTime::default(),
            modified: LongDateTime::default(),
            x_min: 0,
            y_min: 0,
            x_max: 0,
            y_max: 0,
            mac_style: 0,
            lowest_rec_ppem: 0,
            font_direction_hint: 2,
            index_to_loc_format: 0,
            glyph_data_format: 0,
        }
    }
}

impl FontTable for Head {
    const TAG: Tag = Tag::new(b"head");
    const UPSTREAM: &'static [Tag] = &[Glyf::TAG, Hmtx::TAG, Loca::TAG];
    const RECOMPUTES: bool = true;

    type Args = ();

    fn read_args(_ctx: &mut LoadContext) -> Result<(), Error> {
        Ok(())
    }

    fn decode(data: FontData, _args: &()) -> Result<Self, ReadError> {
        if data.len() < HEAD_LEN {
            return Err(ReadError::OutOfBounds);
        }
        let mut cursor = data.cursor();
        Ok(Head {
            version: cursor.read()?,
            font_revision: cursor.read()?,
            checksum_adjustment: cursor.read()?,
            magic_number: cursor.read()?,
            flags: cursor.read()?,
            units_per_em: cursor.read()?,
            created: cursor.read()?,
            modified: cursor.read()?,
            x_min: cursor.read()?,
            y_min: cursor.read()?,
            x_max: cursor.read()?,
            y_max: cursor.read()?,
            mac_style: cursor.read()?,
            lowest_rec_ppem: cursor.read()?,
            font_direction_hint: cursor.read()?,
            index_to_loc_format: cursor.read()?,
            glyph_data_format: cursor.read()?,
        })
    }

    fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(dump_table(self))
    }

    /// The font bounding box covers every glyph outline, and the loca
    /// format matches the `loca` table.
    fn recompute(&mut self, ctx: &mut UpdateContext) -> Result<(), Error> {
        if let Some(glyf) = ctx.table::<Glyf>()? {
            let bbox = glyf.bbox().unwrap_or_default();
            self.x_min = bbox.x_min;
            self.y_min = bbox.y_min;
            self.x_max = bbox.x_max;
            self.y_max = bbox.y_max;
        }
        if let Some(loca) = ctx.table::<Loca>()? {
            self.index_to_loc_format = loca.format() as i16;
        }
        Ok(())
    }

    any_table_conversions!(Head);
}

impl FontWrite for Head {
    fn write_into(&self, writer: &mut TableWriter) {
        self.version.write_into(writer);
        self.font_revision.write_into(writer);
        self.checksum_adjustment.write_into(writer);
        self.magic_number.write_into(writer);
        self.flags.write_into(writer);
        self.units_per_em.write_into(writer);
        self.created.write_into(writer);
        self.modified.write_into(writer);
        [self.x_min, self.y_min, self.x_max, self.y_max].write_into(writer);
        self.mac_style.write_into(writer);
        self.lowest_rec_ppem.write_into(writer);
        self.font_direction_hint.write_into(writer);
        self.index_to_loc_format.write_into(writer);
        self.glyph_data_format.write_into(writer);
    }
}

impl Validate for Head {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("head", |ctx| {
            ctx.in_field("magic_number", |ctx| {
                if self.magic_number != MAGIC_NUMBER {
                    ctx.report(format!(
                        "expected {MAGIC_NUMBER:#010X}, found {:#010X}",
                        self.magic_number
                    ));
                }
            });
            ctx.in_field("units_per_em", |ctx| {
                if !(16..=16384).contains(&self.units_per_em) {
                    ctx.report(format!(
                        "{} is outside the valid range 16..=16384",
                        self.units_per_em
                    ));
                }
            });
            ctx.in_field("index_to_loc_format", |ctx| {
                if !(0..=1).contains(&self.index_to_loc_format) {
                    ctx.report(format!("unknown format {}", self.index_to_loc_format));
                }
            });
        })
    }
}

#[cfg(test)]
mod tests {
    use font_test_data::ttf;

    use super::*;

    #[test]
    fn decode_fixture() {
        let data = ttf::head();
        let head = Head::decode(FontData::new(&data), &()).unwrap();
        assert_eq!(head.units_per_em, ttf::UNITS_PER_EM);
        assert_eq!(head.magic_number, MAGIC_NUMBER);
        assert_eq!((head.x_min, head.y_max), (0, 700));
        assert_eq!(head.created.as_secs(), 3_600_000_000);
        assert_eq!(head.encode().unwrap(), data.as_slice());
    }

    #[test]
    fn truncated() {
        let data = ttf::head();
        assert!(matches!(
            Head::decode(FontData::new(&data[..40]), &()),
            Err(ReadError::OutOfBounds)
        ));
    }

    #[test]
    fn default_is_valid() {
        let head = Head::default();
        assert!(head.validate().is_ok());
        assert_eq!(head.encode().unwrap().len(), HEAD_LEN);
    }

    #[test]
    fn bad_upem() {
        let head = Head {
            units_per_em: 4,
            ..Default::default()
        };
        let report = head.validate().unwrap_err();
        assert_eq!(report.len(), 1);
        assert!(report.to_string().contains("units_per_em"));
    }
}
