//! The [hhea (Horizontal Header)][hhea] table
//!
//! [hhea]: https://docs.microsoft.com/en-us/typography/opentype/spec/hhea

use font_types::{MajorMinor, Tag};

use super::{glyf::Glyf, hmtx::Hmtx, FontTable};
use crate::{
    font_data::FontData,
    read::ReadError,
    registry::{LoadContext, UpdateContext},
    write::{dump_table, EncodeError, FontWrite, TableWriter},
    Error,
};

/// The [hhea] table.
///
/// [hhea]: https://docs.microsoft.com/en-us/typography/opentype/spec/hhea
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hhea {
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub advance_width_max: u16,
    pub min_left_side_bearing: i16,
    pub min_right_side_bearing: i16,
    pub x_max_extent: i16,
    pub caret_slope_rise: i16,
    pub caret_slope_run: i16,
    pub caret_offset: i16,
    pub metric_data_format: i16,
    /// The number of long metrics in `hmtx`.
    pub number_of_h_metrics: u16,
}

impl FontTable for Hhea {
    const TAG: Tag = Tag::new(b"hhea");
    const UPSTREAM: &'static [Tag] = &[Glyf::TAG, Hmtx::TAG];
    const RECOMPUTES: bool = true;

    type Args = ();

    fn read_args(_ctx: &mut LoadContext) -> Result<(), Error> {
        Ok(())
    }

    fn decode(data: FontData, _args: &()) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let version: MajorMinor = cursor.read()?;
        if version.major != 1 {
            return Err(ReadError::InvalidFormat(version.major as i64));
        }
        let ascender = cursor.read()?;
        let descender = cursor.read()?;
        let line_gap = cursor.read()?;
        let advance_width_max = cursor.read()?;
        let min_left_side_bearing = cursor.read()?;
        let min_right_side_bearing = cursor.read()?;
        let x_max_extent = cursor.read()?;
        let caret_slope_rise = cursor.read()?;
        let caret_slope_run = cursor.read()?;
        let caret_offset = cursor.read()?;
        cursor.advance_by(8);
        Ok(Hhea {
            ascender,
            descender,
            line_gap,
            advance_width_max,
            min_left_side_bearing,
            min_right_side_bearing,
            x_max_extent,
            caret_slope_rise,
            caret_slope_run,
            caret_offset,
            metric_data_format: cursor.read()?,
            number_of_h_metrics: cursor.read()?,
        })
    }

    fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(dump_table(self))
    }

    /// `numberOfHMetrics` follows `hmtx`, and is an error if it does not fit
    /// in 16 bits. Horizontal extents are computed
    /// from the metrics in `hmtx` and the widths of the glyph outlines,
    /// skipping glyphs without outlines.
    fn recompute(&mut self, ctx: &mut UpdateContext) -> Result<(), Error> {
        let Some(hmtx) = ctx.table::<Hmtx>()? else {
            return Ok(());
        };
        self.number_of_h_metrics =
            u16::try_from(hmtx.h_metrics.len()).map_err(|_| Error::Encode {
                tag: Self::TAG,
                reason: EncodeError("more than 65535 long horizontal metrics"),
            })?;
        let metrics: Vec<_> = hmtx.iter().collect();
        self.advance_width_max = metrics.iter().map(|m| m.advance).max().unwrap_or_default();

        let Some(glyf) = ctx.table::<Glyf>()? else {
            return Ok(());
        };
        let mut min_lsb = None::<i32>;
        let mut min_rsb = None::<i32>;
        let mut max_extent = None::<i32>;
        for (glyph, metric) in glyf.glyphs().iter().zip(&metrics) {
            let Some(bbox) = glyph.bbox() else {
                continue;
            };
            let width = bbox.x_max as i32 - bbox.x_min as i32;
            let lsb = metric.side_bearing as i32;
            let rsb = metric.advance as i32 - lsb - width;
            let extent = lsb + width;
            min_lsb = Some(min_lsb.map_or(lsb, |v| v.min(lsb)));
            min_rsb = Some(min_rsb.map_or(rsb, |v| v.min(rsb)));
            max_extent = Some(max_extent.map_or(extent, |v| v.max(extent)));
        }
        self.min_left_side_bearing = clamp_i16(min_lsb.unwrap_or_default());
        self.min_right_side_bearing = clamp_i16(min_rsb.unwrap_or_default());
        self.x_max_extent = clamp_i16(max_extent.unwrap_or_default());
        Ok(())
    }

    any_table_conversions!(Hhea);
}

fn clamp_i16(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

impl FontWrite for Hhea {
    fn write_into(&self, writer: &mut TableWriter) {
        MajorMinor::VERSION_1_0.write_into(writer);
        self.ascender.write_into(writer);
        self.descender.write_into(writer);
        self.line_gap.write_into(writer);
        self.advance_width_max.write_into(writer);
        self.min_left_side_bearing.write_into(writer);
        self.min_right_side_bearing.write_into(writer);
        self.x_max_extent.write_into(writer);
        self.caret_slope_rise.write_into(writer);
        self.caret_slope_run.write_into(writer);
        self.caret_offset.write_into(writer);
        [0i16; 4].write_into(writer);
        self.metric_data_format.write_into(writer);
        self.number_of_h_metrics.write_into(writer);
    }
}

#[cfg(test)]
mod tests {
    use font_test_data::ttf;

    use super::*;

    #[test]
    fn decode_fixture() {
        let data = ttf::hhea();
        let hhea = Hhea::decode(FontData::new(&data), &()).unwrap();
        assert_eq!(hhea.ascender, 800);
        assert_eq!(hhea.descender, -200);
        assert_eq!(hhea.min_right_side_bearing, 50);
        assert_eq!(hhea.number_of_h_metrics, 3);
        assert_eq!(hhea.encode().unwrap(), data.as_slice());
    }

    #[test]
    fn reserved_fields_are_zeroed() {
        let hhea = Hhea {
            ascender: 1,
            ..Default::default()
        };
        let dumped = hhea.encode().unwrap();
        assert_eq!(dumped.len(), 36);
        assert_eq!(&dumped[24..32], &[0; 8]);
    }
}
