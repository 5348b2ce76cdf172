//! The [hmtx (Horizontal Metrics)][hmtx] table
//!
//! [hmtx]: https://docs.microsoft.com/en-us/typography/opentype/spec/hmtx

use font_types::{GlyphId, Tag};

use super::{hhea::Hhea, maxp::Maxp, FontTable};
use crate::{
    font_data::FontData,
    read::ReadError,
    registry::LoadContext,
    write::{dump_table, EncodeError, FontWrite, TableWriter},
    Error,
};

/// The [hmtx] table.
///
/// [hmtx]: https://docs.microsoft.com/en-us/typography/opentype/spec/hmtx
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hmtx {
    /// One advance and side bearing per glyph, for the first
    /// `hhea.numberOfHMetrics` glyphs.
    pub h_metrics: Vec<LongMetric>,
    /// Side bearings of the remaining glyphs, which share the advance of
    /// the last long metric.
    pub left_side_bearings: Vec<i16>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LongMetric {
    pub advance: u16,
    pub side_bearing: i16,
}

/// The counts needed to split `hmtx` into its two arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HmtxArgs {
    pub number_of_h_metrics: u16,
    pub num_glyphs: u16,
}

impl LongMetric {
    pub fn new(advance: u16, side_bearing: i16) -> Self {
        LongMetric {
            advance,
            side_bearing,
        }
    }
}

impl Hmtx {
    pub fn new(h_metrics: Vec<LongMetric>, left_side_bearings: Vec<i16>) -> Self {
        Hmtx {
            h_metrics,
            left_side_bearings,
        }
    }

    pub fn num_glyphs(&self) -> usize {
        self.h_metrics.len() + self.left_side_bearings.len()
    }

    /// The advance width of a glyph.
    pub fn advance(&self, gid: GlyphId) -> Option<u16> {
        let idx = gid.to_u16() as usize;
        if idx >= self.num_glyphs() {
            return None;
        }
        self.h_metrics
            .get(idx)
            .or_else(|| self.h_metrics.last())
            .map(|metric| metric.advance)
    }

    /// The left side bearing of a glyph.
    pub fn side_bearing(&self, gid: GlyphId) -> Option<i16> {
        let idx = gid.to_u16() as usize;
        match self.h_metrics.get(idx) {
            Some(metric) => Some(metric.side_bearing),
            None => self
                .left_side_bearings
                .get(idx - self.h_metrics.len())
                .copied(),
        }
    }

    /// Advance and side bearing of every glyph, in glyph order.
    pub fn iter(&self) -> impl Iterator<Item = LongMetric> + '_ {
        let last_advance = self.h_metrics.last().map(|m| m.advance).unwrap_or_default();
        self.h_metrics.iter().copied().chain(
            self.left_side_bearings
                .iter()
                .map(move |lsb| LongMetric::new(last_advance, *lsb)),
        )
    }
}

impl FontTable for Hmtx {
    const TAG: Tag = Tag::new(b"hmtx");

    type Args = HmtxArgs;

    fn read_args(ctx: &mut LoadContext) -> Result<HmtxArgs, Error> {
        let number_of_h_metrics = ctx.table::<Hhea>()?.number_of_h_metrics;
        let num_glyphs = ctx.table::<Maxp>()?.num_glyphs;
        Ok(HmtxArgs {
            number_of_h_metrics,
            num_glyphs,
        })
    }

    fn decode(data: FontData, args: &HmtxArgs) -> Result<Self, ReadError> {
        let n_long = args.number_of_h_metrics as usize;
        let n_short = (args.num_glyphs as usize).saturating_sub(n_long);
        let mut cursor = data.cursor();
        let mut h_metrics = Vec::with_capacity(n_long);
        for _ in 0..n_long {
            h_metrics.push(LongMetric {
                advance: cursor.read()?,
                side_bearing: cursor.read()?,
            });
        }
        let left_side_bearings = cursor.read_array(n_short)?;
        Ok(Hmtx {
            h_metrics,
            left_side_bearings,
        })
    }

    fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        if self.num_glyphs() > u16::MAX as usize {
            return Err(EncodeError("more than 65535 metrics"));
        }
        Ok(dump_table(self))
    }

    any_table_conversions!(Hmtx);
}

impl FontWrite for LongMetric {
    fn write_into(&self, writer: &mut TableWriter) {
        self.advance.write_into(writer);
        self.side_bearing.write_into(writer);
    }
}

impl FontWrite for Hmtx {
    fn write_into(&self, writer: &mut TableWriter) {
        self.h_metrics.write_into(writer);
        self.left_side_bearings.write_into(writer);
    }
}

#[cfg(test)]
mod tests {
    use font_test_data::ttf;

    use super::*;

    fn fixture_args() -> HmtxArgs {
        HmtxArgs {
            number_of_h_metrics: 3,
            num_glyphs: ttf::NUM_GLYPHS,
        }
    }

    #[test]
    fn smoke_test() {
        let hmtx = Hmtx::new(vec![LongMetric::new(602, -214)], vec![-20, -32, -44, -6]);
        let dumped = hmtx.encode().unwrap();
        let args = HmtxArgs {
            number_of_h_metrics: 1,
            num_glyphs: 5,
        };
        let loaded = Hmtx::decode(FontData::new(&dumped), &args).unwrap();
        assert_eq!(loaded, hmtx);
    }

    #[test]
    fn lookups() {
        let data = ttf::hmtx();
        let hmtx = Hmtx::decode(FontData::new(&data), &fixture_args()).unwrap();
        assert_eq!(hmtx.advance(GlyphId::new(0)), Some(500));
        assert_eq!(hmtx.side_bearing(GlyphId::new(0)), Some(50));
        // the last glyph repeats the final advance
        assert_eq!(hmtx.advance(GlyphId::new(3)), Some(600));
        assert_eq!(hmtx.side_bearing(GlyphId::new(3)), Some(0));
        assert_eq!(hmtx.advance(GlyphId::new(4)), None);
        assert_eq!(hmtx.iter().count(), 4);
    }

    #[test]
    fn truncated() {
        let data = ttf::hmtx();
        assert!(matches!(
            Hmtx::decode(FontData::new(&data[..10]), &fixture_args()),
            Err(ReadError::OutOfBounds)
        ));
    }
}
