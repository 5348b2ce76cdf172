//! The [maxp (Maximum Profile)][maxp] table
//!
//! [maxp]: https://docs.microsoft.com/en-us/typography/opentype/spec/maxp

use font_types::{Tag, Version16Dot16};

use super::{glyf::Glyf, FontTable};
use crate::{
    font_data::FontData,
    read::ReadError,
    registry::{LoadContext, UpdateContext},
    write::{dump_table, EncodeError, FontWrite, TableWriter},
    Error,
};

/// The [maxp] table.
///
/// Version 0.5 has only `num_glyphs`; the other fields are present in
/// version 1.0, which is written if any of them is set.
///
/// [maxp]: https://docs.microsoft.com/en-us/typography/opentype/spec/maxp
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Maxp {
    /// The number of glyphs in the font.
    ///
    /// Never recomputed: the caller keeps this in sync with the glyph data.
    pub num_glyphs: u16,
    pub max_points: Option<u16>,
    pub max_contours: Option<u16>,
    pub max_composite_points: Option<u16>,
    pub max_composite_contours: Option<u16>,
    pub max_zones: Option<u16>,
    pub max_twilight_points: Option<u16>,
    pub max_storage: Option<u16>,
    pub max_function_defs: Option<u16>,
    pub max_instruction_defs: Option<u16>,
    pub max_stack_elements: Option<u16>,
    pub max_size_of_instructions: Option<u16>,
    pub max_component_elements: Option<u16>,
    pub max_component_depth: Option<u16>,
}

impl Maxp {
    pub fn new(num_glyphs: u16) -> Self {
        Maxp {
            num_glyphs,
            ..Default::default()
        }
    }

    fn version_1_fields(&self) -> [Option<u16>; 13] {
        [
            self.max_points,
            self.max_contours,
            self.max_composite_points,
            self.max_composite_contours,
            self.max_zones,
            self.max_twilight_points,
            self.max_storage,
            self.max_function_defs,
            self.max_instruction_defs,
            self.max_stack_elements,
            self.max_size_of_instructions,
            self.max_component_elements,
            self.max_component_depth,
        ]
    }

    pub fn version(&self) -> Version16Dot16 {
        if self.version_1_fields().iter().any(Option::is_some) {
            Version16Dot16::VERSION_1_0
        } else {
            Version16Dot16::VERSION_0_5
        }
    }
}

impl FontTable for Maxp {
    const TAG: Tag = Tag::new(b"maxp");
    const UPSTREAM: &'static [Tag] = &[Glyf::TAG];
    const RECOMPUTES: bool = true;

    type Args = ();

    fn read_args(_ctx: &mut LoadContext) -> Result<(), Error> {
        Ok(())
    }

    fn decode(data: FontData, _args: &()) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let version: Version16Dot16 = cursor.read()?;
        let num_glyphs = cursor.read()?;
        if version == Version16Dot16::VERSION_0_5 {
            return Ok(Maxp::new(num_glyphs));
        }
        if version != Version16Dot16::VERSION_1_0 {
            return Err(ReadError::InvalidFormat(version.to_u32() as i64));
        }
        Ok(Maxp {
            num_glyphs,
            max_points: Some(cursor.read()?),
            max_contours: Some(cursor.read()?),
            max_composite_points: Some(cursor.read()?),
            max_composite_contours: Some(cursor.read()?),
            max_zones: Some(cursor.read()?),
            max_twilight_points: Some(cursor.read()?),
            max_storage: Some(cursor.read()?),
            max_function_defs: Some(cursor.read()?),
            max_instruction_defs: Some(cursor.read()?),
            max_stack_elements: Some(cursor.read()?),
            max_size_of_instructions: Some(cursor.read()?),
            max_component_elements: Some(cursor.read()?),
            max_component_depth: Some(cursor.read()?),
        })
    }

    fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(dump_table(self))
    }

    /// The outline maxima are taken from `glyf`. Version 0.5 tables have no
    /// such fields and are left alone.
    fn recompute(&mut self, ctx: &mut UpdateContext) -> Result<(), Error> {
        if self.version() != Version16Dot16::VERSION_1_0 {
            return Ok(());
        }
        if let Some(glyf) = ctx.table::<Glyf>()? {
            let maxima = glyf.maxima();
            self.max_points = Some(maxima.points);
            self.max_contours = Some(maxima.contours);
            self.max_composite_points = Some(maxima.composite_points);
            self.max_composite_contours = Some(maxima.composite_contours);
            self.max_component_elements = Some(maxima.component_elements);
            self.max_component_depth = Some(maxima.component_depth);
        }
        Ok(())
    }

    any_table_conversions!(Maxp);
}

impl FontWrite for Maxp {
    fn write_into(&self, writer: &mut TableWriter) {
        let version = self.version();
        version.write_into(writer);
        self.num_glyphs.write_into(writer);
        if version == Version16Dot16::VERSION_1_0 {
            for field in self.version_1_fields() {
                field.unwrap_or_default().write_into(writer);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use font_test_data::{bebuffer::BeBuffer, ttf};

    use super::*;

    #[test]
    fn maxp_05() {
        let maxp = Maxp::new(5);
        let dumped = maxp.encode().unwrap();
        assert_eq!(dumped.len(), 6);
        let loaded = Maxp::decode(FontData::new(&dumped), &()).unwrap();
        assert_eq!(loaded.version(), Version16Dot16::VERSION_0_5);
        assert_eq!(loaded, maxp);
    }

    #[test]
    fn maxp_10() {
        let data = ttf::maxp();
        let maxp = Maxp::decode(FontData::new(&data), &()).unwrap();
        assert_eq!(maxp.version(), Version16Dot16::VERSION_1_0);
        assert_eq!(maxp.num_glyphs, ttf::NUM_GLYPHS);
        assert_eq!(maxp.max_points, Some(4));
        assert_eq!(maxp.max_component_depth, Some(1));
        assert_eq!(maxp.encode().unwrap(), data.as_slice());
    }

    #[test]
    fn partial_10_fills_zeros() {
        let maxp = Maxp {
            num_glyphs: 2,
            max_zones: Some(2),
            ..Default::default()
        };
        let dumped = maxp.encode().unwrap();
        assert_eq!(dumped.len(), 32);
        let loaded = Maxp::decode(FontData::new(&dumped), &()).unwrap();
        assert_eq!(loaded.max_points, Some(0));
        assert_eq!(loaded.max_zones, Some(2));
    }

    #[test]
    fn unknown_version() {
        let data = BeBuffer::new().push(Version16Dot16::VERSION_2_0).push(1u16);
        assert!(matches!(
            Maxp::decode(FontData::new(&data), &()),
            Err(ReadError::InvalidFormat(_))
        ));
    }
}
