//! Composite glyphs (containing other glyphs as components)

use font_types::GlyphId;

use crate::{
    font_data::{Cursor, FontData},
    read::ReadError,
    write::{EncodeError, FontWrite, TableWriter},
};

use super::Bbox;

const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const ARGS_ARE_XY_VALUES: u16 = 0x0002;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;
const WE_HAVE_INSTRUCTIONS: u16 = 0x0100;

/// Flags that are derived from the shape of a component when writing.
const LAYOUT_FLAGS: u16 = ARGS_ARE_XY_VALUES
    | WE_HAVE_A_SCALE
    | MORE_COMPONENTS
    | WE_HAVE_AN_X_AND_Y_SCALE
    | WE_HAVE_A_TWO_BY_TWO
    | WE_HAVE_INSTRUCTIONS;

/// A glyph consisting of multiple component sub-glyphs
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompositeGlyph {
    /// The bounding box of the glyph after components are placed.
    ///
    /// This is never recomputed.
    pub bbox: Bbox,
    pub components: Vec<Component>,
    pub instructions: Vec<u8>,
}

/// A single component glyph (part of a [`CompositeGlyph`]).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Component {
    pub glyph: GlyphId,
    pub anchor: Anchor,
    pub transform: Transform,
    /// Flags such as `ROUND_XY_TO_GRID` or `USE_MY_METRICS`.
    ///
    /// Flags describing the anchor, transform and record layout are
    /// computed when writing and ignored here, except that
    /// `ARG_1_AND_2_ARE_WORDS` is kept if set.
    pub flags: u16,
}

/// How a component is positioned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Anchor {
    /// An x/y offset.
    Offset { x: i16, y: i16 },
    /// A point in the composite matched to a point in the component.
    Point { base: u16, component: u16 },
}

/// A component transform, as raw F2Dot14 values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Transform {
    #[default]
    Identity,
    Scale(i16),
    XyScale { x: i16, y: i16 },
    TwoByTwo([i16; 4]),
}

impl Component {
    /// A component offset by `(x, y)`, without a transform.
    pub fn new(glyph: GlyphId, x: i16, y: i16) -> Self {
        Component {
            glyph,
            anchor: Anchor::Offset { x, y },
            transform: Transform::Identity,
            flags: 0,
        }
    }

    fn read(cursor: &mut Cursor) -> Result<(Component, u16), ReadError> {
        let flags: u16 = cursor.read()?;
        let glyph = GlyphId::new(cursor.read()?);
        let words = flags & ARG_1_AND_2_ARE_WORDS != 0;
        let anchor = match (flags & ARGS_ARE_XY_VALUES != 0, words) {
            (true, true) => Anchor::Offset {
                x: cursor.read()?,
                y: cursor.read()?,
            },
            (true, false) => Anchor::Offset {
                x: cursor.read::<i8>()? as i16,
                y: cursor.read::<i8>()? as i16,
            },
            (false, true) => Anchor::Point {
                base: cursor.read()?,
                component: cursor.read()?,
            },
            (false, false) => Anchor::Point {
                base: cursor.read::<u8>()? as u16,
                component: cursor.read::<u8>()? as u16,
            },
        };
        let transform = if flags & WE_HAVE_A_SCALE != 0 {
            Transform::Scale(cursor.read()?)
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            Transform::XyScale {
                x: cursor.read()?,
                y: cursor.read()?,
            }
        } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            Transform::TwoByTwo([cursor.read()?, cursor.read()?, cursor.read()?, cursor.read()?])
        } else {
            Transform::Identity
        };
        let mut component = Component {
            glyph,
            anchor,
            transform,
            flags: flags & !(LAYOUT_FLAGS | ARG_1_AND_2_ARE_WORDS),
        };
        // only remember the words flag when the values alone would not need it
        if words && !component.needs_words() {
            component.flags |= ARG_1_AND_2_ARE_WORDS;
        }
        Ok((component, flags))
    }

    fn needs_words(&self) -> bool {
        if self.flags & ARG_1_AND_2_ARE_WORDS != 0 {
            return true;
        }
        match self.anchor {
            Anchor::Offset { x, y } => [x, y].iter().any(|v| i8::try_from(*v).is_err()),
            Anchor::Point { base, component } => {
                [base, component].iter().any(|v| u8::try_from(*v).is_err())
            }
        }
    }

    fn compute_flags(&self) -> u16 {
        let mut flags = self.flags & !LAYOUT_FLAGS & !ARG_1_AND_2_ARE_WORDS;
        if self.needs_words() {
            flags |= ARG_1_AND_2_ARE_WORDS;
        }
        if matches!(self.anchor, Anchor::Offset { .. }) {
            flags |= ARGS_ARE_XY_VALUES;
        }
        flags |= match self.transform {
            Transform::Identity => 0,
            Transform::Scale(_) => WE_HAVE_A_SCALE,
            Transform::XyScale { .. } => WE_HAVE_AN_X_AND_Y_SCALE,
            Transform::TwoByTwo(_) => WE_HAVE_A_TWO_BY_TWO,
        };
        flags
    }

    /// like `FontWrite` but lets us pass in the flags that must be determined
    /// externally (WE_HAVE_INSTRUCTIONS and MORE_COMPONENTS)
    fn write_into(&self, writer: &mut TableWriter, extra_flags: u16) {
        let flags = self.compute_flags() | extra_flags;
        flags.write_into(writer);
        self.glyph.write_into(writer);
        let words = flags & ARG_1_AND_2_ARE_WORDS != 0;
        match (self.anchor, words) {
            (Anchor::Offset { x, y }, true) => [x, y].write_into(writer),
            (Anchor::Offset { x, y }, false) => [x as i8, y as i8].write_into(writer),
            (Anchor::Point { base, component }, true) => [base, component].write_into(writer),
            (Anchor::Point { base, component }, false) => {
                [base as u8, component as u8].write_into(writer)
            }
        }
        match self.transform {
            Transform::Identity => (),
            Transform::Scale(scale) => scale.write_into(writer),
            Transform::XyScale { x, y } => [x, y].write_into(writer),
            Transform::TwoByTwo(values) => values.write_into(writer),
        }
    }
}

impl CompositeGlyph {
    pub fn new(components: Vec<Component>) -> Self {
        CompositeGlyph {
            components,
            ..Default::default()
        }
    }

    pub fn with_bbox(mut self, bbox: Bbox) -> Self {
        self.bbox = bbox;
        self
    }

    pub(crate) fn read(data: FontData) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        cursor.advance::<i16>();
        let bbox = Bbox::read(&mut cursor)?;
        let mut components = Vec::new();
        let mut has_instructions = false;
        loop {
            let (component, flags) = Component::read(&mut cursor)?;
            components.push(component);
            has_instructions |= flags & WE_HAVE_INSTRUCTIONS != 0;
            if flags & MORE_COMPONENTS == 0 {
                break;
            }
        }
        let instructions = if has_instructions {
            let len: u16 = cursor.read()?;
            cursor.read_bytes(len as usize)?.to_vec()
        } else {
            Vec::new()
        };
        Ok(CompositeGlyph {
            bbox,
            components,
            instructions,
        })
    }

    pub(crate) fn check(&self) -> Result<(), EncodeError> {
        if self.instructions.len() > u16::MAX as usize {
            return Err(EncodeError("instructions len overflows"));
        }
        Ok(())
    }
}

impl FontWrite for CompositeGlyph {
    fn write_into(&self, writer: &mut TableWriter) {
        const N_CONTOURS: i16 = -1;
        let Some((last, rest)) = self.components.split_last() else {
            return;
        };
        N_CONTOURS.write_into(writer);
        self.bbox.write_into(writer);
        for component in rest {
            component.write_into(writer, MORE_COMPONENTS);
        }
        let last_flags = if self.instructions.is_empty() {
            0
        } else {
            WE_HAVE_INSTRUCTIONS
        };
        last.write_into(writer, last_flags);
        if !self.instructions.is_empty() {
            (self.instructions.len() as u16).write_into(writer);
            writer.write_slice(&self.instructions);
        }
        writer.pad_to_2byte_aligned();
    }
}

#[cfg(test)]
mod tests {
    use crate::write::dump_table;

    use super::*;

    #[test]
    fn byte_args_when_small() {
        let glyph = CompositeGlyph::new(vec![Component::new(GlyphId::new(1), 10, -20)]);
        let bytes = dump_table(&glyph);
        // header + flags + glyph + two byte args
        assert_eq!(bytes.len(), 10 + 2 + 2 + 2);
        assert_eq!(u16::from_be_bytes([bytes[10], bytes[11]]), ARGS_ARE_XY_VALUES);
        let reloaded = CompositeGlyph::read(FontData::new(&bytes)).unwrap();
        assert_eq!(reloaded, glyph);
    }

    #[test]
    fn words_flag_is_kept() {
        let mut component = Component::new(GlyphId::new(1), 0, 0);
        component.flags = ARG_1_AND_2_ARE_WORDS;
        let glyph = CompositeGlyph::new(vec![component]);
        let bytes = dump_table(&glyph);
        assert_eq!(bytes.len(), 10 + 2 + 2 + 4);
        let reloaded = CompositeGlyph::read(FontData::new(&bytes)).unwrap();
        assert_eq!(reloaded, glyph);
    }

    #[test]
    fn many_components_with_instructions() {
        let mut second = Component::new(GlyphId::new(2), 300, 0);
        second.transform = Transform::TwoByTwo([0x4000, 0, 0, 0x4000]);
        let glyph = CompositeGlyph {
            bbox: Bbox::default(),
            components: vec![
                Component::new(GlyphId::new(1), 0, 0),
                second,
                Component {
                    glyph: GlyphId::new(3),
                    anchor: Anchor::Point {
                        base: 2,
                        component: 400,
                    },
                    transform: Transform::Scale(0x2000),
                    flags: 0,
                },
            ],
            instructions: vec![1, 2, 3],
        };
        let bytes = dump_table(&glyph);
        assert_eq!(bytes.len() % 2, 0);
        let reloaded = CompositeGlyph::read(FontData::new(&bytes)).unwrap();
        assert_eq!(reloaded, glyph);
    }

    #[test]
    fn truncated_component() {
        let glyph = CompositeGlyph::new(vec![Component::new(GlyphId::new(1), 1000, 0)]);
        let bytes = dump_table(&glyph);
        assert!(matches!(
            CompositeGlyph::read(FontData::new(&bytes[..bytes.len() - 2])),
            Err(ReadError::OutOfBounds)
        ));
    }
}
