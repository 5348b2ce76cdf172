//! The [glyf (Glyph Data)](https://docs.microsoft.com/en-us/typography/opentype/spec/glyf) table

mod composite;
mod simple;

use font_types::{GlyphId, Tag};

use super::{head::Head, hhea::Hhea, loca::Loca, maxp::Maxp, FontTable, Summary};
use crate::{
    font_data::{Cursor, FontData},
    read::ReadError,
    registry::{LoadContext, UpdateContext},
    write::{EncodeError, FontWrite, TableWriter},
    Error,
};

pub use composite::{Component, CompositeGlyph};
#[cfg(feature = "kurbo")]
pub use simple::MalformedPath;
pub use simple::{Contour, CurvePoint, SimpleGlyph};

/// Composite glyphs nested deeper than this are not followed when computing
/// glyph maxima.
const MAX_COMPONENT_DEPTH: u16 = 64;

/// A Bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bbox {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

/// The fixed-size header that begins every non-empty glyph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlyphHeader {
    /// Negative for composite glyphs.
    pub number_of_contours: i16,
    pub bbox: Bbox,
}

/// The headers of every glyph, read without decoding outlines.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphHeaders(Vec<Option<GlyphHeader>>);

/// A single glyph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Glyph {
    /// A glyph with no outline, such as a space.
    #[default]
    Empty,
    Simple(SimpleGlyph),
    Composite(CompositeGlyph),
}

/// The [glyf] table.
///
/// [glyf]: https://docs.microsoft.com/en-us/typography/opentype/spec/glyf
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Glyf {
    glyphs: Vec<Glyph>,
}

/// Outline statistics stored in `maxp`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GlyphMaxima {
    pub points: u16,
    pub contours: u16,
    pub composite_points: u16,
    pub composite_contours: u16,
    pub component_elements: u16,
    pub component_depth: u16,
}

impl Bbox {
    pub fn union(self, other: Bbox) -> Bbox {
        Bbox {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// The smallest box containing every point, or `None` if there are none.
    pub fn from_points(points: impl IntoIterator<Item = (i16, i16)>) -> Option<Bbox> {
        let mut points = points.into_iter();
        let (x, y) = points.next()?;
        let init = Bbox {
            x_min: x,
            y_min: y,
            x_max: x,
            y_max: y,
        };
        Some(points.fold(init, |bbox, (x, y)| Bbox {
            x_min: bbox.x_min.min(x),
            y_min: bbox.y_min.min(y),
            x_max: bbox.x_max.max(x),
            y_max: bbox.y_max.max(y),
        }))
    }

    fn read(cursor: &mut Cursor) -> Result<Bbox, ReadError> {
        Ok(Bbox {
            x_min: cursor.read()?,
            y_min: cursor.read()?,
            x_max: cursor.read()?,
            y_max: cursor.read()?,
        })
    }
}

#[cfg(feature = "kurbo")]
impl From<kurbo::Rect> for Bbox {
    fn from(value: kurbo::Rect) -> Self {
        Bbox {
            x_min: ot_round(value.min_x()),
            y_min: ot_round(value.min_y()),
            x_max: ot_round(value.max_x()),
            y_max: ot_round(value.max_y()),
        }
    }
}

#[cfg(feature = "kurbo")]
impl From<Bbox> for kurbo::Rect {
    fn from(value: Bbox) -> Self {
        kurbo::Rect::new(
            value.x_min as f64,
            value.y_min as f64,
            value.x_max as f64,
            value.y_max as f64,
        )
    }
}

#[cfg(feature = "kurbo")]
pub(crate) fn ot_round(value: f64) -> i16 {
    (value + 0.5).floor() as i16
}

impl FontWrite for Bbox {
    fn write_into(&self, writer: &mut TableWriter) {
        let Bbox {
            x_min,
            y_min,
            x_max,
            y_max,
        } = *self;
        [x_min, y_min, x_max, y_max].write_into(writer)
    }
}

impl GlyphHeader {
    fn read(data: FontData) -> Result<GlyphHeader, ReadError> {
        let mut cursor = data.cursor();
        Ok(GlyphHeader {
            number_of_contours: cursor.read()?,
            bbox: Bbox::read(&mut cursor)?,
        })
    }

    pub fn is_composite(&self) -> bool {
        self.number_of_contours < 0
    }
}

impl GlyphHeaders {
    /// The header of a glyph, or `None` if it has no outline or does not exist.
    pub fn get(&self, gid: GlyphId) -> Option<GlyphHeader> {
        self.0.get(gid.to_u16() as usize).copied().flatten()
    }

    /// The number of glyphs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Glyph {
    fn read(data: FontData) -> Result<Glyph, ReadError> {
        if data.is_empty() {
            return Ok(Glyph::Empty);
        }
        let header = GlyphHeader::read(data)?;
        if header.is_composite() {
            CompositeGlyph::read(data).map(Glyph::Composite)
        } else {
            SimpleGlyph::read(data).map(Glyph::Simple)
        }
    }

    /// `true` if the glyph has no contours or components.
    pub fn is_empty(&self) -> bool {
        match self {
            Glyph::Empty => true,
            Glyph::Simple(glyph) => glyph.contours.is_empty(),
            Glyph::Composite(glyph) => glyph.components.is_empty(),
        }
    }

    /// The header that would be written for this glyph.
    pub fn header(&self) -> Option<GlyphHeader> {
        match self {
            _ if self.is_empty() => None,
            Glyph::Simple(glyph) => Some(GlyphHeader {
                number_of_contours: glyph.contours.len() as i16,
                bbox: glyph.bbox,
            }),
            Glyph::Composite(glyph) => Some(GlyphHeader {
                number_of_contours: -1,
                bbox: glyph.bbox,
            }),
            Glyph::Empty => None,
        }
    }

    pub fn bbox(&self) -> Option<Bbox> {
        self.header().map(|header| header.bbox)
    }

    fn check(&self) -> Result<(), EncodeError> {
        match self {
            Glyph::Empty => Ok(()),
            Glyph::Simple(glyph) => glyph.check(),
            Glyph::Composite(glyph) => glyph.check(),
        }
    }
}

impl FontWrite for Glyph {
    fn write_into(&self, writer: &mut TableWriter) {
        match self {
            Glyph::Empty => (),
            Glyph::Simple(glyph) => glyph.write_into(writer),
            Glyph::Composite(glyph) => glyph.write_into(writer),
        }
    }
}

impl From<SimpleGlyph> for Glyph {
    fn from(src: SimpleGlyph) -> Glyph {
        Glyph::Simple(src)
    }
}

impl From<CompositeGlyph> for Glyph {
    fn from(src: CompositeGlyph) -> Glyph {
        Glyph::Composite(src)
    }
}

impl Glyf {
    pub fn new(glyphs: Vec<Glyph>) -> Self {
        Glyf { glyphs }
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    /// Mutable access to the glyph list.
    ///
    /// Adding or removing glyphs does not change `maxp.numGlyphs` or the
    /// metrics in `hmtx`; keeping those in sync is up to the caller.
    pub fn glyphs_mut(&mut self) -> &mut Vec<Glyph> {
        &mut self.glyphs
    }

    pub fn glyph(&self, gid: GlyphId) -> Option<&Glyph> {
        self.glyphs.get(gid.to_u16() as usize)
    }

    pub fn glyph_mut(&mut self, gid: GlyphId) -> Option<&mut Glyph> {
        self.glyphs.get_mut(gid.to_u16() as usize)
    }

    pub fn push(&mut self, glyph: impl Into<Glyph>) -> GlyphId {
        self.glyphs.push(glyph.into());
        GlyphId::new((self.glyphs.len() - 1) as u16)
    }

    /// The union of the bounding boxes of all glyphs with outlines.
    pub fn bbox(&self) -> Option<Bbox> {
        self.glyphs
            .iter()
            .filter_map(Glyph::bbox)
            .reduce(Bbox::union)
    }

    /// The glyph data and the `loca` offsets that locate each glyph in it.
    pub fn compile(&self) -> Result<(Vec<u8>, Vec<u32>), EncodeError> {
        let mut writer = TableWriter::default();
        let mut offsets = Vec::with_capacity(self.glyphs.len() + 1);
        offsets.push(0);
        for glyph in &self.glyphs {
            glyph.check()?;
            glyph.write_into(&mut writer);
            writer.pad_to_2byte_aligned();
            let pos = u32::try_from(writer.len())
                .map_err(|_| EncodeError("glyph data exceeds 4GB"))?;
            offsets.push(pos);
        }
        Ok((writer.into_data(), offsets))
    }

    /// Compute the outline statistics stored in `maxp`.
    pub fn maxima(&self) -> GlyphMaxima {
        let mut maxima = GlyphMaxima::default();
        for (gid, glyph) in self.glyphs.iter().enumerate() {
            match glyph {
                Glyph::Empty => (),
                Glyph::Simple(simple) => {
                    maxima.points = maxima.points.max(simple.num_points() as u16);
                    maxima.contours = maxima.contours.max(simple.contours.len() as u16);
                }
                Glyph::Composite(composite) => {
                    let totals = self.composite_totals(gid, 0);
                    maxima.composite_points = maxima.composite_points.max(totals.points);
                    maxima.composite_contours = maxima.composite_contours.max(totals.contours);
                    maxima.component_depth = maxima.component_depth.max(totals.depth);
                    maxima.component_elements = maxima
                        .component_elements
                        .max(composite.components.len() as u16);
                }
            }
        }
        maxima
    }

    /// Points and contours of all the simple glyphs a glyph is built from,
    /// and its nesting depth.
    fn composite_totals(&self, gid: usize, depth: u16) -> LeafTotals {
        match self.glyphs.get(gid) {
            Some(Glyph::Simple(simple)) => LeafTotals {
                points: simple.num_points() as u16,
                contours: simple.contours.len() as u16,
                depth: 0,
            },
            Some(Glyph::Composite(composite)) if depth < MAX_COMPONENT_DEPTH => composite
                .components
                .iter()
                .map(|component| self.composite_totals(component.glyph.to_u16() as usize, depth + 1))
                .fold(LeafTotals::default(), |acc, child| LeafTotals {
                    points: acc.points.saturating_add(child.points),
                    contours: acc.contours.saturating_add(child.contours),
                    depth: acc.depth.max(child.depth + 1),
                }),
            _ => LeafTotals::default(),
        }
    }
}

#[derive(Clone, Copy, Default)]
struct LeafTotals {
    points: u16,
    contours: u16,
    depth: u16,
}

impl FontTable for Glyf {
    const TAG: Tag = Tag::new(b"glyf");
    const RECOMPUTES: bool = true;

    /// Byte offsets of each glyph, from `loca`.
    type Args = Vec<u32>;

    fn read_args(ctx: &mut LoadContext) -> Result<Vec<u32>, Error> {
        Ok(ctx.table::<Loca>()?.offsets().to_vec())
    }

    fn decode(data: FontData, offsets: &Vec<u32>) -> Result<Self, ReadError> {
        let glyphs = glyph_slices(data, offsets)
            .map(|slice| slice.and_then(Glyph::read))
            .collect::<Result<_, _>>()?;
        Ok(Glyf { glyphs })
    }

    fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        self.compile().map(|(data, _)| data)
    }

    /// Reads the header of every glyph.
    fn shallow_load(data: FontData, ctx: &mut LoadContext) -> Result<Option<Summary>, Error> {
        if !ctx.contains(Loca::TAG) {
            return Ok(None);
        }
        let offsets = ctx.table::<Loca>()?.offsets().to_vec();
        let headers = glyph_slices(data, &offsets)
            .map(|slice| {
                let slice = slice?;
                if slice.is_empty() {
                    Ok(None)
                } else {
                    GlyphHeader::read(slice).map(Some)
                }
            })
            .collect::<Result<_, _>>()
            .map_err(|reason| Error::TableDecode {
                tag: Self::TAG,
                reason,
            })?;
        Ok(Some(Summary::Glyf(GlyphHeaders(headers))))
    }

    /// Simple glyph bounding boxes are computed from their points, and
    /// `loca` is brought in line with the glyph data. Composite bounding
    /// boxes are kept as they are.
    fn recompute(&mut self, ctx: &mut UpdateContext) -> Result<(), Error> {
        let mut bbox_changed = false;
        for glyph in &mut self.glyphs {
            if let Glyph::Simple(simple) = glyph {
                let before = simple.bbox;
                simple.recompute_bounding_box();
                bbox_changed |= before != simple.bbox;
            }
        }

        let (_, offsets) = self.compile().map_err(|reason| Error::Encode {
            tag: Self::TAG,
            reason,
        })?;
        let loca_matches = ctx
            .table::<Loca>()?
            .map(|loca| loca.offsets() == offsets.as_slice());
        match loca_matches {
            Some(true) => (),
            Some(false) => {
                if let Some(loca) = ctx.table_mut::<Loca>()? {
                    loca.set_offsets(offsets);
                }
            }
            None => ctx.insert(Loca::new(offsets))?,
        }

        if bbox_changed {
            for tag in [Head::TAG, Hhea::TAG, Maxp::TAG] {
                if ctx.contains(tag) {
                    ctx.mark_dirty(tag)?;
                }
            }
        }
        Ok(())
    }

    any_table_conversions!(Glyf);
}

/// The data of each glyph, as located by `offsets`.
fn glyph_slices<'a>(
    data: FontData<'a>,
    offsets: &'a [u32],
) -> impl Iterator<Item = Result<FontData<'a>, ReadError>> + 'a {
    offsets.windows(2).map(move |pair| {
        let (start, end) = (pair[0] as usize, pair[1] as usize);
        if end < start {
            return Err(ReadError::MalformedData("loca offsets are not sorted"));
        }
        data.slice(start..end).ok_or(ReadError::OutOfBounds)
    })
}

#[cfg(test)]
mod tests {
    use font_test_data::ttf;

    use super::*;

    fn fixture_offsets() -> Vec<u32> {
        vec![0, 34, 64, 82, 82]
    }

    fn fixture() -> Glyf {
        let data = ttf::glyf();
        Glyf::decode(FontData::new(&data), &fixture_offsets()).unwrap()
    }

    #[test]
    fn union_box() {
        assert_eq!(
            Bbox {
                x_min: -1,
                y_min: -2,
                x_max: 5,
                y_max: 6
            },
            Bbox {
                x_min: 0,
                y_min: 0,
                x_max: 5,
                y_max: 6
            }
            .union(Bbox {
                x_min: -1,
                y_min: -2,
                x_max: 3,
                y_max: 4
            })
        )
    }

    #[test]
    fn decode_fixture() {
        let glyf = fixture();
        assert_eq!(glyf.glyphs().len(), 4);
        let Some(Glyph::Simple(notdef)) = glyf.glyph(GlyphId::NOTDEF) else {
            panic!("expected a simple glyph");
        };
        assert_eq!(notdef.contours.len(), 1);
        assert_eq!(notdef.num_points(), 4);
        assert_eq!(
            notdef.contours[0].iter().map(|p| (p.x, p.y)).collect::<Vec<_>>(),
            [(50, 0), (450, 0), (450, 700), (50, 700)]
        );
        let Some(Glyph::Composite(aacute)) = glyf.glyph(GlyphId::new(2)) else {
            panic!("expected a composite glyph");
        };
        assert_eq!(aacute.components.len(), 1);
        assert_eq!(aacute.components[0].glyph, GlyphId::new(1));
        assert_eq!(glyf.glyph(GlyphId::new(3)), Some(&Glyph::Empty));
    }

    #[test]
    fn bbox_and_maxima() {
        let glyf = fixture();
        assert_eq!(
            glyf.bbox(),
            Some(Bbox {
                x_min: 0,
                y_min: 0,
                x_max: 500,
                y_max: 700
            })
        );
        let maxima = glyf.maxima();
        assert_eq!(maxima.points, 4);
        assert_eq!(maxima.contours, 1);
        assert_eq!(maxima.composite_points, 3);
        assert_eq!(maxima.composite_contours, 1);
        assert_eq!(maxima.component_elements, 1);
        assert_eq!(maxima.component_depth, 1);
    }

    #[test]
    fn recursive_components_terminate() {
        let mut glyf = Glyf::default();
        glyf.push(CompositeGlyph::new(vec![Component::new(GlyphId::new(0), 0, 0)]));
        let maxima = glyf.maxima();
        assert_eq!(maxima.component_elements, 1);
        assert_eq!(maxima.composite_points, 0);
    }

    #[test]
    fn compile_offsets() {
        let glyf = fixture();
        let (data, offsets) = glyf.compile().unwrap();
        assert_eq!(offsets.len(), 5);
        assert_eq!(offsets.last().copied(), Some(data.len() as u32));
        // the empty glyph takes no space
        assert_eq!(offsets[3], offsets[4]);
        let reloaded = Glyf::decode(FontData::new(&data), &offsets).unwrap();
        assert_eq!(reloaded, glyf);
    }

    #[test]
    fn headers() {
        let data = ttf::glyf();
        let headers: Vec<_> = glyph_slices(FontData::new(&data), &fixture_offsets())
            .map(|slice| slice.unwrap())
            .filter(|slice| !slice.is_empty())
            .map(|slice| GlyphHeader::read(slice).unwrap())
            .collect();
        assert_eq!(headers.len(), 3);
        assert_eq!(headers[0].number_of_contours, 1);
        assert!(headers[2].is_composite());
    }

    #[test]
    fn offsets_out_of_bounds() {
        let data = ttf::glyf();
        assert!(matches!(
            Glyf::decode(FontData::new(&data), &vec![0, 34, 200]),
            Err(ReadError::OutOfBounds)
        ));
        assert!(matches!(
            Glyf::decode(FontData::new(&data), &vec![0, 34, 20]),
            Err(ReadError::MalformedData(_))
        ));
    }
}
