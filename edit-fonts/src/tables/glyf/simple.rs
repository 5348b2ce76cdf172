//! Simple glyphs (glyphs which do not contain components)

use crate::{
    font_data::{Cursor, FontData},
    read::ReadError,
    write::{EncodeError, FontWrite, TableWriter},
};

use super::Bbox;

const ON_CURVE_POINT: u8 = 0x01;
const X_SHORT_VECTOR: u8 = 0x02;
const Y_SHORT_VECTOR: u8 = 0x04;
const REPEAT_FLAG: u8 = 0x08;
const X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR: u8 = 0x10;
const Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR: u8 = 0x20;
const OVERLAP_SIMPLE: u8 = 0x40;

/// A simple (without components) glyph
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimpleGlyph {
    pub bbox: Bbox,
    pub contours: Vec<Contour>,
    pub instructions: Vec<u8>,
    /// Whether the `OVERLAP_SIMPLE` flag is set on the first point.
    pub overlap: bool,
}

/// A single contour, comprising only line and quadratic bezier segments
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Contour(pub Vec<CurvePoint>);

/// Point with an associated on-curve flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurvePoint {
    pub x: i16,
    pub y: i16,
    pub on_curve: bool,
}

/// An error if an input curve is malformed
#[cfg(feature = "kurbo")]
#[derive(Clone, Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MalformedPath {
    #[error("path contains a cubic segment")]
    HasCubic,
    #[error("path does not begin with a move")]
    MissingMove,
}

impl CurvePoint {
    pub fn new(x: i16, y: i16, on_curve: bool) -> Self {
        CurvePoint { x, y, on_curve }
    }

    pub fn on_curve(x: i16, y: i16) -> Self {
        Self::new(x, y, true)
    }

    pub fn off_curve(x: i16, y: i16) -> Self {
        Self::new(x, y, false)
    }
}

impl SimpleGlyph {
    /// Create a glyph from contours, computing its bounding box.
    pub fn new(contours: Vec<Contour>) -> Self {
        let mut glyph = SimpleGlyph {
            contours,
            ..Default::default()
        };
        glyph.recompute_bounding_box();
        glyph
    }

    /// Attempt to create a simple glyph from a kurbo `BezPath`
    ///
    /// The path may contain only line and quadratic bezier segments. The caller
    /// is responsible for converting any cubic segments to quadratics before
    /// calling.
    ///
    /// The bounding box is the control box of the path.
    #[cfg(feature = "kurbo")]
    pub fn from_bezpath(path: &kurbo::BezPath) -> Result<Self, MalformedPath> {
        use super::ot_round;
        use kurbo::{PathEl, Point};

        fn point(pt: Point, on_curve: bool) -> CurvePoint {
            CurvePoint::new(ot_round(pt.x), ot_round(pt.y), on_curve)
        }

        let mut contours = Vec::new();
        let mut current: Option<Vec<CurvePoint>> = None;
        for el in path.elements() {
            match *el {
                PathEl::MoveTo(pt) => {
                    contours.extend(current.take().map(Contour));
                    current = Some(vec![point(pt, true)]);
                }
                PathEl::LineTo(pt) => current
                    .as_mut()
                    .ok_or(MalformedPath::MissingMove)?
                    .push(point(pt, true)),
                PathEl::QuadTo(p0, p1) => {
                    let contour = current.as_mut().ok_or(MalformedPath::MissingMove)?;
                    contour.push(point(p0, false));
                    contour.push(point(p1, true));
                }
                PathEl::CurveTo(..) => return Err(MalformedPath::HasCubic),
                PathEl::ClosePath => {
                    let contour = current.as_mut().ok_or(MalformedPath::MissingMove)?;
                    // a closing point on top of the start is implied
                    if contour.len() > 1 && contour.first() == contour.last() {
                        contour.pop();
                    }
                }
            }
        }
        contours.extend(current.map(Contour));
        Ok(SimpleGlyph {
            bbox: path.control_box().into(),
            contours,
            ..Default::default()
        })
    }

    /// The total number of points in all contours.
    pub fn num_points(&self) -> usize {
        self.contours.iter().map(Contour::len).sum()
    }

    /// Recompute the Glyph's bounding box based on the current contours
    pub fn recompute_bounding_box(&mut self) {
        if let Some(bbox) =
            Bbox::from_points(self.contours.iter().flat_map(|c| c.iter()).map(|p| (p.x, p.y)))
        {
            self.bbox = bbox;
        }
    }

    pub(crate) fn read(data: FontData) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let number_of_contours: i16 = cursor.read()?;
        let bbox = Bbox::read(&mut cursor)?;
        let end_pts: Vec<u16> = cursor.read_array(number_of_contours.max(0) as usize)?;
        if end_pts.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(ReadError::MalformedData("contour end points are not increasing"));
        }
        let instruction_len: u16 = cursor.read()?;
        let instructions = cursor.read_bytes(instruction_len as usize)?.to_vec();
        let num_points = end_pts.last().map(|end| *end as usize + 1).unwrap_or_default();

        let mut flags = Vec::with_capacity(num_points);
        while flags.len() < num_points {
            let flag: u8 = cursor.read()?;
            let repeat = if flag & REPEAT_FLAG != 0 {
                cursor.read::<u8>()? as usize
            } else {
                0
            };
            flags.extend(std::iter::repeat(flag).take(repeat + 1));
        }
        flags.truncate(num_points);

        let xs = read_coords(
            &mut cursor,
            &flags,
            X_SHORT_VECTOR,
            X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR,
        )?;
        let ys = read_coords(
            &mut cursor,
            &flags,
            Y_SHORT_VECTOR,
            Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR,
        )?;
        let mut points = flags
            .iter()
            .zip(xs.into_iter().zip(ys))
            .map(|(flag, (x, y))| CurvePoint::new(x, y, flag & ON_CURVE_POINT != 0));

        let mut start = 0;
        let mut contours = Vec::with_capacity(end_pts.len());
        for end in end_pts {
            let end = end as usize + 1;
            contours.push(Contour(points.by_ref().take(end - start).collect()));
            start = end;
        }
        Ok(SimpleGlyph {
            bbox,
            contours,
            instructions,
            overlap: flags.first().is_some_and(|flag| flag & OVERLAP_SIMPLE != 0),
        })
    }

    pub(crate) fn check(&self) -> Result<(), EncodeError> {
        if self.contours.len() > i16::MAX as usize {
            return Err(EncodeError("too many contours"));
        }
        if self.num_points() > u16::MAX as usize {
            return Err(EncodeError("too many points"));
        }
        if self.instructions.len() > u16::MAX as usize {
            return Err(EncodeError("instructions len overflows"));
        }
        Ok(())
    }

    /// Compute the flags and deltas for this glyph's points.
    ///
    /// This does not do the final binary encoding, and it also does not handle
    /// repeating flags.
    fn compute_point_deltas(&self) -> impl Iterator<Item = (u8, CoordDelta, CoordDelta)> + '_ {
        // reused for x & y by passing in the flags
        fn flag_and_delta(value: i16, short_flag: u8, same_or_pos: u8) -> (u8, CoordDelta) {
            const SHORT_MAX: i16 = u8::MAX as i16;
            const SHORT_MIN: i16 = -SHORT_MAX;
            match value {
                0 => (same_or_pos, CoordDelta::Skip),
                SHORT_MIN..=-1 => (short_flag, CoordDelta::Short(value.unsigned_abs() as u8)),
                1..=SHORT_MAX => (short_flag | same_or_pos, CoordDelta::Short(value as _)),
                _other => (0, CoordDelta::Long(value)),
            }
        }

        let (mut last_x, mut last_y) = (0i16, 0i16);
        let mut first = self.overlap;
        let mut iter = self.contours.iter().flat_map(|c| c.iter());
        std::iter::from_fn(move || {
            let point = iter.next()?;
            let mut flag = 0;
            let d_x = point.x.wrapping_sub(last_x);
            let d_y = point.y.wrapping_sub(last_y);
            last_x = point.x;
            last_y = point.y;

            if point.on_curve {
                flag |= ON_CURVE_POINT;
            }
            if std::mem::take(&mut first) {
                flag |= OVERLAP_SIMPLE;
            }
            let (x_flag, x_data) =
                flag_and_delta(d_x, X_SHORT_VECTOR, X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR);
            let (y_flag, y_data) =
                flag_and_delta(d_y, Y_SHORT_VECTOR, Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR);

            flag |= x_flag | y_flag;
            Some((flag, x_data, y_data))
        })
    }
}

fn read_coords(
    cursor: &mut Cursor,
    flags: &[u8],
    short_flag: u8,
    same_or_pos: u8,
) -> Result<Vec<i16>, ReadError> {
    let mut value = 0i16;
    let mut coords = Vec::with_capacity(flags.len());
    for flag in flags {
        let delta = match (flag & short_flag != 0, flag & same_or_pos != 0) {
            (true, true) => cursor.read::<u8>()? as i16,
            (true, false) => -(cursor.read::<u8>()? as i16),
            (false, true) => 0,
            (false, false) => cursor.read::<i16>()?,
        };
        value = value.wrapping_add(delta);
        coords.push(value);
    }
    Ok(coords)
}

impl Contour {
    /// The total number of points in this contour
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if this contour is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CurvePoint> {
        self.0.iter()
    }
}

impl From<Vec<CurvePoint>> for Contour {
    fn from(points: Vec<CurvePoint>) -> Self {
        Self(points)
    }
}

/// A little helper for managing how we're representing a given delta
#[derive(Clone, Copy, Debug)]
enum CoordDelta {
    // this is a repeat (set in the flag) and so we write nothing
    Skip,
    Short(u8),
    Long(i16),
}

impl FontWrite for CoordDelta {
    fn write_into(&self, writer: &mut TableWriter) {
        match self {
            CoordDelta::Skip => (),
            CoordDelta::Short(val) => val.write_into(writer),
            CoordDelta::Long(val) => val.write_into(writer),
        }
    }
}

impl FontWrite for SimpleGlyph {
    fn write_into(&self, writer: &mut TableWriter) {
        let n_contours = self.contours.len() as i16;
        if n_contours == 0 {
            // empty glyphs take no space
            return;
        }
        n_contours.write_into(writer);
        self.bbox.write_into(writer);
        let mut cur = 0;
        for contour in &self.contours {
            cur += contour.len();
            (cur.saturating_sub(1) as u16).write_into(writer);
        }
        (self.instructions.len() as u16).write_into(writer);
        writer.write_slice(&self.instructions);

        let deltas = self.compute_point_deltas().collect::<Vec<_>>();
        RepeatableFlag::iter_from_flags(deltas.iter().map(|(flag, _, _)| *flag))
            .for_each(|flag| flag.write_into(writer));
        deltas.iter().for_each(|(_, x, _)| x.write_into(writer));
        deltas.iter().for_each(|(_, _, y)| y.write_into(writer));
        writer.pad_to_2byte_aligned();
    }
}

/// A little helper for writing flags that may have a 'repeat' byte
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RepeatableFlag {
    flag: u8,
    repeat: u8,
}

impl FontWrite for RepeatableFlag {
    fn write_into(&self, writer: &mut TableWriter) {
        self.flag.write_into(writer);
        if self.flag & REPEAT_FLAG != 0 {
            self.repeat.write_into(writer);
        }
    }
}

impl RepeatableFlag {
    /// given an iterator over raw flags, return an iterator over flags + repeat values
    fn iter_from_flags(flags: impl IntoIterator<Item = u8>) -> impl Iterator<Item = RepeatableFlag> {
        let mut iter = flags.into_iter();
        let mut prev = None;
        // a flag that repeats exactly once costs the same either way; like
        // fontmake, we write it twice rather than with a repeat count of 1.
        let mut decompose_single_repeat = None;

        std::iter::from_fn(move || loop {
            if let Some(repeat) = decompose_single_repeat.take() {
                return Some(repeat);
            }

            match (iter.next(), prev.take()) {
                (None, Some(RepeatableFlag { flag, repeat: 1 })) => {
                    let flag = flag & !REPEAT_FLAG;
                    decompose_single_repeat = Some(RepeatableFlag { flag, repeat: 0 });
                    return decompose_single_repeat;
                }
                (None, prev) => return prev,
                (Some(flag), None) => prev = Some(RepeatableFlag { flag, repeat: 0 }),
                (Some(flag), Some(mut last)) => {
                    if (last.flag & !REPEAT_FLAG) == flag && last.repeat < u8::MAX {
                        last.repeat += 1;
                        last.flag |= REPEAT_FLAG;
                        prev = Some(last);
                    } else {
                        if last.repeat == 1 {
                            last.flag &= !REPEAT_FLAG;
                            last.repeat = 0;
                            // stash the extra flag for the next pass
                            decompose_single_repeat = Some(last);
                        }
                        prev = Some(RepeatableFlag { flag, repeat: 0 });
                        return Some(last);
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::write::dump_table;

    use super::*;

    fn square() -> SimpleGlyph {
        SimpleGlyph::new(vec![Contour(vec![
            CurvePoint::on_curve(0, 0),
            CurvePoint::on_curve(100, 0),
            CurvePoint::on_curve(100, 100),
            CurvePoint::on_curve(0, 100),
        ])])
    }

    #[test]
    fn new_computes_bbox() {
        let glyph = square();
        assert_eq!(
            glyph.bbox,
            Bbox {
                x_min: 0,
                y_min: 0,
                x_max: 100,
                y_max: 100
            }
        );
    }

    #[test]
    fn compact_encoding() {
        let glyph = square();
        let bytes = dump_table(&glyph);
        // header (10) + end point (2) + instruction len (2) + 4 flags + 2 x + 2 y
        assert_eq!(bytes.len(), 10 + 2 + 2 + 4 + 2 + 2);
        let reloaded = SimpleGlyph::read(FontData::new(&bytes)).unwrap();
        assert_eq!(reloaded, glyph);
    }

    #[test]
    fn long_and_negative_deltas() {
        let glyph = SimpleGlyph::new(vec![Contour(vec![
            CurvePoint::on_curve(-300, 5),
            CurvePoint::off_curve(1000, -5),
            CurvePoint::on_curve(-300, -1000),
        ])]);
        let bytes = dump_table(&glyph);
        let reloaded = SimpleGlyph::read(FontData::new(&bytes)).unwrap();
        assert_eq!(reloaded, glyph);
    }

    #[test]
    fn overlap_flag_survives() {
        let mut glyph = square();
        glyph.overlap = true;
        let bytes = dump_table(&glyph);
        assert_eq!(bytes[14] & OVERLAP_SIMPLE, OVERLAP_SIMPLE);
        assert!(SimpleGlyph::read(FontData::new(&bytes)).unwrap().overlap);
    }

    #[test]
    fn repeat_flags() {
        let flags = [1u8, 1, 1, 1, 3, 3, 5];
        let repeated: Vec<_> = RepeatableFlag::iter_from_flags(flags).collect();
        assert_eq!(
            repeated,
            [
                RepeatableFlag {
                    flag: 1 | REPEAT_FLAG,
                    repeat: 3
                },
                RepeatableFlag { flag: 3, repeat: 0 },
                RepeatableFlag { flag: 3, repeat: 0 },
                RepeatableFlag { flag: 5, repeat: 0 },
            ]
        );
    }

    #[test]
    fn repeated_flags_are_expanded() {
        let glyph = SimpleGlyph::new(vec![Contour(
            (0..10).map(|i| CurvePoint::on_curve(i * 10, 0)).collect(),
        )]);
        let bytes = dump_table(&glyph);
        let reloaded = SimpleGlyph::read(FontData::new(&bytes)).unwrap();
        assert_eq!(reloaded.num_points(), 10);
        assert_eq!(reloaded, glyph);
    }

    #[test]
    fn unsorted_end_points() {
        let bytes = [0u8, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3, 0, 1];
        assert!(matches!(
            SimpleGlyph::read(FontData::new(&bytes)),
            Err(ReadError::MalformedData(_))
        ));
    }

    #[cfg(feature = "kurbo")]
    #[test]
    fn from_bezpath() {
        let mut path = kurbo::BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((100.4, 0.0));
        path.quad_to((150.0, 50.0), (100.0, 100.0));
        path.line_to((0.0, 0.0));
        path.close_path();
        let glyph = SimpleGlyph::from_bezpath(&path).unwrap();
        assert_eq!(glyph.contours.len(), 1);
        assert_eq!(glyph.num_points(), 4);
        assert!(!glyph.contours[0].0[2].on_curve);
        assert_eq!(glyph.bbox.x_max, 150);
    }

    #[cfg(feature = "kurbo")]
    #[test]
    fn cubic_is_rejected() {
        let mut path = kurbo::BezPath::new();
        path.move_to((0.0, 0.0));
        path.curve_to((1.0, 1.0), (2.0, 2.0), (3.0, 3.0));
        assert!(matches!(
            SimpleGlyph::from_bezpath(&path),
            Err(MalformedPath::HasCubic)
        ));
    }
}
