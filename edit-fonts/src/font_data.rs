//! raw font bytes

use std::ops::{Bound, RangeBounds};

use font_types::Scalar;

use crate::read::ReadError;

/// A reference to raw binary font data.
///
/// This is a wrapper around a byte slice, that provides convenience methods
/// for parsing and validating that data.
#[derive(Debug, Default, Clone, Copy)]
pub struct FontData<'a> {
    bytes: &'a [u8],
}

/// A cursor for reading sequential values out of [`FontData`].
///
/// Every read is bounds checked; a failed read returns
/// [`ReadError::OutOfBounds`] and leaves the position past the attempted
/// value, so callers should bail on the first error.
pub struct Cursor<'a> {
    pos: usize,
    data: FontData<'a>,
}

impl<'a> FontData<'a> {
    /// Create a new `FontData` with these bytes.
    pub const fn new(bytes: &'a [u8]) -> Self {
        FontData { bytes }
    }

    /// The length of the data, in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// `true` if the data has a length of zero bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn split_off(&self, pos: usize) -> Option<FontData<'a>> {
        self.bytes.get(pos..).map(FontData::new)
    }

    pub fn slice(&self, range: impl RangeBounds<usize>) -> Option<FontData<'a>> {
        let bounds = (range.start_bound().cloned(), range.end_bound().cloned());
        if let (Bound::Included(start), Bound::Excluded(end)) = bounds {
            if start > end {
                return None;
            }
        }
        self.bytes.get(bounds).map(FontData::new)
    }

    pub fn read_at<T: Scalar>(&self, offset: usize) -> Result<T, ReadError> {
        self.bytes
            .get(offset..)
            .and_then(T::read)
            .ok_or(ReadError::OutOfBounds)
    }

    /// Read `count` consecutive scalars starting at `offset`.
    pub fn read_array<T: Scalar>(&self, offset: usize, count: usize) -> Result<Vec<T>, ReadError> {
        let len = count
            .checked_mul(T::RAW_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        let bytes = offset
            .checked_add(len)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or(ReadError::OutOfBounds)?;
        bytes
            .chunks_exact(T::RAW_BYTE_LEN)
            .map(|chunk| T::read(chunk).ok_or(ReadError::OutOfBounds))
            .collect()
    }

    pub fn cursor(&self) -> Cursor<'a> {
        Cursor {
            pos: 0,
            data: *self,
        }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

impl<'a> Cursor<'a> {
    pub fn advance<T: Scalar>(&mut self) {
        self.pos += T::RAW_BYTE_LEN
    }

    pub fn advance_by(&mut self, n_bytes: usize) {
        self.pos += n_bytes;
    }

    pub fn read<T: Scalar>(&mut self) -> Result<T, ReadError> {
        let temp = self.data.read_at(self.pos);
        self.pos += T::RAW_BYTE_LEN;
        temp
    }

    pub fn read_array<T: Scalar>(&mut self, count: usize) -> Result<Vec<T>, ReadError> {
        let temp = self.data.read_array(self.pos, count);
        self.pos += count.saturating_mul(T::RAW_BYTE_LEN);
        temp
    }

    /// Read `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ReadError> {
        let bytes = self
            .pos
            .checked_add(len)
            .and_then(|end| self.data.bytes.get(self.pos..end))
            .ok_or(ReadError::OutOfBounds)?;
        self.pos += len;
        Ok(bytes)
    }

    /// The current position, or an error if we are out of bounds
    pub fn position(&self) -> Result<usize, ReadError> {
        if self.pos <= self.data.len() {
            Ok(self.pos)
        } else {
            Err(ReadError::OutOfBounds)
        }
    }

    // used when handling fields with an implicit length, which must be at the
    // end of a table.
    pub fn remaining_bytes(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// All bytes from the current position to the end of the data.
    pub fn remaining(&self) -> &'a [u8] {
        self.data.bytes.get(self.pos..).unwrap_or_default()
    }
}

impl AsRef<[u8]> for FontData<'_> {
    fn as_ref(&self) -> &[u8] {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_reads_in_order() {
        let data = FontData::new(&[0, 1, 0xff, 0xfe, 0, 0, 0, 7, 9]);
        let mut cursor = data.cursor();
        assert_eq!(cursor.read::<u16>(), Ok(1));
        assert_eq!(cursor.read::<i16>(), Ok(-2));
        assert_eq!(cursor.read::<u32>(), Ok(7));
        assert_eq!(cursor.remaining(), &[9]);
        assert_eq!(cursor.read::<u16>(), Err(ReadError::OutOfBounds));
        assert!(cursor.position().is_err());
    }

    #[test]
    fn arrays_are_bounds_checked() {
        let data = FontData::new(&[0, 1, 0, 2, 0, 3]);
        assert_eq!(data.read_array::<u16>(0, 3), Ok(vec![1, 2, 3]));
        assert_eq!(data.read_array::<u16>(2, 3), Err(ReadError::OutOfBounds));
        assert_eq!(data.read_array::<u32>(0, usize::MAX), Err(ReadError::OutOfBounds));
    }

    #[test]
    fn slicing() {
        let data = FontData::new(&[1, 2, 3, 4]);
        assert_eq!(data.slice(1..3).unwrap().as_bytes(), &[2, 3]);
        assert!(data.slice(3..2).is_none());
        assert!(data.slice(2..5).is_none());
    }
}
