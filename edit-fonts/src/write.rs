//! Encoding structured tables as big-endian bytes

use font_types::Scalar;

/// A type that that can be written out as part of a font file.
pub trait FontWrite {
    /// Write our data into this [TableWriter].
    fn write_into(&self, writer: &mut TableWriter);
}

/// A growable buffer of big-endian font data.
#[derive(Debug, Default)]
pub struct TableWriter {
    data: Vec<u8>,
}

/// A value in a table that cannot be represented in the binary format.
///
/// Typically a count that overflows its field, such as more than 65535
/// records in a table with a 16-bit record count.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct EncodeError(pub &'static str);

/// Serialize a table.
pub fn dump_table<T: FontWrite + ?Sized>(table: &T) -> Vec<u8> {
    let mut writer = TableWriter::default();
    table.write_into(&mut writer);
    writer.into_data()
}

impl TableWriter {
    /// Write raw bytes into this table.
    ///
    /// The caller is responsible for ensuring bytes are in big-endian order.
    #[inline]
    pub fn write_slice(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes)
    }

    /// Write a single scalar value.
    #[inline]
    pub fn write_scalar<T: Scalar>(&mut self, value: T) {
        self.data.extend_from_slice(value.to_raw().as_ref())
    }

    /// The number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Overwrite a previously written `u16` at `pos`.
    ///
    /// Used for lengths that are only known once the data following them
    /// has been written.
    pub fn patch_u16(&mut self, pos: usize, value: u16) {
        if let Some(slot) = self.data.get_mut(pos..pos + 2) {
            slot.copy_from_slice(&value.to_be_bytes());
        }
    }

    /// As [`patch_u16`](Self::patch_u16), for a `u32`.
    pub fn patch_u32(&mut self, pos: usize, value: u32) {
        if let Some(slot) = self.data.get_mut(pos..pos + 4) {
            slot.copy_from_slice(&value.to_be_bytes());
        }
    }

    /// Pad the data with a zero byte if the current length is odd.
    pub fn pad_to_2byte_aligned(&mut self) {
        if self.data.len() % 2 != 0 {
            self.data.push(0);
        }
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

macro_rules! write_be_bytes {
    ($ty:ty) => {
        impl FontWrite for $ty {
            #[inline]
            fn write_into(&self, writer: &mut TableWriter) {
                writer.write_scalar(*self)
            }
        }
    };
}

write_be_bytes!(u8);
write_be_bytes!(i8);
write_be_bytes!(u16);
write_be_bytes!(i16);
write_be_bytes!(u32);
write_be_bytes!(i32);
write_be_bytes!(i64);
write_be_bytes!(font_types::Fixed);
write_be_bytes!(font_types::LongDateTime);
write_be_bytes!(font_types::Tag);
write_be_bytes!(font_types::Version16Dot16);
write_be_bytes!(font_types::MajorMinor);
write_be_bytes!(font_types::GlyphId);

impl<T: FontWrite> FontWrite for [T] {
    fn write_into(&self, writer: &mut TableWriter) {
        self.iter().for_each(|item| item.write_into(writer))
    }
}

impl<T: FontWrite> FontWrite for Vec<T> {
    fn write_into(&self, writer: &mut TableWriter) {
        self.as_slice().write_into(writer)
    }
}

impl<T: FontWrite> FontWrite for Option<T> {
    fn write_into(&self, writer: &mut TableWriter) {
        if let Some(value) = self {
            value.write_into(writer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_are_big_endian() {
        let mut writer = TableWriter::default();
        0x0102u16.write_into(&mut writer);
        (-2i16).write_into(&mut writer);
        font_types::Tag::new(b"head").write_into(&mut writer);
        assert_eq!(writer.into_data(), [1, 2, 0xff, 0xfe, b'h', b'e', b'a', b'd']);
    }

    #[test]
    fn patch_and_pad() {
        let mut writer = TableWriter::default();
        writer.write_scalar(0u16);
        writer.write_slice(&[7]);
        writer.patch_u16(0, 3);
        writer.pad_to_2byte_aligned();
        assert_eq!(writer.len(), 4);
        assert_eq!(writer.into_data(), [0, 3, 7, 0]);
    }

    #[test]
    fn optional_values() {
        let values = vec![Some(1u8), None, Some(2)];
        assert_eq!(dump_table(&values), [1, 2]);
    }
}
