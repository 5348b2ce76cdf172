//! Random access to the bytes of a font file

use std::io::{self, Read, Seek, SeekFrom};

/// Readable, seekable input holding a font file.
///
/// Implemented for anything that is [`Read`] + [`Seek`], such as a
/// [`File`](std::fs::File) or a [`Cursor`](std::io::Cursor) over a buffer.
/// The source knows nothing about fonts; the table directory decides which
/// ranges to read.
pub trait ByteSource {
    /// The total length of the source, in bytes.
    fn byte_len(&mut self) -> io::Result<u64>;

    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// Reading past the end of the source is an error of kind
    /// [`UnexpectedEof`](io::ErrorKind::UnexpectedEof).
    fn read_range(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>>;
}

impl<R: Read + Seek> ByteSource for R {
    fn byte_len(&mut self) -> io::Result<u64> {
        self.seek(SeekFrom::End(0))
    }

    fn read_range(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        self.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_ranges() {
        let mut source = io::Cursor::new(vec![1u8, 2, 3, 4, 5]);
        assert_eq!(source.byte_len().unwrap(), 5);
        assert_eq!(source.read_range(1, 3).unwrap(), [2, 3, 4]);
        assert_eq!(source.read_range(5, 0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn short_read_is_eof() {
        let mut source = io::Cursor::new(vec![1u8, 2, 3]);
        let err = source.read_range(2, 4).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
