//! The four-byte table identifier

use std::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};

/// An OpenType tag.
///
/// [Per OpenType][spec], a tag is a 4-byte array where each byte is in the
/// printable ASCII range `(0x20..=0x7E)`.
///
/// Tags read from existing fonts are not checked, since invalid tags do occur
/// in the wild and still need to round-trip. New tags can be checked with
/// [`Tag::new_checked`].
///
/// Tags order bytewise, which is the order required for the table directory.
///
/// [spec]: https://learn.microsoft.com/en-us/typography/opentype/spec/otff#data-types
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Tag([u8; 4]);

impl Tag {
    /// Construct a `Tag` from raw bytes, without validation.
    pub const fn new(src: &[u8; 4]) -> Tag {
        Tag(*src)
    }

    /// Attempt to create a `Tag` from between one and four printable ascii bytes.
    ///
    /// Shorter input is padded with spaces. The first byte may not be a space,
    /// and no non-space byte may follow a space.
    pub const fn new_checked(src: &[u8]) -> Result<Self, InvalidTag> {
        if src.is_empty() || src.len() > 4 {
            return Err(InvalidTag::InvalidLength(src.len()));
        }
        let mut raw = [b' '; 4];
        let mut seen_space = false;
        let mut i = 0;
        while i < src.len() {
            let byte = src[i];
            if byte < 0x20 || byte > 0x7e || (byte == 0x20 && i == 0) {
                return Err(InvalidTag::InvalidByte { pos: i, byte });
            }
            if byte != 0x20 && seen_space {
                return Err(InvalidTag::ByteAfterSpace { pos: i });
            }
            seen_space |= byte == 0x20;
            raw[i] = byte;
            i += 1;
        }
        Ok(Tag(raw))
    }

    /// Create a tag from a big-endian `u32`, without validation.
    pub const fn from_u32(src: u32) -> Self {
        Tag(src.to_be_bytes())
    }

    /// Create a tag from raw big-endian bytes, without validation.
    pub const fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Tag(bytes)
    }

    /// Return the memory representation of this tag.
    pub const fn to_be_bytes(self) -> [u8; 4] {
        self.0
    }

    /// The tag as a big-endian `u32`.
    pub const fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

/// An error representing an invalid tag.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidTag {
    /// The tag was not between 1 and 4 bytes in length.
    InvalidLength(usize),
    /// The tag contained a byte outside the printable ASCII range, or began
    /// with a space.
    InvalidByte { pos: usize, byte: u8 },
    /// The tag contained a non-space character after a space.
    ByteAfterSpace { pos: usize },
}

impl FromStr for Tag {
    type Err = InvalidTag;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        Tag::new_checked(src.as_bytes())
    }
}

crate::raw::newtype_scalar!(Tag, [u8; 4]);

impl crate::raw::Scalar for [u8; 4] {
    type Raw = [u8; 4];

    fn from_raw(raw: [u8; 4]) -> Self {
        raw
    }

    fn to_raw(self) -> [u8; 4] {
        self
    }
}

impl PartialEq<&[u8; 4]> for Tag {
    fn eq(&self, other: &&[u8; 4]) -> bool {
        &self.0 == *other
    }
}

impl AsRef<[u8]> for Tag {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            if (0x20..=0x7E).contains(&byte) {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "{{0x{byte:02X}}}")?;
            }
        }
        Ok(())
    }
}

impl Debug for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tag({self})")
    }
}

impl Display for InvalidTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidTag::InvalidLength(len) => write!(f, "Invalid length ({len})"),
            InvalidTag::InvalidByte { pos, byte } => {
                write!(f, "Invalid byte 0x{byte:X} at index {pos}")
            }
            InvalidTag::ByteAfterSpace { pos } => {
                write!(f, "Non-space character after space at index {pos}")
            }
        }
    }
}

impl std::error::Error for InvalidTag {}

#[cfg(feature = "serde")]
impl serde::Serialize for Tag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            let s = std::str::from_utf8(&self.0).map_err(serde::ser::Error::custom)?;
            serializer.serialize_str(s)
        } else {
            serde::Serialize::serialize(&self.0, serializer)
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Tag {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s: std::borrow::Cow<'de, str> = serde::Deserialize::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            let bytes: [u8; 4] = serde::Deserialize::deserialize(deserializer)?;
            Ok(Tag::from_be_bytes(bytes))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_constructor() {
        assert!(Tag::new_checked(b"").is_err());
        assert!(Tag::new_checked(b" ").is_err());
        assert!(Tag::new_checked(b"abcde").is_err());
        assert!(Tag::new_checked(b"b c").is_err());
        assert_eq!(Tag::new_checked(b"cvt"), Ok(Tag::new(b"cvt ")));
        assert_eq!(Tag::new_checked(b"OS/2"), Ok(Tag::new(b"OS/2")));
        assert!(Tag::new_checked(&[0x7F]).is_err());
    }

    #[test]
    fn ordering_is_bytewise() {
        // uppercase sorts before lowercase, as required by the table directory
        let mut tags = [Tag::new(b"head"), Tag::new(b"OS/2"), Tag::new(b"cmap")];
        tags.sort();
        assert_eq!(
            tags,
            [Tag::new(b"OS/2"), Tag::new(b"cmap"), Tag::new(b"head")]
        );
    }

    #[test]
    fn display() {
        let bad_tag = Tag::new(&[0x19, b'z', b'@', 0x7F]);
        assert_eq!(bad_tag.to_string(), "{0x19}z@{0x7F}");
        assert_eq!(format!("{:?}", Tag::new(b"glyf")), "Tag(glyf)");
    }

    #[test]
    fn u32_roundtrip() {
        let tag = Tag::new(b"true");
        assert_eq!(tag.to_u32(), 0x74727565);
        assert_eq!(Tag::from_u32(0x74727565), tag);
    }
}
