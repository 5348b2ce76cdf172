//! Version number encodings

/// Packed 32-bit value with major and minor version numbers.
///
/// This is a legacy encoding where the minor version is stored as a single
/// decimal digit in the high nibble of the low word (so 0.5 is `0x00005000`).
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Version16Dot16(u32);

/// A major, minor version pair, stored as two consecutive `u16`s.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MajorMinor {
    /// The major version number
    pub major: u16,
    /// The minor version number
    pub minor: u16,
}

impl Version16Dot16 {
    /// Version 0.5
    pub const VERSION_0_5: Version16Dot16 = Version16Dot16::new(0, 5);
    /// Version 1.0
    pub const VERSION_1_0: Version16Dot16 = Version16Dot16::new(1, 0);
    /// Version 2.0
    pub const VERSION_2_0: Version16Dot16 = Version16Dot16::new(2, 0);
    /// Version 3.0
    pub const VERSION_3_0: Version16Dot16 = Version16Dot16::new(3, 0);

    /// Create a new version with the provided major and minor parts.
    ///
    /// # Panics
    ///
    /// Panics if `minor > 9`.
    pub const fn new(major: u16, minor: u16) -> Self {
        assert!(minor < 10, "minor version must be in the range [0, 9)");
        Version16Dot16((major as u32) << 16 | (minor as u32) << 12)
    }

    /// Return the separate major & minor version numbers.
    pub const fn to_major_minor(self) -> (u16, u16) {
        ((self.0 >> 16) as u16, ((self.0 & 0xFFFF) >> 12) as u16)
    }

    /// The raw packed value.
    pub const fn to_u32(self) -> u32 {
        self.0
    }
}

impl MajorMinor {
    /// Version 1.0
    pub const VERSION_1_0: MajorMinor = MajorMinor::new(1, 0);

    /// Create a new version pair.
    pub const fn new(major: u16, minor: u16) -> Self {
        MajorMinor { major, minor }
    }
}

crate::raw::newtype_scalar!(Version16Dot16, u32);

impl crate::raw::Scalar for MajorMinor {
    type Raw = [u8; 4];

    fn from_raw(raw: [u8; 4]) -> Self {
        MajorMinor {
            major: u16::from_be_bytes([raw[0], raw[1]]),
            minor: u16::from_be_bytes([raw[2], raw[3]]),
        }
    }

    fn to_raw(self) -> [u8; 4] {
        let [a, b] = self.major.to_be_bytes();
        let [c, d] = self.minor.to_be_bytes();
        [a, b, c, d]
    }
}

impl std::fmt::Debug for Version16Dot16 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Version16Dot16({:#010X})", self.0)
    }
}

impl std::fmt::Display for Version16Dot16 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (major, minor) = self.to_major_minor();
        write!(f, "{major}.{minor}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Scalar;

    #[test]
    fn version_encoding() {
        assert_eq!(Version16Dot16::VERSION_0_5.to_u32(), 0x0000_5000);
        assert_eq!(Version16Dot16::VERSION_1_0.to_u32(), 0x0001_0000);
        assert_eq!(Version16Dot16::new(2, 5).to_major_minor(), (2, 5));
        assert_eq!(Version16Dot16::VERSION_3_0.to_string(), "3.0");
    }

    #[test]
    fn major_minor_raw() {
        let raw = MajorMinor::new(1, 2).to_raw();
        assert_eq!(raw, [0, 1, 0, 2]);
        assert_eq!(MajorMinor::from_raw(raw), MajorMinor::new(1, 2));
    }
}
