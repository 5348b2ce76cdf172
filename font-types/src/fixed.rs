//! fixed-point numerical types

/// A 32-bit signed fixed-point number with 16 bits of fraction (16.16).
///
/// Used for values such as `head.fontRevision` and `post.italicAngle`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fixed(i32);

impl Fixed {
    /// Zero.
    pub const ZERO: Self = Self(0);
    /// One.
    pub const ONE: Self = Self(1 << 16);

    /// Create a value from its raw 16.16 bits.
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    /// The raw 16.16 bits.
    pub const fn to_bits(self) -> i32 {
        self.0
    }

    /// Create a value from an integer.
    pub const fn from_i16(int: i16) -> Self {
        Self((int as i32) << 16)
    }

    /// Creates a fixed point value from an `f64`, rounding to the nearest
    /// representable value.
    pub fn from_f64(x: f64) -> Self {
        Self((x * 65536.0).round() as i32)
    }

    /// Returns the value as an `f64`. This is lossless.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 65536.0
    }
}

crate::raw::newtype_scalar!(Fixed, i32);

impl std::fmt::Display for Fixed {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.to_f64(), f)
    }
}

impl std::fmt::Debug for Fixed {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.to_f64(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Scalar;

    #[test]
    fn float_conversion() {
        assert_eq!(Fixed::from_f64(1.5).to_bits(), 0x0001_8000);
        assert_eq!(Fixed::from_f64(-1.0).to_bits(), -65536);
        assert_eq!(Fixed::from_i16(3), Fixed::from_f64(3.0));
        assert_eq!(Fixed::from_bits(0x0002_4000).to_f64(), 2.25);
    }

    #[test]
    fn raw_bytes() {
        assert_eq!(Fixed::ONE.to_raw(), [0, 1, 0, 0]);
        assert_eq!(Fixed::read(&[0xff, 0xff, 0, 0]), Some(Fixed::from_i16(-1)));
    }
}
