//! Conversion between scalars and their big-endian byte representation

/// A trait for font scalars.
///
/// Every value stored in a font file is big-endian. Implementors describe how
/// to move between the in-memory value and those raw bytes; reading and
/// writing code elsewhere is generic over this trait.
pub trait Scalar: Sized + Copy {
    /// The raw byte representation of this type.
    type Raw: Copy + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// The number of bytes used to encode this type.
    const RAW_BYTE_LEN: usize = std::mem::size_of::<Self::Raw>();

    /// Create an instance of this type from raw big-endian bytes
    fn from_raw(raw: Self::Raw) -> Self;

    /// Encode this type as raw big-endian bytes
    fn to_raw(self) -> Self::Raw;

    /// Attempt to read a value from the start of `bytes`.
    ///
    /// Returns `None` if there are not enough bytes.
    fn read(bytes: &[u8]) -> Option<Self> {
        let raw = bytes.get(..Self::RAW_BYTE_LEN)?;
        Self::Raw::try_from(raw).ok().map(Self::from_raw)
    }
}

macro_rules! int_scalar {
    ($ty:ty, $len:literal) => {
        impl Scalar for $ty {
            type Raw = [u8; $len];

            fn from_raw(raw: [u8; $len]) -> $ty {
                <$ty>::from_be_bytes(raw)
            }

            fn to_raw(self) -> [u8; $len] {
                self.to_be_bytes()
            }
        }
    };
}

int_scalar!(u8, 1);
int_scalar!(i8, 1);
int_scalar!(u16, 2);
int_scalar!(i16, 2);
int_scalar!(u32, 4);
int_scalar!(i32, 4);
int_scalar!(i64, 8);

/// Implement [`Scalar`] for a newtype around a type that is already a scalar.
macro_rules! newtype_scalar {
    ($name:ident, $inner:ty) => {
        impl $crate::raw::Scalar for $name {
            type Raw = <$inner as $crate::raw::Scalar>::Raw;

            fn from_raw(raw: Self::Raw) -> Self {
                Self(<$inner as $crate::raw::Scalar>::from_raw(raw))
            }

            fn to_raw(self) -> Self::Raw {
                $crate::raw::Scalar::to_raw(self.0)
            }
        }
    };
}

pub(crate) use newtype_scalar;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_ints() {
        assert_eq!(u16::read(&[0x01, 0x02, 0xff]), Some(0x0102));
        assert_eq!(i16::read(&[0xff, 0xfe]), Some(-2));
        assert_eq!(u32::read(&[0, 0, 1]), None);
        assert_eq!(u32::RAW_BYTE_LEN, 4);
    }

    #[test]
    fn raw_is_big_endian() {
        assert_eq!(0x0a0bu16.to_raw(), [0x0a, 0x0b]);
        assert_eq!((-1i32).to_raw(), [0xff; 4]);
    }
}
