//! Table families and the dispatch between them
//!
//! Every table family implements [`FontTable`]. Tables whose tag has no
//! family are kept as [`RawTable`]s.

/// Implement the `AnyTable` conversions of [`FontTable`] for a family.
macro_rules! any_table_conversions {
    ($variant:ident) => {
        fn from_any(table: &$crate::tables::AnyTable) -> Option<&Self> {
            match table {
                $crate::tables::AnyTable::$variant(inner) => Some(inner),
                _ => None,
            }
        }

        fn from_any_mut(table: &mut $crate::tables::AnyTable) -> Option<&mut Self> {
            match table {
                $crate::tables::AnyTable::$variant(inner) => Some(inner),
                _ => None,
            }
        }

        fn into_any(self) -> $crate::tables::AnyTable {
            $crate::tables::AnyTable::$variant(self)
        }
    };
}

pub mod cmap;
pub mod glyf;
pub mod head;
pub mod hhea;
pub mod hmtx;
pub mod loca;
pub mod maxp;
pub mod name;
pub mod os2;
pub mod post;
pub mod raw;

use font_types::Tag;

use crate::{
    font_data::FontData,
    read::ReadError,
    registry::{LoadContext, UpdateContext},
    write::EncodeError,
    Error,
};

pub use raw::RawTable;

/// A family of top-level font tables.
///
/// Decoding is split in two: [`read_args`](Self::read_args) collects
/// whatever the family needs from other tables (loading them if necessary),
/// and [`decode`](Self::decode) interprets this table's own bytes.
pub trait FontTable: Clone + PartialEq + Default + Sized + 'static {
    /// The tag of this table.
    const TAG: Tag;

    /// Tables whose recompute step must run before this table's.
    ///
    /// This table's [`recompute`](Self::recompute) may read these tables.
    const UPSTREAM: &'static [Tag] = &[];

    /// Whether [`recompute`](Self::recompute) does anything.
    const RECOMPUTES: bool = false;

    /// Values from other tables required to decode this one.
    type Args;

    fn read_args(ctx: &mut LoadContext) -> Result<Self::Args, Error>;

    fn decode(data: FontData, args: &Self::Args) -> Result<Self, ReadError>;

    fn encode(&self) -> Result<Vec<u8>, EncodeError>;

    /// Summarize the raw bytes without fully decoding them.
    ///
    /// This runs when the table is first loaded.
    fn shallow_load(_data: FontData, _ctx: &mut LoadContext) -> Result<Option<Summary>, Error> {
        Ok(None)
    }

    /// Update derived values in this table from its upstream tables.
    fn recompute(&mut self, _ctx: &mut UpdateContext) -> Result<(), Error> {
        Ok(())
    }

    fn from_any(table: &AnyTable) -> Option<&Self>;

    fn from_any_mut(table: &mut AnyTable) -> Option<&mut Self>;

    fn into_any(self) -> AnyTable;
}

/// Information available from a table's raw bytes, before a full decode.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Summary {
    Glyf(glyf::GlyphHeaders),
}

macro_rules! table_families {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        /// The structured data of any table.
        #[derive(Clone, Debug, PartialEq)]
        pub enum AnyTable {
            $($variant($ty),)+
            Raw(RawTable),
        }

        $(
            impl From<$ty> for AnyTable {
                fn from(src: $ty) -> AnyTable {
                    AnyTable::$variant(src)
                }
            }
        )+

        impl AnyTable {
            /// The (tag, upstream tags) of every known family.
            pub const FAMILIES: &'static [(Tag, &'static [Tag])] = &[
                $((<$ty as FontTable>::TAG, <$ty as FontTable>::UPSTREAM),)+
            ];

            /// The name of this table's family.
            pub fn family_name(&self) -> &'static str {
                match self {
                    $(AnyTable::$variant(_) => stringify!($variant),)+
                    AnyTable::Raw(_) => "Raw",
                }
            }

            /// An empty table of the family for `tag`.
            pub(crate) fn new_for_tag(tag: Tag) -> AnyTable {
                $(
                    if tag == <$ty as FontTable>::TAG {
                        return <$ty>::default().into_any();
                    }
                )+
                AnyTable::Raw(RawTable::default())
            }

            pub(crate) fn recomputes(tag: Tag) -> bool {
                $(
                    if tag == <$ty as FontTable>::TAG {
                        return <$ty as FontTable>::RECOMPUTES;
                    }
                )+
                false
            }

            pub(crate) fn decode(
                tag: Tag,
                data: FontData,
                ctx: &mut LoadContext,
            ) -> Result<AnyTable, Error> {
                $(
                    if tag == <$ty as FontTable>::TAG {
                        return decode_family::<$ty>(data, ctx).map(FontTable::into_any);
                    }
                )+
                Ok(AnyTable::Raw(RawTable::new(data.as_bytes())))
            }

            pub(crate) fn shallow_load(
                tag: Tag,
                data: FontData,
                ctx: &mut LoadContext,
            ) -> Result<Option<Summary>, Error> {
                $(
                    if tag == <$ty as FontTable>::TAG {
                        return <$ty as FontTable>::shallow_load(data, ctx);
                    }
                )+
                Ok(None)
            }

            pub(crate) fn encode(&self) -> Result<Vec<u8>, EncodeError> {
                match self {
                    $(AnyTable::$variant(table) => table.encode(),)+
                    AnyTable::Raw(table) => Ok(table.data.clone()),
                }
            }

            pub(crate) fn recompute(&mut self, ctx: &mut UpdateContext) -> Result<(), Error> {
                match self {
                    $(AnyTable::$variant(table) => table.recompute(ctx),)+
                    AnyTable::Raw(_) => Ok(()),
                }
            }
        }
    };
}

table_families! {
    Head(head::Head),
    Maxp(maxp::Maxp),
    Hhea(hhea::Hhea),
    Hmtx(hmtx::Hmtx),
    Loca(loca::Loca),
    Glyf(glyf::Glyf),
    Cmap(cmap::Cmap),
    Name(name::Name),
    Os2(os2::Os2),
    Post(post::Post),
}

fn decode_family<T: FontTable>(data: FontData, ctx: &mut LoadContext) -> Result<T, Error> {
    let args = T::read_args(ctx).map_err(|e| match e {
        Error::MissingTable(dep) => Error::TableDecode {
            tag: T::TAG,
            reason: ReadError::TableIsMissing(dep),
        },
        e => e,
    })?;
    T::decode(data, &args).map_err(|reason| Error::TableDecode {
        tag: T::TAG,
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tags_are_raw() {
        let table = AnyTable::new_for_tag(Tag::new(b"fpgm"));
        assert_eq!(table.family_name(), "Raw");
        assert!(!AnyTable::recomputes(Tag::new(b"fpgm")));
        assert_eq!(AnyTable::new_for_tag(head::Head::TAG).family_name(), "Head");
    }

    #[test]
    fn families_are_unique() {
        let mut tags: Vec<_> = AnyTable::FAMILIES.iter().map(|(tag, _)| *tag).collect();
        tags.sort();
        tags.dedup();
        assert_eq!(tags.len(), AnyTable::FAMILIES.len());
    }
}
