//! Tables without a structured representation

use super::AnyTable;

/// The bytes of a table this crate does not interpret.
///
/// Raw tables are written back exactly as they were read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawTable {
    pub data: Vec<u8>,
}

impl RawTable {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        RawTable { data: data.into() }
    }
}

impl From<RawTable> for AnyTable {
    fn from(src: RawTable) -> AnyTable {
        AnyTable::Raw(src)
    }
}
