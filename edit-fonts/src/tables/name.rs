//! The [name (Naming)][name] table
//!
//! [name]: https://docs.microsoft.com/en-us/typography/opentype/spec/name

use std::collections::HashMap;

use font_types::Tag;

use super::FontTable;
use crate::{
    font_data::FontData,
    read::ReadError,
    registry::LoadContext,
    validate::{Validate, ValidationCtx},
    write::{EncodeError, FontWrite, TableWriter},
    Error,
};

const WINDOWS_PLATFORM: u16 = 3;
const UNICODE_PLATFORM: u16 = 0;
const WINDOWS_UNICODE_BMP: u16 = 1;
const WINDOWS_ENGLISH_US: u16 = 0x409;

/// The [name] table.
///
/// Strings are kept as their encoded bytes; [`NameRecord::string`] decodes
/// the UTF-16 ones.
///
/// [name]: https://docs.microsoft.com/en-us/typography/opentype/spec/name
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Name {
    pub name_record: Vec<NameRecord>,
    /// Language tags, UTF-16BE encoded. A version 1 table is written if
    /// there are any.
    pub lang_tag_record: Vec<Vec<u8>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NameRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub name_id: u16,
    pub string: Vec<u8>,
}

impl NameRecord {
    /// A Windows, English (US) record.
    pub fn new_windows(name_id: u16, string: &str) -> Self {
        NameRecord {
            platform_id: WINDOWS_PLATFORM,
            encoding_id: WINDOWS_UNICODE_BMP,
            language_id: WINDOWS_ENGLISH_US,
            name_id,
            string: string.encode_utf16().flat_map(u16::to_be_bytes).collect(),
        }
    }

    fn is_utf16(&self) -> bool {
        matches!(self.platform_id, UNICODE_PLATFORM | WINDOWS_PLATFORM)
    }

    /// The decoded string, for records in a UTF-16 encoding.
    pub fn string(&self) -> Option<String> {
        if !self.is_utf16() || self.string.len() % 2 != 0 {
            return None;
        }
        let units: Vec<u16> = self
            .string
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units).ok()
    }

    fn key(&self) -> (u16, u16, u16, u16) {
        (
            self.platform_id,
            self.encoding_id,
            self.language_id,
            self.name_id,
        )
    }
}

impl Name {
    pub fn new(name_record: Vec<NameRecord>) -> Self {
        Name {
            name_record,
            lang_tag_record: Vec::new(),
        }
    }

    /// The Windows English string for `name_id`, if there is one.
    pub fn get(&self, name_id: u16) -> Option<String> {
        self.name_record
            .iter()
            .find(|rec| {
                rec.name_id == name_id
                    && rec.platform_id == WINDOWS_PLATFORM
                    && rec.language_id == WINDOWS_ENGLISH_US
            })
            .and_then(NameRecord::string)
    }

    /// Set the Windows English string for `name_id`, replacing any existing one.
    pub fn set(&mut self, name_id: u16, string: &str) {
        let record = NameRecord::new_windows(name_id, string);
        match self.name_record.iter_mut().find(|rec| rec.key() == record.key()) {
            Some(existing) => *existing = record,
            None => self.name_record.push(record),
        }
    }

    fn compute_version(&self) -> u16 {
        (!self.lang_tag_record.is_empty()).into()
    }
}

impl FontTable for Name {
    const TAG: Tag = Tag::new(b"name");

    type Args = ();

    fn read_args(_ctx: &mut LoadContext) -> Result<(), Error> {
        Ok(())
    }

    fn decode(data: FontData, _args: &()) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let version: u16 = cursor.read()?;
        if version > 1 {
            return Err(ReadError::InvalidFormat(version as i64));
        }
        let count: u16 = cursor.read()?;
        let storage_offset = cursor.read::<u16>()? as usize;
        let read_string = |offset: u16, length: u16| {
            let start = storage_offset + offset as usize;
            data.slice(start..start + length as usize)
                .map(|bytes| bytes.as_bytes().to_vec())
                .ok_or(ReadError::OutOfBounds)
        };

        let mut name_record = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let platform_id = cursor.read()?;
            let encoding_id = cursor.read()?;
            let language_id = cursor.read()?;
            let name_id = cursor.read()?;
            let length = cursor.read()?;
            let offset = cursor.read()?;
            name_record.push(NameRecord {
                platform_id,
                encoding_id,
                language_id,
                name_id,
                string: read_string(offset, length)?,
            });
        }
        let mut lang_tag_record = Vec::new();
        if version == 1 {
            let lang_tag_count: u16 = cursor.read()?;
            for _ in 0..lang_tag_count {
                let length = cursor.read()?;
                let offset = cursor.read()?;
                lang_tag_record.push(read_string(offset, length)?);
            }
        }
        Ok(Name {
            name_record,
            lang_tag_record,
        })
    }

    /// Records are written sorted, and identical strings share storage.
    fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut records: Vec<&NameRecord> = self.name_record.iter().collect();
        records.sort();

        let strings = records
            .iter()
            .map(|rec| rec.string.as_slice())
            .chain(self.lang_tag_record.iter().map(Vec::as_slice));
        let mut storage = Vec::new();
        let mut seen: HashMap<&[u8], u16> = HashMap::new();
        let mut locations = Vec::new();
        for bytes in strings {
            let length =
                u16::try_from(bytes.len()).map_err(|_| EncodeError("name string too long"))?;
            let offset = match seen.get(bytes) {
                Some(offset) => *offset,
                None => {
                    let offset = u16::try_from(storage.len())
                        .map_err(|_| EncodeError("name string storage overflows"))?;
                    storage.extend_from_slice(bytes);
                    seen.insert(bytes, offset);
                    offset
                }
            };
            locations.push((length, offset));
        }
        let (record_locations, lang_tag_locations) = locations.split_at(records.len());

        let version = self.compute_version();
        let mut header_len = 6 + 12 * records.len();
        if version == 1 {
            header_len += 2 + 4 * lang_tag_locations.len();
        }
        let storage_offset =
            u16::try_from(header_len).map_err(|_| EncodeError("too many name records"))?;

        let mut writer = TableWriter::default();
        version.write_into(&mut writer);
        (records.len() as u16).write_into(&mut writer);
        storage_offset.write_into(&mut writer);
        for (rec, (length, offset)) in records.iter().zip(record_locations) {
            let (length, offset) = (*length, *offset);
            [
                rec.platform_id,
                rec.encoding_id,
                rec.language_id,
                rec.name_id,
                length,
                offset,
            ]
            .write_into(&mut writer);
        }
        if version == 1 {
            (lang_tag_locations.len() as u16).write_into(&mut writer);
            for (length, offset) in lang_tag_locations {
                [*length, *offset].write_into(&mut writer);
            }
        }
        writer.write_slice(&storage);
        Ok(writer.into_data())
    }

    any_table_conversions!(Name);
}

impl Validate for Name {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("name", |ctx| {
            ctx.in_field("name_record", |ctx| {
                let mut keys: Vec<_> = self.name_record.iter().map(NameRecord::key).collect();
                keys.sort();
                for pair in keys.windows(2) {
                    if pair[0] == pair[1] {
                        ctx.report(format!("duplicate entry in name_record: '{}'", pair[0].3));
                    }
                }
                for (i, rec) in self.name_record.iter().enumerate() {
                    ctx.in_index(i, |ctx| {
                        if rec.is_utf16() && rec.string.len() % 2 != 0 {
                            ctx.report("odd length for a UTF-16 string");
                        }
                        if rec.string.len() > u16::MAX as usize {
                            ctx.report("string too long");
                        }
                    })
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use font_test_data::ttf;

    use super::*;

    #[test]
    fn decode_fixture() {
        let data = ttf::name();
        let name = Name::decode(FontData::new(&data), &()).unwrap();
        assert_eq!(name.name_record.len(), 2);
        assert_eq!(name.get(1).as_deref(), Some("Test"));
        assert_eq!(name.get(2).as_deref(), Some("Regular"));
        assert_eq!(name.get(3), None);
        assert_eq!(name.encode().unwrap(), data.as_slice());
    }

    #[test]
    fn sorted_and_shared() {
        let name = Name::new(vec![
            NameRecord::new_windows(4, "Test Regular"),
            NameRecord::new_windows(1, "Same"),
            NameRecord::new_windows(16, "Same"),
        ]);
        let dumped = name.encode().unwrap();
        // three records, two distinct strings
        assert_eq!(dumped.len(), 6 + 3 * 12 + 2 * "Test Regular".len() + 2 * "Same".len());
        let reloaded = Name::decode(FontData::new(&dumped), &()).unwrap();
        let ids: Vec<_> = reloaded.name_record.iter().map(|rec| rec.name_id).collect();
        assert_eq!(ids, [1, 4, 16]);
        assert_eq!(reloaded.get(16).as_deref(), Some("Same"));
    }

    #[test]
    fn version_1() {
        let mut name = Name::new(vec![NameRecord::new_windows(1, "Test")]);
        name.lang_tag_record.push("en".encode_utf16().flat_map(u16::to_be_bytes).collect());
        let dumped = name.encode().unwrap();
        assert_eq!(u16::from_be_bytes([dumped[0], dumped[1]]), 1);
        let reloaded = Name::decode(FontData::new(&dumped), &()).unwrap();
        assert_eq!(reloaded, name);
    }

    #[test]
    fn set_replaces() {
        let mut name = Name::new(vec![NameRecord::new_windows(1, "Old")]);
        name.set(1, "New");
        name.set(2, "Bold");
        assert_eq!(name.name_record.len(), 2);
        assert_eq!(name.get(1).as_deref(), Some("New"));
    }

    #[test]
    fn validate_duplicates() {
        let name = Name::new(vec![
            NameRecord::new_windows(1, "A"),
            NameRecord::new_windows(1, "B"),
        ]);
        let report = name.validate().unwrap_err();
        assert_eq!(report.len(), 1);
    }

    #[test]
    #[cfg(feature = "serde")]
    fn serde_roundtrip() {
        let data = ttf::name();
        let name = Name::decode(FontData::new(&data), &()).unwrap();
        let json = serde_json::to_string(&name).unwrap();
        let loaded: Name = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, name);
    }

    #[test]
    fn string_out_of_bounds() {
        let mut data = ttf::name().into_vec();
        data.truncate(data.len() - 4);
        assert!(matches!(
            Name::decode(FontData::new(&data), &()),
            Err(ReadError::OutOfBounds)
        ));
    }
}
