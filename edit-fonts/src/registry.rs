//! Ownership of tables, and lazy loading

use std::{collections::BTreeSet, io, sync::Arc};

use font_types::Tag;
use indexmap::IndexMap;

use crate::{
    directory::TableDirectory,
    font_data::FontData,
    source::ByteSource,
    table::Table,
    tables::{glyf::Glyf, loca::Loca, AnyTable, FontTable},
    Error,
};

/// The tables of one font.
///
/// Every access to a table goes through here. Tables are read from the
/// source the first time they are requested, and decoded the first time
/// their structured data is requested; both steps happen at most once.
pub(crate) struct TableRegistry {
    source: Box<dyn ByteSource + Send>,
    directory: TableDirectory,
    tables: IndexMap<Tag, Table>,
    diverged: bool,
    /// Built from scratch: `get` creates missing tables.
    authoring: bool,
}

/// Access to other tables while a table is being decoded.
pub struct LoadContext<'a> {
    registry: &'a mut TableRegistry,
}

/// Access to other tables while a table is being recomputed.
///
/// The table being recomputed works on its own copy of its data; reading it
/// through the context returns the state from before the recompute, and
/// mutating it through the context is an error.
pub struct UpdateContext<'a> {
    registry: &'a mut TableRegistry,
    current: Tag,
}

impl TableRegistry {
    pub(crate) fn new(source: Box<dyn ByteSource + Send>, directory: TableDirectory) -> Self {
        let tables = directory
            .records()
            .map(|record| (record.tag, Table::unloaded(record.tag)))
            .collect();
        TableRegistry {
            source,
            directory,
            tables,
            diverged: false,
            authoring: false,
        }
    }

    pub(crate) fn empty() -> Self {
        TableRegistry {
            authoring: true,
            ..Self::new(
                Box::new(io::Cursor::new(Vec::new())),
                TableDirectory::default(),
            )
        }
    }

    pub(crate) fn directory(&self) -> &TableDirectory {
        &self.directory
    }

    pub(crate) fn contains(&self, tag: Tag) -> bool {
        self.tables.contains_key(&tag)
    }

    /// Tags in insertion order.
    pub(crate) fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.tables.keys().copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.tables.len()
    }

    pub(crate) fn get_if_present(&self, tag: Tag) -> Option<&Table> {
        self.tables.get(&tag)
    }

    /// Shallow load a table.
    ///
    /// When authoring, a missing table is created instead.
    pub(crate) fn get(&mut self, tag: Tag) -> Result<&Table, Error> {
        if self.authoring && !self.contains(tag) {
            return self.get_or_create(tag);
        }
        self.ensure_raw(tag)?;
        self.ensure_summary(tag)?;
        self.tables.get(&tag).ok_or(Error::MissingTable(tag))
    }

    pub(crate) fn get_or_create(&mut self, tag: Tag) -> Result<&Table, Error> {
        if !self.contains(tag) {
            log::debug!("creating empty '{tag}' table");
            self.insert_any(tag, AnyTable::new_for_tag(tag));
        }
        self.get(tag)
    }

    fn ensure_raw(&mut self, tag: Tag) -> Result<(), Error> {
        let table = self.tables.get(&tag).ok_or(Error::MissingTable(tag))?;
        if table.raw.is_some() || table.data.is_some() {
            return Ok(());
        }
        let Some(record) = self.directory.get(tag).copied() else {
            return Ok(());
        };
        log::debug!(
            "reading '{tag}' ({} bytes at offset {})",
            record.length,
            record.offset
        );
        let bytes = self
            .source
            .read_range(record.offset as u64, record.length as usize)?;
        if let Some(table) = self.tables.get_mut(&tag) {
            table.raw = Some(bytes.into());
        }
        Ok(())
    }

    fn ensure_summary(&mut self, tag: Tag) -> Result<(), Error> {
        let Some(table) = self.tables.get(&tag) else {
            return Ok(());
        };
        if table.summary.is_some() || table.data.is_some() {
            return Ok(());
        }
        let Some(raw) = table.raw.clone() else {
            return Ok(());
        };
        let summary = AnyTable::shallow_load(tag, FontData::new(&raw), &mut LoadContext::new(self))?;
        if let Some(table) = self.tables.get_mut(&tag) {
            table.summary = summary;
        }
        Ok(())
    }

    pub(crate) fn ensure_structured(&mut self, tag: Tag) -> Result<(), Error> {
        self.ensure_raw(tag)?;
        let table = self.tables.get(&tag).ok_or(Error::MissingTable(tag))?;
        if table.data.is_some() {
            return Ok(());
        }
        let Some(raw) = table.raw.clone() else {
            return Ok(());
        };
        log::trace!("decoding '{tag}'");
        let data = AnyTable::decode(tag, FontData::new(&raw), &mut LoadContext::new(self))
            .inspect_err(|e| log::warn!("{e}"))?;
        if let Some(table) = self.tables.get_mut(&tag) {
            table.data = Some(data);
        }
        Ok(())
    }

    pub(crate) fn table<T: FontTable>(&mut self) -> Result<&T, Error> {
        self.ensure_structured(T::TAG)?;
        let data = self
            .tables
            .get(&T::TAG)
            .and_then(|table| table.data.as_ref())
            .ok_or(Error::MissingTable(T::TAG))?;
        T::from_any(data).ok_or_else(|| wrong_family::<T>())
    }

    /// Mutable structured access; marks the table dirty.
    pub(crate) fn table_mut<T: FontTable>(&mut self) -> Result<&mut T, Error> {
        self.ensure_structured(T::TAG)?;
        self.contents_changed(T::TAG);
        let table = self
            .tables
            .get_mut(&T::TAG)
            .filter(|table| table.data.is_some())
            .ok_or(Error::MissingTable(T::TAG))?;
        if !table.data.as_ref().is_some_and(|data| T::from_any(data).is_some()) {
            return Err(wrong_family::<T>());
        }
        table.dirty = true;
        table.modified = true;
        table
            .data
            .as_mut()
            .and_then(T::from_any_mut)
            .ok_or_else(|| wrong_family::<T>())
    }

    /// Add a table, or replace the data of an existing one.
    pub(crate) fn insert_any(&mut self, tag: Tag, data: AnyTable) {
        self.contents_changed(tag);
        match self.tables.get_mut(&tag) {
            Some(table) => {
                table.data = Some(data);
                table.summary = None;
                table.dirty = true;
                table.modified = true;
            }
            None => {
                self.tables.insert(tag, Table::authored(tag, data));
                self.diverged = true;
            }
        }
    }

    pub(crate) fn remove(&mut self, tag: Tag) -> Option<Table> {
        let removed = self.tables.shift_remove(&tag);
        if removed.is_some() {
            self.contents_changed(tag);
            self.diverged = true;
        }
        removed
    }

    /// Drop shallow summaries that were computed from `tag`.
    fn contents_changed(&mut self, tag: Tag) {
        // glyph headers are located through loca
        if tag == Loca::TAG {
            if let Some(glyf) = self.tables.get_mut(&Glyf::TAG) {
                glyf.summary = None;
            }
        }
    }

    /// `true` once the font's contents differ from the source: a table has
    /// been added, removed, or written with newly encoded bytes.
    pub(crate) fn diverged(&self) -> bool {
        self.diverged
    }

    pub(crate) fn mark_dirty(&mut self, tag: Tag) -> Result<(), Error> {
        let table = self.tables.get_mut(&tag).ok_or(Error::MissingTable(tag))?;
        table.dirty = true;
        table.modified = true;
        Ok(())
    }

    pub(crate) fn mark_all_dirty(&mut self) {
        for table in self.tables.values_mut() {
            table.dirty = true;
            table.modified = true;
        }
    }

    pub(crate) fn dirty_tags(&self) -> BTreeSet<Tag> {
        self.tables
            .values()
            .filter(|table| table.dirty)
            .map(Table::tag)
            .collect()
    }

    /// Run the recompute step of one table and clear its dirty flag.
    pub(crate) fn recompute(&mut self, tag: Tag) -> Result<(), Error> {
        if AnyTable::recomputes(tag) {
            self.ensure_structured(tag)?;
            let working = self.tables.get(&tag).and_then(|table| table.data.clone());
            if let Some(mut working) = working {
                working.recompute(&mut UpdateContext {
                    registry: self,
                    current: tag,
                })?;
                if let Some(table) = self.tables.get_mut(&tag) {
                    if table.data.as_ref() != Some(&working) {
                        log::debug!("recompute changed '{tag}'");
                        table.data = Some(working);
                        table.modified = true;
                        self.contents_changed(tag);
                    }
                }
            }
        }
        if let Some(table) = self.tables.get_mut(&tag) {
            table.dirty = false;
        }
        Ok(())
    }

    /// Tags in the order their bodies should be laid out when writing.
    ///
    /// Tables keep their position from the source file; new tables follow
    /// in tag order.
    pub(crate) fn body_order(&self) -> Vec<Tag> {
        let mut existing: Vec<_> = self
            .tags()
            .filter_map(|tag| self.directory.get(tag).map(|record| (record.offset, tag)))
            .collect();
        existing.sort();
        let mut added: Vec<_> = self
            .tags()
            .filter(|tag| !self.directory.contains(*tag))
            .collect();
        added.sort();
        existing
            .into_iter()
            .map(|(_, tag)| tag)
            .chain(added)
            .collect()
    }

    /// The bytes to write for `tag`, and whether they were freshly encoded.
    pub(crate) fn bytes_for_write(&mut self, tag: Tag) -> Result<(Arc<[u8]>, bool), Error> {
        self.ensure_raw(tag)?;
        let table = self.tables.get(&tag).ok_or(Error::MissingTable(tag))?;
        if let (false, Some(raw)) = (table.modified, table.raw.as_ref()) {
            return Ok((raw.clone(), false));
        }
        self.ensure_structured(tag)?;
        let data = self
            .tables
            .get(&tag)
            .and_then(|table| table.data.as_ref())
            .ok_or(Error::MissingTable(tag))?;
        log::debug!("encoding '{tag}'");
        let bytes = data
            .encode()
            .map_err(|reason| Error::Encode { tag, reason })?;
        Ok((bytes.into(), true))
    }

    /// Record that `bytes` were written for `tag`.
    pub(crate) fn commit_written(&mut self, tag: Tag, bytes: Arc<[u8]>, encoded: bool) {
        if let Some(table) = self.tables.get_mut(&tag) {
            table.raw = Some(bytes);
            table.modified = false;
        }
        self.diverged |= encoded;
    }
}

pub(crate) fn wrong_family<T: FontTable>() -> Error {
    let name = std::any::type_name::<T>();
    Error::WrongFamily {
        tag: T::TAG,
        expected: name.rsplit("::").next().unwrap_or(name),
    }
}

impl<'a> LoadContext<'a> {
    fn new(registry: &'a mut TableRegistry) -> Self {
        LoadContext { registry }
    }

    /// Decoded data of another table, loading it if necessary.
    pub fn table<T: FontTable>(&mut self) -> Result<&T, Error> {
        self.registry.table::<T>()
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.registry.contains(tag)
    }
}

impl UpdateContext<'_> {
    /// The tag of the table being recomputed.
    pub fn current(&self) -> Tag {
        self.current
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.registry.contains(tag)
    }

    /// Read another table, or `None` if the font does not have it.
    pub fn table<T: FontTable>(&mut self) -> Result<Option<&T>, Error> {
        if !self.registry.contains(T::TAG) {
            return Ok(None);
        }
        self.registry.table::<T>().map(Some)
    }

    /// Modify another table, marking it dirty.
    ///
    /// Only tables downstream of the current one may be modified.
    pub fn table_mut<T: FontTable>(&mut self) -> Result<Option<&mut T>, Error> {
        if T::TAG == self.current {
            return Err(Error::TableBusy(T::TAG));
        }
        if !self.registry.contains(T::TAG) {
            return Ok(None);
        }
        self.registry.table_mut::<T>().map(Some)
    }

    /// Add a new table, or replace an existing one.
    pub fn insert<T: FontTable>(&mut self, table: T) -> Result<(), Error> {
        if T::TAG == self.current {
            return Err(Error::TableBusy(T::TAG));
        }
        log::debug!("'{}' created '{}'", self.current, T::TAG);
        self.registry.insert_any(T::TAG, table.into_any());
        Ok(())
    }

    pub fn mark_dirty(&mut self, tag: Tag) -> Result<(), Error> {
        if tag == self.current {
            return Ok(());
        }
        self.registry.mark_dirty(tag)
    }
}
