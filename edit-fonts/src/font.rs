//! A font file open for editing

use std::{fs::File, io, path::Path};

use font_types::{GlyphId, Tag, TT_SFNT_VERSION};

use crate::{
    directory::TableDirectory,
    font_builder::FontBuilder,
    graph::DependencyGraph,
    registry::{wrong_family, TableRegistry},
    source::ByteSource,
    table::{Table, TableState},
    tables::{
        cmap::Cmap,
        glyf::{Glyf, GlyphHeader},
        head::Head,
        hhea::Hhea,
        hmtx::Hmtx,
        loca::Loca,
        maxp::Maxp,
        name::Name,
        FontTable, Summary,
    },
    update::{self, UpdateReport},
    validate::{Validate, ValidationCtx},
    Error,
};

/// Options for [`Font::write_with`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Decode and re-encode every table, rather than copying the bytes of
    /// tables that have not been modified.
    pub force_reencode: bool,
}

/// A font, open for reading and editing.
///
/// Tables are loaded from the source lazily: the directory is read when the
/// font is opened, and `head` and `maxp` are decoded immediately, but every
/// other table is only read on first access.
pub struct Font {
    registry: TableRegistry,
    graph: DependencyGraph,
    sfnt_version: u32,
}

impl Font {
    /// Open a font from any [`ByteSource`].
    pub fn new(source: impl ByteSource + Send + 'static) -> Result<Self, Error> {
        let mut source: Box<dyn ByteSource + Send> = Box::new(source);
        let directory = TableDirectory::read(source.as_mut())?;
        let mut font = Font {
            sfnt_version: directory.sfnt_version(),
            registry: TableRegistry::new(source, directory),
            graph: DependencyGraph::for_known_tables()?,
        };
        for tag in [Head::TAG, Maxp::TAG] {
            if font.registry.contains(tag) {
                font.registry.ensure_structured(tag)?;
            } else {
                log::warn!("font has no '{tag}' table");
            }
        }
        Ok(font)
    }

    /// Open the font file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let file = File::open(path)?;
        Self::new(io::BufReader::new(file))
    }

    /// Open a font from bytes in memory.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, Error> {
        Self::new(io::Cursor::new(bytes.into()))
    }

    /// A font with no tables, for authoring from scratch.
    pub fn new_empty() -> Result<Self, Error> {
        Ok(Font {
            registry: TableRegistry::empty(),
            graph: DependencyGraph::for_known_tables()?,
            sfnt_version: TT_SFNT_VERSION,
        })
    }

    /// Replace the graph used to order updates.
    pub fn with_dependency_graph(mut self, graph: DependencyGraph) -> Self {
        self.graph = graph;
        self
    }

    pub fn dependency_graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn sfnt_version(&self) -> u32 {
        self.sfnt_version
    }

    /// The directory of the source this font was opened from.
    pub fn directory(&self) -> &TableDirectory {
        self.registry.directory()
    }

    /// The tags of all tables, in the order they were listed or added.
    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.registry.tags()
    }

    /// The number of tables.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.registry.contains(tag)
    }

    /// Load a table's raw bytes, if not already loaded.
    ///
    /// The source is read at most once per table. On a font created with
    /// [`new_empty`](Self::new_empty) a missing table is created, empty and
    /// dirty; on a font read from a source it is a
    /// [`MissingTable`](Error::MissingTable) error.
    pub fn get(&mut self, tag: Tag) -> Result<&Table, Error> {
        self.registry.get(tag)
    }

    /// As [`get`](Self::get), creating an empty, dirty table if the font
    /// does not have one.
    pub fn get_or_create(&mut self, tag: Tag) -> Result<&Table, Error> {
        self.registry.get_or_create(tag)
    }

    /// A table, without loading anything.
    pub fn get_if_present(&self, tag: Tag) -> Option<&Table> {
        self.registry.get_if_present(tag)
    }

    pub fn state(&self, tag: Tag) -> Option<TableState> {
        self.registry.get_if_present(tag).map(Table::state)
    }

    /// The decoded data of a table, decoding it if necessary.
    pub fn table<T: FontTable>(&mut self) -> Result<&T, Error> {
        self.registry.table::<T>()
    }

    /// Mutable decoded data of a table.
    ///
    /// This marks the table dirty, whether or not it is actually changed.
    pub fn table_mut<T: FontTable>(&mut self) -> Result<&mut T, Error> {
        self.registry.table_mut::<T>()
    }

    /// Add a table, replacing any existing table with the same tag.
    pub fn insert_table<T: FontTable>(&mut self, table: T) {
        self.registry.insert_any(T::TAG, table.into_any());
    }

    /// Add a table of opaque bytes.
    pub fn insert_raw(&mut self, tag: Tag, data: impl Into<Vec<u8>>) {
        self.registry
            .insert_any(tag, crate::tables::RawTable::new(data).into());
    }

    pub fn remove_table(&mut self, tag: Tag) -> Option<Table> {
        self.registry.remove(tag)
    }

    /// Mark a table as changed, so it is recomputed and re-encoded.
    pub fn mark_dirty(&mut self, tag: Tag) -> Result<(), Error> {
        self.registry.mark_dirty(tag)
    }

    /// Mark every table as changed.
    ///
    /// This is useful after authoring a font from scratch, so that every
    /// derived value is recomputed.
    pub fn mark_all_dirty(&mut self) {
        self.registry.mark_all_dirty()
    }

    /// `true` if any table is waiting to be recomputed.
    pub fn is_dirty(&self) -> bool {
        self.registry
            .tags()
            .any(|tag| self.registry.get_if_present(tag).is_some_and(Table::is_dirty))
    }

    /// The header of a glyph, without decoding its outline.
    ///
    /// Returns `None` for glyphs with no outline.
    pub fn glyph_header(&mut self, gid: GlyphId) -> Result<Option<GlyphHeader>, Error> {
        if !self.contains(Glyf::TAG) {
            return Err(Error::MissingTable(Glyf::TAG));
        }
        let table = self.registry.get(Glyf::TAG)?;
        if let Some(data) = table.data() {
            let glyf = Glyf::from_any(data).ok_or_else(wrong_family::<Glyf>)?;
            return Ok(glyf.glyph(gid).and_then(|glyph| glyph.header()));
        }
        match table.summary() {
            Some(Summary::Glyf(headers)) => Ok(headers.get(gid)),
            _ => Ok(None),
        }
    }

    /// Recompute derived values in dirty tables and their dependents.
    pub fn update(&mut self) -> Result<UpdateReport, Error> {
        let report = update::update(&mut self.registry, &self.graph)?;
        log::debug!("updated {} tables", report.recomputed().len());
        Ok(report)
    }

    /// Write the font, updating it first if necessary.
    pub fn write(&mut self, sink: impl io::Write) -> Result<(), Error> {
        self.write_with(sink, WriteOptions::default())
    }

    /// Write the font with the provided options.
    ///
    /// Tables that have been modified are encoded; all others are copied
    /// byte for byte. Nothing is written to `sink` if any table fails to
    /// encode.
    pub fn write_with(&mut self, mut sink: impl io::Write, options: WriteOptions) -> Result<(), Error> {
        for required in [Head::TAG, Maxp::TAG] {
            if !self.registry.contains(required) {
                return Err(Error::IncompleteFont(required));
            }
        }
        if options.force_reencode {
            self.registry.mark_all_dirty();
        }
        if self.is_dirty() {
            self.update()?;
        }

        let mut written = Vec::with_capacity(self.registry.len());
        let mut any_encoded = false;
        for tag in self.registry.body_order() {
            let (bytes, encoded) = self.registry.bytes_for_write(tag)?;
            any_encoded |= encoded;
            written.push((tag, bytes, encoded));
        }

        let mut builder = FontBuilder::new(self.sfnt_version);
        for (tag, bytes, _) in &written {
            builder.add_raw(*tag, &bytes[..]);
        }
        builder.keep_checksum_adjustment(!any_encoded && !self.registry.diverged());
        let data = builder.build();
        sink.write_all(&data)?;
        log::debug!("wrote {} tables, {} bytes", written.len(), data.len());

        for (tag, bytes, encoded) in written {
            self.registry.commit_written(tag, bytes, encoded);
        }
        Ok(())
    }

    /// Write the font to a new buffer.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::new();
        self.write(&mut buf)?;
        Ok(buf)
    }

    /// Check the relationships between tables that writing does not enforce.
    ///
    /// This decodes every table it inspects. It never modifies the font.
    pub fn validate(&mut self) -> Result<(), Error> {
        let mut ctx = ValidationCtx::default();
        if self.contains(Head::TAG) {
            self.table::<Head>()?.validate_impl(&mut ctx);
        }
        if self.contains(Name::TAG) {
            self.table::<Name>()?.validate_impl(&mut ctx);
        }
        if self.contains(Maxp::TAG) {
            let num_glyphs = self.table::<Maxp>()?.num_glyphs;
            self.validate_glyph_counts(num_glyphs, &mut ctx)?;
        }
        ctx.into_result().map_err(Error::ValidationFailed)
    }

    fn validate_glyph_counts(&mut self, num_glyphs: u16, ctx: &mut ValidationCtx) -> Result<(), Error> {
        let num_glyphs = num_glyphs as usize;
        if self.contains(Loca::TAG) {
            let loca = self.table::<Loca>()?;
            let loca_glyphs = loca.num_glyphs();
            let loca_format = loca.format();
            ctx.in_table("loca", |ctx| {
                if loca_glyphs != num_glyphs {
                    ctx.report(format!(
                        "{loca_glyphs} glyphs in loca, but maxp.numGlyphs is {num_glyphs}"
                    ));
                }
            });
            if self.contains(Head::TAG) {
                let head_format = self.table::<Head>()?.index_to_loc_format;
                ctx.in_table("head", |ctx| {
                    ctx.in_field("index_to_loc_format", |ctx| {
                        if head_format != loca_format as i16 {
                            ctx.report(format!("does not match loca format {loca_format:?}"));
                        }
                    })
                });
            }
        }
        if self.contains(Glyf::TAG) {
            let glyf_glyphs = self.table::<Glyf>()?.glyphs().len();
            ctx.in_table("glyf", |ctx| {
                if glyf_glyphs != num_glyphs {
                    ctx.report(format!(
                        "{glyf_glyphs} glyphs in glyf, but maxp.numGlyphs is {num_glyphs}"
                    ));
                }
            });
        }
        if self.contains(Hmtx::TAG) {
            let hmtx = self.table::<Hmtx>()?;
            let long_metrics = hmtx.h_metrics.len();
            let hmtx_glyphs = long_metrics + hmtx.left_side_bearings.len();
            let declared = if self.contains(Hhea::TAG) {
                Some(self.table::<Hhea>()?.number_of_h_metrics as usize)
            } else {
                None
            };
            ctx.in_table("hmtx", |ctx| {
                if hmtx_glyphs != num_glyphs {
                    ctx.report(format!(
                        "{hmtx_glyphs} glyphs in hmtx, but maxp.numGlyphs is {num_glyphs}"
                    ));
                }
                if declared.is_some_and(|declared| declared != long_metrics) {
                    ctx.report(format!(
                        "{long_metrics} long metrics, but hhea.numberOfHMetrics is {}",
                        declared.unwrap_or_default()
                    ));
                }
            });
        }
        if self.contains(Cmap::TAG) {
            let cmap = self.table::<Cmap>()?;
            let bad: Vec<_> = cmap
                .iter()
                .filter(|(_, gid)| gid.to_u16() as usize >= num_glyphs)
                .collect();
            ctx.in_table("cmap", |ctx| {
                for (cp, gid) in bad {
                    ctx.report(format!("U+{cp:04X} maps to {gid}, beyond the last glyph"));
                }
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("sfnt_version", &format_args!("0x{:08X}", self.sfnt_version))
            .field("tables", &self.registry.tags().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
