//! Tables are read from the source on demand, at most once.

use std::{
    io::{self, Read, Seek, SeekFrom},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use edit_fonts::{
    tables::{
        cmap::Cmap,
        glyf::{Bbox, GlyphHeader},
        hmtx::Hmtx,
        loca::Loca,
    },
    Error, Font, TableState,
};
use font_test_data::ttf::{self, simple_font};
use font_types::GlyphId;

/// A source that counts how many ranges are read from it.
struct CountingSource {
    inner: io::Cursor<Vec<u8>>,
    reads: Arc<AtomicUsize>,
}

impl CountingSource {
    fn new(bytes: Vec<u8>) -> (Self, Arc<AtomicUsize>) {
        let reads = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            inner: io::Cursor::new(bytes),
            reads: reads.clone(),
        };
        (source, reads)
    }
}

impl Read for CountingSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for CountingSource {
    // every range read starts with an absolute seek
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        if matches!(pos, SeekFrom::Start(_)) {
            self.reads.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.seek(pos)
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn opening_reads_directory_head_and_maxp() {
    init_logging();
    let (source, reads) = CountingSource::new(simple_font());
    let font = Font::new(source).unwrap();
    // header, records, head, maxp
    assert_eq!(reads.load(Ordering::SeqCst), 4);
    assert_eq!(font.len(), 10);
    assert_eq!(font.state(ttf::HEAD), Some(TableState::Structured));
    assert_eq!(font.state(ttf::MAXP), Some(TableState::Structured));
    for tag in [ttf::CMAP, ttf::GLYF, ttf::HMTX, ttf::NAME, ttf::POST] {
        assert_eq!(font.state(tag), Some(TableState::Unloaded), "{tag}");
    }
}

#[test]
fn tables_are_read_once() {
    init_logging();
    let (source, reads) = CountingSource::new(simple_font());
    let mut font = Font::new(source).unwrap();
    let after_open = reads.load(Ordering::SeqCst);

    font.get(ttf::CMAP).unwrap();
    assert_eq!(reads.load(Ordering::SeqCst), after_open + 1);
    assert_eq!(font.state(ttf::CMAP), Some(TableState::RawLoaded));

    font.get(ttf::CMAP).unwrap();
    let cmap = font.table::<Cmap>().unwrap();
    assert_eq!(cmap.map(0x41), Some(GlyphId::new(1)));
    font.table::<Cmap>().unwrap();
    assert_eq!(reads.load(Ordering::SeqCst), after_open + 1);
    assert_eq!(font.state(ttf::CMAP), Some(TableState::Structured));
}

#[test]
fn decoding_loads_dependencies() {
    let (source, reads) = CountingSource::new(simple_font());
    let mut font = Font::new(source).unwrap();
    let after_open = reads.load(Ordering::SeqCst);

    // hmtx needs hhea; maxp is already loaded
    let hmtx = font.table::<Hmtx>().unwrap();
    assert_eq!(hmtx.advance(GlyphId::new(3)), Some(600));
    assert_eq!(reads.load(Ordering::SeqCst), after_open + 2);
    assert_eq!(font.state(ttf::HHEA), Some(TableState::Structured));
}

#[test]
fn glyph_headers_without_decoding() {
    init_logging();
    let mut font = Font::from_bytes(simple_font()).unwrap();
    let header = font.glyph_header(GlyphId::new(1)).unwrap();
    assert_eq!(
        header,
        Some(GlyphHeader {
            number_of_contours: 1,
            bbox: Bbox {
                x_min: 0,
                y_min: 0,
                x_max: 500,
                y_max: 700,
            },
        })
    );
    let composite = font.glyph_header(GlyphId::new(2)).unwrap().unwrap();
    assert!(composite.is_composite());
    assert_eq!(font.glyph_header(GlyphId::new(3)).unwrap(), None);
    assert_eq!(font.glyph_header(GlyphId::new(40)).unwrap(), None);

    assert_eq!(font.state(ttf::GLYF), Some(TableState::RawLoaded));
    assert!(font.get_if_present(ttf::GLYF).unwrap().summary().is_some());
    // locating the glyphs required loca
    assert_eq!(font.state(ttf::LOCA), Some(TableState::Structured));
}

#[test]
fn glyph_headers_follow_loca() {
    let mut font = Font::from_bytes(simple_font()).unwrap();
    let first = font.glyph_header(GlyphId::new(1)).unwrap();
    assert!(first.is_some());

    // glyph 1 becomes empty, and glyph 2 starts where it used to
    let mut offsets = font.table::<Loca>().unwrap().offsets().to_vec();
    offsets[2] = offsets[1];
    font.insert_table(Loca::new(offsets));
    assert!(font.get_if_present(ttf::GLYF).unwrap().summary().is_none());
    assert_eq!(font.glyph_header(GlyphId::new(1)).unwrap(), None);
    assert_eq!(font.glyph_header(GlyphId::new(2)).unwrap(), first);

    font.remove_table(ttf::LOCA).unwrap();
    assert_eq!(font.glyph_header(GlyphId::new(2)).unwrap(), None);
    assert_eq!(font.state(ttf::GLYF), Some(TableState::RawLoaded));
}

#[test]
fn decode_failure_is_isolated() {
    init_logging();
    let tables: Vec<_> = ttf::tables()
        .into_iter()
        .map(|(tag, data)| match tag {
            ttf::HMTX => (tag, data[..4].to_vec()),
            _ => (tag, data),
        })
        .collect();
    let bytes = ttf::assemble(&tables);
    let mut font = Font::from_bytes(bytes.clone()).unwrap();

    let err = font.table::<Hmtx>().unwrap_err();
    assert!(matches!(err, Error::TableDecode { tag, .. } if tag == ttf::HMTX));
    assert_eq!(font.state(ttf::HMTX), Some(TableState::RawLoaded));
    // still failing, not poisoned
    assert!(font.table::<Hmtx>().is_err());

    // other tables are unaffected
    assert_eq!(font.table::<Cmap>().unwrap().len(), 3);
    assert_eq!(font.to_bytes().unwrap(), bytes);
}

#[test]
fn missing_loca_is_a_decode_error_for_glyf() {
    let tables: Vec<_> = ttf::tables()
        .into_iter()
        .filter(|(tag, _)| *tag != ttf::LOCA)
        .collect();
    let mut font = Font::from_bytes(ttf::assemble(&tables)).unwrap();

    // without loca there is nothing to summarize
    assert_eq!(font.glyph_header(GlyphId::new(1)).unwrap(), None);
    assert_eq!(font.state(ttf::GLYF), Some(TableState::RawLoaded));

    let err = font.table::<edit_fonts::tables::glyf::Glyf>().unwrap_err();
    assert!(matches!(err, Error::TableDecode { tag, .. } if tag == ttf::GLYF));
}

#[test]
fn get_missing_table() {
    let mut font = Font::from_bytes(simple_font()).unwrap();
    let gasp = font_types::Tag::new(b"gasp");
    assert!(matches!(font.get(gasp), Err(Error::MissingTable(tag)) if tag == gasp));
    assert!(font.get_if_present(gasp).is_none());
    assert_eq!(font.state(gasp), None);
}

#[test]
fn bad_container() {
    assert!(matches!(
        Font::from_bytes(vec![0u8; 8]),
        Err(Error::MalformedContainer(_))
    ));
}

#[test]
fn font_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<Font>();
}
