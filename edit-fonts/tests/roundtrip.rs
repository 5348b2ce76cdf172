//! Writing fonts that were opened from bytes.

use edit_fonts::{
    tables::{cmap::Cmap, glyf::Glyf, head::Head},
    Font, TableState, WriteOptions,
};
use font_test_data::ttf::{self, simple_font};
use font_types::Tag;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn untouched_font_is_byte_identical() {
    init_logging();
    let original = simple_font();
    let mut font = Font::from_bytes(original.clone()).unwrap();
    let written = font.to_bytes().unwrap();
    assert_eq!(written, original);
}

#[test]
fn writing_does_not_decode() {
    let mut font = Font::from_bytes(simple_font()).unwrap();
    font.to_bytes().unwrap();
    assert_eq!(font.state(ttf::CMAP), Some(TableState::RawLoaded));
    assert_eq!(font.state(ttf::GLYF), Some(TableState::RawLoaded));
    assert_eq!(font.state(ttf::HEAD), Some(TableState::Structured));
}

#[rstest]
#[case::head(ttf::HEAD)]
#[case::hhea(ttf::HHEA)]
#[case::maxp(ttf::MAXP)]
#[case::os2(ttf::OS2)]
#[case::hmtx(ttf::HMTX)]
#[case::cmap(ttf::CMAP)]
#[case::loca(ttf::LOCA)]
#[case::name(ttf::NAME)]
#[case::post(ttf::POST)]
fn reencoding_one_table_is_byte_identical(#[case] tag: Tag) {
    init_logging();
    let original = simple_font();
    let mut font = Font::from_bytes(original.clone()).unwrap();
    font.mark_dirty(tag).unwrap();
    let written = font.to_bytes().unwrap();
    assert_eq!(font.state(tag), Some(TableState::Structured));
    assert_eq!(written, original);
}

#[test]
fn force_reencode() {
    init_logging();
    let mut font = Font::from_bytes(simple_font()).unwrap();
    let mut written = Vec::new();
    font.write_with(
        &mut written,
        WriteOptions {
            force_reencode: true,
        },
    )
    .unwrap();
    // the .notdef outline is stored with long coordinates in the source
    assert_ne!(written, simple_font());
    assert_eq!(ttf::checksum(&written), 0xB1B0_AFBA);

    let mut reloaded = Font::from_bytes(written).unwrap();
    assert_eq!(reloaded.len(), 10);
    let mut original = Font::from_bytes(simple_font()).unwrap();
    assert_eq!(
        reloaded.table::<Glyf>().unwrap(),
        original.table::<Glyf>().unwrap()
    );
    assert_eq!(
        reloaded.table::<Cmap>().unwrap(),
        original.table::<Cmap>().unwrap()
    );
    reloaded.validate().unwrap();
}

#[test]
fn edited_font_checksums() {
    let mut font = Font::from_bytes(simple_font()).unwrap();
    font.table_mut::<Head>().unwrap().font_revision = font_types::Fixed::from_f64(2.5);
    let first = font.to_bytes().unwrap();
    assert_eq!(ttf::checksum(&first), 0xB1B0_AFBA);
    assert!(!font.is_dirty());

    // a second write with no further edits copies what was just written
    let second = font.to_bytes().unwrap();
    assert_eq!(first, second);

    let mut reloaded = Font::from_bytes(first).unwrap();
    assert_eq!(
        reloaded.table::<Head>().unwrap().font_revision,
        font_types::Fixed::from_f64(2.5)
    );
}

#[test]
fn unknown_tables_are_carried() {
    let fpgm = Tag::new(b"fpgm");
    let mut font = Font::from_bytes(simple_font()).unwrap();
    font.insert_raw(fpgm, [0xB0, 0x01, 0x2C]);
    let written = font.to_bytes().unwrap();

    let mut reloaded = Font::from_bytes(written).unwrap();
    assert_eq!(reloaded.len(), 11);
    // new tables are laid out after the existing ones
    let last = reloaded.directory().records().max_by_key(|r| r.offset).unwrap();
    assert_eq!(last.tag, fpgm);
    let table = reloaded.get(fpgm).unwrap();
    assert_eq!(table.raw_bytes(), Some(&[0xB0, 0x01, 0x2C][..]));
}

#[test]
fn removed_tables_are_not_written() {
    let mut font = Font::from_bytes(simple_font()).unwrap();
    assert!(font.remove_table(ttf::POST).is_some());
    let written = font.to_bytes().unwrap();
    let reloaded = Font::from_bytes(written.clone()).unwrap();
    assert!(!reloaded.contains(ttf::POST));
    assert_eq!(reloaded.len(), 9);
    assert_eq!(ttf::checksum(&written), 0xB1B0_AFBA);
}
