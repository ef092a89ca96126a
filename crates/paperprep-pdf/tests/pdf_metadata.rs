use std::fs;
use std::path::Path;

use lopdf::{dictionary, Document, Object, StringFormat};
use tempfile::TempDir;

use paperprep_core::traits::MetadataSource;
use paperprep_core::Error;
use paperprep_pdf::{AutoMetadataSource, PdfMetadataSource, SourceKind};

fn utf16_string(s: &str) -> Object {
    let bytes = [0xFE, 0xFF].into_iter().chain(s.encode_utf16().flat_map(u16::to_be_bytes)).collect();
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn write_pdf(path: &Path, info: Option<lopdf::Dictionary>) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => Vec::<Object>::new(),
        "Count" => 0_i64,
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    if let Some(info) = info {
        let info_id = doc.add_object(info);
        doc.trailer.set("Info", info_id);
    }
    doc.save(path).unwrap();
}

#[test]
fn reads_info_dictionary_and_version() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("shrimp.pdf");
    write_pdf(
        &path,
        Some(dictionary! {
            "Title" => utf16_string("Biofloc für Garnelen"),
            "Author" => Object::string_literal("A. Researcher"),
            "CreationDate" => Object::string_literal("D:20200101120000Z"),
        }),
    );

    let meta = PdfMetadataSource.read_metadata(&path).unwrap();
    assert_eq!(meta["title"], "Biofloc für Garnelen");
    assert_eq!(meta["author"], "A. Researcher");
    assert_eq!(meta["creationDate"], "D:20200101120000Z");
    assert_eq!(meta["format"], "PDF 1.5");
    assert!(!meta.contains_key("subject"));
    assert!(!meta.contains_key("keywords"));
}

#[test]
fn pdf_without_info_only_reports_format() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("bare.pdf");
    write_pdf(&path, None);

    let meta = AutoMetadataSource.read_metadata(&path).unwrap();
    assert_eq!(meta.len(), 1);
    assert_eq!(meta["format"], "PDF 1.5");
}

#[test]
fn garbage_pdf_is_unreadable() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("garbage.pdf");
    fs::write(&path, b"%PDF-garbage with no structure").unwrap();

    let err = PdfMetadataSource.read_metadata(&path).unwrap_err();
    assert!(matches!(err, Error::DocumentUnreadable { .. }), "{err:?}");
}

#[test]
fn source_kind_follows_extension() {
    assert_eq!(SourceKind::from_path(Path::new("a/Paper.PDF")), Some(SourceKind::Pdf));
    assert_eq!(SourceKind::from_path(Path::new("notes.markdown")), Some(SourceKind::Markdown));
    assert_eq!(SourceKind::from_path(Path::new("notes.txt")), Some(SourceKind::PlainText));
    assert_eq!(SourceKind::from_path(Path::new("figure.png")), None);
    assert_eq!(SourceKind::from_path(Path::new("README")), None);
}
