//! Document-info metadata.
//!
//! PDFs are read with `lopdf`: the trailer `/Info` dictionary supplies the
//! descriptive fields and the header version becomes `format` ("PDF 1.7").
//! Keys the file does not carry are simply absent from the returned map.

use std::fs;
use std::path::Path;

use lopdf::{Dictionary, Document as PdfDocument, Object};

use paperprep_core::error::{Error, Result};
use paperprep_core::traits::MetadataSource;
use paperprep_core::types::{Meta, MetadataField};

use crate::SourceKind;

const INFO_KEYS: [(&[u8], MetadataField); 5] = [
    (b"Title", MetadataField::Title),
    (b"Author", MetadataField::Author),
    (b"CreationDate", MetadataField::CreationDate),
    (b"Subject", MetadataField::Subject),
    (b"Keywords", MetadataField::Keywords),
];

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfMetadataSource;

impl MetadataSource for PdfMetadataSource {
    fn read_metadata(&self, path: &Path) -> Result<Meta> {
        let doc = PdfDocument::load(path).map_err(|e| Error::unreadable(path, format!("failed to open pdf: {e}")))?;
        Ok(info_to_meta(&doc))
    }
}

/// Plain text carries no embedded metadata; only the format is known.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextMetadataSource;

impl MetadataSource for TextMetadataSource {
    fn read_metadata(&self, path: &Path) -> Result<Meta> {
        fs::metadata(path).map_err(|e| Error::unreadable(path, e))?;
        let mut meta = Meta::new();
        let format = match SourceKind::from_path(path) {
            Some(SourceKind::Markdown) => "Markdown",
            _ => "Plain Text",
        };
        meta.insert(MetadataField::Format.key().to_string(), format.to_string());
        Ok(meta)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AutoMetadataSource;

impl MetadataSource for AutoMetadataSource {
    fn read_metadata(&self, path: &Path) -> Result<Meta> {
        match SourceKind::from_path(path) {
            Some(SourceKind::Pdf) => PdfMetadataSource.read_metadata(path),
            Some(SourceKind::PlainText | SourceKind::Markdown) => TextMetadataSource.read_metadata(path),
            None => Err(Error::unreadable(path, "unsupported document format")),
        }
    }
}

fn info_to_meta(doc: &PdfDocument) -> Meta {
    let mut meta = Meta::new();
    meta.insert(MetadataField::Format.key().to_string(), format!("PDF {}", doc.version));
    let Some(info) = info_dictionary(doc) else { return meta };
    for (key, field) in INFO_KEYS {
        let value = info.get(key).ok().and_then(|obj| resolve(doc, obj)).and_then(text_value);
        if let Some(value) = value {
            meta.insert(field.key().to_string(), value);
        }
    }
    meta
}

fn info_dictionary(doc: &PdfDocument) -> Option<&Dictionary> {
    let obj = doc.trailer.get(b"Info").ok()?;
    resolve(doc, obj)?.as_dict().ok()
}

fn resolve<'a>(doc: &'a PdfDocument, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn text_value(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).to_string()),
        _ => None,
    }
}

/// Decodes a PDF text string: UTF-16BE or UTF-8 when BOM-prefixed,
/// otherwise PDFDocEncoding read as Latin-1.
pub fn decode_text_string(bytes: &[u8]) -> String {
    let decoded = if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16.chunks_exact(2).map(|pair| u16::from_be_bytes([pair[0], pair[1]])).collect();
        String::from_utf16_lossy(&units)
    } else if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        String::from_utf8_lossy(utf8).to_string()
    } else {
        bytes.iter().map(|&b| char::from(b)).collect()
    };
    decoded.trim_end_matches('\0').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_utf16_with_bom() {
        let bytes: Vec<u8> = [0xFE, 0xFF].into_iter().chain("Pêche".encode_utf16().flat_map(u16::to_be_bytes)).collect();
        assert_eq!(decode_text_string(&bytes), "Pêche");
    }

    #[test]
    fn decodes_latin1_and_utf8_bom() {
        assert_eq!(decode_text_string(&[b'c', b'a', b'f', 0xE9]), "café");
        assert_eq!(decode_text_string(&[0xEF, 0xBB, 0xBF, b'o', b'k']), "ok");
        assert_eq!(decode_text_string(b"padded\0\0"), "padded");
    }

    #[test]
    fn text_source_reports_format_only() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("readme.md");
        fs::write(&path, "# hi").unwrap();
        let meta = AutoMetadataSource.read_metadata(&path).unwrap();
        assert_eq!(meta.len(), 1);
        assert_eq!(meta["format"], "Markdown");
    }
}
