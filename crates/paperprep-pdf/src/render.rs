use std::fs;
use std::path::Path;

use tracing::debug;

use paperprep_core::error::{Error, Result};
use paperprep_core::traits::Renderer;

use crate::SourceKind;

/// Extracts the text layer of a PDF with `pdf-extract`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfRenderer;

impl Renderer for PdfRenderer {
    fn render_to_text(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).map_err(|e| Error::unreadable(path, e))?;
        let text = pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| Error::unreadable(path, format!("failed to extract text: {e}")))?;
        if text.trim().is_empty() {
            return Err(Error::unreadable(path, "no extractable text (image-only or encrypted PDF)"));
        }
        debug!(path = %path.display(), chars = text.len(), "rendered pdf");
        Ok(text)
    }
}

/// Reads plain text and markdown files, falling back to lossy UTF-8.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextRenderer;

impl Renderer for TextRenderer {
    fn render_to_text(&self, path: &Path) -> Result<String> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                let bytes = fs::read(path).map_err(|e| Error::unreadable(path, e))?;
                Ok(String::from_utf8_lossy(&bytes).to_string())
            }
            Err(e) => Err(Error::unreadable(path, e)),
        }
    }
}

/// Dispatches on file extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoRenderer;

impl Renderer for AutoRenderer {
    fn render_to_text(&self, path: &Path) -> Result<String> {
        match SourceKind::from_path(path) {
            Some(SourceKind::Pdf) => PdfRenderer.render_to_text(path),
            Some(SourceKind::PlainText | SourceKind::Markdown) => TextRenderer.render_to_text(path),
            None => Err(Error::unreadable(path, "unsupported document format")),
        }
    }
}
