//! paperprep-pdf
//!
//! Render and metadata collaborators for PDF, plain-text and markdown sources.
use std::path::Path;

pub mod metadata;
pub mod render;

pub use metadata::{AutoMetadataSource, PdfMetadataSource, TextMetadataSource};
pub use render::{AutoRenderer, PdfRenderer, TextRenderer};

/// Document formats the pipeline knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Pdf,
    PlainText,
    Markdown,
}

impl SourceKind {
    pub const EXTENSIONS: [&'static str; 4] = ["pdf", "txt", "md", "markdown"];

    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::PlainText),
            "md" | "markdown" => Some(Self::Markdown),
            _ => None,
        }
    }
}
