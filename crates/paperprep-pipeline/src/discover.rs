//! Finding input documents on disk.
//!
//! A directory is walked for `.pdf`, `.txt` and `.md` files in sorted order.
//! Table images saved next to a document as `<stem>.table*.png` (or
//! `.jpg`/`.jpeg`) are attached to it as figures.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use paperprep_core::error::{Error, Result};
use paperprep_core::types::{doc_id_from_path, Document};
use paperprep_pdf::SourceKind;

const FIGURE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Documents under `root`; a file path yields just that document.
pub fn discover_documents(root: &Path) -> Result<Vec<Document>> {
    if root.is_file() {
        return Ok(vec![with_figures(root)]);
    }
    if !root.is_dir() {
        return Err(Error::unreadable(root, "no such file or directory"));
    }
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| SourceKind::from_path(p).is_some())
        .collect();
    files.sort();
    debug!(root = %root.display(), documents = files.len(), "discovered documents");
    Ok(files.iter().map(|p| with_figures(p)).collect())
}

/// Concatenates the documents found under each path, in argument order.
pub fn collect_documents(paths: &[PathBuf]) -> Result<Vec<Document>> {
    let mut docs = Vec::new();
    for path in paths {
        docs.extend(discover_documents(path)?);
    }
    Ok(docs)
}

fn with_figures(path: &Path) -> Document {
    let figures = path.parent().map(|dir| figures_for(dir, &doc_id_from_path(path))).unwrap_or_default();
    Document::new(path).with_figures(figures)
}

fn figures_for(dir: &Path, stem: &str) -> Vec<PathBuf> {
    let prefix = format!("{stem}.table");
    let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
    let Ok(entries) = fs::read_dir(dir) else { return Vec::new() };
    let mut figures: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| p.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.starts_with(&prefix)))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| FIGURE_EXTENSIONS.iter().any(|f| e.eq_ignore_ascii_case(f)))
        })
        .collect();
    figures.sort();
    figures
}
