use std::path::Path;

use crate::error::Result;
use crate::types::Meta;

/// Turns a document on disk into its raw body text.
///
/// Fails with `Error::DocumentUnreadable` on I/O or parse failure.
pub trait Renderer: Send + Sync {
    fn render_to_text(&self, path: &Path) -> Result<String>;
}

/// Reads the raw metadata dictionary of a document.
pub trait MetadataSource: Send + Sync {
    fn read_metadata(&self, path: &Path) -> Result<Meta>;
}

/// Converts an image of a table or figure into structured markup.
///
/// Fails with `Error::InferenceUnavailable`; callers degrade to text-only output.
pub trait MarkupModel: Send + Sync {
    fn image_to_markup(&self, image: &Path) -> Result<String>;
}
