//! Metadata extraction over an injected [`MetadataSource`].

use tracing::debug;

use crate::error::Result;
use crate::traits::MetadataSource;
use crate::types::{Document, MetadataField, MetadataRecord};

/// Reads the six descriptive fields of `doc`.
///
/// Missing keys become empty strings. The only failure is the source being
/// unable to open the document at all.
pub fn extract(source: &dyn MetadataSource, doc: &Document) -> Result<MetadataRecord> {
    let meta = source.read_metadata(&doc.path)?;
    let record = MetadataRecord::from_meta(&meta);
    let missing: Vec<&str> = MetadataField::ALL.into_iter().filter(|f| record.get(*f).is_empty()).map(MetadataField::key).collect();
    if !missing.is_empty() {
        debug!(doc = %doc.id, ?missing, "metadata fields absent");
    }
    Ok(record)
}
