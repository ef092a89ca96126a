//! Domain types shared by the extraction, text and pipeline crates.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::Error;

/// Raw key/value metadata as reported by a metadata source.
pub type Meta = HashMap<String, String>;

/// A source document to run through the pipeline.
///
/// - `id`: stable document identity (file stem unless configured)
/// - `path`: location handed to the renderer and metadata source
/// - `figures`: companion table/figure images converted to markup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub path: PathBuf,
    #[serde(default)]
    pub figures: Vec<PathBuf>,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let id = doc_id_from_path(&path);
        Self { id, path, figures: Vec::new() }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_figures(mut self, figures: Vec<PathBuf>) -> Self {
        self.figures = figures;
        self
    }
}

pub fn doc_id_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// The fixed set of descriptive fields carried by every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetadataField {
    Title,
    Author,
    CreationDate,
    Subject,
    Keywords,
    Format,
}

impl MetadataField {
    pub const ALL: [MetadataField; 6] = [
        MetadataField::Title,
        MetadataField::Author,
        MetadataField::CreationDate,
        MetadataField::Subject,
        MetadataField::Keywords,
        MetadataField::Format,
    ];

    /// Key used in raw metadata maps and in the JSONL output.
    pub fn key(self) -> &'static str {
        match self {
            MetadataField::Title => "title",
            MetadataField::Author => "author",
            MetadataField::CreationDate => "creationDate",
            MetadataField::Subject => "subject",
            MetadataField::Keywords => "keywords",
            MetadataField::Format => "format",
        }
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for MetadataField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "creation_date" {
            return Ok(MetadataField::CreationDate);
        }
        MetadataField::ALL
            .into_iter()
            .find(|field| field.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidConfig(format!("unknown metadata field '{s}'")))
    }
}

/// Bibliographic metadata of one document. Absent values are empty strings,
/// so a serialized record always carries all six keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub title: String,
    pub author: String,
    #[serde(rename = "creationDate")]
    pub creation_date: String,
    pub subject: String,
    pub keywords: String,
    pub format: String,
}

impl MetadataRecord {
    /// Picks the six known keys out of a raw metadata map; anything else is ignored.
    pub fn from_meta(meta: &Meta) -> Self {
        let mut record = Self::default();
        for field in MetadataField::ALL {
            if let Some(value) = meta.get(field.key()) {
                record.set(field, value.clone());
            }
        }
        record
    }

    pub fn get(&self, field: MetadataField) -> &str {
        match field {
            MetadataField::Title => &self.title,
            MetadataField::Author => &self.author,
            MetadataField::CreationDate => &self.creation_date,
            MetadataField::Subject => &self.subject,
            MetadataField::Keywords => &self.keywords,
            MetadataField::Format => &self.format,
        }
    }

    pub fn set(&mut self, field: MetadataField, value: String) {
        let slot = match field {
            MetadataField::Title => &mut self.title,
            MetadataField::Author => &mut self.author,
            MetadataField::CreationDate => &mut self.creation_date,
            MetadataField::Subject => &mut self.subject,
            MetadataField::Keywords => &mut self.keywords,
            MetadataField::Format => &mut self.format,
        };
        *slot = value;
    }

    /// Replaces the named fields outright.
    pub fn apply_overrides(&mut self, overrides: &MetadataOverrides) {
        for (field, value) in overrides {
            self.set(*field, value.clone());
        }
    }
}

/// Manual corrections for a single document's metadata.
pub type MetadataOverrides = BTreeMap<MetadataField, String>;

/// A chunk of normalized text and its position in the document's sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub index: usize,
}

/// One line of the output file: metadata plus the ordered chunk texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    #[serde(flatten)]
    pub metadata: MetadataRecord,
    pub text: Vec<String>,
}

impl OutputRecord {
    pub fn new(metadata: MetadataRecord, chunks: Vec<Chunk>) -> Self {
        Self { metadata, text: chunks.into_iter().map(|c| c.text).collect() }
    }
}
