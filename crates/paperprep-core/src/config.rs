use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{Document, MetadataField, MetadataOverrides};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate()?;
        Ok(config)
    }

    /// Builds a config from an in-memory TOML document, without env or files.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config = Self { figment: Figment::new().merge(Toml::string(toml)) };
        config.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{}': {}", key, e)))
    }

    fn get_or_default<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        if self.figment.contains(key) { self.get(key) } else { Ok(T::default()) }
    }

    pub fn pipeline(&self) -> Result<PipelineSettings> { self.get_or_default("pipeline") }

    pub fn vision(&self) -> Result<VisionSettings> { self.get_or_default("vision") }

    pub fn output(&self) -> Result<OutputSettings> { self.get_or_default("output") }

    pub fn documents(&self) -> Result<Vec<DocumentEntry>> { self.get_or_default("documents") }

    fn validate(&self) -> Result<()> {
        let pipeline = self.pipeline()?;
        pipeline.chunk_config().validate()?;
        pipeline.parsed_overrides()?;
        if pipeline.workers == 0 {
            return Err(Error::InvalidConfig("pipeline.workers must be at least 1".into()));
        }
        Ok(())
    }
}

/// Size budget and separator priority for the recursive chunker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub separators: Vec<String>,
}

pub const DEFAULT_CHUNK_SIZE: usize = 512;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

pub fn default_separators() -> Vec<String> {
    ["\n\n", "\n", " ", ""].iter().map(|s| (*s).to_string()).collect()
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE, chunk_overlap: DEFAULT_CHUNK_OVERLAP, separators: default_separators() }
    }
}

impl ChunkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidChunkConfig("chunk_size must be greater than 0".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidChunkConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.separators.is_empty() {
            return Err(Error::InvalidChunkConfig("separator list is empty".into()));
        }
        Ok(())
    }
}

/// When the citation-stripping rules run relative to punctuation removal.
///
/// `Source` keeps the historical order, in which the citation rules can no
/// longer match. `StripFirst` removes citations while their brackets and
/// commas still exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationOrder {
    Source,
    #[default]
    StripFirst,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub separators: Vec<String>,
    pub citation_order: CitationOrder,
    pub fail_fast: bool,
    pub workers: usize,
    pub document_timeout_secs: Option<u64>,
    /// Document id -> field name -> replacement value.
    pub overrides: HashMap<String, HashMap<String, String>>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        let chunk = ChunkConfig::default();
        Self {
            chunk_size: chunk.chunk_size,
            chunk_overlap: chunk.chunk_overlap,
            separators: chunk.separators,
            citation_order: CitationOrder::default(),
            fail_fast: false,
            workers: 4,
            document_timeout_secs: None,
            overrides: HashMap::new(),
        }
    }
}

impl PipelineSettings {
    pub fn chunk_config(&self) -> ChunkConfig {
        ChunkConfig { chunk_size: self.chunk_size, chunk_overlap: self.chunk_overlap, separators: self.separators.clone() }
    }

    pub fn document_timeout(&self) -> Option<Duration> {
        self.document_timeout_secs.map(Duration::from_secs)
    }

    /// Parses override field names; an unknown name is a configuration error.
    pub fn parsed_overrides(&self) -> Result<HashMap<String, MetadataOverrides>> {
        let mut parsed = HashMap::with_capacity(self.overrides.len());
        for (doc_id, fields) in &self.overrides {
            let mut record = MetadataOverrides::new();
            for (key, value) in fields {
                let field: MetadataField = key.parse()?;
                record.insert(field, value.clone());
            }
            parsed.insert(doc_id.clone(), record);
        }
        Ok(parsed)
    }

    pub fn set_override(&mut self, doc_id: &str, field: MetadataField, value: impl Into<String>) {
        self.overrides.entry(doc_id.to_string()).or_default().insert(field.key().to_string(), value.into());
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionSettings {
    /// External command converting an image (appended as last argument) to markup on stdout.
    pub command: Vec<String>,
    pub use_fake: bool,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub path: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self { path: "cleaned_research_paper.jsonl".to_string() }
    }
}

/// A document listed in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub path: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub figures: Vec<String>,
}

impl DocumentEntry {
    pub fn to_document(&self, base: &Path) -> Document {
        let doc = Document::new(resolve_with_base(base, &self.path))
            .with_figures(self.figures.iter().map(|f| resolve_with_base(base, f)).collect());
        match &self.id {
            Some(id) => doc.with_id(id.clone()),
            None => doc,
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
