use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use paperprep_core::config::{PipelineSettings, VisionSettings};
use paperprep_core::error::{Error, Result};
use paperprep_core::metadata;
use paperprep_core::traits::{MarkupModel, MetadataSource, Renderer};
use paperprep_core::types::{Document, MetadataOverrides, OutputRecord};
use paperprep_pdf::{AutoMetadataSource, AutoRenderer};
use paperprep_text::{RecursiveChunker, TextNormalizer};
use paperprep_vision::get_default_model;

use crate::report::{DocumentOutcome, RunReport};

/// The external capabilities a pipeline is built from. Initialized once and
/// shared read-only by every worker.
#[derive(Clone)]
pub struct Collaborators {
    pub renderer: Arc<dyn Renderer>,
    pub metadata: Arc<dyn MetadataSource>,
    pub markup: Arc<dyn MarkupModel>,
}

impl Collaborators {
    pub fn new(renderer: Arc<dyn Renderer>, metadata: Arc<dyn MetadataSource>, markup: Arc<dyn MarkupModel>) -> Self {
        Self { renderer, metadata, markup }
    }

    /// PDF/text rendering and metadata by extension, markup model per `vision`.
    pub fn from_settings(vision: &VisionSettings) -> Result<Self> {
        Ok(Self {
            renderer: Arc::new(AutoRenderer),
            metadata: Arc::new(AutoMetadataSource),
            markup: Arc::from(get_default_model(vision)?),
        })
    }
}

struct Stages {
    collaborators: Collaborators,
    normalizer: TextNormalizer,
    chunker: RecursiveChunker,
    overrides: HashMap<String, MetadataOverrides>,
}

#[derive(Clone)]
pub struct Pipeline {
    stages: Arc<Stages>,
    /// One permit per worker, held until the blocking render returns, so
    /// abandoned renders still count against `workers`.
    render_slots: Arc<Semaphore>,
    workers: usize,
    fail_fast: bool,
    document_timeout: Option<Duration>,
}

impl Pipeline {
    /// Validates the chunk settings and override keys up front, so a bad
    /// configuration fails before any document is touched.
    pub fn new(settings: PipelineSettings, collaborators: Collaborators) -> Result<Self> {
        if settings.workers == 0 {
            return Err(Error::InvalidConfig("pipeline.workers must be at least 1".into()));
        }
        let chunker = RecursiveChunker::new(settings.chunk_config())?;
        let overrides = settings.parsed_overrides()?;
        let stages = Stages {
            collaborators,
            normalizer: TextNormalizer::new(settings.citation_order),
            chunker,
            overrides,
        };
        Ok(Self {
            stages: Arc::new(stages),
            render_slots: Arc::new(Semaphore::new(settings.workers)),
            workers: settings.workers,
            fail_fast: settings.fail_fast,
            document_timeout: settings.document_timeout(),
        })
    }

    #[must_use]
    pub fn with_document_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.document_timeout = timeout;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs one document end to end on the calling thread.
    pub fn process_document(&self, doc: &Document) -> Result<OutputRecord> {
        let stages = &self.stages;
        info!(doc = %doc.id, path = %doc.path.display(), "processing document");

        let mut record = metadata::extract(stages.collaborators.metadata.as_ref(), doc)?;
        if let Some(overrides) = stages.overrides.get(&doc.id) {
            debug!(doc = %doc.id, fields = overrides.len(), "applying metadata overrides");
            record.apply_overrides(overrides);
        }

        let mut text = stages.collaborators.renderer.render_to_text(&doc.path)?;
        for figure in &doc.figures {
            match stages.collaborators.markup.image_to_markup(figure) {
                Ok(markup) => {
                    text.push_str("\n\n");
                    text.push_str(&markup);
                }
                Err(e) => warn!(doc = %doc.id, figure = %figure.display(), error = %e, "figure skipped"),
            }
        }

        let normalized = stages.normalizer.normalize(&text);
        let chunks = stages.chunker.chunks(&normalized);
        debug!(doc = %doc.id, chars = normalized.len(), chunks = chunks.len(), "chunked document");
        Ok(OutputRecord::new(record, chunks))
    }

    /// Runs on the caller's runtime. A render abandoned at the document
    /// timeout keeps its blocking thread and worker permit until it returns,
    /// and dropping the caller's runtime waits for it; `process_blocking`
    /// detaches such renders instead.
    pub async fn process(&self, docs: Vec<Document>) -> Result<RunReport> {
        self.process_with(docs, |_, _| Ok(())).await
    }

    /// Processes `docs` with at most `workers` in flight. `on_complete` sees
    /// every result as it finishes, tagged with its input position; an error
    /// from it stops the run.
    ///
    /// Failed documents become `Skipped` outcomes unless `fail_fast` is set,
    /// in which case the first failure is returned and no report is built.
    pub async fn process_with<F>(&self, docs: Vec<Document>, mut on_complete: F) -> Result<RunReport>
    where
        F: FnMut(usize, &Result<OutputRecord>) -> Result<()>,
    {
        let total = docs.len();
        info!(documents = total, workers = self.workers, "starting run");
        let mut records: Vec<Option<OutputRecord>> = (0..total).map(|_| None).collect();
        let mut outcomes: Vec<Option<DocumentOutcome>> = (0..total).map(|_| None).collect();

        let mut completed = stream::iter(docs.into_iter().enumerate())
            .map(|(index, doc)| {
                let pipeline = self.clone();
                async move {
                    let result = pipeline.run_isolated(&doc).await;
                    (index, doc, result)
                }
            })
            .buffer_unordered(self.workers);

        while let Some((index, doc, result)) = completed.next().await {
            on_complete(index, &result)?;
            match result {
                Ok(record) => {
                    info!(doc = %doc.id, chunks = record.text.len(), "document done");
                    outcomes[index] = Some(DocumentOutcome::Succeeded { id: doc.id, chunks: record.text.len() });
                    records[index] = Some(record);
                }
                Err(e) if self.fail_fast => {
                    warn!(doc = %doc.id, error = %e, "aborting run");
                    return Err(e);
                }
                Err(e) => {
                    warn!(doc = %doc.id, error = %e, "skipping document");
                    outcomes[index] = Some(DocumentOutcome::Skipped { id: doc.id, path: doc.path, reason: e.to_string() });
                }
            }
        }

        let report = RunReport {
            records: records.into_iter().flatten().collect(),
            outcomes: outcomes.into_iter().flatten().collect(),
        };
        info!(succeeded = report.succeeded().count(), skipped = report.skipped().count(), "run finished");
        Ok(report)
    }

    /// Blocking entry point for binaries and sync callers.
    pub fn process_blocking(&self, docs: Vec<Document>) -> Result<RunReport> {
        self.process_blocking_with(docs, |_, _| Ok(()))
    }

    pub fn process_blocking_with<F>(&self, docs: Vec<Document>, on_complete: F) -> Result<RunReport>
    where
        F: FnMut(usize, &Result<OutputRecord>) -> Result<()>,
    {
        let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
        let report = runtime.block_on(self.process_with(docs, on_complete));
        // Timed-out renders may still be running; they are abandoned.
        runtime.shutdown_background();
        report
    }

    /// Runs a document on the blocking pool, bounded by the document timeout.
    /// The timeout starts once a worker permit is held. A panicking
    /// collaborator fails only its own document.
    async fn run_isolated(&self, doc: &Document) -> Result<OutputRecord> {
        let permit = Arc::clone(&self.render_slots)
            .acquire_owned()
            .await
            .map_err(|e| Error::unreadable(&doc.path, format!("worker pool closed: {e}")))?;
        let pipeline = self.clone();
        let task_doc = doc.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            pipeline.process_document(&task_doc)
        });
        let joined = match self.document_timeout {
            Some(limit) => match tokio::time::timeout(limit, handle).await {
                Ok(joined) => joined,
                Err(_) => return Err(Error::TimedOut { path: doc.path.clone(), after: limit }),
            },
            None => handle.await,
        };
        joined.unwrap_or_else(|e| Err(Error::unreadable(&doc.path, format!("worker failed: {e}"))))
    }
}
