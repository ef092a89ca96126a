//! paperprep-pipeline
//!
//! Runs documents through metadata extraction, rendering, figure markup,
//! normalization and chunking on a bounded worker pool, and writes the
//! resulting records as JSON lines in input order.
pub mod discover;
pub mod pipeline;
pub mod report;
pub mod sink;

pub use discover::{collect_documents, discover_documents};
pub use pipeline::{Collaborators, Pipeline};
pub use report::{DocumentOutcome, RunReport};
pub use sink::{write_records, JsonlSink, OrderedSink};
