use std::fmt;
use std::path::PathBuf;

use paperprep_core::types::OutputRecord;

/// What happened to one input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    Succeeded { id: String, chunks: usize },
    Skipped { id: String, path: PathBuf, reason: String },
}

impl DocumentOutcome {
    pub fn id(&self) -> &str {
        match self {
            Self::Succeeded { id, .. } | Self::Skipped { id, .. } => id,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// Result of a run. `records` holds successful documents only; both lists
/// follow input order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub records: Vec<OutputRecord>,
    pub outcomes: Vec<DocumentOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &DocumentOutcome> {
        self.outcomes.iter().filter(|o| !o.is_skipped())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &DocumentOutcome> {
        self.outcomes.iter().filter(|o| o.is_skipped())
    }

    pub fn total_chunks(&self) -> usize {
        self.records.iter().map(|r| r.text.len()).sum()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} documents: {} succeeded ({} chunks), {} skipped",
            self.outcomes.len(),
            self.succeeded().count(),
            self.total_chunks(),
            self.skipped().count()
        )?;
        for outcome in self.skipped() {
            if let DocumentOutcome::Skipped { id, path, reason } = outcome {
                write!(f, "\n  skipped {id} ({}): {reason}", path.display())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperprep_core::types::{Chunk, MetadataRecord};

    #[test]
    fn summary_lists_skipped_documents_with_reasons() {
        let record = OutputRecord::new(
            MetadataRecord::default(),
            vec![Chunk { text: "a".into(), index: 0 }, Chunk { text: "b".into(), index: 1 }],
        );
        let report = RunReport {
            records: vec![record],
            outcomes: vec![
                DocumentOutcome::Succeeded { id: "fish".into(), chunks: 2 },
                DocumentOutcome::Skipped { id: "scan".into(), path: PathBuf::from("raw/scan.pdf"), reason: "no text".into() },
            ],
        };
        assert_eq!(report.succeeded().map(DocumentOutcome::id).collect::<Vec<_>>(), vec!["fish"]);
        assert_eq!(
            report.to_string(),
            "2 documents: 1 succeeded (2 chunks), 1 skipped\n  skipped scan (raw/scan.pdf): no text"
        );
    }
}
