//! Deterministic cleanup of rendered document text.
//!
//! Cleanup is an ordered list of [`NormalizeStep`]s. The order is chosen by
//! [`CitationOrder`]: with `Source` the citation rules run after punctuation
//! has already been stripped and therefore never match anything.

use regex::Regex;
use std::sync::LazyLock;

use paperprep_core::config::CitationOrder;

static NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static BRACKET_CITATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\d+\]").expect("valid regex"));
static AUTHOR_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(.*?et al., \d{4}\)").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeStep {
    /// Drop every char that is neither a word char nor whitespace.
    StripPunctuation,
    /// Runs of whitespace become one space; ends are trimmed.
    CollapseWhitespace,
    /// `[12]`
    StripBracketCitations,
    /// `(Smith et al., 2020)`
    StripAuthorYearCitations,
}

impl NormalizeStep {
    pub fn name(self) -> &'static str {
        match self {
            NormalizeStep::StripPunctuation => "strip_punctuation",
            NormalizeStep::CollapseWhitespace => "collapse_whitespace",
            NormalizeStep::StripBracketCitations => "strip_bracket_citations",
            NormalizeStep::StripAuthorYearCitations => "strip_author_year_citations",
        }
    }

    pub fn apply(self, text: &str) -> String {
        match self {
            NormalizeStep::StripPunctuation => NON_WORD_RE.replace_all(text, "").into_owned(),
            NormalizeStep::CollapseWhitespace => WHITESPACE_RE.replace_all(text, " ").trim().to_string(),
            NormalizeStep::StripBracketCitations => BRACKET_CITATION_RE.replace_all(text, "").into_owned(),
            NormalizeStep::StripAuthorYearCitations => AUTHOR_YEAR_RE.replace_all(text, "").into_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextNormalizer {
    steps: Vec<NormalizeStep>,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(CitationOrder::default())
    }
}

impl TextNormalizer {
    pub fn new(order: CitationOrder) -> Self {
        use NormalizeStep::*;
        let steps = match order {
            CitationOrder::Source => vec![StripPunctuation, CollapseWhitespace, StripBracketCitations, StripAuthorYearCitations],
            CitationOrder::StripFirst => vec![StripBracketCitations, StripAuthorYearCitations, StripPunctuation, CollapseWhitespace],
        };
        Self { steps }
    }

    pub fn steps(&self) -> &[NormalizeStep] {
        &self.steps
    }

    /// Idempotent: `normalize(normalize(s)) == normalize(s)`.
    pub fn normalize(&self, raw: &str) -> String {
        let mut text = raw.to_string();
        for step in &self.steps {
            text = step.apply(&text);
        }
        text
    }
}

/// Normalizes with the default step order.
pub fn normalize(raw: &str) -> String {
    TextNormalizer::default().normalize(raw)
}
