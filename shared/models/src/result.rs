use serde::{Deserialize, Serialize};

use crate::search::SearchTerm;

/// Placeholder summary used whenever the summarizer fails.
pub const SUMMARY_FAILED: &str = "Failed to generate summary.";

/// An occurrence found by the extractor, before summarization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMatch {
    pub page: u32,
    pub term: SearchTerm,
    /// Byte offset of the occurrence in the page text.
    pub offset: usize,
    pub context: String,
}

impl RawMatch {
    pub fn new(page: u32, term: SearchTerm, offset: usize, context: String) -> Self {
        Self { page, term, offset, context }
    }
}

/// A summarized match. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    page: u32,
    term: SearchTerm,
    context: String,
    summary: String,
}

impl MatchRecord {
    pub fn new(raw: RawMatch, summary: String) -> Self {
        Self {
            page: raw.page,
            term: raw.term,
            context: raw.context,
            summary,
        }
    }

    pub fn failed(raw: RawMatch) -> Self {
        Self::new(raw, SUMMARY_FAILED.to_string())
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn term(&self) -> &SearchTerm {
        &self.term
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn summary_failed(&self) -> bool {
        self.summary == SUMMARY_FAILED
    }
}

/// Ordered by page, then term order, then occurrence offset. Never deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet(Vec<MatchRecord>);

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MatchRecord> {
        self.0.get(index)
    }

    pub fn first(&self) -> Option<&MatchRecord> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MatchRecord> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[MatchRecord] {
        &self.0
    }

    pub(crate) fn push(&mut self, record: MatchRecord) {
        self.0.push(record);
    }

    /// Copy-all text: `Page N: context` per record, separated by a blank line.
    pub fn export_text(&self) -> String {
        self.0
            .iter()
            .map(|r| format!("Page {}: {}", r.page, r.context))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl From<Vec<MatchRecord>> for ResultSet {
    fn from(records: Vec<MatchRecord>) -> Self {
        Self(records)
    }
}

impl Extend<MatchRecord> for ResultSet {
    fn extend<I: IntoIterator<Item = MatchRecord>>(&mut self, iter: I) {
        for record in iter {
            self.push(record);
        }
    }
}

impl IntoIterator for ResultSet {
    type Item = MatchRecord;
    type IntoIter = std::vec::IntoIter<MatchRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a MatchRecord;
    type IntoIter = std::slice::Iter<'a, MatchRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
