//! Viewer state: loaded document, results, selection and current page.
//!
//! Every document load bumps a generation counter. A search reports back with
//! the generation it started under and is ignored if another document has
//! been loaded since.

use baa_models::{DocumentInfo, MatchRecord, ResultSet, SearchStatus, SearchTerms};
use baa_utils::{BaaError, BaaResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pipeline::SearchOutcome;

/// Page navigation requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PageAction {
    Next,
    Previous,
    GoTo { page: u32 },
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewerState {
    generation: u64,
    status: SearchStatus,
    document: Option<DocumentInfo>,
    terms: SearchTerms,
    page_count: Option<u32>,
    current_page: u32,
    results: ResultSet,
    selected: Option<usize>,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            generation: 0,
            status: SearchStatus::Idle,
            document: None,
            terms: SearchTerms::default(),
            page_count: None,
            current_page: 1,
            results: ResultSet::new(),
            selected: None,
        }
    }
}

impl ViewerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts over for a new document and returns the generation to search under.
    pub fn load_document(&mut self, document: DocumentInfo, terms: SearchTerms) -> u64 {
        self.generation += 1;
        self.status = SearchStatus::Searching;
        self.document = Some(document);
        self.terms = terms;
        self.page_count = None;
        self.current_page = 1;
        self.results = ResultSet::new();
        self.selected = None;
        self.generation
    }

    /// Installs search results; the first record becomes selected.
    ///
    /// Returns `false` when the outcome belongs to an older document.
    pub fn complete(&mut self, generation: u64, outcome: SearchOutcome) -> bool {
        if generation != self.generation {
            debug!(generation, current = self.generation, "Discarding stale search results");
            return false;
        }

        if outcome.page_count > 0 {
            self.page_count = Some(outcome.page_count);
        }
        self.results = outcome.results;
        self.status = SearchStatus::Complete;
        self.selected = None;

        if let Some(page) = self.results.first().map(MatchRecord::page) {
            self.selected = Some(0);
            self.current_page = page;
        }

        true
    }

    /// Records a document-level failure. Stale failures are ignored.
    pub fn fail(&mut self, generation: u64, error: &BaaError) -> bool {
        if generation != self.generation {
            debug!(generation, current = self.generation, "Discarding stale search failure");
            return false;
        }

        self.status = SearchStatus::Failed {
            message: error.to_string(),
        };
        self.results = ResultSet::new();
        self.selected = None;
        true
    }

    /// Selects a result and shows its page.
    pub fn select(&mut self, index: usize) -> BaaResult<&MatchRecord> {
        let page = self
            .results
            .get(index)
            .map(MatchRecord::page)
            .ok_or_else(|| BaaError::not_found(format!("result {}", index)))?;

        self.selected = Some(index);
        self.current_page = page;
        Ok(&self.results.as_slice()[index])
    }

    pub fn set_page_count(&mut self, page_count: u32) {
        self.page_count = Some(page_count.max(1));
        self.current_page = self.current_page.min(page_count.max(1));
    }

    pub fn navigate(&mut self, action: PageAction) -> BaaResult<u32> {
        let last = self.page_count.unwrap_or(1);

        self.current_page = match action {
            PageAction::Next => (self.current_page + 1).min(last),
            PageAction::Previous => self.current_page.saturating_sub(1).max(1),
            PageAction::GoTo { page } => {
                if page < 1 || page > last {
                    return Err(BaaError::validation(
                        "page",
                        format!("Page {} is outside 1..={}", page, last),
                    ));
                }
                page
            }
        };

        Ok(self.current_page)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn status(&self) -> &SearchStatus {
        &self.status
    }

    pub fn document(&self) -> Option<&DocumentInfo> {
        self.document.as_ref()
    }

    pub fn terms(&self) -> &SearchTerms {
        &self.terms
    }

    pub fn page_count(&self) -> Option<u32> {
        self.page_count
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&MatchRecord> {
        self.selected.and_then(|i| self.results.get(i))
    }
}
