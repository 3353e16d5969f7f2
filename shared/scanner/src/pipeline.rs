//! Document-wide search: pages in order, terms in order, then summaries.

use baa_models::{DocumentHandle, MatchRecord, RawMatch, ResultSet, SearchTerms};
use baa_utils::{BaaResult, SummarizerConfig};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::collaborators::{Summarizer, TextExtractor};
use crate::extractor::extract;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub summary_timeout: Duration,
    /// Summaries in flight at once; results keep page/term/offset order regardless.
    pub max_concurrency: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            summary_timeout: Duration::from_secs(30),
            max_concurrency: 4,
        }
    }
}

impl From<&SummarizerConfig> for PipelineOptions {
    fn from(config: &SummarizerConfig) -> Self {
        Self {
            summary_timeout: Duration::from_secs(config.timeout_seconds),
            max_concurrency: config.max_concurrency.max(1),
        }
    }
}

/// Result of searching one document.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Zero when no terms were supplied and the document was never opened.
    pub page_count: u32,
    pub results: ResultSet,
}

#[derive(Clone)]
pub struct SearchPipeline {
    extractor: Arc<dyn TextExtractor>,
    summarizer: Arc<dyn Summarizer>,
    options: PipelineOptions,
}

impl SearchPipeline {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        summarizer: Arc<dyn Summarizer>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            extractor,
            summarizer,
            options,
        }
    }

    /// Searches the whole document.
    ///
    /// Pages are read strictly one after another. Any extraction failure
    /// aborts the search with no partial results; summarization failures only
    /// affect the record they belong to.
    pub async fn run(&self, document: &DocumentHandle, terms: &SearchTerms) -> BaaResult<SearchOutcome> {
        if terms.is_empty() {
            info!(document = %document.id, "No search terms supplied");
            return Ok(SearchOutcome::default());
        }

        let source = self.extractor.open(document).await?;
        let page_count = source.page_count();

        let mut results = ResultSet::new();
        for number in 1..=page_count {
            let page = source.page(number).await?;
            let found = extract(&page, terms.as_slice());
            debug!(page = number, matches = found.len(), "Scanned page");

            if !found.is_empty() {
                results.extend(self.summarize_all(found).await);
            }
        }

        info!(
            document = %document.id,
            pages = page_count,
            matches = results.len(),
            "Search complete"
        );

        Ok(SearchOutcome {
            page_count,
            results,
        })
    }

    /// Summarizes in emission order; `buffered` yields in input order.
    async fn summarize_all(&self, found: Vec<RawMatch>) -> Vec<MatchRecord> {
        stream::iter(found)
            .map(|raw| self.summarize_one(raw))
            .buffered(self.options.max_concurrency.max(1))
            .collect()
            .await
    }

    async fn summarize_one(&self, raw: RawMatch) -> MatchRecord {
        let summary = tokio::time::timeout(
            self.options.summary_timeout,
            self.summarizer.summarize(&raw.context),
        )
        .await;

        match summary {
            Ok(Ok(summary)) => MatchRecord::new(raw, summary),
            Ok(Err(e)) => {
                warn!(page = raw.page, term = %raw.term, error = %e, "Summarization failed");
                MatchRecord::failed(raw)
            }
            Err(_) => {
                warn!(page = raw.page, term = %raw.term, "Summarization timed out");
                MatchRecord::failed(raw)
            }
        }
    }
}
