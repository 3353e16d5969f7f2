//! Boundaries to the outside world: text extraction and summarization.

use async_trait::async_trait;
use baa_models::{DocumentHandle, PageText};
use baa_utils::{BaaError, BaaResult};

/// Opens a document and hands out its pages.
///
/// An unreadable document must surface as [`BaaError::DocumentUnreadable`].
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn open(&self, document: &DocumentHandle) -> BaaResult<Box<dyn PageSource>>;
}

/// Pages of an opened document, numbered from 1.
#[async_trait]
pub trait PageSource: Send + Sync {
    fn page_count(&self) -> u32;

    async fn page(&self, number: u32) -> BaaResult<PageText>;
}

/// Turns a context string into a short summary.
///
/// Failures never reach the caller of a search; they are replaced by a
/// placeholder summary.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> anyhow::Result<String>;
}

/// Pages that are already fully extracted.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPages {
    pages: Vec<PageText>,
}

impl InMemoryPages {
    /// Pages are renumbered 1..=N in the given order.
    pub fn new(pages: Vec<PageText>) -> Self {
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(i, mut page)| {
                page.number = i as u32 + 1;
                page
            })
            .collect();
        Self { pages }
    }
}

#[async_trait]
impl PageSource for InMemoryPages {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    async fn page(&self, number: u32) -> BaaResult<PageText> {
        number
            .checked_sub(1)
            .and_then(|i| self.pages.get(i as usize))
            .cloned()
            .ok_or_else(|| BaaError::document_unreadable(format!("page {} does not exist", number)))
    }
}
