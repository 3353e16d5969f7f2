//! PDF Processor
//!
//! Text-extraction collaborator backed by pdf-extract. pdf-extract separates
//! pages with form feeds; every line of a page becomes one fragment.

use async_trait::async_trait;
use baa_models::{DocumentHandle, DocumentSource, PageText};
use baa_scanner::{InMemoryPages, PageSource, TextExtractor};
use baa_utils::{BaaError, BaaResult};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

const PAGE_BREAK: char = '\x0C';

/// PDF processor
pub struct PdfProcessor {
    client: Client,
}

impl PdfProcessor {
    pub fn new(fetch_timeout: Duration) -> BaaResult<Self> {
        let client = Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(|e| BaaError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Extract pages from PDF bytes
    pub fn extract_pages(data: &[u8]) -> BaaResult<Vec<PageText>> {
        let text = pdf_extract::extract_text_from_mem(data)
            .map_err(|e| BaaError::document_unreadable(format!("Failed to extract text from PDF: {}", e)))?;

        Ok(split_pages(&text))
    }

    async fn load_bytes(&self, source: &DocumentSource) -> BaaResult<Vec<u8>> {
        match source {
            DocumentSource::Inline(data) => Ok(data.clone()),
            DocumentSource::Url(url) => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| BaaError::document_unreadable(format!("Failed to fetch {}: {}", url, e)))?;

                if !response.status().is_success() {
                    return Err(BaaError::document_unreadable(format!(
                        "Fetching {} returned {}",
                        url,
                        response.status()
                    )));
                }

                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| BaaError::document_unreadable(format!("Failed to read {}: {}", url, e)))?;
                Ok(bytes.to_vec())
            }
        }
    }
}

#[async_trait]
impl TextExtractor for PdfProcessor {
    async fn open(&self, document: &DocumentHandle) -> BaaResult<Box<dyn PageSource>> {
        let data = self.load_bytes(&document.source).await?;

        let pages = tokio::task::spawn_blocking(move || PdfProcessor::extract_pages(&data))
            .await
            .map_err(|e| BaaError::document_unreadable(format!("PDF parser aborted: {}", e)))??;

        debug!(document = %document.id, pages = pages.len(), "Extracted PDF text");
        Ok(Box::new(InMemoryPages::new(pages)))
    }
}

/// Splits extracted text into pages. A trailing page break does not open an
/// extra page, but a document always has at least one page.
fn split_pages(text: &str) -> Vec<PageText> {
    let mut raw: Vec<&str> = text.split(PAGE_BREAK).collect();
    if raw.len() > 1 && raw.last().map(|p| p.trim().is_empty()).unwrap_or(false) {
        raw.pop();
    }

    raw.into_iter()
        .enumerate()
        .map(|(i, page)| PageText::from_lines(i as u32 + 1, page.lines().map(str::trim_end)))
        .collect()
}
