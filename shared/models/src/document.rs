use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One contiguous piece of rendered text, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub index: usize,
    pub text: String,
}

impl Fragment {
    /// Blank fragments separate paragraphs.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Full text of one page (1-based) plus the fragments it was assembled from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    pub number: u32,
    pub text: String,
    pub fragments: Vec<Fragment>,
}

impl PageText {
    /// Builds a page whose text is the fragments joined by a single space.
    pub fn from_lines<I, S>(number: u32, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fragments: Vec<Fragment> = lines
            .into_iter()
            .enumerate()
            .map(|(index, text)| Fragment { index, text: text.into() })
            .collect();

        let text = fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Self { number, text, fragments }
    }
}

/// Where the bytes of a document can be obtained from.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    Url(String),
    Inline(Vec<u8>),
}

/// Resolved reference to an uploaded document.
#[derive(Debug, Clone)]
pub struct DocumentHandle {
    pub id: Uuid,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub source: DocumentSource,
}

impl DocumentHandle {
    pub fn inline(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name: file_name.into(),
            uploaded_at: Utc::now(),
            source: DocumentSource::Inline(data),
        }
    }

    pub fn url(file_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name: file_name.into(),
            uploaded_at: Utc::now(),
            source: DocumentSource::Url(url.into()),
        }
    }
}

/// Public description of the loaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub id: Uuid,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&DocumentHandle> for DocumentInfo {
    fn from(handle: &DocumentHandle) -> Self {
        Self {
            id: handle.id,
            file_name: handle.file_name.clone(),
            uploaded_at: handle.uploaded_at,
        }
    }
}

/// Fragments of a page as the renderer displayed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPage {
    pub page: u32,
    pub fragments: Vec<Fragment>,
}

impl RenderedPage {
    pub fn from_texts<I, S>(page: u32, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            page,
            fragments: PageText::from_lines(page, texts).fragments,
        }
    }
}

/// Lifecycle of the search over the loaded document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SearchStatus {
    #[default]
    Idle,
    Searching,
    Complete,
    Failed { message: String },
}
