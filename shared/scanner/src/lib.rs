//! # BAA Term Scanner
//!
//! Finds configured terms in extracted PDF text, cuts a comma-bounded context
//! around every occurrence, summarizes each context through a pluggable
//! collaborator and works out which rendered fragments to highlight for the
//! selected match.
//!
//! The crate holds no global state. Text extraction, summarization and
//! rendering are reached through the traits in [`collaborators`].

pub mod collaborators;
pub mod extractor;
pub mod highlight;
pub mod pipeline;
pub mod session;
pub mod viewer;

pub use collaborators::{InMemoryPages, PageSource, Summarizer, TextExtractor};
pub use extractor::{context_bounds, extract, CONTEXT_DELIMITER};
pub use highlight::{locate, locate_when_ready, term_chunks};
pub use pipeline::{PipelineOptions, SearchOutcome, SearchPipeline};
pub use session::ViewerSession;
pub use viewer::{PageAction, ViewerState};
