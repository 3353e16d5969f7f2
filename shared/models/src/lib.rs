//! # BAA Viewer Domain Models
//!
//! Types shared between the term scanner and the viewer service.
//!
//! ## Key Models
//!
//! - **SearchTerm / SearchTerms**: normalized, ordered search vocabulary
//! - **PageText / Fragment**: one page of extracted text and its rendered pieces
//! - **MatchRecord / ResultSet**: the ordered, immutable output of a document search
//! - **HighlightSet**: fragment indices to mark for the selected match
//! - **DocumentHandle**: resolved reference to an uploaded document

pub mod search;
pub mod document;
pub mod result;
pub mod highlight;

pub use search::*;
pub use document::*;
pub use result::*;
pub use highlight::*;
