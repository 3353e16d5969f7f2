use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Fragment indices to mark on the rendered page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightSet {
    /// The paragraph around the first fragment containing the term.
    pub paragraph: BTreeSet<usize>,
    /// Every fragment containing the term, anywhere on the page.
    pub term: BTreeSet<usize>,
}

impl HighlightSet {
    pub fn is_empty(&self) -> bool {
        self.paragraph.is_empty() && self.term.is_empty()
    }
}

/// A slice of a context string, marked when it is part of a term occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub start: usize,
    pub end: usize,
    pub highlight: bool,
}
