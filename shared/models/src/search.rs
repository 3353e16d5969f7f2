use baa_utils::normalize_term;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A lower-cased, trimmed, non-empty search token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SearchTerm(String);

impl SearchTerm {
    /// Returns `None` when nothing is left after trimming.
    pub fn new(raw: &str) -> Option<Self> {
        let normalized = normalize_term(raw);
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SearchTerm {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SearchTerm {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SearchTerm::new(&value).ok_or_else(|| "search term must not be empty".to_string())
    }
}

impl From<SearchTerm> for String {
    fn from(term: SearchTerm) -> Self {
        term.0
    }
}

/// Ordered search vocabulary. Earlier terms take precedence in result order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchTerms(Vec<SearchTerm>);

impl SearchTerms {
    /// Splits `input` on `separator`, dropping blank pieces. Duplicates are kept.
    pub fn parse(input: &str, separator: &str) -> Self {
        if separator.is_empty() {
            return Self(SearchTerm::new(input).into_iter().collect());
        }
        Self(input.split(separator).filter_map(SearchTerm::new).collect())
    }

    pub fn from_list<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(terms.into_iter().filter_map(|t| SearchTerm::new(t.as_ref())).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SearchTerm> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[SearchTerm] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a SearchTerms {
    type Item = &'a SearchTerm;
    type IntoIter = std::slice::Iter<'a, SearchTerm>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_term_normalizes() {
        let term = SearchTerm::new("  BREACH ").unwrap();
        assert_eq!(term.as_str(), "breach");
        assert!(SearchTerm::new("   ").is_none());
    }

    #[test]
    fn test_parse_preserves_order_and_duplicates() {
        let terms = SearchTerms::parse("Breach| training ||breach", "|");
        let parsed: Vec<&str> = terms.iter().map(SearchTerm::as_str).collect();
        assert_eq!(parsed, vec!["breach", "training", "breach"]);
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(SearchTerms::parse("", "|").is_empty());
        assert!(SearchTerms::parse(" | ", "|").is_empty());
    }

    #[test]
    fn test_search_term_rejects_blank_json() {
        assert!(serde_json::from_str::<SearchTerm>("\"  \"").is_err());
        let term: SearchTerm = serde_json::from_str("\"Training\"").unwrap();
        assert_eq!(term.as_str(), "training");
    }
}
