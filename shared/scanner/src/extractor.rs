//! Match extraction over a single page.

use baa_models::{PageText, RawMatch, SearchTerm};
use baa_utils::fold_case;
use std::ops::Range;

/// The only character that bounds a context window.
pub const CONTEXT_DELIMITER: char = ',';

/// Finds every occurrence of every term on `page`.
///
/// Matching is a case-insensitive substring search, so occurrences inside
/// longer words and overlapping occurrences all count. Output is grouped by
/// term in the order given, then by ascending offset.
pub fn extract(page: &PageText, terms: &[SearchTerm]) -> Vec<RawMatch> {
    let folded = fold_case(&page.text);
    let mut matches = Vec::new();

    for term in terms {
        for hit in folded.find_all(term.as_str()) {
            let occurrence = folded.original_range(hit);
            let bounds = context_bounds(&page.text, occurrence.clone());
            let context = page.text[bounds].trim();

            matches.push(RawMatch::new(
                page.number,
                term.clone(),
                occurrence.start,
                context.to_string(),
            ));
        }
    }

    matches
}

/// Widens `occurrence` to the surrounding comma-delimited span.
///
/// The span starts right after the nearest comma before the occurrence (or
/// at 0) and stops at the nearest comma after it (or at the end of text).
/// Neither comma is part of the span, so a context never ends in the
/// delimiter that closed it.
pub fn context_bounds(text: &str, occurrence: Range<usize>) -> Range<usize> {
    let start = text[..occurrence.start]
        .rfind(CONTEXT_DELIMITER)
        .map(|i| i + CONTEXT_DELIMITER.len_utf8())
        .unwrap_or(0);

    let end = text[occurrence.end..]
        .find(CONTEXT_DELIMITER)
        .map(|i| occurrence.end + i)
        .unwrap_or(text.len());

    start..end
}
