//! Case folding shared by match extraction and fragment highlighting.
//!
//! Lower-casing is not length preserving in UTF-8 (`'İ'` folds to two
//! characters, `'K'` (Kelvin) shrinks from three bytes to one), so folded
//! offsets cannot be used to slice the original text directly. [`FoldedText`]
//! keeps, for every folded byte, the byte range of the original character it
//! was produced from.

use std::ops::Range;

/// Lower-cased text together with a map back to original byte offsets.
#[derive(Debug, Clone)]
pub struct FoldedText {
    folded: String,
    origin: Vec<Range<usize>>,
}

impl FoldedText {
    pub fn as_str(&self) -> &str {
        &self.folded
    }

    /// Maps a non-empty byte range of the folded text onto the original text.
    ///
    /// The result always covers whole original characters.
    pub fn original_range(&self, folded: Range<usize>) -> Range<usize> {
        debug_assert!(folded.start < folded.end && folded.end <= self.origin.len());
        self.origin[folded.start].start..self.origin[folded.end - 1].end
    }

    /// Every occurrence of `needle` in folded space, overlapping ones included,
    /// in ascending order of start offset.
    pub fn find_all(&self, needle: &str) -> Vec<Range<usize>> {
        let mut hits = Vec::new();
        if needle.is_empty() {
            return hits;
        }

        let mut from = 0;
        while let Some(pos) = self.folded[from..].find(needle) {
            let start = from + pos;
            hits.push(start..start + needle.len());

            // advance by one character so overlapping hits are still found
            let step = self.folded[start..]
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(1);
            from = start + step;
        }

        hits
    }
}

pub fn fold_case(text: &str) -> FoldedText {
    let mut folded = String::with_capacity(text.len());
    let mut origin = Vec::with_capacity(text.len());

    for (offset, ch) in text.char_indices() {
        let source = offset..offset + ch.len_utf8();
        for lower in ch.to_lowercase() {
            folded.push(lower);
            for _ in 0..lower.len_utf8() {
                origin.push(source.clone());
            }
        }
    }

    FoldedText { folded, origin }
}

/// Lower-cases and trims a user supplied term.
///
/// Folds with [`fold_case`] so terms and page text agree character by
/// character; `str::to_lowercase` would turn a word-final `'Σ'` into `'ς'`.
pub fn normalize_term(raw: &str) -> String {
    fold_case(raw.trim()).folded
}

/// Case-insensitive substring test; `term` is expected to be normalized already.
pub fn contains_folded(haystack: &str, term: &str) -> bool {
    !term.is_empty() && fold_case(haystack).as_str().contains(term)
}
