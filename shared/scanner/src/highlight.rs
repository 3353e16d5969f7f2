//! Highlight location over rendered fragments.

use baa_models::{Chunk, Fragment, HighlightSet, RenderedPage, SearchTerm};
use baa_utils::{contains_folded, fold_case, BaaError, BaaResult};
use std::collections::BTreeSet;
use std::ops::Range;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// Works out which fragments to mark for `term`.
///
/// Only the first fragment containing the term anchors the paragraph; the
/// paragraph runs between the nearest blank fragments on either side. Every
/// fragment containing the term is reported separately, wherever it sits.
pub fn locate(fragments: &[Fragment], term: &SearchTerm) -> HighlightSet {
    let term_hits: BTreeSet<usize> = fragments
        .iter()
        .enumerate()
        .filter(|(_, f)| contains_folded(&f.text, term.as_str()))
        .map(|(i, _)| i)
        .collect();

    let Some(&anchor) = term_hits.iter().next() else {
        return HighlightSet::default();
    };

    let start = fragments[..anchor]
        .iter()
        .rposition(Fragment::is_blank)
        .map(|i| i + 1)
        .unwrap_or(0);

    // the anchor itself holds the term, so it is never blank
    let end = fragments[anchor + 1..]
        .iter()
        .position(Fragment::is_blank)
        .map(|i| anchor + i)
        .unwrap_or(fragments.len() - 1);

    HighlightSet {
        paragraph: (start..=end).collect(),
        term: term_hits,
    }
}

/// Runs [`locate`] once the renderer has reported fragments for `page`.
///
/// Waits at most `deferral`; if the fragments are still missing the caller
/// gets [`BaaError::FragmentsNotReady`] and should simply try again later.
pub async fn locate_when_ready(
    rendered: &mut watch::Receiver<Option<RenderedPage>>,
    page: u32,
    term: &SearchTerm,
    deferral: Duration,
) -> BaaResult<HighlightSet> {
    let ready = |current: &Option<RenderedPage>| {
        matches!(current, Some(rendered) if rendered.page == page)
    };

    let waited = tokio::time::timeout(deferral, rendered.wait_for(ready)).await;
    match waited {
        Ok(Ok(current)) => Ok(current
            .as_ref()
            .map(|rendered| locate(&rendered.fragments, term))
            .unwrap_or_default()),
        Ok(Err(_)) | Err(_) => {
            debug!(page, term = %term, "Fragments not rendered yet");
            Err(BaaError::FragmentsNotReady { page })
        }
    }
}

/// Splits `context` into plain and highlighted chunks for every term occurrence.
///
/// Overlapping or touching occurrences of different terms are merged into a
/// single highlighted chunk. The chunks cover the whole string in order.
pub fn term_chunks(context: &str, terms: &[SearchTerm]) -> Vec<Chunk> {
    let folded = fold_case(context);

    let mut hits: Vec<Range<usize>> = terms
        .iter()
        .flat_map(|term| folded.find_all(term.as_str()))
        .map(|hit| folded.original_range(hit))
        .collect();
    hits.sort_by_key(|r| (r.start, r.end));

    let mut merged: Vec<Range<usize>> = Vec::with_capacity(hits.len());
    for hit in hits {
        match merged.last_mut() {
            Some(last) if hit.start <= last.end => last.end = last.end.max(hit.end),
            _ => merged.push(hit),
        }
    }

    let mut chunks = Vec::with_capacity(merged.len() * 2 + 1);
    let mut cursor = 0;
    for hit in merged {
        if hit.start > cursor {
            chunks.push(Chunk { start: cursor, end: hit.start, highlight: false });
        }
        chunks.push(Chunk { start: hit.start, end: hit.end, highlight: true });
        cursor = hit.end;
    }
    if cursor < context.len() {
        chunks.push(Chunk { start: cursor, end: context.len(), highlight: false });
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fragments(texts: &[&str]) -> Vec<Fragment> {
        RenderedPage::from_texts(1, texts.iter().copied()).fragments
    }

    fn term(raw: &str) -> SearchTerm {
        SearchTerm::new(raw).unwrap()
    }

    fn set(items: &[usize]) -> BTreeSet<usize> {
        items.iter().copied().collect()
    }

    #[test]
    fn test_paragraph_between_blank_fragments() {
        let found = locate(
            &fragments(&["", "The breach was", "bad.", "", "Unrelated text."]),
            &term("breach"),
        );
        assert_eq!(found.paragraph, set(&[1, 2]));
        assert_eq!(found.term, set(&[1]));
    }

    #[test]
    fn test_no_match_gives_empty_sets() {
        let found = locate(&fragments(&["alpha", "", "beta"]), &term("breach"));
        assert!(found.is_empty());
        assert!(locate(&[], &term("breach")).is_empty());
    }

    #[test]
    fn test_paragraph_without_separators_spans_page() {
        let found = locate(&fragments(&["one", "Breach two", "three"]), &term("breach"));
        assert_eq!(found.paragraph, set(&[0, 1, 2]));
        assert_eq!(found.term, set(&[1]));
    }

    #[test]
    fn test_only_first_occurrence_anchors_paragraph() {
        let found = locate(
            &fragments(&["intro", "training day", "  ", "more", "TRAINING again"]),
            &term("training"),
        );
        assert_eq!(found.paragraph, set(&[0, 1]));
        assert_eq!(found.term, set(&[1, 4]));
    }

    #[tokio::test]
    async fn test_locate_when_ready_waits_for_page() {
        let (tx, mut rx) = watch::channel(None);

        let publisher = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            tx.send_replace(Some(RenderedPage::from_texts(2, ["a breach"])));
            tx
        });

        let found = locate_when_ready(&mut rx, 2, &term("breach"), Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(found.term, set(&[0]));
        drop(publisher.await.unwrap());
    }

    #[tokio::test]
    async fn test_locate_when_ready_times_out_on_other_page() {
        let (_tx, mut rx) = watch::channel(Some(RenderedPage::from_texts(1, ["a breach"])));

        let err = locate_when_ready(&mut rx, 3, &term("breach"), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, BaaError::FragmentsNotReady { page: 3 }));
    }

    #[test]
    fn test_term_chunks_merges_overlaps() {
        let context = "Breach of training, breaching";
        let chunks = term_chunks(context, &[term("breach"), term("each"), term("training")]);
        let rendered: Vec<(&str, bool)> = chunks
            .iter()
            .map(|c| (&context[c.start..c.end], c.highlight))
            .collect();
        assert_eq!(
            rendered,
            vec![
                ("Breach", true),
                (" of ", false),
                ("training", true),
                (", ", false),
                ("breach", true),
                ("ing", false),
            ]
        );
    }

    #[test]
    fn test_term_chunks_without_hits() {
        let chunks = term_chunks("plain", &[term("breach")]);
        assert_eq!(chunks, vec![Chunk { start: 0, end: 5, highlight: false }]);
        assert!(term_chunks("", &[term("breach")]).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_term_hits_inside_page_and_paragraph_contiguous(
            texts in prop::collection::vec("[a-c ]{0,6}", 0..12),
        ) {
            let frags = fragments(&texts.iter().map(String::as_str).collect::<Vec<_>>());
            let found = locate(&frags, &term("ab"));

            prop_assert!(found.term.iter().all(|&i| i < frags.len()));
            if let Some(&first) = found.term.iter().next() {
                prop_assert!(found.paragraph.contains(&first));
                let lo = *found.paragraph.iter().next().unwrap();
                let hi = *found.paragraph.iter().last().unwrap();
                prop_assert_eq!(found.paragraph.len(), hi - lo + 1);
                prop_assert!(found.paragraph.iter().all(|&i| !frags[i].is_blank()));
            } else {
                prop_assert!(found.paragraph.is_empty());
            }
        }
    }
}
