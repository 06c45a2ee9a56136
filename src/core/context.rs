use crate::domain::model::{ScoredPoint, TextbookPage};

/// Number of non-empty whitespace-separated segments.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Maps search hits to pages, in score order.
///
/// Page numbers are `id - page_offset`. Hits without a string `text`
/// payload are dropped.
pub fn pages_from_points(points: Vec<ScoredPoint>, page_offset: i64) -> Vec<TextbookPage> {
    points
        .into_iter()
        .filter_map(|point| {
            let text = match point.payload.get("text").and_then(|v| v.as_str()) {
                Some(text) => text.to_string(),
                None => {
                    tracing::warn!("Point {} has no text payload, skipping", point.id);
                    return None;
                }
            };

            Some(TextbookPage {
                page_number: point.id as i64 - page_offset,
                word_count: word_count(&text),
                text,
            })
        })
        .collect()
}

/// Greedy, order-preserving cut: stops at the first page that would push the
/// running total past `word_limit`.
pub fn select_within_budget(pages: Vec<TextbookPage>, word_limit: usize) -> Vec<TextbookPage> {
    let mut words = 0;
    let mut selected = Vec::with_capacity(pages.len());

    for page in pages {
        if words + page.word_count > word_limit {
            tracing::debug!(
                "Word budget reached at page {} ({} + {} > {})",
                page.page_number,
                words,
                page.word_count,
                word_limit
            );
            break;
        }

        words += page.word_count;
        selected.push(page);
    }

    selected
}
