use marginalia_core::normalize::{normalize_title, trimmed_len};
use marginalia_core::{Clipping, ClippingType, FilterOptions};
use tracing::debug;

use crate::pipeline::StageOutcome;

/// Drop clippings with blank content. Bookmarks never have content and are kept.
pub fn remove_empty(clippings: Vec<Clipping>) -> StageOutcome {
    let before = clippings.len();
    let kept: Vec<Clipping> = clippings
        .into_iter()
        .filter(|c| c.clipping_type == ClippingType::Bookmark || c.has_content())
        .collect();
    let removed = before - kept.len();
    debug!(removed, "removed empty clippings");
    StageOutcome::new(kept, removed)
}

/// Apply book, type and length filters. `count` is the number dropped.
pub fn apply_filter(clippings: Vec<Clipping>, filter: &FilterOptions) -> StageOutcome {
    if filter.is_empty() {
        return StageOutcome::new(clippings, 0);
    }

    let only: Vec<String> = filter.only_books.iter().map(|t| normalize_title(t)).collect();
    let exclude: Vec<String> = filter
        .exclude_books
        .iter()
        .map(|t| normalize_title(t))
        .collect();

    let before = clippings.len();
    let kept: Vec<Clipping> = clippings
        .into_iter()
        .filter(|c| {
            let key = c.book_key();
            if !only.is_empty() && !only.contains(&key) {
                return false;
            }
            if exclude.contains(&key) {
                return false;
            }
            if filter.exclude_types.contains(&c.clipping_type) {
                return false;
            }
            match filter.min_content_length {
                Some(min) if c.is_highlight() || c.is_note() => trimmed_len(&c.content) >= min,
                _ => true,
            }
        })
        .collect();

    let removed = before - kept.len();
    debug!(removed, "filtered clippings");
    StageOutcome::new(kept, removed)
}

/// Keep highlights only. Run after linking so note text survives inside its highlight.
pub fn keep_highlights_only(clippings: Vec<Clipping>) -> StageOutcome {
    let before = clippings.len();
    let kept: Vec<Clipping> = clippings.into_iter().filter(Clipping::is_highlight).collect();
    let removed = before - kept.len();
    debug!(removed, "dropped non-highlight clippings");
    StageOutcome::new(kept, removed)
}
