use std::collections::HashSet;

use marginalia_core::Clipping;
use marginalia_core::identity::content_hash;
use tracing::debug;

use crate::pipeline::StageOutcome;

/// Drop exact duplicates, keeping the first clipping seen for each
/// `(title, location, content)` hash. Order of survivors is unchanged.
///
/// `count` is the number of clippings removed.
pub fn remove_duplicates(clippings: Vec<Clipping>) -> StageOutcome {
    let before = clippings.len();
    let mut seen: HashSet<String> = HashSet::with_capacity(before);

    let kept: Vec<Clipping> = clippings
        .into_iter()
        .filter(|c| seen.insert(content_hash(&c.title, &c.location.raw, &c.content)))
        .collect();

    let removed = before - kept.len();
    debug!(removed, kept = kept.len(), "deduplicated clippings");
    StageOutcome::new(kept, removed)
}
