//! Tags written inside notes (`#stoicism #to-review`) copied onto the highlight
//! the note is attached to.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use marginalia_core::Clipping;

use crate::pipeline::StageOutcome;

static HASHTAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)#([\p{L}\p{N}][\p{L}\p{N}_\-]*)").expect("valid regex"));

/// Lowercased hashtags of `text`, first occurrence order, without duplicates.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut tags = Vec::new();
    for caps in HASHTAG_RE.captures_iter(text) {
        let tag = caps[1].to_lowercase();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Add hashtags from each highlight's embedded note to its `tags`.
///
/// `count` is the number of highlights that gained at least one tag.
pub fn apply_note_tags(mut clippings: Vec<Clipping>) -> StageOutcome {
    let mut tagged = 0usize;

    for clipping in clippings.iter_mut().filter(|c| c.is_highlight()) {
        let Some(note) = clipping.note.as_deref() else {
            continue;
        };
        let before = clipping.tags.len();
        let found = extract_hashtags(note);
        append_unique(&mut clipping.tags, &found);
        if clipping.tags.len() > before {
            tagged += 1;
        }
    }

    debug!(tagged, "extracted tags from linked notes");
    StageOutcome::new(clippings, tagged)
}

pub(crate) fn append_unique<T>(target: &mut Vec<T>, incoming: &[T])
where
    T: Clone + PartialEq,
{
    for item in incoming {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}
