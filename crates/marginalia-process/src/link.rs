//! Attaches notes to the highlight they annotate.
//!
//! Devices store a note as its own record at (or near) the location of the
//! highlighted passage. Within each book, notes are taken in block order and
//! matched against the book's highlights:
//!
//! 1. containment: highlights whose range covers the note's position, closest
//!    start wins;
//! 2. proximity: only when nothing contains the note, the nearest highlight,
//!    if it is at most [`MAX_LINK_DISTANCE`] units away.
//!
//! A highlight keeps the first note matched to it. A later note whose best
//! match already has a note stays unlinked.

use marginalia_core::Clipping;
use tracing::{debug, trace};

use crate::grouper::group_indices_by_book;
use crate::pipeline::StageOutcome;

/// Farthest a note may sit from a highlight and still be linked to it.
pub const MAX_LINK_DISTANCE: u32 = 10;

/// Link notes to highlights, embedding each note's text in its highlight.
///
/// `count` is the number of links made. Nothing is removed or reordered.
pub fn link_notes(mut clippings: Vec<Clipping>) -> StageOutcome {
    let mut links: Vec<(usize, usize)> = Vec::new();

    for group in &group_indices_by_book(&clippings) {
        let mut notes: Vec<usize> = group
            .items
            .iter()
            .copied()
            .filter(|&i| {
                let c = &clippings[i];
                c.is_note() && c.location.is_known() && c.linked_highlight_id.is_none()
            })
            .collect();
        if notes.is_empty() {
            continue;
        }
        notes.sort_by_key(|&i| clippings[i].block_index);

        let mut highlights: Vec<usize> = group
            .items
            .iter()
            .copied()
            .filter(|&i| {
                let c = &clippings[i];
                c.is_highlight() && c.location.is_known()
            })
            .collect();
        highlights.sort_by_key(|&i| (clippings[i].location.start, clippings[i].block_index));

        let mut taken: Vec<bool> = highlights
            .iter()
            .map(|&i| clippings[i].linked_note_id.is_some())
            .collect();
        for note in notes {
            let position = clippings[note].location.start;
            let Some(slot) = find_highlight(&clippings, &highlights, position) else {
                continue;
            };
            if taken[slot] {
                trace!(note = %clippings[note].id, "best highlight already has a note");
                continue;
            }
            taken[slot] = true;
            links.push((note, highlights[slot]));
        }
    }

    let linked = links.len();
    for (note, highlight) in links {
        let note_id = clippings[note].id.clone();
        let note_text = clippings[note].content.clone();
        let highlight_id = clippings[highlight].id.clone();
        trace!(note = %note_id, highlight = %highlight_id, "linked note");

        clippings[note].linked_highlight_id = Some(highlight_id);
        let target = &mut clippings[highlight];
        target.linked_note_id = Some(note_id);
        target.note = Some(note_text);
    }

    debug!(linked, "linked notes to highlights");
    StageOutcome::new(clippings, linked)
}

/// Slot in `highlights` of the best match for a note at `position`, linked or not.
fn find_highlight(clippings: &[Clipping], highlights: &[usize], position: u32) -> Option<usize> {
    let candidates = highlights
        .iter()
        .enumerate()
        .map(|(slot, &i)| (slot, &clippings[i].location));

    let containing = candidates
        .clone()
        .filter(|(_, location)| location.contains(position))
        .min_by_key(|(_, location)| location.start.abs_diff(position));
    if let Some((slot, _)) = containing {
        return Some(slot);
    }

    candidates
        .map(|(slot, location)| (slot, location.distance_to(position)))
        .min_by_key(|(_, distance)| *distance)
        .filter(|(_, distance)| *distance <= MAX_LINK_DISTANCE)
        .map(|(slot, _)| slot)
}
