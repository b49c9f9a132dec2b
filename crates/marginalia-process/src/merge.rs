//! Overlap-aware merging of re-selected or extended highlights.
//!
//! Devices record a new highlight when an existing one is extended instead of
//! updating it. Within a book, highlights are sorted by location and scanned
//! with a running accumulator; each next highlight that sits close enough and
//! shares enough text with the accumulator is folded into it.

use std::collections::HashMap;

use marginalia_core::normalize::word_set;
use marginalia_core::{Clipping, MergeMode, SuspiciousReason};
use tracing::{debug, trace};

use crate::grouper::group_indices_by_book;
use crate::pipeline::StageOutcome;
use crate::similarity::{containment, contains_either};
use crate::tags::append_unique;

/// Largest gap, in location units, between the end of one highlight and the
/// start of the next for the two to still be merge candidates.
pub const MERGE_GAP_TOLERANCE: i64 = 5;

/// Minimum share of the smaller highlight's words found in the other one.
pub const MIN_WORD_OVERLAP: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default)]
pub struct HighlightMerger {
    mode: MergeMode,
}

impl HighlightMerger {
    pub fn new(mode: MergeMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> MergeMode {
        self.mode
    }

    /// Merge (or flag) overlapping highlights, book by book.
    ///
    /// In [`MergeMode::Merge`] `count` is the number of fusions performed and
    /// the output is shorter by that much. In [`MergeMode::Flag`] nothing is
    /// removed and `count` is the number of highlights flagged `overlapping`.
    /// Non-highlight clippings pass through untouched and output order follows
    /// input order.
    pub fn run(&self, clippings: Vec<Clipping>) -> StageOutcome {
        let outcome = match self.mode {
            MergeMode::Merge => fuse_overlapping(clippings),
            MergeMode::Flag => flag_overlapping(clippings),
        };
        debug!(mode = ?self.mode, count = outcome.count, "merged overlapping highlights");
        outcome
    }
}

/// Whether `next` looks like a re-selection or extension of `current`.
///
/// `current` is expected to start at or before `next`.
pub fn can_merge(current: &Clipping, next: &Clipping) -> bool {
    if current.book_key() != next.book_key() {
        return false;
    }
    if !current.location.is_known() || !next.location.is_known() {
        return false;
    }
    if current.location.gap_to(&next.location) > MERGE_GAP_TOLERANCE {
        return false;
    }
    if contains_either(&current.content, &next.content) {
        return true;
    }
    containment(&word_set(&current.content), &word_set(&next.content)) >= MIN_WORD_OVERLAP
}

/// Fuse two overlapping highlights into one.
///
/// The one with longer content is the base and keeps its id; ties favor
/// `current`. The result spans both locations, carries the later date, the
/// union of tags and the earliest block index.
pub fn merge_pair(current: &Clipping, next: &Clipping) -> Clipping {
    let (base, other) = if content_len(next) > content_len(current) {
        (next, current)
    } else {
        (current, next)
    };

    let mut merged = base.clone();

    let span = base.location.span(&other.location);
    if span.start != base.location.start || span.end_or_start() != base.location.end_or_start() {
        merged.location = span;
    }

    if let Some(other_date) = other.date
        && merged.date.is_none_or(|date| other_date > date)
    {
        merged.date = Some(other_date);
        merged.date_raw = other.date_raw.clone();
    }

    append_unique(&mut merged.tags, &other.tags);

    if merged.note.is_none() {
        merged.note = other.note.clone();
        merged.linked_note_id = other.linked_note_id.clone();
    }
    if merged.author.trim().is_empty() {
        merged.author = other.author.clone();
    }

    merged.block_index = base.block_index.min(other.block_index);
    merged.page = match (base.page, other.page) {
        (Some(left), Some(right)) => Some(left.min(right)),
        (left, right) => left.or(right),
    };

    merged
}

fn content_len(clipping: &Clipping) -> usize {
    clipping.content.trim().chars().count()
}

/// Highlight positions of each book, sorted by start location then block index.
fn sorted_highlights(clippings: &[Clipping]) -> Vec<Vec<usize>> {
    group_indices_by_book(clippings)
        .into_iter()
        .map(|group| {
            let mut order: Vec<usize> = group
                .items
                .into_iter()
                .filter(|&i| clippings[i].is_highlight())
                .collect();
            order.sort_by_key(|&i| (clippings[i].location.start, clippings[i].block_index));
            order
        })
        .filter(|order| order.len() > 1)
        .collect()
}

/// Repeat fusion passes until one merges nothing, so the result is a fixed point.
fn fuse_overlapping(mut clippings: Vec<Clipping>) -> StageOutcome {
    let mut total = 0usize;
    loop {
        let pass = fuse_pass(clippings);
        clippings = pass.clippings;
        if pass.count == 0 {
            return StageOutcome::new(clippings, total);
        }
        total += pass.count;
    }
}

fn fuse_pass(clippings: Vec<Clipping>) -> StageOutcome {
    // merged record goes in the slot of its earliest member, the rest are dropped
    let mut replacements: HashMap<usize, Clipping> = HashMap::new();
    let mut absorbed = vec![false; clippings.len()];
    let mut fusions = 0usize;

    for order in sorted_highlights(&clippings) {
        let Some((&first, rest)) = order.split_first() else {
            continue;
        };
        let mut current = clippings[first].clone();
        let mut members = vec![first];

        for &next in rest {
            let candidate = &clippings[next];
            if can_merge(&current, candidate) {
                trace!(base = %current.id, next = %candidate.id, "fusing highlights");
                current = merge_pair(&current, candidate);
                members.push(next);
                fusions += 1;
            } else {
                settle(current, &members, &mut replacements, &mut absorbed);
                current = candidate.clone();
                members = vec![next];
            }
        }
        settle(current, &members, &mut replacements, &mut absorbed);
    }

    let merged: Vec<Clipping> = clippings
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !absorbed[*i])
        .map(|(i, original)| replacements.remove(&i).unwrap_or(original))
        .collect();

    StageOutcome::new(merged, fusions)
}

fn settle(
    accumulated: Clipping,
    members: &[usize],
    replacements: &mut HashMap<usize, Clipping>,
    absorbed: &mut [bool],
) {
    if members.len() < 2 {
        return;
    }
    let Some(&slot) = members.iter().min() else {
        return;
    };
    for &member in members {
        if member != slot {
            absorbed[member] = true;
        }
    }
    replacements.insert(slot, accumulated);
}

fn flag_overlapping(mut clippings: Vec<Clipping>) -> StageOutcome {
    let mut flags: Vec<(usize, String)> = Vec::new();

    for order in sorted_highlights(&clippings) {
        let Some((&first, rest)) = order.split_first() else {
            continue;
        };
        let mut keeper = first;

        for &next in rest {
            if !can_merge(&clippings[keeper], &clippings[next]) {
                keeper = next;
                continue;
            }

            let (kept, redundant) = if content_len(&clippings[next]) > content_len(&clippings[keeper]) {
                (next, keeper)
            } else {
                (keeper, next)
            };
            trace!(
                keeper = %clippings[kept].id,
                redundant = %clippings[redundant].id,
                "flagging overlapping highlight"
            );
            flags.push((redundant, clippings[kept].id.clone()));
            keeper = kept;
        }
    }

    let flagged = flags.len();
    for (redundant, keeper_id) in flags {
        let clipping = &mut clippings[redundant];
        clipping.flag_suspicious(SuspiciousReason::Overlapping);
        clipping.possible_duplicate_of = Some(keeper_id);
    }

    StageOutcome::new(clippings, flagged)
}
