use marginalia_core::Clipping;
use marginalia_core::config::DEFAULT_FUZZY_THRESHOLD;
use tracing::{debug, trace, warn};

use crate::grouper::group_indices_by_book;
use crate::pipeline::StageOutcome;
use crate::similarity::similarity;

/// Only highlights starting within this many units after another one ends are compared.
pub const FUZZY_WINDOW: i64 = 50;

/// Flags near-duplicate highlights: similar but not identical wording at
/// nearby locations.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyDuplicateDetector {
    threshold: f64,
}

impl Default for FuzzyDuplicateDetector {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }
}

impl FuzzyDuplicateDetector {
    pub fn new(threshold: f64) -> Self {
        Self::default().with_threshold(threshold)
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        if threshold.is_nan() || !(0.0..=1.0).contains(&threshold) {
            warn!(threshold, "fuzzy threshold outside [0, 1], clamping");
        }
        self.threshold = if threshold.is_nan() {
            DEFAULT_FUZZY_THRESHOLD
        } else {
            threshold.clamp(0.0, 1.0)
        };
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Mark later highlights that score within `[threshold, 1.0)` against an
    /// earlier one with `similarity_score` and `possible_duplicate_of`.
    ///
    /// A highlight marked as a duplicate is never used as the source for
    /// another mark. `count` is the number of highlights marked.
    pub fn detect(&self, mut clippings: Vec<Clipping>) -> StageOutcome {
        let mut marks: Vec<(usize, String, f64)> = Vec::new();

        for group in group_indices_by_book(&clippings) {
            let mut order: Vec<usize> = group
                .items
                .into_iter()
                .filter(|&i| clippings[i].is_highlight() && clippings[i].location.is_known())
                .collect();
            if order.len() < 2 {
                continue;
            }
            order.sort_by_key(|&i| (clippings[i].location.start, clippings[i].block_index));

            // already marked, by this run or an earlier stage
            let mut duplicate: Vec<bool> = order
                .iter()
                .map(|&i| clippings[i].possible_duplicate_of.is_some())
                .collect();

            for a in 0..order.len() {
                if duplicate[a] {
                    continue;
                }
                let source = &clippings[order[a]];

                for b in (a + 1)..order.len() {
                    let candidate = &clippings[order[b]];
                    if source.location.gap_to(&candidate.location) > FUZZY_WINDOW {
                        break;
                    }
                    if duplicate[b] {
                        continue;
                    }

                    let score = similarity(&source.content, &candidate.content);
                    if score >= self.threshold && score < 1.0 {
                        trace!(source = %source.id, duplicate = %candidate.id, score, "fuzzy duplicate");
                        duplicate[b] = true;
                        marks.push((order[b], source.id.clone(), score));
                    }
                }
            }
        }

        let flagged = marks.len();
        for (index, source_id, score) in marks {
            let clipping = &mut clippings[index];
            clipping.similarity_score = Some(score);
            clipping.possible_duplicate_of = Some(source_id);
        }

        debug!(flagged, threshold = self.threshold, "flagged fuzzy duplicates");
        StageOutcome::new(clippings, flagged)
    }
}
