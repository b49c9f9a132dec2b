use marginalia_core::{Clipping, MergeMode, ProcessOptions};
use serde::Serialize;
use tracing::info;

use crate::dedup::remove_duplicates;
use crate::filter::{apply_filter, keep_highlights_only, remove_empty};
use crate::fuzzy::FuzzyDuplicateDetector;
use crate::link::link_notes;
use crate::merge::HighlightMerger;
use crate::suspicious::flag_suspicious;
use crate::tags::apply_note_tags;

/// What a single stage hands to the next one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageOutcome {
    pub clippings: Vec<Clipping>,
    /// Stage-specific counter: removed, merged, linked or flagged records.
    pub count: usize,
}

impl StageOutcome {
    pub fn new(clippings: Vec<Clipping>, count: usize) -> Self {
        Self { clippings, count }
    }
}

/// Processed clippings and what each stage did to them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResult {
    pub clippings: Vec<Clipping>,
    pub duplicates_removed: usize,
    pub merged_highlights: usize,
    pub overlapping_flagged: usize,
    pub linked_notes: usize,
    pub tags_extracted: usize,
    pub empty_removed: usize,
    pub filtered_out: usize,
    pub suspicious_flagged: usize,
    pub fuzzy_duplicates_flagged: usize,
}

/// Run the whole pipeline over parsed clippings.
///
/// Never fails: every heuristic degrades to "no match". Disabled stages pass
/// the collection through unchanged.
pub fn process(clippings: Vec<Clipping>, options: &ProcessOptions) -> ProcessResult {
    let input = clippings.len();
    let mut result = ProcessResult::default();

    let step = remove_empty(clippings);
    result.empty_removed = step.count;

    let step = apply_filter(step.clippings, &options.filter);
    result.filtered_out = step.count;
    let mut clippings = step.clippings;

    if options.remove_duplicates {
        let step = remove_duplicates(clippings);
        result.duplicates_removed = step.count;
        clippings = step.clippings;
    }

    if options.merge_overlapping {
        let merger = HighlightMerger::new(options.merge_mode);
        let step = merger.run(clippings);
        match merger.mode() {
            MergeMode::Merge => result.merged_highlights = step.count,
            MergeMode::Flag => result.overlapping_flagged = step.count,
        }
        clippings = step.clippings;
    }

    if options.merge_notes {
        let step = link_notes(clippings);
        result.linked_notes = step.count;
        clippings = step.clippings;

        if options.extract_tags {
            let step = apply_note_tags(clippings);
            result.tags_extracted = step.count;
            clippings = step.clippings;
        }
    }

    if options.highlights_only {
        let step = keep_highlights_only(clippings);
        result.filtered_out += step.count;
        clippings = step.clippings;
    }

    let step = flag_suspicious(clippings);
    result.suspicious_flagged = step.count;

    let step = FuzzyDuplicateDetector::new(options.effective_fuzzy_threshold()).detect(step.clippings);
    result.fuzzy_duplicates_flagged = step.count;
    result.clippings = step.clippings;

    info!(
        input,
        output = result.clippings.len(),
        duplicates = result.duplicates_removed,
        merged = result.merged_highlights,
        linked = result.linked_notes,
        suspicious = result.suspicious_flagged,
        fuzzy = result.fuzzy_duplicates_flagged,
        "processed clippings"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use marginalia_core::{ClippingType, Location, SuspiciousReason};

    fn highlight(title: &str, content: &str, start: u32, end: u32, block: usize) -> Clipping {
        Clipping::new(
            title,
            ClippingType::Highlight,
            content,
            Location::range(start, end).unwrap(),
            block,
        )
    }

    fn scenario() -> Vec<Clipping> {
        vec![
            highlight("Dune", "I must not fear. Fear is the mind-killer.", 100, 104, 0),
            highlight("Dune", "I must not fear. Fear is the mind-killer.", 100, 104, 1),
            highlight("Dune", "The spice must flow.", 300, 302, 2),
            highlight("Dune", "The spice must flow, and so must the water.", 303, 306, 3),
            highlight("Dune", "Ah.", 900, 900, 4),
        ]
    }

    #[test]
    fn end_to_end_scenario() {
        let result = process(scenario(), &ProcessOptions::default());
        assert_eq!(result.duplicates_removed, 1);
        assert_eq!(result.merged_highlights, 1);
        assert_eq!(result.suspicious_flagged, 1);
        assert_eq!(result.fuzzy_duplicates_flagged, 0);
        assert_eq!(result.clippings.len(), 3);

        let flagged: Vec<&Clipping> = result
            .clippings
            .iter()
            .filter(|c| c.is_suspicious_highlight)
            .collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].content, "Ah.");
        assert_eq!(flagged[0].suspicious_reason, Some(SuspiciousReason::TooShort));
    }

    #[test]
    fn disabled_stages_pass_through() {
        let options = ProcessOptions {
            remove_duplicates: false,
            merge_overlapping: false,
            merge_notes: false,
            ..Default::default()
        };
        let result = process(scenario(), &options);
        assert_eq!(result.duplicates_removed, 0);
        assert_eq!(result.merged_highlights, 0);
        assert_eq!(result.linked_notes, 0);
        assert_eq!(result.clippings.len(), 5);
    }

    #[test]
    fn flag_mode_keeps_everything() {
        let options = ProcessOptions {
            merge_mode: MergeMode::Flag,
            ..Default::default()
        };
        let result = process(scenario(), &options);
        assert_eq!(result.merged_highlights, 0);
        assert_eq!(result.overlapping_flagged, 1);
        assert_eq!(result.clippings.len(), 4);

        let overlapping = result
            .clippings
            .iter()
            .find(|c| c.suspicious_reason == Some(SuspiciousReason::Overlapping))
            .unwrap();
        assert_eq!(overlapping.content, "The spice must flow.");
    }

    #[test]
    fn notes_link_and_tags_extract() {
        let mut input = scenario();
        input.push(Clipping::new(
            "Dune",
            ClippingType::Note,
            "Litany against fear #litany",
            Location::point(104),
            5,
        ));
        let options = ProcessOptions {
            extract_tags: true,
            highlights_only: true,
            ..Default::default()
        };

        let result = process(input, &options);
        assert_eq!(result.linked_notes, 1);
        assert_eq!(result.tags_extracted, 1);
        assert_eq!(result.filtered_out, 1);
        assert!(result.clippings.iter().all(Clipping::is_highlight));

        let litany = &result.clippings[0];
        assert_eq!(litany.note.as_deref(), Some("Litany against fear #litany"));
        assert_eq!(litany.tags, vec!["litany".to_string()]);
    }

    #[test]
    fn empty_clippings_are_counted() {
        let mut input = scenario();
        input.push(highlight("Dune", "  ", 500, 501, 5));
        input.push(Clipping::new("Dune", ClippingType::Bookmark, "", Location::point(42), 6));

        let result = process(input, &ProcessOptions::default());
        assert_eq!(result.empty_removed, 1);
        assert!(result.clippings.iter().any(|c| c.clipping_type == ClippingType::Bookmark));
    }

    #[test]
    fn empty_input_gives_empty_result() {
        let result = process(Vec::new(), &ProcessOptions::default());
        assert_eq!(result, ProcessResult::default());
    }

    #[test]
    fn result_serializes_with_camel_case_counters() {
        let result = process(scenario(), &ProcessOptions::default());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["duplicatesRemoved"], 1);
        assert_eq!(json["mergedHighlights"], 1);
        assert_eq!(json["clippings"].as_array().unwrap().len(), 3);
    }
}
