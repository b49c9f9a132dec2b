use marginalia_core::{Clipping, SuspiciousReason};
use tracing::debug;

use crate::pipeline::StageOutcome;

/// Highlights shorter than this are almost always accidental taps.
pub const TOO_SHORT_LEN: usize = 5;

/// Content at or above this length is never flagged.
pub const SHORT_CONTENT_LEN: usize = 75;

/// Characters a complete sentence or quotation may end with.
pub const CLOSING_PUNCTUATION: &[char] = &['.', '!', '?', '"', '”', ')', ']'];

/// Why `content` looks like an accidental highlight, if it does.
///
/// Checks run in priority order and the first hit wins.
pub fn classify(content: &str) -> Option<SuspiciousReason> {
    let trimmed = content.trim();
    let len = trimmed.chars().count();

    if len < TOO_SHORT_LEN {
        return Some(SuspiciousReason::TooShort);
    }
    if len >= SHORT_CONTENT_LEN {
        return None;
    }
    if trimmed.chars().next().is_some_and(char::is_lowercase) {
        return Some(SuspiciousReason::Fragment);
    }
    if !trimmed.ends_with(CLOSING_PUNCTUATION) {
        return Some(SuspiciousReason::Incomplete);
    }
    None
}

/// Flag likely-accidental highlights. Nothing is removed.
///
/// Highlights already flagged by an earlier stage keep their reason.
/// `count` is the number of newly flagged highlights.
pub fn flag_suspicious(mut clippings: Vec<Clipping>) -> StageOutcome {
    let mut flagged = 0usize;

    for clipping in clippings
        .iter_mut()
        .filter(|c| c.is_highlight() && !c.is_suspicious_highlight)
    {
        if let Some(reason) = classify(&clipping.content) {
            clipping.flag_suspicious(reason);
            flagged += 1;
        }
    }

    debug!(flagged, "flagged suspicious highlights");
    StageOutcome::new(clippings, flagged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use marginalia_core::{ClippingType, Location};

    #[test]
    fn too_short_beats_fragment() {
        assert_eq!(classify("ok"), Some(SuspiciousReason::TooShort));
        assert_eq!(classify("   a.  "), Some(SuspiciousReason::TooShort));
    }

    #[test]
    fn fragment_beats_incomplete() {
        assert_eq!(classify("the cat sat"), Some(SuspiciousReason::Fragment));
    }

    #[test]
    fn fragment_detects_accented_lowercase() {
        assert_eq!(classify("échappée belle."), Some(SuspiciousReason::Fragment));
    }

    #[test]
    fn incomplete_without_closing_punctuation() {
        assert_eq!(classify("The cat sat on the"), Some(SuspiciousReason::Incomplete));
        assert_eq!(classify("The cat sat."), None);
        assert_eq!(classify("He said “go”"), None);
        assert_eq!(classify("(An aside)"), None);
        assert_eq!(classify("Really?"), None);
    }

    #[test]
    fn long_content_is_never_flagged() {
        let long = "lowercase start and no closing punctuation ".repeat(2);
        assert!(long.trim().chars().count() >= SHORT_CONTENT_LEN);
        assert_eq!(classify(&long), None);
    }

    #[test]
    fn digits_do_not_count_as_lowercase() {
        assert_eq!(classify("42 is the answer."), None);
    }

    #[test]
    fn only_highlights_are_flagged() {
        let hl = Clipping::new("Dune", ClippingType::Highlight, "ok", Location::point(1), 0);
        let note = Clipping::new("Dune", ClippingType::Note, "ok", Location::point(1), 1);

        let out = flag_suspicious(vec![hl, note]);
        assert_eq!(out.count, 1);
        assert_eq!(out.clippings[0].suspicious_reason, Some(SuspiciousReason::TooShort));
        assert!(!out.clippings[1].is_suspicious_highlight);
    }

    #[test]
    fn existing_flag_is_kept() {
        let mut hl = Clipping::new("Dune", ClippingType::Highlight, "ok", Location::point(1), 0);
        hl.flag_suspicious(SuspiciousReason::Overlapping);

        let out = flag_suspicious(vec![hl]);
        assert_eq!(out.count, 0);
        assert_eq!(out.clippings[0].suspicious_reason, Some(SuspiciousReason::Overlapping));
    }
}
