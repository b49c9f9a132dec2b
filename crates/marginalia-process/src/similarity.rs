//! Word-set similarity measures used by the merger and the fuzzy detector.

use std::collections::HashSet;

use marginalia_core::normalize::{normalize_content, word_set};

/// Jaccard similarity of the word sets of `a` and `b`, in `[0, 1]`.
///
/// Case- and punctuation-insensitive. Symmetric, and `1.0` for any text
/// compared with itself. Texts without any words only match when they are
/// identical after normalization.
pub fn similarity(a: &str, b: &str) -> f64 {
    let left = word_set(a);
    let right = word_set(b);

    if left.is_empty() && right.is_empty() {
        return if normalize_content(a) == normalize_content(b) {
            1.0
        } else {
            0.0
        };
    }

    jaccard(&left, &right)
}

pub fn jaccard(left: &HashSet<String>, right: &HashSet<String>) -> f64 {
    let union = left.union(right).count();
    if union == 0 {
        return 0.0;
    }
    left.intersection(right).count() as f64 / union as f64
}

/// Share of the smaller word set that also appears in the larger one.
pub fn containment(left: &HashSet<String>, right: &HashSet<String>) -> f64 {
    let smaller = left.len().min(right.len());
    if smaller == 0 {
        return 0.0;
    }
    left.intersection(right).count() as f64 / smaller as f64
}

/// Whether either text contains the other, ignoring case. Empty texts never match.
pub fn contains_either(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_scores_one() {
        assert_eq!(similarity("The quick brown fox", "the QUICK brown fox!"), 1.0);
    }

    #[test]
    fn disjoint_text_scores_zero() {
        assert_eq!(similarity("alpha beta", "gamma delta"), 0.0);
    }

    #[test]
    fn partial_overlap() {
        // {a, b, c} vs {a, b, d}: 2 shared of 4 total
        assert_eq!(similarity("a b c", "a b d"), 0.5);
    }

    #[test]
    fn punctuation_only_text() {
        assert_eq!(similarity("...", "..."), 1.0);
        assert_eq!(similarity("...", "!!!"), 0.0);
        assert_eq!(similarity("...", "word"), 0.0);
    }

    #[test]
    fn containment_uses_smaller_set() {
        let small = word_set("hello world");
        let large = word_set("hello world wide web");
        assert_eq!(containment(&small, &large), 1.0);
        assert_eq!(containment(&large, &small), 1.0);
        assert_eq!(containment(&small, &HashSet::new()), 0.0);
    }

    #[test]
    fn contains_either_is_case_insensitive() {
        assert!(contains_either("Hello world", "hello WORLD wide"));
        assert!(contains_either("hello world wide", "WORLD"));
        assert!(!contains_either("hello", "goodbye"));
        assert!(!contains_either("", "anything"));
    }
}
