//! Text normalization shared by every stage that compares clippings.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+(?:['’][\p{L}\p{N}]+)*").expect("valid regex"));

/// Book-title key: lowercase, punctuation folded to spaces, whitespace collapsed.
///
/// Two titles that only differ in case, punctuation or spacing map to the
/// same key, so `"The Hobbit: There and Back Again"` and
/// `"the hobbit  there and back again"` land in the same group.
pub fn normalize_title(title: &str) -> String {
    let lowercase = title.to_lowercase();
    let cleaned: String = lowercase
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    collapse_whitespace(&cleaned)
}

/// Content key used for exact-duplicate detection: lowercase with collapsed whitespace.
pub fn normalize_content(content: &str) -> String {
    collapse_whitespace(&content.to_lowercase())
}

/// Location key: whitespace removed, lowercase.
pub fn normalize_location(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased words of `text`, punctuation dropped. Apostrophes inside a word
/// (`don't`, `l’homme`) are kept as part of the word.
pub fn words(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

pub fn word_set(text: &str) -> HashSet<String> {
    words(text).into_iter().collect()
}

/// Length in characters (not bytes) after trimming.
pub fn trimmed_len(text: &str) -> usize {
    text.trim().chars().count()
}
