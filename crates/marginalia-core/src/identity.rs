//! Deterministic identifiers and content hashes.

use sha2::{Digest, Sha256};

use crate::models::ClippingType;
use crate::normalize::{normalize_content, normalize_location, normalize_title};

/// Number of content characters that feed into a clipping id.
pub const ID_CONTENT_PREFIX_CHARS: usize = 50;

const ID_HEX_LEN: usize = 16;

/// Stable id for a clipping.
///
/// Built from the normalized title, normalized location string, type and the
/// first [`ID_CONTENT_PREFIX_CHARS`] lowercased characters of the content, so
/// re-importing the same export yields the same ids.
pub fn clipping_id(
    title: &str,
    location_raw: &str,
    clipping_type: ClippingType,
    content: &str,
) -> String {
    let prefix: String = content
        .trim()
        .to_lowercase()
        .chars()
        .take(ID_CONTENT_PREFIX_CHARS)
        .collect();

    let title = normalize_title(title);
    let location = normalize_location(location_raw);
    let digest = hash_fields(&[
        title.as_str(),
        location.as_str(),
        clipping_type.as_str(),
        prefix.as_str(),
    ]);
    digest[..ID_HEX_LEN].to_string()
}

/// Exact-duplicate key over `(normalized title, raw location, normalized content)`.
pub fn content_hash(title: &str, location_raw: &str, content: &str) -> String {
    let title = normalize_title(title);
    let content = normalize_content(content);
    hash_fields(&[title.as_str(), location_raw, content.as_str()])
}

fn hash_fields(fields: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update(field.as_bytes());
        // unit separator keeps ("ab", "c") and ("a", "bc") apart
        hasher.update([0x1f]);
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clipping_id_is_deterministic() {
        let a = clipping_id("Dune", "100-105", ClippingType::Highlight, "Fear is the mind-killer.");
        let b = clipping_id("Dune", "100-105", ClippingType::Highlight, "Fear is the mind-killer.");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn clipping_id_ignores_title_case_and_content_case() {
        let a = clipping_id("DUNE", "100-105", ClippingType::Highlight, "Fear");
        let b = clipping_id("dune", "100-105", ClippingType::Highlight, "fear");
        assert_eq!(a, b);
    }

    #[test]
    fn clipping_id_depends_on_type() {
        let highlight = clipping_id("Dune", "100", ClippingType::Highlight, "text");
        let note = clipping_id("Dune", "100", ClippingType::Note, "text");
        assert_ne!(highlight, note);
    }

    #[test]
    fn clipping_id_only_uses_content_prefix() {
        let base = "x".repeat(ID_CONTENT_PREFIX_CHARS);
        let a = clipping_id("Dune", "1", ClippingType::Highlight, &format!("{base} tail one"));
        let b = clipping_id("Dune", "1", ClippingType::Highlight, &format!("{base} tail two"));
        assert_eq!(a, b);
    }

    #[test]
    fn content_hash_separates_fields() {
        assert_ne!(content_hash("ab", "c", "d"), content_hash("a", "bc", "d"));
    }

    #[test]
    fn content_hash_normalizes_whitespace_and_case() {
        assert_eq!(
            content_hash("Dune", "100", "Fear  is\nthe mind-killer"),
            content_hash("dune", "100", "fear is the Mind-Killer")
        );
    }
}
