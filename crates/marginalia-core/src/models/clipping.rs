use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Location;
use crate::identity::clipping_id;
use crate::normalize::normalize_title;

/// Kind of annotation record. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClippingType {
    Highlight,
    Note,
    Bookmark,
    Clip,
    Article,
}

impl ClippingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Highlight => "highlight",
            Self::Note => "note",
            Self::Bookmark => "bookmark",
            Self::Clip => "clip",
            Self::Article => "article",
        }
    }
}

impl std::fmt::Display for ClippingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ClippingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "highlight" => Ok(Self::Highlight),
            "note" => Ok(Self::Note),
            "bookmark" => Ok(Self::Bookmark),
            "clip" => Ok(Self::Clip),
            "article" => Ok(Self::Article),
            other => Err(format!("unknown clipping type: {other}")),
        }
    }
}

/// Why a highlight was flagged as likely accidental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspiciousReason {
    TooShort,
    Fragment,
    Incomplete,
    Overlapping,
}

/// One annotation record from an e-reader export.
///
/// Cross references (`linked_note_id`, `linked_highlight_id`,
/// `possible_duplicate_of`) are plain ids, resolved by lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clipping {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type")]
    pub clipping_type: ClippingType,
    #[serde(default)]
    pub location: Location,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,

    /// Date as written by the device, in whatever language it used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_raw: Option<String>,

    #[serde(default)]
    pub block_index: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_note_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_highlight_id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default)]
    pub is_suspicious_highlight: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspicious_reason: Option<SuspiciousReason>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub possible_duplicate_of: Option<String>,
}

impl Clipping {
    /// New clipping with a deterministic id and no pipeline annotations.
    pub fn new(
        title: impl Into<String>,
        clipping_type: ClippingType,
        content: impl Into<String>,
        location: Location,
        block_index: usize,
    ) -> Self {
        let title = title.into();
        let content = content.into();
        let id = clipping_id(&title, &location.raw, clipping_type, &content);
        Self {
            id,
            title,
            author: String::new(),
            content,
            clipping_type,
            location,
            page: None,
            date: None,
            date_raw: None,
            block_index,
            note: None,
            linked_note_id: None,
            linked_highlight_id: None,
            tags: Vec::new(),
            is_suspicious_highlight: false,
            suspicious_reason: None,
            similarity_score: None,
            possible_duplicate_of: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>, raw: impl Into<String>) -> Self {
        self.date = Some(date);
        self.date_raw = Some(raw.into());
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Grouping key for the book this clipping belongs to.
    pub fn book_key(&self) -> String {
        normalize_title(&self.title)
    }

    pub fn is_highlight(&self) -> bool {
        self.clipping_type == ClippingType::Highlight
    }

    pub fn is_note(&self) -> bool {
        self.clipping_type == ClippingType::Note
    }

    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    pub fn flag_suspicious(&mut self, reason: SuspiciousReason) {
        self.is_suspicious_highlight = true;
        self.suspicious_reason = Some(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clipping_new_assigns_stable_id() {
        let a = Clipping::new("Dune", ClippingType::Highlight, "Fear", Location::point(10), 0);
        let b = Clipping::new("Dune", ClippingType::Highlight, "Fear", Location::point(10), 7);
        assert_eq!(a.id, b.id);
        assert!(!a.is_suspicious_highlight);
        assert!(a.tags.is_empty());
    }

    #[test]
    fn test_book_key_normalizes_title() {
        let c = Clipping::new("  The HOBBIT ", ClippingType::Note, "x", Location::point(1), 0);
        assert_eq!(c.book_key(), "the hobbit");
    }

    #[test]
    fn test_serde_uses_camel_case_and_type() {
        let mut c = Clipping::new("Dune", ClippingType::Highlight, "Fear", Location::point(10), 3);
        c.flag_suspicious(SuspiciousReason::TooShort);
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["type"], "highlight");
        assert_eq!(json["blockIndex"], 3);
        assert_eq!(json["isSuspiciousHighlight"], true);
        assert_eq!(json["suspiciousReason"], "too_short");
        assert!(json.get("linkedNoteId").is_none());
    }

    #[test]
    fn test_deserialize_minimal_record() {
        let json = r#"{
            "id": "abc",
            "title": "Dune",
            "type": "note",
            "content": "remember this",
            "location": {"raw": "120", "start": 120}
        }"#;
        let c: Clipping = serde_json::from_str(json).unwrap();
        assert!(c.is_note());
        assert_eq!(c.location.start, 120);
        assert_eq!(c.block_index, 0);
        assert!(c.date.is_none());
    }

    #[test]
    fn test_clipping_type_from_str() {
        assert_eq!("Highlight".parse::<ClippingType>(), Ok(ClippingType::Highlight));
        assert!("scribble".parse::<ClippingType>().is_err());
    }
}
