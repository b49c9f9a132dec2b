use serde::{Deserialize, Serialize};

use crate::error::{MarginaliaError, Result};

/// Position marker of a clipping in the source text, in device units.
///
/// `end`, when present, is never smaller than `start`; construction and
/// deserialization both enforce it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LocationRepr")]
pub struct Location {
    pub raw: String,
    pub start: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<u32>,
}

#[derive(Deserialize)]
struct LocationRepr {
    #[serde(default)]
    raw: String,
    #[serde(default)]
    start: u32,
    #[serde(default)]
    end: Option<u32>,
}

impl TryFrom<LocationRepr> for Location {
    type Error = MarginaliaError;

    fn try_from(repr: LocationRepr) -> Result<Self> {
        Location::new(repr.raw, repr.start, repr.end)
    }
}

impl Location {
    pub fn new(raw: impl Into<String>, start: u32, end: Option<u32>) -> Result<Self> {
        let raw = raw.into();
        if let Some(end) = end
            && end < start
        {
            return Err(MarginaliaError::Validation(format!(
                "location '{raw}' ends before it starts ({end} < {start})"
            )));
        }
        Ok(Self { raw, start, end })
    }

    /// Single-position location, e.g. a bookmark or note.
    pub fn point(start: u32) -> Self {
        Self {
            raw: start.to_string(),
            start,
            end: None,
        }
    }

    pub fn range(start: u32, end: u32) -> Result<Self> {
        Self::new(format!("{start}-{end}"), start, Some(end))
    }

    /// Unknown locations are stored as zero and never match anything.
    pub fn is_known(&self) -> bool {
        self.start > 0
    }

    pub fn end_or_start(&self) -> u32 {
        self.end.unwrap_or(self.start)
    }

    pub fn contains(&self, position: u32) -> bool {
        self.start <= position && position <= self.end_or_start()
    }

    /// Distance from `position` to the nearest edge of this range, zero inside it.
    pub fn distance_to(&self, position: u32) -> u32 {
        if position < self.start {
            self.start - position
        } else {
            position.saturating_sub(self.end_or_start())
        }
    }

    /// Signed gap from the end of `self` to the start of `next`; negative when they overlap.
    pub fn gap_to(&self, next: &Location) -> i64 {
        i64::from(next.start) - i64::from(self.end_or_start())
    }

    /// Smallest location covering both `self` and `other`.
    pub fn span(&self, other: &Location) -> Location {
        let start = self.start.min(other.start);
        let end = self.end_or_start().max(other.end_or_start());
        if start == end {
            Location::point(start)
        } else {
            Location {
                raw: format!("{start}-{end}"),
                start,
                end: Some(end),
            }
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self {
            raw: String::new(),
            start: 0,
            end: None,
        }
    }
}
