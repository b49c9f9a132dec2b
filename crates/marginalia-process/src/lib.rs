//! Marginalia Process — repairs a parsed clipping export: dedup, overlap
//! merging, note linking, suspicious and fuzzy-duplicate flagging.

pub mod dedup;
pub mod filter;
pub mod fuzzy;
pub mod grouper;
pub mod link;
pub mod merge;
pub mod pipeline;
pub mod similarity;
pub mod stats;
pub mod suspicious;
pub mod tags;

pub use dedup::remove_duplicates;
pub use fuzzy::FuzzyDuplicateDetector;
pub use grouper::{BookGroup, BookGroups, group_by_book, group_indices_by_book};
pub use link::link_notes;
pub use merge::HighlightMerger;
pub use pipeline::{ProcessResult, StageOutcome, process};
pub use similarity::similarity;
pub use stats::{BookStats, LibraryStats};
pub use suspicious::flag_suspicious;
