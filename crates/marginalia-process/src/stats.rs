use chrono::{DateTime, Utc};
use serde::Serialize;

use marginalia_core::{Clipping, ClippingType};

use crate::grouper::group_by_book;

/// Counts for one book.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookStats {
    /// Title as written on the book's first clipping.
    pub title: String,
    pub author: String,
    pub highlights: usize,
    pub notes: usize,
    pub bookmarks: usize,
    pub others: usize,
    pub suspicious: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_date: Option<DateTime<Utc>>,
}

/// Summary of a clipping collection, usually computed on pipeline output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStats {
    pub total_clippings: usize,
    pub total_books: usize,
    pub highlights: usize,
    pub notes: usize,
    pub bookmarks: usize,
    pub clips: usize,
    pub articles: usize,
    pub linked_notes: usize,
    pub suspicious: usize,
    pub possible_duplicates: usize,
    pub books: Vec<BookStats>,
}

impl LibraryStats {
    pub fn compute(clippings: &[Clipping]) -> Self {
        let mut stats = Self {
            total_clippings: clippings.len(),
            ..Default::default()
        };

        for clipping in clippings {
            match clipping.clipping_type {
                ClippingType::Highlight => stats.highlights += 1,
                ClippingType::Note => stats.notes += 1,
                ClippingType::Bookmark => stats.bookmarks += 1,
                ClippingType::Clip => stats.clips += 1,
                ClippingType::Article => stats.articles += 1,
            }
            if clipping.is_note() && clipping.linked_highlight_id.is_some() {
                stats.linked_notes += 1;
            }
            if clipping.is_suspicious_highlight {
                stats.suspicious += 1;
            }
            if clipping.possible_duplicate_of.is_some() {
                stats.possible_duplicates += 1;
            }
        }

        stats.books = group_by_book(clippings)
            .iter()
            .map(|group| book_stats(&group.items))
            .collect();
        stats.total_books = stats.books.len();
        stats
    }
}

fn book_stats(clippings: &[&Clipping]) -> BookStats {
    let mut book = BookStats::default();

    if let Some(first) = clippings.first() {
        book.title = first.title.trim().to_string();
    }
    book.author = clippings
        .iter()
        .map(|c| c.author.trim())
        .find(|author| !author.is_empty())
        .unwrap_or_default()
        .to_string();

    for clipping in clippings {
        match clipping.clipping_type {
            ClippingType::Highlight => book.highlights += 1,
            ClippingType::Note => book.notes += 1,
            ClippingType::Bookmark => book.bookmarks += 1,
            ClippingType::Clip | ClippingType::Article => book.others += 1,
        }
        if clipping.is_suspicious_highlight {
            book.suspicious += 1;
        }
    }

    book.first_date = clippings.iter().filter_map(|c| c.date).min();
    book.last_date = clippings.iter().filter_map(|c| c.date).max();
    book
}
