use std::collections::HashMap;

use marginalia_core::Clipping;

/// Clippings of one book, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct BookGroup<T> {
    /// Normalized title.
    pub key: String,
    pub items: Vec<T>,
}

/// Ordered map from normalized title to that book's items.
///
/// Books appear in order of their first clipping; items keep their relative
/// input order.
#[derive(Debug, Clone)]
pub struct BookGroups<T> {
    groups: Vec<BookGroup<T>>,
    index: HashMap<String, usize>,
}

impl<T> BookGroups<T> {
    fn from_keyed<I>(items: I) -> Self
    where
        I: IntoIterator<Item = (String, T)>,
    {
        let mut groups: Vec<BookGroup<T>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (key, item) in items {
            match index.get(&key) {
                Some(&slot) => groups[slot].items.push(item),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push(BookGroup {
                        key,
                        items: vec![item],
                    });
                }
            }
        }

        Self { groups, index }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&[T]> {
        self.index
            .get(key)
            .map(|&slot| self.groups[slot].items.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.key.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BookGroup<T>> {
        self.groups.iter()
    }
}

impl<T> IntoIterator for BookGroups<T> {
    type Item = BookGroup<T>;
    type IntoIter = std::vec::IntoIter<BookGroup<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a BookGroups<T> {
    type Item = &'a BookGroup<T>;
    type IntoIter = std::slice::Iter<'a, BookGroup<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// Partition clippings by normalized book title.
pub fn group_by_book(clippings: &[Clipping]) -> BookGroups<&Clipping> {
    BookGroups::from_keyed(clippings.iter().map(|c| (c.book_key(), c)))
}

/// Same partition as [`group_by_book`], yielding positions into `clippings`.
///
/// Stages that annotate in place work on these indices so they can mutate
/// the collection without holding borrows across books.
pub fn group_indices_by_book(clippings: &[Clipping]) -> BookGroups<usize> {
    BookGroups::from_keyed(clippings.iter().enumerate().map(|(i, c)| (c.book_key(), i)))
}
