use serde::{Deserialize, Serialize};

use crate::VerseRecord;

/// A request for an inclusive verse range within one chapter of one book.
///
/// `start_verse <= end_verse` is expected but not enforced. An inverted
/// range is a valid query that matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageQuery {
    pub book: String,
    pub chapter: u32,
    pub start_verse: u32,
    pub end_verse: u32,
}

impl PassageQuery {
    pub fn new(book: impl Into<String>, chapter: u32, start_verse: u32, end_verse: u32) -> Self {
        Self {
            book: book.into(),
            chapter,
            start_verse,
            end_verse,
        }
    }

    /// Query for a single verse.
    pub fn verse(book: impl Into<String>, chapter: u32, verse: u32) -> Self {
        Self::new(book, chapter, verse, verse)
    }

    pub fn matches(&self, record: &VerseRecord) -> bool {
        record.book_name == self.book
            && record.chapter == self.chapter
            && self.start_verse <= record.verse
            && record.verse <= self.end_verse
    }

    /// Human-readable reference such as `Genesis 1:1-3`.
    pub fn reference(&self) -> String {
        if self.start_verse == self.end_verse {
            format!("{} {}:{}", self.book, self.chapter, self.start_verse)
        } else {
            format!(
                "{} {}:{}-{}",
                self.book, self.chapter, self.start_verse, self.end_verse
            )
        }
    }
}

impl std::fmt::Display for PassageQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reference())
    }
}

/// The verses matched by a query, in dataset order. Never empty.
#[derive(Debug, Clone, Serialize)]
pub struct Passage {
    pub query: PassageQuery,
    pub verses: Vec<VerseRecord>,
}

impl Passage {
    pub(crate) fn new(query: PassageQuery, verses: Vec<VerseRecord>) -> Self {
        debug_assert!(!verses.is_empty());
        Self { query, verses }
    }

    /// Verse texts joined by a single space.
    pub fn text(&self) -> String {
        self.verses
            .iter()
            .map(|v| v.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn reference(&self) -> String {
        self.query.reference()
    }

    pub fn verse_count(&self) -> usize {
        self.verses.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(book_name: &'static str, chapter: u32, verse: u32) -> VerseRecord {
        VerseRecord {
            book_id: 1,
            book_name,
            chapter,
            verse,
            text: String::new(),
        }
    }

    #[test]
    fn test_matches_requires_all_predicates() {
        let query = PassageQuery::new("Genesis", 1, 2, 4);
        assert!(query.matches(&record("Genesis", 1, 2)));
        assert!(query.matches(&record("Genesis", 1, 4)));
        assert!(!query.matches(&record("Genesis", 1, 5)));
        assert!(!query.matches(&record("Genesis", 2, 3)));
        assert!(!query.matches(&record("Exodus", 1, 3)));
    }

    #[test]
    fn test_inverted_range_matches_nothing() {
        let query = PassageQuery::new("Genesis", 1, 5, 2);
        for verse in 1..=10 {
            assert!(!query.matches(&record("Genesis", 1, verse)));
        }
    }

    #[test]
    fn test_reference_formatting() {
        assert_eq!(PassageQuery::verse("John", 3, 16).reference(), "John 3:16");
        assert_eq!(
            PassageQuery::new("1 Kings", 8, 1, 12).to_string(),
            "1 Kings 8:1-12"
        );
    }
}
