//! Verse dataset loading and lookup.
//!
//! The dataset is a CSV file with a header row naming at least the columns
//! `b` (book id), `c` (chapter), `v` (verse) and `t` (text). Other columns,
//! such as the `id` column of the BBE export, are ignored.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Book, LoadError, Passage, PassageError, PassageQuery};

/// One row of scripture text, annotated with its canonical book name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerseRecord {
    pub book_id: u32,
    pub book_name: &'static str,
    pub chapter: u32,
    pub verse: u32,
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct Row {
    b: u32,
    c: u32,
    v: u32,
    t: String,
}

/// Per-book summary for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookSummary {
    pub book: Book,
    pub chapters: usize,
    pub verses: usize,
}

/// Immutable, ordered collection of verse records.
#[derive(Debug)]
pub struct VerseStore {
    source: PathBuf,
    records: Vec<VerseRecord>,
}

impl VerseStore {
    /// Load the dataset from a CSV file.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                LoadError::NotFound(path.to_path_buf())
            } else {
                LoadError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let store = Self::parse(file, path)?;
        info!(
            path = %path.display(),
            verses = store.records.len(),
            "Loaded verse dataset"
        );
        Ok(store)
    }

    /// Load the dataset from any reader producing CSV.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        Self::parse(reader, Path::new("<reader>"))
    }

    fn parse<R: Read>(reader: R, origin: &Path) -> Result<Self, LoadError> {
        let malformed = |line: u64, message: String| LoadError::Malformed {
            path: origin.to_path_buf(),
            line,
            message,
        };

        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = csv_reader
            .headers()
            .map_err(|e| csv_error(origin, e))?
            .clone();

        let mut records = Vec::new();
        for result in csv_reader.records() {
            let raw = result.map_err(|e| csv_error(origin, e))?;
            let line = raw.position().map(|p| p.line()).unwrap_or(0);

            let row: Row = raw
                .deserialize(Some(&headers))
                .map_err(|e| malformed(line, e.to_string()))?;

            let book = Book::from_id(row.b).ok_or_else(|| LoadError::UnknownBook {
                path: origin.to_path_buf(),
                line,
                book_id: row.b,
            })?;

            if row.c == 0 || row.v == 0 {
                return Err(malformed(
                    line,
                    "chapter and verse numbers start at 1".to_string(),
                ));
            }

            records.push(VerseRecord {
                book_id: book.id,
                book_name: book.name,
                chapter: row.c,
                verse: row.v,
                text: row.t,
            });
        }

        Ok(Self {
            source: origin.to_path_buf(),
            records,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn records(&self) -> &[VerseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Pure filter: every record with this book name and chapter whose verse
    /// lies in `start..=end`, in dataset order.
    pub fn lookup(&self, book: &str, chapter: u32, start: u32, end: u32) -> Vec<&VerseRecord> {
        let query = PassageQuery::new(book, chapter, start, end);
        self.records.iter().filter(|r| query.matches(r)).collect()
    }

    /// Select a passage, or `EmptyPassage` when nothing matches.
    pub fn select(&self, query: &PassageQuery) -> Result<Passage, PassageError> {
        let verses: Vec<VerseRecord> = self
            .records
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();

        debug!(query = %query, matched = verses.len(), "Selected passage");

        if verses.is_empty() {
            return Err(PassageError::EmptyPassage(query.clone()));
        }
        Ok(Passage::new(query.clone(), verses))
    }

    /// Number of distinct chapters present for a book.
    pub fn chapter_count(&self, book: &str) -> usize {
        self.records
            .iter()
            .filter(|r| r.book_name == book)
            .map(|r| r.chapter)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Highest verse number present in a chapter, 0 if the chapter is absent.
    pub fn verse_count(&self, book: &str, chapter: u32) -> u32 {
        self.records
            .iter()
            .filter(|r| r.book_name == book && r.chapter == chapter)
            .map(|r| r.verse)
            .max()
            .unwrap_or(0)
    }

    /// Catalogue order summary of every book, including books absent from
    /// the dataset (zero counts).
    pub fn books(&self) -> Vec<BookSummary> {
        Book::all()
            .iter()
            .map(|book| {
                let mut chapters = BTreeSet::new();
                let mut verses = 0;
                for record in self.records.iter().filter(|r| r.book_id == book.id) {
                    chapters.insert(record.chapter);
                    verses += 1;
                }
                BookSummary {
                    book: *book,
                    chapters: chapters.len(),
                    verses,
                }
            })
            .collect()
    }
}

fn csv_error(origin: &Path, err: csv::Error) -> LoadError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    match err.into_kind() {
        csv::ErrorKind::Io(source) => LoadError::Io {
            path: origin.to_path_buf(),
            source,
        },
        kind => LoadError::Malformed {
            path: origin.to_path_buf(),
            line,
            message: format!("{:?}", kind),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "id,b,c,v,t
1001001,1,1,1,In the beginning God made the heaven and the earth.
1001002,1,1,2,\"And the earth was waste and without form; and it was dark on the face of the deep: and the Spirit of God was moving on the face of the waters.\"
1001003,1,1,3,\"And God said, Let there be light: and there was light.\"
1002001,1,2,1,And the heaven and the earth and all things in them were complete.
2001001,2,1,1,Now these are the names of the sons of Israel who came into Egypt.
";

    fn store() -> VerseStore {
        VerseStore::from_reader(SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn test_load_annotates_book_names() {
        let store = store();
        assert_eq!(store.len(), 5);
        assert_eq!(store.records()[0].book_name, "Genesis");
        assert_eq!(store.records()[4].book_name, "Exodus");
    }

    #[test]
    fn test_quoted_text_keeps_commas() {
        let store = store();
        assert_eq!(
            store.records()[2].text,
            "And God said, Let there be light: and there was light."
        );
    }

    #[test]
    fn test_lookup_filters_on_all_predicates() {
        let store = store();
        let verses: Vec<u32> = store
            .lookup("Genesis", 1, 2, 3)
            .iter()
            .map(|r| r.verse)
            .collect();
        assert_eq!(verses, vec![2, 3]);
        assert!(store.lookup("Genesis", 3, 1, 10).is_empty());
        assert!(store.lookup("genesis", 1, 1, 3).is_empty());
    }

    #[test]
    fn test_select_empty_is_error() {
        let store = store();
        let query = PassageQuery::new("Genesis", 1, 3, 1);
        assert_eq!(
            store.select(&query).unwrap_err(),
            PassageError::EmptyPassage(query)
        );
    }

    #[test]
    fn test_missing_column_is_malformed() {
        let err = VerseStore::from_reader("b,c,t\n1,1,text\n".as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { line: 2, .. }));
    }

    #[test]
    fn test_non_numeric_chapter_is_malformed() {
        let err = VerseStore::from_reader("b,c,v,t\n1,one,1,text\n".as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
    }

    #[test]
    fn test_unknown_book_id_rejected() {
        let err = VerseStore::from_reader("b,c,v,t\n1,1,1,ok\n67,1,1,bad\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::UnknownBook {
                line: 3,
                book_id: 67,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_verse_rejected() {
        let err = VerseStore::from_reader("b,c,v,t\n1,1,0,text\n".as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { line: 2, .. }));
    }

    #[test]
    fn test_counts() {
        let store = store();
        assert_eq!(store.chapter_count("Genesis"), 2);
        assert_eq!(store.verse_count("Genesis", 1), 3);
        assert_eq!(store.verse_count("Genesis", 9), 0);

        let books = store.books();
        assert_eq!(books.len(), 66);
        assert_eq!(books[0].chapters, 2);
        assert_eq!(books[0].verses, 4);
        assert_eq!(books[2].verses, 0);
    }
}
