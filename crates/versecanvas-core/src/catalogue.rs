use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::Serialize;

/// A canonical book of the 66-book Protestant canon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Book {
    pub id: u32,
    pub name: &'static str,
}

macro_rules! books {
    ($($id:literal => $name:literal),* $(,)?) => {
        [$(Book { id: $id, name: $name }),*]
    };
}

/// The fixed id to name mapping, in canonical order.
pub static BOOKS: [Book; 66] = books![
    1 => "Genesis", 2 => "Exodus", 3 => "Leviticus", 4 => "Numbers", 5 => "Deuteronomy",
    6 => "Joshua", 7 => "Judges", 8 => "Ruth", 9 => "1 Samuel", 10 => "2 Samuel",
    11 => "1 Kings", 12 => "2 Kings", 13 => "1 Chronicles", 14 => "2 Chronicles",
    15 => "Ezra", 16 => "Nehemiah", 17 => "Esther", 18 => "Job", 19 => "Psalms",
    20 => "Proverbs", 21 => "Ecclesiastes", 22 => "Song of Solomon", 23 => "Isaiah",
    24 => "Jeremiah", 25 => "Lamentations", 26 => "Ezekiel", 27 => "Daniel",
    28 => "Hosea", 29 => "Joel", 30 => "Amos", 31 => "Obadiah", 32 => "Jonah",
    33 => "Micah", 34 => "Nahum", 35 => "Habakkuk", 36 => "Zephaniah", 37 => "Haggai",
    38 => "Zechariah", 39 => "Malachi", 40 => "Matthew", 41 => "Mark", 42 => "Luke",
    43 => "John", 44 => "Acts", 45 => "Romans", 46 => "1 Corinthians",
    47 => "2 Corinthians", 48 => "Galatians", 49 => "Ephesians", 50 => "Philippians",
    51 => "Colossians", 52 => "1 Thessalonians", 53 => "2 Thessalonians",
    54 => "1 Timothy", 55 => "2 Timothy", 56 => "Titus", 57 => "Philemon",
    58 => "Hebrews", 59 => "James", 60 => "1 Peter", 61 => "2 Peter", 62 => "1 John",
    63 => "2 John", 64 => "3 John", 65 => "Jude", 66 => "Revelation",
];

lazy_static! {
    // Keyed by the folded form produced by `fold_name`.
    static ref NAME_INDEX: HashMap<String, &'static Book> =
        BOOKS.iter().map(|book| (fold_name(book.name), book)).collect();
}

fn fold_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl Book {
    pub fn from_id(id: u32) -> Option<&'static Book> {
        let index = usize::try_from(id.checked_sub(1)?).ok()?;
        BOOKS.get(index)
    }

    /// Exact, case-sensitive lookup by canonical name.
    pub fn from_name(name: &str) -> Option<&'static Book> {
        BOOKS.iter().find(|book| book.name == name)
    }

    /// Lenient lookup used for user input: ignores case and repeated whitespace.
    pub fn resolve(input: &str) -> Option<&'static Book> {
        NAME_INDEX.get(&fold_name(input)).copied()
    }

    pub fn all() -> &'static [Book] {
        &BOOKS
    }
}

impl std::fmt::Display for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_ids_are_contiguous() {
        for (index, book) in BOOKS.iter().enumerate() {
            assert_eq!(book.id as usize, index + 1);
        }
    }

    #[test]
    fn test_from_id_bounds() {
        assert_eq!(Book::from_id(1).map(|b| b.name), Some("Genesis"));
        assert_eq!(Book::from_id(66).map(|b| b.name), Some("Revelation"));
        assert!(Book::from_id(0).is_none());
        assert!(Book::from_id(67).is_none());
    }

    #[test]
    fn test_from_name_is_exact() {
        assert_eq!(Book::from_name("Song of Solomon").map(|b| b.id), Some(22));
        assert!(Book::from_name("genesis").is_none());
    }

    #[test]
    fn test_resolve_ignores_case_and_spacing() {
        assert_eq!(Book::resolve("genesis").map(|b| b.id), Some(1));
        assert_eq!(Book::resolve("  1   corinthians ").map(|b| b.id), Some(46));
        assert_eq!(Book::resolve("PSALMS").map(|b| b.id), Some(19));
        assert!(Book::resolve("Maccabees").is_none());
    }
}
