use std::path::PathBuf;

use thiserror::Error;

use crate::PassageQuery;

/// Errors raised while loading the verse dataset. All of them are fatal at startup.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Verse dataset not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read verse dataset {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed verse dataset {} (line {line}): {message}", path.display())]
    Malformed {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("Unknown book id {book_id} in {} (line {line})", path.display())]
    UnknownBook {
        path: PathBuf,
        line: u64,
        book_id: u32,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PassageError {
    /// No verse row matched the query. Reported to the user, never fatal.
    #[error("Passage not found: {0}")]
    EmptyPassage(PassageQuery),
}
