//! # versecanvas-core
//!
//! Verse lookup and prompt construction.
//!
//! ## Key Types
//!
//! - [`VerseStore`] - Immutable verse dataset with range lookup
//! - [`Book`] - The fixed 66-book catalogue
//! - [`PassageQuery`] / [`Passage`] - A verse range request and its matches
//! - [`PromptBuilder`] - Joins, truncates and decorates a passage
//! - [`RequestOutcome`] - Serializable result of one request

pub mod cache;
mod catalogue;
mod error;
mod outcome;
mod prompt;
mod query;
mod store;

pub use catalogue::{Book, BOOKS};
pub use error::{LoadError, PassageError};
pub use outcome::RequestOutcome;
pub use prompt::{
    truncate_chars, Prompt, PromptBuilder, Resolution, Style, DESCRIPTIVE_PREFIX,
    MAX_PASSAGE_CHARS,
};
pub use query::{Passage, PassageQuery};
pub use store::{BookSummary, VerseRecord, VerseStore};
