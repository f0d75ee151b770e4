use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the index and ranking engine.
///
/// Lookups of unknown terms or documents are not errors: they resolve to
/// empty postings, zero statistics or `None`.
#[derive(Error, Debug)]
pub enum Error {
    /// The disk-backed store's in-memory mirror no longer matches its backing tree.
    #[error("inconsistent index state: {0}")]
    InconsistentState(String),

    /// A scoring model was asked to score against a collection it cannot normalize by.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// The index location is missing, unreadable or corrupt, or could not be written.
    #[error("persistence failure at {}: {reason}", path.display())]
    Persistence { path: PathBuf, reason: String },

    /// An unknown selector (index type, scorer, tokenizer) was supplied.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A dataset record could not be parsed.
    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub fn persistence(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::Persistence { path: path.into(), reason: reason.to_string() }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
