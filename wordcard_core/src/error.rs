//! Error types shared across the crate

use thiserror::Error;

/// Everything that can go wrong while managing words or running a quiz.
#[derive(Debug, Error)]
pub enum Error {
    /// Term or definition missing on add.
    #[error("invalid entry: {0}")]
    Validation(String),

    /// A word with the same term (ignoring case) is already registered.
    #[error("'{0}' is already in the word list")]
    DuplicateEntry(String),

    #[error("need at least {required} words to start a test, have {available}")]
    InsufficientData { required: usize, available: usize },

    /// The imported payload could not be read, or produced no usable entries.
    #[error("import failed: {0}")]
    ImportFormat(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("the current question has already been answered")]
    AlreadyAnswered,

    #[error("no question is waiting for an answer")]
    NoPendingQuestion,

    #[error("no test session in progress")]
    NoActiveSession,

    #[error("the word list is empty, nothing to export")]
    NothingToExport,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),
}

pub type Result<T> = std::result::Result<T, Error>;
