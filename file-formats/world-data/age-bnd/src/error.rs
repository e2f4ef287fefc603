use std::io;

use age_data::DataError;
use thiserror::Error;

/// Error types for bound reading, writing and conversion
#[derive(Error, Debug)]
pub enum BndError {
    /// Tokenizer, binary cursor or scene model error
    #[error(transparent)]
    Data(#[from] DataError),

    /// I/O Error during reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Missing version line or bad version byte
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// A version other than 1.01 and 1.10
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),

    /// Bounds other than `geometry`, such as spheres
    #[error("Unsupported bound type: {0}")]
    UnsupportedType(String),

    /// Binary layouts address vertices, faces and index runs with 16 bits
    #[error("Cannot store {count} {what} (limit is 65535)")]
    TooMany { what: &'static str, count: usize },

    /// A face refers to a vertex, edge or material that does not exist
    #[error("Face {face}: {reason}")]
    InvalidFace { face: usize, reason: String },
}

/// Result type using BndError
pub type Result<T> = std::result::Result<T, BndError>;
