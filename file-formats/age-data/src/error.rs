use std::io;

use thiserror::Error;

/// Errors shared by every Angel Game Engine format crate
#[derive(Error, Debug)]
pub enum DataError {
    /// I/O Error during reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A text record could not be tokenized or a numeric field was missing or malformed
    #[error("Parse error at line {line}: {message} {tokens:?}")]
    Parse {
        line: usize,
        message: String,
        tokens: Vec<String>,
    },

    /// A binary stream ended before a declared field
    #[error("Truncated input at offset {offset}: needed {requested} bytes, {available} available")]
    Truncated {
        offset: usize,
        requested: usize,
        available: usize,
    },

    /// Bad magic or version token
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// A recognized format variant this crate cannot handle
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),

    /// An index points past the end of its pool
    #[error("Invalid {kind} index {index} (pool holds {len})")]
    InvalidIndex {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    /// Bone ids or parent links do not form a usable hierarchy
    #[error("Invalid skeleton: {0}")]
    InvalidSkeleton(String),
}

/// Result type using DataError
pub type Result<T> = std::result::Result<T, DataError>;
