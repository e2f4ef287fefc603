use std::io;

use age_data::DataError;
use thiserror::Error;

/// Error types for DLP reading and conversion
#[derive(Error, Debug)]
pub enum DlpError {
    /// Binary cursor or scene model error
    #[error(transparent)]
    Data(#[from] DataError),

    /// I/O Error during reading
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file does not start with `DLP7`
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    #[error("No group named {0}")]
    GroupNotFound(String),
}

/// Result type using DlpError
pub type Result<T> = std::result::Result<T, DlpError>;
