use std::io;

use age_data::DataError;
use thiserror::Error;

/// Error types for BMS reading, writing and mesh conversion
#[derive(Error, Debug)]
pub enum BmsError {
    /// Binary cursor or scene model error
    #[error(transparent)]
    Data(#[from] DataError),

    /// I/O Error during reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Magic does not identify a static mesh at all
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// A static mesh revision other than 3
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),

    /// The texture count is stored in a byte
    #[error("Cannot export mesh with {0} textures (limit is 255)")]
    TooManyTextures(usize),

    /// Adjuncts are addressed with 16-bit indices
    #[error("Cannot export mesh with {0} adjuncts (limit is 65535)")]
    TooManyAdjuncts(usize),

    /// Adjuncts address points with 16-bit indices
    #[error("Cannot export mesh with {0} points (limit is 65536)")]
    TooManyPoints(usize),

    /// Header counts disagree with the data that follows
    #[error("Inconsistent mesh: {0}")]
    Inconsistent(String),
}

/// Result type using BmsError
pub type Result<T> = std::result::Result<T, BmsError>;
