use std::io;

use age_data::DataError;
use thiserror::Error;

use crate::version::FormatVersion;

/// Error types for MOD and SKEL reading, writing and mesh conversion
#[derive(Error, Debug)]
pub enum ModError {
    /// Tokenizer, binary cursor or scene model error
    #[error(transparent)]
    Data(#[from] DataError),

    /// I/O Error during reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Missing or unreadable version line or tag
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// Version recognized but not handled in this direction
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),

    /// The engine addresses materials with a byte
    #[error("Cannot export model with {0} materials (limit is 255)")]
    TooManyMaterials(usize),

    /// A face references a missing or invalid adjunct, vertex or attribute
    #[error("Geometry reference error in material '{material}': {reason}")]
    GeometryReference { material: String, reason: String },

    /// The file's matrix count disagrees with the supplied skeleton
    #[error("Model matrices count {expected} does not match skeleton bone count {actual}")]
    SkeletonMismatch { expected: usize, actual: usize },

    /// Packet geometry written as a legacy version or the reverse
    #[error("Version {version} cannot store this geometry: {reason}")]
    LayoutMismatch {
        version: FormatVersion,
        reason: String,
    },

    /// An index does not fit the version's index width
    #[error("Index {value} does not fit the index width of version {version}")]
    IndexOverflow { version: FormatVersion, value: u32 },

    /// Export options that cannot produce valid packets
    #[error("Invalid export options: {0}")]
    InvalidOptions(String),
}

/// Result type using ModError
pub type Result<T> = std::result::Result<T, ModError>;
