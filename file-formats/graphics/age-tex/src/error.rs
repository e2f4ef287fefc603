use std::io;

use age_data::DataError;
use image::ImageError;
use thiserror::Error;

use crate::format::TexFormat;

/// Error types for TEX reading, writing and conversion
#[derive(Error, Debug)]
pub enum TexError {
    /// Binary cursor error
    #[error(transparent)]
    Data(#[from] DataError),

    /// I/O Error during reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error from the image crate while converting
    #[error("Image conversion error: {0}")]
    Image(#[from] ImageError),

    /// Format code outside the known set
    #[error("Unsupported texture format {0}")]
    UnsupportedFormat(u16),

    /// Decompression asked of an uncompressed texture
    #[error("Texture format {0} is not compressed")]
    NotCompressed(TexFormat),

    /// Requested mip level is not stored
    #[error("There is no mip level {0}")]
    MissingMip(usize),

    /// Mip data length disagrees with the container's size rule
    #[error("Mip level {level} holds {actual} bytes, expected {expected}")]
    MipSize {
        level: usize,
        expected: usize,
        actual: usize,
    },

    /// Dimensions are stored as u16
    #[error("Image of {width}x{height} exceeds the 65535 pixel limit")]
    TooLarge { width: u32, height: u32 },

    /// Palette length disagrees with the format
    #[error("Format {format} needs a palette of {expected} colors, got {actual}")]
    PaletteSize {
        format: TexFormat,
        expected: usize,
        actual: usize,
    },
}

/// Result type using TexError
pub type Result<T> = std::result::Result<T, TexError>;
