//! Pixel formats of the TEX container.

use std::fmt;

use crate::error::{Result, TexError};

/// Pixel format codes as stored in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TexFormat {
    P8 = 1,
    P8A8 = 2,
    A1R5G5B5 = 6,
    I8 = 8,
    A4I4 = 9,
    A8I8 = 10,
    A8 = 11,
    PA8 = 14,
    P4 = 15,
    PA4 = 16,
    Rgb888 = 17,
    Rgba8888 = 18,
    Z16 = 19,
    Z24 = 20,
    Z32 = 21,
    Dxt1 = 22,
    Dxt3 = 24,
    Dxt5 = 26,
}

impl TexFormat {
    pub const ALL: [Self; 18] = [
        Self::P8,
        Self::P8A8,
        Self::A1R5G5B5,
        Self::I8,
        Self::A4I4,
        Self::A8I8,
        Self::A8,
        Self::PA8,
        Self::P4,
        Self::PA4,
        Self::Rgb888,
        Self::Rgba8888,
        Self::Z16,
        Self::Z24,
        Self::Z32,
        Self::Dxt1,
        Self::Dxt3,
        Self::Dxt5,
    ];

    pub fn from_u16(code: u16) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|format| *format as u16 == code)
            .ok_or(TexError::UnsupportedFormat(code))
    }

    pub fn code(self) -> u16 {
        self as u16
    }

    /// Bytes per pixel; negative values are pixels per byte
    pub fn stride(self) -> i32 {
        match self {
            Self::P8 | Self::I8 | Self::A4I4 | Self::A8 | Self::PA8 => 1,
            Self::P8A8 | Self::A1R5G5B5 | Self::A8I8 | Self::Z16 => 2,
            Self::Rgb888 | Self::Z24 => 3,
            Self::Rgba8888 | Self::Z32 => 4,
            Self::P4 | Self::PA4 | Self::Dxt1 => -2,
            Self::Dxt3 | Self::Dxt5 => 1,
        }
    }

    pub fn is_paletted(self) -> bool {
        matches!(self, Self::P4 | Self::P8 | Self::P8A8 | Self::PA4 | Self::PA8)
    }

    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            Self::A1R5G5B5
                | Self::A8I8
                | Self::A8
                | Self::A4I4
                | Self::Dxt3
                | Self::Dxt5
                | Self::P8A8
                | Self::PA4
                | Self::PA8
                | Self::Rgba8888
        )
    }

    pub fn is_compressed(self) -> bool {
        matches!(self, Self::Dxt1 | Self::Dxt3 | Self::Dxt5)
    }

    pub fn is_depth(self) -> bool {
        matches!(self, Self::Z16 | Self::Z24 | Self::Z32)
    }

    /// Palette entries following the header
    pub fn palette_len(self) -> usize {
        match self {
            Self::P4 | Self::PA4 => 16,
            Self::P8 | Self::P8A8 | Self::PA8 => 256,
            _ => 0,
        }
    }

    /// Palette alpha is ignored for these formats
    pub fn has_opaque_palette(self) -> bool {
        matches!(self, Self::P4 | Self::P8)
    }

    /// Byte size of a `width` x `height` image
    pub fn image_size(self, width: u32, height: u32) -> usize {
        let pixels = width as usize * height as usize;
        let stride = self.stride();
        if stride < 0 {
            pixels / stride.unsigned_abs() as usize
        } else {
            pixels * stride as usize
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::P8 => "P8",
            Self::P8A8 => "P8A8",
            Self::A1R5G5B5 => "A1R5G5B5",
            Self::I8 => "I8",
            Self::A4I4 => "A4I4",
            Self::A8I8 => "A8I8",
            Self::A8 => "A8",
            Self::PA8 => "PA8",
            Self::P4 => "P4",
            Self::PA4 => "PA4",
            Self::Rgb888 => "RGB888",
            Self::Rgba8888 => "RGB8888",
            Self::Z16 => "Z16",
            Self::Z24 => "Z24",
            Self::Z32 => "Z32",
            Self::Dxt1 => "DXT1",
            Self::Dxt3 => "DXT3",
            Self::Dxt5 => "DXT5",
        }
    }
}

impl fmt::Display for TexFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(TexFormat::P4, 8, 8, 32)]
    #[test_case(TexFormat::Dxt1, 16, 16, 128)]
    #[test_case(TexFormat::Dxt5, 16, 16, 256)]
    #[test_case(TexFormat::Rgb888, 4, 2, 24)]
    #[test_case(TexFormat::A1R5G5B5, 3, 3, 18)]
    fn image_sizes(format: TexFormat, width: u32, height: u32, expected: usize) {
        assert_eq!(format.image_size(width, height), expected);
    }

    #[test]
    fn codes_round_trip() {
        for format in TexFormat::ALL {
            assert_eq!(TexFormat::from_u16(format.code()).unwrap(), format);
        }
        assert!(matches!(
            TexFormat::from_u16(23),
            Err(TexError::UnsupportedFormat(23))
        ));
    }

    #[test]
    fn predicates() {
        assert!(TexFormat::PA4.is_paletted() && TexFormat::PA4.has_alpha());
        assert!(!TexFormat::Dxt1.has_alpha());
        assert!(TexFormat::Z24.is_depth());
        assert_eq!(TexFormat::P8A8.palette_len(), 256);
        assert_eq!(TexFormat::Rgba8888.palette_len(), 0);
    }
}
