//! TEX container layout.
//!
//! ```text
//! u16 width, u16 height, u16 format
//! u16 mip count, u16 reserved, u32 flags
//! u8[4] x 16 or 256   BGRA palette, paletted formats only
//! mip 0, mip 1, ...   sizes follow from dimensions and format
//! ```

use std::fmt;

use age_data::{LeReader, LeWriter};
use custom_debug::Debug;
use log::{debug, warn};

use crate::dxt::{self, DxtKind};
use crate::error::{Result, TexError};
use crate::format::TexFormat;

/// Size of the fixed header
pub const HEADER_SIZE: usize = 14;

#[allow(clippy::ptr_arg)]
fn mip_sizes_fmt(mipmaps: &Vec<Vec<u8>>, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_list()
        .entries(mipmaps.iter().map(|mip| format!("{} bytes", mip.len())))
        .finish()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TexFile {
    pub width: u16,
    pub height: u16,
    pub format: TexFormat,
    /// Kept as read; new textures store 1
    pub reserved: u16,
    pub flags: u32,
    /// Raw BGRA entries
    pub palette: Vec<[u8; 4]>,
    #[debug(with = mip_sizes_fmt)]
    pub mipmaps: Vec<Vec<u8>>,
}

impl TexFile {
    /// An empty texture with no mips
    pub fn new(width: u16, height: u16, format: TexFormat) -> Self {
        Self {
            width,
            height,
            format,
            reserved: 1,
            flags: 0,
            palette: Vec::new(),
            mipmaps: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.width != 0 && self.height != 0 && !self.mipmaps.is_empty()
    }

    /// Dimensions of a mip level; each level halves with floor division
    pub fn mip_dimensions(&self, level: usize) -> (u32, u32) {
        let shift = level.min(31) as u32;
        (u32::from(self.width) >> shift, u32::from(self.height) >> shift)
    }

    /// Bytes stored for a mip level
    pub fn mip_byte_size(&self, level: usize) -> usize {
        let (width, height) = self.mip_dimensions(level);
        self.format.image_size(width, height)
    }

    pub fn mip(&self, level: usize) -> Result<&[u8]> {
        self.mipmaps
            .get(level)
            .map(Vec::as_slice)
            .ok_or(TexError::MissingMip(level))
    }

    /// Palette entry as RGBA, opaque for formats that ignore palette alpha
    pub fn palette_rgba(&self, index: usize) -> [u8; 4] {
        let [b, g, r, a] = self.palette.get(index).copied().unwrap_or_default();
        if self.format.has_opaque_palette() {
            [r, g, b, 255]
        } else {
            [r, g, b, a]
        }
    }

    /// Replace compressed mips by RGBA8888 data.
    ///
    /// Returns the number of texels dropped below the image across all mips.
    pub fn decompress(&mut self) -> Result<usize> {
        let kind = match self.format {
            TexFormat::Dxt1 => DxtKind::Dxt1,
            TexFormat::Dxt3 | TexFormat::Dxt5 => DxtKind::Dxt5,
            other => return Err(TexError::NotCompressed(other)),
        };
        let mut dropped = 0;
        for level in 0..self.mipmaps.len() {
            let (width, height) = self.mip_dimensions(level);
            let image = dxt::decompress(&self.mipmaps[level], width, height, kind);
            dropped += image.dropped_texels;
            self.mipmaps[level] = image.pixels;
        }
        debug!(
            "Decompressed {} {} mips to RGBA8888",
            self.mipmaps.len(),
            self.format
        );
        self.format = TexFormat::Rgba8888;
        Ok(dropped)
    }

    /// Check palette and mip sizes against the format
    pub fn validate(&self) -> Result<()> {
        let expected = self.format.palette_len();
        if self.palette.len() != expected {
            return Err(TexError::PaletteSize {
                format: self.format,
                expected,
                actual: self.palette.len(),
            });
        }
        for (level, mip) in self.mipmaps.iter().enumerate() {
            let expected = self.mip_byte_size(level);
            if mip.len() != expected {
                return Err(TexError::MipSize {
                    level,
                    expected,
                    actual: mip.len(),
                });
            }
        }
        Ok(())
    }
}

pub fn parse(data: &[u8]) -> Result<TexFile> {
    let mut reader = LeReader::new(data);
    let width = reader.read_u16()?;
    let height = reader.read_u16()?;
    let format = TexFormat::from_u16(reader.read_u16()?)?;
    let mip_count = usize::from(reader.read_u16()?);
    let reserved = reader.read_u16()?;
    let flags = reader.read_u32()?;

    let mut texture = TexFile {
        width,
        height,
        format,
        reserved,
        flags,
        palette: Vec::new(),
        mipmaps: Vec::with_capacity(mip_count),
    };
    for _ in 0..format.palette_len() {
        texture.palette.push(reader.read_array()?);
    }

    for level in 0..mip_count {
        let size = texture.mip_byte_size(level);
        if size == 0 {
            debug!("Mip {level} of {width}x{height} {format} is empty; {mip_count} declared");
            break;
        }
        texture.mipmaps.push(reader.read_bytes(size)?.to_vec());
    }
    if !reader.is_empty() {
        warn!("{} trailing bytes after texture data", reader.remaining());
    }

    debug!(
        "Parsed TEX: {width}x{height} {format}, {} mips, flags {flags:#x}",
        texture.mipmaps.len()
    );
    Ok(texture)
}

pub fn write(texture: &TexFile) -> Result<Vec<u8>> {
    texture.validate()?;
    let mut writer = LeWriter::new();
    writer.write_u16(texture.width);
    writer.write_u16(texture.height);
    writer.write_u16(texture.format.code());
    writer.write_u16(texture.mipmaps.len() as u16);
    writer.write_u16(texture.reserved);
    writer.write_u32(texture.flags);
    for entry in &texture.palette {
        writer.write_bytes(entry);
    }
    for mip in &texture.mipmaps {
        writer.write_bytes(mip);
    }
    Ok(writer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paletted() -> TexFile {
        let mut texture = TexFile::new(4, 4, TexFormat::P4);
        texture.palette = (0..16u8).map(|i| [i, 0, 255 - i, 128]).collect();
        texture.mipmaps = vec![vec![0x10; 8], vec![0x32; 2]];
        texture
    }

    #[test]
    fn header_and_palette_layout() {
        let bytes = write(&paletted()).unwrap();
        assert_eq!(&bytes[..HEADER_SIZE], &[4, 0, 4, 0, 15, 0, 2, 0, 1, 0, 0, 0, 0, 0]);
        assert_eq!(bytes.len(), HEADER_SIZE + 16 * 4 + 8 + 2);
    }

    #[test]
    fn writes_what_it_reads() {
        let texture = paletted();
        let bytes = write(&texture).unwrap();
        assert_eq!(parse(&bytes).unwrap(), texture);
    }

    #[test]
    fn reading_stops_at_empty_mips() {
        let mut texture = TexFile::new(2, 2, TexFormat::I8);
        texture.mipmaps = vec![vec![1; 4], vec![2]];
        let mut bytes = write(&texture).unwrap();
        // claim five mips; level 2 would be 0x0
        bytes[6] = 5;
        assert_eq!(parse(&bytes).unwrap().mipmaps.len(), 2);
    }

    #[test]
    fn opaque_palettes_ignore_alpha() {
        let texture = paletted();
        assert_eq!(texture.palette_rgba(3), [252, 0, 3, 255]);
        let mut alpha = texture;
        alpha.format = TexFormat::PA4;
        assert_eq!(alpha.palette_rgba(3), [252, 0, 3, 128]);
    }

    #[test]
    fn unknown_formats_are_rejected() {
        let mut bytes = write(&paletted()).unwrap();
        bytes[4] = 25;
        assert!(matches!(parse(&bytes), Err(TexError::UnsupportedFormat(25))));
    }

    #[test]
    fn truncated_mips_fail() {
        let bytes = write(&paletted()).unwrap();
        assert!(matches!(
            parse(&bytes[..bytes.len() - 1]),
            Err(TexError::Data(age_data::DataError::Truncated { .. }))
        ));
    }

    #[test]
    fn declared_mips_beyond_the_data_fail() {
        let mut texture = TexFile::new(4, 4, TexFormat::I8);
        texture.mipmaps = vec![vec![0; 16]];
        let mut bytes = write(&texture).unwrap();
        bytes[6..8].copy_from_slice(&u16::MAX.to_le_bytes());
        assert!(matches!(
            parse(&bytes),
            Err(TexError::Data(age_data::DataError::Truncated { .. }))
        ));
    }

    #[test]
    fn mip_sizes_are_checked_on_write() {
        let mut texture = paletted();
        texture.mipmaps[1].push(0);
        assert!(matches!(
            write(&texture),
            Err(TexError::MipSize { level: 1, expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn decompress_reclassifies_the_format() {
        let mut texture = TexFile::new(4, 4, TexFormat::Dxt1);
        texture.mipmaps = vec![vec![0xFF, 0xFF, 0, 0, 0, 0, 0, 0]];
        assert_eq!(texture.decompress().unwrap(), 0);
        assert_eq!(texture.format, TexFormat::Rgba8888);
        assert_eq!(texture.mipmaps[0].len(), 64);
        assert!(texture.validate().is_ok());
        assert!(matches!(texture.decompress(), Err(TexError::NotCompressed(_))));
    }
}
