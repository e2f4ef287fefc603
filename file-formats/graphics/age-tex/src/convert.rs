//! Conversion between TEX textures and `image` buffers.

use ::image::imageops::{self, FilterType};
use ::image::{DynamicImage, RgbaImage};
use log::debug;

use crate::dxt::{self, DxtKind};
use crate::error::{Result, TexError};
use crate::file::TexFile;
use crate::format::TexFormat;
use crate::pixel;

/// Pixel format written by [`image_to_tex`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexTarget {
    Rgba8888,
    Dxt1,
    Dxt5,
}

impl TexTarget {
    fn format(self) -> TexFormat {
        match self {
            Self::Rgba8888 => TexFormat::Rgba8888,
            Self::Dxt1 => TexFormat::Dxt1,
            Self::Dxt5 => TexFormat::Dxt5,
        }
    }
}

/// Settings for building a TEX from an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TexImageOptions {
    pub target: TexTarget,
    /// Build the full mip chain
    pub mipmaps: bool,
    pub filter: FilterType,
}

impl Default for TexImageOptions {
    fn default() -> Self {
        Self {
            target: TexTarget::Rgba8888,
            mipmaps: false,
            filter: FilterType::Triangle,
        }
    }
}

/// Decode one mip level to an RGBA image, rows in stored order
pub fn tex_to_image(texture: &TexFile, level: usize) -> Result<RgbaImage> {
    let data = texture.mip(level)?;
    let (width, height) = texture.mip_dimensions(level);
    let pixels = match texture.format {
        TexFormat::Dxt1 => dxt::decompress(data, width, height, DxtKind::Dxt1).pixels,
        TexFormat::Dxt3 | TexFormat::Dxt5 => {
            dxt::decompress(data, width, height, DxtKind::Dxt5).pixels
        }
        _ => pixel::decode_mip(texture, level)?,
    };
    RgbaImage::from_raw(width, height, pixels).ok_or(TexError::MipSize {
        level,
        expected: width as usize * height as usize * 4,
        actual: 0,
    })
}

/// Halving mip chain down to the smallest level the format can store
fn mip_chain(image: RgbaImage, options: &TexImageOptions) -> Vec<RgbaImage> {
    // compressed levels need whole blocks
    let minimum = if options.target == TexTarget::Rgba8888 { 1 } else { 4 };
    let (mut width, mut height) = image.dimensions();
    let mut chain = vec![image];
    if !options.mipmaps {
        return chain;
    }
    loop {
        width /= 2;
        height /= 2;
        if width < minimum || height < minimum {
            break;
        }
        let Some(previous) = chain.last() else {
            break;
        };
        let next = imageops::resize(previous, width, height, options.filter);
        chain.push(next);
    }
    chain
}

/// Build a TEX texture from an image
pub fn image_to_tex(image: &DynamicImage, options: &TexImageOptions) -> Result<TexFile> {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let too_large = || TexError::TooLarge { width, height };
    let mut texture = TexFile::new(
        u16::try_from(width).map_err(|_| too_large())?,
        u16::try_from(height).map_err(|_| too_large())?,
        options.target.format(),
    );

    for (level, mip) in mip_chain(rgba, options).into_iter().enumerate() {
        let (mip_width, mip_height) = mip.dimensions();
        let mut data = match options.target {
            TexTarget::Rgba8888 => mip.into_raw(),
            TexTarget::Dxt1 => dxt::compress(mip.as_raw(), mip_width, mip_height, DxtKind::Dxt1),
            TexTarget::Dxt5 => dxt::compress(mip.as_raw(), mip_width, mip_height, DxtKind::Dxt5),
        };
        // odd sizes store fewer bytes than whole blocks hold
        data.resize(texture.mip_byte_size(level), 0);
        texture.mipmaps.push(data);
    }

    debug!(
        "Built {}x{} {} texture with {} mips",
        width,
        height,
        texture.format,
        texture.mipmaps.len()
    );
    Ok(texture)
}
