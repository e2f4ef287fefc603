//! Per-pixel decoding of uncompressed formats to RGBA8.

use crate::error::Result;
use crate::file::TexFile;
use crate::format::TexFormat;

/// Replicate the top bits of a 5-bit channel held in bits 3..7
fn widen_five(channel: u8) -> u8 {
    if channel & 0x08 != 0 { channel | 0x0F } else { channel }
}

fn a1r5g5b5(color: u16) -> [u8; 4] {
    let red = ((color & 0x7C00) >> 7) as u8;
    let green = ((color & 0x03E0) >> 2) as u8;
    let blue = ((color & 0x001F) << 3) as u8;
    let alpha = if color & 0x8000 != 0 { 255 } else { 0 };
    [widen_five(red), widen_five(green), widen_five(blue), alpha]
}

/// RGBA of one pixel of a mip level.
///
/// Depth formats decode to transparent black; compressed formats must be
/// decompressed first and also yield transparent black here. Reads past the
/// mip data count as zero bytes.
pub fn decode_pixel(texture: &TexFile, x: u32, y: u32, level: usize) -> Result<[u8; 4]> {
    let data = texture.mip(level)?;
    let (width, _) = texture.mip_dimensions(level);
    let stride = texture.format.stride();
    let (x, y, width) = (x as usize, y as usize, width as usize);
    let index = if stride > 0 {
        let stride = stride as usize;
        x * stride + y * width * stride
    } else {
        let per_byte = stride.unsigned_abs() as usize;
        x / per_byte + y * (width / per_byte)
    };
    let byte = |offset: usize| data.get(index + offset).copied().unwrap_or(0);

    let pixel = match texture.format {
        TexFormat::P8 | TexFormat::PA8 => texture.palette_rgba(usize::from(byte(0))),
        TexFormat::P8A8 => {
            let [r, g, b, _] = texture.palette_rgba(usize::from(byte(0)));
            [r, g, b, byte(1)]
        }
        TexFormat::P4 | TexFormat::PA4 => {
            // even columns use the low nibble
            let nibble = if x % 2 == 0 { byte(0) & 0x0F } else { byte(0) >> 4 };
            texture.palette_rgba(usize::from(nibble))
        }
        TexFormat::A1R5G5B5 => a1r5g5b5(u16::from_le_bytes([byte(0), byte(1)])),
        TexFormat::I8 => [byte(0), byte(0), byte(0), 255],
        TexFormat::A8 => [0, 0, 0, byte(0)],
        TexFormat::A8I8 => [byte(1), byte(1), byte(1), byte(0)],
        TexFormat::A4I4 => {
            let grey = (byte(0) & 0x0F) * 17;
            [grey, grey, grey, (byte(0) >> 4) * 17]
        }
        TexFormat::Rgb888 => [byte(0), byte(1), byte(2), 255],
        TexFormat::Rgba8888 => [byte(0), byte(1), byte(2), byte(3)],
        TexFormat::Z16
        | TexFormat::Z24
        | TexFormat::Z32
        | TexFormat::Dxt1
        | TexFormat::Dxt3
        | TexFormat::Dxt5 => [0, 0, 0, 0],
    };
    Ok(pixel)
}

/// Whole mip level as row-major RGBA8, top row first
pub fn decode_mip(texture: &TexFile, level: usize) -> Result<Vec<u8>> {
    let (width, height) = texture.mip_dimensions(level);
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&decode_pixel(texture, x, y, level)?);
        }
    }
    Ok(pixels)
}
