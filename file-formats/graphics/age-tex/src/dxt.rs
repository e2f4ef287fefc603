//! DXT1 and DXT5 block decompression, plus compression through `texpresso`.
//!
//! Blocks cover 4x4 texels and are scanned row-major. A texel is written
//! only when its column lies inside the image. Rows past the bottom edge are
//! dropped and counted; images the engine ships always have heights that
//! are multiples of 4, so a non-zero count means an unusual asset.

use std::borrow::Cow;

use log::{trace, warn};

/// Block layout used to decode a compressed mip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DxtKind {
    /// 8 bytes per block, opaque
    Dxt1,
    /// 16 bytes per block, interpolated alpha; DXT3 data is read this way too
    Dxt5,
}

impl DxtKind {
    pub fn block_size(self) -> usize {
        match self {
            Self::Dxt1 => 8,
            Self::Dxt5 => 16,
        }
    }

    fn codec(self) -> texpresso::Format {
        match self {
            Self::Dxt1 => texpresso::Format::Bc1,
            Self::Dxt5 => texpresso::Format::Bc3,
        }
    }
}

/// Decoded RGBA8 pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DxtImage {
    pub pixels: Vec<u8>,
    /// Texels that fell below the last image row
    pub dropped_texels: usize,
}

/// Expand a 5:6:5 color to 8 bits per channel
pub fn expand_565(color: u16) -> [u8; 3] {
    let color = u32::from(color);
    let five = |bits: u32| {
        let temp = bits * 255 + 16;
        ((temp / 32 + temp) / 32) as u8
    };
    let temp = ((color & 0x07E0) >> 5) * 255 + 32;
    let green = ((temp / 64 + temp) / 64) as u8;
    [five(color >> 11), green, five(color & 0x001F)]
}

/// Alpha for each of the eight selector codes
pub fn alpha_ramp(alpha0: u8, alpha1: u8) -> [u8; 8] {
    let (a0, a1) = (u32::from(alpha0), u32::from(alpha1));
    let mut ramp = [0u8; 8];
    for (code, alpha) in ramp.iter_mut().enumerate() {
        let code = code as u32;
        *alpha = match code {
            0 => alpha0,
            1 => alpha1,
            _ if a0 > a1 => (((8 - code) * a0 + (code - 1) * a1) / 7) as u8,
            6 => 0,
            7 => 255,
            _ => (((6 - code) * a0 + (code - 1) * a1) / 5) as u8,
        };
    }
    ramp
}

fn blend_thirds(a: [u8; 3], b: [u8; 3]) -> [u8; 3] {
    [0, 1, 2].map(|c| ((2 * u32::from(a[c]) + u32::from(b[c])) / 3) as u8)
}

fn average(a: [u8; 3], b: [u8; 3]) -> [u8; 3] {
    [0, 1, 2].map(|c| ((u32::from(a[c]) + u32::from(b[c])) / 2) as u8)
}

fn read_u16(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Four colors selected by the 2-bit codes
fn color_table(color0: u16, color1: u16, four_color: bool) -> [[u8; 3]; 4] {
    let c0 = expand_565(color0);
    let c1 = expand_565(color1);
    if four_color {
        [c0, c1, blend_thirds(c0, c1), blend_thirds(c1, c0)]
    } else {
        [c0, c1, average(c0, c1), [0, 0, 0]]
    }
}

/// Decode one DXT1 block into 16 RGBA texels, row-major
pub fn decode_dxt1_block(block: &[u8; 8]) -> [[u8; 4]; 16] {
    let color0 = read_u16(&block[0..2]);
    let color1 = read_u16(&block[2..4]);
    let codes = read_u32(&block[4..8]);
    // three-color mode keeps alpha opaque for these textures
    let table = color_table(color0, color1, color0 > color1);

    std::array::from_fn(|texel| {
        let [r, g, b] = table[((codes >> (2 * texel)) & 0x03) as usize];
        [r, g, b, 255]
    })
}

/// Decode one DXT5 block into 16 RGBA texels, row-major
pub fn decode_dxt5_block(block: &[u8; 16]) -> [[u8; 4]; 16] {
    let ramp = alpha_ramp(block[0], block[1]);
    let alpha_codes = block[2..8]
        .iter()
        .rev()
        .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte));
    let color0 = read_u16(&block[8..10]);
    let color1 = read_u16(&block[10..12]);
    let codes = read_u32(&block[12..16]);
    let table = color_table(color0, color1, true);

    std::array::from_fn(|texel| {
        let alpha = ramp[((alpha_codes >> (3 * texel)) & 0x07) as usize];
        let [r, g, b] = table[((codes >> (2 * texel)) & 0x03) as usize];
        [r, g, b, alpha]
    })
}

/// Number of blocks covering a `width` x `height` image
pub fn block_count(width: u32, height: u32) -> (usize, usize) {
    (width.div_ceil(4) as usize, height.div_ceil(4) as usize)
}

/// Decode a whole mip. Data shorter than the block grid is zero-padded.
pub fn decompress(data: &[u8], width: u32, height: u32, kind: DxtKind) -> DxtImage {
    let (blocks_x, blocks_y) = block_count(width, height);
    let block_size = kind.block_size();
    let required = blocks_x * blocks_y * block_size;
    let data: Cow<'_, [u8]> = if data.len() < required {
        warn!(
            "DXT data for {width}x{height} holds {} of {required} bytes; padding with zeros",
            data.len()
        );
        let mut padded = vec![0u8; required];
        padded[..data.len()].copy_from_slice(data);
        Cow::Owned(padded)
    } else {
        Cow::Borrowed(data)
    };

    let (width, height) = (width as usize, height as usize);
    let mut pixels = vec![0u8; width * height * 4];
    let mut dropped = 0usize;

    for (index, block) in data.chunks_exact(block_size).take(blocks_x * blocks_y).enumerate() {
        let texels = match kind {
            DxtKind::Dxt1 => block.try_into().map(decode_dxt1_block),
            DxtKind::Dxt5 => block.try_into().map(decode_dxt5_block),
        };
        let Ok(texels) = texels else {
            continue;
        };
        let x = (index % blocks_x) * 4;
        let y = (index / blocks_x) * 4;
        for (texel, color) in texels.iter().enumerate() {
            let (i, j) = (texel % 4, texel / 4);
            if x + i >= width {
                continue;
            }
            if y + j >= height {
                dropped += 1;
                continue;
            }
            let offset = ((y + j) * width + x + i) * 4;
            pixels[offset..offset + 4].copy_from_slice(color);
        }
    }

    if dropped > 0 {
        warn!("{dropped} DXT texels fall below the {height} pixel tall image and were dropped");
    }
    trace!("Decoded {blocks_x}x{blocks_y} {kind:?} blocks");
    DxtImage {
        pixels,
        dropped_texels: dropped,
    }
}

/// Compress RGBA8 pixels into DXT blocks
pub fn compress(rgba: &[u8], width: u32, height: u32, kind: DxtKind) -> Vec<u8> {
    let format = kind.codec();
    let (width, height) = (width as usize, height as usize);
    let mut output = vec![0u8; format.compressed_size(width, height)];
    format.compress(rgba, width, height, texpresso::Params::default(), &mut output);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(0x0000, [0, 0, 0])]
    #[test_case(0xFFFF, [255, 255, 255])]
    #[test_case(0xF800, [255, 0, 0])]
    #[test_case(0x07E0, [0, 255, 0])]
    #[test_case(0x8410, [132, 130, 132])]
    fn endpoint_expansion(color: u16, expected: [u8; 3]) {
        assert_eq!(expand_565(color), expected);
    }

    #[test]
    fn alpha_ramp_eight_step() {
        assert_eq!(alpha_ramp(255, 0), [255, 0, 218, 182, 145, 109, 72, 36]);
    }

    #[test]
    fn alpha_ramp_six_step() {
        assert_eq!(alpha_ramp(0, 255), [0, 255, 51, 102, 153, 204, 0, 255]);
    }

    #[test]
    fn equal_endpoints_give_a_flat_block() {
        let mut block = [0u8; 8];
        block[0..2].copy_from_slice(&0xF800u16.to_le_bytes());
        block[2..4].copy_from_slice(&0xF800u16.to_le_bytes());
        // equal endpoints select three-color mode; codes 0 and 1 only
        block[4..8].copy_from_slice(&0x4444_4444u32.to_le_bytes());
        let texels = decode_dxt1_block(&block);
        assert!(texels.iter().all(|&t| t == [255, 0, 0, 255]));
    }

    #[test]
    fn three_color_mode_uses_black() {
        let mut block = [0u8; 8];
        block[0..2].copy_from_slice(&0x001Fu16.to_le_bytes());
        block[2..4].copy_from_slice(&0xF800u16.to_le_bytes());
        block[4..8].copy_from_slice(&0xFFFF_FFFEu32.to_le_bytes());
        let texels = decode_dxt1_block(&block);
        assert_eq!(texels[0], [127, 0, 127, 255]);
        assert_eq!(texels[1], [0, 0, 0, 255]);
    }

    #[test]
    fn dxt5_alpha_selectors_span_bytes() {
        let mut block = [0u8; 16];
        block[0] = 255;
        block[1] = 0;
        // texel 5 straddles the two halves of the selector field: code 7
        let codes: u64 = 7 << 15;
        block[2..8].copy_from_slice(&codes.to_le_bytes()[..6]);
        let texels = decode_dxt5_block(&block);
        assert_eq!(texels[5][3], 36);
        assert_eq!(texels[0][3], 255);
    }

    #[test]
    fn only_columns_are_clipped() {
        // 6x2 image: two blocks wide, one block tall
        let image = decompress(&[0xFF; 16], 6, 2, DxtKind::Dxt1);
        assert_eq!(image.pixels.len(), 6 * 2 * 4);
        // rows 2 and 3 of both blocks, minus the clipped columns 6 and 7
        assert_eq!(image.dropped_texels, 2 * 4 + 2 * 2);
    }

    #[test]
    fn short_data_is_padded() {
        let image = decompress(&[0xFF, 0xFF], 4, 4, DxtKind::Dxt1);
        assert_eq!(image.dropped_texels, 0);
        assert_eq!(&image.pixels[..4], &[255, 255, 255, 255]);
    }

    #[test]
    fn compressed_flat_color_decodes_back() {
        let rgba: Vec<u8> = [200u8, 40, 40, 255].repeat(16);
        let blocks = compress(&rgba, 4, 4, DxtKind::Dxt5);
        assert_eq!(blocks.len(), 16);
        let image = decompress(&blocks, 4, 4, DxtKind::Dxt5);
        for texel in image.pixels.chunks_exact(4) {
            assert!(texel[0].abs_diff(200) <= 8 && texel[1].abs_diff(40) <= 8);
            assert_eq!(texel[3], 255);
        }
    }
}
