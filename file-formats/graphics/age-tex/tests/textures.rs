//! TEX files through disk and through the image crate

use age_tex::{
    TexFile, TexFormat, TexImageOptions, TexTarget, image_to_tex, load_tex, save_tex,
    tex_to_image,
};
use image::{DynamicImage, Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use test_case::test_case;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 16) as u8, (y * 16) as u8, 128, 255])
    }))
}

#[test_case(TexTarget::Rgba8888)]
#[test_case(TexTarget::Dxt1)]
#[test_case(TexTarget::Dxt5)]
fn files_survive_disk(target: TexTarget) {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gradient.tex");
    let options = TexImageOptions {
        target,
        mipmaps: true,
        ..TexImageOptions::default()
    };
    let texture = image_to_tex(&gradient(16, 16), &options).unwrap();
    save_tex(&path, &texture).unwrap();
    let loaded = load_tex(&path).unwrap();
    assert_eq!(loaded, texture);
    assert!(loaded.is_valid());
}

#[test]
fn compressed_files_decompress_in_place() {
    init_logging();
    let options = TexImageOptions {
        target: TexTarget::Dxt1,
        mipmaps: true,
        ..TexImageOptions::default()
    };
    let mut texture = image_to_tex(&gradient(16, 8), &options).unwrap();
    // 16x8, 8x4; 4x2 would split a block
    assert_eq!(texture.mipmaps.len(), 2);
    let before = tex_to_image(&texture, 1).unwrap();

    assert_eq!(texture.decompress().unwrap(), 0);
    assert_eq!(texture.format, TexFormat::Rgba8888);
    assert_eq!(tex_to_image(&texture, 1).unwrap(), before);
    texture.validate().unwrap();
}

#[test]
fn paletted_textures_convert_to_images() {
    let mut texture = TexFile::new(2, 2, TexFormat::PA8);
    texture.palette = vec![[0, 0, 0, 0]; 256];
    texture.palette[1] = [255, 0, 0, 255];
    texture.palette[2] = [0, 255, 0, 64];
    texture.mipmaps = vec![vec![1, 2, 2, 1]];

    let image = tex_to_image(&texture, 0).unwrap();
    assert_eq!(image.get_pixel(0, 0), &Rgba([0, 0, 255, 255]));
    assert_eq!(image.get_pixel(1, 0), &Rgba([0, 255, 0, 64]));
    assert_eq!(image.get_pixel(0, 1), &Rgba([0, 255, 0, 64]));
}

#[test]
fn missing_mips_are_reported() {
    let texture = image_to_tex(&gradient(4, 4), &TexImageOptions::default()).unwrap();
    assert!(matches!(
        tex_to_image(&texture, 3),
        Err(age_tex::TexError::MissingMip(3))
    ));
}
