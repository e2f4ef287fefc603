//! TEX texture command implementations

use anyhow::{Context, Result, bail};
use clap::{Subcommand, ValueEnum};
use image::{ImageFormat, ImageReader, imageops::FilterType};
use std::path::{Path, PathBuf};

use age_tex::{TexImageOptions, TexTarget, image_to_tex, load_tex, save_tex, tex_to_image};

use crate::utils::{add_table_row, create_table, file_size, format_bytes};

#[derive(Subcommand)]
pub enum TexCommands {
    /// Display information about a TEX file
    Info {
        /// Path to the TEX file
        file: PathBuf,

        /// Show detailed mipmap information
        #[arg(long)]
        mipmaps: bool,

        /// Show the palette entries of paletted textures
        #[arg(long)]
        palette: bool,
    },

    /// Convert a TEX file to an image, or decompress it into an RGBA8888 TEX
    Convert {
        /// Input TEX file
        input: PathBuf,

        /// Output file (png, tga, bmp or tex)
        output: PathBuf,

        /// Mipmap level to extract
        #[arg(long, default_value = "0")]
        mipmap_level: usize,
    },

    /// Create a TEX file from an image
    Create {
        /// Input image (png, tga or bmp)
        input: PathBuf,

        /// Output TEX file
        output: PathBuf,

        /// Pixel format to store
        #[arg(long, default_value = "rgba8888")]
        format: TexFormatCli,

        /// Build the full mipmap chain
        #[arg(long)]
        mipmaps: bool,

        /// Mipmap filtering algorithm
        #[arg(long, default_value = "triangle")]
        mipmap_filter: MipmapFilter,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum TexFormatCli {
    Rgba8888,
    Dxt1,
    Dxt5,
}

impl From<TexFormatCli> for TexTarget {
    fn from(value: TexFormatCli) -> Self {
        match value {
            TexFormatCli::Rgba8888 => Self::Rgba8888,
            TexFormatCli::Dxt1 => Self::Dxt1,
            TexFormatCli::Dxt5 => Self::Dxt5,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum MipmapFilter {
    /// Nearest Neighbor
    Nearest,
    /// Linear Filter
    Triangle,
    /// Cubic Filter
    CatmullRom,
    /// Gaussian Filter
    Gaussian,
    /// Lanczos with window 3
    Lanczos3,
}

impl From<MipmapFilter> for FilterType {
    fn from(value: MipmapFilter) -> Self {
        match value {
            MipmapFilter::Nearest => Self::Nearest,
            MipmapFilter::Triangle => Self::Triangle,
            MipmapFilter::CatmullRom => Self::CatmullRom,
            MipmapFilter::Gaussian => Self::Gaussian,
            MipmapFilter::Lanczos3 => Self::Lanczos3,
        }
    }
}

pub fn execute(cmd: TexCommands) -> Result<()> {
    match cmd {
        TexCommands::Info {
            file,
            mipmaps,
            palette,
        } => show_tex_info(&file, mipmaps, palette),
        TexCommands::Convert {
            input,
            output,
            mipmap_level,
        } => convert_tex(&input, &output, mipmap_level),
        TexCommands::Create {
            input,
            output,
            format,
            mipmaps,
            mipmap_filter,
        } => create_tex(
            &input,
            &output,
            &TexImageOptions {
                target: format.into(),
                mipmaps,
                filter: mipmap_filter.into(),
            },
        ),
    }
}

fn is_tex(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tex"))
}

fn show_tex_info(file: &Path, show_mipmaps: bool, show_palette: bool) -> Result<()> {
    let texture =
        load_tex(file).with_context(|| format!("Failed to load TEX file: {}", file.display()))?;

    println!("TEX File Information: {}", file.display());
    println!("=====================================");
    println!("File Size: {}", file_size(file));
    println!("Dimensions: {}x{}", texture.width, texture.height);
    println!("Format: {} (code {})", texture.format, texture.format.code());
    println!("Paletted: {}", texture.format.is_paletted());
    println!("Has Alpha: {}", texture.format.has_alpha());
    println!("Compressed: {}", texture.format.is_compressed());
    println!("Mipmap Count: {}", texture.mipmaps.len());
    println!("Flags: {:#010x}", texture.flags);
    println!("Valid: {}", texture.is_valid());

    if show_mipmaps {
        println!("\nMipmap Information:");
        println!("-------------------");
        let mut table = create_table(&["Level", "Dimensions", "Size"]);
        for (level, mip) in texture.mipmaps.iter().enumerate() {
            let (width, height) = texture.mip_dimensions(level);
            add_table_row(
                &mut table,
                [
                    level.to_string(),
                    format!("{width}x{height}"),
                    format_bytes(mip.len() as u64),
                ],
            );
        }
        table.printstd();
    }

    if show_palette && texture.format.is_paletted() {
        println!("\nPalette ({} entries, RGBA):", texture.palette.len());
        println!("--------------------------");
        for index in 0..texture.palette.len() {
            let [r, g, b, a] = texture.palette_rgba(index);
            println!("  {index:3}: {r:3} {g:3} {b:3} {a:3}");
        }
    }

    Ok(())
}

fn convert_tex(input: &Path, output: &Path, mipmap_level: usize) -> Result<()> {
    let mut texture =
        load_tex(input).with_context(|| format!("Failed to load TEX file: {}", input.display()))?;

    if is_tex(output) {
        if !texture.format.is_compressed() {
            bail!(
                "{} is already uncompressed ({})",
                input.display(),
                texture.format
            );
        }
        let dropped = texture
            .decompress()
            .context("Failed to decompress texture")?;
        if dropped > 0 {
            log::warn!("{dropped} texels fell outside the image while decompressing");
        }
        save_tex(output, &texture)
            .with_context(|| format!("Failed to save TEX file: {}", output.display()))?;
    } else {
        let format = ImageFormat::from_path(output).with_context(|| {
            format!("Failed to determine image format of {}", output.display())
        })?;
        let image = tex_to_image(&texture, mipmap_level).with_context(|| {
            format!("Failed to convert TEX mipmap level {mipmap_level}")
        })?;
        image
            .save_with_format(output, format)
            .with_context(|| format!("Failed to save image: {}", output.display()))?;
    }

    println!("✓ Converted {} to {}", input.display(), output.display());
    Ok(())
}

fn create_tex(input: &Path, output: &Path, options: &TexImageOptions) -> Result<()> {
    let image = ImageReader::open(input)
        .with_context(|| format!("Failed to open image file: {}", input.display()))?
        .decode()
        .with_context(|| format!("Failed to decode image: {}", input.display()))?;

    let texture = image_to_tex(&image, options).context("Failed to convert image to TEX")?;
    save_tex(output, &texture)
        .with_context(|| format!("Failed to save TEX file: {}", output.display()))?;

    println!(
        "✓ Created {} ({}x{} {}, {} mipmaps)",
        output.display(),
        texture.width,
        texture.height,
        texture.format,
        texture.mipmaps.len()
    );
    Ok(())
}
