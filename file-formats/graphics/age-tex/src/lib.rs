//! Angel Game Engine textures (`.tex`).
//!
//! [`TexFile`] holds the container: header, optional palette and the raw mip
//! chain. Uncompressed formats decode per pixel ([`pixel`]); DXT1/DXT3/DXT5
//! mips decode block-wise ([`dxt`]). [`convert`] moves textures to and from
//! [`image::RgbaImage`].
//!
//! ```no_run
//! let texture = age_tex::load_tex("texture/road.tex")?;
//! let image = age_tex::tex_to_image(&texture, 0)?;
//! image.save("road.png")?;
//! # Ok::<(), age_tex::TexError>(())
//! ```

use std::path::Path;

pub mod convert;
pub mod dxt;
pub mod error;
pub mod file;
pub mod format;
pub mod pixel;

pub use convert::{TexImageOptions, TexTarget, image_to_tex, tex_to_image};
pub use dxt::{DxtImage, DxtKind};
pub use error::{Result, TexError};
pub use file::{TexFile, parse, write};
pub use format::TexFormat;
pub use pixel::{decode_mip, decode_pixel};

pub fn load_tex(path: impl AsRef<Path>) -> Result<TexFile> {
    parse(&std::fs::read(path)?)
}

/// Encode fully, then write
pub fn save_tex(path: impl AsRef<Path>, texture: &TexFile) -> Result<()> {
    let bytes = write(texture)?;
    age_data::save_bytes(path, &bytes)?;
    Ok(())
}
