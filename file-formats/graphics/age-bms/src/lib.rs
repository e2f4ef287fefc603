//! Angel Game Engine static meshes (`.bms`).
//!
//! A [`BmsFile`] mirrors the binary layout. [`export_mesh`] and
//! [`import_mesh`] convert it to and from the host [`age_data::Mesh`],
//! quantizing normals against [`normals::NORMAL_TABLE`].
//!
//! ```no_run
//! use age_bms::BmsExportOptions;
//! use age_data::ImportContext;
//!
//! let path = std::path::Path::new("city/bridge.bms");
//! let file = age_bms::load_bms(path)?;
//! let decoded = age_bms::import_mesh(&file, "bridge", &ImportContext::for_static_mesh(path))?;
//!
//! let options = BmsExportOptions { colors: false, ..Default::default() };
//! let again = age_bms::export_mesh(&decoded.value, &options)?;
//! age_bms::save_bms("bridge_nocolor.bms", &again)?;
//! # Ok::<(), age_bms::BmsError>(())
//! ```

use std::path::Path;

pub mod codec;
pub mod error;
pub mod file;
pub mod flags;
pub mod normals;

pub use codec::{BmsExportOptions, compute_plane, export_mesh, import_mesh};
pub use error::{BmsError, Result};
pub use file::{BMS_MAGIC, BmsFile, BmsTexture, Surface, parse, write};
pub use flags::{MeshFlags, TextureFlags, TextureProps};
pub use normals::{pack_normal, unpack_normal};

pub fn load_bms(path: impl AsRef<Path>) -> Result<BmsFile> {
    parse(&std::fs::read(path)?)
}

/// Encode fully, then write
pub fn save_bms(path: impl AsRef<Path>, file: &BmsFile) -> Result<()> {
    let bytes = write(file)?;
    age_data::save_bytes(path, &bytes)?;
    Ok(())
}
