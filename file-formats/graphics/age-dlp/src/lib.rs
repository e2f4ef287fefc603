//! Angel Studios DLP7 patch meshes (`.dlp`) and their GEO scene source.
//!
//! [`parse`] decodes the whole file into a [`DlpFile`]; [`import_groups`]
//! turns each group into a host [`age_data::Mesh`]. DLP files are read only;
//! scenes go the other way as GEO text ([`geo`]) for the asset manager to
//! compile.
//!
//! ```no_run
//! use age_data::ImportContext;
//!
//! let file = age_dlp::load_dlp("geometry/vpbug.dlp")?;
//! for decoded in age_dlp::import_groups(&file, &ImportContext::none())? {
//!     println!("{}: {} faces", decoded.value.name, decoded.value.faces.len());
//! }
//! # Ok::<(), age_dlp::DlpError>(())
//! ```

use std::path::Path;

pub mod convert;
pub mod error;
pub mod file;
pub mod geo;

pub use convert::{import_group, import_groups};
pub use error::{DlpError, Result};
pub use file::{DLP_MAGIC, DlpFile, DlpGroup, DlpMaterial, DlpPatch, DlpTexture, DlpVertex, parse};
pub use geo::{save_geo, write_geo};

pub fn load_dlp(path: impl AsRef<Path>) -> Result<DlpFile> {
    parse(&std::fs::read(path)?)
}
