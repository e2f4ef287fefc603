//! Collision bounds for the Angel Game Engine.
//!
//! One [`Bound`] model backs three files written side by side:
//!
//! - `.bnd`: text, versions 1.01 and 1.10 ([`text`])
//! - `.bbnd`: the same data in binary ([`binary`])
//! - `.ter`: a grid of ground sections listing the faces over each ([`ter`])
//!
//! Single objects can instead carry a `type: box` BND ([`box_bound`]).
//!
//! ```no_run
//! use age_bnd::{Bound, BndVersion, TerFile};
//!
//! let bound = age_bnd::load_bnd("city/bound.bnd")?;
//! age_bnd::save_bbnd("city/bound.bbnd", &bound, BndVersion::V1_01)?;
//! age_bnd::save_ter("city/bound.ter", &TerFile::build(&bound)?)?;
//! # Ok::<(), age_bnd::BndError>(())
//! ```

use std::path::Path;

pub mod binary;
pub mod bound;
pub mod box_bound;
pub mod error;
pub mod ter;
pub mod text;
pub mod version;

pub use bound::{Bound, BoundFace, BoundMaterial, material_color};
pub use box_bound::BoxBound;
pub use error::{BndError, Result};
pub use ter::TerFile;
pub use version::BndVersion;

pub fn load_bnd(path: impl AsRef<Path>) -> Result<Bound> {
    text::parse(&std::fs::read_to_string(path)?)
}

pub fn save_bnd(path: impl AsRef<Path>, bound: &Bound, version: BndVersion) -> Result<()> {
    let text = text::write(bound, version)?;
    age_data::save_bytes(path, text.as_bytes())?;
    Ok(())
}

/// Read a `type: box` BND
pub fn load_box_bnd(path: impl AsRef<Path>) -> Result<BoxBound> {
    box_bound::parse(&std::fs::read_to_string(path)?)
}

pub fn save_box_bnd(path: impl AsRef<Path>, bound: &BoxBound) -> Result<()> {
    age_data::save_bytes(path, box_bound::write(bound).as_bytes())?;
    Ok(())
}

pub fn load_bbnd(path: impl AsRef<Path>) -> Result<Bound> {
    binary::parse(&std::fs::read(path)?)
}

pub fn save_bbnd(path: impl AsRef<Path>, bound: &Bound, layout: BndVersion) -> Result<()> {
    let bytes = binary::write(bound, layout)?;
    age_data::save_bytes(path, &bytes)?;
    Ok(())
}

pub fn load_ter(path: impl AsRef<Path>) -> Result<TerFile> {
    ter::parse(&std::fs::read(path)?)
}

pub fn save_ter(path: impl AsRef<Path>, ter: &TerFile) -> Result<()> {
    let bytes = ter::write(ter)?;
    age_data::save_bytes(path, &bytes)?;
    Ok(())
}
