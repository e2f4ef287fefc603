//! Angel Game Engine skinned models (`.mod`) and skeletons (`.skel`).
//!
//! A [`ModFile`] is read from text (1.06, 1.08, 1.09, 1.10) or binary
//! (2.00, 2.10, 2.12) data and converted to and from the host
//! [`age_data::Mesh`] with [`export_mesh`] and [`import_mesh`].
//!
//! ```no_run
//! use age_data::ImportContext;
//! use age_mod::{ModExportOptions, FormatVersion};
//!
//! let path = std::path::Path::new("geometry/ped.mod");
//! let file = age_mod::load_mod(path)?;
//! let decoded = age_mod::import_mesh(&file, "ped", None, &ImportContext::for_model(path))?;
//!
//! let options = ModExportOptions::with_version(FormatVersion::V2_10);
//! let binary = age_mod::export_mesh(&decoded.value, None, &options)?;
//! age_mod::save_mod("ped_binary.mod", &binary)?;
//! # Ok::<(), age_mod::ModError>(())
//! ```

use std::path::Path;

pub mod ascii;
pub mod binary;
pub mod error;
pub mod file;
pub mod packetizer;
pub mod skel;
pub mod unpack;
pub mod version;

pub use error::{ModError, Result};
pub use file::{
    Adjunct, Attribute, AttributeValue, Illumination, MaterialGeometry, ModFile, ModMaterial,
    Packet, Primitive,
};
pub use packetizer::{ModExportOptions, export_mesh};
pub use skel::{parse_skel, write_skel};
pub use unpack::import_mesh;
pub use version::{FormatVersion, Layout};

/// Parse MOD data, text or binary
pub fn parse_mod(data: &[u8]) -> Result<ModFile> {
    if binary::is_binary(data) {
        return binary::parse(data);
    }
    let text = std::str::from_utf8(data)
        .map_err(|err| ModError::MalformedHeader(format!("file is neither binary nor text: {err}")))?;
    ascii::parse(text)
}

/// Encode in the representation the file's version calls for
pub fn encode_mod(file: &ModFile) -> Result<Vec<u8>> {
    if file.version.is_binary() {
        binary::write(file)
    } else {
        ascii::write(file).map(String::into_bytes)
    }
}

pub fn load_mod(path: impl AsRef<Path>) -> Result<ModFile> {
    parse_mod(&std::fs::read(path)?)
}

/// Encode fully, then write
pub fn save_mod(path: impl AsRef<Path>, file: &ModFile) -> Result<()> {
    let bytes = encode_mod(file)?;
    age_data::save_bytes(path, &bytes)?;
    Ok(())
}

pub fn load_skel(path: impl AsRef<Path>) -> Result<age_data::Skeleton> {
    parse_skel(&std::fs::read_to_string(path)?)
}

pub fn save_skel(path: impl AsRef<Path>, skeleton: &age_data::Skeleton) -> Result<()> {
    let text = write_skel(skeleton)?;
    age_data::save_bytes(path, text.as_bytes())?;
    Ok(())
}
