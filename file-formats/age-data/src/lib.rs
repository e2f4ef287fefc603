//! Shared building blocks for the Angel Game Engine format crates.
//!
//! - [`token::TokenParser`]: line cursor behind the ASCII formats (MOD, BND, SKEL)
//! - [`cursor::BinaryReader`] / [`cursor::BinaryWriter`]: endian-aware binary I/O
//! - [`index`]: typed indices and arena pools
//! - [`scene`]: the host mesh, material and skeleton model exchanged with the codecs
//! - [`axis`]: host/engine coordinate conversion
//! - [`matrix`]: `.mtx` object placement files
//! - [`key`]: exact float keys for de-duplication
//! - [`context::ImportContext`]: explicit texture lookup for importers

pub mod axis;
pub mod context;
pub mod cursor;
pub mod error;
pub mod index;
pub mod key;
pub mod matrix;
pub mod scene;
pub mod token;

pub use context::ImportContext;
pub use cursor::{BeReader, BeWriter, BinaryReader, BinaryWriter, LeReader, LeWriter};
pub use error::{DataError, Result};
pub use index::{
    AdjunctIndex, ArenaIndex, BoneId, ColorIndex, MaterialId, MatrixSlot, NormalIndex,
    PointIndex, Pool, UvIndex, VertexId,
};
pub use scene::{
    Bone, BoneWeight, Corner, Decoded, Face, Material, Mesh, Skeleton, TextureRef, Vertex,
};
pub use token::TokenParser;

/// Write `bytes` to `path` only after encoding succeeded as a whole
pub fn save_bytes(path: impl AsRef<std::path::Path>, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)?;
    Ok(())
}
