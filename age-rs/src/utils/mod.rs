//! Shared utilities for the age-rs CLI

pub mod format;
pub mod mesh;
pub mod table;

pub use format::*;
pub use mesh::*;
pub use table::*;
