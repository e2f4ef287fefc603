//! Command implementations

pub mod bms;
pub mod bnd;
pub mod dlp;
pub mod model;
pub mod skel;
pub mod tex;
