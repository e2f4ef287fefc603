//! Small helpers shared by the Angel Game Engine format crates.

pub mod debug;
