//! Age-RS library
//!
//! Command implementations behind the `age-rs` binary.

pub mod cli;
pub mod commands;
pub mod utils;
