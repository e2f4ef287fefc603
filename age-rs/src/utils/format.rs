//! Formatting utilities

use std::path::Path;

use glam::{Vec3, Vec4};
use humansize::{DECIMAL, format_size};

/// Format file size in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

/// Size of a file on disk, or "N/A" when it cannot be read
pub fn file_size(path: &Path) -> String {
    std::fs::metadata(path)
        .map(|meta| format_bytes(meta.len()))
        .unwrap_or_else(|_| "N/A".to_string())
}

pub fn format_vec3(v: Vec3) -> String {
    format!("({:.3}, {:.3}, {:.3})", v.x, v.y, v.z)
}

/// RGBA color with each channel in 0..=1
pub fn format_color(c: Vec4) -> String {
    format!("({:.2}, {:.2}, {:.2}, {:.2})", c.x, c.y, c.z, c.w)
}
