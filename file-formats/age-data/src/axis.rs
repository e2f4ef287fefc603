//! Host (Z up) to engine (Y up, X mirrored) conversion.
//!
//! Both mappings are their own inverse, so the same function serves import
//! and export; the two names only document direction at call sites.

use glam::{Vec2, Vec3};

pub fn to_engine(v: Vec3) -> Vec3 {
    Vec3::new(-v.x, v.z, v.y)
}

pub fn from_engine(v: Vec3) -> Vec3 {
    to_engine(v)
}

/// Extents are not mirrored, only swizzled
pub fn size_to_engine(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, v.y)
}

pub fn uv_to_engine(uv: Vec2) -> Vec2 {
    Vec2::new(uv.x, 1.0 - uv.y)
}

pub fn uv_from_engine(uv: Vec2) -> Vec2 {
    uv_to_engine(uv)
}
