//! Exact-value hash keys for de-duplicating float tuples.
//!
//! Keys compare raw bit patterns with `-0.0` folded into `0.0` and every NaN
//! folded into one canonical NaN. Rounding, where wanted, is applied once up
//! front with [`round_decimals`].

use glam::{Vec2, Vec3, Vec4};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FloatKey<const N: usize>([u32; N]);

pub type Vec2Key = FloatKey<2>;
pub type Vec3Key = FloatKey<3>;
pub type Vec4Key = FloatKey<4>;

fn canonical_bits(value: f32) -> u32 {
    if value == 0.0 {
        0
    } else if value.is_nan() {
        f32::NAN.to_bits()
    } else {
        value.to_bits()
    }
}

impl<const N: usize> FloatKey<N> {
    pub fn new(values: [f32; N]) -> Self {
        Self(values.map(canonical_bits))
    }
}

impl From<Vec2> for Vec2Key {
    fn from(v: Vec2) -> Self {
        Self::new(v.to_array())
    }
}

impl From<Vec3> for Vec3Key {
    fn from(v: Vec3) -> Self {
        Self::new(v.to_array())
    }
}

impl From<Vec4> for Vec4Key {
    fn from(v: Vec4) -> Self {
        Self::new(v.to_array())
    }
}

/// Round every component to `places` decimal digits
pub fn round_decimals(v: Vec3, places: u32) -> Vec3 {
    let scale = 10f64.powi(places as i32);
    let round = |x: f32| ((f64::from(x) * scale).round() / scale) as f32;
    Vec3::new(round(v.x), round(v.y), round(v.z))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_zero_and_nan_are_folded() {
        assert_eq!(Vec3Key::from(Vec3::new(-0.0, 1.0, 0.0)), Vec3Key::from(Vec3::new(0.0, 1.0, -0.0)));
        assert_eq!(Vec2Key::new([f32::NAN, 1.0]), Vec2Key::new([-f32::NAN, 1.0]));
        assert_ne!(Vec2Key::new([1.0, 2.0]), Vec2Key::new([1.0, 2.000_001]));
    }

    #[test]
    fn rounding_absorbs_float_noise() {
        let a = round_decimals(Vec3::new(0.577_350_3, 0.0, 0.816_496_6), 6);
        let b = round_decimals(Vec3::new(0.577_350_2, 0.0, 0.816_496_8), 6);
        assert_eq!(Vec3Key::from(a), Vec3Key::from(b));
    }
}
