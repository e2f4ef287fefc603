//! `.mtx` object placement files.
//!
//! Newer games store a 3x4 transform: twelve little-endian floats holding the
//! three basis columns and then the translation, all in engine space. Older
//! games reuse the same 48 bytes for an engine-space bounding box followed by
//! the pivot and origin points ([`BoundsMatrix`]).

use std::path::Path;

use glam::{Mat3, Mat4, Vec3};
use log::warn;

use crate::axis::{from_engine, to_engine};
use crate::cursor::{LeReader, LeWriter};
use crate::error::Result;

pub const MATRIX_SIZE: usize = 48;

/// Carry a host transform into engine space. Applying it twice gives the
/// input back, so it also serves import.
pub fn matrix_to_engine(matrix: Mat4) -> Mat4 {
    let axes = Mat4::from_mat3(Mat3::from_cols(
        to_engine(Vec3::X),
        to_engine(Vec3::Y),
        to_engine(Vec3::Z),
    ));
    axes * matrix * axes
}

pub fn matrix_from_engine(matrix: Mat4) -> Mat4 {
    matrix_to_engine(matrix)
}

fn read_vectors(data: &[u8]) -> Result<[Vec3; 4]> {
    let mut reader = LeReader::new(data);
    let vectors = [
        reader.read_vec3()?,
        reader.read_vec3()?,
        reader.read_vec3()?,
        reader.read_vec3()?,
    ];
    if !reader.is_empty() {
        warn!("Ignoring {} bytes after the matrix", reader.remaining());
    }
    Ok(vectors)
}

fn write_vectors(vectors: [Vec3; 4]) -> Vec<u8> {
    let mut writer = LeWriter::new();
    for v in vectors {
        writer.write_vec3(v);
    }
    writer.into_inner()
}

/// Decode a 3x4 transform into a host-space matrix
pub fn parse_matrix3x4(data: &[u8]) -> Result<Mat4> {
    let [x, y, z, translation] = read_vectors(data)?;
    let engine = Mat4::from_cols(
        x.extend(0.0),
        y.extend(0.0),
        z.extend(0.0),
        translation.extend(1.0),
    );
    Ok(matrix_from_engine(engine))
}

/// Encode a host-space transform. The projective row is dropped.
pub fn write_matrix3x4(matrix: &Mat4) -> Vec<u8> {
    let engine = matrix_to_engine(*matrix);
    write_vectors([
        engine.x_axis.truncate(),
        engine.y_axis.truncate(),
        engine.z_axis.truncate(),
        engine.w_axis.truncate(),
    ])
}

pub fn load_matrix3x4(path: impl AsRef<Path>) -> Result<Mat4> {
    parse_matrix3x4(&std::fs::read(path)?)
}

pub fn save_matrix3x4(path: impl AsRef<Path>, matrix: &Mat4) -> Result<()> {
    crate::save_bytes(path, &write_matrix3x4(matrix))
}

/// Legacy placement record, host space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsMatrix {
    pub min: Vec3,
    pub max: Vec3,
    pub pivot: Vec3,
    pub origin: Vec3,
}

impl BoundsMatrix {
    /// Record for an object whose local bounds are `min..max` placed at `origin`
    pub fn new(min: Vec3, max: Vec3, origin: Vec3) -> Self {
        Self {
            min,
            max,
            pivot: origin,
            origin,
        }
    }

    /// Mirroring X swaps which corner is the minimum, so the box is
    /// re-ordered on both sides of the conversion
    pub fn parse(data: &[u8]) -> Result<Self> {
        let [a, b, pivot, origin] = read_vectors(data)?.map(from_engine);
        Ok(Self {
            min: a.min(b),
            max: a.max(b),
            pivot,
            origin,
        })
    }

    pub fn write(&self) -> Vec<u8> {
        let a = to_engine(self.min);
        let b = to_engine(self.max);
        write_vectors([a.min(b), a.max(b), to_engine(self.pivot), to_engine(self.origin)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DataError;
    use glam::Quat;
    use pretty_assertions::assert_eq;

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    #[test]
    fn identity_writes_identity_basis() {
        let bytes = write_matrix3x4(&Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(bytes.len(), MATRIX_SIZE);
        assert_eq!(
            floats(&bytes),
            vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, -1.0, 3.0, 2.0]
        );
    }

    #[test]
    fn engine_matrix_moves_engine_points() {
        let host = Mat4::from_scale_rotation_translation(
            Vec3::new(1.0, 2.0, 0.5),
            Quat::from_rotation_z(0.7) * Quat::from_rotation_x(-0.3),
            Vec3::new(4.0, -2.0, 9.0),
        );
        let engine = matrix_to_engine(host);
        let point = Vec3::new(0.25, -3.0, 1.5);
        let expected = to_engine(host.transform_point3(point));
        assert!(
            engine
                .transform_point3(to_engine(point))
                .abs_diff_eq(expected, 1e-5)
        );

        let restored = parse_matrix3x4(&write_matrix3x4(&host)).unwrap();
        assert!(restored.abs_diff_eq(host, 1e-6));
    }

    #[test]
    fn short_matrices_are_truncated() {
        assert!(matches!(
            parse_matrix3x4(&[0u8; 40]),
            Err(DataError::Truncated { .. })
        ));
    }

    #[test]
    fn bounds_matrix_keeps_min_below_max() {
        let record = BoundsMatrix::new(
            Vec3::new(-1.0, -2.0, 0.0),
            Vec3::new(3.0, 2.0, 5.0),
            Vec3::new(10.0, 20.0, 1.0),
        );
        let bytes = record.write();
        assert_eq!(
            floats(&bytes),
            vec![
                -3.0, 0.0, -2.0, 1.0, 5.0, 2.0, -10.0, 1.0, 20.0, -10.0, 1.0, 20.0
            ]
        );
        assert_eq!(BoundsMatrix::parse(&bytes).unwrap(), record);
    }
}
