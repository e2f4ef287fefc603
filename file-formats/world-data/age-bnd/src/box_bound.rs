//! Box bounds: the `type: box` flavor of BND text written per scene object.
//!
//! ```text
//! version: 1.10
//! type: box
//!
//! size: 2.000000 1.000000 4.000000
//! centroid: 0.000000 0.500000 0.000000
//!
//! materials: 1
//! type: BASE
//! mtl default {
//! 	elasticity: 0.100000
//! 	friction: 0.500000
//! }
//! ```

use std::fmt::Write;

use age_data::axis::{size_to_engine, to_engine};
use age_data::{Mesh, TokenParser};
use glam::Vec3;

use crate::bound::BoundMaterial;
use crate::error::{BndError, Result};
use crate::text::{parse_error, read_material, read_type, read_version};
use crate::version::BndVersion;

/// Lines searched for each box field
const FIELD_GAP: usize = 8;

/// Axis-aligned collision box in engine space
#[derive(Debug, Clone, PartialEq)]
pub struct BoxBound {
    pub size: Vec3,
    /// Box center relative to the object origin
    pub centroid: Vec3,
    pub material: BoundMaterial,
}

impl BoxBound {
    /// Box around the mesh's local vertices. `None` for a mesh without vertices.
    pub fn from_mesh(mesh: &Mesh) -> Option<Self> {
        let mut positions = mesh.vertices.values().map(|v| v.position);
        let first = positions.next()?;
        let (min, max) = positions.fold((first, first), |(min, max), p| {
            (min.min(p), max.max(p))
        });
        Some(Self {
            size: size_to_engine(max - min),
            centroid: to_engine((min + max) * 0.5),
            material: BoundMaterial::named("default"),
        })
    }
}

pub fn parse(text: &str) -> Result<BoxBound> {
    let mut parser = TokenParser::new(text);
    let version = read_version(&mut parser)?;
    if version != BndVersion::V1_10 {
        return Err(BndError::UnsupportedVersion(format!("{version} has no box bounds")));
    }
    match read_type(&mut parser)?.as_deref() {
        Some("box") => {}
        Some(other) => return Err(BndError::UnsupportedType(other.to_owned())),
        None => return Err(BndError::MalformedHeader("no bound type".to_owned())),
    }

    let mut field = |name: &str| -> Result<Vec3> {
        if !parser.skip_to(name, Some(FIELD_GAP)) {
            return Err(parse_error(&parser, "missing box field", &[name.to_owned()]).into());
        }
        Ok(Vec3::from_array(parser.read_floats::<3>()?))
    };
    let size = field("size:")?;
    let centroid = field("centroid:")?;

    let material = if parser.skip_to("mtl", Some(FIELD_GAP)) {
        read_material(&mut parser)?
    } else {
        BoundMaterial::named("default")
    };
    Ok(BoxBound {
        size,
        centroid,
        material,
    })
}

pub fn write(bound: &BoxBound) -> String {
    let BoxBound {
        size,
        centroid,
        material,
    } = bound;
    let mut out = String::new();
    let _ = writeln!(out, "version: {}", BndVersion::V1_10);
    out.push_str("type: box\n\n");
    let _ = writeln!(out, "size: {:.6} {:.6} {:.6}", size.x, size.y, size.z);
    let _ = writeln!(
        out,
        "centroid: {:.6} {:.6} {:.6}\n",
        centroid.x, centroid.y, centroid.z
    );
    out.push_str("materials: 1\ntype: BASE\n");
    let _ = writeln!(out, "mtl {} {{", material.name);
    let _ = writeln!(out, "\telasticity: {:.6}", material.elasticity);
    let _ = writeln!(out, "\tfriction: {:.6}", material.friction);
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use age_data::DataError;
    use pretty_assertions::assert_eq;

    #[test]
    fn box_follows_the_mesh_extents() {
        let mut mesh = Mesh::new("crate");
        mesh.origin = Vec3::new(50.0, 50.0, 0.0);
        mesh.add_vertex(Vec3::new(-1.0, 0.0, 0.0), Vec3::Z);
        mesh.add_vertex(Vec3::new(3.0, 4.0, 2.0), Vec3::Z);

        let bound = BoxBound::from_mesh(&mesh).unwrap();
        assert_eq!(bound.size, Vec3::new(4.0, 2.0, 4.0));
        assert_eq!(bound.centroid, Vec3::new(-1.0, 1.0, 2.0));
        assert_eq!(
            write(&bound),
            "version: 1.10
type: box

size: 4.000000 2.000000 4.000000
centroid: -1.000000 1.000000 2.000000

materials: 1
type: BASE
mtl default {
\telasticity: 0.100000
\tfriction: 0.500000
}
"
        );
        assert_eq!(parse(&write(&bound)).unwrap(), bound);
        assert_eq!(BoxBound::from_mesh(&Mesh::new("empty")), None);
    }

    #[test]
    fn geometry_and_box_readers_stay_apart() {
        let text = write(&BoxBound {
            size: Vec3::ONE,
            centroid: Vec3::ZERO,
            material: BoundMaterial::named("wood"),
        });
        assert!(matches!(
            crate::text::parse(&text),
            Err(BndError::UnsupportedType(kind)) if kind == "box"
        ));
        assert!(matches!(
            parse("version: 1.10\ntype: geometry\n"),
            Err(BndError::UnsupportedType(kind)) if kind == "geometry"
        ));
        assert!(matches!(
            parse("version: 1.10\ntype: box\n\ncentroid: 0 0 0\n"),
            Err(BndError::Data(DataError::Parse { .. }))
        ));
    }
}
