//! BBND, the binary twin of a BND file.
//!
//! ```text
//! u8 version (1)
//! u32 vertex count, u32 material count, u32 face count
//! f32 x 3 per vertex
//! materials  char[32] name, f32 elasticity, f32 friction, then
//!            1.01: char[32] effect, char[32] sound
//!            1.10: u16 0, u16 0
//! faces      u16 a, b, c, d, material; d is 0 for triangles
//! ```
//!
//! The file does not say which material layout it uses; [`parse`] picks the
//! one that accounts for the file size exactly.

use age_data::{LeReader, LeWriter};
use log::{debug, warn};

use crate::bound::{Bound, BoundFace, BoundMaterial};
use crate::error::{BndError, Result};
use crate::version::BndVersion;

pub const BBND_VERSION: u8 = 1;
pub const NAME_LEN: usize = 32;
const HEADER_SIZE: usize = 13;
const FACE_SIZE: usize = 10;

fn material_size(layout: BndVersion) -> usize {
    match layout {
        BndVersion::V1_01 => NAME_LEN + 8 + 2 * NAME_LEN,
        BndVersion::V1_10 => NAME_LEN + 8 + 4,
    }
}

fn to_u16(value: u32, what: &'static str) -> Result<u16> {
    u16::try_from(value).map_err(|_| BndError::TooMany {
        what,
        count: value as usize + 1,
    })
}

/// Material layout that makes the declared counts fill the file exactly
pub fn detect_layout(data: &[u8]) -> Result<BndVersion> {
    let mut reader = LeReader::new(data);
    reader.skip(1)?;
    let vertices = reader.read_u32()? as usize;
    let materials = reader.read_u32()? as usize;
    let faces = reader.read_u32()? as usize;
    let fixed = HEADER_SIZE + vertices * 12 + faces * FACE_SIZE;
    let layout = BndVersion::ALL
        .into_iter()
        .find(|&layout| fixed + materials * material_size(layout) == data.len())
        .unwrap_or_else(|| {
            warn!("BBND size {} matches no material layout; assuming 1.01", data.len());
            BndVersion::V1_01
        });
    Ok(layout)
}

/// Read a BBND file, detecting the material layout
pub fn parse(data: &[u8]) -> Result<Bound> {
    parse_as(data, detect_layout(data)?)
}

pub fn parse_as(data: &[u8], layout: BndVersion) -> Result<Bound> {
    let mut reader = LeReader::new(data);
    let version = reader.read_u8()?;
    if version != BBND_VERSION {
        return Err(BndError::UnsupportedVersion(format!("BBND version {version}")));
    }
    let vertex_count = reader.read_u32()? as usize;
    let material_count = reader.read_u32()? as usize;
    let face_count = reader.read_u32()? as usize;

    let mut bound = Bound::default();
    for _ in 0..vertex_count {
        bound.vertices.push(reader.read_vec3()?);
    }
    for _ in 0..material_count {
        let mut material = BoundMaterial::named(reader.read_fixed_str(NAME_LEN)?);
        material.elasticity = reader.read_f32()?;
        material.friction = reader.read_f32()?;
        match layout {
            BndVersion::V1_01 => {
                material.effect = reader.read_fixed_str(NAME_LEN)?;
                material.sound = reader.read_fixed_str(NAME_LEN)?;
            }
            BndVersion::V1_10 => reader.skip(4)?,
        }
        bound.materials.push(material);
    }
    for _ in 0..face_count {
        let [a, b, c, d, material] = [(); 5].map(|_| reader.read_u16());
        let (a, b, c, d, material) = (a?, b?, c?, d?, material?);
        let mut vertices = vec![u32::from(a), u32::from(b), u32::from(c)];
        if d != 0 {
            vertices.push(u32::from(d));
        }
        bound.faces.push(BoundFace {
            vertices,
            material: u32::from(material),
            edges: Vec::new(),
        });
    }
    if !reader.is_empty() {
        warn!("{} trailing bytes after BBND faces", reader.remaining());
    }

    debug!(
        "Parsed BBND ({layout} materials): {} vertices, {} materials, {} faces",
        bound.vertices.len(),
        bound.materials.len(),
        bound.faces.len()
    );
    Ok(bound)
}

/// Encode a bound. A quad whose last index is 0 would read back as a
/// triangle, so it is rotated to start with that vertex.
pub fn write(bound: &Bound, layout: BndVersion) -> Result<Vec<u8>> {
    bound.validate()?;
    if bound.vertices.len() > usize::from(u16::MAX) + 1 {
        return Err(BndError::TooMany {
            what: "vertices",
            count: bound.vertices.len(),
        });
    }

    let mut writer = LeWriter::new();
    writer.write_u8(BBND_VERSION);
    writer.write_u32(bound.vertices.len() as u32);
    writer.write_u32(bound.materials.len() as u32);
    writer.write_u32(bound.faces.len() as u32);

    for &v in &bound.vertices {
        writer.write_vec3(v);
    }
    for material in &bound.materials {
        writer.write_fixed_str(&material.name, NAME_LEN);
        writer.write_f32(material.elasticity);
        writer.write_f32(material.friction);
        match layout {
            BndVersion::V1_01 => {
                writer.write_fixed_str(&material.effect, NAME_LEN);
                writer.write_fixed_str(&material.sound, NAME_LEN);
            }
            BndVersion::V1_10 => writer.write_u16_slice(&[0, 0]),
        }
    }
    for face in &bound.faces {
        let mut indices = [0u32; 4];
        indices[..face.vertices.len()].copy_from_slice(&face.vertices);
        if face.is_quad() && indices[3] == 0 {
            indices = [indices[3], indices[0], indices[1], indices[2]];
        }
        for index in indices {
            writer.write_u16(to_u16(index, "vertices")?);
        }
        writer.write_u16(to_u16(face.material, "materials")?);
    }
    Ok(writer.into_inner())
}
