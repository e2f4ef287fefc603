//! DLP7 layout. The magic is stored as little-endian `DLP7`; everything
//! after it is big endian.
//!
//! ```text
//! u32 group count, u32 patch count, u32 vertex count
//! groups     u8 name length, name, u32 vertex count, u32 patch count,
//!            u16 vertex indices, u16 patch indices
//! patches    u16 resolution, u16 stride, u16 reserved, u16 flags,
//!            u16 material, u16 texture, u16 physics,
//!            resolution * stride patch vertices,
//!            u32 user data length, user data
//! vertices   f32 x 3
//! materials  u32 count, 102 bytes each
//! textures   u32 count, 36 bytes each
//! ```
//!
//! Material, texture and physics references in patches are 1-based; 0 means
//! none. A physics section may follow the textures and is not decoded.

use age_data::{BeReader, LeReader};
use custom_debug::Debug;
use glam::{Vec2, Vec3, Vec4};
use log::debug;

use crate::error::{DlpError, Result};

/// `DLP7` read as a little-endian u32
pub const DLP_MAGIC: u32 = 0x3750_4C44;
/// Width of material and texture name fields
pub const NAME_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub struct DlpMaterial {
    pub name: String,
    pub emission: Vec4,
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub shininess: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DlpTexture {
    pub name: String,
    pub flags: u8,
}

/// Corner of a patch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DlpVertex {
    /// Position in the shared vertex table
    pub index: u16,
    pub normal: Vec3,
    /// Engine-space texture coordinate
    pub uv: Vec2,
    pub color: [u8; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub struct DlpPatch {
    pub resolution: u16,
    pub stride: u16,
    pub flags: u16,
    pub material: u16,
    pub texture: u16,
    pub physics: u16,
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub vertices: Vec<DlpVertex>,
    pub user_data: Option<String>,
}

impl DlpPatch {
    /// Single-row patches of three or more corners are plain polygons; the
    /// rest are curved surfaces
    pub fn is_polygon(&self) -> bool {
        self.stride == 1 && self.resolution >= 3
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DlpGroup {
    pub name: String,
    pub vertex_indices: Vec<u16>,
    pub patch_indices: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DlpFile {
    pub groups: Vec<DlpGroup>,
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub patches: Vec<DlpPatch>,
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub vertices: Vec<Vec3>,
    pub materials: Vec<DlpMaterial>,
    pub textures: Vec<DlpTexture>,
}

impl DlpFile {
    pub fn group(&self, name: &str) -> Result<&DlpGroup> {
        self.groups
            .iter()
            .find(|group| group.name == name)
            .ok_or_else(|| DlpError::GroupNotFound(name.to_owned()))
    }

    pub fn polygon_count(&self) -> usize {
        self.patches.iter().filter(|patch| patch.is_polygon()).count()
    }
}

fn read_count(reader: &mut BeReader<'_>) -> Result<usize> {
    Ok(reader.read_u32()? as usize)
}

fn read_group(reader: &mut BeReader<'_>) -> Result<DlpGroup> {
    let name = reader.read_u8_str()?;
    let vertex_count = read_count(reader)?;
    let patch_count = read_count(reader)?;
    Ok(DlpGroup {
        name,
        vertex_indices: reader.read_u16_array(vertex_count)?,
        patch_indices: reader.read_u16_array(patch_count)?,
    })
}

fn read_vertex(reader: &mut BeReader<'_>) -> Result<DlpVertex> {
    Ok(DlpVertex {
        index: reader.read_u16()?,
        normal: reader.read_vec3()?,
        uv: reader.read_vec2()?,
        color: reader.read_array()?,
    })
}

fn read_patch(reader: &mut BeReader<'_>) -> Result<DlpPatch> {
    let resolution = reader.read_u16()?;
    let stride = reader.read_u16()?;
    reader.skip(2)?;
    let flags = reader.read_u16()?;
    let material = reader.read_u16()?;
    let texture = reader.read_u16()?;
    let physics = reader.read_u16()?;
    let count = usize::from(resolution) * usize::from(stride);
    let vertices = (0..count)
        .map(|_| read_vertex(reader))
        .collect::<Result<Vec<_>>>()?;
    let user_len = read_count(reader)?;
    let user_data = if user_len > 0 {
        Some(reader.read_fixed_str(user_len)?)
    } else {
        None
    };
    Ok(DlpPatch {
        resolution,
        stride,
        flags,
        material,
        texture,
        physics,
        vertices,
        user_data,
    })
}

fn read_material(reader: &mut BeReader<'_>) -> Result<DlpMaterial> {
    let material = DlpMaterial {
        name: reader.read_fixed_str(NAME_LEN)?,
        emission: reader.read_vec4()?,
        ambient: reader.read_vec4()?,
        diffuse: reader.read_vec4()?,
        specular: reader.read_vec4()?,
        shininess: reader.read_f32()?,
    };
    reader.skip(2)?;
    Ok(material)
}

fn read_texture(reader: &mut BeReader<'_>) -> Result<DlpTexture> {
    let texture = DlpTexture {
        name: reader.read_fixed_str(NAME_LEN)?,
        flags: reader.read_u8()?,
    };
    reader.skip(3)?;
    Ok(texture)
}

fn read_list<T>(
    reader: &mut BeReader<'_>,
    count: usize,
    read: impl Fn(&mut BeReader<'_>) -> Result<T>,
) -> Result<Vec<T>> {
    (0..count).map(|_| read(reader)).collect()
}

pub fn parse(data: &[u8]) -> Result<DlpFile> {
    let mut magic_reader = LeReader::new(data);
    let magic = magic_reader.read_u32()?;
    if magic != DLP_MAGIC {
        return Err(DlpError::MalformedHeader(format!(
            "expected DLP7, found {:?}",
            String::from_utf8_lossy(&magic.to_le_bytes())
        )));
    }
    let mut reader: BeReader<'_> = magic_reader.with_order();

    let group_count = read_count(&mut reader)?;
    let patch_count = read_count(&mut reader)?;
    let vertex_count = read_count(&mut reader)?;
    debug!("DLP7: {group_count} groups, {patch_count} patches, {vertex_count} vertices");

    let groups = read_list(&mut reader, group_count, read_group)?;
    let patches = read_list(&mut reader, patch_count, read_patch)?;
    let vertices = read_list(&mut reader, vertex_count, |r| Ok(r.read_vec3()?))?;
    let material_count = read_count(&mut reader)?;
    let materials = read_list(&mut reader, material_count, read_material)?;
    let texture_count = read_count(&mut reader)?;
    let textures = read_list(&mut reader, texture_count, read_texture)?;

    if !reader.is_empty() {
        debug!("Ignoring {} bytes of physics data", reader.remaining());
    }
    Ok(DlpFile {
        groups,
        patches,
        vertices,
        materials,
        textures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use age_data::BeWriter;
    use pretty_assertions::assert_eq;

    fn header(writer: &mut BeWriter, groups: u32, patches: u32, vertices: u32) {
        writer.write_bytes(b"DLP7");
        writer.write_u32(groups);
        writer.write_u32(patches);
        writer.write_u32(vertices);
    }

    /// One group holding one triangle patch, one material, one texture
    fn triangle() -> Vec<u8> {
        let mut w = BeWriter::new();
        header(&mut w, 1, 1, 3);

        w.write_u8(4);
        w.write_bytes(b"body");
        w.write_u32(3);
        w.write_u32(1);
        w.write_u16_slice(&[0, 1, 2]);
        w.write_u16_slice(&[0]);

        w.write_u16(3);
        w.write_u16(1);
        w.write_u16(0);
        w.write_u16(0x0010);
        w.write_u16(1);
        w.write_u16(1);
        w.write_u16(0);
        for index in 0..3u16 {
            w.write_u16(index);
            w.write_vec3(Vec3::Y);
            w.write_vec2(Vec2::new(f32::from(index), 0.5));
            w.write_bytes(&[255, 128, 0, 255]);
        }
        w.write_u32(5);
        w.write_bytes(b"tag\0\0");

        w.write_vec3(Vec3::ZERO);
        w.write_vec3(Vec3::X);
        w.write_vec3(Vec3::Z);

        w.write_u32(1);
        w.write_fixed_str("paint", NAME_LEN);
        w.write_vec4(Vec4::ZERO);
        w.write_vec4(Vec4::splat(0.2));
        w.write_vec4(Vec4::new(1.0, 0.0, 0.0, 1.0));
        w.write_vec4(Vec4::ONE);
        w.write_f32(12.0);
        w.write_u16(0);

        w.write_u32(1);
        w.write_fixed_str("rust", NAME_LEN);
        w.write_bytes(&[2, 0, 0, 0]);
        w.into_inner()
    }

    #[test]
    fn reads_every_section() {
        let file = parse(&triangle()).unwrap();
        assert_eq!(
            file.groups,
            vec![DlpGroup {
                name: "body".to_owned(),
                vertex_indices: vec![0, 1, 2],
                patch_indices: vec![0],
            }]
        );
        let patch = &file.patches[0];
        assert_eq!((patch.resolution, patch.stride, patch.flags), (3, 1, 0x10));
        assert_eq!((patch.material, patch.texture, patch.physics), (1, 1, 0));
        assert_eq!(patch.vertices[2].uv, Vec2::new(2.0, 0.5));
        assert_eq!(patch.vertices[1].color, [255, 128, 0, 255]);
        assert_eq!(patch.user_data.as_deref(), Some("tag"));
        assert_eq!(file.vertices, vec![Vec3::ZERO, Vec3::X, Vec3::Z]);
        assert_eq!(file.materials[0].name, "paint");
        assert_eq!(file.materials[0].shininess, 12.0);
        assert_eq!(
            file.textures,
            vec![DlpTexture {
                name: "rust".to_owned(),
                flags: 2,
            }]
        );
        assert_eq!(file.polygon_count(), 1);
    }

    #[test]
    fn body_is_big_endian() {
        let bytes = triangle();
        // group count follows the magic, most significant byte first
        assert_eq!(&bytes[4..8], &[0, 0, 0, 1]);
        assert_eq!(parse(&bytes).unwrap().groups.len(), 1);
    }

    #[test]
    fn other_magics_are_rejected() {
        let mut bytes = triangle();
        bytes[3] = b'6';
        assert!(matches!(parse(&bytes), Err(DlpError::MalformedHeader(_))));
    }

    #[test]
    fn truncation_is_reported() {
        let bytes = triangle();
        assert!(matches!(
            parse(&bytes[..bytes.len() - 10]),
            Err(DlpError::Data(age_data::DataError::Truncated { .. }))
        ));
    }

    #[test]
    fn trailing_physics_is_ignored() {
        let mut bytes = triangle();
        bytes.extend_from_slice(&[0, 0, 0, 4, 1, 2, 3, 4]);
        assert_eq!(parse(&bytes).unwrap(), parse(&triangle()).unwrap());
    }

    #[test]
    fn groups_are_found_by_name() {
        let file = parse(&triangle()).unwrap();
        assert_eq!(file.group("body").unwrap().patch_indices, vec![0]);
        assert!(matches!(file.group("wheel"), Err(DlpError::GroupNotFound(_))));
    }
}
