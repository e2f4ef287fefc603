//! BMS binary layout.
//!
//! ```text
//! u32        magic "3HSM"
//! vec3       offset
//! u32 x4     points, adjuncts, surfaces, indices
//! f32 x3     radius, radius squared, box radius
//! u8, u8     texture count, flags
//! u16        padding
//! u32        cache size hint
//! 48 bytes   per texture
//! vec3       per point
//! vec3 x8    bounding box, only with 16 or more points
//! u8         per adjunct normal index      (flag NORMALS)
//! vec2       per adjunct uv                (flag UVS)
//! u8 x4      per adjunct BGRA color        (flag COLORS)
//! u16        per adjunct point index
//! vec4       per surface plane             (flag PLANES)
//! u8         per surface texture, 0 = none
//! u16 x4     per surface indices, 4th = 0 for triangles
//! ```
//!
//! Everything is little endian and in engine space.

use age_data::{LeReader, LeWriter};
use custom_debug::Debug;
use glam::{Vec2, Vec3, Vec4};
use log::debug;

use crate::error::{BmsError, Result};
use crate::flags::{MeshFlags, TextureFlags, TextureProps};

/// `"3HSM"` read as a little endian u32
pub const BMS_MAGIC: u32 = 0x4D53_4833;

/// Width of a texture name field
pub const TEXTURE_NAME_LEN: usize = 32;

/// Bounding boxes are stored only for meshes with at least this many points
pub const BBOX_MIN_POINTS: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct BmsTexture {
    pub name: String,
    pub flags: TextureFlags,
    pub props: TextureProps,
    /// 4.0 on snowable surfaces, 2.0 otherwise
    pub param: f32,
    pub color_bgra: [u8; 4],
}

/// Four surface indices; the last is 0 for a triangle
pub type Surface = [u16; 4];

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BmsFile {
    pub offset: Vec3,
    pub radius: f32,
    pub radius_squared: f32,
    pub box_radius: f32,
    pub flags: MeshFlags,
    pub cache_size: u32,
    pub textures: Vec<BmsTexture>,
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub points: Vec<Vec3>,
    pub bbox: Option<[Vec3; 8]>,
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub normals: Vec<u8>,
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub uvs: Vec<Vec2>,
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub colors: Vec<[u8; 4]>,
    /// Point referenced by each adjunct
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub adjunct_points: Vec<u16>,
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub planes: Vec<Vec4>,
    /// Texture of each surface, 1-based, 0 = none
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub surface_textures: Vec<u8>,
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub surfaces: Vec<Surface>,
}

impl BmsFile {
    pub fn adjunct_count(&self) -> usize {
        self.adjunct_points.len()
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Byte size the engine reserves for the mesh body
    pub fn compute_cache_size(&self) -> u32 {
        let points = self.points.len();
        let adjuncts = self.adjunct_count();
        let surfaces = self.surface_count();
        let mut size = 12 * points;
        if points >= BBOX_MIN_POINTS {
            size += 12 * 8;
        }
        if self.flags.contains(MeshFlags::NORMALS) {
            size += 12 * adjuncts;
        }
        if self.flags.contains(MeshFlags::UVS) {
            size += 8 * adjuncts;
        }
        if self.flags.contains(MeshFlags::COLORS) {
            size += 4 * adjuncts;
        }
        if self.flags.contains(MeshFlags::PLANES) {
            size += 16 * surfaces;
        }
        size += 2 * adjuncts + surfaces + 2 * 4 * surfaces;
        size as u32
    }

    /// Check that every channel matches the counts the header will declare
    pub fn validate(&self) -> Result<()> {
        let adjuncts = self.adjunct_count();
        let surfaces = self.surface_count();
        let channel = |flag: MeshFlags, len: usize, what: &str, per: usize| {
            let expected = if self.flags.contains(flag) { per } else { 0 };
            if len != expected {
                return Err(BmsError::Inconsistent(format!(
                    "{what} holds {len} entries, expected {expected}"
                )));
            }
            Ok(())
        };
        channel(MeshFlags::NORMALS, self.normals.len(), "normal channel", adjuncts)?;
        channel(MeshFlags::UVS, self.uvs.len(), "uv channel", adjuncts)?;
        channel(MeshFlags::COLORS, self.colors.len(), "color channel", adjuncts)?;
        channel(MeshFlags::PLANES, self.planes.len(), "plane list", surfaces)?;

        if self.surface_textures.len() != surfaces {
            return Err(BmsError::Inconsistent(format!(
                "{} surface textures for {surfaces} surfaces",
                self.surface_textures.len()
            )));
        }
        if self.bbox.is_some() != (self.points.len() >= BBOX_MIN_POINTS) {
            return Err(BmsError::Inconsistent(format!(
                "bounding box presence does not match {} points",
                self.points.len()
            )));
        }
        if self.textures.len() > usize::from(u8::MAX) {
            return Err(BmsError::TooManyTextures(self.textures.len()));
        }
        if adjuncts > usize::from(u16::MAX) {
            return Err(BmsError::TooManyAdjuncts(adjuncts));
        }
        Ok(())
    }
}

fn check_magic(magic: [u8; 4]) -> Result<()> {
    if u32::from_le_bytes(magic) == BMS_MAGIC {
        return Ok(());
    }
    if &magic[1..] == b"HSM" {
        return Err(BmsError::UnsupportedVersion(format!(
            "static mesh revision '{}'",
            char::from(magic[0])
        )));
    }
    Err(BmsError::MalformedHeader(format!(
        "bad magic {magic:02x?}, expected \"3HSM\""
    )))
}

pub fn parse(data: &[u8]) -> Result<BmsFile> {
    let mut reader = LeReader::new(data);
    check_magic(reader.read_array()?)?;

    let offset = reader.read_vec3()?;
    let num_points = reader.read_u32()? as usize;
    let num_adjuncts = reader.read_u32()? as usize;
    let num_surfaces = reader.read_u32()? as usize;
    let num_indices = reader.read_u32()? as usize;
    if num_indices != num_surfaces * 4 {
        return Err(BmsError::Inconsistent(format!(
            "{num_indices} indices for {num_surfaces} surfaces"
        )));
    }
    let radius = reader.read_f32()?;
    let radius_squared = reader.read_f32()?;
    let box_radius = reader.read_f32()?;
    let num_textures = reader.read_u8()?;
    let flags = MeshFlags::from_bits_retain(reader.read_u8()?);
    reader.skip(2)?;
    let cache_size = reader.read_u32()?;

    let mut textures = Vec::with_capacity(usize::from(num_textures));
    for _ in 0..num_textures {
        let name = reader.read_fixed_str(TEXTURE_NAME_LEN)?;
        let texture_flags = TextureFlags::from_bits_retain(reader.read_u8()?);
        reader.skip(3)?;
        textures.push(BmsTexture {
            name,
            flags: texture_flags,
            props: TextureProps::from_bits_retain(reader.read_u32()?),
            param: reader.read_f32()?,
            color_bgra: reader.read_array()?,
        });
    }

    let points = (0..num_points)
        .map(|_| reader.read_vec3())
        .collect::<age_data::Result<Vec<_>>>()?;
    let bbox = if num_points >= BBOX_MIN_POINTS {
        let mut corners = [Vec3::ZERO; 8];
        for corner in &mut corners {
            *corner = reader.read_vec3()?;
        }
        Some(corners)
    } else {
        None
    };

    let normals = if flags.contains(MeshFlags::NORMALS) {
        reader.read_bytes(num_adjuncts)?.to_vec()
    } else {
        Vec::new()
    };
    let uvs = if flags.contains(MeshFlags::UVS) {
        (0..num_adjuncts)
            .map(|_| reader.read_vec2())
            .collect::<age_data::Result<Vec<_>>>()?
    } else {
        Vec::new()
    };
    let colors = if flags.contains(MeshFlags::COLORS) {
        (0..num_adjuncts)
            .map(|_| reader.read_array::<4>())
            .collect::<age_data::Result<Vec<_>>>()?
    } else {
        Vec::new()
    };
    let adjunct_points = reader.read_u16_array(num_adjuncts)?;
    let planes = if flags.contains(MeshFlags::PLANES) {
        (0..num_surfaces)
            .map(|_| reader.read_vec4())
            .collect::<age_data::Result<Vec<_>>>()?
    } else {
        Vec::new()
    };
    let surface_textures = reader.read_bytes(num_surfaces)?.to_vec();
    let surfaces = reader
        .read_u16_array(num_indices)?
        .chunks_exact(4)
        .map(|quad| [quad[0], quad[1], quad[2], quad[3]])
        .collect();

    if !reader.is_empty() {
        debug!("{} trailing bytes after static mesh", reader.remaining());
    }
    debug!(
        "Parsed BMS: {num_points} points, {num_adjuncts} adjuncts, {num_surfaces} surfaces, {num_textures} textures, flags {flags:?}"
    );

    Ok(BmsFile {
        offset,
        radius,
        radius_squared,
        box_radius,
        flags,
        cache_size,
        textures,
        points,
        bbox,
        normals,
        uvs,
        colors,
        adjunct_points,
        planes,
        surface_textures,
        surfaces,
    })
}

pub fn write(file: &BmsFile) -> Result<Vec<u8>> {
    file.validate()?;
    let mut writer = LeWriter::new();

    writer.write_u32(BMS_MAGIC);
    writer.write_vec3(file.offset);
    writer.write_u32(file.points.len() as u32);
    writer.write_u32(file.adjunct_count() as u32);
    writer.write_u32(file.surface_count() as u32);
    writer.write_u32((file.surface_count() * 4) as u32);
    writer.write_f32(file.radius);
    writer.write_f32(file.radius_squared);
    writer.write_f32(file.box_radius);
    writer.write_u8(file.textures.len() as u8);
    writer.write_u8(file.flags.bits());
    writer.write_u16(0);
    writer.write_u32(file.cache_size);

    for texture in &file.textures {
        writer.write_fixed_str(&texture.name, TEXTURE_NAME_LEN);
        writer.write_bytes(&[texture.flags.bits(), 0, 0, 0]);
        writer.write_u32(texture.props.bits());
        writer.write_f32(texture.param);
        writer.write_bytes(&texture.color_bgra);
    }

    for &point in &file.points {
        writer.write_vec3(point);
    }
    for &corner in file.bbox.iter().flatten() {
        writer.write_vec3(corner);
    }
    writer.write_bytes(&file.normals);
    for &uv in &file.uvs {
        writer.write_vec2(uv);
    }
    for color in &file.colors {
        writer.write_bytes(color);
    }
    writer.write_u16_slice(&file.adjunct_points);
    for &plane in &file.planes {
        writer.write_vec4(plane);
    }
    writer.write_bytes(&file.surface_textures);
    for surface in &file.surfaces {
        writer.write_u16_slice(surface);
    }

    Ok(writer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn single_triangle() -> BmsFile {
        let mut file = BmsFile {
            flags: MeshFlags::NORMALS | MeshFlags::UVS | MeshFlags::PLANES,
            textures: vec![BmsTexture {
                name: "road".to_owned(),
                flags: TextureFlags::WRAP,
                props: TextureProps::empty(),
                param: 2.0,
                color_bgra: [255, 255, 255, 255],
            }],
            points: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            normals: vec![0, 0, 0],
            uvs: vec![Vec2::ZERO, Vec2::X, Vec2::Y],
            adjunct_points: vec![0, 1, 2],
            planes: vec![Vec4::new(0.0, 0.0, 1.0, 0.0)],
            surface_textures: vec![1],
            surfaces: vec![[0, 1, 2, 0]],
            ..BmsFile::default()
        };
        file.cache_size = file.compute_cache_size();
        file
    }

    #[test]
    fn header_layout() {
        let bytes = write(&single_triangle()).unwrap();
        assert_eq!(&bytes[..4], b"3HSM");
        // 4 + 12 + 16 + 12 + 4 + 4 header bytes, then the texture entry
        assert_eq!(&bytes[52..56], b"road");
        assert_eq!(bytes[84], TextureFlags::WRAP.bits());
        let expected = 52 + 48 + 3 * 12 + 3 + 3 * 8 + 3 * 2 + 16 + 1 + 8;
        assert_eq!(bytes.len(), expected);
    }

    #[test]
    fn writes_what_it_reads() {
        let file = single_triangle();
        let bytes = write(&file).unwrap();
        let parsed = parse(&bytes).unwrap();
        assert_eq!(parsed, file);
        assert_eq!(write(&parsed).unwrap(), bytes);
    }

    #[test]
    fn cache_size_counts_enabled_channels() {
        let file = single_triangle();
        // points, normals, uvs, adjunct indices, planes, textures, indices
        assert_eq!(file.compute_cache_size(), 36 + 36 + 24 + 6 + 16 + 1 + 8);
    }

    #[test]
    fn other_revisions_are_unsupported() {
        let mut bytes = write(&single_triangle()).unwrap();
        bytes[0] = b'2';
        assert!(matches!(parse(&bytes), Err(BmsError::UnsupportedVersion(_))));
        bytes[..4].copy_from_slice(b"DLP7");
        assert!(matches!(parse(&bytes), Err(BmsError::MalformedHeader(_))));
    }

    #[test]
    fn truncated_bodies_fail() {
        let bytes = write(&single_triangle()).unwrap();
        assert!(matches!(
            parse(&bytes[..bytes.len() - 1]),
            Err(BmsError::Data(age_data::DataError::Truncated { .. }))
        ));
    }

    #[test]
    fn oversized_point_counts_fail_cleanly() {
        let mut bytes = write(&single_triangle()).unwrap();
        bytes[16..20].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            parse(&bytes),
            Err(BmsError::Data(age_data::DataError::Truncated { .. }))
        ));
    }

    #[test]
    fn mismatched_channels_are_rejected_before_writing() {
        let mut file = single_triangle();
        file.uvs.pop();
        assert!(matches!(write(&file), Err(BmsError::Inconsistent(_))));
    }
}
