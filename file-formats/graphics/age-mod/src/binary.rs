//! Binary driver for MOD versions 2.00, 2.10 and 2.12.
//!
//! Layout (little endian):
//! - 13 byte version tag `version: X.YY` and a NUL
//! - `u32` counts: verts, normals, colors, tex1s, tex2s, tangents,
//!   materials, adjuncts, primitives, matrices, then reskins from 2.10
//! - `f32` pools in the same order as the text format
//! - material headers: name, `u16` packets, `u16` primitives, `u8`
//!   textures, `u8` illumination, ambient/diffuse/specular, texture names,
//!   and from 2.12 a typed attribute list
//! - packets in material order; index fields are `u32` in 2.00 and `u16`
//!   afterwards
//! - `mtxv` and `mtxn`, each a `u32` count followed by `u32` values

use age_data::{AdjunctIndex, LeReader, LeWriter};
use log::debug;

use crate::error::{ModError, Result};
use crate::file::{
    Adjunct, Attribute, AttributeValue, Illumination, MaterialGeometry, ModFile, ModMaterial,
    Packet, Primitive,
};
use crate::version::{FormatVersion, Layout};

pub const TAG_LEN: usize = 13;
const TAG_PREFIX: &[u8] = b"version: ";

/// Whether `data` starts with a binary version tag
pub fn is_binary(data: &[u8]) -> bool {
    data.len() > TAG_LEN && data.starts_with(TAG_PREFIX) && data[TAG_LEN] == 0
}

fn read_version(reader: &mut LeReader<'_>) -> Result<FormatVersion> {
    let tag = reader.read_bytes(TAG_LEN)?;
    if !tag.starts_with(TAG_PREFIX) {
        return Err(ModError::MalformedHeader(
            "missing binary version tag".to_owned(),
        ));
    }
    if reader.read_u8()? != 0 {
        return Err(ModError::MalformedHeader(
            "version tag is not NUL terminated".to_owned(),
        ));
    }
    let text = String::from_utf8_lossy(&tag[TAG_PREFIX.len()..]).into_owned();
    let version: FormatVersion = text.parse()?;
    if !version.is_binary() {
        return Err(ModError::UnsupportedVersion(format!(
            "{version} is a text version but the file is binary"
        )));
    }
    Ok(version)
}

struct IndexReader {
    wide: bool,
}

impl IndexReader {
    fn read(&self, reader: &mut LeReader<'_>) -> Result<u32> {
        Ok(if self.wide {
            reader.read_u32()?
        } else {
            u32::from(reader.read_u16()?)
        })
    }

    fn read_many(&self, reader: &mut LeReader<'_>, count: usize) -> Result<Vec<u32>> {
        (0..count).map(|_| self.read(reader)).collect()
    }
}

/// Parse a binary MOD document
pub fn parse(data: &[u8]) -> Result<ModFile> {
    let mut reader = LeReader::new(data);
    let version = read_version(&mut reader)?;
    debug!("Parsing MOD binary version {version}");

    let mut counts = [0usize; 10];
    for count in &mut counts {
        *count = reader.read_u32()? as usize;
    }
    let [verts, normals, colors, tex1s, tex2s, _tangents, materials, _adjuncts, _primitives, matrices] =
        counts;

    let mut file = ModFile::new(version);
    file.matrix_count = matrices as u32;
    if version.has_reskins() {
        file.reskins = reader.read_u32()?;
    }

    file.vertices = (0..verts).map(|_| reader.read_vec3()).collect::<age_data::Result<_>>()?;
    file.normals = (0..normals).map(|_| reader.read_vec3()).collect::<age_data::Result<_>>()?;
    file.colors = (0..colors).map(|_| reader.read_vec4()).collect::<age_data::Result<_>>()?;
    file.tex1s = (0..tex1s).map(|_| reader.read_vec2()).collect::<age_data::Result<_>>()?;
    file.tex2s = (0..tex2s).map(|_| reader.read_vec2()).collect::<age_data::Result<_>>()?;

    let mut packet_counts = Vec::new();
    for _ in 0..materials {
        let name = reader.read_cstr()?;
        let packet_count = reader.read_u16()? as usize;
        let _primitive_count = reader.read_u16()?;
        let texture_count = reader.read_u8()? as usize;
        let illumination = Illumination::from_byte(reader.read_u8()?)?;
        let ambient = reader.read_vec3()?;
        let diffuse = reader.read_vec3()?;
        let specular = reader.read_vec3()?;
        let textures = (0..texture_count)
            .map(|_| reader.read_cstr())
            .collect::<age_data::Result<_>>()?;
        let attributes = if version.has_attributes() {
            let count = reader.read_u32()? as usize;
            (0..count)
                .map(|_| read_attribute(&mut reader))
                .collect::<Result<_>>()?
        } else {
            Vec::new()
        };
        packet_counts.push(packet_count);
        file.materials.push(ModMaterial {
            name,
            illumination,
            ambient,
            diffuse,
            specular,
            textures,
            attributes,
            geometry: MaterialGeometry::Packets(Vec::new()),
        });
    }

    let index = IndexReader {
        wide: version.wide_indices(),
    };
    for (material, packet_count) in file.materials.iter_mut().zip(packet_counts) {
        let packets = (0..packet_count)
            .map(|_| read_packet(&mut reader, &index))
            .collect::<Result<Vec<_>>>()?;
        material.geometry = MaterialGeometry::Packets(packets);
    }

    let mtxv_count = reader.read_u32()? as usize;
    file.mtxv = reader.read_u32_array(mtxv_count)?;
    let mtxn_count = reader.read_u32()? as usize;
    file.mtxn = reader.read_u32_array(mtxn_count)?;

    debug!(
        "Parsed {} materials, {} packets, {} triangles",
        file.materials.len(),
        file.packet_count(),
        file.triangle_count()
    );
    Ok(file)
}

fn read_attribute(reader: &mut LeReader<'_>) -> Result<Attribute> {
    let kind = reader.read_u8()?;
    let name = reader.read_cstr()?;
    let value = match kind {
        0 => AttributeValue::Float(reader.read_f32()?),
        1 => AttributeValue::Int(reader.read_i32()?),
        other => {
            return Err(ModError::MalformedHeader(format!(
                "unknown attribute type {other} for {name}"
            )));
        }
    };
    Ok(Attribute { name, value })
}

fn read_packet(reader: &mut LeReader<'_>, index: &IndexReader) -> Result<Packet> {
    let adjunct_count = reader.read_u16()? as usize;
    let primitive_count = reader.read_u16()? as usize;
    let matrix_count = reader.read_u8()? as usize;

    let mut packet = Packet::default();
    for _ in 0..adjunct_count {
        let fields = index.read_many(reader, 6)?;
        let adjunct = Adjunct::from_fields(&fields).ok_or_else(|| {
            ModError::MalformedHeader("adjunct record is incomplete".to_owned())
        })?;
        packet.adjuncts.push(adjunct);
    }
    for _ in 0..primitive_count {
        let kind = reader.read_u8()?;
        let count = index.read(reader)? as usize;
        let indices = index
            .read_many(reader, count)?
            .into_iter()
            .map(AdjunctIndex)
            .collect();
        packet.primitives.push(Primitive::from_kind(kind, indices)?);
    }
    packet.matrices = index.read_many(reader, matrix_count)?;
    Ok(packet)
}

struct IndexWriter {
    version: FormatVersion,
}

impl IndexWriter {
    fn write(&self, writer: &mut LeWriter, value: u32) -> Result<()> {
        if self.version.wide_indices() {
            writer.write_u32(value);
        } else {
            let narrow = u16::try_from(value).map_err(|_| ModError::IndexOverflow {
                version: self.version,
                value,
            })?;
            writer.write_u16(narrow);
        }
        Ok(())
    }

    fn write_len(&self, writer: &mut LeWriter, len: usize) -> Result<()> {
        let value = u32::try_from(len).map_err(|_| ModError::IndexOverflow {
            version: self.version,
            value: u32::MAX,
        })?;
        self.write(writer, value)
    }
}

fn narrow<T: TryFrom<usize>>(version: FormatVersion, what: &str, value: usize) -> Result<T> {
    T::try_from(value).map_err(|_| ModError::LayoutMismatch {
        version,
        reason: format!("{what} count {value} does not fit its field"),
    })
}

/// Encode a binary MOD document
pub fn write(file: &ModFile) -> Result<Vec<u8>> {
    let version = file.version;
    if !version.is_binary() {
        return Err(ModError::UnsupportedVersion(format!(
            "cannot write version {version} as binary"
        )));
    }
    if file.check_layout()? != Layout::Packets {
        return Err(ModError::LayoutMismatch {
            version,
            reason: "binary versions only store packet geometry".to_owned(),
        });
    }

    let mut writer = LeWriter::new();
    let tag = format!("version: {version}");
    writer.write_bytes(tag.as_bytes());
    writer.write_u8(0);

    let counts = [
        file.vertices.len(),
        file.normals.len(),
        file.colors.len(),
        file.tex1s.len(),
        file.tex2s.len(),
        0,
        file.materials.len(),
        file.adjunct_count(),
        file.primitive_count(),
        file.matrix_count as usize,
    ];
    for count in counts {
        writer.write_u32(narrow(version, "header", count)?);
    }
    if version.has_reskins() {
        writer.write_u32(file.reskins);
    }

    file.vertices.iter().for_each(|&v| writer.write_vec3(v));
    file.normals.iter().for_each(|&v| writer.write_vec3(v));
    file.colors.iter().for_each(|&v| writer.write_vec4(v));
    file.tex1s.iter().for_each(|&v| writer.write_vec2(v));
    file.tex2s.iter().for_each(|&v| writer.write_vec2(v));

    for material in &file.materials {
        let MaterialGeometry::Packets(packets) = &material.geometry else {
            continue;
        };
        writer.write_cstr(&material.name);
        writer.write_u16(narrow(version, "packet", packets.len())?);
        writer.write_u16(narrow(
            version,
            "primitive",
            material.geometry.primitive_count(),
        )?);
        writer.write_u8(narrow(version, "texture", material.textures.len())?);
        writer.write_u8(material.illumination.to_byte());
        writer.write_vec3(material.ambient);
        writer.write_vec3(material.diffuse);
        writer.write_vec3(material.specular);
        for texture in &material.textures {
            writer.write_cstr(texture);
        }
        if version.has_attributes() {
            writer.write_u32(narrow(version, "attribute", material.attributes.len())?);
            for attribute in &material.attributes {
                match attribute.value {
                    AttributeValue::Float(value) => {
                        writer.write_u8(0);
                        writer.write_cstr(&attribute.name);
                        writer.write_f32(value);
                    }
                    AttributeValue::Int(value) => {
                        writer.write_u8(1);
                        writer.write_cstr(&attribute.name);
                        writer.write_i32(value);
                    }
                }
            }
        }
    }

    let index = IndexWriter { version };
    for packet in file.packets() {
        writer.write_u16(narrow(version, "packet adjunct", packet.adjuncts.len())?);
        writer.write_u16(narrow(version, "packet primitive", packet.primitives.len())?);
        writer.write_u8(narrow(version, "packet matrix", packet.matrices.len())?);
        for adjunct in &packet.adjuncts {
            let mut fields = adjunct.fields();
            fields.resize(6, 0);
            for field in fields {
                index.write(&mut writer, field)?;
            }
        }
        for primitive in &packet.primitives {
            writer.write_u8(primitive.kind_byte());
            index.write_len(&mut writer, primitive.indices().len())?;
            for adjunct in primitive.indices() {
                index.write(&mut writer, adjunct.value())?;
            }
        }
        for &matrix in &packet.matrices {
            index.write(&mut writer, matrix)?;
        }
    }

    writer.write_u32(narrow(version, "mtxv", file.mtxv.len())?);
    writer.write_u32_slice(&file.mtxv);
    writer.write_u32(narrow(version, "mtxn", file.mtxn.len())?);
    writer.write_u32_slice(&file.mtxn);

    Ok(writer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use age_data::{ColorIndex, MatrixSlot, NormalIndex, PointIndex, UvIndex};
    use glam::{Vec2, Vec3, Vec4};
    use pretty_assertions::assert_eq;

    fn sample(version: FormatVersion) -> ModFile {
        let adjunct = |v: u32| Adjunct {
            vertex: PointIndex(v),
            normal: NormalIndex(0),
            color: ColorIndex(0),
            uv0: UvIndex(0),
            uv1: UvIndex(0),
            matrix: Some(MatrixSlot(0)),
        };
        let mut file = ModFile::new(version);
        file.vertices = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        file.normals = vec![Vec3::Z];
        file.colors = vec![Vec4::ONE];
        file.tex1s = vec![Vec2::new(0.5, 0.25)];
        file.matrix_count = 1;
        file.reskins = 1;
        file.mtxv = vec![3];
        file.mtxn = vec![1];
        file.materials.push(ModMaterial {
            name: "body".to_owned(),
            illumination: Illumination::Emit,
            ambient: Vec3::ZERO,
            diffuse: Vec3::new(1.0, 0.5, 0.25),
            specular: Vec3::splat(0.1),
            textures: vec!["skin".to_owned()],
            attributes: vec![Attribute::float("shininess", 0.75), Attribute::int("draworder", 2)],
            geometry: MaterialGeometry::Packets(vec![Packet {
                adjuncts: (0..3).map(adjunct).collect(),
                primitives: vec![
                    Primitive::Triangles((0..3).map(AdjunctIndex).collect()),
                    Primitive::Strip {
                        clockwise: true,
                        indices: (0..3).map(AdjunctIndex).collect(),
                    },
                ],
                matrices: vec![0],
                reskins: None,
            }]),
        });
        file
    }

    #[test]
    fn binary_round_trip_is_identical() {
        for version in [FormatVersion::V2_00, FormatVersion::V2_10, FormatVersion::V2_12] {
            let mut file = sample(version);
            if !version.has_attributes() {
                file.materials[0].attributes.clear();
            }
            if !version.has_reskins() {
                file.reskins = 0;
            }
            let bytes = write(&file).unwrap();
            assert!(is_binary(&bytes));
            let parsed = parse(&bytes).unwrap();
            assert_eq!(parsed, file);
            assert_eq!(write(&parsed).unwrap(), bytes);
        }
    }

    #[test]
    fn index_width_depends_on_version() {
        let wide = write(&sample(FormatVersion::V2_00)).unwrap();
        let mut narrow_file = sample(FormatVersion::V2_10);
        narrow_file.materials[0].attributes.clear();
        let narrow = write(&narrow_file).unwrap();
        // 2.10 adds a reskin count but halves 3*6 + 2*(1+3) + 1 index fields
        assert_eq!(wide.len() - narrow.len(), (18 + 8 + 1) * 2 - 4);
    }

    #[test]
    fn narrow_indices_overflow() {
        let mut file = sample(FormatVersion::V2_10);
        if let MaterialGeometry::Packets(packets) = &mut file.materials[0].geometry {
            packets[0].matrices = vec![70_000];
        }
        assert!(matches!(
            write(&file),
            Err(ModError::IndexOverflow { value: 70_000, .. })
        ));
    }

    #[test]
    fn unknown_tag_is_unsupported_not_misread() {
        let mut bytes = write(&sample(FormatVersion::V2_12)).unwrap();
        bytes[9..13].copy_from_slice(b"2.50");
        assert!(matches!(parse(&bytes), Err(ModError::UnsupportedVersion(v)) if v == "2.50"));
    }

    #[test]
    fn missing_tag_is_malformed() {
        let mut bytes = write(&sample(FormatVersion::V2_12)).unwrap();
        bytes[..8].copy_from_slice(b"VERSION:");
        assert!(matches!(parse(&bytes), Err(ModError::MalformedHeader(_))));
    }

    #[test]
    fn truncated_body_reports_offset() {
        let bytes = write(&sample(FormatVersion::V2_00)).unwrap();
        let err = parse(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(
            err,
            ModError::Data(age_data::DataError::Truncated { .. })
        ));
    }

    #[test]
    fn huge_material_count_is_truncation() {
        let mut writer = LeWriter::new();
        writer.write_bytes(b"version: 2.10\0");
        for field in 0..10 {
            // materials is the seventh count
            writer.write_u32(if field == 6 { u32::MAX } else { 0 });
        }
        writer.write_u32(0);
        assert!(matches!(
            parse(&writer.into_inner()),
            Err(ModError::Data(age_data::DataError::Truncated { .. }))
        ));
    }
}
