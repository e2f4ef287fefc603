//! Text driver for MOD versions 1.06 through 1.10.

use std::fmt::Write as _;
use std::io::SeekFrom;

use age_data::{AdjunctIndex, TokenParser};
use glam::{Vec2, Vec3, Vec4};
use log::{debug, trace};

use crate::error::{ModError, Result};
use crate::file::{
    Adjunct, Attribute, AttributeValue, Illumination, MaterialGeometry, ModFile, ModMaterial,
    Packet, Primitive,
};
use crate::version::{FormatVersion, Layout};

/// Lines scanned for the next pool record or header field
const POOL_SCAN: usize = 16;
/// Lines scanned for the next material block
const MATERIAL_SCAN: usize = 32;
const PRIMITIVE_KEYWORDS: [&str; 3] = ["tri", "str", "stp"];

fn malformed(message: impl Into<String>) -> ModError {
    ModError::MalformedHeader(message.into())
}

/// Parse a text MOD document
pub fn parse(text: &str) -> Result<ModFile> {
    let mut parser = TokenParser::new(text);

    if !parser.skip_to("version:", None) {
        return Err(malformed("missing 'version:' line"));
    }
    let tokens = parser.read_tokens()?;
    let version: FormatVersion = tokens
        .get(1)
        .ok_or_else(|| malformed("empty 'version:' line"))?
        .parse()?;
    if version.is_binary() {
        return Err(ModError::UnsupportedVersion(format!(
            "{version} is a binary version but the file is text"
        )));
    }
    debug!("Parsing MOD text version {version}");

    let mut file = ModFile::new(version);
    let header = parser.tell();
    let matrix_count = parser
        .skip_to("matrices:", Some(POOL_SCAN))
        .then(|| parser.read_int::<u32>())
        .transpose()?;
    parser.seek(SeekFrom::Start(header as u64));
    if parser.skip_to("reskins:", Some(POOL_SCAN)) {
        file.reskins = parser.read_int()?;
    }
    parser.seek(SeekFrom::Start(header as u64));

    while parser.skip_to("v", Some(POOL_SCAN)) {
        file.vertices.push(Vec3::from_array(parser.read_floats()?));
    }
    while parser.skip_to("n", Some(POOL_SCAN)) {
        file.normals.push(Vec3::from_array(parser.read_floats()?));
    }
    while parser.skip_to("c", Some(POOL_SCAN)) {
        file.colors.push(Vec4::from_array(parser.read_floats()?));
    }
    while parser.skip_to("t1", Some(POOL_SCAN)) {
        file.tex1s.push(Vec2::from_array(parser.read_floats()?));
    }
    while parser.skip_to("t2", Some(POOL_SCAN)) {
        file.tex2s.push(Vec2::from_array(parser.read_floats()?));
    }
    debug!(
        "Pools: {} verts, {} normals, {} colors, {} tex1s, {} tex2s",
        file.vertices.len(),
        file.normals.len(),
        file.colors.len(),
        file.tex1s.len(),
        file.tex2s.len()
    );

    let mut headers = Vec::new();
    while parser.skip_to("mtl", Some(MATERIAL_SCAN)) {
        headers.push(parse_material_header(&mut parser, version)?);
    }

    let body = parser.tell();
    if parser.skip_to("mtxv", None) {
        file.mtxv = parser.read_int_array()?;
    }
    if parser.skip_to("mtxn", None) {
        file.mtxn = parser.read_int_array()?;
    }
    parser.seek(SeekFrom::Start(body as u64));
    file.matrix_count = matrix_count.unwrap_or(file.mtxv.len() as u32);

    let layout = match headers.first().map(|h| h.layout) {
        Some(layout) => layout,
        None => version.layout(),
    };
    if headers.iter().any(|h| h.layout != layout) {
        return Err(malformed("materials mix packet and legacy geometry"));
    }

    if layout == Layout::Legacy {
        while parser.skip_to("adj", None) {
            let fields: Vec<u32> = parser.read_int_array()?;
            let adjunct = Adjunct::from_fields(&fields[..fields.len().min(5)])
                .ok_or_else(|| malformed(format!("adjunct record with {} fields", fields.len())))?;
            file.adjuncts.push(adjunct);
        }
    }

    for header in headers {
        let geometry = match header.layout {
            Layout::Packets => {
                MaterialGeometry::Packets(parse_packets(&mut parser, &header)?)
            }
            Layout::Legacy => {
                let mut primitives = Vec::new();
                for _ in 0..header.primitive_count {
                    if !parser.skip_to_any(&PRIMITIVE_KEYWORDS, None) {
                        return Err(malformed(format!(
                            "ran out of primitives building material {}",
                            header.name
                        )));
                    }
                    primitives.push(parse_primitive(&mut parser)?);
                }
                MaterialGeometry::Legacy {
                    adjunct_count: header.adjunct_count,
                    primitives,
                }
            }
        };
        file.materials.push(ModMaterial {
            name: header.name,
            illumination: header.illumination,
            ambient: header.ambient,
            diffuse: header.diffuse,
            specular: header.specular,
            textures: header.textures,
            attributes: header.attributes,
            geometry,
        });
    }

    debug!(
        "Parsed {} materials, {} packets, {} triangles",
        file.materials.len(),
        file.packet_count(),
        file.triangle_count()
    );
    Ok(file)
}

/// Material block fields before geometry is attached
struct MaterialHeader {
    name: String,
    layout: Layout,
    packet_count: usize,
    adjunct_count: Option<u32>,
    primitive_count: usize,
    illumination: Illumination,
    ambient: Vec3,
    diffuse: Vec3,
    specular: Vec3,
    textures: Vec<String>,
    attributes: Vec<Attribute>,
}

fn parse_material_header(
    parser: &mut TokenParser<'_>,
    version: FormatVersion,
) -> Result<MaterialHeader> {
    let tokens = parser.read_tokens()?;
    let name = tokens
        .get(1)
        .cloned()
        .ok_or_else(|| malformed("material without a name"))?;

    let mut packets = None;
    let mut adjuncts = None;
    let mut primitives = None;
    let mut header = MaterialHeader {
        name,
        layout: Layout::Packets,
        packet_count: 0,
        adjunct_count: None,
        primitive_count: 0,
        illumination: Illumination::Diffuse,
        ambient: Vec3::ZERO,
        diffuse: Vec3::ONE,
        specular: Vec3::ZERO,
        textures: Vec::new(),
        attributes: Vec::new(),
    };

    loop {
        let Some(keyword) = parser.peek_keyword() else {
            if parser.is_eof() {
                return Err(malformed(format!("material {} is not closed", header.name)));
            }
            parser.read_line()?;
            continue;
        };
        match keyword {
            "}" => {
                parser.read_line()?;
                break;
            }
            "packets:" => packets = Some(parser.read_int::<usize>()?),
            "adjuncts:" => adjuncts = Some(parser.read_int::<u32>()?),
            "primitives:" => primitives = Some(parser.read_int::<usize>()?),
            "illum:" => {
                let tokens = parser.read_tokens()?;
                header.illumination = tokens
                    .get(1)
                    .ok_or_else(|| malformed("empty 'illum:' field"))?
                    .parse()?;
            }
            "ambient:" => header.ambient = Vec3::from_array(parser.read_floats()?),
            "diffuse:" => header.diffuse = Vec3::from_array(parser.read_floats()?),
            "specular:" => header.specular = Vec3::from_array(parser.read_floats()?),
            "texture:" | "texture" => {
                let tokens = parser.read_tokens()?;
                let name = tokens
                    .get(2)
                    .ok_or_else(|| malformed("texture record without a name"))?;
                header.textures.push(name.clone());
            }
            "attributes:" if version.has_attributes() => {
                let count: usize = parser.read_int()?;
                for _ in 0..count {
                    header.attributes.push(parse_attribute(parser)?);
                }
            }
            other => {
                trace!("Skipping material field {other}");
                parser.read_line()?;
            }
        }
    }

    match (packets, adjuncts, primitives) {
        (Some(count), _, _) => header.packet_count = count,
        (None, Some(adjunct_count), Some(count)) => {
            header.layout = Layout::Legacy;
            header.adjunct_count = Some(adjunct_count);
            header.primitive_count = count;
        }
        (None, None, Some(count)) if version == FormatVersion::V1_06 => {
            header.layout = Layout::Legacy;
            header.primitive_count = count;
        }
        _ => {
            return Err(malformed(format!(
                "material {} has no usable geometry counts",
                header.name
            )));
        }
    }
    Ok(header)
}

fn parse_attribute(parser: &mut TokenParser<'_>) -> Result<Attribute> {
    let tokens = parser.read_tokens()?;
    let [kind, name, value, ..] = tokens.as_slice() else {
        return Err(malformed(format!("bad attribute record {tokens:?}")));
    };
    let name = name.trim_end_matches(':').to_owned();
    let bad_value = || malformed(format!("bad value for attribute {name}"));
    let value = match kind.as_str() {
        "float" => AttributeValue::Float(
            age_data::token::parse_float(value).ok_or_else(bad_value)?,
        ),
        "int" => AttributeValue::Int(value.parse().map_err(|_| bad_value())?),
        other => return Err(malformed(format!("unknown attribute type '{other}'"))),
    };
    Ok(Attribute { name, value })
}

fn parse_index_list(tokens: &[String]) -> Result<Vec<AdjunctIndex>> {
    tokens
        .iter()
        .map(|token| token.parse::<u32>().map(AdjunctIndex))
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| malformed(format!("bad index in primitive {tokens:?}")))
}

fn parse_primitive(parser: &mut TokenParser<'_>) -> Result<Primitive> {
    let tokens = parser.read_tokens()?;
    let Some((keyword, rest)) = tokens.split_first() else {
        return Err(malformed("empty primitive record"));
    };
    match keyword.as_str() {
        "tri" => Ok(Primitive::Triangles(parse_index_list(rest)?)),
        kind @ ("str" | "stp") => {
            // leading value is the index count
            let indices = parse_index_list(rest.get(1..).unwrap_or_default())?;
            Ok(Primitive::Strip {
                clockwise: kind == "stp",
                indices,
            })
        }
        other => Err(malformed(format!("unknown primitive type '{other}'"))),
    }
}

fn parse_packets(parser: &mut TokenParser<'_>, header: &MaterialHeader) -> Result<Vec<Packet>> {
    let mut packets = Vec::new();
    for _ in 0..header.packet_count {
        if !parser.skip_to("packet", None) {
            return Err(malformed(format!(
                "ran out of packets building material {}",
                header.name
            )));
        }
        let tokens = parser.read_tokens()?;
        let counts: Vec<usize> = tokens
            .iter()
            .skip(1)
            .take_while(|token| *token != "{")
            .map(|token| token.parse::<usize>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| malformed(format!("bad packet header {tokens:?}")))?;
        let [adjunct_count, primitive_count, _matrix_count, rest @ ..] = counts.as_slice() else {
            return Err(malformed(format!("bad packet header {tokens:?}")));
        };

        let mut packet = Packet {
            reskins: rest.first().map(|&r| r as u32),
            ..Packet::default()
        };
        if *adjunct_count > 0 {
            parser.skip_to("adj", None);
            for _ in 0..*adjunct_count {
                let fields: Vec<u32> = parser.read_int_array()?;
                let adjunct = Adjunct::from_fields(&fields).ok_or_else(|| {
                    malformed(format!("adjunct record with {} fields", fields.len()))
                })?;
                packet.adjuncts.push(adjunct);
            }
        }
        if *primitive_count > 0 {
            parser.skip_to_any(&PRIMITIVE_KEYWORDS, None);
            for _ in 0..*primitive_count {
                packet.primitives.push(parse_primitive(parser)?);
            }
        }
        if parser.skip_to_any(&["mtx", "}"], None) && parser.peek_keyword() == Some("mtx") {
            packet.matrices = parser.read_int_array()?;
        }
        if parser.skip_to_group_end() {
            parser.read_line()?;
        }
        trace!(
            "Packet: {} adjuncts, {} primitives, {} matrices",
            packet.adjuncts.len(),
            packet.primitives.len(),
            packet.matrices.len()
        );
        packets.push(packet);
    }
    Ok(packets)
}

/// Quote a token for the shell-style tokenizer when needed
fn quote(token: &str) -> String {
    if !token.is_empty() && !token.contains(|c: char| c.is_whitespace() || "\"'\\".contains(c)) {
        return token.to_owned();
    }
    let mut quoted = String::with_capacity(token.len() + 2);
    quoted.push('"');
    for c in token.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

fn join<T: ToString>(values: impl IntoIterator<Item = T>, separator: &str) -> String {
    values
        .into_iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

fn vec3(v: Vec3, separator: &str) -> String {
    join(v.to_array().map(|x| format!("{x:.6}")), separator)
}

/// Render a text MOD document
pub fn write(file: &ModFile) -> Result<String> {
    let version = file.version;
    if version.is_binary() || !version.can_encode() {
        return Err(ModError::UnsupportedVersion(format!(
            "cannot write version {version} as text"
        )));
    }
    let layout = file.check_layout()?;
    if layout != version.layout() {
        return Err(ModError::LayoutMismatch {
            version,
            reason: format!("{layout:?} geometry cannot be stored"),
        });
    }

    let mut out = String::new();
    // writeln! into a String cannot fail
    let _ = writeln!(out, "version: {version}");
    let _ = writeln!(out, "verts: {}", file.vertices.len());
    let _ = writeln!(out, "normals: {}", file.normals.len());
    let _ = writeln!(out, "colors: {}", file.colors.len());
    let _ = writeln!(out, "tex1s: {}", file.tex1s.len());
    let _ = writeln!(out, "tex2s: {}", file.tex2s.len());
    let _ = writeln!(out, "tangents: 0");
    let _ = writeln!(out, "materials: {}", file.materials.len());
    let _ = writeln!(out, "adjuncts: {}", file.adjunct_count());
    let _ = writeln!(out, "primitives: {}", file.primitive_count());
    let _ = writeln!(out, "matrices: {}", file.matrix_count);
    if version.has_reskins() {
        let _ = writeln!(out, "reskins: {}", file.reskins);
    }
    out.push('\n');

    let arrays3 = |pool: &[Vec3]| pool.iter().map(|v| v.to_array()).collect::<Vec<_>>();
    let arrays2 = |pool: &[Vec2]| pool.iter().map(|v| v.to_array()).collect::<Vec<_>>();
    write_pool(&mut out, "v", &arrays3(file.vertices.as_slice()));
    write_pool(&mut out, "n", &arrays3(file.normals.as_slice()));
    write_pool(
        &mut out,
        "c",
        &file.colors.iter().map(|c| c.to_array()).collect::<Vec<_>>(),
    );
    write_pool(&mut out, "t1", &arrays2(file.tex1s.as_slice()));
    write_pool(&mut out, "t2", &arrays2(file.tex2s.as_slice()));

    for material in &file.materials {
        write_material(&mut out, material, version);
    }

    match layout {
        Layout::Packets => {
            for material in &file.materials {
                if let MaterialGeometry::Packets(packets) = &material.geometry {
                    for packet in packets {
                        write_packet(&mut out, packet);
                    }
                }
            }
        }
        Layout::Legacy => {
            if !file.adjuncts.is_empty() {
                for adjunct in &file.adjuncts {
                    let _ = writeln!(out, "adj\t{}", join(adjunct.fields(), "\t"));
                }
                out.push('\n');
            }
            for material in &file.materials {
                if let MaterialGeometry::Legacy { primitives, .. } = &material.geometry {
                    for primitive in primitives {
                        write_primitive(&mut out, "", primitive);
                    }
                }
            }
            out.push('\n');
        }
    }

    let _ = writeln!(out, "mtxv {}", join(&file.mtxv, " "));
    let _ = write!(out, "mtxn {}", join(&file.mtxn, " "));
    Ok(out)
}

fn write_pool<const N: usize>(out: &mut String, keyword: &str, rows: &[[f32; N]]) {
    if rows.is_empty() {
        return;
    }
    for row in rows {
        let _ = writeln!(
            out,
            "{keyword}\t{}",
            join(row.iter().map(|x| format!("{x:.6}")), "\t")
        );
    }
    out.push('\n');
}

fn write_material(out: &mut String, material: &ModMaterial, version: FormatVersion) {
    let _ = writeln!(out, "mtl {} {{", quote(&material.name));
    match &material.geometry {
        MaterialGeometry::Packets(packets) => {
            let _ = writeln!(out, "\tpackets:\t{}", packets.len());
        }
        MaterialGeometry::Legacy { adjunct_count, .. } => {
            if let Some(count) = adjunct_count {
                let _ = writeln!(out, "\tadjuncts:\t{count}");
            }
        }
    }
    let _ = writeln!(out, "\tprimitives:\t{}", material.geometry.primitive_count());
    let _ = writeln!(out, "\ttextures:\t{}", material.textures.len());
    let _ = writeln!(out, "\tillum:\t{}", material.illumination);
    let _ = writeln!(out, "\tambient:\t{}", vec3(material.ambient, " "));
    let _ = writeln!(out, "\tdiffuse:\t{}", vec3(material.diffuse, " "));
    let _ = writeln!(out, "\tspecular:\t{}", vec3(material.specular, " "));
    for (index, texture) in material.textures.iter().enumerate() {
        let _ = writeln!(out, "\ttexture: {index} {}", quote_always(texture));
    }
    if version.has_attributes() && !material.attributes.is_empty() {
        let _ = writeln!(out, "\tattributes: {}", material.attributes.len());
        for attribute in &material.attributes {
            let value = match attribute.value {
                AttributeValue::Float(value) => format!("{value:.6}"),
                AttributeValue::Int(value) => value.to_string(),
            };
            let _ = writeln!(
                out,
                "\t{} {}: {value}",
                attribute.value.type_name(),
                attribute.name
            );
        }
    }
    out.push_str("}\n\n");
}

/// Texture names are always written quoted
fn quote_always(token: &str) -> String {
    let quoted = quote(token);
    if quoted.starts_with('"') {
        quoted
    } else {
        format!("\"{token}\"")
    }
}

fn write_primitive(out: &mut String, indent: &str, primitive: &Primitive) {
    let indices = join(primitive.indices().iter().map(|i| i.value()), "\t");
    match primitive {
        Primitive::Triangles(_) => {
            let _ = writeln!(out, "{indent}tri\t{indices}");
        }
        Primitive::Strip { .. } => {
            let _ = writeln!(
                out,
                "{indent}{}\t{}\t{indices}",
                primitive.keyword(),
                primitive.indices().len()
            );
        }
    }
}

fn write_packet(out: &mut String, packet: &Packet) {
    let mut counts = vec![
        packet.adjuncts.len(),
        packet.primitives.len(),
        packet.matrices.len(),
    ];
    counts.extend(packet.reskins.map(|r| r as usize));
    let _ = writeln!(out, "packet {} {{", join(counts, " "));
    for adjunct in &packet.adjuncts {
        let _ = writeln!(out, "\tadj\t{}", join(adjunct.fields(), "\t"));
    }
    for primitive in &packet.primitives {
        write_primitive(out, "\t", primitive);
    }
    if !packet.matrices.is_empty() {
        let _ = writeln!(out, "\tmtx {}", join(&packet.matrices, " "));
    }
    out.push_str("}\n\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use age_data::{ColorIndex, MatrixSlot, NormalIndex, PointIndex, UvIndex};
    use pretty_assertions::assert_eq;

    const PACKET_MOD: &str = "version: 1.10
verts: 3
normals: 1
colors: 1
tex1s: 1
tex2s: 0
tangents: 0
materials: 1
adjuncts: 3
primitives: 1
matrices: 1
reskins: 1

v\t0.000000\t0.000000\t0.000000
v\t1.000000\t0.000000\t0.000000
v\t0.000000\t1.000000\t0.000000

n\t0.000000\t1.000000\t0.000000

c\t1.000000\t1.000000\t1.000000\t1.000000

t1\t0.000000\t0.000000

mtl \"red paint\" {
\tpackets:\t1
\tprimitives:\t1
\ttextures:\t1
\tillum:\tdiffuse
\tambient:\t0.000000 0.000000 0.000000
\tdiffuse:\t1.000000 0.000000 0.000000
\tspecular:\t0.500000 0.500000 0.500000
\ttexture: 0 \"car body\"
\tattributes: 2
\tfloat shininess: 0.250000
\tint draworder: 3
}

packet 3 1 1 {
\tadj\t0\t0\t0\t0\t0\t0
\tadj\t1\t0\t0\t0\t0\t0
\tadj\t2\t0\t0\t0\t0\t0
\ttri\t0\t1\t2
\tmtx 0
}

mtxv 3
mtxn 1";

    #[test]
    fn parses_packet_layout() {
        let file = parse(PACKET_MOD).unwrap();
        assert_eq!(file.version, FormatVersion::V1_10);
        assert_eq!(file.vertices.len(), 3);
        assert_eq!(file.matrix_count, 1);
        assert_eq!(file.reskins, 1);
        assert_eq!(file.mtxv, vec![3]);

        let material = &file.materials[0];
        assert_eq!(material.name, "red paint");
        assert_eq!(material.textures, vec!["car body".to_owned()]);
        assert_eq!(
            material.attribute("shininess"),
            Some(AttributeValue::Float(0.25))
        );
        assert_eq!(material.attribute("draworder"), Some(AttributeValue::Int(3)));

        let packet = file.packets().next().unwrap();
        assert_eq!(packet.matrices, vec![0]);
        assert_eq!(
            packet.adjuncts[2],
            Adjunct {
                vertex: PointIndex(2),
                normal: NormalIndex(0),
                color: ColorIndex(0),
                uv0: UvIndex(0),
                uv1: UvIndex(0),
                matrix: Some(MatrixSlot(0)),
            }
        );
        assert_eq!(file.triangle_count(), 1);
    }

    #[test]
    fn written_text_matches_parsed_text() {
        let file = parse(PACKET_MOD).unwrap();
        assert_eq!(write(&file).unwrap(), PACKET_MOD);
    }

    #[test]
    fn parses_legacy_strips() {
        let text = "version: 1.06
verts: 0
materials: 1

mtl body {
\tprimitives:\t2
\ttextures:\t0
}

adj\t0\t0\t0\t0\t0
adj\t1\t0\t0\t0\t0

str\t5\t0\t1\t2\t3\t4
tri\t0\t1\t2
";
        let file = parse(text).unwrap();
        assert_eq!(file.layout(), Layout::Legacy);
        assert_eq!(file.adjuncts.len(), 2);
        let MaterialGeometry::Legacy { primitives, .. } = &file.materials[0].geometry else {
            panic!("expected legacy geometry");
        };
        assert_eq!(primitives.len(), 2);
        assert_eq!(primitives[0].triangle_count(), 3);
        assert_eq!(file.triangle_count(), 4);
    }

    #[test]
    fn legacy_primitives_must_be_present() {
        let text = "version: 1.06\nmtl body {\n\tprimitives:\t3\n}\ntri 0 1 2\n";
        assert!(matches!(parse(text), Err(ModError::MalformedHeader(_))));
    }

    #[test]
    fn huge_geometry_counts_run_out_of_records() {
        let packets = PACKET_MOD.replace("packets:\t1", "packets:\t4000000000000000000");
        assert!(matches!(parse(&packets), Err(ModError::MalformedHeader(_))));

        let legacy = "version: 1.06\nmtl body {\n\tprimitives:\t4000000000000000000\n}\ntri 0 1 2\n";
        assert!(matches!(parse(legacy), Err(ModError::MalformedHeader(_))));
    }

    #[test]
    fn materials_need_geometry_counts() {
        let text = "version: 1.09\nmtl body {\n\tprimitives:\t3\n}\n";
        assert!(matches!(parse(text), Err(ModError::MalformedHeader(_))));
    }

    #[test]
    fn unknown_version_is_unsupported() {
        assert!(matches!(
            parse("version: 1.07\n"),
            Err(ModError::UnsupportedVersion(_))
        ));
        assert!(matches!(parse("verts: 3\n"), Err(ModError::MalformedHeader(_))));
    }

    #[test]
    fn version_1_08_is_read_only() {
        let mut file = parse(PACKET_MOD).unwrap();
        file.version = FormatVersion::V1_08;
        assert!(matches!(write(&file), Err(ModError::UnsupportedVersion(_))));
    }
}
