//! BND text grammar.
//!
//! ```text
//! version: 1.10
//! type: geometry
//!
//! verts: 4
//! materials: 1
//! edges: 5
//! polys: 2
//!
//! v 0.000000 0.000000 0.000000
//! type: BASE
//! mtl default {
//! 	elasticity: 0.100000
//! 	friction: 0.500000
//! }
//! edge 0 1
//! tri 0 1 2 0 0 1 2
//! ```
//!
//! Version 1.01 has no `type:` lines and no edges, and its materials add
//! `effect:` and `sound:` entries. Face lines are `tri a b c material`
//! and `quad a b c d material`, followed in 1.10 by one edge per side.

use std::fmt::Write;

use age_data::{DataError, TokenParser};
use glam::Vec3;
use log::{debug, warn};

use crate::bound::{Bound, BoundFace, BoundMaterial};
use crate::error::{BndError, Result};
use crate::version::BndVersion;

/// Longest run of unrelated lines tolerated between two vertex or edge
/// records
const RECORD_GAP: usize = 16;
/// Same for material blocks
const MATERIAL_GAP: usize = 32;

pub(crate) fn parse_error(
    parser: &TokenParser<'_>,
    message: &str,
    tokens: &[String],
) -> DataError {
    DataError::Parse {
        line: parser.tell(),
        message: message.to_owned(),
        tokens: tokens.to_vec(),
    }
}

fn parse_indices(parser: &TokenParser<'_>, tokens: &[String]) -> Result<Vec<u32>> {
    tokens[1..]
        .iter()
        .map(|token| token.parse::<u32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| parse_error(parser, "failed to parse index", tokens).into())
}

pub(crate) fn read_version(parser: &mut TokenParser<'_>) -> Result<BndVersion> {
    if !parser.skip_to("version:", None) {
        return Err(BndError::MalformedHeader("no version line".to_owned()));
    }
    let tokens = parser.read_tokens()?;
    tokens
        .get(1)
        .ok_or_else(|| BndError::MalformedHeader("empty version line".to_owned()))?
        .parse()
}

/// Bound type named right after the version line, if any
pub(crate) fn read_type(parser: &mut TokenParser<'_>) -> Result<Option<String>> {
    if !parser.skip_to("type:", Some(4)) {
        return Ok(None);
    }
    let tokens = parser.read_tokens()?;
    match tokens.get(1) {
        Some(kind) => Ok(Some(kind.clone())),
        None => Err(parse_error(parser, "missing bound type", &tokens).into()),
    }
}

fn read_header(parser: &mut TokenParser<'_>) -> Result<BndVersion> {
    let version = read_version(parser)?;
    if version == BndVersion::V1_10 {
        match read_type(parser)?.as_deref() {
            None | Some("geometry") => {}
            Some(other) => return Err(BndError::UnsupportedType(other.to_owned())),
        }
    }
    Ok(version)
}

pub(crate) fn read_material(parser: &mut TokenParser<'_>) -> Result<BoundMaterial> {
    let tokens = parser.read_tokens()?;
    let name = tokens
        .get(1)
        .ok_or_else(|| parse_error(parser, "material without a name", &tokens))?;
    let mut material = BoundMaterial::named(name.as_str());

    while let Some(keyword) = parser.peek_keyword() {
        match keyword {
            "}" => {
                parser.read_line()?;
                break;
            }
            "elasticity:" => material.elasticity = parser.read_float()?,
            "friction:" => material.friction = parser.read_float()?,
            "effect:" | "sound:" => {
                let tokens = parser.read_tokens()?;
                let value = tokens.get(1).cloned().unwrap_or_default();
                if keyword == "effect:" {
                    material.effect = value;
                } else {
                    material.sound = value;
                }
            }
            "mtl" | "edge" | "tri" | "quad" => {
                warn!("Material {} is not closed", material.name);
                break;
            }
            _ => {
                parser.read_line()?;
            }
        }
    }
    Ok(material)
}

fn read_face(parser: &mut TokenParser<'_>) -> Result<BoundFace> {
    let tokens = parser.read_tokens()?;
    let sides = if tokens[0] == "quad" { 4 } else { 3 };
    let values = parse_indices(parser, &tokens)?;
    if values.len() < sides + 1 {
        return Err(parse_error(parser, "too few face indices", &tokens).into());
    }
    let edges = values[sides + 1..].to_vec();
    if !edges.is_empty() && edges.len() != sides {
        return Err(parse_error(parser, "wrong number of face edges", &tokens).into());
    }
    Ok(BoundFace {
        vertices: values[..sides].to_vec(),
        material: values[sides],
        edges,
    })
}

pub fn parse(text: &str) -> Result<Bound> {
    let mut parser = TokenParser::new(text);
    let version = read_header(&mut parser)?;
    let mut bound = Bound::default();

    while parser.skip_to("v", Some(RECORD_GAP)) {
        let [x, y, z] = parser.read_floats::<3>()?;
        bound.vertices.push(Vec3::new(x, y, z));
    }
    while parser.skip_to("mtl", Some(MATERIAL_GAP)) {
        bound.materials.push(read_material(&mut parser)?);
    }
    while parser.skip_to("edge", Some(RECORD_GAP)) {
        let tokens = parser.read_tokens()?;
        match parse_indices(&parser, &tokens)?.as_slice() {
            &[a, b] => bound.edges.push([a, b]),
            _ => return Err(parse_error(&parser, "edge needs two vertices", &tokens).into()),
        }
    }
    while parser.skip_to_any(&["tri", "quad"], None) {
        bound.faces.push(read_face(&mut parser)?);
    }

    debug!(
        "Parsed BND {version}: {} vertices, {} materials, {} edges, {} faces",
        bound.vertices.len(),
        bound.materials.len(),
        bound.edges.len(),
        bound.faces.len()
    );
    Ok(bound)
}

/// Render a bound as BND text. Version 1.10 needs face edges and builds
/// them when the bound has none.
pub fn write(bound: &Bound, version: BndVersion) -> Result<String> {
    let mut owned;
    let bound = if version.has_edges() && !bound.has_edges() {
        owned = bound.clone();
        owned.build_edges();
        &owned
    } else {
        bound
    };
    bound.validate()?;
    let edges = version.has_edges();

    let mut out = String::new();
    let _ = writeln!(out, "version: {version}");
    if edges {
        out.push_str("type: geometry\n\n");
    }
    let _ = writeln!(out, "verts: {}", bound.vertices.len());
    let _ = writeln!(out, "materials: {}", bound.materials.len());
    let _ = writeln!(out, "edges: {}", if edges { bound.edges.len() } else { 0 });
    let _ = writeln!(out, "polys: {}", bound.faces.len());
    out.push('\n');

    for v in &bound.vertices {
        let _ = writeln!(out, "v {:.6} {:.6} {:.6}", v.x, v.y, v.z);
    }
    out.push('\n');

    for material in &bound.materials {
        if edges {
            out.push_str("type: BASE\n");
        }
        let _ = writeln!(out, "mtl {} {{", material.name);
        let _ = writeln!(out, "\telasticity: {:.6}", material.elasticity);
        let _ = writeln!(out, "\tfriction: {:.6}", material.friction);
        if !edges {
            let _ = writeln!(out, "\teffect: {}", material.effect);
            let _ = writeln!(out, "\tsound: {}", material.sound);
        }
        out.push_str("}\n");
    }
    out.push('\n');

    if edges {
        for [a, b] in &bound.edges {
            let _ = writeln!(out, "edge {a} {b}");
        }
        out.push('\n');
    }

    for face in &bound.faces {
        out.push_str(if face.is_quad() { "quad" } else { "tri" });
        for v in &face.vertices {
            let _ = write!(out, " {v}");
        }
        let _ = write!(out, " {}", face.material);
        if edges {
            for e in &face.edges {
                let _ = write!(out, " {e}");
            }
        }
        out.push('\n');
    }
    Ok(out)
}
