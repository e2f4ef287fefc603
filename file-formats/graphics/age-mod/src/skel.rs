//! `.skel` skeleton text format.
//!
//! ```text
//! NumBones 2
//! bone root {
//! 	offset 0.000000 1.000000 0.000000
//! 	bone spine {
//! 		offset 0.000000 0.500000 0.000000
//! 	}
//! }
//! ```
//!
//! Offsets are relative to the parent bone and stored in engine space.
//! Bone ids follow order of appearance.

use std::fmt::Write as _;

use age_data::axis::{from_engine, to_engine};
use age_data::{Bone, BoneId, DataError, Skeleton, TokenParser};
use glam::Vec3;
use log::{debug, warn};

use crate::error::Result;

pub fn parse_skel(text: &str) -> Result<Skeleton> {
    let mut parser = TokenParser::new(text);
    let mut skeleton = Skeleton::default();
    let mut stack: Vec<BoneId> = Vec::new();
    let mut declared = None;

    while !parser.is_eof() {
        let tokens = parser.read_tokens()?;
        match tokens.first().map(String::as_str) {
            Some("NumBones") => {
                declared = tokens.get(1).and_then(|count| count.parse::<usize>().ok());
            }
            Some("bone") => {
                let name = tokens.get(1).cloned().ok_or_else(|| {
                    DataError::InvalidSkeleton("bone without a name".to_owned())
                })?;
                if !parser.skip_to("offset", None) {
                    return Err(DataError::InvalidSkeleton(format!(
                        "bone {name} has no offset"
                    ))
                    .into());
                }
                let offset = Vec3::from_array(parser.read_floats()?);
                let id = skeleton.bones.push(Bone {
                    name,
                    id: Some(skeleton.bones.len() as u32),
                    parent: stack.last().copied(),
                    offset: from_engine(offset),
                });
                stack.push(id);
            }
            Some("}") => {
                if stack.pop().is_none() {
                    return Err(DataError::InvalidSkeleton(format!(
                        "unbalanced '}}' on line {}",
                        parser.tell()
                    ))
                    .into());
                }
            }
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(DataError::InvalidSkeleton(format!("{} bones are not closed", stack.len())).into());
    }
    if let Some(declared) = declared.filter(|&n| n != skeleton.len()) {
        warn!("NumBones says {declared} but {} bones were read", skeleton.len());
    }
    debug!("Parsed skeleton with {} bones", skeleton.len());
    Ok(skeleton)
}

pub fn write_skel(skeleton: &Skeleton) -> Result<String> {
    let mut out = String::new();
    let _ = writeln!(out, "NumBones {}", skeleton.len());
    for root in skeleton.roots() {
        write_bone(&mut out, skeleton, root, 0, 0)?;
    }
    Ok(out)
}

fn write_bone(
    out: &mut String,
    skeleton: &Skeleton,
    id: BoneId,
    depth: usize,
    guard: usize,
) -> Result<()> {
    if guard > skeleton.len() {
        return Err(DataError::InvalidSkeleton("bone hierarchy is cyclic".to_owned()).into());
    }
    let bone = skeleton.bones.try_get(id)?;
    let indent = "\t".repeat(depth);
    let offset = to_engine(bone.offset);
    let _ = writeln!(out, "{indent}bone {} {{", bone.name);
    let _ = writeln!(
        out,
        "{indent}\toffset {:.6} {:.6} {:.6}",
        offset.x, offset.y, offset.z
    );
    for child in skeleton.children(id) {
        write_bone(out, skeleton, child, depth + 1, guard + 1)?;
    }
    let _ = writeln!(out, "{indent}}}");
    Ok(())
}
