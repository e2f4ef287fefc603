//! DLP groups to host meshes.
//!
//! Each group becomes one mesh. Polygon patches become faces; curved
//! patches are left out. Corners sharing a vertex table entry and normal
//! share a host vertex.

use std::collections::HashMap;

use age_data::axis::{from_engine, uv_from_engine};
use age_data::key::Vec3Key;
use age_data::{
    Corner, Decoded, Face, ImportContext, Material, MaterialId, Mesh, TextureRef,
    Vertex, VertexId,
};
use glam::{Vec3, Vec4};
use log::{debug, warn};

use crate::error::Result;
use crate::file::{DlpFile, DlpGroup, DlpVertex};

fn color_from_bytes(color: [u8; 4]) -> Vec4 {
    Vec4::from_array(color.map(|c| f32::from(c) / 255.0))
}

/// Host material for a (material, texture) pair of 1-based references
fn import_material(file: &DlpFile, material: u16, texture: u16, context: &ImportContext) -> Material {
    let texture = usize::from(texture)
        .checked_sub(1)
        .and_then(|slot| file.textures.get(slot));
    let mut result = match usize::from(material).checked_sub(1) {
        Some(slot) => match file.materials.get(slot) {
            Some(source) => Material {
                name: source.name.clone(),
                diffuse: source.diffuse,
                specular: source.specular.truncate().max_element(),
                shininess: source.shininess,
                emissive: source.emission.truncate() != Vec3::ZERO,
                blended: source.diffuse.w < 1.0,
                ..Material::default()
            },
            None => {
                warn!("Material {material} of {} does not exist", file.materials.len());
                Material::default()
            }
        },
        None => Material::default(),
    };
    if let Some(texture) = texture {
        result.name = format!("{}_{}", result.name, texture.name);
        result.texture = Some(TextureRef {
            name: texture.name.clone(),
            path: context.resolve(&texture.name),
            repeat: true,
        });
    }
    result
}

/// Convert one group.
///
/// Patches that are missing, reference vertices past the table or repeat a
/// vertex are logged, skipped and counted.
pub fn import_group(file: &DlpFile, group: &DlpGroup, context: &ImportContext) -> Result<Decoded<Mesh>> {
    let mut mesh = Mesh::new(group.name.clone());
    let mut material_slots: HashMap<(u16, u16), MaterialId> = HashMap::new();
    let mut vertex_ids: HashMap<(u16, Vec3Key), VertexId> = HashMap::new();
    let mut skipped = 0usize;
    let mut curved = 0usize;

    let mut corner = |mesh: &mut Mesh, vertex: &DlpVertex| -> std::result::Result<Corner, String> {
        let position = *file.vertices.get(usize::from(vertex.index)).ok_or_else(|| {
            format!("vertex {} of {} does not exist", vertex.index, file.vertices.len())
        })?;
        let id = *vertex_ids
            .entry((vertex.index, Vec3Key::from(vertex.normal)))
            .or_insert_with(|| {
                mesh.vertices
                    .push(Vertex::new(from_engine(position), from_engine(vertex.normal)))
            });
        Ok(Corner {
            vertex: id,
            uv: Some(uv_from_engine(vertex.uv)),
            color: Some(color_from_bytes(vertex.color)),
        })
    };

    for &patch_index in &group.patch_indices {
        let Some(patch) = file.patches.get(usize::from(patch_index)) else {
            warn!(
                "Group {}: patch {patch_index} of {} does not exist; skipping face",
                group.name,
                file.patches.len()
            );
            skipped += 1;
            continue;
        };
        if !patch.is_polygon() {
            curved += 1;
            continue;
        }

        let corners: std::result::Result<Vec<Corner>, String> = patch
            .vertices
            .iter()
            .map(|vertex| corner(&mut mesh, vertex))
            .collect();
        let corners = corners.and_then(|corners| {
            let repeated = corners
                .iter()
                .enumerate()
                .any(|(i, a)| corners[i + 1..].iter().any(|b| a.vertex == b.vertex));
            if repeated {
                Err("patch repeats a vertex".to_owned())
            } else {
                Ok(corners)
            }
        });
        let corners = match corners {
            Ok(corners) => corners,
            Err(reason) => {
                warn!("Group {} patch {patch_index}: {reason}; skipping face", group.name);
                skipped += 1;
                continue;
            }
        };

        let material = *material_slots
            .entry((patch.material, patch.texture))
            .or_insert_with(|| {
                mesh.materials
                    .push(import_material(file, patch.material, patch.texture, context))
            });
        mesh.faces.push(Face { corners, material });
    }

    if curved > 0 {
        debug!("Group {}: left out {curved} curved patches", group.name);
    }
    debug!(
        "Imported group {}: {} vertices, {} faces, {} materials, {} skipped",
        group.name,
        mesh.vertices.len(),
        mesh.faces.len(),
        mesh.materials.len(),
        skipped
    );
    Ok(Decoded {
        value: mesh,
        skipped_faces: skipped,
    })
}

/// Convert every group, in file order
pub fn import_groups(file: &DlpFile, context: &ImportContext) -> Result<Vec<Decoded<Mesh>>> {
    file.groups
        .iter()
        .map(|group| import_group(file, group, context))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::{DlpMaterial, DlpPatch, DlpTexture};
    use age_data::ArenaIndex;
    use glam::Vec2;
    use pretty_assertions::assert_eq;

    fn corner(index: u16, normal: Vec3) -> DlpVertex {
        DlpVertex {
            index,
            normal,
            uv: Vec2::new(0.25, 0.25),
            color: [255, 0, 0, 255],
        }
    }

    fn polygon(indices: &[u16], material: u16, texture: u16) -> DlpPatch {
        DlpPatch {
            resolution: indices.len() as u16,
            stride: 1,
            flags: 0,
            material,
            texture,
            physics: 0,
            vertices: indices.iter().map(|&i| corner(i, Vec3::Y)).collect(),
            user_data: None,
        }
    }

    fn square() -> DlpFile {
        DlpFile {
            groups: vec![DlpGroup {
                name: "deck".to_owned(),
                vertex_indices: vec![0, 1, 2, 3],
                patch_indices: vec![0, 1],
            }],
            patches: vec![polygon(&[0, 1, 2], 1, 0), polygon(&[0, 2, 3], 1, 1)],
            vertices: vec![
                Vec3::ZERO,
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            materials: vec![DlpMaterial {
                name: "wood".to_owned(),
                emission: Vec4::ZERO,
                ambient: Vec4::ZERO,
                diffuse: Vec4::new(0.5, 0.4, 0.3, 1.0),
                specular: Vec4::new(0.1, 0.2, 0.3, 1.0),
                shininess: 8.0,
            }],
            textures: vec![DlpTexture {
                name: "planks".to_owned(),
                flags: 0,
            }],
        }
    }

    #[test]
    fn polygons_share_vertices() {
        let file = square();
        let mesh = import_group(&file, &file.groups[0], &ImportContext::none())
            .unwrap()
            .value;
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.faces.len(), 2);
        assert_eq!(mesh.triangle_count(), 2);
        // engine +Z lands on host +Y, engine +X on host -X
        let positions: Vec<Vec3> = mesh.vertices.values().map(|v| v.position).collect();
        assert_eq!(positions[2], Vec3::new(-1.0, 1.0, 0.0));
        assert_eq!(mesh.vertices.values().next().unwrap().normal, Vec3::Z);
    }

    #[test]
    fn textured_patches_get_their_own_material() {
        let file = square();
        let mesh = import_group(&file, &file.groups[0], &ImportContext::none())
            .unwrap()
            .value;
        let names: Vec<&str> = mesh.materials.values().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["wood", "wood_planks"]);
        assert_eq!(mesh.faces[1].material.index(), 1);
        let textured = &mesh.materials.as_slice()[1];
        assert_eq!(textured.texture.as_ref().unwrap().name, "planks");
        assert_eq!(textured.specular, 0.3);
        assert!(!textured.emissive);
    }

    #[test]
    fn corners_carry_uv_and_color() {
        let file = square();
        let mesh = import_group(&file, &file.groups[0], &ImportContext::none())
            .unwrap()
            .value;
        let corner = mesh.faces[0].corners[0];
        assert_eq!(corner.uv, Some(Vec2::new(0.25, 0.75)));
        assert_eq!(corner.color, Some(Vec4::new(1.0, 0.0, 0.0, 1.0)));
    }

    #[test]
    fn split_normals_split_vertices() {
        let mut file = square();
        file.patches[1].vertices[0].normal = Vec3::X;
        let mesh = import_group(&file, &file.groups[0], &ImportContext::none())
            .unwrap()
            .value;
        assert_eq!(mesh.vertices.len(), 5);
    }

    #[test]
    fn bad_patches_are_skipped_and_counted() {
        let mut file = square();
        file.patches.push(polygon(&[0, 1, 9], 0, 0));
        file.patches.push(polygon(&[0, 1, 1], 0, 0));
        file.groups[0].patch_indices.extend([2, 3, 40]);
        let decoded = import_group(&file, &file.groups[0], &ImportContext::none()).unwrap();
        assert_eq!(decoded.skipped_faces, 3);
        assert_eq!(decoded.value.faces.len(), 2);
        decoded.value.validate().unwrap();
    }

    #[test]
    fn curved_patches_are_left_out() {
        let mut file = square();
        let mut grid = polygon(&[0, 1, 2, 3], 0, 0);
        grid.resolution = 2;
        grid.stride = 2;
        file.patches.push(grid);
        file.groups[0].patch_indices.push(2);
        let decoded = import_group(&file, &file.groups[0], &ImportContext::none()).unwrap();
        assert_eq!(decoded.skipped_faces, 0);
        assert_eq!(decoded.value.faces.len(), 2);
    }
}
