//! Host mesh to and from BMS conversion.
//!
//! Corners are de-duplicated into adjuncts over the whole mesh. Triangles and
//! quads become surfaces; other polygons still produce adjuncts but no
//! surface.

use std::collections::HashMap;

use age_data::axis::{from_engine, to_engine, uv_from_engine, uv_to_engine};
use age_data::key::{Vec2Key, Vec3Key, Vec4Key};
use age_data::{
    ArenaIndex, Corner, Decoded, Face, ImportContext, Material, MaterialId, Mesh, TextureRef,
    Vertex, VertexId,
};
use glam::{Vec2, Vec3, Vec4};
use log::{debug, warn};

use crate::error::{BmsError, Result};
use crate::file::{BBOX_MIN_POINTS, BmsFile, BmsTexture, Surface};
use crate::flags::{MeshFlags, TextureFlags, TextureProps};
use crate::normals::{pack_normal, unpack_normal};

/// Offsets closer to the origin than this are not flagged
const OFFSET_EPSILON: f32 = 0.001;

/// Channels written on export. Channels the mesh does not carry are left out
/// regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BmsExportOptions {
    pub normals: bool,
    pub colors: bool,
    pub uvs: bool,
    pub planes: bool,
}

impl Default for BmsExportOptions {
    fn default() -> Self {
        Self {
            normals: true,
            colors: true,
            uvs: true,
            planes: true,
        }
    }
}

/// Plane through three engine-space points: unit normal and distance term.
///
/// A degenerate triangle yields a zero normal instead of failing.
pub fn compute_plane(p1: Vec3, p2: Vec3, p3: Vec3) -> Vec4 {
    let u = p3 - p2;
    let v = p1 - p2;
    let mut normal = u.cross(v);
    let length = normal.length();
    if length != 0.0 {
        normal /= length;
    }
    normal.extend(-normal.dot(p2))
}

/// Float color to BGRA bytes, clamped and truncated
fn color_to_bgra(color: Vec4) -> [u8; 4] {
    let byte = |c: f32| (c * 255.0).clamp(0.0, 255.0) as u8;
    [byte(color.z), byte(color.y), byte(color.x), byte(color.w)]
}

fn color_from_bgra(bgra: [u8; 4]) -> Vec4 {
    let [b, g, r, a] = bgra.map(|c| f32::from(c) / 255.0);
    Vec4::new(r, g, b, a)
}

/// Eight corners of the host-space bounds, in the order the engine expects
fn bbox_corners(min: Vec3, max: Vec3) -> [Vec3; 8] {
    [
        Vec3::new(min.x, min.y, min.z),
        Vec3::new(max.x, min.y, min.z),
        Vec3::new(max.x, min.y, max.z),
        Vec3::new(min.x, min.y, max.z),
        Vec3::new(min.x, max.y, min.z),
        Vec3::new(max.x, max.y, min.z),
        Vec3::new(max.x, max.y, max.z),
        Vec3::new(min.x, max.y, max.z),
    ]
}

fn export_texture(material: &Material) -> BmsTexture {
    let mut flags = TextureFlags::empty();
    let mut props = TextureProps::empty();
    let mut param = 2.0;

    if material.emissive {
        props |= TextureProps::NOT_LIT;
    }
    let name = match &material.texture {
        Some(texture) => {
            if texture.repeat {
                flags |= TextureFlags::WRAP;
            } else {
                props |= TextureProps::CLAMP;
            }
            texture.name.clone()
        }
        None => material.name.clone(),
    };
    if material.blended {
        flags |= TextureFlags::ALPHA;
        props |= TextureProps::TRANSPARENT;
    }
    if material.snowable {
        param = 4.0;
        props |= TextureProps::SNOWABLE;
    }

    BmsTexture {
        name,
        flags,
        props,
        param,
        color_bgra: color_to_bgra(material.diffuse),
    }
}

type AdjunctKey = (Vec3Key, Option<Vec3Key>, Option<Vec2Key>, Option<Vec4Key>);

/// Convert a host mesh into a BMS document
pub fn export_mesh(mesh: &Mesh, options: &BmsExportOptions) -> Result<BmsFile> {
    mesh.validate()?;
    let uvs_enabled = options.uvs && mesh.has_uvs();
    let colors_enabled = options.colors && mesh.has_colors();

    let materials = mesh.export_materials();
    if materials.len() > usize::from(u8::MAX) {
        return Err(BmsError::TooManyTextures(materials.len()));
    }

    let vertices = mesh.vertices.as_slice();
    if vertices.len() > usize::from(u16::MAX) + 1 {
        return Err(BmsError::TooManyPoints(vertices.len()));
    }
    let radius = vertices
        .iter()
        .map(|v| v.position.length())
        .fold(0.0f32, f32::max);
    let (min, max) = if vertices.is_empty() {
        (Vec3::ZERO, Vec3::ZERO)
    } else {
        vertices.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(min, max), v| (min.min(v.position), max.max(v.position)),
        )
    };
    let corners = bbox_corners(min, max);
    let box_radius = corners.iter().map(|c| c.length()).fold(0.0f32, f32::max);

    let mut file = BmsFile {
        offset: to_engine(mesh.origin),
        radius,
        radius_squared: radius * radius,
        box_radius,
        textures: materials.iter().map(export_texture).collect(),
        points: vertices.iter().map(|v| to_engine(v.position)).collect(),
        bbox: (vertices.len() >= BBOX_MIN_POINTS).then(|| corners.map(to_engine)),
        ..BmsFile::default()
    };

    let mut adjunct_ids: HashMap<AdjunctKey, u16> = HashMap::new();
    let mut face_adjuncts: Vec<Vec<u16>> = Vec::with_capacity(mesh.faces.len());
    for face in &mesh.faces {
        let mut indices = Vec::with_capacity(face.corners.len());
        for corner in &face.corners {
            let vertex = mesh.vertices.try_get(corner.vertex)?;
            let uv = corner.uv.unwrap_or(Vec2::ZERO);
            let color = corner.color.unwrap_or(Vec4::ONE);
            let key = (
                Vec3Key::from(vertex.position),
                options.normals.then(|| Vec3Key::from(vertex.normal)),
                uvs_enabled.then(|| Vec2Key::from(uv)),
                colors_enabled.then(|| Vec4Key::from(color)),
            );
            let index = match adjunct_ids.get(&key) {
                Some(&index) => index,
                None => {
                    let next = file.adjunct_points.len();
                    let index = u16::try_from(next)
                        .map_err(|_| BmsError::TooManyAdjuncts(next + 1))?;
                    file.adjunct_points.push(corner.vertex.index() as u16);
                    if options.normals {
                        file.normals.push(pack_normal(to_engine(vertex.normal)));
                    }
                    if uvs_enabled {
                        file.uvs.push(uv_to_engine(uv));
                    }
                    if colors_enabled {
                        file.colors.push(color_to_bgra(color));
                    }
                    adjunct_ids.insert(key, index);
                    index
                }
            };
            indices.push(index);
        }
        face_adjuncts.push(indices);
    }

    let mut dropped = 0usize;
    for (face, indices) in mesh.faces.iter().zip(&face_adjuncts) {
        let surface: Surface = match indices.as_slice() {
            &[a, b, c] => [a, b, c, 0],
            // a quad may not end in 0, which marks triangles
            &[a, b, c, 0] => [0, a, b, c],
            &[a, b, c, d] => [a, b, c, d],
            _ => {
                dropped += 1;
                continue;
            }
        };
        if options.planes {
            let point = |i: usize| to_engine(vertices[face.corners[i].vertex.index()].position);
            file.planes.push(compute_plane(point(0), point(1), point(2)));
        }
        file.surface_textures.push(mesh.export_material_slot(face) as u8 + 1);
        file.surfaces.push(surface);
    }
    if dropped > 0 {
        warn!("{dropped} faces are neither triangles nor quads and were not exported");
    }

    file.flags.set(MeshFlags::UVS, uvs_enabled);
    file.flags.set(MeshFlags::NORMALS, options.normals);
    file.flags.set(MeshFlags::COLORS, colors_enabled);
    file.flags.set(
        MeshFlags::OFFSET,
        mesh.origin.abs().max_element() > OFFSET_EPSILON,
    );
    file.flags.set(MeshFlags::PLANES, options.planes);
    file.cache_size = file.compute_cache_size();

    debug!(
        "Exported BMS: {} points, {} adjuncts, {} surfaces, {} textures",
        file.points.len(),
        file.adjunct_count(),
        file.surface_count(),
        file.textures.len()
    );
    Ok(file)
}

fn import_material(texture: &BmsTexture, context: &ImportContext) -> Material {
    Material {
        name: texture.name.clone(),
        diffuse: color_from_bgra(texture.color_bgra),
        specular: 0.0,
        shininess: 0.0,
        emissive: texture.props.contains(TextureProps::NOT_LIT),
        blended: texture.flags.contains(TextureFlags::ALPHA),
        snowable: texture.props.contains(TextureProps::SNOWABLE),
        texture: Some(TextureRef {
            name: texture.name.clone(),
            path: context.resolve(&texture.name),
            repeat: !texture.props.contains(TextureProps::CLAMP),
        }),
    }
}

/// Rebuild a host mesh from a BMS document.
///
/// Vertices are shared between adjuncts with the same point position and
/// normal index. Surfaces with bad references or repeated vertices are
/// logged, skipped and counted.
pub fn import_mesh(file: &BmsFile, name: &str, context: &ImportContext) -> Result<Decoded<Mesh>> {
    let mut mesh = Mesh::new(name);
    mesh.origin = from_engine(file.offset);
    for texture in &file.textures {
        mesh.materials.push(import_material(texture, context));
    }

    let has_normals = file.flags.contains(MeshFlags::NORMALS);
    let has_uvs = file.flags.contains(MeshFlags::UVS);
    let has_colors = file.flags.contains(MeshFlags::COLORS);

    let mut vertex_ids: HashMap<(Vec3Key, Option<u8>), VertexId> = HashMap::new();
    let mut corner = |mesh: &mut Mesh, adjunct: u16| -> std::result::Result<Corner, String> {
        let adjunct = usize::from(adjunct);
        let point = *file
            .adjunct_points
            .get(adjunct)
            .ok_or_else(|| format!("adjunct {adjunct} does not exist"))?;
        let position = *file
            .points
            .get(usize::from(point))
            .ok_or_else(|| format!("point {point} does not exist"))?;
        let normal_index = if has_normals {
            Some(file.normals[adjunct])
        } else {
            None
        };
        let normal = match normal_index {
            Some(index) => unpack_normal(index)
                .ok_or_else(|| format!("normal index {index} is outside the table"))?,
            None => Vec3::ZERO,
        };

        let vertex = *vertex_ids
            .entry((Vec3Key::from(position), normal_index))
            .or_insert_with(|| {
                mesh.vertices
                    .push(Vertex::new(from_engine(position), from_engine(normal)))
            });
        Ok(Corner {
            vertex,
            uv: has_uvs.then(|| uv_from_engine(file.uvs[adjunct])),
            color: has_colors.then(|| color_from_bgra(file.colors[adjunct])),
        })
    };

    file.validate()?;
    let mut skipped = 0usize;
    for (index, (surface, &texture)) in file
        .surfaces
        .iter()
        .zip(&file.surface_textures)
        .enumerate()
    {
        let sides = if surface[3] > 0 { 4 } else { 3 };
        let corners: std::result::Result<Vec<Corner>, String> = surface[..sides]
            .iter()
            .map(|&adjunct| corner(&mut mesh, adjunct))
            .collect();
        let corners = corners.and_then(|corners| {
            let repeated = corners
                .iter()
                .enumerate()
                .any(|(i, a)| corners[i + 1..].iter().any(|b| a.vertex == b.vertex));
            if repeated {
                Err("surface repeats a vertex".to_owned())
            } else {
                Ok(corners)
            }
        });
        let corners = match corners {
            Ok(corners) => corners,
            Err(reason) => {
                warn!("Surface {index}: {reason}; skipping face");
                skipped += 1;
                continue;
            }
        };

        let slot = usize::from(texture.saturating_sub(1));
        let material = if slot < mesh.materials.len() || texture == 0 {
            slot
        } else {
            warn!("Surface {index} uses texture {texture} of {}", mesh.materials.len());
            0
        };
        mesh.faces.push(Face {
            corners,
            material: MaterialId::from_usize(material),
        });
    }

    debug!(
        "Imported {} vertices, {} faces, {} skipped",
        mesh.vertices.len(),
        mesh.faces.len(),
        skipped
    );
    Ok(Decoded {
        value: mesh,
        skipped_faces: skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn quad_mesh() -> Mesh {
        let mut mesh = Mesh::new("quad");
        let ids: Vec<VertexId> = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ]
        .into_iter()
        .map(|p| mesh.add_vertex(p, Vec3::Z))
        .collect();
        mesh.faces.push(Face {
            corners: ids.iter().map(|&id| Corner::new(id)).collect(),
            material: MaterialId(0),
        });
        mesh
    }

    #[test]
    fn plane_of_a_floor_triangle() {
        let plane = compute_plane(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 0.0),
        );
        assert_eq!(plane, Vec4::new(0.0, 1.0, 0.0, -1.0));
    }

    #[test]
    fn degenerate_planes_have_zero_normals() {
        let plane = compute_plane(Vec3::ONE, Vec3::ONE, Vec3::ONE);
        assert_eq!(plane.truncate(), Vec3::ZERO);
    }

    #[test]
    fn quad_with_zero_last_is_rotated() {
        let mut mesh = Mesh::new("rotated");
        let ids: Vec<VertexId> = (0..5)
            .map(|i| mesh.add_vertex(Vec3::new(i as f32, (i * i) as f32, 0.0), Vec3::Z))
            .collect();
        // triangle claims adjunct 0 for vertex 0
        mesh.faces.push(Face {
            corners: vec![Corner::new(ids[0]), Corner::new(ids[1]), Corner::new(ids[2])],
            material: MaterialId(0),
        });
        mesh.faces.push(Face {
            corners: vec![
                Corner::new(ids[3]),
                Corner::new(ids[4]),
                Corner::new(ids[1]),
                Corner::new(ids[0]),
            ],
            material: MaterialId(0),
        });
        let file = export_mesh(&mesh, &BmsExportOptions::default()).unwrap();
        assert_eq!(file.surfaces, vec![[0, 1, 2, 0], [0, 3, 4, 1]]);

        let decoded = import_mesh(&file, "rotated", &ImportContext::none()).unwrap();
        assert_eq!(decoded.skipped_faces, 0);
        assert_eq!(decoded.value.faces[1].corners.len(), 4);
    }

    #[test]
    fn missing_channels_are_not_flagged() {
        let file = export_mesh(&quad_mesh(), &BmsExportOptions::default()).unwrap();
        assert!(!file.flags.contains(MeshFlags::UVS));
        assert!(!file.flags.contains(MeshFlags::COLORS));
        assert!(file.flags.contains(MeshFlags::NORMALS | MeshFlags::PLANES));
        assert!(file.uvs.is_empty());
        // host +Z is engine +Y
        assert_eq!(file.normals, vec![2; 4]);
        assert_eq!(file.textures[0].name, "default");
        assert_eq!(file.surface_textures, vec![1]);
    }

    #[test]
    fn offset_flag_follows_the_origin() {
        let mut mesh = quad_mesh();
        assert!(!export_mesh(&mesh, &BmsExportOptions::default())
            .unwrap()
            .flags
            .contains(MeshFlags::OFFSET));
        mesh.origin = Vec3::new(0.0, 0.0, 0.5);
        let file = export_mesh(&mesh, &BmsExportOptions::default()).unwrap();
        assert!(file.flags.contains(MeshFlags::OFFSET));
        assert_eq!(file.offset, Vec3::new(-0.0, 0.5, 0.0));
    }

    #[test]
    fn texture_entry_flags() {
        let mut material = Material::named("glass");
        material.blended = true;
        material.emissive = true;
        material.snowable = true;
        material.diffuse = Vec4::new(1.0, 0.5, 0.0, 1.0);
        let mut texture = TextureRef::named("glass_tex");
        texture.repeat = false;
        material.texture = Some(texture);

        let entry = export_texture(&material);
        assert_eq!(entry.name, "glass_tex");
        assert_eq!(entry.flags, TextureFlags::ALPHA);
        assert_eq!(
            entry.props,
            TextureProps::NOT_LIT | TextureProps::CLAMP | TextureProps::TRANSPARENT | TextureProps::SNOWABLE
        );
        assert_eq!(entry.param, 4.0);
        assert_eq!(entry.color_bgra, [0, 127, 255, 255]);

        let back = import_material(&entry, &ImportContext::none());
        assert!(back.blended && back.emissive && back.snowable);
        assert!(!back.texture.unwrap().repeat);
    }

    #[test]
    fn bad_surfaces_are_skipped() {
        let mut file = export_mesh(&quad_mesh(), &BmsExportOptions::default()).unwrap();
        file.surfaces.push([0, 1, 9, 0]);
        file.surfaces.push([0, 0, 1, 0]);
        file.surface_textures.extend([1, 1]);
        file.planes.extend([Vec4::ZERO, Vec4::ZERO]);
        let decoded = import_mesh(&file, "quad", &ImportContext::none()).unwrap();
        assert_eq!(decoded.value.faces.len(), 1);
        assert_eq!(decoded.skipped_faces, 2);
    }
}
