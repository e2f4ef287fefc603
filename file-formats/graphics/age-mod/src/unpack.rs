//! MOD to host mesh conversion.

use std::collections::HashMap;

use age_data::axis::{from_engine, uv_from_engine};
use age_data::key::Vec3Key;
use age_data::{
    AdjunctIndex, ArenaIndex, BoneId, BoneWeight, Corner, Decoded, Face, ImportContext, Material,
    MaterialId, Mesh, Skeleton, TextureRef, Vertex, VertexId,
};
use glam::{Vec3, Vec4};
use log::{debug, warn};

use crate::error::{ModError, Result};
use crate::file::{Adjunct, Illumination, MaterialGeometry, ModFile, ModMaterial};

/// Rebuild a host mesh from a MOD document.
///
/// With a skeleton, vertices are moved back from bone-local space using the
/// `mtxv` counts and weighted fully to their bone. Faces referencing
/// missing data are logged, skipped and counted.
pub fn import_mesh(
    file: &ModFile,
    name: &str,
    skeleton: Option<&Skeleton>,
    context: &ImportContext,
) -> Result<Decoded<Mesh>> {
    let skeleton = skeleton.filter(|s| !s.is_empty());
    let mut builder = MeshBuilder::new(file, name, skeleton)?;

    for (index, material) in file.materials.iter().enumerate() {
        builder.mesh.materials.push(convert_material(material, context));
        let material_id = MaterialId::from_usize(index);
        match &material.geometry {
            MaterialGeometry::Packets(packets) => {
                for packet in packets {
                    for primitive in &packet.primitives {
                        for triangle in primitive.triangles() {
                            builder.add_triangle(material, material_id, triangle, |index| {
                                packet.adjuncts.get(index.index())
                            });
                        }
                    }
                }
            }
            MaterialGeometry::Legacy { primitives, .. } => {
                for primitive in primitives {
                    for triangle in primitive.triangles() {
                        builder.add_triangle(material, material_id, triangle, |index| {
                            file.adjuncts.get(index.index())
                        });
                    }
                }
            }
        }
    }

    debug!(
        "Imported {} vertices, {} faces, {} skipped",
        builder.mesh.vertices.len(),
        builder.mesh.faces.len(),
        builder.skipped
    );
    Ok(Decoded {
        value: builder.mesh,
        skipped_faces: builder.skipped,
    })
}

fn convert_material(material: &ModMaterial, context: &ImportContext) -> Material {
    let specular = material.specular;
    Material {
        name: material.name.clone(),
        diffuse: material.diffuse.extend(1.0),
        specular: (specular.x + specular.y + specular.z) / 3.0,
        shininess: material
            .attribute("shininess")
            .map_or(0.0, |value| value.as_f32()),
        emissive: material.illumination == Illumination::Emit,
        blended: false,
        snowable: false,
        texture: material.textures.first().map(|name| TextureRef {
            name: name.clone(),
            path: context.resolve(name),
            repeat: true,
        }),
    }
}

struct MeshBuilder<'a> {
    file: &'a ModFile,
    mesh: Mesh,
    /// World-space (engine) positions
    positions: Vec<Vec3>,
    /// Bone of each position; only filled with a skeleton
    vertex_bones: Vec<Option<BoneId>>,
    vertex_ids: HashMap<(Vec3Key, Vec3Key, Option<BoneId>), VertexId>,
    skipped: usize,
}

impl<'a> MeshBuilder<'a> {
    fn new(file: &'a ModFile, name: &str, skeleton: Option<&Skeleton>) -> Result<Self> {
        let mut positions = file.vertices.clone();
        let mut vertex_bones = vec![None; positions.len()];

        if let Some(skeleton) = skeleton {
            if file.matrix_count as usize != skeleton.len() {
                return Err(ModError::SkeletonMismatch {
                    expected: file.matrix_count as usize,
                    actual: skeleton.len(),
                });
            }
            let order = skeleton.export_order()?;
            let mut start = 0usize;
            for (&count, &bone) in file.mtxv.iter().zip(&order) {
                let end = start + count as usize;
                if end > positions.len() {
                    return Err(ModError::MalformedHeader(format!(
                        "mtxv covers {end} vertices but the file has {}",
                        positions.len()
                    )));
                }
                let origin = age_data::axis::to_engine(skeleton.world_position(bone)?);
                for (position, slot) in positions[start..end]
                    .iter_mut()
                    .zip(&mut vertex_bones[start..end])
                {
                    *position += origin;
                    *slot = Some(bone);
                }
                start = end;
            }
        }

        Ok(Self {
            file,
            mesh: Mesh::new(name),
            positions,
            vertex_bones,
            vertex_ids: HashMap::new(),
            skipped: 0,
        })
    }

    fn add_triangle<'p>(
        &mut self,
        material: &ModMaterial,
        material_id: MaterialId,
        triangle: [AdjunctIndex; 3],
        lookup: impl Fn(AdjunctIndex) -> Option<&'p Adjunct>,
    ) {
        let corners = triangle.map(|index| {
            lookup(index)
                .ok_or_else(|| format!("adjunct {index} does not exist"))
                .and_then(|adjunct| self.corner(adjunct))
        });
        let result = match corners {
            [Ok(a), Ok(b), Ok(c)] => {
                if a.vertex == b.vertex || b.vertex == c.vertex || a.vertex == c.vertex {
                    Err("triangle repeats a vertex".to_owned())
                } else {
                    Ok([a, b, c])
                }
            }
            [Err(reason), _, _] | [_, Err(reason), _] | [_, _, Err(reason)] => Err(reason),
        };
        match result {
            Ok(corners) => self.mesh.faces.push(Face {
                corners: corners.to_vec(),
                material: material_id,
            }),
            Err(reason) => {
                let err = ModError::GeometryReference {
                    material: material.name.clone(),
                    reason,
                };
                warn!("{err}; skipping face");
                self.skipped += 1;
            }
        }
    }

    fn corner(&mut self, adjunct: &Adjunct) -> std::result::Result<Corner, String> {
        let file = self.file;
        let vertex_index = adjunct.vertex.index();
        let position = *self
            .positions
            .get(vertex_index)
            .ok_or_else(|| format!("vertex {} does not exist", adjunct.vertex))?;
        let normal = *file
            .normals
            .get(adjunct.normal.index())
            .ok_or_else(|| format!("normal {} does not exist", adjunct.normal))?;
        let uv = match file.tex1s.get(adjunct.uv0.index()) {
            Some(&uv) => Some(uv_from_engine(uv)),
            None if file.tex1s.is_empty() => None,
            None => return Err(format!("uv {} does not exist", adjunct.uv0)),
        };
        let color: Option<Vec4> = match file.colors.get(adjunct.color.index()) {
            Some(&color) => Some(color),
            None if file.colors.is_empty() => None,
            None => return Err(format!("color {} does not exist", adjunct.color)),
        };

        let bone = self.vertex_bones[vertex_index];
        let key = (Vec3Key::from(position), Vec3Key::from(normal), bone);
        let mesh = &mut self.mesh;
        let vertex = *self.vertex_ids.entry(key).or_insert_with(|| {
            let mut vertex = Vertex::new(from_engine(position), from_engine(normal));
            vertex
                .weights
                .extend(bone.map(|bone| BoneWeight { bone, weight: 1.0 }));
            mesh.vertices.push(vertex)
        });
        Ok(Corner { vertex, uv, color })
    }
}
