//! Host mesh to MOD conversion.
//!
//! Vertices are assigned to a single bone, de-duplicated per bone and moved
//! into that bone's local space. UVs and colors are pooled globally. Each
//! material's triangle corners are then greedily packed into packets that
//! respect the adjunct and matrix limits of the engine.

use std::collections::HashMap;

use age_data::axis::{to_engine, uv_to_engine};
use age_data::key::{Vec2Key, Vec3Key, Vec4Key, round_decimals};
use age_data::{
    AdjunctIndex, ArenaIndex, BoneId, ColorIndex, Material, MatrixSlot, Mesh, NormalIndex,
    PointIndex, Skeleton, UvIndex, Vertex, VertexId,
};
use glam::{Vec2, Vec3, Vec4};
use log::{debug, warn};

use crate::error::{ModError, Result};
use crate::file::{
    Adjunct, Attribute, Illumination, MaterialGeometry, ModFile, ModMaterial, Packet, Primitive,
};
use crate::version::{FormatVersion, Layout};

/// The engine addresses materials with a byte
pub const MAX_MATERIALS: usize = 255;

/// Export settings
#[derive(Debug, Clone, PartialEq)]
pub struct ModExportOptions {
    pub version: FormatVersion,
    /// A bone influences a vertex only above this weight
    pub weight_threshold: f32,
    pub max_packet_adjuncts: usize,
    pub max_packet_matrices: usize,
    /// Normals are rounded to this many decimals before de-duplication
    pub normal_decimals: u32,
}

impl Default for ModExportOptions {
    fn default() -> Self {
        Self {
            version: FormatVersion::V1_09,
            weight_threshold: 0.5,
            max_packet_adjuncts: 255,
            max_packet_matrices: 8,
            normal_decimals: 6,
        }
    }
}

impl ModExportOptions {
    pub fn with_version(version: FormatVersion) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.version.can_encode() {
            return Err(ModError::UnsupportedVersion(format!(
                "version {} can only be read",
                self.version
            )));
        }
        // a packet must hold at least one whole triangle
        if !(3..=255).contains(&self.max_packet_adjuncts) {
            return Err(ModError::InvalidOptions(format!(
                "max_packet_adjuncts must be within 3..=255, got {}",
                self.max_packet_adjuncts
            )));
        }
        if !(3..=255).contains(&self.max_packet_matrices) {
            return Err(ModError::InvalidOptions(format!(
                "max_packet_matrices must be within 3..=255, got {}",
                self.max_packet_matrices
            )));
        }
        Ok(())
    }
}

/// Triangle corner before packetization; `bone` is the global matrix index
#[derive(Debug, Clone, Copy)]
struct ExportCorner {
    bone: u32,
    adjunct: Adjunct,
}

/// Bone order and per-bone rest positions in engine space
struct BoneTable {
    slots: HashMap<BoneId, u32>,
    origins: Vec<Vec3>,
}

impl BoneTable {
    fn new(skeleton: Option<&Skeleton>) -> Result<Option<Self>> {
        let Some(skeleton) = skeleton.filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        let order = skeleton.export_order()?;
        let mut slots = HashMap::with_capacity(order.len());
        let mut origins = Vec::with_capacity(order.len());
        for (slot, &bone) in order.iter().enumerate() {
            slots.insert(bone, slot as u32);
            origins.push(to_engine(skeleton.world_position(bone)?));
        }
        Ok(Some(Self { slots, origins }))
    }

    fn len(&self) -> usize {
        self.origins.len()
    }

    /// Pick the single bone a vertex is exported under
    fn assign(&self, id: VertexId, vertex: &Vertex, threshold: f32) -> u32 {
        let mut candidates: Vec<(u32, f32)> = vertex
            .weights
            .iter()
            .filter(|w| w.weight > threshold)
            .filter_map(|w| self.slots.get(&w.bone).map(|&slot| (slot, w.weight)))
            .collect();
        match candidates.len() {
            0 => 0,
            1 => candidates[0].0,
            _ => {
                warn!(
                    "Vertex {id:?} is weighted to {} bones above {threshold}; keeping the strongest",
                    candidates.len()
                );
                candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
                candidates[0].0
            }
        }
    }
}

/// Convert a host mesh into a MOD document
pub fn export_mesh(
    mesh: &Mesh,
    skeleton: Option<&Skeleton>,
    options: &ModExportOptions,
) -> Result<ModFile> {
    options.validate()?;
    mesh.validate()?;

    let materials = mesh.export_materials();
    if materials.len() > MAX_MATERIALS {
        return Err(ModError::TooManyMaterials(materials.len()));
    }

    let bones = BoneTable::new(skeleton)?;
    let bone_count = bones.as_ref().map_or(1, BoneTable::len);
    let assignments: Vec<u32> = mesh
        .vertices
        .iter()
        .map(|(id, vertex)| {
            bones
                .as_ref()
                .map_or(0, |table| table.assign(id, vertex, options.weight_threshold))
        })
        .collect();

    let mut file = ModFile::new(options.version);
    file.matrix_count = bone_count as u32;
    file.reskins = 1;

    // Per-bone pools
    let mut by_bone: Vec<Vec<VertexId>> = vec![Vec::new(); bone_count];
    for (id, &bone) in mesh.vertices.ids().zip(&assignments) {
        by_bone[bone as usize].push(id);
    }
    let mut point_of = vec![PointIndex::default(); mesh.vertices.len()];
    let mut normal_of = vec![NormalIndex::default(); mesh.vertices.len()];
    for (bone, members) in by_bone.iter().enumerate() {
        let origin = bones.as_ref().map_or(Vec3::ZERO, |t| t.origins[bone]);
        let mut positions: HashMap<Vec3Key, PointIndex> = HashMap::new();
        let mut normals: HashMap<Vec3Key, NormalIndex> = HashMap::new();
        let (vertex_start, normal_start) = (file.vertices.len(), file.normals.len());

        for &id in members {
            let vertex = &mesh.vertices.as_slice()[id.index()];
            let position = to_engine(vertex.position);
            point_of[id.index()] = *positions.entry(position.into()).or_insert_with(|| {
                file.vertices.push(position - origin);
                PointIndex::from_usize(file.vertices.len() - 1)
            });
            let normal = round_decimals(to_engine(vertex.normal), options.normal_decimals);
            normal_of[id.index()] = *normals.entry(normal.into()).or_insert_with(|| {
                file.normals.push(normal);
                NormalIndex::from_usize(file.normals.len() - 1)
            });
        }
        file.mtxv.push((file.vertices.len() - vertex_start) as u32);
        file.mtxn.push((file.normals.len() - normal_start) as u32);
    }

    // Global UV and color pools, in corner order
    let mut uv_ids: HashMap<Vec2Key, UvIndex> = HashMap::new();
    let mut color_ids: HashMap<Vec4Key, ColorIndex> = HashMap::new();
    let mut corners: Vec<Vec<ExportCorner>> = vec![Vec::new(); materials.len()];
    for face in &mesh.faces {
        let slot = mesh.export_material_slot(face);
        for triangle in face.triangles() {
            for corner in triangle {
                let uv = corner.uv.map_or(Vec2::ZERO, uv_to_engine);
                let uv0 = *uv_ids.entry(uv.into()).or_insert_with(|| {
                    file.tex1s.push(uv);
                    UvIndex::from_usize(file.tex1s.len() - 1)
                });
                let color = corner.color.unwrap_or(Vec4::ONE);
                let color = *color_ids.entry(color.into()).or_insert_with(|| {
                    file.colors.push(color);
                    ColorIndex::from_usize(file.colors.len() - 1)
                });
                let vertex = corner.vertex.index();
                corners[slot].push(ExportCorner {
                    bone: assignments[vertex],
                    adjunct: Adjunct {
                        vertex: point_of[vertex],
                        normal: normal_of[vertex],
                        color,
                        uv0,
                        uv1: UvIndex(0),
                        matrix: None,
                    },
                });
            }
        }
    }

    match options.version.layout() {
        Layout::Packets => {
            for (material, corners) in materials.iter().zip(&corners) {
                let packets = build_packets(corners, options)?;
                if packets.is_empty() {
                    debug!("Dropping empty material {}", material.name);
                    continue;
                }
                file.materials.push(convert_material(
                    material,
                    options.version,
                    MaterialGeometry::Packets(packets),
                ));
            }
        }
        Layout::Legacy => {
            let mut adjunct_ids: HashMap<Adjunct, AdjunctIndex> = HashMap::new();
            for (material, corners) in materials.iter().zip(&corners) {
                if corners.len() < 3 {
                    debug!("Dropping empty material {}", material.name);
                    continue;
                }
                let mut primitives = Vec::with_capacity(corners.len() / 3);
                for triangle in corners.chunks_exact(3) {
                    let indices = triangle
                        .iter()
                        .map(|corner| {
                            *adjunct_ids.entry(corner.adjunct).or_insert_with(|| {
                                file.adjuncts.push(corner.adjunct);
                                AdjunctIndex::from_usize(file.adjuncts.len() - 1)
                            })
                        })
                        .collect();
                    primitives.push(Primitive::Triangles(indices));
                }
                file.materials.push(convert_material(
                    material,
                    options.version,
                    MaterialGeometry::Legacy {
                        adjunct_count: None,
                        primitives,
                    },
                ));
            }
        }
    }

    debug!(
        "Exported {} vertices, {} normals, {} materials, {} packets over {bone_count} bones",
        file.vertices.len(),
        file.normals.len(),
        file.materials.len(),
        file.packet_count()
    );
    Ok(file)
}

fn convert_material(
    material: &Material,
    version: FormatVersion,
    geometry: MaterialGeometry,
) -> ModMaterial {
    ModMaterial {
        name: material.name.clone(),
        illumination: if material.emissive {
            Illumination::Emit
        } else {
            Illumination::Diffuse
        },
        ambient: Vec3::ZERO,
        diffuse: material.diffuse.truncate(),
        specular: Vec3::splat(material.specular),
        textures: material
            .texture
            .iter()
            .map(|texture| texture.name.clone())
            .collect(),
        attributes: if version.has_attributes() {
            vec![Attribute::float("shininess", material.shininess)]
        } else {
            Vec::new()
        },
        geometry,
    }
}

/// Packet under construction
#[derive(Default)]
struct PacketBuilder {
    adjuncts: Vec<Adjunct>,
    adjunct_ids: HashMap<Adjunct, AdjunctIndex>,
    matrices: Vec<u32>,
    matrix_slots: HashMap<u32, MatrixSlot>,
    corners: Vec<AdjunctIndex>,
}

impl PacketBuilder {
    /// Try to add a corner; `false` when its bone would overflow the
    /// matrix list
    fn push(&mut self, corner: &ExportCorner, max_matrices: usize) -> bool {
        let slot = match self.matrix_slots.get(&corner.bone) {
            Some(&slot) => slot,
            None => {
                if self.matrices.len() >= max_matrices {
                    return false;
                }
                let slot = MatrixSlot::from_usize(self.matrices.len());
                self.matrices.push(corner.bone);
                self.matrix_slots.insert(corner.bone, slot);
                slot
            }
        };
        let adjunct = Adjunct {
            matrix: Some(slot),
            ..corner.adjunct
        };
        let index = *self.adjunct_ids.entry(adjunct).or_insert_with(|| {
            self.adjuncts.push(adjunct);
            AdjunctIndex::from_usize(self.adjuncts.len() - 1)
        });
        self.corners.push(index);
        true
    }

    /// Cut back to whole triangles. Adjuncts and matrices are appended in
    /// first-use order, so everything only the dropped corners introduced
    /// sits at the end of each list.
    fn finish(mut self) -> Packet {
        self.corners.truncate(self.corners.len() / 3 * 3);
        let adjunct_end = self
            .corners
            .iter()
            .map(|index| index.index() + 1)
            .max()
            .unwrap_or(0);
        self.adjuncts.truncate(adjunct_end);
        let matrix_end = self
            .adjuncts
            .iter()
            .filter_map(|adjunct| adjunct.matrix)
            .map(|slot| slot.index() + 1)
            .max()
            .unwrap_or(0);
        self.matrices.truncate(matrix_end);

        Packet {
            primitives: self
                .corners
                .chunks_exact(3)
                .map(|triangle| Primitive::Triangles(triangle.to_vec()))
                .collect(),
            adjuncts: self.adjuncts,
            matrices: self.matrices,
            reskins: None,
        }
    }
}

fn build_packets(corners: &[ExportCorner], options: &ModExportOptions) -> Result<Vec<Packet>> {
    let mut packets = Vec::new();
    let mut offset = 0;
    while offset + 3 <= corners.len() {
        let mut builder = PacketBuilder::default();
        for corner in &corners[offset..] {
            if !builder.push(corner, options.max_packet_matrices) {
                break;
            }
            if builder.adjuncts.len() >= options.max_packet_adjuncts {
                break;
            }
        }
        let consumed = builder.corners.len() / 3 * 3;
        if consumed == 0 {
            return Err(ModError::InvalidOptions(
                "packet limits leave no room for a single triangle".to_owned(),
            ));
        }
        offset += consumed;
        packets.push(builder.finish());
    }
    Ok(packets)
}
