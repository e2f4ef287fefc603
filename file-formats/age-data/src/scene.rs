//! Host-side scene model handed to and returned from the mesh codecs.
//!
//! Positions, normals and UVs are in host space (Z up). The codecs convert
//! to engine space with [`crate::axis`] at the file boundary.

use std::path::PathBuf;

use custom_debug::Debug;
use glam::{Vec2, Vec3, Vec4};
use log::warn;

use crate::error::{DataError, Result};
use crate::index::{ArenaIndex, BoneId, MaterialId, Pool, VertexId};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneWeight {
    pub bone: BoneId,
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub weights: Vec<BoneWeight>,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position,
            normal,
            weights: Vec::new(),
        }
    }
}

/// Per-face-corner attributes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    pub vertex: VertexId,
    pub uv: Option<Vec2>,
    pub color: Option<Vec4>,
}

impl Corner {
    pub fn new(vertex: VertexId) -> Self {
        Self {
            vertex,
            uv: None,
            color: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub corners: Vec<Corner>,
    pub material: MaterialId,
}

impl Face {
    /// Fan triangulation of the polygon
    pub fn triangles(&self) -> impl Iterator<Item = [Corner; 3]> + '_ {
        (1..self.corners.len().saturating_sub(1))
            .map(|i| [self.corners[0], self.corners[i], self.corners[i + 1]])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureRef {
    /// Texture name without directory or extension
    pub name: String,
    /// File the name resolved to on import, if any
    pub path: Option<PathBuf>,
    /// Repeat (true) or clamp (false) addressing
    pub repeat: bool,
}

impl TextureRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            repeat: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    /// Base color, alpha in `w`
    pub diffuse: Vec4,
    pub specular: f32,
    pub shininess: f32,
    pub emissive: bool,
    /// Alpha blended rather than opaque
    pub blended: bool,
    pub snowable: bool,
    pub texture: Option<TextureRef>,
}

impl Material {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".to_owned(),
            diffuse: Vec4::ONE,
            specular: 0.0,
            shininess: 0.0,
            emissive: false,
            blended: false,
            snowable: false,
            texture: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub name: String,
    /// Object location in host space
    pub origin: Vec3,
    pub vertices: Pool<VertexId, Vertex>,
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub faces: Vec<Face>,
    pub materials: Pool<MaterialId, Material>,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_vertex(&mut self, position: Vec3, normal: Vec3) -> VertexId {
        self.vertices.push(Vertex::new(position, normal))
    }

    pub fn triangle_count(&self) -> usize {
        self.faces
            .iter()
            .map(|face| face.corners.len().saturating_sub(2))
            .sum()
    }

    pub fn has_uvs(&self) -> bool {
        self.faces
            .iter()
            .flat_map(|face| &face.corners)
            .any(|corner| corner.uv.is_some())
    }

    pub fn has_colors(&self) -> bool {
        self.faces
            .iter()
            .flat_map(|face| &face.corners)
            .any(|corner| corner.color.is_some())
    }

    /// Materials as exported: a single "default" material stands in when
    /// the mesh has none
    pub fn export_materials(&self) -> Vec<Material> {
        if self.materials.is_empty() {
            vec![Material::default()]
        } else {
            self.materials.values().cloned().collect()
        }
    }

    /// Material slot a face exports into, clamped to the exported list
    pub fn export_material_slot(&self, face: &Face) -> usize {
        face.material.index().min(self.materials.len().saturating_sub(1))
    }

    /// Verify every corner points at an existing vertex
    pub fn validate(&self) -> Result<()> {
        for corner in self.faces.iter().flat_map(|face| &face.corners) {
            self.vertices.try_get(corner.vertex)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    /// Stable numeric id; when every bone has one they define export order
    pub id: Option<u32>,
    pub parent: Option<BoneId>,
    /// Rest position relative to the parent bone, host space
    pub offset: Vec3,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Skeleton {
    pub bones: Pool<BoneId, Bone>,
}

impl Skeleton {
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn roots(&self) -> impl Iterator<Item = BoneId> + '_ {
        self.bones
            .iter()
            .filter(|(_, bone)| bone.parent.is_none())
            .map(|(id, _)| id)
    }

    pub fn children(&self, parent: BoneId) -> impl Iterator<Item = BoneId> + '_ {
        self.bones
            .iter()
            .filter(move |(_, bone)| bone.parent == Some(parent))
            .map(|(id, _)| id)
    }

    pub fn find(&self, name: &str) -> Option<BoneId> {
        self.bones
            .iter()
            .find(|(_, bone)| bone.name == name)
            .map(|(id, _)| id)
    }

    /// Rest position in host space: the sum of offsets up the parent chain
    pub fn world_position(&self, bone: BoneId) -> Result<Vec3> {
        let mut position = Vec3::ZERO;
        let mut current = Some(bone);
        let mut steps = 0;
        while let Some(id) = current {
            if steps > self.bones.len() {
                return Err(DataError::InvalidSkeleton(format!(
                    "parent chain of bone {bone} is cyclic"
                )));
            }
            let bone = self.bones.try_get(id)?;
            position += bone.offset;
            current = bone.parent;
            steps += 1;
        }
        Ok(position)
    }

    /// Bones in the order their matrices are written.
    ///
    /// When every bone carries an id the ids decide the order and must be
    /// dense `0..N`; otherwise pool order is used, with a warning when only
    /// some bones carry one.
    pub fn export_order(&self) -> Result<Vec<BoneId>> {
        let with_ids = self.bones.values().filter(|bone| bone.id.is_some()).count();
        if self.bones.is_empty() || with_ids < self.bones.len() {
            if with_ids > 0 {
                warn!(
                    "Only {with_ids} of {} bones have ids; exporting in pool order",
                    self.bones.len()
                );
            }
            return Ok(self.bones.ids().collect());
        }

        let mut order: Vec<Option<BoneId>> = vec![None; self.bones.len()];
        for (id, bone) in self.bones.iter() {
            let slot = bone.id.map_or(usize::MAX, |value| value as usize);
            match order.get_mut(slot) {
                Some(entry @ None) => *entry = Some(id),
                Some(Some(_)) => {
                    return Err(DataError::InvalidSkeleton(format!(
                        "bone id {slot} is used twice"
                    )));
                }
                None => {
                    return Err(DataError::InvalidSkeleton(format!(
                        "bone id {slot} of '{}' is outside 0..{}",
                        bone.name,
                        self.bones.len()
                    )));
                }
            }
        }
        Ok(order.into_iter().flatten().collect())
    }
}

/// A decoded value plus the number of faces dropped because they referenced
/// missing or degenerate data
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub value: T,
    pub skipped_faces: usize,
}
