//! Bound geometry shared by the text, binary and terrain drivers.
//!
//! Vertices are stored in engine space. Faces are triangles or quads
//! referring to vertices, one material and, once built, one edge per side.

use std::collections::HashMap;

use age_data::axis::{from_engine, to_engine};
use age_data::{ArenaIndex, Corner, Decoded, Face, Material, MaterialId, Mesh, VertexId};
use custom_debug::Debug;
use glam::{Vec3, Vec4};
use log::{debug, warn};

use crate::error::{BndError, Result};

/// Diffuse colors picked by material name on import; the first key found
/// in the lowercased name wins
const MATERIAL_COLORS: [(&str, [f32; 3]); 9] = [
    ("grass", [0.0, 0.507, 0.005]),
    ("cobblestone", [0.040, 0.040, 0.040]),
    ("default", [1.0, 1.0, 1.0]),
    ("wood", [0.545, 0.27, 0.074]),
    ("dirt", [0.545, 0.35, 0.168]),
    ("mud", [0.345, 0.25, 0.068]),
    ("sand", [1.0, 0.78, 0.427]),
    ("water", [0.20, 0.458, 0.509]),
    ("deepwater", [0.15, 0.408, 0.459]),
];

pub fn material_color(name: &str) -> Vec4 {
    let name = name.to_lowercase();
    let rgb = MATERIAL_COLORS
        .iter()
        .find(|(key, _)| name.contains(key))
        .map_or([1.0, 1.0, 1.0], |(_, rgb)| *rgb);
    Vec3::from_array(rgb).extend(1.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundMaterial {
    pub name: String,
    pub elasticity: f32,
    pub friction: f32,
    /// 1.01 only
    pub effect: String,
    /// 1.01 only
    pub sound: String,
}

impl BoundMaterial {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elasticity: 0.1,
            friction: 0.5,
            effect: "none".to_owned(),
            sound: "none".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundFace {
    /// Three or four vertex indices
    pub vertices: Vec<u32>,
    pub material: u32,
    /// Edge index per side, side `i` running from vertex `i` to `i + 1`;
    /// empty until edges are built
    pub edges: Vec<u32>,
}

impl BoundFace {
    pub fn is_quad(&self) -> bool {
        self.vertices.len() == 4
    }

    /// Sides as vertex index pairs, in winding order
    pub fn sides(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bound {
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub vertices: Vec<Vec3>,
    pub materials: Vec<BoundMaterial>,
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub edges: Vec<[u32; 2]>,
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub faces: Vec<BoundFace>,
}

impl Bound {
    /// Collision geometry from a host mesh.
    ///
    /// Vertex positions are taken as they are, without the mesh origin.
    /// Faces that are neither triangles nor quads are dropped with a
    /// warning. A mesh without materials gets a single `default` one.
    pub fn from_mesh(mesh: &Mesh) -> Self {
        let mut bound = Bound {
            vertices: mesh.vertices.values().map(|v| to_engine(v.position)).collect(),
            materials: mesh
                .export_materials()
                .into_iter()
                .map(|material| BoundMaterial::named(material.name))
                .collect(),
            ..Bound::default()
        };

        let mut dropped = 0usize;
        for face in &mesh.faces {
            if !(3..=4).contains(&face.corners.len()) {
                dropped += 1;
                continue;
            }
            bound.faces.push(BoundFace {
                vertices: face.corners.iter().map(|c| c.vertex.value()).collect(),
                material: mesh.export_material_slot(face) as u32,
                edges: Vec::new(),
            });
        }
        if dropped > 0 {
            warn!("Dropped {dropped} faces with more than four sides from the bound");
        }
        bound.build_edges();
        bound
    }

    pub fn has_edges(&self) -> bool {
        self.faces.iter().all(|face| face.edges.len() == face.vertices.len())
    }

    /// Number the undirected edges in order of first use and point every
    /// face side at its edge
    pub fn build_edges(&mut self) {
        let mut ids: HashMap<(u32, u32), u32> = HashMap::new();
        let mut edges = Vec::new();
        for face in &mut self.faces {
            face.edges = face
                .sides()
                .map(|(a, b)| {
                    *ids.entry((a.min(b), a.max(b))).or_insert_with(|| {
                        edges.push([a, b]);
                        (edges.len() - 1) as u32
                    })
                })
                .collect();
        }
        debug!("Built {} edges for {} faces", edges.len(), self.faces.len());
        self.edges = edges;
    }

    /// Engine-space extents; zero for an empty bound
    pub fn extents(&self) -> (Vec3, Vec3) {
        if self.vertices.is_empty() {
            return (Vec3::ZERO, Vec3::ZERO);
        }
        self.vertices.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(min, max), &v| (min.min(v), max.max(v)),
        )
    }

    /// Check every face against the vertex, material and edge tables
    pub fn validate(&self) -> Result<()> {
        for (index, face) in self.faces.iter().enumerate() {
            let invalid = |reason: String| BndError::InvalidFace {
                face: index,
                reason,
            };
            if !(3..=4).contains(&face.vertices.len()) {
                return Err(invalid(format!("{} vertices", face.vertices.len())));
            }
            if let Some(v) = face.vertices.iter().find(|&&v| v as usize >= self.vertices.len()) {
                return Err(invalid(format!("vertex {v} of {}", self.vertices.len())));
            }
            if face.material as usize >= self.materials.len() {
                return Err(invalid(format!(
                    "material {} of {}",
                    face.material,
                    self.materials.len()
                )));
            }
            if let Some(e) = face.edges.iter().find(|&&e| e as usize >= self.edges.len()) {
                return Err(invalid(format!("edge {e} of {}", self.edges.len())));
            }
        }
        Ok(())
    }

    /// Host mesh for the bound.
    ///
    /// Normals are averaged from the faces around each vertex. Faces with
    /// missing or repeated vertices are logged, skipped and counted.
    pub fn to_mesh(&self, name: &str) -> Decoded<Mesh> {
        let mut mesh = Mesh::new(name);
        for material in &self.materials {
            let name = material.name.to_lowercase();
            mesh.materials.push(Material {
                diffuse: material_color(&name),
                ..Material::named(name)
            });
        }
        for &position in &self.vertices {
            mesh.add_vertex(from_engine(position), Vec3::ZERO);
        }

        let mut normals = vec![Vec3::ZERO; self.vertices.len()];
        let mut skipped = 0usize;
        for (index, face) in self.faces.iter().enumerate() {
            let vertex_count = self.vertices.len();
            let missing = face.vertices.iter().find(|&&v| v as usize >= vertex_count);
            let repeated = face
                .vertices
                .iter()
                .enumerate()
                .any(|(i, a)| face.vertices[i + 1..].contains(a));
            if let Some(v) = missing {
                warn!("Face {index}: vertex {v} of {vertex_count} does not exist; skipping face");
                skipped += 1;
                continue;
            }
            if repeated {
                warn!("Face {index} repeats a vertex; skipping face");
                skipped += 1;
                continue;
            }

            let material = if (face.material as usize) < self.materials.len() {
                face.material as usize
            } else {
                warn!(
                    "Face {index} uses material {} of {}",
                    face.material,
                    self.materials.len()
                );
                0
            };
            let corners: Vec<Corner> = face
                .vertices
                .iter()
                .map(|&v| Corner::new(VertexId(v)))
                .collect();

            let points: Vec<Vec3> = face
                .vertices
                .iter()
                .map(|&v| from_engine(self.vertices[v as usize]))
                .collect();
            let normal = (1..points.len() - 1)
                .map(|i| (points[i] - points[0]).cross(points[i + 1] - points[0]))
                .sum::<Vec3>();
            for &v in &face.vertices {
                normals[v as usize] += normal;
            }

            mesh.faces.push(Face {
                corners,
                material: MaterialId::from_usize(material),
            });
        }

        for (id, normal) in mesh.vertices.ids().zip(normals) {
            if let Some(vertex) = mesh.vertices.get_mut(id) {
                vertex.normal = normal.normalize_or_zero();
            }
        }
        debug!(
            "Bound to mesh: {} vertices, {} faces, {} skipped",
            mesh.vertices.len(),
            mesh.faces.len(),
            skipped
        );
        Decoded {
            value: mesh,
            skipped_faces: skipped,
        }
    }
}
