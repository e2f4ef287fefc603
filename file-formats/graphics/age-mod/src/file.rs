//! In-memory representation of a MOD file, shared by the text and binary
//! drivers. Pools are stored in engine space exactly as written.

use std::fmt;
use std::str::FromStr;

use age_data::{AdjunctIndex, ColorIndex, MatrixSlot, NormalIndex, PointIndex, UvIndex};
use custom_debug::Debug;
use glam::{Vec2, Vec3, Vec4};

use crate::error::{ModError, Result};
use crate::version::{FormatVersion, Layout};

/// Lighting model of a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Illumination {
    #[default]
    Diffuse,
    Emit,
}

impl Illumination {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Diffuse => "diffuse",
            Self::Emit => "emit",
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Self::Diffuse => 0,
            Self::Emit => 1,
        }
    }

    pub fn from_byte(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Diffuse),
            1 => Ok(Self::Emit),
            other => Err(ModError::MalformedHeader(format!(
                "unknown illumination mode {other}"
            ))),
        }
    }
}

impl FromStr for Illumination {
    type Err = ModError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "diffuse" => Ok(Self::Diffuse),
            "emit" => Ok(Self::Emit),
            other => Err(ModError::MalformedHeader(format!(
                "unknown illumination mode '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Illumination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeValue {
    Float(f32),
    Int(i32),
}

impl AttributeValue {
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Int(_) => "int",
        }
    }

    pub fn as_f32(self) -> f32 {
        match self {
            Self::Float(value) => value,
            Self::Int(value) => value as f32,
        }
    }
}

/// Typed material parameter (`float shininess: 0.5`)
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
}

impl Attribute {
    pub fn float(name: impl Into<String>, value: f32) -> Self {
        Self {
            name: name.into(),
            value: AttributeValue::Float(value),
        }
    }

    pub fn int(name: impl Into<String>, value: i32) -> Self {
        Self {
            name: name.into(),
            value: AttributeValue::Int(value),
        }
    }
}

/// One de-duplicated corner: indices into the file pools plus the slot of
/// the bone matrix inside the owning packet. Legacy adjuncts have no slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Adjunct {
    pub vertex: PointIndex,
    pub normal: NormalIndex,
    pub color: ColorIndex,
    pub uv0: UvIndex,
    pub uv1: UvIndex,
    pub matrix: Option<MatrixSlot>,
}

impl Adjunct {
    /// Index fields in file order
    pub fn fields(&self) -> Vec<u32> {
        let mut fields = vec![
            self.vertex.value(),
            self.normal.value(),
            self.color.value(),
            self.uv0.value(),
            self.uv1.value(),
        ];
        fields.extend(self.matrix.map(MatrixSlot::value));
        fields
    }

    /// Build from 5 (legacy) or 6 (packet) index fields
    pub fn from_fields(fields: &[u32]) -> Option<Self> {
        let [vertex, normal, color, uv0, uv1, rest @ ..] = fields else {
            return None;
        };
        Some(Self {
            vertex: PointIndex(*vertex),
            normal: NormalIndex(*normal),
            color: ColorIndex(*color),
            uv0: UvIndex(*uv0),
            uv1: UvIndex(*uv1),
            matrix: rest.first().copied().map(MatrixSlot),
        })
    }
}

/// Primitive record. Strips keep their raw index run and expand on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Primitive {
    /// `tri a b c`; consecutive triples
    Triangles(Vec<AdjunctIndex>),
    /// `str` (counter-clockwise start) or `stp` (clockwise start)
    Strip {
        clockwise: bool,
        indices: Vec<AdjunctIndex>,
    },
}

impl Primitive {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Triangles(_) => "tri",
            Self::Strip {
                clockwise: false, ..
            } => "str",
            Self::Strip { clockwise: true, .. } => "stp",
        }
    }

    pub fn indices(&self) -> &[AdjunctIndex] {
        match self {
            Self::Triangles(indices) | Self::Strip { indices, .. } => indices,
        }
    }

    /// Binary primitive kind byte
    pub fn kind_byte(&self) -> u8 {
        match self {
            Self::Triangles(_) => 0,
            Self::Strip {
                clockwise: false, ..
            } => 1,
            Self::Strip { clockwise: true, .. } => 2,
        }
    }

    pub fn from_kind(kind: u8, indices: Vec<AdjunctIndex>) -> Result<Self> {
        match kind {
            0 => Ok(Self::Triangles(indices)),
            1 => Ok(Self::Strip {
                clockwise: false,
                indices,
            }),
            2 => Ok(Self::Strip {
                clockwise: true,
                indices,
            }),
            other => Err(ModError::MalformedHeader(format!(
                "unknown primitive kind {other}"
            ))),
        }
    }

    /// Expand into triangles. Strips alternate winding after every
    /// triangle, starting from the record's winding flag.
    pub fn triangles(&self) -> Vec<[AdjunctIndex; 3]> {
        match self {
            Self::Triangles(indices) => indices
                .chunks_exact(3)
                .map(|t| [t[0], t[1], t[2]])
                .collect(),
            Self::Strip { clockwise, indices } => {
                let mut clockwise = *clockwise;
                indices
                    .windows(3)
                    .map(|w| {
                        let tri = if clockwise {
                            [w[1], w[0], w[2]]
                        } else {
                            [w[0], w[1], w[2]]
                        };
                        clockwise = !clockwise;
                        tri
                    })
                    .collect()
            }
        }
    }

    pub fn triangle_count(&self) -> usize {
        match self {
            Self::Triangles(indices) => indices.len() / 3,
            Self::Strip { indices, .. } => indices.len().saturating_sub(2),
        }
    }
}

/// Bounded batch of primitives sharing a local adjunct table and matrix list
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Packet {
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub adjuncts: Vec<Adjunct>,
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub primitives: Vec<Primitive>,
    /// Global bone matrix indices, addressed by [`Adjunct::matrix`]
    pub matrices: Vec<u32>,
    /// Optional reskin count from the packet header
    pub reskins: Option<u32>,
}

impl Packet {
    pub fn triangle_count(&self) -> usize {
        self.primitives.iter().map(Primitive::triangle_count).sum()
    }

    /// Global matrix an adjunct is bound to
    pub fn matrix_of(&self, adjunct: &Adjunct) -> Option<u32> {
        adjunct
            .matrix
            .and_then(|slot| self.matrices.get(slot.value() as usize).copied())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MaterialGeometry {
    Packets(Vec<Packet>),
    /// Primitives indexing the file's flat adjunct list. `adjunct_count` is
    /// the optional `adjuncts:` field of the material block.
    Legacy {
        adjunct_count: Option<u32>,
        primitives: Vec<Primitive>,
    },
}

impl MaterialGeometry {
    pub fn primitive_count(&self) -> usize {
        match self {
            Self::Packets(packets) => packets.iter().map(|p| p.primitives.len()).sum(),
            Self::Legacy { primitives, .. } => primitives.len(),
        }
    }

    pub fn triangle_count(&self) -> usize {
        match self {
            Self::Packets(packets) => packets.iter().map(Packet::triangle_count).sum(),
            Self::Legacy { primitives, .. } => {
                primitives.iter().map(Primitive::triangle_count).sum()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Packets(packets) => packets.is_empty(),
            Self::Legacy { primitives, .. } => primitives.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModMaterial {
    pub name: String,
    pub illumination: Illumination,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    /// The engine reads at most one texture
    pub textures: Vec<String>,
    pub attributes: Vec<Attribute>,
    pub geometry: MaterialGeometry,
}

impl ModMaterial {
    pub fn attribute(&self, name: &str) -> Option<AttributeValue> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value)
    }
}

/// A complete MOD document
#[derive(Debug, Clone, PartialEq)]
pub struct ModFile {
    pub version: FormatVersion,
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub vertices: Vec<Vec3>,
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub normals: Vec<Vec3>,
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub colors: Vec<Vec4>,
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub tex1s: Vec<Vec2>,
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub tex2s: Vec<Vec2>,
    /// `matrices:` header field; the bone count of the bound skeleton
    pub matrix_count: u32,
    pub reskins: u32,
    pub materials: Vec<ModMaterial>,
    /// Flat adjunct list of the legacy layout
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub adjuncts: Vec<Adjunct>,
    /// Vertices per bone, in bone order
    pub mtxv: Vec<u32>,
    /// Normals per bone, in bone order
    pub mtxn: Vec<u32>,
}

impl ModFile {
    pub fn new(version: FormatVersion) -> Self {
        Self {
            version,
            vertices: Vec::new(),
            normals: Vec::new(),
            colors: Vec::new(),
            tex1s: Vec::new(),
            tex2s: Vec::new(),
            matrix_count: 0,
            reskins: 0,
            materials: Vec::new(),
            adjuncts: Vec::new(),
            mtxv: Vec::new(),
            mtxn: Vec::new(),
        }
    }

    /// Layout of the stored geometry; files without materials count as
    /// the version's own layout
    pub fn layout(&self) -> Layout {
        match self.materials.first().map(|m| &m.geometry) {
            Some(MaterialGeometry::Packets(_)) => Layout::Packets,
            Some(MaterialGeometry::Legacy { .. }) => Layout::Legacy,
            None => self.version.layout(),
        }
    }

    /// `adjuncts:` header value
    pub fn adjunct_count(&self) -> usize {
        match self.layout() {
            Layout::Legacy => self.adjuncts.len(),
            Layout::Packets => self
                .packets()
                .map(|packet| packet.adjuncts.len())
                .sum(),
        }
    }

    pub fn primitive_count(&self) -> usize {
        self.materials
            .iter()
            .map(|m| m.geometry.primitive_count())
            .sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.materials
            .iter()
            .map(|m| m.geometry.triangle_count())
            .sum()
    }

    pub fn packets(&self) -> impl Iterator<Item = &Packet> {
        self.materials
            .iter()
            .filter_map(|m| match &m.geometry {
                MaterialGeometry::Packets(packets) => Some(packets.as_slice()),
                MaterialGeometry::Legacy { .. } => None,
            })
            .flatten()
    }

    pub fn packet_count(&self) -> usize {
        self.packets().count()
    }

    /// Reject files mixing both layouts before encoding
    pub fn check_layout(&self) -> Result<Layout> {
        let layout = self.layout();
        let mixed = self.materials.iter().any(|m| {
            matches!(
                (&m.geometry, layout),
                (MaterialGeometry::Legacy { .. }, Layout::Packets)
                    | (MaterialGeometry::Packets(_), Layout::Legacy)
            )
        });
        if mixed {
            return Err(ModError::LayoutMismatch {
                version: self.version,
                reason: "materials mix packet and legacy geometry".to_owned(),
            });
        }
        Ok(layout)
    }
}
