//! TER terrain section grids.
//!
//! The bound's ground plane is cut into columns and rows of roughly 10
//! units. Each section lists the faces that touch it, tested in 2-D on
//! section bounds grown by 0.1 on every side.
//!
//! ```text
//! f32 1.1, u32 face count, u32 0, u8 0
//! f32 width, height, depth              extents along engine X, Y, Z
//! u32 columns, u32 1, u32 rows, u32 section count
//! u32 total face references
//! f32 columns / width, f32 1, f32 rows / depth   infinite for zero extents
//! f32 x 3 min, f32 x 3 max              engine-space bounding box
//! u16 first reference per section
//! u16 reference count per section
//! u16 face indices
//! ```
//!
//! Sections are stored row by row; within a row, columns run from the
//! largest engine X to the smallest.

use age_data::axis::from_engine;
use age_data::{LeReader, LeWriter};
use custom_debug::Debug;
use glam::{DVec2, Vec3};
use log::{debug, warn};

use crate::bound::Bound;
use crate::error::{BndError, Result};

pub const TER_VERSION: f32 = 1.1;
/// Target section edge length
pub const SECTION_SIZE: f64 = 10.0;
/// Margin added around each section before testing faces against it
pub const SECTION_MARGIN: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct TerFile {
    pub face_count: u32,
    /// Extents along engine X, Y and Z
    pub size: Vec3,
    /// Sections along engine X, Y and Z; Y is always 1
    pub grid: [u32; 3],
    /// Sections per unit along each axis
    pub scale: Vec3,
    pub bbox_min: Vec3,
    pub bbox_max: Vec3,
    /// Face indices touching each section
    #[debug(with = age_utils::debug::trimmed_collection_fmt)]
    pub sections: Vec<Vec<u16>>,
}

impl TerFile {
    /// Compute the section grid of a bound
    pub fn build(bound: &Bound) -> Result<Self> {
        if bound.faces.len() > usize::from(u16::MAX) + 1 {
            return Err(BndError::TooMany {
                what: "faces",
                count: bound.faces.len(),
            });
        }

        // section tests run on the host ground plane
        let host: Vec<Vec3> = bound.vertices.iter().map(|&v| from_engine(v)).collect();
        let (host_min, host_max) = if host.is_empty() {
            (Vec3::ZERO, Vec3::ZERO)
        } else {
            host.iter().fold(
                (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
                |(min, max), &v| (min.min(v), max.max(v)),
            )
        };
        let width = f64::from((host_max.x - host_min.x).abs());
        let height = f64::from((host_max.z - host_min.z).abs());
        let depth = f64::from((host_max.y - host_min.y).abs());
        let columns = ((width / SECTION_SIZE).ceil() as u32).max(1);
        let rows = ((depth / SECTION_SIZE).ceil() as u32).max(1);
        let section_width = (1.0 / f64::from(columns)) * width;
        let section_depth = (1.0 / f64::from(rows)) * depth;
        let origin = DVec2::new(f64::from(host_min.x), f64::from(host_min.y));

        let mut sections = Vec::with_capacity((columns * rows) as usize);
        for row in 0..rows {
            for column in (0..columns).rev() {
                let low = origin
                    + DVec2::new(f64::from(column) * section_width, f64::from(row) * section_depth);
                let high = origin
                    + DVec2::new(
                        f64::from(column + 1) * section_width,
                        f64::from(row + 1) * section_depth,
                    );
                sections.push(Section::new(
                    low - DVec2::splat(SECTION_MARGIN),
                    high + DVec2::splat(SECTION_MARGIN),
                ));
            }
        }

        let flat = |v: u32| {
            let p = host[v as usize];
            DVec2::new(f64::from(p.x), f64::from(p.y))
        };
        bound.validate()?;
        let mut lists: Vec<Vec<u16>> = vec![Vec::new(); sections.len()];
        for (index, face) in bound.faces.iter().enumerate() {
            let polygon: Vec<DVec2> = face.vertices.iter().map(|&v| flat(v)).collect();
            let sides: Vec<(DVec2, DVec2)> =
                face.sides().map(|(a, b)| (flat(a), flat(b))).collect();
            for (section, list) in sections.iter().zip(&mut lists) {
                if section.touches(&polygon, &sides) {
                    list.push(index as u16);
                }
            }
        }

        let references: usize = lists.iter().map(Vec::len).sum();
        let ratio = |count: u32, extent: f64| {
            if extent == 0.0 {
                f32::INFINITY
            } else {
                (f64::from(count) / extent) as f32
            }
        };
        debug!(
            "TER grid {columns}x{rows} over {width:.2}x{depth:.2}: {references} face references"
        );
        Ok(Self {
            face_count: bound.faces.len() as u32,
            size: Vec3::new(width as f32, height as f32, depth as f32),
            grid: [columns, 1, rows],
            scale: Vec3::new(ratio(columns, width), 1.0, ratio(rows, depth)),
            bbox_min: Vec3::new(-host_max.x, host_min.z, host_min.y),
            bbox_max: Vec3::new(-host_min.x, host_max.z, host_max.y),
            sections: lists,
        })
    }

    pub fn reference_count(&self) -> usize {
        self.sections.iter().map(Vec::len).sum()
    }
}

/// Grown section rectangle on the host ground plane
struct Section {
    min: DVec2,
    max: DVec2,
    corners: [DVec2; 4],
}

impl Section {
    fn new(min: DVec2, max: DVec2) -> Self {
        let corners = [
            min,
            DVec2::new(max.x, min.y),
            max,
            DVec2::new(min.x, max.y),
        ];
        Self { min, max, corners }
    }

    fn edges(&self) -> [(DVec2, DVec2); 4] {
        let [a, b, c, d] = self.corners;
        [(a, b), (b, c), (d, c), (a, d)]
    }

    fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.y >= self.min.y && p.x <= self.max.x && p.y <= self.max.y
    }

    fn touches(&self, polygon: &[DVec2], sides: &[(DVec2, DVec2)]) -> bool {
        let (face_min, face_max) = polygon.iter().fold(
            (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
            |(min, max), &p| (min.min(p), max.max(p)),
        );
        if !rects_overlap(face_min, face_max, self.min, self.max) {
            return false;
        }
        // the face covers a corner of the section
        if self.corners.iter().any(|&corner| point_in_polygon(corner, polygon)) {
            return true;
        }
        sides.iter().any(|&(a, b)| {
            if self.contains(a) || self.contains(b) {
                return true;
            }
            a != b && self.edges().iter().any(|&(c, d)| segments_cross(c, d, a, b))
        })
    }
}

fn rects_overlap(a_min: DVec2, a_max: DVec2, b_min: DVec2, b_max: DVec2) -> bool {
    a_min.x <= b_max.x && a_max.x >= b_min.x && a_min.y <= b_max.y && a_max.y >= b_min.y
}

/// Even-odd crossing test
pub fn point_in_polygon(p: DVec2, polygon: &[DVec2]) -> bool {
    let Some(&first) = polygon.first() else {
        return false;
    };
    let n = polygon.len();
    let mut inside = false;
    let mut p1 = first;
    for i in 0..=n {
        let p2 = polygon[i % n];
        if p.y > p1.y.min(p2.y) && p.y <= p1.y.max(p2.y) && p.x <= p1.x.max(p2.x) {
            // p.y lies strictly above one end, so the side is not horizontal
            let crossing = (p.y - p1.y) * (p2.x - p1.x) / (p2.y - p1.y) + p1.x;
            if p1.x == p2.x || p.x <= crossing {
                inside = !inside;
            }
        }
        p1 = p2;
    }
    inside
}

/// Proper crossing of segments `a-b` and `c-d`; touching ends and near
/// parallel segments do not count
pub fn segments_cross(a: DVec2, b: DVec2, c: DVec2, d: DVec2) -> bool {
    let det = (b.x - a.x) * (d.y - c.y) - (d.x - c.x) * (b.y - a.y);
    if det.abs() < 0.001 {
        return false;
    }
    let lambda = ((d.y - c.y) * (d.x - a.x) + (c.x - d.x) * (d.y - a.y)) / det;
    let gamma = ((a.y - b.y) * (d.x - a.x) + (b.x - a.x) * (d.y - a.y)) / det;
    0.0 < lambda && lambda < 1.0 && 0.0 < gamma && gamma < 1.0
}

pub fn parse(data: &[u8]) -> Result<TerFile> {
    let mut reader = LeReader::new(data);
    let version = reader.read_f32()?;
    if (version - TER_VERSION).abs() > 1e-4 {
        warn!("TER version {version}, expected {TER_VERSION}");
    }
    let face_count = reader.read_u32()?;
    reader.skip(5)?;
    let size = reader.read_vec3()?;
    let grid = [reader.read_u32()?, reader.read_u32()?, reader.read_u32()?];
    let section_count = reader.read_u32()? as usize;
    let expected = grid
        .iter()
        .try_fold(1usize, |total, &n| total.checked_mul(n as usize));
    if expected != Some(section_count) {
        return Err(BndError::MalformedHeader(format!(
            "{section_count} sections in a {}x{}x{} grid",
            grid[0], grid[1], grid[2]
        )));
    }
    let references = reader.read_u32()? as usize;
    let scale = reader.read_vec3()?;
    let bbox_min = reader.read_vec3()?;
    let bbox_max = reader.read_vec3()?;
    let starts = reader.read_u16_array(section_count)?;
    let counts = reader.read_u16_array(section_count)?;
    let indices = reader.read_u16_array(references)?;

    let sections = starts
        .iter()
        .zip(&counts)
        .map(|(&start, &count)| {
            let (start, end) = (usize::from(start), usize::from(start) + usize::from(count));
            indices.get(start..end).map(<[u16]>::to_vec).ok_or_else(|| {
                BndError::MalformedHeader(format!(
                    "section run {start}..{end} outside {references} references"
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(TerFile {
        face_count,
        size,
        grid,
        scale,
        bbox_min,
        bbox_max,
        sections,
    })
}

pub fn write(ter: &TerFile) -> Result<Vec<u8>> {
    let mut writer = LeWriter::new();
    writer.write_f32(TER_VERSION);
    writer.write_u32(ter.face_count);
    writer.write_u32(0);
    writer.write_u8(0);
    writer.write_vec3(ter.size);
    for n in ter.grid {
        writer.write_u32(n);
    }
    writer.write_u32(ter.sections.len() as u32);
    writer.write_u32(ter.reference_count() as u32);
    writer.write_vec3(ter.scale);
    writer.write_vec3(ter.bbox_min);
    writer.write_vec3(ter.bbox_max);

    let mut start = 0usize;
    for section in &ter.sections {
        let value = u16::try_from(start).map_err(|_| BndError::TooMany {
            what: "face references",
            count: ter.reference_count(),
        })?;
        writer.write_u16(value);
        start += section.len();
    }
    for section in &ter.sections {
        let count = u16::try_from(section.len()).map_err(|_| BndError::TooMany {
            what: "faces in one section",
            count: section.len(),
        })?;
        writer.write_u16(count);
    }
    for section in &ter.sections {
        writer.write_u16_slice(section);
    }
    Ok(writer.into_inner())
}
