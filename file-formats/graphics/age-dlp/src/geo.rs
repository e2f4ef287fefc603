//! GEO scene text, the asset manager's authoring input that compiles to DLP.
//!
//! One file holds every object of a scene: a shared material, texture and
//! vertex table, one `facet` per face, one `group` per object, and combined
//! `H`, `M`, `L` and `VL` groups collecting the objects whose names end in
//! the matching level-of-detail suffix. Vertex and facet references are
//! 1-based and run across all objects.

use std::fmt::Write;
use std::path::Path;

use age_data::axis::to_engine;
use age_data::{ArenaIndex, Corner, Material, Mesh};
use glam::{Vec2, Vec3, Vec4};
use log::debug;

use crate::error::Result;

/// Level-of-detail groups, matched against `_<name>` object suffixes
const LOD_GROUPS: [&str; 4] = ["H", "M", "L", "VL"];
/// Facet numbers per `patch` line
const PATCH_LINE: usize = 10;
const FACET_FLAGS: &str = "solid shade cull zread zwrite antialias";

fn texture_name(material: &Material) -> Option<&str> {
    material.texture.as_ref().map(|texture| texture.name.as_str())
}

/// Materials and textures shared by every object, first use wins
#[derive(Default)]
struct Catalog<'a> {
    materials: Vec<Material>,
    textures: Vec<(&'a str, String, bool)>,
}

impl<'a> Catalog<'a> {
    fn collect(meshes: &'a [Mesh]) -> Self {
        let mut catalog = Self::default();
        for mesh in meshes {
            for material in mesh.export_materials() {
                if !catalog.materials.iter().any(|m| m.name == material.name) {
                    catalog.materials.push(material);
                }
            }
            for texture in mesh.materials.values().filter_map(|m| m.texture.as_ref()) {
                let source = texture
                    .path
                    .as_ref()
                    .map_or_else(|| texture.name.clone(), |p| p.display().to_string());
                match catalog
                    .textures
                    .iter_mut()
                    .find(|(name, ..)| *name == texture.name)
                {
                    Some((_, _, repeat)) => *repeat |= texture.repeat,
                    None => catalog
                        .textures
                        .push((texture.name.as_str(), source, texture.repeat)),
                }
            }
        }
        catalog
    }
}

fn join<T: ToString>(values: impl IntoIterator<Item = T>) -> String {
    values
        .into_iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_patch(out: &mut String, name: &str, facets: &[usize]) {
    let _ = writeln!(out, "group {name} {{\n\tpatch");
    for line in facets.chunks(PATCH_LINE) {
        let _ = writeln!(out, "\t    {}", join(line));
    }
    out.push_str("}\n\n");
}

fn write_facet(
    out: &mut String,
    mesh: &Mesh,
    corners: &[Corner],
    material: &Material,
    first_vertex: usize,
) {
    let _ = writeln!(out, "facet {{\n\tres      {}", corners.len());
    out.push_str("\tpriority 50\n\tmap      1 1\n\ttile    1.000000 1.000000\n");
    let _ = writeln!(out, "\tmaterial {}", material.name);
    if let Some(texture) = texture_name(material) {
        let _ = writeln!(out, "\ttexture  {texture}");
    }
    let colors = mesh.has_colors();
    let _ = writeln!(
        out,
        "\tflags {{ {}{FACET_FLAGS} }}",
        if colors { "cpv " } else { "" }
    );

    let vertices = corners.iter().map(|c| c.vertex.index() + first_vertex);
    let _ = writeln!(out, "\tvx {}", join(vertices));

    if colors {
        out.push_str("\tcpv\n");
        for corner in corners {
            let c = corner.color.unwrap_or(Vec4::ONE);
            let _ = writeln!(out, "\t\t{:.6} {:.6} {:.6} {:.6}", c.x, c.y, c.z, c.w);
        }
    }
    if mesh.has_uvs() {
        let uvs: Vec<Vec2> = corners
            .iter()
            .map(|corner| corner.uv.unwrap_or(Vec2::ZERO))
            .collect();
        let s = join(uvs.iter().map(|uv| format!("{:.6}", uv.x)));
        let t = join(uvs.iter().map(|uv| format!("{:.6}", uv.y)));
        let _ = writeln!(out, "\tsmap\n\t\t{s}\n\ttmap\n\t\t{t}");
    }

    out.push_str("\tnormals {\n");
    for corner in corners {
        let normal = mesh
            .vertices
            .get(corner.vertex)
            .map_or(Vec3::ZERO, |v| to_engine(v.normal));
        let _ = writeln!(out, "\t\t{:.6} {:.6} {:.6}", normal.x, normal.y, normal.z);
    }
    out.push_str("\t}\n}\n\n");
}

/// Render `meshes` as one GEO scene. `title` goes on the first line.
pub fn write_geo(title: &str, meshes: &[Mesh]) -> Result<String> {
    for mesh in meshes {
        mesh.validate()?;
    }
    let catalog = Catalog::collect(meshes);

    // facet numbers of each object, in output order
    let mut next_facet = 1;
    let facets: Vec<Vec<usize>> = meshes
        .iter()
        .map(|mesh| {
            let count = mesh.faces.iter().filter(|f| f.corners.len() >= 3).count();
            let range = (next_facet..next_facet + count).collect();
            next_facet += count;
            range
        })
        .collect();
    let lod_groups: Vec<(&str, Vec<usize>)> = LOD_GROUPS
        .iter()
        .map(|&lod| {
            let suffix = format!("_{lod}");
            let members: Vec<usize> = meshes
                .iter()
                .zip(&facets)
                .filter(|(mesh, _)| mesh.name.to_uppercase().ends_with(&suffix))
                .flat_map(|(_, facets)| facets.iter().copied())
                .collect();
            (lod, members)
        })
        .filter(|(_, members)| !members.is_empty())
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "## Geo3 {title}");
    let _ = writeln!(
        out,
        "## Vertices        {}",
        meshes.iter().map(|m| m.vertices.len()).sum::<usize>()
    );
    let _ = writeln!(out, "## Elements        {}", next_facet - 1);
    let _ = writeln!(out, "## Groups          {}", meshes.len() + lod_groups.len());
    let _ = writeln!(out, "## Materials       {}", catalog.materials.len());
    let _ = writeln!(out, "## Textures        {}\n", catalog.textures.len());

    for material in &catalog.materials {
        let d = material.diffuse;
        let _ = writeln!(
            out,
            "material {} {{\n\tdiffuse          {:.6}          {:.6}          {:.6}\n}}\n",
            material.name, d.x, d.y, d.z
        );
    }
    for (name, source, repeat) in &catalog.textures {
        let flags = if *repeat { "color swrap twrap" } else { "color" };
        let _ = writeln!(out, "texture {name} {{\n\tsource \"{source}\"\n\t{flags}\n}}\n");
    }

    for mesh in meshes {
        for vertex in mesh.vertices.values() {
            let v = to_engine(vertex.position);
            let _ = writeln!(out, "vx     {:.6}     {:.6}    {:.6}", v.x, v.y, v.z);
        }
    }
    out.push('\n');

    let mut first_vertex = 1;
    for mesh in meshes {
        let materials = mesh.export_materials();
        for face in mesh.faces.iter().filter(|f| f.corners.len() >= 3) {
            let material = &materials[mesh.export_material_slot(face)];
            write_facet(&mut out, mesh, &face.corners, material, first_vertex);
        }
        first_vertex += mesh.vertices.len();
    }

    for (mesh, facets) in meshes.iter().zip(&facets) {
        write_patch(&mut out, &mesh.name, facets);
    }
    for (lod, members) in &lod_groups {
        write_patch(&mut out, lod, members);
    }
    out.push_str("## EOF\n");

    debug!(
        "Wrote GEO: {} objects, {} facets, {} LOD groups",
        meshes.len(),
        next_facet - 1,
        lod_groups.len()
    );
    Ok(out)
}

pub fn save_geo(path: impl AsRef<Path>, meshes: &[Mesh]) -> Result<()> {
    let path = path.as_ref();
    let text = write_geo(&path.display().to_string(), meshes)?;
    age_data::save_bytes(path, text.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use age_data::{Face, MaterialId, TextureRef};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn quad(name: &str, material: Option<Material>) -> Mesh {
        let mut mesh = Mesh::new(name);
        let ids: Vec<_> = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
            .into_iter()
            .map(|(x, y)| mesh.add_vertex(Vec3::new(x, y, 0.0), Vec3::Z))
            .collect();
        if let Some(material) = material {
            mesh.materials.push(material);
        }
        mesh.faces.push(Face {
            corners: ids.into_iter().map(Corner::new).collect(),
            material: MaterialId(0),
        });
        mesh
    }

    #[test]
    fn single_object_layout() {
        let text = write_geo("shop/geo/box.geo", &[quad("box", None)]).unwrap();
        assert_eq!(
            text,
            "## Geo3 shop/geo/box.geo
## Vertices        4
## Elements        1
## Groups          1
## Materials       1
## Textures        0

material default {
\tdiffuse          1.000000          1.000000          1.000000
}

vx     -0.000000     0.000000    0.000000
vx     -1.000000     0.000000    0.000000
vx     -1.000000     0.000000    1.000000
vx     -0.000000     0.000000    1.000000

facet {
\tres      4
\tpriority 50
\tmap      1 1
\ttile    1.000000 1.000000
\tmaterial default
\tflags { solid shade cull zread zwrite antialias }
\tvx 1 2 3 4
\tnormals {
\t\t-0.000000 1.000000 0.000000
\t\t-0.000000 1.000000 0.000000
\t\t-0.000000 1.000000 0.000000
\t\t-0.000000 1.000000 0.000000
\t}
}

group box {
\tpatch
\t    1
}

## EOF
"
        );
    }

    #[test]
    fn objects_share_tables_and_lod_groups() {
        let mut brick = Material::named("brick");
        brick.texture = Some(TextureRef::named("brick_wall"));
        let mut body_h = quad("body_H", Some(brick.clone()));
        body_h.faces[0].corners[0].uv = Some(Vec2::new(0.5, 0.25));
        body_h.faces[0].corners[1].color = Some(Vec4::new(1.0, 0.0, 0.0, 1.0));
        let meshes = [body_h, quad("wheel_h", Some(brick)), quad("body_l", None)];

        let text = write_geo("car.geo", &meshes).unwrap();
        assert!(text.contains("## Elements        3\n## Groups          5\n"));
        assert!(text.contains("## Materials       2\n## Textures        1\n"));
        assert!(text.contains(
            "texture brick_wall {\n\tsource \"brick_wall\"\n\tcolor swrap twrap\n}\n"
        ));
        assert!(text.contains("\ttexture  brick_wall\n\tflags { cpv solid"));
        assert!(text.contains(
            "\tsmap\n\t\t0.500000 0.000000 0.000000 0.000000\n\ttmap\n\t\t0.250000 0.000000"
        ));
        assert!(text.contains(
            "\tcpv\n\t\t1.000000 1.000000 1.000000 1.000000\n\t\t1.000000 0.000000"
        ));
        assert!(text.contains("\tvx 5 6 7 8\n"));
        assert!(text.contains("\tvx 9 10 11 12\n"));
        assert!(text.contains("group H {\n\tpatch\n\t    1 2\n}\n"));
        assert!(text.contains("group L {\n\tpatch\n\t    3\n}\n"));
        assert!(!text.contains("group M {"));
        assert!(text.ends_with("## EOF\n"));
    }

    #[test_case("door_h", Some("H") ; "lowercase suffix")]
    #[test_case("DOOR_VL", Some("VL") ; "very low suffix")]
    #[test_case("door_xl", None ; "unknown suffix")]
    #[test_case("doorh", None ; "no separator")]
    fn lod_group_follows_the_name_suffix(name: &str, group: Option<&str>) {
        let text = write_geo("door.geo", &[quad(name, None)]).unwrap();
        for lod in LOD_GROUPS {
            let expected = group == Some(lod);
            assert_eq!(text.contains(&format!("group {lod} {{")), expected, "{lod}");
        }
    }

    #[test]
    fn long_groups_wrap_every_ten_facets() {
        let mut mesh = quad("fence", None);
        let face = mesh.faces[0].clone();
        mesh.faces.extend(std::iter::repeat_n(face, 11));
        let text = write_geo("fence.geo", &[mesh]).unwrap();
        assert!(text.contains("\t    1 2 3 4 5 6 7 8 9 10\n\t    11 12\n"));
    }
}
