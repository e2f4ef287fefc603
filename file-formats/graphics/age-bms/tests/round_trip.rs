//! Export, encode, decode and import of static meshes

use age_bms::{BmsExportOptions, MeshFlags, export_mesh, import_mesh, parse, write};
use age_data::{Corner, Face, ImportContext, Material, MaterialId, Mesh, TextureRef, VertexId};
use glam::{Vec2, Vec3, Vec4};
use pretty_assertions::assert_eq;
use test_case::test_case;

/// A `size` x `size` grid of quads with uvs and colors, two materials
fn grid(size: u32) -> Mesh {
    let mut mesh = Mesh::new("grid");
    mesh.origin = Vec3::new(10.0, -4.0, 1.5);
    let mut road = Material::named("road");
    road.texture = Some(TextureRef::named("asphalt"));
    mesh.materials.push(road);
    let mut grass = Material::named("grass");
    grass.snowable = true;
    grass.diffuse = Vec4::new(0.2, 0.8, 0.2, 1.0);
    mesh.materials.push(grass);

    let stride = size + 1;
    for y in 0..=size {
        for x in 0..=size {
            let height = ((x * 7 + y * 3) % 5) as f32 * 0.25;
            mesh.add_vertex(Vec3::new(x as f32, y as f32, height), Vec3::Z);
        }
    }
    for y in 0..size {
        for x in 0..size {
            let corner = |cx: u32, cy: u32| Corner {
                vertex: VertexId(cy * stride + cx),
                uv: Some(Vec2::new(cx as f32 / size as f32, cy as f32 / size as f32)),
                color: Some(Vec4::new(1.0, 1.0, 1.0, 1.0)),
            };
            mesh.faces.push(Face {
                corners: vec![
                    corner(x, y),
                    corner(x + 1, y),
                    corner(x + 1, y + 1),
                    corner(x, y + 1),
                ],
                material: MaterialId((x + y) % 2),
            });
        }
    }
    mesh
}

#[test_case(1 ; "below the bounding box threshold")]
#[test_case(4 ; "with a bounding box")]
fn encoding_is_self_consistent(size: u32) {
    let file = export_mesh(&grid(size), &BmsExportOptions::default()).unwrap();
    let bytes = write(&file).unwrap();
    let parsed = parse(&bytes).unwrap();
    assert_eq!(parsed, file);
    assert_eq!(write(&parsed).unwrap(), bytes);
}

#[test]
fn bounding_box_needs_sixteen_points() {
    let small = export_mesh(&grid(2), &BmsExportOptions::default()).unwrap();
    assert_eq!(small.points.len(), 9);
    assert!(small.bbox.is_none());

    let large = export_mesh(&grid(3), &BmsExportOptions::default()).unwrap();
    assert_eq!(large.points.len(), 16);
    let bbox = large.bbox.unwrap();
    // host (0, 0, 0) is the first corner, engine mirrors x and swaps y/z
    assert_eq!(bbox[0], Vec3::new(-0.0, 0.0, 0.0));
    assert_eq!(bbox[6], Vec3::new(-3.0, 1.0, 3.0));
}

#[test]
fn import_restores_geometry() {
    let mesh = grid(3);
    let file = export_mesh(&mesh, &BmsExportOptions::default()).unwrap();
    assert!(file.flags.contains(
        MeshFlags::UVS | MeshFlags::NORMALS | MeshFlags::COLORS | MeshFlags::OFFSET | MeshFlags::PLANES
    ));
    let decoded = import_mesh(&parse(&write(&file).unwrap()).unwrap(), "grid", &ImportContext::none())
        .unwrap();
    let imported = decoded.value;

    assert_eq!(decoded.skipped_faces, 0);
    assert_eq!(imported.origin, mesh.origin);
    assert_eq!(imported.vertices.len(), mesh.vertices.len());
    assert_eq!(imported.faces.len(), mesh.faces.len());
    for (original, face) in mesh.faces.iter().zip(&imported.faces) {
        assert_eq!(face.material, original.material);
        for (a, b) in original.corners.iter().zip(&face.corners) {
            let pa = mesh.vertices.get(a.vertex).unwrap().position;
            let pb = imported.vertices.get(b.vertex).unwrap().position;
            assert_eq!(pa, pb);
            assert!((a.uv.unwrap() - b.uv.unwrap()).length() < 1e-6);
            assert_eq!(b.color, Some(Vec4::ONE));
        }
    }

    let grass = imported.materials.get(MaterialId(1)).unwrap();
    assert!(grass.snowable);
    let road = imported.materials.get(MaterialId(0)).unwrap();
    assert_eq!(road.name, "asphalt");
}

#[test]
fn disabled_channels_shrink_the_file() {
    let mesh = grid(2);
    let full = write(&export_mesh(&mesh, &BmsExportOptions::default()).unwrap()).unwrap();
    let bare = export_mesh(
        &mesh,
        &BmsExportOptions {
            normals: false,
            colors: false,
            uvs: false,
            planes: false,
        },
    )
    .unwrap();
    // without uvs and colors every point is a single adjunct
    assert_eq!(bare.adjunct_count(), 9);
    assert!(write(&bare).unwrap().len() < full.len());

    let imported = import_mesh(&bare, "bare", &ImportContext::none()).unwrap().value;
    assert!(imported.faces[0].corners[0].uv.is_none());
    assert_eq!(imported.vertices.values().next().unwrap().normal, Vec3::ZERO);
}

#[test]
fn files_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grid.bms");
    let file = export_mesh(&grid(2), &BmsExportOptions::default()).unwrap();
    age_bms::save_bms(&path, &file).unwrap();
    assert_eq!(age_bms::load_bms(&path).unwrap(), file);
}

#[test]
fn textures_resolve_next_to_the_mesh() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("asphalt.DDS"), b"").unwrap();
    let path = dir.path().join("grid.bms");
    let file = export_mesh(&grid(1), &BmsExportOptions::default()).unwrap();
    let imported = import_mesh(&file, "grid", &ImportContext::for_static_mesh(&path))
        .unwrap()
        .value;
    let road = imported.materials.get(MaterialId(0)).unwrap();
    assert_eq!(
        road.texture.as_ref().and_then(|t| t.path.clone()),
        Some(dir.path().join("asphalt.DDS"))
    );
}
