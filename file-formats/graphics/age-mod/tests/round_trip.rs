//! End-to-end export, encode, decode and import of skinned meshes

use age_data::{
    Bone, BoneId, BoneWeight, Corner, Face, ImportContext, Material, MaterialId, Mesh, Skeleton,
    TextureRef, VertexId,
};
use age_mod::{FormatVersion, ModExportOptions, encode_mod, export_mesh, import_mesh, parse_mod};
use glam::{Vec2, Vec3, Vec4};
use pretty_assertions::assert_eq;
use test_case::test_case;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn skeleton() -> Skeleton {
    let mut skeleton = Skeleton::default();
    let root = skeleton.bones.push(Bone {
        name: "root".to_owned(),
        id: Some(0),
        parent: None,
        offset: Vec3::new(0.5, -1.25, 2.0),
    });
    skeleton.bones.push(Bone {
        name: "arm".to_owned(),
        id: Some(1),
        parent: Some(root),
        offset: Vec3::new(3.0, 0.75, -0.5),
    });
    skeleton
}

/// A bent tube of quads; the far half is weighted to the second bone
fn skinned_mesh() -> Mesh {
    let mut mesh = Mesh::new("tube");
    let mut body = Material::named("body");
    body.diffuse = Vec4::new(0.8, 0.4, 0.2, 1.0);
    body.specular = 0.25;
    body.texture = Some(TextureRef::named("skin"));
    mesh.materials.push(body);
    mesh.materials.push(Material::named("trim"));

    let rings = 12;
    let sides = 6;
    for ring in 0..rings {
        for side in 0..sides {
            let angle = side as f32 / sides as f32 * std::f32::consts::TAU;
            let normal = Vec3::new(angle.cos(), angle.sin(), 0.0);
            let id = mesh.add_vertex(
                Vec3::new(normal.x, normal.y, ring as f32 * 0.5),
                normal,
            );
            let bone = if ring < rings / 2 { 0 } else { 1 };
            mesh.vertices.get_mut(id).unwrap().weights.push(BoneWeight {
                bone: BoneId(bone),
                weight: 1.0,
            });
        }
    }
    for ring in 0..rings - 1 {
        for side in 0..sides {
            let a = ring * sides + side;
            let b = ring * sides + (side + 1) % sides;
            let corner = |v: u32, u: f32, w: f32| Corner {
                vertex: VertexId(v),
                uv: Some(Vec2::new(u, w)),
                color: Some(Vec4::new(1.0, 1.0, 1.0, 0.5)),
            };
            let (u0, u1) = (side as f32 / sides as f32, (side + 1) as f32 / sides as f32);
            let (v0, v1) = (ring as f32 / rings as f32, (ring + 1) as f32 / rings as f32);
            mesh.faces.push(Face {
                corners: vec![
                    corner(a, u0, v0),
                    corner(b, u1, v0),
                    corner(b + sides, u1, v1),
                    corner(a + sides, u0, v1),
                ],
                material: MaterialId(u32::from(side % 2 == 1)),
            });
        }
    }
    mesh
}

#[test_case(FormatVersion::V1_06)]
#[test_case(FormatVersion::V1_09)]
#[test_case(FormatVersion::V1_10)]
#[test_case(FormatVersion::V2_00)]
#[test_case(FormatVersion::V2_10)]
#[test_case(FormatVersion::V2_12)]
fn encoding_is_self_consistent(version: FormatVersion) {
    init_logging();
    let skeleton = skeleton();
    let file = export_mesh(
        &skinned_mesh(),
        Some(&skeleton),
        &ModExportOptions::with_version(version),
    )
    .unwrap();
    let bytes = encode_mod(&file).unwrap();
    let parsed = parse_mod(&bytes).unwrap();
    assert_eq!(parsed.version, version);
    assert_eq!(encode_mod(&parsed).unwrap(), bytes);
}

#[test_case(FormatVersion::V1_06)]
#[test_case(FormatVersion::V1_10)]
#[test_case(FormatVersion::V2_10)]
fn triangles_are_conserved(version: FormatVersion) {
    init_logging();
    let mesh = skinned_mesh();
    let skeleton = skeleton();
    let file = export_mesh(&mesh, Some(&skeleton), &ModExportOptions::with_version(version))
        .unwrap();
    let parsed = parse_mod(&encode_mod(&file).unwrap()).unwrap();
    let decoded = import_mesh(&parsed, "tube", Some(&skeleton), &ImportContext::none()).unwrap();

    assert_eq!(decoded.skipped_faces, 0);
    assert_eq!(decoded.value.faces.len(), mesh.triangle_count());
    assert_eq!(decoded.value.materials.len(), 2);
}

#[test]
fn bone_local_positions_return_to_world_space() {
    init_logging();
    let mesh = skinned_mesh();
    let skeleton = skeleton();
    let file = export_mesh(&mesh, Some(&skeleton), &ModExportOptions::default()).unwrap();
    let parsed = parse_mod(&encode_mod(&file).unwrap()).unwrap();
    let decoded = import_mesh(&parsed, "tube", Some(&skeleton), &ImportContext::none()).unwrap();
    let imported = decoded.value;

    for vertex in imported.vertices.values() {
        let original = mesh
            .vertices
            .values()
            .find(|v| (v.position - vertex.position).length() < 1e-5);
        let original = original.unwrap_or_else(|| panic!("no source for {:?}", vertex.position));
        assert_eq!(vertex.weights.len(), 1);
        assert_eq!(vertex.weights[0].bone, original.weights[0].bone);
    }
    assert_eq!(imported.vertices.len(), mesh.vertices.len());
}

#[test]
fn materials_survive_the_trip() {
    init_logging();
    let file = export_mesh(
        &skinned_mesh(),
        None,
        &ModExportOptions::with_version(FormatVersion::V1_10),
    )
    .unwrap();
    let parsed = parse_mod(&encode_mod(&file).unwrap()).unwrap();
    let imported = import_mesh(&parsed, "tube", None, &ImportContext::none())
        .unwrap()
        .value;

    let body = imported.materials.values().next().unwrap();
    assert_eq!(body.name, "body");
    assert_eq!(body.texture.as_ref().map(|t| t.name.as_str()), Some("skin"));
    assert!((body.specular - 0.25).abs() < 1e-6);
    assert!((body.diffuse - Vec4::new(0.8, 0.4, 0.2, 1.0)).length() < 1e-6);

    let corner = imported.faces[0].corners[0];
    assert_eq!(corner.color, Some(Vec4::new(1.0, 1.0, 1.0, 0.5)));
}

#[test]
fn skeleton_files_round_trip_through_disk() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tube.skel");
    age_mod::save_skel(&path, &skeleton()).unwrap();
    let loaded = age_mod::load_skel(&path).unwrap();

    assert_eq!(loaded.len(), 2);
    let arm = loaded.find("arm").unwrap();
    let expected = skeleton().world_position(BoneId(1)).unwrap();
    assert!((loaded.world_position(arm).unwrap() - expected).length() < 1e-5);
}

#[test]
fn save_mod_writes_nothing_on_failure() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.mod");
    let mut file = export_mesh(&skinned_mesh(), None, &ModExportOptions::default()).unwrap();
    file.version = FormatVersion::V1_08;
    assert!(age_mod::save_mod(&path, &file).is_err());
    assert!(!path.exists());
}
