//! DLP files read from disk and converted group by group

use age_data::{BeWriter, ImportContext};
use age_dlp::{load_dlp, import_groups};
use glam::{Vec2, Vec3, Vec4};
use pretty_assertions::assert_eq;

fn write_polygon(w: &mut BeWriter, indices: &[u16], material: u16, texture: u16) {
    w.write_u16(indices.len() as u16);
    w.write_u16(1);
    w.write_u16(0);
    w.write_u16(0);
    w.write_u16(material);
    w.write_u16(texture);
    w.write_u16(0);
    for &index in indices {
        w.write_u16(index);
        w.write_vec3(Vec3::Y);
        w.write_vec2(Vec2::ZERO);
        w.write_bytes(&[255, 255, 255, 255]);
    }
    w.write_u32(0);
}

/// Two groups: a quad roof with a texture and a bare triangle
fn house() -> Vec<u8> {
    let mut w = BeWriter::new();
    w.write_bytes(b"DLP7");
    w.write_u32(2);
    w.write_u32(2);
    w.write_u32(5);

    for (name, patches) in [("roof", [0u16]), ("wall", [1u16])] {
        w.write_u8(name.len() as u8);
        w.write_bytes(name.as_bytes());
        w.write_u32(0);
        w.write_u32(patches.len() as u32);
        w.write_u16_slice(&patches);
    }

    write_polygon(&mut w, &[0, 1, 2, 3], 1, 1);
    write_polygon(&mut w, &[0, 1, 4], 0, 0);

    for point in [
        Vec3::new(0.0, 2.0, 0.0),
        Vec3::new(2.0, 2.0, 0.0),
        Vec3::new(2.0, 2.0, 2.0),
        Vec3::new(0.0, 2.0, 2.0),
        Vec3::new(1.0, 0.0, 0.0),
    ] {
        w.write_vec3(point);
    }

    w.write_u32(1);
    w.write_fixed_str("tile", 32);
    for color in [Vec4::ZERO, Vec4::ZERO, Vec4::new(0.6, 0.1, 0.1, 1.0), Vec4::ZERO] {
        w.write_vec4(color);
    }
    w.write_f32(0.0);
    w.write_u16(0);

    w.write_u32(1);
    w.write_fixed_str("shingle", 32);
    w.write_bytes(&[0; 4]);
    w.into_inner()
}

#[test]
fn groups_become_meshes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("house.dlp");
    std::fs::write(&path, house()).unwrap();

    let file = load_dlp(&path).unwrap();
    let meshes = import_groups(&file, &ImportContext::none()).unwrap();
    let summary: Vec<(&str, usize, usize, usize)> = meshes
        .iter()
        .map(|d| {
            let mesh = &d.value;
            (mesh.name.as_str(), mesh.vertices.len(), mesh.faces.len(), mesh.materials.len())
        })
        .collect();
    assert_eq!(summary, vec![("roof", 4, 1, 1), ("wall", 3, 1, 1)]);
    assert!(meshes.iter().all(|d| d.skipped_faces == 0));

    let roof = &meshes[0].value;
    assert_eq!(roof.triangle_count(), 2);
    assert_eq!(roof.materials.as_slice()[0].name, "tile_shingle");
    assert_eq!(roof.export_materials().len(), 1);
    // a patch without material or texture gets the default one
    assert_eq!(meshes[1].value.export_materials()[0].name, "default");
}

#[test]
fn textures_resolve_through_the_context() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("shingle.tex"), b"").unwrap();
    let context = ImportContext {
        search_dirs: vec![dir.path().to_path_buf()],
        extensions: vec!["tex".to_owned()],
    };
    let file = age_dlp::parse(&house()).unwrap();
    let roof = age_dlp::import_group(&file, file.group("roof").unwrap(), &context).unwrap();
    let texture = roof.value.materials.as_slice()[0].texture.clone().unwrap();
    assert_eq!(texture.path, Some(dir.path().join("shingle.tex")));
}
