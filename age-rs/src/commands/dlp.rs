//! DLP7 patch mesh command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};

use age_dlp::load_dlp;

use crate::utils::{
    MeshLoadOptions, add_table_row, create_table, file_size, format_color, load_mesh,
};

#[derive(Subcommand)]
pub enum DlpCommands {
    /// Display information about a DLP file
    Info {
        /// Path to the DLP file
        file: PathBuf,

        /// Show the material and texture tables
        #[arg(long)]
        materials: bool,
    },

    /// Write meshes as one GEO scene for the asset manager
    Geo {
        /// Input geometry (mod, bms, dlp, bnd or bbnd); each file is one object
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output GEO file
        #[arg(short, long)]
        output: PathBuf,
    },
}

pub fn execute(cmd: DlpCommands) -> Result<()> {
    match cmd {
        DlpCommands::Info { file, materials } => show_dlp_info(&file, materials),
        DlpCommands::Geo { inputs, output } => write_geo_scene(&inputs, &output),
    }
}

fn show_dlp_info(file: &Path, show_materials: bool) -> Result<()> {
    let dlp =
        load_dlp(file).with_context(|| format!("Failed to load DLP file: {}", file.display()))?;

    println!("DLP File Information: {}", file.display());
    println!("=====================================");
    println!("File Size: {}", file_size(file));
    println!("Groups: {}", dlp.groups.len());
    println!(
        "Patches: {} ({} polygons)",
        dlp.patches.len(),
        dlp.polygon_count()
    );
    println!("Vertices: {}", dlp.vertices.len());
    println!("Materials: {}", dlp.materials.len());
    println!("Textures: {}", dlp.textures.len());

    println!("\nGroups:");
    println!("-------");
    let mut table = create_table(&["Name", "Vertices", "Patches", "Polygons"]);
    for group in &dlp.groups {
        let polygons = group
            .patch_indices
            .iter()
            .filter_map(|&index| dlp.patches.get(usize::from(index)))
            .filter(|patch| patch.is_polygon())
            .count();
        add_table_row(
            &mut table,
            [
                group.name.clone(),
                group.vertex_indices.len().to_string(),
                group.patch_indices.len().to_string(),
                polygons.to_string(),
            ],
        );
    }
    table.printstd();

    if show_materials {
        println!("\nMaterials:");
        println!("----------");
        let mut table = create_table(&["#", "Name", "Diffuse", "Shininess"]);
        for (index, material) in dlp.materials.iter().enumerate() {
            add_table_row(
                &mut table,
                [
                    (index + 1).to_string(),
                    material.name.clone(),
                    format_color(material.diffuse),
                    format!("{:.2}", material.shininess),
                ],
            );
        }
        table.printstd();

        println!("\nTextures:");
        println!("---------");
        let mut table = create_table(&["#", "Name", "Flags"]);
        for (index, texture) in dlp.textures.iter().enumerate() {
            add_table_row(
                &mut table,
                [
                    (index + 1).to_string(),
                    texture.name.clone(),
                    format!("{:#04x}", texture.flags),
                ],
            );
        }
        table.printstd();
    }

    Ok(())
}

fn write_geo_scene(inputs: &[PathBuf], output: &Path) -> Result<()> {
    let meshes = inputs
        .iter()
        .map(|input| load_mesh(input, &MeshLoadOptions::default()).map(|decoded| decoded.value))
        .collect::<Result<Vec<_>>>()?;
    age_dlp::save_geo(output, &meshes)
        .with_context(|| format!("Failed to save GEO file: {}", output.display()))?;
    println!(
        "✓ Wrote {} objects ({} faces) to {}",
        meshes.len(),
        meshes.iter().map(|mesh| mesh.faces.len()).sum::<usize>(),
        output.display()
    );
    Ok(())
}
