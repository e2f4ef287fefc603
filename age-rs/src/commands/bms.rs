//! BMS static mesh command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};

use age_bms::{BmsExportOptions, export_mesh, load_bms, save_bms};

use crate::utils::{
    MeshLoadOptions, add_table_row, create_table, file_size, format_vec3, load_mesh,
};

#[derive(Subcommand)]
pub enum BmsCommands {
    /// Display information about a BMS file
    Info {
        /// Path to the BMS file
        file: PathBuf,

        /// Show the texture table
        #[arg(long)]
        textures: bool,
    },

    /// Convert geometry to a BMS static mesh
    Convert {
        /// Input geometry (mod, bms, dlp, bnd or bbnd)
        input: PathBuf,

        /// Output BMS file
        output: PathBuf,

        /// DLP group to convert
        #[arg(short, long)]
        group: Option<String>,

        /// Leave out per-corner normals
        #[arg(long)]
        no_normals: bool,

        /// Leave out per-corner colors
        #[arg(long)]
        no_colors: bool,

        /// Leave out texture coordinates
        #[arg(long)]
        no_uvs: bool,

        /// Leave out surface planes
        #[arg(long)]
        no_planes: bool,
    },
}

pub fn execute(cmd: BmsCommands) -> Result<()> {
    match cmd {
        BmsCommands::Info { file, textures } => show_bms_info(&file, textures),
        BmsCommands::Convert {
            input,
            output,
            group,
            no_normals,
            no_colors,
            no_uvs,
            no_planes,
        } => convert_bms(
            &input,
            &output,
            group.as_deref(),
            &BmsExportOptions {
                normals: !no_normals,
                colors: !no_colors,
                uvs: !no_uvs,
                planes: !no_planes,
            },
        ),
    }
}

fn show_bms_info(file: &Path, show_textures: bool) -> Result<()> {
    let mesh =
        load_bms(file).with_context(|| format!("Failed to load BMS file: {}", file.display()))?;

    let quads = mesh.surfaces.iter().filter(|s| s[3] != 0).count();

    println!("BMS File Information: {}", file.display());
    println!("=====================================");
    println!("File Size: {}", file_size(file));
    println!("Flags: {:?}", mesh.flags);
    println!("Offset: {}", format_vec3(mesh.offset));
    println!("Radius: {:.3}", mesh.radius);
    println!("Box Radius: {:.3}", mesh.box_radius);
    println!("Points: {}", mesh.points.len());
    println!("Adjuncts: {}", mesh.adjunct_count());
    println!(
        "Surfaces: {} ({} triangles, {} quads)",
        mesh.surface_count(),
        mesh.surface_count() - quads,
        quads
    );
    println!("Planes: {}", mesh.planes.len());
    println!("Textures: {}", mesh.textures.len());
    println!("Bounding Box: {}", mesh.bbox.is_some());
    println!("Cache Size: {}", mesh.cache_size);

    if show_textures {
        println!("\nTextures:");
        println!("---------");
        let mut table = create_table(&["#", "Name", "Flags", "Props", "Color (BGRA)"]);
        for (index, texture) in mesh.textures.iter().enumerate() {
            add_table_row(
                &mut table,
                [
                    (index + 1).to_string(),
                    texture.name.clone(),
                    format!("{:?}", texture.flags),
                    format!("{:?}", texture.props),
                    format!("{:?}", texture.color_bgra),
                ],
            );
        }
        table.printstd();
    }

    Ok(())
}

fn convert_bms(
    input: &Path,
    output: &Path,
    group: Option<&str>,
    options: &BmsExportOptions,
) -> Result<()> {
    let mesh = load_mesh(
        input,
        &MeshLoadOptions {
            skeleton: None,
            group,
        },
    )?
    .value;

    let bms = export_mesh(&mesh, options).context("Failed to build BMS geometry")?;
    save_bms(output, &bms)
        .with_context(|| format!("Failed to save BMS file: {}", output.display()))?;

    println!(
        "✓ Converted {} to {} ({} points, {} surfaces)",
        input.display(),
        output.display(),
        bms.points.len(),
        bms.surface_count()
    );
    Ok(())
}
