//! MOD model command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};

use age_mod::{FormatVersion, MaterialGeometry, ModExportOptions, export_mesh, load_mod, save_mod};

use crate::utils::{
    MeshLoadOptions, add_table_row, create_table, file_size, format_vec3, load_mesh,
};

#[derive(Subcommand)]
pub enum ModCommands {
    /// Display information about a MOD file
    Info {
        /// Path to the MOD file
        file: PathBuf,

        /// Show the material table
        #[arg(long)]
        materials: bool,

        /// Show every geometry packet
        #[arg(long)]
        packets: bool,
    },

    /// Convert geometry to a MOD file of the given version
    Convert {
        /// Input geometry (mod, bms, dlp, bnd or bbnd)
        input: PathBuf,

        /// Output MOD file
        output: PathBuf,

        /// Target version (1.06, 1.09, 1.10, 2.00, 2.10 or 2.12)
        #[arg(short = 't', long, default_value = "1.09")]
        to: FormatVersion,

        /// Skeleton the model is bound to
        #[arg(short, long)]
        skel: Option<PathBuf>,

        /// DLP group to convert
        #[arg(short, long)]
        group: Option<String>,

        /// Most bone matrices a packet may reference
        #[arg(long, default_value = "8")]
        max_packet_matrices: usize,

        /// Minimum weight for a bone to influence a vertex
        #[arg(long, default_value = "0.5")]
        weight_threshold: f32,
    },
}

pub fn execute(cmd: ModCommands) -> Result<()> {
    match cmd {
        ModCommands::Info {
            file,
            materials,
            packets,
        } => show_mod_info(&file, materials, packets),
        ModCommands::Convert {
            input,
            output,
            to,
            skel,
            group,
            max_packet_matrices,
            weight_threshold,
        } => {
            let options = ModExportOptions {
                max_packet_matrices,
                weight_threshold,
                ..ModExportOptions::with_version(to)
            };
            convert_mod(&input, &output, skel.as_deref(), group.as_deref(), &options)
        }
    }
}

fn show_mod_info(file: &Path, show_materials: bool, show_packets: bool) -> Result<()> {
    let model =
        load_mod(file).with_context(|| format!("Failed to load MOD file: {}", file.display()))?;

    println!("MOD File Information: {}", file.display());
    println!("=====================================");
    println!("File Size: {}", file_size(file));
    println!(
        "Version: {} ({})",
        model.version,
        if model.version.is_binary() { "binary" } else { "text" }
    );
    println!("Layout: {:?}", model.layout());
    println!("Vertices: {}", model.vertices.len());
    println!("Normals: {}", model.normals.len());
    println!("Colors: {}", model.colors.len());
    println!("Tex1s: {}", model.tex1s.len());
    println!("Tex2s: {}", model.tex2s.len());
    println!("Matrices: {}", model.matrix_count);
    println!("Reskins: {}", model.reskins);
    println!("Materials: {}", model.materials.len());
    println!("Adjuncts: {}", model.adjunct_count());
    println!("Primitives: {}", model.primitive_count());
    println!("Triangles: {}", model.triangle_count());
    println!("Packets: {}", model.packet_count());

    if show_materials {
        println!("\nMaterials:");
        println!("----------");
        let mut table = create_table(&["#", "Name", "Illum", "Diffuse", "Texture", "Triangles"]);
        for (index, material) in model.materials.iter().enumerate() {
            add_table_row(
                &mut table,
                [
                    index.to_string(),
                    material.name.clone(),
                    material.illumination.to_string(),
                    format_vec3(material.diffuse),
                    material.textures.first().cloned().unwrap_or_default(),
                    material.geometry.triangle_count().to_string(),
                ],
            );
        }
        table.printstd();
    }

    if show_packets {
        println!("\nPackets:");
        println!("--------");
        let mut table = create_table(&["Material", "Packet", "Adjuncts", "Primitives", "Matrices"]);
        for material in &model.materials {
            let MaterialGeometry::Packets(packets) = &material.geometry else {
                continue;
            };
            for (index, packet) in packets.iter().enumerate() {
                add_table_row(
                    &mut table,
                    [
                        material.name.clone(),
                        index.to_string(),
                        packet.adjuncts.len().to_string(),
                        packet.primitives.len().to_string(),
                        format!("{:?}", packet.matrices),
                    ],
                );
            }
        }
        table.printstd();
    }

    Ok(())
}

fn convert_mod(
    input: &Path,
    output: &Path,
    skel: Option<&Path>,
    group: Option<&str>,
    options: &ModExportOptions,
) -> Result<()> {
    let skeleton = skel
        .map(|path| {
            age_mod::load_skel(path)
                .with_context(|| format!("Failed to load skeleton: {}", path.display()))
        })
        .transpose()?;

    let mesh = load_mesh(
        input,
        &MeshLoadOptions {
            skeleton: skeleton.as_ref(),
            group,
        },
    )?
    .value;

    let model = export_mesh(&mesh, skeleton.as_ref(), options)
        .with_context(|| format!("Failed to build MOD {} geometry", options.version))?;
    save_mod(output, &model)
        .with_context(|| format!("Failed to save MOD file: {}", output.display()))?;

    println!(
        "✓ Converted {} to {} (MOD {}, {} triangles in {} packets)",
        input.display(),
        output.display(),
        model.version,
        model.triangle_count(),
        model.packet_count()
    );
    Ok(())
}
