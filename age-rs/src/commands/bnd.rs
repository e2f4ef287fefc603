//! BND, BBND and TER command implementations

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use std::path::{Path, PathBuf};

use age_bnd::{Bound, BndVersion, BoxBound, TerFile};
use glam::Mat4;

use crate::utils::{
    MeshLoadOptions, MeshSource, add_table_row, create_table, file_size, format_color,
    format_vec3, load_mesh,
};

#[derive(Subcommand)]
pub enum BndCommands {
    /// Display information about a BND, BBND or TER file
    Info {
        /// Path to the file
        file: PathBuf,

        /// Show the material table
        #[arg(long)]
        materials: bool,

        /// Show the face references of every non-empty TER section
        #[arg(long)]
        sections: bool,
    },

    /// Convert geometry to a BND, BBND or TER file
    Convert {
        /// Input geometry (bnd, bbnd, mod, bms or dlp)
        input: PathBuf,

        /// Output file (bnd, bbnd or ter)
        output: PathBuf,

        /// Bound version (1.01 or 1.10); selects the BBND material layout too
        #[arg(short = 't', long, default_value = "1.01")]
        to: BndVersion,

        /// DLP group to convert
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Write a `type: box` BND around a mesh, optionally with its placement matrix
    Box {
        /// Input geometry (mod, bms or dlp)
        input: PathBuf,

        /// Output BND file
        output: PathBuf,

        /// Also write the object origin as a 3x4 `.mtx` transform
        #[arg(long)]
        matrix: Option<PathBuf>,

        /// DLP group to use
        #[arg(short, long)]
        group: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundFormat {
    Text,
    Binary,
    Terrain,
}

fn bound_format(path: &Path) -> Option<BoundFormat> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "bnd" => Some(BoundFormat::Text),
        "bbnd" => Some(BoundFormat::Binary),
        "ter" => Some(BoundFormat::Terrain),
        _ => None,
    }
}

pub fn execute(cmd: BndCommands) -> Result<()> {
    match cmd {
        BndCommands::Info {
            file,
            materials,
            sections,
        } => match bound_format(&file) {
            Some(BoundFormat::Terrain) => show_ter_info(&file, sections),
            Some(format) => show_bound_info(&file, format, materials),
            None => bail!(
                "Unrecognised bound file extension: {} (expected bnd, bbnd or ter)",
                file.display()
            ),
        },
        BndCommands::Convert {
            input,
            output,
            to,
            group,
        } => convert_bound(&input, &output, to, group.as_deref()),
        BndCommands::Box {
            input,
            output,
            matrix,
            group,
        } => write_box_bound(&input, &output, matrix.as_deref(), group.as_deref()),
    }
}

fn load_bound(path: &Path, group: Option<&str>) -> Result<Bound> {
    match MeshSource::from_path(path) {
        Some(MeshSource::Bnd) => age_bnd::load_bnd(path)
            .with_context(|| format!("Failed to load BND file: {}", path.display())),
        Some(MeshSource::Bbnd) => age_bnd::load_bbnd(path)
            .with_context(|| format!("Failed to load BBND file: {}", path.display())),
        _ => {
            let mesh = load_mesh(
                path,
                &MeshLoadOptions {
                    skeleton: None,
                    group,
                },
            )?;
            Ok(Bound::from_mesh(&mesh.value))
        }
    }
}

fn show_bound_info(file: &Path, format: BoundFormat, show_materials: bool) -> Result<()> {
    let bound = load_bound(file, None)?;
    let quads = bound.faces.iter().filter(|face| face.is_quad()).count();
    let (min, max) = bound.extents();

    println!("Bound File Information: {}", file.display());
    println!("=====================================");
    println!("File Size: {}", file_size(file));
    match format {
        BoundFormat::Binary => {
            let bytes = std::fs::read(file)
                .with_context(|| format!("Failed to read BBND file: {}", file.display()))?;
            let layout = age_bnd::binary::detect_layout(&bytes)?;
            println!("Format: binary, {layout} material layout");
        }
        _ => println!("Format: text"),
    }
    println!("Vertices: {}", bound.vertices.len());
    println!("Materials: {}", bound.materials.len());
    println!(
        "Faces: {} ({} triangles, {} quads)",
        bound.faces.len(),
        bound.faces.len() - quads,
        quads
    );
    println!("Edges: {}", bound.edges.len());
    println!("Extents: {} to {}", format_vec3(min), format_vec3(max));

    if show_materials {
        println!("\nMaterials:");
        println!("----------");
        let mut table = create_table(&[
            "#", "Name", "Elasticity", "Friction", "Effect", "Sound", "Color",
        ]);
        for (index, material) in bound.materials.iter().enumerate() {
            add_table_row(
                &mut table,
                [
                    index.to_string(),
                    material.name.clone(),
                    format!("{:.2}", material.elasticity),
                    format!("{:.2}", material.friction),
                    material.effect.clone(),
                    material.sound.clone(),
                    format_color(age_bnd::material_color(&material.name)),
                ],
            );
        }
        table.printstd();
    }

    Ok(())
}

fn show_ter_info(file: &Path, show_sections: bool) -> Result<()> {
    let ter = age_bnd::load_ter(file)
        .with_context(|| format!("Failed to load TER file: {}", file.display()))?;

    let occupied = ter.sections.iter().filter(|s| !s.is_empty()).count();

    println!("TER File Information: {}", file.display());
    println!("=====================================");
    println!("File Size: {}", file_size(file));
    println!("Faces: {}", ter.face_count);
    println!("Size: {}", format_vec3(ter.size));
    println!(
        "Grid: {} x {} x {} ({} sections, {} occupied)",
        ter.grid[0],
        ter.grid[1],
        ter.grid[2],
        ter.sections.len(),
        occupied
    );
    println!("Face References: {}", ter.reference_count());
    println!("Scale: {}", format_vec3(ter.scale));
    println!(
        "Bounding Box: {} to {}",
        format_vec3(ter.bbox_min),
        format_vec3(ter.bbox_max)
    );

    if show_sections {
        println!("\nSections:");
        println!("---------");
        let mut table = create_table(&["Section", "Faces"]);
        for (index, faces) in ter.sections.iter().enumerate() {
            if faces.is_empty() {
                continue;
            }
            let list: Vec<String> = faces.iter().map(u16::to_string).collect();
            add_table_row(&mut table, [index.to_string(), list.join(" ")]);
        }
        table.printstd();
    }

    Ok(())
}

fn convert_bound(input: &Path, output: &Path, version: BndVersion, group: Option<&str>) -> Result<()> {
    let Some(format) = bound_format(output) else {
        bail!(
            "Unrecognised output extension: {} (expected bnd, bbnd or ter)",
            output.display()
        );
    };
    let bound = load_bound(input, group)?;

    match format {
        BoundFormat::Text => age_bnd::save_bnd(output, &bound, version)
            .with_context(|| format!("Failed to save BND file: {}", output.display()))?,
        BoundFormat::Binary => age_bnd::save_bbnd(output, &bound, version)
            .with_context(|| format!("Failed to save BBND file: {}", output.display()))?,
        BoundFormat::Terrain => {
            let ter = TerFile::build(&bound).context("Failed to build TER section grid")?;
            age_bnd::save_ter(output, &ter)
                .with_context(|| format!("Failed to save TER file: {}", output.display()))?;
        }
    }

    println!(
        "✓ Converted {} to {} ({} vertices, {} faces)",
        input.display(),
        output.display(),
        bound.vertices.len(),
        bound.faces.len()
    );
    Ok(())
}

fn write_box_bound(
    input: &Path,
    output: &Path,
    matrix: Option<&Path>,
    group: Option<&str>,
) -> Result<()> {
    let mesh = load_mesh(
        input,
        &MeshLoadOptions {
            skeleton: None,
            group,
        },
    )?
    .value;
    let Some(bound) = BoxBound::from_mesh(&mesh) else {
        bail!("{} has no vertices to bound", input.display());
    };
    age_bnd::save_box_bnd(output, &bound)
        .with_context(|| format!("Failed to save BND file: {}", output.display()))?;
    println!(
        "✓ Wrote box bound {} (size {}, centroid {})",
        output.display(),
        format_vec3(bound.size),
        format_vec3(bound.centroid)
    );

    if let Some(path) = matrix {
        age_data::matrix::save_matrix3x4(path, &Mat4::from_translation(mesh.origin))
            .with_context(|| format!("Failed to save matrix file: {}", path.display()))?;
        println!("✓ Wrote placement matrix {}", path.display());
    }
    Ok(())
}
