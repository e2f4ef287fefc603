//! SKEL skeleton command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};

use age_data::{BoneId, Skeleton};

use crate::utils::format_vec3;

#[derive(Subcommand)]
pub enum SkelCommands {
    /// Display the bone hierarchy of a SKEL file
    Info {
        /// Path to the SKEL file
        file: PathBuf,

        /// Show rest positions summed up the parent chain
        #[arg(long)]
        world: bool,
    },
}

pub fn execute(cmd: SkelCommands) -> Result<()> {
    match cmd {
        SkelCommands::Info { file, world } => show_skel_info(&file, world),
    }
}

fn show_skel_info(file: &Path, world: bool) -> Result<()> {
    let skeleton = age_mod::load_skel(file)
        .with_context(|| format!("Failed to load skeleton: {}", file.display()))?;

    println!("SKEL File Information: {}", file.display());
    println!("=====================================");
    println!("Bones: {}", skeleton.len());
    println!("Roots: {}", skeleton.roots().count());
    println!();

    for root in skeleton.roots() {
        print_bone(&skeleton, root, 0, world)?;
    }
    Ok(())
}

fn print_bone(skeleton: &Skeleton, id: BoneId, depth: usize, world: bool) -> Result<()> {
    let bone = skeleton.bones.try_get(id)?;
    let position = if world {
        skeleton.world_position(id)?
    } else {
        bone.offset
    };
    println!(
        "{:indent$}[{}] {} {}",
        "",
        bone.id.map_or_else(|| id.to_string(), |value| value.to_string()),
        bone.name,
        format_vec3(position),
        indent = depth * 2
    );
    for child in skeleton.children(id) {
        print_bone(skeleton, child, depth + 1, world)?;
    }
    Ok(())
}
