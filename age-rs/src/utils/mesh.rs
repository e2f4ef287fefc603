//! Loading any supported geometry file as a host mesh

use std::path::Path;

use age_data::{Decoded, ImportContext, Mesh, Skeleton};
use anyhow::{Context, Result, bail};

/// Geometry formats recognised by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshSource {
    Mod,
    Bms,
    Dlp,
    Bnd,
    Bbnd,
}

impl MeshSource {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "mod" => Some(Self::Mod),
            "bms" => Some(Self::Bms),
            "dlp" => Some(Self::Dlp),
            "bnd" => Some(Self::Bnd),
            "bbnd" => Some(Self::Bbnd),
            _ => None,
        }
    }
}

/// Extra inputs some formats need
#[derive(Debug, Default, Clone, Copy)]
pub struct MeshLoadOptions<'a> {
    /// Moves MOD vertices out of bone-local space
    pub skeleton: Option<&'a Skeleton>,
    /// DLP group to convert; optional when the file has a single group
    pub group: Option<&'a str>,
}

fn mesh_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("mesh")
        .to_string()
}

/// Read `path` and convert it into a host mesh
pub fn load_mesh(path: &Path, options: &MeshLoadOptions<'_>) -> Result<Decoded<Mesh>> {
    let source = MeshSource::from_path(path).with_context(|| {
        format!(
            "Unrecognised geometry file extension: {} (expected mod, bms, dlp, bnd or bbnd)",
            path.display()
        )
    })?;
    let name = mesh_name(path);

    let decoded = match source {
        MeshSource::Mod => {
            let file = age_mod::load_mod(path)
                .with_context(|| format!("Failed to load MOD file: {}", path.display()))?;
            age_mod::import_mesh(&file, &name, options.skeleton, &ImportContext::for_model(path))
                .context("Failed to convert MOD geometry")?
        }
        MeshSource::Bms => {
            let file = age_bms::load_bms(path)
                .with_context(|| format!("Failed to load BMS file: {}", path.display()))?;
            age_bms::import_mesh(&file, &name, &ImportContext::for_static_mesh(path))
                .context("Failed to convert BMS geometry")?
        }
        MeshSource::Dlp => {
            let file = age_dlp::load_dlp(path)
                .with_context(|| format!("Failed to load DLP file: {}", path.display()))?;
            let group = match (options.group, file.groups.as_slice()) {
                (Some(name), _) => file.group(name)?,
                (None, [only]) => only,
                (None, groups) => {
                    let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
                    bail!(
                        "DLP file has {} groups; pick one with --group ({})",
                        groups.len(),
                        names.join(", ")
                    );
                }
            };
            age_dlp::import_group(&file, group, &ImportContext::for_static_mesh(path))
                .with_context(|| format!("Failed to convert DLP group {}", group.name))?
        }
        MeshSource::Bnd => age_bnd::load_bnd(path)
            .with_context(|| format!("Failed to load BND file: {}", path.display()))?
            .to_mesh(&name),
        MeshSource::Bbnd => age_bnd::load_bbnd(path)
            .with_context(|| format!("Failed to load BBND file: {}", path.display()))?
            .to_mesh(&name),
    };

    if decoded.skipped_faces > 0 {
        log::warn!(
            "{} faces of {} could not be converted and were skipped",
            decoded.skipped_faces,
            path.display()
        );
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sources_follow_the_extension_case_insensitively() {
        assert_eq!(MeshSource::from_path(Path::new("a/b/car.MOD")), Some(MeshSource::Mod));
        assert_eq!(MeshSource::from_path(Path::new("city.bbnd")), Some(MeshSource::Bbnd));
        assert_eq!(MeshSource::from_path(Path::new("notes.txt")), None);
        assert_eq!(MeshSource::from_path(Path::new("noext")), None);
    }
}
