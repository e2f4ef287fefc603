//! Explicit import context for resolving texture names to files.

use std::path::{Path, PathBuf};

use log::{debug, warn};

/// Directories and extensions searched, in order, for a texture name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportContext {
    pub search_dirs: Vec<PathBuf>,
    pub extensions: Vec<String>,
}

impl ImportContext {
    /// No lookup at all; textures keep their names only
    pub fn none() -> Self {
        Self::default()
    }

    /// Skinned models live in `<root>/geometry`; textures in the sibling
    /// `texture_x` or `texture` directories
    pub fn for_model(model_path: &Path) -> Self {
        let root = model_path
            .parent()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            search_dirs: vec![root.join("texture_x"), root.join("texture")],
            extensions: ["tex", "tga", "bmp", "png"].map(str::to_owned).to_vec(),
        }
    }

    /// Static meshes keep their textures next to the mesh file
    pub fn for_static_mesh(mesh_path: &Path) -> Self {
        Self {
            search_dirs: vec![mesh_path.parent().map(Path::to_path_buf).unwrap_or_default()],
            extensions: vec!["DDS".to_owned()],
        }
    }

    /// Find the first existing `<dir>/<name>.<ext>`
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        for dir in self.search_dirs.iter().filter(|dir| dir.is_dir()) {
            for ext in &self.extensions {
                let candidate = dir.join(format!("{name}.{ext}"));
                if candidate.is_file() {
                    debug!("Resolved texture {name} to {}", candidate.display());
                    return Some(candidate);
                }
            }
        }
        if !self.search_dirs.is_empty() {
            warn!("Texture file not found: {name}");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn model_textures_prefer_texture_x() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("geometry")).unwrap();
        fs::create_dir_all(root.path().join("texture_x")).unwrap();
        fs::create_dir_all(root.path().join("texture")).unwrap();
        fs::write(root.path().join("texture/body.tex"), b"").unwrap();
        fs::write(root.path().join("texture_x/body.tex"), b"").unwrap();
        fs::write(root.path().join("texture/face.png"), b"").unwrap();

        let ctx = ImportContext::for_model(&root.path().join("geometry/ped.mod"));
        assert_eq!(ctx.resolve("body"), Some(root.path().join("texture_x/body.tex")));
        assert_eq!(ctx.resolve("face"), Some(root.path().join("texture/face.png")));
        assert_eq!(ctx.resolve("missing"), None);
    }

    #[test]
    fn static_mesh_textures_sit_beside_the_mesh() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("road.DDS"), b"").unwrap();
        let ctx = ImportContext::for_static_mesh(&dir.path().join("road.bms"));
        assert_eq!(ctx.resolve("road"), Some(dir.path().join("road.DDS")));
    }
}
