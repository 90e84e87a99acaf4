//! Output directory layout

use std::path::{Path, PathBuf};

/// Where a batch writes its artifacts:
/// `models/entity/<name>.geo.json` and
/// `render_controllers/<name>.render_controller.json` under one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn geometry_dir(&self) -> PathBuf {
        self.root.join("models").join("entity")
    }

    pub fn render_controller_dir(&self) -> PathBuf {
        self.root.join("render_controllers")
    }

    pub fn geometry_path(&self, name: &str) -> PathBuf {
        self.geometry_dir().join(format!("{}.geo.json", name))
    }

    pub fn render_controller_path(&self, name: &str) -> PathBuf {
        self.render_controller_dir()
            .join(format!("{}.render_controller.json", name))
    }

    /// Texture file for a render-binding entry such as `textures/item/sword`
    pub fn texture_path(&self, entry: &str) -> PathBuf {
        let mut path = self.root.clone();
        for segment in entry.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path.set_extension("png");
        path
    }
}
