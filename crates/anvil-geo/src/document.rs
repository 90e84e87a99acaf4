//! Target document types
//!
//! Field declaration order is serialization order, and every map is a
//! `BTreeMap`, so serialized documents are byte-stable.

use anvil_import::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const GEOMETRY_FORMAT_VERSION: &str = "1.12.0";
pub const RENDER_CONTROLLER_FORMAT_VERSION: &str = "1.8.0";

/// Top-level geometry file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryDocument {
    pub format_version: String,
    #[serde(rename = "minecraft:geometry")]
    pub geometry: Vec<GeometryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryEntry {
    pub description: GeometryDescription,
    pub bones: Vec<Bone>,
    pub item_display_transforms: BTreeMap<String, ItemDisplayTransform>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryDescription {
    pub identifier: String,
    pub texture_width: u32,
    pub texture_height: u32,
    pub visible_bounds_width: f64,
    pub visible_bounds_height: f64,
    pub visible_bounds_offset: Vec3,
}

/// A named node in the bone list. `parent` and `children` are name
/// references into the same flat list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub pivot: Vec3,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cubes: Vec<Cube>,
}

impl Bone {
    pub fn new(name: impl Into<String>, pivot: Vec3) -> Self {
        Self {
            name: name.into(),
            parent: None,
            pivot,
            children: Vec::new(),
            cubes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cube {
    pub origin: Vec3,
    pub size: Vec3,
    pub pivot: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Vec3>,
    pub uv: BTreeMap<String, FaceUv>,
}

/// Per-face UV rectangle: top-left corner plus signed extent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceUv {
    pub uv: [f64; 2],
    pub uv_size: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDisplayTransform {
    pub rotation: Vec3,
    pub translation: Vec3,
    pub scale: Vec3,
    pub rotation_pivot: Vec3,
    pub scale_pivot: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit_to_frame: Option<bool>,
}

/// Render-controller file binding a geometry to its texture array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderControllerDocument {
    pub format_version: String,
    pub render_controllers: BTreeMap<String, RenderController>,
    pub arrays: TextureArrays,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderController {
    pub geometry: String,
    pub materials: Vec<BTreeMap<String, String>>,
    pub textures: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureArrays {
    pub textures: BTreeMap<String, Vec<String>>,
}

impl RenderControllerDocument {
    /// Build the single-controller, single-texture document for `name`
    pub fn for_geometry(name: &str, texture_path: String) -> Self {
        let array_name = format!("Array.textures.{}", name);

        let mut materials = BTreeMap::new();
        materials.insert("*".to_string(), "material.default".to_string());

        let mut render_controllers = BTreeMap::new();
        render_controllers.insert(
            format!("controller.render.{}", name),
            RenderController {
                geometry: format!("geometry.{}", name),
                materials: vec![materials],
                textures: array_name.clone(),
            },
        );

        let mut textures = BTreeMap::new();
        textures.insert(array_name, vec![texture_path]);

        Self {
            format_version: RENDER_CONTROLLER_FORMAT_VERSION.to_string(),
            render_controllers,
            arrays: TextureArrays { textures },
        }
    }

    /// Geometry identifier declared by the controller for `name`
    pub fn geometry_for(&self, name: &str) -> Option<&str> {
        self.render_controllers
            .get(&format!("controller.render.{}", name))
            .map(|c| c.geometry.as_str())
    }

    /// First texture path in the array for `name`
    pub fn texture_for(&self, name: &str) -> Option<&str> {
        self.arrays
            .textures
            .get(&format!("Array.textures.{}", name))
            .and_then(|paths| paths.first())
            .map(String::as_str)
    }
}
