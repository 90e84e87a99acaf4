//! Source model types

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A point or extent in model space
pub type Vec3 = [f64; 3];

/// Texture size assumed when a model does not declare one
pub const DEFAULT_TEXTURE_SIZE: [u32; 2] = [16, 16];

/// A parsed source model
#[derive(Debug, Clone, Default)]
pub struct JavaModel {
    pub elements: Vec<Element>,
    /// Top-level groups. Bare element indices that appear at the top level of
    /// the source `groups` array are not group children and are dropped here.
    pub groups: Vec<Group>,
    /// Declared `[width, height]`, if any
    pub texture_size: Option<[f64; 2]>,
    pub display: BTreeMap<String, DisplayTransform>,
    pub textures: BTreeMap<String, String>,
    pub visible_bounds_width: Option<f64>,
    pub visible_bounds_height: Option<f64>,
    pub visible_bounds_offset: Option<Vec3>,
}

impl JavaModel {
    /// First texture reference in key order. `particle` is only used when it
    /// is the sole entry.
    pub fn primary_texture(&self) -> Option<&str> {
        self.textures
            .iter()
            .find(|(key, _)| key.as_str() != "particle")
            .or_else(|| self.textures.iter().next())
            .map(|(_, value)| value.as_str())
    }

    /// Number of groups in the whole tree
    pub fn group_count(&self) -> usize {
        fn count(group: &Group) -> usize {
            1 + group
                .children
                .iter()
                .map(|c| match c {
                    GroupChild::Group(g) => count(g),
                    GroupChild::Element(_) => 0,
                })
                .sum::<usize>()
        }
        self.groups.iter().map(count).sum()
    }
}

/// An axis-aligned cuboid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub from: Vec3,
    pub to: Vec3,
    #[serde(default)]
    pub rotation: Option<ElementRotation>,
    #[serde(default, deserialize_with = "non_null_faces")]
    pub faces: BTreeMap<String, Face>,
}

/// Faces written as `null` are treated as absent
fn non_null_faces<'de, D>(deserializer: D) -> Result<BTreeMap<String, Face>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, Option<Face>> = BTreeMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(name, face)| face.map(|f| (name, f)))
        .collect())
}

/// Single-axis element rotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRotation {
    pub axis: Axis,
    #[serde(default)]
    pub angle: f64,
    /// Rotation origin in source coordinates
    #[serde(default)]
    pub origin: Option<Vec3>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// One face of an element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Face {
    /// `[u0, v0, u1, v1]` in texels. Kept as a list so malformed lengths can
    /// be detected later instead of failing the whole parse.
    #[serde(default)]
    pub uv: Option<Vec<f64>>,
    #[serde(default)]
    pub texture: Option<String>,
}

/// A named hierarchy node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default = "default_group_name")]
    pub name: String,
    #[serde(default = "default_group_origin")]
    pub origin: Vec3,
    #[serde(default)]
    pub children: Vec<GroupChild>,
}

fn default_group_name() -> String {
    "unnamed".to_string()
}

fn default_group_origin() -> Vec3 {
    [8.0, 8.0, 8.0]
}

/// A group child: an index into `JavaModel::elements` or a nested group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupChild {
    Element(usize),
    Group(Group),
}

/// Per-pose display transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayTransform {
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default)]
    pub translation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
}

fn default_scale() -> Vec3 {
    [1.0, 1.0, 1.0]
}

impl Default for DisplayTransform {
    fn default() -> Self {
        Self {
            rotation: [0.0; 3],
            translation: [0.0; 3],
            scale: default_scale(),
        }
    }
}
