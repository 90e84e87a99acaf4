//! Model conversion entry point

use crate::bones::build_bones;
use crate::display::display_transforms;
use crate::document::{
    GeometryDescription, GeometryDocument, GeometryEntry, RenderControllerDocument,
    GEOMETRY_FORMAT_VERSION,
};
use crate::texture::texture_binding_path;
use anvil_core::{AnvilError, Result};
use anvil_import::{JavaModel, Vec3, DEFAULT_TEXTURE_SIZE};
use serde::Serialize;

const DEFAULT_VISIBLE_BOUNDS_WIDTH: f64 = 2.0;
const DEFAULT_VISIBLE_BOUNDS_HEIGHT: f64 = 2.5;
const DEFAULT_VISIBLE_BOUNDS_OFFSET: Vec3 = [0.0, 0.75, 0.0];

/// Knobs shared by every conversion in a batch
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    /// Halve the declared texture size (integer division, floor 1)
    pub halve_texture_size: bool,
    /// Prefix for render-binding texture paths
    pub texture_root: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            halve_texture_size: false,
            texture_root: "textures/item".to_string(),
        }
    }
}

/// One conversion: output name plus the texture reference supplied by the job
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub name: String,
    pub texture_ref: String,
    pub options: EngineOptions,
}

/// Both documents produced from one model
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub geometry: GeometryDocument,
    pub render_controller: RenderControllerDocument,
}

impl Conversion {
    /// Serialized `(geometry, render_controller)` bytes as written to disk
    pub fn to_bytes(&self) -> Result<(Vec<u8>, Vec<u8>)> {
        Ok((to_pretty_json(&self.geometry)?, to_pretty_json(&self.render_controller)?))
    }
}

/// Convert a parsed model into geometry and render-binding documents
pub fn convert(model: &JavaModel, request: &ConvertRequest) -> Result<Conversion> {
    let name = request.name.as_str();
    if name.trim().is_empty() {
        return Err(AnvilError::Transform("Output name is empty".into()));
    }
    // The name becomes file names and identifiers verbatim
    if name.trim() != name {
        return Err(AnvilError::Transform(format!(
            "Output name {:?} has surrounding whitespace",
            name
        )));
    }

    let [mut width, mut height] = texture_size(model)?;
    if request.options.halve_texture_size {
        width = (width / 2).max(1);
        height = (height / 2).max(1);
    }

    let bones = build_bones(model)?;
    tracing::debug!(
        name,
        bones = bones.len(),
        elements = model.elements.len(),
        "Built bone list"
    );

    let identifier = format!("geometry.{}", name);
    let geometry = GeometryDocument {
        format_version: GEOMETRY_FORMAT_VERSION.to_string(),
        geometry: vec![GeometryEntry {
            description: GeometryDescription {
                identifier,
                texture_width: width,
                texture_height: height,
                visible_bounds_width: model
                    .visible_bounds_width
                    .unwrap_or(DEFAULT_VISIBLE_BOUNDS_WIDTH),
                visible_bounds_height: model
                    .visible_bounds_height
                    .unwrap_or(DEFAULT_VISIBLE_BOUNDS_HEIGHT),
                visible_bounds_offset: model
                    .visible_bounds_offset
                    .unwrap_or(DEFAULT_VISIBLE_BOUNDS_OFFSET),
            },
            bones,
            item_display_transforms: display_transforms(&model.display),
        }],
    };

    let texture_path = texture_binding_path(&request.options.texture_root, &request.texture_ref);
    let render_controller = RenderControllerDocument::for_geometry(name, texture_path);

    Ok(Conversion {
        geometry,
        render_controller,
    })
}

fn texture_size(model: &JavaModel) -> Result<[u32; 2]> {
    let Some([width, height]) = model.texture_size else {
        return Ok(DEFAULT_TEXTURE_SIZE);
    };
    let dim = |v: f64| -> Result<u32> {
        let rounded = v.round();
        if !v.is_finite() || rounded < 1.0 || rounded > u32::MAX as f64 {
            return Err(AnvilError::Transform(format!(
                "Texture size {}x{} is not positive",
                width, height
            )));
        }
        Ok(rounded as u32)
    };
    Ok([dim(width)?, dim(height)?])
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}
