//! Source model JSON importer

use crate::types::{DisplayTransform, Element, GroupChild, JavaModel, Vec3};
use anvil_core::{AnvilError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Document shape as it appears on disk
#[derive(Debug, Deserialize)]
struct ModelFile {
    #[serde(default)]
    elements: Vec<Element>,
    #[serde(default)]
    groups: Vec<GroupChild>,
    #[serde(default)]
    texture_size: Option<[f64; 2]>,
    #[serde(default)]
    display: BTreeMap<String, DisplayTransform>,
    #[serde(default)]
    textures: BTreeMap<String, String>,
    #[serde(default)]
    visible_bounds_width: Option<f64>,
    #[serde(default)]
    visible_bounds_height: Option<f64>,
    #[serde(default)]
    visible_bounds_offset: Option<Vec3>,
}

/// Parse a model from JSON text
pub fn import_model(json: &str) -> Result<JavaModel> {
    let file: ModelFile = serde_json::from_str(json)
        .map_err(|e| AnvilError::Parse(format!("Invalid model document: {}", e)))?;

    let mut groups = Vec::new();
    let mut loose = 0usize;
    for entry in file.groups {
        match entry {
            GroupChild::Group(group) => groups.push(group),
            GroupChild::Element(_) => loose += 1,
        }
    }
    if loose > 0 {
        tracing::debug!(loose, "Top-level element indices are not group children");
    }

    Ok(JavaModel {
        elements: file.elements,
        groups,
        texture_size: file.texture_size,
        display: file.display,
        textures: file.textures,
        visible_bounds_width: file.visible_bounds_width,
        visible_bounds_height: file.visible_bounds_height,
        visible_bounds_offset: file.visible_bounds_offset,
    })
}

/// Read and parse a model file. A missing file is a resolution error; any
/// other read or syntax problem is a parse error.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<JavaModel> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AnvilError::Resolution(format!("Model file not found: {}", path.display()))
        } else {
            AnvilError::Parse(format!("Failed to read {}: {}", path.display(), e))
        }
    })?;

    import_model(&content).map_err(|e| match e {
        AnvilError::Parse(msg) => AnvilError::Parse(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Axis;

    const SAMPLE: &str = r##"{
        "credit": "Made with Blockbench",
        "texture_size": [32, 32],
        "textures": {"0": "custom:item/sword", "particle": "custom:item/sword"},
        "elements": [
            {
                "from": [7, 0, 7], "to": [9, 12, 9],
                "rotation": {"angle": 45, "axis": "y", "origin": [8, 0, 8]},
                "faces": {
                    "north": {"uv": [0, 0, 2, 12], "texture": "#0"},
                    "up": {"uv": [2, 2, 0, 0], "texture": "#0"},
                    "west": null
                }
            },
            {"from": [6, 12, 6], "to": [10, 16, 10], "faces": {}}
        ],
        "groups": [
            {"name": "blade", "origin": [8, 8, 8], "color": 0, "children": [0]},
            1
        ],
        "display": {
            "gui": {"rotation": [30, 225, 0], "scale": [0.625, 0.625, 0.625]}
        }
    }"##;

    #[test]
    fn test_import_sample() {
        let model = import_model(SAMPLE).unwrap();
        assert_eq!(model.elements.len(), 2);
        assert_eq!(model.groups.len(), 1);
        assert_eq!(model.groups[0].name, "blade");
        assert_eq!(model.texture_size, Some([32.0, 32.0]));
        assert_eq!(model.primary_texture(), Some("custom:item/sword"));

        let first = &model.elements[0];
        let rot = first.rotation.as_ref().unwrap();
        assert_eq!(rot.axis, Axis::Y);
        assert_eq!(rot.origin, Some([8.0, 0.0, 8.0]));
        assert_eq!(first.faces.len(), 2);
        assert!(!first.faces.contains_key("west"));
        assert!(model.display.contains_key("gui"));
    }

    #[test]
    fn test_empty_document() {
        let model = import_model("{}").unwrap();
        assert!(model.elements.is_empty());
        assert!(model.groups.is_empty());
        assert!(model.texture_size.is_none());
    }

    #[test]
    fn test_malformed_document_is_parse_error() {
        let err = import_model(r#"{"elements": [{"from": [0, 0], "to": [1, 1, 1]}]}"#).unwrap_err();
        assert!(matches!(err, AnvilError::Parse(_)));
        let err = import_model("not json").unwrap_err();
        assert!(matches!(err, AnvilError::Parse(_)));
    }

    #[test]
    fn test_wrong_length_uv_still_parses() {
        let model = import_model(
            r#"{"elements": [{"from": [0,0,0], "to": [1,1,1], "faces": {"north": {"uv": [0, 0, 1]}}}]}"#,
        )
        .unwrap();
        assert_eq!(model.elements[0].faces["north"].uv, Some(vec![0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_load_missing_file_is_resolution_error() {
        let path = std::env::temp_dir().join(format!("anvil_missing_{}.json", uuid::Uuid::new_v4()));
        let err = load_model(&path).unwrap_err();
        assert!(matches!(err, AnvilError::Resolution(_)));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = std::env::temp_dir().join(format!("anvil_import_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sword.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let model = load_model(&path).unwrap();
        assert_eq!(model.group_count(), 1);

        std::fs::remove_dir_all(&dir).ok();
    }
}
