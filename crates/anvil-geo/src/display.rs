//! Display pose transforms

use crate::document::ItemDisplayTransform;
use crate::numeric::{round_vec3, DISPLAY_DECIMALS};
use anvil_import::DisplayTransform;
use std::collections::BTreeMap;

/// Pose that additionally disables frame fitting
const GUI_POSE: &str = "gui";

/// Convert every declared pose. Absent poses produce no entry.
///
/// Pose keys are lowercased; when two keys collide the first in key order
/// wins and the rest are dropped with a warning.
pub fn display_transforms(
    display: &BTreeMap<String, DisplayTransform>,
) -> BTreeMap<String, ItemDisplayTransform> {
    let mut out = BTreeMap::new();
    for (declared, transform) in display {
        let pose = declared.to_lowercase();
        if out.contains_key(&pose) {
            tracing::warn!(pose = %declared, "Display pose collides after lowercasing; ignored");
            continue;
        }
        let entry = ItemDisplayTransform {
            rotation: round_vec3(transform.rotation, DISPLAY_DECIMALS),
            translation: round_vec3(transform.translation, DISPLAY_DECIMALS),
            scale: round_vec3(transform.scale, DISPLAY_DECIMALS),
            rotation_pivot: [0.0; 3],
            scale_pivot: [0.0; 3],
            fit_to_frame: (pose == GUI_POSE).then_some(false),
        };
        out.insert(pose, entry);
    }
    out
}
