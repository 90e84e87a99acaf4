//! Anvil Import - Source model importer
//!
//! Parses cuboid models in the centered-grid JSON format (elements with
//! `from`/`to` corners, per-face UV rectangles, and a tree of named groups)
//! into owned Rust types the geometry engine consumes.

mod java_import;
mod types;

pub use java_import::{import_model, load_model};
pub use types::{
    Axis, DisplayTransform, Element, ElementRotation, Face, Group, GroupChild, JavaModel, Vec3,
    DEFAULT_TEXTURE_SIZE,
};
