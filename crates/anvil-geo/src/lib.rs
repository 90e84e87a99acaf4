//! Anvil Geo - Geometry transform engine
//!
//! Converts a parsed source model plus a texture reference into a target
//! geometry document (bones and cubes in an offset coordinate frame) and a
//! render-controller document binding that geometry to its texture.
//!
//! The conversion is pure: identical input always yields byte-identical
//! output from [`Conversion::to_bytes`].

mod bones;
mod display;
mod document;
mod engine;
pub mod numeric;
mod remap;
mod texture;
mod uv;

pub use bones::{build_bones, NameAllocator};
pub use display::display_transforms;
pub use document::{
    Bone, Cube, FaceUv, GeometryDescription, GeometryDocument, GeometryEntry, ItemDisplayTransform,
    RenderController, RenderControllerDocument, TextureArrays,
};
pub use engine::{convert, Conversion, ConvertRequest, EngineOptions};
pub use remap::{bone_pivot, cube_from_element, remap_point, rotation_vector};
pub use texture::{flatten_texture_ref, strip_namespace, texture_binding_path};
pub use uv::remap_face_uv;
