//! Anvil Asset - Model reference resolution
//!
//! Maps `namespace:path` model references onto files inside a resource
//! pack's `assets/` tree, and pre-resolves the references a batch needs
//! into a read-only index that workers can share.

mod index;
mod locator;
mod types;

pub use index::PathIndex;
pub use locator::AssetLocator;
pub use types::ModelRef;
