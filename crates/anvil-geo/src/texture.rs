//! Texture reference flattening
//!
//! Source references look like `namespace:item/sword` or `item\\sword.png`.
//! The target wants a flat slash path without a namespace separator.

/// Flatten a texture reference: `\` becomes `/`, a trailing file extension
/// is dropped, and `namespace:path` becomes `namespace/path`.
pub fn flatten_texture_ref(reference: &str) -> String {
    let normalized = reference.trim().replace('\\', "/");
    let without_ext = strip_extension(&normalized);
    match without_ext.split_once(':') {
        Some((namespace, path)) if !namespace.is_empty() => {
            format!("{}/{}", namespace, path.trim_start_matches('/'))
        }
        Some((_, path)) => path.trim_start_matches('/').to_string(),
        None => without_ext.to_string(),
    }
}

/// Drop a `namespace:` prefix if present
pub fn strip_namespace(reference: &str) -> &str {
    reference
        .split_once(':')
        .map(|(_, path)| path)
        .unwrap_or(reference)
}

/// Path written into the render-binding texture array
pub fn texture_binding_path(texture_root: &str, reference: &str) -> String {
    let root = texture_root.trim_end_matches('/');
    let flat = flatten_texture_ref(reference);
    if root.is_empty() {
        flat
    } else {
        format!("{}/{}", root, flat)
    }
}

fn strip_extension(path: &str) -> &str {
    let file_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[file_start..].rfind('.') {
        Some(dot) if dot > 0 => &path[..file_start + dot],
        _ => path,
    }
}
