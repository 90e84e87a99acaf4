//! Face UV remapping

use crate::document::FaceUv;
use crate::numeric::{round_pair, UV_DECIMALS};

/// Remap a source `[u0, v0, u1, v1]` rectangle for `face`.
///
/// - side faces: corner `(u0, v0)`, extent `(u1 - u0, v1 - v0)`
/// - `up`: corner `(u1, v1)`, same extent
/// - `down`: corner `(u1, v1)`, extent height negated
///
/// Returns `None` unless `uv` has exactly four finite components; such faces
/// are left out of the cube rather than given a default rectangle.
pub fn remap_face_uv(face: &str, uv: &[f64]) -> Option<FaceUv> {
    let [u0, v0, u1, v1]: [f64; 4] = uv.try_into().ok()?;
    if !(u0.is_finite() && v0.is_finite() && u1.is_finite() && v1.is_finite()) {
        return None;
    }

    let width = u1 - u0;
    let height = v1 - v0;

    let (corner, extent) = match face {
        "up" => ([u1, v1], [width, height]),
        "down" => ([u1, v1], [width, -height]),
        _ => ([u0, v0], [width, height]),
    };

    Some(FaceUv {
        uv: round_pair(corner, UV_DECIMALS),
        uv_size: round_pair(extent, UV_DECIMALS),
    })
}
