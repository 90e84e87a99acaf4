//! Rounding rules and fixed constants of the target format

use anvil_import::Vec3;

/// Decimal places kept for cube and bone coordinates
pub const GEOMETRY_DECIMALS: i32 = 6;

/// Decimal places kept for UV corners and extents
pub const UV_DECIMALS: i32 = 3;

/// Decimal places kept for display transforms
pub const DISPLAY_DECIMALS: i32 = 2;

/// Rotation vectors whose components are all within this of zero are omitted
pub const ZERO_ROTATION_EPSILON: f64 = 1e-6;

/// Distance between the source grid's corner origin and the target's centered origin
pub const GRID_OFFSET: f64 = 8.0;

/// Round to a fixed number of decimals. Negative zero comes back as `0.0`
/// so serialized output never contains `-0.0`.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

pub fn round_vec3(v: Vec3, decimals: i32) -> Vec3 {
    [
        round_to(v[0], decimals),
        round_to(v[1], decimals),
        round_to(v[2], decimals),
    ]
}

pub fn round_pair(v: [f64; 2], decimals: i32) -> [f64; 2] {
    [round_to(v[0], decimals), round_to(v[1], decimals)]
}
