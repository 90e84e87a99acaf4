//! Source-to-target coordinate remapping
//!
//! The source grid spans `0..16` with its origin at a block corner; the
//! target centers the origin and mirrors x. A point maps as
//! `[-x + 8, y, z - 8]`.
//!
//! Cube origins apply that rule to `(to.x, from.y, from.z)`, taking x from
//! the `to` corner and y/z from the `from` corner. Bone pivots apply the
//! plain point rule to the group origin.

use crate::document::Cube;
use crate::numeric::{round_vec3, GEOMETRY_DECIMALS, GRID_OFFSET, ZERO_ROTATION_EPSILON};
use crate::uv::remap_face_uv;
use anvil_core::{AnvilError, Result};
use anvil_import::{Axis, Element, ElementRotation, Vec3};
use std::collections::BTreeMap;

/// Map a source point into target space
pub fn remap_point(p: Vec3) -> Vec3 {
    [-p[0] + GRID_OFFSET, p[1], p[2] - GRID_OFFSET]
}

/// Bone pivot for a group origin
pub fn bone_pivot(origin: Vec3) -> Vec3 {
    round_vec3(remap_point(origin), GEOMETRY_DECIMALS)
}

/// Rotation vector with exactly one non-zero component. x and y angles are
/// negated, z is kept. Returns `None` when the vector is effectively zero.
pub fn rotation_vector(rotation: &ElementRotation) -> Option<Vec3> {
    let v = match rotation.axis {
        Axis::X => [-rotation.angle, 0.0, 0.0],
        Axis::Y => [0.0, -rotation.angle, 0.0],
        Axis::Z => [0.0, 0.0, rotation.angle],
    };
    if v.iter().all(|c| c.abs() <= ZERO_ROTATION_EPSILON) {
        return None;
    }
    Some(round_vec3(v, GEOMETRY_DECIMALS))
}

/// Convert one element into a cube
pub fn cube_from_element(index: usize, element: &Element) -> Result<Cube> {
    let from = element.from;
    let to = element.to;
    ensure_finite(index, "from", &from)?;
    ensure_finite(index, "to", &to)?;

    let origin = remap_point([to[0], from[1], from[2]]);
    let size = [to[0] - from[0], to[1] - from[1], to[2] - from[2]];

    let explicit_origin = element.rotation.as_ref().and_then(|r| r.origin);
    let pivot = match explicit_origin {
        Some(point) => {
            ensure_finite(index, "rotation.origin", &point)?;
            remap_point(point)
        }
        None => [
            origin[0] + size[0] / 2.0,
            origin[1] + size[1] / 2.0,
            origin[2] + size[2] / 2.0,
        ],
    };

    let rotation = match &element.rotation {
        Some(r) if !r.angle.is_finite() => {
            return Err(AnvilError::Transform(format!(
                "Element {} has a non-finite rotation angle",
                index
            )));
        }
        Some(r) => rotation_vector(r),
        None => None,
    };

    let mut uv = BTreeMap::new();
    for (face, data) in &element.faces {
        match data.uv.as_deref().and_then(|raw| remap_face_uv(face, raw)) {
            Some(mapped) => {
                uv.insert(face.clone(), mapped);
            }
            None => {
                tracing::trace!(element = index, face = %face, "Face without a usable UV omitted");
            }
        }
    }

    Ok(Cube {
        origin: round_vec3(origin, GEOMETRY_DECIMALS),
        size: round_vec3(size, GEOMETRY_DECIMALS),
        pivot: round_vec3(pivot, GEOMETRY_DECIMALS),
        rotation,
        uv,
    })
}

fn ensure_finite(index: usize, field: &str, v: &Vec3) -> Result<()> {
    if v.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(AnvilError::Transform(format!(
            "Element {} has a non-finite `{}`",
            index, field
        )))
    }
}
