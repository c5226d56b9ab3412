// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Placement and mesh offset utilities
//!
//! Placements follow the `Axis2Placement3D` convention: an optional axis
//! (default +Z) and an optional reference direction (default +X) that is
//! made orthogonal to the axis.

use crate::error::{Error, Result};
use crate::frame::Frame3;
use crate::mesh::Mesh;
use nalgebra::{Point3, Vector3};

/// Frame of an axis placement
///
/// `ref_direction` is projected onto the plane orthogonal to `axis`. When the
/// two are parallel a perpendicular default is picked instead.
pub fn axis2_placement(
    location: Point3<f64>,
    axis: Option<Vector3<f64>>,
    ref_direction: Option<Vector3<f64>>,
) -> Result<Frame3> {
    let z_axis = axis.unwrap_or_else(Vector3::z);
    let x_axis = ref_direction.unwrap_or_else(Vector3::x);

    let z_norm = z_axis.norm();
    if !(z_norm.is_finite() && z_norm > 0.0) {
        return Err(Error::DegenerateNormal);
    }
    let z_axis_final = z_axis / z_norm;

    // Ensure X is orthogonal to Z (project X onto plane perpendicular to Z)
    let x_axis_orthogonal = x_axis - z_axis_final * x_axis.dot(&z_axis_final);
    let x_axis_final = if x_axis_orthogonal.norm() > 1e-6 {
        x_axis_orthogonal.normalize()
    } else if z_axis_final.z.abs() < 0.9 {
        Vector3::z().cross(&z_axis_final).normalize()
    } else {
        Vector3::x().cross(&z_axis_final).normalize()
    };

    // Y = Z × X (right-hand rule)
    let y_axis = z_axis_final.cross(&x_axis_final).normalize();

    Ok(Frame3::new(location, x_axis_final, y_axis, z_axis_final))
}

/// Translate mesh vertices by `offset`
///
/// The addition happens in f64 before narrowing so far-from-origin
/// placements keep their precision.
pub fn apply_offset(mesh: &mut Mesh, offset: &Vector3<f64>) {
    if *offset == Vector3::zeros() {
        return;
    }
    mesh.positions.chunks_exact_mut(3).for_each(|chunk| {
        chunk[0] = (chunk[0] as f64 + offset.x) as f32;
        chunk[1] = (chunk[1] as f64 + offset.y) as f32;
        chunk[2] = (chunk[2] as f64 + offset.z) as f32;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_placement_is_identity() {
        let frame = axis2_placement(Point3::new(1.0, 2.0, 3.0), None, None).unwrap();
        assert_eq!(frame.x, Vector3::x());
        assert_eq!(frame.y, Vector3::y());
        assert_eq!(frame.z, Vector3::z());
    }

    #[test]
    fn test_reference_is_orthogonalised() {
        let frame = axis2_placement(
            Point3::origin(),
            Some(Vector3::new(0.0, 0.0, 2.0)),
            Some(Vector3::new(1.0, 0.0, 1.0)),
        )
        .unwrap();
        assert_relative_eq!(frame.x, Vector3::x(), epsilon = 1e-12);
        assert!(frame.is_orthonormal(1e-9));
    }

    #[test]
    fn test_parallel_reference_gets_default() {
        let frame = axis2_placement(Point3::origin(), Some(Vector3::x()), Some(Vector3::x())).unwrap();
        assert!(frame.is_orthonormal(1e-9));
        assert!(axis2_placement(Point3::origin(), Some(Vector3::zeros()), None).is_err());
    }

    #[test]
    fn test_apply_offset() {
        let mut mesh = Mesh::from_points(&[Point3::new(0.5, 0.0, -1.0)]);
        apply_offset(&mut mesh, &Vector3::new(287.0, 100.0, 513.0));
        assert_eq!(mesh.positions, vec![287.5, 100.0, 512.0]);
    }
}
