// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Orthonormal frames and profile embedding
//!
//! A [`Frame3`] is the placement a swept area lives in: the profile's (u, v)
//! coordinates map onto the frame's x and y axes, z is the sweep direction.

use crate::config::SweepConfig;
use crate::error::{Error, Result};
use crate::profile::Profile2D;
use nalgebra::{Matrix4, Point2, Point3, Vector2, Vector3};

/// Right-handed orthonormal frame in 3D
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame3 {
    pub origin: Point3<f64>,
    pub x: Vector3<f64>,
    pub y: Vector3<f64>,
    pub z: Vector3<f64>,
}

impl Frame3 {
    pub fn new(origin: Point3<f64>, x: Vector3<f64>, y: Vector3<f64>, z: Vector3<f64>) -> Self {
        Self { origin, x, y, z }
    }

    /// World frame at the origin
    pub fn identity() -> Self {
        Self::new(
            Point3::origin(),
            Vector3::x(),
            Vector3::y(),
            Vector3::z(),
        )
    }

    /// Unit axes, pairwise orthogonal and `z = x × y`, all within `tol`
    pub fn is_orthonormal(&self, tol: f64) -> bool {
        let unit = |v: &Vector3<f64>| (v.norm() - 1.0).abs() <= tol;
        unit(&self.x)
            && unit(&self.y)
            && unit(&self.z)
            && self.x.dot(&self.y).abs() <= tol
            && self.y.dot(&self.z).abs() <= tol
            && self.z.dot(&self.x).abs() <= tol
            && (self.x.cross(&self.y) - self.z).norm() <= tol
    }

    /// Local-to-parent transform; columns are the world directions of the axes
    pub fn to_matrix(&self) -> Matrix4<f64> {
        Matrix4::new(
            self.x.x, self.y.x, self.z.x, self.origin.x,
            self.x.y, self.y.y, self.z.y, self.origin.y,
            self.x.z, self.y.z, self.z.z, self.origin.z,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Same axes at a new origin
    pub fn moved_to(&self, origin: Point3<f64>) -> Self {
        Self { origin, ..*self }
    }
}

/// 2D placement of a composite-curve segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame2D {
    pub origin: Point2<f64>,
    /// Unit x axis; y is x rotated by +90°
    pub x: Vector2<f64>,
}

impl Frame2D {
    /// Placement with the given x direction (normalised; zero falls back to +X)
    pub fn new(origin: Point2<f64>, x: Vector2<f64>) -> Self {
        let norm = x.norm();
        let x = if norm > f64::EPSILON {
            x / norm
        } else {
            Vector2::x()
        };
        Self { origin, x }
    }

    pub fn identity() -> Self {
        Self::new(Point2::origin(), Vector2::x())
    }

    #[inline]
    pub fn y(&self) -> Vector2<f64> {
        Vector2::new(-self.x.y, self.x.x)
    }

    /// Map a local point to the parent plane
    #[inline]
    pub fn to_parent(&self, p: Point2<f64>) -> Point2<f64> {
        self.origin + self.x * p.x + self.y() * p.y
    }

    /// Map a local direction to the parent plane
    #[inline]
    pub fn to_parent_vector(&self, v: Vector2<f64>) -> Vector2<f64> {
        self.x * v.x + self.y() * v.y
    }
}

/// Builds profile placement frames from a normal and a reference direction
#[derive(Debug, Clone, Copy)]
pub struct ProfileFrameBuilder {
    parallel_threshold: f64,
}

impl Default for ProfileFrameBuilder {
    fn default() -> Self {
        Self::new(&SweepConfig::default())
    }
}

impl ProfileFrameBuilder {
    pub fn new(config: &SweepConfig) -> Self {
        Self {
            parallel_threshold: config.frame_parallel_threshold,
        }
    }

    /// Orthonormal frame with `z` along `normal`
    ///
    /// A reference direction that is zero or nearly parallel to the normal is
    /// replaced by global X, then global Y. Only a zero-length normal fails.
    pub fn compute_frame(
        &self,
        origin: Point3<f64>,
        normal: Vector3<f64>,
        ref_direction: Vector3<f64>,
    ) -> Result<Frame3> {
        let norm = normal.norm();
        if !(norm.is_finite() && norm > 0.0) {
            return Err(Error::DegenerateNormal);
        }
        let z = normal / norm;

        let reference = [ref_direction, Vector3::x(), Vector3::y()]
            .into_iter()
            .find(|candidate| !self.is_parallel(candidate, &z))
            .unwrap_or_else(Vector3::y);

        let x = reference.cross(&z).normalize();
        let y = z.cross(&x).normalize();

        Ok(Frame3::new(origin, x, y, z))
    }

    fn is_parallel(&self, candidate: &Vector3<f64>, z: &Vector3<f64>) -> bool {
        let n = candidate.norm();
        if !(n.is_finite() && n > f64::EPSILON) {
            return true;
        }
        (candidate.dot(z) / n).abs() > self.parallel_threshold
    }
}

/// Lift profile coordinates into 3D: `origin + u·x + v·y`
pub fn embed(points: &[Point2<f64>], frame: &Frame3) -> Vec<Point3<f64>> {
    points
        .iter()
        .map(|p| frame.origin + frame.x * p.x + frame.y * p.y)
        .collect()
}

/// Embed the outer boundary of a profile
pub fn embed_profile(profile: &Profile2D, frame: &Frame3) -> Vec<Point3<f64>> {
    embed(&profile.outer, frame)
}

/// Re-project a 3D point onto the frame's (x, y) axes
pub fn project(point: &Point3<f64>, frame: &Frame3) -> Point2<f64> {
    let d = point - frame.origin;
    Point2::new(d.dot(&frame.x), d.dot(&frame.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_frame_along_z() {
        let builder = ProfileFrameBuilder::default();
        let frame = builder
            .compute_frame(Point3::origin(), Vector3::new(0.0, 0.0, 2.0), Vector3::x())
            .unwrap();
        assert_relative_eq!(frame.z, Vector3::z(), epsilon = 1e-12);
        // X × Z = -Y
        assert_relative_eq!(frame.x, -Vector3::y(), epsilon = 1e-12);
        assert!(frame.is_orthonormal(1e-9));
    }

    #[test]
    fn test_zero_normal_fails() {
        let builder = ProfileFrameBuilder::default();
        let err = builder
            .compute_frame(Point3::origin(), Vector3::zeros(), Vector3::x())
            .unwrap_err();
        assert_eq!(err, Error::DegenerateNormal);
    }

    #[test]
    fn test_parallel_reference_falls_back() {
        let builder = ProfileFrameBuilder::default();
        let frame = builder
            .compute_frame(Point3::origin(), Vector3::z(), Vector3::new(0.0, 0.0, -3.0))
            .unwrap();
        assert!(frame.is_orthonormal(1e-9));

        // Normal along X: both the reference and the first fallback are parallel
        let frame = builder
            .compute_frame(Point3::origin(), Vector3::x(), Vector3::x())
            .unwrap();
        assert!(frame.is_orthonormal(1e-9));
        assert_relative_eq!(frame.z, Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn test_zero_reference_falls_back() {
        let builder = ProfileFrameBuilder::default();
        let frame = builder
            .compute_frame(Point3::new(1.0, 2.0, 3.0), Vector3::y(), Vector3::zeros())
            .unwrap();
        assert!(frame.is_orthonormal(1e-9));
        assert_eq!(frame.origin, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_embed_and_project() {
        let builder = ProfileFrameBuilder::default();
        let frame = builder
            .compute_frame(
                Point3::new(10.0, -4.0, 2.5),
                Vector3::new(1.0, 1.0, 1.0),
                Vector3::new(0.3, -1.0, 0.2),
            )
            .unwrap();
        let uv = [Point2::new(0.25, -1.5), Point2::new(-3.0, 7.0)];
        let lifted = embed(&uv, &frame);
        for (p3, p2) in lifted.iter().zip(uv.iter()) {
            assert_relative_eq!(project(p3, &frame), *p2, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_to_matrix_maps_axes() {
        let frame = Frame3::new(
            Point3::new(1.0, 2.0, 3.0),
            Vector3::y(),
            -Vector3::x(),
            Vector3::z(),
        );
        let m = frame.to_matrix();
        let p = m.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(1.0, 3.0, 3.0), epsilon = 1e-12);
    }

    #[test]
    fn test_frame2d_rotation() {
        let placement = Frame2D::new(Point2::new(1.0, 1.0), Vector2::new(0.0, 2.0));
        assert_relative_eq!(placement.y(), Vector2::new(-1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(
            placement.to_parent(Point2::new(1.0, 0.0)),
            Point2::new(1.0, 2.0),
            epsilon = 1e-12
        );
    }
}
