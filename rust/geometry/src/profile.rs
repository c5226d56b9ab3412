// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D swept-area profiles and their triangulation

use crate::error::{Error, Result};
use nalgebra::Point2;

/// Points closer than this are the same profile vertex
const PROFILE_EPSILON: f64 = 1e-12;

/// Closed 2D profile in the local z=0 plane, with optional holes
///
/// The closing point may be given explicitly (first == last) or implied.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile2D {
    /// Outer boundary
    pub outer: Vec<Point2<f64>>,
    /// Inner boundaries (holes)
    pub holes: Vec<Vec<Point2<f64>>>,
}

impl Profile2D {
    /// Create a profile without validation
    pub fn new(outer: Vec<Point2<f64>>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    /// Create a profile, requiring at least 3 distinct points
    pub fn from_points(outer: Vec<Point2<f64>>) -> Result<Self> {
        let profile = Self::new(outer);
        profile.validate()?;
        Ok(profile)
    }

    /// Create a profile from raw coordinate tuples
    ///
    /// Every tuple must have exactly two coordinates: a third coordinate would
    /// lift the swept area out of its z=0 plane.
    pub fn from_coordinates(coords: &[Vec<f64>]) -> Result<Self> {
        if let Some((i, c)) = coords.iter().enumerate().find(|(_, c)| c.len() != 2) {
            return Err(Error::profile(format!(
                "profile point {} has {} coordinates, expected 2",
                i,
                c.len()
            )));
        }
        Self::from_points(coords.iter().map(|c| Point2::new(c[0], c[1])).collect())
    }

    /// Add a hole to the profile
    pub fn add_hole(&mut self, hole: Vec<Point2<f64>>) {
        self.holes.push(hole);
    }

    /// Outer boundary without an explicit closing point
    pub fn ring(&self) -> &[Point2<f64>] {
        open_ring(&self.outer)
    }

    /// Outer ring followed by the hole rings, all without closing points
    pub fn loops(&self) -> impl Iterator<Item = &[Point2<f64>]> + '_ {
        std::iter::once(self.ring()).chain(self.holes.iter().map(|h| open_ring(h)))
    }

    /// True when the last point repeats the first
    pub fn is_explicitly_closed(&self) -> bool {
        self.outer.len() > 1 && self.ring().len() < self.outer.len()
    }

    /// Number of distinct outer vertices
    pub fn distinct_point_count(&self) -> usize {
        let ring = self.ring();
        let mut distinct: Vec<Point2<f64>> = Vec::with_capacity(ring.len());
        for p in ring {
            if !distinct.iter().any(|q| (p - q).norm() <= PROFILE_EPSILON) {
                distinct.push(*p);
            }
        }
        distinct.len()
    }

    /// Signed area of the outer boundary (positive = counter-clockwise)
    pub fn signed_area(&self) -> f64 {
        signed_area(self.ring())
    }

    /// Check the closed-polygon invariants
    pub fn validate(&self) -> Result<()> {
        if self.outer.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(Error::profile("profile contains non-finite coordinates"));
        }
        let distinct = self.distinct_point_count();
        if distinct < 3 {
            return Err(Error::profile(format!(
                "profile must have at least 3 distinct points, got {}",
                distinct
            )));
        }
        Ok(())
    }

    /// Extents of the outer boundary as (min, max)
    pub fn bounds(&self) -> (Point2<f64>, Point2<f64>) {
        let mut min = Point2::new(f64::MAX, f64::MAX);
        let mut max = Point2::new(f64::MIN, f64::MIN);
        for p in &self.outer {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        (min, max)
    }

    /// Triangulate the profile using earcutr
    /// Returns triangle indices into the flattened vertex array
    pub fn triangulate(&self) -> Result<Triangulation> {
        let outer = self.ring();
        if outer.len() < 3 {
            return Err(Error::profile("Profile must have at least 3 vertices"));
        }

        let hole_rings: Vec<&[Point2<f64>]> = self.holes.iter().map(|h| open_ring(h)).collect();

        let mut vertices = Vec::with_capacity(
            (outer.len() + hole_rings.iter().map(|h| h.len()).sum::<usize>()) * 2,
        );
        for p in outer {
            vertices.push(p.x);
            vertices.push(p.y);
        }

        let mut hole_indices = Vec::with_capacity(hole_rings.len());
        for hole in &hole_rings {
            hole_indices.push(vertices.len() / 2);
            for p in hole.iter() {
                vertices.push(p.x);
                vertices.push(p.y);
            }
        }

        let indices = earcutr::earcut(&vertices, &hole_indices, 2)
            .map_err(|e| Error::Tessellation(format!("{:?}", e)))?;

        let points = vertices
            .chunks_exact(2)
            .map(|c| Point2::new(c[0], c[1]))
            .collect();

        Ok(Triangulation { points, indices })
    }
}

/// Triangulated profile result
#[derive(Debug, Clone)]
pub struct Triangulation {
    /// All vertices (outer + holes)
    pub points: Vec<Point2<f64>>,
    /// Triangle indices
    pub indices: Vec<usize>,
}

/// Common pipe and beam sections
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileType {
    Rectangle { width: f64, height: f64 },
    Circle { radius: f64 },
    HollowCircle { outer_radius: f64, inner_radius: f64 },
    Polygon { points: Vec<Point2<f64>> },
}

impl ProfileType {
    /// Convert to Profile2D
    pub fn to_profile(&self) -> Profile2D {
        match self {
            Self::Rectangle { width, height } => create_rectangle(*width, *height),
            Self::Circle { radius } => create_circle(*radius, None),
            Self::HollowCircle {
                outer_radius,
                inner_radius,
            } => create_circle(*outer_radius, Some(*inner_radius)),
            Self::Polygon { points } => Profile2D::new(points.clone()),
        }
    }
}

/// Create a rectangular profile centred on the origin
#[inline]
pub fn create_rectangle(width: f64, height: f64) -> Profile2D {
    let half_w = width / 2.0;
    let half_h = height / 2.0;

    Profile2D::new(vec![
        Point2::new(-half_w, -half_h),
        Point2::new(half_w, -half_h),
        Point2::new(half_w, half_h),
        Point2::new(-half_w, half_h),
    ])
}

/// Create a circular profile (with optional hole)
pub fn create_circle(radius: f64, hole_radius: Option<f64>) -> Profile2D {
    let mut profile = Profile2D::new(circle_points(radius));

    if let Some(hole_r) = hole_radius.filter(|r| *r > 0.0) {
        let mut hole = circle_points(hole_r);
        hole.reverse(); // clockwise
        profile.add_hole(hole);
    }

    profile
}

fn circle_points(radius: f64) -> Vec<Point2<f64>> {
    let segments = calculate_circle_segments(radius);
    (0..segments)
        .map(|i| {
            let angle = 2.0 * std::f64::consts::PI * (i as f64) / (segments as f64);
            Point2::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

/// Adaptive number of segments for a circle, clamped to 8..=32
#[inline]
pub fn calculate_circle_segments(radius: f64) -> usize {
    let segments = (radius.abs().sqrt() * 8.0).ceil() as usize;
    segments.clamp(8, 32)
}

fn open_ring(points: &[Point2<f64>]) -> &[Point2<f64>] {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() > 1 && (first - last).norm() <= PROFILE_EPSILON => {
            &points[..points.len() - 1]
        }
        _ => points,
    }
}

fn signed_area(ring: &[Point2<f64>]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        twice += a.x * b.y - b.x * a.y;
    }
    twice / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_profile() {
        let profile = create_rectangle(10.0, 5.0);
        assert_eq!(profile.outer.len(), 4);
        assert_eq!(profile.holes.len(), 0);
        assert_eq!(profile.outer[0], Point2::new(-5.0, -2.5));
        assert_eq!(profile.outer[2], Point2::new(5.0, 2.5));
        assert!((profile.signed_area() - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_implied_and_explicit_closure() {
        let implied = Profile2D::from_points(vec![
            Point2::new(0.0, 0.0),
            Point2::new(-0.008, 0.0),
            Point2::new(0.0, 0.008),
        ])
        .unwrap();
        assert!(!implied.is_explicitly_closed());
        assert_eq!(implied.distinct_point_count(), 3);

        let explicit = Profile2D::from_points(vec![
            Point2::new(0.0, 0.0),
            Point2::new(-0.008, 0.0),
            Point2::new(0.0, 0.008),
            Point2::new(0.0, 0.0),
        ])
        .unwrap();
        assert!(explicit.is_explicitly_closed());
        assert_eq!(explicit.ring().len(), 3);
    }

    #[test]
    fn test_too_few_distinct_points() {
        let err = Profile2D::from_points(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 0.0),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::InvalidProfile(_)));
    }

    #[test]
    fn test_from_coordinates_rejects_third_coordinate() {
        let coords = vec![vec![0.0, 0.0], vec![1.0, 0.0, 0.5], vec![0.0, 1.0]];
        assert!(Profile2D::from_coordinates(&coords).is_err());

        let coords = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]];
        assert!(Profile2D::from_coordinates(&coords).is_ok());
    }

    #[test]
    fn test_hollow_circle() {
        let profile = create_circle(10.0, Some(5.0));
        assert_eq!(profile.holes.len(), 1);
        assert!(profile.holes[0].len() >= 8);
        assert!(profile.signed_area() > 0.0);
    }

    #[test]
    fn test_triangulate_explicitly_closed_triangle() {
        let profile = Profile2D::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(0.0, 0.0),
        ]);
        let tri = profile.triangulate().unwrap();
        assert_eq!(tri.points.len(), 3);
        assert_eq!(tri.indices.len(), 3);
    }

    #[test]
    fn test_triangulate_hollow_circle() {
        let profile = create_circle(10.0, Some(5.0));
        let tri = profile.triangulate().unwrap();
        let outer_count = calculate_circle_segments(10.0);
        let inner_count = calculate_circle_segments(5.0);
        assert_eq!(tri.points.len(), outer_count + inner_count);
        assert!(!tri.indices.is_empty());
    }

    #[test]
    fn test_circle_segments() {
        assert_eq!(calculate_circle_segments(1.0), 8);
        assert_eq!(calculate_circle_segments(4.0), 16);
        assert!(calculate_circle_segments(100.0) <= 32);
        assert!(calculate_circle_segments(0.1) >= 8);
    }
}
