// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Swept solid tessellation
//!
//! The profile is placed on a rotation-minimising frame at every directrix
//! sample, neighbouring sections are stitched into side walls and both ends
//! are capped with the earcut triangulation of the profile.

use crate::config::SweepConfig;
use crate::error::{Error, Result};
use crate::frame::{embed, Frame3};
use crate::mesh::Mesh;
use crate::swept::SweptSolidDescriptor;
use crate::transform::{apply_offset, axis2_placement};
use nalgebra::{Point2, Point3, Rotation3, Vector3};
use tracing::debug;

/// Turns a swept solid descriptor into a triangle mesh
pub trait Tessellator {
    fn tessellate(&self, solid: &SweptSolidDescriptor) -> Result<Mesh>;
}

/// Built-in sweep tessellator
#[derive(Debug, Clone, Copy)]
pub struct SweepTessellator {
    max_angle_step: f64,
}

impl Default for SweepTessellator {
    fn default() -> Self {
        Self::new(&SweepConfig::default())
    }
}

impl SweepTessellator {
    pub fn new(config: &SweepConfig) -> Self {
        Self {
            max_angle_step: config.arc_angle_step,
        }
    }

    /// One frame per path sample, seeded by the solid's position
    fn sweep_frames(&self, path: &[Point3<f64>], solid: &SweptSolidDescriptor) -> Result<Vec<Frame3>> {
        let tangents = path_tangents(path);
        let seed = axis2_placement(path[0], Some(solid.position.z), Some(solid.position.x))?;

        let mut frames = Vec::with_capacity(path.len());
        frames.push(seed);
        for (point, tangent) in path.iter().zip(tangents.iter()).skip(1) {
            let prev = frames[frames.len() - 1];
            let rotation =
                Rotation3::rotation_between(&prev.z, tangent).unwrap_or_else(Rotation3::identity);
            let x = rotation * prev.x;
            let x = (x - tangent * x.dot(tangent)).normalize();
            frames.push(Frame3::new(*point, x, tangent.cross(&x), *tangent));
        }
        Ok(frames)
    }
}

impl Tessellator for SweepTessellator {
    fn tessellate(&self, solid: &SweptSolidDescriptor) -> Result<Mesh> {
        let path = solid.directrix.sample_points(self.max_angle_step);
        if path.len() < 2 {
            return Err(Error::Tessellation(format!(
                "{} directrix collapses to a single point",
                solid.directrix.kind()
            )));
        }
        let frames = self.sweep_frames(&path, solid)?;

        let mut mesh = Mesh::new();
        for ring in solid.profile.loops() {
            let sections: Vec<Vec<Point3<f64>>> = frames.iter().map(|f| embed(ring, f)).collect();
            let n = ring.len();
            for pair in sections.windows(2) {
                let (near, far) = (&pair[0], &pair[1]);
                for i in 0..n {
                    let j = (i + 1) % n;
                    mesh.add_facet(near[i], near[j], far[j]);
                    mesh.add_facet(near[i], far[j], far[i]);
                }
            }
        }

        let triangulation = solid.profile.triangulate()?;
        let start = embed(&triangulation.points, &frames[0]);
        let end = embed(&triangulation.points, &frames[frames.len() - 1]);
        for tri in triangulation.indices.chunks_exact(3) {
            let (a, b, c) = ccw(&triangulation.points, tri[0], tri[1], tri[2]);
            // start cap faces backwards along the path
            mesh.add_facet(start[a], start[c], start[b]);
            mesh.add_facet(end[a], end[b], end[c]);
        }

        apply_offset(&mut mesh, &solid.placement_offset);

        debug!(
            directrix = solid.directrix.kind(),
            sections = frames.len(),
            triangles = mesh.triangle_count(),
            "Tessellated swept solid"
        );
        Ok(mesh)
    }
}

/// Vertex tangents: chord directions at the ends, bisectors in between
fn path_tangents(path: &[Point3<f64>]) -> Vec<Vector3<f64>> {
    let chords: Vec<Vector3<f64>> = path.windows(2).map(|w| (w[1] - w[0]).normalize()).collect();
    let last = chords.len() - 1;
    (0..path.len())
        .map(|i| {
            if i == 0 {
                chords[0]
            } else if i > last {
                chords[last]
            } else {
                let bisector = chords[i - 1] + chords[i];
                let len = bisector.norm();
                if len > 1e-9 {
                    bisector / len
                } else {
                    chords[i]
                }
            }
        })
        .collect()
}

/// Indices of a profile triangle in counter-clockwise order
fn ccw(points: &[Point2<f64>], a: usize, b: usize, c: usize) -> (usize, usize, usize) {
    let (pa, pb, pc) = (points[a], points[b], points[c]);
    let cross = (pb - pa).perp(&(pc - pa));
    if cross < 0.0 {
        (a, c, b)
    } else {
        (a, b, c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directrix::Directrix;
    use crate::profile::create_rectangle;
    use crate::swept::SweptSolidAssembler;
    use approx::assert_relative_eq;

    fn sizes(mesh: &Mesh) -> Vector3<f32> {
        let (min, max) = mesh.bounds();
        max - min
    }

    #[test]
    fn test_straight_box() {
        let directrix =
            Directrix::from_points(vec![Point3::origin(), Point3::new(10.0, 0.0, 0.0)]).unwrap();
        let solid = SweptSolidAssembler::default()
            .assemble(&create_rectangle(2.0, 1.0), &directrix)
            .unwrap();
        let mesh = SweepTessellator::default().tessellate(&solid).unwrap();

        // width follows the fixed reference (global Z), height follows -Y
        let size = sizes(&mesh);
        assert_relative_eq!(size.x, 10.0, epsilon = 1e-5);
        assert_relative_eq!(size.y, 1.0, epsilon = 1e-5);
        assert_relative_eq!(size.z, 2.0, epsilon = 1e-5);
        // 4 walls × 2 triangles + 2 caps × 2 triangles
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn test_placement_offset_is_restored() {
        let directrix = Directrix::from_points(vec![
            Point3::new(100.0, 50.0, 3.0),
            Point3::new(100.0, 50.0, 7.0),
        ])
        .unwrap();
        let solid = SweptSolidAssembler::default()
            .assemble(&create_rectangle(1.0, 1.0), &directrix)
            .unwrap();
        let mesh = SweepTessellator::default().tessellate(&solid).unwrap();
        let (min, max) = mesh.bounds();
        assert_relative_eq!(min.z, 3.0, epsilon = 1e-5);
        assert_relative_eq!(max.z, 7.0, epsilon = 1e-5);
        assert_relative_eq!((min.x + max.x) / 2.0, 100.0, epsilon = 1e-4);
    }

    #[test]
    fn test_quarter_arc_extent() {
        let directrix = Directrix::from_indexed(
            vec![
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(
                    std::f64::consts::FRAC_1_SQRT_2,
                    std::f64::consts::FRAC_1_SQRT_2,
                    0.0,
                ),
                Point3::new(0.0, 1.0, 0.0),
            ],
            &[vec![1, 2, 3]],
        )
        .unwrap();
        let solid = SweptSolidAssembler::default()
            .assemble(&create_rectangle(0.2, 0.2), &directrix)
            .unwrap();
        let mesh = SweepTessellator::default().tessellate(&solid).unwrap();
        let size = sizes(&mesh);
        // centreline spans 1.0 in x and y, the section adds its half-width on
        // the outside of the bend only
        assert!(size.x > 1.05 && size.x < 1.15);
        assert!(size.y > 1.05 && size.y < 1.15);
        assert_relative_eq!(size.z, 0.2, epsilon = 1e-5);
    }

    #[test]
    fn test_arc_start_frame_matches_position() {
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let directrix = Directrix::from_indexed(
            vec![
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(s, s, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            &[vec![1, 2, 3]],
        )
        .unwrap();
        let solid = SweptSolidAssembler::default()
            .assemble(&create_rectangle(0.2, 0.2), &directrix)
            .unwrap();
        let tessellator = SweepTessellator::default();
        let path = solid.directrix.sample_points(tessellator.max_angle_step);
        let frames = tessellator.sweep_frames(&path, &solid).unwrap();

        // the first chord leans into the bend, the start section must not
        let chord = (path[1] - path[0]).normalize();
        assert!(chord.dot(&solid.position.z) < 1.0 - 1e-6);
        assert_relative_eq!(frames[0].origin, solid.position.origin, epsilon = 1e-12);
        assert_relative_eq!(frames[0].z, solid.position.z, epsilon = 1e-12);
        assert_relative_eq!(frames[0].x, solid.position.x, epsilon = 1e-12);
        assert!(frames.iter().all(|f| f.is_orthonormal(1e-9)));
    }

    #[test]
    fn test_path_tangents_bisect_corners() {
        let path = [
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let t = path_tangents(&path);
        assert_eq!(t.len(), 3);
        assert_relative_eq!(t[1], Vector3::new(1.0, 1.0, 0.0).normalize(), epsilon = 1e-12);
        assert_relative_eq!(t[2], Vector3::y(), epsilon = 1e-12);
    }
}
