// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property-based tests for frame construction, fixed-reference choice and
//! elbow fitting.

use ifc_sweep_geometry::{
    choose_fixed_reference, embed, project, route_from_points, ElbowFitter, PipeSection,
    PipeSectionRef, Point2, Point3, ProfileFrameBuilder, SweepConfig, Vector3,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

/// Arbitrary direction, not too close to zero length.
fn arb_direction() -> impl Strategy<Value = Vector3<f64>> {
    (-1.0f64..1.0, -1.0f64..1.0, -1.0f64..1.0)
        .prop_map(|(x, y, z)| Vector3::new(x, y, z))
        .prop_filter("near-zero direction", |v| v.norm() > 1e-3)
}

fn arb_point() -> impl Strategy<Value = Point3<f64>> {
    (-1000.0f64..1000.0, -1000.0f64..1000.0, -1000.0f64..1000.0)
        .prop_map(|(x, y, z)| Point3::new(x, y, z))
}

fn arb_uv() -> impl Strategy<Value = Point2<f64>> {
    (-10.0f64..10.0, -10.0f64..10.0).prop_map(|(u, v)| Point2::new(u, v))
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn frame_is_orthonormal(
        origin in arb_point(),
        normal in arb_direction(),
        reference in arb_direction(),
    ) {
        let frame = ProfileFrameBuilder::default()
            .compute_frame(origin, normal, reference)
            .unwrap();
        prop_assert!(frame.x.dot(&frame.y).abs() < 1e-9);
        prop_assert!(frame.y.dot(&frame.z).abs() < 1e-9);
        prop_assert!(frame.z.dot(&frame.x).abs() < 1e-9);
        for axis in [frame.x, frame.y, frame.z] {
            prop_assert!((axis.norm() - 1.0).abs() < 1e-9);
        }
        prop_assert!((frame.z - normal.normalize()).norm() < 1e-9);
    }

    #[test]
    fn embed_then_project_recovers_uv(
        origin in arb_point(),
        normal in arb_direction(),
        reference in arb_direction(),
        uv in prop::collection::vec(arb_uv(), 1..16),
    ) {
        let frame = ProfileFrameBuilder::default()
            .compute_frame(origin, normal, reference)
            .unwrap();
        for (p3, p2) in embed(&uv, &frame).iter().zip(uv.iter()) {
            let back = project(p3, &frame);
            prop_assert!((back - p2).norm() < 1e-9, "{:?} -> {:?}", p2, back);
        }
    }
}

// ---------------------------------------------------------------------------
// Fixed reference
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10_000))]

    #[test]
    fn fixed_reference_is_never_parallel(tangent in arb_direction()) {
        let config = SweepConfig::default();
        let t = tangent.normalize();
        let reference = choose_fixed_reference(&t, &config);
        prop_assert!((reference.norm() - 1.0).abs() < 1e-9);
        prop_assert!(reference.dot(&t).abs() < config.fixed_reference_threshold);
    }
}

// ---------------------------------------------------------------------------
// Elbow fitting
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn fitted_route_is_continuous(
        points in prop::collection::vec(arb_point(), 2..8),
        radius in 0.1f64..50.0,
    ) {
        let section = PipeSectionRef::new(PipeSection::new(0.05, 0.004), "steel");
        let route = route_from_points(&points);
        let fitted = ElbowFitter::default()
            .fit_with_radius(&route, radius, section)
            .unwrap();

        prop_assert!(fitted.is_continuous(1e-6));
        prop_assert!(!fitted.segments.is_empty());
        let tol = SweepConfig::default().length_tolerance;
        for segment in fitted.segments.iter().filter(|s| !s.is_elbow()) {
            prop_assert!((segment.end() - segment.start()).norm() >= tol);
        }
        prop_assert!((fitted.segments[0].start() - points[0]).norm() < 1e-9);
        let last = fitted.segments[fitted.segments.len() - 1].end();
        prop_assert!((last - points[points.len() - 1]).norm() < 1e-9);
    }
}
