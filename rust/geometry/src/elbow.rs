// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipe route fitting - straight runs joined by circular elbows.
//!
//! A route is an ordered list of corner points. Collinear legs merge into a
//! single straight segment; every genuine direction change gets an elbow arc
//! tangent to both legs, and the neighbouring straights are trimmed back to
//! the arc's tangent points. Bad corners and zero-length legs are logged and
//! stepped over, so a single defect never aborts the whole route.

use crate::config::SweepConfig;
use crate::directrix::{CircularArc, Directrix, DEGENERATE_LENGTH};
use crate::error::{Error, Result};
use crate::profile::{Profile2D, ProfileType};
use crate::swept::{SweptSolidAssembler, SweptSolidDescriptor};
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;
use std::sync::Arc;
use tracing::{debug, warn};

/// Route corner with its identifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipeRoutePoint {
    pub id: u32,
    pub position: Point3<f64>,
}

impl PipeRoutePoint {
    pub fn new(id: u32, position: Point3<f64>) -> Self {
        Self { id, position }
    }
}

/// Number route points in order
pub fn route_from_points(points: &[Point3<f64>]) -> Vec<PipeRoutePoint> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| PipeRoutePoint::new(i as u32, *p))
        .collect()
}

/// Nominal circular pipe section, in model units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipeSection {
    pub outer_radius: f64,
    pub wall_thickness: f64,
}

impl PipeSection {
    pub fn new(outer_radius: f64, wall_thickness: f64) -> Self {
        Self {
            outer_radius,
            wall_thickness,
        }
    }

    /// Hollow circular swept area of the section
    pub fn profile(&self) -> Profile2D {
        ProfileType::HollowCircle {
            outer_radius: self.outer_radius,
            inner_radius: (self.outer_radius - self.wall_thickness).max(0.0),
        }
        .to_profile()
    }
}

/// Section and material shared by every segment of one pipe
#[derive(Debug, Clone, PartialEq)]
pub struct PipeSectionRef {
    pub section: PipeSection,
    pub material: String,
}

impl PipeSectionRef {
    pub fn new(section: PipeSection, material: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            section,
            material: material.into(),
        })
    }
}

/// Bend radius for a pipe section
///
/// Effective wall = t − t·fabrication tolerance − corrosion allowance; the
/// bend diameter is the outer diameter minus twice the effective wall. The
/// result is rounded in metres and converted back to model units, so the
/// millimetre value is exactly 1000× the metre value.
pub fn pipe_bend_radius(section: &PipeSection, config: &SweepConfig) -> Result<f64> {
    let units = config.units;
    let outer_radius = units.to_meters(section.outer_radius);
    let thickness = units.to_meters(section.wall_thickness);
    if !(outer_radius > 0.0 && thickness > 0.0 && thickness < outer_radius) {
        return Err(Error::profile(format!(
            "pipe section needs 0 < wall thickness < outer radius, got r={} t={}",
            section.outer_radius, section.wall_thickness
        )));
    }

    let allowances = &config.bend;
    let effective_wall =
        thickness - thickness * allowances.fabrication_tolerance - allowances.corrosion_allowance_m;
    let bend_diameter = 2.0 * outer_radius - 2.0 * effective_wall;
    let radius = bend_diameter / 2.0;
    if !(radius > 0.0) {
        return Err(Error::profile(format!(
            "pipe section yields a non-positive bend radius ({:.6} m)",
            radius
        )));
    }

    let step = allowances.rounding_step_m;
    let rounded = (radius / step).round() * step;
    Ok(units.from_meters(rounded))
}

/// Circular fillet between two legs meeting at a corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilletArc {
    /// Tangent point on the incoming leg
    pub start: Point3<f64>,
    /// Tangent point on the outgoing leg
    pub end: Point3<f64>,
    pub center: Point3<f64>,
    pub radius: f64,
}

/// Fits a fillet of a given radius into the corner `p2` of `p1 → p2 → p3`
pub trait ArcFitter {
    /// Fit the arc, or explain why the radius does not fit the corner
    fn fit(
        &self,
        p1: Point3<f64>,
        p2: Point3<f64>,
        p3: Point3<f64>,
        radius: f64,
    ) -> std::result::Result<FilletArc, String>;
}

/// Circle tangent to both legs; the tangent points sit `r / tan(α/2)` from
/// the corner, α being the angle between the legs
#[derive(Debug, Clone, Copy, Default)]
pub struct TangentArcFitter;

impl ArcFitter for TangentArcFitter {
    fn fit(
        &self,
        p1: Point3<f64>,
        p2: Point3<f64>,
        p3: Point3<f64>,
        radius: f64,
    ) -> std::result::Result<FilletArc, String> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(format!("invalid fillet radius {}", radius));
        }
        let incoming = p1 - p2;
        let outgoing = p3 - p2;
        let (len_in, len_out) = (incoming.norm(), outgoing.norm());
        if len_in <= DEGENERATE_LENGTH || len_out <= DEGENERATE_LENGTH {
            return Err("corner has a zero-length leg".to_string());
        }
        let u = incoming / len_in;
        let v = outgoing / len_out;

        let alpha = u.dot(&v).clamp(-1.0, 1.0).acos();
        if alpha <= 1e-9 || alpha >= PI - 1e-9 {
            return Err(format!("legs are collinear (angle {:.3e} rad)", alpha));
        }

        let half = alpha / 2.0;
        let tangent_distance = radius / half.tan();
        let slack = 1e-9 * len_in.max(len_out);
        if tangent_distance > len_in + slack || tangent_distance > len_out + slack {
            return Err(format!(
                "radius {:.4} needs {:.4} of each leg, legs are {:.4} and {:.4}",
                radius, tangent_distance, len_in, len_out
            ));
        }

        let bisector = (u + v).normalize();
        Ok(FilletArc {
            start: p2 + u * tangent_distance,
            end: p2 + v * tangent_distance,
            center: p2 + bisector * (radius / half.sin()),
            radius,
        })
    }
}

/// Straight pipe run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipeSegmentStraight {
    pub p1: Point3<f64>,
    pub p2: Point3<f64>,
}

/// Elbow fitting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipeSegmentElbow {
    /// Arc tangent start
    pub p1: Point3<f64>,
    /// Original route corner
    pub p2: Point3<f64>,
    /// Arc tangent end
    pub p3: Point3<f64>,
    pub bend_radius: f64,
}

impl PipeSegmentElbow {
    /// Centre of the elbow arc
    pub fn center(&self) -> Point3<f64> {
        let u = (self.p1 - self.p2).normalize();
        let v = (self.p3 - self.p2).normalize();
        let half = u.dot(&v).clamp(-1.0, 1.0).acos() / 2.0;
        self.p2 + (u + v).normalize() * (self.bend_radius / half.sin())
    }

    /// Point halfway along the arc
    pub fn arc_midpoint(&self) -> Point3<f64> {
        let c = self.center();
        c + (self.p2 - c).normalize() * self.bend_radius
    }

    pub fn arc(&self) -> Option<CircularArc> {
        CircularArc::through(self.p1, self.arc_midpoint(), self.p3)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PipeSegmentKind {
    Straight(PipeSegmentStraight),
    Elbow(PipeSegmentElbow),
}

/// One fitted segment with its shared section reference
#[derive(Debug, Clone, PartialEq)]
pub struct PipeSegment {
    pub kind: PipeSegmentKind,
    pub section: Arc<PipeSectionRef>,
}

impl PipeSegment {
    fn straight(p1: Point3<f64>, p2: Point3<f64>, section: &Arc<PipeSectionRef>) -> Self {
        Self {
            kind: PipeSegmentKind::Straight(PipeSegmentStraight { p1, p2 }),
            section: Arc::clone(section),
        }
    }

    pub fn start(&self) -> Point3<f64> {
        match &self.kind {
            PipeSegmentKind::Straight(s) => s.p1,
            PipeSegmentKind::Elbow(e) => e.p1,
        }
    }

    pub fn end(&self) -> Point3<f64> {
        match &self.kind {
            PipeSegmentKind::Straight(s) => s.p2,
            PipeSegmentKind::Elbow(e) => e.p3,
        }
    }

    pub fn is_elbow(&self) -> bool {
        matches!(self.kind, PipeSegmentKind::Elbow(_))
    }

    /// Directrix of this segment: a two-point polyline or a single-arc curve
    pub fn directrix(&self) -> Result<Directrix> {
        match &self.kind {
            PipeSegmentKind::Straight(s) => Directrix::from_points(vec![s.p1, s.p2]),
            PipeSegmentKind::Elbow(e) => {
                Directrix::from_indexed(vec![e.p1, e.arc_midpoint(), e.p3], &[vec![1, 2, 3]])
            }
        }
    }

    /// Swept solid of the hollow pipe section along this segment
    pub fn to_swept_solid(&self, assembler: &SweptSolidAssembler) -> Result<SweptSolidDescriptor> {
        let profile = self.section.section.profile();
        assembler.assemble(&profile, &self.directrix()?)
    }
}

/// Segments of a fitted route plus the recoverable problems met on the way
#[derive(Debug, Clone, Default)]
pub struct FittedRoute {
    pub segments: Vec<PipeSegment>,
    /// `ZeroLengthSegment` and `InfeasibleElbow` entries, in route order
    pub issues: Vec<Error>,
}

impl FittedRoute {
    pub fn elbow_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_elbow()).count()
    }

    pub fn straight_count(&self) -> usize {
        self.segments.len() - self.elbow_count()
    }

    /// Every segment starts where the previous one ends, within `tol`
    pub fn is_continuous(&self, tol: f64) -> bool {
        self.segments
            .windows(2)
            .all(|w| (w[0].end() - w[1].start()).norm() <= tol)
    }
}

/// Turns pipe routes into straight and elbow segments
#[derive(Debug, Clone)]
pub struct ElbowFitter<F: ArcFitter = TangentArcFitter> {
    config: SweepConfig,
    fitter: F,
}

impl ElbowFitter<TangentArcFitter> {
    pub fn new(config: SweepConfig) -> Self {
        Self {
            config,
            fitter: TangentArcFitter,
        }
    }
}

impl Default for ElbowFitter<TangentArcFitter> {
    fn default() -> Self {
        Self::new(SweepConfig::default())
    }
}

impl<F: ArcFitter> ElbowFitter<F> {
    /// Fitter using an external arc-fitting primitive
    pub fn with_fitter(config: SweepConfig, fitter: F) -> Self {
        Self { config, fitter }
    }

    /// Fit a route using the bend radius derived from the section
    pub fn fit(&self, route: &[PipeRoutePoint], section: Arc<PipeSectionRef>) -> Result<FittedRoute> {
        let bend_radius = pipe_bend_radius(&section.section, &self.config)?;
        self.fit_with_radius(route, bend_radius, section)
    }

    /// Fit a route with an explicit nominal bend radius
    pub fn fit_with_radius(
        &self,
        route: &[PipeRoutePoint],
        bend_radius: f64,
        section: Arc<PipeSectionRef>,
    ) -> Result<FittedRoute> {
        if route.len() < 2 {
            return Err(Error::directrix(format!(
                "pipe route needs at least 2 points, got {}",
                route.len()
            )));
        }
        if !(bend_radius.is_finite() && bend_radius > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "bend radius must be positive, got {}",
                bend_radius
            )));
        }

        let mut fitted = FittedRoute::default();
        let points = self.drop_short_legs(route, &mut fitted.issues);
        if points.len() < 2 {
            warn!(route_len = route.len(), "Pipe route collapses to a single point");
            return Ok(fitted);
        }

        let radius = bend_radius * self.config.elbow_radius_factor;
        let tolerance = self.config.angle_tolerance;
        let segments = &mut fitted.segments;
        let mut run_start = points[0].1;

        for w in points.windows(3) {
            let (_, p1) = w[0];
            let (corner, p2) = w[1];
            let (_, p3) = w[2];

            let angle = direction_change(p1, p2, p3);
            if angle <= tolerance {
                continue;
            }

            let remaining = (p2 - run_start).norm();
            if remaining >= self.config.length_tolerance {
                segments.push(PipeSegment::straight(run_start, p2, &section));
            }
            if angle >= PI - tolerance {
                // reversal: break the run without an elbow
                run_start = p2;
                continue;
            }
            if remaining < self.config.length_tolerance {
                // previous elbow consumed the whole leg
                warn!(corner, angle, "No leg left for an elbow, keeping a sharp corner");
                run_start = p2;
                continue;
            }

            match self.fitter.fit(run_start, p2, p3, radius) {
                Ok(arc) => {
                    self.trim_last_straight(segments, arc.start);
                    segments.push(PipeSegment {
                        kind: PipeSegmentKind::Elbow(PipeSegmentElbow {
                            p1: arc.start,
                            p2,
                            p3: arc.end,
                            bend_radius: arc.radius,
                        }),
                        section: Arc::clone(&section),
                    });
                    debug!(corner, angle, radius, "Fitted elbow");
                    run_start = arc.end;
                }
                Err(reason) => {
                    warn!(corner, %reason, "Skipping elbow, keeping a sharp corner");
                    fitted.issues.push(Error::InfeasibleElbow { corner, reason });
                    run_start = p2;
                }
            }
        }

        let last = points[points.len() - 1].1;
        if (last - run_start).norm() >= self.config.length_tolerance || segments.is_empty() {
            segments.push(PipeSegment::straight(run_start, last, &section));
        }

        Ok(fitted)
    }

    /// Route points with legs shorter than the length tolerance removed
    fn drop_short_legs(
        &self,
        route: &[PipeRoutePoint],
        issues: &mut Vec<Error>,
    ) -> Vec<(usize, Point3<f64>)> {
        let mut points: Vec<(usize, Point3<f64>)> = Vec::with_capacity(route.len());
        for (i, p) in route.iter().enumerate() {
            if let Some(&(from, prev)) = points.last() {
                let length = (p.position - prev).norm();
                if length < self.config.length_tolerance {
                    warn!(from, to = i, length, "Skipping zero-length pipe segment");
                    issues.push(Error::ZeroLengthSegment { from, to: i, length });
                    continue;
                }
            }
            points.push((i, p.position));
        }
        points
    }

    /// Move the end of the last straight back to the arc's first tangent point
    fn trim_last_straight(&self, segments: &mut Vec<PipeSegment>, tangent_point: Point3<f64>) {
        if let Some(PipeSegment {
            kind: PipeSegmentKind::Straight(straight),
            ..
        }) = segments.last_mut()
        {
            straight.p2 = tangent_point;
            if (straight.p2 - straight.p1).norm() < self.config.length_tolerance {
                segments.pop();
            }
        }
    }
}

/// Angle between the legs `p1 → p2` and `p2 → p3`
fn direction_change(p1: Point3<f64>, p2: Point3<f64>, p3: Point3<f64>) -> f64 {
    let d_in: Vector3<f64> = (p2 - p1).normalize();
    let d_out: Vector3<f64> = (p3 - p2).normalize();
    d_in.dot(&d_out).clamp(-1.0, 1.0).acos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnitSystem;
    use approx::assert_relative_eq;

    fn section() -> Arc<PipeSectionRef> {
        PipeSectionRef::new(PipeSection::new(0.05, 0.004), "steel")
    }

    #[test]
    fn test_bend_radius_meters() {
        let config = SweepConfig::for_units(UnitSystem::Meter);
        // t_eff = 0.004 - 0.0005 - 0.001 = 0.0025; r = 0.05 - 0.0025
        let r = pipe_bend_radius(&PipeSection::new(0.05, 0.004), &config).unwrap();
        assert_relative_eq!(r, 0.0475, epsilon = 1e-12);
    }

    #[test]
    fn test_bend_radius_rejects_bad_section() {
        let config = SweepConfig::default();
        assert!(pipe_bend_radius(&PipeSection::new(0.05, 0.0), &config).is_err());
        assert!(pipe_bend_radius(&PipeSection::new(0.05, 0.06), &config).is_err());
    }

    #[test]
    fn test_tangent_fitter_right_angle() {
        let arc = TangentArcFitter
            .fit(
                Point3::origin(),
                Point3::new(5.0, 0.0, 0.0),
                Point3::new(5.0, 5.0, 0.0),
                1.0,
            )
            .unwrap();
        assert_relative_eq!(arc.start, Point3::new(4.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(arc.end, Point3::new(5.0, 1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(arc.center, Point3::new(4.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_tangent_fitter_radius_too_large() {
        let result = TangentArcFitter.fit(
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            2.0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_elbow_midpoint_on_arc() {
        let elbow = PipeSegmentElbow {
            p1: Point3::new(4.0, 0.0, 0.0),
            p2: Point3::new(5.0, 0.0, 0.0),
            p3: Point3::new(5.0, 1.0, 0.0),
            bend_radius: 1.0,
        };
        assert_relative_eq!(elbow.center(), Point3::new(4.0, 1.0, 0.0), epsilon = 1e-12);
        let mid = elbow.arc_midpoint();
        assert_relative_eq!((mid - elbow.center()).norm(), 1.0, epsilon = 1e-12);
        let arc = elbow.arc().unwrap();
        assert_relative_eq!(arc.sweep, std::f64::consts::FRAC_PI_2, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_length_legs_are_skipped() {
        let route = route_from_points(&[
            Point3::origin(),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
        ]);
        let fitted = ElbowFitter::default()
            .fit_with_radius(&route, 0.5, section())
            .unwrap();
        assert_eq!(fitted.segments.len(), 1);
        assert_eq!(fitted.issues.len(), 1);
        assert!(matches!(
            fitted.issues[0],
            Error::ZeroLengthSegment { from: 1, to: 2, .. }
        ));
    }

    #[test]
    fn test_infeasible_corner_stays_sharp() {
        let route = route_from_points(&[
            Point3::origin(),
            Point3::new(0.5, 0.0, 0.0),
            Point3::new(0.5, 0.5, 0.0),
        ]);
        let fitted = ElbowFitter::default()
            .fit_with_radius(&route, 2.0, section())
            .unwrap();
        assert_eq!(fitted.elbow_count(), 0);
        assert_eq!(fitted.segments.len(), 2);
        assert!(fitted.is_continuous(1e-12));
        assert!(matches!(
            fitted.issues[0],
            Error::InfeasibleElbow { corner: 1, .. }
        ));
    }

    #[test]
    fn test_elbow_consuming_shared_leg() {
        let route = route_from_points(&[
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(3.0, 1.0, 0.0),
        ]);
        let fitter = ElbowFitter::default();
        let fitted = fitter.fit_with_radius(&route, 1.0 / 0.99, section()).unwrap();

        let tol = SweepConfig::default().length_tolerance;
        assert!(fitted
            .segments
            .iter()
            .filter(|s| !s.is_elbow())
            .all(|s| (s.end() - s.start()).norm() >= tol));
        assert_eq!(fitted.elbow_count(), 1);
        assert_eq!(fitted.straight_count(), 1);
        assert!(fitted.issues.is_empty(), "{:?}", fitted.issues);
        assert!(fitted.is_continuous(1e-9));
        assert_eq!(fitted.segments[1].end(), Point3::new(3.0, 1.0, 0.0));
    }

    #[test]
    fn test_reversal_after_consumed_leg() {
        let route = route_from_points(&[
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 0.5, 0.0),
        ]);
        let fitted = ElbowFitter::default()
            .fit_with_radius(&route, 1.0 / 0.99, section())
            .unwrap();
        let tol = SweepConfig::default().length_tolerance;
        assert!(fitted
            .segments
            .iter()
            .all(|s| s.is_elbow() || (s.end() - s.start()).norm() >= tol));
        assert_eq!(fitted.elbow_count(), 1);
        assert!(fitted.is_continuous(1e-9));
    }

    #[test]
    fn test_default_fitter() {
        let fitter = ElbowFitter::default();
        assert_eq!(fitter.config.angle_tolerance, SweepConfig::default().angle_tolerance);
        let route = route_from_points(&[Point3::origin(), Point3::new(1.0, 0.0, 0.0)]);
        let fitted = fitter.fit(&route, section()).unwrap();
        assert_eq!(fitted.straight_count(), 1);
    }

    #[test]
    fn test_short_route_is_rejected() {
        let route = route_from_points(&[Point3::origin()]);
        assert!(ElbowFitter::default()
            .fit_with_radius(&route, 1.0, section())
            .is_err());
    }

    #[test]
    fn test_segments_share_section() {
        let shared = section();
        let route = route_from_points(&[
            Point3::origin(),
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(5.0, 5.0, 0.0),
        ]);
        let fitted = ElbowFitter::default()
            .fit_with_radius(&route, 1.0, Arc::clone(&shared))
            .unwrap();
        assert!(fitted
            .segments
            .iter()
            .all(|s| Arc::ptr_eq(&s.section, &shared)));
    }
}
