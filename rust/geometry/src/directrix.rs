// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Directrix curves - the paths a profile is swept along.
//!
//! Three representations are supported, mirroring the schema's curve types:
//!
//! - `Polyline`: straight segments through an ordered point list
//! - `IndexedPolyCurve`: a shared point list plus line/arc segments that
//!   reference it by index
//! - `CompositeCurve`: ordered parametric segments (line, circle, clothoid)
//!   placed in the z=0 plane, joined by declared transitions
//!
//! Start tangents are always computed from the geometry, never stored.

use crate::error::{Error, Result};
use crate::frame::Frame2D;
use nalgebra::{Point2, Point3, Vector2, Vector3};
use std::f64::consts::PI;

/// Directions shorter than this count as zero
pub(crate) const DEGENERATE_LENGTH: f64 = 1e-12;

/// Tangent returned for a route with no usable segment
pub const DEFAULT_TANGENT: Vector3<f64> = Vector3::new(1.0, 0.0, 0.0);

/// One segment of an indexed poly-curve (0-based point indices)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexedSegment {
    Line([usize; 2]),
    /// start, via, end
    Arc([usize; 3]),
}

impl IndexedSegment {
    pub fn first(&self) -> usize {
        match self {
            IndexedSegment::Line([a, _]) => *a,
            IndexedSegment::Arc([a, _, _]) => *a,
        }
    }

    pub fn last(&self) -> usize {
        match self {
            IndexedSegment::Line([_, b]) => *b,
            IndexedSegment::Arc([_, _, c]) => *c,
        }
    }
}

/// Parent curve of a composite segment, in its canonical local form
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveBasis {
    /// Along +x from the placement origin
    Line,
    /// Counter-clockwise circle about the placement origin
    Circle { radius: f64 },
    /// Clothoid through the origin tangent to +x; the sign of the constant
    /// selects the turning direction
    Clothoid { constant: f64 },
}

/// Continuity declared at the end of a composite segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionCode {
    Discontinuous,
    Continuous,
    ContSameGradient,
    ContSameGradientSameCurvature,
}

/// One parametric segment of a composite curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSegment {
    pub basis: CurveBasis,
    pub placement: Frame2D,
    /// Arc-length parameter where the segment starts on its parent curve
    pub start_param: f64,
    /// Arc length of the segment
    pub length: f64,
    pub transition: TransitionCode,
}

impl CurveSegment {
    pub fn end_param(&self) -> f64 {
        self.start_param + self.length
    }

    /// Point at arc-length parameter `s`, in the parent plane
    pub fn point_at(&self, s: f64) -> Point2<f64> {
        let local = match self.basis {
            CurveBasis::Line => Point2::new(s, 0.0),
            CurveBasis::Circle { radius } => {
                let a = s / radius;
                Point2::new(radius * a.cos(), radius * a.sin())
            }
            CurveBasis::Clothoid { constant } => clothoid_point(constant, s),
        };
        self.placement.to_parent(local)
    }

    /// Unit tangent at arc-length parameter `s`, in the parent plane
    pub fn tangent_at(&self, s: f64) -> Vector2<f64> {
        let local = match self.basis {
            CurveBasis::Line => Vector2::x(),
            CurveBasis::Circle { radius } => {
                let a = s / radius;
                Vector2::new(-a.sin(), a.cos())
            }
            CurveBasis::Clothoid { constant } => {
                let phi = clothoid_angle(constant, s);
                Vector2::new(phi.cos(), phi.sin())
            }
        };
        self.placement.to_parent_vector(local)
    }

    /// Total turning of the tangent over the segment, in radians
    pub fn turning_angle(&self) -> f64 {
        match self.basis {
            CurveBasis::Line => 0.0,
            CurveBasis::Circle { radius } => (self.length / radius).abs(),
            CurveBasis::Clothoid { constant } => {
                (clothoid_angle(constant, self.end_param())
                    - clothoid_angle(constant, self.start_param))
                .abs()
            }
        }
    }

    fn start_point_3d(&self) -> Point3<f64> {
        lift(self.point_at(self.start_param))
    }

    fn validate(&self, index: usize) -> Result<()> {
        if !(self.length.is_finite() && self.length > 0.0) || !self.start_param.is_finite() {
            return Err(Error::directrix(format!(
                "composite segment {} needs a finite positive length, got {}",
                index, self.length
            )));
        }
        match self.basis {
            CurveBasis::Circle { radius } if !(radius.is_finite() && radius > 0.0) => {
                Err(Error::directrix(format!(
                    "composite segment {} has invalid circle radius {}",
                    index, radius
                )))
            }
            CurveBasis::Clothoid { constant } if !(constant.is_finite() && constant != 0.0) => {
                Err(Error::directrix(format!(
                    "composite segment {} has invalid clothoid constant {}",
                    index, constant
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Tangent angle of a clothoid at arc length `s`: sign(A)·s²/(2A²)
#[inline]
fn clothoid_angle(constant: f64, s: f64) -> f64 {
    constant.signum() * s * s / (2.0 * constant * constant)
}

/// Fresnel-integral position on a clothoid, by composite Simpson integration
fn clothoid_point(constant: f64, s: f64) -> Point2<f64> {
    if s == 0.0 {
        return Point2::origin();
    }
    let total_turn = clothoid_angle(constant, s).abs();
    let steps = ((total_turn / 0.01).ceil() as usize).clamp(32, 4096) * 2;
    let h = s / steps as f64;

    let integrand = |t: f64| {
        let phi = clothoid_angle(constant, t);
        Vector2::new(phi.cos(), phi.sin())
    };

    let mut sum = integrand(0.0) + integrand(s);
    for i in 1..steps {
        let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += integrand(h * i as f64) * weight;
    }
    Point2::from(sum * (h / 3.0))
}

#[inline]
fn lift(p: Point2<f64>) -> Point3<f64> {
    Point3::new(p.x, p.y, 0.0)
}

#[inline]
fn lift_vector(v: Vector2<f64>) -> Vector3<f64> {
    Vector3::new(v.x, v.y, 0.0)
}

/// Circular arc through three points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularArc {
    pub center: Point3<f64>,
    pub radius: f64,
    /// Unit axis; the arc runs counter-clockwise about it
    pub normal: Vector3<f64>,
    /// Unit vector from the centre to the start point
    start_dir: Vector3<f64>,
    /// Swept angle in (0, 2π)
    pub sweep: f64,
}

impl CircularArc {
    /// Arc from `start` through `via` to `end`; `None` when the points are
    /// collinear or coincident
    pub fn through(start: Point3<f64>, via: Point3<f64>, end: Point3<f64>) -> Option<Self> {
        let a = via - start;
        let b = end - start;
        let axb = a.cross(&b);
        let denom = 2.0 * axb.norm_squared();
        if denom <= DEGENERATE_LENGTH * DEGENERATE_LENGTH {
            return None;
        }

        let offset = (b.cross(&axb) * a.norm_squared() + axb.cross(&a) * b.norm_squared()) / denom;
        let center = start + offset;
        let radius = offset.norm();
        let normal = axb.normalize();
        let start_dir = (start - center) / radius;

        let end_dir = (end - center) / radius;
        let mut sweep = normal.dot(&start_dir.cross(&end_dir)).atan2(start_dir.dot(&end_dir));
        if sweep <= 0.0 {
            sweep += 2.0 * PI;
        }

        Some(Self {
            center,
            radius,
            normal,
            start_dir,
            sweep,
        })
    }

    /// Point at angle `theta` from the start, measured about the normal
    pub fn point_at(&self, theta: f64) -> Point3<f64> {
        let perp = self.normal.cross(&self.start_dir);
        self.center + (self.start_dir * theta.cos() + perp * theta.sin()) * self.radius
    }

    /// Unit tangent at angle `theta` from the start
    pub fn tangent_at(&self, theta: f64) -> Vector3<f64> {
        let perp = self.normal.cross(&self.start_dir);
        perp * theta.cos() - self.start_dir * theta.sin()
    }

    pub fn midpoint(&self) -> Point3<f64> {
        self.point_at(self.sweep / 2.0)
    }

    pub fn length(&self) -> f64 {
        self.radius * self.sweep
    }

    /// Chord approximation with at most `max_step` radians per chord
    pub fn sample(&self, max_step: f64) -> Vec<Point3<f64>> {
        let steps = ((self.sweep / max_step).ceil() as usize).max(2);
        (0..=steps)
            .map(|i| self.point_at(self.sweep * i as f64 / steps as f64))
            .collect()
    }
}

/// Overall shape of a directrix, for orientation guarantees
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DirectrixShape {
    /// A single straight line with this unit direction
    StraightLine(Vector3<f64>),
    /// A single circular arc about this unit axis
    CircularArc(Vector3<f64>),
    /// Corners, mixed segments or free-form curves
    Other,
}

/// Path curve of a swept solid
#[derive(Debug, Clone, PartialEq)]
pub enum Directrix {
    Polyline(Vec<Point3<f64>>),
    IndexedPolyCurve {
        points: Vec<Point3<f64>>,
        segments: Vec<IndexedSegment>,
    },
    CompositeCurve(Vec<CurveSegment>),
}

impl Directrix {
    /// Straight polyline through `points` (no closure assumed)
    pub fn from_points(points: Vec<Point3<f64>>) -> Result<Self> {
        if points.len() < 2 {
            return Err(Error::directrix(format!(
                "polyline needs at least 2 points, got {}",
                points.len()
            )));
        }
        Ok(Directrix::Polyline(points))
    }

    /// Indexed poly-curve from 1-based index lists
    ///
    /// Two indices make a line segment, three make an arc (start, via, end).
    /// An empty segment list runs straight through all points.
    pub fn from_indexed(points: Vec<Point3<f64>>, segments: &[Vec<usize>]) -> Result<Self> {
        if points.len() < 2 {
            return Err(Error::directrix(format!(
                "indexed poly-curve needs at least 2 points, got {}",
                points.len()
            )));
        }

        let to_zero_based = |segment: usize, index: usize| -> Result<usize> {
            if index == 0 || index > points.len() {
                return Err(Error::directrix(format!(
                    "segment {} references point {} outside 1..={}",
                    segment,
                    index,
                    points.len()
                )));
            }
            Ok(index - 1)
        };

        let mut parsed = Vec::with_capacity(segments.len());
        for (i, indices) in segments.iter().enumerate() {
            let seg = match indices.as_slice() {
                [a, b] => IndexedSegment::Line([to_zero_based(i, *a)?, to_zero_based(i, *b)?]),
                [a, b, c] => IndexedSegment::Arc([
                    to_zero_based(i, *a)?,
                    to_zero_based(i, *b)?,
                    to_zero_based(i, *c)?,
                ]),
                other => {
                    return Err(Error::directrix(format!(
                        "segment {} has {} indices, expected 2 (line) or 3 (arc)",
                        i,
                        other.len()
                    )))
                }
            };
            parsed.push(seg);
        }

        Ok(Directrix::IndexedPolyCurve {
            points,
            segments: parsed,
        })
    }

    /// Composite curve from ordered segments
    ///
    /// Adjacent endpoints are not checked for coincidence; producers are
    /// responsible for that.
    pub fn from_composite(segments: Vec<CurveSegment>) -> Result<Self> {
        if segments.is_empty() {
            return Err(Error::directrix("composite curve has no segments"));
        }
        for (i, seg) in segments.iter().enumerate() {
            seg.validate(i)?;
        }
        Ok(Directrix::CompositeCurve(segments))
    }

    /// First point of the curve; the origin for an empty directrix
    pub fn start_point(&self) -> Point3<f64> {
        let start = match self {
            Directrix::Polyline(points) => points.first().copied(),
            Directrix::IndexedPolyCurve { points, segments } => segments
                .first()
                .and_then(|s| points.get(s.first()))
                .or_else(|| points.first())
                .copied(),
            Directrix::CompositeCurve(segments) => segments.first().map(CurveSegment::start_point_3d),
        };
        start.unwrap_or_else(Point3::origin)
    }

    /// Unit tangent at the start, from the first non-degenerate segment
    pub fn start_tangent(&self) -> Vector3<f64> {
        match self {
            Directrix::Polyline(points) => start_tangent(points),
            Directrix::IndexedPolyCurve { points, segments } => {
                if segments.is_empty() {
                    return start_tangent(points);
                }
                segments
                    .iter()
                    .find_map(|seg| indexed_segment_tangent(points, seg))
                    .unwrap_or(DEFAULT_TANGENT)
            }
            Directrix::CompositeCurve(segments) => segments
                .iter()
                .find_map(|seg| {
                    let t = lift_vector(seg.tangent_at(seg.start_param));
                    normalized(t)
                })
                .unwrap_or(DEFAULT_TANGENT),
        }
    }

    /// Copy shifted so the start point is the origin, plus the removed translation
    pub fn normalize_to_origin(&self) -> (Directrix, Vector3<f64>) {
        let translation = self.start_point().coords;
        let shifted = match self {
            Directrix::Polyline(points) => {
                Directrix::Polyline(points.iter().map(|p| p - translation).collect())
            }
            Directrix::IndexedPolyCurve { points, segments } => Directrix::IndexedPolyCurve {
                points: points.iter().map(|p| p - translation).collect(),
                segments: segments.clone(),
            },
            Directrix::CompositeCurve(segments) => {
                // composite curves live in the z=0 plane, so the shift is planar
                let shift = Vector2::new(translation.x, translation.y);
                Directrix::CompositeCurve(
                    segments
                        .iter()
                        .map(|seg| CurveSegment {
                            placement: Frame2D {
                                origin: seg.placement.origin - shift,
                                ..seg.placement
                            },
                            ..*seg
                        })
                        .collect(),
                )
            }
        };
        (shifted, translation)
    }

    /// Chord approximation of the whole curve
    pub fn sample_points(&self, max_angle_step: f64) -> Vec<Point3<f64>> {
        let mut out: Vec<Point3<f64>> = Vec::new();
        let push = |p: Point3<f64>, out: &mut Vec<Point3<f64>>| {
            if out.last().map_or(true, |q| (p - q).norm() > DEGENERATE_LENGTH) {
                out.push(p);
            }
        };

        match self {
            Directrix::Polyline(points) => {
                for p in points {
                    push(*p, &mut out);
                }
            }
            Directrix::IndexedPolyCurve { points, segments } => {
                if segments.is_empty() {
                    for p in points {
                        push(*p, &mut out);
                    }
                }
                for seg in segments {
                    match *seg {
                        IndexedSegment::Line([a, b]) => {
                            push(points[a], &mut out);
                            push(points[b], &mut out);
                        }
                        IndexedSegment::Arc([a, v, b]) => {
                            match CircularArc::through(points[a], points[v], points[b]) {
                                Some(arc) => {
                                    for p in arc.sample(max_angle_step) {
                                        push(p, &mut out);
                                    }
                                }
                                None => {
                                    push(points[a], &mut out);
                                    push(points[v], &mut out);
                                    push(points[b], &mut out);
                                }
                            }
                        }
                    }
                }
            }
            Directrix::CompositeCurve(segments) => {
                for seg in segments {
                    let steps = match seg.basis {
                        CurveBasis::Line => 1,
                        _ => ((seg.turning_angle() / max_angle_step).ceil() as usize).max(8),
                    };
                    for i in 0..=steps {
                        let s = seg.start_param + seg.length * i as f64 / steps as f64;
                        push(lift(seg.point_at(s)), &mut out);
                    }
                }
            }
        }
        out
    }

    /// Classify the curve for the fixed-reference guarantee
    pub fn shape(&self) -> DirectrixShape {
        match self {
            Directrix::Polyline(points) => straight_shape(points),
            Directrix::IndexedPolyCurve { points, segments } => match segments.as_slice() {
                [] => straight_shape(points),
                [IndexedSegment::Line([a, b])] => straight_shape(&[points[*a], points[*b]]),
                [IndexedSegment::Arc([a, v, b])] => {
                    match CircularArc::through(points[*a], points[*v], points[*b]) {
                        Some(arc) => DirectrixShape::CircularArc(arc.normal),
                        None => straight_shape(&[points[*a], points[*v], points[*b]]),
                    }
                }
                _ => DirectrixShape::Other,
            },
            Directrix::CompositeCurve(segments) => match segments.as_slice() {
                [seg] => match seg.basis {
                    CurveBasis::Line => DirectrixShape::StraightLine(lift_vector(
                        seg.tangent_at(seg.start_param),
                    )),
                    CurveBasis::Circle { .. } => DirectrixShape::CircularArc(Vector3::z()),
                    CurveBasis::Clothoid { .. } => DirectrixShape::Other,
                },
                _ => DirectrixShape::Other,
            },
        }
    }

    /// Human-readable variant name for reports and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Directrix::Polyline(_) => "Polyline",
            Directrix::IndexedPolyCurve { .. } => "IndexedPolyCurve",
            Directrix::CompositeCurve(_) => "CompositeCurve",
        }
    }
}

fn indexed_segment_tangent(points: &[Point3<f64>], seg: &IndexedSegment) -> Option<Vector3<f64>> {
    match *seg {
        IndexedSegment::Line([a, b]) => normalized(points[b] - points[a]),
        IndexedSegment::Arc([a, v, b]) => match CircularArc::through(points[a], points[v], points[b]) {
            Some(arc) => Some(arc.tangent_at(0.0)),
            None => normalized(points[v] - points[a]).or_else(|| normalized(points[b] - points[a])),
        },
    }
}

fn straight_shape(points: &[Point3<f64>]) -> DirectrixShape {
    let direction = match start_tangent_checked(points) {
        Some(d) => d,
        None => return DirectrixShape::Other,
    };
    let collinear = points.windows(2).all(|w| {
        let d = w[1] - w[0];
        let len = d.norm();
        // a reversal stays on the line but folds the path back
        len <= DEGENERATE_LENGTH
            || (d.cross(&direction).norm() <= 1e-9 * len && d.dot(&direction) > 0.0)
    });
    if collinear {
        DirectrixShape::StraightLine(direction)
    } else {
        DirectrixShape::Other
    }
}

#[inline]
fn normalized(v: Vector3<f64>) -> Option<Vector3<f64>> {
    let n = v.norm();
    if n.is_finite() && n > DEGENERATE_LENGTH {
        Some(v / n)
    } else {
        None
    }
}

fn start_tangent_checked(points: &[Point3<f64>]) -> Option<Vector3<f64>> {
    points.windows(2).find_map(|w| normalized(w[1] - w[0]))
}

/// Direction of the first non-degenerate segment, or [`DEFAULT_TANGENT`]
pub fn start_tangent(points: &[Point3<f64>]) -> Vector3<f64> {
    start_tangent_checked(points).unwrap_or(DEFAULT_TANGENT)
}

/// Shift `points` so the first one is the origin; returns the removed translation
pub fn normalize_to_origin(points: &[Point3<f64>]) -> (Vec<Point3<f64>>, Vector3<f64>) {
    let translation = points.first().map(|p| p.coords).unwrap_or_else(Vector3::zeros);
    (points.iter().map(|p| p - translation).collect(), translation)
}
