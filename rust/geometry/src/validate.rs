// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry consistency checks for assembled swept solids
//!
//! A candidate solid is tessellated and its bounding box compared against a
//! mesh produced independently (for instance by another geometry kernel).
//! Orientation rules the schema imposes are checked alongside. Nothing here
//! fails: problems end up in the [`ValidationReport`].

use crate::config::SweepConfig;
use crate::directrix::{CurveSegment, Directrix, TransitionCode};
use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::swept::{ReferenceGuarantee, SweptSolidDescriptor};
use crate::tessellate::Tessellator;
use nalgebra::{Point3, Vector3};
use serde::Serialize;
use tracing::{debug, warn};

/// Smallest denominator of [`relative_error`]
const RELATIVE_EPSILON: f64 = 1e-12;

/// Axis-aligned bounds of a vertex set, `None` when it is empty
pub fn bbox<I>(vertices: I) -> Option<(Point3<f64>, Point3<f64>)>
where
    I: IntoIterator<Item = Point3<f64>>,
{
    vertices.into_iter().fold(None, |acc, p| match acc {
        None => Some((p, p)),
        Some((min, max)) => Some((min.inf(&p), max.sup(&p))),
    })
}

pub fn size(min: &Point3<f64>, max: &Point3<f64>) -> Vector3<f64> {
    max - min
}

/// `|a − b| / max(|b|, ε)`
pub fn relative_error(a: f64, b: f64) -> f64 {
    (a - b).abs() / b.abs().max(RELATIVE_EPSILON)
}

/// Per-axis size comparison against a reference
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeComparison {
    pub ok: bool,
    pub per_axis_error: [f64; 3],
}

/// Compare bounding-box sizes axis by axis
pub fn compare(candidate: &Vector3<f64>, reference: &Vector3<f64>, tolerance: f64) -> SizeComparison {
    let per_axis_error = [
        relative_error(candidate.x, reference.x),
        relative_error(candidate.y, reference.y),
        relative_error(candidate.z, reference.z),
    ];
    SizeComparison {
        ok: per_axis_error.iter().all(|e| *e <= tolerance),
        per_axis_error,
    }
}

/// True when every profile point has exactly two coordinates
pub fn check_profile_planarity<C: AsRef<[f64]>>(coords: &[C]) -> bool {
    coords.iter().all(|c| c.as_ref().len() == 2)
}

/// Continuity class of a directrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Continuity {
    /// Tangent and curvature continuous
    Continuous,
    /// Position continuous only
    G0Warn,
    /// No curve-specific check available
    Unsupported,
}

/// Classify how smooth a directrix is across its segment boundaries
///
/// A polyline is position-continuous only. A composite curve is continuous
/// when every join between consecutive segments keeps gradient and
/// curvature; the last segment's code describes no join on an open curve
/// and is ignored.
pub fn classify_directrix_continuity(directrix: &Directrix) -> Continuity {
    match directrix {
        Directrix::Polyline(_) => Continuity::G0Warn,
        Directrix::CompositeCurve(segments) if joins_are_smooth(segments) => Continuity::Continuous,
        _ => Continuity::Unsupported,
    }
}

fn joins_are_smooth(segments: &[CurveSegment]) -> bool {
    let joins = segments.len().saturating_sub(1);
    segments[..joins]
        .iter()
        .all(|s| s.transition == TransitionCode::ContSameGradientSameCurvature)
}

/// Fixed-reference check result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedReferenceCheck {
    pub ok_at_start: bool,
    /// `None` when only the start could be checked
    pub ok_everywhere: Option<bool>,
}

/// Check the fixed reference against the start tangent and classify the rest
pub fn check_fixed_reference(solid: &SweptSolidDescriptor, config: &SweepConfig) -> FixedReferenceCheck {
    let alignment = solid.fixed_reference.dot(&solid.position.z).abs();
    let ok_at_start = alignment < config.fixed_reference_threshold;
    let ok_everywhere = match solid.reference_guarantee(config.orthogonality_tolerance) {
        ReferenceGuarantee::Strong => Some(ok_at_start),
        ReferenceGuarantee::StartOnly => None,
    };
    FixedReferenceCheck {
        ok_at_start,
        ok_everywhere,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileReport {
    pub ok: bool,
    pub planar: bool,
    pub distinct_points: usize,
    pub explicitly_closed: bool,
    pub holes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectrixReport {
    pub ok: bool,
    pub kind: &'static str,
    pub continuity: Continuity,
    /// `position.z` agrees with the directrix start tangent
    pub tangent_matches: bool,
    /// `position.x` is orthogonal to `position.z`
    pub orthogonal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryReport {
    pub ok: bool,
    pub per_axis_error: [f64; 3],
    pub candidate_size: [f64; 3],
    pub reference_size: [f64; 3],
    pub tolerance: f64,
}

/// Structured outcome of [`GeometryConsistencyValidator::validate`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub overall: bool,
    pub profile: ProfileReport,
    pub directrix: DirectrixReport,
    pub fixed_reference: FixedReferenceCheck,
    /// `None` when either mesh was empty or tessellation failed
    pub geometry: Option<GeometryReport>,
    /// Schema violations and mismatches found on the way
    pub issues: Vec<String>,
}

impl ValidationReport {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

/// Cross-checks assembled solids against reference meshes
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryConsistencyValidator {
    config: SweepConfig,
}

impl GeometryConsistencyValidator {
    pub fn new(config: SweepConfig) -> Self {
        Self { config }
    }

    pub fn validate(
        &self,
        solid: &SweptSolidDescriptor,
        tessellator: &dyn Tessellator,
        reference_mesh: &Mesh,
    ) -> ValidationReport {
        let mut issues = Vec::new();

        let profile = self.check_profile(solid, &mut issues);
        let directrix = self.check_directrix(solid, &mut issues);

        let fixed_reference = check_fixed_reference(solid, &self.config);
        if !fixed_reference.ok_at_start {
            issues.push(
                Error::SchemaViolation("fixed reference is parallel to the start tangent".into())
                    .to_string(),
            );
        }

        let geometry = match tessellator.tessellate(solid) {
            Ok(mesh) => self.check_geometry(&mesh, reference_mesh, &mut issues),
            Err(e) => {
                warn!(error = %e, "Candidate solid failed to tessellate");
                issues.push(e.to_string());
                None
            }
        };

        let overall = profile.ok
            && directrix.ok
            && fixed_reference.ok_at_start
            && geometry.as_ref().map_or(false, |g| g.ok);

        debug!(overall, issues = issues.len(), "Validated swept solid");

        ValidationReport {
            overall,
            profile,
            directrix,
            fixed_reference,
            geometry,
            issues,
        }
    }

    fn check_profile(&self, solid: &SweptSolidDescriptor, issues: &mut Vec<String>) -> ProfileReport {
        let coords: Vec<[f64; 2]> = solid.profile.outer.iter().map(|p| [p.x, p.y]).collect();
        let planar = check_profile_planarity(&coords);
        if !planar {
            issues.push(Error::SchemaViolation("profile is not planar".into()).to_string());
        }
        let valid = match solid.profile.validate() {
            Ok(()) => true,
            Err(e) => {
                issues.push(e.to_string());
                false
            }
        };
        ProfileReport {
            ok: planar && valid,
            planar,
            distinct_points: solid.profile.distinct_point_count(),
            explicitly_closed: solid.profile.is_explicitly_closed(),
            holes: solid.profile.holes.len(),
        }
    }

    fn check_directrix(&self, solid: &SweptSolidDescriptor, issues: &mut Vec<String>) -> DirectrixReport {
        let continuity = classify_directrix_continuity(&solid.directrix);
        if continuity == Continuity::Unsupported {
            issues.push(
                Error::SchemaViolation(format!(
                    "{} continuity cannot be verified",
                    solid.directrix.kind()
                ))
                .to_string(),
            );
        }

        let tol = self.config.orthogonality_tolerance;
        let tangent_matches = (solid.directrix.start_tangent() - solid.position.z).norm() <= tol;
        if !tangent_matches {
            issues.push(
                Error::SchemaViolation("position z differs from the directrix start tangent".into())
                    .to_string(),
            );
        }
        let orthogonal = solid.position.x.dot(&solid.position.z).abs() <= tol;
        if !orthogonal {
            issues.push(
                Error::SchemaViolation("position x is not orthogonal to position z".into()).to_string(),
            );
        }

        DirectrixReport {
            ok: continuity != Continuity::Unsupported && tangent_matches && orthogonal,
            kind: solid.directrix.kind(),
            continuity,
            tangent_matches,
            orthogonal,
        }
    }

    fn check_geometry(
        &self,
        candidate: &Mesh,
        reference: &Mesh,
        issues: &mut Vec<String>,
    ) -> Option<GeometryReport> {
        let (Some((cmin, cmax)), Some((rmin, rmax))) =
            (bbox(candidate.vertices()), bbox(reference.vertices()))
        else {
            issues.push("geometry comparison skipped: empty mesh".to_string());
            return None;
        };

        let candidate_size = size(&cmin, &cmax);
        let reference_size = size(&rmin, &rmax);
        let tolerance = self.config.bbox_tolerance;
        let comparison = compare(&candidate_size, &reference_size, tolerance);
        if !comparison.ok {
            warn!(
                per_axis_error = ?comparison.per_axis_error,
                "Bounding box differs from the reference"
            );
            issues.push(format!(
                "geometry mismatch: per-axis relative error {:?} exceeds {}",
                comparison.per_axis_error, tolerance
            ));
        }

        Some(GeometryReport {
            ok: comparison.ok,
            per_axis_error: comparison.per_axis_error,
            candidate_size: candidate_size.into(),
            reference_size: reference_size.into(),
            tolerance,
        })
    }
}
