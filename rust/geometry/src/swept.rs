// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed-reference swept area solids.
//!
//! The schema orients the swept profile with two vectors: the directrix
//! tangent (profile normal, `position.z`) and a fixed reference whose
//! projection onto the profile plane becomes `position.x`. The fixed
//! reference must never be parallel to the tangent; this module only checks
//! that at the start of the path and classifies how far the guarantee
//! extends beyond it.

use crate::config::SweepConfig;
use crate::directrix::{Directrix, DirectrixShape, DEGENERATE_LENGTH};
use crate::error::{Error, Result};
use crate::frame::Frame3;
use crate::profile::Profile2D;
use nalgebra::Vector3;
use tracing::{debug, warn};

/// Candidate fixed references, in order of preference
const REFERENCE_CANDIDATES: [Vector3<f64>; 3] = [
    Vector3::new(0.0, 0.0, 1.0),
    Vector3::new(1.0, 0.0, 0.0),
    Vector3::new(0.0, 1.0, 0.0),
];

/// How far along the path the fixed reference is known to stay non-parallel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceGuarantee {
    /// Safe along the whole directrix
    Strong,
    /// Only checked at the start; unknown for the remainder
    StartOnly,
}

/// Schema-ready description of a swept area solid
#[derive(Debug, Clone, PartialEq)]
pub struct SweptSolidDescriptor {
    pub profile: Profile2D,
    /// Profile placement at the directrix start
    pub position: Frame3,
    /// Directrix shifted so it starts at the origin
    pub directrix: Directrix,
    /// Unit fixed reference as handed to the schema
    pub fixed_reference: Vector3<f64>,
    pub start_param: Option<f64>,
    pub end_param: Option<f64>,
    /// Translation removed from the directrix; the caller composes it into
    /// the solid's global placement
    pub placement_offset: Vector3<f64>,
}

impl SweptSolidDescriptor {
    pub fn with_params(mut self, start: Option<f64>, end: Option<f64>) -> Self {
        self.start_param = start;
        self.end_param = end;
        self
    }

    /// Profile placement in global coordinates
    pub fn global_position(&self) -> Frame3 {
        self.position
            .moved_to(self.position.origin + self.placement_offset)
    }

    /// Guarantee class of the stored fixed reference
    pub fn reference_guarantee(&self, tolerance: f64) -> ReferenceGuarantee {
        classify_guarantee(self.directrix.shape(), &self.fixed_reference, tolerance)
    }
}

/// Pick a fixed reference for `tangent`: global Z, else X, else Y
///
/// The first candidate with `|dot(candidate, tangent)| ≤ threshold` is
/// projected onto the plane orthogonal to the tangent and normalised. When
/// every candidate degenerates the result is global X.
pub fn choose_fixed_reference(tangent: &Vector3<f64>, config: &SweepConfig) -> Vector3<f64> {
    let norm = tangent.norm();
    if !(norm.is_finite() && norm > DEGENERATE_LENGTH) {
        return Vector3::x();
    }
    let t = tangent / norm;

    REFERENCE_CANDIDATES
        .iter()
        .filter(|c| c.dot(&t).abs() <= config.fixed_reference_threshold)
        .find_map(|c| {
            let projected = c - t * c.dot(&t);
            let len = projected.norm();
            (len > DEGENERATE_LENGTH).then(|| projected / len)
        })
        .unwrap_or_else(Vector3::x)
}

/// Guarantee class for a fixed reference on a directrix of the given shape
pub fn classify_guarantee(
    shape: DirectrixShape,
    fixed_reference: &Vector3<f64>,
    tolerance: f64,
) -> ReferenceGuarantee {
    let n = fixed_reference.norm();
    if n <= DEGENERATE_LENGTH {
        return ReferenceGuarantee::StartOnly;
    }
    let r = fixed_reference / n;
    match shape {
        DirectrixShape::StraightLine(direction) if r.dot(&direction).abs() <= tolerance => {
            ReferenceGuarantee::Strong
        }
        DirectrixShape::CircularArc(axis) if r.cross(&axis).norm() <= tolerance => {
            ReferenceGuarantee::Strong
        }
        _ => ReferenceGuarantee::StartOnly,
    }
}

/// Combines profile, directrix and fixed reference into a descriptor
#[derive(Debug, Clone, Copy, Default)]
pub struct SweptSolidAssembler {
    config: SweepConfig,
}

impl SweptSolidAssembler {
    pub fn new(config: SweepConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Assemble a descriptor for an explicit tangent and fixed reference
    pub fn build(
        &self,
        profile: &Profile2D,
        directrix: &Directrix,
        tangent: Vector3<f64>,
        fixed_reference: Vector3<f64>,
    ) -> Result<SweptSolidDescriptor> {
        profile.validate()?;

        let t_norm = tangent.norm();
        if !(t_norm.is_finite() && t_norm > DEGENERATE_LENGTH) {
            return Err(Error::DegenerateNormal);
        }
        let tangent = tangent / t_norm;

        let start_tangent = directrix.start_tangent();
        if (start_tangent - tangent).norm() > self.config.orthogonality_tolerance {
            warn!(
                ?tangent,
                ?start_tangent,
                directrix = directrix.kind(),
                "Swept solid tangent differs from the directrix start tangent"
            );
        }

        let r_norm = fixed_reference.norm();
        if !(r_norm.is_finite() && r_norm > DEGENERATE_LENGTH) {
            return Err(Error::SchemaViolation(
                "fixed reference has zero length".to_string(),
            ));
        }
        let fixed_reference = fixed_reference / r_norm;
        let alignment = fixed_reference.dot(&tangent);
        if alignment.abs() >= self.config.fixed_reference_threshold {
            // Still emitted; the validator reports it as a schema violation
            warn!(
                alignment = alignment.abs(),
                directrix = directrix.kind(),
                "Fixed reference is nearly parallel to the start tangent"
            );
        }

        let axis1 = self.project_orthogonal(&fixed_reference, &tangent)?;
        let axis2 = tangent.cross(&axis1);

        let (directrix, placement_offset) = directrix.normalize_to_origin();
        let position = Frame3::new(directrix.start_point(), axis1, axis2, tangent);

        debug!(
            directrix = directrix.kind(),
            ?placement_offset,
            "Assembled swept solid"
        );

        Ok(SweptSolidDescriptor {
            profile: profile.clone(),
            position,
            directrix,
            fixed_reference,
            start_param: None,
            end_param: None,
            placement_offset,
        })
    }

    /// Assemble with the tangent and fixed reference derived from the directrix
    ///
    /// A circular-arc directrix uses its axis as fixed reference so the
    /// guarantee holds along the whole arc.
    pub fn assemble(&self, profile: &Profile2D, directrix: &Directrix) -> Result<SweptSolidDescriptor> {
        let tangent = directrix.start_tangent();
        let fixed_reference = match directrix.shape() {
            DirectrixShape::CircularArc(axis) => axis,
            _ => choose_fixed_reference(&tangent, &self.config),
        };
        self.build(profile, directrix, tangent, fixed_reference)
    }

    /// Gram-Schmidt projection of `reference` onto the plane orthogonal to `tangent`
    fn project_orthogonal(
        &self,
        reference: &Vector3<f64>,
        tangent: &Vector3<f64>,
    ) -> Result<Vector3<f64>> {
        let mut axis = reference - tangent * reference.dot(tangent);
        let len = axis.norm();
        if len <= DEGENERATE_LENGTH {
            return Err(Error::SchemaViolation(
                "fixed reference projects to zero on the profile plane".to_string(),
            ));
        }
        axis /= len;

        let residual = axis.dot(tangent);
        if residual.abs() > self.config.orthogonality_tolerance {
            debug!(residual, "Reprojecting fixed reference");
            axis = (axis - tangent * residual).normalize();
        }
        Ok(axis)
    }
}
