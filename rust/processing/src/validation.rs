// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parallel consistency validation of assembled solids.

use crate::batch;
use crate::config::BatchConfig;
use crate::error::Result;
use crate::types::{BatchSummary, CaseReport, ValidationCase};
use ifc_sweep_geometry::{GeometryConsistencyValidator, SweepTessellator};
use std::time::Instant;

/// Validate every case against its reference mesh
///
/// Failing cases never interrupt the batch; they show up as reports with
/// `overall == false`.
pub fn validate_solids(
    cases: &[ValidationCase],
    config: &BatchConfig,
) -> Result<(Vec<CaseReport>, BatchSummary)> {
    config.validate()?;
    let start = Instant::now();
    let span = tracing::info_span!("validate_solids", cases = cases.len());
    let _guard = span.enter();

    let validator = GeometryConsistencyValidator::new(config.sweep);
    let tessellator = SweepTessellator::new(&config.sweep);

    let reports = batch::run(cases, config, |case| CaseReport {
        id: case.id,
        report: validator.validate(&case.solid, &tessellator, &case.reference),
    })?;

    let mut summary = BatchSummary {
        cases: reports.len(),
        ..BatchSummary::default()
    };
    for case in &reports {
        let report = &case.report;
        if report.overall {
            summary.succeeded += 1;
        } else {
            summary.failed += 1;
            tracing::warn!(case = case.id, issues = ?report.issues, "Validation failed");
        }
        if !report.profile.ok {
            summary.record_issue("profile");
        }
        if !report.directrix.ok {
            summary.record_issue("directrix");
        }
        if !report.fixed_reference.ok_at_start {
            summary.record_issue("fixedReference");
        }
        if !report.geometry.as_ref().map_or(false, |g| g.ok) {
            summary.record_issue("geometry");
        }
    }
    summary.elapsed_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        elapsed_ms = summary.elapsed_ms,
        "Validation complete"
    );

    Ok((reports, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_sweep_geometry::profile::create_rectangle;
    use ifc_sweep_geometry::{Directrix, Mesh, Point3, SweptSolidAssembler};

    fn case(id: u32, reference: Mesh) -> ValidationCase {
        let directrix =
            Directrix::from_points(vec![Point3::origin(), Point3::new(4.0, 0.0, 0.0)]).unwrap();
        let solid = SweptSolidAssembler::default()
            .assemble(&create_rectangle(0.5, 0.25), &directrix)
            .unwrap();
        ValidationCase { id, solid, reference }
    }

    #[test]
    fn test_validate_solids_batch() {
        let good = Mesh::from_points(&[Point3::origin(), Point3::new(4.0, 0.25, 0.5)]);
        let bad = Mesh::from_points(&[Point3::origin(), Point3::new(4.0, 0.5, 0.25)]);
        let cases = vec![case(1, good), case(2, bad), case(3, Mesh::new())];

        let (reports, summary) = validate_solids(&cases, &BatchConfig::default()).unwrap();
        assert_eq!(reports.len(), 3);
        assert!(reports[0].report.overall);
        assert!(!reports[1].report.overall);
        assert!(reports[2].report.geometry.is_none());

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.issue_counts.get("geometry"), Some(&2));
        assert!(summary.issue_counts.get("profile").is_none());
    }
}
