// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parallel pipe fitting.

use crate::batch;
use crate::config::BatchConfig;
use crate::error::Result;
use crate::types::{BatchSummary, FittedPipe, PipeJob, PipeOutcome};
use ifc_sweep_geometry::{ElbowFitter, SweptSolidAssembler};
use std::sync::Arc;
use std::time::Instant;

/// Fit every job's route and assemble one swept solid per segment
///
/// A job that fails (bad section, too few points, unassemblable segment)
/// is reported in its outcome; the rest of the batch carries on.
pub fn fit_pipes(jobs: &[PipeJob], config: &BatchConfig) -> Result<(Vec<PipeOutcome>, BatchSummary)> {
    config.validate()?;
    let start = Instant::now();
    let span = tracing::info_span!("fit_pipes", jobs = jobs.len());
    let _guard = span.enter();

    let fitter = ElbowFitter::new(config.sweep);
    let assembler = SweptSolidAssembler::new(config.sweep);

    let outcomes = batch::run(jobs, config, |job| PipeOutcome {
        id: job.id,
        result: fit_one(job, &fitter, &assembler),
    })?;

    let mut summary = BatchSummary {
        cases: outcomes.len(),
        ..BatchSummary::default()
    };
    for outcome in &outcomes {
        match &outcome.result {
            Ok(pipe) => {
                summary.succeeded += 1;
                summary.straights += pipe.route.straight_count();
                summary.elbows += pipe.route.elbow_count();
                for issue in &pipe.route.issues {
                    summary.record_issue(issue.kind());
                }
            }
            Err(e) => {
                tracing::warn!(pipe = outcome.id, error = %e, "Pipe fitting failed");
                summary.failed += 1;
                summary.record_issue("Failed");
            }
        }
    }
    summary.elapsed_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        elbows = summary.elbows,
        straights = summary.straights,
        elapsed_ms = summary.elapsed_ms,
        "Pipe fitting complete"
    );

    Ok((outcomes, summary))
}

fn fit_one(job: &PipeJob, fitter: &ElbowFitter, assembler: &SweptSolidAssembler) -> Result<FittedPipe> {
    let section = Arc::clone(&job.section);
    let route = match job.bend_radius {
        Some(radius) => fitter.fit_with_radius(&job.route, radius, section)?,
        None => fitter.fit(&job.route, section)?,
    };
    let solids = route
        .segments
        .iter()
        .map(|segment| segment.to_swept_solid(assembler))
        .collect::<ifc_sweep_geometry::Result<Vec<_>>>()?;
    Ok(FittedPipe { route, solids })
}
