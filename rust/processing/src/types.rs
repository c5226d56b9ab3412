// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Batch inputs, per-case outcomes and the aggregated summary.

use crate::error::Result;
use ifc_sweep_geometry::{
    FittedRoute, Mesh, PipeRoutePoint, PipeSectionRef, SweptSolidDescriptor, ValidationReport,
};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::Arc;

/// One pipe to fit
#[derive(Debug, Clone)]
pub struct PipeJob {
    pub id: u32,
    pub route: Vec<PipeRoutePoint>,
    pub section: Arc<PipeSectionRef>,
    /// Explicit bend radius; derived from the section when `None`
    pub bend_radius: Option<f64>,
}

/// Fitted route with one swept solid per segment
#[derive(Debug, Clone)]
pub struct FittedPipe {
    pub route: FittedRoute,
    pub solids: Vec<SweptSolidDescriptor>,
}

#[derive(Debug)]
pub struct PipeOutcome {
    pub id: u32,
    pub result: Result<FittedPipe>,
}

/// A solid paired with an independently produced reference mesh
#[derive(Debug, Clone)]
pub struct ValidationCase {
    pub id: u32,
    pub solid: SweptSolidDescriptor,
    pub reference: Mesh,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseReport {
    pub id: u32,
    pub report: ValidationReport,
}

/// Aggregate of one batch run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub cases: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub straights: usize,
    pub elbows: usize,
    /// Issue tallies keyed by kind
    pub issue_counts: FxHashMap<String, usize>,
    pub elapsed_ms: u64,
}

impl BatchSummary {
    pub fn record_issue(&mut self, kind: &str) {
        *self.issue_counts.entry(kind.to_string()).or_insert(0) += 1;
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
