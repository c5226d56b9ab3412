// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Batch layer over the sweep geometry crate
//!
//! Every pipe and every validation case is independent, so batches fan out
//! over a rayon pool sized by [`BatchConfig`] and fold back into a
//! serialisable [`BatchSummary`].

pub mod batch;
pub mod config;
pub mod error;
pub mod pipes;
pub mod types;
pub mod validation;

pub use config::BatchConfig;
pub use error::{ProcessingError, Result};
pub use pipes::fit_pipes;
pub use types::{BatchSummary, CaseReport, FittedPipe, PipeJob, PipeOutcome, ValidationCase};
pub use validation::validate_solids;
