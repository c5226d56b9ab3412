// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for batch processing.

use thiserror::Error;

/// Result type for batch operations
pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Geometry error: {0}")]
    Geometry(#[from] ifc_sweep_geometry::Error),

    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Configuration error: {0}")]
    Config(String),
}
