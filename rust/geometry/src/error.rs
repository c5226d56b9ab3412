// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for sweep geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building swept solids and pipe segments
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Degenerate normal: cannot build a frame from a zero-length normal")]
    DegenerateNormal,

    #[error("Zero-length segment between route points {from} and {to} (length {length:.3e})")]
    ZeroLengthSegment { from: usize, to: usize, length: f64 },

    #[error("Infeasible elbow at route point {corner}: {reason}")]
    InfeasibleElbow { corner: usize, reason: String },

    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid directrix: {0}")]
    InvalidDirectrix(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Tessellation failed: {0}")]
    Tessellation(String),
}

impl Error {
    pub fn profile(msg: impl Into<String>) -> Self {
        Error::InvalidProfile(msg.into())
    }

    pub fn directrix(msg: impl Into<String>) -> Self {
        Error::InvalidDirectrix(msg.into())
    }

    /// Variant name, used as a key when tallying issues
    pub fn kind(&self) -> &'static str {
        match self {
            Error::DegenerateNormal => "DegenerateNormal",
            Error::ZeroLengthSegment { .. } => "ZeroLengthSegment",
            Error::InfeasibleElbow { .. } => "InfeasibleElbow",
            Error::SchemaViolation(_) => "SchemaViolation",
            Error::InvalidProfile(_) => "InvalidProfile",
            Error::InvalidDirectrix(_) => "InvalidDirectrix",
            Error::InvalidConfig(_) => "InvalidConfig",
            Error::Tessellation(_) => "Tessellation",
        }
    }

    /// True for errors the elbow fitter logs and steps over
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::ZeroLengthSegment { .. } | Error::InfeasibleElbow { .. }
        )
    }
}
