// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Batch configuration loaded from environment variables.

use crate::error::{ProcessingError, Result};
use ifc_sweep_geometry::{SweepConfig, UnitSystem};

/// Batch configuration.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Number of worker threads for parallel processing.
    pub worker_threads: usize,
    /// Tolerances handed to every fitter, assembler and validator.
    pub sweep: SweepConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            worker_threads: num_cpus::get(),
            sweep: SweepConfig::default(),
        }
    }
}

impl BatchConfig {
    /// Load configuration from environment variables.
    ///
    /// `SWEEP_WORKER_THREADS` sizes the pool (default: one per CPU) and
    /// `SWEEP_UNITS` (`m` or `mm`) picks the unit system the tolerances are
    /// scaled to.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let worker_threads = lookup("SWEEP_WORKER_THREADS")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or_else(num_cpus::get);

        let units = match lookup("SWEEP_UNITS") {
            Some(name) => UnitSystem::parse(&name).unwrap_or_else(|| {
                tracing::warn!(units = %name, "Unknown SWEEP_UNITS, using metres");
                UnitSystem::Meter
            }),
            None => UnitSystem::Meter,
        };

        Self {
            worker_threads,
            sweep: SweepConfig::for_units(units),
        }
    }

    pub fn with_sweep(mut self, sweep: SweepConfig) -> Self {
        self.sweep = sweep;
        self
    }

    /// Reject settings the batch runner cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.worker_threads == 0 {
            return Err(ProcessingError::Config(
                "worker_threads must be at least 1".to_string(),
            ));
        }
        self.sweep.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lookup_reads_variables() {
        let config = BatchConfig::from_lookup(|key| match key {
            "SWEEP_WORKER_THREADS" => Some("3".to_string()),
            "SWEEP_UNITS" => Some("mm".to_string()),
            _ => None,
        });
        assert_eq!(config.worker_threads, 3);
        assert_eq!(config.sweep.units, UnitSystem::Millimeter);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = BatchConfig::from_lookup(|key| match key {
            "SWEEP_WORKER_THREADS" => Some("zero".to_string()),
            "SWEEP_UNITS" => Some("furlong".to_string()),
            _ => None,
        });
        assert!(config.worker_threads >= 1);
        assert_eq!(config.sweep.units, UnitSystem::Meter);
    }

    #[test]
    fn test_validate_rejects_empty_pool() {
        let config = BatchConfig {
            worker_threads: 0,
            ..BatchConfig::default()
        };
        assert!(matches!(config.validate(), Err(ProcessingError::Config(_))));
    }
}
