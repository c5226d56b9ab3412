// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tolerances and thresholds shared by every builder.
//!
//! Nothing in this crate reads global state: each builder receives a
//! [`SweepConfig`] explicitly. Absolute lengths are stored in the active unit
//! system, so a config built with [`SweepConfig::for_units`] is ready to use.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Length unit of the coordinates handed to the builders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Meter,
    Millimeter,
}

impl UnitSystem {
    /// Number of model units in one metre
    #[inline]
    pub fn per_meter(self) -> f64 {
        match self {
            UnitSystem::Meter => 1.0,
            UnitSystem::Millimeter => 1000.0,
        }
    }

    /// Convert a length in this unit to metres
    #[inline]
    pub fn to_meters(self, value: f64) -> f64 {
        value / self.per_meter()
    }

    /// Convert a length in metres to this unit
    #[inline]
    pub fn from_meters(self, value: f64) -> f64 {
        value * self.per_meter()
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "m" | "meter" | "metre" | "meters" | "metres" => Some(UnitSystem::Meter),
            "mm" | "millimeter" | "millimetre" | "millimeters" | "millimetres" => {
                Some(UnitSystem::Millimeter)
            }
            _ => None,
        }
    }
}

/// Pipe fabrication allowances used to derive the elbow bend radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BendAllowances {
    /// Mill tolerance as a fraction of nominal wall thickness
    pub fabrication_tolerance: f64,
    /// Corrosion allowance in metres
    pub corrosion_allowance_m: f64,
    /// Rounding step of the bend radius in metres
    pub rounding_step_m: f64,
}

impl Default for BendAllowances {
    fn default() -> Self {
        Self {
            fabrication_tolerance: 0.125,
            corrosion_allowance_m: 0.001,
            rounding_step_m: 0.0001,
        }
    }
}

/// All numeric thresholds of the sweep pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub units: UnitSystem,
    /// |dot| above which a frame reference direction counts as parallel to the normal
    pub frame_parallel_threshold: f64,
    /// |dot| above which a fixed reference counts as parallel to the tangent
    pub fixed_reference_threshold: f64,
    /// Maximum |dot(axis1, tangent)| accepted after projection
    pub orthogonality_tolerance: f64,
    /// Angle (radians) within which consecutive route legs count as collinear
    pub angle_tolerance: f64,
    /// Shortest route leg kept by the elbow fitter, in model units
    pub length_tolerance: f64,
    /// Elbow radius as a fraction of the derived bend radius
    pub elbow_radius_factor: f64,
    /// Largest angular step (radians) when sampling arcs into chords
    pub arc_angle_step: f64,
    /// Relative bounding-box tolerance of the consistency validator
    pub bbox_tolerance: f64,
    pub bend: BendAllowances,
}

/// Shortest kept route leg, in metres
const LENGTH_TOLERANCE_M: f64 = 1e-4;

impl Default for SweepConfig {
    fn default() -> Self {
        Self::for_units(UnitSystem::Meter)
    }
}

impl SweepConfig {
    /// Default thresholds with absolute tolerances scaled to `units`
    pub fn for_units(units: UnitSystem) -> Self {
        Self {
            units,
            frame_parallel_threshold: 0.999,
            fixed_reference_threshold: 0.95,
            orthogonality_tolerance: 1e-6,
            angle_tolerance: 0.1,
            length_tolerance: units.from_meters(LENGTH_TOLERANCE_M),
            elbow_radius_factor: 0.99,
            arc_angle_step: std::f64::consts::PI / 16.0,
            bbox_tolerance: 1e-2,
            bend: BendAllowances::default(),
        }
    }

    /// Parse a config from JSON; missing fields take their metre defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SweepConfig =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject thresholds that would make the builders meaningless
    pub fn validate(&self) -> Result<()> {
        let unit_interval = |name: &str, v: f64| {
            if v > 0.0 && v < 1.0 {
                Ok(())
            } else {
                Err(Error::InvalidConfig(format!(
                    "{} must lie in (0, 1), got {}",
                    name, v
                )))
            }
        };
        unit_interval("frame_parallel_threshold", self.frame_parallel_threshold)?;
        unit_interval("fixed_reference_threshold", self.fixed_reference_threshold)?;
        unit_interval("bend.fabrication_tolerance", self.bend.fabrication_tolerance)?;

        if !(self.elbow_radius_factor > 0.0 && self.elbow_radius_factor <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "elbow_radius_factor must lie in (0, 1], got {}",
                self.elbow_radius_factor
            )));
        }
        for (name, v) in [
            ("orthogonality_tolerance", self.orthogonality_tolerance),
            ("angle_tolerance", self.angle_tolerance),
            ("length_tolerance", self.length_tolerance),
            ("arc_angle_step", self.arc_angle_step),
            ("bbox_tolerance", self.bbox_tolerance),
            ("bend.rounding_step_m", self.bend.rounding_step_m),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, v
                )));
            }
        }
        if self.bend.corrosion_allowance_m < 0.0 {
            return Err(Error::InvalidConfig(
                "bend.corrosion_allowance_m must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
