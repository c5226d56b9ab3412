// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC swept solid construction
//!
//! Builds fixed-reference swept area solids from a 2D profile and a 3D
//! directrix, fits pipe routes into straight runs and circular elbows, and
//! cross-checks the resulting solids against independently tessellated
//! reference meshes. Uses nalgebra for the vector math and earcutr for cap
//! triangulation.

pub mod config;
pub mod directrix;
pub mod elbow;
pub mod error;
pub mod frame;
pub mod mesh;
pub mod profile;
pub mod swept;
pub mod tessellate;
pub mod transform;
pub mod validate;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2, Vector3};

pub use config::{BendAllowances, SweepConfig, UnitSystem};
pub use directrix::{
    CircularArc, CurveBasis, CurveSegment, Directrix, DirectrixShape, IndexedSegment,
    TransitionCode,
};
pub use elbow::{
    pipe_bend_radius, route_from_points, ArcFitter, ElbowFitter, FilletArc, FittedRoute,
    PipeRoutePoint, PipeSection, PipeSectionRef, PipeSegment, PipeSegmentElbow, PipeSegmentKind,
    PipeSegmentStraight, TangentArcFitter,
};
pub use error::{Error, Result};
pub use frame::{embed, embed_profile, project, Frame2D, Frame3, ProfileFrameBuilder};
pub use mesh::Mesh;
pub use profile::{Profile2D, ProfileType};
pub use swept::{
    choose_fixed_reference, ReferenceGuarantee, SweptSolidAssembler, SweptSolidDescriptor,
};
pub use tessellate::{SweepTessellator, Tessellator};
pub use validate::{
    Continuity, FixedReferenceCheck, GeometryConsistencyValidator, SizeComparison,
    ValidationReport,
};
