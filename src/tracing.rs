//! Tracing streamlines and streambands of vector fields.

pub mod stepping;
pub mod streamband;
pub mod streamline;
pub mod surface;

use crate::{
    error::{GeometryError, Result},
    geometry::{BoundingBox3, Vec3},
};

/// Floating-point precision to use for tracing.
#[allow(non_camel_case_types)]
pub type ftr = f64;

/// Field vector together with a direction transverse to the band, as sampled
/// for streamband tracing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldAndNormal {
    pub field: Vec3<ftr>,
    pub normal: Vec3<ftr>,
}

/// Distance outside the bounding box at which volumetric stepping still accepts a point.
pub const BOUNDS_TOLERANCE: ftr = 1e-7;

/// Number of steps across the largest bounding box extent used when no step length is given.
pub const DEFAULT_STEPS_PER_EXTENT: ftr = 500.0;

/// Computes the step length used for volumetric tracing in the given
/// bounding box when none is specified.
pub fn default_step_length(bounds: &BoundingBox3<ftr>) -> ftr {
    bounds.max_extent() / DEFAULT_STEPS_PER_EXTENT
}

/// Turns a sampled field vector into a unit stepping direction.
fn stepping_direction(field_vector: &Vec3<ftr>) -> Result<Vec3<ftr>> {
    field_vector
        .normalized()
        .ok_or_else(|| GeometryError::ZeroFieldVector.into())
}
