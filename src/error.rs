//! Error types for geometric queries and field line tracing.

use thiserror::Error;

/// Error produced by a field sampling closure.
///
/// The tracers never inspect or wrap this error; it is handed back to the caller as is.
pub type FieldError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for tracing operations.
pub type Result<T> = std::result::Result<T, TracingError>;

/// Failures of the geometry kernel.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryError {
    /// The first in-plane basis vector (from the first to the second anchor) has zero length.
    #[error("plane basis vector has zero length")]
    ZeroLengthBasis,
    /// The anchor points of a plane lie on a common line.
    #[error("plane anchor points are collinear")]
    CollinearPoints,
    /// A triangle has zero area in its own parameterization.
    #[error("triangle has zero area")]
    ZeroAreaTriangle,
    /// A ray or plane normal was given a zero-length direction.
    #[error("direction vector has zero length")]
    ZeroLengthDirection,
    /// The sampled field vanishes, so no stepping direction exists.
    #[error("field vector has zero length")]
    ZeroFieldVector,
    /// A point could not be mapped to or from a plane parameterization.
    #[error("no valid projection found")]
    UnresolvedProjection,
}

impl GeometryError {
    /// Whether the error stems from degenerate input rather than a failed projection.
    pub fn is_degenerate(&self) -> bool {
        !matches!(self, Self::UnresolvedProjection)
    }
}

/// Main error type for tracing.
#[derive(Error, Debug)]
pub enum TracingError {
    /// A geometric primitive was degenerate or could not be resolved.
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),
    /// The field sampling closure failed.
    #[error(transparent)]
    Field(FieldError),
    /// A bounding box had a lower bound exceeding its upper bound.
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),
    /// Input buffers were inconsistent with each other or with the mesh.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl TracingError {
    /// Wraps an error returned by a field sampling closure.
    pub fn from_field(err: FieldError) -> Self {
        Self::Field(err)
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct SolverDiverged;

    impl fmt::Display for SolverDiverged {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("solver diverged")
        }
    }

    impl std::error::Error for SolverDiverged {}

    #[test]
    fn field_errors_pass_through_unmodified() {
        let err = TracingError::from_field(Box::new(SolverDiverged));
        assert_eq!(err.to_string(), "solver diverged");
        match err {
            TracingError::Field(inner) => assert!(inner.downcast_ref::<SolverDiverged>().is_some()),
            other => panic!("Unexpected error {:?}", other),
        }
    }

    #[test]
    fn only_unresolved_projection_is_non_degenerate() {
        assert!(GeometryError::ZeroLengthBasis.is_degenerate());
        assert!(GeometryError::ZeroFieldVector.is_degenerate());
        assert!(!GeometryError::UnresolvedProjection.is_degenerate());
    }
}
