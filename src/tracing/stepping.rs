//! Stepping along streamlines of a vector field.

use super::ftr;

#[cfg(feature = "serialization")]
use serde::Serialize;

/// Stepping along the streamline in the same direction as the field or opposite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SteppingSense {
    Same,
    Opposite,
}

impl SteppingSense {
    /// Returns the factor to multiply field vectors with to get the stepping direction.
    pub fn sign(self) -> ftr {
        match self {
            Self::Same => 1.0,
            Self::Opposite => -1.0,
        }
    }

    /// Returns the other sense.
    pub fn reversed(self) -> Self {
        match self {
            Self::Same => Self::Opposite,
            Self::Opposite => Self::Same,
        }
    }
}

/// Reason for terminating stepping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub enum StoppingCause {
    /// The maximum number of steps was taken.
    IterationLimit,
    /// The next point would have left the tracing domain.
    OutOfBounds,
    /// The next point would have come too close to an existing line.
    TooClose,
    /// The line reached an edge on the border of the surface.
    Border,
    /// The line reached a face that had already been traversed.
    VisitedFace,
    /// A degenerate triangle or failed projection cut the line short.
    Unresolved,
}
