//! Fixed-step streamband tracing through a bounded vector field.

use super::{
    default_step_length, ftr, stepping::StoppingCause, stepping_direction, FieldAndNormal,
    BOUNDS_TOLERANCE,
};
use crate::{
    error::{FieldError, GeometryError, Result, TracingError},
    geometry::{BoundingBox3, Point3},
};

#[cfg(feature = "serialization")]
use serde::Serialize;

#[cfg(feature = "json")]
use std::{io, path};

/// Configuration parameters for dynamic streamband tracers.
#[derive(Clone, Debug)]
pub struct DynamicStreambandConfig {
    /// Distance between consecutive spine points. Derived from the
    /// bounding box if not specified.
    pub step_length: Option<ftr>,
    /// Maximum number of steps to take.
    pub max_points: usize,
    /// Distance between each spine point and its paired edge point.
    pub width: ftr,
}

impl DynamicStreambandConfig {
    pub const DEFAULT_STEP_LENGTH: Option<ftr> = None;
    pub const DEFAULT_MAX_POINTS: usize = 100;
    pub const DEFAULT_WIDTH: ftr = 1.0;

    /// Panics if any of the configuration parameter values are invalid.
    pub fn validate(&self) {
        if let Some(step_length) = self.step_length {
            assert!(
                step_length > 0.0 && step_length.is_finite(),
                "Step length must be positive and finite."
            );
        }
        assert!(
            self.width.is_finite(),
            "Streamband width must be finite."
        );
    }
}

impl Default for DynamicStreambandConfig {
    fn default() -> Self {
        DynamicStreambandConfig {
            step_length: Self::DEFAULT_STEP_LENGTH,
            max_points: Self::DEFAULT_MAX_POINTS,
            width: Self::DEFAULT_WIDTH,
        }
    }
}

/// A traced streamband: a triangle strip along a streamline.
///
/// The first position is the seed. Every step then appends a spine point
/// followed by its edge point, so spine point `k` has index `2k + 1` and edge
/// point `k` has index `2k + 2`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct Streamband3 {
    positions: Vec<Point3<ftr>>,
    indices: Vec<[usize; 3]>,
    stopping_cause: StoppingCause,
}

impl Streamband3 {
    /// Returns the seed followed by the interleaved spine and edge points.
    pub fn positions(&self) -> &[Point3<ftr>] {
        &self.positions
    }

    /// Returns the position indices of each triangle.
    pub fn indices(&self) -> &[[usize; 3]] {
        &self.indices
    }

    /// Returns why tracing terminated.
    pub fn stopping_cause(&self) -> StoppingCause {
        self.stopping_cause
    }

    /// Returns the number of steps taken.
    pub fn number_of_steps(&self) -> usize {
        (self.positions.len() - 1) / 2
    }

    /// Returns the positions as a flat buffer with three coordinates per point.
    pub fn positions_flat(&self) -> Vec<ftr> {
        self.positions
            .iter()
            .flat_map(|point| point.to_array())
            .collect()
    }

    /// Returns the triangle indices as a flat buffer with three indices per triangle.
    pub fn indices_flat(&self) -> Vec<usize> {
        self.indices.iter().flatten().copied().collect()
    }

    /// Serializes the streamband into a JSON file saved at the given path.
    #[cfg(feature = "json")]
    pub fn save_as_json<P: AsRef<path::Path>>(&self, file_path: P) -> io::Result<()> {
        crate::io::save_data_as_json(file_path.as_ref(), self)
    }
}

/// Streamband tracer stepping like `DynamicStreamlineTracer3`, but also
/// offsetting each new spine point sideways to form a ribbon.
///
/// The sideways direction is perpendicular to both the step and the normal
/// returned by the field closure.
pub struct DynamicStreambandTracer3<F> {
    bounds: BoundingBox3<ftr>,
    field: F,
    step_length: ftr,
    config: DynamicStreambandConfig,
}

impl<F> DynamicStreambandTracer3<F>
where
    F: Fn(&Point3<ftr>) -> std::result::Result<FieldAndNormal, FieldError>,
{
    /// Creates a new dynamic streamband tracer.
    ///
    /// # Parameters
    ///
    /// - `bounds`: Region outside which tracing terminates.
    /// - `field`: Closure sampling the field vector and band normal at a given position.
    /// - `config`: Configuration parameters for the tracer.
    ///
    /// # Returns
    ///
    /// A new `DynamicStreambandTracer3`.
    pub fn new(bounds: BoundingBox3<ftr>, field: F, config: DynamicStreambandConfig) -> Self {
        config.validate();
        let step_length = config
            .step_length
            .unwrap_or_else(|| default_step_length(&bounds));
        DynamicStreambandTracer3 {
            bounds,
            field,
            step_length,
            config,
        }
    }

    /// Returns the distance between consecutive spine points.
    pub fn step_length(&self) -> ftr {
        self.step_length
    }

    pub fn config(&self) -> &DynamicStreambandConfig {
        &self.config
    }

    /// Traces a streamband starting at the given seed point.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains the traced streamband.
    /// - `Err`: The field closure failed, returned a zero field vector, or
    ///   returned a normal parallel to the field.
    pub fn generate(&self, seed: &Point3<ftr>) -> Result<Streamband3> {
        let mut positions = vec![*seed];
        let mut indices = Vec::new();
        let mut current = *seed;
        let mut stopping_cause = StoppingCause::IterationLimit;

        for step in 0..self.config.max_points {
            let FieldAndNormal { field, normal } =
                (self.field)(&current).map_err(TracingError::from_field)?;
            let next = current + stepping_direction(&field)? * self.step_length;

            if !self
                .bounds
                .contains_with_tolerance(&next, BOUNDS_TOLERANCE)
            {
                stopping_cause = StoppingCause::OutOfBounds;
                break;
            }

            let sideways = (next - current)
                .cross(&normal)
                .normalized()
                .ok_or(GeometryError::ZeroLengthDirection)?;
            let edge_point = current + sideways * self.config.width;

            positions.push(next);
            positions.push(edge_point);

            if step == 0 {
                indices.push([0, 1, 2]);
            } else {
                indices.push([2 * step - 1, 2 * step + 1, 2 * step + 2]);
                indices.push([2 * step - 1, 2 * step + 2, 2 * step]);
            }
            current = next;
        }

        Ok(Streamband3 {
            positions,
            indices,
            stopping_cause,
        })
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::geometry::Vec3;
    use approx::assert_abs_diff_eq;

    fn tracer(
        bounds: [ftr; 6],
        max_points: usize,
        normal: Vec3<ftr>,
    ) -> DynamicStreambandTracer3<
        impl Fn(&Point3<ftr>) -> std::result::Result<FieldAndNormal, FieldError>,
    > {
        DynamicStreambandTracer3::new(
            BoundingBox3::from_array(bounds).unwrap(),
            move |_: &Point3<ftr>| {
                Ok(FieldAndNormal {
                    field: Vec3::new(2.0, 0.0, 0.0),
                    normal,
                })
            },
            DynamicStreambandConfig {
                step_length: Some(0.5),
                max_points,
                width: 0.25,
            },
        )
    }

    #[test]
    fn band_points_alternate_between_spine_and_edge() {
        let band = tracer([-10.0, -10.0, -10.0, 10.0, 10.0, 10.0], 3, Vec3::new(0.0, 0.0, 1.0))
            .generate(&Point3::origin())
            .unwrap();
        assert_eq!(band.number_of_steps(), 3);
        assert_eq!(band.positions().len(), 7);

        // Step along x with normal along z puts the edge on the negative y side
        let expected = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.5, 0.0, 0.0),
            Point3::new(0.0, -0.25, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, -0.25, 0.0),
            Point3::new(1.5, 0.0, 0.0),
            Point3::new(1.0, -0.25, 0.0),
        ];
        for (point, expected) in band.positions().iter().zip(expected.iter()) {
            assert_abs_diff_eq!(*point, *expected, epsilon = 1e-12);
        }
        assert_eq!(
            band.indices_flat(),
            vec![0, 1, 2, 1, 3, 4, 1, 4, 2, 3, 5, 6, 3, 6, 4]
        );
        assert_eq!(band.stopping_cause(), StoppingCause::IterationLimit);
    }

    #[test]
    fn band_stops_at_the_bounds() {
        let band = tracer([-1.0, -1.0, -1.0, 1.0, 1.0, 1.0], 100, Vec3::new(0.0, 1.0, 0.0))
            .generate(&Point3::origin())
            .unwrap();
        assert_eq!(band.number_of_steps(), 2);
        assert_eq!(band.indices().len(), 3);
        assert_eq!(band.stopping_cause(), StoppingCause::OutOfBounds);
    }

    #[test]
    fn normal_along_the_field_is_degenerate() {
        let result = tracer([-1.0, -1.0, -1.0, 1.0, 1.0, 1.0], 10, Vec3::new(1.0, 0.0, 0.0))
            .generate(&Point3::origin());
        assert!(matches!(
            result,
            Err(TracingError::Geometry(GeometryError::ZeroLengthDirection))
        ));
    }
}
