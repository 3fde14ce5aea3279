//! Fixed-step streamline tracing through a bounded vector field.

use super::{
    default_step_length,
    stepping::{SteppingSense, StoppingCause},
    stepping_direction, ftr, BOUNDS_TOLERANCE,
};
use crate::{
    error::{FieldError, Result, TracingError},
    geometry::{BoundingBox3, Point3, Vec3},
    io::Verbosity,
    seeding::Seeder3,
};
use indicatif::ProgressIterator;
use std::collections::VecDeque;

#[cfg(feature = "serialization")]
use serde::Serialize;

#[cfg(feature = "json")]
use std::{io, path};

/// Whether to trace a streamline in a specified direction or in both directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamlineTracingSense {
    Both,
    One(SteppingSense),
}

impl StreamlineTracingSense {
    pub fn same() -> Self {
        StreamlineTracingSense::One(SteppingSense::Same)
    }
    pub fn opposite() -> Self {
        StreamlineTracingSense::One(SteppingSense::Opposite)
    }
}

/// Configuration parameters for dynamic streamline tracers.
#[derive(Clone, Debug)]
pub struct DynamicStreamlineConfig {
    /// Distance between consecutive streamline points. Derived from the
    /// bounding box if not specified.
    pub step_length: Option<ftr>,
    /// Maximum number of steps to take in each tracing direction.
    pub max_points: usize,
    /// Direction(s) to trace the streamline relative to the field direction.
    pub tracing_sense: StreamlineTracingSense,
}

impl DynamicStreamlineConfig {
    pub const DEFAULT_STEP_LENGTH: Option<ftr> = None;
    pub const DEFAULT_MAX_POINTS: usize = 100;
    pub const DEFAULT_TRACING_SENSE: StreamlineTracingSense =
        StreamlineTracingSense::One(SteppingSense::Same);

    /// Panics if any of the configuration parameter values are invalid.
    pub fn validate(&self) {
        if let Some(step_length) = self.step_length {
            assert!(
                step_length > 0.0 && step_length.is_finite(),
                "Step length must be positive and finite."
            );
        }
    }
}

impl Default for DynamicStreamlineConfig {
    fn default() -> Self {
        DynamicStreamlineConfig {
            step_length: Self::DEFAULT_STEP_LENGTH,
            max_points: Self::DEFAULT_MAX_POINTS,
            tracing_sense: Self::DEFAULT_TRACING_SENSE,
        }
    }
}

/// A traced streamline.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct Streamline3 {
    positions: Vec<Point3<ftr>>,
    stopping_cause: StoppingCause,
}

impl Streamline3 {
    /// Returns the positions making up the streamline, in tracing order.
    pub fn positions(&self) -> &[Point3<ftr>] {
        &self.positions
    }

    /// Returns why tracing terminated (in the forward direction, when
    /// tracing in both directions).
    pub fn stopping_cause(&self) -> StoppingCause {
        self.stopping_cause
    }

    /// Returns the number of points making up the streamline.
    pub fn number_of_points(&self) -> usize {
        self.positions.len()
    }

    /// Returns the positions as a flat buffer with three coordinates per point.
    pub fn positions_flat(&self) -> Vec<ftr> {
        self.positions
            .iter()
            .flat_map(|point| point.to_array())
            .collect()
    }

    /// Serializes the streamline into a JSON file saved at the given path.
    #[cfg(feature = "json")]
    pub fn save_as_json<P: AsRef<path::Path>>(&self, file_path: P) -> io::Result<()> {
        crate::io::save_data_as_json(file_path.as_ref(), self)
    }
}

/// Streamline tracer stepping a fixed distance along the normalized field
/// at each point, until leaving the bounding box or taking the maximum
/// number of steps.
///
/// The field is sampled through a closure that may fail; its error is
/// returned to the caller unmodified.
pub struct DynamicStreamlineTracer3<F> {
    bounds: BoundingBox3<ftr>,
    field: F,
    step_length: ftr,
    config: DynamicStreamlineConfig,
}

impl<F> DynamicStreamlineTracer3<F>
where
    F: Fn(&Point3<ftr>) -> std::result::Result<Vec3<ftr>, FieldError>,
{
    /// Creates a new dynamic streamline tracer.
    ///
    /// # Parameters
    ///
    /// - `bounds`: Region outside which tracing terminates.
    /// - `field`: Closure sampling the field vector at a given position.
    /// - `config`: Configuration parameters for the tracer.
    ///
    /// # Returns
    ///
    /// A new `DynamicStreamlineTracer3`.
    ///
    /// # Type parameters
    ///
    /// - `F`: Function type taking a reference to a position and returning a field vector or an error.
    pub fn new(bounds: BoundingBox3<ftr>, field: F, config: DynamicStreamlineConfig) -> Self {
        config.validate();
        let step_length = config
            .step_length
            .unwrap_or_else(|| default_step_length(&bounds));
        DynamicStreamlineTracer3 {
            bounds,
            field,
            step_length,
            config,
        }
    }

    /// Returns the distance between consecutive streamline points.
    pub fn step_length(&self) -> ftr {
        self.step_length
    }

    /// Returns the region outside which tracing terminates.
    pub fn bounds(&self) -> &BoundingBox3<ftr> {
        &self.bounds
    }

    pub fn config(&self) -> &DynamicStreamlineConfig {
        &self.config
    }

    /// Traces a streamline starting at the given seed point.
    ///
    /// The seed is always the first point of a forward streamline. When
    /// tracing in both directions, the backward points precede the seed in
    /// reverse order.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains the traced streamline.
    /// - `Err`: The field closure failed, or returned a zero vector.
    pub fn generate(&self, seed: &Point3<ftr>) -> Result<Streamline3> {
        let mut backward_path = VecDeque::new();
        if let StreamlineTracingSense::Both = self.config.tracing_sense {
            self.trace_in_sense(seed, SteppingSense::Opposite, |position| {
                backward_path.push_front(position)
            })?;
        }

        let sense = match self.config.tracing_sense {
            StreamlineTracingSense::Both => SteppingSense::Same,
            StreamlineTracingSense::One(sense) => sense,
        };

        let mut positions = Vec::from(backward_path);
        positions.push(*seed);
        let stopping_cause =
            self.trace_in_sense(seed, sense, |position| positions.push(position))?;

        Ok(Streamline3 {
            positions,
            stopping_cause,
        })
    }

    fn trace_in_sense<C>(
        &self,
        seed: &Point3<ftr>,
        sense: SteppingSense,
        mut callback: C,
    ) -> Result<StoppingCause>
    where
        C: FnMut(Point3<ftr>),
    {
        let mut current = *seed;
        for _ in 0..self.config.max_points {
            let field_vector = (self.field)(&current).map_err(TracingError::from_field)?;
            let direction = stepping_direction(&field_vector)?;
            let next = current + direction * (sense.sign() * self.step_length);

            if !self
                .bounds
                .contains_with_tolerance(&next, BOUNDS_TOLERANCE)
            {
                return Ok(StoppingCause::OutOfBounds);
            }
            callback(next);
            current = next;
        }
        Ok(StoppingCause::IterationLimit)
    }
}

/// Collection of streamlines traced from a set of seed points.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct StreamlineSet3 {
    streamlines: Vec<Streamline3>,
}

impl StreamlineSet3 {
    /// Traces a streamline from every seed point of the given seeder.
    ///
    /// # Parameters
    ///
    /// - `seeder`: Seeder to use for generating start positions.
    /// - `tracer`: Streamline tracer to use.
    /// - `verbosity`: Whether to report progress.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains the streamlines, in seed order.
    /// - `Err`: Tracing from one of the seeds failed.
    ///
    /// # Type parameters
    ///
    /// - `Sd`: Type of seeder.
    /// - `F`: Function type of the field closure.
    pub fn trace<Sd, F>(
        seeder: Sd,
        tracer: &DynamicStreamlineTracer3<F>,
        verbosity: &Verbosity,
    ) -> Result<Self>
    where
        Sd: Seeder3,
        F: Fn(&Point3<ftr>) -> std::result::Result<Vec3<ftr>, FieldError>,
    {
        let n_seeds = seeder.number_of_points();
        if verbosity.print_messages() {
            log::info!("Found {} start positions", n_seeds);
        }

        let streamlines = seeder
            .into_iter()
            .progress_with(verbosity.create_progress_bar(n_seeds))
            .map(|seed| tracer.generate(&seed))
            .collect::<Result<Vec<_>>>()?;

        if verbosity.print_messages() {
            log::info!(
                "Successfully traced {} streamlines with {} points in total",
                streamlines.len(),
                streamlines
                    .iter()
                    .map(Streamline3::number_of_points)
                    .sum::<usize>()
            );
        }
        Ok(StreamlineSet3 { streamlines })
    }

    /// Returns the traced streamlines.
    pub fn streamlines(&self) -> &[Streamline3] {
        &self.streamlines
    }

    /// Returns the number of streamlines in the set.
    pub fn number_of_streamlines(&self) -> usize {
        self.streamlines.len()
    }

    /// Finds the extent of the region visited by the streamlines, or `None`
    /// if the set holds no points.
    pub fn bounding_box(&self) -> Option<BoundingBox3<ftr>> {
        BoundingBox3::enclosing(self.streamlines.iter().flat_map(|line| line.positions()))
    }

    /// Serializes the streamline set into a JSON file saved at the given path.
    #[cfg(feature = "json")]
    pub fn save_as_json<P: AsRef<path::Path>>(&self, file_path: P) -> io::Result<()> {
        crate::io::save_data_as_json(file_path.as_ref(), self)
    }
}
