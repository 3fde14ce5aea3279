//! Evenly spaced streamlines on triangulated surfaces.

pub mod walk;

use self::walk::Walker;
use super::{
    ftr,
    stepping::{SteppingSense, StoppingCause},
};
use crate::{
    error::{Result, TracingError},
    geometry::{BoundingBox3, Point3, Vec3},
    io::Verbosity,
    mesh::{indexed::IndexedSurface3, FaceId, HalfEdgeId, SurfaceMesh3},
    num::OrderableIndexValuePair,
    octree::{Octree3, OctreeConfig},
};
use indicatif::ProgressIterator;
use std::{collections::HashSet, iter};

#[cfg(feature = "serialization")]
use serde::Serialize;

#[cfg(feature = "json")]
use std::{io, path};

/// Configuration parameters for surface streamline tracers.
#[derive(Clone, Debug)]
pub struct SurfaceStreamlineConfig {
    /// Number of integration steps across the largest extent of the surface.
    /// Also sets the separation distance between lines.
    pub integration_divisions: ftr,
    /// Faces whose normalized seed attribute is below this value start no lines.
    pub seed_threshold_down: ftr,
    /// Faces whose normalized seed attribute is above this value start no lines.
    pub seed_threshold_up: ftr,
    /// Maximum number of steps in each direction from a seed.
    pub max_iterations: usize,
    /// Configuration of the octree holding the points of finished lines.
    pub octree: OctreeConfig,
    /// Scale factor from the surface bounding box to the region where points are kept.
    pub separation_bounds_scale: ftr,
    /// Scale factor from the surface bounding box to the region steps must stay inside.
    pub walk_bounds_scale: ftr,
    /// Absolute padding added to the surface bounding box before scaling.
    pub bounds_inflation: ftr,
    pub verbosity: Verbosity,
}

impl SurfaceStreamlineConfig {
    pub const DEFAULT_INTEGRATION_DIVISIONS: ftr = 1000.0;
    pub const DEFAULT_SEED_THRESHOLD_DOWN: ftr = 0.5;
    pub const DEFAULT_SEED_THRESHOLD_UP: ftr = 1.0;
    pub const DEFAULT_MAX_ITERATIONS: usize = 40;
    pub const DEFAULT_SEPARATION_BOUNDS_SCALE: ftr = 1.2;
    pub const DEFAULT_WALK_BOUNDS_SCALE: ftr = 1.02;
    pub const DEFAULT_BOUNDS_INFLATION: ftr = 1e-3;

    /// Panics if any of the configuration parameter values are invalid.
    pub fn validate(&self) {
        assert!(
            self.integration_divisions > 0.0 && self.integration_divisions.is_finite(),
            "Number of integration divisions must be positive and finite."
        );
        assert!(
            self.seed_threshold_down <= self.seed_threshold_up,
            "Lower seed threshold must not exceed upper seed threshold."
        );
        assert!(
            self.separation_bounds_scale >= 1.0,
            "Separation bounds scale must be at least one."
        );
        assert!(
            self.walk_bounds_scale >= 1.0,
            "Walk bounds scale must be at least one."
        );
        assert!(
            self.bounds_inflation >= 0.0,
            "Bounds inflation must be non-negative."
        );
        self.octree.validate();
    }
}

impl Default for SurfaceStreamlineConfig {
    fn default() -> Self {
        SurfaceStreamlineConfig {
            integration_divisions: Self::DEFAULT_INTEGRATION_DIVISIONS,
            seed_threshold_down: Self::DEFAULT_SEED_THRESHOLD_DOWN,
            seed_threshold_up: Self::DEFAULT_SEED_THRESHOLD_UP,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            octree: OctreeConfig::default(),
            separation_bounds_scale: Self::DEFAULT_SEPARATION_BOUNDS_SCALE,
            walk_bounds_scale: Self::DEFAULT_WALK_BOUNDS_SCALE,
            bounds_inflation: Self::DEFAULT_BOUNDS_INFLATION,
            verbosity: Verbosity::default(),
        }
    }
}

/// A single streamline traced across a surface.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct SurfaceStreamline {
    positions: Vec<Point3<ftr>>,
    seed_index: usize,
    forward_stopping_cause: StoppingCause,
    backward_stopping_cause: StoppingCause,
}

impl SurfaceStreamline {
    /// Returns the points of the line, from the backward end to the forward end.
    pub fn positions(&self) -> &[Point3<ftr>] {
        &self.positions
    }

    pub fn number_of_points(&self) -> usize {
        self.positions.len()
    }

    /// Returns the index of the seed point in `positions`.
    pub fn seed_index(&self) -> usize {
        self.seed_index
    }

    /// Returns why the walk along the field terminated.
    pub fn forward_stopping_cause(&self) -> StoppingCause {
        self.forward_stopping_cause
    }

    /// Returns why the walk against the field terminated.
    pub fn backward_stopping_cause(&self) -> StoppingCause {
        self.backward_stopping_cause
    }
}

/// Streamlines traced across a surface, in the order their seed faces were visited.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct SurfaceStreamlines {
    lines: Vec<SurfaceStreamline>,
}

impl SurfaceStreamlines {
    pub fn lines(&self) -> &[SurfaceStreamline] {
        &self.lines
    }

    pub fn number_of_lines(&self) -> usize {
        self.lines.len()
    }

    /// Returns the total number of points over all lines.
    pub fn number_of_points(&self) -> usize {
        self.lines.iter().map(SurfaceStreamline::number_of_points).sum()
    }

    /// Returns the number of points in each line.
    pub fn line_point_counts(&self) -> Vec<usize> {
        self.lines
            .iter()
            .map(SurfaceStreamline::number_of_points)
            .collect()
    }

    /// Returns the points of all lines concatenated into a flat buffer with
    /// three coordinates per point.
    pub fn positions_flat(&self) -> Vec<ftr> {
        self.lines
            .iter()
            .flat_map(|line| line.positions.iter().flat_map(Point3::to_array))
            .collect()
    }

    /// Returns pairs of indices into the concatenated points for every
    /// segment joining consecutive points of a line.
    pub fn segment_indices(&self) -> Vec<usize> {
        let mut indices = Vec::with_capacity(2 * self.number_of_points());
        let mut offset = 0;
        for line in &self.lines {
            for idx in 1..line.number_of_points() {
                indices.push(offset + idx - 1);
                indices.push(offset + idx);
            }
            offset += line.number_of_points();
        }
        indices
    }

    /// Serializes the streamlines into a JSON file saved at the given path.
    #[cfg(feature = "json")]
    pub fn save_as_json<P: AsRef<path::Path>>(&self, file_path: P) -> io::Result<()> {
        crate::io::save_data_as_json(file_path.as_ref(), self)
    }
}

/// Tracer placing streamlines of a node-based vector field across a surface,
/// keeping points of different lines apart by at least the integration step.
///
/// Everything that depends only on the surface is computed on construction,
/// so the tracer can be reused for several fields on the same surface.
pub struct SurfaceStreamlineTracer3<M> {
    mesh: M,
    config: SurfaceStreamlineConfig,
    bounds: BoundingBox3<ftr>,
    separation_bounds: BoundingBox3<ftr>,
    walk_bounds: BoundingBox3<ftr>,
    step_length: ftr,
    border_edges: HashSet<HalfEdgeId>,
}

impl<M: SurfaceMesh3> SurfaceStreamlineTracer3<M> {
    /// Creates a new surface streamline tracer.
    ///
    /// # Parameters
    ///
    /// - `mesh`: Surface to trace on.
    /// - `config`: Configuration parameters for the tracer.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains the new tracer.
    /// - `Err`: The surface has no faces or collapses to a single point.
    pub fn new(mesh: M, config: SurfaceStreamlineConfig) -> Result<Self> {
        config.validate();

        if mesh.number_of_faces() == 0 {
            return Err(TracingError::InvalidInput(
                "surface has no faces".to_string(),
            ));
        }
        let bounds = mesh.bounding_box().ok_or_else(|| {
            TracingError::InvalidInput("surface has no nodes".to_string())
        })?;
        let step_length = bounds.max_extent() / config.integration_divisions;
        if !(step_length > 0.0) {
            return Err(TracingError::InvalidInput(
                "surface has zero extent".to_string(),
            ));
        }
        let separation_bounds = bounds
            .scaled(config.separation_bounds_scale)
            .inflated(config.bounds_inflation);
        let walk_bounds = bounds
            .inflated(config.bounds_inflation)
            .scaled(config.walk_bounds_scale);
        let border_edges = mesh.border_half_edges().into_iter().collect();

        if config.verbosity.print_messages() {
            log::info!("Number of nodes: {}", mesh.number_of_nodes());
            log::info!("Number of faces: {}", mesh.number_of_faces());
            log::info!(
                "Bounding box: {} to {}",
                bounds.lower(),
                bounds.upper()
            );
            log::info!("Integration step: {}", step_length);
        }

        Ok(Self {
            mesh,
            config,
            bounds,
            separation_bounds,
            walk_bounds,
            step_length,
            border_edges,
        })
    }

    pub fn mesh(&self) -> &M {
        &self.mesh
    }

    pub fn config(&self) -> &SurfaceStreamlineConfig {
        &self.config
    }

    /// Returns the bounding box of the surface.
    pub fn bounds(&self) -> &BoundingBox3<ftr> {
        &self.bounds
    }

    /// Returns the length of each integration step.
    pub fn step_length(&self) -> ftr {
        self.step_length
    }

    /// Returns the minimum distance kept between points of different lines.
    pub fn separation_distance(&self) -> ftr {
        self.step_length
    }

    /// Traces streamlines of the given field across the surface.
    ///
    /// # Parameters
    ///
    /// - `field`: Field vector at each node of the surface.
    /// - `seed_attribute`: Optional value for each face. If given, only faces
    ///   whose value normalized to [0, 1] lies within the seed thresholds
    ///   start new lines.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains the traced streamlines.
    /// - `Err`: The field or seed attribute does not match the surface.
    pub fn generate(
        &self,
        field: &[Vec3<ftr>],
        seed_attribute: Option<&[ftr]>,
    ) -> Result<SurfaceStreamlines> {
        let n_faces = self.mesh.number_of_faces();
        if field.len() != self.mesh.number_of_nodes() {
            return Err(TracingError::InvalidInput(format!(
                "field has {} vectors but the surface has {} nodes",
                field.len(),
                self.mesh.number_of_nodes()
            )));
        }
        let skip = match seed_attribute {
            Some(attribute) => {
                if attribute.len() != n_faces {
                    return Err(TracingError::InvalidInput(format!(
                        "seed attribute has {} values but the surface has {} faces",
                        attribute.len(),
                        n_faces
                    )));
                }
                if self.config.verbosity.print_messages() {
                    log::info!(
                        "Seed thresholds: {} to {}",
                        self.config.seed_threshold_down,
                        self.config.seed_threshold_up
                    );
                }
                faces_to_skip(
                    attribute,
                    self.config.seed_threshold_down,
                    self.config.seed_threshold_up,
                )?
            }
            None => vec![false; n_faces],
        };

        let mut visited = vec![false; n_faces];
        let mut committed_points =
            Octree3::new(self.separation_bounds, self.config.octree);
        let mut lines = Vec::new();

        for face_idx in
            (0..n_faces).progress_with(self.config.verbosity.create_progress_bar(n_faces))
        {
            if skip[face_idx] || visited[face_idx] {
                continue;
            }
            visited[face_idx] = true;
            let face = FaceId(face_idx);
            let seed = self.mesh.face_barycenter(face);

            let (forward, backward) = {
                let walker = self.walker(field, &committed_points);
                if walker.too_near(&seed) {
                    continue;
                }
                let forward = walker.trace_half(face, &seed, SteppingSense::Same, &mut visited);
                let backward =
                    walker.trace_half(face, &seed, SteppingSense::Opposite, &mut visited);
                (forward, backward)
            };

            let n_backward = backward.points.len();
            let mut seed_index = 0;
            let mut positions = Vec::with_capacity(n_backward + 1 + forward.points.len());
            for (idx, point) in backward
                .points
                .into_iter()
                .rev()
                .chain(iter::once(seed))
                .chain(forward.points)
                .enumerate()
            {
                if idx == n_backward {
                    seed_index = positions.len();
                }
                if committed_points.insert(point) {
                    positions.push(point);
                }
            }
            if !positions.is_empty() {
                lines.push(SurfaceStreamline {
                    positions,
                    seed_index,
                    forward_stopping_cause: forward.stopping_cause,
                    backward_stopping_cause: backward.stopping_cause,
                });
            }
        }

        let streamlines = SurfaceStreamlines { lines };
        if self.config.verbosity.print_messages() {
            log::info!(
                "Traced {} surface streamlines with {} points in total",
                streamlines.number_of_lines(),
                streamlines.number_of_points()
            );
        }
        Ok(streamlines)
    }

    fn walker<'a>(
        &'a self,
        field: &'a [Vec3<ftr>],
        committed_points: &'a Octree3<ftr>,
    ) -> Walker<'a, M> {
        Walker {
            mesh: &self.mesh,
            field,
            committed_points,
            border_edges: &self.border_edges,
            walk_bounds: &self.walk_bounds,
            step_length: self.step_length,
            separation_distance: self.separation_distance(),
            max_iterations: self.config.max_iterations,
        }
    }
}

/// Determines which faces may not start a line, given a seed attribute value
/// for each face.
///
/// The attribute is normalized to [0, 1] over all faces, and faces whose
/// normalized value falls outside `[threshold_down, threshold_up]` are skipped.
/// A constant attribute normalizes to one everywhere.
pub fn faces_to_skip(
    attribute: &[ftr],
    threshold_down: ftr,
    threshold_up: ftr,
) -> Result<Vec<bool>> {
    if let Some(idx) = attribute.iter().position(|value| !value.is_finite()) {
        return Err(TracingError::InvalidInput(format!(
            "seed attribute of face {} is not finite",
            idx
        )));
    }
    let min = attribute.iter().copied().fold(ftr::INFINITY, ftr::min);
    let max = attribute.iter().copied().fold(ftr::NEG_INFINITY, ftr::max);
    let range = max - min;
    if range == 0.0 {
        log::warn!("Seed attribute is constant, so it does not restrict seeding");
    }

    let mut faces: Vec<_> = attribute
        .iter()
        .enumerate()
        .map(|(idx, &value)| {
            let normalized = if range > 0.0 {
                (value - min) / range
            } else {
                1.0
            };
            OrderableIndexValuePair(idx, normalized)
        })
        .collect();
    faces.sort_by(|a, b| b.cmp(a));

    let first_accepted = faces.partition_point(|face| face.1 > threshold_up);
    let end_accepted = faces.partition_point(|face| face.1 >= threshold_down);

    let mut skip = vec![true; attribute.len()];
    if first_accepted < end_accepted {
        for face in &faces[first_accepted..end_accepted] {
            skip[face.0] = false;
        }
    }
    Ok(skip)
}

/// Traces evenly spaced streamlines on a surface given as flat buffers.
///
/// # Parameters
///
/// - `nodes`: Node coordinates, three per node.
/// - `faces`: Node indices, three per triangle.
/// - `field`: Field vector components at the nodes, three per node.
/// - `seed_attribute`: Optional value for each face restricting where lines start.
/// - `min_seed`: Lower threshold for the normalized seed attribute.
/// - `max_seed`: Upper threshold for the normalized seed attribute.
/// - `integration_divisions`: Number of integration steps across the largest surface extent.
///
/// # Returns
///
/// A `Result` which is either:
///
/// - `Ok`: Contains the traced streamlines.
/// - `Err`: The buffers are inconsistent.
pub fn surface_streamlines(
    nodes: &[ftr],
    faces: &[usize],
    field: &[ftr],
    seed_attribute: Option<&[ftr]>,
    min_seed: ftr,
    max_seed: ftr,
    integration_divisions: ftr,
) -> Result<SurfaceStreamlines> {
    if field.len() % 3 != 0 {
        return Err(TracingError::InvalidInput(format!(
            "field buffer length {} is not a multiple of three",
            field.len()
        )));
    }
    if integration_divisions <= 0.0 || !integration_divisions.is_finite() {
        return Err(TracingError::InvalidInput(format!(
            "number of integration divisions must be positive and finite, got {}",
            integration_divisions
        )));
    }
    if min_seed.is_nan() || max_seed.is_nan() || min_seed > max_seed {
        return Err(TracingError::InvalidInput(format!(
            "lower seed threshold {} exceeds upper seed threshold {}",
            min_seed, max_seed
        )));
    }
    let surface = IndexedSurface3::from_flat(nodes, faces)?;
    let field: Vec<_> = field.chunks_exact(3).map(Vec3::from_slice).collect();
    let config = SurfaceStreamlineConfig {
        integration_divisions,
        seed_threshold_down: min_seed,
        seed_threshold_up: max_seed,
        ..SurfaceStreamlineConfig::default()
    };
    SurfaceStreamlineTracer3::new(surface, config)?.generate(&field, seed_attribute)
}
