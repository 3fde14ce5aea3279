//! Walking a single line half across the triangles of a surface.

use crate::{
    error::GeometryError,
    geometry::{
        plane::Plane3,
        ray::Ray2,
        BoundingBox3,
        Dim2::{X, Y},
        Point2, Point3, Vec2, Vec3,
    },
    mesh::{FaceId, HalfEdgeId, SurfaceMesh3},
    octree::Octree3,
    tracing::{
        ftr,
        stepping::{SteppingSense, StoppingCause},
    },
};
use std::collections::HashSet;

/// State of the walk between two consecutive steps.
///
/// The segment from `start` to `end` is the step about to be taken inside
/// `face`, which was entered through `entry_edge` (if the walk crossed into it).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    pub face: FaceId,
    pub entry_edge: Option<HalfEdgeId>,
    pub start: Point3<ftr>,
    pub end: Point3<ftr>,
    pub remaining: usize,
}

/// Outcome of taking the step described by a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Transition {
    /// The step was accepted and the walk continues from the given frame.
    Continue(Frame),
    /// The walk terminates.
    Stop(StoppingCause),
}

/// Points accepted while walking from a seed in one direction.
#[derive(Clone, Debug, PartialEq)]
pub struct LineHalf {
    pub points: Vec<Point3<ftr>>,
    pub stopping_cause: StoppingCause,
}

/// Everything a walk reads but never modifies.
pub struct Walker<'a, M> {
    pub mesh: &'a M,
    pub field: &'a [Vec3<ftr>],
    pub committed_points: &'a Octree3<ftr>,
    pub border_edges: &'a HashSet<HalfEdgeId>,
    pub walk_bounds: &'a BoundingBox3<ftr>,
    pub step_length: ftr,
    pub separation_distance: ftr,
    pub max_iterations: usize,
}

impl<'a, M: SurfaceMesh3> Walker<'a, M> {
    /// Walks from the given seed inside the given face until a stopping
    /// condition is met, marking every traversed face as visited.
    ///
    /// The seed itself is not included in the returned points.
    pub fn trace_half(
        &self,
        face: FaceId,
        seed: &Point3<ftr>,
        sense: SteppingSense,
        visited: &mut [bool],
    ) -> LineHalf {
        let mut points = Vec::new();

        let mut frame = match self.first_frame(face, seed, sense) {
            Ok(frame) => frame,
            Err(err) => {
                log::debug!("Could not start line in face {}: {}", face.0, err);
                return LineHalf {
                    points,
                    stopping_cause: StoppingCause::Unresolved,
                };
            }
        };

        let stopping_cause = loop {
            if frame.remaining == 0 {
                break StoppingCause::IterationLimit;
            }
            visited[frame.face.0] = true;
            match self.advance(&frame, sense, visited, &mut points) {
                Transition::Continue(next_frame) => frame = next_frame,
                Transition::Stop(cause) => break cause,
            }
        };
        LineHalf {
            points,
            stopping_cause,
        }
    }

    /// Computes the first step from a seed point inside the given face.
    pub fn first_frame(
        &self,
        face: FaceId,
        seed: &Point3<ftr>,
        sense: SteppingSense,
    ) -> Result<Frame, GeometryError> {
        let plane = self.face_plane(face)?;
        let seed_uv = plane.to_uv(seed);
        let direction =
            self.interpolated_direction(&plane, face, &seed_uv, &Vec2::zero(), sense, true)?;
        let end = plane.from_uv(&(seed_uv + self.scaled_step(&direction)?))?;
        Ok(Frame {
            face,
            entry_edge: None,
            start: *seed,
            end,
            remaining: self.max_iterations,
        })
    }

    /// Takes the step described by the given frame, appending any accepted
    /// points to `points`.
    ///
    /// Geometric failures terminate the walk with `StoppingCause::Unresolved`.
    pub fn advance(
        &self,
        frame: &Frame,
        sense: SteppingSense,
        visited: &[bool],
        points: &mut Vec<Point3<ftr>>,
    ) -> Transition {
        match self.try_advance(frame, sense, visited, points) {
            Ok(transition) => transition,
            Err(err) => {
                log::debug!("Line terminated in face {}: {}", frame.face.0, err);
                Transition::Stop(StoppingCause::Unresolved)
            }
        }
    }

    fn try_advance(
        &self,
        frame: &Frame,
        sense: SteppingSense,
        visited: &[bool],
        points: &mut Vec<Point3<ftr>>,
    ) -> Result<Transition, GeometryError> {
        let segment_bounds = BoundingBox3::enclosing([&frame.start, &frame.end])
            .ok_or(GeometryError::UnresolvedProjection)?;
        if !self.walk_bounds.contains_box(&segment_bounds) {
            return Ok(Transition::Stop(StoppingCause::OutOfBounds));
        }
        if let Some(entry_edge) = frame.entry_edge {
            if self.border_edges.contains(&entry_edge) {
                return Ok(Transition::Stop(StoppingCause::Border));
            }
        }

        let plane = self.face_plane(frame.face)?;
        let (_, projected_start) = plane.project(&frame.start)?;
        let (_, projected_end) = plane.project(&frame.end)?;
        let start_uv = plane.to_uv(&projected_start);
        let end_uv = plane.to_uv(&projected_end);

        let segment_vector = end_uv - start_uv;
        let segment = Ray2::new(start_uv, segment_vector);
        let segment_length = segment_vector.length();

        for edge in self.mesh.face_half_edges(frame.face) {
            if Some(edge) == frame.entry_edge {
                continue;
            }
            let edge_start = plane.to_uv(&self.mesh.node_position(self.mesh.half_edge_node(edge)));
            let edge_end = plane.to_uv(
                &self
                    .mesh
                    .node_position(self.mesh.half_edge_node(self.mesh.half_edge_next(edge))),
            );
            let edge_vector = edge_end - edge_start;
            let edge_length = edge_vector.length();

            let crossing = match Ray2::new(edge_start, edge_vector).intersect_ray(&segment) {
                Some(crossing)
                    if crossing.distance > 0.0
                        && crossing.distance < edge_length
                        && crossing.other_distance > 0.0
                        && crossing.other_distance < segment_length =>
                {
                    crossing
                }
                _ => continue,
            };

            let crossing_point = plane.from_uv(&crossing.point)?;
            if self.too_near(&crossing_point) {
                return Ok(Transition::Stop(StoppingCause::TooClose));
            }
            points.push(crossing_point);

            let mate_edge = match self.mesh.half_edge_opposite(edge) {
                Some(mate_edge) => mate_edge,
                None => return Ok(Transition::Stop(StoppingCause::Border)),
            };
            let mate_face = self.mesh.half_edge_face(mate_edge);
            if visited[mate_face.0] {
                return Ok(Transition::Stop(StoppingCause::VisitedFace));
            }
            return Ok(Transition::Continue(Frame {
                face: mate_face,
                entry_edge: Some(mate_edge),
                start: crossing_point,
                end: projected_end,
                remaining: frame.remaining - 1,
            }));
        }

        // The step ends inside the face
        if self.too_near(&projected_end) {
            return Ok(Transition::Stop(StoppingCause::TooClose));
        }
        points.push(projected_end);

        let direction = self.interpolated_direction(
            &plane,
            frame.face,
            &end_uv,
            &segment_vector,
            sense,
            false,
        )?;
        let next_end = plane.from_uv(&(end_uv + self.scaled_step(&direction)?))?;
        Ok(Transition::Continue(Frame {
            face: frame.face,
            entry_edge: None,
            start: projected_end,
            end: next_end,
            remaining: frame.remaining - 1,
        }))
    }

    /// Whether a committed point lies closer than the separation distance.
    pub fn too_near(&self, point: &Point3<ftr>) -> bool {
        self.committed_points
            .has_item_within(point, self.separation_distance)
    }

    fn face_plane(&self, face: FaceId) -> Result<Plane3<ftr>, GeometryError> {
        let [p0, p1, p2] = self.mesh.face_positions(face);
        Plane3::new(p0, p1, p2)
    }

    fn scaled_step(&self, direction: &Vec2<ftr>) -> Result<Vec2<ftr>, GeometryError> {
        direction
            .normalized()
            .map(|unit| unit * self.step_length)
            .ok_or(GeometryError::ZeroFieldVector)
    }

    fn interpolated_direction(
        &self,
        plane: &Plane3<ftr>,
        face: FaceId,
        point_uv: &Point2<ftr>,
        stream_direction: &Vec2<ftr>,
        sense: SteppingSense,
        first_step: bool,
    ) -> Result<Vec2<ftr>, GeometryError> {
        let nodes = self.mesh.face_nodes(face);
        let corners = [
            plane.to_uv(&self.mesh.node_position(nodes[0])),
            plane.to_uv(&self.mesh.node_position(nodes[1])),
            plane.to_uv(&self.mesh.node_position(nodes[2])),
        ];
        let vectors = [
            plane.vector_to_uv(&self.field[nodes[0].0]),
            plane.vector_to_uv(&self.field[nodes[1].0]),
            plane.vector_to_uv(&self.field[nodes[2].0]),
        ];
        let context = OrientationContext {
            stream_direction: *stream_direction,
            sense,
            first_step,
        };
        interpolate_projected_vector(&corners, vectors, point_uv, &context)
    }
}

/// How node vectors are made to agree in orientation before blending.
#[derive(Clone, Copy, Debug)]
pub struct OrientationContext {
    /// Direction of the previous step, ignored when zero or on the first step.
    pub stream_direction: Vec2<ftr>,
    pub sense: SteppingSense,
    /// On the first step, the second and third vectors are flipped to agree with the first.
    pub first_step: bool,
}

/// Blends the in-plane field vectors at the three corners of a triangle with
/// the barycentric weights of the given point, after orienting them consistently.
///
/// # Parameters
///
/// - `corners`: UV coordinates of the triangle corners.
/// - `vectors`: In-plane field vectors at the corners.
/// - `point_uv`: UV coordinates of the point to interpolate at.
/// - `context`: How to orient the corner vectors.
///
/// # Returns
///
/// A `Result` which is either:
///
/// - `Ok`: Contains the interpolated in-plane vector.
/// - `Err`: `ZeroAreaTriangle` if the corners are collinear, or
///   `ZeroFieldVector` if any corner vector vanishes in the plane.
pub fn interpolate_projected_vector(
    corners: &[Point2<ftr>; 3],
    mut vectors: [Vec2<ftr>; 3],
    point_uv: &Point2<ftr>,
    context: &OrientationContext,
) -> Result<Vec2<ftr>, GeometryError> {
    let first_edge = corners[1] - corners[0];
    let second_edge = corners[2] - corners[0];
    let relative = point_uv - &corners[0];

    let determinant = first_edge[X] * second_edge[Y] - second_edge[X] * first_edge[Y];
    if determinant == 0.0 {
        return Err(GeometryError::ZeroAreaTriangle);
    }
    let alpha = determinant.recip();
    let eta = alpha * (second_edge[Y] * relative[X] - second_edge[X] * relative[Y]);
    let xi = alpha * (first_edge[X] * relative[Y] - first_edge[Y] * relative[X]);

    if vectors.iter().any(Vec2::is_zero) {
        return Err(GeometryError::ZeroFieldVector);
    }

    if context.first_step {
        let reference = vectors[0];
        for vector in &mut vectors[1..] {
            if vector.dot(&reference) < 0.0 {
                vector.reverse();
            }
        }
    }
    if context.sense == SteppingSense::Opposite {
        for vector in &mut vectors {
            vector.reverse();
        }
    }
    if !context.first_step && !context.stream_direction.is_zero() {
        for vector in &mut vectors {
            if vector.dot(&context.stream_direction) < 0.0 {
                vector.reverse();
            }
        }
    }

    Ok(vectors[0] * (1.0 - eta - xi) + vectors[1] * eta + vectors[2] * xi)
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::{mesh::indexed::IndexedSurface3, octree::OctreeConfig};
    use approx::assert_abs_diff_eq;

    fn unit_triangle() -> [Point2<ftr>; 3] {
        [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ]
    }

    fn context(first_step: bool, sense: SteppingSense) -> OrientationContext {
        OrientationContext {
            stream_direction: Vec2::zero(),
            sense,
            first_step,
        }
    }

    #[test]
    fn interpolation_reproduces_corner_vectors() {
        let corners = unit_triangle();
        let vectors = [
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 2.0),
        ];
        for (corner, vector) in corners.iter().zip(vectors.iter()) {
            let interpolated = interpolate_projected_vector(
                &corners,
                vectors,
                corner,
                &context(false, SteppingSense::Same),
            )
            .unwrap();
            assert_abs_diff_eq!(interpolated, *vector, epsilon = 1e-12);
        }
        let center = Point2::new(1.0 / 3.0, 1.0 / 3.0);
        let blend_context = context(false, SteppingSense::Same);
        let interpolated =
            interpolate_projected_vector(&corners, vectors, &center, &blend_context).unwrap();
        assert_abs_diff_eq!(interpolated, Vec2::new(2.0 / 3.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn first_step_aligns_vectors_with_the_first_corner() {
        let corners = unit_triangle();
        let vectors = [
            Vec2::new(1.0, 0.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(-1.0, 0.0),
        ];
        let center = Point2::new(1.0 / 3.0, 1.0 / 3.0);
        let forward_context = context(true, SteppingSense::Same);
        let forward =
            interpolate_projected_vector(&corners, vectors, &center, &forward_context).unwrap();
        assert_abs_diff_eq!(forward, Vec2::new(1.0, 0.0), epsilon = 1e-12);

        let backward = interpolate_projected_vector(
            &corners,
            vectors,
            &center,
            &context(true, SteppingSense::Opposite),
        )
        .unwrap();
        assert_abs_diff_eq!(backward, Vec2::new(-1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn later_steps_follow_the_stream_direction() {
        let corners = unit_triangle();
        let vectors = [
            Vec2::new(0.0, 1.0),
            Vec2::new(0.0, -1.0),
            Vec2::new(0.0, 1.0),
        ];
        let ctx = OrientationContext {
            stream_direction: Vec2::new(0.5, -1.0),
            sense: SteppingSense::Same,
            first_step: false,
        };
        let interpolated =
            interpolate_projected_vector(&corners, vectors, &Point2::new(0.2, 0.2), &ctx).unwrap();
        assert_abs_diff_eq!(interpolated, Vec2::new(0.0, -1.0), epsilon = 1e-12);
    }

    #[test]
    fn degenerate_input_is_rejected() {
        let collinear = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        ];
        let vectors = [Vec2::new(1.0, 0.0); 3];
        assert_eq!(
            interpolate_projected_vector(
                &collinear,
                vectors,
                &Point2::origin(),
                &context(true, SteppingSense::Same)
            ),
            Err(GeometryError::ZeroAreaTriangle)
        );
        let vectors = [Vec2::new(1.0, 0.0), Vec2::zero(), Vec2::new(1.0, 0.0)];
        assert_eq!(
            interpolate_projected_vector(
                &unit_triangle(),
                vectors,
                &Point2::origin(),
                &context(true, SteppingSense::Same)
            ),
            Err(GeometryError::ZeroFieldVector)
        );
    }

    struct Fixture {
        surface: IndexedSurface3,
        field: Vec<Vec3<ftr>>,
        octree: Octree3<ftr>,
        border_edges: HashSet<HalfEdgeId>,
        walk_bounds: BoundingBox3<ftr>,
    }

    impl Fixture {
        /// Unit square split into two triangles along its diagonal, with a
        /// field pointing along x.
        fn square() -> Self {
            let surface = IndexedSurface3::from_flat(
                &[
                    0.0, 0.0, 0.0, //
                    1.0, 0.0, 0.0, //
                    1.0, 1.0, 0.0, //
                    0.0, 1.0, 0.0,
                ],
                &[0, 1, 2, 0, 2, 3],
            )
            .unwrap();
            let bounds = surface.bounding_box().unwrap().inflated(1e-3);
            Self {
                field: vec![Vec3::new(1.0, 0.0, 0.0); 4],
                octree: Octree3::new(bounds.scaled(1.2), OctreeConfig::default()),
                border_edges: surface.border_half_edges().into_iter().collect(),
                walk_bounds: bounds.scaled(1.02),
                surface,
            }
        }

        fn walker(&self, step_length: ftr) -> Walker<'_, IndexedSurface3> {
            Walker {
                mesh: &self.surface,
                field: &self.field,
                committed_points: &self.octree,
                border_edges: &self.border_edges,
                walk_bounds: &self.walk_bounds,
                step_length,
                separation_distance: 0.01,
                max_iterations: 40,
            }
        }
    }

    #[test]
    fn step_inside_a_face_continues_in_the_same_face() {
        let fixture = Fixture::square();
        let walker = fixture.walker(0.1);
        let seed = Point3::new(0.6, 0.1, 0.0);
        let frame = walker.first_frame(FaceId(0), &seed, SteppingSense::Same).unwrap();
        assert_abs_diff_eq!(frame.end, Point3::new(0.7, 0.1, 0.0), epsilon = 1e-12);

        let mut points = Vec::new();
        let transition = walker.advance(&frame, SteppingSense::Same, &[true, false], &mut points);
        match transition {
            Transition::Continue(next) => {
                assert_eq!(next.face, FaceId(0));
                assert_eq!(next.entry_edge, None);
                assert_eq!(next.remaining, 39);
                assert_abs_diff_eq!(next.end, Point3::new(0.8, 0.1, 0.0), epsilon = 1e-12);
            }
            Transition::Stop(cause) => panic!("Walk stopped: {:?}", cause),
        }
        assert_eq!(points.len(), 1);
        assert_abs_diff_eq!(points[0], Point3::new(0.7, 0.1, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn crossing_an_interior_edge_enters_the_mate_face() {
        let fixture = Fixture::square();
        let walker = fixture.walker(0.2);
        let frame = Frame {
            face: FaceId(1),
            entry_edge: None,
            start: Point3::new(0.2, 0.3, 0.0),
            end: Point3::new(0.4, 0.3, 0.0),
            remaining: 10,
        };
        let mut points = Vec::new();
        match walker.advance(&frame, SteppingSense::Same, &[false, true], &mut points) {
            Transition::Continue(next) => {
                assert_eq!(next.face, FaceId(0));
                assert_eq!(next.entry_edge, Some(HalfEdgeId(2)));
                assert_eq!(next.remaining, 9);
                assert_abs_diff_eq!(next.start, Point3::new(0.3, 0.3, 0.0), epsilon = 1e-12);
            }
            Transition::Stop(cause) => panic!("Walk stopped: {:?}", cause),
        }
        assert_eq!(points.len(), 1);

        // The same crossing into an already traversed face ends the walk
        let mut points = Vec::new();
        assert_eq!(
            walker.advance(&frame, SteppingSense::Same, &[true, true], &mut points),
            Transition::Stop(StoppingCause::VisitedFace)
        );
    }

    #[test]
    fn walks_end_at_the_border() {
        let fixture = Fixture::square();
        let walker = fixture.walker(0.02);
        let mut visited = vec![false; 2];
        let seed = Point3::new(0.61, 0.1, 0.0);
        let half = walker.trace_half(FaceId(0), &seed, SteppingSense::Same, &mut visited);
        assert_eq!(half.stopping_cause, StoppingCause::Border);
        assert_eq!(half.points.len(), 20);
        assert_eq!(visited, vec![true, false]);
        let last = half.points.last().unwrap();
        assert_abs_diff_eq!(*last, Point3::new(1.0, 0.1, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn committed_points_repel_the_walk() {
        let mut fixture = Fixture::square();
        fixture.octree.insert(Point3::new(0.705, 0.1, 0.0));
        let walker = fixture.walker(0.1);
        let mut visited = vec![false; 2];
        let seed = Point3::new(0.6, 0.1, 0.0);
        let half = walker.trace_half(FaceId(0), &seed, SteppingSense::Same, &mut visited);
        assert_eq!(half.stopping_cause, StoppingCause::TooClose);
        assert!(half.points.is_empty());
    }
}
