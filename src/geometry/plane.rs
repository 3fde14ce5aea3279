//! Planes spanned by three anchor points, with a local 2D parameterization.

use super::{
    ray::{Ray3, RayPlaneIntersection},
    Point2, Point3, Vec2, Vec3,
    Dim2, Dim3::{X, Y, Z},
};
use crate::{
    error::GeometryError,
    num::{from_f64, BFloat},
};

#[cfg(feature = "serialization")]
use serde::Serialize;

/// Relative squared distance below which a point counts as lying in a plane.
const COPLANARITY_TOLERANCE: f64 = 1e-12;

/// Normal components smaller than this are skipped when building a plane from a normal.
const NORMAL_COMPONENT_THRESHOLD: f64 = 1e-3;

/// Which side of a plane a point lies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanePosition {
    SideA,
    SideB,
    Coplanar,
}

/// A plane through three non-collinear anchor points.
///
/// The local UV basis has its first axis along `p2 - p1` and its
/// second axis along `normal × first axis`, with the origin at `p1`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct Plane3<F: BFloat> {
    anchors: [Point3<F>; 3],
    normal: Vec3<F>,
    offset: F,
    basis_u: Vec3<F>,
    basis_v: Vec3<F>,
    basis_length: F,
}

impl<F: BFloat> Plane3<F> {
    /// Creates a new plane through the three given anchor points.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains the new plane.
    /// - `Err`: `ZeroLengthBasis` if `p1` equals `p2`, or `CollinearPoints`
    ///   if the three points lie on a common line.
    pub fn new(p1: Point3<F>, p2: Point3<F>, p3: Point3<F>) -> Result<Self, GeometryError> {
        let first_edge = p2 - p1;
        if first_edge.is_zero() {
            return Err(GeometryError::ZeroLengthBasis);
        }
        let normal = first_edge
            .cross(&(p3 - p1))
            .normalized()
            .ok_or(GeometryError::CollinearPoints)?;
        Ok(Self::assemble([p1, p2, p3], normal))
    }

    /// Creates a new plane through the given point with the given normal direction.
    ///
    /// The normal does not have to be normalized, but fails with
    /// `ZeroLengthDirection` if none of its components is significant.
    pub fn from_point_and_normal(
        point: Point3<F>,
        normal: &Vec3<F>,
    ) -> Result<Self, GeometryError> {
        let threshold = from_f64::<F>(NORMAL_COMPONENT_THRESHOLD);
        let (x, y, z) = (normal[X], normal[Y], normal[Z]);

        let in_plane = if num::Float::abs(y) > threshold {
            Vec3::new(-y, x - z * z / y, z)
        } else if num::Float::abs(x) > threshold {
            Vec3::new(y - z * z / x, -x, z)
        } else if num::Float::abs(z) > threshold {
            Vec3::new(x, -z, y - x * x / z)
        } else {
            return Err(GeometryError::ZeroLengthDirection);
        };
        let first = in_plane
            .normalized()
            .ok_or(GeometryError::ZeroLengthDirection)?;
        let second = first.cross(normal);

        // Anchor order makes the resulting normal agree with the requested one
        Self::new(point, point + second, point + first)
    }

    fn assemble(anchors: [Point3<F>; 3], normal: Vec3<F>) -> Self {
        let first_edge = anchors[1] - anchors[0];
        let basis_length = first_edge.length();
        let basis_u = first_edge * basis_length.recip();
        let basis_v = normal.cross(&basis_u);
        let offset = -normal.dot(&anchors[0].to_vec3());
        Self {
            anchors,
            normal,
            offset,
            basis_u,
            basis_v,
            basis_length,
        }
    }

    /// Returns the three anchor points.
    pub fn anchors(&self) -> &[Point3<F>; 3] {
        &self.anchors
    }

    /// Returns the unit normal of the plane.
    pub fn normal(&self) -> &Vec3<F> {
        &self.normal
    }

    /// Returns the offset `d` satisfying `normal·p1 + d = 0`.
    pub fn offset(&self) -> F {
        self.offset
    }

    /// Returns the distance between the first two anchors, which is the unit
    /// of normalized UV coordinates.
    pub fn basis_length(&self) -> F {
        self.basis_length
    }

    /// Swaps the second and third anchors, reversing the normal.
    pub fn flip_orientation(&mut self) {
        let [p1, p2, p3] = self.anchors;
        *self = Self::assemble([p1, p3, p2], -self.normal);
    }

    /// Classifies the given point by the sign of the exact orientation
    /// determinant of the three anchors and the point.
    pub fn position(&self, point: &Point3<F>) -> PlanePosition {
        let [pa, pb, pc] = &self.anchors;
        let a = pa - point;
        let b = pb - point;
        let c = pc - point;
        let determinant = a[X] * (b[Y] * c[Z] - b[Z] * c[Y])
            + b[X] * (c[Y] * a[Z] - c[Z] * a[Y])
            + c[X] * (a[Y] * b[Z] - a[Z] * b[Y]);

        if determinant < F::zero() {
            PlanePosition::SideA
        } else if determinant > F::zero() {
            PlanePosition::SideB
        } else {
            PlanePosition::Coplanar
        }
    }

    /// Whether the given point lies in the plane, up to a squared distance
    /// relative to the mean squared edge length of the anchor triangle.
    pub fn contains(&self, point: &Point3<F>) -> bool {
        let [p1, p2, p3] = &self.anchors;
        let p12 = p2 - p1;
        let p13 = p3 - p1;
        let p23 = p3 - p2;
        let normal = p12.cross(&p13);
        let mean_squared_length = (p12.squared_length()
            + p13.squared_length()
            + p23.squared_length())
            / from_f64(3.0);
        let dot = normal.dot(&(point - p1));
        let squared_distance = dot * dot / normal.squared_length();
        squared_distance / mean_squared_length < from_f64(COPLANARITY_TOLERANCE)
    }

    /// Computes the UV coordinates of the given point projected onto the plane.
    pub fn to_uv(&self, point: &Point3<F>) -> Point2<F> {
        let relative = point - &self.anchors[0];
        Point2::new(self.basis_u.dot(&relative), self.basis_v.dot(&relative))
    }

    /// Computes the UV coordinates in units of the distance between the first two anchors.
    pub fn to_normalized_uv(&self, point: &Point3<F>) -> Point2<F> {
        let uv = self.to_uv(point);
        let scale = self.basis_length.recip();
        Point2::new(uv[Dim2::X] * scale, uv[Dim2::Y] * scale)
    }

    /// Maps the given UV coordinates back to a point in 3D.
    ///
    /// Fails with `UnresolvedProjection` if the resulting point does not pass
    /// the coplanarity test.
    pub fn from_uv(&self, uv: &Point2<F>) -> Result<Point3<F>, GeometryError> {
        let point = self.anchors[0] + self.basis_u * uv[Dim2::X] + self.basis_v * uv[Dim2::Y];
        if self.contains(&point) {
            Ok(point)
        } else {
            Err(GeometryError::UnresolvedProjection)
        }
    }

    /// Inverse of `to_normalized_uv`.
    pub fn from_normalized_uv(&self, uv: &Point2<F>) -> Result<Point3<F>, GeometryError> {
        self.from_uv(&Point2::new(
            uv[Dim2::X] * self.basis_length,
            uv[Dim2::Y] * self.basis_length,
        ))
    }

    /// Expresses the in-plane component of the given free vector in the UV basis.
    pub fn vector_to_uv(&self, vector: &Vec3<F>) -> Vec2<F> {
        Vec2::new(self.basis_u.dot(vector), self.basis_v.dot(vector))
    }

    /// Projects the given point onto the plane along the normal.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains the distance to the plane and the projected point.
    ///   A coplanar point is returned unchanged with zero distance.
    /// - `Err`: `CollinearPoints` if the anchor triangle is too small to
    ///   intersect, or `UnresolvedProjection` if neither ray direction hits the plane.
    pub fn project(&self, point: &Point3<F>) -> Result<(F, Point3<F>), GeometryError> {
        if self.position(point) == PlanePosition::Coplanar {
            return Ok((F::zero(), *point));
        }
        let [p1, p2, p3] = &self.anchors;

        for direction in [self.normal, -self.normal] {
            match Ray3::new(*point, direction).intersect_plane(p1, p2, p3) {
                RayPlaneIntersection::Hit { point: hit, distance } => return Ok((distance, hit)),
                RayPlaneIntersection::DegenerateTriangle => {
                    return Err(GeometryError::CollinearPoints)
                }
                RayPlaneIntersection::Miss | RayPlaneIntersection::Coplanar => {}
            }
        }
        Err(GeometryError::UnresolvedProjection)
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_abs_diff_eq;

    fn tilted_plane() -> Plane3<f64> {
        Plane3::new(
            Point3::new(0.3, -1.2, 0.7),
            Point3::new(2.1, 0.4, -0.5),
            Point3::new(-0.8, 1.9, 1.6),
        )
        .unwrap()
    }

    fn unit_xy_plane() -> Plane3<f64> {
        Plane3::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        )
        .unwrap()
    }

    #[test]
    fn degenerate_anchors_are_rejected() {
        let p = Point3::new(1.0, 2.0, 3.0);
        assert_eq!(
            Plane3::new(p, p, Point3::new(0.0, 0.0, 0.0)),
            Err(GeometryError::ZeroLengthBasis)
        );
        assert_eq!(
            Plane3::new(
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 1.0),
                Point3::new(3.0, 3.0, 3.0)
            ),
            Err(GeometryError::CollinearPoints)
        );
    }

    #[test]
    fn uv_mapping_round_trips_points_in_the_plane() {
        let plane = tilted_plane();
        let [p1, p2, p3] = *plane.anchors();
        for &(a, b) in &[(0.0, 0.0), (0.25, 0.5), (-1.5, 2.0), (3.0, -0.75)] {
            let point = p1 + (p2 - p1) * a + (p3 - p1) * b;
            let uv = plane.to_uv(&point);
            assert_abs_diff_eq!(plane.from_uv(&uv).unwrap(), point, epsilon = 1e-9);
            let normalized_uv = plane.to_normalized_uv(&point);
            assert_abs_diff_eq!(
                plane.from_normalized_uv(&normalized_uv).unwrap(),
                point,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn anchors_are_coplanar() {
        let plane = tilted_plane();
        for anchor in plane.anchors() {
            assert_eq!(plane.position(anchor), PlanePosition::Coplanar);
            assert!(plane.contains(anchor));
        }
    }

    #[test]
    fn points_off_the_plane_are_classified_by_side() {
        let mut plane = unit_xy_plane();
        let above = Point3::new(0.2, 0.2, 1.0);
        let below = Point3::new(0.2, 0.2, -1.0);
        assert_eq!(plane.position(&above), PlanePosition::SideA);
        assert_eq!(plane.position(&below), PlanePosition::SideB);
        assert!(!plane.contains(&above));

        plane.flip_orientation();
        assert_eq!(*plane.normal(), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(plane.position(&above), PlanePosition::SideB);
    }

    #[test]
    fn projection_takes_the_nearest_hit_along_the_normal() {
        let plane = unit_xy_plane();
        for z in [1.0, -1.0] {
            let (distance, projected) = plane.project(&Point3::new(0.5, 0.5, z)).unwrap();
            assert_abs_diff_eq!(distance, 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(projected, Point3::new(0.5, 0.5, 0.0), epsilon = 1e-12);
        }
        let on_plane = Point3::new(4.0, -3.0, 0.0);
        assert_eq!(plane.project(&on_plane), Ok((0.0, on_plane)));
    }

    #[test]
    fn plane_from_normal_keeps_the_normal_direction() {
        let point = Point3::new(1.0, -2.0, 0.5);
        let normal = Vec3::new(0.0, 0.0, 2.0);
        let plane = Plane3::from_point_and_normal(point, &normal).unwrap();
        assert_abs_diff_eq!(*plane.normal(), Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
        assert_eq!(plane.position(&point), PlanePosition::Coplanar);
        assert_abs_diff_eq!(plane.offset(), -0.5, epsilon = 1e-12);

        let tilted = Vec3::new(1.0, 2.0, -0.5);
        let plane = Plane3::from_point_and_normal(point, &tilted).unwrap();
        assert_abs_diff_eq!(*plane.normal(), tilted.normalized().unwrap(), epsilon = 1e-12);

        assert_eq!(
            Plane3::from_point_and_normal(point, &Vec3::new(1e-4, 0.0, -1e-4)),
            Err(GeometryError::ZeroLengthDirection)
        );
    }

    #[test]
    fn normal_vectors_have_no_uv_component() {
        let plane = tilted_plane();
        let uv = plane.vector_to_uv(plane.normal());
        assert_abs_diff_eq!(uv, Vec2::zero(), epsilon = 1e-12);
        let along_first_edge = plane.anchors()[1] - plane.anchors()[0];
        assert_abs_diff_eq!(
            plane.vector_to_uv(&along_first_edge),
            Vec2::new(plane.basis_length(), 0.0),
            epsilon = 1e-12
        );
    }
}
