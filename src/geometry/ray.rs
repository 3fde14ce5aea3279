//! Rays in 2D and 3D, with ray-plane and ray-ray intersection.

use super::{Dim2, Point2, Point3, Vec2, Vec3};
use crate::num::{from_f64, BFloat};

/// Tolerance for parallelism and degeneracy in ray-plane intersection.
const PLANE_INTERSECTION_EPSILON: f64 = 1e-10;

/// Tolerance for parallelism in 2D ray-ray intersection.
const RAY_INTERSECTION_EPSILON: f64 = 1e-6;

/// Outcome of intersecting a ray with the plane of a triangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RayPlaneIntersection<F: BFloat> {
    /// The ray hits the plane at the given point, the given distance ahead of its origin.
    Hit { point: Point3<F>, distance: F },
    /// The ray points away from the plane, runs parallel to it, or is invalid.
    Miss,
    /// The ray lies in the plane.
    Coplanar,
    /// The triangle spanning the plane has (close to) zero area.
    DegenerateTriangle,
}

/// A 3D ray with a unit direction.
#[derive(Clone, Debug, PartialEq)]
pub struct Ray3<F: BFloat> {
    origin: Point3<F>,
    direction: Vec3<F>,
    valid: bool,
}

impl<F: BFloat> Ray3<F> {
    /// Creates a new ray with the given origin and (not necessarily normalized) direction.
    ///
    /// A zero direction yields an invalid ray, which never intersects anything.
    pub fn new(origin: Point3<F>, direction: Vec3<F>) -> Self {
        match direction.normalized() {
            Some(direction) => Self {
                origin,
                direction,
                valid: true,
            },
            None => Self {
                origin,
                direction: Vec3::zero(),
                valid: false,
            },
        }
    }

    pub fn origin(&self) -> &Point3<F> {
        &self.origin
    }

    pub fn direction(&self) -> &Vec3<F> {
        &self.direction
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Intersects the ray with the plane of the triangle `(v0, v1, v2)`.
    pub fn intersect_plane(
        &self,
        v0: &Point3<F>,
        v1: &Point3<F>,
        v2: &Point3<F>,
    ) -> RayPlaneIntersection<F> {
        if !self.valid {
            return RayPlaneIntersection::Miss;
        }
        let eps = from_f64::<F>(PLANE_INTERSECTION_EPSILON);

        let normal = (v1 - v0).cross(&(v2 - v0));
        if normal.length() < eps {
            return RayPlaneIntersection::DegenerateTriangle;
        }

        let a = -normal.dot(&(&self.origin - v0));
        let b = normal.dot(&self.direction);

        if num::Float::abs(b) < eps {
            return if num::Float::abs(a) < eps {
                RayPlaneIntersection::Coplanar
            } else {
                RayPlaneIntersection::Miss
            };
        }

        let mut distance = a / b;
        if num::Float::abs(distance) < eps {
            distance = F::zero();
        }
        if distance < F::zero() {
            return RayPlaneIntersection::Miss;
        }

        RayPlaneIntersection::Hit {
            point: &self.origin + &(&self.direction * distance),
            distance,
        }
    }
}

/// Where two 2D rays meet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayIntersection2<F: BFloat> {
    /// The intersection point.
    pub point: Point2<F>,
    /// Distance from the origin of the first ray to the intersection point.
    pub distance: F,
    /// Distance from the origin of the second ray to the intersection point.
    pub other_distance: F,
}

/// A 2D ray with a unit direction.
#[derive(Clone, Debug, PartialEq)]
pub struct Ray2<F: BFloat> {
    origin: Point2<F>,
    direction: Vec2<F>,
    valid: bool,
}

impl<F: BFloat> Ray2<F> {
    /// Creates a new ray with the given origin and (not necessarily normalized) direction.
    ///
    /// A zero direction yields an invalid ray, which never intersects anything.
    pub fn new(origin: Point2<F>, direction: Vec2<F>) -> Self {
        match direction.normalized() {
            Some(direction) => Self {
                origin,
                direction,
                valid: true,
            },
            None => Self {
                origin,
                direction: Vec2::zero(),
                valid: false,
            },
        }
    }

    pub fn origin(&self) -> &Point2<F> {
        &self.origin
    }

    pub fn direction(&self) -> &Vec2<F> {
        &self.direction
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Finds where this ray meets the given ray, if both reach the
    /// intersection point moving forward from their origins.
    ///
    /// Returns `None` for parallel or invalid rays.
    pub fn intersect_ray(&self, other: &Self) -> Option<RayIntersection2<F>> {
        if !self.valid || !other.valid {
            return None;
        }
        let eps = from_f64::<F>(RAY_INTERSECTION_EPSILON);

        let (e, f) = (self.direction[Dim2::X], self.direction[Dim2::Y]);
        let (g, h) = (other.direction[Dim2::X], other.direction[Dim2::Y]);
        let determinant = g * f - e * h;
        if num::Float::abs(determinant) < eps {
            return None;
        }

        let (a, b) = (self.origin[Dim2::X], self.origin[Dim2::Y]);
        let (c, d) = (other.origin[Dim2::X], other.origin[Dim2::Y]);
        let other_distance = (e * (d - b) + f * (a - c)) / determinant;
        let distance = if num::Float::abs(e) > eps {
            (c + other_distance * g - a) / e
        } else {
            (d + other_distance * h - b) / f
        };

        if distance < F::zero() || other_distance < F::zero() {
            return None;
        }

        Some(RayIntersection2 {
            point: Point2::new(a + distance * e, b + distance * f),
            distance,
            other_distance,
        })
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_abs_diff_eq;

    fn triangle() -> [Point3<f64>; 3] {
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn rays_without_direction_are_invalid() {
        let [v0, v1, v2] = triangle();
        let ray = Ray3::new(Point3::new(0.0, 0.0, 1.0), Vec3::zero());
        assert!(!ray.is_valid());
        assert_eq!(ray.intersect_plane(&v0, &v1, &v2), RayPlaneIntersection::Miss);

        let flat = Ray2::new(Point2::origin(), Vec2::zero());
        let other = Ray2::new(Point2::new(1.0, -1.0), Vec2::new(0.0, 1.0));
        assert!(flat.intersect_ray(&other).is_none());
        assert!(other.intersect_ray(&flat).is_none());
    }

    #[test]
    fn ray_hits_plane_ahead_of_origin() {
        let [v0, v1, v2] = triangle();
        let ray = Ray3::new(Point3::new(0.25, 0.25, 2.0), Vec3::new(0.0, 0.0, -3.0));
        match ray.intersect_plane(&v0, &v1, &v2) {
            RayPlaneIntersection::Hit { point, distance } => {
                assert_abs_diff_eq!(point, Point3::new(0.25, 0.25, 0.0), epsilon = 1e-12);
                assert_abs_diff_eq!(distance, 2.0, epsilon = 1e-12);
            }
            other => panic!("Expected a hit, got {:?}", other),
        }

        let away = Ray3::new(Point3::new(0.25, 0.25, 2.0), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(away.intersect_plane(&v0, &v1, &v2), RayPlaneIntersection::Miss);
    }

    #[test]
    fn parallel_rays_are_told_apart_from_coplanar_rays() {
        let [v0, v1, v2] = triangle();
        let in_plane = Ray3::new(Point3::new(0.5, 0.5, 0.0), Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(
            in_plane.intersect_plane(&v0, &v1, &v2),
            RayPlaneIntersection::Coplanar
        );
        let above = Ray3::new(Point3::new(0.5, 0.5, 1.0), Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(above.intersect_plane(&v0, &v1, &v2), RayPlaneIntersection::Miss);
    }

    #[test]
    fn degenerate_triangles_are_reported() {
        let ray = Ray3::new(Point3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0));
        let p = Point3::new(0.0, 0.0, 0.0);
        let q = Point3::new(1.0, 1.0, 0.0);
        let r = Point3::new(2.0, 2.0, 0.0);
        assert_eq!(
            ray.intersect_plane(&p, &q, &r),
            RayPlaneIntersection::DegenerateTriangle
        );
    }

    #[test]
    fn parallel_2d_rays_do_not_intersect() {
        let first = Ray2::new(Point2::new(0.0, 0.0), Vec2::new(0.0, 1.0));
        let second = Ray2::new(Point2::new(1.0, 0.0), Vec2::new(0.0, 1.0));
        assert!(first.intersect_ray(&second).is_none());
    }

    #[test]
    fn crossing_2d_rays_report_both_distances() {
        let first = Ray2::new(Point2::new(0.0, 0.0), Vec2::new(2.0, 0.0));
        let second = Ray2::new(Point2::new(1.0, -1.0), Vec2::new(0.0, 1.0));
        let intersection = first.intersect_ray(&second).unwrap();
        assert_abs_diff_eq!(intersection.point, Point2::new(1.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(intersection.distance, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(intersection.other_distance, 1.0, epsilon = 1e-12);

        let diagonal = Ray2::new(Point2::new(0.0, 2.0), Vec2::new(1.0, -1.0));
        let intersection = second.intersect_ray(&diagonal).unwrap();
        assert_abs_diff_eq!(intersection.point, Point2::new(1.0, 1.0), epsilon = 1e-12);
        assert_abs_diff_eq!(intersection.distance, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(intersection.other_distance, 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn intersections_behind_either_origin_are_rejected() {
        let first = Ray2::new(Point2::new(0.0, 0.0), Vec2::new(-1.0, 0.0));
        let second = Ray2::new(Point2::new(1.0, -1.0), Vec2::new(0.0, 1.0));
        assert!(first.intersect_ray(&second).is_none());
        let backwards = Ray2::new(Point2::new(1.0, 1.0), Vec2::new(0.0, 1.0));
        let forward = Ray2::new(Point2::new(0.0, 0.0), Vec2::new(1.0, 0.0));
        assert!(forward.intersect_ray(&backwards).is_none());
    }
}
