//! Geometric utility objects.

pub mod plane;
pub mod ray;

use crate::{
    error::{Result, TracingError},
    num::BFloat,
};
use std::{
    fmt,
    ops::{Add, Index, IndexMut, Mul, Neg, Sub},
};

#[cfg(feature = "serialization")]
use serde::Serialize;

#[cfg(any(test, feature = "for-testing"))]
use approx::{AbsDiffEq, RelativeEq};

/// Denotes the x-, y- or z-dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dim3 {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Dim3 {
    /// Creates an array for iterating over the x-, y- and z-dimensions.
    pub fn slice() -> [Self; 3] {
        [Self::X, Self::Y, Self::Z]
    }

    /// Creates an array for iterating over all three dimensions except the given one.
    pub fn slice_except(dim: Self) -> [Self; 2] {
        match dim {
            Self::X => [Self::Y, Self::Z],
            Self::Y => [Self::X, Self::Z],
            Self::Z => [Self::X, Self::Y],
        }
    }

    /// Returns the number of the dimension.
    pub fn num(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Dim3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::X => "x",
                Self::Y => "y",
                Self::Z => "z",
            }
        )
    }
}

use Dim3::{X, Y, Z};

/// Denotes the x- or y-dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dim2 {
    X = 0,
    Y = 1,
}

impl Dim2 {
    /// Creates an array for iterating over the x- and y-dimensions.
    pub fn slice() -> [Self; 2] {
        [Self::X, Self::Y]
    }

    /// Returns the number of the dimension.
    pub fn num(self) -> usize {
        self as usize
    }
}

/// Represents any quantity with three dimensional components.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct In3D<T>([T; 3]);

impl<T> In3D<T> {
    /// Creates a new 3D quantity given the three components.
    pub fn new(x: T, y: T, z: T) -> Self {
        Self([x, y, z])
    }

    /// Creates a new 3D quantity by evaluating the given component
    /// constructor for each dimension.
    pub fn with_each_component<C>(create_component: C) -> Self
    where
        C: Fn(Dim3) -> T,
    {
        Self::new(
            create_component(X),
            create_component(Y),
            create_component(Z),
        )
    }

    /// Creates a new 3D quantity with the given value copied into all components.
    pub fn same(a: T) -> Self
    where
        T: Copy,
    {
        Self([a, a, a])
    }
}

impl<T> Index<Dim3> for In3D<T> {
    type Output = T;
    fn index(&self, dim: Dim3) -> &Self::Output {
        &self.0[dim as usize]
    }
}

impl<T> IndexMut<Dim3> for In3D<T> {
    fn index_mut(&mut self, dim: Dim3) -> &mut Self::Output {
        &mut self.0[dim as usize]
    }
}

/// Represents any quantity with two dimensional components.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct In2D<T>([T; 2]);

impl<T> In2D<T> {
    /// Creates a new 2D quantity given the two components.
    pub fn new(x: T, y: T) -> Self {
        Self([x, y])
    }

    /// Creates a new 2D quantity with the given value copied into both components.
    pub fn same(a: T) -> Self
    where
        T: Copy,
    {
        Self([a, a])
    }
}

impl<T> Index<Dim2> for In2D<T> {
    type Output = T;
    fn index(&self, dim: Dim2) -> &Self::Output {
        &self.0[dim as usize]
    }
}

impl<T> IndexMut<Dim2> for In2D<T> {
    fn index_mut(&mut self, dim: Dim2) -> &mut Self::Output {
        &mut self.0[dim as usize]
    }
}

#[cfg(any(test, feature = "for-testing"))]
macro_rules! impl_approx_eq {
    ($T:ident, [$($dim:expr),+]) => {
        impl<F> AbsDiffEq for $T<F>
        where
            F: BFloat + AbsDiffEq,
            F::Epsilon: Copy,
        {
            type Epsilon = F::Epsilon;

            fn default_epsilon() -> Self::Epsilon {
                F::default_epsilon()
            }

            fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
                $( F::abs_diff_eq(&self[$dim], &other[$dim], epsilon) )&&+
            }
        }

        impl<F> RelativeEq for $T<F>
        where
            F: BFloat + RelativeEq,
            F::Epsilon: Copy,
        {
            fn default_max_relative() -> Self::Epsilon {
                F::default_max_relative()
            }

            fn relative_eq(
                &self,
                other: &Self,
                epsilon: Self::Epsilon,
                max_relative: Self::Epsilon,
            ) -> bool {
                $( F::relative_eq(&self[$dim], &other[$dim], epsilon, max_relative) )&&+
            }
        }
    };
}

/// A 3D vector.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct Vec3<F>(In3D<F>);

impl<F: BFloat> Vec3<F> {
    /// Creates a new 3D vector given the three components.
    pub fn new(x: F, y: F, z: F) -> Self {
        Self(In3D::new(x, y, z))
    }

    /// Creates a new 3D vector by evaluating the given component
    /// constructor for each dimension.
    pub fn with_each_component<C>(create_component: C) -> Self
    where
        C: Fn(Dim3) -> F,
    {
        Self(In3D::with_each_component(create_component))
    }

    /// Creates a new 3D vector from the first three values of the given slice.
    pub fn from_slice(values: &[F]) -> Self {
        Self::new(values[0], values[1], values[2])
    }

    /// Creates a new zero vector.
    pub fn zero() -> Self {
        Self::new(F::zero(), F::zero(), F::zero())
    }

    /// Constructs a new point from the vector components.
    pub fn to_point3(&self) -> Point3<F> {
        Point3(self.0)
    }

    /// Computes the squared length of the vector.
    pub fn squared_length(&self) -> F {
        self[X] * self[X] + self[Y] * self[Y] + self[Z] * self[Z]
    }

    /// Computes the length of the vector.
    pub fn length(&self) -> F {
        self.squared_length().sqrt()
    }

    /// Whether the vector is the zero vector.
    pub fn is_zero(&self) -> bool {
        self[X] == F::zero() && self[Y] == F::zero() && self[Z] == F::zero()
    }

    /// Computes the dot product of the vector with another vector.
    pub fn dot(&self, other: &Self) -> F {
        self[X] * other[X] + self[Y] * other[Y] + self[Z] * other[Z]
    }

    /// Computes the cross product of the vector with another vector.
    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self[Y] * other[Z] - self[Z] * other[Y],
            self[Z] * other[X] - self[X] * other[Z],
            self[X] * other[Y] - self[Y] * other[X],
        )
    }

    /// Returns a unit vector with the same direction, or `None` for a zero
    /// (or non-finite) length vector.
    pub fn normalized(&self) -> Option<Self> {
        let length = self.length();
        if length == F::zero() || !length.is_finite() {
            None
        } else {
            Some(self * length.recip())
        }
    }

    /// Reverses the direction of the vector.
    pub fn reverse(&mut self) {
        self[X] = -self[X];
        self[Y] = -self[Y];
        self[Z] = -self[Z];
    }

    /// Determines the maximum component value for the vector.
    pub fn max(&self) -> F {
        F::max(self[X], F::max(self[Y], self[Z]))
    }
}

impl<F: BFloat> Index<Dim3> for Vec3<F> {
    type Output = F;
    fn index(&self, dim: Dim3) -> &Self::Output {
        &self.0[dim]
    }
}

impl<F: BFloat> IndexMut<Dim3> for Vec3<F> {
    fn index_mut(&mut self, dim: Dim3) -> &mut Self::Output {
        &mut self.0[dim]
    }
}

impl<F: BFloat> Add<&Vec3<F>> for &Vec3<F> {
    type Output = Vec3<F>;
    fn add(self, other: &Vec3<F>) -> Self::Output {
        Self::Output::new(self[X] + other[X], self[Y] + other[Y], self[Z] + other[Z])
    }
}

impl<F: BFloat> Add<Vec3<F>> for Vec3<F> {
    type Output = Self;
    fn add(self, other: Self) -> Self::Output {
        &self + &other
    }
}

impl<F: BFloat> Sub<&Vec3<F>> for &Vec3<F> {
    type Output = Vec3<F>;
    fn sub(self, other: &Vec3<F>) -> Self::Output {
        Self::Output::new(self[X] - other[X], self[Y] - other[Y], self[Z] - other[Z])
    }
}

impl<F: BFloat> Sub<Vec3<F>> for Vec3<F> {
    type Output = Self;
    fn sub(self, other: Self) -> Self::Output {
        &self - &other
    }
}

impl<F: BFloat> Mul<F> for &Vec3<F> {
    type Output = Vec3<F>;
    fn mul(self, factor: F) -> Self::Output {
        Self::Output::new(factor * self[X], factor * self[Y], factor * self[Z])
    }
}

impl<F: BFloat> Mul<F> for Vec3<F> {
    type Output = Self;
    fn mul(self, factor: F) -> Self::Output {
        &self * factor
    }
}

impl<F: BFloat> Neg for Vec3<F> {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self::new(-self[X], -self[Y], -self[Z])
    }
}

impl<F: BFloat + fmt::Display> fmt::Display for Vec3<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self[X], self[Y], self[Z])
    }
}

#[cfg(any(test, feature = "for-testing"))]
impl_approx_eq!(Vec3, [X, Y, Z]);

/// A 2D vector.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct Vec2<F>(In2D<F>);

impl<F: BFloat> Vec2<F> {
    /// Creates a new 2D vector given the two components.
    pub fn new(x: F, y: F) -> Self {
        Self(In2D::new(x, y))
    }

    /// Creates a new zero vector.
    pub fn zero() -> Self {
        Self::new(F::zero(), F::zero())
    }

    /// Computes the squared length of the vector.
    pub fn squared_length(&self) -> F {
        self[Dim2::X] * self[Dim2::X] + self[Dim2::Y] * self[Dim2::Y]
    }

    /// Computes the length of the vector.
    pub fn length(&self) -> F {
        self.squared_length().sqrt()
    }

    /// Whether the vector is the zero vector.
    pub fn is_zero(&self) -> bool {
        self[Dim2::X] == F::zero() && self[Dim2::Y] == F::zero()
    }

    /// Computes the dot product of the vector with another vector.
    pub fn dot(&self, other: &Self) -> F {
        self[Dim2::X] * other[Dim2::X] + self[Dim2::Y] * other[Dim2::Y]
    }

    /// Returns a unit vector with the same direction, or `None` for a zero
    /// (or non-finite) length vector.
    pub fn normalized(&self) -> Option<Self> {
        let length = self.length();
        if length == F::zero() || !length.is_finite() {
            None
        } else {
            Some(self * length.recip())
        }
    }

    /// Reverses the direction of the vector.
    pub fn reverse(&mut self) {
        self[Dim2::X] = -self[Dim2::X];
        self[Dim2::Y] = -self[Dim2::Y];
    }
}

impl<F: BFloat> Index<Dim2> for Vec2<F> {
    type Output = F;
    fn index(&self, dim: Dim2) -> &Self::Output {
        &self.0[dim]
    }
}

impl<F: BFloat> IndexMut<Dim2> for Vec2<F> {
    fn index_mut(&mut self, dim: Dim2) -> &mut Self::Output {
        &mut self.0[dim]
    }
}

impl<F: BFloat> Add<&Vec2<F>> for &Vec2<F> {
    type Output = Vec2<F>;
    fn add(self, other: &Vec2<F>) -> Self::Output {
        Self::Output::new(self[Dim2::X] + other[Dim2::X], self[Dim2::Y] + other[Dim2::Y])
    }
}

impl<F: BFloat> Add<Vec2<F>> for Vec2<F> {
    type Output = Self;
    fn add(self, other: Self) -> Self::Output {
        &self + &other
    }
}

impl<F: BFloat> Mul<F> for &Vec2<F> {
    type Output = Vec2<F>;
    fn mul(self, factor: F) -> Self::Output {
        Self::Output::new(factor * self[Dim2::X], factor * self[Dim2::Y])
    }
}

impl<F: BFloat> Mul<F> for Vec2<F> {
    type Output = Self;
    fn mul(self, factor: F) -> Self::Output {
        &self * factor
    }
}

impl<F: BFloat> Neg for Vec2<F> {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self::new(-self[Dim2::X], -self[Dim2::Y])
    }
}

#[cfg(any(test, feature = "for-testing"))]
impl_approx_eq!(Vec2, [Dim2::X, Dim2::Y]);

/// A 3D spatial coordinate.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct Point3<F>(In3D<F>);

impl<F: BFloat> Point3<F> {
    /// Creates a new 3D point given the three components.
    pub fn new(x: F, y: F, z: F) -> Self {
        Self(In3D::new(x, y, z))
    }

    /// Creates a new 3D point by evaluating the given component
    /// constructor for each dimension.
    pub fn with_each_component<C>(create_component: C) -> Self
    where
        C: Fn(Dim3) -> F,
    {
        Self(In3D::with_each_component(create_component))
    }

    /// Creates a new 3D point from the first three values of the given slice.
    pub fn from_slice(values: &[F]) -> Self {
        Self::new(values[0], values[1], values[2])
    }

    /// Creates a new point at the origin.
    pub fn origin() -> Self {
        Self::new(F::zero(), F::zero(), F::zero())
    }

    /// Constructs a new vector from the point components.
    pub fn to_vec3(&self) -> Vec3<F> {
        Vec3(self.0)
    }

    /// Computes the distance to another point.
    pub fn distance_to(&self, other: &Self) -> F {
        (other - self).length()
    }

    /// Returns the components as an array.
    pub fn to_array(&self) -> [F; 3] {
        self.0 .0
    }
}

impl<F: BFloat> Index<Dim3> for Point3<F> {
    type Output = F;
    fn index(&self, dim: Dim3) -> &Self::Output {
        &self.0[dim]
    }
}

impl<F: BFloat> IndexMut<Dim3> for Point3<F> {
    fn index_mut(&mut self, dim: Dim3) -> &mut Self::Output {
        &mut self.0[dim]
    }
}

impl<F: BFloat> Sub<&Point3<F>> for &Point3<F> {
    type Output = Vec3<F>;
    fn sub(self, other: &Point3<F>) -> Self::Output {
        Self::Output::new(self[X] - other[X], self[Y] - other[Y], self[Z] - other[Z])
    }
}

impl<F: BFloat> Sub<Point3<F>> for Point3<F> {
    type Output = Vec3<F>;
    fn sub(self, other: Self) -> Self::Output {
        &self - &other
    }
}

impl<F: BFloat> Add<&Vec3<F>> for &Point3<F> {
    type Output = Point3<F>;
    fn add(self, vector: &Vec3<F>) -> Self::Output {
        Self::Output::new(
            self[X] + vector[X],
            self[Y] + vector[Y],
            self[Z] + vector[Z],
        )
    }
}

impl<F: BFloat> Add<Vec3<F>> for Point3<F> {
    type Output = Self;
    fn add(self, vector: Vec3<F>) -> Self::Output {
        &self + &vector
    }
}

impl<F: BFloat> Sub<Vec3<F>> for Point3<F> {
    type Output = Self;
    fn sub(self, vector: Vec3<F>) -> Self::Output {
        self + (-vector)
    }
}

impl<F: BFloat + fmt::Display> fmt::Display for Point3<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self[X], self[Y], self[Z])
    }
}

#[cfg(any(test, feature = "for-testing"))]
impl_approx_eq!(Point3, [X, Y, Z]);

/// A 2D spatial coordinate.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct Point2<F>(In2D<F>);

impl<F: BFloat> Point2<F> {
    /// Creates a new 2D point given the two components.
    pub fn new(x: F, y: F) -> Self {
        Self(In2D::new(x, y))
    }

    /// Creates a new point at the origin.
    pub fn origin() -> Self {
        Self::new(F::zero(), F::zero())
    }

    /// Constructs a new vector from the point components.
    pub fn to_vec2(&self) -> Vec2<F> {
        Vec2(self.0)
    }
}

impl<F: BFloat> Index<Dim2> for Point2<F> {
    type Output = F;
    fn index(&self, dim: Dim2) -> &Self::Output {
        &self.0[dim]
    }
}

impl<F: BFloat> IndexMut<Dim2> for Point2<F> {
    fn index_mut(&mut self, dim: Dim2) -> &mut Self::Output {
        &mut self.0[dim]
    }
}

impl<F: BFloat> Sub<&Point2<F>> for &Point2<F> {
    type Output = Vec2<F>;
    fn sub(self, other: &Point2<F>) -> Self::Output {
        Self::Output::new(self[Dim2::X] - other[Dim2::X], self[Dim2::Y] - other[Dim2::Y])
    }
}

impl<F: BFloat> Sub<Point2<F>> for Point2<F> {
    type Output = Vec2<F>;
    fn sub(self, other: Self) -> Self::Output {
        &self - &other
    }
}

impl<F: BFloat> Add<&Vec2<F>> for &Point2<F> {
    type Output = Point2<F>;
    fn add(self, vector: &Vec2<F>) -> Self::Output {
        Self::Output::new(self[Dim2::X] + vector[Dim2::X], self[Dim2::Y] + vector[Dim2::Y])
    }
}

impl<F: BFloat> Add<Vec2<F>> for Point2<F> {
    type Output = Self;
    fn add(self, vector: Vec2<F>) -> Self::Output {
        &self + &vector
    }
}

#[cfg(any(test, feature = "for-testing"))]
impl_approx_eq!(Point2, [Dim2::X, Dim2::Y]);

/// An axis-aligned box in 3D.
///
/// The lower bound never exceeds the upper bound along any axis.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct BoundingBox3<F> {
    lower: Point3<F>,
    upper: Point3<F>,
}

impl<F: BFloat + fmt::Display> BoundingBox3<F> {
    /// Creates a new bounding box from its lower and upper corners.
    ///
    /// Fails with `TracingError::InvalidBounds` if any lower bound exceeds the
    /// corresponding upper bound (or is not a number).
    pub fn new(lower: Point3<F>, upper: Point3<F>) -> Result<Self> {
        for dim in Dim3::slice() {
            if !(lower[dim] <= upper[dim]) {
                return Err(TracingError::InvalidBounds(format!(
                    "lower {} bound {} exceeds upper bound {}",
                    dim, lower[dim], upper[dim]
                )));
            }
        }
        Ok(Self { lower, upper })
    }

    /// Creates a new bounding box from `[min_x, min_y, min_z, max_x, max_y, max_z]`.
    pub fn from_array(bounds: [F; 6]) -> Result<Self> {
        Self::new(
            Point3::new(bounds[0], bounds[1], bounds[2]),
            Point3::new(bounds[3], bounds[4], bounds[5]),
        )
    }
}

impl<F: BFloat> BoundingBox3<F> {
    /// Creates the smallest bounding box enclosing the given points,
    /// or `None` if there are no points.
    pub fn enclosing<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3<F>>,
        F: 'a,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (lower, upper) = points.fold((*first, *first), |(mut lower, mut upper), point| {
            for dim in Dim3::slice() {
                lower[dim] = F::min(lower[dim], point[dim]);
                upper[dim] = F::max(upper[dim], point[dim]);
            }
            (lower, upper)
        });
        Some(Self { lower, upper })
    }

    /// Creates a cube with the given half width centered on the given point.
    pub fn around(center: &Point3<F>, half_width: F) -> Self {
        let half_width = num::Float::abs(half_width);
        Self {
            lower: Point3::with_each_component(|dim| center[dim] - half_width),
            upper: Point3::with_each_component(|dim| center[dim] + half_width),
        }
    }

    /// Returns a reference to the lower corner.
    pub fn lower(&self) -> &Point3<F> {
        &self.lower
    }

    /// Returns a reference to the upper corner.
    pub fn upper(&self) -> &Point3<F> {
        &self.upper
    }

    /// Returns the bounds as `[min_x, min_y, min_z, max_x, max_y, max_z]`.
    pub fn to_array(&self) -> [F; 6] {
        [
            self.lower[X],
            self.lower[Y],
            self.lower[Z],
            self.upper[X],
            self.upper[Y],
            self.upper[Z],
        ]
    }

    /// Computes the extent of the box along each axis.
    pub fn extent(&self) -> Vec3<F> {
        &self.upper - &self.lower
    }

    /// Computes the largest extent of the box.
    pub fn max_extent(&self) -> F {
        self.extent().max()
    }

    /// Computes the center of the box.
    pub fn center(&self) -> Point3<F> {
        let half = F::one() / (F::one() + F::one());
        Point3::with_each_component(|dim| (self.lower[dim] + self.upper[dim]) * half)
    }

    /// Whether the given point lies inside the box or on its boundary.
    pub fn contains(&self, point: &Point3<F>) -> bool {
        self.contains_with_tolerance(point, F::zero())
    }

    /// Whether the given point lies inside the box grown by the given tolerance on every side.
    pub fn contains_with_tolerance(&self, point: &Point3<F>, tolerance: F) -> bool {
        Dim3::slice().iter().all(|&dim| {
            point[dim] >= self.lower[dim] - tolerance && point[dim] <= self.upper[dim] + tolerance
        })
    }

    /// Whether the given box lies entirely inside this box.
    pub fn contains_box(&self, other: &Self) -> bool {
        self.contains(&other.lower) && self.contains(&other.upper)
    }

    /// Whether the given box overlaps this box (touching counts as overlapping).
    pub fn intersects(&self, other: &Self) -> bool {
        Dim3::slice().iter().all(|&dim| {
            self.lower[dim] <= other.upper[dim] && other.lower[dim] <= self.upper[dim]
        })
    }

    /// Computes the overlap with the given box, or `None` if the boxes are disjoint.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }
        Some(Self {
            lower: Point3::with_each_component(|dim| F::max(self.lower[dim], other.lower[dim])),
            upper: Point3::with_each_component(|dim| F::min(self.upper[dim], other.upper[dim])),
        })
    }

    /// Returns a copy scaled by the given factor about the box center.
    pub fn scaled(&self, factor: F) -> Self {
        let center = self.center();
        let half = F::one() / (F::one() + F::one());
        let half_extent = self.extent() * (half * num::Float::abs(factor));
        Self {
            lower: center - half_extent,
            upper: center + half_extent,
        }
    }

    /// Returns a copy grown by the given amount on every side.
    pub fn inflated(&self, amount: F) -> Self {
        let amount = Vec3::with_each_component(|_| num::Float::abs(amount));
        Self {
            lower: self.lower - amount,
            upper: self.upper + amount,
        }
    }

    /// Computes the index of the octant holding the given point.
    ///
    /// Bit 0, 1 and 2 of the index are set when the point lies above the
    /// center along x, y and z respectively. Points on a center plane belong
    /// to the lower octant.
    pub fn octant_index(&self, point: &Point3<F>) -> usize {
        let center = self.center();
        Dim3::slice().iter().fold(0, |index, &dim| {
            if point[dim] > center[dim] {
                index | (1 << dim.num())
            } else {
                index
            }
        })
    }

    /// Returns the octant with the given index (see `octant_index`).
    pub fn octant(&self, index: usize) -> Self {
        let center = self.center();
        let mut lower = self.lower;
        let mut upper = self.upper;
        for dim in Dim3::slice() {
            if index & (1 << dim.num()) != 0 {
                lower[dim] = center[dim];
            } else {
                upper[dim] = center[dim];
            }
        }
        Self { lower, upper }
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn cross_product_is_right_handed() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        let y = Vec3::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(&y), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(y.cross(&x), Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn zero_vectors_cannot_be_normalized() {
        assert!(Vec3::<f64>::zero().normalized().is_none());
        assert!(Vec2::<f64>::zero().normalized().is_none());
        assert_abs_diff_eq!(
            Vec3::new(3.0, 0.0, 4.0).normalized().unwrap(),
            Vec3::new(0.6, 0.0, 0.8),
            epsilon = 1e-15
        );
    }

    #[test]
    fn point_and_vector_arithmetic_is_consistent() {
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(-1.0, 0.5, 2.0);
        let displacement = b - a;
        assert_eq!(a + displacement, b);
        assert_abs_diff_eq!(a.distance_to(&b), displacement.length());
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        assert!(BoundingBox3::from_array([0.0, 0.0, 0.0, 1.0, 1.0, 1.0]).is_ok());
        assert!(matches!(
            BoundingBox3::from_array([0.0, 2.0, 0.0, 1.0, 1.0, 1.0]),
            Err(TracingError::InvalidBounds(_))
        ));
        assert!(BoundingBox3::from_array([f64::NAN, 0.0, 0.0, 1.0, 1.0, 1.0]).is_err());
    }

    #[test]
    fn containment_tolerance_extends_every_face() {
        let bounds = BoundingBox3::from_array([-1.0, -1.0, -1.0, 1.0, 1.0, 1.0]).unwrap();
        assert!(bounds.contains(&Point3::new(1.0, 0.0, -1.0)));
        assert!(!bounds.contains(&Point3::new(1.0 + 1e-9, 0.0, 0.0)));
        assert!(bounds.contains_with_tolerance(&Point3::new(1.0 + 1e-9, 0.0, 0.0), 1e-7));
        assert!(!bounds.contains_with_tolerance(&Point3::new(0.0, -1.5, 0.0), 1e-7));
    }

    #[test]
    fn scaling_and_inflation_preserve_the_center() {
        let bounds = BoundingBox3::from_array([0.0, 0.0, 0.0, 2.0, 4.0, 6.0]).unwrap();
        let scaled = bounds.scaled(1.5);
        assert_abs_diff_eq!(scaled.center(), bounds.center(), epsilon = 1e-12);
        assert_abs_diff_eq!(scaled.extent(), Vec3::new(3.0, 6.0, 9.0), epsilon = 1e-12);
        let inflated = bounds.inflated(0.5);
        assert_abs_diff_eq!(inflated.extent(), Vec3::new(3.0, 5.0, 7.0), epsilon = 1e-12);
        assert_abs_diff_eq!(bounds.max_extent(), 6.0);
    }

    #[test]
    fn negative_widths_act_like_positive_ones_in_single_precision() {
        let cube = BoundingBox3::around(&Point3::new(1.0_f32, 1.0, 1.0), -0.5);
        assert_eq!(cube.to_array(), [0.5, 0.5, 0.5, 1.5, 1.5, 1.5]);
        assert_eq!(cube.scaled(-2.0).to_array(), [0.0, 0.0, 0.0, 2.0, 2.0, 2.0]);
        assert_eq!(cube.inflated(-0.5).to_array(), [0.0, 0.0, 0.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn box_overlap_is_computed() {
        let a = BoundingBox3::from_array([0.0, 0.0, 0.0, 2.0, 2.0, 2.0]).unwrap();
        let b = BoundingBox3::from_array([1.0, 1.0, 1.0, 3.0, 3.0, 3.0]).unwrap();
        let c = BoundingBox3::from_array([5.0, 5.0, 5.0, 6.0, 6.0, 6.0]).unwrap();
        assert_eq!(
            a.intersection(&b),
            Some(BoundingBox3::from_array([1.0, 1.0, 1.0, 2.0, 2.0, 2.0]).unwrap())
        );
        assert!(a.intersection(&c).is_none());
        assert!(!a.contains_box(&b));
        assert!(a.scaled(2.0).contains_box(&b));
    }

    #[test]
    fn octants_tile_the_box() {
        let bounds = BoundingBox3::from_array([0.0, 0.0, 0.0, 2.0, 2.0, 2.0]).unwrap();
        let point = Point3::new(1.5, 0.5, 1.0);
        let index = bounds.octant_index(&point);
        assert_eq!(index, 1);
        assert!(bounds.octant(index).contains(&point));
        assert_eq!(
            bounds.octant(7),
            BoundingBox3::from_array([1.0, 1.0, 1.0, 2.0, 2.0, 2.0]).unwrap()
        );
    }

    #[test]
    fn enclosing_box_spans_all_points() {
        let points = [
            Point3::new(0.0, 1.0, -2.0),
            Point3::new(3.0, -1.0, 0.0),
            Point3::new(1.0, 0.0, 5.0),
        ];
        let bounds = BoundingBox3::enclosing(&points).unwrap();
        assert_eq!(bounds.to_array(), [0.0, -1.0, -2.0, 3.0, 1.0, 5.0]);
        assert!(BoundingBox3::<f64>::enclosing(&[]).is_none());
    }
}
