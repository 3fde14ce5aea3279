//! Generation of seed points in an axis-aligned slice through a bounding box.

use super::Seeder3;
use crate::{
    geometry::{
        BoundingBox3, Dim2,
        Dim3::{self, X, Y, Z},
        In2D, Point2, Point3,
    },
    tracing::ftr,
};
use rand::{distributions::Uniform, Rng};
use std::vec;

/// Generator for seed points in a 2D slice of a 3D bounding box.
#[derive(Clone, Debug)]
pub struct SliceSeeder3 {
    seed_points: Vec<Point3<ftr>>,
}

impl SliceSeeder3 {
    /// Creates a new seeder producing regularly spaced seed points in a 2D slice of a bounding box.
    ///
    /// The slice is divided into `shape` equal cells and a seed point is placed at each cell center.
    ///
    /// # Parameters
    ///
    /// - `bounds`: Bounding box to slice through.
    /// - `axis`: Axis to slice across.
    /// - `coord`: Coordinate of the slice along `axis`.
    /// - `shape`: Number of seed points to generate in each direction.
    /// - `satisfies_constraints`: Closure taking a potential seed point and returning whether the point is accepted.
    ///
    /// # Returns
    ///
    /// A new `SliceSeeder3`.
    ///
    /// # Type parameters
    ///
    /// - `S`: Function type taking a reference to a 2D point and returning a boolean value.
    pub fn regular<S>(
        bounds: &BoundingBox3<ftr>,
        axis: Dim3,
        coord: ftr,
        shape: In2D<usize>,
        satisfies_constraints: &S,
    ) -> Self
    where
        S: Fn(&Point2<ftr>) -> bool,
    {
        let slice_centers = Self::slice_cell_centers(bounds, axis, shape);
        SliceSeeder3 {
            seed_points: Self::construct_seed_points_from_slice_points(
                slice_centers,
                axis,
                coord,
                satisfies_constraints,
            ),
        }
    }

    /// Creates a new seeder producing uniformly random seed points in a 2D slice of a bounding box.
    ///
    /// # Parameters
    ///
    /// - `bounds`: Bounding box to slice through.
    /// - `axis`: Axis to slice across.
    /// - `coord`: Coordinate of the slice along `axis`.
    /// - `n_seeds`: Number of seed points to generate.
    /// - `rng`: Random number generator to draw positions with.
    /// - `satisfies_constraints`: Closure taking a potential seed point and returning whether the point is accepted.
    ///
    /// # Returns
    ///
    /// A new `SliceSeeder3`.
    pub fn random<R, S>(
        bounds: &BoundingBox3<ftr>,
        axis: Dim3,
        coord: ftr,
        n_seeds: usize,
        rng: &mut R,
        satisfies_constraints: &S,
    ) -> Self
    where
        R: Rng,
        S: Fn(&Point2<ftr>) -> bool,
    {
        Self::stratified(
            bounds,
            axis,
            coord,
            In2D::same(1),
            n_seeds,
            1.0,
            rng,
            satisfies_constraints,
        )
    }

    /// Creates a new seeder producing stratified seed points in a 2D slice of a bounding box.
    ///
    /// # Parameters
    ///
    /// - `bounds`: Bounding box to slice through.
    /// - `axis`: Axis to slice across.
    /// - `coord`: Coordinate of the slice along `axis`.
    /// - `shape`: Shape of the stratification grid.
    /// - `n_seeds_per_cell`: Number of seed points to generate in each cell of the stratification grid.
    /// - `randomness`: How far from the cell centers the seed points can be generated, going from 0 (cell center) to 1 (cell edge).
    /// - `rng`: Random number generator to draw offsets with.
    /// - `satisfies_constraints`: Closure taking a potential seed point and returning whether the point is accepted.
    ///
    /// # Returns
    ///
    /// A new `SliceSeeder3`.
    ///
    /// # Type parameters
    ///
    /// - `R`: Type of random number generator.
    /// - `S`: Function type taking a reference to a 2D point and returning a boolean value.
    #[allow(clippy::too_many_arguments)]
    pub fn stratified<R, S>(
        bounds: &BoundingBox3<ftr>,
        axis: Dim3,
        coord: ftr,
        shape: In2D<usize>,
        n_seeds_per_cell: usize,
        randomness: ftr,
        rng: &mut R,
        satisfies_constraints: &S,
    ) -> Self
    where
        R: Rng,
        S: Fn(&Point2<ftr>) -> bool,
    {
        assert_ne!(
            n_seeds_per_cell, 0,
            "Number of seeds per cell must be larger than zero."
        );
        assert!(
            (0.0..=1.0).contains(&randomness),
            "Randomness must be in the range [0, 1]."
        );

        if randomness == 0.0 {
            return Self::regular(bounds, axis, coord, shape, satisfies_constraints);
        }

        let slice_centers = Self::slice_cell_centers(bounds, axis, shape);
        let slice_cell_extents = Self::slice_cell_extents(bounds, axis, shape);

        let offset_limit = 0.5 * randomness;
        let uniform_offsets = Uniform::new(-offset_limit, offset_limit);

        let mut stratified_points = Vec::with_capacity(slice_centers.len() * n_seeds_per_cell);
        for center in slice_centers {
            for _ in 0..n_seeds_per_cell {
                stratified_points.push(Point2::new(
                    center[Dim2::X] + rng.sample(&uniform_offsets) * slice_cell_extents[Dim2::X],
                    center[Dim2::Y] + rng.sample(&uniform_offsets) * slice_cell_extents[Dim2::Y],
                ));
            }
        }
        SliceSeeder3 {
            seed_points: Self::construct_seed_points_from_slice_points(
                stratified_points,
                axis,
                coord,
                satisfies_constraints,
            ),
        }
    }

    fn slice_cell_extents(bounds: &BoundingBox3<ftr>, axis: Dim3, shape: In2D<usize>) -> In2D<ftr> {
        assert!(
            shape[Dim2::X] > 0 && shape[Dim2::Y] > 0,
            "Slice shape must be larger than zero in both directions."
        );
        let [first, second] = Dim3::slice_except(axis);
        let extent = bounds.extent();
        In2D::new(
            extent[first] / shape[Dim2::X] as ftr,
            extent[second] / shape[Dim2::Y] as ftr,
        )
    }

    fn slice_cell_centers(
        bounds: &BoundingBox3<ftr>,
        axis: Dim3,
        shape: In2D<usize>,
    ) -> Vec<Point2<ftr>> {
        let [first, second] = Dim3::slice_except(axis);
        let cell_extents = Self::slice_cell_extents(bounds, axis, shape);
        let lower = bounds.lower();

        let mut centers = Vec::with_capacity(shape[Dim2::X] * shape[Dim2::Y]);
        for j in 0..shape[Dim2::Y] {
            for i in 0..shape[Dim2::X] {
                centers.push(Point2::new(
                    lower[first] + (i as ftr + 0.5) * cell_extents[Dim2::X],
                    lower[second] + (j as ftr + 0.5) * cell_extents[Dim2::Y],
                ));
            }
        }
        centers
    }

    fn construct_seed_points_from_slice_points<S>(
        slice_points: Vec<Point2<ftr>>,
        axis: Dim3,
        coord: ftr,
        satisfies_constraints: &S,
    ) -> Vec<Point3<ftr>>
    where
        S: Fn(&Point2<ftr>) -> bool,
    {
        slice_points
            .into_iter()
            .filter(|point| satisfies_constraints(point))
            .map(|point| match axis {
                X => Point3::new(coord, point[Dim2::X], point[Dim2::Y]),
                Y => Point3::new(point[Dim2::X], coord, point[Dim2::Y]),
                Z => Point3::new(point[Dim2::X], point[Dim2::Y], coord),
            })
            .collect()
    }
}

impl IntoIterator for SliceSeeder3 {
    type Item = Point3<ftr>;
    type IntoIter = vec::IntoIter<Self::Item>;
    fn into_iter(self) -> Self::IntoIter {
        self.seed_points.into_iter()
    }
}

impl Seeder3 for SliceSeeder3 {
    fn number_of_points(&self) -> usize {
        self.seed_points.len()
    }

    fn retain_points<P>(&mut self, predicate: P)
    where
        P: FnMut(&Point3<ftr>) -> bool,
    {
        self.seed_points.retain(predicate);
    }
}
