#![allow(dead_code)]

use streamlines::{
    geometry::{Dim3, Point3, Vec3},
    mesh::{indexed::IndexedSurface3, NodeId, SurfaceMesh3},
    tracing::ftr,
};

/// Node coordinates and triangle indices of a square grid in the xy-plane
/// spanning `[0, size]` along both axes, with two triangles per cell.
pub fn grid_buffers<H>(n_cells: usize, size: ftr, height: H) -> (Vec<ftr>, Vec<usize>)
where
    H: Fn(ftr, ftr) -> ftr,
{
    let spacing = size / n_cells as ftr;
    let n_nodes = n_cells + 1;

    let mut nodes = Vec::with_capacity(3 * n_nodes * n_nodes);
    for j in 0..n_nodes {
        for i in 0..n_nodes {
            let x = i as ftr * spacing;
            let y = j as ftr * spacing;
            nodes.extend_from_slice(&[x, y, height(x, y)]);
        }
    }

    let mut faces = Vec::with_capacity(6 * n_cells * n_cells);
    for j in 0..n_cells {
        for i in 0..n_cells {
            let lower_left = j * n_nodes + i;
            let lower_right = lower_left + 1;
            let upper_left = lower_left + n_nodes;
            let upper_right = upper_left + 1;
            faces.extend_from_slice(&[lower_left, lower_right, upper_right]);
            faces.extend_from_slice(&[lower_left, upper_right, upper_left]);
        }
    }
    (nodes, faces)
}

pub fn flat_grid(n_cells: usize, size: ftr) -> IndexedSurface3 {
    let (nodes, faces) = grid_buffers(n_cells, size, |_, _| 0.0);
    IndexedSurface3::from_flat(&nodes, &faces).unwrap()
}

/// Grid whose height varies smoothly, so neighboring faces are not coplanar.
pub fn wavy_grid(n_cells: usize, size: ftr) -> IndexedSurface3 {
    let (nodes, faces) = grid_buffers(n_cells, size, |x, y| {
        0.1 * size * (3.0 * x / size).sin() * (2.0 * y / size).cos()
    });
    IndexedSurface3::from_flat(&nodes, &faces).unwrap()
}

/// Evaluates the given field at every node of the surface.
pub fn sample_at_nodes<M, F>(surface: &M, field: F) -> Vec<Vec3<ftr>>
where
    M: SurfaceMesh3,
    F: Fn(&Point3<ftr>) -> Vec3<ftr>,
{
    (0..surface.number_of_nodes())
        .map(|idx| field(&surface.node_position(NodeId(idx))))
        .collect()
}

/// Field circulating around the given center in the xy-plane.
pub fn vortex(center: Point3<ftr>) -> impl Fn(&Point3<ftr>) -> Vec3<ftr> {
    move |point| {
        Vec3::new(
            -(point[Dim3::Y] - center[Dim3::Y]),
            point[Dim3::X] - center[Dim3::X],
            0.0,
        )
    }
}
