//! Half-edge surface built from indexed node and face buffers.

use super::{FaceId, HalfEdgeId, NodeId, SurfaceMesh3};
use crate::{
    error::{Result, TracingError},
    geometry::Point3,
    tracing::ftr,
};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug)]
struct HalfEdge {
    node: NodeId,
    opposite: Option<HalfEdgeId>,
}

/// Triangulated surface stored as node positions and consistently oriented
/// triangles, with half-edge adjacency derived on construction.
///
/// The half-edges of face `f` are `3f`, `3f + 1` and `3f + 2`, running from
/// the first to the second node, the second to the third and the third back
/// to the first.
#[derive(Clone, Debug)]
pub struct IndexedSurface3 {
    positions: Vec<Point3<ftr>>,
    half_edges: Vec<HalfEdge>,
}

impl IndexedSurface3 {
    /// Creates a new surface from node positions and triangles of node indices.
    ///
    /// # Parameters
    ///
    /// - `positions`: Position of each node.
    /// - `faces`: Node indices of each triangle. Neighboring triangles must
    ///   traverse their shared edge in opposite directions.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains the new surface.
    /// - `Err`: `TracingError::InvalidInput` if a face refers to a missing node,
    ///   repeats a node, or if two faces traverse an edge in the same direction
    ///   (which also happens when more than two faces share an edge).
    pub fn new(positions: Vec<Point3<ftr>>, faces: Vec<[usize; 3]>) -> Result<Self> {
        let number_of_nodes = positions.len();
        let mut half_edges = Vec::with_capacity(3 * faces.len());
        let mut edge_map: HashMap<(usize, usize), HalfEdgeId> =
            HashMap::with_capacity(3 * faces.len());

        for (face_idx, nodes) in faces.iter().enumerate() {
            if let Some(&node) = nodes.iter().find(|&&node| node >= number_of_nodes) {
                return Err(TracingError::InvalidInput(format!(
                    "face {} refers to node {} but there are only {} nodes",
                    face_idx, node, number_of_nodes
                )));
            }
            if nodes[0] == nodes[1] || nodes[1] == nodes[2] || nodes[2] == nodes[0] {
                return Err(TracingError::InvalidInput(format!(
                    "face {} repeats a node: {:?}",
                    face_idx, nodes
                )));
            }
            for corner in 0..3 {
                let edge = HalfEdgeId(half_edges.len());
                let from = nodes[corner];
                let to = nodes[(corner + 1) % 3];
                if edge_map.insert((from, to), edge).is_some() {
                    return Err(TracingError::InvalidInput(format!(
                        "edge from node {} to node {} is traversed in the same direction by more than one face",
                        from, to
                    )));
                }
                half_edges.push(HalfEdge {
                    node: NodeId(from),
                    opposite: None,
                });
            }
        }

        for (&(from, to), &edge) in edge_map.iter() {
            if let Some(&opposite) = edge_map.get(&(to, from)) {
                half_edges[edge.0].opposite = Some(opposite);
            }
        }

        Ok(Self {
            positions,
            half_edges,
        })
    }

    /// Creates a new surface from flat buffers with three coordinates per node
    /// and three node indices per face.
    pub fn from_flat(nodes: &[ftr], faces: &[usize]) -> Result<Self> {
        if nodes.len() % 3 != 0 {
            return Err(TracingError::InvalidInput(format!(
                "node buffer length {} is not a multiple of three",
                nodes.len()
            )));
        }
        if faces.len() % 3 != 0 {
            return Err(TracingError::InvalidInput(format!(
                "face buffer length {} is not a multiple of three",
                faces.len()
            )));
        }
        let positions = nodes.chunks_exact(3).map(Point3::from_slice).collect();
        let faces = faces
            .chunks_exact(3)
            .map(|face| [face[0], face[1], face[2]])
            .collect();
        Self::new(positions, faces)
    }
}

impl SurfaceMesh3 for IndexedSurface3 {
    fn number_of_nodes(&self) -> usize {
        self.positions.len()
    }

    fn number_of_faces(&self) -> usize {
        self.half_edges.len() / 3
    }

    fn node_position(&self, node: NodeId) -> Point3<ftr> {
        self.positions[node.0]
    }

    fn face_half_edges(&self, face: FaceId) -> [HalfEdgeId; 3] {
        let first = 3 * face.0;
        [
            HalfEdgeId(first),
            HalfEdgeId(first + 1),
            HalfEdgeId(first + 2),
        ]
    }

    fn half_edge_node(&self, edge: HalfEdgeId) -> NodeId {
        self.half_edges[edge.0].node
    }

    fn half_edge_next(&self, edge: HalfEdgeId) -> HalfEdgeId {
        let first = edge.0 - edge.0 % 3;
        HalfEdgeId(first + (edge.0 + 1) % 3)
    }

    fn half_edge_opposite(&self, edge: HalfEdgeId) -> Option<HalfEdgeId> {
        self.half_edges[edge.0].opposite
    }

    fn half_edge_face(&self, edge: HalfEdgeId) -> FaceId {
        FaceId(edge.0 / 3)
    }
}
