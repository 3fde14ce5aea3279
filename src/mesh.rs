//! Triangulated surfaces with half-edge adjacency.

pub mod indexed;

use crate::{
    geometry::{BoundingBox3, Point3},
    tracing::ftr,
};

/// Identifier of a mesh node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Identifier of a triangular mesh face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceId(pub usize);

/// Identifier of a directed edge bounding a single face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HalfEdgeId(pub usize);

/// Defines the properties of a triangulated surface that surface tracers rely on.
///
/// Node and face identifiers are expected to run contiguously from zero up
/// to the number of nodes and faces respectively.
pub trait SurfaceMesh3 {
    /// Returns the number of nodes in the mesh.
    fn number_of_nodes(&self) -> usize;

    /// Returns the number of faces in the mesh.
    fn number_of_faces(&self) -> usize;

    /// Returns the position of the given node.
    fn node_position(&self, node: NodeId) -> Point3<ftr>;

    /// Returns the three half-edges bounding the given face, ordered so that
    /// each one is followed by its `next` half-edge.
    fn face_half_edges(&self, face: FaceId) -> [HalfEdgeId; 3];

    /// Returns the node the given half-edge starts at.
    fn half_edge_node(&self, edge: HalfEdgeId) -> NodeId;

    /// Returns the half-edge following the given one around its face.
    fn half_edge_next(&self, edge: HalfEdgeId) -> HalfEdgeId;

    /// Returns the oppositely directed half-edge of the neighboring face,
    /// or `None` for an edge on the border of the surface.
    fn half_edge_opposite(&self, edge: HalfEdgeId) -> Option<HalfEdgeId>;

    /// Returns the face bounded by the given half-edge.
    fn half_edge_face(&self, edge: HalfEdgeId) -> FaceId;

    /// Returns the three nodes of the given face in order.
    fn face_nodes(&self, face: FaceId) -> [NodeId; 3] {
        let [e0, e1, e2] = self.face_half_edges(face);
        [
            self.half_edge_node(e0),
            self.half_edge_node(e1),
            self.half_edge_node(e2),
        ]
    }

    /// Returns the positions of the three nodes of the given face.
    fn face_positions(&self, face: FaceId) -> [Point3<ftr>; 3] {
        let [n0, n1, n2] = self.face_nodes(face);
        [
            self.node_position(n0),
            self.node_position(n1),
            self.node_position(n2),
        ]
    }

    /// Computes the mean of the node positions of the given face.
    fn face_barycenter(&self, face: FaceId) -> Point3<ftr> {
        let [p0, p1, p2] = self.face_positions(face);
        let sum = p0.to_vec3() + p1.to_vec3() + p2.to_vec3();
        (sum * (1.0 / 3.0)).to_point3()
    }

    /// Computes the smallest box enclosing all nodes, or `None` for a mesh without nodes.
    fn bounding_box(&self) -> Option<BoundingBox3<ftr>> {
        let positions: Vec<_> = (0..self.number_of_nodes())
            .map(|idx| self.node_position(NodeId(idx)))
            .collect();
        BoundingBox3::enclosing(&positions)
    }

    /// Collects every half-edge without an opposite, in face order.
    fn border_half_edges(&self) -> Vec<HalfEdgeId> {
        (0..self.number_of_faces())
            .flat_map(|idx| self.face_half_edges(FaceId(idx)))
            .filter(|&edge| self.half_edge_opposite(edge).is_none())
            .collect()
    }
}
