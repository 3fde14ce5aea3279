//! The `streamlines` crate traces streamlines, streambands and evenly spaced
//! surface streamlines for visualizing 3D vector fields.
pub mod error;
pub mod geometry;
pub mod io;
pub mod mesh;
pub mod num;
pub mod octree;
pub mod seeding;
pub mod tracing;
