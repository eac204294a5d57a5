//! Mesh generation for voxel rendering.
//!
//! Meshes are built off the main thread by the chunk generation workers and
//! handed to the render backend as indexed triangle lists.

mod mesh;

pub use mesh::*;
