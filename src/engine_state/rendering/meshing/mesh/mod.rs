//! Mesh generation for voxel rendering.
//!
//! This module converts voxel data into GPU-friendly triangle meshes. The
//! greedy mesher combines coplanar faces of the same material into larger
//! quads; the culled mesher emits one quad per visible face and serves as a
//! reference for what the greedy mesher must cover.
//!
//! # Architecture
//! - [`Mesh`]: Vertices and indices of one chunk
//! - [`Quad`]: A merged rectangle of voxel faces before vertex expansion
//! - [`GreedyMesher`] / [`CulledMesher`]: Implementations of [`ChunkMesher`]
//!
//! # Usage
//! ```
//! use voxel_terrain::{Chunk, ChunkCoord, ChunkMesher, GreedyMesher, Material, Voxel};
//!
//! let mut chunk = Chunk::new(ChunkCoord::new(0, 0), 4, 4);
//! chunk.fill(Voxel::solid(Material::Grass));
//! let mesh = GreedyMesher.generate_mesh(&chunk);
//! assert_eq!(mesh.quad_count(), 6);
//! ```

mod culled;
mod greedy;
mod mesh;
mod quad;

pub use culled::CulledMesher;
pub use greedy::GreedyMesher;
pub use mesh::*;
pub use quad::Quad;

use crate::engine_state::voxels::chunk::Chunk;

/// Turns a chunk's voxel grid into a renderable mesh.
///
/// Implementations must be pure: the result depends only on the voxels and the
/// chunk's coordinate, and every call starts from an empty accumulator.
pub trait ChunkMesher: Send + Sync {
    fn generate_mesh(&self, chunk: &Chunk) -> Mesh;
}
