//! Rendering boundary of the terrain core.
//!
//! The core never talks to a graphics API. It hands finished meshes to a
//! [`RenderBackend`], which owns GPU resources and returns an opaque handle per
//! uploaded chunk. Only the main thread calls the backend.

pub mod meshing;
mod vertex;

pub use vertex::{Vertex, VertexAttribute, VertexFormat};

use log::trace;

use crate::engine_state::voxels::chunk::ChunkCoord;
use meshing::Mesh;

/// The GPU side of chunk streaming.
pub trait RenderBackend {
    /// Opaque identifier of an uploaded chunk mesh.
    type Handle;

    /// Uploads a chunk mesh.
    ///
    /// # Arguments
    /// * `coord` - The chunk the mesh belongs to
    /// * `mesh` - Vertices are already in world space
    /// * `offset` - World origin of the chunk, for backends that want a per-draw transform
    ///
    /// # Returns
    /// A handle that is passed back to [`release`](Self::release) on eviction.
    fn upload(&mut self, coord: ChunkCoord, mesh: &Mesh, offset: [f32; 3]) -> Self::Handle;

    /// Frees the resources behind `handle`.
    fn release(&mut self, handle: Self::Handle);

    /// Draws one uploaded chunk.
    fn draw(&mut self, _handle: &Self::Handle) {}
}

/// Handle issued by [`NullBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NullHandle {
    pub id: u64,
    pub coord: ChunkCoord,
    pub vertices: usize,
    pub indices: usize,
}

/// A backend that stores nothing, for headless runs and tests.
#[derive(Debug, Default)]
pub struct NullBackend {
    next_id: u64,
    pub uploads: usize,
    pub releases: usize,
    pub draws: usize,
    /// Vertices currently resident
    pub resident_vertices: usize,
    /// Indices currently resident
    pub resident_indices: usize,
}

impl NullBackend {
    pub fn new() -> Self {
        NullBackend::default()
    }

    /// Number of handles uploaded and not yet released.
    pub fn live_handles(&self) -> usize {
        self.uploads - self.releases
    }
}

impl RenderBackend for NullBackend {
    type Handle = NullHandle;

    fn upload(&mut self, coord: ChunkCoord, mesh: &Mesh, _offset: [f32; 3]) -> NullHandle {
        let handle = NullHandle {
            id: self.next_id,
            coord,
            vertices: mesh.vertices.len(),
            indices: mesh.indices.len(),
        };
        self.next_id += 1;
        self.uploads += 1;
        self.resident_vertices += handle.vertices;
        self.resident_indices += handle.indices;
        trace!(
            "Uploaded chunk {} ({} vertices, {} indices)",
            coord,
            handle.vertices,
            handle.indices
        );
        handle
    }

    fn release(&mut self, handle: NullHandle) {
        self.releases += 1;
        self.resident_vertices -= handle.vertices;
        self.resident_indices -= handle.indices;
    }

    fn draw(&mut self, _handle: &NullHandle) {
        self.draws += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::{
        block::{block_type::Material, Voxel},
        chunk::Chunk,
    };
    use super::meshing::{ChunkMesher, GreedyMesher};

    #[test]
    fn test_null_backend_tracks_residency() {
        let mut chunk = Chunk::new(ChunkCoord::new(2, 3), 4, 4);
        chunk.fill(Voxel::solid(Material::Stone));
        let mesh = GreedyMesher.generate_mesh(&chunk);

        let mut backend = NullBackend::new();
        let a = backend.upload(chunk.coord(), &mesh, [8.0, 0.0, 12.0]);
        let b = backend.upload(chunk.coord(), &mesh, [8.0, 0.0, 12.0]);
        assert_ne!(a.id, b.id);
        assert_eq!(backend.resident_vertices, 48);
        backend.draw(&a);
        backend.release(a);
        assert_eq!(backend.live_handles(), 1);
        assert_eq!(backend.resident_indices, 36);
        assert_eq!(backend.draws, 1);
    }
}
