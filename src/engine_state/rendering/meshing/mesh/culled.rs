//! Face-culled meshing: one quad per exposed voxel face, no merging.

use crate::engine_state::voxels::{block::block_side::FaceDirection, chunk::Chunk};

use super::{greedy::is_face_exposed, mesh::Mesh, quad::Quad, ChunkMesher, GreedyMesher};

/// Emits every visible face as its own unit quad.
#[derive(Debug, Clone, Copy, Default)]
pub struct CulledMesher;

impl CulledMesher {
    pub fn generate_quads(&self, chunk: &Chunk) -> Vec<Quad> {
        let [sx, sy, sz] = chunk.dimensions();
        let mut quads = Vec::new();
        for direction in FaceDirection::all() {
            for y in 0..sy {
                for z in 0..sz {
                    for x in 0..sx {
                        if !is_face_exposed(chunk, [x, y, z], direction) {
                            continue;
                        }
                        if let Some(voxel) = chunk.voxel(x, y, z) {
                            quads.push(Quad::new([x, y, z], direction, 1, 1, voxel.material));
                        }
                    }
                }
            }
        }
        quads
    }
}

impl ChunkMesher for CulledMesher {
    fn generate_mesh(&self, chunk: &Chunk) -> Mesh {
        GreedyMesher::build_mesh(chunk, &self.generate_quads(chunk))
    }
}
