//! Mesh data structures and operations for voxel rendering.
//!
//! A [`Mesh`] is a flat vertex list plus a `u32` index list describing an
//! indexed triangle list. Every quad contributes four vertices and six indices.

use super::quad::Quad;
use crate::engine_state::rendering::Vertex;

/// Vertices contributed by one quad.
pub const VERTICES_PER_QUAD: usize = 4;
/// Indices contributed by one quad.
pub const INDICES_PER_QUAD: usize = 6;

/// The geometry of one chunk.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Creates a new, empty mesh.
    pub fn new() -> Self {
        Mesh::default()
    }

    /// Creates an empty mesh with room for `quads` quads.
    pub fn with_quad_capacity(quads: usize) -> Self {
        Mesh {
            vertices: Vec::with_capacity(quads * VERTICES_PER_QUAD),
            indices: Vec::with_capacity(quads * INDICES_PER_QUAD),
        }
    }

    /// Appends a quad, choosing the index order from its face direction so the
    /// triangles wind counter-clockwise when seen from outside.
    ///
    /// # Arguments
    /// * `quad` - The quad to append
    /// * `offset` - World-space offset added to every corner
    pub fn push_quad(&mut self, quad: &Quad, offset: cgmath::Vector3<f32>) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(quad.vertices(offset));
        self.indices.extend(Self::generate_face_indices(
            base,
            quad.direction.flips_winding(),
        ));
    }

    /// Generates the six indices of a quad whose first vertex is `base`.
    ///
    /// Corners are expected in the order `origin`, `+U`, `+U+V`, `+V`.
    ///
    /// # Arguments
    /// * `base` - Index of the quad's first vertex
    /// * `flip` - Reverse the winding of both triangles
    pub fn generate_face_indices(base: u32, flip: bool) -> [u32; 6] {
        if flip {
            [base, base + 2, base + 1, base, base + 3, base + 2]
        } else {
            [base, base + 1, base + 2, base, base + 2, base + 3]
        }
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_QUAD
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Checks the structural invariants: whole triangles, in-range indices,
    /// and four vertices per six indices.
    pub fn validate(&self) -> bool {
        let vertex_count = self.vertices.len();
        self.indices.len() % 3 == 0
            && self.indices.iter().all(|&i| (i as usize) < vertex_count)
            && vertex_count % VERTICES_PER_QUAD == 0
            && vertex_count / VERTICES_PER_QUAD * INDICES_PER_QUAD == self.indices.len()
    }

    /// The vertex data as raw bytes, ready for a vertex buffer.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// The index data as raw bytes, ready for an index buffer.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
