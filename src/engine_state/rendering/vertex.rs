//! Vertex data structures and layouts for voxel rendering.
//!
//! This module defines the vertex format handed to the render backend and a
//! description of its memory layout for building a vertex buffer binding.

use cgmath::Vector3;

use crate::engine_state::voxels::block::MaterialId;

/// A vertex of a chunk mesh.
///
/// # Memory Layout
/// - Position: 3x f32 (12 bytes)
/// - Normal: 3x f32 (12 bytes)
/// - UV: 2x f32 (8 bytes)
/// - Material id: u32 (4 bytes)
///
/// Total size: 36 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position in world space
    pub position: [f32; 3],
    /// Outward face normal
    pub normal: [f32; 3],
    /// Texture coordinates in voxel units, so textures tile across merged quads
    pub uv: [f32; 2],
    /// Material of the face this vertex belongs to
    pub material_id: MaterialId,
}

/// The component format of one vertex attribute.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VertexFormat {
    Float32x2,
    Float32x3,
    Uint32,
}

/// One attribute of the vertex layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader input location
    pub location: u32,
    /// Byte offset within a vertex
    pub offset: usize,
    pub format: VertexFormat,
}

impl Vertex {
    /// Creates a new vertex.
    ///
    /// # Arguments
    /// * `position` - World-space position
    /// * `normal` - Outward face normal
    /// * `uv` - Texture coordinates, `(size_u, size_v)` at the far corner of a quad
    /// * `material_id` - Material of the face
    pub fn new(
        position: Vector3<f32>,
        normal: Vector3<f32>,
        uv: [f32; 2],
        material_id: MaterialId,
    ) -> Self {
        Vertex {
            position: position.into(),
            normal: normal.into(),
            uv,
            material_id,
        }
    }

    /// Distance in bytes between consecutive vertices.
    pub const STRIDE: usize = std::mem::size_of::<Vertex>();

    /// Returns the attribute layout matching this struct.
    ///
    /// # Shader Attributes
    /// - `location = 0`: position (vec3<f32>)
    /// - `location = 1`: normal (vec3<f32>)
    /// - `location = 2`: uv (vec2<f32>)
    /// - `location = 3`: material id (u32)
    pub fn layout() -> [VertexAttribute; 4] {
        [
            VertexAttribute {
                location: 0,
                offset: 0,
                format: VertexFormat::Float32x3,
            },
            VertexAttribute {
                location: 1,
                offset: std::mem::size_of::<[f32; 3]>(),
                format: VertexFormat::Float32x3,
            },
            VertexAttribute {
                location: 2,
                offset: std::mem::size_of::<[f32; 6]>(),
                format: VertexFormat::Float32x2,
            },
            VertexAttribute {
                location: 3,
                offset: std::mem::size_of::<[f32; 8]>(),
                format: VertexFormat::Uint32,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_is_tightly_packed() {
        assert_eq!(Vertex::STRIDE, 36);
        let layout = Vertex::layout();
        assert_eq!(layout[3].offset, 32);
        assert_eq!(layout[2].offset, 24);
    }
}
