use cgmath::Vector3;

use crate::engine_state::{
    rendering::Vertex,
    voxels::block::{block_side::FaceDirection, block_type::Material},
};

/// A rectangle of merged voxel faces, before expansion into world vertices.
///
/// The rectangle spans `size_u` voxels along `axis_u` and `size_v` voxels
/// along `axis_v`, starting at `origin` on the face plane. Coordinates are
/// chunk-local.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    /// Corner of the rectangle in chunk-local face space
    pub origin: Vector3<f32>,
    pub axis_u: Vector3<f32>,
    pub axis_v: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub size_u: u32,
    pub size_v: u32,
    pub material: Material,
    pub direction: FaceDirection,
    /// Local position of the voxel the quad grew from
    pub seed: [usize; 3],
}

impl Quad {
    /// Creates a quad for the face of the voxel at `seed` pointing along
    /// `direction`.
    ///
    /// # Arguments
    /// * `seed` - Local voxel position the quad starts at
    /// * `direction` - Which face of the voxel
    /// * `size_u`, `size_v` - Extent in voxels along the direction's axes
    /// * `material` - Material of every merged face
    pub fn new(
        seed: [usize; 3],
        direction: FaceDirection,
        size_u: u32,
        size_v: u32,
        material: Material,
    ) -> Self {
        let mut origin = Vector3::new(seed[0] as f32, seed[1] as f32, seed[2] as f32);
        if direction.sign() > 0 {
            origin[direction.normal_axis()] += 1.0;
        }
        Quad {
            origin,
            axis_u: direction.axis_u(),
            axis_v: direction.axis_v(),
            normal: direction.normal(),
            size_u,
            size_v,
            material,
            direction,
            seed,
        }
    }

    /// The four corners in the order `origin`, `+U`, `+U+V`, `+V`.
    pub fn corners(&self, offset: Vector3<f32>) -> [Vector3<f32>; 4] {
        let u = self.axis_u * self.size_u as f32;
        let v = self.axis_v * self.size_v as f32;
        let origin = self.origin + offset;
        [origin, origin + u, origin + u + v, origin + v]
    }

    /// Expands the quad into four vertices offset by `offset`.
    ///
    /// UVs span `[0, size_u] × [0, size_v]` so textures repeat once per voxel.
    pub fn vertices(&self, offset: Vector3<f32>) -> [Vertex; 4] {
        let [c0, c1, c2, c3] = self.corners(offset);
        let (su, sv) = (self.size_u as f32, self.size_v as f32);
        let id = self.material.id();
        [
            Vertex::new(c0, self.normal, [0.0, 0.0], id),
            Vertex::new(c1, self.normal, [su, 0.0], id),
            Vertex::new(c2, self.normal, [su, sv], id),
            Vertex::new(c3, self.normal, [0.0, sv], id),
        ]
    }

    /// Local positions of every voxel whose face this quad covers.
    pub fn covered_voxels(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        let (ua, va) = (self.direction.u_axis(), self.direction.v_axis());
        (0..self.size_v as usize).flat_map(move |dv| {
            (0..self.size_u as usize).map(move |du| {
                let mut cell = self.seed;
                cell[ua] += du;
                cell[va] += dv;
                cell
            })
        })
    }

    /// Number of voxel faces merged into this quad.
    pub fn area(&self) -> u32 {
        self.size_u * self.size_v
    }
}
