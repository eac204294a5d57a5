//! Greedy meshing implementation for voxel rendering.
//!
//! This module implements the greedy meshing algorithm which combines adjacent
//! coplanar faces of the same material into larger quads, significantly
//! reducing the number of vertices needed to render a chunk.
//!
//! One sweep runs per [`FaceDirection`]. A sweep walks the chunk one slice at a
//! time along the direction's normal axis; within a slice it marks which faces
//! are exposed, then grows rectangles from every unconsumed exposed face,
//! first along `V`, then along `U`. Growth stops at the first cell that is
//! covered, already consumed, or of a different material.

use bitvec::prelude::BitVec;
use log::trace;
use web_time::Instant;

use crate::engine_state::voxels::{
    block::{block_side::FaceDirection, block_type::Material},
    chunk::Chunk,
};

use super::{mesh::Mesh, quad::Quad, ChunkMesher};

/// Greedy mesher. Stateless; every call starts from a fresh accumulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyMesher;

/// Per-slice scratch state of one sweep.
struct SliceGrid {
    width: usize,
    /// The face of this cell is exposed in the sweep direction.
    uncovered: BitVec,
    /// The face of this cell already belongs to an emitted quad.
    in_a_quad: BitVec,
    materials: Vec<Material>,
}

impl SliceGrid {
    fn new(width: usize, height: usize) -> Self {
        SliceGrid {
            width,
            uncovered: BitVec::repeat(false, width * height),
            in_a_quad: BitVec::repeat(false, width * height),
            materials: vec![Material::Air; width * height],
        }
    }

    fn clear(&mut self) {
        self.uncovered.fill(false);
        self.in_a_quad.fill(false);
    }

    /// Whether the cell at `(u, v)` can join a quad of `material`.
    fn can_merge(&self, u: usize, v: usize, material: Material) -> bool {
        let i = v * self.width + u;
        self.uncovered[i] && !self.in_a_quad[i] && self.materials[i] == material
    }
}

/// Whether the face of the voxel at `position` pointing along `direction` is
/// visible: the voxel is active and its neighbour is inactive or outside the
/// chunk.
pub(super) fn is_face_exposed(chunk: &Chunk, position: [usize; 3], direction: FaceDirection) -> bool {
    let [x, y, z] = position.map(|c| c as i64);
    if !chunk.is_solid_at(x, y, z) {
        return false;
    }
    let mut neighbour = [x, y, z];
    neighbour[direction.normal_axis()] += direction.sign();
    !chunk.is_solid_at(neighbour[0], neighbour[1], neighbour[2])
}

impl GreedyMesher {
    pub fn new() -> Self {
        GreedyMesher
    }

    /// Computes the merged quads of `chunk` for all six directions.
    ///
    /// The result is deterministic: directions follow [`FaceDirection::all`],
    /// slices ascend along the normal axis, and within a slice seeds are
    /// visited row by row along `V`, cell by cell along `U`.
    pub fn generate_quads(&self, chunk: &Chunk) -> Vec<Quad> {
        let mut quads = Vec::new();
        for direction in FaceDirection::all() {
            self.sweep(chunk, direction, &mut quads);
        }
        quads
    }

    /// Expands quads into a mesh positioned at the chunk's world origin.
    pub fn build_mesh(chunk: &Chunk, quads: &[Quad]) -> Mesh {
        let offset = chunk.world_origin();
        let mut mesh = Mesh::with_quad_capacity(quads.len());
        for quad in quads {
            mesh.push_quad(quad, offset);
        }
        mesh
    }

    fn sweep(&self, chunk: &Chunk, direction: FaceDirection, quads: &mut Vec<Quad>) {
        let dims = chunk.dimensions();
        let (n_axis, u_axis, v_axis) = (
            direction.normal_axis(),
            direction.u_axis(),
            direction.v_axis(),
        );
        let (width, height) = (dims[u_axis], dims[v_axis]);
        let mut grid = SliceGrid::new(width, height);

        for slice in 0..dims[n_axis] {
            grid.clear();

            let mut position = [0usize; 3];
            position[n_axis] = slice;

            // Mark which faces of this slice are exposed.
            let mut any_exposed = false;
            for v in 0..height {
                for u in 0..width {
                    position[u_axis] = u;
                    position[v_axis] = v;
                    if is_face_exposed(chunk, position, direction) {
                        let i = v * width + u;
                        grid.uncovered.set(i, true);
                        grid.materials[i] = chunk
                            .voxel(position[0], position[1], position[2])
                            .map(|voxel| voxel.material)
                            .unwrap_or(Material::Air);
                        any_exposed = true;
                    }
                }
            }
            if !any_exposed {
                continue;
            }

            for v in 0..height {
                for u in 0..width {
                    let i = v * width + u;
                    if grid.in_a_quad[i] || !grid.uncovered[i] {
                        continue;
                    }
                    let material = grid.materials[i];

                    let mut size_v = 1;
                    while v + size_v < height && grid.can_merge(u, v + size_v, material) {
                        size_v += 1;
                    }

                    let mut size_u = 1;
                    'grow: while u + size_u < width {
                        for dv in 0..size_v {
                            if !grid.can_merge(u + size_u, v + dv, material) {
                                break 'grow;
                            }
                        }
                        size_u += 1;
                    }

                    for dv in 0..size_v {
                        for du in 0..size_u {
                            grid.in_a_quad.set((v + dv) * width + u + du, true);
                        }
                    }

                    position[u_axis] = u;
                    position[v_axis] = v;
                    quads.push(Quad::new(
                        position,
                        direction,
                        size_u as u32,
                        size_v as u32,
                        material,
                    ));
                }
            }
        }
    }
}

impl ChunkMesher for GreedyMesher {
    fn generate_mesh(&self, chunk: &Chunk) -> Mesh {
        let start = Instant::now();
        let quads = self.generate_quads(chunk);
        let mesh = Self::build_mesh(chunk, &quads);
        trace!(
            "Greedy meshed chunk {} into {} quads in {:?}",
            chunk.coord(),
            quads.len(),
            start.elapsed()
        );
        mesh
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use cgmath::{InnerSpace, Vector3};

    use super::*;
    use crate::engine_state::{
        rendering::meshing::CulledMesher,
        voxels::{block::Voxel, chunk::ChunkCoord},
    };

    fn solid_chunk(size: u32, height: u32, material: Material) -> Chunk {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0), size, height);
        chunk.fill(Voxel::solid(material));
        chunk
    }

    fn covered_faces(quads: &[Quad]) -> HashSet<(FaceDirection, [usize; 3])> {
        let mut faces = HashSet::new();
        for quad in quads {
            for cell in quad.covered_voxels() {
                assert!(
                    faces.insert((quad.direction, cell)),
                    "face {:?} of {:?} covered twice",
                    quad.direction,
                    cell
                );
            }
        }
        faces
    }

    /// A deterministic pseudo-random grid with a few materials and holes.
    fn noisy_chunk(seed: u64) -> Chunk {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut chunk = Chunk::new(ChunkCoord::new(1, -1), 6, 5);
        for y in 0..5 {
            for z in 0..6 {
                for x in 0..6 {
                    let voxel = match rng.u8(0..4) {
                        0 => Voxel::AIR,
                        1 => Voxel::solid(Material::Grass),
                        2 => Voxel::solid(Material::Stone),
                        _ => Voxel::solid(Material::Snow),
                    };
                    chunk.set_voxel(x, y, z, voxel);
                }
            }
        }
        chunk
    }

    #[test]
    fn test_empty_chunk_has_no_quads() {
        let chunk = Chunk::new(ChunkCoord::new(0, 0), 4, 4);
        assert!(GreedyMesher.generate_quads(&chunk).is_empty());
        assert!(GreedyMesher.generate_mesh(&chunk).is_empty());
    }

    #[test]
    fn test_uniform_cube_is_six_quads() {
        let chunk = solid_chunk(4, 4, Material::Grass);
        let quads = GreedyMesher.generate_quads(&chunk);
        assert_eq!(quads.len(), 6);
        for quad in &quads {
            assert_eq!((quad.size_u, quad.size_v), (4, 4));
        }
        let directions: HashSet<_> = quads.iter().map(|q| q.direction).collect();
        assert_eq!(directions.len(), 6);

        let mesh = GreedyMesher.generate_mesh(&chunk);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert!(mesh.validate());
    }

    #[test]
    fn test_tall_chunk_quads_span_cross_section() {
        let chunk = solid_chunk(3, 7, Material::Stone);
        let quads = GreedyMesher.generate_quads(&chunk);
        assert_eq!(quads.len(), 6);
        for quad in &quads {
            let expected = match quad.direction {
                FaceDirection::PosY | FaceDirection::NegY => (3, 3),
                _ => (3, 7),
            };
            assert_eq!((quad.size_u, quad.size_v), expected);
        }
    }

    #[test]
    fn test_single_voxel() {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0), 4, 4);
        chunk.set_voxel(1, 1, 1, Voxel::solid(Material::Wood));
        let quads = GreedyMesher.generate_quads(&chunk);
        assert_eq!(quads.len(), 6);
        assert!(quads.iter().all(|q| q.area() == 1 && q.material == Material::Wood));
    }

    #[test]
    fn test_material_boundary_is_respected() {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0), 2, 1);
        chunk.set_voxel(0, 0, 0, Voxel::solid(Material::Grass));
        chunk.set_voxel(0, 0, 1, Voxel::solid(Material::Grass));
        chunk.set_voxel(1, 0, 0, Voxel::solid(Material::Stone));
        chunk.set_voxel(1, 0, 1, Voxel::solid(Material::Stone));

        let quads = GreedyMesher.generate_quads(&chunk);
        let top: Vec<_> = quads
            .iter()
            .filter(|q| q.direction == FaceDirection::PosY)
            .collect();
        assert_eq!(top.len(), 2);
        assert!(top.iter().any(|q| q.material == Material::Grass));
        assert!(top.iter().any(|q| q.material == Material::Stone));
        assert!(top.iter().all(|q| q.area() == 2));
    }

    #[test]
    fn test_snow_cap_splits_side_faces() {
        let mut chunk = solid_chunk(4, 4, Material::Grass);
        for z in 0..4 {
            for x in 0..4 {
                chunk.set_voxel(x, 3, z, Voxel::solid(Material::Snow));
            }
        }
        let quads = GreedyMesher.generate_quads(&chunk);
        // Four sides split into a grass and a snow band, plus top and bottom.
        assert_eq!(quads.len(), 10);
        let top = quads
            .iter()
            .find(|q| q.direction == FaceDirection::PosY)
            .unwrap();
        assert_eq!(top.material, Material::Snow);
        assert_eq!(top.area(), 16);
    }

    #[test]
    fn test_hidden_interior_faces_are_skipped() {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0), 4, 4);
        chunk.set_voxel(1, 1, 1, Voxel::solid(Material::Grass));
        chunk.set_voxel(2, 1, 1, Voxel::solid(Material::Grass));
        let quads = GreedyMesher.generate_quads(&chunk);
        // A 2x1x1 bar: ends are single faces, the four long sides are merged.
        assert_eq!(quads.len(), 6);
        assert_eq!(quads.iter().map(Quad::area).sum::<u32>(), 10);
    }

    #[test]
    fn test_coverage_matches_culled_faces() {
        for seed in 0..8 {
            let chunk = noisy_chunk(seed);
            let greedy = covered_faces(&GreedyMesher.generate_quads(&chunk));
            let culled = covered_faces(&CulledMesher.generate_quads(&chunk));
            assert_eq!(greedy, culled);
        }
    }

    #[test]
    fn test_quads_are_single_material() {
        let chunk = noisy_chunk(42);
        for quad in GreedyMesher.generate_quads(&chunk) {
            for [x, y, z] in quad.covered_voxels() {
                assert_eq!(chunk.voxel(x, y, z).unwrap().material, quad.material);
            }
        }
    }

    #[test]
    fn test_meshing_is_deterministic() {
        let chunk = noisy_chunk(7);
        let a = GreedyMesher.generate_mesh(&chunk);
        let b = GreedyMesher.generate_mesh(&chunk);
        assert_eq!(a, b);
        assert_eq!(a.vertex_bytes(), b.vertex_bytes());
    }

    #[test]
    fn test_winding_faces_the_normal() {
        let chunk = noisy_chunk(3);
        let mesh = GreedyMesher.generate_mesh(&chunk);
        assert!(mesh.validate());
        for triangle in mesh.indices.chunks(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]]
                .map(|i| Vector3::from(mesh.vertices[i as usize].position));
            let normal = Vector3::from(mesh.vertices[triangle[0] as usize].normal);
            assert!((b - a).cross(c - a).dot(normal) > 0.0);
        }
    }

    #[test]
    fn test_vertices_are_offset_to_world_space() {
        let mut chunk = Chunk::new(ChunkCoord::new(-1, 2), 4, 4);
        chunk.set_voxel(0, 0, 0, Voxel::solid(Material::Grass));
        let mesh = GreedyMesher.generate_mesh(&chunk);
        for vertex in &mesh.vertices {
            let [x, y, z] = vertex.position;
            assert!((-4.0..=-3.0).contains(&x));
            assert!((0.0..=1.0).contains(&y));
            assert!((8.0..=9.0).contains(&z));
        }
    }
}
