//! # Chunk Module
//!
//! This module provides the `Chunk` struct: one fixed-size column of the world
//! holding a dense voxel grid, its grid coordinate, its derived mesh and its
//! place in the streaming lifecycle.
//!
//! ## Storage
//!
//! Voxels live in a single contiguous `Vec<Voxel>` indexed as
//! `x + size * (z + size * y)`, so a horizontal layer is one contiguous run.
//! All mutation goes through in-place index access; nothing hands out a copy
//! when a write is intended.
//!
//! ## Bounds
//!
//! Reads outside the grid report air and writes outside the grid are dropped.
//! Terrain features such as trees rely on this near chunk edges.

use std::fmt;

use cgmath::Vector3;

use super::block::Voxel;
use crate::engine_state::rendering::meshing::Mesh;

/// The grid coordinate of a chunk column in the XZ plane.
///
/// Used directly as the map key for loaded chunks; equality and hashing are
/// structural.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// Column index along world X
    pub x: i64,
    /// Column index along world Z
    pub z: i64,
}

impl ChunkCoord {
    /// Creates a coordinate from its two components.
    pub const fn new(x: i64, z: i64) -> Self {
        ChunkCoord { x, z }
    }

    /// Finds the column containing a world-space XZ position.
    ///
    /// # Arguments
    /// * `world_x` - World X position
    /// * `world_z` - World Z position
    /// * `chunk_size` - Voxels per chunk side
    ///
    /// # Returns
    /// `floor(world / chunk_size)` per axis, so negative positions map to
    /// negative columns.
    pub fn from_world(world_x: f32, world_z: f32, chunk_size: u32) -> Self {
        let size = chunk_size.max(1) as f64;
        ChunkCoord {
            x: (world_x as f64 / size).floor() as i64,
            z: (world_z as f64 / size).floor() as i64,
        }
    }

    /// Chebyshev distance between two columns, in chunks.
    pub fn chebyshev_distance(&self, other: &ChunkCoord) -> u64 {
        self.x.abs_diff(other.x).max(self.z.abs_diff(other.z))
    }

    /// World-space position of this column's minimum corner.
    pub fn world_origin(&self, chunk_size: u32) -> Vector3<f32> {
        let size = chunk_size as i64;
        Vector3::new((self.x * size) as f32, 0.0, (self.z * size) as f32)
    }

    /// World-space position of the voxel at local `(x, z)` within this column.
    pub fn world_column(&self, chunk_size: u32, local_x: usize, local_z: usize) -> (i64, i64) {
        let size = chunk_size as i64;
        (self.x * size + local_x as i64, self.z * size + local_z as i64)
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Where a chunk is in its streaming lifecycle.
///
/// Transitions are strictly `Queued → Generating → ReadyToUpload → Active`.
/// `Unloaded` is never stored; it is what the streaming manager reports for a
/// coordinate it does not track.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// Not tracked by the streaming manager.
    Unloaded,
    /// Waiting on the pending queue.
    Queued,
    /// Picked up by a worker.
    Generating,
    /// Voxels and mesh complete, waiting on the ready queue.
    ReadyToUpload,
    /// Mesh uploaded, eligible for rendering.
    Active,
}

/// Represents one column of voxels in the world.
///
/// The voxel grid is exclusively owned by the chunk. The mesh is derived data:
/// it is recomputed from the voxels as a whole and replaced wholesale.
#[derive(Debug)]
pub struct Chunk {
    coord: ChunkCoord,
    size: u32,
    height: u32,
    voxels: Vec<Voxel>,
    mesh: Mesh,
    state: ChunkState,
}

impl Chunk {
    /// Creates a new, completely empty chunk in the `Queued` state.
    ///
    /// # Arguments
    /// * `coord` - The grid coordinate of the chunk
    /// * `size` - Voxels along X and Z
    /// * `height` - Voxels along Y
    ///
    /// # Returns
    /// A new `Chunk` filled with air and carrying an empty mesh.
    pub fn new(coord: ChunkCoord, size: u32, height: u32) -> Self {
        let volume = size as usize * size as usize * height as usize;
        Chunk {
            coord,
            size,
            height,
            voxels: vec![Voxel::AIR; volume],
            mesh: Mesh::new(),
            state: ChunkState::Queued,
        }
    }

    /// The grid coordinate of this chunk.
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Voxels along X and Z.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Voxels along Y.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The extent of the grid along each axis as `[x, y, z]`.
    pub fn dimensions(&self) -> [usize; 3] {
        [self.size as usize, self.height as usize, self.size as usize]
    }

    pub fn state(&self) -> ChunkState {
        self.state
    }

    pub fn set_state(&mut self, state: ChunkState) {
        self.state = state;
    }

    /// World-space position of this chunk's minimum corner.
    pub fn world_origin(&self) -> Vector3<f32> {
        self.coord.world_origin(self.size)
    }

    /// The most recently generated mesh.
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Replaces the mesh wholesale.
    pub fn set_mesh(&mut self, mesh: Mesh) {
        self.mesh = mesh;
    }

    /// All voxels in storage order.
    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    /// Computes the storage index of a local position.
    ///
    /// # Returns
    /// `None` if the position lies outside the grid.
    pub fn index(&self, x: usize, y: usize, z: usize) -> Option<usize> {
        let size = self.size as usize;
        if x >= size || z >= size || y >= self.height as usize {
            return None;
        }
        Some(x + size * (z + size * y))
    }

    /// Gets a reference to the voxel at local coordinates, if in bounds.
    pub fn voxel(&self, x: usize, y: usize, z: usize) -> Option<&Voxel> {
        self.index(x, y, z).map(|i| &self.voxels[i])
    }

    /// Gets a mutable reference to the voxel at local coordinates, if in bounds.
    pub fn voxel_mut(&mut self, x: usize, y: usize, z: usize) -> Option<&mut Voxel> {
        self.index(x, y, z).map(move |i| &mut self.voxels[i])
    }

    /// Writes a voxel at signed local coordinates.
    ///
    /// Writes outside `[0,size)×[0,height)×[0,size)` are silently dropped.
    ///
    /// # Returns
    /// `true` if the write landed inside the grid.
    pub fn set_voxel(&mut self, x: i64, y: i64, z: i64, voxel: Voxel) -> bool {
        match self.signed_index(x, y, z) {
            Some(i) => {
                self.voxels[i] = voxel;
                true
            }
            None => false,
        }
    }

    /// Checks whether the voxel at signed local coordinates is solid.
    ///
    /// # Returns
    /// `false` for air and for any position outside the grid.
    pub fn is_solid_at(&self, x: i64, y: i64, z: i64) -> bool {
        self.signed_index(x, y, z)
            .map(|i| self.voxels[i].is_solid())
            .unwrap_or(false)
    }

    /// Whether every position of `positions` lies inside the grid.
    pub fn contains_all(&self, positions: &[[i64; 3]]) -> bool {
        positions
            .iter()
            .all(|p| self.signed_index(p[0], p[1], p[2]).is_some())
    }

    /// Overwrites every voxel.
    pub fn fill(&mut self, voxel: Voxel) {
        self.voxels.fill(voxel);
    }

    /// Number of active voxels.
    pub fn solid_count(&self) -> usize {
        self.voxels.iter().filter(|v| v.is_solid()).count()
    }

    fn signed_index(&self, x: i64, y: i64, z: i64) -> Option<usize> {
        if x < 0 || y < 0 || z < 0 {
            return None;
        }
        self.index(x as usize, y as usize, z as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_type::Material;

    #[test]
    fn test_from_world_floors_negative_positions() {
        assert_eq!(ChunkCoord::from_world(0.0, 0.0, 16), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_world(15.9, 16.0, 16), ChunkCoord::new(0, 1));
        assert_eq!(ChunkCoord::from_world(-0.1, -16.0, 16), ChunkCoord::new(-1, -1));
        assert_eq!(ChunkCoord::from_world(-16.1, 40.0, 16), ChunkCoord::new(-2, 2));
    }

    #[test]
    fn test_chebyshev_distance() {
        let a = ChunkCoord::new(0, 0);
        assert_eq!(a.chebyshev_distance(&ChunkCoord::new(3, -1)), 3);
        assert_eq!(a.chebyshev_distance(&ChunkCoord::new(-2, 5)), 5);
        assert_eq!(a.chebyshev_distance(&a), 0);
    }

    #[test]
    fn test_world_origin() {
        let coord = ChunkCoord::new(-2, 3);
        assert_eq!(coord.world_origin(8), Vector3::new(-16.0, 0.0, 24.0));
        assert_eq!(coord.world_column(8, 1, 2), (-15, 26));
    }

    #[test]
    fn test_new_chunk_is_empty_and_queued() {
        let chunk = Chunk::new(ChunkCoord::new(0, 0), 4, 6);
        assert_eq!(chunk.voxels().len(), 4 * 4 * 6);
        assert_eq!(chunk.solid_count(), 0);
        assert_eq!(chunk.state(), ChunkState::Queued);
        assert!(chunk.mesh().is_empty());
    }

    #[test]
    fn test_in_place_mutation_sticks() {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0), 4, 4);
        if let Some(voxel) = chunk.voxel_mut(1, 2, 3) {
            voxel.active = true;
            voxel.material = Material::Wood;
        }
        assert_eq!(chunk.voxel(1, 2, 3), Some(&Voxel::solid(Material::Wood)));
        assert!(chunk.is_solid_at(1, 2, 3));
        assert_eq!(chunk.solid_count(), 1);
    }

    #[test]
    fn test_out_of_bounds_writes_are_dropped() {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0), 4, 4);
        assert!(!chunk.set_voxel(-1, 0, 0, Voxel::solid(Material::Leaves)));
        assert!(!chunk.set_voxel(0, 4, 0, Voxel::solid(Material::Leaves)));
        assert!(!chunk.set_voxel(0, 0, 4, Voxel::solid(Material::Leaves)));
        assert!(chunk.set_voxel(3, 3, 3, Voxel::solid(Material::Leaves)));
        assert_eq!(chunk.solid_count(), 1);
        assert!(!chunk.is_solid_at(4, 0, 0));
        assert!(chunk.voxel(0, 0, 4).is_none());
    }

    #[test]
    fn test_storage_order_is_layered_by_y() {
        let chunk = Chunk::new(ChunkCoord::new(0, 0), 3, 2);
        assert_eq!(chunk.index(0, 0, 0), Some(0));
        assert_eq!(chunk.index(1, 0, 0), Some(1));
        assert_eq!(chunk.index(0, 0, 1), Some(3));
        assert_eq!(chunk.index(0, 1, 0), Some(9));
        assert_eq!(chunk.index(2, 1, 2), Some(17));
    }
}
