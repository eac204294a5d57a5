//! # Terrain Generation
//!
//! Fills a chunk's voxel grid from three noise fields: one for column height,
//! one for stone banding and one for tree placement.
//!
//! ## Height Bands
//!
//! From the bottom of the chunk upwards:
//! * a water floor up to the sea level, filled unconditionally
//! * grass, replaced by stone in the upper part of the band where the stone
//!   noise is high
//! * snow above the snow line
//!
//! Trees only grow on grass and never cross a chunk boundary.

use log::trace;

use super::{
    block::{block_type::Material, Voxel},
    chunk::{Chunk, ChunkCoord},
    noise::NoiseField,
};
use crate::engine_state::config::{TerrainConfig, WorldConfig};

/// The three noise values that decide one column, each in `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColumnSample {
    pub height: f32,
    pub stone: f32,
    pub tree: f32,
}

/// Deterministic terrain generator shared by all workers.
#[derive(Clone, Debug)]
pub struct TerrainGenerator {
    chunk_size: u32,
    chunk_height: u32,
    height: NoiseField,
    stone: NoiseField,
    tree: NoiseField,
    config: TerrainConfig,
}

/// Precomputed band boundaries in voxel rows.
struct Bands {
    sea_top: usize,
    stone_start: usize,
    snow_start: usize,
}

impl TerrainGenerator {
    /// Builds a generator from the world configuration.
    pub fn new(config: &WorldConfig) -> Self {
        TerrainGenerator {
            chunk_size: config.chunk_size,
            chunk_height: config.chunk_height,
            height: NoiseField::new(config.height_noise.clone()),
            stone: NoiseField::new(config.stone_noise.clone()),
            tree: NoiseField::new(config.tree_noise.clone()),
            config: config.terrain.clone(),
        }
    }

    pub fn terrain_config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Creates and populates the chunk at `coord`.
    pub fn generate(&self, coord: ChunkCoord) -> Chunk {
        let mut chunk = Chunk::new(coord, self.chunk_size, self.chunk_height);
        self.populate(&mut chunk);
        chunk
    }

    /// Fills every voxel of `chunk` in place from the noise fields.
    pub fn populate(&self, chunk: &mut Chunk) {
        self.populate_with(chunk, |x, z| self.sample_column(x, z));
    }

    /// Samples all three noise fields for a world-space column.
    pub fn sample_column(&self, world_x: i64, world_z: i64) -> ColumnSample {
        let (x, z) = (world_x as f64, world_z as f64);
        ColumnSample {
            height: self.height.sample_unit(x, z),
            stone: self.stone.sample_unit(x, z),
            tree: self.tree.sample_unit(x, z),
        }
    }

    /// Fills every voxel of `chunk` using `sample` for each world-space column.
    ///
    /// # Arguments
    /// * `chunk` - The chunk to overwrite
    /// * `sample` - Maps a world `(x, z)` to its column sample. Values are
    ///   clamped to `[0, 1]`.
    pub fn populate_with<F>(&self, chunk: &mut Chunk, sample: F)
    where
        F: Fn(i64, i64) -> ColumnSample,
    {
        chunk.fill(Voxel::AIR);

        let size = chunk.size() as usize;
        let height = chunk.height() as usize;
        let bands = self.bands(height);
        let coord = chunk.coord();

        for z in 0..size {
            for x in 0..size {
                let (world_x, world_z) = coord.world_column(chunk.size(), x, z);
                let column = sample(world_x, world_z);
                let column_height = column.height.clamp(0.0, 1.0);
                let stone = column.stone.clamp(0.0, 1.0);
                let tree = column.tree.clamp(0.0, 1.0);

                for y in 0..bands.sea_top {
                    chunk.set_voxel(x as i64, y as i64, z as i64, Voxel::solid(Material::Water));
                }

                let top = ((column_height * height as f32).floor() as usize).min(height);
                for y in 0..top {
                    let material = self.band_material(y, stone, &bands);
                    chunk.set_voxel(x as i64, y as i64, z as i64, Voxel::solid(material));
                }

                if top > bands.sea_top
                    && chunk.voxel(x, top - 1, z).map(|v| v.material) == Some(Material::Grass)
                    && tree > self.config.tree_threshold
                    && self.tree_roll(world_x, world_z) < self.config.tree_chance
                {
                    self.place_tree(chunk, x as i64, top as i64, z as i64);
                }
            }
        }

        trace!(
            "Populated chunk {} with {} solid voxels",
            coord,
            chunk.solid_count()
        );
    }

    fn bands(&self, height: usize) -> Bands {
        let rows = |fraction: f32| ((fraction * height as f32).floor() as usize).min(height);
        Bands {
            sea_top: rows(self.config.sea_level),
            stone_start: rows(self.config.stone_line),
            snow_start: rows(self.config.snow_line),
        }
    }

    fn band_material(&self, y: usize, stone: f32, bands: &Bands) -> Material {
        if y >= bands.snow_start {
            Material::Snow
        } else if y < bands.sea_top {
            Material::Water
        } else if stone > self.config.stone_threshold && y >= bands.stone_start {
            Material::Stone
        } else {
            Material::Grass
        }
    }

    /// A uniform draw in `[0, 1)` that depends only on the column and the tree seed.
    fn tree_roll(&self, world_x: i64, world_z: i64) -> f32 {
        let seed = (self.tree.config().seed as u64)
            ^ (world_x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ (world_z as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
        fastrand::Rng::with_seed(seed).f32()
    }

    /// Places a trunk with a five-leaf crown on top of the voxel below `base_y`.
    ///
    /// Nothing is written unless the whole tree fits inside the chunk.
    fn place_tree(&self, chunk: &mut Chunk, x: i64, base_y: i64, z: i64) {
        let trunk_height = self.config.trunk_height as i64;
        let crown_y = base_y + trunk_height - 1;

        let leaves = [
            [x - 1, crown_y, z],
            [x + 1, crown_y, z],
            [x, crown_y, z - 1],
            [x, crown_y, z + 1],
            [x, crown_y + 1, z],
        ];
        if !chunk.contains_all(&leaves) || !chunk.contains_all(&[[x, base_y, z]]) {
            return;
        }

        for y in base_y..=crown_y {
            chunk.set_voxel(x, y, z, Voxel::solid(Material::Wood));
        }
        for [lx, ly, lz] in leaves {
            chunk.set_voxel(lx, ly, lz, Voxel::solid(Material::Leaves));
        }
    }
}
