//! # Configuration
//!
//! Every tunable of the terrain core: chunk dimensions, streaming radius, the
//! rate limiters of the generation pipeline, and the noise and terrain
//! thresholds. All structs deserialize with defaults for missing fields, so a
//! JSON file only needs to name what it changes.
//!
//! ```json
//! {
//!     "chunk_size": 16,
//!     "render_distance": 6,
//!     "height_noise": { "seed": 42, "frequency": 0.004 }
//! }
//! ```

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// The largest octave count the fractal noise accepts.
pub const MAX_OCTAVES: u32 = 32;

/// Parameters of one fractal noise field.
///
/// Immutable once a [`NoiseField`](crate::NoiseField) is built from it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub seed: i64,
    /// Base frequency in cycles per world unit.
    pub frequency: f32,
    pub octaves: u32,
    /// Frequency multiplier between octaves.
    pub lacunarity: f32,
    /// Amplitude multiplier between octaves.
    pub gain: f32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        NoiseConfig {
            seed: 1337,
            frequency: 0.01,
            octaves: 5,
            lacunarity: 2.0,
            gain: 0.5,
        }
    }
}

impl NoiseConfig {
    /// Convenience constructor for a config differing from the default only
    /// in seed and frequency.
    pub fn with_seed(seed: i64, frequency: f32) -> Self {
        NoiseConfig {
            seed,
            frequency,
            ..Default::default()
        }
    }

    fn validate(&self, field: &'static str) -> Result<()> {
        if self.octaves == 0 || self.octaves > MAX_OCTAVES {
            return Err(ConfigError::invalid(
                field,
                format!("octaves must be in 1..={MAX_OCTAVES}, got {}", self.octaves),
            ));
        }
        for (name, value) in [
            ("frequency", self.frequency),
            ("lacunarity", self.lacunarity),
            ("gain", self.gain),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::invalid(
                    field,
                    format!("{name} must be finite and positive, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

/// Height-band thresholds and tree placement parameters.
///
/// Band fractions are relative to the chunk height. Their ordering
/// (water below grass and stone, snow on top) is enforced by validation; the
/// exact values are free to tune.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Fraction of the height filled with water unconditionally.
    pub sea_level: f32,
    /// Fraction of the height above which solid voxels are snow.
    pub snow_line: f32,
    /// Fraction of the height above which stone may replace grass.
    pub stone_line: f32,
    /// Stone noise value above which a column shows stone.
    pub stone_threshold: f32,
    /// Tree noise value above which a column may grow a tree.
    pub tree_threshold: f32,
    /// Probability that an eligible column actually grows a tree.
    pub tree_chance: f32,
    /// Trunk length in voxels.
    pub trunk_height: u32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        TerrainConfig {
            sea_level: 0.1,
            snow_line: 0.9,
            stone_line: 0.6,
            stone_threshold: 0.7,
            tree_threshold: 0.3,
            tree_chance: 0.02,
            trunk_height: 4,
        }
    }
}

impl TerrainConfig {
    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("terrain.sea_level", self.sea_level),
            ("terrain.snow_line", self.snow_line),
            ("terrain.stone_line", self.stone_line),
            ("terrain.stone_threshold", self.stone_threshold),
            ("terrain.tree_threshold", self.tree_threshold),
            ("terrain.tree_chance", self.tree_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be within [0, 1], got {value}"),
                ));
            }
        }
        if self.sea_level > self.snow_line {
            return Err(ConfigError::invalid(
                "terrain.sea_level",
                format!(
                    "sea level {} lies above the snow line {}",
                    self.sea_level, self.snow_line
                ),
            ));
        }
        if self.trunk_height == 0 {
            return Err(ConfigError::invalid("terrain.trunk_height", "must be at least 1"));
        }
        Ok(())
    }
}

/// Top-level configuration of the streaming terrain core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Voxels per chunk side along X and Z.
    pub chunk_size: u32,
    /// Voxels per chunk along Y.
    pub chunk_height: u32,
    /// Chebyshev radius, in chunks, of the loaded window.
    pub render_distance: u32,
    /// Maximum chunks handed to workers per tick.
    pub chunks_dispatched_per_tick: usize,
    /// Ready-queue depth above which dispatch pauses.
    pub gpu_upload_limit: usize,
    /// Maximum chunks uploaded per frame.
    pub chunks_uploaded_per_frame: usize,
    /// Worker thread count; the machine's available parallelism when unset.
    pub worker_count: Option<usize>,
    pub height_noise: NoiseConfig,
    pub stone_noise: NoiseConfig,
    pub tree_noise: NoiseConfig,
    pub terrain: TerrainConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            chunk_size: 32,
            chunk_height: 64,
            render_distance: 4,
            chunks_dispatched_per_tick: 4,
            gpu_upload_limit: 16,
            chunks_uploaded_per_frame: 2,
            worker_count: None,
            height_noise: NoiseConfig::default(),
            stone_noise: NoiseConfig {
                seed: 7331,
                frequency: 0.05,
                octaves: 3,
                ..Default::default()
            },
            tree_noise: NoiseConfig {
                seed: 4242,
                frequency: 0.08,
                octaves: 2,
                ..Default::default()
            },
            terrain: TerrainConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Arguments
    /// * `text` - JSON text; missing fields take their defaults
    ///
    /// # Returns
    /// The validated configuration, or the parse or validation error.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: WorldConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        info!("Loaded world config from {}", path.display());
        Ok(config)
    }

    /// Checks every field for values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ConfigError::invalid("chunk_size", "must be at least 1"));
        }
        if self.chunk_height == 0 {
            return Err(ConfigError::invalid("chunk_height", "must be at least 1"));
        }
        if self.chunks_dispatched_per_tick == 0 {
            return Err(ConfigError::invalid(
                "chunks_dispatched_per_tick",
                "must be at least 1",
            ));
        }
        if self.chunks_uploaded_per_frame == 0 {
            return Err(ConfigError::invalid(
                "chunks_uploaded_per_frame",
                "must be at least 1",
            ));
        }
        if self.worker_count == Some(0) {
            return Err(ConfigError::invalid(
                "worker_count",
                "must be at least 1 when set",
            ));
        }
        self.height_noise.validate("height_noise")?;
        self.stone_noise.validate("stone_noise")?;
        self.tree_noise.validate("tree_noise")?;
        self.terrain.validate()
    }

    /// Number of worker threads to start.
    pub fn resolved_worker_count(&self) -> usize {
        self.worker_count.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Number of chunks inside the loaded window.
    pub fn window_chunk_count(&self) -> usize {
        let side = 2 * self.render_distance as usize + 1;
        side * side
    }
}
