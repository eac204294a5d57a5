#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Terrain
//!
//! A streaming, chunk-based voxel terrain core: procedural terrain from
//! fractal noise, greedy meshing, and a chunk streaming manager that keeps a
//! window of chunks around an observer generated, meshed and uploaded.
//!
//! ## Key Modules
//!
//! * `engine_state` - Voxels, meshing, the worker pool and streaming
//! * `error` - Configuration errors
//!
//! ## Architecture
//!
//! The core never touches a graphics API or a window. Finished meshes go
//! through a [`RenderBackend`], and the observer is just a world position fed
//! to [`ChunkStreamingManager::update`] once per frame.
//!
//! ## Usage
//!
//! ```no_run
//! use voxel_terrain::{ChunkStreamingManager, NullBackend, WorldConfig};
//!
//! let mut streaming = ChunkStreamingManager::new(WorldConfig::default(), NullBackend::new())?;
//! loop {
//!     streaming.update([0.0, 0.0, 0.0]);
//!     streaming.render();
//! }
//! # Ok::<(), voxel_terrain::ConfigError>(())
//! ```

use std::path::PathBuf;

use log::info;
use web_time::Instant;

pub mod engine_state;
pub mod error;

pub use engine_state::config::{NoiseConfig, TerrainConfig, WorldConfig};
pub use engine_state::rendering::meshing::{ChunkMesher, CulledMesher, GreedyMesher, Mesh, Quad};
pub use engine_state::rendering::{NullBackend, RenderBackend, Vertex};
pub use engine_state::voxels::block::{block_side::FaceDirection, block_type::Material, Voxel};
pub use engine_state::voxels::chunk::{Chunk, ChunkCoord, ChunkState};
pub use engine_state::voxels::noise::NoiseField;
pub use engine_state::voxels::streaming::{ChunkStreamingManager, StreamingStats, TickReport};
pub use engine_state::voxels::terrain::TerrainGenerator;
pub use error::{ConfigError, Result};

/// World units the demo observer moves along +X per tick.
const OBSERVER_SPEED: f32 = 2.0;
/// Ticks the demo runs when no count is given.
const DEFAULT_TICKS: usize = 600;
/// Upper bound on warm-up ticks before the walk starts.
const WARM_UP_TICKS: usize = 100_000;

/// Command line of the headless demo.
#[derive(Debug, Default, PartialEq)]
pub struct DemoArgs {
    pub config_path: Option<PathBuf>,
    pub ticks: Option<usize>,
}

impl DemoArgs {
    /// Parses `[config.json] [ticks]`. A lone numeric argument is a tick count.
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Self {
        let mut parsed = DemoArgs::default();
        for arg in args {
            match arg.parse::<usize>() {
                Ok(ticks) if parsed.ticks.is_none() => parsed.ticks = Some(ticks),
                _ if parsed.config_path.is_none() => parsed.config_path = Some(arg.into()),
                _ => {}
            }
        }
        parsed
    }
}

/// Runs the headless streaming demo.
///
/// Loads the configuration (defaults when no path is given), warms up the
/// window around the origin, then walks the observer along +X against a
/// [`NullBackend`], logging what streaming does.
pub fn run() -> Result<()> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();
    info!("Logger initialized");

    let args = DemoArgs::parse(std::env::args().skip(1));
    let config = match &args.config_path {
        Some(path) => WorldConfig::from_json_file(path)?,
        None => WorldConfig::default(),
    };
    let ticks = args.ticks.unwrap_or(DEFAULT_TICKS);

    let mut streaming = ChunkStreamingManager::new(config, NullBackend::new())?;

    let start = Instant::now();
    let warm_up = streaming.flush([0.0; 3], WARM_UP_TICKS);
    info!(
        "Warm-up finished in {} ticks ({:?}): {} chunks active",
        warm_up,
        start.elapsed(),
        streaming.active_chunks().len()
    );

    let start = Instant::now();
    let mut observer = [0.0f32; 3];
    for tick in 0..ticks {
        observer[0] += OBSERVER_SPEED;
        let report = streaming.update(observer);
        streaming.render();
        if report.evicted > 0 || report.discarded > 0 {
            info!("Tick {tick} at chunk {:?}: {:?}", streaming.current_chunk(), report);
        }
    }

    let backend = streaming.backend();
    info!("Walked {} ticks in {:?}", ticks, start.elapsed());
    info!("Final stats: {:?}", streaming.stats());
    info!(
        "Backend: {} uploads, {} releases, {} vertices resident",
        backend.uploads, backend.releases, backend.resident_vertices
    );
    Ok(())
}
