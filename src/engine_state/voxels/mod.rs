//! # Voxel Terrain Core
//!
//! This module contains the voxel side of the engine: representing, generating
//! and streaming a column-chunked voxel world.
//!
//! ## Architecture
//!
//! * **Block**: Voxel values, materials and face directions
//! * **Chunk**: Fixed-size owned voxel grids addressed by a 2D grid coordinate
//! * **Noise**: Seeded fractal noise fields
//! * **Terrain**: Fills chunks from noise: material bands, stone veins and trees
//! * **Streaming**: Loads and unloads chunks around the observer
//! * **Tasks**: Chunk generation work that runs on the worker pool
//!
//! ## Data Flow
//!
//! 1. The streaming manager receives the observer position each tick
//! 2. Chunks entering the render distance are queued and dispatched to workers
//! 3. Workers populate the voxels and build the greedy mesh
//! 4. Finished chunks are uploaded to the render backend in bounded batches
//!
//! ## Thread Safety
//!
//! * A chunk is owned by exactly one thread at a time
//! * The terrain generator and mesher are immutable and shared via `Arc`
//! * Streaming bookkeeping is main-thread only

pub mod block;
pub mod chunk;
pub mod noise;
pub mod streaming;
pub mod tasks;
pub mod terrain;
