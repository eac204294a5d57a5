//! # Voxel Task System
//!
//! Tasks related to voxel world generation that run on the worker pool.

pub mod chunk_generation_task;
