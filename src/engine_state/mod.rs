//! # Engine State Module
//!
//! The subsystems of the terrain core.
//!
//! ## Key Components
//!
//! * `config` - World configuration and its validation
//! * `rendering` - Vertex format, meshing and the render backend boundary
//! * `task_management` - Worker pool for chunk generation
//! * `voxels` - Voxel data, chunks, terrain generation and streaming
//!
//! ## Architecture
//!
//! Subsystems are leaf-first: voxels and meshing know nothing about threads,
//! the task manager knows nothing about voxels, and the streaming manager in
//! `voxels::streaming` ties them together with a [`rendering::RenderBackend`].

pub mod config;
pub mod rendering;
pub mod task_management;
pub mod voxels;
