//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask` which populates a chunk's
//! voxels and meshes it on a worker thread. The streaming manager schedules one
//! whenever a chunk enters the render distance.

use std::sync::Arc;

use web_time::Instant;

use crate::engine_state::{
    rendering::meshing::{ChunkMesher, GreedyMesher},
    task_management::task::Task,
    voxels::{
        chunk::{Chunk, ChunkCoord, ChunkState},
        terrain::TerrainGenerator,
    },
};

/// A task that generates and meshes one chunk.
///
/// The chunk is created and exclusively owned by the worker until it is sent
/// back as a [`GeneratedChunk`].
pub struct ChunkGenerationTask {
    coord: ChunkCoord,
    /// Dispatch sequence number echoed back in the result
    ticket: u64,
    generator: Arc<TerrainGenerator>,
    mesher: Arc<GreedyMesher>,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    ///
    /// # Arguments
    /// * `coord` - The chunk to generate
    /// * `ticket` - Identifies this dispatch, so stale results can be told apart
    /// * `generator` - Shared terrain generator
    /// * `mesher` - Shared mesher
    pub fn new(
        coord: ChunkCoord,
        ticket: u64,
        generator: Arc<TerrainGenerator>,
        mesher: Arc<GreedyMesher>,
    ) -> Self {
        ChunkGenerationTask {
            coord,
            ticket,
            generator,
            mesher,
        }
    }
}

/// A populated, meshed chunk on its way back to the main thread.
pub struct GeneratedChunk {
    pub chunk: Chunk,
    pub ticket: u64,
    /// Wall time spent on the worker, in microseconds
    pub elapsed_micros: u64,
}

impl Task for ChunkGenerationTask {
    type Output = GeneratedChunk;

    fn process(self) -> GeneratedChunk {
        let start = Instant::now();
        let mut chunk = self.generator.generate(self.coord);
        let mesh = self.mesher.generate_mesh(&chunk);
        chunk.set_mesh(mesh);
        chunk.set_state(ChunkState::ReadyToUpload);

        GeneratedChunk {
            chunk,
            ticket: self.ticket,
            elapsed_micros: start.elapsed().as_micros() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::config::WorldConfig;

    #[test]
    fn test_task_produces_ready_chunk() {
        let config = WorldConfig {
            chunk_size: 8,
            chunk_height: 16,
            ..WorldConfig::default()
        };
        let generator = Arc::new(TerrainGenerator::new(&config));
        let task = ChunkGenerationTask::new(
            ChunkCoord::new(-2, 5),
            17,
            Arc::clone(&generator),
            Arc::new(GreedyMesher::new()),
        );

        let result = task.process();
        assert_eq!(result.ticket, 17);
        assert_eq!(result.chunk.coord(), ChunkCoord::new(-2, 5));
        assert_eq!(result.chunk.state(), ChunkState::ReadyToUpload);
        assert!(result.chunk.mesh().validate());
        assert!(!result.chunk.mesh().is_empty());

        let expected = GreedyMesher.generate_mesh(&generator.generate(ChunkCoord::new(-2, 5)));
        assert_eq!(result.chunk.mesh(), &expected);
    }
}
