//! # Chunk Streaming
//!
//! Keeps the set of loaded chunks matched to a square window around the
//! observer. Each tick diffs the window against what is loaded, evicts chunks
//! that fell out of range, queues new ones nearest first, hands a bounded batch
//! to the worker pool and uploads a bounded batch of finished meshes.
//!
//! ## Chunk lifecycle
//! `Queued` → `Generating` → `ReadyToUpload` (on the worker) → `Active`.
//! A chunk can be evicted in any state. Work already handed to a worker is not
//! cancelled; its result is recognised as stale on arrival and dropped.
//!
//! ## Thread Safety
//! Everything in here runs on the main thread. Workers only see their own
//! chunk plus the shared, immutable generator and mesher.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

use crate::{
    engine_state::{
        config::WorldConfig,
        rendering::{meshing::GreedyMesher, RenderBackend},
        task_management::TaskManager,
        voxels::{
            chunk::{Chunk, ChunkCoord, ChunkState},
            tasks::chunk_generation_task::{ChunkGenerationTask, GeneratedChunk},
            terrain::TerrainGenerator,
        },
    },
    error::Result,
};

/// How long [`ChunkStreamingManager::flush`] blocks for a result between ticks.
const FLUSH_WAIT: Duration = Duration::from_millis(50);

/// What a single [`ChunkStreamingManager::update`] did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub evicted: usize,
    pub enqueued: usize,
    pub dispatched: usize,
    pub uploaded: usize,
    /// Stale results dropped on arrival
    pub discarded: usize,
    /// Dispatch was skipped because the ready queue was over the upload limit
    pub backpressured: bool,
}

impl TickReport {
    fn is_quiet(&self) -> bool {
        *self == TickReport::default()
    }
}

/// Cumulative counters plus the current queue depths.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamingStats {
    pub ticks: u64,
    pub enqueued: u64,
    pub dispatched: u64,
    pub uploaded: u64,
    pub discarded: u64,
    pub evicted: u64,
    pub backpressured_ticks: u64,
    /// Coords waiting for dispatch
    pub pending: usize,
    /// Tasks queued in or running on the worker pool
    pub in_flight: usize,
    /// Finished chunks waiting for upload
    pub ready: usize,
    pub loaded: usize,
    pub active: usize,
}

/// Bookkeeping for one loaded coordinate.
struct ChunkEntry<H> {
    state: ChunkState,
    /// Ticket of the dispatch this entry is waiting for, 0 before dispatch
    ticket: u64,
    /// Present once the chunk is active
    chunk: Option<Chunk>,
    handle: Option<H>,
}

impl<H> ChunkEntry<H> {
    fn queued() -> Self {
        ChunkEntry {
            state: ChunkState::Queued,
            ticket: 0,
            chunk: None,
            handle: None,
        }
    }
}

/// Streams chunks in and out around an observer.
///
/// # Fields
/// - `loaded`: Every coordinate the manager currently tracks, in any state
/// - `active`: Coordinates with an uploaded mesh, in upload order
/// - `pending`: Coordinates waiting for a worker, nearest first
pub struct ChunkStreamingManager<B: RenderBackend> {
    config: WorldConfig,
    backend: B,
    generator: Arc<TerrainGenerator>,
    mesher: Arc<GreedyMesher>,
    task_manager: TaskManager<ChunkGenerationTask>,
    loaded: HashMap<ChunkCoord, ChunkEntry<B::Handle>>,
    active: Vec<ChunkCoord>,
    pending: VecDeque<ChunkCoord>,
    current: Option<ChunkCoord>,
    next_ticket: u64,
    stats: StreamingStats,
}

impl<B: RenderBackend> ChunkStreamingManager<B> {
    /// Creates a streaming manager and starts its worker pool.
    ///
    /// # Arguments
    /// * `config` - World configuration; validated here
    /// * `backend` - Receives every mesh upload and release
    ///
    /// # Returns
    /// The manager, or the validation error of `config`.
    pub fn new(config: WorldConfig, backend: B) -> Result<Self> {
        let workers = config.resolved_worker_count();
        Self::with_worker_count(config, backend, workers)
    }

    /// Like [`new`](Self::new) with an explicit worker count.
    ///
    /// With `workers == 0` chunks are generated on the calling thread during
    /// dispatch, which makes every tick fully deterministic.
    pub fn with_worker_count(config: WorldConfig, backend: B, workers: usize) -> Result<Self> {
        config.validate()?;
        info!(
            "Starting chunk streaming: {}x{}x{} chunks, render distance {}, {} workers",
            config.chunk_size,
            config.chunk_height,
            config.chunk_size,
            config.render_distance,
            workers
        );

        Ok(ChunkStreamingManager {
            generator: Arc::new(TerrainGenerator::new(&config)),
            mesher: Arc::new(GreedyMesher::new()),
            task_manager: TaskManager::new(workers),
            config,
            backend,
            loaded: HashMap::new(),
            active: Vec::new(),
            pending: VecDeque::new(),
            current: None,
            next_ticket: 1,
            stats: StreamingStats::default(),
        })
    }

    /// Advances streaming by one tick.
    ///
    /// # Arguments
    /// * `observer` - World position of the observer; only X and Z are used
    ///
    /// # Returns
    /// A [`TickReport`] of what this tick changed.
    pub fn update(&mut self, observer: [f32; 3]) -> TickReport {
        let mut report = TickReport::default();

        let current = ChunkCoord::from_world(observer[0], observer[2], self.config.chunk_size);
        if self.current != Some(current) {
            if let Some(previous) = self.current {
                debug!("Observer moved from chunk {} to {}", previous, current);
            }
            self.current = Some(current);
            report.evicted = self.evict_out_of_range(current);
            report.enqueued = self.enqueue_window(current);
        }

        if self.task_manager.ready_len() > self.config.gpu_upload_limit {
            report.backpressured = true;
        } else {
            report.dispatched = self.dispatch();
        }
        self.task_manager.process_queued_tasks();

        let (uploaded, discarded) = self.upload_ready();
        report.uploaded = uploaded;
        report.discarded = discarded;

        self.record(&report);
        if !report.is_quiet() {
            debug!("Tick {}: {:?}", self.stats.ticks, report);
        }
        report
    }

    /// Removes every loaded chunk outside the render distance of `current`.
    fn evict_out_of_range(&mut self, current: ChunkCoord) -> usize {
        let render_distance = self.config.render_distance as u64;
        let out_of_range: Vec<ChunkCoord> = self
            .loaded
            .keys()
            .filter(|coord| coord.chebyshev_distance(&current) > render_distance)
            .copied()
            .collect();

        for coord in &out_of_range {
            if let Some(entry) = self.loaded.remove(coord) {
                if let Some(handle) = entry.handle {
                    self.backend.release(handle);
                }
            }
        }
        if !out_of_range.is_empty() {
            let loaded = &self.loaded;
            self.active.retain(|coord| loaded.contains_key(coord));
            self.pending.retain(|coord| loaded.contains_key(coord));
        }
        out_of_range.len()
    }

    /// Queues every coordinate of the window around `current` that is not
    /// loaded yet, ring by ring.
    fn enqueue_window(&mut self, current: ChunkCoord) -> usize {
        let mut enqueued = 0;
        for coord in window_ring_order(current, self.config.render_distance as i64) {
            if self.loaded.contains_key(&coord) {
                continue;
            }
            self.loaded.insert(coord, ChunkEntry::queued());
            self.pending.push_back(coord);
            enqueued += 1;
        }
        // Coords left over from an earlier window go behind nearer ones.
        self.pending
            .make_contiguous()
            .sort_by_key(|coord| coord.chebyshev_distance(&current));
        enqueued
    }

    /// Hands up to `chunks_dispatched_per_tick` queued chunks to the workers.
    fn dispatch(&mut self) -> usize {
        let mut dispatched = 0;
        while dispatched < self.config.chunks_dispatched_per_tick {
            let Some(coord) = self.pending.pop_front() else {
                break;
            };
            let Some(entry) = self.loaded.get_mut(&coord) else {
                continue;
            };
            if entry.state != ChunkState::Queued {
                continue;
            }

            let ticket = self.next_ticket;
            self.next_ticket += 1;
            entry.state = ChunkState::Generating;
            entry.ticket = ticket;

            self.task_manager.publish_task(ChunkGenerationTask::new(
                coord,
                ticket,
                Arc::clone(&self.generator),
                Arc::clone(&self.mesher),
            ));
            dispatched += 1;
        }
        dispatched
    }

    /// Uploads up to `chunks_uploaded_per_frame` finished chunks.
    ///
    /// # Returns
    /// `(uploaded, discarded)`
    fn upload_ready(&mut self) -> (usize, usize) {
        let (mut uploaded, mut discarded) = (0, 0);
        for _ in 0..self.config.chunks_uploaded_per_frame {
            let Some(GeneratedChunk {
                mut chunk,
                ticket,
                elapsed_micros,
            }) = self.task_manager.try_recv()
            else {
                break;
            };
            let coord = chunk.coord();

            let entry = match self.loaded.get_mut(&coord) {
                Some(entry) if entry.ticket == ticket && entry.state == ChunkState::Generating => {
                    entry
                }
                _ => {
                    debug!("Discarding stale chunk {} (ticket {})", coord, ticket);
                    discarded += 1;
                    continue;
                }
            };

            let offset = chunk.world_origin().into();
            let handle = self.backend.upload(coord, chunk.mesh(), offset);
            chunk.set_state(ChunkState::Active);
            entry.state = ChunkState::Active;
            entry.handle = Some(handle);
            entry.chunk = Some(chunk);
            self.active.push(coord);
            uploaded += 1;
            debug!("Chunk {} active after {}us on a worker", coord, elapsed_micros);
        }
        (uploaded, discarded)
    }

    fn record(&mut self, report: &TickReport) {
        let stats = &mut self.stats;
        stats.ticks += 1;
        stats.enqueued += report.enqueued as u64;
        stats.dispatched += report.dispatched as u64;
        stats.uploaded += report.uploaded as u64;
        stats.discarded += report.discarded as u64;
        stats.evicted += report.evicted as u64;
        if report.backpressured {
            stats.backpressured_ticks += 1;
        }
    }

    /// Whether nothing is pending, generating or waiting for upload.
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty() && self.task_manager.is_idle()
    }

    /// Runs ticks at a fixed observer position until streaming settles.
    ///
    /// Between ticks that uploaded nothing, blocks briefly for a worker result.
    ///
    /// # Returns
    /// The number of ticks run, at most `max_ticks`.
    pub fn flush(&mut self, observer: [f32; 3], max_ticks: usize) -> usize {
        for tick in 1..=max_ticks {
            let report = self.update(observer);
            if self.is_settled() {
                return tick;
            }
            if report.uploaded == 0 {
                self.task_manager.wait_ready(FLUSH_WAIT);
            }
        }
        max_ticks
    }

    /// Draws every active chunk, in upload order.
    pub fn render(&mut self) {
        for coord in &self.active {
            if let Some(handle) = self.loaded.get(coord).and_then(|e| e.handle.as_ref()) {
                self.backend.draw(handle);
            }
        }
    }

    /// Coordinates with an uploaded mesh, in upload order.
    pub fn active_chunks(&self) -> &[ChunkCoord] {
        &self.active
    }

    /// Number of tracked coordinates in any state.
    pub fn loaded_len(&self) -> usize {
        self.loaded.len()
    }

    /// The lifecycle state of `coord`; `Unloaded` if it is not tracked.
    pub fn state_of(&self, coord: ChunkCoord) -> ChunkState {
        self.loaded
            .get(&coord)
            .map(|entry| entry.state)
            .unwrap_or(ChunkState::Unloaded)
    }

    /// The chunk at `coord`, once it is active.
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.loaded.get(&coord).and_then(|entry| entry.chunk.as_ref())
    }

    /// The chunk the observer stood in on the last tick.
    pub fn current_chunk(&self) -> Option<ChunkCoord> {
        self.current
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn stats(&self) -> StreamingStats {
        StreamingStats {
            pending: self.pending.len(),
            in_flight: self.task_manager.queued_len() + self.task_manager.in_flight(),
            ready: self.task_manager.ready_len(),
            loaded: self.loaded.len(),
            active: self.active.len(),
            ..self.stats
        }
    }
}

/// Every coordinate within `radius` of `center`, ring by ring outwards.
///
/// Within a ring, coordinates are ordered by `z`, then `x`.
pub fn window_ring_order(center: ChunkCoord, radius: i64) -> impl Iterator<Item = ChunkCoord> {
    (0..=radius).flat_map(move |ring| {
        (-ring..=ring).flat_map(move |dz| {
            (-ring..=ring)
                .filter(move |dx| dx.abs().max(dz.abs()) == ring)
                .map(move |dx| ChunkCoord::new(center.x + dx, center.z + dz))
        })
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::engine_state::rendering::NullBackend;

    fn small_config() -> WorldConfig {
        WorldConfig {
            chunk_size: 4,
            chunk_height: 8,
            render_distance: 1,
            chunks_dispatched_per_tick: 4,
            gpu_upload_limit: 16,
            chunks_uploaded_per_frame: 2,
            worker_count: Some(2),
            ..WorldConfig::default()
        }
    }

    fn inline_manager(config: WorldConfig) -> ChunkStreamingManager<NullBackend> {
        ChunkStreamingManager::with_worker_count(config, NullBackend::new(), 0).unwrap()
    }

    fn assert_window_invariants(manager: &ChunkStreamingManager<NullBackend>) {
        let current = manager.current_chunk().unwrap();
        let radius = manager.config().render_distance as u64;
        let unique: HashSet<_> = manager.active_chunks().iter().collect();
        assert_eq!(unique.len(), manager.active_chunks().len());
        for coord in manager.active_chunks() {
            assert!(coord.chebyshev_distance(&current) <= radius);
            assert_eq!(manager.state_of(*coord), ChunkState::Active);
        }
        assert!(manager.active_chunks().len() <= manager.loaded_len());
        assert_eq!(manager.backend().live_handles(), manager.active_chunks().len());
    }

    #[test]
    fn test_ring_order_is_nearest_first() {
        let center = ChunkCoord::new(5, -3);
        let coords: Vec<_> = window_ring_order(center, 2).collect();
        assert_eq!(coords.len(), 25);
        assert_eq!(coords[0], center);
        let distances: Vec<_> = coords.iter().map(|c| c.chebyshev_distance(&center)).collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
        let unique: HashSet<_> = coords.iter().collect();
        assert_eq!(unique.len(), 25);
    }

    #[test]
    fn test_first_tick_respects_rate_limits() {
        let mut manager = inline_manager(small_config());
        let report = manager.update([0.5, 0.0, 0.5]);
        assert_eq!(report.enqueued, 9);
        assert_eq!(report.dispatched, 4);
        assert_eq!(report.uploaded, 2);
        assert_eq!(manager.state_of(ChunkCoord::new(0, 0)), ChunkState::Active);
        assert_eq!(manager.loaded_len(), 9);
        assert_window_invariants(&manager);
    }

    #[test]
    fn test_flush_activates_whole_window() {
        let mut manager = inline_manager(small_config());
        manager.flush([0.0, 0.0, 0.0], 100);
        assert_eq!(manager.active_chunks().len(), 9);
        assert!(manager.is_settled());
        assert_window_invariants(&manager);

        let stats = manager.stats();
        assert_eq!(stats.uploaded, 9);
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.ready, 0);
    }

    #[test]
    fn test_flush_with_worker_threads() {
        let mut manager =
            ChunkStreamingManager::new(small_config(), NullBackend::new()).unwrap();
        manager.flush([-3.0, 0.0, 9.0], 10_000);
        assert_eq!(manager.current_chunk(), Some(ChunkCoord::new(-1, 2)));
        assert_eq!(manager.active_chunks().len(), 9);
        assert_window_invariants(&manager);
    }

    #[test]
    fn test_backpressure_pauses_dispatch() {
        let config = WorldConfig {
            render_distance: 2,
            gpu_upload_limit: 1,
            chunks_uploaded_per_frame: 1,
            ..small_config()
        };
        let mut manager = inline_manager(config);

        let first = manager.update([0.0; 3]);
        assert_eq!(first.dispatched, 4);
        assert_eq!(first.uploaded, 1);

        let second = manager.update([0.0; 3]);
        assert!(second.backpressured);
        assert_eq!(second.dispatched, 0);
        assert_eq!(second.uploaded, 1);

        let third = manager.update([0.0; 3]);
        assert!(third.backpressured);

        let fourth = manager.update([0.0; 3]);
        assert!(!fourth.backpressured);
        assert_eq!(fourth.dispatched, 4);
        assert_eq!(manager.stats().backpressured_ticks, 2);
    }

    #[test]
    fn test_moving_evicts_and_releases() {
        let mut manager = inline_manager(small_config());
        manager.flush([0.0; 3], 100);

        // Two chunks along +X: only the x = 1 column overlaps.
        let report = manager.update([9.0, 0.0, 0.0]);
        assert_eq!(manager.current_chunk(), Some(ChunkCoord::new(2, 0)));
        assert_eq!(report.evicted, 6);
        assert_eq!(report.enqueued, 6);
        assert_eq!(manager.backend().releases, 6);
        assert_eq!(manager.state_of(ChunkCoord::new(-1, 0)), ChunkState::Unloaded);
        assert_window_invariants(&manager);

        manager.flush([9.0, 0.0, 0.0], 100);
        assert_eq!(manager.active_chunks().len(), 9);
        assert_window_invariants(&manager);
    }

    #[test]
    fn test_evicted_in_flight_result_is_discarded() {
        let config = WorldConfig {
            chunks_dispatched_per_tick: 9,
            chunks_uploaded_per_frame: 1,
            ..small_config()
        };
        let mut manager = inline_manager(config);
        let first = manager.update([0.0; 3]);
        assert_eq!(first.dispatched, 9);
        assert_eq!(first.uploaded, 1);

        // Jump far away: every generated-but-not-uploaded chunk goes stale.
        let report = manager.update([400.0, 0.0, 400.0]);
        assert_eq!(report.evicted, 9);
        assert_eq!(manager.backend().releases, 1);
        manager.flush([400.0, 0.0, 400.0], 200);

        assert_eq!(manager.stats().discarded, 8);
        assert_eq!(manager.active_chunks().len(), 9);
        assert!(manager
            .active_chunks()
            .iter()
            .all(|c| c.chebyshev_distance(&ChunkCoord::new(100, 100)) <= 1));
        assert_window_invariants(&manager);
    }

    #[test]
    fn test_returning_reloads_with_fresh_ticket() {
        let config = WorldConfig {
            chunks_dispatched_per_tick: 9,
            chunks_uploaded_per_frame: 1,
            ..small_config()
        };
        let mut manager = inline_manager(config);
        manager.update([0.0; 3]);
        // Leave and come straight back: old results must not satisfy new entries.
        manager.update([400.0, 0.0, 0.0]);
        let back = manager.update([0.0; 3]);
        assert_eq!(back.enqueued, 9);
        manager.flush([0.0; 3], 200);
        assert_eq!(manager.active_chunks().len(), 9);
        assert!(manager.stats().discarded >= 8);
        assert_window_invariants(&manager);
    }

    #[test]
    fn test_active_chunk_is_reachable_and_drawn() {
        let mut manager = inline_manager(small_config());
        manager.flush([0.0; 3], 100);
        let chunk = manager.chunk(ChunkCoord::new(1, 1)).unwrap();
        assert_eq!(chunk.state(), ChunkState::Active);
        assert!(chunk.mesh().validate());
        manager.render();
        assert_eq!(manager.backend().draws, 9);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = WorldConfig {
            chunk_size: 0,
            ..small_config()
        };
        assert!(ChunkStreamingManager::new(config, NullBackend::new()).is_err());
    }
}
