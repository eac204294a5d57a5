//! # Task Management System
//!
//! This module provides a fixed pool of worker threads for executing
//! CPU-bound work off the main thread.
//!
//! ## Architecture Overview
//!
//! - `TaskManager`: Owns the workers, the job channel and the result channel
//! - `Task`: A unit of work that is moved to a worker and consumed there
//!
//! Workers share one multi-consumer job channel, so an idle worker always
//! picks up the next job. Results come back on a single result channel which
//! doubles as the ready queue: the main thread drains it at its own pace, and
//! its depth is what callers use for backpressure.
//!
//! ## Task Lifecycle
//! 1. Tasks are published via `TaskManager::publish_task()`
//! 2. They go straight to the job channel while the pool has capacity, and are
//!    queued on the main thread otherwise
//! 3. `process_queued_tasks()` moves queued tasks onto the job channel as
//!    workers free up
//! 4. Workers process tasks and send their outputs back
//! 5. The main thread receives outputs with `try_recv()`
//!
//! ## Example Usage
//! ```
//! use voxel_terrain::engine_state::task_management::{task::Task, TaskManager};
//!
//! struct Square(u64);
//!
//! impl Task for Square {
//!     type Output = u64;
//!     fn process(self) -> u64 {
//!         self.0 * self.0
//!     }
//! }
//!
//! let mut task_manager = TaskManager::new(2);
//! task_manager.publish_task(Square(3));
//! while !task_manager.is_idle() {
//!     task_manager.wait_ready(std::time::Duration::from_millis(10));
//!     if let Some(result) = task_manager.try_recv() {
//!         assert_eq!(result, 9);
//!     }
//! }
//! ```

pub mod task;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, info, warn};
use task::Task;

/// Maximum number of tasks that can be in flight per worker.
///
/// Anything beyond this stays in the main-thread queue, where the owner can
/// still observe it.
pub const MAX_TASKS_IN_FLIGHT: usize = 2;

/// Decrements the in-flight counter when dropped, so a panicking task does not
/// leave the pool looking busy forever.
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// # Implementation Notes
/// - Main-thread only: the queue and the receiving end are not shared
/// - Drop-safe: dropping closes the job channel and joins every worker
/// - With zero workers, tasks are processed inline on `publish_task`
pub struct TaskManager<T: Task> {
    job_sender: Option<Sender<T>>,
    /// Kept to discard unstarted jobs on drop
    job_receiver: Receiver<T>,
    result_sender: Sender<T::Output>,
    result_receiver: Receiver<T::Output>,
    /// Outputs taken off the channel by `wait_ready` but not yet handed out
    received: VecDeque<T::Output>,
    queued_tasks: VecDeque<T>,
    in_flight: Arc<AtomicUsize>,
    workers: Vec<JoinHandle<()>>,
}

impl<T: Task> TaskManager<T> {
    /// Creates a new `TaskManager` and starts its workers.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to spawn
    ///
    /// Workers that fail to spawn are logged and skipped. If none spawn, the
    /// manager processes tasks on the calling thread.
    pub fn new(num_workers: usize) -> Self {
        let (job_sender, job_receiver) = unbounded::<T>();
        let (result_sender, result_receiver) = unbounded::<T::Output>();
        let in_flight = Arc::new(AtomicUsize::new(0));

        info!(
            "Available parallelism: {:?}",
            thread::available_parallelism()
        );

        let mut workers = Vec::with_capacity(num_workers);
        for index in 0..num_workers {
            let jobs = job_receiver.clone();
            let results = result_sender.clone();
            let counter = Arc::clone(&in_flight);

            let spawned = thread::Builder::new()
                .name(format!("chunk-worker-{index}"))
                .spawn(move || {
                    while let Ok(task) = jobs.recv() {
                        let _guard = InFlightGuard(Arc::clone(&counter));
                        // The receiver only disappears while the manager is
                        // being dropped.
                        if results.send(task.process()).is_err() {
                            break;
                        }
                    }
                });

            match spawned {
                Ok(worker) => workers.push(worker),
                Err(err) => warn!("Failed to spawn worker {index}: {err}"),
            }
        }

        if workers.len() < num_workers {
            warn!(
                "Task manager running with {} of {} workers",
                workers.len(),
                num_workers
            );
        }
        info!("Task manager started with {} workers", workers.len());

        TaskManager {
            job_sender: Some(job_sender),
            job_receiver,
            result_sender,
            result_receiver,
            received: VecDeque::new(),
            queued_tasks: VecDeque::new(),
            in_flight,
            workers,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    fn capacity(&self) -> usize {
        self.workers.len() * MAX_TASKS_IN_FLIGHT
    }

    fn has_capacity(&self) -> bool {
        self.in_flight() < self.capacity()
    }

    /// Sends a task to the job channel, counting it as in flight.
    ///
    /// # Returns
    /// - `Ok(())` if the task was handed to the pool
    /// - `Err(task)` if the channel is closed
    fn try_send_task(&mut self, task: T) -> Result<(), T> {
        let Some(sender) = &self.job_sender else {
            return Err(task);
        };
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        sender.send(task).map_err(|err| {
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
            err.0
        })
    }

    /// Publishes a new task for execution.
    ///
    /// # Returns
    /// - `true` if the task was handed to a worker (or processed inline)
    /// - `false` if it was queued because the pool is at capacity
    pub fn publish_task(&mut self, task: T) -> bool {
        if self.workers.is_empty() {
            // The receiver lives in `self`, so this send cannot fail.
            let _ = self.result_sender.send(task.process());
            return true;
        }

        if !self.queued_tasks.is_empty() || !self.has_capacity() {
            self.queued_tasks.push_back(task);
            return false;
        }

        match self.try_send_task(task) {
            Ok(()) => true,
            Err(task) => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Moves queued tasks onto the job channel while the pool has capacity.
    ///
    /// # Returns
    /// Number of tasks handed to workers.
    pub fn process_queued_tasks(&mut self) -> usize {
        let mut sent = 0;
        while self.has_capacity() {
            let Some(task) = self.queued_tasks.pop_front() else {
                break;
            };
            match self.try_send_task(task) {
                Ok(()) => sent += 1,
                Err(task) => {
                    self.queued_tasks.push_front(task);
                    break;
                }
            }
        }
        if sent > 0 {
            debug!(
                "Dispatched {} queued tasks, {} still queued",
                sent,
                self.queued_tasks.len()
            );
        }
        sent
    }

    /// Takes one finished output, if any.
    pub fn try_recv(&mut self) -> Option<T::Output> {
        self.received
            .pop_front()
            .or_else(|| self.result_receiver.try_recv().ok())
    }

    /// Blocks up to `timeout` until at least one output is ready.
    ///
    /// # Returns
    /// `true` if an output is ready to be taken with [`try_recv`](Self::try_recv).
    pub fn wait_ready(&mut self, timeout: Duration) -> bool {
        if self.ready_len() > 0 {
            return true;
        }
        match self.result_receiver.recv_timeout(timeout) {
            Ok(output) => {
                self.received.push_back(output);
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Outputs waiting on the main thread.
    pub fn ready_len(&self) -> usize {
        self.received.len() + self.result_receiver.len()
    }

    /// Tasks handed to workers and not finished yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Tasks waiting on the main thread for pool capacity.
    pub fn queued_len(&self) -> usize {
        self.queued_tasks.len()
    }

    /// Whether no task is queued, in flight or waiting to be received.
    pub fn is_idle(&self) -> bool {
        self.queued_tasks.is_empty() && self.in_flight() == 0 && self.ready_len() == 0
    }
}

impl<T: Task> Drop for TaskManager<T> {
    fn drop(&mut self) {
        self.queued_tasks.clear();
        while self.job_receiver.try_recv().is_ok() {}
        // Closing the job channel ends every worker loop.
        self.job_sender.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("A worker thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Double(u32);

    impl Task for Double {
        type Output = u32;
        fn process(self) -> u32 {
            self.0 * 2
        }
    }

    fn drain(manager: &mut TaskManager<Double>) -> Vec<u32> {
        let mut results = Vec::new();
        for _ in 0..10_000 {
            manager.process_queued_tasks();
            while let Some(result) = manager.try_recv() {
                results.push(result);
            }
            if manager.is_idle() {
                break;
            }
            manager.wait_ready(Duration::from_millis(5));
        }
        results
    }

    #[test]
    fn test_all_tasks_complete() {
        let mut manager = TaskManager::new(3);
        assert_eq!(manager.worker_count(), 3);
        for i in 0..50 {
            manager.publish_task(Double(i));
        }
        let mut results = drain(&mut manager);
        results.sort_unstable();
        assert_eq!(results, (0..50).map(|i| i * 2).collect::<Vec<_>>());
        assert!(manager.is_idle());
    }

    #[test]
    fn test_queue_holds_tasks_beyond_capacity() {
        let mut manager = TaskManager::new(1);
        for i in 0..10 {
            manager.publish_task(Double(i));
        }
        assert!(manager.in_flight() <= MAX_TASKS_IN_FLIGHT);
        assert!(manager.queued_len() >= 10 - MAX_TASKS_IN_FLIGHT);
        assert_eq!(drain(&mut manager).len(), 10);
    }

    #[test]
    fn test_zero_workers_process_inline() {
        let mut manager = TaskManager::new(0);
        assert!(manager.publish_task(Double(21)));
        assert_eq!(manager.ready_len(), 1);
        assert_eq!(manager.try_recv(), Some(42));
        assert!(manager.is_idle());
    }

    #[test]
    fn test_drop_joins_workers() {
        let mut manager = TaskManager::new(2);
        for i in 0..8 {
            manager.publish_task(Double(i));
        }
        drop(manager);
    }
}
