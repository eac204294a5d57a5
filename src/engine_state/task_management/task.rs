//! # Task System Core Trait
//!
//! A [`Task`] is a self-contained unit of work that is moved to a worker
//! thread, processed there, and produces an output that travels back to the
//! main thread over the result channel.
//!
//! ## Task Lifecycle
//! 1. A task is created on the main thread and published via `TaskManager::publish_task()`
//! 2. `TaskManager::dispatch()` moves it onto the job channel
//! 3. A worker takes ownership and calls `process()`
//! 4. The output is sent on the result channel and received with `TaskManager::try_recv()`

/// A unit of work that can be executed on a worker thread.
///
/// # Implementation Guidelines
/// - Must own all the data it works on; shared read-only state goes behind an `Arc`
/// - Should be coarse-grained to amortize scheduling overhead
pub trait Task: Send + 'static {
    /// What the worker sends back.
    type Output: Send + 'static;

    /// Processes the task, consuming it.
    fn process(self) -> Self::Output;
}
