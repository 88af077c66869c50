//! # Task System Core Traits
//!
//! A `Task` is a unit of work executed on a worker thread. Tasks own or share
//! (through `Arc`) everything they touch and report results through shared
//! state rather than a return value: the chunk pipeline publishes meshes onto
//! the chunk record and lets the coordinator pick them up.
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred between threads
//! - All shared state must be properly synchronized

/// A trait representing a unit of work that can be executed asynchronously.
///
/// # Implementation Guidelines
/// - Should be relatively coarse-grained to amortize scheduling overhead
/// - Must never block waiting on another task; contention should end the task
///   early and leave rescheduling to whoever caused the contention
pub trait Task: Send {
    /// Runs the task on a worker thread.
    fn process(&self);
}

impl<F: Fn() + Send> Task for F {
    fn process(&self) {
        self()
    }
}
