//! # Task Management System
//!
//! A fixed pool of worker threads pulling tasks from one shared queue.
//!
//! ## Architecture Overview
//!
//! - `TaskManager`: owns the worker threads and the shutdown signal
//! - `TaskQueue`: a cloneable producer handle; tasks may enqueue follow-up tasks
//!   through it from any thread
//! - `Task`: a unit of work, see [`task`]
//!
//! Workers block on a multi-producer/multi-consumer channel, so an idle pool
//! costs nothing. Each worker waits on both the task channel and a shutdown
//! channel; dropping the manager closes the shutdown channel and joins every
//! worker.
//!
//! ## Task Lifecycle
//! 1. A task is published through `TaskManager::publish_task()` or a `TaskQueue`
//! 2. Exactly one idle worker receives it and calls `process()`
//! 3. The pending counter drops once `process()` returns
//!
//! ## Performance Considerations
//! - **Task Granularity**: one chunk build per task
//! - **Blocking**: tasks must never wait on each other; see [`task::Task`]

pub mod task;

use std::{
    io,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use crossbeam_channel::{select, unbounded, Receiver, Sender};
use log::{debug, info, warn};
use task::Task;

/// A boxed task ready to cross threads.
pub type BoxedTask = Box<dyn Task + Send>;

/// Producer handle to the shared task queue.
#[derive(Clone)]
pub struct TaskQueue {
    sender: Sender<BoxedTask>,
    pending: Arc<AtomicUsize>,
}

impl TaskQueue {
    /// Enqueues a task.
    ///
    /// # Returns
    /// `false` if the pool has shut down and the task was dropped.
    pub fn publish(&self, task: BoxedTask) -> bool {
        self.pending.fetch_add(1, Ordering::AcqRel);
        match self.sender.send(task) {
            Ok(()) => true,
            Err(_) => {
                self.pending.fetch_sub(1, Ordering::AcqRel);
                false
            }
        }
    }

    /// Tasks published but not yet finished.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }
}

/// Manages a pool of worker threads.
///
/// # Implementation Notes
/// - Drop-safe: dropping the manager stops and joins every worker; tasks still
///   queued at that point are discarded
/// - A panicking task takes its worker down with it, and the panic is reported
///   when the manager is dropped
pub struct TaskManager {
    queue: TaskQueue,
    receiver: Receiver<BoxedTask>,
    shutdown: Option<Sender<()>>,
    workers: Vec<JoinHandle<()>>,
}

impl TaskManager {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads, at least one is always started
    ///
    /// # Returns
    /// The spawn error if the operating system refuses a thread. Workers started
    /// before the failure shut down on their own.
    pub fn new(num_workers: usize) -> io::Result<Self> {
        let num_workers = num_workers.max(1);
        let (sender, receiver) = unbounded::<BoxedTask>();
        let (shutdown_sender, shutdown_receiver) = unbounded::<()>();
        let pending = Arc::new(AtomicUsize::new(0));

        info!(
            "Starting {} workers (available parallelism: {:?})",
            num_workers,
            thread::available_parallelism()
        );

        let workers = (0..num_workers)
            .map(|index| {
                let tasks = receiver.clone();
                let shutdown = shutdown_receiver.clone();
                let pending = pending.clone();
                thread::Builder::new()
                    .name(format!("chunk-worker-{index}"))
                    .spawn(move || Self::work(tasks, shutdown, pending))
            })
            .collect::<io::Result<Vec<_>>>()?;

        Ok(TaskManager {
            queue: TaskQueue { sender, pending },
            receiver,
            shutdown: Some(shutdown_sender),
            workers,
        })
    }

    fn work(tasks: Receiver<BoxedTask>, shutdown: Receiver<()>, pending: Arc<AtomicUsize>) {
        loop {
            select! {
                recv(shutdown) -> _ => break,
                recv(tasks) -> task => match task {
                    Ok(task) => {
                        task.process();
                        pending.fetch_sub(1, Ordering::AcqRel);
                    }
                    Err(_) => break,
                },
            }
        }
    }

    /// A producer handle for publishing from other threads.
    pub fn queue(&self) -> TaskQueue {
        self.queue.clone()
    }

    /// Publishes a new task for execution.
    ///
    /// # Returns
    /// `false` if the pool has shut down.
    pub fn publish_task(&self, task: BoxedTask) -> bool {
        self.queue.publish(task)
    }

    /// Whether every published task has finished.
    pub fn is_idle(&self) -> bool {
        self.queue.pending() == 0
    }

    /// Tasks published but not yet finished.
    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    /// Number of worker threads.
    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        // Disconnecting the shutdown channel wakes every worker.
        self.shutdown.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("A worker thread panicked");
            }
        }
        let discarded = self.receiver.try_iter().count();
        if discarded > 0 {
            debug!("Discarded {} queued tasks on shutdown", discarded);
        }
    }
}
