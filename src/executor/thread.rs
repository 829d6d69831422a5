//! Dedicated-thread executor

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use super::{Executor, Job};
use crate::error::{Error, Result};

/// Counter for generating unique worker thread names
static THREAD_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Runs every job on its own freshly spawned, detached thread
#[derive(Debug, Clone)]
pub struct ThreadExecutor {
    name: String,
    stack_size: Option<usize>,
}

impl ThreadExecutor {
    /// Threads are named `pbatch-worker-<n>`
    pub fn new() -> Self {
        Self::named("pbatch-worker")
    }

    /// Threads are named `<prefix>-<n>`
    pub fn named(prefix: impl Into<String>) -> Self {
        Self {
            name: prefix.into(),
            stack_size: None,
        }
    }

    /// Set the stack size of spawned threads
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }
}

impl Default for ThreadExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for ThreadExecutor {
    fn execute(&self, job: Job) -> Result<()> {
        let id = THREAD_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut builder = thread::Builder::new().name(format!("{}-{}", self.name, id));
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }

        // Detached: the job reports through its own channel
        builder
            .spawn(job)
            .map(|_| ())
            .map_err(|e| Error::Rejected(format!("failed to spawn thread: {}", e)))
    }
}
