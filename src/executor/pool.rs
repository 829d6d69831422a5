//! Rayon-backed executor with a fixed number of workers

use std::sync::Arc;

use super::{Executor, Job};
use crate::config::PoolConfig;
use crate::error::{Error, Result};

// Process-wide pool, built on first use
lazy_static::lazy_static! {
    static ref SHARED_POOL: Result<PoolExecutor> = PoolExecutor::new(PoolConfig::default());
}

/// Runs jobs on a rayon thread pool
///
/// Cloning is cheap and shares the pool. A job that blocks waiting for other
/// jobs on the same pool holds a worker while it waits, so a mapped function
/// that runs its own parallel map should use a different executor.
#[derive(Clone)]
pub struct PoolExecutor {
    pool: Arc<rayon::ThreadPool>,
}

impl PoolExecutor {
    /// Build a dedicated pool
    pub fn new(config: PoolConfig) -> Result<Self> {
        let prefix = config.thread_name;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_threads.max(1))
            .thread_name(move |i| format!("{}-{}", prefix, i))
            .build()
            .map_err(|e| Error::ThreadPool(format!("Failed to create thread pool: {}", e)))?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// The lazily built process-wide pool (num_cpus workers)
    pub fn shared() -> Result<Self> {
        SHARED_POOL.clone()
    }

    /// Number of worker threads
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl std::fmt::Debug for PoolExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolExecutor")
            .field("num_threads", &self.num_threads())
            .finish()
    }
}

impl Executor for PoolExecutor {
    fn execute(&self, job: Job) -> Result<()> {
        self.pool.spawn(job);
        Ok(())
    }
}
