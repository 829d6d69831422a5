//! Worker-pool interface used by the parallel map and postponed calls
//!
//! An [`Executor`] accepts boxed jobs and runs each to completion on some
//! other thread. Two implementations ship with the crate:
//!
//! - [`ThreadExecutor`]: one dedicated OS thread per job. Unbounded, so a
//!   mapped function may itself run a parallel map without starving anyone.
//! - [`PoolExecutor`]: a rayon thread pool of fixed size. Caps concurrency
//!   process-wide, but nested maps on the same pool can exhaust it.
//!
//! [`submit`] wraps a fallible closure into a job and returns a
//! [`Completion`] for its [`Outcome`](crate::Outcome).

mod completion;
mod pool;
mod thread;

use std::sync::Arc;

use crate::error::Result;

pub use completion::{submit, Completion};
pub(crate) use completion::run_captured;
pub use pool::PoolExecutor;
pub use thread::ThreadExecutor;

/// A unit of work handed to an executor
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run jobs in the background
pub trait Executor: Send + Sync {
    /// Schedule `job` to run; must not block until it finishes
    ///
    /// # Errors
    /// `Rejected` when the job could not be scheduled. The job is dropped
    /// without running in that case.
    fn execute(&self, job: Job) -> Result<()>;
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute(&self, job: Job) -> Result<()> {
        (**self).execute(job)
    }
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute(&self, job: Job) -> Result<()> {
        (**self).execute(job)
    }
}
