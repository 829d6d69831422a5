//! # pbatch - Parallel batch processing on top of ordinary functions
//!
//! Two primitives for running blocking, synchronous functions without
//! blocking your own control flow:
//!
//! - [`pmap`] / [`pmap_zip`] / [`ParallelMap`]: a parallel map whose
//!   concurrency is bounded by a chunk size. Results come back lazily and in
//!   input order.
//! - [`postpone`]: run one call in the background and [`Postpone::wait`] for
//!   it later, or [`Postpone::cancel`] the wait.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::convert::Infallible;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! fn exp(x: u32, power: u32) -> Result<u32, Infallible> {
//!     Ok(x.pow(power))
//! }
//!
//! // At most two calls in flight at any time
//! let cubes: Vec<u32> = pbatch::pmap_zip(
//!     |(x, p): (u32, u32)| exp(x, p),
//!     (vec![1, 2, 3], vec![3, 3, 3]),
//!     Some(2),
//! )?
//! .collect::<Result<_, _>>()?;
//! assert_eq!(cubes, vec![1, 8, 27]);
//!
//! let handle = pbatch::postpone(|| exp(2, 10));
//! assert_eq!(handle.wait()?, &1024);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! caller → ParallelMap → Partition (chunk boundaries)
//!                      → Executor (runs each item of a chunk concurrently)
//!                      → AggregatedFailure check → lazy results
//!
//! caller → postpone → Executor (one job) → Postpone { wait, cancel }
//! ```
//!
//! ### Main Components
//!
//! - [`partition`] - Splits an iterator into bounded chunks, lazily
//! - [`PMap`] - The lazy result iterator of a parallel map
//! - [`Executor`] - The worker-pool interface; [`ThreadExecutor`] and
//!   [`PoolExecutor`] implement it
//! - [`Postpone`] - Handle to a background call
//!
//! ## Error Handling
//!
//! Errors returned (or panics raised) by your function never unwind across a
//! worker thread. They are captured as [`CapturedFailure`] values:
//!
//! - a parallel map reports them as an [`AggregatedFailure`] holding every
//!   outcome of the failing chunk, and then stops;
//! - a postponed call reports them from every [`Postpone::wait`].
//!
//! ```rust
//! #[derive(Debug, thiserror::Error)]
//! #[error("Expected an int")]
//! struct NotAnInt;
//!
//! let failure = pbatch::pmap(
//!     |s: &str| s.parse::<i32>().map_err(|_| NotAnInt),
//!     vec!["1", "2", "three"],
//!     None,
//! )
//! .unwrap()
//! .collect::<Result<Vec<_>, _>>()
//! .unwrap_err();
//!
//! assert_eq!(failure.results.len(), 3);
//! assert_eq!(failure.failures.len(), 1);
//! assert_eq!(failure.failures[0].message(), "Expected an int");
//! ```
//!
//! Malformed calls (chunk size of zero, no input sequences, unknown config
//! keys) fail up front with [`Error::InvalidArgument`] before anything runs.
//!
//! ## License
//!
//! Licensed under the [MIT License](https://opensource.org/licenses/MIT).

/// Version of the pbatch crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod error;
pub mod executor;
pub mod parallel;
pub mod partition;
pub mod postpone;

// Re-export main types
pub use config::{MapConfig, PoolConfig};
pub use error::{
    AggregatedFailure, CapturedFailure, Error, FailureKind, Outcome, PostponeError, Result,
};
pub use executor::{submit, Completion, Executor, Job, PoolExecutor, ThreadExecutor};
pub use parallel::{pmap, pmap_zip, Inputs, PMap, ParallelMap};
pub use partition::{partition, Partition};
pub use postpone::{postpone, postpone_on, Postpone, PostponeState};
