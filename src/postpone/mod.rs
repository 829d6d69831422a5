//! Postponed calls: run one function in the background, wait for it later
//!
//! [`postpone`] dispatches a call on its own thread and returns a
//! [`Postpone`] handle at once. [`Postpone::wait`] blocks until the call
//! finishes and reports its result; calling it again reports the same result
//! without running anything.
//!
//! Cancellation cannot stop a call that is already running. What
//! [`Postpone::cancel`] does is record a terminal "cancelled" state, so that
//! `wait` returns [`PostponeError::Cancelled`] immediately instead of waiting
//! for the call. A call's outcome is only reported once a `wait` has
//! collected it: cancelling before that always wins, even if the call has
//! already returned in the background. Cancelling after a `wait` has
//! reported the outcome does nothing.
//!
//! # Example
//!
//! ```
//! use std::convert::Infallible;
//!
//! let handle = pbatch::postpone(|| Ok::<_, Infallible>(1 + 2 + 100));
//! // <do other work>
//! assert_eq!(handle.wait().unwrap(), &103);
//! assert_eq!(handle.wait().unwrap(), &103);
//! ```

mod signal;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use crate::error::{CapturedFailure, FailureKind, Outcome, PostponeError};
use crate::executor::{run_captured, Executor, ThreadExecutor};

use signal::Signal;

/// Counter for generating unique handle IDs
static POSTPONE_COUNTER: AtomicU64 = AtomicU64::new(0);

fn generate_postpone_id() -> String {
    let id = POSTPONE_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("postpone_{}", id)
}

/// Observable lifecycle of a postponed call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostponeState {
    /// Dispatched, not yet picked up by a worker
    Pending,
    /// A worker is running the call
    Running,
    /// The call returned `Ok`
    Succeeded,
    /// The call failed, panicked, or was never run
    Failed,
    /// Cancellation was recorded before any `wait` reported the outcome
    Cancelled,
}

/// What `wait` reports, fixed by the first of `wait` and `cancel`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Completed,
    Cancelled,
}

struct Shared<T> {
    /// Written by the worker
    outcome: OnceLock<Outcome<T>>,
    /// Written by the handle; `Completed` only once `outcome` is set
    verdict: OnceLock<Verdict>,
    started: AtomicBool,
    signal: Signal,
}

impl<T> Shared<T> {
    fn new() -> Self {
        Self {
            outcome: OnceLock::new(),
            verdict: OnceLock::new(),
            started: AtomicBool::new(false),
            signal: Signal::new(),
        }
    }

    fn finish(&self, outcome: Outcome<T>) {
        if self.outcome.set(outcome).is_ok() {
            self.signal.notify();
        }
    }

    /// Fix the verdict unless one was fixed first; returns whether it won
    fn decide(&self, verdict: Verdict) -> bool {
        let won = self.verdict.set(verdict).is_ok();
        if won {
            self.signal.notify();
        }
        won
    }
}

/// Reports the call's outcome; reports abandonment if dropped unfinished
struct Reporter<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Drop for Reporter<T> {
    fn drop(&mut self) {
        // No-op when the call already stored its outcome
        self.shared.finish(Err(CapturedFailure::new(
            FailureKind::Abandoned,
            "postponed call was dropped by the executor before it ran",
        )));
    }
}

/// Handle to a call running in the background
///
/// Each handle owns exactly one dispatched call.
pub struct Postpone<T> {
    id: String,
    shared: Arc<Shared<T>>,
}

/// Run `f` on a dedicated background thread
///
/// Returns without waiting for `f` to start.
pub fn postpone<T, E, F>(f: F) -> Postpone<T>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + Sync + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    postpone_on(&ThreadExecutor::named("pbatch-postpone"), f)
}

/// Run `f` on `executor`
///
/// If the executor refuses the job, the handle is immediately
/// [`PostponeState::Failed`] with a `Rejected` failure.
pub fn postpone_on<T, E, F>(executor: &dyn Executor, f: F) -> Postpone<T>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + Sync + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let id = generate_postpone_id();
    let shared = Arc::new(Shared::new());
    let reporter = Reporter {
        shared: Arc::clone(&shared),
    };

    let job = Box::new(move || {
        reporter.shared.started.store(true, Ordering::SeqCst);
        reporter.shared.finish(run_captured(f));
    });

    let shared = match executor.execute(job) {
        Ok(()) => {
            tracing::debug!(id = %id, "postponed call dispatched");
            shared
        }
        Err(e) => {
            tracing::warn!(id = %id, "executor rejected postponed call: {}", e);
            // The dropped job already marked the old cell abandoned
            let rejected = Arc::new(Shared::new());
            rejected.finish(Err(CapturedFailure::new(
                FailureKind::Rejected,
                e.to_string(),
            )));
            rejected
        }
    };

    Postpone { id, shared }
}

impl<T> Postpone<T> {
    /// Unique handle ID (`postpone_<n>`)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Block until the call finishes or is cancelled, then report the result
    ///
    /// Idempotent: later calls return the same value or the same failure
    /// (the same [`CapturedFailure`] object) without re-running anything.
    pub fn wait(&self) -> Result<&T, PostponeError> {
        let shared = &*self.shared;
        shared
            .signal
            .wait_until(|| shared.verdict.get().is_some() || shared.outcome.get().is_some());

        // Loses if cancel got there first
        if shared.outcome.get().is_some() {
            shared.decide(Verdict::Completed);
        }

        match (shared.verdict.get(), shared.outcome.get()) {
            (Some(Verdict::Completed), Some(Ok(value))) => Ok(value),
            (Some(Verdict::Completed), Some(Err(failure))) => {
                Err(PostponeError::Failed(failure.clone()))
            }
            _ => Err(PostponeError::Cancelled),
        }
    }

    /// Request cancellation
    ///
    /// Does not stop a call that is already running; it may still run to
    /// completion in the background. Unless a `wait` has already reported
    /// the outcome, every `wait` from now on returns
    /// [`PostponeError::Cancelled`] without blocking, and waiters already
    /// blocked are woken. This holds even when the call has finished in the
    /// background. Returns whether the cancellation was recorded (`false`
    /// once a `wait` has reported the outcome).
    pub fn cancel(&self) -> bool {
        let cancelled = self.shared.decide(Verdict::Cancelled);
        if cancelled {
            tracing::debug!(id = %self.id, "postponed call cancelled");
        }
        cancelled
    }

    /// Current lifecycle state
    pub fn state(&self) -> PostponeState {
        if self.shared.verdict.get() == Some(&Verdict::Cancelled) {
            return PostponeState::Cancelled;
        }
        match self.shared.outcome.get() {
            Some(Ok(_)) => PostponeState::Succeeded,
            Some(Err(_)) => PostponeState::Failed,
            None if self.shared.started.load(Ordering::SeqCst) => PostponeState::Running,
            None => PostponeState::Pending,
        }
    }

    /// Whether `wait` would return without blocking
    pub fn is_finished(&self) -> bool {
        self.shared.verdict.get().is_some() || self.shared.outcome.get().is_some()
    }
}

impl<T> fmt::Debug for Postpone<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Postpone")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}
