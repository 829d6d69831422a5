//! Submitting fallible work and waiting for its outcome

use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Duration;

use tokio::sync::oneshot;

use super::Executor;
use crate::error::{CapturedFailure, FailureKind, Outcome};

/// Sleep between polls of a pending completion
const POLL_INTERVAL: Duration = Duration::from_micros(100);

/// Pending outcome of a job handed to [`submit`]
#[derive(Debug)]
pub struct Completion<T> {
    state: CompletionState<T>,
}

#[derive(Debug)]
enum CompletionState<T> {
    Pending(oneshot::Receiver<Outcome<T>>),
    Ready(Outcome<T>),
}

/// Run `f` on `executor` and return a handle to its outcome
///
/// `f` runs under `catch_unwind`: an `Err` or a panic becomes a
/// [`CapturedFailure`] instead of unwinding through the worker. If the
/// executor refuses the job, the completion is immediately a `Rejected`
/// failure; nothing is dropped silently.
pub fn submit<T, E, F>(executor: &dyn Executor, f: F) -> Completion<T>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let (tx, rx) = oneshot::channel();

    let job = Box::new(move || {
        // Receiver may have been dropped; the work still ran
        let _ = tx.send(run_captured(f));
    });

    let state = match executor.execute(job) {
        Ok(()) => CompletionState::Pending(rx),
        Err(e) => {
            tracing::warn!("executor rejected job: {}", e);
            CompletionState::Ready(Err(CapturedFailure::new(
                FailureKind::Rejected,
                e.to_string(),
            )))
        }
    };

    Completion { state }
}

/// Run `f`, turning both `Err` and panics into a captured failure
pub(crate) fn run_captured<T, E, F>(f: F) -> Outcome<T>
where
    F: FnOnce() -> Result<T, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(CapturedFailure::from_error(e)),
        Err(payload) => Err(CapturedFailure::from_panic(payload)),
    }
}

fn abandoned() -> CapturedFailure {
    CapturedFailure::new(
        FailureKind::Abandoned,
        "job was dropped by the executor before it completed",
    )
}

impl<T> Completion<T> {
    /// Block until the job finishes and take its outcome
    ///
    /// Safe to call from a thread that drives an async runtime.
    pub fn wait(self) -> Outcome<T> {
        let mut rx = match self.state {
            CompletionState::Ready(outcome) => return outcome,
            CompletionState::Pending(rx) => rx,
        };

        // Poll instead of blocking_recv, which panics inside a tokio runtime
        loop {
            match rx.try_recv() {
                Ok(outcome) => return outcome,
                Err(oneshot::error::TryRecvError::Empty) => thread::sleep(POLL_INTERVAL),
                Err(oneshot::error::TryRecvError::Closed) => return Err(abandoned()),
            }
        }
    }

    /// Check for the outcome without blocking
    pub fn try_wait(&mut self) -> Option<&Outcome<T>> {
        if let CompletionState::Pending(rx) = &mut self.state {
            let outcome = match rx.try_recv() {
                Ok(outcome) => outcome,
                Err(oneshot::error::TryRecvError::Empty) => return None,
                Err(oneshot::error::TryRecvError::Closed) => Err(abandoned()),
            };
            self.state = CompletionState::Ready(outcome);
        }

        match &self.state {
            CompletionState::Ready(outcome) => Some(outcome),
            CompletionState::Pending(_) => None,
        }
    }

    /// Whether the job has finished (successfully or not)
    pub fn is_complete(&mut self) -> bool {
        self.try_wait().is_some()
    }
}
