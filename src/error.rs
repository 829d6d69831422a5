//! Error types for pbatch
//!
//! Three layers of failure show up in this crate:
//!
//! - [`Error`]: the call itself was malformed (bad chunk size, no inputs,
//!   unknown configuration key) or the executor could not be set up. These
//!   are reported before any work is dispatched.
//! - [`CapturedFailure`]: caller-supplied work failed while running. It is
//!   converted into a value at the point of execution and never unwinds
//!   across a worker boundary.
//! - [`AggregatedFailure`]: a parallel map chunk contained one or more
//!   captured failures.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Configuration and setup errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed configuration or call shape
    ///
    /// **Triggered by:** a chunk size of zero, an empty list of input
    /// sequences, or an unrecognized/ill-typed configuration key
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error description
        message: String,
    },

    /// A rayon thread pool could not be built
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// An executor refused to accept a job
    #[error("Executor rejected job: {0}")]
    Rejected(String),
}

impl Error {
    /// Create an invalid argument error with a message
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: msg.into(),
        }
    }
}

/// Result type for pbatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// What kind of failure caller work produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The function returned `Err`
    Error,
    /// The function panicked
    Panic,
    /// The executor refused the submission
    Rejected,
    /// The executor dropped the job without running it
    Abandoned,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Error => "error",
            FailureKind::Panic => "panic",
            FailureKind::Rejected => "rejected",
            FailureKind::Abandoned => "abandoned",
        };
        f.write_str(name)
    }
}

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

struct FailureInner {
    kind: FailureKind,
    message: String,
    source: Option<BoxedError>,
}

/// A failure raised by caller work, captured as a value
///
/// Clones share the same underlying failure, so a failure listed in both
/// [`AggregatedFailure::results`] and [`AggregatedFailure::failures`] is the
/// same object in both places (see [`CapturedFailure::ptr_eq`]).
#[derive(Clone)]
pub struct CapturedFailure(Arc<FailureInner>);

impl CapturedFailure {
    /// Capture an error returned by caller work
    pub fn from_error<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let message = error.to_string();
        Self(Arc::new(FailureInner {
            kind: FailureKind::Error,
            message,
            source: Some(Box::new(error)),
        }))
    }

    /// Capture a panic payload from `catch_unwind`
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "task panicked".to_string()
        };
        Self::new(FailureKind::Panic, message)
    }

    /// Build a failure without an underlying error value
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self(Arc::new(FailureInner {
            kind,
            message: message.into(),
            source: None,
        }))
    }

    /// Failure kind
    pub fn kind(&self) -> FailureKind {
        self.0.kind
    }

    /// Failure message (the `Display` of the original error, or the panic text)
    pub fn message(&self) -> &str {
        &self.0.message
    }

    /// Borrow the original error if it is of type `E`
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        self.0.source.as_ref()?.downcast_ref::<E>()
    }

    /// Whether two values are the same captured failure
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for CapturedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedFailure")
            .field("kind", &self.0.kind)
            .field("message", &self.0.message)
            .finish()
    }
}

impl fmt::Display for CapturedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.kind {
            FailureKind::Error => f.write_str(&self.0.message),
            kind => write!(f, "{}: {}", kind, self.0.message),
        }
    }
}

impl std::error::Error for CapturedFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0
            .source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Outcome of a single dispatched item
pub type Outcome<T> = std::result::Result<T, CapturedFailure>;

/// All outcomes of a parallel map chunk that contained failures
///
/// Scoped to one chunk: outcomes already yielded from earlier chunks are not
/// included.
#[derive(Error, Debug)]
#[error("{} of {} items failed in chunk {chunk_index}", .failures.len(), .results.len())]
pub struct AggregatedFailure<T> {
    /// Zero-based index of the failing chunk
    pub chunk_index: usize,
    /// Every outcome of the chunk, in input order
    pub results: Vec<Outcome<T>>,
    /// Only the failures, in input order
    pub failures: Vec<CapturedFailure>,
}

impl<T> AggregatedFailure<T> {
    /// Build from a chunk's outcomes, or hand them back if none failed
    pub(crate) fn from_outcomes(
        chunk_index: usize,
        results: Vec<Outcome<T>>,
    ) -> std::result::Result<Vec<T>, Self> {
        let failures: Vec<CapturedFailure> = results
            .iter()
            .filter_map(|outcome| outcome.as_ref().err().cloned())
            .collect();

        if failures.is_empty() {
            return Ok(results.into_iter().filter_map(|o| o.ok()).collect());
        }

        Err(Self {
            chunk_index,
            results,
            failures,
        })
    }
}

/// Errors reported by [`Postpone::wait`](crate::Postpone::wait)
#[derive(Error, Debug, Clone)]
pub enum PostponeError {
    /// `cancel` was recorded before the call finished
    #[error("postponed call was cancelled")]
    Cancelled,

    /// The call failed; the same failure is reported on every wait
    #[error(transparent)]
    Failed(CapturedFailure),
}

impl PostponeError {
    /// The captured failure, unless the call was cancelled
    pub fn failure(&self) -> Option<&CapturedFailure> {
        match self {
            PostponeError::Cancelled => None,
            PostponeError::Failed(failure) => Some(failure),
        }
    }
}
