//! Chunked parallel map
//!
//! [`PMap`] is a lazy iterator driven by a small state machine: a cursor over
//! the current chunk's materialized results, plus the chunk source. When the
//! buffer runs dry the next chunk is pulled, every item in it is dispatched
//! at once, and all of them are waited on before anything is yielded.

use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::config::MapConfig;
use crate::error::{AggregatedFailure, Outcome, Result};
use crate::executor::{submit, Completion, Executor, ThreadExecutor};
use crate::partition::Partition;

use super::inputs::Inputs;

/// Builder for a parallel map
///
/// ```
/// use pbatch::ParallelMap;
/// use std::convert::Infallible;
///
/// let squares: Vec<u64> = ParallelMap::new(|x: u64| Ok::<_, Infallible>(x * x))
///     .chunk_size(2)?
///     .run(1..=4)?
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(squares, vec![1, 4, 9, 16]);
/// # Ok::<(), pbatch::Error>(())
/// ```
pub struct ParallelMap<F> {
    f: F,
    config: MapConfig,
    executor: Arc<dyn Executor>,
}

impl<F> ParallelMap<F> {
    /// Map `f`, unbounded, one thread per item
    pub fn new(f: F) -> Self {
        Self {
            f,
            config: MapConfig::default(),
            executor: Arc::new(ThreadExecutor::new()),
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: MapConfig) -> Self {
        self.config = config;
        self
    }

    /// Run at most `chunk_size` items at a time
    ///
    /// # Errors
    /// `InvalidArgument` if `chunk_size` is zero.
    pub fn chunk_size(mut self, chunk_size: usize) -> Result<Self> {
        self.config = MapConfig::new(Some(chunk_size))?;
        Ok(self)
    }

    /// Dispatch items on `executor` instead of dedicated threads
    pub fn executor<X: Executor + 'static>(mut self, executor: X) -> Self {
        self.executor = Arc::new(executor);
        self
    }

    /// Map over a single sequence
    ///
    /// Nothing is pulled from `items` until the returned iterator is polled.
    pub fn run<X, T, E>(self, items: X) -> Result<PMap<X::IntoIter, F, T, E>>
    where
        X: IntoIterator,
        F: Fn(X::Item) -> std::result::Result<T, E>,
    {
        Ok(self.into_pmap(items.into_iter()))
    }

    /// Map over several sequences zipped together
    ///
    /// # Errors
    /// `InvalidArgument` if `inputs` holds no sequences.
    pub fn run_zip<In, T, E>(self, inputs: In) -> Result<PMap<In::Iter, F, T, E>>
    where
        In: Inputs,
        F: Fn(<In::Iter as Iterator>::Item) -> std::result::Result<T, E>,
    {
        let args = inputs.into_args()?;
        Ok(self.into_pmap(args))
    }

    fn into_pmap<I: Iterator, T, E>(self, args: I) -> PMap<I, F, T, E> {
        PMap {
            chunks: Partition::new(args, self.config.chunk_size()),
            f: Arc::new(self.f),
            executor: self.executor,
            ready: Vec::new().into_iter(),
            chunks_completed: 0,
            done: false,
            _error: PhantomData,
        }
    }
}

/// Map `f` over `items` in parallel, at most `chunk_size` at a time
///
/// `None` runs every item at once. The result is lazy; see [`PMap`].
///
/// # Errors
/// `InvalidArgument` if `chunk_size` is `Some(0)`.
pub fn pmap<X, T, E, F>(
    f: F,
    items: X,
    chunk_size: Option<usize>,
) -> Result<PMap<X::IntoIter, F, T, E>>
where
    X: IntoIterator,
    F: Fn(X::Item) -> std::result::Result<T, E>,
{
    ParallelMap::new(f)
        .config(MapConfig::new(chunk_size)?)
        .run(items)
}

/// Map `f` over several zipped sequences in parallel
///
/// ```
/// use std::convert::Infallible;
///
/// let sums: Vec<i32> = pbatch::pmap_zip(
///     |(a, b, c): (i32, i32, i32)| Ok::<_, Infallible>(a + b * c),
///     (0..3, vec![0, 10, 20], vec![0, 100, 200]),
///     Some(2),
/// )?
/// .collect::<Result<_, _>>()
/// .unwrap();
/// assert_eq!(sums, vec![0, 1001, 4002]);
/// # Ok::<(), pbatch::Error>(())
/// ```
///
/// # Errors
/// `InvalidArgument` if `chunk_size` is `Some(0)` or `inputs` is empty.
pub fn pmap_zip<In, T, E, F>(
    f: F,
    inputs: In,
    chunk_size: Option<usize>,
) -> Result<PMap<In::Iter, F, T, E>>
where
    In: Inputs,
    F: Fn(<In::Iter as Iterator>::Item) -> std::result::Result<T, E>,
{
    ParallelMap::new(f)
        .config(MapConfig::new(chunk_size)?)
        .run_zip(inputs)
}

/// Lazy results of a parallel map
///
/// Pulling the first item of a chunk runs that whole chunk to completion;
/// the following chunk is not started until its first item is requested.
/// If any item of a chunk fails, the iterator yields one
/// [`AggregatedFailure`] covering only that chunk and then ends. Results
/// already yielded from earlier chunks stay valid.
///
/// `collect::<Result<Vec<_>, _>>()` gives the eager, all-or-error form.
pub struct PMap<I, F, T, E> {
    chunks: Partition<I>,
    f: Arc<F>,
    executor: Arc<dyn Executor>,
    ready: std::vec::IntoIter<T>,
    chunks_completed: usize,
    done: bool,
    _error: PhantomData<fn() -> E>,
}

impl<I: Iterator, F, T, E> PMap<I, F, T, E> {
    /// Number of chunks that have run to completion
    pub fn chunks_completed(&self) -> usize {
        self.chunks_completed
    }

    /// Configured chunk size, if bounded
    pub fn chunk_size(&self) -> Option<NonZeroUsize> {
        self.chunks.chunk_size()
    }
}

impl<I, F, T, E> PMap<I, F, T, E>
where
    I: Iterator,
    I::Item: Send + 'static,
    F: Fn(I::Item) -> std::result::Result<T, E> + Send + Sync + 'static,
    T: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    fn run_chunk(&mut self, chunk: Vec<I::Item>) -> std::result::Result<Vec<T>, AggregatedFailure<T>> {
        let index = self.chunks_completed;
        tracing::debug!(chunk = index, items = chunk.len(), "dispatching chunk");

        let pending: Vec<Completion<T>> = chunk
            .into_iter()
            .map(|args| {
                let f = Arc::clone(&self.f);
                submit(self.executor.as_ref(), move || f(args))
            })
            .collect();

        // Barrier: every item finishes before anything is reported
        let outcomes: Vec<Outcome<T>> = pending.into_iter().map(Completion::wait).collect();
        self.chunks_completed += 1;

        AggregatedFailure::from_outcomes(index, outcomes).map_err(|failure| {
            tracing::warn!(
                chunk = index,
                failed = failure.failures.len(),
                total = failure.results.len(),
                "chunk failed"
            );
            failure
        })
    }
}

impl<I, F, T, E> Iterator for PMap<I, F, T, E>
where
    I: Iterator,
    I::Item: Send + 'static,
    F: Fn(I::Item) -> std::result::Result<T, E> + Send + Sync + 'static,
    T: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    type Item = std::result::Result<T, AggregatedFailure<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(value) = self.ready.next() {
                return Some(Ok(value));
            }
            if self.done {
                return None;
            }

            let Some(chunk) = self.chunks.next() else {
                self.done = true;
                return None;
            };

            match self.run_chunk(chunk) {
                Ok(values) => self.ready = values.into_iter(),
                Err(failure) => {
                    self.done = true;
                    return Some(Err(failure));
                }
            }
        }
    }
}

impl<I, F, T, E> FusedIterator for PMap<I, F, T, E>
where
    I: Iterator,
    I::Item: Send + 'static,
    F: Fn(I::Item) -> std::result::Result<T, E> + Send + Sync + 'static,
    T: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
}
