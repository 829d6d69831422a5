//! Lazy partitioning of an iterator into bounded chunks
//!
//! [`partition`] pulls only as many items as one chunk needs before yielding
//! it, so a caller that hands in `iter.by_ref()` can observe how much of the
//! source has been consumed.

use std::num::NonZeroUsize;

use crate::config::validate_chunk_size;
use crate::error::Result;

/// Iterator over chunks of at most `chunk_size` items
///
/// With no chunk size the whole remaining input becomes a single chunk. An
/// empty input yields no chunks at all.
#[derive(Debug)]
pub struct Partition<I> {
    items: I,
    chunk_size: Option<NonZeroUsize>,
}

/// Split `items` into chunks of at most `chunk_size` items
///
/// # Errors
/// `InvalidArgument` when `chunk_size` is `Some(0)`.
///
/// # Example
/// ```
/// let parts: Vec<Vec<i32>> = pbatch::partition(0..7, Some(3)).unwrap().collect();
/// assert_eq!(parts, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6]]);
/// ```
pub fn partition<I>(items: I, chunk_size: Option<usize>) -> Result<Partition<I::IntoIter>>
where
    I: IntoIterator,
{
    let chunk_size = validate_chunk_size(chunk_size)?;
    Ok(Partition::new(items.into_iter(), chunk_size))
}

impl<I: Iterator> Partition<I> {
    pub(crate) fn new(items: I, chunk_size: Option<NonZeroUsize>) -> Self {
        Self { items, chunk_size }
    }

    /// Configured chunk size, if bounded
    pub fn chunk_size(&self) -> Option<NonZeroUsize> {
        self.chunk_size
    }

    /// Recover the source iterator with whatever has not been pulled yet
    pub fn into_inner(self) -> I {
        self.items
    }
}

impl<I: Iterator> Iterator for Partition<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk: Vec<I::Item> = match self.chunk_size {
            Some(n) => self.items.by_ref().take(n.get()).collect(),
            None => self.items.by_ref().collect(),
        };

        if chunk.is_empty() {
            None
        } else {
            Some(chunk)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lo, hi) = self.items.size_hint();
        match self.chunk_size {
            Some(n) => (
                lo.div_ceil(n.get()),
                hi.map(|h| h.div_ceil(n.get())),
            ),
            None => (usize::from(lo > 0), hi.map(|h| usize::from(h > 0))),
        }
    }
}
