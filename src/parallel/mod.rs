//! Parallel map over one or more input sequences
//!
//! Items are grouped into chunks; each chunk runs fully in parallel and
//! chunks run one after another, so at most `chunk_size` calls are in flight.

mod inputs;
mod pmap;

pub use inputs::{Inputs, ZipAll, ZipTuple};
pub use pmap::{pmap, pmap_zip, PMap, ParallelMap};
