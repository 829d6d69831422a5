//! Configuration for parallel maps and pool executors
//!
//! [`MapConfig`] can be built directly or parsed from JSON. Only one key is
//! recognized, `chunkSize`; anything else is rejected.

use std::num::NonZeroUsize;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Configuration for a parallel map
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapConfig {
    chunk_size: Option<NonZeroUsize>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RawMapConfig {
    #[serde(default)]
    chunk_size: Option<u64>,
}

impl MapConfig {
    /// Create a config; `None` runs every item at once
    pub fn new(chunk_size: Option<usize>) -> Result<Self> {
        Ok(Self {
            chunk_size: validate_chunk_size(chunk_size)?,
        })
    }

    /// Parse a JSON object such as `{"chunkSize": 4}`
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let raw = RawMapConfig::deserialize(value)
            .map_err(|e| Error::invalid_argument(format!("map config: {}", e)))?;
        let chunk_size = raw
            .chunk_size
            .map(usize::try_from)
            .transpose()
            .map_err(|_| Error::invalid_argument("chunk size does not fit in usize"))?;
        Self::new(chunk_size)
    }

    /// Parse a JSON string
    pub fn from_json_str(s: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(s)
            .map_err(|e| Error::invalid_argument(format!("map config: {}", e)))?;
        Self::from_json(&value)
    }

    /// Maximum number of items in flight, if bounded
    pub fn chunk_size(&self) -> Option<NonZeroUsize> {
        self.chunk_size
    }
}

/// Reject a chunk size of zero
pub(crate) fn validate_chunk_size(chunk_size: Option<usize>) -> Result<Option<NonZeroUsize>> {
    match chunk_size {
        None => Ok(None),
        Some(n) => NonZeroUsize::new(n)
            .map(Some)
            .ok_or_else(|| Error::invalid_argument("Chunk size must be a positive int (or None)")),
    }
}

/// Configuration for a rayon-backed [`PoolExecutor`](crate::executor::PoolExecutor)
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of worker threads (default: num_cpus)
    pub num_threads: usize,
    /// Prefix for worker thread names
    pub thread_name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            thread_name: "pbatch-pool".to_string(),
        }
    }
}
