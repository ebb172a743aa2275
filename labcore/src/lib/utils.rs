pub use std::{
    cmp::Reverse,
    collections::HashSet,
    fmt,
    hash::BuildHasherDefault,
    str::FromStr,
};
pub use ahash::AHasher;
pub use indexmap::IndexMap;
pub use itertools::Itertools;
pub use log::{debug, info};
pub use thiserror::Error;

/// The unit for measuring simulated time. There is no wall clock
/// anywhere: one tick is whatever the workload says it is.
pub type Ticks = usize;

/// The unit for measuring memory and disk space. Blocks, partitions
/// and requests all share it.
pub type Units = usize;

pub type ProcessId = u32;

/// Lower value means higher priority.
pub type Priority = i32;

/// Everything that makes an engine refuse to run.
///
/// A request that simply doesn't fit is *not* an error: every engine
/// reports it as data next to the requests that did succeed, so that a
/// batch is never lost because of one bad apple. The variants below are
/// reserved for malformed input (caught before any simulation step) and
/// for policy tokens nobody knows about.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("Process ids start at 1, got 0.")]
    InvalidId,
    #[error("Process id {id} appears more than once.")]
    DuplicateId { id: ProcessId },
    #[error("Process {id} has zero burst time.")]
    ZeroBurst { id: ProcessId },
    #[error("Process {id} has already run (remaining burst differs from burst time).")]
    BadRemaining { id: ProcessId },
    #[error("Workload runs past the end of simulated time.")]
    TimeOverflow,
    #[error("Time quantum must be positive.")]
    ZeroQuantum,
    #[error("Request {id} has zero size.")]
    ZeroSize { id: u32 },
    #[error("Block {index} has zero capacity.")]
    ZeroCapacity { index: usize },
    #[error("Block {index} has more remaining space than capacity.")]
    BadBlock { index: usize },
    #[error("Total memory must be positive.")]
    ZeroMemory,
    #[error("Partition size must be positive.")]
    ZeroPartition,
    #[error("File length must be positive.")]
    ZeroLength,
    #[error("Unrecognized policy: {0:?}")]
    PolicyNotRecognized(String),
}

pub type Result<T> = std::result::Result<T, SimError>;

/// Insertion-ordered map, hashed with `ahash`.
pub type FastMap<K, V> = IndexMap<K, V, BuildHasherDefault<AHasher>>;

/// Mean of a sequence of ticks. Empty input yields 0.0 instead of NaN.
pub fn mean<I>(vals: I) -> f64
where I: Iterator<Item = Ticks> {
    let (sum, n) = vals.fold((0.0, 0), |(s, n), v| (s + v as f64, n + 1));
    if n == 0 { 0.0 }
    else { sum / n as f64 }
}
