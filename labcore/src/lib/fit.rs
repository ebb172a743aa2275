use rayon::prelude::*;

use crate::utils::*;
use crate::workload::{AllocationRequest, MemoryBlock, init_blocks, init_requests};

/// Which block a request lands in, out of all blocks with enough
/// room left for it.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum FitPolicy {
    /// Lowest index
    First,
    /// Least remaining space
    Best,
    /// Most remaining space
    Worst,
}

impl FitPolicy {
    pub const ALL: [FitPolicy; 3] = [FitPolicy::First, FitPolicy::Best, FitPolicy::Worst];

    /// Picks a block for `size` units and returns its position in
    /// `blocks`. Order and ties follow [`MemoryBlock::index`], not
    /// the position, so shuffled blocks give the same answer.
    pub fn select(&self, blocks: &[MemoryBlock], size: Units) -> Option<usize> {
        let eligible = blocks.iter()
            .enumerate()
            .filter(|(_, b)| b.fits(size));
        let pick = match self {
            FitPolicy::First    => eligible.min_by_key(|(_, b)| b.index),
            FitPolicy::Best     => eligible.min_by_key(|(_, b)| (b.remaining, b.index)),
            FitPolicy::Worst    => eligible.min_by_key(|(_, b)| (Reverse(b.remaining), b.index)),
        };

        pick.map(|(pos, _)| pos)
    }
}

impl FromStr for FitPolicy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" | "first-fit" | "firstfit"  => Ok(FitPolicy::First),
            "best" | "best-fit" | "bestfit"     => Ok(FitPolicy::Best),
            "worst" | "worst-fit" | "worstfit"  => Ok(FitPolicy::Worst),
            _   => Err(SimError::PolicyNotRecognized(s.to_string())),
        }
    }
}

impl fmt::Display for FitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FitPolicy::First    => "first-fit",
            FitPolicy::Best     => "best-fit",
            FitPolicy::Worst    => "worst-fit",
        };
        write!(f, "{name}")
    }
}

/// Where one request went. `block` is `None` if no block
/// had enough room at the time the request was served.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocationResult {
    pub request_id:     u32,
    pub size:           Units,
    pub block:          Option<usize>,
    pub block_capacity: Option<Units>,
}

impl AllocationResult {
    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.block.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FitOutcome {
    pub policy:     FitPolicy,
    /// One entry per request, in request order.
    pub results:    Vec<AllocationResult>,
    /// Final state of the blocks.
    pub blocks:     Vec<MemoryBlock>,
}

impl FitOutcome {
    pub fn unallocated(&self) -> impl Iterator<Item = &AllocationResult> {
        self.results.iter().filter(|r| !r.is_allocated())
    }

    /// Space left over across all blocks.
    pub fn leftover(&self) -> Units {
        self.blocks.iter().map(|b| b.remaining).sum()
    }
}

/// Serves `requests` in order against `blocks`, according to `policy`.
///
/// A served request permanently eats into its block; nothing is ever
/// freed or compacted. Requests that fit nowhere are recorded as
/// unallocated and the run moves on.
pub fn allocate(
    mut blocks: Vec<MemoryBlock>,
    requests:   &[AllocationRequest],
    policy:     FitPolicy,
) -> Result<FitOutcome> {
    init_blocks(&blocks)?;
    init_requests(requests)?;
    let mut results = Vec::with_capacity(requests.len());

    for req in requests {
        let res = match policy.select(&blocks, req.size) {
            Some(pos)   => {
                let b = &mut blocks[pos];
                b.remaining -= req.size;
                debug!("{policy}: request {} ({}) -> block {} ({} left)", req.id, req.size, b.index, b.remaining);
                AllocationResult {
                    request_id:     req.id,
                    size:           req.size,
                    block:          Some(b.index),
                    block_capacity: Some(b.capacity),
                }
            },
            None        => {
                debug!("{policy}: request {} ({}) fits nowhere", req.id, req.size);
                AllocationResult {
                    request_id:     req.id,
                    size:           req.size,
                    block:          None,
                    block_capacity: None,
                }
            }
        };
        results.push(res);
    }

    Ok(FitOutcome {
        policy,
        results,
        blocks,
    })
}

/// Runs every [`FitPolicy`] on the same input, side by side. Each run
/// gets its own copy of the blocks, so runs don't see each other.
///
/// Outcomes come back in [`FitPolicy::ALL`] order.
pub fn compare_policies(
    blocks:     &[MemoryBlock],
    requests:   &[AllocationRequest],
) -> Result<Vec<FitOutcome>> {
    FitPolicy::ALL
        .par_iter()
        .map(|p| allocate(blocks.to_vec(), requests, *p))
        .collect()
}
