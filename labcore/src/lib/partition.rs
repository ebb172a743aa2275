use serde::Serialize;

use crate::utils::*;
use crate::workload::{AllocationRequest, init_requests};

/// Why a request did not get a fixed partition.
#[derive(Serialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Rejection {
    /// Bigger than a single partition.
    TooBig,
    /// Every partition is already taken.
    Full,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::TooBig   => write!(f, "too big"),
            Rejection::Full     => write!(f, "full"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedPlacement {
    pub request_id: u32,
    pub size:       Units,
    /// On success, the partition slot and the space wasted inside it.
    pub verdict:    std::result::Result<(usize, Units), Rejection>,
}

impl FixedPlacement {
    pub fn internal_fragmentation(&self) -> Option<Units> {
        self.verdict.ok().map(|(_, frag)| frag)
    }
}

/// Multiprogramming with a Fixed number of Tasks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedOutcome {
    pub total_memory:           Units,
    pub partition_size:         Units,
    pub partition_count:        usize,
    /// The tail of memory too short to hold a whole partition.
    pub external_fragmentation: Units,
    pub placements:             Vec<FixedPlacement>,
    pub internal_fragmentation: Units,
}

impl FixedOutcome {
    pub fn partitions_used(&self) -> usize {
        self.placements.iter()
            .filter(|p| p.verdict.is_ok())
            .count()
    }
}

/// Cuts `total` into equal partitions of `partition_size` and hands one
/// out per fitting request, in order. A partition is never given back.
///
/// Once all partitions are gone, every later request is rejected as
/// [`Rejection::Full`], whatever its size.
pub fn allocate_fixed_partitions(
    total:          Units,
    partition_size: Units,
    requests:       &[AllocationRequest],
) -> Result<FixedOutcome> {
    if total == 0 {
        return Err(SimError::ZeroMemory);
    } else if partition_size == 0 {
        return Err(SimError::ZeroPartition);
    }
    init_requests(requests)?;

    let partition_count = total / partition_size;
    let mut res = FixedOutcome {
        total_memory:           total,
        partition_size,
        partition_count,
        external_fragmentation: total - partition_count * partition_size,
        placements:             Vec::with_capacity(requests.len()),
        internal_fragmentation: 0,
    };

    let mut next_slot = 0;
    for req in requests {
        let verdict = if next_slot >= partition_count {
            Err(Rejection::Full)
        } else if req.size > partition_size {
            Err(Rejection::TooBig)
        } else {
            let frag = partition_size - req.size;
            res.internal_fragmentation += frag;
            next_slot += 1;
            Ok((next_slot - 1, frag))
        };
        if let Err(why) = verdict {
            debug!("MFT: request {} ({}) rejected, {why}", req.id, req.size);
        }
        res.placements.push(FixedPlacement {
            request_id: req.id,
            size:       req.size,
            verdict,
        });
    }

    Ok(res)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariablePlacement {
    pub request_id: u32,
    pub size:       Units,
    /// Start address of the carved region, if any.
    pub base:       Option<Units>,
}

/// Multiprogramming with a Variable number of Tasks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableOutcome {
    pub total_memory:   Units,
    pub placements:     Vec<VariablePlacement>,
    /// Memory nobody got. With no freeing, this is all
    /// external fragmentation by the end of the run.
    pub remaining:      Units,
}

impl VariableOutcome {
    pub fn allocated(&self) -> Units {
        self.total_memory - self.remaining
    }
}

/// Carves requests one after the other off the bottom of `total`.
/// A request bigger than what is left is skipped, not fatal.
pub fn allocate_variable_partitions(
    total:      Units,
    requests:   &[AllocationRequest],
) -> Result<VariableOutcome> {
    if total == 0 {
        return Err(SimError::ZeroMemory);
    }
    init_requests(requests)?;

    let mut free = total;
    let placements = requests.iter()
        .map(|req| {
            let base = if req.size <= free {
                let base = total - free;
                free -= req.size;
                Some(base)
            } else {
                debug!("MVT: request {} ({}) rejected, {free} left", req.id, req.size);
                None
            };
            VariablePlacement {
                request_id: req.id,
                size:       req.size,
                base,
            }
        })
        .collect();

    Ok(VariableOutcome {
        total_memory: total,
        placements,
        remaining: free,
    })
}
