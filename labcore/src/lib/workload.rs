use crate::utils::*;

/// One process of a scheduling workload.
///
/// [`remaining`](ProcessRecord::remaining) is the only field that an
/// engine ever touches: it counts down as the process receives CPU time.
/// Everything else is fixed for the lifetime of the record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessRecord {
    pub id:         ProcessId,
    pub arrival:    Ticks,
    pub burst:      Ticks,
    pub priority:   Priority,
    pub remaining:  Ticks,
}

impl ProcessRecord {
    pub fn new(id: ProcessId, arrival: Ticks, burst: Ticks, priority: Priority) -> Self {
        Self {
            id,
            arrival,
            burst,
            priority,
            remaining: burst,
        }
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.remaining == 0
    }
}

/// A contiguous chunk of memory (or a disk region) that requests
/// are carved out of. Blocks never grow back: there is no freeing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryBlock {
    pub index:      usize,
    pub capacity:   Units,
    pub remaining:  Units,
}

impl MemoryBlock {
    pub fn new(index: usize, capacity: Units) -> Self {
        Self {
            index,
            capacity,
            remaining: capacity,
        }
    }

    #[inline]
    pub fn fits(&self, size: Units) -> bool {
        self.remaining >= size
    }

    #[inline]
    pub fn used(&self) -> Units {
        self.capacity - self.remaining
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocationRequest {
    pub id:     u32,
    pub size:   Units,
}

impl AllocationRequest {
    pub fn new(id: u32, size: Units) -> Self {
        Self { id, size }
    }
}

/// Builds fresh blocks out of raw capacities, indexed from 0.
pub fn blocks_from(capacities: &[Units]) -> Vec<MemoryBlock> {
    capacities.iter()
        .enumerate()
        .map(|(idx, c)| MemoryBlock::new(idx, *c))
        .collect()
}

/// Builds requests out of raw sizes. Ids start at 1.
pub fn requests_from(sizes: &[Units]) -> Vec<AllocationRequest> {
    sizes.iter()
        .zip(1..)
        .map(|(s, id)| AllocationRequest::new(id, *s))
        .collect()
}

/// Checks a set of processes against the engines' assumptions:
/// - ids start at 1 and are unique
/// - no process has zero burst time
/// - every process is fresh, i.e. remaining burst equals burst
/// - the latest arrival plus all bursts fits in [`Ticks`], which
///   bounds every clock value a scheduler can reach
///
/// This is the gatekeeper to the scheduling engine. The first
/// offending record aborts the whole run.
pub fn init_processes(procs: &[ProcessRecord]) -> Result<()> {
    let mut seen = HashSet::with_capacity(procs.len());
    for p in procs {
        if p.id == 0 {
            return Err(SimError::InvalidId);
        } else if !seen.insert(p.id) {
            return Err(SimError::DuplicateId { id: p.id });
        } else if p.burst == 0 {
            return Err(SimError::ZeroBurst { id: p.id });
        } else if p.remaining != p.burst {
            return Err(SimError::BadRemaining { id: p.id });
        }
    }
    let latest = procs.iter().map(|p| p.arrival).max().unwrap_or(0);
    procs.iter()
        .try_fold(latest, |horizon, p| horizon.checked_add(p.burst))
        .ok_or(SimError::TimeOverflow)?;

    Ok(())
}

/// Same as [`init_processes`], for allocation requests.
pub fn init_requests(reqs: &[AllocationRequest]) -> Result<()> {
    match reqs.iter().find(|r| r.size == 0) {
        Some(r) => Err(SimError::ZeroSize { id: r.id }),
        None    => Ok(()),
    }
}

/// Same as [`init_processes`], for memory blocks.
pub fn init_blocks(blocks: &[MemoryBlock]) -> Result<()> {
    for b in blocks {
        if b.capacity == 0 {
            return Err(SimError::ZeroCapacity { index: b.index });
        } else if b.remaining > b.capacity {
            return Err(SimError::BadBlock { index: b.index });
        }
    }

    Ok(())
}
