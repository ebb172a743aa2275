//! Welcome to `labcore`!
//!
//! A small set of textbook operating-systems simulators, reworked as
//! pure engines over an abstract, discrete time axis:
//!
//! - [`sched`] runs non-preemptive priority and round-robin CPU scheduling.
//! - [`fit`] places requests onto memory blocks (first/best/worst fit).
//! - [`partition`] simulates fixed (MFT) and variable (MVT) partitioning.
//! - [`disk`] simulates indexed and sequential file allocation.
//!
//! Every engine consumes *owned* working copies of its mutable state. If
//! you want to compare two runs on the same input, clone the input.
//! Nothing in here touches a real thread, page or block device.

pub mod utils;
pub mod workload;
pub mod sched;
pub mod fit;
pub mod partition;
pub mod disk;

pub use crate::{
    utils::{SimError, Result, Ticks, Units, ProcessId, Priority},
    workload::{ProcessRecord, MemoryBlock, AllocationRequest},
    sched::{Schedule, ScheduleResult, SchedPolicy, Slice, run_priority, run_round_robin},
    fit::{FitPolicy, FitOutcome, AllocationResult, allocate, compare_policies},
    partition::{
        FixedOutcome, FixedPlacement, Rejection, VariableOutcome, VariablePlacement,
        allocate_fixed_partitions, allocate_variable_partitions,
    },
    disk::{Disk, Extent, IndexedFile, IndexedOutcome, ContiguousOutcome, FileEntry, allocate_indexed},
};
