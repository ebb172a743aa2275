use std::{fs, path::{Path, PathBuf}, str::FromStr};

use labcore::{
    AllocationRequest, Disk, MemoryBlock, Priority, ProcessId, ProcessRecord, Ticks, Units,
    workload::{blocks_from, requests_from},
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The blocks of the lab's contiguous memory exercise.
pub const LAB_BLOCKS: [Units; 5] = [100, 500, 200, 300, 600];
/// Disk size of the file allocation exercises.
pub const LAB_DISK_BLOCKS: usize = 50;
/// How many blocks the indexed demo takes at random before it starts.
pub const LAB_OCCUPIED: usize = 10;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path:   PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed workload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Bad file spec {0:?} (expected NAME:START:LENGTH)")]
    FileSpec(String),
    #[error("Got {got} {column} for {expected} bursts")]
    ColumnMismatch {
        column:     &'static str,
        got:        usize,
        expected:   usize,
    },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProcessSpec {
    /// Defaults to the 1-based position in the file.
    #[serde(default)]
    pub id:         Option<ProcessId>,
    #[serde(default)]
    pub arrival:    Ticks,
    pub burst:      Ticks,
    #[serde(default)]
    pub priority:   Priority,
}

/// A workload on disk, in JSON. Every field is optional, since
/// each subcommand only cares about some of them.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct WorkloadFile {
    pub processes:      Vec<ProcessSpec>,
    pub quantum:        Option<Ticks>,
    pub blocks:         Vec<Units>,
    pub requests:       Vec<Units>,
    pub total_memory:   Option<Units>,
    pub partition_size: Option<Units>,
}

impl WorkloadFile {
    pub fn load(path: &Path) -> Result<Self, InputError> {
        let txt = fs::read_to_string(path)
            .map_err(|source| InputError::Io { path: path.to_path_buf(), source })?;

        Self::from_json(&txt)
    }

    pub fn from_json(txt: &str) -> Result<Self, InputError> {
        Ok(serde_json::from_str(txt)?)
    }

    pub fn processes(&self) -> Vec<ProcessRecord> {
        self.processes.iter()
            .zip(1..)
            .map(|(p, pos)| ProcessRecord::new(p.id.unwrap_or(pos), p.arrival, p.burst, p.priority))
            .collect()
    }

    pub fn blocks(&self) -> Vec<MemoryBlock> {
        blocks_from(&self.blocks)
    }

    pub fn requests(&self) -> Vec<AllocationRequest> {
        requests_from(&self.requests)
    }
}

/// Zips per-column command line values into processes. Ids start at 1.
///
/// Arrivals and priorities may be left out altogether, in which case
/// they default to 0. If given, there must be one per burst.
pub fn processes_from_columns(
    arrivals:   &[Ticks],
    bursts:     &[Ticks],
    priorities: &[Priority],
) -> Result<Vec<ProcessRecord>, InputError> {
    check_column("arrivals", arrivals.len(), bursts.len())?;
    check_column("priorities", priorities.len(), bursts.len())?;

    Ok(bursts.iter()
        .enumerate()
        .map(|(idx, b)| {
            ProcessRecord::new(
                idx as ProcessId + 1,
                arrivals.get(idx).copied().unwrap_or(0),
                *b,
                priorities.get(idx).copied().unwrap_or(0),
            )
        })
        .collect())
}

fn check_column(column: &'static str, got: usize, expected: usize) -> Result<(), InputError> {
    if got == 0 || got == expected {
        Ok(())
    } else {
        Err(InputError::ColumnMismatch { column, got, expected })
    }
}

/// A sequential file request, written `NAME:START:LENGTH`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSpec {
    pub name:   String,
    pub start:  usize,
    pub length: usize,
}

impl FromStr for FileSpec {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || InputError::FileSpec(s.to_string());
        let mut parts = s.rsplitn(3, ':');
        let length = parts.next().and_then(|x| x.parse().ok()).ok_or_else(bad)?;
        let start = parts.next().and_then(|x| x.parse().ok()).ok_or_else(bad)?;
        let name = parts.next().filter(|n| !n.is_empty()).ok_or_else(bad)?;

        Ok(Self {
            name: name.to_string(),
            start,
            length,
        })
    }
}

/// Takes `count` random blocks, the way the indexed allocation demo
/// does before any file is created. Hitting the same block twice is
/// allowed, so fewer than `count` blocks may end up taken.
pub fn scatter_occupied<R: Rng>(disk: &mut Disk, count: usize, rng: &mut R) -> usize {
    if disk.is_empty() {
        return 0;
    }
    (0..count)
        .filter(|_| disk.occupy(rng.gen_range(0..disk.len())))
        .count()
}
