use std::fmt;

use labcore::{
    ContiguousOutcome, Disk, FileEntry, FitOutcome, FixedOutcome, IndexedOutcome, Priority,
    ProcessId, Rejection, SchedPolicy, Schedule, Ticks, Units, VariableOutcome,
};
use serde::Serialize;

/// Anything that can be shown as a console table or dumped as JSON.
pub trait Render: Serialize + fmt::Display {
    fn table(&self) -> String {
        self.to_string()
    }

    fn json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn or_dash<T: fmt::Display>(v: Option<T>) -> String {
    v.map(|x| x.to_string())
        .unwrap_or_else(|| String::from("-"))
}

//---START SCHEDULING
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ScheduleRow {
    pub id:         ProcessId,
    pub priority:   Priority,
    pub arrival:    Ticks,
    pub burst:      Ticks,
    pub waiting:    Ticks,
    pub turnaround: Ticks,
    pub completion: Ticks,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SliceRow {
    pub pid:    Option<ProcessId>,
    pub start:  Ticks,
    pub end:    Ticks,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ScheduleReport {
    pub policy:         String,
    /// Process ids in order of completion.
    pub order:          Vec<ProcessId>,
    /// One row per process, by id.
    pub rows:           Vec<ScheduleRow>,
    pub timeline:       Vec<SliceRow>,
    pub avg_waiting:    f64,
    pub avg_turnaround: f64,
    pub makespan:       Ticks,
}

impl ScheduleReport {
    pub fn new(policy: SchedPolicy, s: &Schedule) -> Self {
        Self {
            policy:         policy.to_string(),
            order:          s.order(),
            rows:           s.by_id()
                .into_iter()
                .map(|r| ScheduleRow {
                    id:         r.id,
                    priority:   r.priority,
                    arrival:    r.arrival,
                    burst:      r.burst,
                    waiting:    r.waiting,
                    turnaround: r.turnaround,
                    completion: r.completion,
                })
                .collect(),
            timeline:       s.timeline.iter()
                .map(|sl| SliceRow { pid: sl.pid, start: sl.start, end: sl.end })
                .collect(),
            avg_waiting:    s.avg_waiting(),
            avg_turnaround: s.avg_turnaround(),
            makespan:       s.makespan(),
        }
    }
}

impl fmt::Display for ScheduleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order: Vec<String> = self.order.iter().map(|id| id.to_string()).collect();
        writeln!(f, "Policy: {}", self.policy)?;
        writeln!(f, "Process Execution Order: {}", order.join(" -> "))?;
        writeln!(f)?;
        writeln!(f, "{:<5}{:<10}{:<10}{:<10}{:<10}{:<12}{:<10}",
            "ID", "Priority", "Arrival", "Burst", "Wait", "Turnaround", "Completion")?;
        for r in &self.rows {
            writeln!(f, "{:<5}{:<10}{:<10}{:<10}{:<10}{:<12}{:<10}",
                r.id, r.priority, r.arrival, r.burst, r.waiting, r.turnaround, r.completion)?;
        }
        writeln!(f)?;
        let gantt: Vec<String> = self.timeline.iter()
            .map(|sl| match sl.pid {
                Some(pid)   => format!("[{}-{} P{pid}]", sl.start, sl.end),
                None        => format!("[{}-{} idle]", sl.start, sl.end),
            })
            .collect();
        writeln!(f, "Timeline: {}", gantt.join(" "))?;
        writeln!(f, "Average Waiting Time: {:.2}", self.avg_waiting)?;
        write!(f, "Average Turnaround Time: {:.2}", self.avg_turnaround)
    }
}

impl Render for ScheduleReport {}
//---END SCHEDULING

//---START CONTIGUOUS MEMORY
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct FitRow {
    pub request_id: u32,
    pub size:       Units,
    /// 1-based, as the lab numbers its blocks.
    pub block:      Option<usize>,
    pub block_size: Option<Units>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct FitReport {
    pub policy:         String,
    pub rows:           Vec<FitRow>,
    pub unallocated:    usize,
    pub leftover:       Units,
}

impl FitReport {
    pub fn new(out: &FitOutcome) -> Self {
        Self {
            policy:         out.policy.to_string(),
            rows:           out.results.iter()
                .map(|r| FitRow {
                    request_id: r.request_id,
                    size:       r.size,
                    block:      r.block.map(|b| b + 1),
                    block_size: r.block_capacity,
                })
                .collect(),
            unallocated:    out.unallocated().count(),
            leftover:       out.leftover(),
        }
    }
}

impl fmt::Display for FitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Strategy: {}", self.policy)?;
        writeln!(f, "{:<15}{:<15}{:<15}{}", "Process No.", "Process Size", "Block No.", "Block Initial Size")?;
        for r in &self.rows {
            let blk = r.block
                .map(|b| b.to_string())
                .unwrap_or_else(|| String::from("Not Allocated"));
            writeln!(f, "{:<15}{:<15}{:<15}{}", r.request_id, r.size, blk, or_dash(r.block_size))?;
        }
        write!(f, "Unallocated: {}, space left in blocks: {}", self.unallocated, self.leftover)
    }
}

impl Render for FitReport {}

/// Several fit runs over the same input.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct FitComparison {
    pub runs: Vec<FitReport>,
}

impl FitComparison {
    pub fn new(outs: &[FitOutcome]) -> Self {
        Self { runs: outs.iter().map(FitReport::new).collect() }
    }
}

impl fmt::Display for FitComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, run) in self.runs.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
                writeln!(f)?;
            }
            write!(f, "{run}")?;
        }

        Ok(())
    }
}

impl Render for FitComparison {}
//---END CONTIGUOUS MEMORY

//---START PARTITIONS
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct FixedRow {
    pub request_id:             u32,
    pub size:                   Units,
    pub partition:              Option<usize>,
    pub internal_fragmentation: Option<Units>,
    /// `"too-big"` or `"full"` when rejected.
    pub rejected:               Option<Rejection>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct FixedReport {
    pub total_memory:           Units,
    pub partition_size:         Units,
    pub partition_count:        usize,
    pub external_fragmentation: Units,
    pub rows:                   Vec<FixedRow>,
    pub internal_fragmentation: Units,
}

impl FixedReport {
    pub fn new(out: &FixedOutcome) -> Self {
        Self {
            total_memory:           out.total_memory,
            partition_size:         out.partition_size,
            partition_count:        out.partition_count,
            external_fragmentation: out.external_fragmentation,
            rows:                   out.placements.iter()
                .map(|p| FixedRow {
                    request_id:             p.request_id,
                    size:                   p.size,
                    partition:              p.verdict.ok().map(|(slot, _)| slot + 1),
                    internal_fragmentation: p.internal_fragmentation(),
                    rejected:               p.verdict.err(),
                })
                .collect(),
            internal_fragmentation: out.internal_fragmentation,
        }
    }
}

impl fmt::Display for FixedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Blocks Created: {}", self.partition_count)?;
        writeln!(f, "Initial External Fragmentation (Unusable): {}", self.external_fragmentation)?;
        writeln!(f)?;
        writeln!(f, "{:<10}{:<15}{:<15}{:<15}", "Process", "Memory Req", "Allocated", "Internal Frag")?;
        for r in &self.rows {
            let verdict = match r.rejected {
                None                    => "YES",
                Some(Rejection::Full)   => "NO (Full)",
                Some(Rejection::TooBig) => "NO (Too Big)",
            };
            writeln!(f, "{:<10}{:<15}{:<15}{:<15}", r.request_id, r.size, verdict, or_dash(r.internal_fragmentation))?;
        }
        writeln!(f)?;
        write!(f, "Total Internal Fragmentation: {}", self.internal_fragmentation)
    }
}

impl Render for FixedReport {}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct VariableRow {
    pub request_id: u32,
    pub size:       Units,
    pub base:       Option<Units>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct VariableReport {
    pub total_memory:   Units,
    pub allocated:      Units,
    pub remaining:      Units,
    pub rows:           Vec<VariableRow>,
}

impl VariableReport {
    pub fn new(out: &VariableOutcome) -> Self {
        Self {
            total_memory:   out.total_memory,
            allocated:      out.allocated(),
            remaining:      out.remaining,
            rows:           out.placements.iter()
                .map(|p| VariableRow { request_id: p.request_id, size: p.size, base: p.base })
                .collect(),
        }
    }
}

impl fmt::Display for VariableReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<10}{:<15}{:<15}", "Process", "Memory Req", "Base")?;
        for r in &self.rows {
            let base = r.base
                .map(|b| b.to_string())
                .unwrap_or_else(|| String::from("Not enough space"));
            writeln!(f, "{:<10}{:<15}{:<15}", r.request_id, r.size, base)?;
        }
        writeln!(f)?;
        writeln!(f, "Total Memory: {}", self.total_memory)?;
        writeln!(f, "Total Allocated: {}", self.allocated)?;
        write!(f, "Total External Fragmentation (Remaining): {}", self.remaining)
    }
}

impl Render for VariableReport {}
//---END PARTITIONS

//---START DISK
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct FileRow {
    pub name:           String,
    pub index_block:    Option<usize>,
    pub blocks:         Vec<usize>,
}

/// One line per file request, in the order they were made.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct DiskEvent {
    pub name:       String,
    pub allocated:  bool,
    pub detail:     String,
}

impl DiskEvent {
    pub fn indexed(name: &str, out: &IndexedOutcome) -> Self {
        let (allocated, detail) = match out {
            IndexedOutcome::Allocated(f)                    => {
                (true, format!("index block {}, data blocks {:?}", f.index_block, f.data_blocks))
            },
            IndexedOutcome::Unallocated { free, needed }    => {
                (false, format!("not enough space ({needed} blocks needed, {free} free)"))
            },
        };

        Self { name: name.to_string(), allocated, detail }
    }

    pub fn contiguous(name: &str, out: &ContiguousOutcome) -> Self {
        let (allocated, detail) = match out {
            ContiguousOutcome::Allocated(e)         => {
                (true, format!("blocks {} to {}", e.start, e.end() - 1))
            },
            ContiguousOutcome::OutOfBounds          => (false, String::from("exceeds disk bounds")),
            ContiguousOutcome::Occupied { block }   => {
                (false, format!("block {block} already allocated"))
            },
        };

        Self { name: name.to_string(), allocated, detail }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct DiskReport {
    pub total_blocks:   usize,
    pub free_blocks:    usize,
    pub events:         Vec<DiskEvent>,
    pub files:          Vec<FileRow>,
}

impl DiskReport {
    pub fn new(disk: &Disk, events: Vec<DiskEvent>) -> Self {
        Self {
            total_blocks:   disk.len(),
            free_blocks:    disk.free_count(),
            events,
            files:          disk.files()
                .iter()
                .map(|(name, entry)| match entry {
                    FileEntry::Contiguous(e)    => FileRow {
                        name:           name.clone(),
                        index_block:    None,
                        blocks:         e.blocks().collect(),
                    },
                    FileEntry::Indexed(f)       => FileRow {
                        name:           name.clone(),
                        index_block:    Some(f.index_block),
                        blocks:         f.data_blocks.clone(),
                    },
                })
                .collect(),
        }
    }
}

impl fmt::Display for DiskReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in &self.events {
            let mark = if e.allocated { "OK" } else { "FAILED" };
            writeln!(f, "File '{}': {mark}, {}", e.name, e.detail)?;
        }
        writeln!(f)?;
        writeln!(f, "{:<12}{:<8}{}", "File", "Index", "Blocks")?;
        for r in &self.files {
            writeln!(f, "{:<12}{:<8}{:?}", r.name, or_dash(r.index_block), r.blocks)?;
        }
        writeln!(f)?;
        write!(f, "Disk Status (Total: {} blocks): {} free", self.total_blocks, self.free_blocks)
    }
}

impl Render for DiskReport {}
//---END DISK

/// Human-readable reason for a fixed-partition rejection.
pub fn rejection_reason(r: Rejection) -> &'static str {
    match r {
        Rejection::TooBig   => "request exceeds the partition size",
        Rejection::Full     => "no partition left",
    }
}
