use crate::utils::*;
use crate::workload::{ProcessRecord, init_processes};

/// A contiguous stretch of simulated CPU time. A slice without
/// a `pid` means the CPU sat idle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slice {
    pub pid:    Option<ProcessId>,
    pub start:  Ticks,
    pub end:    Ticks,
}

impl Slice {
    #[inline]
    fn run(pid: ProcessId, start: Ticks, end: Ticks) -> Self {
        Self { pid: Some(pid), start, end }
    }

    #[inline]
    fn idle(start: Ticks, end: Ticks) -> Self {
        Self { pid: None, start, end }
    }

    #[inline]
    pub fn duration(&self) -> Ticks {
        self.end - self.start
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.pid.is_none()
    }
}

/// Timing metrics of one completed process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleResult {
    pub id:         ProcessId,
    pub arrival:    Ticks,
    pub burst:      Ticks,
    pub priority:   Priority,
    pub completion: Ticks,
    pub turnaround: Ticks,
    pub waiting:    Ticks,
}

impl ScheduleResult {
    fn settle(p: &ProcessRecord, arrival: Ticks, completion: Ticks) -> Self {
        let turnaround = completion - arrival;
        Self {
            id:         p.id,
            arrival,
            burst:      p.burst,
            priority:   p.priority,
            completion,
            turnaround,
            waiting:    turnaround - p.burst,
        }
    }
}

/// What a scheduling run produces: per-process metrics in order of
/// completion, plus the executed timeline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schedule {
    pub results:    Vec<ScheduleResult>,
    pub timeline:   Vec<Slice>,
}

impl Schedule {
    fn with_capacity(n: usize) -> Self {
        Self {
            results:    Vec::with_capacity(n),
            timeline:   Vec::with_capacity(n),
        }
    }

    /// Process ids in the order they completed.
    pub fn order(&self) -> Vec<ProcessId> {
        self.results.iter()
            .map(|r| r.id)
            .collect()
    }

    pub fn avg_waiting(&self) -> f64 {
        mean(self.results.iter().map(|r| r.waiting))
    }

    pub fn avg_turnaround(&self) -> f64 {
        mean(self.results.iter().map(|r| r.turnaround))
    }

    /// The moment the last slice ends.
    pub fn makespan(&self) -> Ticks {
        self.timeline.last()
            .map(|s| s.end)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, id: ProcessId) -> Option<&ScheduleResult> {
        self.results.iter().find(|r| r.id == id)
    }

    pub fn by_id(&self) -> Vec<&ScheduleResult> {
        self.results.iter()
            .sorted_by_key(|r| r.id)
            .collect()
    }
}

/// Non-preemptive priority scheduling.
///
/// At every decision point, the arrived-and-unfinished process with
/// the smallest priority value runs to completion. Ties go to the
/// smallest process id. If nothing has arrived yet, the CPU idles until
/// the next arrival.
pub fn run_priority(mut procs: Vec<ProcessRecord>) -> Result<Schedule> {
    init_processes(&procs)?;
    let mut res = Schedule::with_capacity(procs.len());
    let mut finished = vec![false; procs.len()];
    let mut completed = 0;
    let mut now: Ticks = 0;

    while completed < procs.len() {
        let pick = procs.iter()
            .enumerate()
            .filter(|(idx, p)| !finished[*idx] && p.arrival <= now)
            .min_by_key(|(_, p)| (p.priority, p.id))
            .map(|(idx, _)| idx);
        match pick {
            Some(idx)   => {
                let p = &mut procs[idx];
                let start = now;
                now += p.burst;
                p.remaining = 0;
                finished[idx] = true;
                completed += 1;
                debug!("t={start}: P{} (priority {}) runs until t={now}", p.id, p.priority);
                res.timeline.push(Slice::run(p.id, start, now));
                res.results.push(ScheduleResult::settle(p, p.arrival, now));
            },
            None        => {
                let Some(next) = procs.iter()
                    .enumerate()
                    .filter(|(idx, _)| !finished[*idx])
                    .map(|(_, p)| p.arrival)
                    .min() else { break; };
                debug!("t={now}: CPU idle until t={next}");
                res.timeline.push(Slice::idle(now, next));
                now = next;
            }
        }
    }
    info!("Priority run done: {} processes, makespan {}", res.results.len(), res.makespan());

    Ok(res)
}

/// Round-robin scheduling with a fixed time quantum.
///
/// All processes are taken to arrive at time 0; arrival times are
/// ignored and reported as 0. The list is swept in its original order
/// until a sweep finds nothing left to run.
pub fn run_round_robin(mut procs: Vec<ProcessRecord>, quantum: Ticks) -> Result<Schedule> {
    if quantum == 0 {
        return Err(SimError::ZeroQuantum);
    }
    init_processes(&procs)?;
    let mut res = Schedule::with_capacity(procs.len());
    let mut now: Ticks = 0;

    loop {
        let mut progressed = false;
        for p in procs.iter_mut().filter(|p| !p.is_done()) {
            progressed = true;
            let run = p.remaining.min(quantum);
            let start = now;
            now += run;
            p.remaining -= run;
            res.timeline.push(Slice::run(p.id, start, now));
            if p.is_done() {
                debug!("t={now}: P{} completes", p.id);
                res.results.push(ScheduleResult::settle(p, 0, now));
            }
        }
        if !progressed { break; }
    }
    info!("Round-robin run done (q={quantum}): {} processes, makespan {}", res.results.len(), res.makespan());

    Ok(res)
}

/// A scheduling policy, as picked by a caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedPolicy {
    Priority,
    RoundRobin { quantum: Ticks },
}

impl SchedPolicy {
    pub fn run(&self, procs: Vec<ProcessRecord>) -> Result<Schedule> {
        match self {
            SchedPolicy::Priority               => run_priority(procs),
            SchedPolicy::RoundRobin { quantum } => run_round_robin(procs, *quantum),
        }
    }
}

/// Accepts `priority` and `rr:<quantum>` (or `round-robin:<quantum>`).
impl FromStr for SchedPolicy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim().to_ascii_lowercase();
        match token.split_once(':') {
            None if token == "priority" => Ok(SchedPolicy::Priority),
            Some(("rr" | "round-robin", q))  => {
                match q.parse::<Ticks>() {
                    Ok(quantum) => Ok(SchedPolicy::RoundRobin { quantum }),
                    Err(_)      => Err(SimError::PolicyNotRecognized(s.to_string())),
                }
            },
            _   => Err(SimError::PolicyNotRecognized(s.to_string())),
        }
    }
}

impl fmt::Display for SchedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedPolicy::Priority               => write!(f, "priority"),
            SchedPolicy::RoundRobin { quantum } => write!(f, "rr:{quantum}"),
        }
    }
}
