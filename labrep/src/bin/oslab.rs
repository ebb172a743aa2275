use std::{fs::OpenOptions, path::{Path, PathBuf}};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use labcore::{
    Disk, FitPolicy, Priority, ProcessRecord, SchedPolicy, Ticks, Units,
    workload::{blocks_from, requests_from},
};
use labrep::*;
use log::{info, warn};
use rand::{rngs::StdRng, SeedableRng};

/// Scheduling and allocation simulator for OS lab exercises
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json:       bool,

    /// Append log records to this file instead of stderr
    #[arg(long, global = true, value_parser = clap::value_parser!(PathBuf))]
    log_file:   Option<PathBuf>,

    #[command(subcommand)]
    cmd:        Cmd,
}

/// Processes, either from a workload file or column by column.
#[derive(Args, Debug)]
struct ProcArgs {
    /// JSON workload file
    #[arg(short, long, value_parser = clap::value_parser!(PathBuf))]
    workload:   Option<PathBuf>,

    /// Arrival times, one per process (default all 0)
    #[arg(long, value_delimiter = ',')]
    arrivals:   Vec<Ticks>,

    /// Burst times, one per process
    #[arg(long, value_delimiter = ',')]
    bursts:     Vec<Ticks>,

    /// Priorities, one per process, lower is more urgent (default all 0)
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    priorities: Vec<Priority>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Non-preemptive priority scheduling
    Priority(ProcArgs),

    /// Round-robin scheduling; every process arrives at time 0
    RoundRobin {
        #[command(flatten)]
        procs:      ProcArgs,

        /// Time quantum
        #[arg(short, long)]
        quantum:    Option<Ticks>,
    },

    /// Contiguous memory allocation (first, best, worst fit, or all)
    Fit {
        /// JSON workload file
        #[arg(short, long, value_parser = clap::value_parser!(PathBuf))]
        workload:   Option<PathBuf>,

        /// first, best, worst, or all
        #[arg(short, long, default_value = "first")]
        policy:     String,

        /// Block sizes
        #[arg(long, value_delimiter = ',', default_values_t = LAB_BLOCKS)]
        blocks:     Vec<Units>,

        /// Request sizes
        #[arg(long, value_delimiter = ',')]
        requests:   Vec<Units>,
    },

    /// Fixed partitions (MFT)
    Mft {
        #[arg(short, long, value_parser = clap::value_parser!(PathBuf))]
        workload:   Option<PathBuf>,

        /// Total memory size
        #[arg(short, long)]
        total:      Option<Units>,

        /// Size of every partition
        #[arg(short, long)]
        partition:  Option<Units>,

        #[arg(long, value_delimiter = ',')]
        requests:   Vec<Units>,
    },

    /// Variable partitions (MVT)
    Mvt {
        #[arg(short, long, value_parser = clap::value_parser!(PathBuf))]
        workload:   Option<PathBuf>,

        /// Total memory size
        #[arg(short, long)]
        total:      Option<Units>,

        #[arg(long, value_delimiter = ',')]
        requests:   Vec<Units>,
    },

    /// Indexed file allocation on a partly used disk
    Indexed {
        #[arg(long, default_value_t = LAB_DISK_BLOCKS)]
        disk_blocks:    usize,

        /// Blocks taken at random before allocating
        #[arg(long, default_value_t = LAB_OCCUPIED)]
        occupied:       usize,

        /// Seed for the random pre-occupation
        #[arg(long)]
        seed:           Option<u64>,

        /// File sizes, in blocks
        #[arg(value_delimiter = ',', required = true)]
        sizes:          Vec<Units>,
    },

    /// Sequential (contiguous) file allocation
    Sequential {
        #[arg(long, default_value_t = LAB_DISK_BLOCKS)]
        disk_blocks:    usize,

        /// Files as NAME:START:LENGTH
        #[arg(required = true)]
        files:          Vec<FileSpec>,
    },
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let level = if log_file.is_some() { "info" } else { "warn" };
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(level)
    );
    if let Some(p) = log_file {
        let fd = OpenOptions::new()
            .create(true)
            .append(true)
            .open(p)
            .with_context(|| format!("Cannot open log file {}", p.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(fd)));
    }
    builder.init();

    Ok(())
}

fn load(workload: &Option<PathBuf>) -> Result<Option<WorkloadFile>> {
    match workload {
        Some(p) => Ok(Some(WorkloadFile::load(p)?)),
        None    => Ok(None),
    }
}

fn processes(args: &ProcArgs) -> Result<(Vec<ProcessRecord>, Option<WorkloadFile>)> {
    let file = load(&args.workload)?;
    let procs = match &file {
        Some(w) => w.processes(),
        None    => processes_from_columns(&args.arrivals, &args.bursts, &args.priorities)?,
    };

    Ok((procs, file))
}

fn requests_or(file: &Option<WorkloadFile>, inline: &[Units]) -> Vec<labcore::AllocationRequest> {
    match file {
        Some(w) if !w.requests.is_empty()   => w.requests(),
        _                                   => requests_from(inline),
    }
}

fn emit<R: Render>(report: &R, json: bool) -> Result<()> {
    if json {
        println!("{}", report.json()?);
    } else {
        println!("{}", report.table());
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    match cli.cmd {
        Cmd::Priority(args)     => {
            let (procs, _) = processes(&args)?;
            let s = labcore::run_priority(procs)?;
            info!("Priority scheduling: order {:?}", s.order());
            emit(&ScheduleReport::new(SchedPolicy::Priority, &s), cli.json)?;
        },
        Cmd::RoundRobin { procs, quantum }  => {
            let (procs, file) = processes(&procs)?;
            let Some(quantum) = quantum.or(file.and_then(|w| w.quantum)) else {
                bail!("No time quantum given.");
            };
            let policy = SchedPolicy::RoundRobin { quantum };
            let s = policy.run(procs)?;
            info!("Round robin (q={quantum}): order {:?}", s.order());
            emit(&ScheduleReport::new(policy, &s), cli.json)?;
        },
        Cmd::Fit { workload, policy, blocks, requests } => {
            let file = load(&workload)?;
            let blocks = match &file {
                Some(w) if !w.blocks.is_empty() => w.blocks(),
                _                               => blocks_from(&blocks),
            };
            let reqs = requests_or(&file, &requests);
            if policy.trim().eq_ignore_ascii_case("all") {
                let outs = labcore::compare_policies(&blocks, &reqs)?;
                for o in &outs {
                    info!("{}: {} of {} requests unallocated", o.policy, o.unallocated().count(), reqs.len());
                }
                emit(&FitComparison::new(&outs), cli.json)?;
            } else {
                let policy: FitPolicy = policy.parse()?;
                let out = labcore::allocate(blocks, &reqs, policy)?;
                for r in out.unallocated() {
                    warn!("{policy}: request {} ({} units) not allocated", r.request_id, r.size);
                }
                emit(&FitReport::new(&out), cli.json)?;
            }
        },
        Cmd::Mft { workload, total, partition, requests }   => {
            let file = load(&workload)?;
            let Some(total) = total.or(file.as_ref().and_then(|w| w.total_memory)) else {
                bail!("No total memory size given.");
            };
            let Some(partition) = partition.or(file.as_ref().and_then(|w| w.partition_size)) else {
                bail!("No partition size given.");
            };
            let out = labcore::allocate_fixed_partitions(total, partition, &requests_or(&file, &requests))?;
            for p in &out.placements {
                if let Err(why) = p.verdict {
                    warn!("MFT: request {} ({} units) rejected: {}", p.request_id, p.size, rejection_reason(why));
                }
            }
            info!("MFT: {} of {} partitions used", out.partitions_used(), out.partition_count);
            emit(&FixedReport::new(&out), cli.json)?;
        },
        Cmd::Mvt { workload, total, requests }  => {
            let file = load(&workload)?;
            let Some(total) = total.or(file.as_ref().and_then(|w| w.total_memory)) else {
                bail!("No total memory size given.");
            };
            let out = labcore::allocate_variable_partitions(total, &requests_or(&file, &requests))?;
            for p in out.placements.iter().filter(|p| p.base.is_none()) {
                warn!("MVT: request {} ({} units) rejected, not enough space", p.request_id, p.size);
            }
            info!("MVT: {} allocated, {} left", out.allocated(), out.remaining);
            emit(&VariableReport::new(&out), cli.json)?;
        },
        Cmd::Indexed { disk_blocks, occupied, seed, sizes } => {
            let mut rng = match seed {
                Some(s) => StdRng::seed_from_u64(s),
                None    => StdRng::from_entropy(),
            };
            let mut disk = Disk::new(disk_blocks);
            let taken = scatter_occupied(&mut disk, occupied, &mut rng);
            info!("Disk initialized with {taken} used blocks (random)");
            let mut events = Vec::with_capacity(sizes.len());
            for (idx, size) in sizes.iter().enumerate() {
                let name = format!("file{}", idx + 1);
                let out = disk.create_indexed(&name, *size)?;
                events.push(DiskEvent::indexed(&name, &out));
            }
            emit(&DiskReport::new(&disk, events), cli.json)?;
        },
        Cmd::Sequential { disk_blocks, files }  => {
            let mut disk = Disk::new(disk_blocks);
            let mut events = Vec::with_capacity(files.len());
            for spec in &files {
                let out = disk.allocate_contiguous(&spec.name, spec.start, spec.length)?;
                events.push(DiskEvent::contiguous(&spec.name, &out));
            }
            emit(&DiskReport::new(&disk, events), cli.json)?;
        },
    }

    Ok(())
}
