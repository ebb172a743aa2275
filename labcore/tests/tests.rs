use labcore::*;
use labcore::workload::{blocks_from, requests_from};

const LAB_BLOCKS: [Units; 5] = [100, 500, 200, 300, 600];
const LAB_REQUESTS: [Units; 4] = [212, 417, 112, 426];

fn procs(rows: &[(Ticks, Ticks, Priority)]) -> Vec<ProcessRecord> {
    rows.iter()
        .zip(1..)
        .map(|((a, b, p), id)| ProcessRecord::new(id, *a, *b, *p))
        .collect()
}

fn bursts(bs: &[Ticks]) -> Vec<ProcessRecord> {
    bs.iter()
        .zip(1..)
        .map(|(b, id)| ProcessRecord::new(id, 0, *b, 0))
        .collect()
}

fn placed_in(out: &FitOutcome) -> Vec<Option<usize>> {
    out.results.iter().map(|r| r.block).collect()
}

// Walks the timeline and checks that it is contiguous, that no process
// outruns its burst, and that the reported metrics agree with it.
fn check_trace(input: &[ProcessRecord], s: &Schedule) {
    let mut clock = 0;
    for slice in &s.timeline {
        assert_eq!(slice.start, clock);
        assert!(slice.end > slice.start);
        clock = slice.end;
    }
    for p in input {
        let ran: Ticks = s.timeline.iter()
            .filter(|sl| sl.pid == Some(p.id))
            .map(|sl| sl.duration())
            .sum();
        assert_eq!(ran, p.burst);
        let r = s.get(p.id).unwrap();
        let last = s.timeline.iter()
            .filter(|sl| sl.pid == Some(p.id))
            .map(|sl| sl.end)
            .max()
            .unwrap();
        assert_eq!(r.completion, last);
        assert_eq!(r.waiting + r.burst, r.turnaround);
    }
}

#[test]
fn priority_staggered_arrivals() {
    let input = procs(&[(0, 5, 2), (1, 3, 1), (2, 1, 3)]);
    let s = run_priority(input.clone()).unwrap();
    check_trace(&input, &s);
    // P1 is alone at t=0 and can't be preempted.
    assert_eq!(s.order(), vec![1, 2, 3]);
    let waits: Vec<Ticks> = s.by_id().iter().map(|r| r.waiting).collect();
    let tats: Vec<Ticks> = s.by_id().iter().map(|r| r.turnaround).collect();
    assert_eq!(waits, vec![0, 4, 6]);
    assert_eq!(tats, vec![5, 7, 7]);
    assert!((s.avg_waiting() - 10.0 / 3.0).abs() < 1e-9);
    assert!((s.avg_turnaround() - 19.0 / 3.0).abs() < 1e-9);
}

#[test]
fn priority_simultaneous_arrivals() {
    let input = procs(&[(0, 5, 2), (0, 3, 1), (0, 1, 3)]);
    let s = run_priority(input.clone()).unwrap();
    check_trace(&input, &s);
    assert_eq!(s.order(), vec![2, 1, 3]);
    assert_eq!(s.get(1).unwrap().waiting, 3);
    assert_eq!(s.get(3).unwrap().completion, 9);
}

#[test]
fn priority_ties_go_to_lowest_id() {
    let input = vec![
        ProcessRecord::new(7, 0, 2, 1),
        ProcessRecord::new(3, 0, 2, 1),
        ProcessRecord::new(5, 0, 2, 0),
    ];
    let s = run_priority(input).unwrap();
    assert_eq!(s.order(), vec![5, 3, 7]);
}

#[test]
fn priority_idles_until_first_arrival() {
    let input = procs(&[(3, 2, 1), (10, 1, 1)]);
    let s = run_priority(input.clone()).unwrap();
    check_trace(&input, &s);
    let idle: Vec<(Ticks, Ticks)> = s.timeline.iter()
        .filter(|sl| sl.is_idle())
        .map(|sl| (sl.start, sl.end))
        .collect();
    assert_eq!(idle, vec![(0, 3), (5, 10)]);
    assert_eq!(s.get(1).unwrap().turnaround, 2);
    assert_eq!(s.get(2).unwrap().waiting, 0);
    assert_eq!(s.makespan(), 11);
}

#[test]
fn round_robin_lab_fixture() {
    let input = bursts(&[10, 4, 6]);
    let s = run_round_robin(input.clone(), 3).unwrap();
    check_trace(&input, &s);
    assert_eq!(s.order(), vec![2, 3, 1]);
    assert_eq!(s.timeline.len(), 8);
    assert!(s.timeline.windows(2).all(|w| w[0].end < w[1].end));
    let r = s.get(1).unwrap();
    assert_eq!((r.completion, r.waiting), (20, 10));
    let r = s.get(2).unwrap();
    assert_eq!((r.completion, r.waiting), (13, 9));
    let r = s.get(3).unwrap();
    assert_eq!((r.completion, r.waiting), (16, 10));
}

#[test]
fn round_robin_ignores_arrivals() {
    let input = vec![ProcessRecord::new(1, 4, 2, 0)];
    let s = run_round_robin(input, 5).unwrap();
    let r = s.get(1).unwrap();
    assert_eq!((r.arrival, r.turnaround, r.waiting), (0, 2, 0));
}

#[test]
fn spent_records_are_refused_by_every_policy() {
    let mut input = bursts(&[3, 3]);
    input[0].remaining = 0;
    assert_eq!(run_round_robin(input.clone(), 2), Err(SimError::BadRemaining { id: 1 }));
    assert_eq!(run_priority(input.clone()), Err(SimError::BadRemaining { id: 1 }));
    input[0].remaining = 1;
    assert_eq!(run_priority(input), Err(SimError::BadRemaining { id: 1 }));
}

#[test]
fn clock_overflow_is_refused() {
    let long = bursts(&[usize::MAX, 1]);
    assert_eq!(run_round_robin(long.clone(), 4), Err(SimError::TimeOverflow));
    assert_eq!(run_priority(long), Err(SimError::TimeOverflow));
    // A late arrival counts towards the horizon too.
    let late = vec![ProcessRecord::new(1, usize::MAX, 1, 0)];
    assert_eq!(run_priority(late), Err(SimError::TimeOverflow));
    let edge = vec![ProcessRecord::new(1, 0, usize::MAX - 1, 0), ProcessRecord::new(2, 0, 1, 0)];
    assert_eq!(run_round_robin(edge, usize::MAX).unwrap().makespan(), usize::MAX);
}

#[test]
fn bad_workloads_are_refused() {
    assert_eq!(run_round_robin(bursts(&[1]), 0), Err(SimError::ZeroQuantum));
    assert_eq!(run_priority(bursts(&[4, 0])), Err(SimError::ZeroBurst { id: 2 }));
    let dup = vec![ProcessRecord::new(1, 0, 1, 0), ProcessRecord::new(1, 0, 1, 0)];
    assert_eq!(run_priority(dup), Err(SimError::DuplicateId { id: 1 }));
    assert_eq!(run_priority(vec![ProcessRecord::new(0, 0, 1, 0)]), Err(SimError::InvalidId));
    let reqs = requests_from(&[10, 0]);
    assert_eq!(
        allocate(blocks_from(&LAB_BLOCKS), &reqs, FitPolicy::First).unwrap_err(),
        SimError::ZeroSize { id: 2 }
    );
    assert_eq!(
        allocate(blocks_from(&[10, 0]), &[], FitPolicy::Best).unwrap_err(),
        SimError::ZeroCapacity { index: 1 }
    );
    assert_eq!(allocate_fixed_partitions(100, 0, &[]).unwrap_err(), SimError::ZeroPartition);
    assert_eq!(allocate_variable_partitions(0, &[]).unwrap_err(), SimError::ZeroMemory);
    assert_eq!(allocate_indexed(&Disk::new(4), 0).unwrap_err(), SimError::ZeroLength);
}

#[test]
fn policies_parse_or_fail_closed() {
    assert_eq!("Best".parse::<FitPolicy>(), Ok(FitPolicy::Best));
    assert_eq!("worst-fit".parse::<FitPolicy>(), Ok(FitPolicy::Worst));
    assert_eq!(
        "next".parse::<FitPolicy>(),
        Err(SimError::PolicyNotRecognized("next".to_string()))
    );
    assert_eq!("rr:4".parse::<SchedPolicy>(), Ok(SchedPolicy::RoundRobin { quantum: 4 }));
    assert_eq!("priority".parse::<SchedPolicy>(), Ok(SchedPolicy::Priority));
    assert!("rr:x".parse::<SchedPolicy>().is_err());
    assert!("fcfs".parse::<SchedPolicy>().is_err());
    let s = SchedPolicy::RoundRobin { quantum: 3 }.run(bursts(&[10, 4, 6])).unwrap();
    assert_eq!(s.makespan(), 20);
}

#[test]
fn first_fit_lab_fixture() {
    let out = allocate(blocks_from(&LAB_BLOCKS), &requests_from(&LAB_REQUESTS), FitPolicy::First).unwrap();
    assert_eq!(placed_in(&out), vec![Some(1), Some(4), Some(1), None]);
    assert_eq!(out.results[0].block_capacity, Some(500));
    let missed: Vec<u32> = out.unallocated().map(|r| r.request_id).collect();
    assert_eq!(missed, vec![4]);
    // Whatever is left, no block could take request 4.
    assert!(out.blocks.iter().all(|b| b.remaining < 426));
}

#[test]
fn best_fit_lab_fixture() {
    let out = allocate(blocks_from(&LAB_BLOCKS), &requests_from(&LAB_REQUESTS), FitPolicy::Best).unwrap();
    assert_eq!(placed_in(&out), vec![Some(3), Some(1), Some(2), Some(4)]);
    assert_eq!(out.leftover(), 1700 - 1167);
}

#[test]
fn worst_fit_lab_fixture() {
    let out = allocate(blocks_from(&LAB_BLOCKS), &requests_from(&LAB_REQUESTS), FitPolicy::Worst).unwrap();
    assert_eq!(placed_in(&out), vec![Some(4), Some(1), Some(4), None]);
}

// Replays the run step by step and checks each choice against
// the block state the policy saw at the time.
#[test]
fn policies_pick_what_they_promise() {
    let reqs = requests_from(&[120, 40, 300, 90, 90, 10, 700]);
    for policy in FitPolicy::ALL {
        let out = allocate(blocks_from(&LAB_BLOCKS), &reqs, policy).unwrap();
        let mut state = blocks_from(&LAB_BLOCKS);
        let mut total: Units = state.iter().map(|b| b.remaining).sum();
        for (req, res) in reqs.iter().zip(&out.results) {
            let eligible: Vec<&MemoryBlock> = state.iter().filter(|b| b.fits(req.size)).collect();
            match res.block {
                None        => assert!(eligible.is_empty()),
                Some(idx)   => {
                    let chosen = state[idx].remaining;
                    match policy {
                        FitPolicy::First    => assert_eq!(eligible[0].index, idx),
                        FitPolicy::Best     => assert!(eligible.iter().all(|b| b.remaining >= chosen)),
                        FitPolicy::Worst    => assert!(eligible.iter().all(|b| b.remaining <= chosen)),
                    }
                    state[idx].remaining -= req.size;
                    let now: Units = state.iter().map(|b| b.remaining).sum();
                    assert!(now < total);
                    total = now;
                }
            }
        }
        assert_eq!(state, out.blocks);
    }
}

#[test]
fn fit_ties_go_to_lowest_index() {
    let reqs = requests_from(&[50]);
    let best = allocate(blocks_from(&[80, 60, 60]), &reqs, FitPolicy::Best).unwrap();
    assert_eq!(best.results[0].block, Some(1));
    let worst = allocate(blocks_from(&[60, 80, 80]), &reqs, FitPolicy::Worst).unwrap();
    assert_eq!(worst.results[0].block, Some(1));
}

#[test]
fn fit_follows_block_index_not_position() {
    let shuffled = vec![MemoryBlock::new(2, 100), MemoryBlock::new(0, 100), MemoryBlock::new(1, 50)];
    let reqs = requests_from(&[40]);
    let pick = |policy| allocate(shuffled.clone(), &reqs, policy).unwrap().results[0].block;
    assert_eq!(pick(FitPolicy::First), Some(0));
    assert_eq!(pick(FitPolicy::Best), Some(1));
    assert_eq!(pick(FitPolicy::Worst), Some(0));
    let out = allocate(shuffled, &reqs, FitPolicy::Worst).unwrap();
    assert_eq!(out.blocks[1].remaining, 60);
}

#[test]
fn comparison_runs_are_independent() {
    let blocks = blocks_from(&LAB_BLOCKS);
    let reqs = requests_from(&LAB_REQUESTS);
    let all = compare_policies(&blocks, &reqs).unwrap();
    let policies: Vec<FitPolicy> = all.iter().map(|o| o.policy).collect();
    assert_eq!(policies, FitPolicy::ALL.to_vec());
    for out in &all {
        assert_eq!(out, &allocate(blocks.clone(), &reqs, out.policy).unwrap());
    }
    assert_eq!(blocks, blocks_from(&LAB_BLOCKS));
}

#[test]
fn fixed_partitions_lab_fixture() {
    let out = allocate_fixed_partitions(1000, 200, &requests_from(&[150, 250, 100])).unwrap();
    assert_eq!(out.partition_count, 5);
    assert_eq!(out.external_fragmentation, 0);
    assert_eq!(out.placements[0].verdict, Ok((0, 50)));
    assert_eq!(out.placements[1].verdict, Err(Rejection::TooBig));
    assert_eq!(out.placements[2].verdict, Ok((1, 100)));
    assert_eq!(out.internal_fragmentation, 150);
    assert_eq!(out.partitions_used(), 2);
}

#[test]
fn fixed_partitions_run_out() {
    let out = allocate_fixed_partitions(450, 200, &requests_from(&[100, 200, 300, 10])).unwrap();
    assert_eq!(out.partition_count, 2);
    assert_eq!(out.external_fragmentation, 50);
    // Exhaustion is reported before size.
    assert_eq!(out.placements[2].verdict, Err(Rejection::Full));
    assert_eq!(out.placements[3].verdict, Err(Rejection::Full));
    assert_eq!(out.internal_fragmentation, 100);

    let none = allocate_fixed_partitions(100, 200, &requests_from(&[10])).unwrap();
    assert_eq!((none.partition_count, none.external_fragmentation), (0, 100));
    assert_eq!(none.placements[0].verdict, Err(Rejection::Full));
}

#[test]
fn variable_partitions_skip_what_does_not_fit() {
    let out = allocate_variable_partitions(1000, &requests_from(&[400, 700, 300, 400])).unwrap();
    let bases: Vec<Option<Units>> = out.placements.iter().map(|p| p.base).collect();
    assert_eq!(bases, vec![Some(0), None, Some(400), None]);
    assert_eq!(out.remaining, 300);
    assert_eq!(out.allocated(), 700);
}

#[test]
fn indexed_takes_lowest_free_blocks() {
    let disk = Disk::from_occupancy(&[1, 0, 0, 1, 0, 0]);
    assert_eq!(
        allocate_indexed(&disk, 2).unwrap(),
        IndexedOutcome::Allocated(IndexedFile { index_block: 1, data_blocks: vec![2, 4] })
    );
    assert_eq!(
        allocate_indexed(&disk, 4).unwrap(),
        IndexedOutcome::Unallocated { free: 4, needed: 5 }
    );
    // The pure call leaves the disk alone.
    assert_eq!(disk.free_count(), 4);
}

#[test]
fn indexed_files_consume_the_disk() {
    let mut disk = Disk::from_occupancy(&[0, 1, 0, 0, 0, 1, 0]);
    let first = disk.create_indexed("a", 2).unwrap();
    assert_eq!(
        first,
        IndexedOutcome::Allocated(IndexedFile { index_block: 0, data_blocks: vec![2, 3] })
    );
    assert_eq!(disk.occupancy(), vec![1, 1, 1, 1, 0, 1, 0]);
    assert!(matches!(disk.create_indexed("b", 2).unwrap(), IndexedOutcome::Unallocated { free: 2, needed: 3 }));
    assert!(matches!(disk.create_indexed("c", 1).unwrap(), IndexedOutcome::Allocated(_)));
    assert_eq!(disk.free_count(), 0);
    let names: Vec<&String> = disk.files().keys().collect();
    assert_eq!(names, vec!["a", "c"]);
}

#[test]
fn sequential_files() {
    let mut disk = Disk::new(10);
    assert_eq!(
        disk.allocate_contiguous("a", 0, 3).unwrap(),
        ContiguousOutcome::Allocated(Extent { start: 0, length: 3 })
    );
    assert_eq!(disk.allocate_contiguous("b", 2, 2).unwrap(), ContiguousOutcome::Occupied { block: 2 });
    assert_eq!(disk.allocate_contiguous("c", 8, 3).unwrap(), ContiguousOutcome::OutOfBounds);
    assert!(matches!(disk.allocate_contiguous("d", 3, 7).unwrap(), ContiguousOutcome::Allocated(_)));
    assert_eq!(disk.free_count(), 0);
    assert_eq!(disk.allocate_contiguous("e", 0, 0), Err(SimError::ZeroLength));
    assert_eq!(disk.files().len(), 2);
    assert!(!disk.occupy(4));
}

#[test]
fn huge_file_requests_do_not_wrap() {
    let mut disk = Disk::new(10);
    assert_eq!(disk.allocate_contiguous("x", usize::MAX, 2).unwrap(), ContiguousOutcome::OutOfBounds);
    assert_eq!(disk.allocate_contiguous("y", 3, usize::MAX).unwrap(), ContiguousOutcome::OutOfBounds);
    assert_eq!(disk.free_count(), 10);
    assert!(disk.files().is_empty());
    assert_eq!(
        allocate_indexed(&disk, usize::MAX).unwrap(),
        IndexedOutcome::Unallocated { free: 10, needed: usize::MAX }
    );
    assert!(matches!(disk.create_indexed("z", usize::MAX).unwrap(), IndexedOutcome::Unallocated { .. }));
    assert!(disk.files().is_empty());
}

#[test]
fn empty_inputs_yield_empty_results() {
    assert!(run_priority(vec![]).unwrap().is_empty());
    let rr = run_round_robin(vec![], 2).unwrap();
    assert!(rr.is_empty() && rr.timeline.is_empty());
    assert_eq!(rr.avg_waiting(), 0.0);
    assert!(allocate(blocks_from(&LAB_BLOCKS), &[], FitPolicy::Worst).unwrap().results.is_empty());
    assert!(allocate(vec![], &requests_from(&[5]), FitPolicy::First).unwrap().results[0].block.is_none());
    assert!(allocate_fixed_partitions(100, 10, &[]).unwrap().placements.is_empty());
    assert!(allocate_variable_partitions(100, &[]).unwrap().placements.is_empty());
}

#[test]
fn runs_are_deterministic() {
    let input = procs(&[(0, 4, 3), (2, 6, 1), (2, 1, 1), (9, 2, 0)]);
    assert_eq!(run_priority(input.clone()).unwrap(), run_priority(input.clone()).unwrap());
    assert_eq!(run_round_robin(input.clone(), 2).unwrap(), run_round_robin(input, 2).unwrap());
    let blocks = blocks_from(&LAB_BLOCKS);
    let reqs = requests_from(&LAB_REQUESTS);
    for p in FitPolicy::ALL {
        assert_eq!(
            allocate(blocks.clone(), &reqs, p).unwrap(),
            allocate(blocks.clone(), &reqs, p).unwrap()
        );
    }
}
