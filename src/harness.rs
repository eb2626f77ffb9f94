// MIT License
//
// Copyright (c) 2020 Gregory Meyer
//
// Permission is hereby granted, free of charge, to any person
// obtaining a copy of this software and associated documentation files
// (the "Software"), to deal in the Software without restriction,
// including without limitation the rights to use, copy, modify, merge,
// publish, distribute, sublicense, and/or sell copies of the Software,
// and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS
// BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN
// ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Trace-replay benchmark: times a sequential baseline against the
//! fine-grained locked map over the same instruction stream and reports the
//! speedup at each worker count.
//!
//! The sequential run doubles as the correctness oracle: replayed in input
//! order, every lookup or delete that finds an entry must see the value the
//! trace recorded, and a disagreement fails the run. Concurrent workers
//! replay disjoint slices of the same stream with no ordering between them,
//! so a worker can legitimately observe an entry another worker has already
//! mutated; disagreements there are logged and execution continues.

use std::{
    ops::Range,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use crossbeam_utils::thread;
use thiserror::Error;

use crate::{
    map, seq,
    trace::{self, DigitBuildHasher, Instr, Op, TraceError},
};

/// The trace files replayed by default, in replay order.
pub const TRACE_FILES: [&str; 5] = [
    "tests/uniform_all_test.txt",
    "tests/chunked_test_InsDel.txt",
    "tests/50p_del_test_InsDel.txt",
    "tests/25p_del_test_InsDel.txt",
    "tests/10p_del_all.txt",
];

/// Worker counts swept by default.
pub const THREAD_COUNTS: [usize; 5] = [1, 2, 4, 8, 16];

/// Target chain length: tables get one bucket per this many instructions.
pub const INSTRS_PER_BUCKET: usize = 1000;

/// Knobs for a benchmark run. [`Options::default`] reproduces the recorded
/// benchmark configuration exactly.
#[derive(Clone, Debug)]
pub struct Options {
    /// Worker counts for the fine-grained runs.
    pub threads: Vec<usize>,
    /// Hand the division remainder of the instruction split to the first
    /// workers instead of dropping it (see [`partition`]).
    pub full_coverage: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            threads: THREAD_COUNTS.to_vec(),
            full_coverage: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("{path}: {source}")]
    Trace {
        path: PathBuf,
        #[source]
        source: TraceError,
    },
    #[error(
        "sequential oracle: instruction {index} ({op:?} key {key}) \
         expected value {expected}, found {found}"
    )]
    ValueMismatch {
        index: usize,
        op: Op,
        key: i32,
        expected: i32,
        found: i32,
    },
}

/// Buckets allocated for a trace of `num_instrs` instructions, at least 1.
pub fn table_capacity(num_instrs: usize) -> usize {
    (num_instrs / INSTRS_PER_BUCKET).max(1)
}

/// Splits `0..len` into `num_workers` contiguous ranges of `len / num_workers`
/// instructions each.
///
/// Without `full_coverage`, the `len % num_workers` trailing instructions
/// belong to no range and are never executed. That loses work, but it is how
/// the recorded benchmark numbers were produced, so it is the default; with
/// `full_coverage`, the remainder is spread over the first ranges instead.
pub fn partition(len: usize, num_workers: usize, full_coverage: bool) -> Vec<Range<usize>> {
    assert!(num_workers > 0);

    let per_worker = len / num_workers;
    let remainder = if full_coverage { len % num_workers } else { 0 };

    let mut ranges = Vec::with_capacity(num_workers);
    let mut start = 0;

    for worker in 0..num_workers {
        let end = start + per_worker + usize::from(worker < remainder);

        ranges.push(start..end);
        start = end;
    }

    ranges
}

/// Replays `instrs` in order against a fresh sequential map, checking every
/// hit against the trace's recorded value.
///
/// Returns the populated map and the elapsed wall time. A miss is not an
/// error; a hit with the wrong value is.
pub fn run_sequential(
    instrs: &[Instr],
    capacity: usize,
) -> Result<(seq::HashMap<i32, i32, DigitBuildHasher>, Duration), HarnessError> {
    let mut table = seq::HashMap::with_capacity_and_hasher(capacity, DigitBuildHasher);

    let start = Instant::now();

    for (index, instr) in instrs.iter().enumerate() {
        let found = match instr.op {
            Op::Insert => {
                table.insert(instr.key, instr.value);
                continue;
            }
            Op::Delete => table.remove(&instr.key),
            Op::Lookup => table.get(&instr.key).copied(),
        };

        if let Some(found) = found {
            if found != instr.value {
                return Err(HarnessError::ValueMismatch {
                    index,
                    op: instr.op,
                    key: instr.key,
                    expected: instr.value,
                    found,
                });
            }
        }
    }

    Ok((table, start.elapsed()))
}

/// Replays `instrs` against a fresh fine-grained map with `num_threads`
/// workers, each executing one [`partition`] range in input order.
///
/// Returns the populated map and the wall time from first spawn to last
/// join. Value disagreements are logged as warnings, not returned: with
/// workers racing on the same keys there is no single correct answer to
/// compare against.
pub fn run_fine_grained(
    instrs: &[Instr],
    capacity: usize,
    num_threads: usize,
    full_coverage: bool,
) -> (map::HashMap<i32, i32, DigitBuildHasher>, Duration) {
    let table = map::HashMap::with_capacity_and_hasher(capacity, DigitBuildHasher);
    let ranges = partition(instrs.len(), num_threads, full_coverage);

    let start = Instant::now();

    thread::scope(|scope| {
        for range in ranges {
            let table = &table;

            scope.spawn(move |_| {
                for instr in &instrs[range] {
                    replay_one(table, instr);
                }
            });
        }
    })
    .expect("worker thread panicked");

    let elapsed = start.elapsed();

    (table, elapsed)
}

fn replay_one(table: &map::HashMap<i32, i32, DigitBuildHasher>, instr: &Instr) {
    match instr.op {
        Op::Insert => table.insert(instr.key, instr.value),
        Op::Delete => {
            if let Some(found) = table.remove(&instr.key) {
                if found != instr.value {
                    log::warn!(
                        "delete of key {} removed value {}, trace recorded {}",
                        instr.key,
                        found,
                        instr.value
                    );
                }
            }
        }
        Op::Lookup => {
            if let Some(found) = table.get(&instr.key) {
                if found != instr.value {
                    log::warn!(
                        "lookup of key {} found value {}, trace recorded {}",
                        instr.key,
                        found,
                        instr.value
                    );
                }
            }
        }
    }
}

/// Runs the whole benchmark: for each trace file, the sequential baseline
/// followed by a fine-grained run per configured worker count, reporting
/// elapsed times and speedups on standard output.
pub fn run<P: AsRef<Path>>(files: &[P], options: &Options) -> Result<(), HarnessError> {
    for file in files {
        let path = file.as_ref();

        let instrs = trace::load(path).map_err(|source| HarnessError::Trace {
            path: path.to_owned(),
            source,
        })?;

        println!();
        println!("Performance Testing file: {}", path.display());

        let capacity = table_capacity(instrs.len());

        let (_, base) = run_sequential(&instrs, capacity)?;
        println!("Sequential Test complete in {:.6} ms!", millis(base));

        for &num_threads in &options.threads {
            let (_, elapsed) =
                run_fine_grained(&instrs, capacity, num_threads, options.full_coverage);

            println!(
                "{} Thread Fine-Grain Test complete in {:.6} ms!",
                num_threads,
                millis(elapsed)
            );
            println!(
                "{} Thread Speedup: {:.6}",
                num_threads,
                base.as_secs_f64() / elapsed.as_secs_f64()
            );
        }
    }

    Ok(())
}

fn millis(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_scales_with_trace_length() {
        assert_eq!(table_capacity(0), 1);
        assert_eq!(table_capacity(999), 1);
        assert_eq!(table_capacity(1000), 1);
        assert_eq!(table_capacity(2000), 2);
        assert_eq!(table_capacity(2999), 2);
    }

    #[test]
    fn partition_truncates_remainder() {
        let ranges = partition(10, 3, false);

        assert_eq!(ranges, [0..3, 3..6, 6..9]);
    }

    #[test]
    fn partition_full_coverage_spreads_remainder() {
        let ranges = partition(10, 3, true);

        assert_eq!(ranges, [0..4, 4..7, 7..10]);
    }

    #[test]
    fn partition_exact_split_has_no_remainder() {
        assert_eq!(partition(8, 4, false), partition(8, 4, true));
    }

    #[test]
    fn single_worker_without_full_coverage_runs_everything() {
        assert_eq!(partition(7, 1, false), [0..7]);
    }

    fn instr(op: Op, key: i32, value: i32) -> Instr {
        Instr { op, key, value }
    }

    #[test]
    fn oracle_accepts_consistent_replay() {
        let instrs = [
            instr(Op::Insert, 1, 10),
            instr(Op::Lookup, 1, 10),
            instr(Op::Insert, 1, 11),
            instr(Op::Lookup, 1, 11),
            instr(Op::Delete, 1, 11),
            instr(Op::Lookup, 1, 10),
            instr(Op::Delete, 2, 99),
        ];

        let (table, _) = run_sequential(&instrs, 4).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&1), Some(&10));
    }

    #[test]
    fn oracle_rejects_wrong_value() {
        let instrs = [instr(Op::Insert, 1, 10), instr(Op::Lookup, 1, 99)];

        let err = run_sequential(&instrs, 4).map(|_| ()).unwrap_err();

        match err {
            HarnessError::ValueMismatch {
                index: 1,
                key: 1,
                expected: 99,
                found: 10,
                ..
            } => {}
            other => panic!("expected a mismatch, got {:?}", other),
        }
    }

    #[test]
    fn fine_grained_single_worker_matches_oracle() {
        let instrs = [
            instr(Op::Insert, 1, 10),
            instr(Op::Insert, 5, 50),
            instr(Op::Delete, 1, 10),
            instr(Op::Insert, 5, 51),
            instr(Op::Lookup, 5, 51),
        ];

        let (table, _) = run_fine_grained(&instrs, 4, 1, false);

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&1), None);
        assert_eq!(table.get(&5), Some(51));
    }

    #[test]
    fn truncated_instructions_are_not_executed() {
        // 3 workers over 10 inserts: the last one is dropped on the floor.
        let instrs: Vec<Instr> = (0..10).map(|i| instr(Op::Insert, i, i)).collect();

        let (table, _) = run_fine_grained(&instrs, 4, 3, false);

        assert_eq!(table.len(), 9);
        assert_eq!(table.get(&9), None);

        let (table, _) = run_fine_grained(&instrs, 4, 3, true);

        assert_eq!(table.len(), 10);
        assert_eq!(table.get(&9), Some(9));
    }
}
