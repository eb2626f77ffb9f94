//! Cross-validates the fine-grained table against the sequential baseline
//! over the committed workload traces.

use fg_hash::{
    harness,
    trace::{self, Instr, Op},
};

use hashbrown::HashMap;

#[test]
fn sequential_oracle_accepts_committed_traces() {
    for file in harness::TRACE_FILES {
        let instrs = trace::load(file)
            .unwrap_or_else(|err| panic!("failed to load {}: {}", file, err));

        assert!(!instrs.is_empty(), "{} is empty", file);

        let capacity = harness::table_capacity(instrs.len());

        harness::run_sequential(&instrs, capacity)
            .map(|_| ())
            .unwrap_or_else(|err| panic!("oracle rejected {}: {}", file, err));
    }
}

#[test]
fn single_threaded_fine_grained_matches_baseline() {
    for file in harness::TRACE_FILES {
        let instrs = trace::load(file).unwrap();
        let capacity = harness::table_capacity(instrs.len());

        let (baseline, _) = harness::run_sequential(&instrs, capacity).unwrap();
        let (table, _) = harness::run_fine_grained(&instrs, capacity, 1, false);

        // With one worker the replay is a serial execution, so the two
        // tables must hold the same entries, duplicates included.
        let mut expected: HashMap<(i32, i32), usize> = HashMap::new();

        for (&key, &value) in baseline.iter() {
            *expected.entry((key, value)).or_insert(0) += 1;
        }

        let mut actual: HashMap<(i32, i32), usize> = HashMap::new();

        table.for_each(|&key, &value| {
            *actual.entry((key, value)).or_insert(0) += 1;
        });

        assert_eq!(expected, actual, "contents diverged on {}", file);
        assert_eq!(baseline.len(), table.len());
    }
}

#[test]
fn concurrent_insert_only_replay_preserves_every_entry() {
    const NUM_INSTRS: i32 = 40_000;
    const NUM_THREADS: usize = 8;

    // NUM_INSTRS divides evenly by NUM_THREADS, so the truncating split
    // covers the whole stream.
    let instrs: Vec<Instr> = (0..NUM_INSTRS)
        .map(|i| Instr {
            op: Op::Insert,
            key: i % 512,
            value: i,
        })
        .collect();

    let capacity = harness::table_capacity(instrs.len());
    let (table, _) = harness::run_fine_grained(&instrs, capacity, NUM_THREADS, false);

    assert_eq!(table.len(), NUM_INSTRS as usize);

    let mut resident = 0;

    table.for_each(|_, _| resident += 1);

    assert_eq!(resident, NUM_INSTRS as usize);
}

#[test]
fn concurrent_replay_levels_the_table_it_built() {
    const KEYS: i32 = 512;
    const NUM_THREADS: usize = 8;

    // Insert-everything then delete-everything, partitioned so each worker
    // removes exactly what it inserted.
    let instrs: Vec<Instr> = (0..NUM_THREADS as i32)
        .flat_map(|worker| {
            let base = worker * KEYS;

            (0..KEYS)
                .map(move |k| Instr {
                    op: Op::Insert,
                    key: base + k,
                    value: base + k,
                })
                .chain((0..KEYS).map(move |k| Instr {
                    op: Op::Delete,
                    key: base + k,
                    value: base + k,
                }))
        })
        .collect();

    let capacity = harness::table_capacity(instrs.len());
    let (table, _) = harness::run_fine_grained(&instrs, capacity, NUM_THREADS, false);

    assert!(table.is_empty());
}
