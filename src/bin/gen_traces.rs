use std::{
    fs,
    io::{BufWriter, Write},
    path::PathBuf,
};

use clap::Parser;
use hashbrown::HashMap;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Regenerates the benchmark's workload trace files.
///
/// Every generated lookup and delete carries the value a strictly in-order
/// replay would observe at that point, so the sequential oracle accepts the
/// traces by construction.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Instructions per trace file.
    #[clap(short, long, default_value_t = 100_000)]
    count: usize,

    /// Directory the trace files are written into.
    #[clap(short, long, default_value = "tests")]
    out_dir: PathBuf,

    /// RNG seed, for reproducible traces.
    #[clap(short, long, default_value_t = 416)]
    seed: u64,
}

struct Profile {
    file: &'static str,
    inserts: u32,
    deletes: u32,
    lookups: u32,
    /// Length of same-op runs; 1 interleaves ops freely.
    chunk: usize,
}

const PROFILES: [Profile; 5] = [
    Profile {
        file: "uniform_all_test.txt",
        inserts: 40,
        deletes: 20,
        lookups: 40,
        chunk: 1,
    },
    Profile {
        file: "chunked_test_InsDel.txt",
        inserts: 50,
        deletes: 50,
        lookups: 0,
        chunk: 1000,
    },
    Profile {
        file: "50p_del_test_InsDel.txt",
        inserts: 50,
        deletes: 50,
        lookups: 0,
        chunk: 1,
    },
    Profile {
        file: "25p_del_test_InsDel.txt",
        inserts: 75,
        deletes: 25,
        lookups: 0,
        chunk: 1,
    },
    Profile {
        file: "10p_del_all.txt",
        inserts: 45,
        deletes: 10,
        lookups: 45,
        chunk: 1,
    },
];

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Insert,
    Delete,
    Lookup,
}

/// In-order replay state: per-key value stacks mirroring the tables' per-key
/// LIFO behavior, plus a flat list of live keys for O(1) random picks.
struct Model {
    stacks: HashMap<i32, Vec<i32>>,
    live: Vec<i32>,
    key_space: i32,
}

impl Model {
    fn new(key_space: i32) -> Self {
        Self {
            stacks: HashMap::new(),
            live: Vec::new(),
            key_space,
        }
    }

    fn insert(&mut self, rng: &mut StdRng) -> (i32, i32) {
        let key = rng.gen_range(0..self.key_space);
        let value = rng.gen_range(0..1_000_000);

        let stack = self.stacks.entry(key).or_default();

        if stack.is_empty() {
            self.live.push(key);
        }

        stack.push(value);

        (key, value)
    }

    fn delete(&mut self, rng: &mut StdRng) -> Option<(i32, i32)> {
        if self.live.is_empty() {
            return None;
        }

        let slot = rng.gen_range(0..self.live.len());
        let key = self.live[slot];

        let stack = self.stacks.get_mut(&key)?;
        let value = stack.pop()?;

        if stack.is_empty() {
            self.live.swap_remove(slot);
        }

        Some((key, value))
    }

    fn lookup(&mut self, rng: &mut StdRng) -> Option<(i32, i32)> {
        if self.live.is_empty() {
            return None;
        }

        let key = self.live[rng.gen_range(0..self.live.len())];
        let value = *self.stacks.get(&key)?.last()?;

        Some((key, value))
    }
}

fn pick_kind(profile: &Profile, rng: &mut StdRng) -> Kind {
    let total = profile.inserts + profile.deletes + profile.lookups;
    let roll = rng.gen_range(0..total);

    if roll < profile.inserts {
        Kind::Insert
    } else if roll < profile.inserts + profile.deletes {
        Kind::Delete
    } else {
        Kind::Lookup
    }
}

fn generate<W: Write>(
    profile: &Profile,
    count: usize,
    rng: &mut StdRng,
    out: &mut W,
) -> std::io::Result<()> {
    let key_space = (count / 2).max(16) as i32;
    let mut model = Model::new(key_space);

    let mut kind = Kind::Insert;
    let mut left_in_chunk = 0;

    for _ in 0..count {
        if left_in_chunk == 0 {
            kind = pick_kind(profile, rng);
            left_in_chunk = profile.chunk;
        }
        left_in_chunk -= 1;

        // Deletes and lookups need a resident key; fall back to an insert
        // when the model is empty.
        let (op, key, value) = match kind {
            Kind::Delete => match model.delete(rng) {
                Some((key, value)) => ('D', key, value),
                None => {
                    let (key, value) = model.insert(rng);
                    ('I', key, value)
                }
            },
            Kind::Lookup => match model.lookup(rng) {
                Some((key, value)) => ('L', key, value),
                None => {
                    let (key, value) = model.insert(rng);
                    ('I', key, value)
                }
            },
            Kind::Insert => {
                let (key, value) = model.insert(rng);
                ('I', key, value)
            }
        };

        writeln!(out, "{} {} {}", op, key, value)?;
    }

    Ok(())
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let args = Args::parse();

    fs::create_dir_all(&args.out_dir)?;

    let mut rng = StdRng::seed_from_u64(args.seed);

    for profile in &PROFILES {
        let path = args.out_dir.join(profile.file);
        let mut out = BufWriter::new(fs::File::create(&path)?);

        generate(profile, args.count, &mut rng, &mut out)?;
        out.flush()?;

        println!("wrote {} instructions to {}", args.count, path.display());
    }

    Ok(())
}
