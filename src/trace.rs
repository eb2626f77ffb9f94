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

//! Instruction traces: the text format they are read from and the fixed hash
//! function their keys are distributed with.
//!
//! A trace is a plain-text file with one instruction per line, formatted as
//! `<OP> <KEY> <VALUE>` with single-space separators, where `<OP>` is `L`
//! (lookup), `I` (insert), or `D` (delete) and the other two fields are
//! decimal integers. Blank lines are ignored; anything else fails the parse
//! with a line-numbered error.

use std::{
    fs::File,
    hash::{BuildHasher, Hasher},
    io::{self, BufRead, BufReader},
    num::ParseIntError,
    path::Path,
    str::FromStr,
};

use thiserror::Error;

/// What an instruction does to the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Insert,
    Delete,
    Lookup,
}

/// One replayable instruction: an operation, the key it targets, and the
/// value inserted or expected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instr {
    pub op: Op,
    pub key: i32,
    pub value: i32,
}

/// Failure to interpret a single trace line.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unrecognized op {0:?} (expected one of \"L\", \"I\", \"D\")")]
    UnknownOp(String),
    #[error("expected `<OP> <KEY> <VALUE>` separated by single spaces")]
    Malformed,
    #[error("bad integer {text:?}")]
    BadInt {
        text: String,
        #[source]
        source: ParseIntError,
    },
}

/// Failure to read a trace.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: ParseError,
    },
}

impl FromStr for Instr {
    type Err = ParseError;

    fn from_str(text: &str) -> Result<Self, ParseError> {
        let mut fields = text.split(' ');

        let op = fields.next().ok_or(ParseError::Malformed)?;
        let key = fields.next().ok_or(ParseError::Malformed)?;
        let value = fields.next().ok_or(ParseError::Malformed)?;

        if fields.next().is_some() {
            return Err(ParseError::Malformed);
        }

        let op = match op {
            "L" => Op::Lookup,
            "I" => Op::Insert,
            "D" => Op::Delete,
            _ => return Err(ParseError::UnknownOp(op.to_owned())),
        };

        Ok(Instr {
            op,
            key: parse_int(key)?,
            value: parse_int(value)?,
        })
    }
}

fn parse_int(text: &str) -> Result<i32, ParseError> {
    text.parse().map_err(|source| ParseError::BadInt {
        text: text.to_owned(),
        source,
    })
}

/// Reads a whole trace, preserving instruction order.
pub fn parse<R: BufRead>(reader: R) -> Result<Vec<Instr>, TraceError> {
    let mut instrs = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let text = line.strip_suffix('\r').unwrap_or(&line);

        if text.is_empty() {
            continue;
        }

        let instr = text.parse().map_err(|source| TraceError::Parse {
            line: index + 1,
            source,
        })?;

        instrs.push(instr);
    }

    Ok(instrs)
}

/// Reads the trace file at `path`.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<Instr>, TraceError> {
    let file = File::open(path)?;

    parse(BufReader::new(file))
}

/// Builds [`DigitHasher`]s, the hash the trace workloads were tuned for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DigitBuildHasher;

impl BuildHasher for DigitBuildHasher {
    type Hasher = DigitHasher;

    fn build_hasher(&self) -> DigitHasher {
        DigitHasher { state: SEED }
    }
}

const SEED: i32 = 7;

/// Hashes integers by folding their decimal digits, least significant first,
/// into a wrapping 32-bit accumulator: `h = h * 31 + digit`, seeded with 7.
/// The finished hash is the accumulator's absolute value.
///
/// This function distributes digits rather than bits and is a poor general
/// hash; it exists because the recorded workloads' bucket placement depends
/// on reproducing it exactly. `hash(0) = 7`, `hash(7) = 224`,
/// `hash(12) = 6790`.
#[derive(Clone, Copy, Debug)]
pub struct DigitHasher {
    state: i32,
}

impl DigitHasher {
    fn fold_signed(&mut self, mut tag: i64) {
        while tag != 0 {
            self.state = self.state.wrapping_mul(31).wrapping_add((tag % 10) as i32);
            tag /= 10;
        }
    }

    fn fold_unsigned(&mut self, mut tag: u64) {
        while tag != 0 {
            self.state = self.state.wrapping_mul(31).wrapping_add((tag % 10) as i32);
            tag /= 10;
        }
    }
}

impl Hasher for DigitHasher {
    fn finish(&self) -> u64 {
        u64::from(self.state.unsigned_abs())
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.fold_unsigned(u64::from(byte));
        }
    }

    fn write_u8(&mut self, tag: u8) {
        self.fold_unsigned(u64::from(tag));
    }

    fn write_u16(&mut self, tag: u16) {
        self.fold_unsigned(u64::from(tag));
    }

    fn write_u32(&mut self, tag: u32) {
        self.fold_unsigned(u64::from(tag));
    }

    fn write_u64(&mut self, tag: u64) {
        self.fold_unsigned(tag);
    }

    fn write_usize(&mut self, tag: usize) {
        self.fold_unsigned(tag as u64);
    }

    fn write_i8(&mut self, tag: i8) {
        self.fold_signed(i64::from(tag));
    }

    fn write_i16(&mut self, tag: i16) {
        self.fold_signed(i64::from(tag));
    }

    fn write_i32(&mut self, tag: i32) {
        self.fold_signed(i64::from(tag));
    }

    fn write_i64(&mut self, tag: i64) {
        self.fold_signed(tag);
    }

    fn write_isize(&mut self, tag: isize) {
        self.fold_signed(tag as i64);
    }
}
