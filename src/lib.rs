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

//! Separately chained hash tables with per-bucket locking, plus the
//! trace-replay harness that benchmarks them.
//!
//! [`map::HashMap`] guards every bucket of a fixed-size table with its own
//! mutex, so threads touching different buckets never contend and a thread
//! never holds more than one lock. [`seq::HashMap`] is the identical table
//! without the locks, used as the single-threaded baseline and correctness
//! oracle. [`harness`] replays recorded instruction traces ([`trace`])
//! against both and reports the speedup at a sweep of worker counts.

pub mod harness;
pub mod map;
pub mod seq;
pub mod trace;

pub use map::HashMap;
