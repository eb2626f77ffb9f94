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

//! Fine-grained locked concurrent hash map.

pub(crate) mod bucket;


use bucket::{Link, Node};

use std::{
    borrow::Borrow,
    hash::{BuildHasher, Hash},
    sync::atomic::{AtomicUsize, Ordering},
};

use parking_lot::Mutex;

/// Default hashing algorithm used by [`HashMap`].
pub type DefaultHashBuilder = fxhash::FxBuildHasher;

/// Concurrent hash map implemented as a fixed array of separately chained
/// buckets, each guarded by its own mutex.
///
/// The bucket array is sized once at construction and never grows; collisions
/// and duplicate keys simply extend a bucket's chain. Threads operating on
/// buckets with distinct indices proceed fully in parallel, while operations
/// on the same bucket serialize on that bucket's lock. No operation acquires
/// more than one lock, so the map cannot deadlock against itself.
///
/// Inserting never replaces: a new entry is prepended to its chain, shadowing
/// any older entry with the same key until it is removed. [`get`] and
/// [`remove`] act on the first match in chain order, which is always the most
/// recently inserted entry for that key.
///
/// Operations that return values require `V: Clone`: the value is cloned
/// while the bucket lock is held, so no reference into a chain ever outlives
/// the critical section that produced it. Callers that want to avoid the
/// clone can use [`get_and`] and read through a closure instead.
///
/// [`get`]: #method.get
/// [`remove`]: #method.remove
/// [`get_and`]: #method.get_and
pub struct HashMap<K, V, S = DefaultHashBuilder> {
    buckets: Box<[Mutex<Link<K, V>>]>,
    build_hasher: S,
    len: AtomicUsize,
}

impl<K, V> HashMap<K, V, DefaultHashBuilder> {
    /// Creates a map with a single bucket.
    ///
    /// Every key collides in a one-bucket map, so all operations serialize on
    /// the one lock; this is only useful when contention is not a concern.
    pub fn new() -> Self {
        Self::with_capacity_and_hasher(1, DefaultHashBuilder::default())
    }

    /// Creates a map with `capacity` buckets.
    ///
    /// A capacity of 0 is bumped to 1; a map cannot have no buckets.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }
}

impl<K, V> Default for HashMap<K, V, DefaultHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S: BuildHasher> HashMap<K, V, S> {
    /// Creates a single-bucket map that uses `build_hasher` to hash keys.
    pub fn with_hasher(build_hasher: S) -> Self {
        Self::with_capacity_and_hasher(1, build_hasher)
    }

    /// Creates a map with `capacity` buckets that uses `build_hasher` to hash
    /// keys.
    ///
    /// A capacity of 0 is bumped to 1.
    pub fn with_capacity_and_hasher(capacity: usize, build_hasher: S) -> Self {
        let num_buckets = capacity.max(1);

        let mut buckets = Vec::with_capacity(num_buckets);

        for _ in 0..num_buckets {
            buckets.push(Mutex::new(None));
        }

        Self {
            buckets: buckets.into_boxed_slice(),
            build_hasher,
            len: AtomicUsize::new(0),
        }
    }
}

impl<K, V, S> HashMap<K, V, S> {
    /// Returns the number of entries confirmed to be resident in this map.
    ///
    /// Duplicate keys are counted once per entry. Because the map can be
    /// updated concurrently, this reflects operations that have returned to
    /// their callers; in-progress inserts and removes are not counted.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// Returns true if this map holds no confirmed entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of buckets, fixed at construction.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> HashMap<K, V, S> {
    /// Inserts a key-value pair.
    ///
    /// The new entry is prepended to its bucket's chain unconditionally; no
    /// duplicate check is performed. An older entry with the same key stays
    /// resident but is shadowed until the new entry is removed.
    pub fn insert(&self, key: K, value: V) {
        let mut chain = self.lock_bucket(&key);

        bucket::push_front(&mut chain, key, value);
        self.len.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a copy of the value of the most recently inserted entry with
    /// key `key`, or [`None`] if no entry has that key.
    ///
    /// `Q` can be any borrowed form of `K`, but [`Hash`] and [`Eq`] on `Q`
    /// *must* match that of `K`. The value is cloned under the bucket lock.
    ///
    /// [`None`]: https://doc.rust-lang.org/std/option/enum.Option.html#variant.None
    /// [`Hash`]: https://doc.rust-lang.org/std/hash/trait.Hash.html
    /// [`Eq`]: https://doc.rust-lang.org/std/cmp/trait.Eq.html
    pub fn get<Q: Hash + Eq + ?Sized>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        V: Clone,
    {
        self.get_key_value_and(key, |_, v| v.clone())
    }

    /// Returns a copy of the key and value of the most recently inserted
    /// entry with key `key`, or [`None`] if no entry has that key.
    ///
    /// [`None`]: https://doc.rust-lang.org/std/option/enum.Option.html#variant.None
    pub fn get_key_value<Q: Hash + Eq + ?Sized>(&self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q> + Clone,
        V: Clone,
    {
        self.get_key_value_and(key, |k, v| (k.clone(), v.clone()))
    }

    /// Invokes `with_value` with a reference to the value of the most
    /// recently inserted entry with key `key`.
    ///
    /// The closure runs while the bucket lock is held; keep it short.
    pub fn get_and<Q: Hash + Eq + ?Sized, F: FnOnce(&V) -> T, T>(
        &self,
        key: &Q,
        with_value: F,
    ) -> Option<T>
    where
        K: Borrow<Q>,
    {
        self.get_key_value_and(key, move |_, v| with_value(v))
    }

    /// Invokes `with_entry` with references to the key and value of the most
    /// recently inserted entry with key `key`.
    ///
    /// The closure runs while the bucket lock is held; keep it short.
    pub fn get_key_value_and<Q: Hash + Eq + ?Sized, F: FnOnce(&K, &V) -> T, T>(
        &self,
        key: &Q,
        with_entry: F,
    ) -> Option<T>
    where
        K: Borrow<Q>,
    {
        let chain = self.lock_bucket(key);

        bucket::find(&chain, key).map(|node| with_entry(&node.key, &node.value))
    }

    /// If at least one entry has key `key`, unlinks the most recently
    /// inserted one and returns its value.
    ///
    /// Ownership of the removed entry moves to the caller; no clone is made.
    /// Older entries with the same key become visible again.
    pub fn remove<Q: Hash + Eq + ?Sized>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// If at least one entry has key `key`, unlinks the most recently
    /// inserted one and returns it.
    pub fn remove_entry<Q: Hash + Eq + ?Sized>(&self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
    {
        let detached = {
            let mut chain = self.lock_bucket(key);

            bucket::remove_first(&mut chain, key)?
        };
        self.len.fetch_sub(1, Ordering::Relaxed);

        let Node { key, value, .. } = *detached;

        Some((key, value))
    }

    /// Invokes `with_entry` once per resident entry, including shadowed
    /// duplicates.
    ///
    /// Buckets are visited in index order with one bucket locked at a time,
    /// so concurrent mutation of not-yet-visited buckets can be observed and
    /// the traversal is not a snapshot. Within a bucket, entries are visited
    /// newest first.
    pub fn for_each<F: FnMut(&K, &V)>(&self, mut with_entry: F) {
        for bucket in self.buckets.iter() {
            let chain = bucket.lock();
            let mut cursor = &*chain;

            while let Some(node) = cursor {
                with_entry(&node.key, &node.value);
                cursor = &node.next;
            }
        }
    }

    fn lock_bucket<Q: Hash + ?Sized>(&self, key: &Q) -> parking_lot::MutexGuard<'_, Link<K, V>> {
        let hash = bucket::hash(&self.build_hasher, key);
        let index = (hash % self.buckets.len() as u64) as usize;

        self.buckets[index].lock()
    }
}

impl<K, V, S> Drop for HashMap<K, V, S> {
    fn drop(&mut self) {
        for slot in self.buckets.iter_mut() {
            bucket::drop_chain(slot.get_mut());
        }
    }
}
