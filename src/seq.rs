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

//! Single-threaded separately chained hash map, the baseline the locked
//! variant is measured against.

use crate::map::bucket::{self, Link, Node};
pub use crate::map::DefaultHashBuilder;

use std::{
    borrow::Borrow,
    hash::{BuildHasher, Hash},
    slice,
};

/// Sequential counterpart of [`map::HashMap`](crate::map::HashMap): the same
/// fixed bucket array of chains, without the per-bucket locks.
///
/// Entries prepend to their chain, duplicates are preserved, and lookups and
/// removals act on the most recently inserted match. Since there is no
/// concurrent access, lookups can hand out plain references.
pub struct HashMap<K, V, S = DefaultHashBuilder> {
    buckets: Box<[Link<K, V>]>,
    build_hasher: S,
    len: usize,
}

impl<K, V> HashMap<K, V, DefaultHashBuilder> {
    /// Creates a map with a single bucket.
    pub fn new() -> Self {
        Self::with_capacity_and_hasher(1, DefaultHashBuilder::default())
    }

    /// Creates a map with `capacity` buckets. A capacity of 0 is bumped to 1.
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
    /// keys. A capacity of 0 is bumped to 1.
    pub fn with_capacity_and_hasher(capacity: usize, build_hasher: S) -> Self {
        let num_buckets = capacity.max(1);

        let mut buckets = Vec::with_capacity(num_buckets);

        for _ in 0..num_buckets {
            buckets.push(None);
        }

        Self {
            buckets: buckets.into_boxed_slice(),
            build_hasher,
            len: 0,
        }
    }
}

impl<K, V, S> HashMap<K, V, S> {
    /// Returns the number of resident entries, counting shadowed duplicates.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if this map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of buckets, fixed at construction.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Iterates over all resident entries, including shadowed duplicates, in
    /// bucket order and newest-first within a bucket.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            cursor: None,
        }
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> HashMap<K, V, S> {
    /// Inserts a key-value pair by prepending it to its bucket's chain.
    ///
    /// No duplicate check is performed; an older entry with the same key is
    /// shadowed until the new entry is removed.
    pub fn insert(&mut self, key: K, value: V) {
        let index = self.bucket_index(&key);

        bucket::push_front(&mut self.buckets[index], key, value);
        self.len += 1;
    }

    /// Returns a reference to the value of the most recently inserted entry
    /// with key `key`.
    pub fn get<Q: Hash + Eq + ?Sized>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
    {
        let index = self.bucket_index(key);

        bucket::find(&self.buckets[index], key).map(|node| &node.value)
    }

    /// Returns references to the key and value of the most recently inserted
    /// entry with key `key`.
    pub fn get_key_value<Q: Hash + Eq + ?Sized>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
    {
        let index = self.bucket_index(key);

        bucket::find(&self.buckets[index], key).map(|node| (&node.key, &node.value))
    }

    /// If at least one entry has key `key`, unlinks the most recently
    /// inserted one and returns its value.
    pub fn remove<Q: Hash + Eq + ?Sized>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// If at least one entry has key `key`, unlinks the most recently
    /// inserted one and returns it.
    pub fn remove_entry<Q: Hash + Eq + ?Sized>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
    {
        let index = self.bucket_index(key);

        let detached = bucket::remove_first(&mut self.buckets[index], key)?;
        self.len -= 1;

        let Node { key, value, .. } = *detached;

        Some((key, value))
    }

    fn bucket_index<Q: Hash + ?Sized>(&self, key: &Q) -> usize {
        let hash = bucket::hash(&self.build_hasher, key);

        (hash % self.buckets.len() as u64) as usize
    }
}

impl<K, V, S> Drop for HashMap<K, V, S> {
    fn drop(&mut self) {
        for slot in self.buckets.iter_mut() {
            bucket::drop_chain(slot);
        }
    }
}

/// Iterator over the entries of a sequential [`HashMap`].
pub struct Iter<'a, K, V> {
    buckets: slice::Iter<'a, Link<K, V>>,
    cursor: Option<&'a Node<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.cursor {
                self.cursor = node.next.as_deref();

                return Some((&node.key, &node.value));
            }

            self.cursor = self.buckets.next()?.as_deref();
        }
    }
}
