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

use std::{
    borrow::Borrow,
    hash::{BuildHasher, Hash, Hasher},
};

pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) next: Link<K, V>,
}

pub(crate) type Link<K, V> = Option<Box<Node<K, V>>>;

pub(crate) fn push_front<K, V>(head: &mut Link<K, V>, key: K, value: V) {
    *head = Some(Box::new(Node {
        key,
        value,
        next: head.take(),
    }));
}

pub(crate) fn find<'a, K, V, Q>(head: &'a Link<K, V>, key: &Q) -> Option<&'a Node<K, V>>
where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
{
    let mut cursor = head;

    while let Some(node) = cursor {
        if node.key.borrow() == key {
            return Some(node);
        }

        cursor = &node.next;
    }

    None
}

pub(crate) fn remove_first<K, V, Q>(head: &mut Link<K, V>, key: &Q) -> Option<Box<Node<K, V>>>
where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
{
    let mut cursor = head;

    while cursor.as_ref()?.key.borrow() != key {
        cursor = &mut cursor.as_mut()?.next;
    }

    let mut detached = cursor.take()?;
    *cursor = detached.next.take();

    Some(detached)
}

// The derived drop recurses once per node; chains at high load factors are
// deep enough to exhaust the stack.
pub(crate) fn drop_chain<K, V>(head: &mut Link<K, V>) {
    let mut cursor = head.take();

    while let Some(mut node) = cursor {
        cursor = node.next.take();
    }
}

pub(crate) fn hash<S: BuildHasher, K: Hash + ?Sized>(build_hasher: &S, key: &K) -> u64 {
    let mut hasher = build_hasher.build_hasher();
    key.hash(&mut hasher);

    hasher.finish()
}
