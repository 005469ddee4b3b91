// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, LayerId};
use super::store::LayerStore;

/// An iterator over the direct children of a layer, back-most first.
///
/// Created by [`LayerStore::children`]. Iterate in reverse
/// ([`DoubleEndedIterator`]) to visit children front-most first.
#[derive(Debug)]
pub struct Children<'a> {
    store: &'a LayerStore,
    front: u32,
    back: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a LayerStore, first: u32) -> Self {
        let mut back = first;
        if back != INVALID {
            while store.next_sibling[back as usize] != INVALID {
                back = store.next_sibling[back as usize];
            }
        }
        Self {
            store,
            front: first,
            back,
        }
    }

    fn finish(&mut self) {
        self.front = INVALID;
        self.back = INVALID;
    }
}

impl Iterator for Children<'_> {
    type Item = LayerId;

    fn next(&mut self) -> Option<LayerId> {
        if self.front == INVALID {
            return None;
        }
        let idx = self.front;
        if idx == self.back {
            self.finish();
        } else {
            self.front = self.store.next_sibling[idx as usize];
        }
        Some(self.store.id_at(idx))
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<LayerId> {
        if self.back == INVALID {
            return None;
        }
        let idx = self.back;
        if idx == self.front {
            self.finish();
        } else {
            self.back = self.store.prev_sibling[idx as usize];
        }
        Some(self.store.id_at(idx))
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use crate::layer::LayerStore;

    #[test]
    fn children_iterate_both_ways() {
        let mut store = LayerStore::new();
        let root = store.create_layer();
        let a = store.create_layer();
        let b = store.create_layer();
        let c = store.create_layer();
        store.add_child(root, a);
        store.add_child(root, b);
        store.add_child(root, c);

        let forward: Vec<_> = store.children(root).collect();
        let backward: Vec<_> = store.children(root).rev().collect();
        assert_eq!(forward, vec![a, b, c]);
        assert_eq!(backward, vec![c, b, a]);
    }

    #[test]
    fn meeting_in_the_middle_yields_each_child_once() {
        let mut store = LayerStore::new();
        let root = store.create_layer();
        let a = store.create_layer();
        let b = store.create_layer();
        store.add_child(root, a);
        store.add_child(root, b);

        let mut it = store.children(root);
        assert_eq!(it.next(), Some(a));
        assert_eq!(it.next_back(), Some(b));
        assert_eq!(it.next(), None);
        assert_eq!(it.next_back(), None);
    }

    #[test]
    fn leaf_has_no_children() {
        let mut store = LayerStore::new();
        let root = store.create_layer();
        assert!(store.children(root).next().is_none());
        assert!(store.children(root).next_back().is_none());
    }
}
