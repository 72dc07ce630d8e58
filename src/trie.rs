//! ## Trie
//! Contains the implementation of a basic [trie](https://en.wikipedia.org/wiki/Trie) data structure
//! shared by the term and clause indices.

use std::{
    collections::{
        BTreeMap,
        btree_map::{self, Entry},
    },
    slice,
};

/// Implementation of a [trie](https://en.wikipedia.org/wiki/Trie) with `C` being the characters
/// from its alphabet and `V` the values in the nodes. Children are kept in a [BTreeMap] so all
/// iteration orders are deterministic. Removal prunes empty nodes, so structural equality holds
/// between a drained trie and a fresh one.
#[derive(Debug, PartialEq, Eq)]
pub struct Trie<C, V> {
    values: Vec<V>,
    children: BTreeMap<C, Box<Trie<C, V>>>,
}

impl<C: Copy + Eq + Ord, V> Trie<C, V> {
    /// Create a new empty trie.
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            children: BTreeMap::new(),
        }
    }

    /// Get mutable access to the value list at the position described by the string produced by
    /// `iter`, creating missing nodes along the way. Callers decide how to place their value in
    /// the list, in particular whether to keep it sorted.
    pub fn values_mut(&mut self, mut iter: impl Iterator<Item = C>) -> &mut Vec<V> {
        match iter.next() {
            Some(char) => self
                .children
                .entry(char)
                .or_insert_with(|| Box::new(Self::new()))
                .values_mut(iter),
            None => &mut self.values,
        }
    }

    /// Remove all values matching `pred` at the position described by the string produced by
    /// `iter`.
    pub fn remove_where(
        &mut self,
        mut iter: impl Iterator<Item = C>,
        pred: &mut impl FnMut(&V) -> bool,
    ) {
        match iter.next() {
            Some(char) => match self.children.entry(char) {
                Entry::Occupied(mut occupied_entry) => {
                    let entry = occupied_entry.get_mut();
                    entry.remove_where(iter, pred);
                    // Remove the subtrie if:
                    // - the subtrie has no values directly attached
                    // - the subtrie has no elements in its subtrie
                    if entry.values.is_empty() && entry.children.is_empty() {
                        self.children.remove(&char);
                    }
                }
                // Element not contained in the trie in the first place
                Entry::Vacant(_) => (),
            },
            None => {
                // Self is the final trie, where the value is stored
                self.values.retain(|x| !pred(x));
            }
        }
    }

    pub fn get_child(&self, c: &C) -> Option<&Trie<C, V>> {
        self.children.get(c).map(|v| &**v)
    }

    pub fn iter_children(&self) -> btree_map::Iter<'_, C, Box<Trie<C, V>>> {
        self.children.iter()
    }

    /// Iterate over all children whose character is at most `c`.
    pub fn iter_children_to(&self, c: C) -> btree_map::Range<'_, C, Box<Trie<C, V>>> {
        self.children.range(..=c)
    }

    /// Iterate over all children whose character is at least `c`.
    pub fn iter_children_from(&self, c: C) -> btree_map::Range<'_, C, Box<Trie<C, V>>> {
        self.children.range(c..)
    }

    pub fn iter_values(&self) -> slice::Iter<'_, V> {
        self.values.iter()
    }

    pub fn has_values(&self) -> bool {
        !self.values.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.children.is_empty()
    }
}
