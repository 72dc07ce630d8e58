//! ## Multisets
//! This module provides a basic immutable multiset implementation. The key exported data
//! structure is [MultiSet]. Equality and hashing are order independent and count duplicates,
//! which is exactly the clause identity the calculus works with.

use std::{
    hash::{DefaultHasher, Hash, Hasher},
    slice,
};

use rustc_hash::FxHashMap;

/// Multisets containing values of type `T`. Insertion order is preserved for iteration but
/// carries no semantic meaning.
#[derive(Debug, Clone)]
pub struct MultiSet<T> {
    vec: Vec<T>,
}

impl<T> MultiSet<T> {
    /// Create a new empty multiset.
    pub fn new() -> Self {
        Self { vec: Vec::new() }
    }

    /// Create a new multiset containing all elements from `vec`.
    pub fn of_vec(vec: Vec<T>) -> Self {
        Self { vec }
    }

    /// Compute how many elements are in the multiset overall, including duplicates, this is
    /// `O(1)`.
    pub fn len(&self) -> usize {
        self.vec.len()
    }

    /// Check if the set is empty, this is `O(1)`.
    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    /// Obtain an iterator over all elements in the set in insertion order.
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.vec.iter()
    }

    /// Index into the multiset, the i-th element is the one that was inserted as the i-th one.
    pub fn get(&self, idx: usize) -> &T {
        &self.vec[idx]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.vec
    }
}

impl<T: Eq + Hash> MultiSet<T> {
    fn counts(&self) -> FxHashMap<&T, usize> {
        let mut counts = FxHashMap::default();
        for item in self.iter() {
            *counts.entry(item).or_insert(0) += 1;
        }
        counts
    }
}

impl<T: Eq + Hash> PartialEq for MultiSet<T> {
    /// True multiset equality, elements are matched up to permutation but multiplicities have
    /// to agree.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.counts() == other.counts()
    }
}

impl<T: Eq + Hash> Eq for MultiSet<T> {}

impl<T: Eq + Hash> Hash for MultiSet<T> {
    /// Order independent hash, consistent with the multiset equality above.
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut acc: u64 = 0;
        for item in self.iter() {
            let mut hasher = DefaultHasher::new();
            item.hash(&mut hasher);
            acc = acc.wrapping_add(hasher.finish());
        }
        state.write_u64(acc);
        state.write_usize(self.len());
    }
}

impl<T> Default for MultiSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for MultiSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            vec: FromIterator::from_iter(iter),
        }
    }
}

impl<T> IntoIterator for MultiSet<T> {
    type Item = T;

    type IntoIter = <Vec<T> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.vec.into_iter()
    }
}
