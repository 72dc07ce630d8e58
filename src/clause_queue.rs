//! ## Clause Queue
//! This module contains the implementation of the clause queue used as the passive set in the
//! given clause procedure. The key exported data structure is [ClauseQueue].
//!
//! Clauses are usually picked by ascending weight, but a pure weight ordering starves old heavy
//! clauses and with them completeness in practice. The queue therefore interleaves: after
//! `age_weight_ratio` weight based picks the next pick takes the oldest clause instead. Both
//! orders live in their own queue over clause identifiers, the clause map is the source of
//! truth and stale twin entries are skipped lazily during popping.

use std::{cmp::Ordering, collections::BinaryHeap, collections::VecDeque};

use rustc_hash::FxHashMap;

use crate::clause::{Clause, ClauseId};

// The public clause ordering instance works with the clause identifier but we want to order it
// after its weight so we use a dedicated heap entry.
struct WeightedEntry {
    weight: u32,
    id: ClauseId,
}

impl PartialEq for WeightedEntry {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight && self.id == other.id
    }
}

impl Eq for WeightedEntry {}

impl PartialOrd for WeightedEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// We use reverse ordering as we want minimal clauses to be selected first, with ties going to
// the older clause.
impl Ord for WeightedEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .cmp(&other.weight)
            .reverse()
            .then_with(|| self.id.cmp(&other.id).reverse())
    }
}

/// A priority queue for clauses sorted according to some heuristics for given clause selection.
pub struct ClauseQueue {
    clauses: FxHashMap<ClauseId, Clause>,
    weight_queue: BinaryHeap<WeightedEntry>,
    age_queue: VecDeque<ClauseId>,
    age_weight_ratio: u32,
    picks: u64,
}

impl ClauseQueue {
    /// Create an empty clause queue. Every `age_weight_ratio + 1`-th pick is by age, `0`
    /// disables age based picking entirely.
    pub fn new(age_weight_ratio: u32) -> Self {
        Self {
            clauses: FxHashMap::default(),
            weight_queue: BinaryHeap::new(),
            age_queue: VecDeque::new(),
            age_weight_ratio,
            picks: 0,
        }
    }

    /// Push a clause into the clause queue. Pushing a clause that is already queued keeps a
    /// single copy.
    pub fn push(&mut self, clause: Clause) {
        let id = clause.get_id();
        self.weight_queue.push(WeightedEntry {
            weight: clause.weight(),
            id,
        });
        self.age_queue.push_back(id);
        self.clauses.insert(id, clause);
    }

    /// Obtain the currently best clause from the queue.
    pub fn pop(&mut self) -> Option<Clause> {
        let ratio = u64::from(self.age_weight_ratio);
        let by_age = ratio != 0 && self.picks % (ratio + 1) == ratio;
        let id = if by_age {
            self.pop_oldest_live()
        } else {
            self.pop_lightest_live()
        }?;
        self.picks += 1;
        self.clauses.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    fn pop_lightest_live(&mut self) -> Option<ClauseId> {
        while let Some(entry) = self.weight_queue.pop() {
            if self.clauses.contains_key(&entry.id) {
                return Some(entry.id);
            }
        }
        None
    }

    fn pop_oldest_live(&mut self) -> Option<ClauseId> {
        while let Some(id) = self.age_queue.pop_front() {
            if self.clauses.contains_key(&id) {
                return Some(id);
            }
        }
        None
    }
}
