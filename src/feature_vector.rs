//! ## Feature Vector Index
//! This module contains the implementation of a feature vector index as shown in
//! [Simple and Efficient Clause Subsumption with Feature Vector Indexing](https://wwwlehre.dhbw-stuttgart.de/~sschulz/PAPERS/Schulz2013-FVI.pdf)
//! The key exported data structure is [FeatureVectorIndex].
//!
//! Every index carries a [FeatureScheme] fixed for the lifetime of one saturation run. The
//! scheme picks the most frequent signature symbols of the initial clause set and gives each of
//! them dedicated occurrence and depth features, everything else lands in a catch all pair. All
//! features are monotone under subsumption, so the trie descent is a sound over approximation:
//! candidates still have to be confirmed by the real subsumption check.

use std::slice;

use rustc_hash::FxHashMap;

use crate::{
    clause::{Clause, ClauseId, Polarity},
    persistent_vec_iter::PersistentVecIterator,
    term_bank::{FunctionIdentifier, Term, TermNode},
    trie::Trie,
};

/// Count the symbol occurrences of `term` into `counts`.
fn count_occurrences(term: &Term, counts: &mut FxHashMap<FunctionIdentifier, usize>) {
    let mut stack = vec![term];
    while let Some(curr) = stack.pop() {
        if let TermNode::App { id, args, .. } = &**curr {
            *counts.entry(*id).or_insert(0) += 1;
            args.iter().for_each(|arg| stack.push(arg));
        }
    }
}

/// The recipe for turning clauses into feature vectors. A scheme is computed once from the
/// initial clause set and reused unchanged for every vector of the run, so all vectors have the
/// same length and comparable components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureScheme {
    /// The symbols with dedicated features, mapped to their slot in `0..selected.len()`.
    selected: FxHashMap<FunctionIdentifier, usize>,
}

impl FeatureScheme {
    // Taken from EProver `FVINDEX_MAX_FEATURES_DEFAULT`, minus the leading literal counts.
    const MAX_SYMBOLS: usize = 15;

    /// Fix the feature scheme for one run: the most frequent symbols of the initial clause set
    /// get dedicated features, ties are broken towards the older symbol.
    pub fn of_initial_clauses<'a>(clauses: impl IntoIterator<Item = &'a Clause>) -> Self {
        let mut counts = FxHashMap::default();
        for clause in clauses {
            for (_, lit) in clause.iter() {
                count_occurrences(lit.get_lhs(), &mut counts);
                count_occurrences(lit.get_rhs(), &mut counts);
            }
        }
        let mut symbols: Vec<(FunctionIdentifier, usize)> = counts.into_iter().collect();
        symbols.sort_by(|(id_l, count_l), (id_r, count_r)| {
            count_r.cmp(count_l).then(id_l.cmp(id_r))
        });
        let selected = symbols
            .into_iter()
            .take(Self::MAX_SYMBOLS)
            .enumerate()
            .map(|(slot, (id, _))| (id, slot))
            .collect();
        Self { selected }
    }

    /// The length of all vectors produced by this scheme.
    fn width(&self) -> usize {
        // |C^+|, |C^-| and the depth sum, then per selected symbol f the quadruple
        // |C^+|_f, |C^-|_f, d^+_f, d^-_f, then the catch all occurrence pair.
        3 + 4 * self.selected.len() + 2
    }

    fn count_symbols(&self, term: &Term, depth: usize, positive: bool, vec: &mut [usize]) {
        if let TermNode::App { id, args, .. } = &**term {
            vec[2] += depth;
            match self.selected.get(id) {
                Some(slot) => {
                    let base = 3 + 4 * slot;
                    if positive {
                        vec[base] += 1;
                        vec[base + 2] = vec[base + 2].max(depth);
                    } else {
                        vec[base + 1] += 1;
                        vec[base + 3] = vec[base + 3].max(depth);
                    }
                }
                None => {
                    let base = 3 + 4 * self.selected.len();
                    if positive {
                        vec[base] += 1;
                    } else {
                        vec[base + 1] += 1;
                    }
                }
            }
            args.iter()
                .for_each(|arg| self.count_symbols(arg, depth + 1, positive, vec));
        }
    }

    /// Compute the feature vector of `clause` under this scheme.
    fn feature_vector(&self, clause: &Clause) -> Vec<usize> {
        let mut vec = vec![0; self.width()];
        for (_, lit) in clause.iter() {
            let positive = lit.get_pol() == Polarity::Eq;
            if positive {
                vec[0] += 1;
            } else {
                vec[1] += 1;
            }
            self.count_symbols(lit.get_lhs(), 0, positive, &mut vec);
            self.count_symbols(lit.get_rhs(), 0, positive, &mut vec);
        }
        vec
    }
}

/// The two descent modes through the feature trie.
#[derive(Debug, Clone, Copy)]
enum Descent {
    /// Follow keys at most the query feature, finds clauses that might subsume the query.
    AtMost,
    /// Follow keys at least the query feature, finds clauses the query might subsume.
    AtLeast,
}

pub struct FeatureVectorIndexIter<'a> {
    frontier: Vec<(PersistentVecIterator<usize>, &'a Trie<usize, ClauseId>)>,
    found_node_iter: Option<slice::Iter<'a, ClauseId>>,
    descent: Descent,
}

impl<'a> FeatureVectorIndexIter<'a> {
    fn new(index: &'a FeatureVectorIndex, clause: &Clause, descent: Descent) -> Self {
        let vec = index.scheme.feature_vector(clause);
        Self {
            frontier: vec![(PersistentVecIterator::new(vec), &index.trie)],
            found_node_iter: None,
            descent,
        }
    }
}

impl Iterator for FeatureVectorIndexIter<'_> {
    type Item = ClauseId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // If at the leaf we are currently stopped at something is still left, use it.
            if let Some(found_node_iter) = &mut self.found_node_iter {
                if let Some(next) = found_node_iter.next() {
                    return Some(*next);
                }
                self.found_node_iter = None;
            }

            // Start looking for a new leaf.
            let (mut query_pos, trie_pos) = self.frontier.pop()?;
            match query_pos.next() {
                Some(query_feature) => {
                    let children = match self.descent {
                        Descent::AtMost => trie_pos.iter_children_to(query_feature),
                        Descent::AtLeast => trie_pos.iter_children_from(query_feature),
                    };
                    children.for_each(|(_, child_pos)| {
                        self.frontier.push((query_pos.clone(), &**child_pos))
                    });
                }
                None => {
                    if trie_pos.has_values() {
                        self.found_node_iter = Some(trie_pos.iter_values());
                    }
                }
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct FeatureVectorIndex {
    scheme: FeatureScheme,
    trie: Trie<usize, ClauseId>,
}

impl FeatureVectorIndex {
    /// Create a fresh empty feature vector index using `scheme` for all its vectors.
    pub fn new(scheme: FeatureScheme) -> Self {
        Self {
            scheme,
            trie: Trie::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }

    /// Insert a clause into the feature vector index.
    pub fn insert(&mut self, clause: &Clause) {
        let vec = self.scheme.feature_vector(clause);
        let id = clause.get_id();
        let values = self.trie.values_mut(vec.into_iter());
        let idx = values.partition_point(|other| *other <= id);
        values.insert(idx, id);
    }

    /// Remove a clause from the feature vector index.
    pub fn remove(&mut self, clause: &Clause) {
        let vec = self.scheme.feature_vector(clause);
        let id = clause.get_id();
        self.trie
            .remove_where(vec.into_iter(), &mut |other| *other == id);
    }

    /// Obtain an iterator over clauses from the index that might subsume `clause`.
    pub fn forward_candidates<'a>(&'a self, clause: &Clause) -> FeatureVectorIndexIter<'a> {
        FeatureVectorIndexIter::new(self, clause, Descent::AtMost)
    }

    /// Obtain an iterator over clauses from the index that might be subsumed by `clause`.
    pub fn backward_candidates<'a>(&'a self, clause: &Clause) -> FeatureVectorIndexIter<'a> {
        FeatureVectorIndexIter::new(self, clause, Descent::AtLeast)
    }
}
