//! ## Discrimination Tree
//! This module contains an implementation of an imperfect first order discrimination tree as shown
//! in [LMU's ATP course](https://www.tcs.ifi.lmu.de/lehre/ws-2024-25/atp/slides14-efficient-saturation-procedures-outlook.pdf).
//! The key exported data structure is [DiscriminationTree].
//!
//! Because the tree is imperfect its traversals only produce candidates. All retrieval functions
//! therefore run in two phases: the tree enumerates candidate leaves by walking the flatterm of
//! the query and afterwards each candidate is verified with the real unification or matching
//! routine. Only verified results together with their substitution are handed out. Callers are
//! expected to keep query variables disjoint from the indexed terms where that matters.

use std::{iter::Peekable, slice};

use crate::{
    persistent_vec_iter::PersistentVecIterator,
    subst::HashSubstitution,
    term_bank::{FunctionIdentifier, Sort, Term, TermBank, TermNode},
    trie::Trie,
};

/// The alphabet of a discrimination tree trie.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum DiscrTreeKey {
    /// Stars for representing variables, annotated with the sort of the variable.
    Star(Sort),
    /// Function applications containing their identifier and the arity of the function, `0` if
    /// it is a constant.
    App {
        id: FunctionIdentifier,
        arity: usize,
    },
}

type DtTrie<V> = Trie<DiscrTreeKey, LeafEntry<V>>;

/// A single indexed entry: the exact term that was inserted together with its value and its
/// priority.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LeafEntry<V> {
    term: Term,
    value: V,
    priority: u64,
}

/// A non perfect discrimination tree with `V` as the values associated with the indexed terms.
#[derive(Debug, PartialEq, Eq)]
pub struct DiscriminationTree<V> {
    trie: DtTrie<V>,
}

/// The preorder flatterm of `term` in the discrimination tree alphabet.
fn flatterm(term: &Term, term_bank: &TermBank) -> PersistentVecIterator<DiscrTreeKey> {
    let mut keys = Vec::new();
    let mut stack = vec![term];
    while let Some(curr) = stack.pop() {
        match &**curr {
            TermNode::Var { id, .. } => {
                keys.push(DiscrTreeKey::Star(term_bank.get_variable_info(*id).sort));
            }
            TermNode::App { id, args, .. } => {
                args.iter().rev().for_each(|arg| stack.push(arg));
                keys.push(DiscrTreeKey::App {
                    id: *id,
                    arity: args.len(),
                });
            }
        }
    }
    PersistentVecIterator::new(keys)
}

/// Skip to the end of the current subterm in an iterator of the discrimination tree alphabet.
/// Precondition: The iterator has at least one element remaining
fn skip_to_next_subterm<T: Iterator<Item = DiscrTreeKey>>(iter: &mut T) {
    let mut to_skip = 0;
    match iter.next().unwrap() {
        DiscrTreeKey::Star(_) => return,
        DiscrTreeKey::App { arity, .. } => {
            to_skip += arity;
        }
    }

    while to_skip != 0 {
        match iter.next().unwrap() {
            DiscrTreeKey::Star(_) => to_skip -= 1,
            DiscrTreeKey::App { arity, .. } => {
                to_skip = (to_skip + arity) - 1;
            }
        }
    }
}

/// Find all subtries that sit right behind one complete indexed subterm of root sort `sort`,
/// starting from `trie`.
fn subterm_end_positions<'a, V>(
    trie: &'a DtTrie<V>,
    sort: Sort,
    term_bank: &TermBank,
) -> Vec<&'a DtTrie<V>> {
    let mut final_positions = Vec::new();
    let mut frontier = Vec::new();
    // Only the first level knows the root sort of the subterm being skipped, below it just the
    // arity arithmetic remains.
    for (child_key, child_pos) in trie.iter_children() {
        match child_key {
            DiscrTreeKey::Star(child_sort) => {
                if *child_sort == sort {
                    final_positions.push(&**child_pos);
                }
            }
            DiscrTreeKey::App { id, arity } => {
                if term_bank.get_function_info(*id).sort == sort {
                    if *arity == 0 {
                        final_positions.push(&**child_pos);
                    } else {
                        frontier.push((&**child_pos, *arity));
                    }
                }
            }
        }
    }

    while let Some((pos, to_skip)) = frontier.pop() {
        for (child_key, child_pos) in pos.iter_children() {
            let to_skip = match child_key {
                DiscrTreeKey::Star(_) => to_skip - 1,
                DiscrTreeKey::App { arity, .. } => (to_skip + *arity) - 1,
            };
            if to_skip == 0 {
                final_positions.push(&**child_pos);
            } else {
                frontier.push((&**child_pos, to_skip));
            }
        }
    }
    final_positions
}

pub struct UnificationIter<'a, V> {
    query: Term,
    term_bank: &'a TermBank,
    frontier: Vec<(
        Peekable<PersistentVecIterator<DiscrTreeKey>>,
        &'a DtTrie<V>,
    )>,
    found_node_iter: Option<slice::Iter<'a, LeafEntry<V>>>,
}

impl<'a, V> Iterator for UnificationIter<'a, V> {
    type Item = (Term, &'a V, HashSubstitution);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // If at the leaf we are currently stopped at something is still left, try to verify
            // it with the real unifier and hand it out.
            if let Some(found_node_iter) = &mut self.found_node_iter {
                for entry in found_node_iter.by_ref() {
                    if let Some(subst) = self.query.unify(&entry.term, self.term_bank) {
                        return Some((entry.term.clone(), &entry.value, subst));
                    }
                }
                self.found_node_iter = None;
            }

            // Start looking for a new leaf.
            let (mut query_pos, trie_pos) = self.frontier.pop()?;
            match query_pos.peek().copied() {
                Some(DiscrTreeKey::Star(sort)) => {
                    let subtries = subterm_end_positions(trie_pos, sort, self.term_bank);
                    query_pos.next();
                    subtries
                        .into_iter()
                        .for_each(|subtrie| self.frontier.push((query_pos.clone(), subtrie)));
                }
                Some(key @ DiscrTreeKey::App { id, .. }) => {
                    if let Some(subtrie) = trie_pos.get_child(&key) {
                        let mut next_query_pos = query_pos.clone();
                        next_query_pos.next();
                        self.frontier.push((next_query_pos, subtrie));
                    }

                    let star = DiscrTreeKey::Star(self.term_bank.get_function_info(id).sort);
                    if let Some(subtrie) = trie_pos.get_child(&star) {
                        skip_to_next_subterm(&mut query_pos);
                        self.frontier.push((query_pos, subtrie));
                    }
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

impl<V> DiscriminationTree<V> {
    /// Create an empty discrimination tree.
    pub fn new() -> Self {
        Self { trie: Trie::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }

    /// Insert a new term with some associated value into the discrimination tree. Retrievals
    /// produce entries in ascending `priority` order, the saturation loop passes clause
    /// identifiers here so older clauses come out first.
    pub fn insert(&mut self, term: &Term, value: V, priority: u64, term_bank: &TermBank) {
        let values = self.trie.values_mut(flatterm(term, term_bank));
        let idx = values.partition_point(|entry| entry.priority <= priority);
        values.insert(
            idx,
            LeafEntry {
                term: term.clone(),
                value,
                priority,
            },
        );
    }

    /// Remove all entries for `term` whose value is equal to `value`, pruning trie paths that
    /// become empty.
    pub fn remove(&mut self, term: &Term, value: &V, term_bank: &TermBank)
    where
        V: PartialEq,
    {
        self.trie
            .remove_where(flatterm(term, term_bank), &mut |entry| {
                entry.value == *value
            });
    }

    /// Obtain all indexed generalisations of `term`, that is all entries whose term `t` admits
    /// a substitution `subst` s.t. `subst(t) = term`. Results are in ascending priority order
    /// and carry the matching substitution.
    pub fn get_generalisations(
        &self,
        term: &Term,
        term_bank: &TermBank,
    ) -> Vec<(Term, &V, HashSubstitution)> {
        let iter = flatterm(term, term_bank).peekable();
        let mut frontier = vec![(iter, &self.trie)];
        let mut candidates: Vec<&LeafEntry<V>> = Vec::new();
        while let Some((mut query_pos, trie_pos)) = frontier.pop() {
            match query_pos.peek().copied() {
                Some(DiscrTreeKey::Star(sort)) => {
                    // Only a variable of the same sort can generalise a variable.
                    if let Some(subtrie) = trie_pos.get_child(&DiscrTreeKey::Star(sort)) {
                        query_pos.next();
                        frontier.push((query_pos, subtrie));
                    }
                }
                Some(key @ DiscrTreeKey::App { id, .. }) => {
                    if let Some(subtrie) = trie_pos.get_child(&key) {
                        let mut next_query_pos = query_pos.clone();
                        next_query_pos.next();
                        frontier.push((next_query_pos, subtrie));
                    }

                    let star = DiscrTreeKey::Star(term_bank.get_function_info(id).sort);
                    if let Some(subtrie) = trie_pos.get_child(&star) {
                        skip_to_next_subterm(&mut query_pos);
                        frontier.push((query_pos, subtrie));
                    }
                }
                None => candidates.extend(trie_pos.iter_values()),
            }
        }

        candidates.sort_by_key(|entry| entry.priority);
        candidates
            .into_iter()
            .filter_map(|entry| {
                entry
                    .term
                    .matching(term, term_bank)
                    .map(|subst| (entry.term.clone(), &entry.value, subst))
            })
            .collect()
    }

    /// Obtain all indexed instances of `term`, that is all entries whose term `t` admits a
    /// substitution `subst` s.t. `subst(term) = t`. Results are in ascending priority order and
    /// carry the matching substitution.
    pub fn get_instances(
        &self,
        term: &Term,
        term_bank: &TermBank,
    ) -> Vec<(Term, &V, HashSubstitution)> {
        let iter = flatterm(term, term_bank).peekable();
        let mut frontier = vec![(iter, &self.trie)];
        let mut candidates: Vec<&LeafEntry<V>> = Vec::new();
        while let Some((mut query_pos, trie_pos)) = frontier.pop() {
            match query_pos.peek().copied() {
                Some(DiscrTreeKey::Star(sort)) => {
                    let subtries = subterm_end_positions(trie_pos, sort, term_bank);
                    query_pos.next();
                    subtries
                        .into_iter()
                        .for_each(|subtrie| frontier.push((query_pos.clone(), subtrie)));
                }
                Some(key @ DiscrTreeKey::App { .. }) => {
                    if let Some(subtrie) = trie_pos.get_child(&key) {
                        query_pos.next();
                        frontier.push((query_pos, subtrie));
                    }
                }
                None => candidates.extend(trie_pos.iter_values()),
            }
        }

        candidates.sort_by_key(|entry| entry.priority);
        candidates
            .into_iter()
            .filter_map(|entry| {
                term.matching(&entry.term, term_bank)
                    .map(|subst| (entry.term.clone(), &entry.value, subst))
            })
            .collect()
    }

    /// Obtain all indexed entries unifiable with `term`, that is all entries whose term `t`
    /// admits a substitution `subst` s.t. `subst(term) = subst(t)`. The iterator is lazy, it
    /// walks the tree on demand and verifies each candidate with the real unifier.
    pub fn get_unifications<'a>(
        &'a self,
        term: &Term,
        term_bank: &'a TermBank,
    ) -> UnificationIter<'a, V> {
        UnificationIter {
            query: term.clone(),
            term_bank,
            frontier: vec![(flatterm(term, term_bank).peekable(), &self.trie)],
            found_node_iter: None,
        }
    }
}
