//! ## Substitutions
//! This module contains an implementation of substitutions on first order constructs, the key
//! things exposed are:
//! - [Substitution], the interface of a substitution, mapping some variables to terms to
//!   replace them with. Unification and matching are generic over it so alternative
//!   representations can be plugged in at the seam.
//! - [HashSubstitution], the hash map backed default implementation.
//! - [Substitutable], implemented by types that have some notion of substitution application.

use rustc_hash::FxHashMap;

use crate::term_bank::{
    Term, TermBank,
    TermNode::{App, Var},
    VariableIdentifier,
};

/// The interface of a first order substitution.
pub trait Substitution {
    /// Create a new empty substitution.
    fn new() -> Self;

    /// Associate `var` with `term`, overwriting any previous association.
    fn insert(&mut self, var: VariableIdentifier, term: Term);

    /// Obtain the term associated with `var` if it exists.
    fn get(&self, var: VariableIdentifier) -> Option<Term>;

    /// Return `true` if the substitution is an identity substitution.
    fn is_nop(&self) -> bool;

    /// Compose the current substitution `sigma` with `{ var |-> term }`, i.e. turn it into
    /// `{ var |-> term } . sigma`.
    fn compose_binding(&mut self, var: VariableIdentifier, term: Term, term_bank: &TermBank);
}

/// A first order substitution backed by a hash map.
#[derive(Debug, Clone, Default)]
pub struct HashSubstitution {
    map: FxHashMap<VariableIdentifier, Term>,
}

impl Substitution for HashSubstitution {
    fn new() -> Self {
        Self {
            map: FxHashMap::default(),
        }
    }

    fn insert(&mut self, var: VariableIdentifier, term: Term) {
        self.map.insert(var, term);
    }

    fn get(&self, var: VariableIdentifier) -> Option<Term> {
        self.map.get(&var).cloned()
    }

    fn is_nop(&self) -> bool {
        self.map.is_empty()
    }

    fn compose_binding(&mut self, var: VariableIdentifier, term: Term, term_bank: &TermBank) {
        let mut binding = HashSubstitution::new();
        binding.insert(var, term.clone());
        for (_, value) in self.map.iter_mut() {
            *value = value.clone().subst_with(&binding, term_bank);
        }
        self.map.entry(var).or_insert(term);
    }
}

/// A type that has a substitution operation on itself.
pub trait Substitutable {
    /// Apply `subst` to `self`, hash consing terms using `term_bank`.
    fn subst_with<S: Substitution>(self, subst: &S, term_bank: &TermBank) -> Self;
}

impl Term {
    fn subst_with_aux<S: Substitution>(
        self,
        subst: &S,
        term_bank: &TermBank,
        cache: &mut FxHashMap<Term, Term>,
    ) -> Term {
        if self.is_ground() {
            self
        } else if let Some(hit) = cache.get(&self) {
            hit.clone()
        } else {
            let substituted = match self.as_ref() {
                Var { id, .. } => subst.get(*id).unwrap_or_else(|| self.clone()),
                App { id, args, .. } => {
                    let new_args = args
                        .iter()
                        .map(|arg| arg.clone().subst_with_aux(subst, term_bank, cache))
                        .collect();
                    term_bank.mk_app(*id, new_args)
                }
            };
            cache.insert(self, substituted.clone());
            substituted
        }
    }
}

impl Substitutable for Term {
    /// Apply `subst` to this term, if the substitution fulfills [Substitution::is_nop] or the
    /// term is ground this is constant time, otherwise up to `O(dag_size(term))`. Shared
    /// subterms are substituted once thanks to a memo cache.
    fn subst_with<S: Substitution>(self, subst: &S, term_bank: &TermBank) -> Self {
        if subst.is_nop() {
            self
        } else {
            let mut cache = FxHashMap::default();
            self.subst_with_aux(subst, term_bank, &mut cache)
        }
    }
}
