//! ## Proof State
//! The clause sets the given clause procedure operates on. The key exported data structures
//! are:
//! - [ActiveSet], the fully processed clauses together with the three indices kept in sync
//!   with them: a subterm index over all non variable subterms for superposition partner
//!   retrieval, a rewrite index over the large sides of positive unit equations for
//!   demodulation and a feature vector index for subsumption candidates
//! - [ProofState], bundling the active set, the passive clause queue and the set of support

use std::cmp::Ordering;

use log::info;

use crate::{
    clause::{Clause, ClauseId, ClauseSet},
    clause_queue::ClauseQueue,
    discr_tree::DiscriminationTree,
    error::EngineError,
    feature_vector::{FeatureScheme, FeatureVectorIndex},
    kbo::KboOrd,
    position::{
        ClausePosition, ClauseSetLiteralPosition, ClauseSetPosition, LiteralPosition, LiteralSide,
    },
    pretty_print::pretty_print,
    term_bank::{Term, TermBank},
};

/// The subterm index entries of `clause`: every non variable subterm of every literal side
/// together with its position. Variables are left out, superposition into a variable position
/// is not part of the calculus.
fn subterm_entries(clause: &Clause) -> Vec<(Term, ClauseSetPosition)> {
    let clause_id = clause.get_id();
    let mut entries = Vec::new();
    for (literal_id, literal) in clause.iter() {
        for side in [LiteralSide::Left, LiteralSide::Right] {
            for (term_pos, term) in literal.get_side(side).subterms() {
                if term.is_variable() {
                    continue;
                }
                let pos = ClauseSetPosition::new(
                    clause_id,
                    ClausePosition::new(literal_id, LiteralPosition::new(side, term_pos)),
                );
                entries.push((term.clone(), pos));
            }
        }
    }
    entries
}

/// The rewrite index entries of `clause`: the sides of a positive unit equation that are not
/// already known to be the small one. KBO is stable under substitution, so a side below its
/// partner can never head an instance that shrinks and indexing it would be wasted work.
/// Variable sides are skipped for the same reason a discrimination tree never stores bare
/// variables: they would match everything.
fn rewrite_entries(clause: &Clause, term_bank: &TermBank) -> Vec<(Term, ClauseSetLiteralPosition)> {
    let mut entries = Vec::new();
    if !clause.is_unit() {
        return entries;
    }
    let Some((literal_id, literal)) = clause.iter().next() else {
        return entries;
    };
    if literal.is_ne() {
        return entries;
    }
    for side in [LiteralSide::Left, LiteralSide::Right] {
        let lhs = literal.get_side(side);
        let rhs = literal.get_side(side.flip());
        if lhs.is_variable() {
            continue;
        }
        match lhs.kbo(rhs, term_bank) {
            Some(Ordering::Less) | Some(Ordering::Equal) => continue,
            _ => entries.push((
                lhs.clone(),
                ClauseSetLiteralPosition::new(clause.get_id(), literal_id, side),
            )),
        }
    }
    entries
}

/// The set of clauses that have been given and all inferences among them performed. All three
/// indices are kept in sync with the clause set by [ActiveSet::insert] and [ActiveSet::remove].
#[derive(Debug)]
pub struct ActiveSet {
    clauses: ClauseSet,
    subterm_index: DiscriminationTree<ClauseSetPosition>,
    rewrite_index: DiscriminationTree<ClauseSetLiteralPosition>,
    subsumption_index: FeatureVectorIndex,
}

impl ActiveSet {
    /// Create an empty active set whose subsumption index uses `scheme`.
    pub fn new(scheme: FeatureScheme) -> Self {
        Self {
            clauses: ClauseSet::new(),
            subterm_index: DiscriminationTree::new(),
            rewrite_index: DiscriminationTree::new(),
            subsumption_index: FeatureVectorIndex::new(scheme),
        }
    }

    /// Insert `clause` into the set and all indices. Index priorities are clause identifiers,
    /// so retrievals yield older clauses first.
    pub fn insert(&mut self, clause: Clause, term_bank: &TermBank) {
        info!("activating: {}", pretty_print(&clause, term_bank));
        let priority = clause.get_id().index() as u64;
        for (term, pos) in subterm_entries(&clause) {
            self.subterm_index.insert(&term, pos, priority, term_bank);
        }
        for (term, pos) in rewrite_entries(&clause, term_bank) {
            self.rewrite_index.insert(&term, pos, priority, term_bank);
        }
        self.subsumption_index.insert(&clause);
        self.clauses.insert(clause);
    }

    /// Remove the clause with identifier `id` from the set and every index entry it produced.
    /// Removing an unknown identifier means an index and the clause set went out of sync.
    pub fn remove(&mut self, id: ClauseId, term_bank: &TermBank) -> Result<Clause, EngineError> {
        let clause = self.clauses.remove(id).ok_or(EngineError::ClauseNotFound {
            id,
            context: "removing an active clause",
        })?;
        for (term, pos) in subterm_entries(&clause) {
            self.subterm_index.remove(&term, &pos, term_bank);
        }
        for (term, pos) in rewrite_entries(&clause, term_bank) {
            self.rewrite_index.remove(&term, &pos, term_bank);
        }
        self.subsumption_index.remove(&clause);
        info!("deactivated: {}", pretty_print(&clause, term_bank));
        Ok(clause)
    }

    pub fn get_by_id(&self, id: ClauseId) -> Option<&Clause> {
        self.clauses.get_by_id(id)
    }

    pub fn contains(&self, id: ClauseId) -> bool {
        self.clauses.contains(id)
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Iterate the clauses in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    pub fn clauses(&self) -> &ClauseSet {
        &self.clauses
    }

    /// The index of all non variable subterms, queried for superposition partners.
    pub fn subterm_index(&self) -> &DiscriminationTree<ClauseSetPosition> {
        &self.subterm_index
    }

    /// The index of demodulation eligible unit equation sides.
    pub fn rewrite_index(&self) -> &DiscriminationTree<ClauseSetLiteralPosition> {
        &self.rewrite_index
    }

    /// The feature vector index for subsumption candidate retrieval.
    pub fn subsumption_index(&self) -> &FeatureVectorIndex {
        &self.subsumption_index
    }

    /// Check whether some clause of this set subsumes `clause`. Candidates come from the
    /// feature vector index and are confirmed literal by literal.
    pub fn subsumes_clause(
        &self,
        clause: &Clause,
        term_bank: &TermBank,
    ) -> Result<bool, EngineError> {
        for candidate_id in self.subsumption_index.forward_candidates(clause) {
            let candidate =
                self.clauses
                    .get_by_id(candidate_id)
                    .ok_or(EngineError::ClauseNotFound {
                        id: candidate_id,
                        context: "confirming a forward subsumption candidate",
                    })?;
            if candidate.subsumes(clause, term_bank) {
                info!(
                    "subsumption: {} subsumes {}",
                    pretty_print(candidate, term_bank),
                    pretty_print(clause, term_bank)
                );
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// All clauses of this set that `clause` subsumes, the backward direction of the query
    /// above.
    pub fn subsumed_by(
        &self,
        clause: &Clause,
        term_bank: &TermBank,
    ) -> Result<Vec<ClauseId>, EngineError> {
        let mut subsumed = Vec::new();
        for candidate_id in self.subsumption_index.backward_candidates(clause) {
            let candidate =
                self.clauses
                    .get_by_id(candidate_id)
                    .ok_or(EngineError::ClauseNotFound {
                        id: candidate_id,
                        context: "confirming a backward subsumption candidate",
                    })?;
            if clause.subsumes(candidate, term_bank) {
                subsumed.push(candidate_id);
            }
        }
        Ok(subsumed)
    }
}

/// The complete state of one saturation run: processed clauses in [ProofState::active],
/// pending ones in [ProofState::passive] and the always available axiom pool in
/// [ProofState::set_of_support]. Clauses move from passive to active exactly once, set of
/// support clauses never move at all.
pub struct ProofState {
    pub active: ActiveSet,
    pub passive: ClauseQueue,
    pub set_of_support: ActiveSet,
}

impl ProofState {
    /// Build the initial state: `clauses` queue up in passive, `set_of_support` clauses are
    /// indexed immediately and stay available for the whole run. The feature scheme of both
    /// subsumption indices is fixed from the initial clauses here and never changes afterwards.
    pub fn new(
        clauses: Vec<Clause>,
        set_of_support: Vec<Clause>,
        age_weight_ratio: u32,
        term_bank: &TermBank,
    ) -> Self {
        let scheme = FeatureScheme::of_initial_clauses(clauses.iter().chain(set_of_support.iter()));
        let mut sos = ActiveSet::new(scheme.clone());
        for clause in set_of_support {
            sos.insert(clause, term_bank);
        }
        let mut passive = ClauseQueue::new(age_weight_ratio);
        for clause in clauses {
            passive.push(clause);
        }
        Self {
            active: ActiveSet::new(scheme),
            passive,
            set_of_support: sos,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        clause::{Clause, Literal},
        error::EngineError,
        feature_vector::FeatureScheme,
        term_bank::{FunctionInformation, Name, Sort, Term, TermBank, VariableInformation},
    };

    fn fun_info(name: &str, arity: usize, sort: Sort) -> FunctionInformation {
        FunctionInformation {
            name: Name::Parsed(name.to_string()),
            arity,
            sort,
        }
    }

    fn var_info(name: &str) -> VariableInformation {
        VariableInformation {
            name: name.to_string(),
            sort: Sort::Individual,
        }
    }

    fn atom(term: Term, term_bank: &TermBank) -> Literal {
        Literal::mk_eq(term, term_bank.mk_true())
    }

    #[test]
    fn insert_remove_roundtrip() {
        let mut term_bank = TermBank::new();
        let f = term_bank.add_function(fun_info("f", 1, Sort::Individual));
        let a = term_bank.add_function(fun_info("a", 0, Sort::Individual));
        let b = term_bank.add_function(fun_info("b", 0, Sort::Individual));
        let x = term_bank.mk_fresh_variable(var_info("x"));
        let a = term_bank.mk_const(a);
        let b = term_bank.mk_const(b);
        let f_x = term_bank.mk_app(f, vec![x.clone()]);
        let f_a = term_bank.mk_app(f, vec![a.clone()]);

        let unit = Clause::input(vec![Literal::mk_eq(f_x.clone(), x.clone())]);
        let wide = Clause::input(vec![
            Literal::mk_ne(f_a.clone(), b.clone()),
            Literal::mk_eq(a.clone(), b.clone()),
        ]);

        let scheme = FeatureScheme::of_initial_clauses([&unit, &wide]);
        let mut active = ActiveSet::new(scheme);
        active.insert(unit.clone(), &term_bank);
        active.insert(wide.clone(), &term_bank);
        assert_eq!(active.len(), 2);
        assert!(!active.subterm_index().is_empty());
        assert!(!active.rewrite_index().is_empty());
        assert!(!active.subsumption_index().is_empty());

        let removed = active.remove(unit.get_id(), &term_bank).unwrap();
        assert_eq!(removed, unit);
        active.remove(wide.get_id(), &term_bank).unwrap();
        assert!(active.is_empty());
        assert!(active.subterm_index().is_empty());
        assert!(active.rewrite_index().is_empty());
        assert!(active.subsumption_index().is_empty());

        // a second removal means the indices lost track of the clause set
        assert_eq!(
            active.remove(unit.get_id(), &term_bank),
            Err(EngineError::ClauseNotFound {
                id: unit.get_id(),
                context: "removing an active clause",
            })
        );
    }

    #[test]
    fn rewrite_index_keeps_oriented_unit_sides() {
        let mut term_bank = TermBank::new();
        // registration order makes a the larger constant under KBO
        let b = term_bank.add_function(fun_info("b", 0, Sort::Individual));
        let a = term_bank.add_function(fun_info("a", 0, Sort::Individual));
        let f = term_bank.add_function(fun_info("f", 2, Sort::Individual));
        let x = term_bank.mk_fresh_variable(var_info("x"));
        let y = term_bank.mk_fresh_variable(var_info("y"));
        let a = term_bank.mk_const(a);
        let b = term_bank.mk_const(b);

        let oriented = Clause::input(vec![Literal::mk_eq(a.clone(), b.clone())]);
        let scheme = FeatureScheme::of_initial_clauses([&oriented]);
        let mut active = ActiveSet::new(scheme.clone());
        active.insert(oriented, &term_bank);
        // only the large side a acts as a rewrite rule
        assert_eq!(
            active.rewrite_index().get_generalisations(&a, &term_bank).len(),
            1
        );
        assert!(active.rewrite_index().get_generalisations(&b, &term_bank).is_empty());

        // an unorientable equation is indexed under both sides
        let f_x_y = term_bank.mk_app(f, vec![x.clone(), y.clone()]);
        let f_y_x = term_bank.mk_app(f, vec![y.clone(), x.clone()]);
        let comm = Clause::input(vec![Literal::mk_eq(f_x_y, f_y_x)]);
        let mut active = ActiveSet::new(scheme.clone());
        active.insert(comm, &term_bank);
        let f_a_b = term_bank.mk_app(f, vec![a.clone(), b.clone()]);
        assert_eq!(
            active.rewrite_index().get_generalisations(&f_a_b, &term_bank).len(),
            2
        );

        // non unit clauses and negative units contribute nothing
        let mut active = ActiveSet::new(scheme);
        active.insert(
            Clause::input(vec![
                Literal::mk_eq(a.clone(), b.clone()),
                Literal::mk_ne(a.clone(), b.clone()),
            ]),
            &term_bank,
        );
        active.insert(Clause::input(vec![Literal::mk_ne(a.clone(), b.clone())]), &term_bank);
        assert!(active.rewrite_index().is_empty());
    }

    #[test]
    fn subsumption_queries() {
        let mut term_bank = TermBank::new();
        let p = term_bank.add_function(fun_info("p", 1, Sort::Prop));
        let q = term_bank.add_function(fun_info("q", 1, Sort::Prop));
        let a = term_bank.add_function(fun_info("a", 0, Sort::Individual));
        let b = term_bank.add_function(fun_info("b", 0, Sort::Individual));
        let x = term_bank.mk_fresh_variable(var_info("x"));

        let general = Clause::input(vec![atom(term_bank.mk_app(p, vec![x.clone()]), &term_bank)]);
        let special = Clause::input(vec![
            atom(term_bank.mk_app(p, vec![term_bank.mk_const(a)]), &term_bank),
            atom(term_bank.mk_app(q, vec![term_bank.mk_const(b)]), &term_bank),
        ]);

        let scheme = FeatureScheme::of_initial_clauses([&general, &special]);
        let mut active = ActiveSet::new(scheme.clone());
        active.insert(general.clone(), &term_bank);
        assert!(active.subsumes_clause(&special, &term_bank).unwrap());
        assert!(active.subsumed_by(&special, &term_bank).unwrap().is_empty());

        let mut active = ActiveSet::new(scheme);
        active.insert(special.clone(), &term_bank);
        assert!(!active.subsumes_clause(&general, &term_bank).unwrap());
        assert_eq!(
            active.subsumed_by(&general, &term_bank).unwrap(),
            vec![special.get_id()]
        );
    }

    #[test]
    fn initial_state_routing() {
        let mut term_bank = TermBank::new();
        let a = term_bank.add_function(fun_info("a", 0, Sort::Individual));
        let b = term_bank.add_function(fun_info("b", 0, Sort::Individual));
        let a = term_bank.mk_const(a);
        let b = term_bank.mk_const(b);

        let goal = Clause::input(vec![Literal::mk_ne(a.clone(), b.clone())]);
        let axiom = Clause::input(vec![Literal::mk_eq(a.clone(), b.clone())]);
        let state = ProofState::new(vec![goal], vec![axiom], 0, &term_bank);
        assert_eq!(state.passive.len(), 1);
        assert_eq!(state.set_of_support.len(), 1);
        assert!(state.active.is_empty());
    }
}
