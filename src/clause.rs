//! ## Clauses
//! This module provides an implementation of superposition literals and CNF clauses as well as
//! sets of clauses. The key exported data structures are:
//! - [Literal] for representing equalities and disequalities
//! - [Clause] for representing disjunctions of literals, tagged with the proof step that
//!   produced them
//! - [ClauseSet] for representing sets of clauses

use std::{
    collections::BTreeMap,
    collections::BTreeSet,
    fmt::Display,
    hash::Hash,
    sync::atomic::{AtomicUsize, Ordering},
};

use crate::{
    multi_set::MultiSet,
    position::LiteralSide,
    proofs::{ProofRule, ProofStep},
    subst::{Substitutable, Substitution},
    term_bank::{Term, TermBank},
};

/// Whether a literal is `=` or `!=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    /// The literal is `=`.
    Eq,
    /// The literal is `!=`.
    Ne,
}

impl Polarity {
    /// Flip the polarity to the other one.
    pub fn negate(&self) -> Polarity {
        match self {
            Polarity::Eq => Polarity::Ne,
            Polarity::Ne => Polarity::Eq,
        }
    }
}

/// A literal represents either an equality or a disequality between two [Term].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    lhs: Term,
    rhs: Term,
    polarity: Polarity,
}

impl Literal {
    /// Create a new literal with `lhs = rhs` or `lhs != rhs` depending on `polarity`. The
    /// literal internally picks a canonical order of the two sides so that literals built from
    /// the same terms compare and hash equal regardless of the orientation they were submitted
    /// in. `get_lhs` consequently does not have to return what was passed as `lhs` here.
    pub fn new(lhs: Term, rhs: Term, polarity: Polarity) -> Self {
        // Terms are perfectly shared, so ordering by the cached structural hash (allocation
        // address as collision tie break) is a valid canonical order of the two sides.
        let key = |t: &Term| (t.hash_code(), t.as_ptr() as usize);
        let (lhs, rhs) = if key(&lhs) <= key(&rhs) {
            (lhs, rhs)
        } else {
            (rhs, lhs)
        };
        Self { lhs, rhs, polarity }
    }

    /// Create a new literal with `lhs = rhs`.
    pub fn mk_eq(lhs: Term, rhs: Term) -> Self {
        Self::new(lhs, rhs, Polarity::Eq)
    }

    /// Create a new literal with `lhs != rhs`.
    pub fn mk_ne(lhs: Term, rhs: Term) -> Self {
        Self::new(lhs, rhs, Polarity::Ne)
    }

    /// Get the left hand side of the literal.
    pub fn get_lhs(&self) -> &Term {
        &self.lhs
    }

    /// Get the right hand side of the literal.
    pub fn get_rhs(&self) -> &Term {
        &self.rhs
    }

    /// Get one side of the literal by name.
    pub fn get_side(&self, side: LiteralSide) -> &Term {
        match side {
            LiteralSide::Left => &self.lhs,
            LiteralSide::Right => &self.rhs,
        }
    }

    /// Get the polarity of the literal.
    pub fn get_pol(&self) -> Polarity {
        self.polarity
    }

    /// Check up to symmetry whether `other` is the negation of `self`.
    pub fn is_negation_of(&self, other: &Self) -> bool {
        self.get_pol() == other.get_pol().negate()
            && self.get_lhs() == other.get_lhs()
            && self.get_rhs() == other.get_rhs()
    }

    /// Check whether the literal is a disequality.
    pub fn is_ne(&self) -> bool {
        self.polarity == Polarity::Ne
    }

    /// Check whether the literal is an equality.
    pub fn is_eq(&self) -> bool {
        self.polarity == Polarity::Eq
    }

    /// Flip the polarity of the literal.
    pub fn negate(self) -> Self {
        Self {
            lhs: self.lhs,
            rhs: self.rhs,
            polarity: self.polarity.negate(),
        }
    }

    /// Compute the default weight of the literal for the clause queue.
    pub fn weight(&self) -> u32 {
        self.lhs.weight() + self.rhs.weight()
    }

    /// Iterator over both symmetries of a literal.
    pub fn symm_term_iter(&self) -> SymmLitIterator<'_> {
        SymmLitIterator { lit: self, idx: 0 }
    }
}

impl Substitutable for Literal {
    /// Apply `subst` to the literal, this is constant time if the substitution is a nop or lhs
    /// and rhs are ground, otherwise the worst case complexity is
    /// `O(dag_size(lhs) + dag_size(rhs))`.
    fn subst_with<S: Substitution>(self, subst: &S, term_bank: &TermBank) -> Self {
        let new_lhs = self.lhs.subst_with(subst, term_bank);
        let new_rhs = self.rhs.subst_with(subst, term_bank);
        Literal::new(new_lhs, new_rhs, self.polarity)
    }
}

/// Iterator over both symmetries of a literal.
pub struct SymmLitIterator<'a> {
    lit: &'a Literal,
    idx: u8,
}

impl<'a> Iterator for SymmLitIterator<'a> {
    type Item = (Term, Term);

    fn next(&mut self) -> Option<Self::Item> {
        match self.idx {
            0 => {
                self.idx += 1;
                Some((self.lit.get_lhs().clone(), self.lit.get_rhs().clone()))
            }
            1 => {
                self.idx += 1;
                Some((self.lit.get_rhs().clone(), self.lit.get_lhs().clone()))
            }
            _ => None,
        }
    }
}

/// A unique identifier for a literal within a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LiteralId(pub(crate) usize);

impl Display for LiteralId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// We want to maintain unique clause identifiers for ease of indexing in a [ClauseSet], this
// counter provides us with these identifiers.
static CLAUSE_ID_COUNT: AtomicUsize = AtomicUsize::new(0);

/// A unique identifier for clauses. Identifiers double as clause age, older clauses have
/// smaller identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClauseId(usize);

impl ClauseId {
    /// The raw index of this identifier, also usable as an age based priority.
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for ClauseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn next_clause_id() -> ClauseId {
    ClauseId(CLAUSE_ID_COUNT.fetch_add(1, Ordering::SeqCst))
}

/// Uniquely identifiable clauses consisting of a multiset of [Literal] plus the proof step
/// that derived them. The identifier is an indexing handle, the semantic identity of a clause
/// is its literal multiset: equality and hashing are order independent and count duplicates.
#[derive(Debug, Clone)]
pub struct Clause {
    id: ClauseId,
    pub(crate) literals: Vec<Literal>,
    step: ProofStep,
}

impl Clause {
    /// Create a new clause containing the literals from `vec`, derived by `step`.
    pub fn new(vec: Vec<Literal>, step: ProofStep) -> Self {
        Self {
            id: next_clause_id(),
            literals: vec,
            step,
        }
    }

    /// Create a new input clause, i.e. one with no parents.
    pub fn input(vec: Vec<Literal>) -> Self {
        Self::new(vec, ProofStep::input())
    }

    /// Get how many literals are in the clause, counting duplicates, this operation is `O(1)`.
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    /// Check if the clause is empty, this operation is `O(1)`.
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Check if the clause is unit, this operation is `O(1)`.
    pub fn is_unit(&self) -> bool {
        self.len() == 1
    }

    /// Get the default clause weight for the clause queue.
    pub fn weight(&self) -> u32 {
        self.literals.iter().map(Literal::weight).sum()
    }

    /// Obtain a literal from the clause by index.
    pub fn get_literal(&self, literal_id: LiteralId) -> Option<&Literal> {
        self.literals.get(literal_id.0)
    }

    /// Obtain the unique identifier of this clause.
    pub fn get_id(&self) -> ClauseId {
        self.id
    }

    /// The proof step that produced this clause.
    pub fn get_step(&self) -> &ProofStep {
        &self.step
    }

    /// Obtain an iterator over the literals in the clause.
    pub fn iter(&self) -> impl Iterator<Item = (LiteralId, &Literal)> {
        self.literals
            .iter()
            .enumerate()
            .map(|(idx, lit)| (LiteralId(idx), lit))
    }

    /// Obtain an iterator over the literals strictly after `id` in the clause.
    pub fn iter_after(&self, id: LiteralId) -> impl Iterator<Item = (LiteralId, &Literal)> {
        self.literals
            .iter()
            .enumerate()
            .skip(id.0 + 1)
            .map(|(idx, lit)| (LiteralId(idx), lit))
    }

    /// The distinct variables occurring anywhere in the clause, in ascending identifier order.
    pub fn distinct_vars(&self) -> BTreeSet<crate::term_bank::VariableIdentifier> {
        let mut set = BTreeSet::new();
        for lit in self.literals.iter() {
            set.extend(lit.get_lhs().distinct_vars());
            set.extend(lit.get_rhs().distinct_vars());
        }
        set
    }

    /// Clone the clause and substitute all of its variables with fresh ones to obtain a clause
    /// with variables distinct from every other clause. Ground clauses are returned as is, any
    /// other clause becomes a new clause recorded as a renaming of this one.
    pub fn fresh_variable_clone(&self, term_bank: &mut TermBank) -> Clause {
        let vars = self.distinct_vars();
        if vars.is_empty() {
            self.clone()
        } else {
            let mut subst = <crate::subst::HashSubstitution as Substitution>::new();
            for old_var in vars {
                subst.insert(old_var, term_bank.mk_replacement_variable(old_var));
            }
            let literals = self
                .literals
                .iter()
                .map(|lit| lit.clone().subst_with(&subst, term_bank))
                .collect();
            Clause::new(
                literals,
                ProofStep::new(ProofRule::Renaming, vec![self.id]),
            )
        }
    }
}

impl PartialEq for Clause {
    /// Clauses are equal iff their literal multisets are equal.
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let lhs: MultiSet<&Literal> = self.literals.iter().collect();
        let rhs: MultiSet<&Literal> = other.literals.iter().collect();
        lhs == rhs
    }
}

impl Eq for Clause {}

impl Hash for Clause {
    /// Hashing matches the multiset equality, i.e. it is order independent.
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        let view: MultiSet<&Literal> = self.literals.iter().collect();
        view.hash(state);
    }
}

/// A set of clauses indexed by unique clause identifiers.
#[derive(Debug, Default)]
pub struct ClauseSet {
    map: BTreeMap<ClauseId, Clause>,
}

impl ClauseSet {
    /// Create an empty clause set.
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    /// Insert a new clause into the set.
    pub fn insert(&mut self, clause: Clause) {
        self.map.insert(clause.id, clause);
    }

    /// Remove a clause from the set by its unique identifier.
    pub fn remove(&mut self, id: ClauseId) -> Option<Clause> {
        self.map.remove(&id)
    }

    /// Get clause by its unique identifier.
    pub fn get_by_id(&self, id: ClauseId) -> Option<&Clause> {
        self.map.get(&id)
    }

    pub fn contains(&self, id: ClauseId) -> bool {
        self.map.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate the clauses in ascending identifier order, i.e. oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.map.values()
    }
}

#[cfg(test)]
mod test {
    use crate::{
        clause::Clause,
        subst::{HashSubstitution, Substitutable, Substitution},
        term_bank::{FunctionInformation, Name, Sort, TermBank, VariableInformation},
    };

    use super::Literal;

    fn var_info(name: &str) -> VariableInformation {
        VariableInformation {
            name: name.to_string(),
            sort: Sort::Individual,
        }
    }

    fn const_info(name: &str) -> FunctionInformation {
        FunctionInformation {
            name: Name::Parsed(name.to_string()),
            arity: 0,
            sort: Sort::Individual,
        }
    }

    #[test]
    fn basic_literal_test() {
        let mut term_bank = TermBank::new();
        let x_id = term_bank.add_variable(var_info("x"));
        let y_id = term_bank.add_variable(var_info("y"));
        let x = term_bank.mk_variable(x_id);
        let y = term_bank.mk_variable(y_id);

        let l1 = Literal::mk_eq(x.clone(), y.clone());
        let mut l2 = Literal::mk_ne(x.clone(), y.clone());

        assert!(l1.is_eq());
        assert!(!l1.is_ne());
        assert!(l2.is_ne());
        assert!(!l2.is_eq());
        assert_ne!(l1, l2);
        assert!(l1.is_negation_of(&l2));

        l2 = l2.negate();
        assert_eq!(l1, l2);
        assert!(l2.is_eq());

        // symmetry of construction
        let l3 = Literal::mk_eq(y.clone(), x.clone());
        assert_eq!(l1, l3);

        let c1_id = term_bank.add_function(const_info("c1"));
        let c2_id = term_bank.add_function(const_info("c2"));
        let c1 = term_bank.mk_const(c1_id);
        let c2 = term_bank.mk_const(c2_id);

        let mut subst = <HashSubstitution as Substitution>::new();
        subst.insert(x_id, c1);
        subst.insert(y_id, c2);
        assert_eq!(
            l1.subst_with(&subst, &term_bank),
            l2.subst_with(&subst, &term_bank)
        );
    }

    #[test]
    fn multiset_clause_identity() {
        let mut term_bank = TermBank::new();
        let a = term_bank.add_function(const_info("a"));
        let b = term_bank.add_function(const_info("b"));
        let a = term_bank.mk_const(a);
        let b = term_bank.mk_const(b);

        let l1 = Literal::mk_eq(a.clone(), b.clone());
        let l2 = Literal::mk_ne(a.clone(), a.clone());

        let c1 = Clause::input(vec![l1.clone(), l2.clone()]);
        let c2 = Clause::input(vec![l2.clone(), l1.clone()]);
        let c3 = Clause::input(vec![l1.clone(), l2.clone(), l2.clone()]);

        // fresh identifiers, equal literal multisets
        assert_ne!(c1.get_id(), c2.get_id());
        assert_eq!(c1, c2);
        // duplicates count
        assert_ne!(c1, c3);
    }

    #[test]
    fn fresh_variable_clone_renames_apart() {
        let mut term_bank = TermBank::new();
        let x_id = term_bank.add_variable(var_info("x"));
        let x = term_bank.mk_variable(x_id);
        let a = term_bank.add_function(const_info("a"));
        let a = term_bank.mk_const(a);

        let clause = Clause::input(vec![Literal::mk_eq(x.clone(), a.clone())]);
        let renamed = clause.fresh_variable_clone(&mut term_bank);
        assert_ne!(clause.get_id(), renamed.get_id());
        assert_ne!(clause, renamed);
        assert!(!renamed.distinct_vars().contains(&x_id));
        assert_eq!(renamed.get_step().parents.as_slice(), &[clause.get_id()]);

        // ground clauses are not renamed
        let ground = Clause::input(vec![Literal::mk_eq(a.clone(), a.clone())]);
        let ground_clone = ground.fresh_variable_clone(&mut term_bank);
        assert_eq!(ground.get_id(), ground_clone.get_id());
    }
}
