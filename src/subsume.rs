//! # Subsumption
//! This module implements the algorithm of Stillman for clause-to-clause subsumption. It is the
//! confirmation step behind the candidate sets produced by the feature vector index from
//! [Simple and Efficient Clause Subsumption with Feature Vector Indexing](https://wwwlehre.dhbw-stuttgart.de/~sschulz/PAPERS/Schulz2013-FVI.pdf).
//! The concrete implementation of the algorithm is based on the implementation in
//! [Zipperposition](https://github.com/sneeuwballen/zipperposition/blob/050072e01d8539f9126993482b595e09f921f66a/src/prover_calculi/superposition.ml#L2737).

use crate::{
    clause::{Clause, Literal},
    subst::{HashSubstitution, Substitution},
    term_bank::TermBank,
};

impl Clause {
    fn subsumes_aux(
        subsuming: &[Literal],
        target: &[Literal],
        unused: Vec<bool>,
        subst: HashSubstitution,
        term_bank: &TermBank,
    ) -> bool {
        let Some(s_lit) = subsuming.first() else {
            return true;
        };

        let target_lits = unused
            .iter()
            .enumerate()
            .filter(|(_, open)| **open)
            .map(|(idx, _)| (idx, &target[idx]))
            .filter(|(_, t_lit)| t_lit.get_pol() == s_lit.get_pol());
        for (t_idx, t_lit) in target_lits {
            // Try both orientations of the subsuming literal against the fixed orientation of
            // the target literal.
            for (s_lhs, s_rhs) in s_lit.symm_term_iter() {
                let subst = subst.clone();
                if let Some(subst) =
                    s_lhs.matching_partial(t_lit.get_lhs(), Some(subst), term_bank)
                {
                    if let Some(subst) =
                        s_rhs.matching_partial(t_lit.get_rhs(), Some(subst), term_bank)
                    {
                        // This target literal is taken now, every subsuming literal needs its
                        // own partner.
                        let mut unused = unused.clone();
                        unused[t_idx] = false;
                        if Clause::subsumes_aux(&subsuming[1..], target, unused, subst, term_bank)
                        {
                            return true;
                        }
                    }
                }
            }
        }
        false
    }

    /// Check whether `self` subsumes `other`, that is whether there is a substitution `subst`
    /// s.t. `subst(self)` is a multiset subset of `other`.
    pub fn subsumes(&self, other: &Self, term_bank: &TermBank) -> bool {
        if self.len() > other.len() {
            return false;
        }
        Clause::subsumes_aux(
            &self.literals,
            &other.literals,
            vec![true; other.len()],
            HashSubstitution::new(),
            term_bank,
        )
    }
}

#[cfg(test)]
mod test {
    use crate::{
        clause::{Clause, Literal},
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
    fn basic_subsumption() {
        let mut term_bank = TermBank::new();
        let p = term_bank.add_function(fun_info("p", 1, Sort::Prop));
        let q = term_bank.add_function(fun_info("q", 1, Sort::Prop));
        let a = term_bank.add_function(fun_info("a", 0, Sort::Individual));
        let b = term_bank.add_function(fun_info("b", 0, Sort::Individual));
        let x = term_bank.mk_fresh_variable(var_info("x"));

        let general = Clause::input(vec![atom(term_bank.mk_app(p, vec![x.clone()]), &term_bank)]);
        let special = Clause::input(vec![
            atom(
                term_bank.mk_app(p, vec![term_bank.mk_const(a)]),
                &term_bank,
            ),
            atom(
                term_bank.mk_app(q, vec![term_bank.mk_const(b)]),
                &term_bank,
            ),
        ]);

        assert!(general.subsumes(&special, &term_bank));
        assert!(!special.subsumes(&general, &term_bank));
        assert!(general.subsumes(&general, &term_bank));
    }

    #[test]
    fn literals_need_distinct_partners() {
        let mut term_bank = TermBank::new();
        let p = term_bank.add_function(fun_info("p", 1, Sort::Prop));
        let q = term_bank.add_function(fun_info("q", 1, Sort::Prop));
        let a = term_bank.add_function(fun_info("a", 0, Sort::Individual));
        let b = term_bank.add_function(fun_info("b", 0, Sort::Individual));
        let x = term_bank.mk_fresh_variable(var_info("x"));
        let y = term_bank.mk_fresh_variable(var_info("y"));

        // p(x) \/ p(y) maps onto two copies of p(a), but the target only contains one
        let doubled = Clause::input(vec![
            atom(term_bank.mk_app(p, vec![x.clone()]), &term_bank),
            atom(term_bank.mk_app(p, vec![y.clone()]), &term_bank),
        ]);
        let target = Clause::input(vec![
            atom(
                term_bank.mk_app(p, vec![term_bank.mk_const(a)]),
                &term_bank,
            ),
            atom(
                term_bank.mk_app(q, vec![term_bank.mk_const(b)]),
                &term_bank,
            ),
        ]);
        assert!(!doubled.subsumes(&target, &term_bank));
    }

    #[test]
    fn variables_bind_consistently() {
        let mut term_bank = TermBank::new();
        let p = term_bank.add_function(fun_info("p", 1, Sort::Prop));
        let q = term_bank.add_function(fun_info("q", 1, Sort::Prop));
        let a = term_bank.add_function(fun_info("a", 0, Sort::Individual));
        let b = term_bank.add_function(fun_info("b", 0, Sort::Individual));
        let x = term_bank.mk_fresh_variable(var_info("x"));

        let linked = Clause::input(vec![
            atom(term_bank.mk_app(p, vec![x.clone()]), &term_bank),
            atom(term_bank.mk_app(q, vec![x.clone()]), &term_bank),
        ]);
        let same = Clause::input(vec![
            atom(
                term_bank.mk_app(p, vec![term_bank.mk_const(a)]),
                &term_bank,
            ),
            atom(
                term_bank.mk_app(q, vec![term_bank.mk_const(a)]),
                &term_bank,
            ),
        ]);
        let different = Clause::input(vec![
            atom(
                term_bank.mk_app(p, vec![term_bank.mk_const(a)]),
                &term_bank,
            ),
            atom(
                term_bank.mk_app(q, vec![term_bank.mk_const(b)]),
                &term_bank,
            ),
        ]);

        assert!(linked.subsumes(&same, &term_bank));
        assert!(!linked.subsumes(&different, &term_bank));
    }

    #[test]
    fn equations_subsume_in_both_orientations() {
        let mut term_bank = TermBank::new();
        let f = term_bank.add_function(fun_info("f", 1, Sort::Individual));
        let a = term_bank.add_function(fun_info("a", 0, Sort::Individual));
        let c = term_bank.add_function(fun_info("c", 0, Sort::Individual));
        let x = term_bank.mk_fresh_variable(var_info("x"));
        let y = term_bank.mk_fresh_variable(var_info("y"));

        let general = Clause::input(vec![Literal::mk_eq(
            term_bank.mk_app(f, vec![x.clone()]),
            y.clone(),
        )]);
        let special = Clause::input(vec![Literal::mk_eq(
            term_bank.mk_const(c),
            term_bank.mk_app(f, vec![term_bank.mk_const(a)]),
        )]);
        assert!(general.subsumes(&special, &term_bank));
    }
}
