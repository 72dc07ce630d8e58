//! ## Trivial Clause Detection
//! This module contains the implementation of a trivial clause detection algorithm based on
//! ["E – A Brainiac Theorem Prover"](https://wwwlehre.dhbw-stuttgart.de/~sschulz/PAPERS/Schulz-AICOM-2002.pdf)

use log::info;

use crate::{clause::Clause, pretty_print::pretty_print, term_bank::TermBank};

pub fn is_trivial(clause: &Clause, term_bank: &TermBank) -> bool {
    for (l1_id, l1) in clause.iter() {
        // Rule TD1, clauses with a reflexive positive literal are tautologies
        if l1.is_eq() && l1.get_lhs() == l1.get_rhs() {
            info!("TD1 killed: {}", pretty_print(clause, term_bank));
            return true;
        }

        for (_, l2) in clause.iter_after(l1_id) {
            // Rule TD2, clauses with a literal and the negation of that literal are tautologies.
            if l1.is_negation_of(l2) {
                info!("TD2 killed: {}", pretty_print(clause, term_bank));
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod test {
    use crate::{
        clause::{Clause, Literal},
        term_bank::{FunctionInformation, Name, Sort, TermBank, VariableInformation},
    };

    use super::is_trivial;

    fn fun_info(name: &str, arity: usize, sort: Sort) -> FunctionInformation {
        FunctionInformation {
            name: Name::Parsed(name.to_string()),
            arity,
            sort,
        }
    }

    #[test]
    fn detects_td1_and_td2() {
        let mut term_bank = TermBank::new();
        let a = term_bank.add_function(fun_info("a", 0, Sort::Individual));
        let b = term_bank.add_function(fun_info("b", 0, Sort::Individual));
        let p = term_bank.add_function(fun_info("p", 1, Sort::Prop));
        let a = term_bank.mk_const(a);
        let b = term_bank.mk_const(b);
        let x = term_bank.mk_fresh_variable(VariableInformation {
            name: "x".to_string(),
            sort: Sort::Individual,
        });
        let p_x = term_bank.mk_app(p, vec![x.clone()]);

        let reflexive = Clause::input(vec![
            Literal::mk_eq(a.clone(), b.clone()),
            Literal::mk_eq(a.clone(), a.clone()),
        ]);
        assert!(is_trivial(&reflexive, &term_bank));

        let complementary = Clause::input(vec![
            Literal::mk_eq(p_x.clone(), term_bank.mk_true()),
            Literal::mk_ne(p_x.clone(), term_bank.mk_true()),
        ]);
        assert!(is_trivial(&complementary, &term_bank));

        let fine = Clause::input(vec![
            Literal::mk_eq(a.clone(), b.clone()),
            Literal::mk_ne(p_x.clone(), term_bank.mk_true()),
        ]);
        assert!(!is_trivial(&fine, &term_bank));
    }
}
