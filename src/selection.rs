//! ## Literal Selection
//! Literal selection strategies for the generating rules. A selection is a bit set over the
//! literals of a clause: if at least one literal is selected only selected literals are
//! eligible for inferences, otherwise eligibility falls back to maximality. Selecting only
//! negative literals keeps the calculus complete.

use bitvec::bitvec;
use std::cmp::Ordering;

use bitvec::vec::BitVec;

use crate::{
    clause::{Clause, Literal, LiteralId, Polarity},
    kbo::KboOrd,
    term_bank::TermBank,
};

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SelectionStrategy {
    /// Never select a literal
    NoSel,
    /// Select the first negative literal
    FirstNeg,
    /// Based on Zipperposition's max_goal selection function with strict set to false:
    /// select a maximal negative literal and all positive literals
    MaxNeg,
}

fn select_first_neg_lit(clause: &Clause) -> BitVec {
    let mut result = bitvec![0; clause.len()];
    for (lit_id, lit) in clause.iter() {
        if lit.get_pol() == Polarity::Ne {
            result.set(lit_id.0, true);
            break;
        }
    }
    result
}

fn select_max_neg_lit_and_all_pos_lits(clause: &Clause, term_bank: &TermBank) -> BitVec {
    let mut result = bitvec![0; clause.len()];
    let mut max_neg_lit: Option<(LiteralId, &Literal)> = None;
    for (lit_id, lit) in clause.iter() {
        if lit.get_pol() == Polarity::Eq {
            result.set(lit_id.0, true);
        } else if let Some((_, max_lit)) = max_neg_lit {
            if lit.kbo(max_lit, term_bank) == Some(Ordering::Greater) {
                max_neg_lit = Some((lit_id, lit));
            }
        } else {
            max_neg_lit = Some((lit_id, lit));
        }
    }
    if let Some((neg_lit_id, _)) = max_neg_lit {
        result.set(neg_lit_id.0, true);
        result
    } else {
        // without a negative literal nothing is selected and maximality takes over
        bitvec![0; clause.len()]
    }
}

pub fn select_literals(clause: &Clause, strategy: SelectionStrategy, term_bank: &TermBank) -> BitVec {
    match strategy {
        SelectionStrategy::NoSel => bitvec![0; clause.len()],
        SelectionStrategy::FirstNeg => select_first_neg_lit(clause),
        SelectionStrategy::MaxNeg => select_max_neg_lit_and_all_pos_lits(clause, term_bank),
    }
}

#[cfg(test)]
mod test {
    use crate::{
        clause::{Clause, Literal},
        term_bank::{FunctionInformation, Name, Sort, TermBank},
    };

    use super::{SelectionStrategy, select_literals};

    fn fun_info(name: &str, arity: usize) -> FunctionInformation {
        FunctionInformation {
            name: Name::Parsed(name.to_string()),
            arity,
            sort: Sort::Individual,
        }
    }

    #[test]
    fn strategy_bit_sets() {
        let mut term_bank = TermBank::new();
        let a = term_bank.add_function(fun_info("a", 0));
        let b = term_bank.add_function(fun_info("b", 0));
        let c = term_bank.add_function(fun_info("c", 0));
        let f = term_bank.add_function(fun_info("f", 1));
        let a = term_bank.mk_const(a);
        let b = term_bank.mk_const(b);
        let c = term_bank.mk_const(c);
        let f_a = term_bank.mk_app(f, vec![a.clone()]);

        let clause = Clause::input(vec![
            Literal::mk_ne(a.clone(), b.clone()),
            Literal::mk_ne(f_a.clone(), b.clone()),
            Literal::mk_eq(c.clone(), b.clone()),
        ]);

        let none = select_literals(&clause, SelectionStrategy::NoSel, &term_bank);
        assert!(none.not_any());

        let first = select_literals(&clause, SelectionStrategy::FirstNeg, &term_bank);
        assert!(first[0] && !first[1] && !first[2]);

        // f(a) != b is the heavier negative literal
        let max = select_literals(&clause, SelectionStrategy::MaxNeg, &term_bank);
        assert!(!max[0] && max[1] && max[2]);
    }

    #[test]
    fn max_neg_without_negative_literals_selects_nothing() {
        let mut term_bank = TermBank::new();
        let a = term_bank.add_function(fun_info("a", 0));
        let b = term_bank.add_function(fun_info("b", 0));
        let a = term_bank.mk_const(a);
        let b = term_bank.mk_const(b);

        let clause = Clause::input(vec![Literal::mk_eq(a.clone(), b.clone())]);
        let selection = select_literals(&clause, SelectionStrategy::MaxNeg, &term_bank);
        assert!(selection.not_any());
    }
}
