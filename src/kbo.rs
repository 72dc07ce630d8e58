//! ## Knuth Bendix Order
//! This module contains the naive implementation of Knuth Bendix Order (KBO) from
//! ["Things to Know When Implementing KBO"](https://link.springer.com/content/pdf/10.1007/s10817-006-9031-4.pdf).
//! It is additionally informed by ["E – A Brainiac Theorem Prover"](https://wwwlehre.dhbw-stuttgart.de/~sschulz/PAPERS/Schulz-AICOM-2002.pdf),
//! in particular we draw:
//! - `mu = 1`, which makes the term weight coincide with the node count every term caches
//!   anyway, so weight lookups are constant time
//! - the precedence between function symbols which works in two steps:
//!   1. If a function has higher arity than another one it wins
//!   2. If the functions have the same arity choose arbitrarily, here we choose to compare by
//!      the index in the term bank.
//!
//! The key type exposed is [KboOrd] together with its implementation for terms and literals.

use std::cmp::Ordering;

use rustc_hash::FxHashMap;

use crate::{
    clause::{Literal, Polarity},
    term_bank::{FunctionIdentifier, Term, TermBank, TermNode},
};

struct KboComparator<'a> {
    term_bank: &'a TermBank,
}

impl<'a> KboComparator<'a> {
    /// KBO admissibility of `lhs > rhs` requires every variable to occur at least as often in
    /// `lhs` as in `rhs`. Both variable multisets are cached as sorted slices, so a merge walk
    /// suffices.
    fn var_check(&self, lhs: &Term, rhs: &Term) -> bool {
        let lhs_vars = lhs.vars();
        let rhs_vars = rhs.vars();
        if lhs_vars.len() < rhs_vars.len() {
            return false;
        }
        let mut lhs_iter = lhs_vars.iter().peekable();
        for rhs_var in rhs_vars {
            loop {
                match lhs_iter.peek() {
                    Some(lhs_var) if *lhs_var < rhs_var => {
                        lhs_iter.next();
                    }
                    Some(lhs_var) if *lhs_var == rhs_var => {
                        lhs_iter.next();
                        break;
                    }
                    _ => return false,
                }
            }
        }
        true
    }

    // Return true iff lhs has precedence over rhs
    fn function_precedence(&self, lhs: FunctionIdentifier, rhs: FunctionIdentifier) -> bool {
        let lhs_info = self.term_bank.get_function_info(lhs);
        let rhs_info = self.term_bank.get_function_info(rhs);
        match lhs_info.arity.cmp(&rhs_info.arity) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => lhs > rhs,
        }
    }

    fn kbolex(&self, ss: &[Term], ts: &[Term]) -> bool {
        debug_assert_eq!(ss.len(), ts.len());
        for (s, t) in ss.iter().zip(ts.iter()) {
            if s != t {
                return self.kbo_gt(s, t);
            }
        }
        false
    }

    fn kbo_gt(&self, lhs: &Term, rhs: &Term) -> bool {
        match (&**lhs, &**rhs) {
            (
                TermNode::App {
                    id: f, args: ss, ..
                },
                TermNode::App {
                    id: g, args: ts, ..
                },
            ) => {
                if self.var_check(lhs, rhs) {
                    match lhs.weight().cmp(&rhs.weight()) {
                        Ordering::Greater => true,
                        Ordering::Equal => {
                            self.function_precedence(*f, *g) || (f == g && self.kbolex(ss, ts))
                        }
                        Ordering::Less => false,
                    }
                } else {
                    false
                }
            }
            // t > x iff x in var(t)
            (TermNode::App { .. }, TermNode::Var { id: var_id, .. }) => lhs.occurs(*var_id),
            (TermNode::Var { .. }, _) => false,
        }
    }

    fn kbo(lhs: &Term, rhs: &Term, term_bank: &'a TermBank) -> bool {
        let cmp = Self { term_bank };
        cmp.kbo_gt(lhs, rhs)
    }
}

pub trait KboOrd {
    fn kbo(&self, other: &Self, term_bank: &TermBank) -> Option<Ordering>;
}

impl KboOrd for Term {
    fn kbo(&self, other: &Self, term_bank: &TermBank) -> Option<Ordering> {
        if self == other {
            Some(Ordering::Equal)
        } else if KboComparator::kbo(self, other, term_bank) {
            Some(Ordering::Greater)
        } else if KboComparator::kbo(other, self, term_bank) {
            Some(Ordering::Less)
        } else {
            None
        }
    }
}

fn literal_to_multiset(lit: &Literal) -> FxHashMap<&Term, usize> {
    // l = r becomes {l, r}, l != r becomes {l, l, r, r}. Summing the contributions keeps the
    // counts right for literals whose two sides are the same term.
    let bump = match lit.get_pol() {
        Polarity::Eq => 1,
        Polarity::Ne => 2,
    };
    let mut multiset = FxHashMap::default();
    *multiset.entry(lit.get_lhs()).or_insert(0) += bump;
    *multiset.entry(lit.get_rhs()).or_insert(0) += bump;
    multiset
}

// precondition lhs != rhs
fn multiset_gt(
    lhs: &FxHashMap<&Term, usize>,
    rhs: &FxHashMap<&Term, usize>,
    term_bank: &TermBank,
) -> bool {
    // ∀ m ∈ M, rhs(m) > lhs(m)
    let iter = rhs
        .iter()
        .filter(|(elem, count_r)| **count_r > *lhs.get(*elem).unwrap_or(&0));
    for (m, _) in iter {
        // ∃ m_alt ∈ M, lhs(m_alt) > rhs(m_alt) ∧ m_alt > m
        let larger = lhs.iter().find(|(m_alt, count_l)| {
            **count_l > *rhs.get(*m_alt).unwrap_or(&0)
                && m_alt.kbo(m, term_bank) == Some(Ordering::Greater)
        });
        if larger.is_none() {
            return false;
        }
    }
    true
}

impl KboOrd for Literal {
    fn kbo(&self, other: &Self, term_bank: &TermBank) -> Option<Ordering> {
        if self == other {
            Some(Ordering::Equal)
        } else {
            let lhs_set = literal_to_multiset(self);
            let rhs_set = literal_to_multiset(other);
            if multiset_gt(&lhs_set, &rhs_set, term_bank) {
                Some(Ordering::Greater)
            } else if multiset_gt(&rhs_set, &lhs_set, term_bank) {
                Some(Ordering::Less)
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::{cmp::Ordering, vec};

    use crate::{
        clause::Literal,
        kbo::KboOrd,
        term_bank::{FunctionInformation, Name, Sort, TermBank, VariableInformation},
    };

    fn fun_info(name: &str, arity: usize) -> FunctionInformation {
        FunctionInformation {
            name: Name::Parsed(name.to_string()),
            arity,
            sort: Sort::Individual,
        }
    }

    fn var_info(name: &str) -> VariableInformation {
        VariableInformation {
            name: name.to_string(),
            sort: Sort::Individual,
        }
    }

    #[test]
    fn basic_kbo_test() {
        let mut term_bank = TermBank::new();
        let b = term_bank.add_function(fun_info("b", 0));
        let c = term_bank.add_function(fun_info("c", 0));
        let g = term_bank.add_function(fun_info("g", 2));
        let f = term_bank.add_function(fun_info("f", 1));
        let h = term_bank.add_function(fun_info("h", 1));
        // this creation order ensures: g > h > f as function precedence

        let x = term_bank.mk_fresh_variable(var_info("x"));
        let y = term_bank.mk_fresh_variable(var_info("y"));

        let t1 = term_bank.mk_app(
            g,
            vec![
                term_bank.mk_app(h, vec![x.clone()]),
                term_bank.mk_app(h, vec![term_bank.mk_const(c)]),
            ],
        );
        let t2 = term_bank.mk_app(g, vec![x.clone(), x.clone()]);
        let t3 = term_bank.mk_app(
            g,
            vec![term_bank.mk_const(b), term_bank.mk_app(f, vec![x.clone()])],
        );
        let t4 = term_bank.mk_app(f, vec![term_bank.mk_app(g, vec![x.clone(), y.clone()])]);
        let t5 = term_bank.mk_app(
            h,
            vec![term_bank.mk_app(g, vec![x.clone(), term_bank.mk_const(c)])],
        );

        assert_eq!(t1.kbo(&t1, &term_bank), Some(Ordering::Equal));
        assert_eq!(t1.kbo(&t2, &term_bank), None);
        assert_eq!(t1.kbo(&t3, &term_bank), Some(Ordering::Greater));
        assert_eq!(t1.kbo(&t4, &term_bank), None);
        assert_eq!(t1.kbo(&t5, &term_bank), Some(Ordering::Greater));

        assert_eq!(t2.kbo(&t1, &term_bank), None);
        assert_eq!(t2.kbo(&t2, &term_bank), Some(Ordering::Equal));
        assert_eq!(t2.kbo(&t3, &term_bank), None);
        assert_eq!(t2.kbo(&t4, &term_bank), None);
        assert_eq!(t2.kbo(&t5, &term_bank), None);

        assert_eq!(t3.kbo(&t1, &term_bank), Some(Ordering::Less));
        assert_eq!(t3.kbo(&t2, &term_bank), None);
        assert_eq!(t3.kbo(&t3, &term_bank), Some(Ordering::Equal));
        assert_eq!(t3.kbo(&t4, &term_bank), None);
        assert_eq!(t3.kbo(&t5, &term_bank), Some(Ordering::Greater));

        assert_eq!(t4.kbo(&t1, &term_bank), None);
        assert_eq!(t4.kbo(&t2, &term_bank), None);
        assert_eq!(t4.kbo(&t3, &term_bank), None);
        assert_eq!(t4.kbo(&t4, &term_bank), Some(Ordering::Equal));
        assert_eq!(t4.kbo(&t5, &term_bank), None);

        assert_eq!(t5.kbo(&t1, &term_bank), Some(Ordering::Less));
        assert_eq!(t5.kbo(&t2, &term_bank), None);
        assert_eq!(t5.kbo(&t3, &term_bank), Some(Ordering::Less));
        assert_eq!(t5.kbo(&t4, &term_bank), None);
        assert_eq!(t5.kbo(&t5, &term_bank), Some(Ordering::Equal));

        assert_eq!(x.kbo(&y, &term_bank), None);
        assert_eq!(t1.kbo(&y, &term_bank), None);
        assert_eq!(t1.kbo(&x, &term_bank), Some(Ordering::Greater));
        assert_eq!(x.kbo(&t1, &term_bank), Some(Ordering::Less));
        assert_eq!(y.kbo(&t1, &term_bank), None);
    }

    #[test]
    fn literal_ordering() {
        let mut term_bank = TermBank::new();
        let a = term_bank.add_function(fun_info("a", 0));
        let b = term_bank.add_function(fun_info("b", 0));
        let f = term_bank.add_function(fun_info("f", 1));
        let a = term_bank.mk_const(a);
        let b = term_bank.mk_const(b);
        let f_a = term_bank.mk_app(f, vec![a.clone()]);

        // a negative literal dominates the positive literal on the same terms
        let pos = Literal::mk_eq(a.clone(), b.clone());
        let neg = Literal::mk_ne(a.clone(), b.clone());
        assert_eq!(neg.kbo(&pos, &term_bank), Some(Ordering::Greater));
        assert_eq!(pos.kbo(&neg, &term_bank), Some(Ordering::Less));

        // bigger terms dominate
        let small = Literal::mk_eq(a.clone(), b.clone());
        let large = Literal::mk_eq(f_a.clone(), b.clone());
        assert_eq!(large.kbo(&small, &term_bank), Some(Ordering::Greater));

        // equal literals are equal regardless of construction orientation
        let flipped = Literal::mk_eq(b.clone(), a.clone());
        assert_eq!(small.kbo(&flipped, &term_bank), Some(Ordering::Equal));
    }
}
