//! ## First Order Unification
//! This module implements naive rule based first order syntactic unification with occurs
//! check. The key function is [Term::unify]. Variables only ever bind to terms of their own
//! sort, so the predicate encoding sort and the individual sort can not mix.

use log::debug;

use crate::{
    pretty_print::pretty_print,
    subst::{HashSubstitution, Substitutable, Substitution},
    term_bank::{
        Term, TermBank,
        TermNode::{App, Var},
        VariableIdentifier,
    },
};

struct UnificationProblem {
    equations: Vec<(Term, Term)>,
    substitution: HashSubstitution,
}

enum UnificationState {
    Success,
    Failure,
    Next,
}

enum Action {
    Decomposed,
    Clash,
    Bind(VariableIdentifier),
    Orient,
}

impl UnificationProblem {
    fn new(lhs: Term, rhs: Term) -> Self {
        Self {
            equations: vec![(lhs, rhs)],
            substitution: HashSubstitution::new(),
        }
    }

    fn step(&mut self, term_bank: &TermBank) -> UnificationState {
        let Some((lhs, rhs)) = self.equations.pop() else {
            return UnificationState::Success;
        };

        // t = t, E => E. Perfect sharing makes this a pointer comparison, it also disposes of
        // the x = x case before the occurs check below can see it.
        if lhs == rhs {
            return UnificationState::Next;
        }

        let action = match (&*lhs, &*rhs) {
            (App { id: f, args: f_args, .. }, App { id: g, args: g_args, .. }) => {
                if f == g {
                    // f(s_1, ..., s_n) = f(t_1, ..., t_n), E => s_1 = t_1, ..., s_n = t_n, E
                    for (s, t) in f_args.iter().zip(g_args.iter()) {
                        self.equations.push((s.clone(), t.clone()));
                    }
                    Action::Decomposed
                } else {
                    // f(...) = g(...), E => bot if f != g
                    Action::Clash
                }
            }
            (Var { id, .. }, _) => Action::Bind(*id),
            // t = x, E => x = t, E
            (App { .. }, Var { .. }) => Action::Orient,
        };

        match action {
            Action::Decomposed => UnificationState::Next,
            Action::Clash => UnificationState::Failure,
            Action::Orient => {
                self.equations.push((rhs, lhs));
                UnificationState::Next
            }
            Action::Bind(var_id) => {
                if rhs.occurs(var_id) {
                    // x = t, E => bot if x != t and x in var(t)
                    UnificationState::Failure
                } else if term_bank.get_variable_info(var_id).sort != rhs.sort(term_bank) {
                    UnificationState::Failure
                } else {
                    // x = t, E => E { x |-> t } if x not in var(t)
                    let mut binding = HashSubstitution::new();
                    binding.insert(var_id, rhs.clone());
                    self.equations = self
                        .equations
                        .iter()
                        .map(|(lhs, rhs)| {
                            (
                                lhs.clone().subst_with(&binding, term_bank),
                                rhs.clone().subst_with(&binding, term_bank),
                            )
                        })
                        .collect();
                    self.substitution.compose_binding(var_id, rhs, term_bank);
                    UnificationState::Next
                }
            }
        }
    }

    fn run(mut self, term_bank: &TermBank) -> Option<HashSubstitution> {
        loop {
            match self.step(term_bank) {
                UnificationState::Success => return Some(self.substitution),
                UnificationState::Failure => return None,
                UnificationState::Next => continue,
            }
        }
    }
}

impl Term {
    /// Try to unify `self` and `other`, returning `Some(mgu)` on success and `None` otherwise.
    /// If both `self` and `other` are ground this operation is `O(1)`, otherwise potentially
    /// expensive.
    pub fn unify(&self, other: &Self, term_bank: &TermBank) -> Option<HashSubstitution> {
        debug!(
            "unifying {} with {}",
            pretty_print(self, term_bank),
            pretty_print(other, term_bank),
        );

        let res = if self.is_ground() && other.is_ground() {
            if self == other {
                Some(HashSubstitution::new())
            } else {
                None
            }
        } else {
            let problem = UnificationProblem::new(self.clone(), other.clone());
            problem.run(term_bank)
        };
        debug!("unification success? {}", res.is_some());
        res
    }
}

#[cfg(test)]
mod test {
    use crate::{
        subst::Substitutable,
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
    fn binds_both_sides() {
        let mut term_bank = TermBank::new();
        let f = term_bank.add_function(fun_info("f", 1));
        let g = term_bank.add_function(fun_info("g", 2));
        let b = term_bank.add_function(fun_info("b", 0));
        let x = term_bank.mk_fresh_variable(var_info("x"));
        let y = term_bank.mk_fresh_variable(var_info("y"));

        // g(x, f(x)) = g(b, y) has mgu { x |-> b, y |-> f(b) }
        let lhs = term_bank.mk_app(g, vec![x.clone(), term_bank.mk_app(f, vec![x.clone()])]);
        let rhs = term_bank.mk_app(g, vec![term_bank.mk_const(b), y.clone()]);
        let subst = lhs.unify(&rhs, &term_bank);
        assert!(subst.is_some());
        let subst = subst.unwrap();
        assert_eq!(
            lhs.subst_with(&subst, &term_bank),
            rhs.subst_with(&subst, &term_bank)
        );
    }

    #[test]
    fn chained_bindings() {
        let mut term_bank = TermBank::new();
        let f = term_bank.add_function(fun_info("f", 2));
        let g = term_bank.add_function(fun_info("g", 3));
        let a = term_bank.add_function(fun_info("a", 0));
        let a = term_bank.mk_const(a);
        let x = term_bank.mk_fresh_variable(var_info("x"));
        let y = term_bank.mk_fresh_variable(var_info("y"));
        let z = term_bank.mk_fresh_variable(var_info("z"));

        // g(x, y, z) = g(f(y, y), f(z, z), f(a, a)) resolves through two binding chains
        let lhs = term_bank.mk_app(g, vec![x.clone(), y.clone(), z.clone()]);
        let rhs = term_bank.mk_app(
            g,
            vec![
                term_bank.mk_app(f, vec![y.clone(), y.clone()]),
                term_bank.mk_app(f, vec![z.clone(), z.clone()]),
                term_bank.mk_app(f, vec![a.clone(), a.clone()]),
            ],
        );
        let subst = lhs.unify(&rhs, &term_bank);
        assert!(subst.is_some());
        let subst = subst.unwrap();
        assert_eq!(
            lhs.subst_with(&subst, &term_bank),
            rhs.subst_with(&subst, &term_bank)
        );
    }

    #[test]
    fn occurs_check() {
        let mut term_bank = TermBank::new();
        let f = term_bank.add_function(fun_info("f", 1));
        let x = term_bank.mk_fresh_variable(var_info("x"));
        let f_x = term_bank.mk_app(f, vec![x.clone()]);
        assert!(x.unify(&f_x, &term_bank).is_none());
        assert!(f_x.unify(&x, &term_bank).is_none());
        // x = x on the other hand is fine
        assert!(x.unify(&x, &term_bank).is_some());
    }

    #[test]
    fn sort_clash() {
        let mut term_bank = TermBank::new();
        let p = term_bank.add_function(FunctionInformation {
            name: Name::Parsed("p".to_string()),
            arity: 1,
            sort: Sort::Prop,
        });
        let a = term_bank.add_function(fun_info("a", 0));
        let a = term_bank.mk_const(a);
        let x = term_bank.mk_fresh_variable(var_info("x"));

        // an individual variable must not swallow a predicate atom
        let atom = term_bank.mk_app(p, vec![a.clone()]);
        assert!(x.unify(&atom, &term_bank).is_none());
        assert!(atom.unify(&x, &term_bank).is_none());
        // but it happily takes the atom's argument
        assert!(x.unify(&a, &term_bank).is_some());
    }
}
