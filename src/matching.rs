//! # Matching
//! This module contains an implementation of a naive matching algorithm to determine a
//! substitution `sigma` s.t. `sigma(s) = t`. The implementation is based on [PyRes](https://github.com/eprover/PyRes/blob/master/matching.py).
//! As in unification, variables only match terms of their own sort.

use crate::{
    subst::{HashSubstitution, Substitution},
    term_bank::{Term, TermBank, TermNode},
};

impl Term {
    /// Attempt to compute a substitution `sigma` s.t. `sigma(self) = other` where `sigma`
    /// strictly extends the already provided `subst` (if it was provided).
    pub fn matching_partial<S: Substitution>(
        &self,
        other: &Self,
        subst: Option<S>,
        term_bank: &TermBank,
    ) -> Option<S> {
        let mut subst = subst.unwrap_or_else(S::new);
        let mut matcher_list = vec![self];
        let mut target_list = vec![other];
        while let Some(matcher) = matcher_list.pop() {
            let target = target_list.pop()?;

            match (&**matcher, &**target) {
                (TermNode::Var { id, .. }, _) => match subst.get(*id) {
                    Some(matcher_value) => {
                        if &matcher_value != target {
                            return None;
                        }
                    }
                    None => {
                        if term_bank.get_variable_info(*id).sort != target.sort(term_bank) {
                            return None;
                        }
                        subst.insert(*id, target.clone());
                    }
                },
                (TermNode::App { .. }, TermNode::Var { .. }) => {
                    return None;
                }
                (
                    TermNode::App {
                        id: m_id,
                        args: m_args,
                        ..
                    },
                    TermNode::App {
                        id: t_id,
                        args: t_args,
                        ..
                    },
                ) => {
                    if t_id != m_id {
                        return None;
                    }

                    matcher_list.extend(m_args.iter());
                    target_list.extend(t_args.iter());
                }
            }
        }
        Some(subst)
    }

    /// Attempt to compute a substitution `sigma` s.t. `sigma(self) = other`.
    pub fn matching(&self, other: &Self, term_bank: &TermBank) -> Option<HashSubstitution> {
        self.matching_partial(other, None, term_bank)
    }
}
