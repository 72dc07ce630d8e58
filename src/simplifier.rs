//! ## Clause Simplifier
//! Simplification rules that replace a clause by a smaller equivalent one, as opposed to the
//! generating rules of the calculus which only add clauses:
//! - rule DR removes resolved literals `s != s`
//! - rule DD removes duplicate literals
//! - rewriting (demodulation) replaces instances of the large side of a unit equation by the
//!   instantiated small side, driven by the rewrite index of an [ActiveSet]
//!
//! [cheap_simplify] applies just DR and DD, [forward_simplify] rewrites to a fixpoint first
//! and runs whenever a clause passes an active set on its way through the loop.

use std::cmp::Ordering;

use log::info;
use rustc_hash::FxHashSet;

use crate::{
    clause::{Clause, ClauseId, Literal, Polarity},
    error::EngineError,
    kbo::KboOrd,
    pretty_print::pretty_print,
    proof_state::ActiveSet,
    proofs::{ProofLog, ProofRule, ProofStep},
    subst::Substitutable,
    term_bank::TermBank,
};

struct RuleResult {
    modified: bool,
    clause: Clause,
}

/// Apply the DR and DD rules to `clause`: resolved literals `s != s` and duplicate literals
/// are dropped. Literals hash and compare up to symmetry, so a set catches both orientations
/// of a duplicate. The first occurrence of each literal survives in its original order.
fn rule_dr_dd(clause: Clause, term_bank: &TermBank) -> RuleResult {
    let mut seen: FxHashSet<&Literal> = FxHashSet::default();
    let mut new_literals = Vec::with_capacity(clause.len());
    for (_, literal) in clause.iter() {
        if literal.is_ne() && literal.get_lhs() == literal.get_rhs() {
            continue;
        }
        if !seen.insert(literal) {
            continue;
        }
        new_literals.push(literal.clone());
    }
    if new_literals.len() == clause.len() {
        return RuleResult {
            modified: false,
            clause,
        };
    }
    let new_clause = Clause::new(
        new_literals,
        ProofStep::new(ProofRule::Simplification, vec![clause.get_id()]),
    );
    info!(
        "DR DD simplified {} to {}",
        pretty_print(&clause, term_bank),
        pretty_print(&new_clause, term_bank)
    );
    RuleResult {
        modified: true,
        clause: new_clause,
    }
}

/// One rewrite pass over `literals`: every literal is rewritten at most once with a unit
/// equation from the rewrite indices in `sources`, tried in order. The demodulators that fired
/// are recorded in `used` for provenance. Returns whether anything changed so the caller can
/// drive this to a fixpoint.
fn forward_rewrite_step(
    clause_id: ClauseId,
    literals: &mut [Literal],
    sources: &[&ActiveSet],
    used: &mut Vec<ClauseId>,
    term_bank: &TermBank,
) -> Result<bool, EngineError> {
    let unit_target = literals.len() == 1;
    let mut modified = false;
    for literal in literals.iter_mut() {
        'literal_loop: for (lit_lhs, lit_rhs) in literal.clone().symm_term_iter() {
            for (subterm_pos, subterm) in lit_lhs.subterms() {
                for source in sources {
                    for (_, pos, subst) in source
                        .rewrite_index()
                        .get_generalisations(subterm, term_bank)
                    {
                        let (unit_clause, unit_literal) = pos.resolve(source.clauses())?;
                        // Shared side condition one, u|p = sigma(s), holds by retrieval. Side
                        // condition two: sigma(s) > sigma(t), rewriting has to shrink.
                        let replacement = unit_literal
                            .get_side(pos.side.flip())
                            .clone()
                            .subst_with(&subst, term_bank);
                        if subterm.kbo(&replacement, term_bank) != Some(Ordering::Greater) {
                            continue;
                        }
                        // Positive literals need at least one of these conditions:
                        // - p is not a root position
                        // - the clause is no unit, it never acts as a rewrite rule itself
                        // - u = v is not oriented left to right at this side
                        let valid = match literal.get_pol() {
                            Polarity::Ne => true,
                            Polarity::Eq => {
                                !subterm_pos.is_root()
                                    || !unit_target
                                    || lit_lhs.kbo(&lit_rhs, term_bank) != Some(Ordering::Greater)
                            }
                        };
                        if !valid {
                            continue;
                        }
                        let new_lhs = lit_lhs
                            .replace_at(subterm_pos, &replacement, term_bank)
                            .ok_or(EngineError::PositionOutOfTerm {
                                clause: clause_id,
                                offset: subterm_pos.offset(),
                            })?;
                        info!("rewritten using {}", pretty_print(unit_clause, term_bank));
                        used.push(unit_clause.get_id());
                        *literal = Literal::new(new_lhs, lit_rhs.clone(), literal.get_pol());
                        modified = true;
                        break 'literal_loop;
                    }
                }
            }
        }
    }
    Ok(modified)
}

/// Rewrite `clause` with the unit equations indexed in `sources` until no rule applies any
/// more. Every rewrite strictly shrinks a literal under KBO so this terminates. If anything
/// changed the result is a new clause whose proof step records the original clause and every
/// demodulator that fired.
fn forward_rewrite(
    clause: Clause,
    sources: &[&ActiveSet],
    term_bank: &TermBank,
) -> Result<RuleResult, EngineError> {
    let mut literals: Vec<Literal> = clause.iter().map(|(_, literal)| literal.clone()).collect();
    let mut used = Vec::new();
    let mut modified = false;
    while forward_rewrite_step(clause.get_id(), &mut literals, sources, &mut used, term_bank)? {
        modified = true;
    }
    if !modified {
        return Ok(RuleResult {
            modified: false,
            clause,
        });
    }
    let mut parents = vec![clause.get_id()];
    for id in used {
        if !parents.contains(&id) {
            parents.push(id);
        }
    }
    let new_clause = Clause::new(literals, ProofStep::new(ProofRule::Rewriting, parents));
    info!(
        "rewriting simplified {} to {}",
        pretty_print(&clause, term_bank),
        pretty_print(&new_clause, term_bank)
    );
    Ok(RuleResult {
        modified: true,
        clause: new_clause,
    })
}

/// Drop resolved and duplicate literals. The cheap half of forward simplification, usable on
/// its own when no rewrite source is at hand.
pub fn cheap_simplify(clause: Clause, term_bank: &TermBank) -> Clause {
    rule_dr_dd(clause, term_bank).clause
}

/// Full forward simplification of `clause` against the rewrite indices of `sources`: rewriting
/// to a fixpoint followed by a DR/DD round, since rewriting may have produced fresh resolved or
/// duplicate literals. Both stages derive a clause of their own, so both are recorded in
/// `proof_log` to keep the parent chain closed.
pub fn forward_simplify(
    clause: Clause,
    sources: &[&ActiveSet],
    proof_log: &ProofLog,
    term_bank: &TermBank,
) -> Result<Clause, EngineError> {
    let result = forward_rewrite(clause, sources, term_bank)?;
    if result.modified {
        proof_log.log_clause(&result.clause, term_bank);
    }
    let result = rule_dr_dd(result.clause, term_bank);
    if result.modified {
        proof_log.log_clause(&result.clause, term_bank);
    }
    Ok(result.clause)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        feature_vector::FeatureScheme,
        term_bank::{FunctionInformation, Name, Sort, Term, VariableInformation},
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

    fn unit_source(clause: Clause, term_bank: &TermBank) -> ActiveSet {
        let mut active = ActiveSet::new(FeatureScheme::of_initial_clauses([&clause]));
        active.insert(clause, term_bank);
        active
    }

    #[test]
    fn dr_dd_removes_resolved_and_duplicates() {
        let mut term_bank = TermBank::new();
        let p = term_bank.add_function(fun_info("p", 1, Sort::Prop));
        let a = term_bank.add_function(fun_info("a", 0, Sort::Individual));
        let b = term_bank.add_function(fun_info("b", 0, Sort::Individual));
        let a = term_bank.mk_const(a);
        let b = term_bank.mk_const(b);
        let p_b = term_bank.mk_app(p, vec![b.clone()]);

        let clause = Clause::input(vec![
            Literal::mk_ne(a.clone(), a.clone()),
            atom(p_b.clone(), &term_bank),
            atom(p_b.clone(), &term_bank),
        ]);
        let parent = clause.get_id();
        let simplified = cheap_simplify(clause, &term_bank);
        assert_eq!(simplified.len(), 1);
        assert_eq!(simplified.get_step().rule, ProofRule::Simplification);
        assert_eq!(simplified.get_step().parents, vec![parent]);

        // an already simple clause passes through untouched
        let clause = Clause::input(vec![Literal::mk_ne(a.clone(), b.clone())]);
        let id = clause.get_id();
        assert_eq!(cheap_simplify(clause, &term_bank).get_id(), id);
    }

    #[test]
    fn rewriting_runs_to_fixpoint() {
        let mut term_bank = TermBank::new();
        let p = term_bank.add_function(fun_info("p", 1, Sort::Prop));
        let f = term_bank.add_function(fun_info("f", 1, Sort::Individual));
        let a = term_bank.add_function(fun_info("a", 0, Sort::Individual));
        let x = term_bank.mk_fresh_variable(var_info("x"));
        let a = term_bank.mk_const(a);
        let f_x = term_bank.mk_app(f, vec![x.clone()]);

        // f(x) = x orients left to right
        let rule = Clause::input(vec![Literal::mk_eq(f_x, x.clone())]);
        let rule_id = rule.get_id();
        let source = unit_source(rule, &term_bank);

        let f_f_a = term_bank.mk_app(f, vec![term_bank.mk_app(f, vec![a.clone()])]);
        let clause = Clause::input(vec![atom(term_bank.mk_app(p, vec![f_f_a]), &term_bank)]);
        let parent = clause.get_id();
        let simplified =
            forward_simplify(clause, &[&source], &ProofLog::new(false), &term_bank).unwrap();

        let p_a = term_bank.mk_app(p, vec![a.clone()]);
        assert_eq!(simplified, Clause::input(vec![atom(p_a, &term_bank)]));
        assert_eq!(simplified.get_step().rule, ProofRule::Rewriting);
        assert_eq!(simplified.get_step().parents, vec![parent, rule_id]);
    }

    #[test]
    fn positive_unit_roots_are_protected() {
        let mut term_bank = TermBank::new();
        // precedence: c > e > d
        let d = term_bank.add_function(fun_info("d", 0, Sort::Individual));
        let e = term_bank.add_function(fun_info("e", 0, Sort::Individual));
        let c = term_bank.add_function(fun_info("c", 0, Sort::Individual));
        let f = term_bank.add_function(fun_info("f", 1, Sort::Individual));
        let c = term_bank.mk_const(c);
        let d = term_bank.mk_const(d);
        let e = term_bank.mk_const(e);

        let source = unit_source(
            Clause::input(vec![Literal::mk_eq(c.clone(), e.clone())]),
            &term_bank,
        );

        // c = d is a positive unit with c as its large side, the root must stay put
        let unit = Clause::input(vec![Literal::mk_eq(c.clone(), d.clone())]);
        let id = unit.get_id();
        let untouched =
            forward_simplify(unit, &[&source], &ProofLog::new(false), &term_bank).unwrap();
        assert_eq!(untouched.get_id(), id);

        // below the root the same subterm is fair game
        let f_c = term_bank.mk_app(f, vec![c.clone()]);
        let clause = Clause::input(vec![Literal::mk_eq(f_c, d.clone())]);
        let rewritten =
            forward_simplify(clause, &[&source], &ProofLog::new(false), &term_bank).unwrap();
        let f_e = term_bank.mk_app(f, vec![e.clone()]);
        assert_eq!(
            rewritten,
            Clause::input(vec![Literal::mk_eq(f_e, d.clone())])
        );
    }

    #[test]
    fn rewriting_can_empty_a_clause() {
        let mut term_bank = TermBank::new();
        let f = term_bank.add_function(fun_info("f", 1, Sort::Individual));
        let a = term_bank.add_function(fun_info("a", 0, Sort::Individual));
        let x = term_bank.mk_fresh_variable(var_info("x"));
        let a = term_bank.mk_const(a);
        let f_x = term_bank.mk_app(f, vec![x.clone()]);

        let source = unit_source(
            Clause::input(vec![Literal::mk_eq(f_x, x.clone())]),
            &term_bank,
        );

        let f_a = term_bank.mk_app(f, vec![a.clone()]);
        let clause = Clause::input(vec![Literal::mk_ne(f_a, a.clone())]);
        let simplified =
            forward_simplify(clause, &[&source], &ProofLog::new(false), &term_bank).unwrap();
        assert!(simplified.is_empty());
    }
}
