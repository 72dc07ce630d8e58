//! ## Saturation
//! The given clause procedure on top of the superposition calculus: the generating rules
//! behind the [GeneratingRule] trait, forward and backward simplification against the active
//! sets and the resource limited driver [Saturation].

use std::{
    cmp::Ordering,
    time::{Duration, Instant},
};

use log::{debug, error, info};
use memory_stats::memory_stats;
use rustc_hash::FxHashSet;

use crate::{
    clause::{Clause, ClauseId, Literal, LiteralId, Polarity},
    error::EngineError,
    feature_vector::FeatureScheme,
    kbo::KboOrd,
    position::{ClauseSetPosition, LiteralSide, TermPosition},
    pretty_print::pretty_print,
    proof_state::{ActiveSet, ProofState},
    proofs::{ProofLog, ProofRule, ProofStep},
    selection::{SelectionStrategy, select_literals},
    simplifier::forward_simplify,
    subst::{HashSubstitution, Substitutable},
    term_bank::{Term, TermBank},
    trivial::is_trivial,
};

/// Strategy knobs of a saturation run.
#[derive(Debug, Clone, Copy)]
pub struct SaturationConfig {
    pub selection: SelectionStrategy,
    /// Every `age_weight_ratio + 1`-th given clause is picked by age instead of weight, `0`
    /// picks purely by weight.
    pub age_weight_ratio: u32,
    /// Whether to record every derived clause in the proof log.
    pub log_proof: bool,
}

impl Default for SaturationConfig {
    fn default() -> Self {
        SaturationConfig {
            selection: SelectionStrategy::MaxNeg,
            age_weight_ratio: 4,
            log_proof: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceLimitConfig {
    pub duration: Option<Duration>,
    pub memory_limit: Option<usize>,
    pub max_iterations: Option<u64>,
}

impl Default for ResourceLimitConfig {
    fn default() -> Self {
        ResourceLimitConfig {
            duration: None,
            memory_limit: None,
            max_iterations: None,
        }
    }
}

struct ResourceLimits {
    deadline: Option<Instant>,
    memory_limit: Option<usize>,
    max_iterations: Option<u64>,
}

impl ResourceLimits {
    fn of_config(config: &ResourceLimitConfig) -> Self {
        let deadline = config.duration.map(|dur| Instant::now() + dur);
        ResourceLimits {
            deadline,
            memory_limit: config.memory_limit,
            max_iterations: config.max_iterations,
        }
    }
}

/// Which resource ran out when a run stops undecided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitReason {
    Time,
    Memory,
    Iterations,
}

/// The outcome of a saturation run. [SaturationResult::Timeout] leaves the proof state intact,
/// calling [Saturation::run] again continues the search under fresh limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaturationResult {
    /// The empty clause was derived, the input clause set is unsatisfiable.
    Unsat(Clause),
    /// The passive set ran dry without deriving the empty clause, the input clause set is
    /// satisfiable.
    Sat,
    /// A resource limit was hit before the search concluded.
    Timeout(LimitReason),
    /// An internal invariant broke, see [EngineError].
    Error(EngineError),
}

/// One clause set the given clause is superposed against. Set of support partners are
/// `unordered`: their premises skip literal eligibility so no inference with the goal side is
/// lost to the ordering.
pub struct Partner<'a> {
    pub set: &'a ActiveSet,
    pub unordered: bool,
}

/// Everything a generating rule may consult while working on a given clause.
pub struct GenerationContext<'a> {
    pub partners: Vec<Partner<'a>>,
    pub selection: SelectionStrategy,
    pub term_bank: &'a TermBank,
}

/// A generating inference rule of the calculus. Implementations derive new clauses from the
/// given clause and the partner sets, they never remove anything.
pub trait GeneratingRule {
    fn rule(&self) -> ProofRule;

    fn generate(
        &self,
        given: &Clause,
        ctx: &GenerationContext<'_>,
        acc: &mut Vec<Clause>,
    ) -> Result<(), EngineError>;
}

/// The rule set of the superposition calculus.
pub fn default_rules() -> Vec<Box<dyn GeneratingRule>> {
    vec![
        Box::new(EqualityResolutionRule),
        Box::new(EqualityFactoringRule),
        Box::new(SuperpositionRule),
    ]
}

fn ordering_check(
    clause: &Clause,
    check_lit_id: LiteralId,
    subst: &HashSubstitution,
    f: impl Fn(Option<Ordering>) -> bool,
    term_bank: &TermBank,
) -> Option<Vec<Literal>> {
    let mut new_literals = Vec::with_capacity(clause.len());
    let check_lit = clause
        .get_literal(check_lit_id)?
        .clone()
        .subst_with(subst, term_bank);
    let ok = clause
        .iter()
        .filter(|(other_lit_id, _)| check_lit_id != *other_lit_id)
        .all(|(_, other_lit)| {
            let other_lit = other_lit.clone().subst_with(subst, term_bank);
            if f(check_lit.kbo(&other_lit, term_bank)) {
                new_literals.push(other_lit);
                true
            } else {
                // abort: we are not maximal
                false
            }
        });
    if ok { Some(new_literals) } else { None }
}

/*
Takes a `clause` and an index `check_lit_id` to some literal `check_lit` in `clause` together
with a substitution `subst`. Then checks whether `subst(check_lit)` is maximal in `subst(clause)`.

Returns `None` if maximality check fails, otherwise `Some(subst(clause) \ subst(check_lit))`
*/
fn maximality_check(
    clause: &Clause,
    check_lit_id: LiteralId,
    subst: &HashSubstitution,
    term_bank: &TermBank,
) -> Option<Vec<Literal>> {
    ordering_check(
        clause,
        check_lit_id,
        subst,
        |ord| ord != Some(Ordering::Less),
        term_bank,
    )
}

/*
Takes a `clause` and an index `check_lit_id` to some literal `check_lit` in `clause` together
with a substitution `subst`. Then checks whether `subst(check_lit)` is strictly maximal in
`subst(clause)`.

Returns `None` if maximality check fails, otherwise `Some(subst(clause) \ subst(check_lit))`
*/
fn strict_maximality_check(
    clause: &Clause,
    check_lit_id: LiteralId,
    subst: &HashSubstitution,
    term_bank: &TermBank,
) -> Option<Vec<Literal>> {
    ordering_check(
        clause,
        check_lit_id,
        subst,
        |ord| ord != Some(Ordering::Less) && ord != Some(Ordering::Equal),
        term_bank,
    )
}

fn remainder_literals(
    clause: &Clause,
    skip_lit_id: LiteralId,
    subst: &HashSubstitution,
    term_bank: &TermBank,
) -> Vec<Literal> {
    clause
        .iter()
        .filter(|(other_lit_id, _)| *other_lit_id != skip_lit_id)
        .map(|(_, lit)| lit.clone().subst_with(subst, term_bank))
        .collect()
}

/// Eligibility of the literal at `lit_id` for a generating inference: if the selection
/// strategy selects anything in the clause only selected literals are eligible and the
/// ordering is waived, otherwise the literal has to be (strictly) maximal under `subst`.
///
/// Returns the substituted remainder of the clause on success, like the maximality checks.
fn eligible_remainder(
    clause: &Clause,
    lit_id: LiteralId,
    subst: &HashSubstitution,
    selection: SelectionStrategy,
    strict: bool,
    term_bank: &TermBank,
) -> Option<Vec<Literal>> {
    let selected = select_literals(clause, selection, term_bank);
    if selected.any() {
        if selected[lit_id.0] {
            Some(remainder_literals(clause, lit_id, subst, term_bank))
        } else {
            None
        }
    } else if strict {
        strict_maximality_check(clause, lit_id, subst, term_bank)
    } else {
        maximality_check(clause, lit_id, subst, term_bank)
    }
}

pub struct EqualityResolutionRule;

impl GeneratingRule for EqualityResolutionRule {
    fn rule(&self) -> ProofRule {
        ProofRule::EqualityResolution
    }

    fn generate(
        &self,
        given: &Clause,
        ctx: &GenerationContext<'_>,
        acc: &mut Vec<Clause>,
    ) -> Result<(), EngineError> {
        let term_bank = ctx.term_bank;
        info!("ERes working clause: {}", pretty_print(given, term_bank));
        for (literal_id, literal) in given.iter() {
            // Condition: the literal must be an inequality
            if literal.is_eq() {
                continue;
            }

            // Condition 1: the lhs and rhs of the literal must unify
            if let Some(subst) = literal.get_lhs().unify(literal.get_rhs(), term_bank) {
                // Condition 2: the literal must be eligible in the clause with the mgu applied
                if let Some(new_literals) =
                    eligible_remainder(given, literal_id, &subst, ctx.selection, false, term_bank)
                {
                    let new_clause = Clause::new(
                        new_literals,
                        ProofStep::new(ProofRule::EqualityResolution, vec![given.get_id()]),
                    );
                    info!(
                        "ERes derived clause: {}",
                        pretty_print(&new_clause, term_bank)
                    );
                    acc.push(new_clause);
                }
            }
        }
        Ok(())
    }
}

pub struct EqualityFactoringRule;

impl GeneratingRule for EqualityFactoringRule {
    fn rule(&self) -> ProofRule {
        ProofRule::EqualityFactoring
    }

    fn generate(
        &self,
        given: &Clause,
        ctx: &GenerationContext<'_>,
        acc: &mut Vec<Clause>,
    ) -> Result<(), EngineError> {
        let term_bank = ctx.term_bank;
        info!("EFact working clause: {}", pretty_print(given, term_bank));
        for (literal1_id, lit1) in given.iter() {
            // Condition: literal 1 must be an equality
            if lit1.is_ne() {
                continue;
            }
            for (literal2_id, lit2) in given.iter() {
                // Condition: literal 2 must be an equality distinct from literal 1
                if lit2.is_ne() || literal2_id == literal1_id {
                    continue;
                }
                for (l1_lhs, l1_rhs) in lit1.symm_term_iter() {
                    for (l2_lhs, l2_rhs) in lit2.symm_term_iter() {
                        // Condition 1: the lhs of both literals must unify
                        if let Some(subst) = l1_lhs.unify(&l2_lhs, term_bank) {
                            let ord = l1_rhs
                                .clone()
                                .subst_with(&subst, term_bank)
                                .kbo(&l1_lhs.clone().subst_with(&subst, term_bank), term_bank);
                            // Condition 2: after applying the mgu the rhs must not be <= the lhs
                            if ord == Some(Ordering::Equal) || ord == Some(Ordering::Less) {
                                continue;
                            }

                            // Condition 3: literal 1 must be eligible in the clause with the
                            // mgu applied
                            if let Some(mut new_literals) = eligible_remainder(
                                given,
                                literal1_id,
                                &subst,
                                ctx.selection,
                                false,
                                term_bank,
                            ) {
                                let final_lit = Literal::mk_ne(
                                    l1_rhs.clone().subst_with(&subst, term_bank),
                                    l2_rhs.clone().subst_with(&subst, term_bank),
                                );
                                new_literals.push(final_lit);
                                let new_clause = Clause::new(
                                    new_literals,
                                    ProofStep::new(
                                        ProofRule::EqualityFactoring,
                                        vec![given.get_id()],
                                    ),
                                );
                                info!(
                                    "EFact derived clause: {}",
                                    pretty_print(&new_clause, term_bank)
                                );
                                acc.push(new_clause);
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// One premise of a superposition inference: the literal at `lit_id` of `clause`, read in the
/// orientation `lhs (=|!=) rhs`. `unordered` premises skip their eligibility check.
struct SpPremise<'a> {
    clause: &'a Clause,
    lit_id: LiteralId,
    pol: Polarity,
    lhs: Term,
    rhs: Term,
    unordered: bool,
}

fn resolve_partner<'a>(
    set: &'a ActiveSet,
    pos: &ClauseSetPosition,
) -> Result<(&'a Clause, &'a Literal), EngineError> {
    let clause = set
        .clauses()
        .get_by_id(pos.clause_id)
        .ok_or(EngineError::ClauseNotFound {
            id: pos.clause_id,
            context: "resolving a superposition partner",
        })?;
    let literal = clause
        .get_literal(pos.clause_pos.literal_id)
        .ok_or(EngineError::LiteralNotFound {
            clause: pos.clause_id,
            literal: pos.clause_pos.literal_id,
        })?;
    Ok((clause, literal))
}

/// The core part of superposition, assuming that:
/// - `from` is the premise being used for rewriting and its literal is an equality
/// - `into` is the premise being rewritten
/// - `subterm_pos` is a term position within `into.lhs` that is not a variable (Condition 2)
/// - `subst` is the mgu of the term at `subterm_pos` and `from.lhs` (Condition 1)
///
/// This function will check condition 3 through 6 for both positive and negative superposition
/// and add a new clause to `acc` if applicable.
fn superposition_core(
    from: &SpPremise<'_>,
    into: &SpPremise<'_>,
    subterm_pos: TermPosition,
    subst: &HashSubstitution,
    ctx: &GenerationContext<'_>,
    acc: &mut Vec<Clause>,
) -> Result<(), EngineError> {
    let term_bank = ctx.term_bank;
    // Condition 3: the lhs of the rewriting literal must not be <= the rhs after applying
    // the substitution.
    let from_ord = from
        .lhs
        .clone()
        .subst_with(subst, term_bank)
        .kbo(&from.rhs.clone().subst_with(subst, term_bank), term_bank);
    if from_ord == Some(Ordering::Equal) || from_ord == Some(Ordering::Less) {
        return Ok(());
    }

    // Condition 5: the lhs of the literal being rewritten must not be <= the rhs after
    // applying the substitution.
    let into_ord = into
        .lhs
        .clone()
        .subst_with(subst, term_bank)
        .kbo(&into.rhs.clone().subst_with(subst, term_bank), term_bank);
    if into_ord == Some(Ordering::Equal) || into_ord == Some(Ordering::Less) {
        return Ok(());
    }

    // Condition 4: the literal being used for rewriting must be eligible in its clause,
    // strictly.
    let from_remainder = if from.unordered {
        Some(remainder_literals(from.clause, from.lit_id, subst, term_bank))
    } else {
        eligible_remainder(from.clause, from.lit_id, subst, ctx.selection, true, term_bank)
    };
    let Some(mut new_literals) = from_remainder else {
        return Ok(());
    };

    // Condition 6: the literal being rewritten must be eligible in its clause, strictly if
    // it is positive.
    let into_remainder = if into.unordered {
        Some(remainder_literals(into.clause, into.lit_id, subst, term_bank))
    } else {
        eligible_remainder(
            into.clause,
            into.lit_id,
            subst,
            ctx.selection,
            into.pol == Polarity::Eq,
            term_bank,
        )
    };
    let Some(mut into_literals) = into_remainder else {
        return Ok(());
    };
    new_literals.append(&mut into_literals);

    let new_lhs = into
        .lhs
        .replace_at(subterm_pos, &from.rhs, term_bank)
        .ok_or(EngineError::PositionOutOfTerm {
            clause: into.clause.get_id(),
            offset: subterm_pos.offset(),
        })?
        .subst_with(subst, term_bank);
    let new_rhs = into.rhs.clone().subst_with(subst, term_bank);
    new_literals.push(Literal::new(new_lhs, new_rhs, into.pol));
    let new_clause = Clause::new(
        new_literals,
        ProofStep::new(
            ProofRule::Superposition,
            vec![from.clause.get_id(), into.clause.get_id()],
        ),
    );
    info!("SP derived clause: {}", pretty_print(&new_clause, term_bank));
    acc.push(new_clause);
    Ok(())
}

pub struct SuperpositionRule;

impl GeneratingRule for SuperpositionRule {
    fn rule(&self) -> ProofRule {
        ProofRule::Superposition
    }

    fn generate(
        &self,
        given: &Clause,
        ctx: &GenerationContext<'_>,
        acc: &mut Vec<Clause>,
    ) -> Result<(), EngineError> {
        let term_bank = ctx.term_bank;
        info!("SP working clause: {}", pretty_print(given, term_bank));

        // Part 1: the given clause is the one being used for rewriting. Conditions 1 and 2
        // hold by retrieval, the subterm index verifies unifiers and never stores variable
        // positions.
        for (lit_id, lit) in given.iter() {
            // Condition: the one being used for rewriting must be an equality
            if lit.is_ne() {
                continue;
            }
            for (lhs, rhs) in lit.symm_term_iter() {
                for partner in &ctx.partners {
                    for (_, pos, subst) in
                        partner.set.subterm_index().get_unifications(&lhs, term_bank)
                    {
                        let (into_clause, into_lit) = resolve_partner(partner.set, pos)?;
                        let side = pos.clause_pos.literal_pos.side;
                        let from = SpPremise {
                            clause: given,
                            lit_id,
                            pol: Polarity::Eq,
                            lhs: lhs.clone(),
                            rhs: rhs.clone(),
                            unordered: false,
                        };
                        let into = SpPremise {
                            clause: into_clause,
                            lit_id: pos.clause_pos.literal_id,
                            pol: into_lit.get_pol(),
                            lhs: into_lit.get_side(side).clone(),
                            rhs: into_lit.get_side(side.flip()).clone(),
                            unordered: partner.unordered,
                        };
                        superposition_core(
                            &from,
                            &into,
                            pos.clause_pos.literal_pos.term_pos,
                            &subst,
                            ctx,
                            acc,
                        )?;
                    }
                }
            }
        }

        // Part 2: the given clause is the one being rewritten.
        for (lit_id, lit) in given.iter() {
            for (lhs, rhs) in lit.symm_term_iter() {
                for (subterm_pos, subterm) in lhs.subterms() {
                    // Condition 2: the rewritten subterm must not be a variable
                    if subterm.is_variable() {
                        continue;
                    }
                    for partner in &ctx.partners {
                        for (_, pos, subst) in partner
                            .set
                            .subterm_index()
                            .get_unifications(subterm, term_bank)
                        {
                            // the partner term has to be a whole side of a positive literal
                            if !pos.clause_pos.literal_pos.term_pos.is_root() {
                                continue;
                            }
                            let (from_clause, from_lit) = resolve_partner(partner.set, pos)?;
                            if from_lit.is_ne() {
                                continue;
                            }
                            let side = pos.clause_pos.literal_pos.side;
                            let from = SpPremise {
                                clause: from_clause,
                                lit_id: pos.clause_pos.literal_id,
                                pol: Polarity::Eq,
                                lhs: from_lit.get_side(side).clone(),
                                rhs: from_lit.get_side(side.flip()).clone(),
                                unordered: partner.unordered,
                            };
                            let into = SpPremise {
                                clause: given,
                                lit_id,
                                pol: lit.get_pol(),
                                lhs: lhs.clone(),
                                rhs: rhs.clone(),
                                unordered: false,
                            };
                            superposition_core(&from, &into, subterm_pos, &subst, ctx, acc)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// The given clause procedure. Holds the proof state across [Saturation::run] calls, so a
/// search that hit a resource limit can be resumed with fresh limits.
pub struct Saturation<'a> {
    state: ProofState,
    term_bank: &'a mut TermBank,
    config: SaturationConfig,
    rules: Vec<Box<dyn GeneratingRule>>,
    proof_log: ProofLog,
    iterations: u64,
}

impl<'a> Saturation<'a> {
    /// Set up a search over `clauses` with the default rule set. `set_of_support` clauses are
    /// activated immediately and only ever participate as unordered partners.
    pub fn new(
        clauses: Vec<Clause>,
        set_of_support: Vec<Clause>,
        term_bank: &'a mut TermBank,
        config: SaturationConfig,
    ) -> Self {
        Self::with_rules(clauses, set_of_support, term_bank, config, default_rules())
    }

    pub fn with_rules(
        clauses: Vec<Clause>,
        set_of_support: Vec<Clause>,
        term_bank: &'a mut TermBank,
        config: SaturationConfig,
        rules: Vec<Box<dyn GeneratingRule>>,
    ) -> Self {
        let proof_log = ProofLog::new(config.log_proof);
        for clause in clauses.iter().chain(set_of_support.iter()) {
            proof_log.log_clause(clause, term_bank);
        }
        let state = ProofState::new(clauses, set_of_support, config.age_weight_ratio, term_bank);
        Saturation {
            state,
            term_bank,
            config,
            rules,
            proof_log,
            iterations: 0,
        }
    }

    pub fn state(&self) -> &ProofState {
        &self.state
    }

    pub fn proof_log(&self) -> &ProofLog {
        &self.proof_log
    }

    /// How many given clauses have been processed over all [Saturation::run] calls.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Run the search until it concludes or a limit from `config` is hit.
    pub fn run(&mut self, config: &ResourceLimitConfig) -> SaturationResult {
        let limits = ResourceLimits::of_config(config);
        match self.run_loop(&limits) {
            Ok(result) => result,
            Err(err) => {
                error!("saturation aborted: {err}");
                SaturationResult::Error(err)
            }
        }
    }

    fn run_loop(&mut self, limits: &ResourceLimits) -> Result<SaturationResult, EngineError> {
        loop {
            if let Some(reason) = self.resources_exhausted(limits) {
                return Ok(SaturationResult::Timeout(reason));
            }
            let Some(given) = self.state.passive.pop() else {
                return Ok(SaturationResult::Sat);
            };
            self.iterations += 1;
            info!("given clause: {}", pretty_print(&given, self.term_bank));

            let renamed = given.fresh_variable_clone(self.term_bank);
            if renamed.get_id() != given.get_id() {
                self.proof_log.log_clause(&renamed, self.term_bank);
            }
            let given = self.simplify(renamed)?;
            if given.is_empty() {
                return Ok(SaturationResult::Unsat(given));
            }
            if self.is_redundant(&given)? {
                continue;
            }

            let subsumed = self.state.active.subsumed_by(&given, self.term_bank)?;
            for id in subsumed {
                let removed = self.state.active.remove(id, self.term_bank)?;
                info!(
                    "backward subsumption: {} subsumes {}",
                    pretty_print(&given, self.term_bank),
                    pretty_print(&removed, self.term_bank)
                );
            }
            self.backward_simplify(&given)?;

            let new_clauses = self.generate(&given)?;
            self.state.active.insert(given, self.term_bank);
            for new_clause in new_clauses {
                let new_clause = self.simplify(new_clause)?;
                if new_clause.is_empty() {
                    return Ok(SaturationResult::Unsat(new_clause));
                }
                if is_trivial(&new_clause, self.term_bank) {
                    continue;
                }
                info!(
                    "inserting passive: {}",
                    pretty_print(&new_clause, self.term_bank)
                );
                self.state.passive.push(new_clause);
            }
            self.term_bank.gc();
        }
    }

    /// Forward simplification against both active sets, recording every intermediate step in
    /// the proof log.
    fn simplify(&self, clause: Clause) -> Result<Clause, EngineError> {
        let sources = [&self.state.active, &self.state.set_of_support];
        forward_simplify(clause, &sources, &self.proof_log, self.term_bank)
    }

    /// A clause is redundant if it is trivial or subsumed by either active set.
    fn is_redundant(&self, clause: &Clause) -> Result<bool, EngineError> {
        if is_trivial(clause, self.term_bank) {
            return Ok(true);
        }
        if self.state.active.subsumes_clause(clause, self.term_bank)? {
            return Ok(true);
        }
        self.state
            .set_of_support
            .subsumes_clause(clause, self.term_bank)
    }

    /// Backward demodulation: if `given` is an oriented unit equation, rewrite the active
    /// clauses it reaches. A rewritten clause leaves the active set and queues up again, the
    /// next pop forward simplifies it against everything including any occurrences this pass
    /// skipped.
    fn backward_simplify(&mut self, given: &Clause) -> Result<(), EngineError> {
        if !given.is_unit() {
            return Ok(());
        }
        let Some((_, literal)) = given.iter().next() else {
            return Ok(());
        };
        if literal.is_ne() {
            return Ok(());
        }

        let mut jobs: Vec<(ClauseSetPosition, Term)> = Vec::new();
        let mut touched: FxHashSet<ClauseId> = FxHashSet::default();
        for side in [LiteralSide::Left, LiteralSide::Right] {
            let lhs = literal.get_side(side);
            let rhs = literal.get_side(side.flip());
            if lhs.is_variable() {
                continue;
            }
            for (instance, pos, subst) in self
                .state
                .active
                .subterm_index()
                .get_instances(lhs, self.term_bank)
            {
                let replacement = rhs.clone().subst_with(&subst, self.term_bank);
                if instance.kbo(&replacement, self.term_bank) != Some(Ordering::Greater) {
                    continue;
                }
                let (target, target_literal) =
                    resolve_partner(&self.state.active, pos)?;
                // same root protection as in forward rewriting
                let valid = match target_literal.get_pol() {
                    Polarity::Ne => true,
                    Polarity::Eq => {
                        let target_lhs = target_literal.get_side(pos.clause_pos.literal_pos.side);
                        let target_rhs =
                            target_literal.get_side(pos.clause_pos.literal_pos.side.flip());
                        !pos.clause_pos.literal_pos.term_pos.is_root()
                            || !target.is_unit()
                            || target_lhs.kbo(target_rhs, self.term_bank)
                                != Some(Ordering::Greater)
                    }
                };
                if !valid {
                    continue;
                }
                if !touched.insert(pos.clause_id) {
                    continue;
                }
                jobs.push((*pos, replacement));
            }
        }

        for (pos, replacement) in jobs {
            let old = self.state.active.remove(pos.clause_id, self.term_bank)?;
            let side = pos.clause_pos.literal_pos.side;
            let term_pos = pos.clause_pos.literal_pos.term_pos;
            let old_literal =
                old.get_literal(pos.clause_pos.literal_id)
                    .ok_or(EngineError::LiteralNotFound {
                        clause: pos.clause_id,
                        literal: pos.clause_pos.literal_id,
                    })?;
            let new_side = old_literal
                .get_side(side)
                .replace_at(term_pos, &replacement, self.term_bank)
                .ok_or(EngineError::PositionOutOfTerm {
                    clause: pos.clause_id,
                    offset: term_pos.offset(),
                })?;
            let new_literal = Literal::new(
                new_side,
                old_literal.get_side(side.flip()).clone(),
                old_literal.get_pol(),
            );
            let mut literals: Vec<Literal> = old.iter().map(|(_, lit)| lit.clone()).collect();
            literals[pos.clause_pos.literal_id.0] = new_literal;
            let new_clause = Clause::new(
                literals,
                ProofStep::new(ProofRule::Rewriting, vec![old.get_id(), given.get_id()]),
            );
            info!(
                "backward rewriting simplified {} to {}",
                pretty_print(&old, self.term_bank),
                pretty_print(&new_clause, self.term_bank)
            );
            self.proof_log.log_clause(&new_clause, self.term_bank);
            self.state.passive.push(new_clause);
        }
        Ok(())
    }

    /// Apply every generating rule to `given`. The partner sets are the active set, the set
    /// of support and a variable renamed copy of the given clause itself, so self inferences
    /// are not lost.
    fn generate(&mut self, given: &Clause) -> Result<Vec<Clause>, EngineError> {
        let renamed = given.fresh_variable_clone(self.term_bank);
        if renamed.get_id() != given.get_id() {
            self.proof_log.log_clause(&renamed, self.term_bank);
        }
        let mut self_set = ActiveSet::new(FeatureScheme::of_initial_clauses([&renamed]));
        self_set.insert(renamed, self.term_bank);

        let mut acc = Vec::new();
        let ctx = GenerationContext {
            partners: vec![
                Partner {
                    set: &self.state.active,
                    unordered: false,
                },
                Partner {
                    set: &self.state.set_of_support,
                    unordered: true,
                },
                Partner {
                    set: &self_set,
                    unordered: false,
                },
            ],
            selection: self.config.selection,
            term_bank: self.term_bank,
        };
        for rule in &self.rules {
            debug!("applying {}", rule.rule());
            rule.generate(given, &ctx, &mut acc)?;
        }
        for clause in &acc {
            self.proof_log.log_clause(clause, self.term_bank);
        }
        Ok(acc)
    }

    fn resources_exhausted(&self, limits: &ResourceLimits) -> Option<LimitReason> {
        if let Some(deadline) = limits.deadline {
            let now = Instant::now();
            if now > deadline {
                return Some(LimitReason::Time);
            }
        }

        if let Some(memory_limit) = limits.memory_limit {
            if let Some(stats) = memory_stats() {
                if memory_limit < stats.physical_mem {
                    return Some(LimitReason::Memory);
                }
            }
        }

        if let Some(max_iterations) = limits.max_iterations {
            if self.iterations >= max_iterations {
                return Some(LimitReason::Iterations);
            }
        }

        None
    }
}

/// One shot search over `clauses` with `set_of_support`, discarding the proof state at the
/// end.
pub fn search_proof(
    clauses: Vec<Clause>,
    set_of_support: Vec<Clause>,
    term_bank: &mut TermBank,
    config: &SaturationConfig,
    resource_config: &ResourceLimitConfig,
) -> SaturationResult {
    let mut saturation = Saturation::new(clauses, set_of_support, term_bank, *config);
    saturation.run(resource_config)
}
