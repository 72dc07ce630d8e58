//! ## Clausification
//! Turns the negation normal form formulas of the parser into [Clause]s over the shared
//! [TermBank]:
//! - free variables close universally, following TPTP reading of open formulas
//! - universally quantified variables become fresh engine variables
//! - existentially quantified variables become skolem terms over the universals in scope
//! - the propositional structure distributes into a conjunction of disjunctions
//!
//! Conjectures are negated on the way in since the saturation loop refutes rather than
//! proves.

use log::info;

use crate::{
    clause::{Clause, Literal},
    pretty_print::pretty_print,
    term_bank::{FunctionInformation, Name, Sort, Term, TermBank, VariableInformation},
    tptp_parser::{FofLiteral, FofTerm, Formula, TptpProblem, negate},
};

/// The clausified input, split by origin: `axioms` came from axiom like roles, `goal` holds
/// the clauses of the (negated) conjectures. The split is what a set of support run keys on.
#[derive(Debug)]
pub struct ClausifiedProblem {
    pub axioms: Vec<Clause>,
    pub goal: Vec<Clause>,
}

fn is_fof_true(term: &FofTerm) -> bool {
    matches!(term, FofTerm::Function(Name::Builtin("true"), args) if args.is_empty())
}

fn free_term_vars(term: &FofTerm, bound: &[String], free: &mut Vec<String>) {
    match term {
        FofTerm::Variable(name) => {
            if !bound.contains(name) && !free.contains(name) {
                free.push(name.clone());
            }
        }
        FofTerm::Function(_, args) => {
            for arg in args {
                free_term_vars(arg, bound, free);
            }
        }
    }
}

fn free_formula_vars(formula: &Formula, bound: &mut Vec<String>, free: &mut Vec<String>) {
    match formula {
        Formula::Literal(FofLiteral::Eq(lhs, rhs)) | Formula::Literal(FofLiteral::Ne(lhs, rhs)) => {
            free_term_vars(lhs, bound, free);
            free_term_vars(rhs, bound, free);
        }
        Formula::And(parts) | Formula::Or(parts) => {
            for part in parts {
                free_formula_vars(part, bound, free);
            }
        }
        Formula::Exists(vars, body) | Formula::Forall(vars, body) => {
            let depth = bound.len();
            bound.extend(vars.iter().cloned());
            free_formula_vars(body, bound, free);
            bound.truncate(depth);
        }
    }
}

/// Close the free variables of `formula` universally, first occurrence order.
fn close(formula: Formula) -> Formula {
    let mut free = Vec::new();
    free_formula_vars(&formula, &mut Vec::new(), &mut free);
    if free.is_empty() {
        formula
    } else {
        Formula::Forall(free, Box::new(formula))
    }
}

struct Clausifier<'a> {
    term_bank: &'a mut TermBank,
    skolem_count: u32,
    /// innermost binding last, shadowing resolves through reverse search
    bindings: Vec<(String, Term)>,
    /// universal variables in scope, the argument vector of new skolem terms
    universals: Vec<Term>,
}

impl<'a> Clausifier<'a> {
    fn new(term_bank: &'a mut TermBank) -> Self {
        Clausifier {
            term_bank,
            skolem_count: 0,
            bindings: Vec::new(),
            universals: Vec::new(),
        }
    }

    fn lookup(&self, name: &str) -> Term {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| bound.as_str() == name)
            .map(|(_, term)| term.clone())
            .unwrap_or_else(|| panic!("unbound variable {} in the input", name))
    }

    fn mk_skolem(&mut self) -> Term {
        let id = self.term_bank.add_function(FunctionInformation {
            name: Name::Skolem(self.skolem_count),
            arity: self.universals.len(),
            sort: Sort::Individual,
        });
        self.skolem_count += 1;
        self.term_bank.mk_app(id, self.universals.clone())
    }

    fn convert_term(&mut self, term: FofTerm, sort: Sort) -> Term {
        match term {
            FofTerm::Variable(name) => self.lookup(&name),
            FofTerm::Function(name, args) => {
                let args: Vec<Term> = args
                    .into_iter()
                    .map(|arg| self.convert_term(arg, Sort::Individual))
                    .collect();
                let id = self.term_bank.get_or_add_function(FunctionInformation {
                    name,
                    arity: args.len(),
                    sort,
                });
                self.term_bank.mk_app(id, args)
            }
        }
    }

    /// Atoms arrive as equations on `$true` from the parser, so a side facing `$true` is a
    /// predicate and registers with [Sort::Prop], anything else is an individual.
    fn convert_literal(&mut self, literal: FofLiteral) -> Literal {
        let (lhs, rhs, positive) = match literal {
            FofLiteral::Eq(lhs, rhs) => (lhs, rhs, true),
            FofLiteral::Ne(lhs, rhs) => (lhs, rhs, false),
        };
        let sort = if is_fof_true(&lhs) || is_fof_true(&rhs) {
            Sort::Prop
        } else {
            Sort::Individual
        };
        let lhs = self.convert_term(lhs, sort);
        let rhs = self.convert_term(rhs, sort);
        if positive {
            Literal::mk_eq(lhs, rhs)
        } else {
            Literal::mk_ne(lhs, rhs)
        }
    }

    /// The quantifier free matrix of `formula` as a conjunction of literal lists. Disjunction
    /// distributes over conjunction, quantifiers update the variable scope on the fly so a
    /// skolem term only depends on the universals actually in scope.
    fn matrix(&mut self, formula: Formula) -> Vec<Vec<Literal>> {
        match formula {
            Formula::Literal(literal) => vec![vec![self.convert_literal(literal)]],
            Formula::And(parts) => {
                let mut clauses = Vec::new();
                for part in parts {
                    clauses.append(&mut self.matrix(part));
                }
                clauses
            }
            Formula::Or(parts) => {
                let mut clauses: Vec<Vec<Literal>> = vec![Vec::new()];
                for part in parts {
                    let part_clauses = self.matrix(part);
                    let mut distributed = Vec::with_capacity(clauses.len() * part_clauses.len());
                    for clause in &clauses {
                        for part_clause in &part_clauses {
                            let mut merged = clause.clone();
                            merged.extend(part_clause.iter().cloned());
                            distributed.push(merged);
                        }
                    }
                    clauses = distributed;
                }
                clauses
            }
            Formula::Forall(vars, body) => {
                let count = vars.len();
                for var in vars {
                    let term = self.term_bank.mk_fresh_variable(VariableInformation {
                        name: var.clone(),
                        sort: Sort::Individual,
                    });
                    self.bindings.push((var, term.clone()));
                    self.universals.push(term);
                }
                let clauses = self.matrix(*body);
                for _ in 0..count {
                    self.bindings.pop();
                    self.universals.pop();
                }
                clauses
            }
            Formula::Exists(vars, body) => {
                let count = vars.len();
                for var in vars {
                    let skolem = self.mk_skolem();
                    self.bindings.push((var, skolem));
                }
                let clauses = self.matrix(*body);
                for _ in 0..count {
                    self.bindings.pop();
                }
                clauses
            }
        }
    }

    fn clausify_formula(&mut self, formula: Formula) -> Vec<Clause> {
        let clauses = self
            .matrix(formula)
            .into_iter()
            .map(|literals| {
                let clause = Clause::input(literals);
                info!("clausified: {}", pretty_print(&clause, self.term_bank));
                clause
            })
            .collect();
        debug_assert!(self.bindings.is_empty());
        debug_assert!(self.universals.is_empty());
        clauses
    }
}

/// Clausify a parsed problem over `term_bank`. Free variables close universally before
/// anything else, in particular before a conjecture is negated, so an open conjecture gets a
/// skolem witness rather than a universal variable.
pub fn clausify(problem: TptpProblem, term_bank: &mut TermBank) -> ClausifiedProblem {
    let mut clausifier = Clausifier::new(term_bank);
    let mut axioms = Vec::new();
    for formula in problem.axioms {
        axioms.append(&mut clausifier.clausify_formula(close(formula)));
    }
    let mut goal = Vec::new();
    for formula in problem.conjectures {
        goal.append(&mut clausifier.clausify_formula(negate(close(formula))));
    }
    for formula in problem.negated_conjectures {
        goal.append(&mut clausifier.clausify_formula(close(formula)));
    }
    ClausifiedProblem { axioms, goal }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::term_bank::TermNode;
    use crate::tptp_parser::parse_str;

    fn atom_side<'a>(literal: &'a Literal, term_bank: &TermBank) -> &'a Term {
        if *literal.get_lhs() == term_bank.mk_true() {
            literal.get_rhs()
        } else {
            literal.get_lhs()
        }
    }

    fn head_name(term: &Term, term_bank: &TermBank) -> String {
        match &**term {
            TermNode::App { id, .. } => term_bank.get_function_info(*id).name.to_string(),
            TermNode::Var { .. } => panic!("expected an application"),
        }
    }

    #[test]
    fn implication_becomes_one_clause() {
        let problem = parse_str("fof(ax, axiom, ![X]: (p(X) => q(X))).");
        let mut term_bank = TermBank::new();
        let clausified = clausify(problem, &mut term_bank);
        assert!(clausified.goal.is_empty());
        assert_eq!(clausified.axioms.len(), 1);

        let clause = &clausified.axioms[0];
        assert_eq!(clause.len(), 2);
        assert_eq!(clause.distinct_vars().len(), 1);
        let negative = clause.iter().find(|(_, lit)| lit.is_ne()).unwrap().1;
        let positive = clause.iter().find(|(_, lit)| lit.is_eq()).unwrap().1;
        assert_eq!(head_name(atom_side(negative, &term_bank), &term_bank), "p");
        assert_eq!(head_name(atom_side(positive, &term_bank), &term_bank), "q");
    }

    #[test]
    fn existentials_skolemise_over_the_prefix() {
        let problem = parse_str("fof(ax, axiom, ![X]: ?[Y]: r(X, Y)).");
        let mut term_bank = TermBank::new();
        let clausified = clausify(problem, &mut term_bank);
        assert_eq!(clausified.axioms.len(), 1);

        // r(X, sk0(X))
        let clause = &clausified.axioms[0];
        assert_eq!(clause.len(), 1);
        let (_, literal) = clause.iter().next().unwrap();
        let atom = atom_side(literal, &term_bank);
        let TermNode::App { id, args, .. } = &**atom else {
            panic!("expected an application");
        };
        assert_eq!(term_bank.get_function_info(*id).name.to_string(), "r");
        assert!(args[0].is_variable());
        let TermNode::App {
            id: sk_id,
            args: sk_args,
            ..
        } = &*args[1]
        else {
            panic!("expected a skolem term");
        };
        assert_eq!(term_bank.get_function_info(*sk_id).name.to_string(), "sk0");
        assert_eq!(sk_args.len(), 1);
        assert_eq!(sk_args[0], args[0]);
    }

    #[test]
    fn skolem_before_the_prefix_is_a_constant() {
        let problem = parse_str("fof(ax, axiom, ?[Y]: ![X]: r(X, Y)).");
        let mut term_bank = TermBank::new();
        let clausified = clausify(problem, &mut term_bank);

        let clause = &clausified.axioms[0];
        let (_, literal) = clause.iter().next().unwrap();
        let atom = atom_side(literal, &term_bank);
        let TermNode::App { args, .. } = &**atom else {
            panic!("expected an application");
        };
        let TermNode::App {
            id: sk_id,
            args: sk_args,
            ..
        } = &*args[1]
        else {
            panic!("expected a skolem term");
        };
        assert_eq!(term_bank.get_function_info(*sk_id).arity, 0);
        assert!(sk_args.is_empty());
    }

    #[test]
    fn disjunction_distributes_over_conjunction() {
        let problem = parse_str("fof(ax, axiom, (p & q) | (r & s)).");
        let mut term_bank = TermBank::new();
        let clausified = clausify(problem, &mut term_bank);

        // (p | r), (p | s), (q | r), (q | s)
        assert_eq!(clausified.axioms.len(), 4);
        for clause in &clausified.axioms {
            assert_eq!(clause.len(), 2);
        }
    }

    #[test]
    fn free_variables_close_universally() {
        let problem = parse_str("fof(ax, axiom, p(X, Y)).");
        let mut term_bank = TermBank::new();
        let clausified = clausify(problem, &mut term_bank);

        let clause = &clausified.axioms[0];
        assert_eq!(clause.len(), 1);
        assert_eq!(clause.distinct_vars().len(), 2);
    }

    #[test]
    fn conjectures_negate_into_the_goal() {
        let problem = parse_str("fof(goal, conjecture, ?[X]: p(X)).");
        let mut term_bank = TermBank::new();
        let clausified = clausify(problem, &mut term_bank);
        assert!(clausified.axioms.is_empty());

        // not(?[X]: p(X)) clausifies to p(X) != $true
        assert_eq!(clausified.goal.len(), 1);
        let clause = &clausified.goal[0];
        assert_eq!(clause.len(), 1);
        let (_, literal) = clause.iter().next().unwrap();
        assert!(literal.is_ne());
        assert_eq!(clause.distinct_vars().len(), 1);
    }

    #[test]
    fn open_conjectures_skolemise_on_negation() {
        let problem = parse_str("fof(goal, conjecture, p(X)).");
        let mut term_bank = TermBank::new();
        let clausified = clausify(problem, &mut term_bank);

        // the implicit universal closure negates into an existential witness
        let clause = &clausified.goal[0];
        assert!(clause.distinct_vars().is_empty());
        let (_, literal) = clause.iter().next().unwrap();
        assert!(literal.is_ne());
        let atom = atom_side(literal, &term_bank);
        let TermNode::App { args, .. } = &**atom else {
            panic!("expected an application");
        };
        assert!(args[0].is_ground());
    }
}
