//! ## TPTP Parsing
//! Reads FOF problems in the [TPTP](https://tptp.org) language into a negation normal form
//! first order syntax tree, resolving `include` directives along the way. Plain atoms `p(t)`
//! come out as equations `p(t) = $true` so the rest of the engine only ever deals with
//! equational literals.

use std::fmt;
use std::fs;
use std::path::Path;
use tptp::TPTPIterator;
use tptp::common::NonassocConnective;
use tptp::fof;
use tptp::top::{AnnotatedFormula, FormulaSelection, TPTPInput};

use crate::term_bank::Name;

/// A parsed problem, still in formula form. For refutation the conjectures get negated during
/// clausification while the negated conjectures go in as they are.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct TptpProblem {
    pub axioms: Vec<Formula>,
    pub conjectures: Vec<Formula>,
    // > "negated_conjecture"s are formed from negation of a "conjecture"
    // > (usually in a FOF to CNF conversion).
    pub negated_conjectures: Vec<Formula>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FofTerm {
    Variable(String),
    Function(Name, Vec<FofTerm>),
}

impl fmt::Display for FofTerm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FofTerm::Variable(name) => write!(f, "{}", name),
            FofTerm::Function(name, args) => {
                if args.is_empty() {
                    write!(f, "{}", name)
                } else {
                    write!(
                        f,
                        "{}({})",
                        name,
                        args.iter()
                            .map(|arg| arg.to_string())
                            .collect::<Vec<String>>()
                            .join(",")
                    )
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FofLiteral {
    Eq(FofTerm, FofTerm),
    Ne(FofTerm, FofTerm),
}

impl fmt::Display for FofLiteral {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FofLiteral::Eq(lhs, rhs) => write!(f, "{} = {}", lhs, rhs),
            FofLiteral::Ne(lhs, rhs) => write!(f, "{} != {}", lhs, rhs),
        }
    }
}

/// First order formulas in negation normal form: all connectives other than conjunction and
/// disjunction are compiled away while parsing, negations sit inside the literals.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Formula {
    Literal(FofLiteral),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    Exists(Vec<String>, Box<Formula>),
    Forall(Vec<String>, Box<Formula>),
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Formula::Literal(literal) => write!(f, "{}", literal),
            Formula::And(parts) => write!(
                f,
                "({})",
                parts
                    .iter()
                    .map(|part| part.to_string())
                    .collect::<Vec<String>>()
                    .join(" & ")
            ),
            Formula::Or(parts) => write!(
                f,
                "({})",
                parts
                    .iter()
                    .map(|part| part.to_string())
                    .collect::<Vec<String>>()
                    .join(" | ")
            ),
            Formula::Exists(vars, body) => write!(f, "?[{}]: {}", vars.join(","), body),
            Formula::Forall(vars, body) => write!(f, "![{}]: {}", vars.join(","), body),
        }
    }
}

/// Push a negation through `formula`, keeping the result in negation normal form.
pub fn negate(formula: Formula) -> Formula {
    match formula {
        Formula::Literal(FofLiteral::Eq(lhs, rhs)) => Formula::Literal(FofLiteral::Ne(lhs, rhs)),
        Formula::Literal(FofLiteral::Ne(lhs, rhs)) => Formula::Literal(FofLiteral::Eq(lhs, rhs)),
        Formula::And(parts) => Formula::Or(parts.into_iter().map(negate).collect()),
        Formula::Or(parts) => Formula::And(parts.into_iter().map(negate).collect()),
        Formula::Exists(vars, body) => Formula::Forall(vars, Box::new(negate(*body))),
        Formula::Forall(vars, body) => Formula::Exists(vars, Box::new(negate(*body))),
    }
}

fn fof_true() -> FofTerm {
    FofTerm::Function(Name::Builtin("true"), Vec::new())
}

/// Parse the TPTP file at `file`, resolving includes relative to its directory.
pub fn parse_file(file: &Path) -> TptpProblem {
    let mut problem = TptpProblem::default();
    consume_file(file, &mut problem);
    problem
}

/// Parse a standalone TPTP snippet. Include directives panic here, there is no directory to
/// resolve them against.
pub fn parse_str(input: &str) -> TptpProblem {
    let mut problem = TptpProblem::default();
    consume(input.as_bytes(), None, &mut problem);
    problem
}

fn consume_file(file: &Path, problem: &mut TptpProblem) {
    log::info!("opening {}", file.display());
    let bytes = fs::read(file).expect("unable to read input file");
    consume(&bytes, file.parent(), problem);
}

fn consume(bytes: &[u8], include_dir: Option<&Path>, problem: &mut TptpProblem) {
    let mut parser = TPTPIterator::<()>::new(bytes);
    for result in &mut parser {
        let input = result.expect("syntax error in the input");
        match input {
            TPTPInput::Include(include) => {
                if let FormulaSelection(Some(selection)) = include.selection {
                    panic!("formula selections are not supported: '{}'", selection);
                }
                let dir = include_dir.expect("includes need a directory to resolve against");
                // the included path comes singly quoted
                let file_name = include.file_name.0.to_string().replace('\'', "");
                let path = dir.join(file_name);
                log::info!("include {}", path.display());
                consume_file(&path, problem);
            }
            TPTPInput::Annotated(annotated) => match *annotated {
                AnnotatedFormula::Fof(fof) => {
                    // the name and the annotations of the formula are of no interest
                    let annotated_fof = (*fof).0;
                    // every role except the conjecture ones is read like an axiom
                    // <https://tptp.org/UserDocs/TPTPLanguage/SyntaxBNF.html#formula_role>
                    let role = annotated_fof.role.0.0;
                    let fof_formula = *annotated_fof.formula;
                    log::info!("parse fof: {}", fof_formula);
                    let formula = Formula::from(fof_formula.0);
                    log::info!("parsed formula: {}", formula);
                    if role == "conjecture" {
                        problem.conjectures.push(formula);
                    } else if role == "negated_conjecture" {
                        problem.negated_conjectures.push(formula);
                    } else {
                        problem.axioms.push(formula);
                    }
                }
                AnnotatedFormula::Tfx(_) => unimplemented!("tfx inputs are not supported"),
                AnnotatedFormula::Cnf(_) => unimplemented!("cnf inputs are not supported"),
            },
        }
    }
    assert!(
        parser.remaining.is_empty(),
        "the parser stopped before the end of the input"
    );
}

// The conversions below compile implications, equivalences and formula level negation away so
// only the NNF connectives of [Formula] remain.
impl From<fof::LogicFormula<'_>> for Formula {
    fn from(f: fof::LogicFormula) -> Self {
        match f {
            fof::LogicFormula::Binary(b) => Self::from(b),
            fof::LogicFormula::Unary(u) => Self::from(u),
            fof::LogicFormula::Unitary(u) => Self::from(u),
        }
    }
}

impl From<fof::BinaryFormula<'_>> for Formula {
    fn from(f: fof::BinaryFormula) -> Self {
        match f {
            fof::BinaryFormula::Nonassoc(fbna) => Self::from(fbna),
            fof::BinaryFormula::Assoc(fba) => Self::from(fba),
        }
    }
}

impl From<fof::UnaryFormula<'_>> for Formula {
    fn from(f: fof::UnaryFormula) -> Self {
        match f {
            fof::UnaryFormula::Unary(_neg, fuf) => negate(Self::from(*fuf)),
            fof::UnaryFormula::InfixUnary(i) => Self::from(i),
        }
    }
}

impl From<fof::UnitaryFormula<'_>> for Formula {
    fn from(f: fof::UnitaryFormula) -> Self {
        match f {
            fof::UnitaryFormula::Parenthesised(flf) => Self::from(*flf),
            fof::UnitaryFormula::Quantified(fqf) => Self::from(fqf),
            fof::UnitaryFormula::Atomic(a) => Self::from(*a),
        }
    }
}

impl From<fof::BinaryNonassoc<'_>> for Formula {
    fn from(f: fof::BinaryNonassoc) -> Self {
        let l = Self::from(*f.left);
        let r = Self::from(*f.right);
        match f.op {
            NonassocConnective::LRImplies => Self::Or(vec![negate(l), r]),
            NonassocConnective::RLImplies => Self::Or(vec![negate(r), l]),
            NonassocConnective::Equivalent => Self::And(vec![
                Self::Or(vec![negate(l.clone()), r.clone()]),
                Self::Or(vec![negate(r), l]),
            ]),
            NonassocConnective::NotEquivalent => Self::Or(vec![
                Self::And(vec![l.clone(), negate(r.clone())]),
                Self::And(vec![r, negate(l)]),
            ]),
            NonassocConnective::NotOr => Self::And(vec![negate(l), negate(r)]),
            NonassocConnective::NotAnd => Self::Or(vec![negate(l), negate(r)]),
        }
    }
}

impl From<fof::BinaryAssoc<'_>> for Formula {
    fn from(f: fof::BinaryAssoc) -> Self {
        match f {
            fof::BinaryAssoc::Or(f_or) => Self::Or(f_or.0.into_iter().map(Self::from).collect()),
            fof::BinaryAssoc::And(f_and) => {
                Self::And(f_and.0.into_iter().map(Self::from).collect())
            }
        }
    }
}

impl From<fof::UnitFormula<'_>> for Formula {
    fn from(f: fof::UnitFormula) -> Self {
        match f {
            fof::UnitFormula::Unitary(u) => Self::from(u),
            fof::UnitFormula::Unary(u) => Self::from(u),
        }
    }
}

impl From<fof::InfixUnary<'_>> for Formula {
    fn from(f: fof::InfixUnary) -> Self {
        Self::Literal(FofLiteral::Ne(
            FofTerm::from(*f.left),
            FofTerm::from(*f.right),
        ))
    }
}

impl From<fof::QuantifiedFormula<'_>> for Formula {
    fn from(f: fof::QuantifiedFormula) -> Self {
        let vars = f.bound.0.iter().map(|v| v.to_string()).collect();
        match f.quantifier {
            fof::Quantifier::Forall => Self::Forall(vars, Box::new(Self::from(*f.formula))),
            fof::Quantifier::Exists => Self::Exists(vars, Box::new(Self::from(*f.formula))),
        }
    }
}

impl From<fof::AtomicFormula<'_>> for Formula {
    fn from(f: fof::AtomicFormula) -> Self {
        match f {
            fof::AtomicFormula::Plain(p) => Self::from(p),
            fof::AtomicFormula::Defined(d) => Self::from(d),
            fof::AtomicFormula::System(_) => unimplemented!("system atoms are not supported"),
        }
    }
}

// Plain atoms p(t1, ..., tn) become the equation p(t1, ..., tn) = $true.
impl From<fof::PlainAtomicFormula<'_>> for Formula {
    fn from(f: fof::PlainAtomicFormula) -> Self {
        match f.0 {
            fof::PlainTerm::Constant(c) => Formula::Literal(FofLiteral::Eq(
                FofTerm::Function(Name::Parsed(c.to_string()), Vec::new()),
                fof_true(),
            )),
            fof::PlainTerm::Function(f, args) => Formula::Literal(FofLiteral::Eq(
                FofTerm::Function(
                    Name::Parsed(f.to_string()),
                    args.0.into_iter().map(FofTerm::from).collect(),
                ),
                fof_true(),
            )),
        }
    }
}

impl From<fof::DefinedAtomicFormula<'_>> for Formula {
    fn from(f: fof::DefinedAtomicFormula) -> Self {
        match f {
            fof::DefinedAtomicFormula::Plain(p) => Self::from(p),
            fof::DefinedAtomicFormula::Infix(i) => Self::Literal(FofLiteral::Eq(
                FofTerm::from(*i.left),
                FofTerm::from(*i.right),
            )),
        }
    }
}

// `$true` and `$false` only occur as `fof_defined_plain_formula`. Rather than carrying a
// builtin falsehood around they turn into a trivial and an absurd equation on `$true`.
impl From<fof::DefinedPlainFormula<'_>> for Formula {
    fn from(f: fof::DefinedPlainFormula) -> Self {
        match f.0 {
            fof::DefinedPlainTerm::Constant(c) if c.0.0.0.0.0 == "true" => {
                Formula::Literal(FofLiteral::Eq(fof_true(), fof_true()))
            }
            fof::DefinedPlainTerm::Constant(c) if c.0.0.0.0.0 == "false" => {
                Formula::Literal(FofLiteral::Ne(fof_true(), fof_true()))
            }
            _ => unimplemented!("no interpreted theory beyond $true and $false"),
        }
    }
}

impl From<fof::Term<'_>> for FofTerm {
    fn from(t: fof::Term) -> Self {
        match t {
            fof::Term::Variable(v) => Self::Variable(v.to_string()),
            fof::Term::Function(f) => Self::from(*f),
        }
    }
}

impl From<fof::FunctionTerm<'_>> for FofTerm {
    fn from(t: fof::FunctionTerm) -> Self {
        match t {
            fof::FunctionTerm::Plain(p) => Self::from(p),
            fof::FunctionTerm::Defined(d) => Self::from(d),
            fof::FunctionTerm::System(_) => unimplemented!("system terms are not supported"),
        }
    }
}

impl From<fof::PlainTerm<'_>> for FofTerm {
    fn from(t: fof::PlainTerm) -> Self {
        match t {
            fof::PlainTerm::Constant(c) => Self::Function(Name::Parsed(c.to_string()), Vec::new()),
            fof::PlainTerm::Function(f, args) => Self::Function(
                Name::Parsed(f.to_string()),
                args.0.into_iter().map(Self::from).collect(),
            ),
        }
    }
}

impl From<fof::DefinedTerm<'_>> for FofTerm {
    fn from(t: fof::DefinedTerm) -> Self {
        match t {
            fof::DefinedTerm::Defined(d) => Self::from(d),
            fof::DefinedTerm::Atomic(_) => unimplemented!("defined atomic terms are not supported"),
        }
    }
}

// Numbers and distinct objects read as opaque constants, their theories are not interpreted.
impl From<tptp::common::DefinedTerm<'_>> for FofTerm {
    fn from(t: tptp::common::DefinedTerm) -> Self {
        match t {
            tptp::common::DefinedTerm::Number(n) => {
                Self::Function(Name::Parsed(n.to_string()), Vec::new())
            }
            tptp::common::DefinedTerm::Distinct(d) => {
                Self::Function(Name::Parsed(d.to_string()), Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn var(name: &str) -> FofTerm {
        FofTerm::Variable(name.to_string())
    }

    fn fun(name: &str, args: Vec<FofTerm>) -> FofTerm {
        FofTerm::Function(Name::Parsed(name.to_string()), args)
    }

    #[test]
    fn negate_swaps_quantifiers() {
        let atom = Formula::Literal(FofLiteral::Eq(var("X"), var("Y")));
        let formula = Formula::Forall(
            vec!["X".to_string()],
            Box::new(Formula::Exists(
                vec!["Y".to_string()],
                Box::new(atom.clone()),
            )),
        );
        let expected = Formula::Exists(
            vec!["X".to_string()],
            Box::new(Formula::Forall(
                vec!["Y".to_string()],
                Box::new(Formula::Literal(FofLiteral::Ne(var("X"), var("Y")))),
            )),
        );
        assert_eq!(negate(formula.clone()), expected);
        assert_eq!(negate(negate(formula.clone())), formula);
    }

    #[test]
    fn parses_roles_and_connectives() {
        let problem = parse_str(
            "fof(ax, axiom, ![X]: (p(X) => q(X))).
             fof(goal, conjecture, q(a)).
             fof(absurd, hypothesis, $false).",
        );
        assert_eq!(problem.axioms.len(), 2);
        assert_eq!(problem.conjectures.len(), 1);
        assert!(problem.negated_conjectures.is_empty());

        let expected_axiom = Formula::Forall(
            vec!["X".to_string()],
            Box::new(Formula::Or(vec![
                Formula::Literal(FofLiteral::Ne(fun("p", vec![var("X")]), fof_true())),
                Formula::Literal(FofLiteral::Eq(fun("q", vec![var("X")]), fof_true())),
            ])),
        );
        assert_eq!(problem.axioms[0], expected_axiom);
        assert_eq!(
            problem.axioms[1],
            Formula::Literal(FofLiteral::Ne(fof_true(), fof_true()))
        );
        assert_eq!(
            problem.conjectures[0],
            Formula::Literal(FofLiteral::Eq(fun("q", vec![fun("a", vec![])]), fof_true()))
        );
    }

    #[test]
    fn parses_equations_and_inequations() {
        let problem = parse_str("fof(ax, axiom, ![X]: (f(X) = X & g(X) != X)).");
        let expected = Formula::Forall(
            vec!["X".to_string()],
            Box::new(Formula::And(vec![
                Formula::Literal(FofLiteral::Eq(fun("f", vec![var("X")]), var("X"))),
                Formula::Literal(FofLiteral::Ne(fun("g", vec![var("X")]), var("X"))),
            ])),
        );
        assert_eq!(problem.axioms, vec![expected]);
    }
}
