use std::{cell::RefCell, collections::BTreeMap, fmt::Display};

use crate::{
    clause::{Clause, ClauseId},
    pretty_print::pretty_print,
    term_bank::TermBank,
};

use rustc_hash::FxHashSet;

/// What kind of proof graph to print.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum GraphvizMode {
    /// Only the clauses leading to the last derived one, i.e. the refutation cone.
    Last,
    /// All clauses ever derived.
    All,
}

/// The inference rules clauses can be derived by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofRule {
    /// An input clause, no parents.
    Input,
    /// A variable renamed copy of its single parent.
    Renaming,
    EqualityResolution,
    EqualityFactoring,
    Superposition,
    /// Demodulation with unit equations, the first parent is the rewritten clause.
    Rewriting,
    /// Removal of resolved literals (`s != s`) and duplicate literals.
    Simplification,
}

impl ProofRule {
    fn as_str(&self) -> &'static str {
        match self {
            ProofRule::Input => "input",
            ProofRule::Renaming => "rename",
            ProofRule::EqualityResolution => "eqres",
            ProofRule::EqualityFactoring => "eqfact",
            ProofRule::Superposition => "superpos",
            ProofRule::Rewriting => "rw",
            ProofRule::Simplification => "simp",
        }
    }
}

impl Display for ProofRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The provenance tag every clause carries: the rule it was derived by together with the
/// identifiers of the clauses that participated.
#[derive(Debug, Clone)]
pub struct ProofStep {
    pub rule: ProofRule,
    pub parents: Vec<ClauseId>,
}

impl ProofStep {
    pub fn new(rule: ProofRule, parents: Vec<ClauseId>) -> Self {
        Self { rule, parents }
    }

    pub fn input() -> Self {
        Self {
            rule: ProofRule::Input,
            parents: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct LoggedClause {
    id: ClauseId,
    clause_str: String,
    rule: ProofRule,
    parents: Vec<ClauseId>,
}

impl LoggedClause {
    fn to_graphviz(&self, buf: &mut String) {
        let description = format!(
            "{}\\ninference: {} ({})",
            self.clause_str, self.rule, self.id
        );
        buf.push_str(&format!(
            "{} [shape=box,label=\"{}\"]\n",
            self.id, &description
        ));
        for parent in self.parents.iter() {
            buf.push_str(&format!("{} -> {}\n", parent, self.id));
        }
    }
}

/// A log of every derived clause together with its proof step. When active it can
/// reconstruct the ancestry of any clause, in particular the refutation cone of the empty
/// clause, and render the derivation as graphviz.
#[derive(Debug, Clone)]
pub struct ProofLog {
    graph: RefCell<BTreeMap<ClauseId, LoggedClause>>,
    active: bool,
}

impl ProofLog {
    pub fn new(active: bool) -> ProofLog {
        ProofLog {
            graph: RefCell::new(BTreeMap::default()),
            active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Record a freshly derived clause. The proof step is read off the clause itself, all of
    /// its parents must have been logged before.
    pub fn log_clause(&self, new_clause: &Clause, term_bank: &TermBank) {
        if self.active {
            let step = new_clause.get_step();
            let clause_str = pretty_print(new_clause, term_bank);
            debug_assert!(!self.graph.borrow().contains_key(&new_clause.get_id()));
            debug_assert!(
                step.parents
                    .iter()
                    .all(|c| self.graph.borrow().contains_key(c))
            );
            self.graph.borrow_mut().insert(
                new_clause.get_id(),
                LoggedClause {
                    id: new_clause.get_id(),
                    clause_str,
                    rule: step.rule,
                    parents: step.parents.clone(),
                },
            );
        }
    }

    /// The proof step of a logged clause.
    pub fn get_step(&self, id: ClauseId) -> Option<ProofStep> {
        self.graph
            .borrow()
            .get(&id)
            .map(|logged| ProofStep::new(logged.rule, logged.parents.clone()))
    }

    /// All transitive ancestors of `id` including `id` itself, or `None` if the walk runs
    /// into a clause that was never logged. On success every leaf of the returned ancestry is
    /// an [ProofRule::Input] step.
    pub fn ancestors(&self, id: ClauseId) -> Option<Vec<ClauseId>> {
        let graph = self.graph.borrow();
        let mut visited = FxHashSet::default();
        let mut worklist = vec![id];
        let mut result = Vec::new();
        while let Some(next) = worklist.pop() {
            if !visited.insert(next) {
                continue;
            }
            let logged = graph.get(&next)?;
            result.push(next);
            worklist.extend(logged.parents.iter().copied());
        }
        Some(result)
    }

    fn to_graphviz_prefix(&self, buf: &mut String) {
        buf.push_str("digraph proof {\n");
        buf.push_str("rankdir = TB\n");
        buf.push_str("graph [splines=true overlap=false];\n");
    }

    fn to_graphviz_all(&self) -> String {
        let mut buf = String::new();
        self.to_graphviz_prefix(&mut buf);
        let graph = self.graph.borrow();
        for (_, logged) in graph.iter() {
            logged.to_graphviz(&mut buf);
        }

        buf.push('}');

        buf
    }

    fn to_graphviz_last(&self) -> String {
        let mut buf = String::new();
        self.to_graphviz_prefix(&mut buf);
        let graph = self.graph.borrow();
        if let Some((last, _)) = graph.last_key_value() {
            let mut visited = FxHashSet::default();
            let mut worklist = vec![*last];
            while let Some(id) = worklist.pop() {
                if !visited.insert(id) {
                    continue;
                }
                if let Some(logged) = graph.get(&id) {
                    logged.to_graphviz(&mut buf);
                    worklist.extend(
                        logged
                            .parents
                            .iter()
                            .filter(|id| !visited.contains(*id))
                            .copied(),
                    );
                }
            }
        }

        buf.push('}');

        buf
    }

    pub fn to_graphviz(&self, mode: GraphvizMode) -> String {
        match mode {
            GraphvizMode::Last => self.to_graphviz_last(),
            GraphvizMode::All => self.to_graphviz_all(),
        }
    }
}
