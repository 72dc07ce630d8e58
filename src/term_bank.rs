use std::fmt::Display;
use std::hash::{DefaultHasher, Hash, Hasher};

use rustc_hash::FxHashMap;

use crate::term_manager::{InternTable, Interned};

// Shared term representation in the style of:
// https://wwwlehre.dhbw-stuttgart.de/~sschulz/PAPERS/Schulz-IWIL-2025.pdf

/// The sort of a term. First order objects live in [Sort::Individual], the encoding of
/// predicate atoms as equations with the builtin `$true` constant lives in [Sort::Prop].
/// Unification never mixes the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sort {
    Individual,
    Prop,
}

/// The name of a function symbol. Builtin names render with a `$` prefix, skolem symbols are
/// numbered so they can never clash with parsed input names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Name {
    Builtin(&'static str),
    Parsed(String),
    Skolem(u32),
}

impl Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Name::Builtin(name) => write!(f, "${name}"),
            Name::Parsed(name) => write!(f, "{name}"),
            Name::Skolem(idx) => write!(f, "sk{idx}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionInformation {
    pub name: Name,
    pub arity: usize,
    pub sort: Sort,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariableInformation {
    pub name: String,
    pub sort: Sort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionIdentifier(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariableIdentifier(u32);

/// Data cached at every term node on construction:
/// - the structural hash, making interned hashing O(1),
/// - the weight, i.e. the number of nodes, which doubles as the length of the prefix order
///   traversal and as the KBO weight,
/// - the variable multiset as a sorted slice (with duplicates), making ground tests, occurs
///   checks and variable counting cheap.
#[derive(Debug, PartialEq, Eq)]
pub struct TermData {
    hash: u64,
    weight: u32,
    vars: Box<[VariableIdentifier]>,
}

impl TermData {
    fn new(hash: u64, weight: u32, vars: Box<[VariableIdentifier]>) -> Self {
        Self { hash, weight, vars }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum TermNode {
    Var {
        id: VariableIdentifier,
        data: TermData,
    },
    App {
        id: FunctionIdentifier,
        args: Vec<Term>,
        data: TermData,
    },
}

pub type Term = Interned<TermNode>;

impl Hash for TermNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u64(self.get_data().hash);
    }
}

impl TermNode {
    fn get_data(&self) -> &TermData {
        match self {
            TermNode::Var { data, .. } | TermNode::App { data, .. } => data,
        }
    }

    pub fn is_ground(&self) -> bool {
        self.get_data().vars.is_empty()
    }

    /// The cached structural hash.
    pub fn hash_code(&self) -> u64 {
        self.get_data().hash
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, TermNode::Var { .. })
    }

    /// Number of nodes in the term tree, also the length of its prefix order traversal.
    pub fn weight(&self) -> u32 {
        self.get_data().weight
    }

    /// The cached variable multiset as a sorted slice, duplicates included.
    pub fn vars(&self) -> &[VariableIdentifier] {
        &self.get_data().vars
    }

    pub fn occurs(&self, var: VariableIdentifier) -> bool {
        self.vars().binary_search(&var).is_ok()
    }

    /// How often `var` occurs in this term.
    pub fn var_count(&self, var: VariableIdentifier) -> usize {
        let vars = self.vars();
        vars.partition_point(|v| *v <= var) - vars.partition_point(|v| *v < var)
    }

    /// The distinct variables of this term in ascending identifier order.
    pub fn distinct_vars(&self) -> impl Iterator<Item = VariableIdentifier> + '_ {
        let vars = self.vars();
        vars.iter()
            .enumerate()
            .filter(move |(i, v)| *i == 0 || vars[i - 1] != **v)
            .map(|(_, v)| *v)
    }

    pub fn sort(&self, bank: &TermBank) -> Sort {
        match self {
            TermNode::Var { id, .. } => bank.get_variable_info(*id).sort,
            TermNode::App { id, .. } => bank.get_function_info(*id).sort,
        }
    }
}

#[derive(Debug)]
pub struct TermBank {
    intern_table: InternTable<TermNode>,
    variable_bank: Vec<VariableInformation>,
    function_bank: Vec<FunctionInformation>,
    function_names: FxHashMap<Name, FunctionIdentifier>,
    true_function: FunctionIdentifier,
}

impl TermBank {
    pub fn new() -> Self {
        let mut bank = Self {
            intern_table: InternTable::new(),
            variable_bank: Vec::new(),
            function_bank: Vec::new(),
            function_names: FxHashMap::default(),
            true_function: FunctionIdentifier(0),
        };
        bank.true_function = bank.add_function(FunctionInformation {
            name: Name::Builtin("true"),
            arity: 0,
            sort: Sort::Prop,
        });
        bank
    }

    pub fn add_variable(&mut self, info: VariableInformation) -> VariableIdentifier {
        let size = self.variable_bank.len();
        self.variable_bank.push(info);
        VariableIdentifier(size.try_into().unwrap())
    }

    pub fn add_function(&mut self, info: FunctionInformation) -> FunctionIdentifier {
        let size = self.function_bank.len();
        let id = FunctionIdentifier(size.try_into().unwrap());
        self.function_names.insert(info.name.clone(), id);
        self.function_bank.push(info);
        id
    }

    /// Look a function symbol up by name, registering it on first sight. Arities of repeated
    /// registrations have to agree, the input is ill formed otherwise.
    pub fn get_or_add_function(&mut self, info: FunctionInformation) -> FunctionIdentifier {
        match self.function_names.get(&info.name) {
            Some(id) => {
                debug_assert_eq!(self.get_function_info(*id).arity, info.arity);
                *id
            }
            None => self.add_function(info),
        }
    }

    pub fn get_variable_info(&self, id: VariableIdentifier) -> &VariableInformation {
        &self.variable_bank[id.0 as usize]
    }

    pub fn get_function_info(&self, id: FunctionIdentifier) -> &FunctionInformation {
        &self.function_bank[id.0 as usize]
    }

    /// The builtin `$true` constant that predicate atoms are equated with.
    pub fn true_function(&self) -> FunctionIdentifier {
        self.true_function
    }

    pub fn mk_true(&self) -> Term {
        self.mk_const(self.true_function)
    }

    /// Evict all terms no longer referenced by any live clause or index.
    pub fn gc(&self) {
        self.intern_table.gc();
    }

    /// The number of term allocations currently interned.
    pub fn term_count(&self) -> usize {
        self.intern_table.len()
    }

    pub fn mk_variable(&self, id: VariableIdentifier) -> Term {
        let mut hasher = DefaultHasher::new();
        hasher.write_u32(id.0);
        let var = TermNode::Var {
            id,
            data: TermData::new(hasher.finish(), 1, Box::new([id])),
        };
        self.intern_table.intern(var)
    }

    pub fn mk_fresh_variable(&mut self, info: VariableInformation) -> Term {
        let id = self.add_variable(info);
        self.mk_variable(id)
    }

    /// A fresh variable of the same sort as `old`, used when renaming clauses apart.
    pub fn mk_replacement_variable(&mut self, old: VariableIdentifier) -> Term {
        let sort = self.get_variable_info(old).sort;
        let name = format!("X{}", self.variable_bank.len());
        self.mk_fresh_variable(VariableInformation { name, sort })
    }

    pub fn mk_app(&self, id: FunctionIdentifier, args: Vec<Term>) -> Term {
        debug_assert_eq!(self.get_function_info(id).arity, args.len());
        let mut hasher = DefaultHasher::new();
        hasher.write_u32(id.0);
        args.iter().for_each(|arg| arg.hash(&mut hasher));
        let hash = hasher.finish();
        let weight = 1 + args.iter().map(|arg| arg.weight()).sum::<u32>();
        let mut vars = Vec::with_capacity(args.iter().map(|arg| arg.vars().len()).sum());
        for arg in &args {
            vars.extend_from_slice(arg.vars());
        }
        vars.sort_unstable();
        let app = TermNode::App {
            id,
            args,
            data: TermData::new(hash, weight, vars.into_boxed_slice()),
        };
        self.intern_table.intern(app)
    }

    pub fn mk_const(&self, id: FunctionIdentifier) -> Term {
        self.mk_app(id, vec![])
    }
}

impl Default for TermBank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn individual_fn(name: &str, arity: usize) -> FunctionInformation {
        FunctionInformation {
            name: Name::Parsed(name.to_string()),
            arity,
            sort: Sort::Individual,
        }
    }

    fn individual_var(name: &str) -> VariableInformation {
        VariableInformation {
            name: name.to_string(),
            sort: Sort::Individual,
        }
    }

    #[test]
    fn cached_term_data() {
        let mut bank = TermBank::new();
        let f = bank.add_function(individual_fn("f", 2));
        let a = bank.add_function(individual_fn("a", 0));
        let x = bank.add_variable(individual_var("X"));
        let y = bank.add_variable(individual_var("Y"));

        let a_term = bank.mk_const(a);
        let x_term = bank.mk_variable(x);
        let y_term = bank.mk_variable(y);
        // f(f(X, a), X)
        let inner = bank.mk_app(f, vec![x_term.clone(), a_term.clone()]);
        let t = bank.mk_app(f, vec![inner.clone(), x_term.clone()]);

        assert!(a_term.is_ground());
        assert!(!t.is_ground());
        assert_eq!(t.weight(), 5);
        assert_eq!(t.vars(), &[x, x]);
        assert_eq!(t.var_count(x), 2);
        assert_eq!(t.var_count(y), 0);
        assert!(t.occurs(x));
        assert!(!t.occurs(y));
        assert_eq!(t.distinct_vars().collect::<Vec<_>>(), vec![x]);
        assert!(!y_term.is_ground());
    }

    #[test]
    fn perfect_sharing() {
        let mut bank = TermBank::new();
        let g = bank.add_function(individual_fn("g", 1));
        let a = bank.add_function(individual_fn("a", 0));

        let t1 = bank.mk_app(g, vec![bank.mk_const(a)]);
        let t2 = bank.mk_app(g, vec![bank.mk_const(a)]);
        assert_eq!(t1, t2);
        assert_eq!(t1.as_ptr(), t2.as_ptr());
    }

    #[test]
    fn builtin_true() {
        let bank = TermBank::new();
        let t = bank.mk_true();
        assert!(t.is_ground());
        assert_eq!(t.sort(&bank), Sort::Prop);
        assert_eq!(format!("{}", bank.get_function_info(bank.true_function()).name), "$true");
    }

    #[test]
    fn function_name_dedup() {
        let mut bank = TermBank::new();
        let f1 = bank.get_or_add_function(individual_fn("f", 1));
        let f2 = bank.get_or_add_function(individual_fn("f", 1));
        let g = bank.get_or_add_function(individual_fn("g", 1));
        assert_eq!(f1, f2);
        assert_ne!(f1, g);
    }
}
