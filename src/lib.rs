//! # Saturn
//! This library implements the Saturn superposition prover. The pipeline reads TPTP FOF
//! problems through [tptp_parser], clausifies them in [cnf] and hands the resulting clauses
//! to the given clause saturation loop in [superposition]. The remaining modules supply the
//! machinery this loop runs on, from the hash consed [term_bank] to the simplification and
//! redundancy indexes behind [proof_state].

pub mod clause;
pub mod clause_queue;
pub mod cnf;
pub mod discr_tree;
pub mod error;
pub mod feature_vector;
pub mod kbo;
pub mod matching;
pub mod multi_set;
pub mod persistent_vec_iter;
pub mod position;
pub mod pretty_print;
pub mod proof_state;
pub mod proofs;
pub mod selection;
pub mod simplifier;
pub mod subst;
pub mod subsume;
pub mod superposition;
pub mod term_bank;
pub mod term_manager;
pub mod tptp_parser;
pub mod trie;
pub mod trivial;
pub mod unify;
