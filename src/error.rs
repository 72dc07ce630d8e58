use std::fmt::Display;

use crate::clause::{ClauseId, LiteralId};

/// Structural invariant violations inside the engine. These are never raised for expected
/// outcomes like failed unification or redundant clauses, only for states the engine promises
/// can not occur, e.g. an index entry pointing at a clause that has left the clause set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    ClauseNotFound {
        id: ClauseId,
        context: &'static str,
    },
    LiteralNotFound {
        clause: ClauseId,
        literal: LiteralId,
    },
    PositionOutOfTerm {
        clause: ClauseId,
        offset: usize,
    },
}

impl Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::ClauseNotFound { id, context } => {
                write!(f, "clause {id} is gone from the clause set while {context}")
            }
            EngineError::LiteralNotFound { clause, literal } => {
                write!(f, "literal {literal} does not exist in clause {clause}")
            }
            EngineError::PositionOutOfTerm { clause, offset } => {
                write!(f, "term offset {offset} does not resolve in clause {clause}")
            }
        }
    }
}

impl std::error::Error for EngineError {}
