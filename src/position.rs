use crate::{
    clause::{Clause, ClauseId, ClauseSet, Literal, LiteralId},
    error::EngineError,
    term_bank::{Term, TermBank, TermNode},
};

/// A position inside a term, represented as an offset into the prefix (depth first, left to
/// right) traversal of the term. Offset 0 is the term itself, the last valid offset is
/// `weight - 1`. This is the same linearization the discrimination tree keys on, so positions
/// found while walking flatterms translate directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TermPosition(usize);

impl TermPosition {
    pub fn root() -> Self {
        Self(0)
    }

    pub fn of_offset(offset: usize) -> Self {
        Self(offset)
    }

    pub fn offset(&self) -> usize {
        self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == 0
    }
}

impl Term {
    /// The subterm at `pos`, or `None` if the offset is outside the term. Descends by
    /// consuming the cached child weights instead of walking the whole prefix traversal.
    pub fn subterm_at(&self, pos: TermPosition) -> Option<&Term> {
        let mut term = self;
        let mut offset = pos.offset();
        'descend: while offset > 0 {
            offset -= 1;
            match &**term {
                TermNode::Var { .. } => return None,
                TermNode::App { args, .. } => {
                    for arg in args {
                        let weight = arg.weight() as usize;
                        if offset < weight {
                            term = arg;
                            continue 'descend;
                        }
                        offset -= weight;
                    }
                    return None;
                }
            }
        }
        Some(term)
    }

    /// Rebuild this term with the subterm at `pos` replaced by `replacement`. `None` if the
    /// offset is outside the term.
    pub fn replace_at(
        &self,
        pos: TermPosition,
        replacement: &Term,
        bank: &TermBank,
    ) -> Option<Term> {
        let mut offset = pos.offset();
        if offset == 0 {
            return Some(replacement.clone());
        }
        offset -= 1;
        match &**self {
            TermNode::Var { .. } => None,
            TermNode::App { id, args, .. } => {
                let mut new_args = Vec::with_capacity(args.len());
                let mut replaced = false;
                for arg in args {
                    if replaced {
                        new_args.push(arg.clone());
                        continue;
                    }
                    let weight = arg.weight() as usize;
                    if offset < weight {
                        let rebuilt =
                            arg.replace_at(TermPosition::of_offset(offset), replacement, bank)?;
                        new_args.push(rebuilt);
                        replaced = true;
                    } else {
                        offset -= weight;
                        new_args.push(arg.clone());
                    }
                }
                if !replaced {
                    return None;
                }
                Some(bank.mk_app(*id, new_args))
            }
        }
    }

    /// All subterms in prefix order, paired with their positions. The root comes first at
    /// offset 0.
    pub fn subterms(&self) -> SubtermIter<'_> {
        SubtermIter {
            stack: vec![self],
            next_offset: 0,
        }
    }
}

pub struct SubtermIter<'a> {
    stack: Vec<&'a Term>,
    next_offset: usize,
}

impl<'a> Iterator for SubtermIter<'a> {
    type Item = (TermPosition, &'a Term);

    fn next(&mut self) -> Option<Self::Item> {
        let term = self.stack.pop()?;
        let pos = TermPosition::of_offset(self.next_offset);
        self.next_offset += 1;
        if let TermNode::App { args, .. } = &**term {
            self.stack.extend(args.iter().rev());
        }
        Some((pos, term))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralSide {
    Left,
    Right,
}

impl LiteralSide {
    pub fn flip(&self) -> LiteralSide {
        match self {
            LiteralSide::Left => LiteralSide::Right,
            LiteralSide::Right => LiteralSide::Left,
        }
    }
}

/// A term position inside one side of a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LiteralPosition {
    pub side: LiteralSide,
    pub term_pos: TermPosition,
}

impl LiteralPosition {
    pub fn new(side: LiteralSide, term_pos: TermPosition) -> Self {
        Self { side, term_pos }
    }

    pub fn resolve<'a>(&self, literal: &'a Literal) -> Option<&'a Term> {
        literal.get_side(self.side).subterm_at(self.term_pos)
    }
}

/// A term position inside one literal of a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClausePosition {
    pub literal_id: LiteralId,
    pub literal_pos: LiteralPosition,
}

impl ClausePosition {
    pub fn new(literal_id: LiteralId, literal_pos: LiteralPosition) -> Self {
        Self {
            literal_id,
            literal_pos,
        }
    }

    pub fn resolve<'a>(&self, clause: &'a Clause) -> Result<&'a Term, EngineError> {
        let literal =
            clause
                .get_literal(self.literal_id)
                .ok_or(EngineError::LiteralNotFound {
                    clause: clause.get_id(),
                    literal: self.literal_id,
                })?;
        self.literal_pos
            .resolve(literal)
            .ok_or(EngineError::PositionOutOfTerm {
                clause: clause.get_id(),
                offset: self.literal_pos.term_pos.offset(),
            })
    }
}

/// A term position inside one clause of a clause set. This is what the subterm index stores,
/// so resolution failures mean an index went out of sync and surface as [EngineError].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClauseSetPosition {
    pub clause_id: ClauseId,
    pub clause_pos: ClausePosition,
}

impl ClauseSetPosition {
    pub fn new(clause_id: ClauseId, clause_pos: ClausePosition) -> Self {
        Self {
            clause_id,
            clause_pos,
        }
    }

    pub fn resolve<'a>(&self, clauses: &'a ClauseSet) -> Result<&'a Term, EngineError> {
        let clause = clauses
            .get_by_id(self.clause_id)
            .ok_or(EngineError::ClauseNotFound {
                id: self.clause_id,
                context: "resolving a subterm index entry",
            })?;
        self.clause_pos.resolve(clause)
    }
}

/// A whole literal side inside one clause of a clause set, the entry type of the rewrite
/// index. The indexed term is the side named by `side`, the rewrite replacement is the
/// flipped side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClauseSetLiteralPosition {
    pub clause_id: ClauseId,
    pub literal_id: LiteralId,
    pub side: LiteralSide,
}

impl ClauseSetLiteralPosition {
    pub fn new(clause_id: ClauseId, literal_id: LiteralId, side: LiteralSide) -> Self {
        Self {
            clause_id,
            literal_id,
            side,
        }
    }

    pub fn resolve<'a>(
        &self,
        clauses: &'a ClauseSet,
    ) -> Result<(&'a Clause, &'a Literal), EngineError> {
        let clause = clauses
            .get_by_id(self.clause_id)
            .ok_or(EngineError::ClauseNotFound {
                id: self.clause_id,
                context: "resolving a rewrite index entry",
            })?;
        let literal =
            clause
                .get_literal(self.literal_id)
                .ok_or(EngineError::LiteralNotFound {
                    clause: self.clause_id,
                    literal: self.literal_id,
                })?;
        Ok((clause, literal))
    }
}
