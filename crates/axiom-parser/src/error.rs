//! Parser error types

use thiserror::Error;

/// Why a rule block was not turned into a [`ParsedRule`](axiom_model::ParsedRule)
///
/// These are skip reasons, not fatal errors: batch parsing logs them and
/// moves on to the next block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: block does not start with `rule`")]
    NotARule { line: usize },

    #[error("line {line}: rule has no rewrite arrow")]
    NoRewriteArrow { line: usize },

    #[error("line {line}: rule has an empty left-hand side")]
    EmptyLhs { line: usize },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::NotARule { line } => *line,
            ParseError::NoRewriteArrow { line } => *line,
            ParseError::EmptyLhs { line } => *line,
        }
    }
}
