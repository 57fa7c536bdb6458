//! Parser error types.

use crate::Position;
use thiserror::Error;

/// Errors raised while reading configuration text.
///
/// All of these are structural: the block being read is abandoned and
/// reading resumes at the next top-level block.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("cannot open config file '{name}': {reason}")]
    Open { name: String, reason: String },

    #[error("{pos}: recursive include of '{name}'")]
    IncludeCycle { name: String, pos: Position },

    #[error("{pos}: include names no file")]
    EmptyInclude { pos: Position },

    #[error("'{file}': revision {found} is newer than supported revision {supported}")]
    UnsupportedRevision {
        file: String,
        found: f64,
        supported: f64,
    },

    #[error("'{file}': unreadable revision '{found}'")]
    BadRevision { file: String, found: String },

    #[error("{pos}: block '{block}' does not open with '{{'")]
    MissingOpenBrace { block: String, pos: Position },

    #[error("{pos}: unexpected '{{'")]
    UnexpectedOpen { pos: Position },

    #[error("{pos}: unmatched '}}'")]
    UnexpectedClose { pos: Position },

    #[error("{pos}: end of input inside '{block}'")]
    UnclosedBlock { block: String, pos: Position },

    #[error("{pos}: cannot reposition stream: {reason}")]
    BadPosition { pos: Position, reason: String },

    #[error("invalid substitution pattern: {0}")]
    Pattern(String),
}

impl ParseError {
    pub fn open(name: impl Into<String>, reason: impl ToString) -> Self {
        ParseError::Open {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// The location the error refers to, when it has one.
    pub fn position(&self) -> Option<&Position> {
        match self {
            ParseError::IncludeCycle { pos, .. }
            | ParseError::EmptyInclude { pos }
            | ParseError::MissingOpenBrace { pos, .. }
            | ParseError::UnexpectedOpen { pos }
            | ParseError::UnexpectedClose { pos }
            | ParseError::UnclosedBlock { pos, .. }
            | ParseError::BadPosition { pos, .. } => Some(pos),
            ParseError::Open { .. }
            | ParseError::UnsupportedRevision { .. }
            | ParseError::BadRevision { .. }
            | ParseError::Pattern(_) => None,
        }
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;
