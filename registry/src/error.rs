//! Configuration error types.

use crate::Section;
use std::fmt;
use thiserror::Error;
use wxdict_parser::{Entry, ParseError, Position};

/// How far an error reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Malformed nesting or an unreadable file; the block is skipped.
    Structural,
    /// Unknown keyword, missing `=`, name collision; the record is invalid.
    Declaration,
    /// Unparsable value; the record is invalid.
    Value,
    /// A reference to another record does not resolve or does not fit.
    CrossRecord,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorClass::Structural => "structural",
            ErrorClass::Declaration => "declaration",
            ErrorClass::Value => "value",
            ErrorClass::CrossRecord => "cross-record",
        };
        f.write_str(name)
    }
}

/// A problem found while loading or resolving definitions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{pos}: unrecognized block '{name}'")]
    UnknownBlock { name: String, pos: Position },

    #[error("{pos}: '{keyword}' is not recognized in {section} '{record}'")]
    UnknownKeyword {
        keyword: String,
        section: Section,
        record: String,
        pos: Position,
    },

    #[error("{pos}: missing '=' after '{keyword}' in '{record}'")]
    MissingEquals {
        keyword: String,
        record: String,
        pos: Position,
    },

    #[error("{pos}: '{record}' must be followed by a block")]
    ExpectedBlock { record: String, pos: Position },

    #[error("'{record}': name '{name}' already belongs to another definition")]
    AliasCollision { record: String, name: String },

    #[error("{pos}: bad value for '{keyword}' in '{record}': {reason}")]
    BadValue {
        keyword: String,
        record: String,
        reason: String,
        pos: Position,
    },

    #[error("'{record}': {reason}")]
    Inconsistent { record: String, reason: String },
}

impl ConfigError {
    pub fn unknown_keyword(entry: &Entry, section: Section, record: &str) -> Self {
        ConfigError::UnknownKeyword {
            keyword: entry.key.clone(),
            section,
            record: record.to_string(),
            pos: entry.pos.clone(),
        }
    }

    pub fn missing_equals(entry: &Entry, record: &str) -> Self {
        ConfigError::MissingEquals {
            keyword: entry.key.clone(),
            record: record.to_string(),
            pos: entry.pos.clone(),
        }
    }

    pub fn expected_block(entry: &Entry) -> Self {
        ConfigError::ExpectedBlock {
            record: entry.label(),
            pos: entry.pos.clone(),
        }
    }

    pub fn bad_value(entry: &Entry, record: &str, reason: impl Into<String>) -> Self {
        ConfigError::BadValue {
            keyword: entry.key.clone(),
            record: record.to_string(),
            reason: reason.into(),
            pos: entry.pos.clone(),
        }
    }

    pub fn inconsistent(record: &str, reason: impl Into<String>) -> Self {
        ConfigError::Inconsistent {
            record: record.to_string(),
            reason: reason.into(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            ConfigError::Parse(_) | ConfigError::UnknownBlock { .. } => ErrorClass::Structural,
            ConfigError::UnknownKeyword { .. }
            | ConfigError::MissingEquals { .. }
            | ConfigError::ExpectedBlock { .. }
            | ConfigError::AliasCollision { .. } => ErrorClass::Declaration,
            ConfigError::BadValue { .. } => ErrorClass::Value,
            ConfigError::Inconsistent { .. } => ErrorClass::CrossRecord,
        }
    }

    /// The record the error belongs to, if it is record-scoped.
    pub fn record(&self) -> Option<&str> {
        match self {
            ConfigError::UnknownKeyword { record, .. }
            | ConfigError::MissingEquals { record, .. }
            | ConfigError::ExpectedBlock { record, .. }
            | ConfigError::AliasCollision { record, .. }
            | ConfigError::BadValue { record, .. }
            | ConfigError::Inconsistent { record, .. } => Some(record),
            ConfigError::Parse(_) | ConfigError::UnknownBlock { .. } => None,
        }
    }
}

/// Result type for keyword handlers.
pub type ConfigResult<T> = Result<T, ConfigError>;
