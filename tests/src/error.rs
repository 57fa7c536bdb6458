//! Fixture errors.

use std::path::PathBuf;
use thiserror::Error;

/// Problems preparing a configuration tree for a test.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("cannot create scratch directory: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("fixture '{0}' does not exist")]
    Missing(String),
}

pub type FixtureResult<T> = Result<T, FixtureError>;
