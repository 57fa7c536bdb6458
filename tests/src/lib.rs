//! Integration test support for wxdict.
//!
//! Tests read configuration trees the way the analysis application does:
//! a root file found through search directories, with includes resolved
//! next to the including file. Fixture trees live under `fixtures/`;
//! scratch trees are written to a temporary directory.

mod error;
mod expect;
mod fixture;

pub use error::{FixtureError, FixtureResult};
pub use expect::*;
pub use fixture::*;

/// Prelude for convenient imports in tests.
pub mod prelude {
    pub use crate::{
        assert_clean, assert_close, assert_reported, problem_classes, Fixture, FixtureError,
        FixtureResult, ScratchConfig,
    };
    pub use wxdict_core::{FieldKind, LevelType, SourceType, TimeType};
    pub use wxdict_registry::{ConfigError, ConfigStore, ErrorClass, LoaderOptions, RegistryKind};
}
