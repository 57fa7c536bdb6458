//! WXDICT Core Types
//!
//! This crate provides the foundational types used throughout wxdict:
//! - Handle types (UnitId, SourceId, ElementId, FieldId, ...)
//! - Keyword enumerations (SourceType, LevelType, FieldType, ...)
//! - The identifier table used for name and alias resolution
//! - Linear unit conversion arithmetic
//! - Validity and one-time guard flags

mod id;
mod ident;
mod kinds;
mod units;
mod validity;

pub use id::*;
pub use ident::*;
pub use kinds::*;
pub use units::*;
pub use validity::*;
