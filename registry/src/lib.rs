//! WXDICT Registry
//!
//! The metadata dictionary itself. A [`ConfigStore`] owns nine registries
//! (units, constants, sources, groups, levels, elements, fields,
//! cross-references and sample types). Each registry is read from the
//! configuration once, on first use, after the registries it depends on.
//!
//! Lookups come in two strengths:
//! - `identify_*` loads the registry and resolves a name or alias
//! - `get_*_info` additionally re-reads the record's blocks for its detail
//!   (allied models, editors, sampling, labelling, ...), applies defaults
//!   and runs the cross-record checks, once per record

mod allied;
mod constants;
mod crossrefs;
mod detail;
mod elements;
mod error;
mod fields;
mod groups;
mod levels;
mod options;
mod samples;
mod section;
mod sources;
mod store;
mod table;
mod units;
mod variant;

pub use allied::*;
pub use constants::*;
pub use crossrefs::*;
pub use detail::*;
pub use elements::*;
pub use error::*;
pub use fields::*;
pub use groups::*;
pub use levels::*;
pub use options::*;
pub use samples::*;
pub use section::{Labels, Section};
pub use sources::*;
pub use store::*;
pub use units::*;
pub use variant::*;
