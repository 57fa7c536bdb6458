//! WXDICT Parser
//!
//! This crate reads the nested-brace configuration language:
//! - Source providers (filesystem search paths, in-memory texts)
//! - The token stream (comments, continuation lines, includes, revision
//!   line, seek-based re-reading)
//! - The block reader (recursive descent over `{` / `}` frames)
//! - Error handling with file and line information

mod block;
mod error;
mod provider;
mod stream;

pub use block::*;
pub use error::*;
pub use provider::*;
pub use stream::*;
