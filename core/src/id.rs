//! Handle types for dictionary records.
//!
//! Every record lives in an append-only registry, so a handle is just the
//! record's position in that registry. Handles are:
//! - Stable for the lifetime of the store
//! - Cheap to copy and compare
//! - Opaque to external users

use std::fmt;

/// A registry handle that can be built from, and turned back into, an index.
pub trait Handle: Copy + Eq + std::hash::Hash + fmt::Debug {
    /// Create a handle from a registry index.
    fn from_index(index: usize) -> Self;

    /// Get the registry index.
    fn index(self) -> usize;
}

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            /// Create a new handle from a raw value.
            pub fn new(id: u32) -> Self {
                Self(id)
            }

            /// Get the raw value.
            pub fn raw(&self) -> u32 {
                self.0
            }
        }

        impl Handle for $name {
            fn from_index(index: usize) -> Self {
                Self(index as u32)
            }

            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

handle!(
    /// Handle to a physical unit.
    UnitId,
    "unit"
);
handle!(
    /// Handle to a named constant.
    ConstantId,
    "const"
);
handle!(
    /// Handle to a data source.
    SourceId,
    "src"
);
handle!(
    /// Handle to a field or element group.
    GroupId,
    "grp"
);
handle!(
    /// Handle to a level.
    LevelId,
    "lev"
);
handle!(
    /// Handle to an element.
    ElementId,
    "elem"
);
handle!(
    /// Handle to an element×level field.
    FieldId,
    "fld"
);
handle!(
    /// Handle to a wind or value cross-reference.
    CrossRefId,
    "xref"
);
handle!(
    /// Handle to a value or wind sample type.
    SampleId,
    "samp"
);

/// A source together with one of its subsources.
///
/// Subsource 0 is the source's implicit default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceRef {
    pub source: SourceId,
    pub sub: usize,
}

impl SourceRef {
    pub fn new(source: SourceId, sub: usize) -> Self {
        Self { source, sub }
    }

    /// Returns true if this refers to the source's default subsource.
    pub fn is_default_sub(&self) -> bool {
        self.sub == 0
    }
}
