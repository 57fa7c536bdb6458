//! Keyword enumerations.
//!
//! Each enumeration maps to the keyword values accepted in configuration
//! files. Keyword matching is case-insensitive; the first spelling listed is
//! the canonical one.

use std::fmt;

macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $kw:literal $(| $alt:literal)*),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Parse a configuration keyword.
            pub fn from_keyword(word: &str) -> Option<Self> {
                $(
                    if word.eq_ignore_ascii_case($kw) $(|| word.eq_ignore_ascii_case($alt))* {
                        return Some($name::$variant);
                    }
                )+
                None
            }

            /// The canonical configuration keyword.
            pub fn keyword(self) -> &'static str {
                match self {
                    $($name::$variant => $kw),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.keyword())
            }
        }
    };
}

// ==================== Sources ====================

keyword_enum! {
    /// What kind of data a source supplies.
    pub enum SourceType {
        Depiction => "Depiction",
        Guidance => "Guidance",
        Allied => "Allied",
        Maps => "Maps",
        Direct => "Direct",
        Any => "Any",
        NotUsed => "NotUsed",
    }
}

impl SourceType {
    /// Returns true if a source of type `self` satisfies a query for `wanted`.
    pub fn matches(self, wanted: SourceType) -> bool {
        wanted == SourceType::Any || self == wanted
    }
}

keyword_enum! {
    /// Resource lists in an allied model descriptor.
    pub enum AlliedKind {
        Programs => "programs",
        Files => "files",
        Fields => "required_fields",
        WindCrossRefs => "required_wind_crossrefs",
        ValueCrossRefs => "required_value_crossrefs",
        Metafiles => "metafiles",
    }
}

// ==================== Levels ====================

keyword_enum! {
    /// Vertical level types, shared by levels and elements.
    pub enum LevelType {
        Msl => "Msl" | "MSL",
        Surface => "Surface",
        Level => "Level",
        Layer => "Layer",
        Geography => "Geography",
        Annotation => "Annotation",
        Any => "Any",
        NotUsed => "NotUsed",
    }
}

impl LevelType {
    /// Whether an element declared with `self` can be paired with a level
    /// of type `level`.
    ///
    /// `Any` on the element side accepts every level and `Any` on the level
    /// side is accepted by every element. A `Level` element also accepts a
    /// `Surface` level, but not the reverse. `NotUsed` never pairs.
    pub fn accepts(self, level: LevelType) -> bool {
        use LevelType::*;
        match (self, level) {
            (NotUsed, _) | (_, NotUsed) => false,
            (Any, _) | (_, Any) => true,
            (Level, Surface) => true,
            (element, level) => element == level,
        }
    }

    /// Whether a levels descriptor of this category may appear on a level
    /// of this type.
    pub fn permits(self, category: LevelCategory) -> bool {
        use LevelCategory as C;
        match self {
            LevelType::Msl => category == C::Msl,
            LevelType::Surface => category == C::Surface,
            LevelType::Level | LevelType::Layer => {
                matches!(category, C::Pressure | C::Height | C::Sigma | C::Theta)
            }
            LevelType::Geography => category == C::Geography,
            LevelType::Annotation => category == C::Annotation,
            LevelType::Any | LevelType::NotUsed => false,
        }
    }

    /// Layers are described by an upper/lower pair rather than one value.
    pub fn uses_pair(self) -> bool {
        self == LevelType::Layer
    }
}

keyword_enum! {
    /// The category of a levels descriptor.
    pub enum LevelCategory {
        Msl => "Msl" | "MSL",
        Surface => "Surface",
        Pressure => "Pressure",
        Height => "Height",
        Sigma => "Sigma",
        Theta => "Theta",
        Geography => "Geography",
        Annotation => "Annotation",
    }
}

// ==================== Elements ====================

keyword_enum! {
    /// The declared field type of an element.
    pub enum FieldType {
        Continuous => "Continuous",
        Vector => "Vector",
        Discrete => "Discrete",
        Wind => "Wind",
        Line => "Line",
        Scattered => "Scattered",
        LinkChain => "LChain" | "LinkChain",
        Special => "Special",
    }
}

impl FieldType {
    /// The editable field kind, or None for `Special`.
    pub fn kind(self) -> Option<FieldKind> {
        match self {
            FieldType::Continuous => Some(FieldKind::Continuous),
            FieldType::Vector => Some(FieldKind::Vector),
            FieldType::Discrete => Some(FieldKind::Discrete),
            FieldType::Wind => Some(FieldKind::Wind),
            FieldType::Line => Some(FieldKind::Line),
            FieldType::Scattered => Some(FieldKind::Scattered),
            FieldType::LinkChain => Some(FieldKind::LinkChain),
            FieldType::Special => None,
        }
    }
}

/// The seven editable field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Continuous,
    Vector,
    Discrete,
    Wind,
    Line,
    Scattered,
    LinkChain,
}

impl FieldKind {
    /// Lowercase name used when synthesizing default names.
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Continuous => "continuous",
            FieldKind::Vector => "vector",
            FieldKind::Discrete => "discrete",
            FieldKind::Wind => "wind",
            FieldKind::Line => "line",
            FieldKind::Scattered => "scattered",
            FieldKind::LinkChain => "lchain",
        }
    }

    /// Kinds whose values are sampled numerically rather than by attribute.
    pub fn is_gridded(self) -> bool {
        matches!(self, FieldKind::Continuous | FieldKind::Vector)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

keyword_enum! {
    pub enum DisplayFormat {
        Simple => "Simple",
        Complex => "Complex",
    }
}

keyword_enum! {
    /// How an element's values depend on valid time.
    pub enum TimeType {
        Normal => "Normal",
        Static => "Static",
        Daily => "Daily",
    }
}

keyword_enum! {
    pub enum WindClass {
        Pressure => "Pressure",
        Height => "Height",
        Thickness => "Thickness",
        Adjustment => "Adjustment",
        None => "None",
    }
}

keyword_enum! {
    /// Where a label or scattered type attaches to its feature.
    pub enum AttachOption {
        NoAttach => "no_attach",
        Auto => "attach_auto",
        Min => "attach_min",
        Max => "attach_max",
        Col => "attach_col",
        Contour => "attach_contour",
        Boundary => "attach_boundary",
        Divide => "attach_divide",
        Line => "attach_line",
        Point => "attach_point",
    }
}

impl AttachOption {
    /// The default attachment for labels on a field of the given kind.
    pub fn default_for(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Continuous | FieldKind::Vector | FieldKind::Wind => AttachOption::Auto,
            FieldKind::Discrete => AttachOption::Boundary,
            FieldKind::Line => AttachOption::Line,
            FieldKind::Scattered | FieldKind::LinkChain => AttachOption::Point,
        }
    }
}

// ==================== Namespaces ====================

keyword_enum! {
    /// The two group namespaces.
    pub enum GroupKind {
        Fields => "Fields",
        Elements => "Elements",
    }
}

keyword_enum! {
    /// The two cross-reference namespaces.
    pub enum CrossRefKind {
        Winds => "Winds",
        Values => "Values",
    }
}

keyword_enum! {
    /// The two sample-type namespaces.
    pub enum SampleKind {
        Values => "Values",
        Winds => "Winds",
    }
}

keyword_enum! {
    /// How a value sample evaluates a field.
    pub enum ValueSampleType {
        Value => "Value",
        Gradient => "Gradient",
        Curvature => "Curvature",
        Magnitude => "Magnitude",
        Direction => "Direction",
        Label => "Label",
        Category => "Category",
        Attribute => "Attribute",
    }
}
