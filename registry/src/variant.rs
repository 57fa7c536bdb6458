//! The field-type variant model.
//!
//! Editors and sampling differ by field kind. Each is one type with a
//! shared part and a kind enum, so construction, copying and resetting are
//! single functions matching on the kind.

use crate::section::Labels;
use crate::Quantity;
use wxdict_core::{AttachOption, CrossRefId, ElementId, FieldId, FieldKind, OnceFlag, SampleId, SourceType, UnitId};

// ==================== Rules ====================

/// Named entry rules, native and python.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    pub rules: Vec<String>,
    pub python_rules: Vec<String>,
}

impl RuleSet {
    /// Register a rule by name. Returns false if it was already listed.
    pub fn add_rule(&mut self, name: &str, python: bool) -> bool {
        let list = if python { &mut self.python_rules } else { &mut self.rules };
        if list.iter().any(|rule| rule == name) {
            return false;
        }
        list.push(name.to_string());
        true
    }

    pub fn reset(&mut self, python: bool) {
        if python {
            self.python_rules.clear();
        } else {
            self.rules.clear();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.python_rules.is_empty()
    }
}

// ==================== Editor ====================

/// Attribute entry files shared by every editor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorFiles {
    pub entry_file: Option<String>,
    pub modify_file: Option<String>,
    pub memory_file: Option<String>,
    pub background_entry_file: Option<String>,
    pub background_memory_file: Option<String>,
}

/// The kind-specific part of an editor.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorKind {
    Continuous {
        hilo: bool,
        poke: Option<Quantity>,
    },
    Vector {
        hilo: bool,
        magnitude_poke: Option<Quantity>,
        direction_poke: Option<Quantity>,
    },
    Discrete {
        overlaying: bool,
        display_order: bool,
    },
    Wind {
        display_order: bool,
    },
    Line,
    Scattered,
    LinkChain {
        node_entry_file: Option<String>,
        node_modify_file: Option<String>,
        node_rules: RuleSet,
        link_fields: Vec<FieldId>,
        /// Minutes between interpolated nodes.
        interpolation_delta: Option<u32>,
    },
}

impl EditorKind {
    pub fn new(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Continuous => EditorKind::Continuous { hilo: false, poke: None },
            FieldKind::Vector => EditorKind::Vector {
                hilo: false,
                magnitude_poke: None,
                direction_poke: None,
            },
            FieldKind::Discrete => EditorKind::Discrete {
                overlaying: true,
                display_order: false,
            },
            FieldKind::Wind => EditorKind::Wind { display_order: false },
            FieldKind::Line => EditorKind::Line,
            FieldKind::Scattered => EditorKind::Scattered,
            FieldKind::LinkChain => EditorKind::LinkChain {
                node_entry_file: None,
                node_modify_file: None,
                node_rules: RuleSet::default(),
                link_fields: Vec::new(),
                interpolation_delta: None,
            },
        }
    }

    pub fn field_kind(&self) -> FieldKind {
        match self {
            EditorKind::Continuous { .. } => FieldKind::Continuous,
            EditorKind::Vector { .. } => FieldKind::Vector,
            EditorKind::Discrete { .. } => FieldKind::Discrete,
            EditorKind::Wind { .. } => FieldKind::Wind,
            EditorKind::Line => FieldKind::Line,
            EditorKind::Scattered => FieldKind::Scattered,
            EditorKind::LinkChain { .. } => FieldKind::LinkChain,
        }
    }
}

/// Editor settings for a field kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Editor {
    pub files: EditorFiles,
    pub rules: RuleSet,
    /// Fields whose features may be merged into this one.
    pub merge_fields: Vec<FieldId>,
    pub kind: EditorKind,
    defaulted: OnceFlag,
}

impl Editor {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            files: EditorFiles::default(),
            rules: RuleSet::default(),
            merge_fields: Vec::new(),
            kind: EditorKind::new(kind),
            defaulted: OnceFlag::new(),
        }
    }

    /// Back to a fresh editor of the same kind.
    pub fn reset(&mut self) {
        *self = Editor::new(self.kind.field_kind());
    }

    /// Add an entry rule. Node rules exist only for link chains; returns
    /// false if the rule has nowhere to go or was already listed.
    pub fn add_rule(&mut self, name: &str, python: bool, node: bool) -> bool {
        match (&mut self.kind, node) {
            (_, false) => self.rules.add_rule(name, python),
            (EditorKind::LinkChain { node_rules, .. }, true) => node_rules.add_rule(name, python),
            (_, true) => false,
        }
    }

    /// Fill unset modify files from the matching entry files, once.
    pub fn apply_defaults(&mut self) {
        if !self.defaulted.first() {
            return;
        }
        if self.files.modify_file.is_none() {
            self.files.modify_file = self.files.entry_file.clone();
        }
        if let EditorKind::LinkChain {
            node_entry_file,
            node_modify_file,
            ..
        } = &mut self.kind
        {
            if node_modify_file.is_none() {
                *node_modify_file = node_entry_file.clone();
            }
        }
    }
}

// ==================== Sampling ====================

/// How a field kind may be sampled.
#[derive(Debug, Clone, PartialEq)]
pub enum Sampling {
    /// Continuous and vector fields.
    Gridded {
        value_samples: Vec<SampleId>,
        wind_samples: Vec<SampleId>,
    },
    Wind {
        value_samples: Vec<SampleId>,
        wind_crossrefs: Vec<CrossRefId>,
        /// Sample type for the model wind.
        wind_sample: Option<SampleId>,
    },
    /// Discrete, line, scattered and link chain fields sample attributes.
    Attributes { names: Vec<String> },
}

impl Sampling {
    pub fn new(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Continuous | FieldKind::Vector => Sampling::Gridded {
                value_samples: Vec::new(),
                wind_samples: Vec::new(),
            },
            FieldKind::Wind => Sampling::Wind {
                value_samples: Vec::new(),
                wind_crossrefs: Vec::new(),
                wind_sample: None,
            },
            FieldKind::Discrete | FieldKind::Line | FieldKind::Scattered | FieldKind::LinkChain => {
                Sampling::Attributes { names: Vec::new() }
            }
        }
    }

    pub fn value_samples(&self) -> &[SampleId] {
        match self {
            Sampling::Gridded { value_samples, .. } | Sampling::Wind { value_samples, .. } => value_samples,
            Sampling::Attributes { .. } => &[],
        }
    }

    pub fn attribute_names(&self) -> &[String] {
        match self {
            Sampling::Attributes { names } => names,
            _ => &[],
        }
    }
}

// ==================== Types and attributes ====================

/// A line type of a line field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineType {
    pub name: String,
    pub labels: Labels,
    pub pattern: Option<String>,
}

/// A scattered or labelling type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureType {
    pub name: String,
    pub labels: Labels,
    /// Style class.
    pub class: Option<String>,
    pub entry_file: Option<String>,
    pub modify_file: Option<String>,
    pub attach: Option<AttachOption>,
    pub default_attributes: Vec<(String, String)>,
    pub rules: RuleSet,
}

impl FeatureType {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Entry file from the editor, modify file from the entry file.
    pub(crate) fn apply_defaults(&mut self, editor: Option<&Editor>, kind: FieldKind) {
        if self.entry_file.is_none() {
            self.entry_file = editor.and_then(|e| e.files.entry_file.clone());
        }
        if self.modify_file.is_none() {
            self.modify_file = self.entry_file.clone();
        }
        if self.attach.is_none() {
            self.attach = Some(AttachOption::default_for(kind));
        }
    }
}

/// An attribute carried by a field's features.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeDef {
    pub name: String,
    pub labels: Labels,
    pub background_default: Option<String>,
}

impl AttributeDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

// ==================== Linking, equations, components ====================

/// Link chain settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Linking {
    /// Minutes between interpolated links.
    pub interpolation_delta: Option<u32>,
    pub link_fields: Vec<FieldId>,
}

/// A field computed from an equation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Equation {
    pub force_calculation: bool,
    pub equation: Option<String>,
    pub units: Option<UnitId>,
}

/// A field computed from a value cross-reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueCalculation {
    pub force_calculation: bool,
    pub crossref: Option<CrossRefId>,
    pub source_types: Vec<SourceType>,
}

/// One component of a vector quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    X,
    Y,
    Direction,
    Magnitude,
}

/// The two ways a vector splits into component fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentSet {
    /// x and y components.
    Xy,
    /// direction and magnitude components.
    Dm,
}

impl Component {
    pub fn keyword(self) -> &'static str {
        match self {
            Component::X => "x_component",
            Component::Y => "y_component",
            Component::Direction => "direction_component",
            Component::Magnitude => "magnitude_component",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        [Component::X, Component::Y, Component::Direction, Component::Magnitude]
            .into_iter()
            .find(|c| c.keyword() == word)
    }

    pub fn set(self) -> ComponentSet {
        match self {
            Component::X | Component::Y => ComponentSet::Xy,
            Component::Direction | Component::Magnitude => ComponentSet::Dm,
        }
    }
}

impl ComponentSet {
    pub fn members(self) -> [Component; 2] {
        match self {
            ComponentSet::Xy => [Component::X, Component::Y],
            ComponentSet::Dm => [Component::Direction, Component::Magnitude],
        }
    }
}

/// The component elements of a vector element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Components {
    pub members: Vec<(Component, ElementId)>,
}

impl Components {
    pub fn set(&self) -> Option<ComponentSet> {
        self.members.first().map(|(c, _)| c.set())
    }

    /// Add or replace a component. Fails when it would mix sets.
    pub fn insert(&mut self, component: Component, element: ElementId) -> bool {
        if self.set().is_some_and(|set| set != component.set()) {
            return false;
        }
        self.members.retain(|(c, _)| *c != component);
        self.members.push((component, element));
        true
    }

    /// Returns true if every member of the set is present.
    pub fn is_complete(&self) -> bool {
        self.set().is_some_and(|set| {
            set.members()
                .iter()
                .all(|wanted| self.members.iter().any(|(c, _)| c == wanted))
        })
    }

    pub fn component_of(&self, element: ElementId) -> Option<Component> {
        self.members.iter().find(|(_, e)| *e == element).map(|(c, _)| *c)
    }
}
