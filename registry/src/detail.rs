//! The detail resolver for elements and fields.
//!
//! Detail keywords are skipped while elements and fields load. The first
//! [`ConfigStore::get_element_info`] or [`ConfigStore::get_field_info`] for
//! a record re-reads its blocks, builds an [`ElementDetail`], applies the
//! one-time defaults and runs the cross-record checks. A failed check only
//! ever invalidates the record.

use crate::section::{bool_value, keyword_value, name_pairs, optional_text, word, word_list, Labels};
use crate::{
    AttributeDef, Component, Components, ConfigError, ConfigResult, ConfigStore, Editor, EditorKind, Element,
    Equation, FeatureType, LineType, Linking, RegistryKind, RuleSet, Sampling, Section, ValueCalculation,
    ADJUSTED_WIND_SAMPLE,
};
use tracing::debug;
use wxdict_core::{
    AttachOption, CrossRefId, CrossRefKind, ElementId, FieldId, FieldKind, FieldType, OnceFlag, SampleId,
    SampleKind, SourceType, WindClass,
};
use wxdict_parser::{Entry, Position, ValueArg};

const DETAIL_KEYWORDS: &[&str] = &[
    "wind_class",
    "line_types",
    "line_types_reset",
    "scattered_types",
    "scattered_types_reset",
    "attributes",
    "attributes_reset",
    "editor",
    "labelling",
    "labelling_reset",
    "sampling",
    "sampling_reset",
    "linking",
    "linking_reset",
    "equation",
    "value_calculation",
    "components",
];

pub(crate) fn is_detail_keyword(key: &str) -> bool {
    DETAIL_KEYWORDS.contains(&key)
}

/// Class of the scattered type added to a scattered field with none.
pub const DEFAULT_SCATTERED_CLASS: &str = "plot";
/// Name and class of the labelling type added when none are declared.
pub const DEFAULT_LABELLING_TYPE: &str = "label";

/// Attributes every feature carries.
pub const STANDARD_ATTRIBUTES: [(&str, &str); 3] = [
    ("FPA_category", "Category"),
    ("FPA_auto_label", "Auto Label"),
    ("FPA_user_label", "User Label"),
];

/// Attributes of a wind feature, declared all together or not at all.
pub const WIND_ATTRIBUTES: [(&str, &str); 4] = [
    ("FPA_wind_model", "Wind Model"),
    ("FPA_wind_direction", "Wind Direction"),
    ("FPA_wind_speed", "Wind Speed"),
    ("FPA_wind_gust", "Wind Gust"),
];

/// Resolved detail of an element, or a field's private copy of it.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDetail {
    /// None for `Special` elements, which have no editor or sampling.
    pub field_kind: Option<FieldKind>,
    pub wind_class: Option<WindClass>,
    pub line_types: Vec<LineType>,
    pub scattered_types: Vec<FeatureType>,
    pub attributes: Vec<AttributeDef>,
    pub editor: Option<Editor>,
    pub labelling: Vec<FeatureType>,
    pub sampling: Option<Sampling>,
    pub linking: Option<Linking>,
    pub equation: Option<Equation>,
    pub value_calculation: Option<ValueCalculation>,
    pub components: Option<Components>,
    defaulted: OnceFlag,
}

impl ElementDetail {
    pub fn new(field_type: Option<FieldType>) -> Self {
        let field_kind = field_type.and_then(FieldType::kind);
        Self {
            field_kind,
            wind_class: None,
            line_types: Vec::new(),
            scattered_types: Vec::new(),
            attributes: Vec::new(),
            editor: field_kind.map(Editor::new),
            labelling: Vec::new(),
            sampling: field_kind.map(Sampling::new),
            linking: None,
            equation: None,
            value_calculation: None,
            components: None,
            defaulted: OnceFlag::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.name.eq_ignore_ascii_case(name))
    }

    fn require_kind(&self, entry: &Entry, record: &str) -> ConfigResult<FieldKind> {
        self.field_kind
            .ok_or_else(|| ConfigError::bad_value(entry, record, "not allowed for Special elements"))
    }

    fn require(&self, entry: &Entry, record: &str, wanted: FieldKind) -> ConfigResult<()> {
        if self.field_kind == Some(wanted) {
            Ok(())
        } else {
            Err(ConfigError::bad_value(entry, record, format!("only allowed for {wanted} fields")))
        }
    }
}

// ==================== Block helpers ====================

fn block_body<'e>(entry: &'e Entry, record: &str) -> ConfigResult<&'e [Entry]> {
    entry.body.as_deref().ok_or_else(|| ConfigError::ExpectedBlock {
        record: format!("{record}: {}", entry.key),
        pos: entry.pos.clone(),
    })
}

/// `keyword = None`, clearing a collection.
fn is_cleared(entry: &Entry) -> bool {
    entry.assigned && entry.value_arg() == ValueArg::Empty
}

/// Find a named item, adding it if missing.
fn upsert<'a, T>(
    list: &'a mut Vec<T>,
    name: &str,
    name_of: impl Fn(&T) -> &str,
    make: impl FnOnce(&str) -> T,
) -> &'a mut T {
    let index = match list.iter().position(|item| name_of(item).eq_ignore_ascii_case(name)) {
        Some(index) => index,
        None => {
            list.push(make(name));
            list.len() - 1
        }
    };
    &mut list[index]
}

/// `type_label`, `attribute_short_label` and similar prefixed labels.
fn prefixed_labels(labels: &mut Labels, prefix: &str, entry: &Entry, record: &str) -> Option<ConfigResult<()>> {
    let key = entry.key.strip_prefix(prefix)?.strip_prefix('_')?;
    let slot = match key {
        "label" => &mut labels.label,
        "short_label" => &mut labels.short_label,
        "description" => &mut labels.description,
        _ => return None,
    };
    Some(optional_text(entry, record).map(|text| *slot = text))
}

fn rule_keyword(rules: &mut RuleSet, entry: &Entry, record: &str, python: bool) -> ConfigResult<()> {
    match word_list(entry, record)? {
        None => rules.reset(python),
        Some(names) => {
            for name in names {
                rules.add_rule(&name, python);
            }
        }
    }
    Ok(())
}

/// Minutes, given either as a count or as `h:mm`.
fn minutes(entry: &Entry, record: &str) -> ConfigResult<u32> {
    let text = word(entry, record)?;
    let bad = || ConfigError::bad_value(entry, record, format!("'{text}' is not a time interval"));
    match text.split_once(':') {
        Some((hours, mins)) => {
            let hours: u32 = hours.parse().map_err(|_| bad())?;
            let mins: u32 = mins.parse().map_err(|_| bad())?;
            if mins >= 60 {
                return Err(bad());
            }
            Ok(hours * 60 + mins)
        }
        None => text.parse().map_err(|_| bad()),
    }
}

fn push_unique<T: PartialEq>(list: &mut Vec<T>, item: T) {
    if !list.contains(&item) {
        list.push(item);
    }
}

// ==================== Types and attributes ====================

fn read_line_types(list: &mut Vec<LineType>, record: &str, entry: &Entry) -> ConfigResult<()> {
    if is_cleared(entry) {
        list.clear();
        return Ok(());
    }
    for item in block_body(entry, record)? {
        let body = block_body(item, record)?;
        let line_type = upsert(list, &item.key, |t| t.name.as_str(), |name| LineType {
            name: name.to_string(),
            ..LineType::default()
        });
        for kw in body {
            if let Some(result) = prefixed_labels(&mut line_type.labels, "type", kw, record) {
                result?;
                continue;
            }
            match kw.key.as_str() {
                "pattern" => line_type.pattern = optional_text(kw, record)?,
                _ => return Err(ConfigError::unknown_keyword(kw, Section::LineType, record)),
            }
        }
    }
    Ok(())
}

fn read_feature_types(list: &mut Vec<FeatureType>, record: &str, entry: &Entry, section: Section) -> ConfigResult<()> {
    if is_cleared(entry) {
        list.clear();
        return Ok(());
    }
    for item in block_body(entry, record)? {
        let body = block_body(item, record)?;
        let feature = upsert(list, &item.key, |t| t.name.as_str(), FeatureType::new);
        for kw in body {
            feature_keyword(feature, record, kw, section)?;
        }
    }
    Ok(())
}

fn feature_keyword(feature: &mut FeatureType, record: &str, kw: &Entry, section: Section) -> ConfigResult<()> {
    if let Some(result) = prefixed_labels(&mut feature.labels, "type", kw, record) {
        return result;
    }
    match kw.key.as_str() {
        "type_class" => feature.class = optional_text(kw, record)?,
        "type_entry_file" => feature.entry_file = optional_text(kw, record)?,
        "type_modify_file" => feature.modify_file = optional_text(kw, record)?,
        "type_attach" => feature.attach = Some(keyword_value(kw, record, AttachOption::from_keyword)?),
        "attribute_defaults" => match name_pairs(kw, record)? {
            None => feature.default_attributes.clear(),
            Some(pairs) => {
                for (name, value) in pairs {
                    let slot = upsert(&mut feature.default_attributes, &name, |(n, _)| n.as_str(), |n| {
                        (n.to_string(), String::new())
                    });
                    slot.1 = value;
                }
            }
        },
        "attribute_defaults_reset" => feature.default_attributes.clear(),
        "type_rules" => rule_keyword(&mut feature.rules, kw, record, false)?,
        "python_type_rules" => rule_keyword(&mut feature.rules, kw, record, true)?,
        "type_rules_reset" => feature.rules.reset(false),
        "python_type_rules_reset" => feature.rules.reset(true),
        _ => return Err(ConfigError::unknown_keyword(kw, section, record)),
    }
    Ok(())
}

fn read_attributes(list: &mut Vec<AttributeDef>, record: &str, entry: &Entry) -> ConfigResult<()> {
    if is_cleared(entry) {
        list.clear();
        return Ok(());
    }
    for item in block_body(entry, record)? {
        let attribute = upsert(list, &item.key, |a| a.name.as_str(), AttributeDef::new);
        for kw in item.children() {
            if let Some(result) = prefixed_labels(&mut attribute.labels, "attribute", kw, record) {
                result?;
                continue;
            }
            match kw.key.as_str() {
                "attribute_background_default" => attribute.background_default = optional_text(kw, record)?,
                _ => return Err(ConfigError::unknown_keyword(kw, Section::Attribute, record)),
            }
        }
    }
    Ok(())
}

fn read_labelling(list: &mut Vec<FeatureType>, record: &str, entry: &Entry) -> ConfigResult<()> {
    if is_cleared(entry) {
        list.clear();
        return Ok(());
    }
    for kw in block_body(entry, record)? {
        match kw.key.as_str() {
            "label_types" => read_feature_types(list, record, kw, Section::LabellingType)?,
            "label_types_reset" => list.clear(),
            _ => return Err(ConfigError::unknown_keyword(kw, Section::Labelling, record)),
        }
    }
    Ok(())
}

// ==================== Detail keywords ====================

impl ConfigStore {
    fn detail_keyword(&mut self, detail: &mut ElementDetail, record: &str, entry: &Entry) -> ConfigResult<()> {
        match entry.key.as_str() {
            "wind_class" => detail.wind_class = Some(keyword_value(entry, record, WindClass::from_keyword)?),
            "line_types" => {
                detail.require(entry, record, FieldKind::Line)?;
                read_line_types(&mut detail.line_types, record, entry)?;
            }
            "line_types_reset" => detail.line_types.clear(),
            "scattered_types" => {
                detail.require(entry, record, FieldKind::Scattered)?;
                read_feature_types(&mut detail.scattered_types, record, entry, Section::ScatteredType)?;
            }
            "scattered_types_reset" => detail.scattered_types.clear(),
            "attributes" => {
                detail.require_kind(entry, record)?;
                read_attributes(&mut detail.attributes, record, entry)?;
            }
            "attributes_reset" => detail.attributes.clear(),
            "editor" => {
                let kind = detail.require_kind(entry, record)?;
                let editor = detail.editor.get_or_insert_with(|| Editor::new(kind));
                for kw in block_body(entry, record)? {
                    self.editor_keyword(editor, record, kw)?;
                }
            }
            "labelling" => {
                detail.require_kind(entry, record)?;
                read_labelling(&mut detail.labelling, record, entry)?;
            }
            "labelling_reset" => detail.labelling.clear(),
            "sampling" => {
                let kind = detail.require_kind(entry, record)?;
                let sampling = detail.sampling.get_or_insert_with(|| Sampling::new(kind));
                for kw in block_body(entry, record)? {
                    if kw.key == "sample" {
                        for inner in block_body(kw, record)? {
                            self.sampling_keyword(sampling, record, inner)?;
                        }
                    } else {
                        self.sampling_keyword(sampling, record, kw)?;
                    }
                }
            }
            "sampling_reset" => detail.sampling = detail.field_kind.map(Sampling::new),
            "linking" => {
                detail.require_kind(entry, record)?;
                let linking = detail.linking.get_or_insert_with(Linking::default);
                for kw in block_body(entry, record)? {
                    match kw.key.as_str() {
                        "interpolation_delta" => linking.interpolation_delta = Some(minutes(kw, record)?),
                        "link_fields" => self.field_list(&mut linking.link_fields, record, kw)?,
                        "link_fields_reset" => linking.link_fields.clear(),
                        _ => return Err(ConfigError::unknown_keyword(kw, Section::Linking, record)),
                    }
                }
            }
            "linking_reset" => detail.linking = None,
            "equation" => {
                let equation = detail.equation.get_or_insert_with(Equation::default);
                for kw in block_body(entry, record)? {
                    match kw.key.as_str() {
                        "force_calculation" => equation.force_calculation = bool_value(kw, record)?,
                        "equation_string" => equation.equation = optional_text(kw, record)?,
                        "equation_units" => {
                            let name = word(kw, record)?;
                            equation.units = Some(self.identify_unit(name).ok_or_else(|| {
                                ConfigError::bad_value(kw, record, format!("unknown units '{name}'"))
                            })?);
                        }
                        _ => return Err(ConfigError::unknown_keyword(kw, Section::Equation, record)),
                    }
                }
            }
            "value_calculation" => {
                let calculation = detail.value_calculation.get_or_insert_with(ValueCalculation::default);
                for kw in block_body(entry, record)? {
                    match kw.key.as_str() {
                        "force_calculation" => calculation.force_calculation = bool_value(kw, record)?,
                        "value_crossref" => {
                            let name = word(kw, record)?;
                            calculation.crossref = Some(self.crossref_value(CrossRefKind::Values, name, kw, record)?);
                        }
                        "source_types" => {
                            calculation.source_types.clear();
                            for name in word_list(kw, record)?.unwrap_or_default() {
                                let source_type = SourceType::from_keyword(&name).ok_or_else(|| {
                                    ConfigError::bad_value(kw, record, format!("unknown source type '{name}'"))
                                })?;
                                push_unique(&mut calculation.source_types, source_type);
                            }
                        }
                        _ => return Err(ConfigError::unknown_keyword(kw, Section::ValueCalculation, record)),
                    }
                }
            }
            "components" => {
                let components = detail.components.get_or_insert_with(Components::default);
                for kw in block_body(entry, record)? {
                    let Some(component) = Component::from_keyword(&kw.key) else {
                        return Err(ConfigError::unknown_keyword(kw, Section::Components, record));
                    };
                    let name = word(kw, record)?;
                    let element = self
                        .identify_element(name)
                        .ok_or_else(|| ConfigError::bad_value(kw, record, format!("unknown element '{name}'")))?;
                    if !components.insert(component, element) {
                        return Err(ConfigError::bad_value(kw, record, "x/y and direction/magnitude components cannot be mixed"));
                    }
                }
            }
            _ => return Err(ConfigError::unknown_keyword(entry, Section::Element, record)),
        }
        Ok(())
    }

    fn editor_keyword(&mut self, editor: &mut Editor, record: &str, kw: &Entry) -> ConfigResult<()> {
        let files = &mut editor.files;
        match kw.key.as_str() {
            "entry_file" => files.entry_file = optional_text(kw, record)?,
            "modify_file" => files.modify_file = optional_text(kw, record)?,
            "memory_file" => files.memory_file = optional_text(kw, record)?,
            "background_entry_file" => files.background_entry_file = optional_text(kw, record)?,
            "background_memory_file" => files.background_memory_file = optional_text(kw, record)?,
            "entry_rules" => rule_keyword(&mut editor.rules, kw, record, false)?,
            "python_entry_rules" => rule_keyword(&mut editor.rules, kw, record, true)?,
            "entry_rules_reset" => editor.rules.reset(false),
            "python_entry_rules_reset" => editor.rules.reset(true),
            "merge_fields" => self.field_list(&mut editor.merge_fields, record, kw)?,
            "merge_fields_reset" => editor.merge_fields.clear(),
            _ => self.editor_kind_keyword(&mut editor.kind, record, kw)?,
        }
        Ok(())
    }

    fn editor_kind_keyword(&mut self, kind: &mut EditorKind, record: &str, kw: &Entry) -> ConfigResult<()> {
        match (kind, kw.key.as_str()) {
            (EditorKind::Continuous { hilo, .. } | EditorKind::Vector { hilo, .. }, "hilo") => {
                *hilo = bool_value(kw, record)?;
            }
            (EditorKind::Continuous { poke, .. }, "poke") => *poke = Some(self.quantity(kw, record)?),
            (EditorKind::Vector { magnitude_poke, .. }, "magnitude_poke") => {
                *magnitude_poke = Some(self.quantity(kw, record)?);
            }
            (EditorKind::Vector { direction_poke, .. }, "direction_poke") => {
                *direction_poke = Some(self.quantity(kw, record)?);
            }
            (EditorKind::Discrete { overlaying, .. }, "overlaying") => *overlaying = bool_value(kw, record)?,
            (EditorKind::Discrete { display_order, .. } | EditorKind::Wind { display_order }, "display_order") => {
                *display_order = bool_value(kw, record)?;
            }
            (EditorKind::LinkChain { node_entry_file, .. }, "node_entry_file") => {
                *node_entry_file = optional_text(kw, record)?;
            }
            (EditorKind::LinkChain { node_modify_file, .. }, "node_modify_file") => {
                *node_modify_file = optional_text(kw, record)?;
            }
            (EditorKind::LinkChain { node_rules, .. }, "node_entry_rules") => {
                rule_keyword(node_rules, kw, record, false)?;
            }
            (EditorKind::LinkChain { node_rules, .. }, "python_node_entry_rules") => {
                rule_keyword(node_rules, kw, record, true)?;
            }
            (EditorKind::LinkChain { node_rules, .. }, "node_entry_rules_reset") => node_rules.reset(false),
            (EditorKind::LinkChain { node_rules, .. }, "python_node_entry_rules_reset") => node_rules.reset(true),
            (EditorKind::LinkChain { link_fields, .. }, "link_fields") => self.field_list(link_fields, record, kw)?,
            (EditorKind::LinkChain { link_fields, .. }, "link_fields_reset") => link_fields.clear(),
            (EditorKind::LinkChain { interpolation_delta, .. }, "interpolation_delta") => {
                *interpolation_delta = Some(minutes(kw, record)?);
            }
            _ => return Err(ConfigError::unknown_keyword(kw, Section::Editor, record)),
        }
        Ok(())
    }

    fn sampling_keyword(&mut self, sampling: &mut Sampling, record: &str, kw: &Entry) -> ConfigResult<()> {
        match (sampling, kw.key.as_str()) {
            (
                Sampling::Gridded { value_samples, .. } | Sampling::Wind { value_samples, .. },
                "value_sample_types",
            ) => self.sample_list(value_samples, SampleKind::Values, record, kw)?,
            (Sampling::Gridded { wind_samples, .. }, "wind_sample_types") => {
                self.sample_list(wind_samples, SampleKind::Winds, record, kw)?;
            }
            (Sampling::Wind { wind_sample, .. }, "wind_sample_type") => {
                let name = word(kw, record)?;
                let id = self
                    .identify_sample(SampleKind::Winds, name)
                    .ok_or_else(|| ConfigError::bad_value(kw, record, format!("unknown wind sample '{name}'")))?;
                *wind_sample = Some(id);
            }
            (Sampling::Wind { wind_crossrefs, .. }, "wind_crossrefs") => match word_list(kw, record)? {
                None => wind_crossrefs.clear(),
                Some(names) => {
                    for name in names {
                        let id = self.crossref_value(CrossRefKind::Winds, &name, kw, record)?;
                        push_unique(wind_crossrefs, id);
                    }
                }
            },
            (Sampling::Attributes { names }, "attribute_sample_names") => match word_list(kw, record)? {
                None => names.clear(),
                Some(list) => {
                    for name in list {
                        if !names.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
                            names.push(name);
                        }
                    }
                }
            },
            _ => return Err(ConfigError::unknown_keyword(kw, Section::Sampling, record)),
        }
        Ok(())
    }

    fn sample_list(&mut self, list: &mut Vec<SampleId>, kind: SampleKind, record: &str, kw: &Entry) -> ConfigResult<()> {
        let Some(names) = word_list(kw, record)? else {
            list.clear();
            return Ok(());
        };
        for name in names {
            let id = self
                .identify_sample(kind, &name)
                .ok_or_else(|| ConfigError::bad_value(kw, record, format!("unknown sample type '{name}'")))?;
            push_unique(list, id);
        }
        Ok(())
    }

    fn crossref_value(&mut self, kind: CrossRefKind, name: &str, kw: &Entry, record: &str) -> ConfigResult<CrossRefId> {
        self.identify_crossref(kind, name)
            .ok_or_else(|| ConfigError::bad_value(kw, record, format!("unknown {kind} cross-reference '{name}'")))
    }

    /// Add the element/level pairs of a field list keyword.
    fn field_list(&mut self, list: &mut Vec<FieldId>, record: &str, kw: &Entry) -> ConfigResult<()> {
        let Some(pairs) = name_pairs(kw, record)? else {
            list.clear();
            return Ok(());
        };
        for (element, level) in pairs {
            let field = self.identify_field(&element, &level).ok_or_else(|| {
                ConfigError::bad_value(kw, record, format!("unknown field '{element} {level}'"))
            })?;
            push_unique(list, field);
        }
        Ok(())
    }

    // ==================== Resolution ====================

    /// Build detail from the detail keywords at `positions`, in order, then
    /// apply defaults and run the checks. Returns false if anything failed.
    pub(crate) fn read_detail(
        &mut self,
        element: ElementId,
        positions: &[Position],
        record: &str,
    ) -> Option<(ElementDetail, bool)> {
        for kind in [RegistryKind::Samples, RegistryKind::CrossRefs, RegistryKind::Fields] {
            self.ensure_loaded(kind);
        }
        let field_type = self.elements.get(element)?.field_type;
        let mut detail = ElementDetail::new(field_type);
        let mut valid = true;

        let entries = self.reread(positions);
        for entry in &entries {
            for kw in entry.children().iter().filter(|kw| is_detail_keyword(&kw.key)) {
                if let Err(err) = self.detail_keyword(&mut detail, record, kw) {
                    valid = false;
                    self.report(err);
                }
            }
        }
        for err in self.finish_detail(&mut detail, element, record) {
            valid = false;
            self.report(err);
        }
        Some((detail, valid))
    }

    /// One-time defaults, then the cross-record checks.
    fn finish_detail(&mut self, detail: &mut ElementDetail, element: ElementId, record: &str) -> Vec<ConfigError> {
        let Some(kind) = detail.field_kind else {
            return Vec::new();
        };
        if !detail.defaulted.first() {
            return Vec::new();
        }
        let Some((element_name, element_type, element_units)) = self
            .elements
            .get(element)
            .map(|e| (e.name.clone(), e.field_type, e.units()))
        else {
            return Vec::new();
        };
        let mut errors = Vec::new();

        if let Some(editor) = detail.editor.as_mut() {
            editor.apply_defaults();
        }
        if kind == FieldKind::Scattered && detail.scattered_types.is_empty() {
            debug!(record, "adding implicit scattered type");
            let mut implicit = FeatureType::new(&element_name);
            implicit.class = Some(DEFAULT_SCATTERED_CLASS.to_string());
            detail.scattered_types.push(implicit);
        }
        if detail.labelling.is_empty() {
            let mut label = FeatureType::new(DEFAULT_LABELLING_TYPE);
            label.class = Some(DEFAULT_LABELLING_TYPE.to_string());
            detail.labelling.push(label);
        }
        let editor = detail.editor.as_ref();
        for feature in detail.scattered_types.iter_mut().chain(detail.labelling.iter_mut()) {
            feature.apply_defaults(editor, kind);
        }
        if let Some(sampling) = detail.sampling.as_mut() {
            self.default_sampling(sampling, kind);
        }

        // Attribute schema
        let declared = WIND_ATTRIBUTES
            .iter()
            .filter(|(name, _)| detail.attribute(name).is_some())
            .count();
        if declared != 0 && declared != WIND_ATTRIBUTES.len() {
            errors.push(ConfigError::inconsistent(
                record,
                "wind attributes must be declared all together or not at all",
            ));
        } else if declared == 0 && kind == FieldKind::Wind {
            for (name, label) in WIND_ATTRIBUTES {
                detail.attributes.push(labelled_attribute(name, label));
            }
        }
        for (index, (name, label)) in STANDARD_ATTRIBUTES.into_iter().enumerate() {
            if detail.attribute(name).is_none() {
                detail.attributes.insert(index, labelled_attribute(name, label));
            }
        }

        if let Some(editor) = &detail.editor {
            for &field in &editor.merge_fields {
                let Some(other) = self.fields.get(field).and_then(|f| self.elements.get(f.element)) else {
                    continue;
                };
                if other.field_type != element_type {
                    errors.push(ConfigError::inconsistent(
                        record,
                        format!("merge field element '{}' has a different field type", other.name),
                    ));
                    continue;
                }
                if let (Some(mine), Some(theirs)) = (element_units, other.units()) {
                    if !self.convertible_units(mine, theirs) {
                        errors.push(ConfigError::inconsistent(
                            record,
                            format!("merge field element '{}' has incompatible units", other.name),
                        ));
                    }
                }
            }
        }

        if let Some(sampling) = &detail.sampling {
            for name in sampling.attribute_names() {
                if detail.attribute(name).is_none() {
                    errors.push(ConfigError::inconsistent(
                        record,
                        format!("sampled attribute '{name}' is not declared"),
                    ));
                }
            }
        }

        if let Some(components) = &detail.components {
            if !components.is_complete() {
                errors.push(ConfigError::inconsistent(record, "components are incomplete"));
            } else if components.component_of(element).is_none() {
                errors.push(ConfigError::inconsistent(
                    record,
                    format!("'{element_name}' is not one of its own components"),
                ));
            }
        }
        errors
    }

    fn default_sampling(&mut self, sampling: &mut Sampling, kind: FieldKind) {
        let defaults: &[&str] = match kind {
            FieldKind::Continuous => &["Value_Sample"],
            FieldKind::Vector => &["Value_Sample", "Magnitude_Sample", "Direction_Sample"],
            FieldKind::Wind => &["Magnitude_Sample", "Direction_Sample"],
            _ => &[],
        };
        if let Sampling::Gridded { value_samples, .. } | Sampling::Wind { value_samples, .. } = sampling {
            if value_samples.is_empty() {
                value_samples.extend(
                    defaults
                        .iter()
                        .filter_map(|name| self.identify_sample(SampleKind::Values, name)),
                );
            }
        }
        if let Sampling::Wind { wind_sample, .. } = sampling {
            if wind_sample.is_none() {
                *wind_sample = self.identify_sample(SampleKind::Winds, ADJUSTED_WIND_SAMPLE);
            }
        }
    }

    // ==================== Detail Lookups ====================

    /// Find a valid element and resolve its detail.
    pub fn get_element_info(&mut self, name: &str) -> Option<&Element> {
        let id = self.identify_element(name)?;
        self.resolve_element_detail(id);
        self.elements.get(id).filter(|e| e.valid.is_valid())
    }

    pub(crate) fn resolve_element_detail(&mut self, id: ElementId) {
        let Some(element) = self.elements.get_mut(id) else {
            return;
        };
        if !element.detail_once.first() {
            return;
        }
        let (name, blocks) = (element.name.clone(), element.blocks.clone());
        debug!(element = %name, "resolving element detail");
        let Some((detail, valid)) = self.read_detail(id, &blocks, &name) else {
            return;
        };
        if let Some(element) = self.elements.get_mut(id) {
            element.detail = Some(detail);
            if !valid {
                element.valid.invalidate();
            }
        }
    }

    /// Components of a vector element: its own component, and the partner
    /// element with the partner's component.
    pub fn which_components(&mut self, element: &str) -> Option<(Component, ElementId, Component)> {
        let id = self.identify_element(element)?;
        let components = self.get_element_info(element)?.detail()?.components.as_ref()?;
        let own = components.component_of(id)?;
        let &(partner_component, partner) = components.members.iter().find(|(c, _)| *c != own)?;
        Some((own, partner, partner_component))
    }

    /// Whether the element is an x or y component of a vector.
    pub fn xy_component_field(&mut self, element: &str) -> bool {
        self.component_set_is(element, crate::ComponentSet::Xy)
    }

    /// Whether the element is a direction or magnitude component of a vector.
    pub fn dm_component_field(&mut self, element: &str) -> bool {
        self.component_set_is(element, crate::ComponentSet::Dm)
    }

    fn component_set_is(&mut self, element: &str, set: crate::ComponentSet) -> bool {
        self.which_components(element)
            .is_some_and(|(own, _, _)| own.set() == set)
    }
}

fn labelled_attribute(name: &str, label: &str) -> AttributeDef {
    let mut attribute = AttributeDef::new(name);
    attribute.labels.label = Some(label.to_string());
    attribute
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LoaderOptions;
    use wxdict_parser::MemoryProvider;

    const TEXT: &str = r#"
Units
{
  m { MKS_equivalent = m }
  km { MKS_equivalent = m; MKS_conversion = 1000 }
  mps { MKS_equivalent = mps }
  degreesC { MKS_equivalent = degreesC }
}
Levels
{
  surface { level_type = Surface; level_levels = Surface }
  500 { level_type = Level; level_levels = Pressure 500 }
}
Elements
{
  temperature
  {
    level_type = Level
    field_type = Continuous
    precision = 0.1 degreesC
    editor
    {
      hilo = yes
      poke = 1 degreesC
      entry_file = temp_entry
      merge_fields = dewpoint surface
    }
  }
  dewpoint { level_type = Level; field_type = Continuous; precision = 0.1 degreesC }
  height
  {
    level_type = Level
    field_type = Continuous
    precision = 1 m
    linking { interpolation_delta = 1:30; link_fields = temperature 500 }
  }
  remarks { level_type = Surface; field_type = Special; linking { interpolation_delta = 1:00 } }
  bad_merge
  {
    level_type = Level
    field_type = Continuous
    precision = 1 mps
    editor { merge_fields = temperature 500 }
  }
  weather
  {
    level_type = Surface
    field_type = Discrete
    attributes
    {
      cloud { attribute_label = "Cloud amount" }
      vis { attribute_background_default = 10 }
    }
    editor { overlaying = no; poke = 3 m }
    sampling { sample { attribute_sample_names = cloud vis } }
  }
  bad_sample
  {
    level_type = Surface
    field_type = Discrete
    sampling { attribute_sample_names = missing }
  }
  actual_wind { level_type = Level; field_type = Wind }
  partial_wind
  {
    level_type = Level
    field_type = Wind
    attributes { FPA_wind_speed { } }
  }
  fronts
  {
    level_type = Surface
    field_type = Line
    line_types { cold { type_label = "Cold front"; pattern = cold } warm { } }
  }
  storms
  {
    level_type = Surface
    field_type = Scattered
    editor { entry_file = storm_entry }
  }
  tracks
  {
    level_type = Surface
    field_type = LChain
    editor
    {
      node_entry_file = node_entry
      interpolation_delta = 0:30
      link_fields = temperature surface
    }
    labelling { label_types { track_label { type_class = small; type_attach = attach_point } } }
  }
  uwind
  {
    level_type = Level
    field_type = Continuous
    components { x_component = uwind; y_component = vwind }
  }
  vwind
  {
    level_type = Level
    field_type = Continuous
    components { x_component = uwind; y_component = vwind }
  }
  mixed
  {
    level_type = Level
    field_type = Continuous
    components { x_component = uwind; magnitude_component = vwind }
  }
  thickness
  {
    level_type = Level
    field_type = Continuous
    equation { force_calculation = yes; equation_string = "hgt[500] - hgt[1000]"; equation_units = m }
    value_calculation { value_crossref = Thick; source_types = Guidance Depiction }
  }
}
CrossRefs { Values { Thick { value_function = Thickness_Func } } }
"#;

    fn store() -> ConfigStore {
        ConfigStore::new(LoaderOptions::new("d.cfg").with_provider(MemoryProvider::new().with_file("d.cfg", TEXT)))
    }

    #[test]
    fn test_detail_is_lazy() {
        let mut store = store();
        let id = store.identify_element("temperature").unwrap();
        assert!(store.element(id).unwrap().detail().is_none());
        assert!(!store.is_loaded(RegistryKind::Samples));

        let element = store.get_element_info("temperature").unwrap();
        let editor = element.detail().unwrap().editor.as_ref().unwrap();
        assert!(matches!(editor.kind, EditorKind::Continuous { hilo: true, poke: Some(_) }));
        assert_eq!(editor.files.modify_file.as_deref(), Some("temp_entry"));
        assert_eq!(editor.merge_fields.len(), 1);
        assert!(store.is_loaded(RegistryKind::Samples));
    }

    #[test]
    fn test_default_sampling() {
        let mut store = store();
        let value = store.identify_sample(SampleKind::Values, "Value_Sample").unwrap();
        let detail = store.get_element_info("temperature").unwrap().detail().unwrap().clone();
        assert_eq!(detail.sampling.unwrap().value_samples(), &[value]);

        let adjusted = store.identify_sample(SampleKind::Winds, ADJUSTED_WIND_SAMPLE);
        let detail = store.get_element_info("actual_wind").unwrap().detail().unwrap().clone();
        match detail.sampling.unwrap() {
            Sampling::Wind { value_samples, wind_sample, .. } => {
                assert_eq!(value_samples.len(), 2);
                assert_eq!(wind_sample, adjusted);
            }
            other => panic!("unexpected sampling {other:?}"),
        }
    }

    #[test]
    fn test_merge_field_checks() {
        let mut store = store();
        assert!(store.get_element_info("temperature").is_some());
        assert!(store.get_element_info("bad_merge").is_none());
        assert!(store.identify_element("bad_merge").is_none());
        assert!(!store.diagnostics_for("bad_merge").is_empty());
    }

    #[test]
    fn test_wrong_kind_editor_keyword() {
        let mut store = store();
        assert!(store.get_element_info("weather").is_none());
        assert!(store.diagnostics_for("weather").iter().any(|e| matches!(
            e,
            ConfigError::UnknownKeyword { keyword, section: Section::Editor, .. } if keyword == "poke"
        )));
    }

    #[test]
    fn test_linking_needs_a_field_kind() {
        let mut store = store();
        let detail = store.get_element_info("height").unwrap().detail().unwrap().clone();
        let linking = detail.linking.unwrap();
        assert_eq!(linking.interpolation_delta, Some(90));
        assert_eq!(linking.link_fields.len(), 1);

        assert!(store.get_element_info("remarks").is_none());
        assert!(store.diagnostics_for("remarks").iter().any(|e| matches!(
            e,
            ConfigError::BadValue { keyword, .. } if keyword == "linking"
        )));
    }

    #[test]
    fn test_attribute_sampling_must_be_declared() {
        let mut store = store();
        assert!(store.get_element_info("bad_sample").is_none());
    }

    #[test]
    fn test_wind_attributes() {
        let mut store = store();
        let detail = store.get_element_info("actual_wind").unwrap().detail().unwrap().clone();
        for (name, _) in WIND_ATTRIBUTES.iter().chain(STANDARD_ATTRIBUTES.iter()) {
            assert!(detail.attribute(name).is_some(), "missing {name}");
        }
        assert_eq!(detail.attributes[0].name, "FPA_category");
        assert!(store.get_element_info("partial_wind").is_none());
    }

    #[test]
    fn test_line_types() {
        let mut store = store();
        let detail = store.get_element_info("fronts").unwrap().detail().unwrap();
        assert_eq!(detail.line_types.len(), 2);
        assert_eq!(detail.line_types[0].labels.label.as_deref(), Some("Cold front"));
        assert_eq!(detail.line_types[1].pattern, None);
    }

    #[test]
    fn test_implicit_scattered_type() {
        let mut store = store();
        let detail = store.get_element_info("storms").unwrap().detail().unwrap();
        let implicit = &detail.scattered_types[0];
        assert_eq!(implicit.name, "storms");
        assert_eq!(implicit.class.as_deref(), Some(DEFAULT_SCATTERED_CLASS));
        assert_eq!(implicit.entry_file.as_deref(), Some("storm_entry"));
        assert_eq!(implicit.modify_file.as_deref(), Some("storm_entry"));
        assert_eq!(implicit.attach, Some(AttachOption::Point));
    }

    #[test]
    fn test_link_chain_editor() {
        let mut store = store();
        let detail = store.get_element_info("tracks").unwrap().detail().unwrap();
        match &detail.editor.as_ref().unwrap().kind {
            EditorKind::LinkChain {
                node_modify_file,
                interpolation_delta,
                link_fields,
                ..
            } => {
                assert_eq!(node_modify_file.as_deref(), Some("node_entry"));
                assert_eq!(*interpolation_delta, Some(30));
                assert_eq!(link_fields.len(), 1);
            }
            other => panic!("unexpected editor {other:?}"),
        }
        assert_eq!(detail.labelling.len(), 1);
        assert_eq!(detail.labelling[0].attach, Some(AttachOption::Point));
    }

    #[test]
    fn test_default_labelling_type() {
        let mut store = store();
        let detail = store.get_element_info("height").unwrap().detail().unwrap();
        assert_eq!(detail.labelling[0].name, DEFAULT_LABELLING_TYPE);
        assert_eq!(detail.labelling[0].attach, Some(AttachOption::Auto));
    }

    #[test]
    fn test_components() {
        let mut store = store();
        let vwind = store.identify_element("vwind").unwrap();
        assert_eq!(store.which_components("uwind"), Some((Component::X, vwind, Component::Y)));
        assert!(store.xy_component_field("vwind"));
        assert!(!store.dm_component_field("vwind"));
        assert!(!store.xy_component_field("temperature"));
        assert!(store.get_element_info("mixed").is_none());
    }

    #[test]
    fn test_equation_and_value_calculation() {
        let mut store = store();
        let m = store.identify_unit("m").unwrap();
        let detail = store.get_element_info("thickness").unwrap().detail().unwrap();
        let equation = detail.equation.as_ref().unwrap();
        assert!(equation.force_calculation);
        assert_eq!(equation.units, Some(m));
        let calculation = detail.value_calculation.as_ref().unwrap();
        assert!(calculation.crossref.is_some());
        assert_eq!(calculation.source_types, vec![SourceType::Guidance, SourceType::Depiction]);
    }

    #[test]
    fn test_detail_resolved_once() {
        let mut store = store();
        store.get_element_info("bad_merge");
        let count = store.diagnostics().len();
        store.get_element_info("bad_merge");
        store.get_element_info("temperature");
        store.get_element_info("temperature");
        assert_eq!(store.diagnostics().len(), count);
    }

    #[test]
    fn test_minutes() {
        let provider = MemoryProvider::new().with_file("t.cfg", "B { a = 90\n b = 1:15\n c = 1:75\n }");
        let mut reader =
            wxdict_parser::BlockReader::open(&provider, "t.cfg", wxdict_parser::StreamOptions::default()).unwrap();
        let entries = reader.next_block().unwrap().entries;
        assert_eq!(minutes(&entries[0], "r").unwrap(), 90);
        assert_eq!(minutes(&entries[1], "r").unwrap(), 75);
        assert!(minutes(&entries[2], "r").is_err());
    }
}
