//! Elements: the quantities that are analysed.
//!
//! Loading an element reads only its basic settings. Detail keywords
//! (editor, sampling, labelling and the rest) are skipped here and read by
//! [`ConfigStore::get_element_info`].

use crate::detail::{is_detail_keyword, ElementDetail};
use crate::section::{keyword_value, optional_text, require_equals, Labels};
use crate::table::Main;
use crate::{ConfigError, ConfigResult, ConfigStore, Quantity, RegistryKind, Section};
use wxdict_core::{
    DisplayFormat, ElementId, FieldKind, FieldType, GroupId, GroupKind, LevelType, OnceFlag, TimeType, UnitId,
    Validity,
};
use wxdict_parser::{Block, Entry, Position};

/// Display window of a daily element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyRange {
    pub normal: f64,
    pub begin: f64,
    pub end: f64,
    pub units: UnitId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeDependence {
    pub time_type: TimeType,
    pub daily_range: Option<DailyRange>,
}

impl Default for TimeDependence {
    fn default() -> Self {
        Self {
            time_type: TimeType::Normal,
            daily_range: None,
        }
    }
}

/// An element definition.
#[derive(Debug, Clone)]
pub struct Element {
    pub name: String,
    pub labels: Labels,
    pub element_group: Option<GroupId>,
    /// Default group for fields of this element.
    pub field_group: Option<GroupId>,
    pub level_type: Option<LevelType>,
    pub field_type: Option<FieldType>,
    pub display_format: DisplayFormat,
    pub file_ident: Option<String>,
    pub file_id: Option<String>,
    pub precision: Option<Quantity>,
    pub time_dependence: TimeDependence,
    pub valid: Validity,
    pub blocks: Vec<Position>,
    pub(crate) detail: Option<ElementDetail>,
    pub(crate) detail_once: OnceFlag,
}

impl Element {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            labels: Labels::default(),
            element_group: None,
            field_group: None,
            level_type: None,
            field_type: None,
            display_format: DisplayFormat::Simple,
            file_ident: None,
            file_id: None,
            precision: None,
            time_dependence: TimeDependence::default(),
            valid: Validity::new(),
            blocks: Vec::new(),
            detail: None,
            detail_once: OnceFlag::new(),
        }
    }

    pub fn kind(&self) -> LevelType {
        self.level_type.unwrap_or(LevelType::NotUsed)
    }

    /// The editable field kind, None for `Special` or undeclared.
    pub fn field_kind(&self) -> Option<FieldKind> {
        self.field_type.and_then(FieldType::kind)
    }

    /// Units of the element's values, taken from its precision.
    pub fn units(&self) -> Option<UnitId> {
        self.precision.map(|p| p.units)
    }

    /// The resolved detail, present once [`ConfigStore::get_element_info`]
    /// has run.
    pub fn detail(&self) -> Option<&ElementDetail> {
        self.detail.as_ref()
    }
}

impl ConfigStore {
    pub(crate) fn load_elements(&mut self, blocks: &[Block]) {
        for block in blocks {
            for entry in &block.entries {
                let Some(body) = self.record_body(entry) else {
                    continue;
                };
                let existing = self.elements.find(Main, &entry.key);
                let mut element = existing
                    .and_then(|id| self.elements.get(id).cloned())
                    .unwrap_or_else(|| Element::new(&entry.key));
                let mut aliases = Vec::new();
                for kw in body {
                    if let Err(err) = self.element_keyword(&mut element, &mut aliases, kw) {
                        element.valid.invalidate();
                        self.report(err);
                    }
                }
                element.blocks.push(entry.pos.clone());
                let id = match existing {
                    Some(id) => {
                        if let Some(slot) = self.elements.get_mut(id) {
                            *slot = element;
                        }
                        id
                    }
                    None => {
                        let id = self.elements.add(element);
                        let _ = self.elements.name(Main, &entry.key, id);
                        id
                    }
                };
                for alias in aliases {
                    if let Err(collision) = self.elements.name(Main, &alias, id) {
                        if let Some(claimant) = self.elements.get_mut(id) {
                            claimant.valid.invalidate();
                        }
                        self.report(ConfigError::AliasCollision {
                            record: entry.key.clone(),
                            name: collision.name,
                        });
                    }
                }
            }
        }

        let misc = self.default_group(GroupKind::Elements);
        let mut broken = Vec::new();
        let ids: Vec<ElementId> = self.elements.iter().map(|(id, _)| id).collect();
        for id in ids {
            let Some(element) = self.elements.get_mut(id) else {
                continue;
            };
            if element.element_group.is_none() {
                element.element_group = misc;
            }
            let reason = match (element.level_type, element.field_type) {
                (None, _) => Some("no level_type given"),
                (_, None) => Some("no field_type given"),
                _ => None,
            };
            if let Some(reason) = reason {
                element.valid.invalidate();
                broken.push(ConfigError::inconsistent(&element.name, reason));
            }
        }
        for err in broken {
            self.report(err);
        }
    }

    fn element_keyword(&mut self, element: &mut Element, aliases: &mut Vec<String>, entry: &Entry) -> ConfigResult<()> {
        if let Some(result) = element.labels.apply(entry, &element.name) {
            return result;
        }
        let record = element.name.clone();
        match entry.key.as_str() {
            "alias" => {
                require_equals(entry, &record)?;
                aliases.extend(entry.values.iter().cloned());
            }
            "element_group" => element.element_group = Some(self.group_value(entry, &record, GroupKind::Elements)?),
            "field_group" => element.field_group = Some(self.group_value(entry, &record, GroupKind::Fields)?),
            "level_type" => element.level_type = Some(keyword_value(entry, &record, LevelType::from_keyword)?),
            "field_type" => element.field_type = Some(keyword_value(entry, &record, FieldType::from_keyword)?),
            "display_format" => {
                element.display_format = keyword_value(entry, &record, DisplayFormat::from_keyword)?;
            }
            "file_ident" => element.file_ident = optional_text(entry, &record)?,
            "file_id" => element.file_id = optional_text(entry, &record)?,
            "precision" => element.precision = Some(self.quantity(entry, &record)?),
            "time_dependence" => self.time_dependence(element, entry)?,
            key if is_detail_keyword(key) => {}
            _ => return Err(ConfigError::unknown_keyword(entry, Section::Element, &record)),
        }
        Ok(())
    }

    pub(crate) fn group_value(&mut self, entry: &Entry, record: &str, kind: GroupKind) -> ConfigResult<GroupId> {
        let name = keyword_value(entry, record, |w| Some(w.to_string()))?;
        self.identify_group(kind, &name)
            .ok_or_else(|| ConfigError::bad_value(entry, record, format!("unknown {kind} group '{name}'")))
    }

    fn time_dependence(&mut self, element: &mut Element, entry: &Entry) -> ConfigResult<()> {
        let record = element.name.clone();
        let Some(body) = entry.body.as_deref() else {
            return Err(ConfigError::expected_block(entry));
        };
        for kw in body {
            match kw.key.as_str() {
                "time_type" => {
                    element.time_dependence.time_type = keyword_value(kw, &record, TimeType::from_keyword)?;
                }
                "daily_range" => {
                    require_equals(kw, &record)?;
                    let [normal, begin, end, units] = kw.values.as_slice() else {
                        return Err(ConfigError::bad_value(kw, &record, "expected normal, begin and end times and units"));
                    };
                    let number = |text: &String| {
                        text.parse::<f64>()
                            .map_err(|_| ConfigError::bad_value(kw, &record, format!("'{text}' is not a number")))
                    };
                    let range = (number(normal)?, number(begin)?, number(end)?);
                    let units = self
                        .identify_unit(units)
                        .ok_or_else(|| ConfigError::bad_value(kw, &record, format!("unknown units '{units}'")))?;
                    element.time_dependence.daily_range = Some(DailyRange {
                        normal: range.0,
                        begin: range.1,
                        end: range.2,
                        units,
                    });
                }
                _ => return Err(ConfigError::unknown_keyword(kw, Section::TimeDependence, &record)),
            }
        }
        if element.time_dependence.time_type == TimeType::Daily && element.time_dependence.daily_range.is_none() {
            return Err(ConfigError::bad_value(entry, &record, "a daily element needs a daily_range"));
        }
        Ok(())
    }

    // ==================== Element Lookups ====================

    /// Find a valid element by name or alias.
    pub fn identify_element(&mut self, name: &str) -> Option<ElementId> {
        self.ensure_loaded(RegistryKind::Elements);
        self.elements
            .find(Main, name)
            .filter(|id| self.elements.get(*id).is_some_and(|e| e.valid.is_valid()))
    }

    /// Get an element by handle.
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    /// Every name the element is known by.
    pub fn identify_element_aliases(&mut self, name: &str) -> Vec<String> {
        match self.identify_element(name) {
            Some(id) => self.elements.aliases_of(Main, id),
            None => Vec::new(),
        }
    }

    /// Returns true if both names resolve to the same valid element.
    pub fn equivalent_element_definitions(&mut self, a: &str, b: &str) -> bool {
        match (self.identify_element(a), self.identify_element(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Valid elements in an element group, or all valid elements.
    pub fn identify_elements_by_group(&mut self, group: Option<&str>) -> Vec<ElementId> {
        self.ensure_loaded(RegistryKind::Elements);
        let wanted = match group {
            Some(name) => match self.identify_group(GroupKind::Elements, name) {
                Some(id) => Some(id),
                None => return Vec::new(),
            },
            None => None,
        };
        self.elements
            .iter()
            .filter(|(_, e)| e.valid.is_valid())
            .filter(|(_, e)| wanted.is_none() || e.element_group == wanted)
            .map(|(id, _)| id)
            .collect()
    }

    /// Whether an element may be analysed on a level.
    pub fn consistent_element_and_level(&mut self, element: &str, level: &str) -> bool {
        match (self.identify_element(element), self.identify_level(level)) {
            (Some(e), Some(l)) => self.consistent_ids(e, l),
            _ => false,
        }
    }

    pub(crate) fn consistent_ids(&self, element: ElementId, level: wxdict_core::LevelId) -> bool {
        match (self.elements.get(element), self.levels.get(level)) {
            (Some(e), Some(l)) => e.kind().accepts(l.kind()),
            _ => false,
        }
    }
}
