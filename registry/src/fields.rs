//! Fields: element×level pairs.
//!
//! A field is declared as `element level { ... }` or synthesized the first
//! time a consistent pair is asked for. Names go through the element and
//! level tables, so aliases work on both sides.

use crate::detail::is_detail_keyword;
use crate::{ConfigError, ConfigResult, ConfigStore, ElementDetail, FeatureType, Labels, LineType, RegistryKind, Section};
use tracing::debug;
use wxdict_core::{ElementId, FieldId, GroupId, GroupKind, LevelId, OnceFlag, Validity};
use wxdict_parser::{Block, Entry, Position};

#[derive(Debug, Clone)]
pub struct Field {
    pub element: ElementId,
    pub level: LevelId,
    /// Canonical `element level` name.
    pub name: String,
    pub labels: Labels,
    pub group: Option<GroupId>,
    /// Synthesized on request rather than declared.
    pub created: bool,
    /// Declares detail keywords of its own, so it carries a private copy
    /// of the element detail.
    pub override_element: bool,
    pub valid: Validity,
    pub blocks: Vec<Position>,
    pub(crate) detail: Option<ElementDetail>,
    pub(crate) detail_once: OnceFlag,
}

impl Field {
    fn new(element: ElementId, level: LevelId, name: String) -> Self {
        Self {
            element,
            level,
            name,
            labels: Labels::default(),
            group: None,
            created: false,
            override_element: false,
            valid: Validity::new(),
            blocks: Vec::new(),
            detail: None,
            detail_once: OnceFlag::new(),
        }
    }
}

impl ConfigStore {
    pub(crate) fn load_fields(&mut self, blocks: &[Block]) {
        for block in blocks {
            for entry in &block.entries {
                let Some(body) = self.record_body(entry) else {
                    continue;
                };
                let record = entry.label();
                let Some((element, level)) = self.field_pair(entry, &record) else {
                    continue;
                };
                let existing = self.field_index.get(&(element, level)).copied();
                let mut field = match existing.and_then(|id| self.fields.get(id).cloned()) {
                    Some(field) => field,
                    None => Field::new(element, level, self.field_name(element, level)),
                };
                for kw in body {
                    if let Err(err) = self.field_keyword(&mut field, &record, kw) {
                        field.valid.invalidate();
                        self.report(err);
                    }
                }
                field.blocks.push(entry.pos.clone());
                match existing.and_then(|id| self.fields.get_mut(id)) {
                    Some(slot) => *slot = field,
                    None => {
                        let id = self.fields.add(field);
                        self.field_index.insert((element, level), id);
                    }
                }
            }
        }

        let ids: Vec<FieldId> = self.fields.iter().map(|(id, _)| id).collect();
        for id in ids {
            let Some(mut field) = self.fields.get(id).cloned() else {
                continue;
            };
            self.complete_field(&mut field);
            if let Some(slot) = self.fields.get_mut(id) {
                *slot = field;
            }
        }
    }

    /// Resolve the element and level of a field entry, reporting why not.
    fn field_pair(&mut self, entry: &Entry, record: &str) -> Option<(ElementId, LevelId)> {
        let [level_name] = entry.args.as_slice() else {
            self.report(ConfigError::bad_value(entry, record, "a field is named by an element and a level"));
            return None;
        };
        let Some(element) = self.identify_element(&entry.key) else {
            self.report(ConfigError::inconsistent(record, format!("unknown element '{}'", entry.key)));
            return None;
        };
        let Some(level) = self.identify_level(level_name) else {
            self.report(ConfigError::inconsistent(record, format!("unknown level '{level_name}'")));
            return None;
        };
        if !self.consistent_ids(element, level) {
            self.report(ConfigError::inconsistent(
                record,
                format!("element '{}' cannot be used on level '{level_name}'", entry.key),
            ));
            return None;
        }
        Some((element, level))
    }

    fn field_name(&self, element: ElementId, level: LevelId) -> String {
        let element = self.elements.get(element).map_or("", |e| e.name.as_str());
        let level = self.levels.get(level).map_or("", |l| l.name.as_str());
        format!("{element} {level}")
    }

    fn field_keyword(&mut self, field: &mut Field, record: &str, entry: &Entry) -> ConfigResult<()> {
        if let Some(result) = field.labels.apply(entry, record) {
            return result;
        }
        match entry.key.as_str() {
            "field_group" => field.group = Some(self.group_value(entry, record, GroupKind::Fields)?),
            key if is_detail_keyword(key) => field.override_element = true,
            _ => return Err(ConfigError::unknown_keyword(entry, Section::Field, record)),
        }
        Ok(())
    }

    /// Group from the field, then the element, then the level, then
    /// Miscellaneous. Label from the level and element labels.
    fn complete_field(&mut self, field: &mut Field) {
        let misc = self.default_group(GroupKind::Fields);
        let element = self.elements.get(field.element);
        let level = self.levels.get(field.level);
        field.group = field
            .group
            .or_else(|| element.and_then(|e| e.field_group))
            .or_else(|| level.and_then(|l| l.field_group))
            .or(misc);
        if field.labels.label.is_none() {
            if let (Some(element), Some(level)) = (element, level) {
                field.labels.label = Some(format!(
                    "{} {}",
                    level.labels.label_or(&level.name),
                    element.labels.label_or(&element.name)
                ));
            }
        }
    }

    // ==================== Field Lookups ====================

    /// Find a field, creating it when the pair is consistent but undeclared.
    pub fn identify_field(&mut self, element: &str, level: &str) -> Option<FieldId> {
        self.ensure_loaded(RegistryKind::Fields);
        let element = self.identify_element(element)?;
        let level = self.identify_level(level)?;
        if let Some(&id) = self.field_index.get(&(element, level)) {
            return self.fields.get(id).filter(|f| f.valid.is_valid()).map(|_| id);
        }
        if !self.consistent_ids(element, level) {
            return None;
        }

        let mut field = Field::new(element, level, self.field_name(element, level));
        debug!(field = %field.name, "creating field");
        field.created = true;
        self.complete_field(&mut field);
        let id = self.fields.add(field);
        self.field_index.insert((element, level), id);
        Some(id)
    }

    pub fn field(&self, id: FieldId) -> Option<&Field> {
        self.fields.get(id)
    }

    /// Valid fields known so far in a field group, or all of them.
    pub fn identify_fields_by_group(&mut self, group: Option<&str>) -> Vec<FieldId> {
        self.ensure_loaded(RegistryKind::Fields);
        let wanted = match group {
            Some(name) => match self.identify_group(GroupKind::Fields, name) {
                Some(id) => Some(id),
                None => return Vec::new(),
            },
            None => None,
        };
        self.fields
            .iter()
            .filter(|(_, f)| f.valid.is_valid())
            .filter(|(_, f)| wanted.is_none() || f.group == wanted)
            .map(|(id, _)| id)
            .collect()
    }

    /// Find a field and resolve its detail.
    pub fn get_field_info(&mut self, element: &str, level: &str) -> Option<&Field> {
        let id = self.resolve_field(element, level)?;
        self.fields.get(id)
    }

    fn resolve_field(&mut self, element: &str, level: &str) -> Option<FieldId> {
        let id = self.identify_field(element, level)?;
        let field = self.fields.get_mut(id)?;
        let element_id = field.element;
        let own_detail = field.detail_once.first() && field.override_element;
        self.resolve_element_detail(element_id);

        if own_detail {
            let (name, field_blocks) = self.fields.get(id).map(|f| (f.name.clone(), f.blocks.clone()))?;
            let mut positions = self.elements.get(element_id)?.blocks.clone();
            positions.extend(field_blocks);
            debug!(field = %name, "resolving field detail");
            let (detail, valid) = self.read_detail(element_id, &positions, &name)?;
            let field = self.fields.get_mut(id)?;
            field.detail = Some(detail);
            if !valid {
                field.valid.invalidate();
            }
        }

        let element_valid = self.elements.get(element_id).is_some_and(|e| e.valid.is_valid());
        let field_valid = self.fields.get(id).is_some_and(|f| f.valid.is_valid());
        (element_valid && field_valid).then_some(id)
    }

    /// The field's own detail, or its element's.
    pub fn field_detail(&self, id: FieldId) -> Option<&ElementDetail> {
        let field = self.fields.get(id)?;
        field
            .detail
            .as_ref()
            .or_else(|| self.elements.get(field.element)?.detail.as_ref())
    }

    pub fn identify_line_type_by_name(&mut self, element: &str, level: &str, name: &str) -> Option<&LineType> {
        let id = self.resolve_field(element, level)?;
        self.field_detail(id)?
            .line_types
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn identify_scattered_type_by_name(&mut self, element: &str, level: &str, name: &str) -> Option<&FeatureType> {
        let id = self.resolve_field(element, level)?;
        self.field_detail(id)?
            .scattered_types
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn identify_labelling_type_by_name(&mut self, element: &str, level: &str, name: &str) -> Option<&FeatureType> {
        let id = self.resolve_field(element, level)?;
        self.field_detail(id)?
            .labelling
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EditorKind, LoaderOptions};
    use wxdict_parser::MemoryProvider;

    const TEXT: &str = r#"
Groups
{
  Fields
  {
    Upper_Air { label = "Upper air" }
    Surface_Fields { }
    Special_Fields { }
  }
}
Levels
{
  surface { alias = sfc; label = "Surface"; level_type = Surface; level_levels = Surface; field_group = Surface_Fields }
  500 { label = "500mb"; level_type = Level; level_levels = Pressure 500 }
  1000-500 { level_type = Layer; level_levels = Pressure 500 1000 }
}
Elements
{
  temperature
  {
    alias = temp
    label = "Temperature"
    level_type = Level
    field_type = Continuous
    editor { entry_file = temp_entry; hilo = no }
  }
  height { level_type = Level; field_type = Continuous; field_group = Upper_Air }
  fronts
  {
    level_type = Surface
    field_type = Line
    line_types { cold { } warm { } }
  }
}
Fields
{
  temperature 500
  {
    field_group = Special_Fields
    label = "Upper temperature"
    editor { hilo = yes }
  }
  height surface { }
  temp 1000-500 { }
  temperature nowhere { }
  fronts surface { line_types_reset; line_types { occluded { } } }
  fronts { }
}
"#;

    fn store() -> ConfigStore {
        ConfigStore::new(LoaderOptions::new("f.cfg").with_provider(MemoryProvider::new().with_file("f.cfg", TEXT)))
    }

    #[test]
    fn test_declared_field() {
        let mut store = store();
        let id = store.identify_field("TEMP", "500").unwrap();
        let field = store.field(id).unwrap();
        assert!(!field.created);
        assert!(field.override_element);
        assert_eq!(field.name, "temperature 500");
        assert_eq!(field.labels.label.as_deref(), Some("Upper temperature"));
        let special = store.identify_group(GroupKind::Fields, "Special_Fields");
        assert_eq!(store.field(id).unwrap().group, special);
    }

    #[test]
    fn test_inconsistent_fields_rejected() {
        let mut store = store();
        assert_eq!(store.identify_field("temperature", "1000-500"), None);
        assert_eq!(store.identify_field("temperature", "nowhere"), None);
        let errors = store.diagnostics();
        assert!(errors.iter().any(|e| e.record() == Some("temp 1000-500")));
        assert!(errors.iter().any(|e| e.record() == Some("fronts")));
    }

    #[test]
    fn test_synthesized_field() {
        let mut store = store();
        let id = store.identify_field("temperature", "sfc").unwrap();
        let field = store.field(id).unwrap();
        assert!(field.created);
        assert_eq!(field.labels.label.as_deref(), Some("Surface Temperature"));
        assert_eq!(store.identify_field("temp", "surface"), Some(id));
        assert_eq!(store.identify_field("fronts", "500"), None);
    }

    #[test]
    fn test_group_priority() {
        let mut store = store();
        let upper = store.identify_group(GroupKind::Fields, "Upper_Air");
        let surface = store.identify_group(GroupKind::Fields, "Surface_Fields");
        let misc = store.identify_group(GroupKind::Fields, "Miscellaneous");

        let height_sfc = store.identify_field("height", "surface").unwrap();
        assert_eq!(store.field(height_sfc).unwrap().group, upper);
        let fronts = store.identify_field("fronts", "surface").unwrap();
        assert_eq!(store.field(fronts).unwrap().group, surface);
        let height_500 = store.identify_field("height", "500").unwrap();
        assert_eq!(store.field(height_500).unwrap().group, upper);
        let temp_sfc = store.identify_field("temperature", "surface").unwrap();
        assert_eq!(store.field(temp_sfc).unwrap().group, surface);
        assert!(misc.is_some());
    }

    #[test]
    fn test_fields_by_group() {
        let mut store = store();
        assert_eq!(store.identify_fields_by_group(Some("Special_Fields")).len(), 1);
        assert_eq!(store.identify_fields_by_group(None).len(), 3);
        assert!(store.identify_fields_by_group(Some("Nowhere")).is_empty());
    }

    #[test]
    fn test_field_override_detail() {
        let mut store = store();
        let field = store.get_field_info("temperature", "500").unwrap();
        assert!(field.detail.is_some());
        let id = store.identify_field("temperature", "500").unwrap();
        let editor = store.field_detail(id).unwrap().editor.clone().unwrap();
        assert!(matches!(editor.kind, EditorKind::Continuous { hilo: true, .. }));
        assert_eq!(editor.files.entry_file.as_deref(), Some("temp_entry"));

        let element = store.get_element_info("temperature").unwrap();
        let editor = element.detail().unwrap().editor.as_ref().unwrap();
        assert!(matches!(editor.kind, EditorKind::Continuous { hilo: false, .. }));
    }

    #[test]
    fn test_field_falls_back_to_element_detail() {
        let mut store = store();
        let field = store.get_field_info("temperature", "surface").unwrap();
        assert!(field.detail.is_none());
        let id = store.identify_field("temperature", "surface").unwrap();
        let element = store.identify_element("temperature").unwrap();
        assert_eq!(store.field_detail(id), store.element(element).unwrap().detail());
    }

    #[test]
    fn test_type_lookups() {
        let mut store = store();
        assert!(store.identify_line_type_by_name("fronts", "surface", "OCCLUDED").is_some());
        assert!(store.identify_line_type_by_name("fronts", "surface", "cold").is_none());
        assert!(store.identify_labelling_type_by_name("fronts", "surface", "label").is_some());
        assert!(store.identify_scattered_type_by_name("fronts", "surface", "label").is_none());
    }
}
