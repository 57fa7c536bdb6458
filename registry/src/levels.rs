//! Levels: vertical locations that elements are analysed on.

use crate::section::{keyword_value, optional_text, require_equals, Labels};
use crate::table::Main;
use crate::{ConfigError, ConfigResult, ConfigStore, RegistryKind, Section};
use wxdict_core::{GroupId, GroupKind, LevelCategory, LevelId, LevelType, Validity};
use wxdict_parser::{Block, Entry, Position};

/// The values of a levels descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelValues {
    None,
    Single(String),
    Pair { upper: String, lower: String },
}

/// Which levels a level record stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelsDescriptor {
    pub category: LevelCategory,
    pub values: LevelValues,
}

/// A level definition.
#[derive(Debug, Clone)]
pub struct Level {
    pub name: String,
    pub labels: Labels,
    pub level_type: Option<LevelType>,
    pub levels: Option<LevelsDescriptor>,
    /// Default group for fields on this level.
    pub field_group: Option<GroupId>,
    pub file_ident: Option<String>,
    /// Older form of the file identifier.
    pub file_id: Option<String>,
    pub valid: Validity,
    pub blocks: Vec<Position>,
}

impl Level {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            labels: Labels::default(),
            level_type: None,
            levels: None,
            field_group: None,
            file_ident: None,
            file_id: None,
            valid: Validity::new(),
            blocks: Vec::new(),
        }
    }

    /// The level type, treating an undeclared type as unusable.
    pub fn kind(&self) -> LevelType {
        self.level_type.unwrap_or(LevelType::NotUsed)
    }

    /// Check the descriptor against the declared type.
    fn check_levels(&self) -> Option<String> {
        let ltype = self.level_type?;
        let desc = self.levels.as_ref()?;
        if !ltype.permits(desc.category) {
            return Some(format!("{} levels do not fit a {} level", desc.category, ltype));
        }
        match (&desc.values, ltype.uses_pair()) {
            (LevelValues::Pair { .. }, false) => {
                Some(format!("a {ltype} level takes a single level value"))
            }
            (LevelValues::Single(_) | LevelValues::None, true) => {
                Some("a layer takes upper and lower level values".to_string())
            }
            (LevelValues::None, false)
                if matches!(
                    desc.category,
                    LevelCategory::Pressure | LevelCategory::Height | LevelCategory::Sigma | LevelCategory::Theta
                ) =>
            {
                Some(format!("{} levels need a level value", desc.category))
            }
            _ => None,
        }
    }

    /// Returns true if the descriptor holds exactly these values.
    pub fn has_levels(&self, single: Option<&str>, upper: Option<&str>, lower: Option<&str>) -> bool {
        let same = |a: &str, b: Option<&str>| b.is_some_and(|b| a.eq_ignore_ascii_case(b));
        match self.levels.as_ref().map(|d| &d.values) {
            None | Some(LevelValues::None) => single.is_none() && upper.is_none() && lower.is_none(),
            Some(LevelValues::Single(value)) => same(value, single),
            Some(LevelValues::Pair { upper: u, lower: l }) => same(u, upper) && same(l, lower),
        }
    }
}

impl ConfigStore {
    pub(crate) fn load_levels(&mut self, blocks: &[Block]) {
        for block in blocks {
            for entry in &block.entries {
                let Some(body) = self.record_body(entry) else {
                    continue;
                };
                let existing = self.levels.find(Main, &entry.key);
                let mut level = existing
                    .and_then(|id| self.levels.get(id).cloned())
                    .unwrap_or_else(|| Level::new(&entry.key));
                let mut aliases = Vec::new();
                for kw in body {
                    if let Err(err) = self.level_keyword(&mut level, &mut aliases, kw) {
                        level.valid.invalidate();
                        self.report(err);
                    }
                }
                level.blocks.push(entry.pos.clone());
                let id = match existing {
                    Some(id) => {
                        if let Some(slot) = self.levels.get_mut(id) {
                            *slot = level;
                        }
                        id
                    }
                    None => {
                        let id = self.levels.add(level);
                        let _ = self.levels.name(Main, &entry.key, id);
                        id
                    }
                };
                self.add_level_aliases(id, &entry.key, aliases);
            }
        }

        let mut broken = Vec::new();
        for (id, level) in self.levels.iter() {
            let reason = match level.level_type {
                None => Some("no level_type given".to_string()),
                Some(_) => level.check_levels(),
            };
            if let Some(reason) = reason {
                broken.push((id, ConfigError::inconsistent(&level.name, reason)));
            }
        }
        for (id, err) in broken {
            if let Some(level) = self.levels.get_mut(id) {
                level.valid.invalidate();
            }
            self.report(err);
        }
    }

    fn add_level_aliases(&mut self, id: LevelId, record: &str, aliases: Vec<String>) {
        for alias in aliases {
            if let Err(collision) = self.levels.name(Main, &alias, id) {
                if let Some(claimant) = self.levels.get_mut(id) {
                    claimant.valid.invalidate();
                }
                self.report(ConfigError::AliasCollision {
                    record: record.to_string(),
                    name: collision.name,
                });
            }
        }
    }

    fn level_keyword(&mut self, level: &mut Level, aliases: &mut Vec<String>, entry: &Entry) -> ConfigResult<()> {
        if let Some(result) = level.labels.apply(entry, &level.name) {
            return result;
        }
        let record = level.name.clone();
        match entry.key.as_str() {
            "alias" => {
                require_equals(entry, &record)?;
                aliases.extend(entry.values.iter().cloned());
            }
            "level_type" => {
                level.level_type = Some(keyword_value(entry, &record, LevelType::from_keyword)?);
            }
            "field_group" => {
                let name = keyword_value(entry, &record, |w| Some(w.to_string()))?;
                let group = self.identify_group(GroupKind::Fields, &name).ok_or_else(|| {
                    ConfigError::bad_value(entry, &record, format!("unknown field group '{name}'"))
                })?;
                level.field_group = Some(group);
            }
            "level_levels" => {
                let category = keyword_value(entry, &record, LevelCategory::from_keyword)?;
                let values = match &entry.values[1..] {
                    [] => LevelValues::None,
                    [single] => LevelValues::Single(single.clone()),
                    [upper, lower] => LevelValues::Pair {
                        upper: upper.clone(),
                        lower: lower.clone(),
                    },
                    _ => return Err(ConfigError::bad_value(entry, &record, "too many level values")),
                };
                level.levels = Some(LevelsDescriptor { category, values });
            }
            "file_ident" => level.file_ident = optional_text(entry, &record)?,
            "file_id" => level.file_id = optional_text(entry, &record)?,
            _ => return Err(ConfigError::unknown_keyword(entry, Section::Level, &record)),
        }
        Ok(())
    }

    // ==================== Level Lookups ====================

    /// Find a valid level by name or alias.
    pub fn identify_level(&mut self, name: &str) -> Option<LevelId> {
        self.ensure_loaded(RegistryKind::Levels);
        self.levels
            .find(Main, name)
            .filter(|id| self.levels.get(*id).is_some_and(|l| l.valid.is_valid()))
    }

    /// Get a level by handle.
    pub fn level(&self, id: LevelId) -> Option<&Level> {
        self.levels.get(id)
    }

    /// Every name the level is known by.
    pub fn identify_level_aliases(&mut self, name: &str) -> Vec<String> {
        match self.identify_level(name) {
            Some(id) => self.levels.aliases_of(Main, id),
            None => Vec::new(),
        }
    }

    /// Returns true if both names resolve to the same valid level.
    pub fn equivalent_level_definitions(&mut self, a: &str, b: &str) -> bool {
        match (self.identify_level(a), self.identify_level(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// All valid levels of a type; `Any` lists every valid level.
    pub fn identify_levels_by_type(&mut self, ltype: LevelType) -> Vec<LevelId> {
        self.ensure_loaded(RegistryKind::Levels);
        self.levels
            .iter()
            .filter(|(_, l)| l.valid.is_valid())
            .filter(|(_, l)| ltype == LevelType::Any || l.level_type == Some(ltype))
            .map(|(id, _)| id)
            .collect()
    }

    /// The first valid level of a type whose descriptor holds these values.
    pub fn identify_level_from_levels(
        &mut self,
        ltype: LevelType,
        single: Option<&str>,
        upper: Option<&str>,
        lower: Option<&str>,
    ) -> Option<LevelId> {
        self.identify_levels_by_type(ltype)
            .into_iter()
            .find(|id| self.levels.get(*id).is_some_and(|l| l.has_levels(single, upper, lower)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LoaderOptions;
    use wxdict_parser::MemoryProvider;

    const TEXT: &str = r#"
Groups { Fields { Upper_Air { } } }
Levels
{
  msl     { label = "Mean Sea Level"; level_type = Msl; level_levels = Msl; alias = MeanSeaLevel }
  surface { level_type = Surface; level_levels = Surface }
  500     { level_type = Level; level_levels = Pressure 500; field_group = Upper_Air; alias = 500mb }
  850     { level_type = Level; level_levels = Pressure 850 }
  1000-500 { level_type = Layer; level_levels = Pressure 500 1000 }
  badcat  { level_type = Surface; level_levels = Pressure 700 }
  badpair { level_type = Level; level_levels = Pressure 700 500 }
  nolayer { level_type = Layer; level_levels = Height 1000 }
  notype  { level_levels = Msl }
  grab    { level_type = Level; alias = 500 }
}
"#;

    fn store() -> ConfigStore {
        ConfigStore::new(LoaderOptions::new("l.cfg").with_provider(MemoryProvider::new().with_file("l.cfg", TEXT)))
    }

    #[test]
    fn test_identify_level_and_aliases() {
        let mut store = store();
        let msl = store.identify_level("MSL").unwrap();
        assert_eq!(store.identify_level("meansealevel"), Some(msl));
        assert_eq!(store.level(msl).unwrap().level_type, Some(LevelType::Msl));
        assert!(store.equivalent_level_definitions("msl", "MeanSeaLevel"));
        assert!(!store.equivalent_level_definitions("msl", "surface"));

        let aliases = store.identify_level_aliases("500mb");
        assert_eq!(aliases, vec!["500", "500mb"]);
    }

    #[test]
    fn test_field_group_resolved() {
        let mut store = store();
        let id = store.identify_level("500").unwrap();
        let group = store.level(id).unwrap().field_group.unwrap();
        assert_eq!(store.group(group).unwrap().name, "Upper_Air");
    }

    #[test]
    fn test_descriptor_checks() {
        let mut store = store();
        assert!(store.identify_level("1000-500").is_some());
        assert_eq!(store.identify_level("badcat"), None);
        assert_eq!(store.identify_level("badpair"), None);
        assert_eq!(store.identify_level("nolayer"), None);
        assert_eq!(store.identify_level("notype"), None);
    }

    #[test]
    fn test_alias_collision_keeps_first_owner() {
        let mut store = store();
        let first = store.identify_level("500").unwrap();
        assert_eq!(store.level(first).unwrap().name, "500");
        assert_eq!(store.identify_level("grab"), None);
        assert!(store
            .diagnostics()
            .iter()
            .any(|e| matches!(e, ConfigError::AliasCollision { record, .. } if record == "grab")));
    }

    #[test]
    fn test_levels_by_type_and_values() {
        let mut store = store();
        assert_eq!(store.identify_levels_by_type(LevelType::Level).len(), 2);
        assert!(store.identify_levels_by_type(LevelType::Any).len() >= 6);

        let found = store
            .identify_level_from_levels(LevelType::Level, Some("850"), None, None)
            .unwrap();
        assert_eq!(store.level(found).unwrap().name, "850");

        let layer = store
            .identify_level_from_levels(LevelType::Layer, None, Some("500"), Some("1000"))
            .unwrap();
        assert_eq!(store.level(layer).unwrap().name, "1000-500");
    }
}
