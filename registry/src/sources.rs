//! Sources and their subsources.
//!
//! A source always carries at least one subsource: index 0 is the implicit
//! default, which has no name of its own and reads its labels from the
//! parent. The allied model descriptor is detail and is only read by
//! [`ConfigStore::get_source_info`].

use crate::allied::AlliedModel;
use crate::section::{bool_value, keyword_value, optional_text, require_equals, Labels};
use crate::table::Main;
use crate::{ConfigError, ConfigResult, ConfigStore, RegistryKind, Section};
use tracing::debug;
use wxdict_core::{OnceFlag, SourceId, SourceRef, SourceType, Validity};
use wxdict_parser::{Block, Entry, ValueArg, Position};

/// Keyword holding the allied model descriptor.
pub(crate) const ALLIED_MODEL: &str = "allied_model";

/// A subsource of a source.
#[derive(Debug, Clone, Default)]
pub struct Subsource {
    /// Empty for the default subsource.
    pub name: String,
    pub labels: Labels,
    pub sub_directory_path: Option<String>,
}

impl Subsource {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// A data source definition.
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub labels: Labels,
    pub minutes_required: bool,
    pub source_type: Option<SourceType>,
    pub directory_tag: Option<String>,
    pub directory_path: Option<String>,
    pub directory_layers: Option<u32>,
    subsources: Vec<Subsource>,
    pub allied: Option<AlliedModel>,
    pub valid: Validity,
    pub blocks: Vec<Position>,
    pub(crate) detail_once: OnceFlag,
}

impl Source {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            labels: Labels::default(),
            minutes_required: false,
            source_type: None,
            directory_tag: None,
            directory_path: None,
            directory_layers: None,
            subsources: vec![Subsource::default()],
            allied: None,
            valid: Validity::new(),
            blocks: Vec::new(),
            detail_once: OnceFlag::new(),
        }
    }

    pub fn subsources(&self) -> &[Subsource] {
        &self.subsources
    }

    pub fn subsource(&self, index: usize) -> Option<&Subsource> {
        self.subsources.get(index)
    }

    /// Index of a named subsource. An empty name is the default.
    pub fn find_subsource(&self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return Some(0);
        }
        self.subsources
            .iter()
            .skip(1)
            .position(|sub| sub.name.eq_ignore_ascii_case(name))
            .map(|i| i + 1)
    }

    /// A subsource's label, falling back to the source's.
    pub fn sub_label(&self, index: usize) -> &str {
        match self.subsources.get(index).and_then(|s| s.labels.label.as_deref()) {
            Some(label) => label,
            None => self.labels.label_or(&self.name),
        }
    }

    pub fn sub_short_label(&self, index: usize) -> &str {
        match self.subsources.get(index).and_then(|s| s.labels.short_label.as_deref()) {
            Some(label) => label,
            None => self.labels.short_label_or(&self.name),
        }
    }

    pub fn sub_description(&self, index: usize) -> Option<&str> {
        self.subsources
            .get(index)
            .and_then(|s| s.labels.description.as_deref())
            .or(self.labels.description.as_deref())
    }

    /// The source name as written in references, `source:sub` for a
    /// named subsource.
    pub fn full_name(&self, index: usize) -> String {
        match self.subsources.get(index) {
            Some(sub) if !sub.name.is_empty() => format!("{}:{}", self.name, sub.name),
            _ => self.name.clone(),
        }
    }

    pub fn kind(&self) -> SourceType {
        self.source_type.unwrap_or(SourceType::NotUsed)
    }
}

/// Split `source:subsource` into its parts. The subsource is empty when
/// none is given.
pub fn parse_source_name(name: &str) -> (String, String) {
    match name.split_once(':') {
        Some((source, sub)) => (source.trim().to_string(), sub.trim().to_string()),
        None => (name.trim().to_string(), String::new()),
    }
}

impl ConfigStore {
    pub(crate) fn load_sources(&mut self, blocks: &[Block]) {
        for block in blocks {
            for entry in &block.entries {
                let Some(body) = self.record_body(entry) else {
                    continue;
                };
                let existing = self.sources.find(Main, &entry.key);
                let mut source = existing
                    .and_then(|id| self.sources.get(id).cloned())
                    .unwrap_or_else(|| Source::new(&entry.key));
                let mut aliases = Vec::new();
                for kw in body {
                    if let Err(err) = source_keyword(&mut source, &mut aliases, kw) {
                        source.valid.invalidate();
                        self.report(err);
                    }
                }
                source.blocks.push(entry.pos.clone());
                let id = match existing {
                    Some(id) => {
                        if let Some(slot) = self.sources.get_mut(id) {
                            *slot = source;
                        }
                        id
                    }
                    None => {
                        let id = self.sources.add(source);
                        let _ = self.sources.name(Main, &entry.key, id);
                        id
                    }
                };
                for alias in aliases {
                    if let Err(collision) = self.sources.name(Main, &alias, id) {
                        if let Some(claimant) = self.sources.get_mut(id) {
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

        let untyped: Vec<_> = self
            .sources
            .iter()
            .filter(|(_, s)| s.source_type.is_none())
            .map(|(id, s)| (id, s.name.clone()))
            .collect();
        for (id, name) in untyped {
            if let Some(source) = self.sources.get_mut(id) {
                source.valid.invalidate();
            }
            self.report(ConfigError::inconsistent(&name, "no source_type given"));
        }
    }

    // ==================== Source Lookups ====================

    /// Find a valid source and subsource.
    ///
    /// When `sub` is None the name may carry the subsource itself, as in
    /// `source:sub`. An unknown subsource fails the lookup.
    pub fn identify_source(&mut self, name: &str, sub: Option<&str>) -> Option<SourceRef> {
        self.ensure_loaded(RegistryKind::Sources);
        let (name, sub) = match sub {
            Some(sub) => (name.to_string(), sub.to_string()),
            None => parse_source_name(name),
        };
        let id = self.sources.find(Main, &name)?;
        let source = self.sources.get(id).filter(|s| s.valid.is_valid())?;
        let index = source.find_subsource(&sub)?;
        Some(SourceRef::new(id, index))
    }

    /// Get a source by handle.
    pub fn source(&self, id: SourceId) -> Option<&Source> {
        self.sources.get(id)
    }

    /// All valid sources of a type; `Any` lists every valid source.
    pub fn identify_sources_by_type(&mut self, wanted: SourceType) -> Vec<SourceId> {
        self.ensure_loaded(RegistryKind::Sources);
        self.sources
            .iter()
            .filter(|(_, s)| s.valid.is_valid() && s.kind().matches(wanted))
            .map(|(id, _)| id)
            .collect()
    }

    /// Every name the source is known by.
    pub fn identify_source_aliases(&mut self, name: &str) -> Vec<String> {
        match self.identify_source(name, Some("")) {
            Some(found) => self.sources.aliases_of(Main, found.source),
            None => Vec::new(),
        }
    }

    /// Returns true if both names resolve to the same valid source.
    pub fn equivalent_source_definitions(&mut self, a: &str, b: &str) -> bool {
        match (self.identify_source(a, Some("")), self.identify_source(b, Some(""))) {
            (Some(x), Some(y)) => x.source == y.source,
            _ => false,
        }
    }

    /// The source with its allied model resolved.
    ///
    /// The first call re-reads the source's blocks for `allied_model` and
    /// checks every resource it names. Later calls return the stored result.
    pub fn get_source_info(&mut self, name: &str, sub: Option<&str>) -> Option<&Source> {
        let found = self.identify_source(name, sub)?;
        self.resolve_source_detail(found.source);
        self.sources.get(found.source).filter(|s| s.valid.is_valid())
    }

    fn resolve_source_detail(&mut self, id: SourceId) {
        let Some(source) = self.sources.get_mut(id) else {
            return;
        };
        if !source.detail_once.first() {
            return;
        }
        let mut source = source.clone();
        debug!(source = %source.name, "resolving source detail");

        let entries = self.reread(&source.blocks);
        for entry in &entries {
            for kw in entry.children().iter().filter(|kw| kw.key == ALLIED_MODEL) {
                if source.kind() != SourceType::Allied {
                    source.valid.invalidate();
                    self.report(ConfigError::bad_value(
                        kw,
                        &source.name,
                        "allied_model is only allowed for Allied sources",
                    ));
                    continue;
                }
                let mut model = source.allied.take().unwrap_or_default();
                if let Err(err) = self.apply_allied_model(&mut model, &source.name, kw) {
                    source.valid.invalidate();
                    self.report(err);
                }
                source.allied = Some(model);
            }
        }

        if let Some(model) = &source.allied {
            for err in self.check_allied_model(model, &source.name) {
                source.valid.invalidate();
                self.report(err);
            }
        }
        if let Some(slot) = self.sources.get_mut(id) {
            *slot = source;
        }
    }
}

fn source_keyword(source: &mut Source, aliases: &mut Vec<String>, entry: &Entry) -> ConfigResult<()> {
    if let Some(result) = source.labels.apply(entry, &source.name) {
        return result;
    }
    let record = source.name.clone();
    match entry.key.as_str() {
        "alias" => {
            require_equals(entry, &record)?;
            aliases.extend(entry.values.iter().cloned());
        }
        "minutes_required" => source.minutes_required = bool_value(entry, &record)?,
        "source_type" => source.source_type = Some(keyword_value(entry, &record, SourceType::from_keyword)?),
        "directory_tag" => source.directory_tag = optional_text(entry, &record)?,
        "directory_path" => source.directory_path = optional_text(entry, &record)?,
        "directory_layers" => {
            source.directory_layers = Some(keyword_value(entry, &record, |w| w.parse().ok())?);
        }
        "subsources" => apply_subsources(source, entry)?,
        // Detail keyword, read by the detail pass.
        ALLIED_MODEL => {}
        _ => return Err(ConfigError::unknown_keyword(entry, Section::Source, &record)),
    }
    Ok(())
}

fn apply_subsources(source: &mut Source, entry: &Entry) -> ConfigResult<()> {
    if !entry.is_block() {
        require_equals(entry, &source.name)?;
        return match entry.value_arg() {
            ValueArg::Empty => {
                source.subsources.truncate(1);
                Ok(())
            }
            _ => Err(ConfigError::bad_value(entry, &source.name, "expected None or a subsource block")),
        };
    }
    for item in entry.children() {
        if !item.is_block() {
            return Err(ConfigError::expected_block(item));
        }
        let index = match source.find_subsource(&item.key) {
            Some(index) => index,
            None => {
                source.subsources.push(Subsource::new(&item.key));
                source.subsources.len() - 1
            }
        };
        let sub = &mut source.subsources[index];
        for kw in item.children() {
            if let Some(result) = sub.labels.apply(kw, &source.name) {
                result?;
                continue;
            }
            match kw.key.as_str() {
                "sub_directory_path" => sub.sub_directory_path = optional_text(kw, &source.name)?,
                _ => return Err(ConfigError::unknown_keyword(kw, Section::Subsource, &source.name)),
            }
        }
    }
    Ok(())
}
