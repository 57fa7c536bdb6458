//! Cross-references: derived winds and values computed from other fields.

use crate::section::{name_pairs, optional_text, Labels};
use crate::{ConfigError, ConfigResult, ConfigStore, Quantity, RegistryKind, Section};
use tracing::{debug, warn};
use wxdict_core::{CrossRefId, CrossRefKind, FieldId, Validity};
use wxdict_parser::{Block, Entry, Position};

/// The wind cross-reference present in every configuration.
pub const ADJUSTED_WIND_CROSSREF: &str = "FPA_Adjusted_Wind_Func";

/// A wind or value cross-reference.
#[derive(Debug, Clone)]
pub struct CrossRef {
    pub name: String,
    pub kind: CrossRefKind,
    pub labels: Labels,
    /// Name of the function computing the cross-reference.
    pub function: Option<String>,
    pub time_weight: Option<Quantity>,
    pub value_weight: Option<Quantity>,
    pub fields: Vec<FieldId>,
    /// Applies to any element on any level rather than a field list.
    pub any_field: bool,
    pub synthesized: bool,
    pub valid: Validity,
    pub blocks: Vec<Position>,
}

impl CrossRef {
    fn new(name: &str, kind: CrossRefKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            labels: Labels::default(),
            function: None,
            time_weight: None,
            value_weight: None,
            fields: Vec::new(),
            any_field: false,
            synthesized: false,
            valid: Validity::new(),
            blocks: Vec::new(),
        }
    }
}

impl ConfigStore {
    pub(crate) fn load_crossrefs(&mut self, blocks: &[Block]) {
        for block in blocks {
            for namespace in &block.entries {
                let Some(kind) = CrossRefKind::from_keyword(&namespace.key) else {
                    self.report(ConfigError::unknown_keyword(namespace, Section::CrossRefs, &block.name));
                    continue;
                };
                let Some(body) = self.record_body(namespace) else {
                    continue;
                };
                for entry in body {
                    let Some(keywords) = self.record_body(entry) else {
                        continue;
                    };
                    let existing = self.crossrefs.find(kind, &entry.key);
                    let mut crossref = existing
                        .and_then(|id| self.crossrefs.get(id).cloned())
                        .unwrap_or_else(|| CrossRef::new(&entry.key, kind));
                    for kw in keywords {
                        if let Err(err) = self.crossref_keyword(&mut crossref, kw) {
                            crossref.valid.invalidate();
                            self.report(err);
                        }
                    }
                    crossref.blocks.push(entry.pos.clone());
                    match existing.and_then(|id| self.crossrefs.get_mut(id)) {
                        Some(slot) => *slot = crossref,
                        None => {
                            let id = self.crossrefs.add(crossref);
                            let _ = self.crossrefs.name(kind, &entry.key, id);
                        }
                    }
                }
            }
        }

        let unnamed: Vec<_> = self
            .crossrefs
            .iter()
            .filter(|(_, c)| c.function.is_none())
            .map(|(id, c)| (id, c.name.clone()))
            .collect();
        for (id, name) in unnamed {
            if let Some(crossref) = self.crossrefs.get_mut(id) {
                crossref.valid.invalidate();
            }
            self.report(ConfigError::inconsistent(&name, "no cross-reference function given"));
        }

        self.add_default_wind_crossref();
    }

    /// Every configuration gets the adjusted-wind cross-reference, bound to
    /// any element on any level.
    fn add_default_wind_crossref(&mut self) {
        if self.crossrefs.find(CrossRefKind::Winds, ADJUSTED_WIND_CROSSREF).is_some() {
            return;
        }
        if self.fields.is_empty() {
            warn!(
                crossref = ADJUSTED_WIND_CROSSREF,
                "adding default wind cross-reference with no fields declared"
            );
        } else {
            debug!(crossref = ADJUSTED_WIND_CROSSREF, "adding default wind cross-reference");
        }
        let mut crossref = CrossRef::new(ADJUSTED_WIND_CROSSREF, CrossRefKind::Winds);
        crossref.labels.label = Some("Adjusted Wind".to_string());
        crossref.function = Some(ADJUSTED_WIND_CROSSREF.to_string());
        crossref.any_field = true;
        crossref.synthesized = true;
        let id = self.crossrefs.add(crossref);
        let _ = self.crossrefs.name(CrossRefKind::Winds, ADJUSTED_WIND_CROSSREF, id);
    }

    fn crossref_keyword(&mut self, crossref: &mut CrossRef, entry: &Entry) -> ConfigResult<()> {
        if let Some(result) = crossref.labels.apply(entry, &crossref.name) {
            return result;
        }
        let record = crossref.name.clone();
        match (crossref.kind, entry.key.as_str()) {
            (CrossRefKind::Winds, "wind_function") | (CrossRefKind::Values, "value_function") => {
                crossref.function = optional_text(entry, &record)?;
            }
            (CrossRefKind::Values, "time_weight") => crossref.time_weight = Some(self.quantity(entry, &record)?),
            (CrossRefKind::Values, "value_weight") => crossref.value_weight = Some(self.quantity(entry, &record)?),
            (_, "crossref_fields") => {
                let Some(pairs) = name_pairs(entry, &record)? else {
                    crossref.fields.clear();
                    return Ok(());
                };
                for (element, level) in pairs {
                    let field = self.identify_field(&element, &level).ok_or_else(|| {
                        ConfigError::bad_value(entry, &record, format!("unknown field '{element} {level}'"))
                    })?;
                    if !crossref.fields.contains(&field) {
                        crossref.fields.push(field);
                    }
                }
            }
            _ => return Err(ConfigError::unknown_keyword(entry, Section::CrossRef, &record)),
        }
        Ok(())
    }

    // ==================== CrossRef Lookups ====================

    /// Find a valid cross-reference in one namespace.
    pub fn identify_crossref(&mut self, kind: CrossRefKind, name: &str) -> Option<CrossRefId> {
        self.ensure_loaded(RegistryKind::CrossRefs);
        self.crossrefs
            .find(kind, name)
            .filter(|id| self.crossrefs.get(*id).is_some_and(|c| c.valid.is_valid()))
    }

    pub fn crossref(&self, id: CrossRefId) -> Option<&CrossRef> {
        self.crossrefs.get(id)
    }

    fn crossrefs_of(&mut self, kind: CrossRefKind) -> Vec<CrossRefId> {
        self.ensure_loaded(RegistryKind::CrossRefs);
        self.crossrefs
            .iter()
            .filter(|(_, c)| c.kind == kind && c.valid.is_valid())
            .map(|(id, _)| id)
            .collect()
    }

    /// All valid wind cross-references.
    pub fn identify_crossrefs_for_winds(&mut self) -> Vec<CrossRefId> {
        self.crossrefs_of(CrossRefKind::Winds)
    }

    /// All valid value cross-references.
    pub fn identify_crossrefs_for_values(&mut self) -> Vec<CrossRefId> {
        self.crossrefs_of(CrossRefKind::Values)
    }
}
