//! WXDICT Check
//!
//! Loads a whole configuration, resolves the detail of every source,
//! element and field, and lists what was defined.

use std::io::{self, Write};
use tracing::{info, warn};
use wxdict_core::{LevelType, SourceType};
use wxdict_registry::{ConfigStore, RegistryKind};

/// Outcome of verifying a configuration.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    /// Valid records per registry.
    pub counts: Vec<(RegistryKind, usize)>,
    /// Records that loaded but failed their detail checks.
    pub failed_detail: Vec<String>,
    pub diagnostics: usize,
    /// False when a block could not be read at all.
    pub readable: bool,
}

impl Summary {
    pub fn count(&self, kind: RegistryKind) -> usize {
        self.counts
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(0, |(_, n)| *n)
    }
}

/// Load every registry and resolve all detail.
pub fn verify(store: &mut ConfigStore) -> Summary {
    let readable = store.read_complete_config();
    let mut failed_detail = Vec::new();

    for id in store.identify_sources_by_type(SourceType::Any) {
        let Some(name) = store.source(id).map(|s| s.name.clone()) else {
            continue;
        };
        if store.get_source_info(&name, Some("")).is_none() {
            failed_detail.push(name);
        }
    }
    for id in store.identify_elements_by_group(None) {
        let Some(name) = store.element(id).map(|e| e.name.clone()) else {
            continue;
        };
        if store.get_element_info(&name).is_none() {
            failed_detail.push(name);
        }
    }
    for id in store.identify_fields_by_group(None) {
        let Some((element, level)) = field_names(store, id) else {
            continue;
        };
        if store.get_field_info(&element, &level).is_none() {
            failed_detail.push(format!("{element} {level}"));
        }
    }
    for name in &failed_detail {
        warn!(record = %name, "detail checks failed");
    }

    let counts = RegistryKind::ALL
        .into_iter()
        .map(|kind| (kind, valid_count(store, kind)))
        .collect();
    let summary = Summary {
        counts,
        failed_detail,
        diagnostics: store.diagnostics().len(),
        readable,
    };
    info!(diagnostics = summary.diagnostics, readable, "configuration checked");
    summary
}

fn field_names(store: &ConfigStore, id: wxdict_core::FieldId) -> Option<(String, String)> {
    let field = store.field(id)?;
    let element = store.element(field.element)?.name.clone();
    let level = store.level(field.level)?.name.clone();
    Some((element, level))
}

fn valid_count(store: &mut ConfigStore, kind: RegistryKind) -> usize {
    match kind {
        RegistryKind::Units => {
            let bases: Vec<String> = store
                .identify_mks_units()
                .into_iter()
                .filter_map(|id| store.unit(id).map(|u| u.name.clone()))
                .collect();
            bases.iter().map(|mks| store.identify_units_by_mks(mks).len()).sum()
        }
        RegistryKind::Constants => store.identify_constants().len(),
        RegistryKind::Sources => store.identify_sources_by_type(SourceType::Any).len(),
        RegistryKind::Groups => store.identify_groups_for_fields().len() + store.identify_groups_for_elements().len(),
        RegistryKind::Levels => store.identify_levels_by_type(LevelType::Any).len(),
        RegistryKind::Elements => store.identify_elements_by_group(None).len(),
        RegistryKind::Fields => store.identify_fields_by_group(None).len(),
        RegistryKind::CrossRefs => {
            store.identify_crossrefs_for_winds().len() + store.identify_crossrefs_for_values().len()
        }
        RegistryKind::Samples => store.identify_samples_for_values().len() + store.identify_samples_for_winds().len(),
    }
}

// ==================== Listing ====================

fn heading(out: &mut impl Write, title: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{title}")?;
    writeln!(out, "{}", "-".repeat(title.len()))
}

fn names(out: &mut impl Write, label: &str, names: &[String]) -> io::Result<()> {
    if names.is_empty() {
        return Ok(());
    }
    writeln!(out, "  {label}: {}", names.join(" "))
}

/// Print every registry's names, grouped the way the definitions are used.
pub fn list(store: &mut ConfigStore, out: &mut impl Write) -> io::Result<()> {
    heading(out, "Units")?;
    for mks in store.identify_mks_units() {
        let Some(base) = store.unit(mks).map(|u| u.name.clone()) else {
            continue;
        };
        let units: Vec<String> = store
            .identify_units_by_mks(&base)
            .into_iter()
            .filter_map(|id| store.unit(id).map(|u| u.name.clone()))
            .collect();
        names(out, &base, &units)?;
    }

    heading(out, "Constants")?;
    let constants: Vec<String> = store
        .identify_constants()
        .into_iter()
        .filter_map(|id| store.constant(id).map(|c| c.name.clone()))
        .collect();
    names(out, "all", &constants)?;

    heading(out, "Sources")?;
    for &kind in SourceType::ALL.iter().filter(|k| **k != SourceType::Any) {
        let sources: Vec<String> = store
            .identify_sources_by_type(kind)
            .into_iter()
            .filter_map(|id| store.source(id).map(|s| s.name.clone()))
            .collect();
        names(out, kind.keyword(), &sources)?;
    }

    heading(out, "Levels")?;
    for &kind in LevelType::ALL.iter().filter(|k| **k != LevelType::Any) {
        let levels: Vec<String> = store
            .identify_levels_by_type(kind)
            .into_iter()
            .filter_map(|id| store.level(id).map(|l| l.name.clone()))
            .collect();
        names(out, kind.keyword(), &levels)?;
    }

    heading(out, "Elements")?;
    for group in store.identify_groups_for_elements() {
        let Some(group) = store.group(group).map(|g| g.name.clone()) else {
            continue;
        };
        let elements: Vec<String> = store
            .identify_elements_by_group(Some(&group))
            .into_iter()
            .filter_map(|id| store.element(id).map(|e| e.name.clone()))
            .collect();
        names(out, &group, &elements)?;
    }

    heading(out, "Fields")?;
    for group in store.identify_groups_for_fields() {
        let Some(group) = store.group(group).map(|g| g.name.clone()) else {
            continue;
        };
        let fields: Vec<String> = store
            .identify_fields_by_group(Some(&group))
            .into_iter()
            .filter_map(|id| store.field(id).map(|f| f.name.clone()))
            .collect();
        names(out, &group, &fields)?;
    }

    heading(out, "CrossRefs")?;
    let winds: Vec<String> = store
        .identify_crossrefs_for_winds()
        .into_iter()
        .filter_map(|id| store.crossref(id).map(|c| c.name.clone()))
        .collect();
    names(out, "Winds", &winds)?;
    let values: Vec<String> = store
        .identify_crossrefs_for_values()
        .into_iter()
        .filter_map(|id| store.crossref(id).map(|c| c.name.clone()))
        .collect();
    names(out, "Values", &values)?;

    heading(out, "Samples")?;
    let values: Vec<String> = store
        .identify_samples_for_values()
        .into_iter()
        .filter_map(|id| store.sample(id).map(|s| s.name.clone()))
        .collect();
    names(out, "Values", &values)?;
    let winds: Vec<String> = store
        .identify_samples_for_winds()
        .into_iter()
        .filter_map(|id| store.sample(id).map(|s| s.name.clone()))
        .collect();
    names(out, "Winds", &winds)
}
