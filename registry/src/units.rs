//! Units: names, MKS equivalents and conversion.

use crate::section::{float_at, require_equals, word, Labels};
use crate::table::Main;
use crate::{ConfigError, ConfigResult, ConfigStore, RegistryKind, Section};
use wxdict_core::{Conversion, UnitId, Validity};
use wxdict_parser::{Block, Entry, Position};

/// A physical unit.
#[derive(Debug, Clone)]
pub struct Unit {
    pub name: String,
    pub labels: Labels,
    /// Name of the unit this one converts to; a base unit names itself.
    pub mks: String,
    pub conversion: Conversion,
    pub valid: Validity,
    pub blocks: Vec<Position>,
}

impl Unit {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            labels: Labels::default(),
            mks: String::new(),
            conversion: Conversion::IDENTITY,
            valid: Validity::new(),
            blocks: Vec::new(),
        }
    }

    /// Returns true if this unit is its own MKS base.
    pub fn is_mks(&self) -> bool {
        self.mks == self.name
    }

    fn apply(&mut self, entry: &Entry) -> ConfigResult<()> {
        if let Some(result) = self.labels.apply(entry, &self.name) {
            return result;
        }
        match entry.key.as_str() {
            "MKS_equivalent" => {
                self.mks = word(entry, &self.name)?.to_string();
            }
            "MKS_conversion" => {
                let factor = float_at(entry, &self.name, 0)?;
                let offset = if entry.values.len() > 1 {
                    float_at(entry, &self.name, 1)?
                } else {
                    0.0
                };
                let conversion = Conversion::new(factor, offset);
                if !conversion.is_usable() {
                    return Err(ConfigError::bad_value(entry, &self.name, "conversion factor must be non-zero"));
                }
                self.conversion = conversion;
            }
            _ => return Err(ConfigError::unknown_keyword(entry, Section::Unit, &self.name)),
        }
        Ok(())
    }
}

/// A number with its units, as in `precision = 0.1 degreesC`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub units: UnitId,
}

impl ConfigStore {
    /// Parse a `value units` setting, resolving the units.
    pub(crate) fn quantity(&mut self, entry: &Entry, record: &str) -> ConfigResult<Quantity> {
        require_equals(entry, record)?;
        let value = float_at(entry, record, 0)?;
        let name = entry
            .values
            .get(1)
            .ok_or_else(|| ConfigError::bad_value(entry, record, "missing units"))?;
        let units = self
            .identify_unit(name)
            .ok_or_else(|| ConfigError::bad_value(entry, record, format!("unknown units '{name}'")))?;
        Ok(Quantity { value, units })
    }

    pub(crate) fn load_units(&mut self, blocks: &[Block]) {
        for block in blocks {
            for entry in &block.entries {
                let Some(body) = self.record_body(entry) else {
                    continue;
                };
                let existing = self.units.find(Main, &entry.key);
                let mut unit = existing
                    .and_then(|id| self.units.get(id).cloned())
                    .unwrap_or_else(|| Unit::new(&entry.key));
                for kw in body {
                    if let Err(err) = unit.apply(kw) {
                        unit.valid.invalidate();
                        self.report(err);
                    }
                }
                unit.blocks.push(entry.pos.clone());
                match existing.and_then(|id| self.units.get_mut(id)) {
                    Some(slot) => *slot = unit,
                    None => {
                        let id = self.units.add(unit);
                        // First claim on a fresh name cannot collide.
                        let _ = self.units.name(Main, &entry.key, id);
                    }
                }
            }
        }

        // Every unit must reach a base unit that names itself.
        let mut broken = Vec::new();
        for (id, unit) in self.units.iter() {
            let base = self.units.find(Main, &unit.mks).and_then(|b| self.units.get(b));
            let reason = match base {
                _ if unit.mks.is_empty() => Some("no MKS_equivalent given".to_string()),
                None => Some(format!("MKS equivalent '{}' is not a known unit", unit.mks)),
                Some(base) if !base.is_mks() => {
                    Some(format!("MKS equivalent '{}' is not a base unit", unit.mks))
                }
                Some(base) if !base.valid.is_valid() => {
                    Some(format!("MKS equivalent '{}' is invalid", unit.mks))
                }
                Some(_) => None,
            };
            if let Some(reason) = reason {
                broken.push((id, ConfigError::inconsistent(&unit.name, reason)));
            }
        }
        for (id, err) in broken {
            if let Some(unit) = self.units.get_mut(id) {
                unit.valid.invalidate();
            }
            self.report(err);
        }
    }

    // ==================== Unit Lookups ====================

    /// Find a valid unit by name.
    pub fn identify_unit(&mut self, name: &str) -> Option<UnitId> {
        self.ensure_loaded(RegistryKind::Units);
        self.units
            .find(Main, name)
            .filter(|id| self.units.get(*id).is_some_and(|u| u.valid.is_valid()))
    }

    /// Get a unit by handle.
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    /// All valid base units.
    pub fn identify_mks_units(&mut self) -> Vec<UnitId> {
        self.ensure_loaded(RegistryKind::Units);
        self.units
            .iter()
            .filter(|(_, u)| u.valid.is_valid() && u.is_mks())
            .map(|(id, _)| id)
            .collect()
    }

    /// All valid units converting to the base unit `mks`.
    pub fn identify_units_by_mks(&mut self, mks: &str) -> Vec<UnitId> {
        self.ensure_loaded(RegistryKind::Units);
        self.units
            .iter()
            .filter(|(_, u)| u.valid.is_valid() && u.mks == mks)
            .map(|(id, _)| id)
            .collect()
    }

    /// Returns true if values in `from` can be expressed in `to`.
    pub fn convertible_units(&self, from: UnitId, to: UnitId) -> bool {
        match (self.units.get(from), self.units.get(to)) {
            (Some(a), Some(b)) => a.valid.is_valid() && b.valid.is_valid() && a.mks == b.mks,
            _ => false,
        }
    }

    /// Convert `value` from one unit to another.
    ///
    /// A unit converted to itself is returned unchanged without looking
    /// anything up. Otherwise both units must be valid and share an MKS base.
    pub fn convert_value(&mut self, from: &str, value: f64, to: &str) -> Option<f64> {
        if from == to {
            return Some(value);
        }
        let from = self.identify_unit(from)?;
        let to = self.identify_unit(to)?;
        if !self.convertible_units(from, to) {
            return None;
        }
        let (a, b) = (self.units.get(from)?, self.units.get(to)?);
        a.conversion.convert(value, &b.conversion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LoaderOptions;
    use wxdict_core::Handle;
    use wxdict_parser::MemoryProvider;

    const UNITS: &str = r#"
Units
{
  mps     { label = "metres per second"; MKS_equivalent = mps; MKS_conversion = 1.0 0.0 }
  kmh     { MKS_equivalent = mps; MKS_conversion = 0.27778 }
  knots   { MKS_equivalent = mps; MKS_conversion = 0.514444 0.0 }
  degreesK { MKS_equivalent = degreesK }
  degreesC { MKS_equivalent = degreesK; MKS_conversion = 1.0 273.15 }
  mb      { MKS_equivalent = Pa; MKS_conversion = 100 }
  Pa      { MKS_equivalent = Pa }
  Mb      { MKS_equivalent = Pa; MKS_conversion = 1.0e8 }
  orphan  { MKS_equivalent = nothing }
  chained { MKS_equivalent = kmh }
  zero    { MKS_equivalent = mps; MKS_conversion = 0.0 }
  typo    { MKS_equivalant = mps }
}
"#;

    fn store() -> ConfigStore {
        ConfigStore::new(
            LoaderOptions::new("units.cfg").with_provider(MemoryProvider::new().with_file("units.cfg", UNITS)),
        )
    }

    #[test]
    fn test_identify_unit() {
        let mut store = store();
        let id = store.identify_unit("mps").unwrap();
        let unit = store.unit(id).unwrap();
        assert_eq!(unit.mks, "mps");
        assert_eq!(unit.labels.label.as_deref(), Some("metres per second"));
        assert!(unit.is_mks());
    }

    #[test]
    fn test_units_case_sensitive() {
        let mut store = store();
        let mb = store.identify_unit("mb").unwrap();
        let big = store.identify_unit("Mb").unwrap();
        assert_ne!(mb, big);
        assert_eq!(store.identify_unit("MB"), None);
    }

    #[test]
    fn test_identity_conversion() {
        let mut store = store();
        assert_eq!(store.convert_value("mps", 10.0, "mps"), Some(10.0));
        assert_eq!(store.convert_value("undeclared", 3.5, "undeclared"), Some(3.5));
    }

    #[test]
    fn test_scale_conversion() {
        let mut store = store();
        let v = store.convert_value("kmh", 36.0, "mps").unwrap();
        assert!((v - 10.0).abs() < 1e-3);
        let back = store.convert_value("mps", v, "kmh").unwrap();
        assert!((back - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_offset_conversion() {
        let mut store = store();
        let k = store.convert_value("degreesC", 20.0, "degreesK").unwrap();
        assert!((k - 293.15).abs() < 1e-9);
    }

    #[test]
    fn test_incompatible_bases() {
        let mut store = store();
        assert_eq!(store.convert_value("mps", 1.0, "degreesK"), None);
        assert_eq!(store.convert_value("mps", 1.0, "furlongs"), None);
    }

    #[test]
    fn test_invalid_units() {
        let mut store = store();
        assert_eq!(store.identify_unit("orphan"), None);
        assert_eq!(store.identify_unit("chained"), None);
        assert_eq!(store.identify_unit("zero"), None);
        assert_eq!(store.identify_unit("typo"), None);
        assert!(!store.diagnostics_for("typo").is_empty());
    }

    #[test]
    fn test_mks_listing() {
        let mut store = store();
        let bases: Vec<String> = store
            .identify_mks_units()
            .into_iter()
            .map(|id| store.unit(id).unwrap().name.clone())
            .collect();
        assert_eq!(bases, vec!["mps", "degreesK", "Pa"]);

        let speeds = store.identify_units_by_mks("mps");
        assert_eq!(speeds.len(), 3);
        assert_eq!(store.read_count(RegistryKind::Units), 1);
    }

    #[test]
    fn test_redeclaration_merges() {
        let text = "Units { m { MKS_equivalent = m } }\nUnits { m { label = metre } }\n";
        let mut store = ConfigStore::new(
            LoaderOptions::new("u.cfg").with_provider(MemoryProvider::new().with_file("u.cfg", text)),
        );
        let id = store.identify_unit("m").unwrap();
        let unit = store.unit(id).unwrap();
        assert_eq!(unit.mks, "m");
        assert_eq!(unit.labels.label.as_deref(), Some("metre"));
        assert_eq!(unit.blocks.len(), 2);
        assert_eq!(id.index(), 0);
    }
}
