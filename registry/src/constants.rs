//! Named constants.

use crate::section::Labels;
use crate::table::Main;
use crate::{ConfigError, ConfigResult, ConfigStore, RegistryKind, Section};
use wxdict_core::{ConstantId, UnitId, Validity};
use wxdict_parser::{Block, Entry, Position};

/// A named numeric constant with units.
#[derive(Debug, Clone)]
pub struct Constant {
    pub name: String,
    pub labels: Labels,
    pub value: Option<f64>,
    pub units: Option<UnitId>,
    pub valid: Validity,
    pub blocks: Vec<Position>,
}

impl Constant {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            labels: Labels::default(),
            value: None,
            units: None,
            valid: Validity::new(),
            blocks: Vec::new(),
        }
    }
}

impl ConfigStore {
    pub(crate) fn load_constants(&mut self, blocks: &[Block]) {
        for block in blocks {
            for entry in &block.entries {
                let Some(body) = self.record_body(entry) else {
                    continue;
                };
                let existing = self.constants.find(Main, &entry.key);
                let mut constant = existing
                    .and_then(|id| self.constants.get(id).cloned())
                    .unwrap_or_else(|| Constant::new(&entry.key));
                for kw in body {
                    if let Err(err) = self.constant_keyword(&mut constant, kw) {
                        constant.valid.invalidate();
                        self.report(err);
                    }
                }
                constant.blocks.push(entry.pos.clone());
                match existing.and_then(|id| self.constants.get_mut(id)) {
                    Some(slot) => *slot = constant,
                    None => {
                        let id = self.constants.add(constant);
                        let _ = self.constants.name(Main, &entry.key, id);
                    }
                }
            }
        }

        let missing: Vec<_> = self
            .constants
            .iter()
            .filter(|(_, c)| c.value.is_none())
            .map(|(id, c)| (id, c.name.clone()))
            .collect();
        for (id, name) in missing {
            if let Some(constant) = self.constants.get_mut(id) {
                constant.valid.invalidate();
            }
            self.report(ConfigError::inconsistent(&name, "no constant value given"));
        }
    }

    fn constant_keyword(&mut self, constant: &mut Constant, entry: &Entry) -> ConfigResult<()> {
        if let Some(result) = constant.labels.apply(entry, &constant.name) {
            return result;
        }
        match entry.key.as_str() {
            "constant" => {
                let quantity = self.quantity(entry, &constant.name)?;
                constant.value = Some(quantity.value);
                constant.units = Some(quantity.units);
                Ok(())
            }
            _ => Err(ConfigError::unknown_keyword(entry, Section::Constant, &constant.name)),
        }
    }

    // ==================== Constant Lookups ====================

    /// Find a valid constant by name.
    pub fn identify_constant(&mut self, name: &str) -> Option<ConstantId> {
        self.ensure_loaded(RegistryKind::Constants);
        self.constants
            .find(Main, name)
            .filter(|id| self.constants.get(*id).is_some_and(|c| c.valid.is_valid()))
    }

    /// Get a constant by handle.
    pub fn constant(&self, id: ConstantId) -> Option<&Constant> {
        self.constants.get(id)
    }

    /// All valid constants, in declaration order.
    pub fn identify_constants(&mut self) -> Vec<ConstantId> {
        self.ensure_loaded(RegistryKind::Constants);
        self.constants
            .iter()
            .filter(|(_, c)| c.valid.is_valid())
            .map(|(id, _)| id)
            .collect()
    }

    /// A constant's value expressed in `units`.
    pub fn constant_value(&mut self, name: &str, units: &str) -> Option<f64> {
        let id = self.identify_constant(name)?;
        let constant = self.constants.get(id)?;
        let (value, own) = (constant.value?, constant.units?);
        let own = self.units.get(own)?.name.clone();
        self.convert_value(&own, value, units)
    }
}
