//! Sample types: how values and winds are sampled from fields.

use crate::section::{keyword_value, optional_text, Labels};
use crate::{ConfigError, ConfigResult, ConfigStore, RegistryKind, Section};
use tracing::debug;
use wxdict_core::{SampleId, SampleKind, Validity, ValueSampleType};
use wxdict_parser::{Block, Entry, Position};

/// The wind sample used when a wind field names none.
pub const ADJUSTED_WIND_SAMPLE: &str = "FPA_Adjusted_Wind_Func";

/// Value samples every configuration has.
pub const DEFAULT_VALUE_SAMPLES: [(&str, ValueSampleType); 4] = [
    ("Value_Sample", ValueSampleType::Value),
    ("Magnitude_Sample", ValueSampleType::Magnitude),
    ("Direction_Sample", ValueSampleType::Direction),
    ("Label_Sample", ValueSampleType::Label),
];

/// A value or wind sample type.
#[derive(Debug, Clone)]
pub struct Sample {
    pub name: String,
    pub kind: SampleKind,
    pub labels: Labels,
    /// How a value sample evaluates the field (`Values` only).
    pub value_type: Option<ValueSampleType>,
    /// Wind function name (`Winds` only).
    pub wind_function: Option<String>,
    /// Added by the loader rather than declared.
    pub synthesized: bool,
    pub valid: Validity,
    pub blocks: Vec<Position>,
}

impl Sample {
    fn new(name: &str, kind: SampleKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            labels: Labels::default(),
            value_type: None,
            wind_function: None,
            synthesized: false,
            valid: Validity::new(),
            blocks: Vec::new(),
        }
    }

    fn apply(&mut self, entry: &Entry) -> ConfigResult<()> {
        if let Some(result) = self.labels.apply(entry, &self.name) {
            return result;
        }
        match (self.kind, entry.key.as_str()) {
            (SampleKind::Values, "value_samptype") => {
                self.value_type = Some(keyword_value(entry, &self.name, ValueSampleType::from_keyword)?);
            }
            (SampleKind::Winds, "wind_function") => {
                self.wind_function = optional_text(entry, &self.name)?;
            }
            _ => return Err(ConfigError::unknown_keyword(entry, Section::Sample, &self.name)),
        }
        Ok(())
    }

    fn missing(&self) -> Option<&'static str> {
        match self.kind {
            SampleKind::Values if self.value_type.is_none() => Some("no value_samptype given"),
            SampleKind::Winds if self.wind_function.is_none() => Some("no wind_function given"),
            _ => None,
        }
    }
}

impl ConfigStore {
    pub(crate) fn load_samples(&mut self, blocks: &[Block]) {
        for block in blocks {
            for namespace in &block.entries {
                let Some(kind) = SampleKind::from_keyword(&namespace.key) else {
                    self.report(ConfigError::unknown_keyword(namespace, Section::Samples, &block.name));
                    continue;
                };
                let Some(body) = self.record_body(namespace) else {
                    continue;
                };
                for entry in body {
                    let Some(keywords) = self.record_body(entry) else {
                        continue;
                    };
                    let existing = self.samples.find(kind, &entry.key);
                    let mut sample = existing
                        .and_then(|id| self.samples.get(id).cloned())
                        .unwrap_or_else(|| Sample::new(&entry.key, kind));
                    for kw in keywords {
                        if let Err(err) = sample.apply(kw) {
                            sample.valid.invalidate();
                            self.report(err);
                        }
                    }
                    sample.blocks.push(entry.pos.clone());
                    match existing.and_then(|id| self.samples.get_mut(id)) {
                        Some(slot) => *slot = sample,
                        None => {
                            let id = self.samples.add(sample);
                            let _ = self.samples.name(kind, &entry.key, id);
                        }
                    }
                }
            }
        }

        for (name, value_type) in DEFAULT_VALUE_SAMPLES {
            let mut sample = Sample::new(name, SampleKind::Values);
            sample.value_type = Some(value_type);
            self.add_default_sample(sample);
        }
        let mut wind = Sample::new(ADJUSTED_WIND_SAMPLE, SampleKind::Winds);
        wind.wind_function = Some(ADJUSTED_WIND_SAMPLE.to_string());
        self.add_default_sample(wind);

        let incomplete: Vec<_> = self
            .samples
            .iter()
            .filter_map(|(id, s)| s.missing().map(|reason| (id, s.name.clone(), reason)))
            .collect();
        for (id, name, reason) in incomplete {
            if let Some(sample) = self.samples.get_mut(id) {
                sample.valid.invalidate();
            }
            self.report(ConfigError::inconsistent(&name, reason));
        }
    }

    fn add_default_sample(&mut self, mut sample: Sample) {
        if self.samples.find(sample.kind, &sample.name).is_some() {
            return;
        }
        debug!(sample = %sample.name, namespace = %sample.kind, "adding default sample");
        sample.synthesized = true;
        let (kind, name) = (sample.kind, sample.name.clone());
        let id = self.samples.add(sample);
        let _ = self.samples.name(kind, &name, id);
    }

    // ==================== Sample Lookups ====================

    /// Find a valid sample type in one namespace.
    pub fn identify_sample(&mut self, kind: SampleKind, name: &str) -> Option<SampleId> {
        self.ensure_loaded(RegistryKind::Samples);
        self.samples
            .find(kind, name)
            .filter(|id| self.samples.get(*id).is_some_and(|s| s.valid.is_valid()))
    }

    pub fn sample(&self, id: SampleId) -> Option<&Sample> {
        self.samples.get(id)
    }

    fn samples_of(&mut self, kind: SampleKind) -> Vec<SampleId> {
        self.ensure_loaded(RegistryKind::Samples);
        self.samples
            .iter()
            .filter(|(_, s)| s.kind == kind && s.valid.is_valid())
            .map(|(id, _)| id)
            .collect()
    }

    /// All valid value sample types.
    pub fn identify_samples_for_values(&mut self) -> Vec<SampleId> {
        self.samples_of(SampleKind::Values)
    }

    /// All valid wind sample types.
    pub fn identify_samples_for_winds(&mut self) -> Vec<SampleId> {
        self.samples_of(SampleKind::Winds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LoaderOptions;
    use wxdict_parser::MemoryProvider;

    const TEXT: &str = r#"
Samples
{
  Values
  {
    Value_Sample { label = "Point value"; value_samptype = Value }
    Grad { value_samptype = Gradient }
    Nothing { label = "No type" }
    Odd { wind_function = Foo }
  }
  Winds
  {
    Model_Wind { wind_function = Model_Wind_Func }
  }
}
"#;

    fn store() -> ConfigStore {
        ConfigStore::new(LoaderOptions::new("s.cfg").with_provider(MemoryProvider::new().with_file("s.cfg", TEXT)))
    }

    #[test]
    fn test_declared_samples() {
        let mut store = store();
        let grad = store.identify_sample(SampleKind::Values, "grad").unwrap();
        assert_eq!(store.sample(grad).unwrap().value_type, Some(ValueSampleType::Gradient));
        assert_eq!(store.identify_sample(SampleKind::Winds, "Grad"), None);
        assert_eq!(store.identify_sample(SampleKind::Values, "Nothing"), None);
        assert_eq!(store.identify_sample(SampleKind::Values, "Odd"), None);
    }

    #[test]
    fn test_defaults_do_not_replace_declarations() {
        let mut store = store();
        let value = store.identify_sample(SampleKind::Values, "Value_Sample").unwrap();
        let sample = store.sample(value).unwrap();
        assert!(!sample.synthesized);
        assert_eq!(sample.labels.label.as_deref(), Some("Point value"));

        let magnitude = store.identify_sample(SampleKind::Values, "Magnitude_Sample").unwrap();
        assert!(store.sample(magnitude).unwrap().synthesized);
    }

    #[test]
    fn test_sample_listings() {
        let mut store = store();
        // Value_Sample, Grad and three defaults.
        assert_eq!(store.identify_samples_for_values().len(), 5);
        let winds = store.identify_samples_for_winds();
        assert_eq!(winds.len(), 2);
        assert!(store.identify_sample(SampleKind::Winds, ADJUSTED_WIND_SAMPLE).is_some());
    }
}
