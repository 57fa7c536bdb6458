//! Sections and keyword value helpers.
//!
//! Every nesting level of a configuration block is one [`Section`]. The
//! helpers here turn an [`Entry`]'s value tokens into typed values and
//! report problems against the owning record.

use crate::{ConfigError, ConfigResult};
use std::fmt;
use wxdict_parser::{parse_bool, Entry, ValueArg};

/// The kind of frame a keyword appears in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Units,
    Unit,
    Constants,
    Constant,
    Sources,
    Source,
    Subsource,
    AlliedModel,
    AlliedResource,
    Groups,
    Group,
    Levels,
    Level,
    Elements,
    Element,
    TimeDependence,
    LineType,
    ScatteredType,
    Attribute,
    Editor,
    Labelling,
    LabellingType,
    Sampling,
    Linking,
    Equation,
    ValueCalculation,
    Components,
    Fields,
    Field,
    CrossRefs,
    CrossRef,
    Samples,
    Sample,
}

impl Section {
    pub fn name(self) -> &'static str {
        match self {
            Section::Units => "Units block",
            Section::Unit => "unit",
            Section::Constants => "Constants block",
            Section::Constant => "constant",
            Section::Sources => "Sources block",
            Section::Source => "source",
            Section::Subsource => "subsource",
            Section::AlliedModel => "allied model",
            Section::AlliedResource => "allied resource",
            Section::Groups => "Groups block",
            Section::Group => "group",
            Section::Levels => "Levels block",
            Section::Level => "level",
            Section::Elements => "Elements block",
            Section::Element => "element",
            Section::TimeDependence => "time dependence",
            Section::LineType => "line type",
            Section::ScatteredType => "scattered type",
            Section::Attribute => "attribute",
            Section::Editor => "editor",
            Section::Labelling => "labelling",
            Section::LabellingType => "labelling type",
            Section::Sampling => "sampling",
            Section::Linking => "linking",
            Section::Equation => "equation",
            Section::ValueCalculation => "value calculation",
            Section::Components => "components",
            Section::Fields => "Fields block",
            Section::Field => "field",
            Section::CrossRefs => "CrossRefs block",
            Section::CrossRef => "cross-reference",
            Section::Samples => "Samples block",
            Section::Sample => "sample type",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ==================== Labels ====================

/// Label, short label and description, shared by every record kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Labels {
    pub label: Option<String>,
    pub short_label: Option<String>,
    pub description: Option<String>,
}

impl Labels {
    /// Apply a `label` / `short_label` / `description` keyword.
    ///
    /// Returns None when the entry is not one of them. Labels tolerate an
    /// absent value.
    pub(crate) fn apply(&mut self, entry: &Entry, record: &str) -> Option<ConfigResult<()>> {
        let slot = match entry.key.as_str() {
            "label" => &mut self.label,
            "short_label" => &mut self.short_label,
            "description" => &mut self.description,
            _ => return None,
        };
        Some(optional_text(entry, record).map(|text| *slot = text))
    }

    /// The label, falling back to `name`.
    pub fn label_or<'a>(&'a self, name: &'a str) -> &'a str {
        self.label.as_deref().unwrap_or(name)
    }

    /// The short label, falling back to the label and then `name`.
    pub fn short_label_or<'a>(&'a self, name: &'a str) -> &'a str {
        self.short_label.as_deref().unwrap_or_else(|| self.label_or(name))
    }
}

// ==================== Value helpers ====================

pub(crate) fn require_equals(entry: &Entry, record: &str) -> ConfigResult<()> {
    if entry.assigned {
        Ok(())
    } else {
        Err(ConfigError::missing_equals(entry, record))
    }
}

/// Joined text, or None for an absent value.
pub(crate) fn optional_text(entry: &Entry, record: &str) -> ConfigResult<Option<String>> {
    require_equals(entry, record)?;
    Ok(entry.text())
}

/// A single word that must be present.
pub(crate) fn word<'a>(entry: &'a Entry, record: &str) -> ConfigResult<&'a str> {
    require_equals(entry, record)?;
    entry
        .first()
        .ok_or_else(|| ConfigError::bad_value(entry, record, "a value is required"))
}

pub(crate) fn bool_value(entry: &Entry, record: &str) -> ConfigResult<bool> {
    let text = word(entry, record)?;
    parse_bool(text)
        .ok_or_else(|| ConfigError::bad_value(entry, record, format!("'{text}' is not a logical value")))
}

/// A keyword-valued setting, parsed with `parse`.
pub(crate) fn keyword_value<T>(
    entry: &Entry,
    record: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> ConfigResult<T> {
    let text = word(entry, record)?;
    parse(text).ok_or_else(|| ConfigError::bad_value(entry, record, format!("unknown value '{text}'")))
}

pub(crate) fn float_at(entry: &Entry, record: &str, index: usize) -> ConfigResult<f64> {
    let text = entry
        .values
        .get(index)
        .ok_or_else(|| ConfigError::bad_value(entry, record, "missing number"))?;
    text.parse()
        .map_err(|_| ConfigError::bad_value(entry, record, format!("'{text}' is not a number")))
}

/// The value list of a collection keyword: None means `None` was given
/// (clear the collection), otherwise the words listed inline.
pub(crate) fn word_list(entry: &Entry, record: &str) -> ConfigResult<Option<Vec<String>>> {
    require_equals(entry, record)?;
    Ok(match entry.value_arg() {
        ValueArg::Empty => None,
        ValueArg::Values(values) => Some(values.to_vec()),
        ValueArg::Absent | ValueArg::Default => Some(Vec::new()),
    })
}

/// Name pairs (element/level, attribute/value), given inline (`a l1 b l2`)
/// and/or one pair per line in a nested frame. None means `None` was given.
pub(crate) fn name_pairs(entry: &Entry, record: &str) -> ConfigResult<Option<Vec<(String, String)>>> {
    if entry.value_arg() == ValueArg::Empty {
        return Ok(None);
    }
    let mut words: Vec<String> = match entry.value_arg() {
        ValueArg::Values(values) => values.to_vec(),
        _ => Vec::new(),
    };
    for child in entry.children() {
        words.push(child.key.clone());
        words.extend(child.args.iter().cloned());
    }
    if words.len() % 2 != 0 {
        return Err(ConfigError::bad_value(entry, record, "expected pairs of names"));
    }
    Ok(Some(
        words
            .chunks(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wxdict_parser::{BlockReader, MemoryProvider, StreamOptions};

    fn entries(text: &str) -> Vec<Entry> {
        let provider = MemoryProvider::new().with_file("t.cfg", text);
        let mut reader = BlockReader::open(&provider, "t.cfg", StreamOptions::default()).unwrap();
        reader.next_block().unwrap().entries
    }

    #[test]
    fn test_labels_apply() {
        let list = entries("B { label = \"Sea Level\"\n short_label = -\n other = 1 }");
        let mut labels = Labels::default();
        assert!(labels.apply(&list[0], "r").unwrap().is_ok());
        assert!(labels.apply(&list[1], "r").unwrap().is_ok());
        assert!(labels.apply(&list[2], "r").is_none());
        assert_eq!(labels.label.as_deref(), Some("Sea Level"));
        assert_eq!(labels.short_label, None);
        assert_eq!(labels.short_label_or("msl"), "Sea Level");
    }

    #[test]
    fn test_missing_equals() {
        let list = entries("B { label \"x\" }");
        let mut labels = Labels::default();
        let err = labels.apply(&list[0], "r").unwrap().unwrap_err();
        assert!(matches!(err, ConfigError::MissingEquals { .. }));
    }

    #[test]
    fn test_value_helpers() {
        let list = entries("B { a = yes\n b = 2.5 x\n c = None\n d = t1 l1 t2 l2\n e = t1\n }");
        assert!(bool_value(&list[0], "r").unwrap());
        assert_eq!(float_at(&list[1], "r", 0).unwrap(), 2.5);
        assert!(float_at(&list[1], "r", 1).is_err());
        assert_eq!(word_list(&list[2], "r").unwrap(), None);
        assert_eq!(
            name_pairs(&list[3], "r").unwrap().unwrap(),
            vec![("t1".to_string(), "l1".to_string()), ("t2".to_string(), "l2".to_string())]
        );
        assert!(name_pairs(&list[4], "r").is_err());
    }

    #[test]
    fn test_name_pairs_nested() {
        let list = entries("B { merge_fields = { temp sfc\n pres msl } }");
        let pairs = name_pairs(&list[0], "r").unwrap().unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1], ("pres".to_string(), "msl".to_string()));
    }
}
