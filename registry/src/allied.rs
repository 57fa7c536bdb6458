//! Allied model descriptors.
//!
//! An allied model is an external program run against the analysis. Its
//! descriptor lists the programs and files it uses and the fields and
//! cross-references it needs, each under a local alias.

use crate::section::{bool_value, optional_text, require_equals};
use crate::{ConfigError, ConfigResult, ConfigStore, Section};
use wxdict_core::{AlliedKind, CrossRefId, CrossRefKind, FieldId, SourceRef, UnitId};
use wxdict_parser::{Entry, ValueArg};

/// A program or file location: a directory tag and a path below it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlliedPath {
    pub alias: String,
    pub tag: Option<String>,
    pub path: Option<String>,
}

/// An attribute passed to or from the allied model.
#[derive(Debug, Clone, PartialEq)]
pub struct AlliedAttribute {
    pub tag: String,
    pub name: String,
    pub units: Option<UnitId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlliedField {
    pub alias: String,
    pub field: Option<FieldId>,
    pub attributes: Vec<AlliedAttribute>,
    pub node_attributes: Vec<AlliedAttribute>,
    /// Source to read the field from, overriding the model default.
    pub source: Option<SourceRef>,
    /// Sub-field read from a plot field.
    pub sub_field: Option<String>,
    pub sub_units: Option<UnitId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlliedCrossRef {
    pub alias: String,
    pub crossref: Option<CrossRefId>,
    pub source: Option<SourceRef>,
}

/// A metafile produced by the allied model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlliedMetafile {
    pub alias: String,
    /// Alias of the declared file the metafile is built from.
    pub file_alias: Option<String>,
    pub field: Option<FieldId>,
    pub attributes: Vec<AlliedAttribute>,
    pub default_attributes: Vec<(String, String)>,
}

/// The allied model descriptor of an `Allied` source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlliedModel {
    pub time_matching: bool,
    /// Default source for input fields.
    pub source: Option<SourceRef>,
    pub pre_process: Option<String>,
    pub process: Option<String>,
    pub post_process: Option<String>,
    pub programs: Vec<AlliedPath>,
    pub files: Vec<AlliedPath>,
    pub fields: Vec<AlliedField>,
    pub wind_crossrefs: Vec<AlliedCrossRef>,
    pub value_crossrefs: Vec<AlliedCrossRef>,
    pub metafiles: Vec<AlliedMetafile>,
}

trait Aliased: Default {
    fn alias(&self) -> &str;
    fn set_alias(&mut self, alias: &str);
}

macro_rules! aliased {
    ($($ty:ty),+) => {
        $(impl Aliased for $ty {
            fn alias(&self) -> &str {
                &self.alias
            }
            fn set_alias(&mut self, alias: &str) {
                self.alias = alias.to_string();
            }
        })+
    };
}

aliased!(AlliedPath, AlliedField, AlliedCrossRef, AlliedMetafile);

/// Index of the item with this alias, added if it is not there yet.
fn index_for<T: Aliased>(list: &mut Vec<T>, alias: &str) -> usize {
    match position_of(list, alias) {
        Some(index) => index,
        None => {
            let mut item = T::default();
            item.set_alias(alias);
            list.push(item);
            list.len() - 1
        }
    }
}

fn item_for<'a, T: Aliased>(list: &'a mut Vec<T>, alias: &str) -> &'a mut T {
    let index = index_for(list, alias);
    &mut list[index]
}

fn position_of<T: Aliased>(list: &[T], alias: &str) -> Option<usize> {
    list.iter().position(|item| item.alias().eq_ignore_ascii_case(alias))
}

impl AlliedModel {
    /// Index of an aliased resource in one of the lists.
    pub fn position(&self, kind: AlliedKind, alias: &str) -> Option<usize> {
        match kind {
            AlliedKind::Programs => position_of(&self.programs, alias),
            AlliedKind::Files => position_of(&self.files, alias),
            AlliedKind::Fields => position_of(&self.fields, alias),
            AlliedKind::WindCrossRefs => position_of(&self.wind_crossrefs, alias),
            AlliedKind::ValueCrossRefs => position_of(&self.value_crossrefs, alias),
            AlliedKind::Metafiles => position_of(&self.metafiles, alias),
        }
    }

    /// Aliases of one resource list, in declaration order.
    pub fn aliases(&self, kind: AlliedKind) -> Vec<&str> {
        fn names<T: Aliased>(list: &[T]) -> Vec<&str> {
            list.iter().map(Aliased::alias).collect()
        }
        match kind {
            AlliedKind::Programs => names(&self.programs),
            AlliedKind::Files => names(&self.files),
            AlliedKind::Fields => names(&self.fields),
            AlliedKind::WindCrossRefs => names(&self.wind_crossrefs),
            AlliedKind::ValueCrossRefs => names(&self.value_crossrefs),
            AlliedKind::Metafiles => names(&self.metafiles),
        }
    }
}

/// The items of a resource list keyword, or None for `= None`.
fn list_items<'e>(entry: &'e Entry, record: &str) -> ConfigResult<Option<&'e [Entry]>> {
    match &entry.body {
        Some(body) => Ok(Some(body)),
        None => {
            require_equals(entry, record)?;
            match entry.value_arg() {
                ValueArg::Empty => Ok(None),
                _ => Err(ConfigError::bad_value(entry, record, "expected None or a block")),
            }
        }
    }
}

fn path_value(entry: &Entry, record: &str, item: &mut AlliedPath) -> ConfigResult<()> {
    require_equals(entry, record)?;
    match entry.values.as_slice() {
        [tag, path] => {
            item.tag = Some(tag.clone());
            item.path = Some(path.clone());
            Ok(())
        }
        _ => Err(ConfigError::bad_value(entry, record, "expected a directory tag and a path")),
    }
}

fn allied_paths(list: &mut Vec<AlliedPath>, path_key: &str, record: &str, entry: &Entry) -> ConfigResult<()> {
    let Some(items) = list_items(entry, record)? else {
        list.clear();
        return Ok(());
    };
    for item in items {
        let slot = item_for(list, &item.key);
        for kw in item.children() {
            if kw.key == path_key {
                path_value(kw, record, slot)?;
            } else {
                return Err(ConfigError::unknown_keyword(kw, Section::AlliedResource, record));
            }
        }
    }
    Ok(())
}

impl ConfigStore {
    /// Read one `allied_model` frame into `model`.
    pub(crate) fn apply_allied_model(&mut self, model: &mut AlliedModel, record: &str, entry: &Entry) -> ConfigResult<()> {
        let Some(body) = entry.body.as_deref() else {
            return Err(ConfigError::expected_block(entry));
        };
        for kw in body {
            match kw.key.as_str() {
                "time_matching" => model.time_matching = bool_value(kw, record)?,
                "source_info" => model.source = Some(self.allied_source(kw, record)?),
                "pre_process" => model.pre_process = optional_text(kw, record)?,
                "process" => model.process = optional_text(kw, record)?,
                "post_process" => model.post_process = optional_text(kw, record)?,
                "programs" => allied_paths(&mut model.programs, "program_path", record, kw)?,
                "files" => allied_paths(&mut model.files, "file_path", record, kw)?,
                "required_fields" => self.allied_fields(&mut model.fields, record, kw)?,
                "required_wind_crossrefs" => {
                    self.allied_crossrefs(&mut model.wind_crossrefs, CrossRefKind::Winds, record, kw)?
                }
                "required_value_crossrefs" => {
                    self.allied_crossrefs(&mut model.value_crossrefs, CrossRefKind::Values, record, kw)?
                }
                "metafiles" => self.allied_metafiles(&mut model.metafiles, record, kw)?,
                _ => return Err(ConfigError::unknown_keyword(kw, Section::AlliedModel, record)),
            }
        }
        Ok(())
    }

    fn allied_source(&mut self, entry: &Entry, record: &str) -> ConfigResult<SourceRef> {
        require_equals(entry, record)?;
        let name = entry
            .text()
            .ok_or_else(|| ConfigError::bad_value(entry, record, "a source name is required"))?;
        self.identify_source(&name, None)
            .ok_or_else(|| ConfigError::bad_value(entry, record, format!("unknown source '{name}'")))
    }

    fn allied_field(&mut self, entry: &Entry, record: &str) -> ConfigResult<FieldId> {
        require_equals(entry, record)?;
        match entry.values.as_slice() {
            [element, level] => self.identify_field(element, level).ok_or_else(|| {
                ConfigError::bad_value(entry, record, format!("unknown field '{element} {level}'"))
            }),
            _ => Err(ConfigError::bad_value(entry, record, "expected an element and a level")),
        }
    }

    fn allied_attribute(&mut self, entry: &Entry, record: &str) -> ConfigResult<AlliedAttribute> {
        require_equals(entry, record)?;
        let (tag, name, units) = match entry.values.as_slice() {
            [tag, name] => (tag, name, None),
            [tag, name, units] => (tag, name, Some(units)),
            _ => return Err(ConfigError::bad_value(entry, record, "expected a tag, a name and units")),
        };
        let units = match units {
            Some(units) => Some(self.identify_unit(units).ok_or_else(|| {
                ConfigError::bad_value(entry, record, format!("unknown units '{units}'"))
            })?),
            None => None,
        };
        Ok(AlliedAttribute {
            tag: tag.clone(),
            name: name.clone(),
            units,
        })
    }

    /// A plot sub-field name with optional units.
    fn allied_sub_field(&mut self, entry: &Entry, record: &str) -> ConfigResult<(String, Option<UnitId>)> {
        require_equals(entry, record)?;
        let (name, units) = match entry.values.as_slice() {
            [name] => (name, None),
            [name, units] => (name, Some(units)),
            _ => return Err(ConfigError::bad_value(entry, record, "expected a sub-field name and units")),
        };
        let units = match units {
            Some(units) => Some(self.identify_unit(units).ok_or_else(|| {
                ConfigError::bad_value(entry, record, format!("unknown units '{units}'"))
            })?),
            None => None,
        };
        Ok((name.clone(), units))
    }

    fn allied_fields(&mut self, list: &mut Vec<AlliedField>, record: &str, entry: &Entry) -> ConfigResult<()> {
        let Some(items) = list_items(entry, record)? else {
            list.clear();
            return Ok(());
        };
        for item in items {
            let index = index_for(list, &item.key);
            let mut field = std::mem::take(&mut list[index]);
            let result = self.allied_field_keywords(&mut field, record, item);
            list[index] = field;
            result?;
        }
        Ok(())
    }

    fn allied_field_keywords(&mut self, field: &mut AlliedField, record: &str, item: &Entry) -> ConfigResult<()> {
        for kw in item.children() {
            match kw.key.as_str() {
                "field_info" => field.field = Some(self.allied_field(kw, record)?),
                "attribute_info" => {
                    let attribute = self.allied_attribute(kw, record)?;
                    field.attributes.push(attribute);
                }
                "attribute_info_reset" => field.attributes.clear(),
                "node_attribute_info" => {
                    let attribute = self.allied_attribute(kw, record)?;
                    field.node_attributes.push(attribute);
                }
                "node_attribute_info_reset" => field.node_attributes.clear(),
                "source_info" => field.source = Some(self.allied_source(kw, record)?),
                "sub_field_info" => {
                    let (name, units) = self.allied_sub_field(kw, record)?;
                    field.sub_field = Some(name);
                    field.sub_units = units;
                }
                _ => return Err(ConfigError::unknown_keyword(kw, Section::AlliedResource, record)),
            }
        }
        Ok(())
    }

    fn allied_crossrefs(
        &mut self,
        list: &mut Vec<AlliedCrossRef>,
        kind: CrossRefKind,
        record: &str,
        entry: &Entry,
    ) -> ConfigResult<()> {
        let Some(items) = list_items(entry, record)? else {
            list.clear();
            return Ok(());
        };
        for item in items {
            let index = index_for(list, &item.key);
            let mut crossref = std::mem::take(&mut list[index]);
            let mut result = Ok(());
            for kw in item.children() {
                result = match kw.key.as_str() {
                    "crossref_info" => self.allied_crossref_name(kw, kind, record).map(|id| {
                        crossref.crossref = Some(id);
                    }),
                    "source_info" => self.allied_source(kw, record).map(|src| {
                        crossref.source = Some(src);
                    }),
                    _ => Err(ConfigError::unknown_keyword(kw, Section::AlliedResource, record)),
                };
                if result.is_err() {
                    break;
                }
            }
            list[index] = crossref;
            result?;
        }
        Ok(())
    }

    fn allied_crossref_name(&mut self, entry: &Entry, kind: CrossRefKind, record: &str) -> ConfigResult<CrossRefId> {
        require_equals(entry, record)?;
        let name = entry
            .first()
            .ok_or_else(|| ConfigError::bad_value(entry, record, "a cross-reference name is required"))?
            .to_string();
        self.identify_crossref(kind, &name).ok_or_else(|| {
            ConfigError::bad_value(entry, record, format!("unknown {kind} cross-reference '{name}'"))
        })
    }

    fn allied_metafiles(&mut self, list: &mut Vec<AlliedMetafile>, record: &str, entry: &Entry) -> ConfigResult<()> {
        let Some(items) = list_items(entry, record)? else {
            list.clear();
            return Ok(());
        };
        for item in items {
            let index = index_for(list, &item.key);
            let mut metafile = std::mem::take(&mut list[index]);
            let result = self.allied_metafile_keywords(&mut metafile, record, item);
            list[index] = metafile;
            result?;
        }
        Ok(())
    }

    fn allied_metafile_keywords(&mut self, metafile: &mut AlliedMetafile, record: &str, item: &Entry) -> ConfigResult<()> {
        for kw in item.children() {
            match kw.key.as_str() {
                "file_alias" => metafile.file_alias = optional_text(kw, record)?,
                "field_info" => metafile.field = Some(self.allied_field(kw, record)?),
                "attribute_info" => {
                    let attribute = self.allied_attribute(kw, record)?;
                    metafile.attributes.push(attribute);
                }
                "attribute_info_reset" => metafile.attributes.clear(),
                "default_attrib_info" => {
                    require_equals(kw, record)?;
                    match kw.values.as_slice() {
                        [name, value] => metafile.default_attributes.push((name.clone(), value.clone())),
                        _ => return Err(ConfigError::bad_value(kw, record, "expected a name and a value")),
                    }
                }
                "default_attrib_info_reset" => metafile.default_attributes.clear(),
                _ => return Err(ConfigError::unknown_keyword(kw, Section::AlliedResource, record)),
            }
        }
        Ok(())
    }

    /// Check that every resource the model names was given in full.
    pub(crate) fn check_allied_model(&self, model: &AlliedModel, record: &str) -> Vec<ConfigError> {
        let mut problems = Vec::new();
        for field in model.fields.iter().filter(|f| f.field.is_none()) {
            problems.push(ConfigError::inconsistent(
                record,
                format!("required field '{}' has no field_info", field.alias),
            ));
        }
        for (kind, list) in [
            (CrossRefKind::Winds, &model.wind_crossrefs),
            (CrossRefKind::Values, &model.value_crossrefs),
        ] {
            for crossref in list.iter().filter(|c| c.crossref.is_none()) {
                problems.push(ConfigError::inconsistent(
                    record,
                    format!("required {kind} cross-reference '{}' has no crossref_info", crossref.alias),
                ));
            }
        }
        for metafile in &model.metafiles {
            if let Some(file) = &metafile.file_alias {
                if model.position(AlliedKind::Files, file).is_none() {
                    problems.push(ConfigError::inconsistent(
                        record,
                        format!("metafile '{}' names undeclared file '{file}'", metafile.alias),
                    ));
                }
            }
            if metafile.field.is_none() {
                problems.push(ConfigError::inconsistent(
                    record,
                    format!("metafile '{}' has no field_info", metafile.alias),
                ));
            }
        }
        problems
    }

    /// Index of an aliased resource in a source's allied model.
    pub fn source_allied_data_location(&mut self, source: &str, kind: AlliedKind, alias: &str) -> Option<usize> {
        self.get_source_info(source, None)?
            .allied
            .as_ref()?
            .position(kind, alias)
    }
}
