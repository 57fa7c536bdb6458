//! The configuration store: registries, load order and diagnostics.

use crate::table::Registry;
use crate::{
    ConfigError, Constant, CrossRef, Element, Field, Group, Level, LoaderOptions, Sample, Source,
    Unit,
};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, error};
use wxdict_core::{
    CasePolicy, ConstantId, CrossRefId, ElementId, FieldId, GroupId, LevelId, SampleId, SourceId,
    UnitId,
};
use wxdict_parser::{Block, BlockReader, Entry, Position, SourceProvider, StreamOptions};

/// The nine definition registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegistryKind {
    Units,
    Constants,
    Sources,
    Groups,
    Levels,
    Elements,
    Fields,
    CrossRefs,
    Samples,
}

impl RegistryKind {
    pub const ALL: [RegistryKind; 9] = [
        RegistryKind::Units,
        RegistryKind::Constants,
        RegistryKind::Sources,
        RegistryKind::Groups,
        RegistryKind::Levels,
        RegistryKind::Elements,
        RegistryKind::Fields,
        RegistryKind::CrossRefs,
        RegistryKind::Samples,
    ];

    /// The top-level block name this registry reads.
    pub fn block_name(self) -> &'static str {
        match self {
            RegistryKind::Units => "Units",
            RegistryKind::Constants => "Constants",
            RegistryKind::Sources => "Sources",
            RegistryKind::Groups => "Groups",
            RegistryKind::Levels => "Levels",
            RegistryKind::Elements => "Elements",
            RegistryKind::Fields => "Fields",
            RegistryKind::CrossRefs => "CrossRefs",
            RegistryKind::Samples => "Samples",
        }
    }

    pub fn from_block_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.block_name().eq_ignore_ascii_case(name))
    }

    /// Registries that must be loaded first.
    pub fn dependencies(self) -> &'static [RegistryKind] {
        use RegistryKind::*;
        match self {
            Units | Sources | Groups | Samples => &[],
            Constants => &[Units],
            Levels => &[Groups],
            Elements => &[Units, Groups],
            Fields => &[Groups, Levels, Elements],
            CrossRefs => &[Units, Levels, Elements, Fields],
        }
    }
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.block_name())
    }
}

/// The metadata dictionary.
///
/// Built once and passed by reference to every lookup. Each registry is
/// read on first use and never again.
pub struct ConfigStore {
    root: String,
    stream_options: StreamOptions,
    provider: Box<dyn SourceProvider>,

    loaded: HashSet<RegistryKind>,
    reads: HashMap<RegistryKind, usize>,
    structure_reported: bool,
    diagnostics: Vec<ConfigError>,

    pub(crate) units: Registry<UnitId, Unit>,
    pub(crate) constants: Registry<ConstantId, Constant>,
    pub(crate) sources: Registry<SourceId, Source>,
    pub(crate) groups: Registry<GroupId, Group>,
    pub(crate) levels: Registry<LevelId, Level>,
    pub(crate) elements: Registry<ElementId, Element>,
    pub(crate) fields: Registry<FieldId, Field>,
    pub(crate) field_index: HashMap<(ElementId, LevelId), FieldId>,
    pub(crate) crossrefs: Registry<CrossRefId, CrossRef>,
    pub(crate) samples: Registry<SampleId, Sample>,
}

impl ConfigStore {
    pub fn new(options: LoaderOptions) -> Self {
        let (root, stream_options, provider) = options.into_provider();
        Self {
            root,
            stream_options,
            provider,
            loaded: HashSet::new(),
            reads: HashMap::new(),
            structure_reported: false,
            diagnostics: Vec::new(),
            units: Registry::new(CasePolicy::Sensitive, 1),
            constants: Registry::new(CasePolicy::Sensitive, 1),
            sources: Registry::new(CasePolicy::Insensitive, 1),
            groups: Registry::new(CasePolicy::Insensitive, 2),
            levels: Registry::new(CasePolicy::Insensitive, 1),
            elements: Registry::new(CasePolicy::Insensitive, 1),
            fields: Registry::new(CasePolicy::Insensitive, 0),
            field_index: HashMap::new(),
            crossrefs: Registry::new(CasePolicy::Insensitive, 2),
            samples: Registry::new(CasePolicy::Insensitive, 2),
        }
    }

    /// Name of the root configuration file.
    pub fn root(&self) -> &str {
        &self.root
    }

    // ==================== Diagnostics ====================

    /// Every problem reported so far, in order.
    pub fn diagnostics(&self) -> &[ConfigError] {
        &self.diagnostics
    }

    /// Problems reported against one record.
    pub fn diagnostics_for(&self, record: &str) -> Vec<&ConfigError> {
        self.diagnostics
            .iter()
            .filter(|err| err.record().is_some_and(|r| r.eq_ignore_ascii_case(record)))
            .collect()
    }

    pub(crate) fn report(&mut self, err: ConfigError) {
        error!(class = %err.class(), "{}", err);
        self.diagnostics.push(err);
    }

    // ==================== Loading ====================

    /// How many times a registry has scanned the configuration (0 or 1).
    pub fn read_count(&self, kind: RegistryKind) -> usize {
        self.reads.get(&kind).copied().unwrap_or(0)
    }

    pub fn is_loaded(&self, kind: RegistryKind) -> bool {
        self.loaded.contains(&kind)
    }

    /// Load every registry. Returns false if the configuration had
    /// structural errors.
    pub fn read_complete_config(&mut self) -> bool {
        for kind in RegistryKind::ALL {
            self.ensure_loaded(kind);
        }
        !self
            .diagnostics
            .iter()
            .any(|err| err.class() == crate::ErrorClass::Structural)
    }

    /// Load a registry and its dependencies, once.
    pub(crate) fn ensure_loaded(&mut self, kind: RegistryKind) {
        if !self.loaded.insert(kind) {
            return;
        }
        for &dep in kind.dependencies() {
            self.ensure_loaded(dep);
        }

        *self.reads.entry(kind).or_insert(0) += 1;
        debug!(registry = %kind, root = %self.root, "loading registry");
        let blocks = self.read_blocks(kind);
        match kind {
            RegistryKind::Units => self.load_units(&blocks),
            RegistryKind::Constants => self.load_constants(&blocks),
            RegistryKind::Sources => self.load_sources(&blocks),
            RegistryKind::Groups => self.load_groups(&blocks),
            RegistryKind::Levels => self.load_levels(&blocks),
            RegistryKind::Elements => self.load_elements(&blocks),
            RegistryKind::Fields => self.load_fields(&blocks),
            RegistryKind::CrossRefs => self.load_crossrefs(&blocks),
            RegistryKind::Samples => self.load_samples(&blocks),
        }
    }

    /// Scan the configuration for the top-level blocks of one registry.
    ///
    /// Structural problems are reported by the first scan only.
    fn read_blocks(&mut self, kind: RegistryKind) -> Vec<Block> {
        let report = !self.structure_reported;
        self.structure_reported = true;

        let mut wanted = Vec::new();
        let mut problems = Vec::new();
        match BlockReader::open(self.provider.as_ref(), &self.root, self.stream_options.clone()) {
            Ok(mut reader) => {
                while let Some(block) = reader.next_block() {
                    match RegistryKind::from_block_name(&block.name) {
                        Some(found) if found == kind => wanted.push(block),
                        Some(_) => {}
                        None => problems.push(ConfigError::UnknownBlock {
                            name: block.name,
                            pos: block.pos,
                        }),
                    }
                }
                problems.extend(reader.take_errors().into_iter().map(ConfigError::from));
            }
            Err(err) => problems.push(err.into()),
        }

        if report {
            for err in problems {
                self.report(err);
            }
        }
        wanted
    }

    /// Re-read the entries declared at `positions`.
    pub(crate) fn reread(&mut self, positions: &[Position]) -> Vec<Entry> {
        let mut entries = Vec::new();
        let mut problems = Vec::new();
        for pos in positions {
            debug!(file = %pos.file, line = pos.line, "re-reading block");
            match BlockReader::reopen_at(self.provider.as_ref(), pos, self.stream_options.clone()) {
                Ok(mut reader) => {
                    match reader.read_entry() {
                        Ok(Some(entry)) => entries.push(entry),
                        Ok(None) => {}
                        Err(err) => problems.push(err.into()),
                    }
                    problems.extend(reader.take_errors().into_iter().map(ConfigError::from));
                }
                Err(err) => problems.push(err.into()),
            }
        }
        for err in problems {
            self.report(err);
        }
        entries
    }

    /// The nested frame of a record entry, reporting when it has none.
    pub(crate) fn record_body<'e>(&mut self, entry: &'e Entry) -> Option<&'e [Entry]> {
        match &entry.body {
            Some(body) => Some(body),
            None => {
                self.report(ConfigError::expected_block(entry));
                None
            }
        }
    }
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("root", &self.root)
            .field("loaded", &self.loaded)
            .field("diagnostics", &self.diagnostics.len())
            .finish()
    }
}
