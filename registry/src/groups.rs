//! Field and element groups.

use crate::{ConfigError, ConfigStore, RegistryKind, Section};
use tracing::debug;
use wxdict_core::{GroupId, GroupKind, Validity};
use wxdict_parser::{Block, Position};

use crate::section::Labels;

/// The fallback group, present in both namespaces.
pub const MISCELLANEOUS_GROUP: &str = "Miscellaneous";

/// A named grouping of fields or elements.
#[derive(Debug, Clone)]
pub struct Group {
    pub name: String,
    pub kind: GroupKind,
    pub labels: Labels,
    pub valid: Validity,
    pub blocks: Vec<Position>,
}

impl Group {
    fn new(name: &str, kind: GroupKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            labels: Labels::default(),
            valid: Validity::new(),
            blocks: Vec::new(),
        }
    }
}

impl ConfigStore {
    pub(crate) fn load_groups(&mut self, blocks: &[Block]) {
        for block in blocks {
            for namespace in &block.entries {
                let Some(kind) = GroupKind::from_keyword(&namespace.key) else {
                    self.report(ConfigError::unknown_keyword(namespace, Section::Groups, &block.name));
                    continue;
                };
                let Some(body) = self.record_body(namespace) else {
                    continue;
                };
                for entry in body {
                    let Some(fields) = self.record_body(entry) else {
                        continue;
                    };
                    let existing = self.groups.find(kind, &entry.key);
                    let mut group = existing
                        .and_then(|id| self.groups.get(id).cloned())
                        .unwrap_or_else(|| Group::new(&entry.key, kind));
                    for kw in fields {
                        let result = group.labels.apply(kw, &group.name).unwrap_or_else(|| {
                            Err(ConfigError::unknown_keyword(kw, Section::Group, &group.name))
                        });
                        if let Err(err) = result {
                            group.valid.invalidate();
                            self.report(err);
                        }
                    }
                    group.blocks.push(entry.pos.clone());
                    match existing.and_then(|id| self.groups.get_mut(id)) {
                        Some(slot) => *slot = group,
                        None => {
                            let id = self.groups.add(group);
                            let _ = self.groups.name(kind, &entry.key, id);
                        }
                    }
                }
            }
        }

        for kind in GroupKind::ALL {
            if self.groups.find(*kind, MISCELLANEOUS_GROUP).is_none() {
                debug!(namespace = %kind, "adding default group");
                let mut group = Group::new(MISCELLANEOUS_GROUP, *kind);
                group.labels.label = Some(MISCELLANEOUS_GROUP.to_string());
                let id = self.groups.add(group);
                let _ = self.groups.name(*kind, MISCELLANEOUS_GROUP, id);
            }
        }
    }

    // ==================== Group Lookups ====================

    /// Find a valid group in one namespace.
    pub fn identify_group(&mut self, kind: GroupKind, name: &str) -> Option<GroupId> {
        self.ensure_loaded(RegistryKind::Groups);
        self.groups
            .find(kind, name)
            .filter(|id| self.groups.get(*id).is_some_and(|g| g.valid.is_valid()))
    }

    /// Get a group by handle.
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id)
    }

    /// The fallback group of a namespace.
    pub(crate) fn default_group(&mut self, kind: GroupKind) -> Option<GroupId> {
        self.identify_group(kind, MISCELLANEOUS_GROUP)
    }

    fn groups_of(&mut self, kind: GroupKind) -> Vec<GroupId> {
        self.ensure_loaded(RegistryKind::Groups);
        self.groups
            .iter()
            .filter(|(_, g)| g.kind == kind && g.valid.is_valid())
            .map(|(id, _)| id)
            .collect()
    }

    /// All valid field groups.
    pub fn identify_groups_for_fields(&mut self) -> Vec<GroupId> {
        self.groups_of(GroupKind::Fields)
    }

    /// All valid element groups.
    pub fn identify_groups_for_elements(&mut self) -> Vec<GroupId> {
        self.groups_of(GroupKind::Elements)
    }
}
