//! Append-only record storage with per-namespace identifier tables.

use wxdict_core::{AliasCollision, CasePolicy, CrossRefKind, GroupKind, Handle, IdentTable, SampleKind};

/// Selects one identifier table of a registry.
pub(crate) trait Namespace: Copy {
    fn slot(self) -> usize;
}

/// Registries with a single namespace.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Main;

impl Namespace for Main {
    fn slot(self) -> usize {
        0
    }
}

impl Namespace for GroupKind {
    fn slot(self) -> usize {
        match self {
            GroupKind::Fields => 0,
            GroupKind::Elements => 1,
        }
    }
}

impl Namespace for CrossRefKind {
    fn slot(self) -> usize {
        match self {
            CrossRefKind::Winds => 0,
            CrossRefKind::Values => 1,
        }
    }
}

impl Namespace for SampleKind {
    fn slot(self) -> usize {
        match self {
            SampleKind::Values => 0,
            SampleKind::Winds => 1,
        }
    }
}

/// Records of one kind plus the tables naming them.
#[derive(Debug)]
pub(crate) struct Registry<H, R> {
    records: Vec<R>,
    tables: Vec<IdentTable<H>>,
}

impl<H: Handle, R> Registry<H, R> {
    pub fn new(policy: CasePolicy, namespaces: usize) -> Self {
        Self {
            records: Vec::new(),
            tables: (0..namespaces).map(|_| IdentTable::new(policy)).collect(),
        }
    }

    /// Store a record and return its handle. The record is not yet named.
    pub fn add(&mut self, record: R) -> H {
        self.records.push(record);
        H::from_index(self.records.len() - 1)
    }

    /// Register a name or alias for `owner` in a namespace.
    pub fn name(&mut self, ns: impl Namespace, name: &str, owner: H) -> Result<bool, AliasCollision> {
        self.tables[ns.slot()].insert(name, owner)
    }

    pub fn find(&self, ns: impl Namespace, name: &str) -> Option<H> {
        self.tables[ns.slot()].find(name)
    }

    pub fn aliases_of(&self, ns: impl Namespace, owner: H) -> Vec<String> {
        self.tables[ns.slot()]
            .aliases_of(owner)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn get(&self, id: H) -> Option<&R> {
        self.records.get(id.index())
    }

    pub fn get_mut(&mut self, id: H) -> Option<&mut R> {
        self.records.get_mut(id.index())
    }

    /// All records with their handles, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (H, &R)> + '_ {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| (H::from_index(i), r))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wxdict_core::GroupId;

    #[test]
    fn test_namespaces_are_separate() {
        let mut reg: Registry<GroupId, &str> = Registry::new(CasePolicy::Insensitive, 2);
        let a = reg.add("field group");
        let b = reg.add("element group");
        reg.name(GroupKind::Fields, "Temps", a).unwrap();
        reg.name(GroupKind::Elements, "Temps", b).unwrap();

        assert_eq!(reg.find(GroupKind::Fields, "temps"), Some(a));
        assert_eq!(reg.find(GroupKind::Elements, "TEMPS"), Some(b));
        assert_eq!(reg.get(b), Some(&"element group"));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_aliases_of() {
        let mut reg: Registry<GroupId, ()> = Registry::new(CasePolicy::Insensitive, 1);
        let id = reg.add(());
        reg.name(Main, "x", id).unwrap();
        reg.name(Main, "y", id).unwrap();
        assert_eq!(reg.aliases_of(Main, id), vec!["x", "y"]);
    }
}
