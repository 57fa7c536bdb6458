//! Identifier tables: sorted name→owner indexes with aliases.
//!
//! Each registry keeps one table per namespace. Names and aliases share the
//! table; a name can belong to only one owner, and the first owner to claim
//! it keeps it.

use std::cmp::Ordering;
use thiserror::Error;

/// How names are compared in a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasePolicy {
    Sensitive,
    Insensitive,
}

impl CasePolicy {
    /// Compare two names under this policy.
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            CasePolicy::Sensitive => a.cmp(b),
            CasePolicy::Insensitive => a
                .chars()
                .flat_map(char::to_lowercase)
                .cmp(b.chars().flat_map(char::to_lowercase)),
        }
    }

    /// Returns true if two names are the same under this policy.
    pub fn same(self, a: &str, b: &str) -> bool {
        self.compare(a, b) == Ordering::Equal
    }
}

/// A name is already owned by a different record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("identifier '{name}' already belongs to another definition")]
pub struct AliasCollision {
    pub name: String,
}

/// Sorted name→owner mapping with binary-search lookup.
#[derive(Debug, Clone)]
pub struct IdentTable<T> {
    policy: CasePolicy,
    entries: Vec<(String, T)>,
}

impl<T: Copy + PartialEq> IdentTable<T> {
    pub fn new(policy: CasePolicy) -> Self {
        Self {
            policy,
            entries: Vec::new(),
        }
    }

    pub fn policy(&self) -> CasePolicy {
        self.policy
    }

    fn search(&self, name: &str) -> Result<usize, usize> {
        self.entries
            .binary_search_by(|(key, _)| self.policy.compare(key, name))
    }

    /// Register `name` for `owner`.
    ///
    /// Returns `Ok(true)` when the name was added and `Ok(false)` when the
    /// same owner already held it. A different owner is rejected and the
    /// existing entry is left in place.
    pub fn insert(&mut self, name: &str, owner: T) -> Result<bool, AliasCollision> {
        match self.search(name) {
            Ok(pos) if self.entries[pos].1 == owner => Ok(false),
            Ok(_) => Err(AliasCollision {
                name: name.to_string(),
            }),
            Err(pos) => {
                self.entries.insert(pos, (name.to_string(), owner));
                Ok(true)
            }
        }
    }

    /// Find the owner of a name or alias.
    pub fn find(&self, name: &str) -> Option<T> {
        self.search(name).ok().map(|pos| self.entries[pos].1)
    }

    /// All names registered for an owner, in table order.
    pub fn aliases_of(&self, owner: T) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, o)| *o == owner)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Iterate all (name, owner) pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, T)> + '_ {
        self.entries.iter().map(|(name, owner)| (name.as_str(), *owner))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
