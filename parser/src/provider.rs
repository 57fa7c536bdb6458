//! Source providers: where configuration text comes from.

use crate::{ParseError, ParseResult};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// The text of one configuration file.
#[derive(Debug, Clone)]
pub struct SourceText {
    /// Canonical name. Two loads of the same file yield the same name.
    pub name: String,
    pub text: String,
}

/// Resolves configuration file names to their text.
pub trait SourceProvider: fmt::Debug {
    /// Load `name`. `relative_to` is the canonical name of the including
    /// file, when there is one.
    fn load(&self, name: &str, relative_to: Option<&str>) -> ParseResult<SourceText>;
}

// ==================== Filesystem ====================

/// Loads files from disk, trying a list of search directories in order.
#[derive(Debug, Clone, Default)]
pub struct FsProvider {
    search_dirs: Vec<PathBuf>,
}

impl FsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory to search after the ones already registered.
    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Find the file for `name`: as given, next to the including file, then
    /// in each search directory.
    pub fn locate(&self, name: &str, relative_to: Option<&str>) -> Option<PathBuf> {
        let path = Path::new(name);
        if path.is_absolute() {
            return path.is_file().then(|| path.to_path_buf());
        }
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        let sibling = relative_to
            .and_then(|from| Path::new(from).parent())
            .map(|dir| dir.join(path));
        sibling
            .into_iter()
            .chain(self.search_dirs.iter().map(|dir| dir.join(path)))
            .find(|candidate| candidate.is_file())
    }
}

impl SourceProvider for FsProvider {
    fn load(&self, name: &str, relative_to: Option<&str>) -> ParseResult<SourceText> {
        let path = self
            .locate(name, relative_to)
            .ok_or_else(|| ParseError::open(name, "not found"))?;
        let text = std::fs::read_to_string(&path).map_err(|e| ParseError::open(name, e))?;
        let canonical = path.canonicalize().unwrap_or(path);
        Ok(SourceText {
            name: canonical.display().to_string(),
            text,
        })
    }
}

// ==================== Memory ====================

/// Serves named texts held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    files: HashMap<String, String>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.files.insert(name.into(), text.into());
    }
}

impl SourceProvider for MemoryProvider {
    fn load(&self, name: &str, _relative_to: Option<&str>) -> ParseResult<SourceText> {
        self.files
            .get(name)
            .map(|text| SourceText {
                name: name.to_string(),
                text: text.clone(),
            })
            .ok_or_else(|| ParseError::open(name, "not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_provider() {
        let provider = MemoryProvider::new().with_file("a.cfg", "Units {}");
        let source = provider.load("a.cfg", None).unwrap();
        assert_eq!(source.name, "a.cfg");
        assert_eq!(source.text, "Units {}");

        match provider.load("b.cfg", None) {
            Err(ParseError::Open { name, .. }) => assert_eq!(name, "b.cfg"),
            other => panic!("Expected Open error, got {:?}", other),
        }
    }

    #[test]
    fn test_fs_provider_search_dirs() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(second.path().join("units.cfg"), "Units {}").unwrap();

        let provider = FsProvider::new()
            .with_search_dir(first.path())
            .with_search_dir(second.path());
        let source = provider.load("units.cfg", None).unwrap();
        assert_eq!(source.text, "Units {}");
        assert!(source.name.ends_with("units.cfg"));
    }

    #[test]
    fn test_fs_provider_relative_to_including_file() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("main.cfg");
        std::fs::write(&main, "include levels.cfg").unwrap();
        std::fs::write(dir.path().join("levels.cfg"), "Levels {}").unwrap();

        let provider = FsProvider::new();
        let from = main.display().to_string();
        let source = provider.load("levels.cfg", Some(&from)).unwrap();
        assert_eq!(source.text, "Levels {}");
    }

    #[test]
    fn test_fs_provider_missing_file() {
        let provider = FsProvider::new();
        assert!(provider.load("definitely/not/here.cfg", None).is_err());
    }
}
