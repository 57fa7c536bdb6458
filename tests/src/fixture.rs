//! Configuration trees for tests.

use crate::{FixtureError, FixtureResult};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wxdict_parser::MemoryProvider;
use wxdict_registry::{ConfigStore, LoaderOptions};

/// Root of the fixture trees shipped with this crate.
pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// A configuration to load: a fixture tree on disk or texts in memory.
#[derive(Debug)]
pub struct Fixture {
    root: String,
    search_dirs: Vec<PathBuf>,
    memory: Option<MemoryProvider>,
}

impl Fixture {
    /// The fixture tree `fixtures/<name>/`, rooted at `<name>.cfg`.
    pub fn tree(name: &str) -> FixtureResult<Self> {
        let dir = fixtures_dir().join(name);
        if !dir.is_dir() {
            return Err(FixtureError::Missing(name.to_string()));
        }
        Ok(Self {
            root: format!("{name}.cfg"),
            search_dirs: vec![dir],
            memory: None,
        })
    }

    /// A single in-memory file holding `text`.
    pub fn text(text: &str) -> Self {
        Self {
            root: "main.cfg".to_string(),
            search_dirs: Vec::new(),
            memory: Some(MemoryProvider::new().with_file("main.cfg", text)),
        }
    }

    /// Add an in-memory file next to the root.
    pub fn with_file(mut self, name: &str, text: &str) -> Self {
        self.memory
            .get_or_insert_with(MemoryProvider::new)
            .insert(name, text);
        self
    }

    /// Also search another fixture tree for included files.
    pub fn search(mut self, name: &str) -> Self {
        self.search_dirs.push(fixtures_dir().join(name));
        self
    }

    pub fn options(self) -> LoaderOptions {
        let options = LoaderOptions::new(self.root);
        match self.memory {
            Some(memory) => options.with_provider(memory),
            None => self
                .search_dirs
                .into_iter()
                .fold(options, |options, dir| options.with_search_dir(dir)),
        }
    }

    pub fn store(self) -> ConfigStore {
        ConfigStore::new(self.options())
    }
}

/// Configuration files written to a temporary directory.
///
/// The directory lives as long as this value; keep it alive while the
/// store is in use, since detail lookups re-read the files.
#[derive(Debug)]
pub struct ScratchConfig {
    dir: TempDir,
}

impl ScratchConfig {
    pub fn new() -> FixtureResult<Self> {
        Ok(Self {
            dir: TempDir::new().map_err(FixtureError::Scratch)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `text` to `name`, creating parent directories.
    pub fn file(self, name: &str, text: &str) -> FixtureResult<Self> {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| FixtureError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, text).map_err(|source| FixtureError::Write { path, source })?;
        Ok(self)
    }

    /// A store rooted at `root`, searching the scratch directory and then
    /// each of `extra` (relative to the scratch directory).
    pub fn store(&self, root: &str, extra: &[&str]) -> ConfigStore {
        let options = extra.iter().fold(
            LoaderOptions::new(root).with_search_dir(self.path()),
            |options, dir| options.with_search_dir(self.path().join(dir)),
        );
        ConfigStore::new(options)
    }
}
