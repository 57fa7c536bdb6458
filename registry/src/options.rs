//! Loader configuration.

use std::fmt;
use std::path::PathBuf;
use wxdict_parser::{FsProvider, SourceProvider, StreamOptions};

/// Where and how a [`ConfigStore`](crate::ConfigStore) reads its
/// configuration.
pub struct LoaderOptions {
    /// Name of the root configuration file.
    pub root: String,
    /// Directories searched for the root file and includes.
    pub search_dirs: Vec<PathBuf>,
    pub stream: StreamOptions,
    provider: Option<Box<dyn SourceProvider>>,
}

impl LoaderOptions {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            search_dirs: Vec::new(),
            stream: StreamOptions::default(),
            provider: None,
        }
    }

    /// Read from a custom provider instead of the filesystem.
    pub fn with_provider(mut self, provider: impl SourceProvider + 'static) -> Self {
        self.provider = Some(Box::new(provider));
        self
    }

    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    /// Refuse files declaring a revision newer than `revision`.
    pub fn with_revision(mut self, revision: f64) -> Self {
        self.stream.supported_revision = revision;
        self
    }

    /// Turn `$NAME` expansion in include names on or off.
    pub fn with_env_expansion(mut self, enabled: bool) -> Self {
        self.stream.expand_env = enabled;
        self
    }

    /// The provider to read with: the custom one, or the filesystem with
    /// the configured search directories.
    pub(crate) fn into_provider(self) -> (String, StreamOptions, Box<dyn SourceProvider>) {
        let provider: Box<dyn SourceProvider> = match self.provider {
            Some(provider) => provider,
            None => Box::new(
                self.search_dirs
                    .into_iter()
                    .fold(FsProvider::new(), |fs, dir| fs.with_search_dir(dir)),
            ),
        };
        (self.root, self.stream, provider)
    }
}

impl fmt::Debug for LoaderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderOptions")
            .field("root", &self.root)
            .field("search_dirs", &self.search_dirs)
            .field("stream", &self.stream)
            .field("custom_provider", &self.provider.is_some())
            .finish()
    }
}

