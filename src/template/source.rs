//! Read-only sources of template text

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Errors a resource source can report
#[derive(Debug, Error)]
pub enum SourceError {
    /// No resource at this path
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The resource exists but could not be read
    #[error("failed to read resource {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Key-value read access to template resources
///
/// Implementations must report a missing resource as [`SourceError::NotFound`]
/// so callers can tell it apart from a read failure.
pub trait ResourceSource: Send + Sync {
    fn read(&self, path: &str) -> Result<String, SourceError>;
}

impl<T: ResourceSource + ?Sized> ResourceSource for std::sync::Arc<T> {
    fn read(&self, path: &str) -> Result<String, SourceError> {
        (**self).read(path)
    }
}

/// Resources stored as files under a root directory
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a resource path below the root
    ///
    /// Paths that climb out of the root (`..`) or are absolute resolve to None.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        contained.then(|| self.root.join(relative))
    }
}

impl ResourceSource for FsSource {
    fn read(&self, path: &str) -> Result<String, SourceError> {
        let Some(full_path) = self.resolve(path) else {
            tracing::warn!(path = path, "Rejected resource path outside the template root");
            return Err(SourceError::NotFound(path.to_string()));
        };

        std::fs::read_to_string(&full_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SourceError::NotFound(path.to_string())
            } else {
                SourceError::Io {
                    path: path.to_string(),
                    source: e,
                }
            }
        })
    }
}

/// Resources held in memory, keyed by path
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    resources: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource, builder style
    pub fn with(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.resources.insert(path.into(), content.into());
    }
}

impl ResourceSource for MemorySource {
    fn read(&self, path: &str) -> Result<String, SourceError> {
        self.resources
            .get(path)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(path.to_string()))
    }
}
