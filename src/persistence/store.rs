// * Config Writer - persists the rendered config as one named artifact
// * Every persist is a full overwrite; readers never see a half-written file

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::RwLock;
use thiserror::Error;
use tracing::debug;

/// Errors raised while writing the config artifact
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to write config artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config store rejected write: {0}")]
    Rejected(String),
}

/// Type alias for async persist result
pub type PersistResult = Pin<Box<dyn Future<Output = Result<(), PersistError>> + Send>>;

/// Destination for the rendered config
pub trait ConfigStore: Send + Sync {
    /// Replaces the artifact's entire content with `text`
    fn persist(&self, text: String) -> PersistResult;
}

/// Writes the artifact to a fixed path on disk
///
/// The text goes to a sibling temp file first and is renamed over the
/// artifact, so the engine only ever reads a complete generation.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    // * Temp file lives next to the artifact so the rename stays on one filesystem
    fn staging_path(path: &Path) -> PathBuf {
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        path.with_file_name(name)
    }
}

impl ConfigStore for FileConfigStore {
    fn persist(&self, text: String) -> PersistResult {
        let path = self.path.clone();
        Box::pin(async move {
            let io_err = |source| PersistError::Io {
                path: path.clone(),
                source,
            };

            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
            }

            let staging = Self::staging_path(&path);
            tokio::fs::write(&staging, text.as_bytes())
                .await
                .map_err(io_err)?;
            tokio::fs::rename(&staging, &path).await.map_err(io_err)?;

            debug!(path = %path.display(), bytes = text.len(), "Config artifact written");
            Ok(())
        })
    }
}

/// In-memory config store for testing
#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    contents: RwLock<Option<String>>,
    writes: RwLock<usize>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last persisted text, `None` if nothing was written yet
    pub fn contents(&self) -> Option<String> {
        self.contents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn write_count(&self) -> usize {
        *self
            .writes
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn persist(&self, text: String) -> PersistResult {
        *self
            .contents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(text);
        *self
            .writes
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) += 1;
        Box::pin(async { Ok(()) })
    }
}
