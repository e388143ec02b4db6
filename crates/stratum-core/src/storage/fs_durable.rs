//! # File-backed Durable Store
//!
//! Whole-file reads and writes under a private root directory.
//!
//! Writes go to a temporary sibling first and are moved into place with a
//! rename, so a reader never observes a partially written file.

use crate::capability::DurableStore;
use crate::{StratumError, primitives};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Durable store rooted at a directory.
#[derive(Debug)]
pub struct FsDurableStore {
    root: PathBuf,
    tmp_seq: AtomicU64,
}

impl FsDurableStore {
    /// Open (creating if needed) a durable store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StratumError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|e| {
            StratumError::IoError(format!(
                "Cannot create durable root '{}': {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self {
            root,
            tmp_seq: AtomicU64::new(0),
        })
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a store-relative path, rejecting anything that escapes the root.
    fn resolve(&self, path: &str) -> Result<PathBuf, StratumError> {
        if path.is_empty() || path.len() > primitives::MAX_PATH_LENGTH {
            return Err(StratumError::InvalidPath(format!(
                "path length must be 1..={} bytes",
                primitives::MAX_PATH_LENGTH
            )));
        }

        if path.contains('\\') {
            return Err(StratumError::InvalidPath(format!(
                "'{}' must use '/' separators",
                path
            )));
        }

        let relative = Path::new(path);
        for component in relative.components() {
            match component {
                Component::Normal(_) => {}
                _ => {
                    return Err(StratumError::InvalidPath(format!(
                        "'{}' must be a plain relative path",
                        path
                    )));
                }
            }
        }

        Ok(self.root.join(relative))
    }
}

impl DurableStore for FsDurableStore {
    fn exists(&self, path: &str) -> Result<bool, StratumError> {
        Ok(self.resolve(path)?.is_file())
    }

    fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StratumError> {
        let full = self.resolve(path)?;
        match std::fs::read(&full) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StratumError::IoError(format!(
                "Cannot read '{}': {}",
                full.display(),
                e
            ))),
        }
    }

    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StratumError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StratumError::IoError(format!("Cannot create directory: {}", e)))?;
        }

        let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
        let tmp = full.with_file_name(format!(
            ".{}.tmp-{}-{}",
            full.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            std::process::id(),
            seq
        ));

        std::fs::write(&tmp, bytes).map_err(|e| {
            StratumError::IoError(format!("Cannot write '{}': {}", tmp.display(), e))
        })?;
        std::fs::rename(&tmp, &full).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            StratumError::IoError(format!("Cannot replace '{}': {}", full.display(), e))
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
