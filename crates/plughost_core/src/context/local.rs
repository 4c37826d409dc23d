//! File-system backed context.

use super::{Context, ResourceError, ResourceStream};
use log::debug;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Context resolving logical names relative to one base directory.
///
/// Absolute names bypass the base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalContext {
    base_dir: PathBuf,
}

impl LocalContext {
    /// Creates a context rooted at `base_dir`.
    ///
    /// Relative base directories are anchored at the current working directory
    /// so that `resolve_path` always returns an absolute path.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        let base_dir = base_dir.as_ref();
        let base_dir = std::path::absolute(base_dir).unwrap_or_else(|_| base_dir.to_path_buf());
        Self { base_dir }
    }

    /// Creates a context rooted at the current working directory.
    pub fn current_dir() -> Self {
        Self::new(".")
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl Context for LocalContext {
    fn resolve_stream(&self, name: &str) -> Result<ResourceStream, ResourceError> {
        let path = self.resolve_path(name);
        match File::open(&path) {
            Ok(file) => {
                debug!(
                    "event=resource_open module=context status=ok name={} path={}",
                    name,
                    path.display()
                );
                Ok(Box::new(file))
            }
            Err(err) => {
                debug!(
                    "event=resource_open module=context status=error name={} path={} error={}",
                    name,
                    path.display(),
                    err
                );
                Err(ResourceError::io(name, err))
            }
        }
    }

    fn resolve_path(&self, name: &str) -> PathBuf {
        let candidate = Path::new(name.trim());
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.base_dir.join(candidate)
        }
    }
}
