use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::{Result, SyncError};
use crate::ports::SourceStore;

/// Reads and writes UTF-8 files on disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSourceStore;

impl SourceStore for FsSourceStore {
    fn load(&self, path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(src) => {
                trace!(path = %path.display(), bytes = src.len(), "read source");
                Ok(Some(src))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SyncError::io(path, e)),
        }
    }

    fn store(&self, path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| SyncError::io(parent, e))?;
        }
        fs::write(path, contents).map_err(|e| SyncError::io(path, e))?;
        trace!(path = %path.display(), bytes = contents.len(), "wrote source");
        Ok(())
    }
}

/// In-memory store for benchmarks and tests.
#[derive(Debug, Default)]
pub struct MemorySourceStore {
    files: RefCell<HashMap<PathBuf, String>>,
}

impl MemorySourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.borrow_mut().insert(path.into(), contents.into());
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }
}

impl SourceStore for MemorySourceStore {
    fn load(&self, path: &Path) -> Result<Option<String>> {
        Ok(self.get(path))
    }

    fn store(&self, path: &Path, contents: &str) -> Result<()> {
        self.insert(path, contents);
        Ok(())
    }
}
