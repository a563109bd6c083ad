//! Named storage slots.
//!
//! A slot holds one opaque string and is always read and written whole, like
//! a browser `localStorage` key. [`FileSlot`] backs the CLI; [`MemorySlot`]
//! backs tests and can simulate a storage quota.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Errors raised by a storage slot.
#[derive(Debug, Error)]
pub enum SlotError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage quota exceeded: {needed} bytes requested, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },
}

/// A single named value in durable client storage.
pub trait StorageSlot: Send + Sync {
    /// Read the slot. `Ok(None)` means nothing has been stored yet.
    fn read(&self) -> Result<Option<String>, SlotError>;

    /// Replace the slot contents. Either the whole value is written or the
    /// previous value is left intact.
    fn write(&self, contents: &str) -> Result<(), SlotError>;
}

// ---------------------------------------------------------------------------
// File slot
// ---------------------------------------------------------------------------

/// Slot stored as a single file on disk.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> SlotError {
        SlotError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl StorageSlot for FileSlot {
    fn read(&self) -> Result<Option<String>, SlotError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_err(e)),
        }
    }

    fn write(&self, contents: &str) -> Result<(), SlotError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| self.io_err(e))?;

        // Write next to the target and rename over it so a failed write
        // never truncates the existing list.
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| self.io_err(e))?;
        tmp.write_all(contents.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| self.io_err(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_err(e.error))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Memory slot
// ---------------------------------------------------------------------------

/// In-memory slot. Clones share the same underlying value.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    value: Arc<Mutex<Option<String>>>,
    quota: Option<usize>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with pre-existing contents (e.g. a corrupt value).
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            value: Arc::new(Mutex::new(Some(contents.into()))),
            quota: None,
        }
    }

    /// Reject writes larger than `bytes`.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// Current raw contents.
    pub fn contents(&self) -> Option<String> {
        self.value.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl StorageSlot for MemorySlot {
    fn read(&self) -> Result<Option<String>, SlotError> {
        Ok(self.contents())
    }

    fn write(&self, contents: &str) -> Result<(), SlotError> {
        if let Some(quota) = self.quota {
            if contents.len() > quota {
                return Err(SlotError::QuotaExceeded {
                    needed: contents.len(),
                    quota,
                });
            }
        }
        *self.value.lock().unwrap_or_else(|e| e.into_inner()) = Some(contents.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_slot_missing_file_reads_none() {
        let dir = TempDir::new().unwrap();
        let slot = FileSlot::new(dir.path().join("nothing.json"));
        assert!(slot.read().unwrap().is_none());
    }

    #[test]
    fn file_slot_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let slot = FileSlot::new(dir.path().join("nested/deeper/plans.json"));
        slot.write("[]").unwrap();
        assert_eq!(slot.read().unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn file_slot_write_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let slot = FileSlot::new(dir.path().join("plans.json"));
        slot.write("[1,2,3]").unwrap();
        slot.write("[4]").unwrap();
        assert_eq!(slot.read().unwrap().as_deref(), Some("[4]"));
    }

    #[test]
    fn memory_slot_quota_keeps_previous_value() {
        let slot = MemorySlot::new().with_quota(4);
        slot.write("[]").unwrap();
        let err = slot.write("[1,2,3]").unwrap_err();
        assert!(matches!(err, SlotError::QuotaExceeded { needed: 7, quota: 4 }));
        assert_eq!(slot.contents().as_deref(), Some("[]"));
    }

    #[test]
    fn memory_slot_clones_share_value() {
        let a = MemorySlot::new();
        let b = a.clone();
        a.write("x").unwrap();
        assert_eq!(b.contents().as_deref(), Some("x"));
    }
}
