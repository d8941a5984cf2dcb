//! Key-value side store for convenience state that outlives a session.
//!
//! The portal keeps the selected `choice` of the two choice-bearing document
//! sections per application here. Nothing in the lifecycle depends on it.

use crate::domain::FileType;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Side store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Side store is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

pub trait SideStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Key for the remembered choice of `file_type` on one application.
pub fn selection_key(file_type: FileType, application_id: &str) -> Option<String> {
    file_type
        .choice_store_prefix()
        .map(|prefix| format!("{}_{}", prefix, application_id))
}

#[derive(Debug, Default)]
pub struct MemorySideStore {
    entries: BTreeMap<String, String>,
}

impl SideStore for MemorySideStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A JSON object on disk, rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFileSideStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileSideStore {
    /// Opens the store, starting empty when the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SideStore for JsonFileSideStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
