// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Key-value settings persistence.
//!
//! Sessions keep their start rule and manual sample input across runs in a
//! single JSON file. Writes go through a temp file renamed into place so a
//! crash never leaves a torn settings file behind.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::model::GrammarKey;

/// Settings key for a session's manual sample input.
pub fn input_key(key: &GrammarKey) -> String {
    format!("galatea:{key}:input")
}

/// Settings key for a session's selected start rule.
pub fn start_rule_key(key: &GrammarKey) -> String {
    format!("galatea:{key}:start-rule")
}

#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "io error at '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "invalid settings json at '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Fast, best-effort persistence.
    ///
    /// - Writes a temp file and renames atomically into place.
    /// - Does not perform per-file fsync/sync.
    #[default]
    BestEffort,

    /// Slower, best-effort durability.
    ///
    /// Attempts to flush written file contents to stable storage where
    /// possible. Exact guarantees are platform/filesystem-dependent.
    Durable,
}

/// Storage backend for namespaced string settings.
///
/// Setting a key to `None` removes it.
pub trait SettingsStore: Send + Sync {
    fn get_value(&self, key: &str) -> Option<String>;

    fn set_value(&self, key: &str, value: Option<&str>) -> Result<(), StoreError>;
}

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get_value(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .expect("settings lock poisoned")
            .get(key)
            .cloned()
    }

    fn set_value(&self, key: &str, value: Option<&str>) -> Result<(), StoreError> {
        let mut values = self.values.lock().expect("settings lock poisoned");
        match value {
            Some(value) => {
                values.insert(key.to_owned(), value.to_owned());
            }
            None => {
                values.remove(key);
            }
        }
        Ok(())
    }
}

/// JSON-file-backed store: one flat string map, rewritten wholesale on each
/// change.
#[derive(Debug)]
pub struct JsonFileSettings {
    path: PathBuf,
    durability: WriteDurability,
    values: Mutex<BTreeMap<String, String>>,
}

impl JsonFileSettings {
    /// Opens the store, loading existing values. A missing file is an empty
    /// store; invalid JSON is an error rather than silent data loss.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|source| StoreError::Json {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.clone(),
                    source,
                })
            }
        };
        Ok(Self {
            path,
            durability: WriteDurability::default(),
            values: Mutex::new(values),
        })
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let mut text =
            serde_json::to_string_pretty(values).map_err(|source| StoreError::Json {
                path: self.path.clone(),
                source,
            })?;
        text.push('\n');
        write_atomic(&self.path, text.as_bytes(), self.durability)
    }
}

impl SettingsStore for JsonFileSettings {
    fn get_value(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .expect("settings lock poisoned")
            .get(key)
            .cloned()
    }

    fn set_value(&self, key: &str, value: Option<&str>) -> Result<(), StoreError> {
        let mut values = self.values.lock().expect("settings lock poisoned");
        let changed = match value {
            Some(value) => {
                values.insert(key.to_owned(), value.to_owned()).as_deref() != Some(value)
            }
            None => values.remove(key).is_some(),
        };
        if changed {
            self.persist(&values)?;
        }
        Ok(())
    }
}

fn write_atomic(path: &Path, contents: &[u8], durability: WriteDurability) -> Result<(), StoreError> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_path = path.with_file_name(format!(".galatea.tmp.{file_name}.{nanos}"));

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;

    file.write_all(contents).map_err(|source| StoreError::Io {
        path: tmp_path.clone(),
        source,
    })?;

    if durability == WriteDurability::Durable {
        file.sync_all().map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;
    }
    drop(file);

    if let Err(source) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}
