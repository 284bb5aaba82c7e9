//! Key/value backends for the session store
//!
//! A backend stores a handful of string entries under fixed keys. Three
//! implementations are provided:
//!
//! - [`FileBackend`]: a JSON object on disk, readable by anyone with access
//!   to the user's profile (no expiry, no encryption)
//! - [`KeyringBackend`]: the OS native credential store
//! - [`MemoryBackend`]: an in-process map, forgotten on exit

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use directories::ProjectDirs;

use crate::error::{Result, SmartMealError};

/// Storage for string entries addressed by key.
pub trait SessionBackend: Send + Sync {
    /// Read the entry for `key`, `Ok(None)` when nothing is stored.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete the entry for `key`. Deleting a missing entry is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Write several entries together.
    ///
    /// The default writes one key at a time and stops at the first failure,
    /// so earlier keys may already be written. Backends that can update all
    /// entries in one step override this.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Delete several entries together. Same caveat as [`Self::set_many`].
    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileBackend
// ---------------------------------------------------------------------------

/// JSON file backend.
///
/// The whole file is read and rewritten on every operation; it holds two
/// short strings, so there is nothing to gain from anything smarter.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileBackend {
    /// Backend stored at the platform data directory
    /// (`.../smartmeal/session.json`).
    ///
    /// # Errors
    ///
    /// Returns [`SmartMealError::Session`] when no home directory can be
    /// determined.
    pub fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "smartmeal", "smartmeal").ok_or_else(|| {
            SmartMealError::Session("Could not determine data directory".to_string())
        })?;
        Ok(Self::with_path(proj_dirs.data_dir().join("session.json")))
    }

    /// Backend stored at an explicit path. The file is created on first
    /// write.
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        let entries = serde_json::from_str(&contents).map_err(|e| {
            SmartMealError::Session(format!(
                "Session file {} is not valid JSON: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(entries)
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for session file")?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write session file {}", self.path.display()))?;
        Ok(())
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| SmartMealError::Session("Session file lock poisoned".to_string()).into())
    }
}

impl SessionBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.guard()?;
        Ok(self.read_entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.guard()?;
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.guard()?;
        let mut entries = self.read_entries()?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }

    fn set_many(&self, pairs: &[(&str, &str)]) -> Result<()> {
        let _guard = self.guard()?;
        let mut entries = self.read_entries()?;
        for (key, value) in pairs {
            entries.insert(key.to_string(), value.to_string());
        }
        self.write_entries(&entries)
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let _guard = self.guard()?;
        let mut entries = self.read_entries()?;
        let before = entries.len();
        for key in keys {
            entries.remove(*key);
        }
        if entries.len() != before {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// KeyringBackend
// ---------------------------------------------------------------------------

/// OS keyring backend.
///
/// Each key becomes its own keyring entry under the `smartmeal` service
/// name, so the token and the display name can be removed independently.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringBackend;

impl KeyringBackend {
    const SERVICE: &'static str = "smartmeal";

    fn entry(key: &str) -> Result<keyring::Entry> {
        Ok(keyring::Entry::new(Self::SERVICE, key).map_err(SmartMealError::Keyring)?)
    }
}

impl SessionBackend for KeyringBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match Self::entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(SmartMealError::Keyring(e).into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        Self::entry(key)?
            .set_password(value)
            .map_err(SmartMealError::Keyring)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match Self::entry(key)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(SmartMealError::Keyring(e).into()),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryBackend
// ---------------------------------------------------------------------------

/// In-process backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    /// Empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| SmartMealError::Session("Session map lock poisoned".to_string()).into())
    }
}

impl SessionBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }

    fn set_many(&self, pairs: &[(&str, &str)]) -> Result<()> {
        let mut entries = self.entries()?;
        for (key, value) in pairs {
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut entries = self.entries()?;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}
