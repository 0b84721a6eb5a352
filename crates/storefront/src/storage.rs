//! Key/value persistence for JSON blobs.
//!
//! Two scopes exist: a persistent store (one `<key>.json` file per key when
//! backed by [`FileStore`]) and a session store that lives only as long as the
//! process ([`MemoryStore`]).
//!
//! Writes are best effort. [`persist`] and [`load`] log failures with
//! `tracing::warn!` and leave a Sentry breadcrumb instead of failing the
//! operation that triggered them.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::error::add_breadcrumb;

/// Storage key names.
pub mod keys {
    /// Remembered login (`AuthRecord`).
    pub const AUTH: &str = "eshop-auth";
    /// Login for the current session only (`AuthRecord`).
    pub const AUTH_SESSION: &str = "eshop-auth-session";
    /// All orders.
    pub const ORDERS: &str = "eshop-orders";
    /// Snapshot `{orders, timestamp, count}` written alongside every order save.
    pub const ORDERS_BACKUP: &str = "eshop-orders-backup";
    /// Highest order id ever issued, so deleted ids are not handed out again.
    pub const ORDER_SEQUENCE: &str = "eshop-order-sequence";
    pub const PRODUCTS: &str = "eshop-products";
    /// Copy of the catalog written alongside every catalog save.
    pub const PRODUCTS_BACKUP: &str = "eshop-products-backup";
    pub const USERS: &str = "eshop-users";
    /// Copy of all accounts written alongside every account save.
    pub const USERS_BACKUP: &str = "eshop-users-backup";
    pub const COMPANY: &str = "eshop-company";
}

/// Errors from a key/value store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Keys become file names, so only `[A-Za-z0-9_-]` is accepted.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// A string-keyed store of string values.
pub trait KeyValueStore: std::fmt::Debug {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-process store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Directory-backed store: each key is a `<key>.json` file.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) the directory at `dir`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        // Write then rename so a crash never leaves a half-written file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// JSON helpers
// =============================================================================

/// Serialize `value` as pretty JSON and store it under `key`.
///
/// # Errors
///
/// Returns `StorageError` if serialization or the write fails.
pub fn save_json<T: Serialize + ?Sized>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(value)?;
    store.set(key, &json)
}

/// Read and deserialize the JSON stored under `key`.
///
/// # Errors
///
/// Returns `StorageError` if the read fails or the stored JSON does not parse.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    store
        .get(key)?
        .map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(StorageError::from)
}

/// Best-effort [`save_json`]: failures are logged and swallowed.
///
/// Returns whether the write succeeded.
pub fn persist<T: Serialize + ?Sized>(store: &mut dyn KeyValueStore, key: &str, value: &T) -> bool {
    match save_json(store, key, value) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to persist");
            add_breadcrumb("storage", "Persist failed", Some(&[("key", key)]));
            false
        }
    }
}

/// Best-effort [`load_json`]: unreadable or corrupt entries yield `None`.
pub fn load<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    match load_json(store, key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring unreadable stored value");
            add_breadcrumb("storage", "Load failed", Some(&[("key", key)]));
            None
        }
    }
}

/// Best-effort removal.
pub fn forget(store: &mut dyn KeyValueStore, key: &str) {
    if let Err(e) = store.remove(key) {
        tracing::warn!(key, error = %e, "Failed to remove stored value");
    }
}
