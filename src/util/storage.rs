//! Durable key-value storage backends.
//!
//! SYSTEM CONTEXT
//! ==============
//! The auth store mirrors the raw access token and its persisted envelope
//! through the `Storage` trait. In the browser (`hydrate` on wasm32) that is
//! `window.localStorage`; every other build uses an in-memory map or a JSON
//! file, even with `hydrate` enabled.
//!
//! ERROR HANDLING
//! ==============
//! Reads never fail: a missing or unreadable key is `None`. Writes report
//! `StorageError` so callers can log them, but nothing retries.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Key holding the raw access token string.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Key holding the persisted auth envelope.
pub const PERSIST_KEY: &str = "auth-storage";

/// Errors produced by storage writes.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing data could not be encoded or decoded.
    #[error("storage serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The storage engine refused the operation (quota, disabled, no window).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Whether this build talks to browser `localStorage`.
pub const BROWSER_STORAGE: bool = cfg!(all(feature = "hydrate", target_arch = "wasm32"));

/// Synchronous string key-value store.
///
/// The auth store calls writes while holding its state lock so storage sees
/// mutations in order. Implementations must not call back into the store
/// and should return promptly.
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`.
    fn get_item(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend rejects the write.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend rejects the delete.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Backend chosen by [`open_storage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend<'a> {
    Local,
    File(&'a Path),
    Memory,
}

/// Selection rule: browser builds always use `localStorage`; elsewhere a
/// path selects a file and no path selects memory.
#[must_use]
pub fn storage_backend(path: Option<&Path>, browser: bool) -> StorageBackend<'_> {
    match (browser, path) {
        (true, _) => StorageBackend::Local,
        (false, Some(path)) => StorageBackend::File(path),
        (false, None) => StorageBackend::Memory,
    }
}

/// Open the storage backend for this build, see [`storage_backend`].
///
/// # Errors
///
/// Returns a [`StorageError`] if the storage file exists but cannot be read,
/// or if browser storage is requested outside a browser build.
pub fn open_storage(path: Option<&Path>) -> Result<Arc<dyn Storage>, StorageError> {
    match storage_backend(path, BROWSER_STORAGE) {
        #[cfg(all(feature = "hydrate", target_arch = "wasm32"))]
        StorageBackend::Local => Ok(Arc::new(LocalStorage)),
        #[cfg(not(all(feature = "hydrate", target_arch = "wasm32")))]
        StorageBackend::Local => Err(StorageError::Unavailable(
            "localStorage needs the hydrate feature on wasm32".to_owned(),
        )),
        StorageBackend::File(path) => Ok(Arc::new(FileStorage::open(path)?)),
        StorageBackend::Memory => Ok(Arc::new(MemoryStorage::default())),
    }
}

// =============================================================================
// MEMORY
// =============================================================================

/// Process-local storage. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

// =============================================================================
// FILE
// =============================================================================

/// A JSON object file holding every key. Loaded once, rewritten on each write.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open `path`, starting empty if the file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the file exists but cannot be read or
    /// does not hold a JSON object of strings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let items = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), keys = items.len(), "file storage opened");
        Ok(Self { path, items: Mutex::new(items) })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the whole map via a sibling temp file and rename.
    fn flush(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string(items)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = items.insert(key.to_owned(), value.to_owned());
        if let Err(e) = self.flush(&items) {
            match previous {
                Some(old) => items.insert(key.to_owned(), old),
                None => items.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(previous) = items.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.flush(&items) {
            items.insert(key.to_owned(), previous);
            return Err(e);
        }
        Ok(())
    }
}

// =============================================================================
// BROWSER
// =============================================================================

/// Browser `window.localStorage`. Looked up on every call, so the handle
/// itself holds no JS values.
#[cfg(all(feature = "hydrate", target_arch = "wasm32"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

#[cfg(all(feature = "hydrate", target_arch = "wasm32"))]
impl LocalStorage {
    fn storage() -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window".to_owned()))?
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".to_owned()))
    }
}

#[cfg(all(feature = "hydrate", target_arch = "wasm32"))]
impl Storage for LocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        Self::storage().ok()?.get_item(key).ok().flatten()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        Self::storage()?
            .remove_item(key)
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
    }
}
