//! Key-value storage
//!
//! The game only needs string get/set under a couple of keys. LocalStorage
//! backs it in the browser; `MemoryStore` is used natively and in tests.

use std::collections::HashMap;
use std::fmt;

/// Failure writing to a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// No storage is reachable (no window, storage disabled, private mode)
    Unavailable,
    /// The backend refused the write (quota, security error)
    WriteRejected {
        /// Key that was being written
        key: String,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Unavailable => write!(f, "storage is unavailable"),
            StorageError::WriteRejected { key } => {
                write!(f, "storage rejected write for key '{key}'")
            }
        }
    }
}

impl std::error::Error for StorageError {}

/// Minimal string key-value capability
pub trait KeyValueStore {
    /// Read a value; absent keys (and unreadable stores) yield `None`
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Browser LocalStorage
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct LocalStore;

#[cfg(target_arch = "wasm32")]
impl LocalStore {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let storage = Self::storage().ok_or(StorageError::Unavailable)?;
        storage
            .set_item(key, value)
            .map_err(|_| StorageError::WriteRejected {
                key: key.to_string(),
            })
    }
}
