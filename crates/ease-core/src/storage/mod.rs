//! Persistence for preferences, prompt state and configuration.
//!
//! Every backend implements [`KeyValueStore`], a plain string key/value
//! capability. Priority-ordered fallback between backends is the job of
//! [`FallbackStore`]; callers never retry on their own.

mod config;
pub mod database;
pub mod file;
pub mod memory;
pub mod fallback;
pub mod preferences;

pub use config::{Config, LoggingConfig, PromptConfig, StorageBackend, StorageConfig};
pub use database::SqliteStore;
pub use fallback::FallbackStore;
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use preferences::{PreferenceStore, PREFERENCES_KEY};

use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::{ConfigError, StoreError};

/// A durable string key/value capability.
///
/// Implementations are single-writer: no guarantee is made about two
/// processes writing the same backend at once.
pub trait KeyValueStore {
    /// Short backend name used in logs.
    fn name(&self) -> &str;

    /// Read a value. `Ok(None)` means the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or replace a value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Rc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Returns the Ease data directory, creating it if needed.
///
/// `EASE_DATA_DIR` wins when set. Otherwise `~/.config/ease`, or
/// `~/.config/ease-dev` when `EASE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("EASE_DATA_DIR") {
        Some(explicit) if !explicit.is_empty() => PathBuf::from(explicit),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("EASE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("ease-dev")
            } else {
                base_dir.join("ease")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Open the backend selected by `config` inside the data directory.
///
/// # Errors
/// Returns an error only when the data directory cannot be resolved.
pub fn open_store(config: &StorageConfig) -> Result<FallbackStore, ConfigError> {
    Ok(open_store_in(&data_dir()?, config))
}

/// Open the backend selected by `config` inside `dir`, with an in-memory
/// store as the last resort so the process always has somewhere to write.
pub fn open_store_in(dir: &Path, config: &StorageConfig) -> FallbackStore {
    let chain = FallbackStore::new();
    let chain = match config.backend {
        StorageBackend::Json => chain.with_backend(JsonFileStore::new(dir.join(&config.json_file))),
        StorageBackend::Sqlite => match SqliteStore::open(dir.join(&config.sqlite_file)) {
            Ok(store) => chain.with_backend(store),
            Err(e) => {
                tracing::warn!(error = %e, "sqlite store unavailable, falling back to json file");
                chain.with_backend(JsonFileStore::new(dir.join(&config.json_file)))
            }
        },
        StorageBackend::Memory => chain,
    };
    chain.with_backend(MemoryStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_store_in_builds_configured_chain() {
        let dir = tempfile::tempdir().unwrap();

        let json = open_store_in(dir.path(), &StorageConfig::default());
        assert_eq!(json.backend_names(), vec!["json-file", "memory"]);

        let sqlite = open_store_in(
            dir.path(),
            &StorageConfig {
                backend: StorageBackend::Sqlite,
                ..StorageConfig::default()
            },
        );
        assert_eq!(sqlite.backend_names(), vec!["sqlite", "memory"]);
        sqlite.set("k", "v").unwrap();
        assert!(dir.path().join("ease.db").exists());

        let memory = open_store_in(
            dir.path(),
            &StorageConfig {
                backend: StorageBackend::Memory,
                ..StorageConfig::default()
            },
        );
        assert_eq!(memory.backend_names(), vec!["memory"]);
    }
}
