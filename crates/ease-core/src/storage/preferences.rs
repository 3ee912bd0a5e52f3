//! Persistence of the preference record under one fixed key.

use super::KeyValueStore;
use crate::error::StoreError;
use crate::preferences::PreferenceState;

/// Storage key of the preference record.
pub const PREFERENCES_KEY: &str = "accessibility-preferences";

pub struct PreferenceStore {
    backend: Box<dyn KeyValueStore>,
}

impl PreferenceStore {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Read the raw persisted record.
    ///
    /// Returns `None` when nothing is stored, the backend fails, or the
    /// stored text is not JSON. The caller merges whatever comes back with
    /// the defaults, so a wrongly shaped record is still returned here.
    pub fn load(&self) -> Option<serde_json::Value> {
        let raw = match self.backend.get(PREFERENCES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(backend = self.backend.name(), error = %e, "failed to read preferences");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, "stored preferences are not valid JSON; using defaults");
                None
            }
        }
    }

    /// Persist the full record.
    ///
    /// # Errors
    /// Returns an error if the record cannot be encoded or the backend
    /// rejects the write.
    pub fn save(&self, state: &PreferenceState) -> Result<(), StoreError> {
        let json = serde_json::to_string(state)?;
        self.backend.set(PREFERENCES_KEY, &json)
    }

    /// Forget the persisted record.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.backend.remove(PREFERENCES_KEY)
    }
}
