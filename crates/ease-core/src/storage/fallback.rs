//! Priority-ordered chain of key/value backends.
//!
//! - `get` returns the first value found, walking backends in priority order
//!   and skipping backends that fail.
//! - `set` writes to the first backend that accepts the write.
//! - `remove` removes from every backend that answers.
//!
//! An operation only fails when every backend failed.
//!
//! When a write falls through to a lower backend, a higher backend may still
//! hold an older value it refuses to drop (a read-only file, say). The chain
//! remembers where each such key was last written and reads it from there,
//! so `get` never returns a value older than the last successful `set`.

use std::cell::RefCell;
use std::collections::HashMap;

use super::KeyValueStore;
use crate::error::StoreError;

#[derive(Default)]
pub struct FallbackStore {
    backends: Vec<Box<dyn KeyValueStore>>,
    /// Keys whose last write landed below the primary, by backend index.
    written_to: RefCell<HashMap<String, usize>>,
}

impl FallbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a backend with lower priority than the ones already present.
    pub fn with_backend(mut self, backend: impl KeyValueStore + 'static) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    fn exhausted(&self, last: Option<StoreError>) -> StoreError {
        StoreError::Exhausted {
            attempted: self.backends.len(),
            last: last
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no backends configured".to_string()),
        }
    }

    /// Record that `key` now lives in backend `index` and drop stale copies
    /// from the backends above it where they allow it.
    fn note_write(&self, key: &str, index: usize) {
        let mut written_to = self.written_to.borrow_mut();
        if index == 0 {
            written_to.remove(key);
            return;
        }
        written_to.insert(key.to_string(), index);
        for backend in &self.backends[..index] {
            if let Err(e) = backend.remove(key) {
                tracing::debug!(backend = backend.name(), key, error = %e, "could not drop stale copy");
            }
        }
    }
}

impl KeyValueStore for FallbackStore {
    fn name(&self) -> &str {
        "fallback"
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let start = self.written_to.borrow().get(key).copied().unwrap_or(0);
        let mut answered = false;
        let mut last = None;
        for backend in self.backends.iter().skip(start) {
            match backend.get(key) {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => answered = true,
                Err(e) => {
                    tracing::debug!(backend = backend.name(), key, error = %e, "read failed, trying next backend");
                    last = Some(e);
                }
            }
        }
        if answered {
            Ok(None)
        } else {
            Err(self.exhausted(last))
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut last = None;
        for (index, backend) in self.backends.iter().enumerate() {
            match backend.set(key, value) {
                Ok(()) => {
                    self.note_write(key, index);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(backend = backend.name(), key, error = %e, "write failed, trying next backend");
                    last = Some(e);
                }
            }
        }
        Err(self.exhausted(last))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.written_to.borrow_mut().remove(key);
        let mut answered = false;
        let mut last = None;
        for backend in &self.backends {
            match backend.remove(key) {
                Ok(()) => answered = true,
                Err(e) => last = Some(e),
            }
        }
        if answered {
            Ok(())
        } else {
            Err(self.exhausted(last))
        }
    }
}
