pub mod config;
pub mod prefs;
pub mod prompt;

use std::rc::Rc;

use chrono::{DateTime, Utc};
use ease_core::storage::open_store;
use ease_core::{Config, FallbackStore};

/// Open the configured store once so preferences and prompt state share it.
pub fn shared_store(config: &Config) -> Result<Rc<FallbackStore>, Box<dyn std::error::Error>> {
    let store = open_store(&config.storage)?;
    tracing::debug!(backends = ?store.backend_names(), "store opened");
    Ok(Rc::new(store))
}

/// Parse an `--at` override, defaulting to the current time.
pub fn resolve_now(at: Option<&str>) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    match at {
        Some(raw) => Ok(DateTime::parse_from_rfc3339(raw)
            .map_err(|e| format!("invalid timestamp '{raw}': {e}"))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}
