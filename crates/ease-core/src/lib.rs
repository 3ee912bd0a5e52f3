//! # Ease Core Library
//!
//! Client-side accessibility preferences: text size, contrast, spacing, font,
//! cursor, motion and voice. Choices persist across sessions and are applied
//! to every rendered view through a reconciled set of presentation modes.
//! The `ease` CLI is a thin composition root over this library.
//!
//! ## Architecture
//!
//! - **Storage**: a string key/value capability with JSON-file, SQLite and
//!   in-memory backends, plus a priority-ordered fallback chain
//! - **Preferences**: the preference record, its defaults and a
//!   forward-compatible merge for records written by older versions
//! - **Engine**: the single owner of the live preferences; typed mutators,
//!   write-through persistence and snapshot subscriptions
//! - **Presentation**: pure preference → mode mapping and idempotent
//!   reconciliation of a mode surface
//! - **Prompt**: when to (re-)show a periodic one-question prompt
//!
//! ## Key Components
//!
//! - [`PreferenceEngine`]: owns and mutates [`PreferenceState`]
//! - [`PresentationApplier`]: keeps a [`Surface`] in step with the engine
//! - [`PromptScheduler`]: per-subject prompt decisions and history
//! - [`Config`]: application configuration

pub mod error;
pub mod preferences;
pub mod presentation;
pub mod prompt;
pub mod storage;

pub use error::{ConfigError, CoreError, PreferenceError, StoreError};
pub use preferences::{
    ContrastMode, FontFamily, FontSize, PreferenceEngine, PreferenceKey, PreferenceState,
    Snapshot, SubscriptionId, TextSpacing, VoiceGender,
};
pub use presentation::{
    apply, to_directives, ClassListSurface, Directives, Mode, ModeFamily, PresentationApplier,
    Surface,
};
pub use prompt::{
    DayRounding, PromptDecision, PromptPolicy, PromptReason, PromptScheduler, PromptState,
};
pub use storage::{
    Config, FallbackStore, JsonFileStore, KeyValueStore, MemoryStore, PreferenceStore,
    SqliteStore,
};
