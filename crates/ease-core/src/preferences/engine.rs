//! Preference engine.
//!
//! The engine is the single owner of the live [`PreferenceState`]. Every
//! mutation runs to completion in three steps:
//!
//! 1. update the in-memory state
//! 2. write the state through the [`PreferenceStore`] (failures are logged and
//!    dropped, the in-memory copy stays authoritative)
//! 3. hand a fresh [`Snapshot`] to every subscriber
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = PreferenceEngine::load(PreferenceStore::new(MemoryStore::new()));
//! let id = engine.subscribe(|snap| println!("revision {}", snap.revision));
//! engine.set_font_size(FontSize::Large);
//! engine.unsubscribe(id);
//! ```

use serde::Serialize;
use tracing::{debug, warn};

use super::state::{
    clamp_speech_rate, merge, ContrastMode, FontFamily, FontSize, PreferenceKey, PreferenceState,
    TextSpacing, VoiceGender,
};
use crate::error::PreferenceError;
use crate::storage::PreferenceStore;

/// Immutable copy of the preferences at one point in time.
///
/// `revision` grows by one with every mutation, so a subscriber can tell
/// snapshots apart and order them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub revision: u64,
    pub state: PreferenceState,
}

/// Handle returned by [`PreferenceEngine::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&Snapshot)>;

pub struct PreferenceEngine {
    store: PreferenceStore,
    state: PreferenceState,
    revision: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl PreferenceEngine {
    /// Create an engine around an explicit starting state.
    ///
    /// The state is normalized so the invariants hold from the start.
    pub fn new(store: PreferenceStore, mut state: PreferenceState) -> Self {
        state.normalize();
        Self {
            store,
            state,
            revision: 0,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Load the persisted record (if any) and merge it with the defaults.
    ///
    /// Never fails: a missing or unreadable record yields the defaults.
    pub fn load(store: PreferenceStore) -> Self {
        let state = match store.load() {
            Some(loaded) => merge(&PreferenceState::default(), &loaded),
            None => PreferenceState::default(),
        };
        Self::new(store, state)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &PreferenceState {
        &self.state
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// An owned copy; changing it has no effect on the engine.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            revision: self.revision,
            state: self.state.clone(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Register a callback invoked after every mutation.
    pub fn subscribe(&mut self, callback: impl FnMut(&Snapshot) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a callback. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn set_font_size(&mut self, size: FontSize) {
        self.commit("fontSize", |s| s.font_size = size);
    }

    pub fn set_text_spacing(&mut self, spacing: TextSpacing) {
        self.commit("textSpacing", |s| s.text_spacing = spacing);
    }

    pub fn set_font_family(&mut self, family: FontFamily) {
        self.commit("fontFamily", |s| s.font_family = family);
    }

    pub fn set_voice_gender(&mut self, gender: VoiceGender) {
        self.commit("voiceGender", |s| s.voice_gender = gender);
    }

    /// Out-of-range rates are clamped into `[0.5, 2.0]`.
    pub fn set_speech_rate(&mut self, rate: f64) {
        let rate = clamp_speech_rate(rate);
        self.commit("speechRate", |s| s.speech_rate = rate);
    }

    pub fn set_contrast_mode(&mut self, mode: ContrastMode) {
        self.commit("contrastMode", |s| s.set_contrast(mode));
    }

    pub fn toggle_high_contrast(&mut self) {
        self.commit("highContrast", |s| {
            let mode = if s.high_contrast {
                ContrastMode::Normal
            } else {
                ContrastMode::High
            };
            s.set_contrast(mode);
        });
    }

    pub fn toggle_animations(&mut self) {
        self.commit("reduceAnimations", |s| s.reduce_animations = !s.reduce_animations);
    }

    pub fn toggle_highlight_links(&mut self) {
        self.commit("highlightLinks", |s| s.highlight_links = !s.highlight_links);
    }

    pub fn toggle_highlight_buttons(&mut self) {
        self.commit("highlightButtons", |s| s.highlight_buttons = !s.highlight_buttons);
    }

    pub fn toggle_large_cursor(&mut self) {
        self.commit("largeCursor", |s| s.large_cursor = !s.large_cursor);
    }

    pub fn toggle_reading_mode(&mut self) {
        self.commit("readingMode", |s| s.reading_mode = !s.reading_mode);
    }

    pub fn reset_to_defaults(&mut self) {
        self.commit("reset", |s| *s = PreferenceState::default());
    }

    /// Flip an on/off preference by name.
    ///
    /// # Errors
    /// Returns [`PreferenceError::NotToggleable`] for fields that are not
    /// switches.
    pub fn toggle(&mut self, key: PreferenceKey) -> Result<(), PreferenceError> {
        match key {
            PreferenceKey::HighContrast => self.toggle_high_contrast(),
            PreferenceKey::ReduceAnimations => self.toggle_animations(),
            PreferenceKey::HighlightLinks => self.toggle_highlight_links(),
            PreferenceKey::HighlightButtons => self.toggle_highlight_buttons(),
            PreferenceKey::LargeCursor => self.toggle_large_cursor(),
            PreferenceKey::ReadingMode => self.toggle_reading_mode(),
            other => return Err(PreferenceError::NotToggleable(other.as_str().to_string())),
        }
        Ok(())
    }

    /// Set a preference from its textual form (`"large"`, `"true"`, `"1.5"`).
    ///
    /// Routes to the typed setters, so contrast stays in step and the speech
    /// rate is clamped. The value is parsed before anything changes; a
    /// rejected value leaves the engine untouched.
    ///
    /// # Errors
    /// Returns [`PreferenceError::InvalidValue`] if the value does not parse.
    pub fn set_field(&mut self, key: PreferenceKey, value: &str) -> Result<(), PreferenceError> {
        let invalid = |expected: &'static str| PreferenceError::InvalidValue {
            key: key.as_str().to_string(),
            value: value.to_string(),
            expected,
        };

        match key {
            PreferenceKey::FontSize => self.set_font_size(value.parse().map_err(invalid)?),
            PreferenceKey::TextSpacing => self.set_text_spacing(value.parse().map_err(invalid)?),
            PreferenceKey::FontFamily => self.set_font_family(value.parse().map_err(invalid)?),
            PreferenceKey::VoiceGender => self.set_voice_gender(value.parse().map_err(invalid)?),
            PreferenceKey::ContrastMode => self.set_contrast_mode(value.parse().map_err(invalid)?),
            PreferenceKey::SpeechRate => {
                let rate: f64 = value.trim().parse().map_err(|_| invalid("a number"))?;
                if rate.is_nan() {
                    return Err(invalid("a number"));
                }
                self.set_speech_rate(rate);
            }
            switch => {
                let wanted = parse_switch(value).ok_or_else(|| invalid("true or false"))?;
                if switch_value(&self.state, switch) != wanted {
                    self.toggle(switch)?;
                } else {
                    // Re-assert the current value so the write and the
                    // notification still happen.
                    self.commit(switch.as_str(), |_| {});
                }
            }
        }
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn commit(&mut self, change: &'static str, apply: impl FnOnce(&mut PreferenceState)) {
        apply(&mut self.state);
        self.revision += 1;
        debug!(change, revision = self.revision, "preferences updated");

        if let Err(e) = self.store.save(&self.state) {
            warn!(change, error = %e, "failed to persist preferences; keeping in-memory state");
        }

        let snapshot = self.snapshot();
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&snapshot);
        }
    }
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn switch_value(state: &PreferenceState, key: PreferenceKey) -> bool {
    match key {
        PreferenceKey::HighContrast => state.high_contrast,
        PreferenceKey::ReduceAnimations => state.reduce_animations,
        PreferenceKey::HighlightLinks => state.highlight_links,
        PreferenceKey::HighlightButtons => state.highlight_buttons,
        PreferenceKey::LargeCursor => state.large_cursor,
        PreferenceKey::ReadingMode => state.reading_mode,
        _ => false,
    }
}
