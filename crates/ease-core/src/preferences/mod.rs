//! Presentation preferences: the record, its defaults and merge, and the
//! engine that owns the live copy.

pub mod engine;
pub mod state;

pub use engine::{PreferenceEngine, Snapshot, SubscriptionId};
pub use state::{
    clamp_speech_rate, merge, ContrastMode, FontFamily, FontSize, PreferenceKey, PreferenceState,
    TextSpacing, VoiceGender, DEFAULT_SPEECH_RATE, MAX_SPEECH_RATE, MIN_SPEECH_RATE,
};
