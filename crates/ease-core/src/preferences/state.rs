//! The preference record, its defaults and the forward-compatible merge.
//!
//! The persisted JSON shape uses camelCase keys and kebab-case enum values:
//!
//! ```text
//! {"fontSize": "large", "contrastMode": "high", "highContrast": true, ...}
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PreferenceError;

/// Lowest accepted speech rate.
pub const MIN_SPEECH_RATE: f64 = 0.5;
/// Highest accepted speech rate.
pub const MAX_SPEECH_RATE: f64 = 2.0;
/// Speech rate of a fresh profile.
pub const DEFAULT_SPEECH_RATE: f64 = 1.0;

/// Clamp a requested speech rate into `[MIN_SPEECH_RATE, MAX_SPEECH_RATE]`.
///
/// NaN has no place in the range and falls back to the default.
pub fn clamp_speech_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        DEFAULT_SPEECH_RATE
    } else {
        rate.clamp(MIN_SPEECH_RATE, MAX_SPEECH_RATE)
    }
}

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $expected:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = &'static str;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err($expected),
                }
            }
        }
    };
}

string_enum! {
    /// Base text size.
    #[derive(Default)]
    FontSize, "one of normal, large, extra-large" {
        #[default]
        Normal => "normal",
        Large => "large",
        ExtraLarge => "extra-large",
    }
}

string_enum! {
    /// Letter, word and line spacing.
    #[derive(Default)]
    TextSpacing, "one of normal, large, extra-large" {
        #[default]
        Normal => "normal",
        Large => "large",
        ExtraLarge => "extra-large",
    }
}

string_enum! {
    #[derive(Default)]
    FontFamily, "one of default, dyslexia-friendly" {
        #[default]
        Standard => "default",
        DyslexiaFriendly => "dyslexia-friendly",
    }
}

string_enum! {
    #[derive(Default)]
    ContrastMode, "one of normal, high" {
        #[default]
        Normal => "normal",
        High => "high",
    }
}

string_enum! {
    /// Voice used by text-to-speech.
    #[derive(Default)]
    VoiceGender, "one of male, female" {
        Male => "male",
        #[default]
        Female => "female",
    }
}

string_enum! {
    /// Name of a single preference field, as persisted.
    PreferenceKey, "a preference name" {
        FontSize => "fontSize",
        ContrastMode => "contrastMode",
        HighContrast => "highContrast",
        ReduceAnimations => "reduceAnimations",
        TextSpacing => "textSpacing",
        FontFamily => "fontFamily",
        HighlightLinks => "highlightLinks",
        HighlightButtons => "highlightButtons",
        LargeCursor => "largeCursor",
        ReadingMode => "readingMode",
        VoiceGender => "voiceGender",
        SpeechRate => "speechRate",
    }
}

impl PreferenceKey {
    /// Parse either the persisted camelCase name or its kebab-case spelling
    /// (`font-size`, `high-contrast`, ...).
    pub fn parse(name: &str) -> Result<Self, PreferenceError> {
        if let Ok(key) = name.parse::<Self>() {
            return Ok(key);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.kebab_name() == name)
            .ok_or_else(|| PreferenceError::UnknownKey(name.to_string()))
    }

    /// `fontSize` -> `font-size`.
    pub fn kebab_name(self) -> String {
        let mut out = String::new();
        for c in self.as_str().chars() {
            if c.is_ascii_uppercase() {
                out.push('-');
                out.push(c.to_ascii_lowercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Whether the field is an on/off switch.
    pub fn is_switch(self) -> bool {
        matches!(
            self,
            PreferenceKey::HighContrast
                | PreferenceKey::ReduceAnimations
                | PreferenceKey::HighlightLinks
                | PreferenceKey::HighlightButtons
                | PreferenceKey::LargeCursor
                | PreferenceKey::ReadingMode
        )
    }
}

/// The complete set of presentation preferences.
///
/// Invariants:
/// - `high_contrast == (contrast_mode == ContrastMode::High)`
/// - `speech_rate` lies within `[MIN_SPEECH_RATE, MAX_SPEECH_RATE]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceState {
    pub font_size: FontSize,
    pub contrast_mode: ContrastMode,
    pub high_contrast: bool,
    pub reduce_animations: bool,
    pub text_spacing: TextSpacing,
    pub font_family: FontFamily,
    pub highlight_links: bool,
    pub highlight_buttons: bool,
    pub large_cursor: bool,
    pub reading_mode: bool,
    pub voice_gender: VoiceGender,
    pub speech_rate: f64,
}

impl Default for PreferenceState {
    fn default() -> Self {
        Self {
            font_size: FontSize::Normal,
            contrast_mode: ContrastMode::Normal,
            high_contrast: false,
            reduce_animations: false,
            text_spacing: TextSpacing::Normal,
            font_family: FontFamily::Standard,
            highlight_links: false,
            highlight_buttons: false,
            large_cursor: false,
            reading_mode: false,
            voice_gender: VoiceGender::Female,
            speech_rate: DEFAULT_SPEECH_RATE,
        }
    }
}

impl PreferenceState {
    /// Set contrast through the mode, keeping `high_contrast` in step.
    pub(crate) fn set_contrast(&mut self, mode: ContrastMode) {
        self.contrast_mode = mode;
        self.high_contrast = mode == ContrastMode::High;
    }

    /// Re-establish both invariants, treating `contrast_mode` as authoritative.
    pub(crate) fn normalize(&mut self) {
        self.set_contrast(self.contrast_mode);
        self.speech_rate = clamp_speech_rate(self.speech_rate);
    }

    /// Whether the record satisfies its invariants.
    pub fn is_consistent(&self) -> bool {
        self.high_contrast == (self.contrast_mode == ContrastMode::High)
            && (MIN_SPEECH_RATE..=MAX_SPEECH_RATE).contains(&self.speech_rate)
    }

    /// Render one field as text.
    pub fn value_of(&self, key: PreferenceKey) -> String {
        match key {
            PreferenceKey::FontSize => self.font_size.to_string(),
            PreferenceKey::ContrastMode => self.contrast_mode.to_string(),
            PreferenceKey::HighContrast => self.high_contrast.to_string(),
            PreferenceKey::ReduceAnimations => self.reduce_animations.to_string(),
            PreferenceKey::TextSpacing => self.text_spacing.to_string(),
            PreferenceKey::FontFamily => self.font_family.to_string(),
            PreferenceKey::HighlightLinks => self.highlight_links.to_string(),
            PreferenceKey::HighlightButtons => self.highlight_buttons.to_string(),
            PreferenceKey::LargeCursor => self.large_cursor.to_string(),
            PreferenceKey::ReadingMode => self.reading_mode.to_string(),
            PreferenceKey::VoiceGender => self.voice_gender.to_string(),
            PreferenceKey::SpeechRate => self.speech_rate.to_string(),
        }
    }
}

fn pick<T: DeserializeOwned>(
    obj: &serde_json::Map<String, serde_json::Value>,
    key: PreferenceKey,
) -> Option<T> {
    obj.get(key.as_str())
        .and_then(|value| T::deserialize(value).ok())
}

/// Reconcile a loaded (possibly older-shaped or damaged) record with the
/// compiled-in defaults.
///
/// Every known key whose value has the right type overrides the default;
/// unknown keys and wrong-typed values are ignored. Anything that is not a
/// JSON object yields the defaults. When both contrast fields are present and
/// disagree, `contrastMode` wins. The result always satisfies the invariants.
pub fn merge(defaults: &PreferenceState, loaded: &serde_json::Value) -> PreferenceState {
    let mut state = defaults.clone();
    let Some(obj) = loaded.as_object() else {
        state.normalize();
        return state;
    };

    if let Some(v) = pick(obj, PreferenceKey::FontSize) {
        state.font_size = v;
    }
    if let Some(v) = pick(obj, PreferenceKey::ReduceAnimations) {
        state.reduce_animations = v;
    }
    if let Some(v) = pick(obj, PreferenceKey::TextSpacing) {
        state.text_spacing = v;
    }
    if let Some(v) = pick(obj, PreferenceKey::FontFamily) {
        state.font_family = v;
    }
    if let Some(v) = pick(obj, PreferenceKey::HighlightLinks) {
        state.highlight_links = v;
    }
    if let Some(v) = pick(obj, PreferenceKey::HighlightButtons) {
        state.highlight_buttons = v;
    }
    if let Some(v) = pick(obj, PreferenceKey::LargeCursor) {
        state.large_cursor = v;
    }
    if let Some(v) = pick(obj, PreferenceKey::ReadingMode) {
        state.reading_mode = v;
    }
    if let Some(v) = pick(obj, PreferenceKey::VoiceGender) {
        state.voice_gender = v;
    }
    if let Some(v) = pick(obj, PreferenceKey::SpeechRate) {
        state.speech_rate = v;
    }

    let mode: Option<ContrastMode> = pick(obj, PreferenceKey::ContrastMode);
    let high: Option<bool> = pick(obj, PreferenceKey::HighContrast);
    match (mode, high) {
        (Some(mode), _) => state.set_contrast(mode),
        (None, Some(true)) => state.set_contrast(ContrastMode::High),
        (None, Some(false)) => state.set_contrast(ContrastMode::Normal),
        (None, None) => {}
    }

    state.normalize();
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_consistent_and_off() {
        let d = PreferenceState::default();
        assert!(d.is_consistent());
        assert_eq!(d.font_size, FontSize::Normal);
        assert!(!d.high_contrast);
        assert!(!d.reading_mode);
        assert_eq!(d.speech_rate, 1.0);
    }

    #[test]
    fn serializes_with_persisted_names() {
        let mut state = PreferenceState::default();
        state.font_size = FontSize::ExtraLarge;
        state.font_family = FontFamily::DyslexiaFriendly;
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["fontSize"], "extra-large");
        assert_eq!(json["fontFamily"], "dyslexia-friendly");
        assert_eq!(json["contrastMode"], "normal");
        assert_eq!(json["speechRate"], 1.0);
    }

    #[test]
    fn merge_fills_missing_fields_from_defaults() {
        // A record written before voice settings existed.
        let old = json!({ "fontSize": "large", "reduceAnimations": true });
        let merged = merge(&PreferenceState::default(), &old);
        assert_eq!(merged.font_size, FontSize::Large);
        assert!(merged.reduce_animations);
        assert_eq!(merged.voice_gender, VoiceGender::Female);
        assert_eq!(merged.speech_rate, DEFAULT_SPEECH_RATE);
    }

    #[test]
    fn merge_ignores_unknown_and_wrong_typed_values() {
        let loaded = json!({
            "fontSize": 3,
            "textSpacing": "huge",
            "largeCursor": "yes",
            "readingMode": true,
            "somethingNew": {"nested": 1}
        });
        let merged = merge(&PreferenceState::default(), &loaded);
        assert_eq!(merged.font_size, FontSize::Normal);
        assert_eq!(merged.text_spacing, TextSpacing::Normal);
        assert!(!merged.large_cursor);
        assert!(merged.reading_mode);
    }

    #[test]
    fn merge_derives_contrast_mode_from_flag() {
        let merged = merge(&PreferenceState::default(), &json!({ "highContrast": true }));
        assert_eq!(merged.contrast_mode, ContrastMode::High);
        assert!(merged.high_contrast);
    }

    #[test]
    fn merge_derives_flag_from_contrast_mode() {
        let merged = merge(&PreferenceState::default(), &json!({ "contrastMode": "high" }));
        assert!(merged.high_contrast);
    }

    #[test]
    fn merge_prefers_contrast_mode_on_conflict() {
        let loaded = json!({ "contrastMode": "normal", "highContrast": true });
        let merged = merge(&PreferenceState::default(), &loaded);
        assert_eq!(merged.contrast_mode, ContrastMode::Normal);
        assert!(!merged.high_contrast);
    }

    #[test]
    fn merge_clamps_speech_rate() {
        let merged = merge(&PreferenceState::default(), &json!({ "speechRate": 9 }));
        assert_eq!(merged.speech_rate, MAX_SPEECH_RATE);
        let merged = merge(&PreferenceState::default(), &json!({ "speechRate": 0.1 }));
        assert_eq!(merged.speech_rate, MIN_SPEECH_RATE);
    }

    #[test]
    fn merge_of_non_objects_is_defaults() {
        for v in [json!(null), json!([1, 2]), json!("x"), json!(42), json!({})] {
            assert_eq!(merge(&PreferenceState::default(), &v), PreferenceState::default());
        }
    }

    #[test]
    fn clamp_handles_extremes() {
        assert_eq!(clamp_speech_rate(f64::INFINITY), MAX_SPEECH_RATE);
        assert_eq!(clamp_speech_rate(f64::NEG_INFINITY), MIN_SPEECH_RATE);
        assert_eq!(clamp_speech_rate(f64::NAN), DEFAULT_SPEECH_RATE);
        assert_eq!(clamp_speech_rate(1.25), 1.25);
    }

    #[test]
    fn keys_parse_in_both_spellings() {
        assert_eq!(PreferenceKey::parse("fontSize").unwrap(), PreferenceKey::FontSize);
        assert_eq!(PreferenceKey::parse("font-size").unwrap(), PreferenceKey::FontSize);
        assert_eq!(
            PreferenceKey::parse("high-contrast").unwrap(),
            PreferenceKey::HighContrast
        );
        assert!(PreferenceKey::parse("font_size").is_err());
    }

    #[test]
    fn enum_text_roundtrip() {
        for size in FontSize::ALL {
            assert_eq!(size.as_str().parse::<FontSize>().unwrap(), *size);
        }
        assert!("tiny".parse::<FontSize>().is_err());
    }
}
