//! Integration tests for the preference engine and presentation modes.
//!
//! Property tests cover merge totality, contrast consistency and the speech
//! rate clamp; the rest walk the engine → surface pipeline end to end.

use std::cell::RefCell;
use std::rc::Rc;

use ease_core::preferences::{merge, MAX_SPEECH_RATE, MIN_SPEECH_RATE};
use ease_core::storage::PREFERENCES_KEY;
use ease_core::{
    apply, to_directives, ClassListSurface, ContrastMode, FontSize, JsonFileStore, KeyValueStore,
    MemoryStore, PreferenceEngine, PreferenceState, PreferenceStore, PresentationApplier,
    SqliteStore, Surface,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn memory_engine() -> PreferenceEngine {
    PreferenceEngine::load(PreferenceStore::new(MemoryStore::new()))
}

fn field_names(v: &Value) -> Vec<String> {
    let mut keys: Vec<String> = v
        .as_object()
        .map(|o| o.keys().cloned().collect())
        .unwrap_or_default();
    keys.sort();
    keys
}

fn arb_key() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("fontSize".to_string()),
        Just("contrastMode".to_string()),
        Just("highContrast".to_string()),
        Just("speechRate".to_string()),
        Just("textSpacing".to_string()),
        Just("readingMode".to_string()),
        Just("voiceGender".to_string()),
        "[a-zA-Z]{1,10}",
    ]
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        (-10.0f64..10.0).prop_map(|n| json!(n)),
        "[a-z-]{0,12}".prop_map(Value::String),
        prop_oneof![
            Just(json!("large")),
            Just(json!("extra-large")),
            Just(json!("high")),
            Just(json!("dyslexia-friendly")),
            Just(json!("male")),
        ],
    ];
    leaf.prop_recursive(3, 24, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(arb_key(), inner, 0..8)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

#[derive(Debug, Clone)]
enum ContrastOp {
    Set(ContrastMode),
    Toggle,
}

fn arb_contrast_op() -> impl Strategy<Value = ContrastOp> {
    prop_oneof![
        Just(ContrastOp::Set(ContrastMode::Normal)),
        Just(ContrastOp::Set(ContrastMode::High)),
        Just(ContrastOp::Toggle),
    ]
}

proptest! {
    #[test]
    fn merge_is_total_and_consistent(loaded in arb_json()) {
        let defaults = PreferenceState::default();
        let merged = merge(&defaults, &loaded);
        prop_assert!(merged.is_consistent());
        prop_assert_eq!(
            field_names(&serde_json::to_value(&merged).unwrap()),
            field_names(&serde_json::to_value(&defaults).unwrap())
        );
    }

    #[test]
    fn contrast_fields_never_disagree(ops in prop::collection::vec(arb_contrast_op(), 0..32)) {
        let mut engine = memory_engine();
        for op in ops {
            match op {
                ContrastOp::Set(mode) => engine.set_contrast_mode(mode),
                ContrastOp::Toggle => engine.toggle_high_contrast(),
            }
            let s = engine.state();
            prop_assert_eq!(s.high_contrast, s.contrast_mode == ContrastMode::High);
        }
    }

    #[test]
    fn speech_rate_is_clamped(rate in prop::num::f64::NORMAL | prop::num::f64::INFINITE | prop::num::f64::ZERO) {
        let mut engine = memory_engine();
        engine.set_speech_rate(rate);
        prop_assert_eq!(engine.state().speech_rate, rate.min(MAX_SPEECH_RATE).max(MIN_SPEECH_RATE));
    }

    #[test]
    fn reconciliation_is_idempotent(
        large in any::<bool>(),
        cursor in any::<bool>(),
        contrast in any::<bool>(),
        preexisting in prop::collection::vec("[a-z-]{1,20}", 0..6)
    ) {
        let mut s = PreferenceState::default();
        if large { s.font_size = FontSize::Large; }
        s.large_cursor = cursor;
        if contrast {
            s.contrast_mode = ContrastMode::High;
            s.high_contrast = true;
        }
        let d = to_directives(&s);

        let mut once = ClassListSurface::with_classes(preexisting);
        apply(&mut once, &d);
        let mut twice = once.clone();
        apply(&mut twice, &d);
        prop_assert_eq!(once, twice);
    }
}

#[test]
fn returning_to_normal_font_clears_font_modes() {
    let mut engine = memory_engine();
    let applier = Rc::new(RefCell::new(PresentationApplier::new(ClassListSurface::new())));
    PresentationApplier::attach(&mut engine, Rc::clone(&applier));

    engine.set_font_size(FontSize::Large);
    assert!(applier.borrow().surface().has_mode("font-large"));

    engine.set_font_size(FontSize::Normal);
    let applier = applier.borrow();
    assert!(!applier.surface().has_mode("font-large"));
    assert!(!applier.surface().has_mode("font-extra-large"));
}

#[test]
fn reset_then_state_equals_defaults() {
    let mut engine = memory_engine();
    engine.set_font_size(FontSize::ExtraLarge);
    engine.set_speech_rate(1.75);
    engine.toggle_high_contrast();
    engine.toggle_reading_mode();
    engine.reset_to_defaults();
    assert_eq!(engine.state(), &PreferenceState::default());
}

#[test]
fn older_record_on_disk_is_upgraded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    // Written by a version that knew neither voice settings nor contrastMode.
    let backend = JsonFileStore::new(&path);
    backend
        .set(
            PREFERENCES_KEY,
            r#"{"fontSize":"extra-large","highContrast":true,"legacyTheme":"dark"}"#,
        )
        .unwrap();

    let mut engine = PreferenceEngine::load(PreferenceStore::new(JsonFileStore::new(&path)));
    let s = engine.state().clone();
    assert_eq!(s.font_size, FontSize::ExtraLarge);
    assert_eq!(s.contrast_mode, ContrastMode::High);
    assert_eq!(s.speech_rate, 1.0);

    // The next write stores the complete, current shape.
    engine.toggle_large_cursor();
    let stored: Value =
        serde_json::from_str(&backend.get(PREFERENCES_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(stored["contrastMode"], "high");
    assert_eq!(stored["largeCursor"], true);
    assert!(stored.get("legacyTheme").is_none());
}

#[test]
fn sqlite_backed_engine_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ease.db");
    {
        let mut engine =
            PreferenceEngine::load(PreferenceStore::new(SqliteStore::open(&path).unwrap()));
        engine.set_speech_rate(1.5);
        engine.toggle_highlight_links();
    }
    let engine = PreferenceEngine::load(PreferenceStore::new(SqliteStore::open(&path).unwrap()));
    assert_eq!(engine.state().speech_rate, 1.5);
    assert!(engine.state().highlight_links);
}

#[test]
fn clearing_the_store_resets_next_session() {
    let backend = Rc::new(MemoryStore::new());
    let store = PreferenceStore::new(Rc::clone(&backend));
    let mut engine = PreferenceEngine::load(store);
    engine.toggle_animations();

    PreferenceStore::new(Rc::clone(&backend)).clear().unwrap();
    let engine = PreferenceEngine::load(PreferenceStore::new(Rc::clone(&backend)));
    assert_eq!(engine.state(), &PreferenceState::default());
}
