//! Presentation modes derived from preferences.
//!
//! Two steps, kept apart so the second can be tested without a renderer:
//!
//! - [`to_directives`] maps a [`PreferenceState`] to the set of named modes
//!   that should be active (pure).
//! - [`apply`] reconciles a mutable [`Surface`] to exactly that set.
//!
//! Modes are grouped in families, one per preference field. Reconciliation
//! clears every family member that is not wanted before adding the wanted
//! ones, so switching `fontSize` from `large` back to `normal` removes
//! `font-large` instead of leaving it behind.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use crate::preferences::{
    ContrastMode, FontFamily, FontSize, PreferenceEngine, PreferenceState, Snapshot,
    SubscriptionId, TextSpacing,
};

/// A named presentation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Mode {
    FontLarge,
    FontExtraLarge,
    HighContrast,
    ReduceAnimations,
    TextSpacingLarge,
    TextSpacingExtraLarge,
    DyslexiaFont,
    HighlightLinks,
    HighlightButtons,
    LargeCursor,
    ReadingMode,
}

impl Mode {
    pub const ALL: [Mode; 11] = [
        Mode::FontLarge,
        Mode::FontExtraLarge,
        Mode::HighContrast,
        Mode::ReduceAnimations,
        Mode::TextSpacingLarge,
        Mode::TextSpacingExtraLarge,
        Mode::DyslexiaFont,
        Mode::HighlightLinks,
        Mode::HighlightButtons,
        Mode::LargeCursor,
        Mode::ReadingMode,
    ];

    /// Name as it appears on the surface (a CSS class, typically).
    pub fn name(self) -> &'static str {
        match self {
            Mode::FontLarge => "font-large",
            Mode::FontExtraLarge => "font-extra-large",
            Mode::HighContrast => "high-contrast",
            Mode::ReduceAnimations => "reduce-animations",
            Mode::TextSpacingLarge => "text-spacing-large",
            Mode::TextSpacingExtraLarge => "text-spacing-extra-large",
            Mode::DyslexiaFont => "dyslexia-font",
            Mode::HighlightLinks => "highlight-links",
            Mode::HighlightButtons => "highlight-buttons",
            Mode::LargeCursor => "large-cursor",
            Mode::ReadingMode => "reading-mode",
        }
    }

    pub fn family(self) -> ModeFamily {
        match self {
            Mode::FontLarge | Mode::FontExtraLarge => ModeFamily::FontSize,
            Mode::HighContrast => ModeFamily::Contrast,
            Mode::ReduceAnimations => ModeFamily::Motion,
            Mode::TextSpacingLarge | Mode::TextSpacingExtraLarge => ModeFamily::TextSpacing,
            Mode::DyslexiaFont => ModeFamily::FontFamily,
            Mode::HighlightLinks => ModeFamily::Links,
            Mode::HighlightButtons => ModeFamily::Buttons,
            Mode::LargeCursor => ModeFamily::Cursor,
            Mode::ReadingMode => ModeFamily::Reading,
        }
    }

    pub fn from_name(name: &str) -> Option<Mode> {
        Mode::ALL.into_iter().find(|m| m.name() == name)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mutually exclusive group of modes driven by one preference field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeFamily {
    FontSize,
    Contrast,
    Motion,
    TextSpacing,
    FontFamily,
    Links,
    Buttons,
    Cursor,
    Reading,
}

impl ModeFamily {
    pub const ALL: [ModeFamily; 9] = [
        ModeFamily::FontSize,
        ModeFamily::Contrast,
        ModeFamily::Motion,
        ModeFamily::TextSpacing,
        ModeFamily::FontFamily,
        ModeFamily::Links,
        ModeFamily::Buttons,
        ModeFamily::Cursor,
        ModeFamily::Reading,
    ];

    pub fn members(self) -> impl Iterator<Item = Mode> {
        Mode::ALL.into_iter().filter(move |m| m.family() == self)
    }
}

/// The set of modes that should be active.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives(BTreeSet<Mode>);

impl Directives {
    pub fn contains(&self, mode: Mode) -> bool {
        self.0.contains(&mode)
    }

    pub fn iter(&self) -> impl Iterator<Item = Mode> + '_ {
        self.0.iter().copied()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(Mode::name).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Mode> for Directives {
    fn from_iter<I: IntoIterator<Item = Mode>>(iter: I) -> Self {
        Directives(iter.into_iter().collect())
    }
}

/// Map preferences to modes; at most one mode per family.
pub fn to_directives(state: &PreferenceState) -> Directives {
    let font = match state.font_size {
        FontSize::Normal => None,
        FontSize::Large => Some(Mode::FontLarge),
        FontSize::ExtraLarge => Some(Mode::FontExtraLarge),
    };
    let spacing = match state.text_spacing {
        TextSpacing::Normal => None,
        TextSpacing::Large => Some(Mode::TextSpacingLarge),
        TextSpacing::ExtraLarge => Some(Mode::TextSpacingExtraLarge),
    };
    let contrast = state.high_contrast || state.contrast_mode == ContrastMode::High;

    [
        font,
        spacing,
        contrast.then_some(Mode::HighContrast),
        state.reduce_animations.then_some(Mode::ReduceAnimations),
        (state.font_family == FontFamily::DyslexiaFriendly).then_some(Mode::DyslexiaFont),
        state.highlight_links.then_some(Mode::HighlightLinks),
        state.highlight_buttons.then_some(Mode::HighlightButtons),
        state.large_cursor.then_some(Mode::LargeCursor),
        state.reading_mode.then_some(Mode::ReadingMode),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// The mutable thing modes are applied to.
pub trait Surface {
    fn has_mode(&self, name: &str) -> bool;
    fn add_mode(&mut self, name: &str);
    fn remove_mode(&mut self, name: &str);
}

/// Make `surface` carry exactly `directives` within the known families.
///
/// Names on the surface that belong to no family are left alone. Calling
/// this twice with the same directives changes nothing the second time.
pub fn apply<S: Surface + ?Sized>(surface: &mut S, directives: &Directives) {
    for family in ModeFamily::ALL {
        for mode in family.members() {
            if !directives.contains(mode) && surface.has_mode(mode.name()) {
                surface.remove_mode(mode.name());
            }
        }
    }
    for mode in directives.iter() {
        if !surface.has_mode(mode.name()) {
            surface.add_mode(mode.name());
        }
    }
}

/// Ordered class list held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassListSurface {
    classes: Vec<String>,
}

impl ClassListSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from classes that are already present.
    pub fn with_classes<I, T>(classes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut surface = Self::new();
        for class in classes {
            surface.add_mode(&class.into());
        }
        surface
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

impl Surface for ClassListSurface {
    fn has_mode(&self, name: &str) -> bool {
        self.classes.iter().any(|c| c == name)
    }

    fn add_mode(&mut self, name: &str) {
        if !self.has_mode(name) {
            self.classes.push(name.to_string());
        }
    }

    fn remove_mode(&mut self, name: &str) {
        self.classes.retain(|c| c != name);
    }
}

/// Keeps a surface reconciled with the snapshots an engine emits.
///
/// Snapshots older than the last one applied are ignored.
pub struct PresentationApplier<S> {
    surface: S,
    last_revision: Option<u64>,
}

impl<S: Surface> PresentationApplier<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            last_revision: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn last_revision(&self) -> Option<u64> {
        self.last_revision
    }

    /// Reconcile the surface with one snapshot. Returns `false` if the
    /// snapshot was stale and skipped.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) -> bool {
        if self.last_revision.is_some_and(|last| snapshot.revision < last) {
            tracing::debug!(revision = snapshot.revision, "skipping stale snapshot");
            return false;
        }
        apply(&mut self.surface, &to_directives(&snapshot.state));
        self.last_revision = Some(snapshot.revision);
        true
    }
}

impl<S: Surface + 'static> PresentationApplier<S> {
    /// Apply the engine's current state now and after every later mutation.
    pub fn attach(
        engine: &mut PreferenceEngine,
        applier: Rc<RefCell<PresentationApplier<S>>>,
    ) -> SubscriptionId {
        applier.borrow_mut().apply_snapshot(&engine.snapshot());
        engine.subscribe(move |snapshot| {
            applier.borrow_mut().apply_snapshot(snapshot);
        })
    }
}
