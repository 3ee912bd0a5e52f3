//! Preference commands.
//!
//! Each invocation builds one engine from the configured store, applies the
//! requested change through it and reports the result.

use std::cell::RefCell;
use std::rc::Rc;

use clap::Subcommand;
use ease_core::{
    ClassListSurface, Config, PreferenceEngine, PreferenceKey, PreferenceStore,
    PresentationApplier,
};

use super::shared_store;

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Show all preferences
    Show {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Get one preference (e.g. "font-size", "speechRate")
    Get { key: String },
    /// Set one preference
    Set {
        /// Preference name
        key: String,
        /// New value (e.g. "large", "true", "1.5")
        value: String,
    },
    /// Flip an on/off preference (e.g. "high-contrast", "reading-mode")
    Toggle { key: String },
    /// Reset all preferences to defaults
    Reset,
    /// List the presentation modes the current preferences activate
    Modes,
}

pub fn run(action: PrefsAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = shared_store(config)?;
    let mut engine = PreferenceEngine::load(PreferenceStore::new(store));

    match action {
        PrefsAction::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
            } else {
                for key in PreferenceKey::ALL {
                    println!("{:<18} {}", key.kebab_name(), engine.state().value_of(*key));
                }
            }
        }
        PrefsAction::Get { key } => {
            let key = PreferenceKey::parse(&key)?;
            println!("{}", engine.state().value_of(key));
        }
        PrefsAction::Set { key, value } => {
            let key = PreferenceKey::parse(&key)?;
            engine.set_field(key, &value)?;
            println!("{} = {}", key.kebab_name(), engine.state().value_of(key));
        }
        PrefsAction::Toggle { key } => {
            let key = PreferenceKey::parse(&key)?;
            engine.toggle(key)?;
            println!("{} = {}", key.kebab_name(), engine.state().value_of(key));
        }
        PrefsAction::Reset => {
            engine.reset_to_defaults();
            println!("preferences reset to defaults");
        }
        PrefsAction::Modes => {
            let applier = Rc::new(RefCell::new(PresentationApplier::new(ClassListSurface::new())));
            PresentationApplier::attach(&mut engine, Rc::clone(&applier));
            let applier = applier.borrow();
            let classes = applier.surface().classes();
            if classes.is_empty() {
                println!("(none)");
            }
            for class in classes {
                println!("{class}");
            }
        }
    }
    Ok(())
}
