use clap::Subcommand;
use ease_core::{Config, PromptScheduler};

use super::{resolve_now, shared_store};

#[derive(Subcommand)]
pub enum PromptAction {
    /// Decide whether the prompt should be shown to a subject
    Check {
        /// Subject identifier (e.g. an account id)
        subject: String,
        /// Evaluate at this RFC 3339 time instead of now
        #[arg(long)]
        at: Option<String>,
        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record that a subject answered the prompt
    Answer {
        subject: String,
        #[arg(long)]
        at: Option<String>,
    },
    /// Record that a subject dismissed the prompt
    Dismiss {
        subject: String,
        #[arg(long)]
        at: Option<String>,
    },
    /// Forget a subject's prompt history
    Forget { subject: String },
}

pub fn run(action: PromptAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = shared_store(config)?;
    let mut scheduler = PromptScheduler::new(store, config.prompt.policy());

    match action {
        PromptAction::Check { subject, at, json } => {
            let now = resolve_now(at.as_deref())?;
            let decision = scheduler.should_prompt(&subject, now);
            if json {
                println!("{}", serde_json::to_string_pretty(&decision)?);
            } else {
                let verdict = if decision.show { "show" } else { "hide" };
                println!("{verdict} ({})", decision.reason.as_str());
            }
        }
        PromptAction::Answer { subject, at } => {
            let now = resolve_now(at.as_deref())?;
            scheduler.record_answer(&subject, now);
            println!("answer recorded for {subject}");
        }
        PromptAction::Dismiss { subject, at } => {
            let now = resolve_now(at.as_deref())?;
            scheduler.record_dismissal(&subject, now);
            println!("dismissal recorded for {subject}");
        }
        PromptAction::Forget { subject } => {
            scheduler.forget(&subject)?;
            println!("prompt history cleared for {subject}");
        }
    }
    Ok(())
}
