//! Periodic one-question prompt: the decision function and the per-subject
//! scheduler that persists answers and dismissals.

pub mod decision;
pub mod scheduler;

pub use decision::{
    elapsed_days, should_prompt, DayRounding, PromptDecision, PromptPolicy, PromptReason,
    PromptState, DAY_MS,
};
pub use scheduler::PromptScheduler;
