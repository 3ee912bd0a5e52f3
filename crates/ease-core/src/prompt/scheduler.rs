//! Per-subject prompt scheduling backed by a key/value store.
//!
//! Each subject uses up to three keys:
//!
//! ```text
//! prompt:<subject>:answered           "true" or absent
//! prompt:<subject>:last-answer-at     RFC 3339 timestamp or absent
//! prompt:<subject>:last-dismissed-at  RFC 3339 timestamp or absent
//! ```
//!
//! The scheduler caches every subject it has touched. Once cached, the
//! in-memory state is authoritative: a failed write is logged and the
//! subject keeps its answered/dismissed state for the rest of the process.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::decision::{should_prompt, PromptDecision, PromptPolicy, PromptState};
use crate::error::StoreError;
use crate::storage::KeyValueStore;

fn key(subject: &str, field: &str) -> String {
    format!("prompt:{subject}:{field}")
}

const ANSWERED: &str = "answered";
const LAST_ANSWER_AT: &str = "last-answer-at";
const LAST_DISMISSED_AT: &str = "last-dismissed-at";

pub struct PromptScheduler<S> {
    store: S,
    policy: PromptPolicy,
    subjects: HashMap<String, PromptState>,
}

impl<S: KeyValueStore> PromptScheduler<S> {
    pub fn new(store: S, policy: PromptPolicy) -> Self {
        Self {
            store,
            policy,
            subjects: HashMap::new(),
        }
    }

    pub fn policy(&self) -> &PromptPolicy {
        &self.policy
    }

    /// Current state of `subject`, loading it on first use.
    pub fn state(&mut self, subject: &str) -> &PromptState {
        self.entry(subject)
    }

    pub fn should_prompt(&mut self, subject: &str, now: DateTime<Utc>) -> PromptDecision {
        let policy = self.policy;
        let decision = should_prompt(now, self.entry(subject), &policy);
        debug!(subject, show = decision.show, reason = ?decision.reason, "prompt decision");
        decision
    }

    /// Record that `subject` answered at `now`.
    pub fn record_answer(&mut self, subject: &str, now: DateTime<Utc>) {
        let state = self.entry(subject);
        state.has_answered = true;
        state.last_answer_at = Some(now);

        // Timestamp first: a lone timestamp loads as answered, a lone flag
        // would load as due.
        let result = self
            .store
            .set(&key(subject, LAST_ANSWER_AT), &now.to_rfc3339())
            .and_then(|_| self.store.set(&key(subject, ANSWERED), "true"));
        log_write(subject, "answer", result);
    }

    /// Record that `subject` dismissed the prompt at `now`.
    pub fn record_dismissal(&mut self, subject: &str, now: DateTime<Utc>) {
        self.entry(subject).last_dismissed_at = Some(now);

        let result = self
            .store
            .set(&key(subject, LAST_DISMISSED_AT), &now.to_rfc3339());
        log_write(subject, "dismissal", result);
    }

    /// Forget everything about `subject`, in memory and in the store.
    ///
    /// # Errors
    /// Returns the first store error; the in-memory state is cleared anyway.
    pub fn forget(&mut self, subject: &str) -> Result<(), StoreError> {
        self.subjects
            .insert(subject.to_string(), PromptState::default());
        for field in [ANSWERED, LAST_ANSWER_AT, LAST_DISMISSED_AT] {
            self.store.remove(&key(subject, field))?;
        }
        Ok(())
    }

    fn entry(&mut self, subject: &str) -> &mut PromptState {
        let store = &self.store;
        self.subjects
            .entry(subject.to_string())
            .or_insert_with(|| load(store, subject))
    }
}

fn load<S: KeyValueStore>(store: &S, subject: &str) -> PromptState {
    let read = |field: &str| match store.get(&key(subject, field)) {
        Ok(value) => value,
        Err(e) => {
            warn!(subject, field, error = %e, "failed to read prompt state");
            None
        }
    };

    let last_answer_at = read(LAST_ANSWER_AT).and_then(|raw| parse_timestamp(subject, &raw));
    let last_dismissed_at =
        read(LAST_DISMISSED_AT).and_then(|raw| parse_timestamp(subject, &raw));
    let has_answered = read(ANSWERED).as_deref() == Some("true") || last_answer_at.is_some();

    PromptState {
        has_answered,
        last_answer_at,
        last_dismissed_at,
    }
}

fn parse_timestamp(subject: &str, raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(at) => Some(at.with_timezone(&Utc)),
        Err(e) => {
            warn!(subject, value = raw, error = %e, "ignoring malformed prompt timestamp");
            None
        }
    }
}

fn log_write(subject: &str, what: &str, result: Result<(), StoreError>) {
    if let Err(e) = result {
        warn!(subject, what, error = %e, "failed to persist prompt state; keeping it in memory");
    }
}
