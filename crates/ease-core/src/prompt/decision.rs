//! Pure decision logic for the periodic one-question prompt.
//!
//! ```text
//! never answered ──► show, unless dismissed within the cooldown
//! answered ────────► hide for `reprompt_after_days`, then as above
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Milliseconds in one day bucket.
pub const DAY_MS: i64 = 86_400_000;

/// How a partial day of elapsed time is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayRounding {
    /// Only whole elapsed days count: 23h is 0 days, 24h is 1.
    #[default]
    Floor,
    /// Any started day counts: 1ms is 1 day, 24h is 1, 24h+1ms is 2.
    Ceil,
}

/// Whole days between `then` and `now`. Time running backwards counts as 0.
pub fn elapsed_days(now: DateTime<Utc>, then: DateTime<Utc>, rounding: DayRounding) -> i64 {
    let ms = (now - then).num_milliseconds();
    if ms <= 0 {
        return 0;
    }
    match rounding {
        DayRounding::Floor => ms / DAY_MS,
        DayRounding::Ceil => (ms + DAY_MS - 1) / DAY_MS,
    }
}

/// Persisted prompt history of one subject.
///
/// `last_answer_at` is only ever set together with `has_answered`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptState {
    pub has_answered: bool,
    pub last_answer_at: Option<DateTime<Utc>>,
    pub last_dismissed_at: Option<DateTime<Utc>>,
}

impl PromptState {
    pub fn answered(mut self, at: DateTime<Utc>) -> Self {
        self.has_answered = true;
        self.last_answer_at = Some(at);
        self
    }

    pub fn dismissed(mut self, at: DateTime<Utc>) -> Self {
        self.last_dismissed_at = Some(at);
        self
    }
}

/// Timing rules for the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPolicy {
    /// Days after an answer before asking again.
    pub reprompt_after_days: i64,
    /// Days a dismissal keeps the prompt hidden.
    pub dismissal_cooldown_days: i64,
    pub rounding: DayRounding,
}

impl Default for PromptPolicy {
    fn default() -> Self {
        Self {
            reprompt_after_days: 7,
            dismissal_cooldown_days: 1,
            rounding: DayRounding::Floor,
        }
    }
}

/// Why the prompt is or is not shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptReason {
    /// Never answered and not recently dismissed.
    FirstAsk,
    /// Answered long enough ago to ask again.
    Due,
    /// Answered within the re-prompt interval.
    AnsweredRecently,
    /// Dismissed within the cooldown.
    DismissedRecently,
}

impl PromptReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstAsk => "first-ask",
            Self::Due => "due",
            Self::AnsweredRecently => "answered-recently",
            Self::DismissedRecently => "dismissed-recently",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PromptDecision {
    pub show: bool,
    pub reason: PromptReason,
}

impl PromptDecision {
    fn show(reason: PromptReason) -> Self {
        Self { show: true, reason }
    }

    fn hide(reason: PromptReason) -> Self {
        Self {
            show: false,
            reason,
        }
    }
}

/// Decide whether the prompt should be shown at `now`.
pub fn should_prompt(now: DateTime<Utc>, state: &PromptState, policy: &PromptPolicy) -> PromptDecision {
    let dismissed_recently = state
        .last_dismissed_at
        .is_some_and(|at| elapsed_days(now, at, policy.rounding) < policy.dismissal_cooldown_days);

    if state.has_answered {
        // An answered state without a timestamp is treated as answered long ago.
        let recently = state
            .last_answer_at
            .is_some_and(|at| elapsed_days(now, at, policy.rounding) < policy.reprompt_after_days);
        if recently {
            return PromptDecision::hide(PromptReason::AnsweredRecently);
        }
        if dismissed_recently {
            return PromptDecision::hide(PromptReason::DismissedRecently);
        }
        return PromptDecision::show(PromptReason::Due);
    }

    if dismissed_recently {
        PromptDecision::hide(PromptReason::DismissedRecently)
    } else {
        PromptDecision::show(PromptReason::FirstAsk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 15, 0, 0).unwrap()
    }

    fn policy() -> PromptPolicy {
        PromptPolicy::default()
    }

    #[test]
    fn elapsed_days_floor_and_ceil() {
        let n = now();
        assert_eq!(elapsed_days(n, n, DayRounding::Floor), 0);
        assert_eq!(elapsed_days(n, n, DayRounding::Ceil), 0);

        let one_ms = n - Duration::milliseconds(1);
        assert_eq!(elapsed_days(n, one_ms, DayRounding::Floor), 0);
        assert_eq!(elapsed_days(n, one_ms, DayRounding::Ceil), 1);

        let day = n - Duration::days(1);
        assert_eq!(elapsed_days(n, day, DayRounding::Floor), 1);
        assert_eq!(elapsed_days(n, day, DayRounding::Ceil), 1);

        let over = day - Duration::milliseconds(1);
        assert_eq!(elapsed_days(n, over, DayRounding::Floor), 1);
        assert_eq!(elapsed_days(n, over, DayRounding::Ceil), 2);
    }

    #[test]
    fn future_timestamps_count_as_zero() {
        let n = now();
        assert_eq!(elapsed_days(n, n + Duration::days(3), DayRounding::Ceil), 0);
    }

    #[test]
    fn fresh_subject_is_asked() {
        let d = should_prompt(now(), &PromptState::default(), &policy());
        assert_eq!(d, PromptDecision::show(PromptReason::FirstAsk));
    }

    #[test]
    fn dismissal_suppresses_for_a_day() {
        let n = now();
        let same = PromptState::default().dismissed(n);
        assert!(!should_prompt(n, &same, &policy()).show);

        let earlier_today = PromptState::default().dismissed(n - Duration::hours(5));
        assert!(!should_prompt(n, &earlier_today, &policy()).show);

        let two_days = PromptState::default().dismissed(n - Duration::days(2));
        assert!(should_prompt(n, &two_days, &policy()).show);
    }

    #[test]
    fn answer_suppresses_for_a_week() {
        let n = now();
        let six = PromptState::default().answered(n - Duration::days(6));
        assert_eq!(
            should_prompt(n, &six, &policy()),
            PromptDecision::hide(PromptReason::AnsweredRecently)
        );

        let seven = PromptState::default().answered(n - Duration::milliseconds(7 * DAY_MS));
        assert_eq!(
            should_prompt(n, &seven, &policy()),
            PromptDecision::show(PromptReason::Due)
        );
    }

    #[test]
    fn overdue_reprompt_still_respects_same_day_dismissal() {
        let n = now();
        let state = PromptState::default()
            .answered(n - Duration::days(8))
            .dismissed(n - Duration::hours(2));
        assert_eq!(
            should_prompt(n, &state, &policy()),
            PromptDecision::hide(PromptReason::DismissedRecently)
        );
    }

    #[test]
    fn ceil_rounding_counts_partial_days() {
        let n = now();
        let ceil = PromptPolicy {
            rounding: DayRounding::Ceil,
            ..PromptPolicy::default()
        };
        let same = PromptState::default().dismissed(n);
        assert!(!should_prompt(n, &same, &ceil).show);

        let hours_ago = PromptState::default().dismissed(n - Duration::hours(2));
        assert!(should_prompt(n, &hours_ago, &ceil).show);

        let six_and_a_bit = PromptState::default().answered(n - Duration::days(6) - Duration::hours(1));
        assert!(should_prompt(n, &six_and_a_bit, &ceil).show);
    }

    #[test]
    fn answered_without_timestamp_is_due() {
        let state = PromptState {
            has_answered: true,
            ..PromptState::default()
        };
        assert_eq!(
            should_prompt(now(), &state, &policy()).reason,
            PromptReason::Due
        );
    }
}
