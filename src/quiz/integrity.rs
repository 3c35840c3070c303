// src/quiz/integrity.rs

//! Turns host-environment signals into attempt violations and user notices.
//!
//! The monitor never grades. The only thing it can do to an attempt is count a
//! violation or end it with a zero-score record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    config::MAX_INTEGRITY_VIOLATIONS,
    models::completed_quiz::CompletedQuizRecord,
    quiz::attempt::{Attempt, AttemptError, AttemptStatus, Violation},
};

pub const EXIT_CONFIRMATION: &str =
    "Warning: Leaving the quiz will result in a score of 0%. Are you sure you want to exit?";
pub const CLOSE_CONFIRMATION: &str = "Leaving or refreshing this page will submit your quiz with a score of 0%. Are you sure you want to leave?";
pub const EXIT_NOTICE: &str = "You left the quiz. It has been submitted with a score of 0%.";

/// Environment signal reported by the quiz page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityEvent {
    /// The quiz tab became hidden.
    VisibilityLost,
    /// The quiz tab is visible again.
    VisibilityRestored,
    /// The browser tried to navigate back. `confirmed` once the student accepted the exit prompt.
    BackNavigation {
        #[serde(default)]
        confirmed: bool,
    },
    /// The page is about to close or reload.
    CloseAttempt,
}

/// What the quiz page should do after an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum IntegrityResponse {
    None,
    /// Soft violation, shown once the student is back on the tab.
    Warn {
        message: String,
        violations: u32,
        remaining: u32,
    },
    /// The attempt just ended with a zero score. `notice` is absent while the tab is hidden.
    ForcedZero { notice: Option<String> },
    /// Deferred notice for an attempt forced to zero while the tab was hidden.
    FinalNotice { message: String },
    /// Push the forward history entry back and ask before leaving.
    ConfirmExit {
        message: String,
        reassert_history: bool,
    },
    /// Advisory unload prompt. Nothing is guaranteed to reach the server after it.
    ConfirmClose { message: String },
}

#[derive(Debug)]
pub struct IntegrityOutcome {
    pub response: IntegrityResponse,
    /// Set when this event ended the attempt; the record must be persisted.
    pub finalized: Option<CompletedQuizRecord>,
}

impl IntegrityOutcome {
    fn respond(response: IntegrityResponse) -> Self {
        Self {
            response,
            finalized: None,
        }
    }
}

/// Per-attempt monitor state. Lives next to its attempt, never shared.
#[derive(Debug, Default)]
pub struct IntegrityMonitor {
    hidden: bool,
    pending_warning: Option<(u32, u32)>,
    final_notice_pending: bool,
}

impl IntegrityMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event to `attempt`. Events must be fed one at a time in arrival order.
    pub fn handle(
        &mut self,
        attempt: &mut Attempt,
        event: IntegrityEvent,
        now: DateTime<Utc>,
    ) -> Result<IntegrityOutcome, AttemptError> {
        let in_progress = attempt.status() == AttemptStatus::InProgress;

        match event {
            IntegrityEvent::VisibilityLost => {
                // A second loss without a restore is the same tab switch.
                if self.hidden {
                    return Ok(IntegrityOutcome::respond(IntegrityResponse::None));
                }
                self.hidden = true;
                if !in_progress {
                    return Ok(IntegrityOutcome::respond(IntegrityResponse::None));
                }

                match attempt.record_violation(now)? {
                    Violation::Warning { count, remaining } => {
                        tracing::info!(
                            "Attempt {}: tab switch {} detected",
                            attempt.id(),
                            count
                        );
                        self.pending_warning = Some((count, remaining));
                        Ok(IntegrityOutcome::respond(IntegrityResponse::None))
                    }
                    Violation::Forced(record) => {
                        tracing::warn!(
                            "Attempt {}: tab switch limit reached, forcing zero score",
                            attempt.id()
                        );
                        self.pending_warning = None;
                        self.final_notice_pending = true;
                        Ok(IntegrityOutcome {
                            response: IntegrityResponse::ForcedZero { notice: None },
                            finalized: Some(record),
                        })
                    }
                }
            }
            IntegrityEvent::VisibilityRestored => {
                if !self.hidden {
                    return Ok(IntegrityOutcome::respond(IntegrityResponse::None));
                }
                self.hidden = false;

                if self.final_notice_pending {
                    self.final_notice_pending = false;
                    return Ok(IntegrityOutcome::respond(IntegrityResponse::FinalNotice {
                        message: final_notice(),
                    }));
                }

                let response = match self.pending_warning.take() {
                    Some((violations, remaining)) => IntegrityResponse::Warn {
                        message: warning_message(remaining),
                        violations,
                        remaining,
                    },
                    None => IntegrityResponse::None,
                };
                Ok(IntegrityOutcome::respond(response))
            }
            IntegrityEvent::BackNavigation { confirmed: false } => {
                if !in_progress {
                    return Ok(IntegrityOutcome::respond(IntegrityResponse::None));
                }
                Ok(IntegrityOutcome::respond(IntegrityResponse::ConfirmExit {
                    message: EXIT_CONFIRMATION.to_string(),
                    reassert_history: true,
                }))
            }
            IntegrityEvent::BackNavigation { confirmed: true } => {
                if !in_progress {
                    return Ok(IntegrityOutcome::respond(IntegrityResponse::None));
                }
                tracing::warn!("Attempt {}: student exited the quiz", attempt.id());
                let record = attempt.abandon(now)?;
                Ok(IntegrityOutcome {
                    response: IntegrityResponse::ForcedZero {
                        notice: Some(EXIT_NOTICE.to_string()),
                    },
                    finalized: Some(record),
                })
            }
            IntegrityEvent::CloseAttempt => {
                if !in_progress {
                    return Ok(IntegrityOutcome::respond(IntegrityResponse::None));
                }
                Ok(IntegrityOutcome::respond(IntegrityResponse::ConfirmClose {
                    message: CLOSE_CONFIRMATION.to_string(),
                }))
            }
        }
    }
}

fn warning_message(remaining: u32) -> String {
    format!(
        "Warning: Leaving the quiz tab has been detected! This quiz has anti-cheating measures. You have {} tab switches remaining before automatic submission.",
        remaining
    )
}

fn final_notice() -> String {
    format!(
        "You have switched tabs {} times. The quiz will be submitted with a score of 0% due to potential cheating behavior.",
        MAX_INTEGRITY_VIOLATIONS
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::Question;
    use sqlx::types::Json;

    fn started() -> Attempt {
        let questions = (1..=4)
            .map(|id| Question {
                id,
                instructor_id: 1,
                title: "Capitals".to_string(),
                question: format!("Question {}", id),
                options: Json(vec![
                    "Paris".to_string(),
                    "London".to_string(),
                    "Rome".to_string(),
                    "Berlin".to_string(),
                ]),
                answer: "A".to_string(),
                created_at: None,
                updated_at: None,
            })
            .collect();
        let mut attempt = Attempt::new(42, "Capitals");
        attempt.load(questions).unwrap();
        attempt
    }

    fn send(monitor: &mut IntegrityMonitor, attempt: &mut Attempt, event: IntegrityEvent) -> IntegrityOutcome {
        monitor.handle(attempt, event, Utc::now()).unwrap()
    }

    #[test]
    fn test_warning_is_deferred_until_return() {
        let mut attempt = started();
        let mut monitor = IntegrityMonitor::new();

        let lost = send(&mut monitor, &mut attempt, IntegrityEvent::VisibilityLost);
        assert_eq!(lost.response, IntegrityResponse::None);
        assert_eq!(attempt.violations(), 1);

        let back = send(&mut monitor, &mut attempt, IntegrityEvent::VisibilityRestored);
        match back.response {
            IntegrityResponse::Warn { violations, remaining, message } => {
                assert_eq!(violations, 1);
                assert_eq!(remaining, 2);
                assert!(message.contains("2 tab switches remaining"));
            }
            other => panic!("expected warning, got {:?}", other),
        }
    }

    #[test]
    fn test_repeated_loss_counts_once() {
        let mut attempt = started();
        let mut monitor = IntegrityMonitor::new();
        send(&mut monitor, &mut attempt, IntegrityEvent::VisibilityLost);
        send(&mut monitor, &mut attempt, IntegrityEvent::VisibilityLost);
        assert_eq!(attempt.violations(), 1);

        let restored = send(&mut monitor, &mut attempt, IntegrityEvent::VisibilityRestored);
        assert!(matches!(restored.response, IntegrityResponse::Warn { .. }));
        let again = send(&mut monitor, &mut attempt, IntegrityEvent::VisibilityRestored);
        assert_eq!(again.response, IntegrityResponse::None);
    }

    #[test]
    fn test_third_loss_forces_zero_before_return() {
        let mut attempt = started();
        attempt.select_option(1, 0).unwrap();
        let mut monitor = IntegrityMonitor::new();

        for _ in 0..2 {
            send(&mut monitor, &mut attempt, IntegrityEvent::VisibilityLost);
            send(&mut monitor, &mut attempt, IntegrityEvent::VisibilityRestored);
        }
        let third = send(&mut monitor, &mut attempt, IntegrityEvent::VisibilityLost);
        assert_eq!(third.response, IntegrityResponse::ForcedZero { notice: None });
        let record = third.finalized.expect("forced record");
        assert_eq!(record.score, 0.0);
        assert!(record.tab_switching_detected);
        assert_eq!(attempt.status(), AttemptStatus::ForcedZero);

        let back = send(&mut monitor, &mut attempt, IntegrityEvent::VisibilityRestored);
        assert!(matches!(back.response, IntegrityResponse::FinalNotice { .. }));
        assert!(back.finalized.is_none());
    }

    #[test]
    fn test_events_after_end_are_ignored() {
        let mut attempt = started();
        attempt.submit(Utc::now()).unwrap();
        let mut monitor = IntegrityMonitor::new();

        let lost = send(&mut monitor, &mut attempt, IntegrityEvent::VisibilityLost);
        assert_eq!(lost.response, IntegrityResponse::None);
        assert_eq!(attempt.violations(), 0);
        let back = send(
            &mut monitor,
            &mut attempt,
            IntegrityEvent::BackNavigation { confirmed: true },
        );
        assert_eq!(back.response, IntegrityResponse::None);
        assert_eq!(attempt.status(), AttemptStatus::Submitted);
    }

    #[test]
    fn test_back_navigation_asks_then_forces_zero() {
        let mut attempt = started();
        let mut monitor = IntegrityMonitor::new();

        let ask = send(
            &mut monitor,
            &mut attempt,
            IntegrityEvent::BackNavigation { confirmed: false },
        );
        assert!(matches!(
            ask.response,
            IntegrityResponse::ConfirmExit { reassert_history: true, .. }
        ));
        assert_eq!(attempt.status(), AttemptStatus::InProgress);
        assert_eq!(attempt.violations(), 0);

        let exit = send(
            &mut monitor,
            &mut attempt,
            IntegrityEvent::BackNavigation { confirmed: true },
        );
        assert!(exit.finalized.is_some());
        assert_eq!(attempt.status(), AttemptStatus::ForcedZero);
    }

    #[test]
    fn test_close_is_advisory() {
        let mut attempt = started();
        let mut monitor = IntegrityMonitor::new();
        let close = send(&mut monitor, &mut attempt, IntegrityEvent::CloseAttempt);
        assert!(matches!(close.response, IntegrityResponse::ConfirmClose { .. }));
        assert!(close.finalized.is_none());
        assert_eq!(attempt.status(), AttemptStatus::InProgress);
    }

    #[test]
    fn test_event_wire_format() {
        let event: IntegrityEvent =
            serde_json::from_str(r#"{"kind":"back_navigation","confirmed":true}"#).unwrap();
        assert_eq!(event, IntegrityEvent::BackNavigation { confirmed: true });
        let event: IntegrityEvent = serde_json::from_str(r#"{"kind":"back_navigation"}"#).unwrap();
        assert_eq!(event, IntegrityEvent::BackNavigation { confirmed: false });
        let event: IntegrityEvent = serde_json::from_str(r#"{"kind":"visibility_lost"}"#).unwrap();
        assert_eq!(event, IntegrityEvent::VisibilityLost);
    }
}
