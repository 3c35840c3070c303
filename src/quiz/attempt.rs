// src/quiz/attempt.rs

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    config::{MAX_INTEGRITY_VIOLATIONS, OPTION_COUNT},
    models::{
        attempt::AttemptSnapshot,
        completed_quiz::CompletedQuizRecord,
        question::{PublicQuestion, Question},
    },
    quiz::grading::{grade, grade_forced_zero},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    NotStarted,
    InProgress,
    /// The quiz had no questions. Displayed, never scored.
    NoQuestions,
    Submitted,
    ForcedZero,
}

impl AttemptStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, AttemptStatus::Submitted | AttemptStatus::ForcedZero)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    AlreadyFinalized,
    NotStarted,
    NoQuestions,
    AlreadyLoaded,
    UnknownQuestion(i64),
    OptionOutOfRange(usize),
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::AlreadyFinalized => write!(f, "Attempt already finalized"),
            AttemptError::NotStarted => write!(f, "Attempt has not been started"),
            AttemptError::NoQuestions => write!(f, "This quiz doesn't have any questions yet"),
            AttemptError::AlreadyLoaded => write!(f, "Attempt questions are already loaded"),
            AttemptError::UnknownQuestion(id) => {
                write!(f, "Question {} is not part of this attempt", id)
            }
            AttemptError::OptionOutOfRange(index) => write!(
                f,
                "Option index {} is out of range (0-{})",
                index,
                OPTION_COUNT - 1
            ),
        }
    }
}

impl std::error::Error for AttemptError {}

/// Result of a counted integrity violation.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// Soft violation; the attempt continues.
    Warning { count: u32, remaining: u32 },
    /// The limit was reached and the attempt ended with a zero score.
    Forced(CompletedQuizRecord),
}

/// One student's pass through one quiz.
///
/// The question list is a snapshot taken at load time and never changes.
/// Once `Submitted` or `ForcedZero`, every mutating call fails with
/// [`AttemptError::AlreadyFinalized`] and only the final snapshot is readable.
#[derive(Debug)]
pub struct Attempt {
    id: Uuid,
    student_id: i64,
    quiz_title: String,
    questions: Vec<Question>,
    current_index: usize,
    selections: HashMap<i64, usize>,
    violations: u32,
    status: AttemptStatus,
    result: Option<CompletedQuizRecord>,
}

impl Attempt {
    pub fn new(student_id: i64, quiz_title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id,
            quiz_title: quiz_title.into(),
            questions: Vec::new(),
            current_index: 0,
            selections: HashMap::new(),
            violations: 0,
            status: AttemptStatus::NotStarted,
            result: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn student_id(&self) -> i64 {
        self.student_id
    }

    pub fn quiz_title(&self) -> &str {
        &self.quiz_title
    }

    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn violations(&self) -> u32 {
        self.violations
    }

    pub fn selection(&self, question_id: i64) -> Option<usize> {
        self.selections.get(&question_id).copied()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// The persisted outcome, present once the attempt is terminal.
    pub fn result(&self) -> Option<&CompletedQuizRecord> {
        self.result.as_ref()
    }

    /// NotStarted -> InProgress, or NoQuestions for an empty quiz.
    pub fn load(&mut self, questions: Vec<Question>) -> Result<AttemptStatus, AttemptError> {
        match self.status {
            AttemptStatus::NotStarted => {}
            status if status.is_terminal() => return Err(AttemptError::AlreadyFinalized),
            _ => return Err(AttemptError::AlreadyLoaded),
        }

        self.status = if questions.is_empty() {
            AttemptStatus::NoQuestions
        } else {
            AttemptStatus::InProgress
        };
        self.questions = questions;
        self.current_index = 0;
        Ok(self.status)
    }

    /// Records (or replaces) the chosen option. The pointer does not move.
    pub fn select_option(&mut self, question_id: i64, option_index: usize) -> Result<(), AttemptError> {
        self.ensure_in_progress()?;

        if option_index >= OPTION_COUNT {
            return Err(AttemptError::OptionOutOfRange(option_index));
        }
        if !self.questions.iter().any(|q| q.id == question_id) {
            return Err(AttemptError::UnknownQuestion(question_id));
        }

        self.selections.insert(question_id, option_index);
        Ok(())
    }

    /// Moves forward, staying put on the last question.
    pub fn next(&mut self) -> Result<usize, AttemptError> {
        self.ensure_in_progress()?;
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
        }
        Ok(self.current_index)
    }

    /// Moves back, staying put on the first question.
    pub fn previous(&mut self) -> Result<usize, AttemptError> {
        self.ensure_in_progress()?;
        self.current_index = self.current_index.saturating_sub(1);
        Ok(self.current_index)
    }

    /// Counts one integrity violation. Reaching the limit forces a zero score.
    pub fn record_violation(&mut self, now: DateTime<Utc>) -> Result<Violation, AttemptError> {
        self.ensure_in_progress()?;

        self.violations += 1;
        if self.violations >= MAX_INTEGRITY_VIOLATIONS {
            return Ok(Violation::Forced(self.finalize_forced(now)));
        }

        Ok(Violation::Warning {
            count: self.violations,
            remaining: MAX_INTEGRITY_VIOLATIONS - self.violations,
        })
    }

    /// Confirmed exit. Treated like cheating: the attempt ends with zero.
    pub fn abandon(&mut self, now: DateTime<Utc>) -> Result<CompletedQuizRecord, AttemptError> {
        self.ensure_in_progress()?;
        Ok(self.finalize_forced(now))
    }

    /// Grades the attempt without finishing it.
    ///
    /// Pair with [`Attempt::commit_submission`] once the record is stored, so
    /// a failed write leaves the attempt open for another try.
    pub fn prepare_submission(&self, now: DateTime<Utc>) -> Result<CompletedQuizRecord, AttemptError> {
        self.ensure_in_progress()?;
        Ok(grade(
            self.student_id,
            &self.quiz_title,
            &self.questions,
            &self.selections,
            now,
        ))
    }

    /// InProgress -> Submitted.
    pub fn commit_submission(&mut self, record: CompletedQuizRecord) -> Result<(), AttemptError> {
        self.ensure_in_progress()?;
        self.status = AttemptStatus::Submitted;
        self.result = Some(record);
        Ok(())
    }

    /// Grades and finishes in one step.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<CompletedQuizRecord, AttemptError> {
        let record = self.prepare_submission(now)?;
        self.commit_submission(record.clone())?;
        Ok(record)
    }

    pub fn snapshot(&self) -> AttemptSnapshot {
        let questions: Vec<PublicQuestion> =
            self.questions.iter().map(PublicQuestion::from).collect();
        AttemptSnapshot {
            id: self.id,
            quiz_title: self.quiz_title.clone(),
            status: self.status,
            current_index: self.current_index,
            total_questions: questions.len(),
            current_question: questions.get(self.current_index).cloned(),
            questions,
            selections: self.selections.clone(),
            violations: self.violations,
            remaining_violations: MAX_INTEGRITY_VIOLATIONS.saturating_sub(self.violations),
            result: self.result.clone(),
        }
    }

    fn finalize_forced(&mut self, now: DateTime<Utc>) -> CompletedQuizRecord {
        let record = grade_forced_zero(self.student_id, &self.quiz_title, &self.questions, now);
        self.status = AttemptStatus::ForcedZero;
        self.result = Some(record.clone());
        record
    }

    fn ensure_in_progress(&self) -> Result<(), AttemptError> {
        match self.status {
            AttemptStatus::InProgress => Ok(()),
            AttemptStatus::Submitted | AttemptStatus::ForcedZero => {
                Err(AttemptError::AlreadyFinalized)
            }
            AttemptStatus::NotStarted => Err(AttemptError::NotStarted),
            AttemptStatus::NoQuestions => Err(AttemptError::NoQuestions),
        }
    }
}
