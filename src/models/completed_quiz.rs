// src/models/completed_quiz.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The persisted outcome of one attempt.
/// Unique per (student_id, quiz_title): a resubmission overwrites the previous record.
///
/// Field names are camelCase on the wire; other tools read this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedQuizRecord {
    pub student_id: i64,
    pub quiz_title: String,
    /// Percentage in 0..=100.
    pub score: f64,
    pub correct_answers: i64,
    pub total_questions: i64,
    pub detailed_results: Vec<QuestionResult>,
    pub student_answers: Vec<StudentAnswer>,
    pub tab_switching_detected: bool,
    pub completed_at: DateTime<Utc>,
}

/// Outcome of a single question inside a completed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question_id: i64,
    pub question: String,
    pub options: Vec<String>,
    /// Text of the chosen option, or a placeholder when nothing was chosen.
    pub student_answer: String,
    pub student_answer_index: Option<usize>,
    pub student_answer_letter: Option<char>,
    /// The answer exactly as stored on the question.
    pub correct_answer: String,
    /// Canonical letter; `None` when the stored answer matches no option.
    pub correct_answer_letter: Option<char>,
    pub is_correct: bool,
}

/// Raw selection for one question, kept alongside the graded results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAnswer {
    pub question_id: i64,
    pub selected_option_index: Option<usize>,
    pub selected_option_letter: Option<char>,
}

/// A completed record plus display strings for the results page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedQuizView {
    pub quiz_title: String,
    pub score: f64,
    pub correct_answers: i64,
    pub total_questions: i64,
    pub detailed_results: Vec<QuestionResultView>,
    pub tab_switching_detected: bool,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResultView {
    #[serde(flatten)]
    pub result: QuestionResult,
    /// e.g. "B. London" or "Not answered".
    pub your_answer: String,
    /// e.g. "A. Paris", or "Option <raw>" when the stored answer is unresolvable.
    pub correct_answer_display: String,
}

/// Summary row for a student's dashboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedQuizSummary {
    pub quiz_title: String,
    pub score: f64,
    pub correct_answers: i64,
    pub total_questions: i64,
    pub tab_switching_detected: bool,
    pub completed_at: DateTime<Utc>,
}

impl From<&CompletedQuizRecord> for CompletedQuizSummary {
    fn from(record: &CompletedQuizRecord) -> Self {
        Self {
            quiz_title: record.quiz_title.clone(),
            score: record.score,
            correct_answers: record.correct_answers,
            total_questions: record.total_questions,
            tab_switching_detected: record.tab_switching_detected,
            completed_at: record.completed_at,
        }
    }
}

/// One student's line in an instructor's per-quiz results.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentResultRow {
    pub student_id: i64,
    pub username: String,
    pub score: f64,
    pub correct_answers: i64,
    pub total_questions: i64,
    pub tab_switching_detected: bool,
    pub completed_at: DateTime<Utc>,
}

/// Per-quiz score aggregation shown to the owning instructor.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResultsSummary {
    pub quiz_title: String,
    pub attempts: usize,
    pub average_score: f64,
    pub highest_score: f64,
    pub lowest_score: f64,
    /// Records forced to zero by integrity violations.
    pub flagged_attempts: usize,
    pub results: Vec<StudentResultRow>,
}
