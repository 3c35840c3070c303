// src/models/attempt.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::{completed_quiz::CompletedQuizRecord, question::PublicQuestion},
    quiz::{attempt::AttemptStatus, integrity::IntegrityResponse},
};

/// Read-only view of an attempt as sent to its student.
/// Questions never carry their answers.
#[derive(Debug, Serialize)]
pub struct AttemptSnapshot {
    pub id: Uuid,
    pub quiz_title: String,
    pub status: AttemptStatus,
    pub current_index: usize,
    pub total_questions: usize,
    pub current_question: Option<PublicQuestion>,
    pub questions: Vec<PublicQuestion>,
    /// Question ID -> selected option index (0-3).
    pub selections: HashMap<i64, usize>,
    pub violations: u32,
    pub remaining_violations: u32,
    /// Present once the attempt is submitted or forced to zero.
    pub result: Option<CompletedQuizRecord>,
}

/// DTO for selecting an option on one question.
#[derive(Debug, Deserialize, Validate)]
pub struct SelectOptionRequest {
    pub question_id: i64,
    #[validate(range(max = 3))]
    pub option_index: usize,
}

/// Reply to an integrity event: what the client should show, and the updated attempt.
#[derive(Debug, Serialize)]
pub struct IntegrityEventResponse {
    pub integrity: IntegrityResponse,
    pub attempt: AttemptSnapshot,
}
