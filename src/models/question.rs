// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::config::OPTION_COUNT;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// The instructor who saved the question. Only they may update or delete it.
    pub instructor_id: i64,

    /// Quiz title. Questions sharing a title form one quiz.
    pub title: String,

    /// The text of the question.
    pub question: String,

    /// Exactly four options, stored as a JSON array.
    pub options: Json<Vec<String>>,

    /// Either a bare letter (A-D) or text matching one of the options.
    pub answer: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for sending a question to a student (excludes the answer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question: String,
    pub options: Vec<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            question: q.question.clone(),
            options: q.options.0.clone(),
        }
    }
}

/// A question that has not been stored yet.
/// Produced by the generator and sent back by instructors when saving a quiz.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuestionDraft {
    #[validate(length(min = 1, max = 2000))]
    pub question: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 500))]
    pub answer: String,
}

/// DTO for saving a batch of questions under one quiz title.
#[derive(Debug, Deserialize, Validate)]
pub struct SaveQuestionsRequest {
    #[validate(custom(function = validate_title))]
    pub title: String,
    #[validate(length(min = 1, message = "No questions data provided."), nested)]
    pub questions: Vec<QuestionDraft>,
}

/// DTO for updating one question. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(custom(function = validate_title))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub question: Option<String>,
    #[validate(custom(function = validate_options))]
    pub options: Option<Vec<String>>,
    #[validate(length(min = 1, max = 500))]
    pub answer: Option<String>,
}

fn validate_title(title: &str) -> Result<(), validator::ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(validator::ValidationError::new("quiz_title_required"));
    }
    if trimmed.len() > 200 {
        return Err(validator::ValidationError::new("quiz_title_too_long"));
    }
    Ok(())
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() != OPTION_COUNT {
        return Err(validator::ValidationError::new("must_have_exactly_4_options"));
    }
    for opt in options {
        if opt.trim().is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(options: &[&str]) -> QuestionDraft {
        QuestionDraft {
            question: "Capital of France?".to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            answer: "A".to_string(),
        }
    }

    #[test]
    fn test_draft_requires_exactly_four_options() {
        assert!(draft(&["Paris", "London", "Rome", "Berlin"]).validate().is_ok());
        assert!(draft(&["Paris", "London", "Rome"]).validate().is_err());
        assert!(
            draft(&["Paris", "London", "Rome", "Berlin", "Madrid"])
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_draft_rejects_blank_option() {
        assert!(draft(&["Paris", " ", "Rome", "Berlin"]).validate().is_err());
    }

    #[test]
    fn test_save_request_rejects_blank_title_and_empty_list() {
        let blank_title = SaveQuestionsRequest {
            title: "   ".to_string(),
            questions: vec![draft(&["a", "b", "c", "d"])],
        };
        assert!(blank_title.validate().is_err());

        let no_questions = SaveQuestionsRequest {
            title: "Geography".to_string(),
            questions: vec![],
        };
        assert!(no_questions.validate().is_err());
    }

    #[test]
    fn test_save_request_validates_nested_drafts() {
        let req = SaveQuestionsRequest {
            title: "Geography".to_string(),
            questions: vec![draft(&["a", "b"])],
        };
        assert!(req.validate().is_err());
    }
}
