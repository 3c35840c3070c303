// src/store/mod.rs

//! Persistence collaborator. Handlers only ever talk to [`QuizStore`].

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        completed_quiz::CompletedQuizRecord,
        question::{Question, QuestionDraft},
        user::User,
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type DynStore = Arc<dyn QuizStore>;

#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Fails with `AppError::Conflict` when the username is taken.
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, AppError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// Stores every draft under `title`. Duplicates are stored as-is.
    async fn insert_questions(
        &self,
        instructor_id: i64,
        title: &str,
        drafts: &[QuestionDraft],
    ) -> Result<Vec<Question>, AppError>;

    async fn find_question(&self, id: i64) -> Result<Option<Question>, AppError>;

    /// Overwrites title, text, options and answer; bumps `updated_at`.
    async fn update_question(&self, question: &Question) -> Result<Question, AppError>;

    /// All questions of a quiz in insertion order. Empty when the title is unknown.
    async fn find_questions_by_title(&self, title: &str) -> Result<Vec<Question>, AppError>;

    async fn find_questions_by_title_for_instructor(
        &self,
        instructor_id: i64,
        title: &str,
    ) -> Result<Vec<Question>, AppError>;

    /// Distinct quiz titles, sorted.
    async fn list_titles(&self) -> Result<Vec<String>, AppError>;

    async fn list_titles_for_instructor(&self, instructor_id: i64) -> Result<Vec<String>, AppError>;

    /// Returns the number of deleted questions.
    async fn delete_questions_by_title(
        &self,
        instructor_id: i64,
        title: &str,
    ) -> Result<u64, AppError>;

    async fn find_completed_record(
        &self,
        student_id: i64,
        quiz_title: &str,
    ) -> Result<Option<CompletedQuizRecord>, AppError>;

    /// A student's records, most recent first.
    async fn list_completed_records(
        &self,
        student_id: i64,
    ) -> Result<Vec<CompletedQuizRecord>, AppError>;

    /// Every record of one quiz, paired with the student's username.
    async fn list_completed_records_for_title(
        &self,
        quiz_title: &str,
    ) -> Result<Vec<(CompletedQuizRecord, String)>, AppError>;

    /// Creates or overwrites the record for (student_id, quiz_title). Last write wins.
    async fn upsert_completed_record(&self, record: &CompletedQuizRecord) -> Result<(), AppError>;
}
