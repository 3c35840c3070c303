// src/store/memory.rs

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use tokio::sync::RwLock;

use crate::{
    error::AppError,
    models::{
        completed_quiz::CompletedQuizRecord,
        question::{Question, QuestionDraft},
        user::User,
    },
    store::QuizStore,
};

#[derive(Default)]
struct MemoryState {
    users: BTreeMap<i64, User>,
    questions: BTreeMap<i64, Question>,
    records: HashMap<(i64, String), CompletedQuizRecord>,
    next_user_id: i64,
    next_question_id: i64,
}

/// Process-local store, used when no database is configured and in tests.
/// Same contract as the PostgreSQL store, including (student, title) uniqueness.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored completed-quiz records.
    pub async fn record_count(&self) -> usize {
        self.state.read().await.records.len()
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, AppError> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.username == username) {
            return Err(AppError::Conflict(format!(
                "Username '{}' already exists",
                username
            )));
        }

        state.next_user_id += 1;
        let user = User {
            id: state.next_user_id,
            username: username.to_string(),
            password: password_hash.to_string(),
            role: role.to_string(),
            created_at: Some(Utc::now()),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn insert_questions(
        &self,
        instructor_id: i64,
        title: &str,
        drafts: &[QuestionDraft],
    ) -> Result<Vec<Question>, AppError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut saved = Vec::with_capacity(drafts.len());

        for draft in drafts {
            state.next_question_id += 1;
            let question = Question {
                id: state.next_question_id,
                instructor_id,
                title: title.to_string(),
                question: draft.question.clone(),
                options: Json(draft.options.clone()),
                answer: draft.answer.clone(),
                created_at: Some(now),
                updated_at: Some(now),
            };
            state.questions.insert(question.id, question.clone());
            saved.push(question);
        }
        Ok(saved)
    }

    async fn find_question(&self, id: i64) -> Result<Option<Question>, AppError> {
        Ok(self.state.read().await.questions.get(&id).cloned())
    }

    async fn update_question(&self, question: &Question) -> Result<Question, AppError> {
        let mut state = self.state.write().await;
        let stored = state
            .questions
            .get_mut(&question.id)
            .ok_or(AppError::NotFound("Question not found.".to_string()))?;

        stored.title = question.title.clone();
        stored.question = question.question.clone();
        stored.options = question.options.clone();
        stored.answer = question.answer.clone();
        stored.updated_at = Some(Utc::now());
        Ok(stored.clone())
    }

    async fn find_questions_by_title(&self, title: &str) -> Result<Vec<Question>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .questions
            .values()
            .filter(|q| q.title == title)
            .cloned()
            .collect())
    }

    async fn find_questions_by_title_for_instructor(
        &self,
        instructor_id: i64,
        title: &str,
    ) -> Result<Vec<Question>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .questions
            .values()
            .filter(|q| q.title == title && q.instructor_id == instructor_id)
            .cloned()
            .collect())
    }

    async fn list_titles(&self) -> Result<Vec<String>, AppError> {
        let state = self.state.read().await;
        let titles: BTreeSet<String> = state.questions.values().map(|q| q.title.clone()).collect();
        Ok(titles.into_iter().collect())
    }

    async fn list_titles_for_instructor(&self, instructor_id: i64) -> Result<Vec<String>, AppError> {
        let state = self.state.read().await;
        let titles: BTreeSet<String> = state
            .questions
            .values()
            .filter(|q| q.instructor_id == instructor_id)
            .map(|q| q.title.clone())
            .collect();
        Ok(titles.into_iter().collect())
    }

    async fn delete_questions_by_title(
        &self,
        instructor_id: i64,
        title: &str,
    ) -> Result<u64, AppError> {
        let mut state = self.state.write().await;
        let before = state.questions.len();
        state
            .questions
            .retain(|_, q| !(q.title == title && q.instructor_id == instructor_id));
        Ok((before - state.questions.len()) as u64)
    }

    async fn find_completed_record(
        &self,
        student_id: i64,
        quiz_title: &str,
    ) -> Result<Option<CompletedQuizRecord>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .records
            .get(&(student_id, quiz_title.to_string()))
            .cloned())
    }

    async fn list_completed_records(
        &self,
        student_id: i64,
    ) -> Result<Vec<CompletedQuizRecord>, AppError> {
        let state = self.state.read().await;
        let mut records: Vec<CompletedQuizRecord> = state
            .records
            .values()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(records)
    }

    async fn list_completed_records_for_title(
        &self,
        quiz_title: &str,
    ) -> Result<Vec<(CompletedQuizRecord, String)>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .records
            .values()
            .filter(|r| r.quiz_title == quiz_title)
            .filter_map(|r| {
                state
                    .users
                    .get(&r.student_id)
                    .map(|u| (r.clone(), u.username.clone()))
            })
            .collect())
    }

    async fn upsert_completed_record(&self, record: &CompletedQuizRecord) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        state.records.insert(
            (record.student_id, record.quiz_title.clone()),
            record.clone(),
        );
        Ok(())
    }
}
