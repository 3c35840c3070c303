// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use quiz_backend::{
    config::Config,
    error::AppError,
    generator::{DynGenerator, QuestionGenerator},
    models::{
        completed_quiz::CompletedQuizRecord,
        question::{Question, QuestionDraft},
        user::User,
    },
    quiz::registry::AttemptRegistry,
    routes,
    state::AppState,
    store::{DynStore, MemoryStore, QuizStore},
};
use serde_json::{Value, json};

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

/// Returns fixed drafts, or a generation error when `fail` is set.
pub struct StubGenerator {
    pub fail: bool,
}

#[async_trait]
impl QuestionGenerator for StubGenerator {
    async fn generate(&self, material: &[u8]) -> Result<Vec<QuestionDraft>, AppError> {
        if self.fail {
            return Err(AppError::GenerationFailed("stub failure".to_string()));
        }
        Ok(vec![QuestionDraft {
            question: format!("What is in the {} byte file?", material.len()),
            options: vec![
                "Text".to_string(),
                "Images".to_string(),
                "Nothing".to_string(),
                "Code".to_string(),
            ],
            answer: "A".to_string(),
        }])
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: None,
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        port: 0,
        cors_origin: "http://localhost:5173".to_string(),
        generator_command: "unused".to_string(),
        generator_args: vec![],
        generator_timeout_secs: 5,
        attempt_retention_secs: 7_200,
    }
}

/// Delegates to a [`MemoryStore`] but refuses to save completed records.
pub struct FailingRecordStore {
    pub inner: Arc<MemoryStore>,
}

#[async_trait]
impl QuizStore for FailingRecordStore {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, AppError> {
        self.inner.create_user(username, password_hash, role).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.inner.find_user_by_username(username).await
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        self.inner.find_user_by_id(id).await
    }

    async fn insert_questions(
        &self,
        instructor_id: i64,
        title: &str,
        drafts: &[QuestionDraft],
    ) -> Result<Vec<Question>, AppError> {
        self.inner.insert_questions(instructor_id, title, drafts).await
    }

    async fn find_question(&self, id: i64) -> Result<Option<Question>, AppError> {
        self.inner.find_question(id).await
    }

    async fn update_question(&self, question: &Question) -> Result<Question, AppError> {
        self.inner.update_question(question).await
    }

    async fn find_questions_by_title(&self, title: &str) -> Result<Vec<Question>, AppError> {
        self.inner.find_questions_by_title(title).await
    }

    async fn find_questions_by_title_for_instructor(
        &self,
        instructor_id: i64,
        title: &str,
    ) -> Result<Vec<Question>, AppError> {
        self.inner
            .find_questions_by_title_for_instructor(instructor_id, title)
            .await
    }

    async fn list_titles(&self) -> Result<Vec<String>, AppError> {
        self.inner.list_titles().await
    }

    async fn list_titles_for_instructor(&self, instructor_id: i64) -> Result<Vec<String>, AppError> {
        self.inner.list_titles_for_instructor(instructor_id).await
    }

    async fn delete_questions_by_title(
        &self,
        instructor_id: i64,
        title: &str,
    ) -> Result<u64, AppError> {
        self.inner.delete_questions_by_title(instructor_id, title).await
    }

    async fn find_completed_record(
        &self,
        student_id: i64,
        quiz_title: &str,
    ) -> Result<Option<CompletedQuizRecord>, AppError> {
        self.inner.find_completed_record(student_id, quiz_title).await
    }

    async fn list_completed_records(
        &self,
        student_id: i64,
    ) -> Result<Vec<CompletedQuizRecord>, AppError> {
        self.inner.list_completed_records(student_id).await
    }

    async fn list_completed_records_for_title(
        &self,
        quiz_title: &str,
    ) -> Result<Vec<(CompletedQuizRecord, String)>, AppError> {
        self.inner.list_completed_records_for_title(quiz_title).await
    }

    async fn upsert_completed_record(&self, _record: &CompletedQuizRecord) -> Result<(), AppError> {
        Err(AppError::InternalServerError(
            "completed_quizzes unavailable".to_string(),
        ))
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(Arc::new(StubGenerator { fail: false })).await
}

/// Spawns the app on a random port, backed by a fresh in-memory store.
pub async fn spawn_app_with(generator: DynGenerator) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    spawn_app_on(store.clone(), store, generator).await
}

/// Spawns an app whose store cannot save completed records.
pub async fn spawn_app_with_failing_records() -> TestApp {
    let inner = Arc::new(MemoryStore::new());
    let failing: DynStore = Arc::new(FailingRecordStore {
        inner: inner.clone(),
    });
    spawn_app_on(failing, inner, Arc::new(StubGenerator { fail: false })).await
}

async fn spawn_app_on(
    backend: DynStore,
    store: Arc<MemoryStore>,
    generator: DynGenerator,
) -> TestApp {
    let state = AppState {
        store: backend,
        generator,
        attempts: Arc::new(AttemptRegistry::new()),
        config: test_config(),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        store,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Registers a user with `role` and returns a bearer token.
    pub async fn token_for(&self, username: &str, role: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({ "username": username, "password": "password123", "role": role }))
            .send()
            .await
            .expect("Register failed");
        assert_eq!(response.status().as_u16(), 201);

        let login: Value = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "username": username, "password": "password123" }))
            .send()
            .await
            .expect("Login failed")
            .json()
            .await
            .expect("Failed to parse login json");

        login["token"].as_str().expect("Token not found").to_string()
    }

    pub async fn post_json(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put_json(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Saves the four-question "Capitals" quiz. Correct picks are A, B, C, D in order.
    pub async fn seed_capitals(&self, instructor_token: &str) -> Vec<Value> {
        let response = self
            .post_json(
                "/api/questions",
                instructor_token,
                json!({
                    "title": "Capitals",
                    "questions": [
                        { "question": "Capital of France?", "options": ["A. Paris", "B. London", "C. Rome", "D. Berlin"], "answer": "Paris" },
                        { "question": "Capital of the UK?", "options": ["Paris", "London", "Rome", "Berlin"], "answer": "B" },
                        { "question": "Capital of Italy?", "options": ["Paris", "London", "Rome", "Berlin"], "answer": "C. Rome" },
                        { "question": "Capital of Germany?", "options": ["Paris", "London", "Rome", "Berlin"], "answer": "Berlin" }
                    ]
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        body["questions"].as_array().unwrap().clone()
    }
}
