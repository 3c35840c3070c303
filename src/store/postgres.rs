// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, types::Json};

use crate::{
    error::AppError,
    models::{
        completed_quiz::{CompletedQuizRecord, QuestionResult, StudentAnswer},
        question::{Question, QuestionDraft},
        user::User,
    },
    store::QuizStore,
};

const QUESTION_COLUMNS: &str =
    "id, instructor_id, title, question, options, answer, created_at, updated_at";

const RECORD_COLUMNS: &str = "c.student_id, c.quiz_title, c.score, c.correct_answers, \
     c.total_questions, c.detailed_results, c.student_answers, c.tab_switching_detected, \
     c.completed_at";

/// Row of the 'completed_quizzes' table.
#[derive(FromRow)]
struct CompletedQuizRow {
    student_id: i64,
    quiz_title: String,
    score: f64,
    correct_answers: i64,
    total_questions: i64,
    detailed_results: Json<Vec<QuestionResult>>,
    student_answers: Json<Vec<StudentAnswer>>,
    tab_switching_detected: bool,
    completed_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct CompletedQuizWithUser {
    #[sqlx(flatten)]
    record: CompletedQuizRow,
    username: String,
}

impl From<CompletedQuizRow> for CompletedQuizRecord {
    fn from(row: CompletedQuizRow) -> Self {
        Self {
            student_id: row.student_id,
            quiz_title: row.quiz_title,
            score: row.score,
            correct_answers: row.correct_answers,
            total_questions: row.total_questions,
            detailed_results: row.detailed_results.0,
            student_answers: row.student_answers.0,
            tab_switching_detected: row.tab_switching_detected,
            completed_at: row.completed_at,
        }
    }
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuizStore for PgStore {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password, role)
            VALUES ($1, $2, $3)
            RETURNING id, username, password, role, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(format!("Username '{}' already exists", username))
            }
            _ => {
                tracing::error!("Failed to create user: {:?}", e);
                AppError::from(e)
            }
        })
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, role, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert_questions(
        &self,
        instructor_id: i64,
        title: &str,
        drafts: &[QuestionDraft],
    ) -> Result<Vec<Question>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut saved = Vec::with_capacity(drafts.len());

        let sql = format!(
            "INSERT INTO questions (instructor_id, title, question, options, answer) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            QUESTION_COLUMNS
        );
        for draft in drafts {
            let question = sqlx::query_as::<_, Question>(&sql)
                .bind(instructor_id)
                .bind(title)
                .bind(&draft.question)
                .bind(Json(draft.options.clone()))
                .bind(&draft.answer)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to insert question: {:?}", e);
                    AppError::from(e)
                })?;
            saved.push(question);
        }

        tx.commit().await?;
        Ok(saved)
    }

    async fn find_question(&self, id: i64) -> Result<Option<Question>, AppError> {
        let sql = format!("SELECT {} FROM questions WHERE id = $1", QUESTION_COLUMNS);
        let question = sqlx::query_as::<_, Question>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(question)
    }

    async fn update_question(&self, question: &Question) -> Result<Question, AppError> {
        let sql = format!(
            "UPDATE questions \
             SET title = $1, question = $2, options = $3, answer = $4, updated_at = NOW() \
             WHERE id = $5 RETURNING {}",
            QUESTION_COLUMNS
        );
        sqlx::query_as::<_, Question>(&sql)
            .bind(&question.title)
            .bind(&question.question)
            .bind(Json(question.options.0.clone()))
            .bind(&question.answer)
            .bind(question.id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Question not found.".to_string()))
    }

    async fn find_questions_by_title(&self, title: &str) -> Result<Vec<Question>, AppError> {
        let sql = format!(
            "SELECT {} FROM questions WHERE title = $1 ORDER BY id",
            QUESTION_COLUMNS
        );
        let questions = sqlx::query_as::<_, Question>(&sql)
            .bind(title)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch quiz questions: {:?}", e);
                AppError::from(e)
            })?;
        Ok(questions)
    }

    async fn find_questions_by_title_for_instructor(
        &self,
        instructor_id: i64,
        title: &str,
    ) -> Result<Vec<Question>, AppError> {
        let sql = format!(
            "SELECT {} FROM questions WHERE title = $1 AND instructor_id = $2 ORDER BY id",
            QUESTION_COLUMNS
        );
        let questions = sqlx::query_as::<_, Question>(&sql)
            .bind(title)
            .bind(instructor_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(questions)
    }

    async fn list_titles(&self) -> Result<Vec<String>, AppError> {
        let titles = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT title FROM questions ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(titles)
    }

    async fn list_titles_for_instructor(&self, instructor_id: i64) -> Result<Vec<String>, AppError> {
        let titles = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT title FROM questions WHERE instructor_id = $1 ORDER BY title",
        )
        .bind(instructor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(titles)
    }

    async fn delete_questions_by_title(
        &self,
        instructor_id: i64,
        title: &str,
    ) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM questions WHERE title = $1 AND instructor_id = $2")
            .bind(title)
            .bind(instructor_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete quiz: {:?}", e);
                AppError::from(e)
            })?;
        Ok(result.rows_affected())
    }

    async fn find_completed_record(
        &self,
        student_id: i64,
        quiz_title: &str,
    ) -> Result<Option<CompletedQuizRecord>, AppError> {
        let sql = format!(
            "SELECT {} FROM completed_quizzes c WHERE c.student_id = $1 AND c.quiz_title = $2",
            RECORD_COLUMNS
        );
        let row = sqlx::query_as::<_, CompletedQuizRow>(&sql)
            .bind(student_id)
            .bind(quiz_title)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn list_completed_records(
        &self,
        student_id: i64,
    ) -> Result<Vec<CompletedQuizRecord>, AppError> {
        let sql = format!(
            "SELECT {} FROM completed_quizzes c WHERE c.student_id = $1 ORDER BY c.completed_at DESC",
            RECORD_COLUMNS
        );
        let rows = sqlx::query_as::<_, CompletedQuizRow>(&sql)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_completed_records_for_title(
        &self,
        quiz_title: &str,
    ) -> Result<Vec<(CompletedQuizRecord, String)>, AppError> {
        let sql = format!(
            "SELECT {}, u.username FROM completed_quizzes c \
             JOIN users u ON u.id = c.student_id \
             WHERE c.quiz_title = $1 ORDER BY c.score DESC",
            RECORD_COLUMNS
        );
        let rows = sqlx::query_as::<_, CompletedQuizWithUser>(&sql)
            .bind(quiz_title)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| (row.record.into(), row.username))
            .collect())
    }

    async fn upsert_completed_record(&self, record: &CompletedQuizRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO completed_quizzes (
                student_id, quiz_title, score, correct_answers, total_questions,
                detailed_results, student_answers, tab_switching_detected, completed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (student_id, quiz_title) DO UPDATE SET
                score = EXCLUDED.score,
                correct_answers = EXCLUDED.correct_answers,
                total_questions = EXCLUDED.total_questions,
                detailed_results = EXCLUDED.detailed_results,
                student_answers = EXCLUDED.student_answers,
                tab_switching_detected = EXCLUDED.tab_switching_detected,
                completed_at = EXCLUDED.completed_at
            "#,
        )
        .bind(record.student_id)
        .bind(&record.quiz_title)
        .bind(record.score)
        .bind(record.correct_answers)
        .bind(record.total_questions)
        .bind(Json(&record.detailed_results))
        .bind(Json(&record.student_answers))
        .bind(record.tab_switching_detected)
        .bind(record.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to upsert completed quiz: {:?}", e);
            AppError::from(e)
        })?;
        Ok(())
    }
}
