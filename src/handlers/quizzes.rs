// src/handlers/quizzes.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    quiz::{attempt::Attempt, registry::AttemptRegistry},
    store::DynStore,
    utils::jwt::Claims,
};

/// Lists every quiz title that can be attempted.
pub async fn list_quizzes(State(store): State<DynStore>) -> Result<impl IntoResponse, AppError> {
    let titles = store.list_titles().await?;
    Ok(Json(json!({ "titles": titles })))
}

/// Starts a fresh attempt on a quiz and returns its first snapshot.
///
/// A title without questions is 404 and no attempt is created.
pub async fn start_attempt(
    State(store): State<DynStore>,
    State(registry): State<Arc<AttemptRegistry>>,
    Extension(claims): Extension<Claims>,
    Path(title): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;

    let questions = store.find_questions_by_title(&title).await?;
    if questions.is_empty() {
        return Err(AppError::NotFound(
            "No questions found for this quiz".to_string(),
        ));
    }

    let mut attempt = Attempt::new(student_id, title.as_str());
    attempt.load(questions)?;
    let snapshot = attempt.snapshot();
    registry.insert(attempt);

    tracing::info!(
        "Student {} started attempt {} on '{}'",
        student_id,
        snapshot.id,
        title
    );
    Ok((StatusCode::CREATED, Json(snapshot)))
}
