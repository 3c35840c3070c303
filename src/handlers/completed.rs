// src/handlers/completed.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::completed_quiz::CompletedQuizSummary,
    quiz::grading::render_record,
    store::DynStore,
    utils::jwt::Claims,
};

/// Lists the caller's completed quizzes, most recent first.
pub async fn list_completed(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let records = store.list_completed_records(claims.user_id()?).await?;
    let summaries: Vec<CompletedQuizSummary> =
        records.iter().map(CompletedQuizSummary::from).collect();
    Ok(Json(summaries))
}

/// The caller's record for one quiz with display strings for each answer.
pub async fn get_completed(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Path(title): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let record = store
        .find_completed_record(claims.user_id()?, &title)
        .await?
        .ok_or(AppError::NotFound("Completed quiz not found".to_string()))?;

    Ok(Json(render_record(record)))
}
