// src/handlers/questions.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::types::Json as SqlJson;
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{QuestionDraft, SaveQuestionsRequest, UpdateQuestionRequest},
    quiz::grading::summarize_results,
    store::DynStore,
    utils::{html::clean_html, jwt::Claims},
};

/// Saves a batch of questions under one quiz title.
///
/// * Every question must have exactly four options.
/// * Duplicates are stored as-is; saving to an existing title appends.
/// * Question text is sanitized before storage.
pub async fn save_questions(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SaveQuestionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let instructor_id = claims.user_id()?;
    let title = payload.title.trim();

    let drafts: Vec<QuestionDraft> = payload
        .questions
        .into_iter()
        .map(|draft| QuestionDraft {
            question: clean_html(&draft.question),
            ..draft
        })
        .collect();

    let saved = store.insert_questions(instructor_id, title, &drafts).await?;
    tracing::info!(
        "Instructor {} saved {} question(s) to '{}'",
        instructor_id,
        saved.len(),
        title
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("Saved {} question(s) to quiz \"{}\".", saved.len(), title),
            "questions": saved
        })),
    ))
}

/// Updates one question. Only the instructor who created it may change it.
pub async fn update_question(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let instructor_id = claims.user_id()?;

    let mut question = store
        .find_question(id)
        .await?
        .ok_or(AppError::NotFound("Question not found.".to_string()))?;

    if question.instructor_id != instructor_id {
        return Err(AppError::Forbidden(
            "You don't have permission to update this question.".to_string(),
        ));
    }

    if let Some(title) = payload.title {
        question.title = title.trim().to_string();
    }
    if let Some(text) = payload.question {
        question.question = clean_html(&text);
    }
    if let Some(options) = payload.options {
        question.options = SqlJson(options);
    }
    if let Some(answer) = payload.answer {
        question.answer = answer;
    }

    let updated = store.update_question(&question).await?;
    tracing::info!("Instructor {} updated question {}", instructor_id, id);

    Ok(Json(json!({
        "message": "Question updated successfully!",
        "question": updated
    })))
}

/// Lists the titles of the caller's own quizzes.
pub async fn list_own_titles(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let titles = store.list_titles_for_instructor(claims.user_id()?).await?;
    Ok(Json(json!({ "titles": titles })))
}

/// Returns the caller's questions of one quiz, answers included.
pub async fn get_own_quiz(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Path(title): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let questions = store
        .find_questions_by_title_for_instructor(claims.user_id()?, &title)
        .await?;

    if questions.is_empty() {
        return Err(AppError::NotFound(
            "No questions found for this quiz".to_string(),
        ));
    }

    Ok(Json(json!({ "questions": questions })))
}

/// Deletes every question of one of the caller's quizzes.
/// Completed records of the quiz are kept.
pub async fn delete_quiz(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Path(title): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let instructor_id = claims.user_id()?;
    let deleted = store.delete_questions_by_title(instructor_id, &title).await?;

    if deleted == 0 {
        return Err(AppError::NotFound(
            "No questions found for this quiz or you don't have permission".to_string(),
        ));
    }

    tracing::info!(
        "Instructor {} deleted quiz '{}' ({} question(s))",
        instructor_id,
        title,
        deleted
    );
    Ok(Json(json!({
        "message": format!("Quiz \"{}\" deleted successfully. {} questions removed.", title, deleted)
    })))
}

/// Score aggregation over every completed record of one of the caller's quizzes.
pub async fn quiz_results(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Path(title): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let owned = store
        .find_questions_by_title_for_instructor(claims.user_id()?, &title)
        .await?;
    if owned.is_empty() {
        return Err(AppError::NotFound(
            "No questions found for this quiz".to_string(),
        ));
    }

    let records = store.list_completed_records_for_title(&title).await?;
    Ok(Json(summarize_results(&title, records)))
}
