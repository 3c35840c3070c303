// src/handlers/attempts.rs

//! Transitions of a live attempt. Every handler holds the attempt's lock for
//! the whole transition, persistence included.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        attempt::{IntegrityEventResponse, SelectOptionRequest},
        completed_quiz::CompletedQuizRecord,
    },
    quiz::{
        integrity::IntegrityEvent,
        registry::{AttemptRegistry, AttemptSession},
    },
    store::DynStore,
    utils::jwt::Claims,
};

/// Locks an attempt owned by the caller. Other users are turned away before
/// they can queue on the lock.
async fn lock_own_session(
    registry: &AttemptRegistry,
    id: Uuid,
    claims: &Claims,
) -> Result<OwnedMutexGuard<AttemptSession>, AppError> {
    let live = registry
        .get(&id)
        .ok_or(AppError::NotFound("Attempt not found".to_string()))?;

    if live.student_id != claims.user_id()? {
        return Err(AppError::Forbidden(
            "This attempt belongs to another user.".to_string(),
        ));
    }

    let mut guard = live.session.lock_owned().await;
    guard.touch();
    Ok(guard)
}

/// Stores a forced-zero record. A failed save is logged and the attempt stays finalized.
async fn persist_forced(store: &DynStore, record: &CompletedQuizRecord) {
    match store.upsert_completed_record(record).await {
        Ok(()) => tracing::info!(
            "Saved forced-zero record for student {} on '{}'",
            record.student_id,
            record.quiz_title
        ),
        Err(e) => tracing::error!(
            "Failed to save forced-zero record for student {} on '{}': {}",
            record.student_id,
            record.quiz_title,
            e
        ),
    }
}

pub async fn get_attempt(
    State(registry): State<Arc<AttemptRegistry>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = lock_own_session(&registry, id, &claims).await?;
    Ok(Json(session.attempt.snapshot()))
}

/// Records the selected option for one question. Re-selecting replaces the previous choice.
pub async fn select_option(
    State(registry): State<Arc<AttemptRegistry>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SelectOptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut session = lock_own_session(&registry, id, &claims).await?;
    session
        .attempt
        .select_option(payload.question_id, payload.option_index)?;
    Ok(Json(session.attempt.snapshot()))
}

pub async fn next_question(
    State(registry): State<Arc<AttemptRegistry>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut session = lock_own_session(&registry, id, &claims).await?;
    session.attempt.next()?;
    Ok(Json(session.attempt.snapshot()))
}

pub async fn previous_question(
    State(registry): State<Arc<AttemptRegistry>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut session = lock_own_session(&registry, id, &claims).await?;
    session.attempt.previous()?;
    Ok(Json(session.attempt.snapshot()))
}

/// Feeds one integrity event to the attempt's monitor.
///
/// When the event ends the attempt (third tab switch, confirmed exit) the
/// forced-zero record is saved before replying.
pub async fn report_event(
    State(store): State<DynStore>,
    State(registry): State<Arc<AttemptRegistry>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(event): Json<IntegrityEvent>,
) -> Result<impl IntoResponse, AppError> {
    let mut guard = lock_own_session(&registry, id, &claims).await?;
    let session = &mut *guard;

    let outcome = session
        .monitor
        .handle(&mut session.attempt, event, Utc::now())?;

    if let Some(record) = &outcome.finalized {
        persist_forced(&store, record).await;
    }

    Ok(Json(IntegrityEventResponse {
        integrity: outcome.response,
        attempt: session.attempt.snapshot(),
    }))
}

/// Grades and saves the attempt.
///
/// The attempt is only marked submitted once the record is stored; a failed
/// save is returned to the caller and the attempt stays open for a retry.
pub async fn submit_attempt(
    State(store): State<DynStore>,
    State(registry): State<Arc<AttemptRegistry>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut session = lock_own_session(&registry, id, &claims).await?;

    let record = session.attempt.prepare_submission(Utc::now())?;
    store.upsert_completed_record(&record).await.map_err(|e| {
        tracing::error!("Failed to save attempt {}: {}", id, e);
        e
    })?;

    tracing::info!(
        "Attempt {} submitted: {}/{} correct ({:.1}%)",
        id,
        record.correct_answers,
        record.total_questions,
        record.score
    );
    session.attempt.commit_submission(record)?;

    Ok(Json(session.attempt.snapshot()))
}
