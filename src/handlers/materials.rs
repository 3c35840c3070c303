// src/handlers/materials.rs

use axum::{Json, extract::{Multipart, State}, response::IntoResponse};
use serde_json::json;

use crate::{error::AppError, generator::DynGenerator};

/// Multipart field that carries the uploaded material.
const MATERIAL_FIELD: &str = "material";

/// Upper bound for one uploaded material file.
pub const MAX_MATERIAL_BYTES: usize = 10 * 1024 * 1024;

/// Generates question drafts from uploaded course material.
/// Instructor only. Nothing is stored: the instructor reviews the drafts and saves them.
pub async fn generate_questions(
    State(generator): State<DynGenerator>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut material = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some(MATERIAL_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
            material = Some(bytes);
        }
    }

    let material = material
        .filter(|bytes| !bytes.is_empty())
        .ok_or(AppError::BadRequest("No file uploaded".to_string()))?;

    tracing::info!("Generating questions from {} byte(s) of material", material.len());
    let questions = generator.generate(&material).await?;

    Ok(Json(json!({ "questions": questions })))
}
