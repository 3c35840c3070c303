// src/handlers/auth.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{CreateUserRequest, LoginRequest, ROLE_STUDENT},
    store::DynStore,
    utils::{
        hash::{hash_password, verify_password},
        jwt::{Claims, sign_jwt},
    },
};

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it. The role defaults to 'student'.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(store): State<DynStore>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let hashed_password = hash_password(&payload.password)?;
    let role = payload.role.as_deref().unwrap_or(ROLE_STUDENT);

    let user = store
        .create_user(payload.username.trim(), &hashed_password, role)
        .await?;

    tracing::info!("Registered {} '{}'", user.role, user.username);
    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a JWT token.
///
/// If valid, signs a JWT token with the user's ID and role.
pub async fn login(
    State(store): State<DynStore>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = store
        .find_user_by_username(payload.username.trim())
        .await?
        .ok_or(AppError::AuthError("User not found".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid password".to_string()));
    }

    let token = sign_jwt(
        user.id,
        &user.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "role": user.role
    })))
}

/// Returns the signed-in user's own account.
pub async fn get_me(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = store
        .find_user_by_id(claims.user_id()?)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}
