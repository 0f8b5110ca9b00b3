/// User Routes
///
/// Registration and credential updates.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::state::AppState;

/// Registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Credential update request. Absent fields are treated as empty and rejected.
#[derive(Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/users
///
/// # Errors
/// - 400: malformed body
/// - 409: email already registered
/// - 500: hashing or database failure
pub async fn register(
    form: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = state.sessions.register(&form.email, &form.password).await?;

    Ok(HttpResponse::Created().json(user))
}

/// PUT /api/users
///
/// **Requires a valid access token** in `Authorization: Bearer <token>`.
///
/// # Errors
/// - 401: missing/invalid token (checked before the body), or empty email/password
/// - 400: malformed body
/// - 500: hashing or database failure
pub async fn update_user(
    user: AuthenticatedUser,
    form: web::Json<UpdateUserRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = state
        .sessions
        .update_credentials(user.user_id(), &form.email, &form.password)
        .await?;

    Ok(HttpResponse::Ok().json(user))
}
