/// Authentication Routes
///
/// Login, access token refresh and refresh token revocation.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::auth::bearer_token;
use crate::domain::AccessTokenResponse;
use crate::error::AppError;
use crate::state::AppState;

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Requested access token lifetime; capped at one hour
    pub expires_in_seconds: Option<i64>,
}

/// POST /api/login
///
/// Returns the user view plus an access token and a refresh token.
///
/// # Errors
/// - 401: unknown email or wrong password (indistinguishable)
/// - 500: internal server error
pub async fn login(
    form: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let session = state
        .sessions
        .login(&form.email, &form.password, form.expires_in_seconds)
        .await?;

    Ok(HttpResponse::Ok().json(session))
}

/// POST /api/refresh
///
/// Exchanges `Authorization: Bearer <refresh_token>` for a new one hour
/// access token. The refresh token itself stays valid.
///
/// # Errors
/// - 401: missing header, or unknown, expired or revoked refresh token
/// - 500: internal server error
pub async fn refresh(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let refresh_token = bearer_token(req.headers())?;
    let token = state.sessions.refresh(refresh_token).await?;

    Ok(HttpResponse::Ok().json(AccessTokenResponse { token }))
}

/// POST /api/revoke
///
/// # Errors
/// - 401: missing header or unknown refresh token
/// - 500: internal server error
pub async fn revoke(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let refresh_token = bearer_token(req.headers())?;
    state.sessions.revoke(refresh_token).await?;

    Ok(HttpResponse::NoContent().finish())
}
