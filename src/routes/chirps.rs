/// Chirp Routes

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::chirp::validate_chirp_body;
use crate::error::{AppError, DatabaseError, ErrorContext, ValidationError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateChirpRequest {
    pub body: String,
}

fn parse_chirp_id(raw: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(raw).map_err(|_| ValidationError::MalformedId(raw.to_string()))
}

/// POST /api/chirps
///
/// # Errors
/// - 400: body longer than 140 bytes
/// - 401: missing or invalid access token
/// - 500: internal server error
pub async fn create_chirp(
    user: AuthenticatedUser,
    form: web::Json<CreateChirpRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("chirp_creation").with_user_id(user.user_id());

    let body = validate_chirp_body(&form.body)?;
    let chirp = state.store.create_chirp(user.user_id(), &body).await?;

    tracing::info!(
        request_id = %context.request_id,
        chirp_id = %chirp.id,
        user_id = %chirp.user_id,
        "Chirp created"
    );

    Ok(HttpResponse::Created().json(chirp))
}

/// GET /api/chirps
pub async fn list_chirps(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let chirps = state.store.list_chirps().await?;

    Ok(HttpResponse::Ok().json(chirps))
}

/// GET /api/chirps/{chirp_id}
pub async fn get_chirp(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let chirp_id = parse_chirp_id(&path)?;
    let chirp = state
        .store
        .get_chirp(chirp_id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("chirp {}", chirp_id)))?;

    Ok(HttpResponse::Ok().json(chirp))
}

/// DELETE /api/chirps/{chirp_id}
///
/// Only the author may delete a chirp.
///
/// # Errors
/// - 400: malformed chirp id
/// - 401: missing or invalid access token
/// - 403: caller is not the author
/// - 404: no such chirp
pub async fn delete_chirp(
    user: AuthenticatedUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("chirp_deletion").with_user_id(user.user_id());

    let chirp_id = parse_chirp_id(&path)?;
    let chirp = state
        .store
        .get_chirp(chirp_id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("chirp {}", chirp_id)))?;

    state.sessions.ensure_author(user.user_id(), chirp.user_id)?;

    if state.store.delete_chirp(chirp_id).await? == 0 {
        return Err(DatabaseError::NotFound(format!("chirp {}", chirp_id)).into());
    }

    tracing::info!(
        request_id = %context.request_id,
        chirp_id = %chirp_id,
        "Chirp deleted"
    );

    Ok(HttpResponse::NoContent().finish())
}
