/// Authorization header parsing
///
/// `Authorization: Bearer <token>` carries access and refresh tokens,
/// `Authorization: ApiKey <key>` is only used by the billing webhook.

use actix_web::dev::Payload;
use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use actix_web::{web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::error::{AppError, AuthError};
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";
const API_KEY_PREFIX: &str = "ApiKey ";

/// Credential following `Bearer ` in the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    credential(headers, BEARER_PREFIX)
}

/// Credential following `ApiKey ` in the Authorization header
pub fn api_key(headers: &HeaderMap) -> Result<&str, AuthError> {
    credential(headers, API_KEY_PREFIX)
}

fn credential<'a>(headers: &'a HeaderMap, prefix: &str) -> Result<&'a str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthorization)?
        .to_str()
        .map_err(|_| AuthError::MalformedAuthorization)?;

    if value.is_empty() {
        return Err(AuthError::MissingAuthorization);
    }

    let credential = value
        .strip_prefix(prefix)
        .ok_or(AuthError::MalformedAuthorization)?
        .trim_matches(|c: char| c.is_ascii_whitespace());

    if credential.is_empty() {
        return Err(AuthError::MalformedAuthorization);
    }

    Ok(credential)
}

/// The user behind a valid bearer access token
///
/// Used as a handler argument on every route that mutates chirps or
/// credentials. Missing headers and invalid tokens both reject with 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

impl AuthenticatedUser {
    pub fn user_id(&self) -> Uuid {
        self.0
    }

    fn from_http_request(req: &HttpRequest) -> Result<Self, AppError> {
        let state = app_state(req)?;
        let token = bearer_token(req.headers())?;
        let user_id = state.sessions.authorize(token)?;

        tracing::debug!(user_id = %user_id, "Access token validated");
        Ok(AuthenticatedUser(user_id))
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_http_request(req))
    }
}

/// A billing webhook delivery that presented the configured API key
///
/// Declared before the body extractor so a bad key is rejected with 401
/// before the payload is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingWebhookCaller;

impl BillingWebhookCaller {
    fn from_http_request(req: &HttpRequest) -> Result<Self, AppError> {
        let state = app_state(req)?;
        let key = api_key(req.headers())?;
        state.sessions.verify_api_key(key)?;

        Ok(BillingWebhookCaller)
    }
}

impl FromRequest for BillingWebhookCaller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_http_request(req))
    }
}

fn app_state(req: &HttpRequest) -> Result<&web::Data<AppState>, AppError> {
    req.app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("Application state is not configured".to_string()))
}
