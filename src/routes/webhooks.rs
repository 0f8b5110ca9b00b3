/// Billing webhook
///
/// Polka notifies us of subscription changes. Only `user.upgraded` has an
/// effect; every other event is acknowledged and ignored.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::BillingWebhookCaller;
use crate::error::AppError;
use crate::state::AppState;

/// `data` stays untyped until the event is known to need it.
#[derive(Deserialize)]
pub struct WebhookRequest {
    pub event: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl WebhookRequest {
    fn user_id(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|data| data.get("user_id"))
            .and_then(|user_id| user_id.as_str())
    }
}

/// POST /api/polka/webhooks
///
/// **Requires** `Authorization: ApiKey <polka_key>`.
///
/// # Errors
/// - 401: missing or wrong API key
/// - 400: malformed body, or `user.upgraded` without a valid `data.user_id`
/// - 404: upgraded user does not exist
pub async fn polka_webhook(
    _caller: BillingWebhookCaller,
    form: web::Json<WebhookRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state.sessions.upgrade_user(&form.event, form.user_id()).await?;

    Ok(HttpResponse::NoContent().finish())
}
