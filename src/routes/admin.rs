use actix_web::{web, HttpResponse};

use crate::error::AppError;
use crate::state::AppState;

fn metrics_page(hits: i32) -> String {
    format!(
        r#"<html>
  <body>
    <h1>Welcome, Chirpy Admin</h1>
    <p>Chirpy has been visited {} times!</p>
  </body>
</html>"#,
        hits
    )
}

/// GET /admin/metrics
pub async fn metrics(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html")
        .body(metrics_page(state.file_server_hits.load()))
}

/// POST /admin/reset
///
/// Dev only: wipes every user (and with them all chirps and refresh tokens)
/// and zeroes the hit counter.
pub async fn reset(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    if !state.platform.is_dev() {
        tracing::warn!("Reset attempted outside the dev platform");
        return Ok(HttpResponse::Forbidden().finish());
    }

    state.store.delete_all_users().await?;
    state.file_server_hits.reset();

    tracing::info!("All users deleted and hit counter reset");
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Hits reset to 0 and database reset to initial state."))
}
