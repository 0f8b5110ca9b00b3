use actix_files as fs;
use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::net::TcpListener;
use std::time::Duration;

use crate::configuration::Settings;
use crate::error::{AppError, ValidationError};
use crate::middleware::{MetricsMiddleware, RequestLogger};
use crate::routes::{
    create_chirp, delete_chirp, get_chirp, health_check, list_chirps, login, metrics,
    polka_webhook, refresh, register, reset, revoke, update_user,
};
use crate::state::AppState;

/// Lazily connecting pool; the acquire timeout bounds every database call.
pub fn get_connection_pool(settings: &Settings) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(settings.db_max_connections)
        .acquire_timeout(Duration::from_secs(settings.db_acquire_timeout_seconds))
        .connect_lazy(&settings.db_url)
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::Validation(ValidationError::InvalidBody(err.to_string())).into()
    })
}

pub fn run(
    listener: TcpListener,
    state: AppState,
    filepath_root: &str,
) -> Result<Server, std::io::Error> {
    let file_server_hits = state.file_server_hits.clone();
    let state = web::Data::new(state);
    let filepath_root = filepath_root.to_string();

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(RequestLogger)

            // Shared state
            .app_data(state.clone())
            .app_data(json_config())

            // Operational
            .route("/api/healthz", web::get().to(health_check))
            .route("/admin/metrics", web::get().to(metrics))
            .route("/admin/reset", web::post().to(reset))

            // Users and sessions
            .route("/api/users", web::post().to(register))
            .route("/api/users", web::put().to(update_user))
            .route("/api/login", web::post().to(login))
            .route("/api/refresh", web::post().to(refresh))
            .route("/api/revoke", web::post().to(revoke))

            // Chirps
            .route("/api/chirps", web::get().to(list_chirps))
            .route("/api/chirps", web::post().to(create_chirp))
            .route("/api/chirps/{chirp_id}", web::get().to(get_chirp))
            .route("/api/chirps/{chirp_id}", web::delete().to(delete_chirp))

            // Billing webhook
            .route("/api/polka/webhooks", web::post().to(polka_webhook))

            // Static files, counted
            .service(
                web::scope("/app")
                    .wrap(MetricsMiddleware::new(file_server_hits.clone()))
                    .service(fs::Files::new("/", &filepath_root).index_file("index.html")),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
