use std::net::TcpListener;
use std::sync::Arc;

use chirpy::configuration::get_configuration;
use chirpy::startup::{get_connection_pool, run};
use chirpy::state::AppState;
use chirpy::store::PgStore;
use chirpy::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!(platform = ?config.platform, "Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let pool = get_connection_pool(&configuration).map_err(|e| {
        tracing::error!("Failed to create connection pool: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Database URL error")
    })?;

    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!("Failed to migrate the database: {}", e);
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Database migration error")
    })?;
    tracing::info!("Database migrations applied");

    let state = AppState::new(Arc::new(PgStore::new(pool)), &configuration);

    let address = format!("0.0.0.0:{}", configuration.port);
    let listener = TcpListener::bind(&address)?;
    tracing::info!(
        address = %address,
        filepath_root = %configuration.filepath_root,
        "Server listening"
    );

    run(listener, state, &configuration.filepath_root)?.await
}
