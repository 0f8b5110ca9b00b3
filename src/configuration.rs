use serde::Deserialize;

use crate::error::ConfigError;

/// Process-wide settings, loaded once at startup.
///
/// Sources, later ones winning:
/// 1. built-in defaults
/// 2. an optional `configuration.{toml,yaml,json}` file
/// 3. environment variables (`DB_URL`, `SECRET`, `POLKA_KEY`, `PLATFORM`, ...),
///    with a `.env` file loaded into the environment first
#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub db_url: String,
    /// HMAC signing secret for access tokens
    pub secret: String,
    /// API key the billing webhook must present
    pub polka_key: String,
    pub platform: Platform,
    pub port: u16,
    pub filepath_root: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout_seconds: u64,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Dev,
    #[serde(other)]
    Production,
}

impl Platform {
    pub fn is_dev(&self) -> bool {
        matches!(self, Platform::Dev)
    }
}

/// Access token signing settings
#[derive(Clone, Debug)]
pub struct JwtSettings {
    pub secret: String,
}

impl Settings {
    pub fn jwt(&self) -> JwtSettings {
        JwtSettings {
            secret: self.secret.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("DB_URL", &self.db_url),
            ("SECRET", &self.secret),
            ("POLKA_KEY", &self.polka_key),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingRequired(name.to_string()));
            }
        }

        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "DB_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let settings = config::Config::builder()
        .set_default("db_url", "")?
        .set_default("secret", "")?
        .set_default("polka_key", "")?
        .set_default("platform", "")?
        .set_default("port", 8080_i64)?
        .set_default("filepath_root", ".")?
        .set_default("db_max_connections", 5_i64)?
        .set_default("db_acquire_timeout_seconds", 5_i64)?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(config::Environment::default())
        .build()?;

    let settings = settings.try_deserialize::<Settings>()?;
    settings.validate()?;

    Ok(settings)
}
