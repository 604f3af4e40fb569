use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::auth::MAX_TOKEN_EXPIRY_DAYS;

/// Secret the service historically fell back to when none was configured.
/// Refused at startup.
pub const PLACEHOLDER_SECRET: &str = "demo-secret";

const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiry_days: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_any_origin: bool,
    pub max_age: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Self::defaults()?
            // Add in settings from the config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // E.g., `APP_SERVER__PORT=5001` would set `Settings.server.port`
            .add_source(
                Environment::with_prefix("app")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
            )
            .set_override_option("auth.jwt_secret", env::var("JWT_SECRET").ok())?
            .build()?;

        let settings: Settings = s.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Every key except `auth.jwt_secret`, which has no default on purpose.
    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("environment", "development")?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("store.path", "/tmp/users.json")?
            .set_default("auth.token_expiry_days", 7)?
            .set_default("auth.bcrypt_cost", 10)?
            .set_default("cors.allow_any_origin", true)?
            .set_default("cors.max_age", 3600)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let secret = self.auth.jwt_secret.trim();
        if secret.is_empty() {
            return Err(ConfigError::Message(
                "auth.jwt_secret is empty; set JWT_SECRET or APP_AUTH__JWT_SECRET".into(),
            ));
        }
        if secret == PLACEHOLDER_SECRET {
            return Err(ConfigError::Message(format!(
                "auth.jwt_secret must not be the placeholder value '{}'",
                PLACEHOLDER_SECRET
            )));
        }
        if !(1..=MAX_TOKEN_EXPIRY_DAYS).contains(&self.auth.token_expiry_days) {
            return Err(ConfigError::Message(format!(
                "auth.token_expiry_days must be between 1 and {}",
                MAX_TOKEN_EXPIRY_DAYS
            )));
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.auth.bcrypt_cost) {
            return Err(ConfigError::Message(format!(
                "auth.bcrypt_cost must be between {} and {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST
            )));
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn new_for_test() -> Result<Self, ConfigError> {
        Self::defaults()?
            .set_default("environment", "test")?
            .set_default("store.path", "/tmp/flatfile-auth-test-users.json")?
            .set_default("auth.jwt_secret", "test_secret")?
            .set_default("auth.bcrypt_cost", 4)?
            .add_source(
                Environment::with_prefix("app")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?
            .try_deserialize()
    }
}
