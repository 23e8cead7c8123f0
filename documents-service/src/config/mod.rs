use dotenvy::dotenv;
use secrecy::Secret;
use serde::Deserialize;
use service_core::error::AppError;
use std::env;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub service_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

fn env_or<T: std::str::FromStr>(name: &str, default: &str) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid {}: {}", name, e)))
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let host = env::var("DOCUMENTS_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env_or("DOCUMENTS_SERVICE_PORT", "3006")?;

        let db_url =
            env::var("DOCUMENTS_DATABASE_URL").expect("DOCUMENTS_DATABASE_URL must be set");
        let max_connections = env_or("DOCUMENTS_DATABASE_MAX_CONNECTIONS", "10")?;
        let min_connections = env_or("DOCUMENTS_DATABASE_MIN_CONNECTIONS", "1")?;

        Ok(Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: Secret::new(db_url),
                max_connections,
                min_connections,
            },
            service_name: "documents-service".to_string(),
        })
    }
}
