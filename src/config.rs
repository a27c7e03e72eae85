use std::{env, time::Duration};
use thiserror::Error;

/// Secret used when `APP_ENV=local` and `JWT_SECRET` is unset.
pub const LOCAL_JWT_SECRET: &str = "local-development-secret-change-me";

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup,
/// immutable afterwards, and pulled into handlers and middleware via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and secret fallbacks.
    pub env: Env,
    // Which persistence adapter backs the services.
    pub store_backend: StoreBackend,
    // Postgres connection string. Only required for `StoreBackend::Postgres`.
    pub db_url: Option<String>,
    pub db_max_connections: u32,
    // HS256 secret used to verify bearer tokens.
    pub jwt_secret: String,
    // Role claim value that passes the authorization gate.
    pub admin_role: String,
    // Budget applied to every individual store call.
    pub store_timeout: Duration,
    pub bind_addr: String,
}

/// Env
///
/// Defines the runtime context: local development or hardened production.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// StoreBackend
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// ConfigError
///
/// Startup configuration problems. Any of these aborts the process before the
/// listener is bound.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Default for AppConfig {
    /// Safe, non-panicking values for tests. Uses the in-memory store so no
    /// database is needed.
    fn default() -> Self {
        Self {
            env: Env::Local,
            store_backend: StoreBackend::Memory,
            db_url: None,
            db_max_connections: 5,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            admin_role: "admin".to_string(),
            store_timeout: Duration::from_millis(5_000),
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from the environment and fails fast on anything
    /// missing or malformed.
    ///
    /// * `APP_ENV`: `local` (default) or `production`.
    /// * `STORE_BACKEND`: `postgres` (default) or `memory`.
    /// * `DATABASE_URL`: required with the postgres backend.
    /// * `DATABASE_MAX_CONNECTIONS`: default 5.
    /// * `JWT_SECRET`: mandatory in production.
    /// * `ADMIN_ROLE`: default `admin`.
    /// * `STORE_TIMEOUT_MS`: default 5000.
    /// * `BIND_ADDR`: default `0.0.0.0:3000`.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let store_backend = match env::var("STORE_BACKEND") {
            Err(_) => StoreBackend::Postgres,
            Ok(value) => match value.as_str() {
                "postgres" => StoreBackend::Postgres,
                "memory" => StoreBackend::Memory,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "STORE_BACKEND",
                        value,
                        reason: "expected 'postgres' or 'memory'",
                    });
                }
            },
        };

        let db_url = env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && db_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        // The production secret is mandatory; local runs fall back to a dev value.
        let jwt_secret = match (env, env::var("JWT_SECRET")) {
            (_, Ok(secret)) if !secret.is_empty() => secret,
            (Env::Production, _) => return Err(ConfigError::Missing("JWT_SECRET")),
            (Env::Local, _) => LOCAL_JWT_SECRET.to_string(),
        };

        Ok(Self {
            env,
            store_backend,
            db_url,
            db_max_connections: parse_var::<u32>("DATABASE_MAX_CONNECTIONS", 5)?,
            jwt_secret,
            admin_role: env::var("ADMIN_ROLE").unwrap_or_else(|_| "admin".to_string()),
            store_timeout: Duration::from_millis(parse_var::<u64>("STORE_TIMEOUT_MS", 5_000)?),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
        })
    }
}

/// Reads an optional numeric variable that must be greater than zero.
fn parse_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let Ok(value) = env::var(name) else {
        return Ok(default);
    };
    match value.parse::<T>() {
        Ok(parsed) if parsed > T::default() => Ok(parsed),
        _ => Err(ConfigError::Invalid {
            name,
            value,
            reason: "expected a positive integer",
        }),
    }
}
