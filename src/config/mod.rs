use std::env;
use std::fmt;

use thiserror::Error;

/// Minimum accepted length of the HMAC signing secret, in bytes (HS256 key size).
pub const MIN_JWT_SECRET_BYTES: usize = 32;

/// Upper bound for `SECURITY_JWT_EXPIRY_HOURS`; tokens never outlive a day.
pub const MAX_JWT_EXPIRY_HOURS: u32 = 24;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub bootstrap: Option<BootstrapAdmin>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Postgres connection URL, or `memory://` for the in-process store.
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub jwt_secret: Secret,
    /// Still accepted for verification while a rotation is in progress.
    pub jwt_previous_secret: Option<Secret>,
    pub jwt_expiry_hours: u32,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
}

/// Admin account created at startup when it does not exist yet.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: Secret,
}

/// String wrapper that keeps secrets out of `Debug` output and logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Which store backs the repositories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseBackend {
    Postgres(String),
    Memory,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like `from_env`, but the signing secret may be absent. For tools that never
    /// issue or verify tokens, such as `contacts-admin`.
    pub fn from_env_without_secret() -> Result<Self, ConfigError> {
        Self::build(|key| env::var(key).ok(), false)
    }

    /// Builds the configuration from an arbitrary key lookup. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::build(lookup, true)
    }

    fn build<F>(lookup: F, require_secret: bool) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(&lookup)?;

        config.validate(require_secret)?;
        Ok(config)
    }

    fn with_overrides<F>(mut self, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("CONTACTS_API_PORT").or_else(|| lookup("PORT")) {
            self.server.port = parse("PORT", &v)?;
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse("DATABASE_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = parse("DATABASE_CONNECTION_TIMEOUT", &v)?;
        }

        // API overrides
        if let Some(v) = lookup("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = parse("API_ENABLE_REQUEST_LOGGING", &v)?;
        }
        if let Some(v) = lookup("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = parse("API_MAX_REQUEST_SIZE_BYTES", &v)?;
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_JWT_SECRET") {
            self.security.jwt_secret = Secret::new(v);
        }
        if let Some(v) = lookup("SECURITY_JWT_PREVIOUS_SECRET").filter(|v| !v.is_empty()) {
            self.security.jwt_previous_secret = Some(Secret::new(v));
        }
        if let Some(v) = lookup("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = parse("SECURITY_JWT_EXPIRY_HOURS", &v)?;
        }
        if let Some(v) = lookup("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = parse("SECURITY_BCRYPT_COST", &v)?;
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Bootstrap admin
        match (lookup("BOOTSTRAP_ADMIN_USERNAME"), lookup("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(username), Some(password)) if !username.is_empty() => {
                self.bootstrap = Some(BootstrapAdmin {
                    username,
                    password: Secret::new(password),
                });
            }
            (Some(_), None) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_PASSWORD")),
            _ => {}
        }

        Ok(self)
    }

    fn validate(&self, require_secret: bool) -> Result<(), ConfigError> {
        let secret = self.security.jwt_secret.expose();
        if secret.is_empty() && require_secret {
            return Err(ConfigError::Missing("SECURITY_JWT_SECRET"));
        }
        if !secret.is_empty() {
            check_secret_length("SECURITY_JWT_SECRET", secret)?;
        }
        if let Some(previous) = &self.security.jwt_previous_secret {
            check_secret_length("SECURITY_JWT_PREVIOUS_SECRET", previous.expose())?;
        }
        if !(1..=MAX_JWT_EXPIRY_HOURS).contains(&self.security.jwt_expiry_hours) {
            return Err(ConfigError::Invalid {
                key: "SECURITY_JWT_EXPIRY_HOURS",
                reason: format!("must be between 1 and {}", MAX_JWT_EXPIRY_HOURS),
            });
        }
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "SECURITY_BCRYPT_COST",
                reason: "must be between 4 and 31".to_string(),
            });
        }
        if self.environment != Environment::Development && self.database.url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        Ok(())
    }

    /// Resolves the repository backend. Without `DATABASE_URL` only development falls
    /// back to the memory store; `validate` rejects that case elsewhere.
    pub fn database_backend(&self) -> DatabaseBackend {
        match self.database.url.as_deref() {
            None => DatabaseBackend::Memory,
            Some(url) if url.starts_with("memory:") => DatabaseBackend::Memory,
            Some(url) => DatabaseBackend::Postgres(url.to_string()),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                jwt_secret: Secret::new(""),
                jwt_previous_secret: None,
                jwt_expiry_hours: 24,
                bcrypt_cost: bcrypt::DEFAULT_COST,
                cors_origins: vec!["http://localhost:4200".to_string(), "http://localhost:5173".to_string()],
            },
            bootstrap: None,
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                jwt_secret: Secret::new(""),
                jwt_previous_secret: None,
                jwt_expiry_hours: 24,
                bcrypt_cost: bcrypt::DEFAULT_COST,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            bootstrap: None,
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                jwt_secret: Secret::new(""),
                jwt_previous_secret: None,
                jwt_expiry_hours: 24,
                bcrypt_cost: bcrypt::DEFAULT_COST,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            bootstrap: None,
        }
    }
}

fn check_secret_length(key: &'static str, secret: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_JWT_SECRET_BYTES {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("must be at least {} bytes", MIN_JWT_SECRET_BYTES),
        });
    }
    Ok(())
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

#[cfg(test)]
impl AppConfig {
    /// Development preset with a fixed secret and the cheapest bcrypt cost.
    pub fn for_tests() -> Self {
        let mut config = Self::development();
        config.security.jwt_secret = Secret::new("test-secret-that-is-at-least-32-bytes-long");
        config.security.bcrypt_cost = 4;
        config
    }
}
