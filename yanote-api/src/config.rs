//! Server settings.
//!
//! Bind address, CORS policy and storage backend, read from `YANOTE_*`
//! variables. Unset variables fall back to local-development values.

use crate::constants::{DEFAULT_CORS_MAX_AGE_SECS, DEFAULT_PORT};
use std::net::SocketAddr;
use yanote_core::ConfigError;

// ============================================================================
// STORAGE BACKEND
// ============================================================================

/// Which store backs the notes and users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// Process-local maps. Data is lost on restart.
    #[default]
    Memory,

    /// PostgreSQL via deadpool.
    Postgres,
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" | "" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" | "pg" => Ok(StorageBackend::Postgres),
            other => Err(ConfigError::InvalidValue {
                field: "YANOTE_STORAGE".to_string(),
                value: other.to_string(),
                reason: "expected 'memory' or 'postgres'".to_string(),
            }),
        }
    }
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Interface to bind.
    pub bind_host: String,

    /// Port to listen on.
    pub port: u16,

    /// Origins allowed cross-site; `*.domain` matches https subdomains.
    /// Empty allows any origin.
    pub cors_origins: Vec<String>,

    pub cors_allow_credentials: bool,

    /// Preflight cache lifetime.
    pub cors_max_age_secs: u64,

    pub storage: StorageBackend,

    /// Deployment environment name (`development`, `production`, ...).
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: DEFAULT_CORS_MAX_AGE_SECS,
            storage: StorageBackend::default(),
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// | Variable | Default |
    /// |---|---|
    /// | `YANOTE_API_BIND` | `0.0.0.0` |
    /// | `PORT`, then `YANOTE_API_PORT` | `8000` |
    /// | `YANOTE_CORS_ORIGINS` (comma-separated) | any origin |
    /// | `YANOTE_CORS_ALLOW_CREDENTIALS` | `false` |
    /// | `YANOTE_CORS_MAX_AGE_SECS` | `86400` |
    /// | `YANOTE_STORAGE` (`memory` or `postgres`) | `memory` |
    /// | `YANOTE_ENVIRONMENT` | `development` |
    ///
    /// # Errors
    /// An unparsable port or an unknown storage backend.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_host =
            std::env::var("YANOTE_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = match std::env::var("PORT")
            .ok()
            .or_else(|| std::env::var("YANOTE_API_PORT").ok())
        {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: "PORT".to_string(),
                value: value.clone(),
                reason: "must be a port number".to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let cors_origins = std::env::var("YANOTE_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_allow_credentials = std::env::var("YANOTE_CORS_ALLOW_CREDENTIALS")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(false);

        let cors_max_age_secs = std::env::var("YANOTE_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CORS_MAX_AGE_SECS);

        let storage = match std::env::var("YANOTE_STORAGE") {
            Ok(value) => value.parse()?,
            Err(_) => StorageBackend::default(),
        };

        let environment = std::env::var("YANOTE_ENVIRONMENT")
            .map(|e| e.to_lowercase())
            .unwrap_or_else(|_| "development".to_string());

        Ok(Self {
            bind_host,
            port,
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
            storage,
            environment,
        })
    }

    /// Socket address to listen on.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse().map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
            field: "YANOTE_API_BIND".to_string(),
            value: addr.clone(),
            reason: e.to_string(),
        })
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "production" | "prod")
    }

    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.cors_origins.is_empty()
            || self.cors_origins.iter().any(|allowed| {
                allowed == origin
                    || allowed.strip_prefix("*.").is_some_and(|domain| {
                        origin
                            .strip_prefix("https://")
                            .and_then(|host| host.strip_suffix(domain))
                            .is_some_and(|sub| sub.ends_with('.'))
                    })
            })
    }
}
