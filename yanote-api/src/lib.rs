//! yanote API - HTTP Layer
//!
//! Axum router for the note pages and accounts. Pages answer with small JSON
//! documents; writes answer with `302` redirects. Sessions are signed JWTs
//! carried in a cookie or a bearer header.

mod macros;

pub mod auth;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod middleware;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;

pub use auth::{
    generate_jwt_token, hash_password, session_cookie, validate_jwt_token, verify_password,
    AuthConfig, AuthContext, Claims,
};
pub use config::{ApiConfig, StorageBackend};
pub use db::{DbConfig, PgStore};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{login_required, session_middleware, AuthExtractor, AuthMiddlewareState, MaybeAuth};
#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;
pub use telemetry::{init_tracing, TelemetryConfig};
