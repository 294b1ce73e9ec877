//! Middleware modules for the yanote API
//!
//! # Middleware Order
//!
//! ```ignore
//! Router::new()
//!     .route("/notes/", get(list))
//!     // Only on protected routes; needs the session resolved first
//!     .route_layer(middleware::from_fn(login_required))
//!     .route("/", get(home))
//!     // Outermost: resolves the session for every route
//!     .layer(middleware::from_fn_with_state(auth_state, session_middleware))
//! ```

mod auth;

pub use auth::{
    login_required, session_middleware, AuthExtractor, AuthMiddlewareError, AuthMiddlewareState,
    MaybeAuth,
};
