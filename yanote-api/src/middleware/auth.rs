//! Axum Middleware for Sessions and Login Enforcement
//!
//! - `session_middleware` runs on every request. A valid session token (cookie
//!   or `Authorization: Bearer`) whose user still exists attaches an
//!   [`AuthContext`] to the request. Anything else leaves the request
//!   anonymous.
//! - `login_required` guards the note pages. Anonymous requests are
//!   redirected to the login page with the original path in `next`.

use crate::auth::{cookie_value, validate_jwt_token, AuthConfig, AuthContext};
use crate::constants::LOGIN_URL;
use crate::error::{ApiError, ApiResult};
use crate::types::{login_redirect_url, Found};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use yanote_storage::Store;

// ============================================================================
// MIDDLEWARE STATE
// ============================================================================

/// Shared state for the session middleware.
#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub auth_config: Arc<AuthConfig>,

    /// Used to check that the token's user still exists.
    pub store: Arc<dyn Store>,
}

impl std::fmt::Debug for AuthMiddlewareState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthMiddlewareState")
            .field("auth_config", &self.auth_config)
            .field("store", &"<Store>")
            .finish()
    }
}

impl AuthMiddlewareState {
    pub fn new(auth_config: Arc<AuthConfig>, store: Arc<dyn Store>) -> Self {
        Self { auth_config, store }
    }
}

// ============================================================================
// MIDDLEWARE FUNCTIONS
// ============================================================================

/// Session token from the `Authorization: Bearer` header or the session
/// cookie, in that order.
fn session_token(request: &Request, config: &AuthConfig) -> Option<String> {
    let headers = request.headers();

    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return Some(token.trim().to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find_map(|h| cookie_value(h, &config.session_cookie))
}

/// Resolve the session of a request to a live user.
async fn resolve_session(state: &AuthMiddlewareState, token: &str) -> ApiResult<Option<AuthContext>> {
    let claims = match validate_jwt_token(&state.auth_config, token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(code = %e.code, "Ignoring invalid session token");
            return Ok(None);
        }
    };

    let user_id = claims.sub;
    let user = state.store.user_get(user_id).await?;
    if user.is_none() {
        tracing::info!(user_id = %user_id, "Session token for unknown user");
    }
    Ok(user.as_ref().map(AuthContext::from_user))
}

/// Attach the logged-in user to the request, if there is one.
///
/// Invalid or expired tokens are not an error: the request simply continues
/// anonymously. Only a storage failure aborts the request.
pub async fn session_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let token = session_token(&request, &state.auth_config);
    let auth_context = match token {
        Some(token) => resolve_session(&state, &token)
            .await
            .map_err(AuthMiddlewareError)?,
        None => None,
    };

    if let Some(auth_context) = auth_context {
        request.extensions_mut().insert(auth_context);
    }

    Ok(next.run(request).await)
}

/// Redirect anonymous visitors to the login page.
///
/// Must run inside `session_middleware`.
pub async fn login_required(request: Request, next: Next) -> Response {
    if request.extensions().get::<AuthContext>().is_some() {
        return next.run(request).await;
    }

    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    tracing::debug!(path = %path, "Anonymous request to protected page");

    Found::to(login_redirect_url(LOGIN_URL, path)).into_response()
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Error wrapper for middleware that implements IntoResponse.
#[derive(Debug)]
pub struct AuthMiddlewareError(pub ApiError);

impl IntoResponse for AuthMiddlewareError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

// ============================================================================
// TYPED EXTRACTOR
// ============================================================================

/// Typed Axum extractor for the logged-in user.
///
/// ```rust,no_run
/// use axum::Json;
/// use yanote_api::middleware::AuthExtractor;
///
/// async fn whoami(AuthExtractor(auth): AuthExtractor) -> Json<String> {
///     Json(auth.username)
/// }
/// ```
///
/// Only valid behind `login_required`. Without it the extractor answers
/// 500, because a missing context there is a routing bug.
#[derive(Debug, Clone)]
pub struct AuthExtractor(pub AuthContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthExtractor
where
    S: Send + Sync,
{
    type Rejection = AuthMiddlewareError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(AuthExtractor)
            .ok_or_else(|| {
                AuthMiddlewareError(ApiError::internal_error(
                    "AuthContext not found in request extensions. \
                     Ensure login_required is applied to this route.",
                ))
            })
    }
}

impl std::ops::Deref for AuthExtractor {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// The logged-in user, or `None` for anonymous visitors.
#[derive(Debug, Clone)]
pub struct MaybeAuth(pub Option<AuthContext>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuth(parts.extensions.get::<AuthContext>().cloned()))
    }
}

// ============================================================================
// TESTS
// ============================================================================
