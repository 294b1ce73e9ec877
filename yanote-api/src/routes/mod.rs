//! HTTP Routes Module
//!
//! Route handlers grouped by page family, plus the router that wires them
//! together with sessions, login enforcement, CORS and request tracing.

pub mod health;
pub mod note;
pub mod user;

use std::time::Duration;

use axum::{
    http::{header, request::Parts, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ApiConfig;
use crate::middleware::{login_required, session_middleware};
use crate::state::AppState;

// ============================================================================
// OPENAPI ENDPOINT
// ============================================================================

/// Handler for /openapi.json endpoint.
#[cfg(feature = "openapi")]
async fn openapi_json() -> impl axum::response::IntoResponse {
    use utoipa::OpenApi;
    axum::Json(crate::openapi::ApiDoc::openapi())
}

// ============================================================================
// CORS
// ============================================================================

/// Build the CORS layer from API configuration.
///
/// With no configured origins every origin is allowed (development). Otherwise
/// only the listed origins, including `*.domain` wildcards, are accepted.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        return cors.allow_origin(Any);
    }

    tracing::info!(
        "CORS: Production mode - allowing origins: {:?}",
        config.cors_origins
    );
    let allowed = config.clone();
    let cors = cors.allow_origin(AllowOrigin::predicate(
        move |origin: &HeaderValue, _parts: &Parts| {
            origin
                .to_str()
                .map(|origin| allowed.is_origin_allowed(origin))
                .unwrap_or(false)
        },
    ));

    if config.cors_allow_credentials {
        cors.allow_credentials(true)
    } else {
        cors
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Build the complete application router.
///
/// ```text
/// CORS -> trace -> session -> [login_required] -> handler
/// ```
pub fn create_router(state: AppState, config: &ApiConfig) -> Router {
    let protected = Router::new()
        .route("/notes/", get(note::list_notes))
        .route("/add/", get(note::add_page).post(note::add_note))
        .route("/done/", get(note::success))
        .route("/note/:slug/", get(note::note_detail))
        .route("/edit/:slug/", get(note::edit_page).post(note::edit_note))
        .route(
            "/delete/:slug/",
            get(note::delete_page)
                .post(note::delete_note)
                .delete(note::delete_note),
        )
        .route_layer(from_fn(login_required));

    let public = Router::new()
        .route("/", get(note::home))
        .route("/auth/login/", get(user::login_page).post(user::login))
        .route("/auth/logout/", get(user::logout).post(user::logout))
        .route("/auth/signup/", get(user::signup_page).post(user::signup))
        .route("/health/live", get(health::liveness));

    #[cfg(feature = "openapi")]
    let public = public.route("/openapi.json", get(openapi_json));

    public
        .merge(protected)
        .layer(from_fn_with_state(
            state.auth_middleware_state(),
            session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(config))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthConfig;
    use axum::{body::Body, http::StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;
    use yanote_storage::InMemoryStore;

    fn test_router(config: &ApiConfig) -> Router {
        let state = AppState::new(Arc::new(InMemoryStore::new()), AuthConfig::default());
        create_router(state, config)
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() -> Result<(), String> {
        let config = ApiConfig {
            cors_origins: vec!["https://yanote.example".to_string()],
            ..ApiConfig::default()
        };

        let request = axum::http::Request::builder()
            .uri("/health/live")
            .header(header::ORIGIN, "https://yanote.example")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;
        let response = test_router(&config)
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("https://yanote.example")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_cors_rejects_unknown_origin() -> Result<(), String> {
        let config = ApiConfig {
            cors_origins: vec!["https://yanote.example".to_string()],
            ..ApiConfig::default()
        };

        let request = axum::http::Request::builder()
            .uri("/health/live")
            .header(header::ORIGIN, "https://evil.example")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;
        let response = test_router(&config)
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;

        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
        Ok(())
    }

    #[cfg(feature = "openapi")]
    #[tokio::test]
    async fn test_openapi_json_endpoint_exists() -> Result<(), String> {
        let request = axum::http::Request::builder()
            .uri("/openapi.json")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;
        let response = test_router(&ApiConfig::default())
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;

        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }
}
