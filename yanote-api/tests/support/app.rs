//! Router-level test harness.
//!
//! Builds the full router over an in-memory store seeded with an author, a
//! reader and one note, and mints session cookies without going through the
//! login form.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use tower::ServiceExt;
use yanote_api::{auth::JwtSecret, create_router, generate_jwt_token, ApiConfig, AppState, AuthConfig};
use yanote_core::{Note, NoteId, User, UserId, YanoteResult};
use yanote_storage::{InMemoryStore, NoteStore, Store, UserStore};
use yanote_test_utils::fixtures::Scenario;

pub const TEST_SECRET: &str = "integration-test-secret-with-enough-length";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub auth_config: AuthConfig,
    pub author: User,
    pub reader: User,
    pub note: Note,
}

pub fn test_auth_config() -> Result<AuthConfig, String> {
    Ok(AuthConfig {
        jwt_secret: JwtSecret::new(TEST_SECRET.to_string()).map_err(|e| e.to_string())?,
        ..AuthConfig::default()
    })
}

/// Delegates to an [`InMemoryStore`] but always reports slugs as free, so
/// the form check passes and the insert itself hits the collision, as when
/// another request claims the slug in between.
pub struct StaleSlugCheck(pub Arc<InMemoryStore>);

#[async_trait]
impl NoteStore for StaleSlugCheck {
    async fn note_insert(&self, note: &Note) -> YanoteResult<()> {
        self.0.note_insert(note).await
    }

    async fn note_get_by_slug(&self, slug: &str) -> YanoteResult<Option<Note>> {
        self.0.note_get_by_slug(slug).await
    }

    async fn note_list_by_author(&self, author_id: UserId) -> YanoteResult<Vec<Note>> {
        self.0.note_list_by_author(author_id).await
    }

    async fn note_update(&self, note: &Note) -> YanoteResult<()> {
        self.0.note_update(note).await
    }

    async fn note_delete(&self, id: NoteId) -> YanoteResult<()> {
        self.0.note_delete(id).await
    }

    async fn note_slug_exists(&self, _slug: &str, _exclude: Option<NoteId>) -> YanoteResult<bool> {
        Ok(false)
    }

    async fn note_count(&self) -> YanoteResult<u64> {
        self.0.note_count().await
    }
}

#[async_trait]
impl UserStore for StaleSlugCheck {
    async fn user_insert(&self, user: &User) -> YanoteResult<()> {
        self.0.user_insert(user).await
    }

    async fn user_get(&self, id: UserId) -> YanoteResult<Option<User>> {
        self.0.user_get(id).await
    }

    async fn user_get_by_username(&self, username: &str) -> YanoteResult<Option<User>> {
        self.0.user_get_by_username(username).await
    }
}

impl TestApp {
    pub async fn new() -> Result<Self, String> {
        Self::build(|store| store).await
    }

    /// A router whose store skips the slug pre-check.
    pub async fn with_stale_slug_check() -> Result<Self, String> {
        Self::build(|store| Arc::new(StaleSlugCheck(store))).await
    }

    async fn build(
        wrap: impl FnOnce(Arc<InMemoryStore>) -> Arc<dyn Store>,
    ) -> Result<Self, String> {
        let scenario = Scenario::new().await.map_err(|e| e.to_string())?;
        let store = Arc::new(scenario.store);
        let auth_config = test_auth_config()?;

        let shared = wrap(store.clone());
        let state = AppState::new(shared, auth_config.clone());
        let router = create_router(state, &ApiConfig::default());

        Ok(Self {
            router,
            store,
            auth_config,
            author: scenario.author,
            reader: scenario.reader,
            note: scenario.note,
        })
    }

    /// `Cookie` header value that logs `user` in.
    pub fn force_login(&self, user: &User) -> Result<String, String> {
        let token = generate_jwt_token(&self.auth_config, user).map_err(|e| e.to_string())?;
        Ok(format!("{}={}", self.auth_config.session_cookie, token))
    }

    pub async fn send(&self, request: Request<Body>) -> Result<Response, String> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Result<Response, String> {
        self.send(build_request(Method::GET, uri, cookie, None)?).await
    }

    pub async fn post_form(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        cookie: Option<&str>,
    ) -> Result<Response, String> {
        self.send(build_request(Method::POST, uri, cookie, Some(encode_form(fields)))?)
            .await
    }

    /// POST without a body or `Content-Type`.
    pub async fn post_empty(&self, uri: &str, cookie: Option<&str>) -> Result<Response, String> {
        self.send(build_request(Method::POST, uri, cookie, None)?).await
    }

    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> Result<Response, String> {
        self.send(build_request(Method::DELETE, uri, cookie, None)?).await
    }

    pub async fn note_count(&self) -> Result<u64, String> {
        self.store.note_count().await.map_err(|e| e.to_string())
    }

    pub async fn note_by_slug(&self, slug: &str) -> Result<Option<Note>, String> {
        self.store
            .note_get_by_slug(slug)
            .await
            .map_err(|e| e.to_string())
    }
}

pub fn encode_form(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn build_request(
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    form: Option<String>,
) -> Result<Request<Body>, String> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let body = match form {
        Some(form) => {
            builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
            Body::from(form)
        }
        None => Body::empty(),
    };
    builder.body(body).map_err(|e| e.to_string())
}

pub async fn body_bytes(response: Response) -> Result<axum::body::Bytes, String> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .map_err(|e| format!("Failed to read body: {:?}", e))
}

pub async fn body_json(response: Response) -> Result<serde_json::Value, String> {
    let body = body_bytes(response).await?;
    serde_json::from_slice(&body).map_err(|e| format!("Invalid JSON body: {}", e))
}

pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// Assert a `302 Found` to `expected`.
pub fn assert_redirects(response: &Response, expected: &str) {
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(response), Some(expected));
}

/// Where an anonymous visitor of `path` is sent.
pub fn login_redirect(path: &str) -> String {
    format!("/auth/login/?next={}", path)
}
