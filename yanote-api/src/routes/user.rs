//! Account Routes
//!
//! Login, logout and signup. All of them are reachable anonymously.

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Form, Json,
};
use std::sync::Arc;
use yanote_core::{AccountFormView, LoginForm, SignupForm};
use yanote_storage::Store;

use crate::{
    auth::{expired_session_cookie, generate_jwt_token, is_safe_redirect, session_cookie, AuthConfig},
    constants::{LOGIN_REDIRECT_URL, LOGIN_URL},
    error::ApiResult,
    middleware::MaybeAuth,
    services,
    types::{AccountFormResponse, Found, MessageResponse, NextQuery},
};

#[cfg(feature = "openapi")]
use crate::error::ApiError;

/// Where to send the user after a successful login.
///
/// The form field wins over the query string; anything that is not a local
/// path falls back to the home page.
fn redirect_target(form_next: Option<&str>, query_next: Option<&str>) -> String {
    form_next
        .filter(|next| !next.is_empty())
        .or(query_next)
        .filter(|next| is_safe_redirect(next))
        .unwrap_or(LOGIN_REDIRECT_URL)
        .to_string()
}

/// GET /auth/login/ - Login form
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/auth/login/",
    tag = "Users",
    responses(
        (status = 200, description = "Login form", body = AccountFormResponse),
    ),
))]
pub async fn login_page() -> impl IntoResponse {
    Json(AccountFormResponse {
        form: AccountFormView::blank(),
    })
}

/// POST /auth/login/ - Check credentials and start a session
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/auth/login/",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    tag = "Users",
    responses(
        (status = 302, description = "Logged in, redirect to `next` or home"),
        (status = 400, description = "Invalid credentials", body = ApiError),
    ),
))]
pub async fn login(
    State(store): State<Arc<dyn Store>>,
    State(auth_config): State<Arc<AuthConfig>>,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> ApiResult<Found> {
    let user = services::authenticate(store.as_ref(), &form).await?;
    let token = generate_jwt_token(&auth_config, &user)?;

    tracing::info!(user_id = %user.user_id, "User logged in");
    let target = redirect_target(form.next.as_deref(), query.next.as_deref());
    Ok(Found::to(target).with_cookie(session_cookie(&auth_config, &token)))
}

/// GET or POST /auth/logout/ - End the session
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/auth/logout/",
    tag = "Users",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
    ),
))]
pub async fn logout(
    State(auth_config): State<Arc<AuthConfig>>,
    MaybeAuth(auth): MaybeAuth,
) -> impl IntoResponse {
    if let Some(auth) = &auth {
        tracing::info!(user_id = %auth.user_id, "User logged out");
    }
    (
        [(header::SET_COOKIE, expired_session_cookie(&auth_config).to_string())],
        Json(MessageResponse::new("You have been logged out.")),
    )
}

/// GET /auth/signup/ - Signup form
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/auth/signup/",
    tag = "Users",
    responses(
        (status = 200, description = "Signup form", body = AccountFormResponse),
    ),
))]
pub async fn signup_page() -> impl IntoResponse {
    Json(AccountFormResponse {
        form: AccountFormView::blank(),
    })
}

/// POST /auth/signup/ - Register an account
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/auth/signup/",
    request_body(content = SignupForm, content_type = "application/x-www-form-urlencoded"),
    tag = "Users",
    responses(
        (status = 302, description = "Account created, redirect to login"),
        (status = 400, description = "Invalid form", body = ApiError),
    ),
))]
pub async fn signup(
    State(store): State<Arc<dyn Store>>,
    Form(form): Form<SignupForm>,
) -> ApiResult<Found> {
    services::register_user(store.as_ref(), form).await?;
    Ok(Found::to(LOGIN_URL))
}
