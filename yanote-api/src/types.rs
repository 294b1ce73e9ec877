//! Response payloads and redirect helpers.
//!
//! Each page answers with a small JSON document in place of a rendered
//! template. Field names follow the template context they replace.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use cookie::Cookie;
use serde::{Deserialize, Serialize};
use yanote_core::{AccountFormView, Note, NoteFormView};

// ============================================================================
// PAGES
// ============================================================================

/// Static pages: home, success, logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MessageResponse {
    pub message: String,

    /// Username of the logged-in visitor, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            username: None,
        }
    }

    pub fn for_user(mut self, username: Option<String>) -> Self {
        self.username = username;
        self
    }
}

/// The caller's notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NoteListResponse {
    pub object_list: Vec<Note>,
}

/// A single note (detail page and delete confirmation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NoteResponse {
    pub note: Note,
}

/// Add and edit pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NoteFormResponse {
    pub form: NoteFormView,
}

/// Login and signup pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AccountFormResponse {
    pub form: AccountFormView,
}

/// Query string accepted by the login page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

// ============================================================================
// REDIRECTS
// ============================================================================

/// `302 Found` redirect.
///
/// Axum's `Redirect::to` answers `303 See Other`; page flows here expect the
/// classic `302`.
#[derive(Debug, Clone)]
pub struct Found {
    location: String,
    set_cookie: Option<Cookie<'static>>,
}

impl Found {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            set_cookie: None,
        }
    }

    /// Attach a `Set-Cookie` header to the redirect.
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.set_cookie = Some(cookie);
        self
    }
}

impl IntoResponse for Found {
    fn into_response(self) -> Response {
        let mut response = StatusCode::FOUND.into_response();
        let headers = response.headers_mut();

        match HeaderValue::from_str(&self.location) {
            Ok(value) => {
                headers.insert(header::LOCATION, value);
            }
            Err(e) => {
                tracing::error!(location = %self.location, "Invalid redirect location: {}", e);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }

        if let Some(cookie) = self.set_cookie {
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    headers.insert(header::SET_COOKIE, value);
                }
                Err(e) => {
                    tracing::error!("Invalid session cookie value: {}", e);
                    return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                }
            }
        }

        response
    }
}

/// Login URL that returns to `path` afterwards.
///
/// Slashes stay readable, everything else is percent-encoded:
/// `/auth/login/?next=/note/some-slug/`.
pub fn login_redirect_url(login_url: &str, path: &str) -> String {
    let encoded = urlencoding::encode(path).replace("%2F", "/");
    format!("{}?{}={}", login_url, crate::constants::REDIRECT_FIELD_NAME, encoded)
}
