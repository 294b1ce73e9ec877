//! OpenAPI document for the yanote pages.
//!
//! Built by utoipa from the route annotations and the payload types, and
//! served at `/openapi.json`.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::auth::DEFAULT_SESSION_COOKIE;
use crate::error::{ApiError, ErrorCode};
use crate::routes::{health, note, user};
use crate::types::{
    AccountFormResponse, MessageResponse, NoteFormResponse, NoteListResponse, NoteResponse,
};

use yanote_core::{
    AccountFormView, FormErrors, LoginForm, Note, NoteForm, NoteFormView, SignupForm, UserInfo,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "yanote API",
        version = "0.1.0",
        description = "Personal notes addressed by slug, visible only to their author",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8000", description = "Local Development")
    ),
    tags(
        (name = "Notes", description = "Note pages: list, add, detail, edit, delete"),
        (name = "Users", description = "Signup, login and logout"),
        (name = "Health", description = "Liveness")
    ),
    paths(
        note::home,
        note::list_notes,
        note::add_page,
        note::add_note,
        note::success,
        note::note_detail,
        note::edit_page,
        note::edit_note,
        note::delete_page,
        note::delete_note,

        user::login_page,
        user::login,
        user::logout,
        user::signup_page,
        user::signup,

        health::liveness,
    ),
    components(schemas(
        Note,
        UserInfo,
        NoteForm,
        LoginForm,
        SignupForm,
        NoteFormView,
        AccountFormView,
        FormErrors,
        MessageResponse,
        NoteListResponse,
        NoteResponse,
        NoteFormResponse,
        AccountFormResponse,
        health::HealthResponse,
        ApiError,
        ErrorCode,
    )),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Session cookie and bearer token schemes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(DEFAULT_SESSION_COOKIE))),
            );
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

impl ApiDoc {
    /// Render the OpenAPI document as pretty JSON.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}
