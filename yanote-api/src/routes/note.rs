//! Note Page Routes
//!
//! Handlers for the note pages. Everything except the home page sits behind
//! `login_required`, so `AuthExtractor` is always populated here.

use axum::{
    extract::{rejection::FormRejection, Path, State},
    response::IntoResponse,
    Form, Json,
};
use std::sync::Arc;
use yanote_core::{NoteForm, NoteFormView};
use yanote_storage::Store;

use crate::{
    constants::SUCCESS_URL,
    error::ApiResult,
    middleware::{AuthExtractor, MaybeAuth},
    services,
    types::{Found, MessageResponse, NoteFormResponse, NoteListResponse, NoteResponse},
};

#[cfg(feature = "openapi")]
use crate::error::ApiError;

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET / - Home page
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/",
    tag = "Notes",
    responses(
        (status = 200, description = "Home page", body = MessageResponse),
    ),
))]
pub async fn home(MaybeAuth(auth): MaybeAuth) -> impl IntoResponse {
    Json(
        MessageResponse::new("Personal notes. Log in to read and write yours.")
            .for_user(auth.map(|a| a.username)),
    )
}

/// GET /notes/ - The caller's notes
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/notes/",
    tag = "Notes",
    responses(
        (status = 200, description = "Notes of the logged-in user", body = NoteListResponse),
        (status = 302, description = "Not logged in, redirect to login"),
    ),
))]
pub async fn list_notes(
    State(store): State<Arc<dyn Store>>,
    AuthExtractor(auth): AuthExtractor,
) -> ApiResult<impl IntoResponse> {
    let object_list = services::list_notes(store.as_ref(), auth.user_id).await?;
    Ok(Json(NoteListResponse { object_list }))
}

/// GET /add/ - Empty creation form
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/add/",
    tag = "Notes",
    responses(
        (status = 200, description = "Note creation form", body = NoteFormResponse),
        (status = 302, description = "Not logged in, redirect to login"),
    ),
))]
pub async fn add_page(AuthExtractor(_auth): AuthExtractor) -> impl IntoResponse {
    Json(NoteFormResponse {
        form: NoteFormView::blank(),
    })
}

/// POST /add/ - Create a note
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/add/",
    request_body(content = NoteForm, content_type = "application/x-www-form-urlencoded"),
    tag = "Notes",
    responses(
        (status = 302, description = "Note created, redirect to success page"),
        (status = 400, description = "Invalid or unreadable form", body = ApiError),
        (status = 409, description = "Slug claimed concurrently", body = ApiError),
    ),
))]
pub async fn add_note(
    State(store): State<Arc<dyn Store>>,
    AuthExtractor(auth): AuthExtractor,
    form: Result<Form<NoteForm>, FormRejection>,
) -> ApiResult<Found> {
    let Form(form) = form?;
    services::create_note(store.as_ref(), auth.user_id, form).await?;
    Ok(Found::to(SUCCESS_URL))
}

/// GET /done/ - Success page
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/done/",
    tag = "Notes",
    responses(
        (status = 200, description = "Operation succeeded", body = MessageResponse),
        (status = 302, description = "Not logged in, redirect to login"),
    ),
))]
pub async fn success(AuthExtractor(auth): AuthExtractor) -> impl IntoResponse {
    Json(MessageResponse::new("Operation completed successfully.").for_user(Some(auth.username)))
}

/// GET /note/:slug/ - Note detail
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/note/{slug}/",
    tag = "Notes",
    params(("slug" = String, Path, description = "Note slug")),
    responses(
        (status = 200, description = "The note", body = NoteResponse),
        (status = 302, description = "Not logged in, redirect to login"),
        (status = 404, description = "No such note for this user", body = ApiError),
    ),
))]
pub async fn note_detail(
    State(store): State<Arc<dyn Store>>,
    AuthExtractor(auth): AuthExtractor,
    Path(slug): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let note = services::get_note(store.as_ref(), &slug, auth.user_id).await?;
    Ok(Json(NoteResponse { note }))
}

/// GET /edit/:slug/ - Edit form prefilled with the note
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/edit/{slug}/",
    tag = "Notes",
    params(("slug" = String, Path, description = "Note slug")),
    responses(
        (status = 200, description = "Prefilled edit form", body = NoteFormResponse),
        (status = 302, description = "Not logged in, redirect to login"),
        (status = 404, description = "No such note for this user", body = ApiError),
    ),
))]
pub async fn edit_page(
    State(store): State<Arc<dyn Store>>,
    AuthExtractor(auth): AuthExtractor,
    Path(slug): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let note = services::get_note(store.as_ref(), &slug, auth.user_id).await?;
    Ok(Json(NoteFormResponse {
        form: NoteFormView::from_note(&note),
    }))
}

/// POST /edit/:slug/ - Update a note
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/edit/{slug}/",
    request_body(content = NoteForm, content_type = "application/x-www-form-urlencoded"),
    tag = "Notes",
    params(("slug" = String, Path, description = "Note slug")),
    responses(
        (status = 302, description = "Note updated, redirect to success page"),
        (status = 400, description = "Invalid form", body = ApiError),
        (status = 404, description = "No such note for this user", body = ApiError),
    ),
))]
pub async fn edit_note(
    State(store): State<Arc<dyn Store>>,
    AuthExtractor(auth): AuthExtractor,
    Path(slug): Path<String>,
    form: Result<Form<NoteForm>, FormRejection>,
) -> ApiResult<Found> {
    // Ownership is settled before the body is looked at.
    let note = services::get_note(store.as_ref(), &slug, auth.user_id).await?;
    let Form(form) = form?;
    services::update_note(store.as_ref(), note, form).await?;
    Ok(Found::to(SUCCESS_URL))
}

/// GET /delete/:slug/ - Delete confirmation
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/delete/{slug}/",
    tag = "Notes",
    params(("slug" = String, Path, description = "Note slug")),
    responses(
        (status = 200, description = "The note about to be deleted", body = NoteResponse),
        (status = 302, description = "Not logged in, redirect to login"),
        (status = 404, description = "No such note for this user", body = ApiError),
    ),
))]
pub async fn delete_page(
    State(store): State<Arc<dyn Store>>,
    AuthExtractor(auth): AuthExtractor,
    Path(slug): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let note = services::get_note(store.as_ref(), &slug, auth.user_id).await?;
    Ok(Json(NoteResponse { note }))
}

/// POST or DELETE /delete/:slug/ - Delete a note
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/delete/{slug}/",
    tag = "Notes",
    params(("slug" = String, Path, description = "Note slug")),
    responses(
        (status = 302, description = "Note deleted, redirect to success page"),
        (status = 404, description = "No such note for this user", body = ApiError),
    ),
))]
pub async fn delete_note(
    State(store): State<Arc<dyn Store>>,
    AuthExtractor(auth): AuthExtractor,
    Path(slug): Path<String>,
) -> ApiResult<Found> {
    services::delete_note(store.as_ref(), &slug, auth.user_id).await?;
    Ok(Found::to(SUCCESS_URL))
}
