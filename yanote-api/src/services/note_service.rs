//! Note Service
//!
//! Business logic behind the note pages. Every record-scoped operation looks
//! the note up by slug and checks ownership first, so a visitor never learns
//! anything about another author's note, not even whether a submitted form
//! would have been valid.

use yanote_core::{
    scope_note, slug_taken_message, visible_to, Note, NoteForm, NoteFormView, UserId,
};
use yanote_storage::Store;

use crate::error::{ApiError, ApiResult};

/// The viewer's notes in creation order.
pub async fn list_notes(store: &dyn Store, viewer: UserId) -> ApiResult<Vec<Note>> {
    let notes = store.note_list_by_author(viewer).await?;
    Ok(visible_to(notes, viewer))
}

/// Load a note the viewer owns.
///
/// # Errors
/// `NOTE_NOT_FOUND` when the slug is unknown or the note belongs to someone
/// else.
pub async fn get_note(store: &dyn Store, slug: &str, viewer: UserId) -> ApiResult<Note> {
    let note = store
        .note_get_by_slug(slug)
        .await?
        .ok_or_else(|| ApiError::note_not_found())?;
    scope_note(note, viewer).ok_or_else(|| {
        tracing::warn!(slug = %slug, viewer = %viewer, "Request for another author's note");
        ApiError::note_not_found()
    })
}

/// Validate a submitted note form against the store.
///
/// Returns the cleaned fields, or the form re-rendered with its errors.
/// `editing` is the note being edited, which may keep its own slug.
async fn clean_note_form(
    store: &dyn Store,
    form: NoteForm,
    editing: Option<&Note>,
) -> ApiResult<yanote_core::CleanedNote> {
    let cleaned = match form.clean() {
        Ok(cleaned) => cleaned,
        Err(errors) => return Err(ApiError::invalid_note_form(NoteFormView::with_errors(form, errors))),
    };

    let exclude = editing.map(|note| note.note_id);
    if store.note_slug_exists(&cleaned.slug, exclude).await? {
        tracing::info!(slug = %cleaned.slug, "Rejected note form: slug in use");
        let mut errors = yanote_core::FormErrors::new();
        errors.add("slug", slug_taken_message(&cleaned.slug));
        return Err(ApiError::invalid_note_form(NoteFormView::with_errors(form, errors)));
    }

    Ok(cleaned)
}

/// Create a note owned by `author`.
///
/// # Errors
/// - `VALIDATION_FAILED` with the re-rendered form on invalid input or a
///   slug already in use.
/// - `SLUG_ALREADY_EXISTS` when a concurrent request claimed the slug between
///   the check and the insert.
pub async fn create_note(store: &dyn Store, author: UserId, form: NoteForm) -> ApiResult<Note> {
    let cleaned = clean_note_form(store, form, None).await?;
    let note = Note::new(author, cleaned.title, cleaned.text, Some(&cleaned.slug))?;
    store.note_insert(&note).await?;

    tracing::info!(note_id = %note.note_id, slug = %note.slug, "Note created");
    Ok(note)
}

/// Replace title, text and slug of a note loaded through [`get_note`].
pub async fn update_note(store: &dyn Store, mut note: Note, form: NoteForm) -> ApiResult<Note> {
    let cleaned = clean_note_form(store, form, Some(&note)).await?;

    note.apply_edit(cleaned.title, cleaned.text, cleaned.slug);
    store.note_update(&note).await?;

    tracing::info!(note_id = %note.note_id, slug = %note.slug, "Note updated");
    Ok(note)
}

/// Delete a note the caller owns.
pub async fn delete_note(store: &dyn Store, slug: &str, owner: UserId) -> ApiResult<Note> {
    let note = get_note(store, slug, owner).await?;
    store.note_delete(note.note_id).await?;

    tracing::info!(note_id = %note.note_id, slug = %note.slug, "Note deleted");
    Ok(note)
}

// =============================================================================
// TESTS
// =============================================================================
