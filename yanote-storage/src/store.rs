//! Async storage traits for notes and users.
//!
//! Implementations must make uniqueness checks atomic with the write they
//! guard: two concurrent inserts with the same slug may not both succeed.

use ::async_trait::async_trait;
use yanote_core::{Note, NoteId, User, UserId, YanoteResult};

/// Note persistence.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Insert a new note.
    ///
    /// Fails with `StorageError::SlugTaken` when another note already uses
    /// the slug.
    async fn note_insert(&self, note: &Note) -> YanoteResult<()>;

    /// Get a note by its slug, whoever owns it.
    async fn note_get_by_slug(&self, slug: &str) -> YanoteResult<Option<Note>>;

    /// List the notes of one author in creation order.
    async fn note_list_by_author(&self, author_id: UserId) -> YanoteResult<Vec<Note>>;

    /// Overwrite title, text, slug and `updated_at` of an existing note.
    async fn note_update(&self, note: &Note) -> YanoteResult<()>;

    /// Delete a note.
    async fn note_delete(&self, id: NoteId) -> YanoteResult<()>;

    /// Whether a note other than `exclude` uses `slug`.
    async fn note_slug_exists(&self, slug: &str, exclude: Option<NoteId>) -> YanoteResult<bool>;

    /// Total number of stored notes.
    async fn note_count(&self) -> YanoteResult<u64>;
}

/// Account persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user.
    ///
    /// Fails with `StorageError::UsernameTaken` on a duplicate username.
    async fn user_insert(&self, user: &User) -> YanoteResult<()>;

    async fn user_get(&self, id: UserId) -> YanoteResult<Option<User>>;

    async fn user_get_by_username(&self, username: &str) -> YanoteResult<Option<User>>;
}

/// Everything the HTTP layer needs from a backend.
pub trait Store: NoteStore + UserStore {}

impl<T: NoteStore + UserStore> Store for T {}
