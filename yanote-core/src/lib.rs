//! yanote Core - Notes, Slugs and Visibility
//!
//! Data types and the rules that do not depend on storage: slug derivation,
//! per-author visibility and form validation. All other crates depend on this.

pub mod access;
pub mod entities;
pub mod error;
pub mod form;
pub mod identity;
pub mod slug;

pub use access::{scope_note, visible_to};
pub use entities::{
    validate_username, EntityType, Note, User, UserInfo, TITLE_MAX_LENGTH, USERNAME_MAX_LENGTH,
};
pub use error::{ConfigError, StorageError, ValidationError, YanoteError, YanoteResult};
pub use form::{
    slug_taken_message, AccountFormView, CleanedNote, FormErrors, LoginForm, NoteForm,
    NoteFormView, SignupForm, NON_FIELD_ERRORS, PASSWORD_MIN_LENGTH, SLUG_TAKEN_WARNING,
};
pub use identity::{EntityIdType, NoteId, Timestamp, UserId};
pub use slug::{assign_slug, is_valid_slug, slugify, SLUG_MAX_LENGTH};
