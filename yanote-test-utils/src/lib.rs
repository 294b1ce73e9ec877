//! yanote Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - Proptest generators for titles, forms and notes
//! - Fixtures mirroring the usual author/reader scenario

pub use yanote_storage::{InMemoryStore, NoteStore, UserStore};

pub use yanote_core::{
    EntityIdType, Note, NoteForm, NoteId, Timestamp, User, UserId, YanoteResult,
    SLUG_MAX_LENGTH, TITLE_MAX_LENGTH,
};

use chrono::{TimeZone, Utc};
use uuid::Uuid;

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for yanote types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    pub fn arb_user_id() -> impl Strategy<Value = UserId> {
        arb_uuid().prop_map(UserId::new)
    }

    pub fn arb_note_id() -> impl Strategy<Value = NoteId> {
        arb_uuid().prop_map(NoteId::new)
    }

    /// Generate a timestamp between 2020 and 2030.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1_577_836_800i64..1_893_456_000i64).prop_map(|secs| {
            Utc.timestamp_opt(secs, 0)
                .single()
                .unwrap_or_else(Utc::now)
        })
    }

    /// Any title text: Latin, Cyrillic, digits, punctuation, odd spacing.
    pub fn arb_any_title() -> impl Strategy<Value = String> {
        "[a-zA-Zа-яА-ЯёЁ0-9 &_,.!?—-]{0,120}"
    }

    /// A title that passes validation and yields a non-empty slug. The first
    /// letter is never `ъ` or `ь`, which transliterate to nothing.
    pub fn arb_valid_title() -> impl Strategy<Value = String> {
        "[a-zа-щыэюяё][a-zA-Zа-яА-ЯёЁ0-9 ,.!-]{0,60}"
    }

    /// A slug that is already in canonical form.
    pub fn arb_slug() -> impl Strategy<Value = String> {
        "[a-z0-9]{1,20}(-[a-z0-9]{1,20}){0,3}"
    }

    pub fn arb_text() -> impl Strategy<Value = String> {
        "[a-zA-Zа-яА-Я0-9 .,\n]{1,200}".prop_filter("text must not be blank", |s| {
            !s.trim().is_empty()
        })
    }

    /// A valid username: letters, digits and `@.+-_`.
    pub fn arb_username() -> impl Strategy<Value = String> {
        "[a-zA-Z][a-zA-Z0-9@.+_-]{0,30}"
    }

    /// A note form with a blank slug, so the slug is derived.
    pub fn arb_note_form() -> impl Strategy<Value = NoteForm> {
        (arb_valid_title(), arb_text()).prop_map(|(title, text)| NoteForm {
            title,
            text,
            slug: String::new(),
        })
    }

    /// A stored note with a canonical slug.
    pub fn arb_note() -> impl Strategy<Value = Note> {
        (
            arb_note_id(),
            arb_valid_title(),
            arb_text(),
            arb_slug(),
            arb_user_id(),
            arb_timestamp(),
        )
            .prop_map(|(note_id, title, text, slug, author_id, created_at)| Note {
                note_id,
                title,
                text,
                slug,
                author_id,
                created_at,
                updated_at: created_at,
            })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures: one author, one reader, one note.

    use super::*;

    pub const AUTHOR_NAME: &str = "Лёва Толстый";
    pub const READER_NAME: &str = "Чтец обыкновенный";
    pub const NOTE_TITLE: &str = "Заголовок";
    pub const NOTE_TEXT: &str = "Текст заметки";
    pub const NOTE_SLUG: &str = "address_slug";

    /// A user whose password hash is a placeholder. Use it where no login
    /// through the password form happens.
    pub fn user(username: &str) -> User {
        User::new(username, "$argon2id$placeholder")
    }

    /// A note form with the given fields.
    pub fn note_form(title: &str, text: &str, slug: &str) -> NoteForm {
        NoteForm {
            title: title.to_string(),
            text: text.to_string(),
            slug: slug.to_string(),
        }
    }

    /// Author, reader and one note by the author with slug `address_slug`.
    pub struct Scenario {
        pub store: InMemoryStore,
        pub author: User,
        pub reader: User,
        pub note: Note,
    }

    impl Scenario {
        pub async fn new() -> YanoteResult<Self> {
            let store = InMemoryStore::new();
            let author = user(AUTHOR_NAME);
            let reader = user(READER_NAME);
            store.user_insert(&author).await?;
            store.user_insert(&reader).await?;

            let note = Note::new(author.user_id, NOTE_TITLE, NOTE_TEXT, Some(NOTE_SLUG))
                .map_err(yanote_core::YanoteError::from)?;
            store.note_insert(&note).await?;

            Ok(Self {
                store,
                author,
                reader,
                note,
            })
        }
    }
}
