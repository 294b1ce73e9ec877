//! Entity types: notes and their authors.

use crate::error::ValidationError;
use crate::identity::{EntityIdType, NoteId, Timestamp, UserId};
use crate::slug::assign_slug;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Maximum note title length in characters.
pub const TITLE_MAX_LENGTH: usize = 100;

/// Maximum username length in characters.
pub const USERNAME_MAX_LENGTH: usize = 150;

/// Entity type discriminator used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Note,
    User,
}

/// A personal text note, addressed by a globally unique slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Note {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub note_id: NoteId,
    pub title: String,
    pub text: String,
    pub slug: String,
    /// Owning user. Never changes after creation.
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub author_id: UserId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Note {
    /// Build a new note, deriving the slug from the title when `slug` is
    /// `None` or blank.
    pub fn new(
        author_id: UserId,
        title: impl Into<String>,
        text: impl Into<String>,
        slug: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        let text = text.into();
        validate_title(&title)?;
        validate_text(&text)?;
        let slug = assign_slug(&title, slug)?;
        let now = Utc::now();

        Ok(Self {
            note_id: NoteId::now_v7(),
            title,
            text,
            slug,
            author_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether `user_id` authored this note.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.author_id == user_id
    }

    /// Replace the editable fields, keeping identity and authorship.
    pub fn apply_edit(&mut self, title: String, text: String, slug: String) {
        self.title = title;
        self.text = text;
        self.slug = slug;
        self.updated_at = Utc::now();
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub username: String,
    /// Argon2id PHC string. Never serialized to clients.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: Timestamp,
}

impl User {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            user_id: UserId::now_v7(),
            username: username.into(),
            password_hash: password_hash.into(),
            created_at: Utc::now(),
        }
    }

    /// Client-safe projection.
    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            user_id: self.user_id,
            username: self.username.clone(),
        }
    }
}

/// User information safe to send to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserInfo {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    pub username: String,
}

pub(crate) fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "title".to_string(),
        });
    }
    if title.chars().count() > TITLE_MAX_LENGTH {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: TITLE_MAX_LENGTH,
        });
    }
    Ok(())
}

pub(crate) fn validate_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "text".to_string(),
        });
    }
    Ok(())
}

/// Django-compatible username rule: letters, digits and `@.+-_`.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "username".to_string(),
        });
    }
    if username.chars().count() > USERNAME_MAX_LENGTH {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: USERNAME_MAX_LENGTH,
        });
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_' | ' '))
    {
        return Err(ValidationError::InvalidValue {
            field: "username".to_string(),
            reason: "use only letters, digits, spaces and @/./+/-/_".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slug::slugify;

    #[test]
    fn test_note_new_derives_slug() -> Result<(), ValidationError> {
        let author = UserId::now_v7();
        let note = Note::new(author, "Заголовок заметки", "Текст", None)?;
        assert_eq!(note.slug, slugify("Заголовок заметки"));
        assert!(note.is_owned_by(author));
        assert_eq!(note.created_at, note.updated_at);
        Ok(())
    }

    #[test]
    fn test_note_new_keeps_explicit_slug() -> Result<(), ValidationError> {
        let note = Note::new(UserId::now_v7(), "Заголовок", "Текст", Some("address_slug"))?;
        assert_eq!(note.slug, "address_slug");
        Ok(())
    }

    #[test]
    fn test_note_new_requires_title_and_text() {
        let author = UserId::now_v7();
        assert!(matches!(
            Note::new(author, "  ", "text", None),
            Err(ValidationError::RequiredFieldMissing { ref field }) if field == "title"
        ));
        assert!(matches!(
            Note::new(author, "title", "", None),
            Err(ValidationError::RequiredFieldMissing { ref field }) if field == "text"
        ));
    }

    #[test]
    fn test_note_new_rejects_long_title() {
        let title = "a".repeat(TITLE_MAX_LENGTH + 1);
        assert!(matches!(
            Note::new(UserId::now_v7(), title, "text", None),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_other_user_does_not_own_note() -> Result<(), ValidationError> {
        let note = Note::new(UserId::now_v7(), "title", "text", None)?;
        assert!(!note.is_owned_by(UserId::now_v7()));
        Ok(())
    }

    #[test]
    fn test_apply_edit_keeps_author() -> Result<(), ValidationError> {
        let author = UserId::now_v7();
        let mut note = Note::new(author, "title", "text", None)?;
        let id = note.note_id;
        note.apply_edit("new".to_string(), "new text".to_string(), "new-slug".to_string());
        assert_eq!(note.note_id, id);
        assert_eq!(note.author_id, author);
        assert_eq!(note.slug, "new-slug");
        Ok(())
    }

    #[test]
    fn test_user_serialization_hides_hash() -> Result<(), serde_json::Error> {
        let user = User::new("Лев Толстой", "$argon2id$secret");
        let json = serde_json::to_string(&user)?;
        assert!(!json.contains("argon2id"));
        assert!(json.contains("Лев Толстой"));
        Ok(())
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("Лев Толстой").is_ok());
        assert!(validate_username("user@example.com").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("bad/name").is_err());
        assert!(validate_username(&"u".repeat(USERNAME_MAX_LENGTH + 1)).is_err());
    }
}
