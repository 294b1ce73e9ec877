//! Form input and field-level validation.
//!
//! Forms arrive as `application/x-www-form-urlencoded` bodies. Every field
//! defaults to an empty string so a missing field is reported as a field
//! error instead of a deserialization failure.

use crate::entities::{validate_text, validate_title, validate_username, Note};
use crate::error::ValidationError;
use crate::slug::assign_slug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Suffix of the field error reported when a slug is already in use.
pub const SLUG_TAKEN_WARNING: &str = " - such slug already exists, choose a unique value!";

/// Minimum accepted password length at signup.
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Key used for errors that do not belong to a single field.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// Field error for a slug collision.
pub fn slug_taken_message(slug: &str) -> String {
    format!("{slug}{SLUG_TAKEN_WARNING}")
}

/// Field name to error messages, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Record a [`ValidationError`] under the field it names.
    pub fn add_validation(&mut self, err: &ValidationError) {
        let (field, message) = match err {
            ValidationError::RequiredFieldMissing { field } => {
                (field.as_str(), "This field is required.".to_string())
            }
            ValidationError::TooLong { field, max } => (
                field.as_str(),
                format!("Ensure this value has at most {max} characters."),
            ),
            ValidationError::InvalidValue { field, reason } => (field.as_str(), reason.clone()),
        };
        self.add(field, message);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }
}

// ============================================================================
// NOTE FORM
// ============================================================================

/// Submitted note form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NoteForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    /// Optional; derived from the title when blank.
    #[serde(default)]
    pub slug: String,
}

/// A note form that passed shape validation, with its effective slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedNote {
    pub title: String,
    pub text: String,
    pub slug: String,
}

impl NoteForm {
    /// Validate field shapes and resolve the effective slug.
    ///
    /// Title and text are stripped of surrounding whitespace before they are
    /// checked and stored. Slug uniqueness depends on the store and is
    /// checked by the caller.
    pub fn clean(&self) -> Result<CleanedNote, FormErrors> {
        let mut errors = FormErrors::new();
        let title = self.title.trim();
        let text = self.text.trim();

        if let Err(err) = validate_title(title) {
            errors.add_validation(&err);
        }
        if let Err(err) = validate_text(text) {
            errors.add_validation(&err);
        }

        // A blank title cannot yield a slug; its own error is enough.
        let slug = if title.is_empty() && self.slug.trim().is_empty() {
            None
        } else {
            match assign_slug(title, Some(&self.slug)) {
                Ok(slug) => Some(slug),
                Err(err) => {
                    errors.add_validation(&err);
                    None
                }
            }
        };

        match slug {
            Some(slug) if errors.is_empty() => Ok(CleanedNote {
                title: title.to_string(),
                text: text.to_string(),
                slug,
            }),
            _ => Err(errors),
        }
    }
}

/// The note form as shown to the client: current values plus field errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NoteFormView {
    pub title: String,
    pub text: String,
    pub slug: String,
    pub errors: FormErrors,
}

impl NoteFormView {
    /// Empty creation form.
    pub fn blank() -> Self {
        Self::default()
    }

    /// Edit form prefilled from a stored note.
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            text: note.text.clone(),
            slug: note.slug.clone(),
            errors: FormErrors::new(),
        }
    }

    /// Re-rendered submission with its errors.
    pub fn with_errors(form: NoteForm, errors: FormErrors) -> Self {
        Self {
            title: form.title,
            text: form.text,
            slug: form.slug,
            errors,
        }
    }
}

// ============================================================================
// ACCOUNT FORMS
// ============================================================================

/// Submitted signup form.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl SignupForm {
    /// Check username shape and password rules. Username uniqueness is left
    /// to the caller.
    pub fn clean(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();

        if let Err(err) = validate_username(&self.username) {
            errors.add_validation(&err);
        }

        if self.password1.is_empty() {
            errors.add("password1", "This field is required.");
        } else if self.password1.chars().count() < PASSWORD_MIN_LENGTH {
            errors.add(
                "password1",
                format!(
                    "This password is too short. It must contain at least {PASSWORD_MIN_LENGTH} characters."
                ),
            );
        }

        if self.password2.is_empty() {
            errors.add("password2", "This field is required.");
        } else if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Submitted login form.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Where to go after a successful login.
    #[serde(default)]
    pub next: Option<String>,
}

impl LoginForm {
    pub fn clean(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        if self.username.is_empty() {
            errors.add("username", "This field is required.");
        }
        if self.password.is_empty() {
            errors.add("password", "This field is required.");
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Account form as shown to the client. Passwords are never echoed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AccountFormView {
    pub username: String,
    pub errors: FormErrors,
}

impl AccountFormView {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn with_errors(username: impl Into<String>, errors: FormErrors) -> Self {
        Self {
            username: username.into(),
            errors,
        }
    }
}
