//! Slug assignment for notes.
//!
//! Slugs are the public address of a note (`/note/{slug}/`). They are derived
//! from the title when the author does not supply one, using Russian-to-Latin
//! transliteration so that Cyrillic titles still produce readable URLs.

use crate::error::ValidationError;

/// Maximum slug length in characters.
pub const SLUG_MAX_LENGTH: usize = 100;

/// Latin replacement for a lowercase Russian letter.
///
/// `ъ` and `ь` have no sound of their own and transliterate to nothing.
fn transliterate(c: char) -> Option<&'static str> {
    let latin = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    };
    Some(latin)
}

/// Characters that pass through unchanged.
fn is_slug_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' ')
}

/// Derive a URL-safe slug from a title.
///
/// The steps run in this order:
///
/// 1. Lowercase.
/// 2. Replace `&` (or `&amp;`) with ` and `.
/// 3. Collapse each run of whitespace and `-` into one `-`.
/// 4. Drop characters other than ASCII letters, digits, `-`, `_`, space and
///    the Russian alphabet.
/// 5. Transliterate Russian letters to Latin.
/// 6. Strip surrounding whitespace and `-`.
/// 7. Truncate to [`SLUG_MAX_LENGTH`].
///
/// Punctuation is dropped after separators are collapsed, so `"a , b"`
/// becomes `"a--b"`. A truncated slug may end in `-`. The result is empty
/// when the title has nothing to keep.
///
/// # Examples
///
/// ```
/// use yanote_core::slugify;
///
/// assert_eq!(slugify("Заголовок заметки"), "zagolovok-zametki");
/// assert_eq!(slugify("Rust & Axum"), "rust-and-axum");
/// assert_eq!(slugify("Итоги: 2024 / план"), "itogi-2024--plan");
/// ```
pub fn slugify(title: &str) -> String {
    let lowered = title
        .to_lowercase()
        .replace("&amp;", " and ")
        .replace('&', " and ");

    let mut collapsed = String::with_capacity(lowered.len());
    let mut in_separator = false;
    for c in lowered.chars() {
        if c.is_whitespace() || c == '-' {
            if !in_separator {
                collapsed.push('-');
            }
            in_separator = true;
        } else {
            collapsed.push(c);
            in_separator = false;
        }
    }

    let mut slug = String::with_capacity(collapsed.len());
    for c in collapsed.chars() {
        if is_slug_char(c) {
            slug.push(c);
        } else if let Some(latin) = transliterate(c) {
            slug.push_str(latin);
        }
    }

    let mut slug = slug
        .trim_matches(|c: char| c.is_whitespace() || c == '-')
        .to_string();
    // Only ASCII is left, so bytes and chars agree.
    slug.truncate(SLUG_MAX_LENGTH);
    slug
}

/// Whether `slug` is an acceptable note address: non-empty, at most
/// [`SLUG_MAX_LENGTH`] characters of ASCII letters, digits, `-` and `_`.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= SLUG_MAX_LENGTH
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Pick the slug a note will be stored under.
///
/// An explicit, non-blank slug wins and must be valid; otherwise the slug is
/// derived from `title`. Uniqueness is not checked here: the store enforces it.
pub fn assign_slug(title: &str, explicit: Option<&str>) -> Result<String, ValidationError> {
    match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) if slug.chars().count() > SLUG_MAX_LENGTH => Err(ValidationError::TooLong {
            field: "slug".to_string(),
            max: SLUG_MAX_LENGTH,
        }),
        Some(slug) if !is_valid_slug(slug) => Err(ValidationError::InvalidValue {
            field: "slug".to_string(),
            reason: "use only latin letters, digits, hyphens and underscores".to_string(),
        }),
        Some(slug) => Ok(slug.to_string()),
        None => {
            let derived = slugify(title);
            if derived.is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: "slug".to_string(),
                    reason: "could not derive a slug from the title, enter one manually"
                        .to_string(),
                });
            }
            Ok(derived)
        }
    }
}
