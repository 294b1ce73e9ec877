//! Per-author visibility rules.
//!
//! A note is visible only to its author. Anyone else is told the note does
//! not exist, so record-scoped lookups answer the same way for a foreign
//! note as for a missing one.

use crate::entities::Note;
use crate::identity::UserId;

/// Keep only the notes authored by `viewer`, preserving order.
pub fn visible_to(notes: impl IntoIterator<Item = Note>, viewer: UserId) -> Vec<Note> {
    notes
        .into_iter()
        .filter(|note| note.is_owned_by(viewer))
        .collect()
}

/// Return the note if `viewer` owns it.
pub fn scope_note(note: Note, viewer: UserId) -> Option<Note> {
    note.is_owned_by(viewer).then_some(note)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::identity::EntityIdType;

    fn note_for(author: UserId, title: &str) -> Result<Note, ValidationError> {
        Note::new(author, title, "text", None)
    }

    #[test]
    fn test_visible_to_filters_by_author() -> Result<(), ValidationError> {
        let author = UserId::now_v7();
        let reader = UserId::now_v7();
        let notes = vec![
            note_for(author, "first")?,
            note_for(reader, "second")?,
            note_for(author, "third")?,
        ];

        let visible = visible_to(notes, author);
        let titles: Vec<_> = visible.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "third"]);
        Ok(())
    }

    #[test]
    fn test_scope_note_hides_foreign_note() -> Result<(), ValidationError> {
        let author = UserId::now_v7();
        let note = note_for(author, "mine")?;
        assert!(scope_note(note.clone(), author).is_some());
        assert!(scope_note(note, UserId::now_v7()).is_none());
        Ok(())
    }
}
