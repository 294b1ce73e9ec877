//! Property-Based Tests for Note Visibility
//!
//! Properties:
//! - A user's note list holds exactly the notes they wrote
//! - Any note is readable by its author and answers 404 to everyone else

use axum::http::StatusCode;
use proptest::prelude::*;
use yanote_api::services;
use yanote_core::Note;
use yanote_storage::{InMemoryStore, NoteStore, UserStore};
use yanote_test_utils::fixtures;

/// For each note, whether the first user (`true`) or the second wrote it.
fn arb_ownership() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), 0..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_users_only_see_their_own_notes(ownership in arb_ownership()) {
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        runtime.block_on(async {
            let store = InMemoryStore::new();
            let first = fixtures::user("first");
            let second = fixtures::user("second");
            for user in [&first, &second] {
                store.user_insert(user).await.map_err(|e| TestCaseError::fail(e.to_string()))?;
            }

            let mut notes = Vec::new();
            for (i, by_first) in ownership.iter().enumerate() {
                let author = if *by_first { &first } else { &second };
                let slug = format!("note-{}", i);
                let note = Note::new(author.user_id, format!("Note {}", i), "text", Some(&slug))
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                store.note_insert(&note).await.map_err(|e| TestCaseError::fail(e.to_string()))?;
                notes.push(note);
            }

            for user in [&first, &second] {
                let listed = services::list_notes(&store, user.user_id)
                    .await
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                let expected = notes.iter().filter(|n| n.author_id == user.user_id).count();
                prop_assert_eq!(listed.len(), expected);
                prop_assert!(listed.iter().all(|n| n.author_id == user.user_id));
            }

            for note in &notes {
                let (owner, stranger) = if note.author_id == first.user_id {
                    (&first, &second)
                } else {
                    (&second, &first)
                };

                let own = services::get_note(&store, &note.slug, owner.user_id)
                    .await
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                prop_assert_eq!(&own, note);

                let denied = services::get_note(&store, &note.slug, stranger.user_id).await;
                match denied {
                    Ok(_) => return Err(TestCaseError::fail("foreign note was readable")),
                    Err(err) => prop_assert_eq!(err.status_code(), StatusCode::NOT_FOUND),
                }
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
