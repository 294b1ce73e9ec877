//! In-memory store.
//!
//! Backs development runs and the test suite. All maps live behind one
//! `RwLock` so the slug index and the notes never disagree.

use crate::store::{NoteStore, UserStore};
use ::async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use yanote_core::{
    EntityIdType, EntityType, Note, NoteId, StorageError, User, UserId, YanoteResult,
};

#[derive(Debug, Default)]
struct Tables {
    /// Notes with their insertion sequence number.
    notes: HashMap<NoteId, (u64, Note)>,
    slugs: HashMap<String, NoteId>,
    next_sequence: u64,
    users: HashMap<UserId, User>,
    usernames: HashMap<String, UserId>,
}

/// Thread-safe in-memory implementation of [`NoteStore`] and [`UserStore`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> YanoteResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StorageError::LockPoisoned.into())
    }

    fn write(&self) -> YanoteResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StorageError::LockPoisoned.into())
    }

    /// Number of registered users.
    pub fn user_count(&self) -> YanoteResult<usize> {
        Ok(self.read()?.users.len())
    }
}

#[async_trait]
impl NoteStore for InMemoryStore {
    async fn note_insert(&self, note: &Note) -> YanoteResult<()> {
        let mut tables = self.write()?;
        if tables.notes.contains_key(&note.note_id) {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::Note,
                reason: "already exists".to_string(),
            }
            .into());
        }
        if tables.slugs.contains_key(&note.slug) {
            return Err(StorageError::SlugTaken {
                slug: note.slug.clone(),
            }
            .into());
        }

        let sequence = tables.next_sequence;
        tables.next_sequence += 1;
        tables.slugs.insert(note.slug.clone(), note.note_id);
        tables.notes.insert(note.note_id, (sequence, note.clone()));
        Ok(())
    }

    async fn note_get_by_slug(&self, slug: &str) -> YanoteResult<Option<Note>> {
        let tables = self.read()?;
        Ok(tables
            .slugs
            .get(slug)
            .and_then(|id| tables.notes.get(id))
            .map(|(_, note)| note.clone()))
    }

    async fn note_list_by_author(&self, author_id: UserId) -> YanoteResult<Vec<Note>> {
        let tables = self.read()?;
        let mut owned: Vec<&(u64, Note)> = tables
            .notes
            .values()
            .filter(|(_, note)| note.is_owned_by(author_id))
            .collect();
        owned.sort_by_key(|(sequence, _)| *sequence);
        Ok(owned.into_iter().map(|(_, note)| note.clone()).collect())
    }

    async fn note_update(&self, note: &Note) -> YanoteResult<()> {
        let mut tables = self.write()?;
        let old_slug = match tables.notes.get(&note.note_id) {
            Some((_, stored)) => stored.slug.clone(),
            None => {
                return Err(StorageError::NotFound {
                    entity_type: EntityType::Note,
                    id: note.note_id.as_uuid(),
                }
                .into())
            }
        };

        if old_slug != note.slug {
            if tables.slugs.contains_key(&note.slug) {
                return Err(StorageError::SlugTaken {
                    slug: note.slug.clone(),
                }
                .into());
            }
            tables.slugs.remove(&old_slug);
            tables.slugs.insert(note.slug.clone(), note.note_id);
        }

        if let Some((_, stored)) = tables.notes.get_mut(&note.note_id) {
            stored.title = note.title.clone();
            stored.text = note.text.clone();
            stored.slug = note.slug.clone();
            stored.updated_at = note.updated_at;
        }
        Ok(())
    }

    async fn note_delete(&self, id: NoteId) -> YanoteResult<()> {
        let mut tables = self.write()?;
        let (_, note) = tables.notes.remove(&id).ok_or(StorageError::NotFound {
            entity_type: EntityType::Note,
            id: id.as_uuid(),
        })?;
        tables.slugs.remove(&note.slug);
        Ok(())
    }

    async fn note_slug_exists(&self, slug: &str, exclude: Option<NoteId>) -> YanoteResult<bool> {
        let tables = self.read()?;
        Ok(tables
            .slugs
            .get(slug)
            .is_some_and(|id| Some(*id) != exclude))
    }

    async fn note_count(&self) -> YanoteResult<u64> {
        Ok(self.read()?.notes.len() as u64)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn user_insert(&self, user: &User) -> YanoteResult<()> {
        let mut tables = self.write()?;
        if tables.usernames.contains_key(&user.username) {
            return Err(StorageError::UsernameTaken {
                username: user.username.clone(),
            }
            .into());
        }
        if tables.users.contains_key(&user.user_id) {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::User,
                reason: "already exists".to_string(),
            }
            .into());
        }
        tables.usernames.insert(user.username.clone(), user.user_id);
        tables.users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn user_get(&self, id: UserId) -> YanoteResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn user_get_by_username(&self, username: &str) -> YanoteResult<Option<User>> {
        let tables = self.read()?;
        Ok(tables
            .usernames
            .get(username)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }
}

// ============================================================================
// TESTS
// ============================================================================
