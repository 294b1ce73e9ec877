//! yanote Storage - Storage Traits and In-Memory Implementation
//!
//! Defines the storage abstraction for notes and users.
//! The PostgreSQL implementation lives in yanote-api.

pub mod memory;
pub mod store;

pub use memory::InMemoryStore;
pub use store::{NoteStore, Store, UserStore};
