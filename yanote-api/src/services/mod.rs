//! Service Layer
//!
//! Business logic behind the route handlers. Handlers deal with HTTP;
//! services deal with forms, ownership and the store.

mod note_service;
mod user_service;

pub use note_service::*;
pub use user_service::*;
