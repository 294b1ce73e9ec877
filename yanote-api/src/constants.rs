//! Constants for the yanote API
//!
//! URLs the handlers redirect to, plus configuration defaults.

// ============================================================================
// URLS
// ============================================================================

/// Login page. Anonymous visitors of protected pages are sent here.
pub const LOGIN_URL: &str = "/auth/login/";

/// Where a successful login goes when no `next` is given.
pub const LOGIN_REDIRECT_URL: &str = "/";

/// Shown after a note was added, edited or deleted.
pub const SUCCESS_URL: &str = "/done/";

/// Query parameter carrying the page to return to after login.
pub const REDIRECT_FIELD_NAME: &str = "next";

// ============================================================================
// AUTHENTICATION
// ============================================================================

/// Minimum required length for JWT secret keys in production
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

// ============================================================================
// SERVER
// ============================================================================

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8000;

/// Default CORS max age in seconds (24 hours)
pub const DEFAULT_CORS_MAX_AGE_SECS: u64 = 86400;
