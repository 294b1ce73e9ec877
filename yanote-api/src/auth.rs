//! Sessions and passwords.
//!
//! Logging in issues an HS256 JWT. Browsers carry it in the session cookie,
//! scripts in an `Authorization: Bearer` header. Passwords are stored as
//! Argon2id PHC strings.

use crate::constants::MIN_JWT_SECRET_LENGTH;
use crate::error::{ApiError, ApiResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use cookie::{time::Duration, Cookie, SameSite};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use yanote_core::{ConfigError, User, UserId};

/// Signing key used when `YANOTE_JWT_SECRET` is unset. Refused in production.
const DEV_SECRET: &str = "yanote-dev-secret-not-for-deployment";

/// Allowed drift between token expiry and the server clock.
const EXPIRY_LEEWAY_SECS: u64 = 60;

/// Two weeks.
pub const DEFAULT_SESSION_SECS: i64 = 14 * 24 * 60 * 60;

pub const DEFAULT_SESSION_COOKIE: &str = "yanote_session";

// ============================================================================
// CONFIGURATION
// ============================================================================

/// HMAC key for session tokens. Redacted in `Debug`.
#[derive(Clone)]
pub struct JwtSecret(SecretString);

impl JwtSecret {
    /// # Errors
    /// `MissingRequired` for a blank secret.
    pub fn new(secret: String) -> Result<Self, ConfigError> {
        if secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "YANOTE_JWT_SECRET".to_string(),
            });
        }
        Ok(Self(SecretString::new(secret.into())))
    }

    fn dev_default() -> Self {
        Self(SecretString::new(DEV_SECRET.into()))
    }

    fn key(&self) -> &[u8] {
        self.0.expose_secret().as_bytes()
    }

    pub fn is_dev_default(&self) -> bool {
        self.0.expose_secret() == DEV_SECRET
    }

    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtSecret(***)")
    }
}

/// Session settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: JwtSecret,

    /// Token lifetime, also the cookie's `Max-Age`.
    pub session_ttl_secs: i64,

    pub session_cookie: String,

    /// Add `Secure` to the cookie. Needed once served over HTTPS.
    pub secure_cookies: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: JwtSecret::dev_default(),
            session_ttl_secs: DEFAULT_SESSION_SECS,
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            secure_cookies: false,
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl AuthConfig {
    /// Read `YANOTE_JWT_SECRET`, `YANOTE_SESSION_SECS`, `YANOTE_SESSION_COOKIE`
    /// and `YANOTE_SECURE_COOKIES`. Unset or unparsable values keep their
    /// defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            jwt_secret: std::env::var("YANOTE_JWT_SECRET")
                .ok()
                .and_then(|s| JwtSecret::new(s).ok())
                .unwrap_or(defaults.jwt_secret),
            session_ttl_secs: env_parsed("YANOTE_SESSION_SECS")
                .filter(|secs: &i64| *secs > 0)
                .unwrap_or(defaults.session_ttl_secs),
            session_cookie: std::env::var("YANOTE_SESSION_COOKIE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.session_cookie),
            secure_cookies: env_parsed("YANOTE_SECURE_COOKIES").unwrap_or(defaults.secure_cookies),
        }
    }

    /// Refuse to run production on the development secret or on a short one.
    /// Outside production the same problems only log a warning.
    pub fn check_secret(&self, production: bool) -> Result<(), ConfigError> {
        let problem = if self.jwt_secret.is_dev_default() {
            Some("the built-in development secret is in use".to_string())
        } else if self.jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            Some(format!(
                "the secret has {} characters, at least {} are required",
                self.jwt_secret.len(),
                MIN_JWT_SECRET_LENGTH
            ))
        } else {
            None
        };

        match problem {
            Some(reason) if production => Err(ConfigError::InvalidValue {
                field: "YANOTE_JWT_SECRET".to_string(),
                value: "***".to_string(),
                reason,
            }),
            Some(reason) => {
                tracing::warn!(%reason, "Weak session secret, set YANOTE_JWT_SECRET before deploying");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

// ============================================================================
// TOKENS
// ============================================================================

/// Session token payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// The logged-in user, attached to the request by the session middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: UserId,
    pub username: String,
}

impl AuthContext {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username.clone(),
        }
    }
}

fn issue_token_at(config: &AuthConfig, user: &User, now: i64) -> ApiResult<String> {
    let claims = Claims {
        sub: user.user_id,
        username: user.username.clone(),
        iat: now,
        exp: now + config.session_ttl_secs,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.key()),
    )
    .map_err(|e| ApiError::internal_error(format!("Could not sign session token: {}", e)))
}

/// Issue a session token for `user`.
pub fn generate_jwt_token(config: &AuthConfig, user: &User) -> ApiResult<String> {
    issue_token_at(config, user, chrono::Utc::now().timestamp())
}

/// Check a token's signature and expiry and return its claims.
pub fn validate_jwt_token(config: &AuthConfig, token: &str) -> ApiResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = EXPIRY_LEEWAY_SECS;

    decode::<Claims>(token, &DecodingKey::from_secret(config.jwt_secret.key()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => ApiError::token_expired(),
            ErrorKind::InvalidSignature => ApiError::invalid_token("Bad token signature"),
            _ => ApiError::invalid_token(format!("Malformed session token: {}", e)),
        })
}

// ============================================================================
// COOKIES AND REDIRECTS
// ============================================================================

/// `Set-Cookie` carrying a fresh session token.
pub fn session_cookie(config: &AuthConfig, token: &str) -> Cookie<'static> {
    Cookie::build((config.session_cookie.clone(), token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies)
        .max_age(Duration::seconds(config.session_ttl_secs))
        .build()
}

/// `Set-Cookie` that clears the session.
pub fn expired_session_cookie(config: &AuthConfig) -> Cookie<'static> {
    let mut cookie = session_cookie(config, "");
    cookie.make_removal();
    cookie
}

/// Non-empty value of cookie `name` in a `Cookie` header. Malformed pairs
/// are skipped.
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    Cookie::split_parse(header)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_string())
}

/// Local paths only: no scheme, no `//host`, no backslashes.
pub fn is_safe_redirect(next: &str) -> bool {
    next.starts_with('/') && !next.starts_with("//") && !next.contains('\\')
}

// ============================================================================
// PASSWORDS
// ============================================================================

/// Argon2id hash in PHC format with a random salt.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            tracing::error!(error = %e, "Password hashing failed");
            ApiError::internal_error("Could not store the password")
        })?;
    Ok(hash.to_string())
}

/// Whether `password` matches `stored`. A stored value that is not a PHC
/// string is an internal error, not a wrong password.
pub fn verify_password(password: &str, stored: &str) -> ApiResult<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| {
        tracing::error!(error = %e, "Unparsable password hash in store");
        ApiError::internal_error("Stored credentials are corrupt")
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn config_with(secret: &str) -> Result<AuthConfig, ConfigError> {
        Ok(AuthConfig {
            jwt_secret: JwtSecret::new(secret.to_string())?,
            ..AuthConfig::default()
        })
    }

    fn author() -> User {
        User::new("Лев Толстой", "unused")
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    #[test]
    fn test_token_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let config = config_with("unit-test-secret")?;
        let user = author();

        let claims = validate_jwt_token(&config, &generate_jwt_token(&config, &user)?)?;
        assert_eq!(claims.sub, user.user_id);
        assert_eq!(claims.username, user.username);
        assert_eq!(claims.exp - claims.iat, DEFAULT_SESSION_SECS);
        Ok(())
    }

    #[test]
    fn test_expired_token_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let config = config_with("unit-test-secret")?;
        let token = issue_token_at(&config, &author(), now() - DEFAULT_SESSION_SECS - 3600)?;

        let result = validate_jwt_token(&config, &token);
        assert_eq!(result.map_err(|e| e.code), Err(ErrorCode::TokenExpired));
        Ok(())
    }

    #[test]
    fn test_expiry_leeway() -> Result<(), Box<dyn std::error::Error>> {
        let config = AuthConfig {
            session_ttl_secs: 100,
            ..config_with("unit-test-secret")?
        };

        // expired 30s ago, inside the leeway
        let token = issue_token_at(&config, &author(), now() - 130)?;
        assert!(validate_jwt_token(&config, &token).is_ok());

        let token = issue_token_at(&config, &author(), now() - 300)?;
        assert!(validate_jwt_token(&config, &token).is_err());
        Ok(())
    }

    #[test]
    fn test_foreign_signature_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let token = generate_jwt_token(&config_with("unit-test-secret")?, &author())?;

        let result = validate_jwt_token(&config_with("some-other-secret")?, &token);
        assert_eq!(result.map_err(|e| e.code), Err(ErrorCode::InvalidToken));
        Ok(())
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let result = validate_jwt_token(&AuthConfig::default(), "not.a.token");
        assert_eq!(result.map_err(|e| e.code), Err(ErrorCode::InvalidToken));
    }

    #[test]
    fn test_blank_secret_is_refused() {
        assert!(JwtSecret::new("   ".to_string()).is_err());
    }

    #[test]
    fn test_secret_is_redacted() -> Result<(), ConfigError> {
        let config = config_with("hunter2-hunter2")?;
        assert!(!format!("{:?}", config).contains("hunter2"));
        Ok(())
    }

    #[test]
    fn test_check_secret() -> Result<(), ConfigError> {
        let dev = AuthConfig::default();
        assert!(dev.check_secret(false).is_ok());
        assert!(dev.check_secret(true).is_err());

        let short = config_with("short")?;
        assert!(short.check_secret(false).is_ok());
        assert!(short.check_secret(true).is_err());

        let strong = config_with("a-production-secret-of-more-than-32-characters")?;
        assert!(strong.check_secret(true).is_ok());
        Ok(())
    }

    #[test]
    fn test_session_cookie_attributes() {
        let mut config = AuthConfig::default();
        let cookie = session_cookie(&config, "abc");
        assert_eq!(cookie.name(), "yanote_session");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(DEFAULT_SESSION_SECS)));
        assert!(!cookie.to_string().contains("Secure"));

        config.secure_cookies = true;
        assert_eq!(session_cookie(&config, "abc").secure(), Some(true));
    }

    #[test]
    fn test_expired_session_cookie() -> Result<(), cookie::ParseError> {
        let config = AuthConfig {
            secure_cookies: true,
            ..AuthConfig::default()
        };
        let header = expired_session_cookie(&config).to_string();
        assert!(header.starts_with("yanote_session=;"));

        let parsed = Cookie::parse(header)?;
        assert_eq!(parsed.value(), "");
        assert_eq!(parsed.max_age(), Some(Duration::ZERO));
        assert_eq!(parsed.path(), Some("/"));
        assert_eq!(parsed.secure(), Some(true));
        Ok(())
    }

    #[test]
    fn test_cookie_value_lookup() {
        let header = "theme=dark; yanote_session=tok.en.value; other=1";
        assert_eq!(cookie_value(header, "yanote_session").as_deref(), Some("tok.en.value"));
        assert_eq!(cookie_value(header, "missing"), None);
        assert_eq!(cookie_value("yanote_session=", "yanote_session"), None);
        assert_eq!(
            cookie_value("garbage; yanote_session=tok", "yanote_session").as_deref(),
            Some("tok")
        );
    }

    #[test]
    fn test_safe_redirects() {
        assert!(is_safe_redirect("/notes/"));
        assert!(is_safe_redirect("/note/address_slug/"));
        assert!(!is_safe_redirect("//evil.example.com"));
        assert!(!is_safe_redirect("https://evil.example.com"));
        assert!(!is_safe_redirect("/\\evil.example.com"));
        assert!(!is_safe_redirect(""));
    }

    #[test]
    fn test_password_hashing() -> ApiResult<()> {
        let hash = hash_password("correct horse")?;
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash)?);
        assert!(!verify_password("wrong horse", &hash)?);
        Ok(())
    }

    #[test]
    fn test_verify_against_corrupt_hash() {
        let result = verify_password("anything", "not-a-phc-string");
        assert_eq!(result.map_err(|e| e.code), Err(ErrorCode::InternalError));
    }
}
