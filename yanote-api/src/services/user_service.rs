//! User Service
//!
//! Account registration and credential checks.

use yanote_core::{
    AccountFormView, FormErrors, LoginForm, SignupForm, StorageError, User, YanoteError,
    NON_FIELD_ERRORS,
};
use yanote_storage::Store;

use crate::auth::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult};

const USERNAME_TAKEN: &str = "A user with that username already exists.";
const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// Run argon2 work on the blocking pool so it does not stall the runtime.
async fn off_runtime<T, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        tracing::error!(error = %e, "Password task failed");
        ApiError::internal_error("Could not check the password")
    })?
}

fn username_taken(username: &str) -> ApiError {
    let mut errors = FormErrors::new();
    errors.add("username", USERNAME_TAKEN);
    ApiError::invalid_account_form(AccountFormView::with_errors(username, errors))
}

/// Register a new account.
///
/// # Errors
/// `VALIDATION_FAILED` with the re-rendered form when a field is invalid or
/// the username is taken.
pub async fn register_user(store: &dyn Store, form: SignupForm) -> ApiResult<User> {
    if let Err(errors) = form.clean() {
        return Err(ApiError::invalid_account_form(AccountFormView::with_errors(
            form.username,
            errors,
        )));
    }

    if store.user_get_by_username(&form.username).await?.is_some() {
        return Err(username_taken(&form.username));
    }

    let password = form.password1.clone();
    let password_hash = off_runtime(move || hash_password(&password)).await?;
    let user = User::new(form.username.clone(), password_hash);
    match store.user_insert(&user).await {
        Ok(()) => {}
        Err(YanoteError::Storage(StorageError::UsernameTaken { .. })) => {
            return Err(username_taken(&form.username));
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(user_id = %user.user_id, "User registered");
    Ok(user)
}

/// Check a login form against the stored credentials.
///
/// Unknown usernames and wrong passwords get the same answer.
pub async fn authenticate(store: &dyn Store, form: &LoginForm) -> ApiResult<User> {
    if let Err(errors) = form.clean() {
        return Err(ApiError::invalid_account_form(AccountFormView::with_errors(
            form.username.clone(),
            errors,
        )));
    }

    let user = store.user_get_by_username(&form.username).await?;
    let verified = match &user {
        Some(user) => {
            let password = form.password.clone();
            let stored = user.password_hash.clone();
            off_runtime(move || verify_password(&password, &stored)).await?
        }
        None => false,
    };

    match user {
        Some(user) if verified => Ok(user),
        _ => {
            tracing::warn!("Rejected login attempt");
            let mut errors = FormErrors::new();
            errors.add(NON_FIELD_ERRORS, INVALID_LOGIN);
            Err(ApiError::invalid_account_form(AccountFormView::with_errors(
                form.username.clone(),
                errors,
            )))
        }
    }
}
