//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Problems with a registration form. Shown inline next to the form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// A required field was left blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("password must be at least {min} characters long")]
    PasswordTooShort { min: usize },

    #[error("invalid email: {0}")]
    InvalidEmail(#[from] eshop_core::EmailError),
}

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong username or password, or the account is disabled.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Username or email is already taken.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Registration form failed validation.
    #[error("registration failed: {0}")]
    Registration(#[from] RegistrationError),

    /// No one is logged in.
    #[error("not logged in")]
    Unauthenticated,

    /// Logged in, but the role does not allow the operation.
    #[error("{role} accounts cannot {action}")]
    Forbidden {
        role: eshop_core::UserRole,
        action: &'static str,
    },

    /// Repository error.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
