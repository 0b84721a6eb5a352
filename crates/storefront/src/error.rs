//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for callers that drive several modules
//! at once (the CLI, the admin crate). [`AppError::report`] captures internal
//! failures to Sentry; everything else is the user's to fix and is only shown.

use thiserror::Error;

use crate::cart::CartError;
use crate::catalog::ProductValidationError;
use crate::checkout::CheckoutError;
use crate::company::CompanyValidationError;
use crate::config::ConfigError;
use crate::db::RepositoryError;
use crate::db::orders::OrderError;
use crate::demo::DemoError;
use crate::interchange::InterchangeError;
use crate::services::auth::AuthError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Repository operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Persistent storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Authentication or authorization failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Invalid product: {0}")]
    Product(#[from] ProductValidationError),

    #[error("Invalid company settings: {0}")]
    Company(#[from] CompanyValidationError),

    #[error("Import error: {0}")]
    Interchange(#[from] InterchangeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Bundled demo data could not be loaded.
    #[error("Demo data error: {0}")]
    Demo(#[from] DemoError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad input from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Broad classes of failure, used for exit codes and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input failed validation.
    Invalid,
    /// No one is logged in.
    Unauthenticated,
    /// Logged in without the needed role.
    Forbidden,
    NotFound,
    /// Would break a uniqueness rule.
    Conflict,
    /// Our fault, not the user's.
    Internal,
}

impl AppError {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Repository(err) => repository_kind(err),
            Self::Storage(_) | Self::Config(_) | Self::Demo(_) | Self::Internal(_) => {
                ErrorKind::Internal
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::Unauthenticated => {
                    ErrorKind::Unauthenticated
                }
                AuthError::Forbidden { .. } => ErrorKind::Forbidden,
                AuthError::UserNotFound => ErrorKind::NotFound,
                AuthError::UserAlreadyExists => ErrorKind::Conflict,
                AuthError::Registration(_) => ErrorKind::Invalid,
                AuthError::Repository(err) => repository_kind(err),
                AuthError::PasswordHash => ErrorKind::Internal,
            },
            Self::Checkout(CheckoutError::Repository(err)) => repository_kind(err),
            Self::Order(err) => match err {
                OrderError::NotFound(_) => ErrorKind::NotFound,
                OrderError::InvalidTransition { .. } => ErrorKind::Invalid,
                OrderError::Repository(err) => repository_kind(err),
            },
            Self::Cart(_)
            | Self::Checkout(_)
            | Self::Product(_)
            | Self::Company(_)
            | Self::Interchange(_)
            | Self::BadRequest(_) => ErrorKind::Invalid,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }

    /// Message safe to show the user.
    ///
    /// Internal details stay in the logs.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth(AuthError::InvalidCredentials | AuthError::UserNotFound) => {
                "Invalid username or password".to_string()
            }
            Self::Auth(AuthError::UserAlreadyExists) => {
                "An account with this username or email already exists".to_string()
            }
            Self::Auth(AuthError::Registration(err)) => capitalize(&err.to_string()),
            Self::Auth(AuthError::Unauthenticated) => "Please log in first".to_string(),
            Self::Auth(err @ AuthError::Forbidden { .. }) => capitalize(&err.to_string()),
            _ if self.kind() == ErrorKind::Internal => "Something went wrong".to_string(),
            _ => self.to_string(),
        }
    }

    /// Capture internal errors to Sentry and log them.
    ///
    /// Returns the Sentry event id when an event was sent.
    pub fn report(&self) -> Option<sentry::types::Uuid> {
        if self.kind() != ErrorKind::Internal {
            tracing::debug!(error = %self, "User-facing error");
            return None;
        }
        let event_id = sentry::capture_error(self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Operation failed"
        );
        Some(event_id)
    }
}

const fn repository_kind(err: &RepositoryError) -> ErrorKind {
    match err {
        RepositoryError::NotFound => ErrorKind::NotFound,
        RepositoryError::Conflict(_) => ErrorKind::Conflict,
        RepositoryError::DataCorruption(_) => ErrorKind::Internal,
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
