//! Unified error handling for admin.

use thiserror::Error;

use eshop_core::{EmailError, UserId};
use eshop_storefront::catalog::ProductValidationError;
use eshop_storefront::company::CompanyValidationError;
use eshop_storefront::db::RepositoryError;
use eshop_storefront::db::orders::OrderError;
use eshop_storefront::demo::DemoError;
use eshop_storefront::error::AppError;
use eshop_storefront::interchange::InterchangeError;
use eshop_storefront::services::auth::{AuthError, RegistrationError};

/// Errors from the admin panels.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Repository operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid product: {0}")]
    Product(#[from] ProductValidationError),

    #[error("Invalid company settings: {0}")]
    Company(#[from] CompanyValidationError),

    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Import error: {0}")]
    Import(#[from] InterchangeError),

    #[error("Demo data error: {0}")]
    Demo(#[from] DemoError),

    /// A required form field was blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid password: {0}")]
    InvalidPassword(#[from] RegistrationError),

    /// Admins cannot delete or disable the account they are using.
    #[error("you cannot {action} your own account")]
    SelfModification { action: &'static str },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AdminError {
    pub(crate) fn user_not_found(id: UserId) -> Self {
        Self::NotFound(format!("user {id}"))
    }
}

impl From<AdminError> for AppError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Repository(e) => Self::Repository(e),
            AdminError::Product(e) => Self::Product(e),
            AdminError::Company(e) => Self::Company(e),
            AdminError::Order(e) => Self::Order(e),
            AdminError::Auth(e) => Self::Auth(e),
            AdminError::Import(e) => Self::Interchange(e),
            AdminError::Demo(e) => Self::Demo(e),
            AdminError::NotFound(what) => Self::NotFound(what),
            other @ (AdminError::MissingField(_)
            | AdminError::InvalidEmail(_)
            | AdminError::InvalidPassword(_)
            | AdminError::SelfModification { .. }) => Self::BadRequest(other.to_string()),
        }
    }
}

/// Result type alias for `AdminError`.
pub type Result<T> = std::result::Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use eshop_storefront::error::ErrorKind;

    use super::*;

    #[test]
    fn test_admin_error_display() {
        let err = AdminError::SelfModification { action: "delete" };
        assert_eq!(err.to_string(), "you cannot delete your own account");

        let err = AdminError::MissingField("username");
        assert_eq!(err.to_string(), "username is required");
    }

    #[test]
    fn test_conversion_keeps_kind() {
        let app: AppError = AdminError::NotFound("product 9".into()).into();
        assert_eq!(app.kind(), ErrorKind::NotFound);

        let app: AppError = AdminError::SelfModification { action: "delete" }.into();
        assert_eq!(app.kind(), ErrorKind::Invalid);

        let app: AppError =
            AdminError::Repository(RepositoryError::Conflict("email already exists".into())).into();
        assert_eq!(app.kind(), ErrorKind::Conflict);
    }
}
