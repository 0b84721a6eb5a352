//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! ESHOP_ADMIN_PASSWORD='...' eshop-cli admin create -u owner -n "Store Owner" -e owner@shop.example
//! ```
//!
//! # Environment Variables
//!
//! - `ESHOP_ADMIN_PASSWORD` - Password for the new account. At least 12
//!   characters, no placeholder text, reasonable entropy.

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};

use eshop_admin::{UserAdmin, UserForm};
use eshop_core::UserRole;
use eshop_storefront::config::{StorefrontConfig, admin_password_from_env};
use eshop_storefront::services::auth::AuthGate;

use super::CliError;

/// Create an admin account with the password from `ESHOP_ADMIN_PASSWORD`.
///
/// # Errors
///
/// Returns `CliError::Config` for a missing or weak password and
/// `CliError::Admin` if the username or email is taken.
pub fn create_user(
    config: StorefrontConfig,
    username: &str,
    name: &str,
    email: &str,
) -> Result<(), CliError> {
    let password = admin_password_from_env()?;
    create_with_password(config, username, name, email, &password)
}

fn create_with_password(
    config: StorefrontConfig,
    username: &str,
    name: &str,
    email: &str,
    password: &SecretString,
) -> Result<(), CliError> {
    let form = UserForm {
        username: username.to_owned(),
        password: password.expose_secret().to_owned(),
        role: UserRole::Admin,
        name: name.to_owned(),
        email: email.to_owned(),
        is_active: true,
        phone: None,
        address: None,
    };

    let mut store = super::open(config)?;
    let access = AuthGate::operator();
    tracing::info!("Creating admin user: {username} ({email})");
    let user = UserAdmin::new(&mut store, &access).create(&form, Utc::now().date_naive())?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Username: {}",
        user.id,
        user.username
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use eshop_storefront::Storefront;

    use super::*;
    use crate::commands::tests::temp_config;

    #[test]
    fn test_create_admin_can_log_in() {
        let (_dir, config) = temp_config();
        let password = SecretString::from("aB3$xY9!mK2@nL5#");
        create_with_password(config.clone(), "owner", "Store Owner", "owner@shop.example", &password)
            .unwrap();

        let mut store = Storefront::open(config.clone()).unwrap();
        store.login("owner", "aB3$xY9!mK2@nL5#", false).unwrap();
        assert!(store.require_admin().is_ok());

        assert!(matches!(
            create_with_password(config, "owner", "Again", "other@shop.example", &password),
            Err(CliError::Admin(_))
        ));
    }
}
