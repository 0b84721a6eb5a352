//! Account commands. Exports carry password hashes, never plain passwords.

use std::path::Path;

use tracing::info;

use eshop_admin::UserAdmin;
use eshop_storefront::config::StorefrontConfig;
use eshop_storefront::services::auth::AuthGate;

use super::CliError;

/// Log every account.
///
/// # Errors
///
/// Returns an error if the data directory cannot be opened.
pub fn list(config: StorefrontConfig) -> Result<(), CliError> {
    let mut store = super::open(config)?;
    let access = AuthGate::operator();
    let users = UserAdmin::new(&mut store, &access).list();

    info!("{} user(s)", users.len());
    for user in &users {
        info!(
            "  #{} {} <{}> {}{}",
            user.id,
            user.username,
            user.email,
            user.role,
            if user.is_active { "" } else { " (disabled)" }
        );
    }
    Ok(())
}

/// Write all accounts as JSON.
///
/// # Errors
///
/// Returns `CliError::Io` if the output cannot be written.
pub async fn export(config: StorefrontConfig, output: Option<&Path>) -> Result<(), CliError> {
    let mut store = super::open(config)?;
    let access = AuthGate::operator();
    let json = UserAdmin::new(&mut store, &access).export()?;
    super::write_output(output, &json).await
}

/// Replace all accounts from a JSON file.
///
/// # Errors
///
/// Returns `CliError::Admin` if the file is not a valid users array; the
/// stored accounts are untouched then.
pub async fn import(config: StorefrontConfig, file: &Path) -> Result<(), CliError> {
    let json = super::read_input(file).await?;
    let mut store = super::open(config)?;
    let access = AuthGate::operator();
    let count = UserAdmin::new(&mut store, &access).import(&json)?;
    info!("Imported {count} user(s)");
    Ok(())
}
