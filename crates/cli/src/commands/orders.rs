//! Order queue commands.

use std::path::Path;

use chrono::Utc;
use tracing::info;

use eshop_admin::OrderAdmin;
use eshop_core::{OrderId, OrderStatus};
use eshop_storefront::config::StorefrontConfig;
use eshop_storefront::services::auth::AuthGate;

use super::CliError;

fn parse_status(status: &str) -> Result<OrderStatus, CliError> {
    status
        .trim()
        .to_lowercase()
        .parse()
        .map_err(CliError::InvalidArgument)
}

/// Log every order, optionally filtered by status.
///
/// # Errors
///
/// Returns `CliError::InvalidArgument` for an unknown status.
pub fn list(config: StorefrontConfig, status: Option<&str>) -> Result<(), CliError> {
    let status = status.map(parse_status).transpose()?;
    let currency = config.currency;
    let mut store = super::open(config)?;
    let access = AuthGate::operator().as_staff();
    let orders = OrderAdmin::new(&mut store, &access).list(status);

    info!("{} order(s)", orders.len());
    for order in &orders {
        info!(
            "  #{} {} {} {} ({} items) {}",
            order.id,
            order.order_date,
            order.status,
            order.customer_name,
            order.unit_count(),
            order.total_amount.display(currency)
        );
    }
    Ok(())
}

/// Log order counts per status and revenue.
///
/// # Errors
///
/// Returns an error if the data directory cannot be opened.
pub fn stats(config: StorefrontConfig) -> Result<(), CliError> {
    let currency = config.currency;
    let mut store = super::open(config)?;
    let access = AuthGate::operator().as_staff();
    let stats = OrderAdmin::new(&mut store, &access).stats();

    info!("Order Statistics");
    info!("================");
    info!("Total orders: {}", stats.total_orders);
    info!("Revenue (excluding cancelled): {}", stats.total_revenue.display(currency));
    for status in OrderStatus::ALL {
        info!("  {status}: {}", stats.count(status));
    }
    Ok(())
}

/// Move an order to `status`.
///
/// # Errors
///
/// Returns `CliError::InvalidArgument` for an unknown status and
/// `CliError::Admin` for unknown orders or forbidden transitions.
pub fn set_status(
    config: StorefrontConfig,
    id: i32,
    status: &str,
    notes: Option<&str>,
) -> Result<(), CliError> {
    let status = parse_status(status)?;
    let mut store = super::open(config)?;
    let access = AuthGate::operator().as_staff();
    let order = OrderAdmin::new(&mut store, &access).update_status(OrderId::new(id), status, notes)?;
    info!("Order #{} is now {}", order.id, order.status);
    Ok(())
}

/// Write all orders as JSON.
///
/// # Errors
///
/// Returns `CliError::Io` if the output cannot be written.
pub async fn export(config: StorefrontConfig, output: Option<&Path>) -> Result<(), CliError> {
    let mut store = super::open(config)?;
    let access = AuthGate::operator().as_staff();
    let json = OrderAdmin::new(&mut store, &access).export()?;
    super::write_output(output, &json).await
}

/// Replace all orders from a JSON file.
///
/// # Errors
///
/// Returns `CliError::Admin` if the file is not a valid orders array; the
/// stored orders are untouched then.
pub async fn import(config: StorefrontConfig, file: &Path) -> Result<(), CliError> {
    let json = super::read_input(file).await?;
    let mut store = super::open(config)?;
    let access = AuthGate::operator().as_staff();
    let mut admin = OrderAdmin::new(&mut store, &access);
    let count = admin.import(&json)?;
    info!("Imported {count} order(s)");
    info!("Next order id: {}", store.orders().next_id());
    Ok(())
}

/// Write a timestamped backup file into `dir`.
///
/// # Errors
///
/// Returns `CliError::Io` if the file cannot be written.
pub async fn backup(config: StorefrontConfig, dir: &Path) -> Result<(), CliError> {
    let mut store = super::open(config)?;
    let access = AuthGate::operator().as_staff();
    let backup = OrderAdmin::new(&mut store, &access).backup(Utc::now())?;
    let path = dir.join(&backup.file_name);
    super::write_output(Some(&path), &backup.contents).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use eshop_storefront::Storefront;
    use eshop_storefront::db::Repository;

    use super::*;
    use crate::commands::seed;
    use crate::commands::tests::temp_config;

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status(" Shipped ").unwrap(), OrderStatus::Shipped);
        assert!(matches!(
            parse_status("lost"),
            Err(CliError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_set_status_persists() {
        let (_dir, config) = temp_config();
        seed::run(config.clone(), None, false).await.unwrap();

        set_status(config.clone(), 1004, "processing", Some("Packed")).unwrap();
        assert!(matches!(
            set_status(config.clone(), 1004, "pending", None),
            Err(CliError::Admin(_))
        ));

        let store = Storefront::open(config).unwrap();
        let order = store.orders().get(&OrderId::new(1004)).unwrap();
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.notes.as_deref(), Some("Packed"));
    }

    #[tokio::test]
    async fn test_export_backup_and_import() {
        let (dir, config) = temp_config();
        seed::run(config.clone(), None, false).await.unwrap();

        let export_path = dir.path().join("orders.json");
        export(config.clone(), Some(&export_path)).await.unwrap();
        backup(config.clone(), dir.path()).await.unwrap();
        let backups = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("orders-backup-")
            })
            .count();
        assert_eq!(backups, 1);

        let (_other, fresh) = temp_config();
        import(fresh.clone(), &export_path).await.unwrap();
        let store = Storefront::open(fresh).unwrap();
        assert_eq!(store.orders().len(), 7);
        assert_eq!(store.orders().next_id(), OrderId::new(1008));
    }
}
