//! Reopening a data directory and moving data between stores.

#![allow(clippy::unwrap_used)]

use eshop_admin::{CatalogAdmin, OrderAdmin, UserAdmin};
use eshop_core::{OrderId, OrderStatus, Price, ProductId};
use eshop_integration_tests::{now, order_day, shipping_address};
use eshop_storefront::Storefront;
use eshop_storefront::checkout::PaymentConfirmation;
use eshop_storefront::config::StorefrontConfig;
use eshop_storefront::db::Repository;
use eshop_storefront::demo::DemoData;
use eshop_storefront::services::auth::AuthGate;

fn file_config(dir: &tempfile::TempDir) -> StorefrontConfig {
    StorefrontConfig {
        data_dir: dir.path().to_path_buf(),
        ..StorefrontConfig::default()
    }
}

#[test]
fn test_orders_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut storefront = Storefront::open(file_config(&dir)).unwrap();
        storefront
            .seed(&AuthGate::operator(), DemoData::load().unwrap())
            .unwrap();
        storefront.add_to_cart(&ProductId::from("5"), "8 inch").unwrap();
        storefront
            .checkout(
                &shipping_address(),
                &PaymentConfirmation::trusted("Cash on Delivery"),
                order_day(),
            )
            .unwrap();
    }

    let mut reopened = Storefront::open(file_config(&dir)).unwrap();
    assert_eq!(reopened.orders().len(), 8);
    assert_eq!(reopened.orders().next_id(), OrderId::new(1009));
    assert_eq!(reopened.company().name.en, "ABN Heating System");

    let staff = AuthGate::operator().as_staff();
    let mut orders = OrderAdmin::new(&mut reopened, &staff);
    orders
        .update_status(OrderId::new(1008), OrderStatus::Cancelled, Some("Duplicate"))
        .unwrap();

    let again = Storefront::open(file_config(&dir)).unwrap();
    let stats = again.orders().stats();
    assert_eq!(stats.count(OrderStatus::Cancelled), 2);
    assert_eq!(stats.total_revenue, Price::from_units(12_361));
}

#[test]
fn test_export_import_between_stores() {
    let source_dir = tempfile::tempdir().unwrap();
    let mut source = Storefront::open(file_config(&source_dir)).unwrap();
    source
        .seed(&AuthGate::operator(), DemoData::load().unwrap())
        .unwrap();
    let admin = AuthGate::operator();
    let staff = admin.as_staff();

    let products = CatalogAdmin::new(&mut source, &admin).export().unwrap();
    let users = UserAdmin::new(&mut source, &admin).export().unwrap();
    let orders = OrderAdmin::new(&mut source, &staff).export().unwrap();
    assert!(!users.contains("admin123"));

    let target_dir = tempfile::tempdir().unwrap();
    {
        let mut target = Storefront::open(file_config(&target_dir)).unwrap();
        assert_eq!(CatalogAdmin::new(&mut target, &admin).import(&products).unwrap(), 8);
        assert_eq!(UserAdmin::new(&mut target, &admin).import(&users).unwrap(), 5);
        assert_eq!(OrderAdmin::new(&mut target, &staff).import(&orders).unwrap(), 7);
    }

    let mut target = Storefront::open(file_config(&target_dir)).unwrap();
    assert_eq!(target.orders().list(), source.orders().list());
    assert_eq!(target.orders().next_id(), OrderId::new(1008));
    assert!(target.login("employee1", "emp123", false).is_ok());

    let backup = OrderAdmin::new(&mut target, &staff).backup(now()).unwrap();
    assert_eq!(backup.file_name, "orders-backup-2025-08-01T09-30-00.json");
}
