//! The storefront facade.
//!
//! [`Storefront`] owns the repositories, company settings, the shopper's cart
//! and both storage scopes. Reads are open; writes to the catalog, users,
//! orders or company record require a capability from the auth gate.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use eshop_core::{CurrencyCode, Language, OrderId, ProductId};

use crate::cart::{Cart, CartState, CartView};
use crate::catalog::Product;
use crate::checkout::{
    CheckoutError, CheckoutTotals, CustomerInfo, OrderRecorder, PaymentConfirmation,
};
use crate::company::{CompanySettings, CompanyValidationError};
use crate::config::StorefrontConfig;
use crate::db::Repository;
use crate::db::orders::OrderRepository;
use crate::db::products::ProductRepository;
use crate::db::users::UserRepository;
use crate::demo::DemoData;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::interchange::OrdersBackup;
use crate::models::order::{Order, ShippingAddress};
use crate::models::session::AuthRecord;
use crate::services::auth::{
    AdminAccess, AuthError, AuthGate, AuthService, RegistrationForm, StaffAccess, restore_session,
};
use crate::storage::{self, FileStore, KeyValueStore, MemoryStore, keys};

/// Storefront state for one shopper session.
#[derive(Debug)]
pub struct Storefront {
    config: StorefrontConfig,
    products: ProductRepository,
    users: UserRepository,
    orders: OrderRepository,
    company: CompanySettings,
    persistent: Box<dyn KeyValueStore>,
    session: Box<dyn KeyValueStore>,
    cart: Cart,
    /// Keys whose stored value could not be read; saves to them are refused.
    held: Vec<&'static str>,
}

impl Storefront {
    /// Open the file-backed store in `config.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Storage` if the directory cannot be created and
    /// `AppError::Repository` if stored collections contain duplicate ids.
    pub fn open(config: StorefrontConfig) -> Result<Self> {
        let store = FileStore::open(config.data_dir.clone())?;
        tracing::info!(data_dir = %config.data_dir.display(), "Opened data directory");
        Self::with_store(config, Box::new(store))
    }

    /// A storefront backed only by memory. Starts empty.
    #[must_use]
    pub fn in_memory(config: StorefrontConfig) -> Self {
        let policy = config.size_policy;
        Self {
            config,
            products: ProductRepository::new(),
            users: UserRepository::new(),
            orders: OrderRepository::new(),
            company: CompanySettings::default(),
            persistent: Box::new(MemoryStore::new()),
            session: Box::new(MemoryStore::new()),
            cart: Cart::new(policy),
            held: Vec::new(),
        }
    }

    /// Load every collection from `persistent`.
    ///
    /// Missing entries start empty. Orders, products and users fall back to
    /// their backup entry when the main entry is unreadable. An entry that
    /// cannot be read at all also starts empty, but is held: saves to it are
    /// refused until [`Self::seed`] replaces everything.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Repository` if a stored collection has duplicate ids.
    pub fn with_store(config: StorefrontConfig, persistent: Box<dyn KeyValueStore>) -> Result<Self> {
        let store = persistent.as_ref();
        let mut held = Vec::new();
        let products = ProductRepository::from_products(load_collection(
            store,
            keys::PRODUCTS,
            keys::PRODUCTS_BACKUP,
            &mut held,
        ))?;
        let users = UserRepository::from_users(load_collection(
            store,
            keys::USERS,
            keys::USERS_BACKUP,
            &mut held,
        ))?;
        let orders = OrderRepository::from_orders(
            load_orders(store),
            storage::load::<OrderId>(store, keys::ORDER_SEQUENCE).unwrap_or_default(),
        )?;
        let company = load_or_hold(store, keys::COMPANY, &mut held).unwrap_or_default();

        tracing::debug!(
            products = products.len(),
            users = users.len(),
            orders = orders.len(),
            "Loaded storefront data"
        );

        let policy = config.size_policy;
        Ok(Self {
            config,
            products,
            users,
            orders,
            company,
            persistent,
            session: Box::new(MemoryStore::new()),
            cart: Cart::new(policy),
            held,
        })
    }

    /// Whether nothing has been stored yet. Unreadable entries count as data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
            && self.products.is_empty()
            && self.users.is_empty()
            && self.orders.is_empty()
    }

    /// Stored keys that could not be read and are not being overwritten.
    #[must_use]
    pub fn held_keys(&self) -> &[&'static str] {
        &self.held
    }

    /// Replace every collection with `data` and persist it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Demo` if a password cannot be hashed and
    /// `AppError::Repository` on duplicate ids.
    pub fn seed(&mut self, access: &AdminAccess, data: DemoData) -> Result<()> {
        let users = data.hashed_users()?;
        self.products.replace_all(data.products)?;
        self.users.replace_all(users)?;
        self.orders.replace_all(data.orders)?;
        self.company = data.company;
        if !self.held.is_empty() {
            tracing::warn!(keys = ?self.held, "Replacing unreadable stored values");
            self.held.clear();
        }
        self.persist_all();
        tracing::info!(
            actor = access.actor().name(),
            products = self.products.len(),
            users = self.users.len(),
            orders = self.orders.len(),
            "Seeded storefront"
        );
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    #[must_use]
    pub const fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.config.currency
    }

    #[must_use]
    pub const fn company(&self) -> &CompanySettings {
        &self.company
    }

    #[must_use]
    pub const fn products(&self) -> &ProductRepository {
        &self.products
    }

    #[must_use]
    pub const fn users(&self) -> &UserRepository {
        &self.users
    }

    #[must_use]
    pub const fn orders(&self) -> &OrderRepository {
        &self.orders
    }

    #[must_use]
    pub fn product(&self, id: &ProductId) -> Option<Product> {
        self.products.get(id)
    }

    // =========================================================================
    // Cart and checkout
    // =========================================================================

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    /// Add one unit of a catalog product to the cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for unknown products and `AppError::Cart`
    /// when the size is rejected.
    pub fn add_to_cart(&mut self, product_id: &ProductId, size: &str) -> Result<&CartState> {
        let product = self
            .products
            .get(product_id)
            .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;
        Ok(self.cart.add(&product, size)?)
    }

    #[must_use]
    pub fn cart_view(&self, language: Language) -> CartView {
        CartView::new(
            &self.cart,
            &self.company.shipping_settings,
            language,
            self.config.currency,
        )
    }

    /// Totals for the current cart under the company tax and shipping rules.
    #[must_use]
    pub fn checkout_totals(&self) -> CheckoutTotals {
        CheckoutTotals::compute(
            self.cart.state(),
            &self.company.tax_settings,
            &self.company.shipping_settings,
        )
    }

    /// Place an order for the current cart, clear the cart and persist orders.
    ///
    /// The order belongs to the logged-in user, or to a guest.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` for an empty cart and
    /// `CheckoutError::IncompleteAddress` for a blank address field. The cart
    /// is left as it was on error.
    pub fn checkout(
        &mut self,
        address: &ShippingAddress,
        payment: &PaymentConfirmation,
        today: NaiveDate,
    ) -> std::result::Result<Order, CheckoutError> {
        let customer = self
            .current_session()
            .map_or_else(CustomerInfo::guest, |record| CustomerInfo::from(&record.user));

        let order = OrderRecorder::new(
            &mut self.orders,
            self.company.tax_settings,
            self.company.shipping_settings,
        )
        .place_order(self.cart.state(), &customer, address, payment, today)?;

        self.cart.clear();
        self.persist_orders();
        let order_id = order.id.to_string();
        add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order_id.as_str())]));
        Ok(order)
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Log in and persist the refreshed `last_login`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` on any mismatch.
    pub fn login(
        &mut self,
        username: &str,
        password: &str,
        remember_me: bool,
    ) -> std::result::Result<AuthRecord, AuthError> {
        let record = self.auth().login(username, password, remember_me)?;
        self.persist_users();
        Ok(record)
    }

    /// Register a customer account and log it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Registration` or `AuthError::UserAlreadyExists`.
    pub fn register(
        &mut self,
        form: &RegistrationForm,
    ) -> std::result::Result<AuthRecord, AuthError> {
        let record = self.auth().register(form)?;
        self.persist_users();
        Ok(record)
    }

    pub fn logout(&mut self) {
        self.auth().logout();
    }

    /// The stored login, if any.
    #[must_use]
    pub fn current_session(&self) -> Option<AuthRecord> {
        restore_session(self.persistent.as_ref(), self.session.as_ref())
    }

    /// Admin capability for the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` or `AuthError::Forbidden`.
    pub fn require_admin(&self) -> std::result::Result<AdminAccess, AuthError> {
        AuthGate::new(&self.users).require_admin(self.current_session().as_ref())
    }

    /// Staff capability for the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` or `AuthError::Forbidden`.
    pub fn require_staff(&self) -> std::result::Result<StaffAccess, AuthError> {
        AuthGate::new(&self.users).require_staff(self.current_session().as_ref())
    }

    fn auth(&mut self) -> AuthService<'_> {
        AuthService::new(
            &mut self.users,
            self.persistent.as_mut(),
            self.session.as_mut(),
        )
    }

    // =========================================================================
    // Gated writes
    // =========================================================================

    /// Catalog for editing. Call [`Self::persist_products`] afterwards.
    pub const fn products_mut(&mut self, _access: &AdminAccess) -> &mut ProductRepository {
        &mut self.products
    }

    /// Accounts for editing. Call [`Self::persist_users`] afterwards.
    pub const fn users_mut(&mut self, _access: &AdminAccess) -> &mut UserRepository {
        &mut self.users
    }

    /// Orders for editing. Call [`Self::persist_orders`] afterwards.
    pub const fn orders_mut(&mut self, _access: &StaffAccess) -> &mut OrderRepository {
        &mut self.orders
    }

    /// Validate and store new company settings.
    ///
    /// # Errors
    ///
    /// Returns the validation error; the old settings stay in place.
    pub fn update_company(
        &mut self,
        access: &AdminAccess,
        settings: CompanySettings,
    ) -> std::result::Result<(), CompanyValidationError> {
        settings.validate()?;
        self.company = settings;
        self.persist_company();
        tracing::info!(actor = access.actor().name(), "Company settings updated");
        Ok(())
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Best-effort save of the catalog and its backup copy.
    pub fn persist_products(&mut self) -> bool {
        let products = self.products.list();
        self.persist_collection(keys::PRODUCTS, keys::PRODUCTS_BACKUP, &products)
    }

    /// Best-effort save of all accounts and their backup copy.
    pub fn persist_users(&mut self) -> bool {
        let users = self.users.list();
        self.persist_collection(keys::USERS, keys::USERS_BACKUP, &users)
    }

    /// Best-effort save of orders, the id high-water mark and a backup snapshot.
    pub fn persist_orders(&mut self) -> bool {
        let orders = self.orders.list();
        let store = self.persistent.as_mut();
        let saved = storage::persist(store, keys::ORDERS, &orders);
        storage::persist(
            store,
            keys::ORDER_SEQUENCE,
            &self.orders.high_water_mark(),
        );
        storage::persist(
            store,
            keys::ORDERS_BACKUP,
            &OrdersBackup::new(orders, Utc::now()),
        );
        saved
    }

    /// Best-effort save of the company record.
    pub fn persist_company(&mut self) -> bool {
        if self.is_held(keys::COMPANY) {
            return false;
        }
        storage::persist(self.persistent.as_mut(), keys::COMPANY, &self.company)
    }

    /// Save everything. Returns whether every write succeeded.
    pub fn persist_all(&mut self) -> bool {
        [
            self.persist_products(),
            self.persist_users(),
            self.persist_orders(),
            self.persist_company(),
        ]
        .iter()
        .all(|saved| *saved)
    }

    fn persist_collection<T: Serialize>(
        &mut self,
        key: &'static str,
        backup_key: &'static str,
        items: &[T],
    ) -> bool {
        if self.is_held(key) {
            return false;
        }
        let store = self.persistent.as_mut();
        let saved = storage::persist(store, key, items);
        storage::persist(store, backup_key, items);
        saved
    }

    fn is_held(&self, key: &'static str) -> bool {
        let held = self.held.contains(&key);
        if held {
            tracing::warn!(key, "Not overwriting unreadable stored value");
            add_breadcrumb("storage", "Persist held", Some(&[("key", key)]));
        }
        held
    }
}

/// Main entry, else its backup copy.
fn load_collection<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &'static str,
    backup_key: &'static str,
    held: &mut Vec<&'static str>,
) -> Vec<T> {
    let mut unreadable = false;
    match storage::load_json::<Vec<T>>(store, key) {
        Ok(Some(items)) => return items,
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(key, error = %e, "Stored collection unreadable");
            unreadable = true;
        }
    }
    match storage::load_json::<Vec<T>>(store, backup_key) {
        Ok(Some(items)) => {
            tracing::warn!(key, count = items.len(), "Restoring from backup");
            return items;
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(key = backup_key, error = %e, "Stored backup unreadable");
            unreadable = true;
        }
    }
    if unreadable {
        hold(key, held);
    }
    Vec::new()
}

fn load_or_hold<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &'static str,
    held: &mut Vec<&'static str>,
) -> Option<T> {
    storage::load_json(store, key).unwrap_or_else(|e| {
        tracing::warn!(key, error = %e, "Stored value unreadable");
        hold(key, held);
        None
    })
}

fn hold(key: &'static str, held: &mut Vec<&'static str>) {
    add_breadcrumb("storage", "Load failed", Some(&[("key", key)]));
    held.push(key);
}

fn load_orders(store: &dyn KeyValueStore) -> Vec<Order> {
    if let Some(orders) = storage::load(store, keys::ORDERS) {
        return orders;
    }
    match storage::load::<OrdersBackup>(store, keys::ORDERS_BACKUP) {
        Some(backup) => {
            tracing::warn!(
                count = backup.count,
                taken_at = %backup.timestamp,
                "Restoring orders from backup"
            );
            backup.orders
        }
        None => Vec::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use eshop_core::{OrderStatus, Price};

    use super::*;
    use crate::catalog::product::tests::{plain_product, sized_product};
    use crate::checkout::tests::address;

    fn demo_storefront() -> Storefront {
        let mut storefront = Storefront::in_memory(StorefrontConfig::default());
        storefront
            .seed(&AuthGate::operator(), DemoData::load().unwrap())
            .unwrap();
        storefront
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_checkout_clears_cart_and_assigns_next_id() {
        let mut storefront = demo_storefront();
        storefront
            .add_to_cart(&ProductId::from("1"), "12 inch")
            .unwrap();
        let order = storefront
            .checkout(&address(), &PaymentConfirmation::trusted("UPI"), date(2025, 8, 1))
            .unwrap();

        assert_eq!(order.id, OrderId::new(1008));
        assert_eq!(order.customer_name, "Guest User");
        // 850 + 153 tax + 99 shipping
        assert_eq!(order.total_amount, Price::from_units(1102));
        assert!(storefront.cart().is_empty());
        assert_eq!(storefront.orders().len(), 8);
    }

    #[test]
    fn test_empty_cart_checkout_leaves_orders_alone() {
        let mut storefront = demo_storefront();
        let result =
            storefront.checkout(&address(), &PaymentConfirmation::trusted("UPI"), date(2025, 8, 1));
        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
        assert_eq!(storefront.orders().len(), 7);
    }

    #[test]
    fn test_logged_in_checkout_uses_account() {
        let mut storefront = demo_storefront();
        storefront.login("customer1", "cust123", false).unwrap();
        storefront
            .add_to_cart(&ProductId::from("5"), "6 inch")
            .unwrap();
        let order = storefront
            .checkout(&address(), &PaymentConfirmation::trusted("UPI"), date(2025, 8, 1))
            .unwrap();
        assert_eq!(order.customer_name, "Sarah Wilson");
        assert_eq!(order.user_id.as_i32(), 5);
    }

    #[test]
    fn test_unknown_product_is_not_found() {
        let mut storefront = demo_storefront();
        let err = storefront
            .add_to_cart(&ProductId::from("999"), "")
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_capabilities_follow_login() {
        let mut storefront = demo_storefront();
        assert!(matches!(
            storefront.require_staff(),
            Err(AuthError::Unauthenticated)
        ));

        storefront.login("employee1", "emp123", false).unwrap();
        assert!(storefront.require_staff().is_ok());
        assert!(matches!(
            storefront.require_admin(),
            Err(AuthError::Forbidden { .. })
        ));

        storefront.logout();
        storefront.login("admin", "admin123", true).unwrap();
        let admin = storefront.require_admin().unwrap();
        storefront
            .products_mut(&admin)
            .add(plain_product("42", 999))
            .unwrap();
        assert!(storefront.product(&ProductId::from("42")).is_some());
    }

    #[test]
    fn test_update_company_validates() {
        let mut storefront = demo_storefront();
        let admin = AuthGate::operator();
        let mut settings = storefront.company().clone();
        settings.name.en = String::new();
        assert_eq!(
            storefront.update_company(&admin, settings),
            Err(CompanyValidationError::MissingName)
        );
        assert_eq!(storefront.company().name.en, "ABN Heating System");
    }

    #[test]
    fn test_reopen_keeps_data_and_id_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorefrontConfig {
            data_dir: dir.path().to_path_buf(),
            ..StorefrontConfig::default()
        };

        let mut storefront = Storefront::open(config.clone()).unwrap();
        assert!(storefront.is_empty());
        storefront
            .seed(&AuthGate::operator(), DemoData::load().unwrap())
            .unwrap();
        let staff = AuthGate::operator().as_staff();
        storefront
            .products_mut(&AuthGate::operator())
            .add(sized_product("77"))
            .unwrap();
        storefront.persist_products();
        storefront.add_to_cart(&ProductId::from("77"), "12 inch").unwrap();
        let placed = storefront
            .checkout(&address(), &PaymentConfirmation::trusted("UPI"), date(2025, 8, 1))
            .unwrap();
        storefront.orders_mut(&staff).delete(&placed.id).unwrap();
        storefront.persist_orders();

        let mut reopened = Storefront::open(config).unwrap();
        assert_eq!(reopened.orders().len(), 7);
        assert_eq!(reopened.orders().next_id(), OrderId::new(1009));
        assert!(reopened.product(&ProductId::from("77")).is_some());
        assert!(reopened.login("admin", "admin123", false).is_ok());
        assert_eq!(
            reopened.orders().stats().count(OrderStatus::Pending),
            3
        );
    }

    #[test]
    fn test_orders_restored_from_backup() {
        let mut store = MemoryStore::new();
        let orders = DemoData::load().unwrap().orders;
        storage::save_json(
            &mut store,
            keys::ORDERS_BACKUP,
            &OrdersBackup::new(orders, Utc::now()),
        )
        .unwrap();
        store.set(keys::ORDERS, "{ not json").unwrap();

        let storefront = Storefront::with_store(StorefrontConfig::default(), Box::new(store)).unwrap();
        assert_eq!(storefront.orders().len(), 7);
    }

    #[test]
    fn test_users_restored_from_backup() {
        let mut store = MemoryStore::new();
        let users = DemoData::load().unwrap().hashed_users().unwrap();
        storage::save_json(&mut store, keys::USERS_BACKUP, &users).unwrap();
        store.set(keys::USERS, "[{ truncated").unwrap();

        let mut storefront =
            Storefront::with_store(StorefrontConfig::default(), Box::new(store)).unwrap();
        assert_eq!(storefront.users().len(), 5);
        assert!(storefront.held_keys().is_empty());
        assert!(storefront.login("admin", "admin123", false).is_ok());
    }

    #[test]
    fn test_unreadable_users_are_not_overwritten() {
        let mut store = MemoryStore::new();
        store.set(keys::USERS, "[{ truncated").unwrap();

        let mut storefront =
            Storefront::with_store(StorefrontConfig::default(), Box::new(store)).unwrap();
        assert!(storefront.users().is_empty());
        assert_eq!(storefront.held_keys(), &[keys::USERS]);
        assert!(!storefront.is_empty());

        let form = RegistrationForm {
            username: "newcomer".to_owned(),
            password: "secret1".to_owned(),
            confirm_password: "secret1".to_owned(),
            name: "New Comer".to_owned(),
            email: "newcomer@mail.example".to_owned(),
            phone: None,
            address: None,
        };
        storefront.register(&form).unwrap();
        assert!(!storefront.persist_users());
        assert_eq!(
            storefront.persistent.get(keys::USERS).unwrap().as_deref(),
            Some("[{ truncated")
        );
        assert_eq!(storefront.persistent.get(keys::USERS_BACKUP).unwrap(), None);

        // Seeding is an explicit replacement.
        storefront
            .seed(&AuthGate::operator(), DemoData::load().unwrap())
            .unwrap();
        assert!(storefront.held_keys().is_empty());
        let saved: Vec<crate::models::User> =
            storage::load_json(storefront.persistent.as_ref(), keys::USERS)
                .unwrap()
                .unwrap();
        assert_eq!(saved.len(), 5);
    }

    #[test]
    fn test_unreadable_company_keeps_defaults_without_saving() {
        let mut store = MemoryStore::new();
        store.set(keys::COMPANY, "not json").unwrap();

        let mut storefront =
            Storefront::with_store(StorefrontConfig::default(), Box::new(store)).unwrap();
        assert_eq!(storefront.held_keys(), &[keys::COMPANY]);
        assert!(!storefront.persist_company());
        assert_eq!(
            storefront.persistent.get(keys::COMPANY).unwrap().as_deref(),
            Some("not json")
        );
    }
}
