//! Order management panel.
//!
//! Open to admins and employees. Every change is saved together with the id
//! high-water mark and a fresh backup snapshot.

use chrono::{DateTime, Utc};

use eshop_core::{OrderId, OrderStatus};
use eshop_storefront::Storefront;
use eshop_storefront::db::Repository;
use eshop_storefront::db::orders::OrderError;
use eshop_storefront::interchange::{self, InterchangeError, OrdersBackup};
use eshop_storefront::models::order::{Order, OrderStats};
use eshop_storefront::services::auth::StaffAccess;

use crate::error::Result;

/// A downloadable backup file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFile {
    pub file_name: String,
    pub contents: String,
}

/// Order operations for staff.
pub struct OrderAdmin<'a> {
    store: &'a mut Storefront,
    access: &'a StaffAccess,
}

impl<'a> OrderAdmin<'a> {
    #[must_use]
    pub const fn new(store: &'a mut Storefront, access: &'a StaffAccess) -> Self {
        Self { store, access }
    }

    /// All orders, or only those in `status`.
    #[must_use]
    pub fn list(&self, status: Option<OrderStatus>) -> Vec<Order> {
        status.map_or_else(
            || self.store.orders().list(),
            |status| self.store.orders().by_status(status),
        )
    }

    /// # Errors
    ///
    /// Returns `AdminError::Order` with `OrderError::NotFound` for unknown ids.
    pub fn get(&self, id: OrderId) -> Result<Order> {
        self.store
            .orders()
            .get(&id)
            .ok_or_else(|| OrderError::NotFound(id).into())
    }

    #[must_use]
    pub fn stats(&self) -> OrderStats {
        self.store.orders().stats()
    }

    /// Move an order along the status table, replacing its notes if given.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` or `OrderError::InvalidTransition`.
    pub fn update_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
        notes: Option<&str>,
    ) -> Result<Order> {
        let previous = self.get(id)?.status;
        let order = self
            .store
            .orders_mut(self.access)
            .update_status(id, status, notes)?;
        self.store.persist_orders();
        tracing::info!(
            actor = self.access.actor().name(),
            order_id = %id,
            from = %previous,
            to = %status,
            "Order status changed"
        );
        Ok(order)
    }

    /// # Errors
    ///
    /// Returns `OrderError::NotFound` for unknown ids.
    pub fn update_tracking_number(&mut self, id: OrderId, tracking_number: &str) -> Result<Order> {
        let order = self
            .store
            .orders_mut(self.access)
            .update_tracking_number(id, tracking_number.trim())?;
        self.store.persist_orders();
        tracing::info!(
            actor = self.access.actor().name(),
            order_id = %id,
            "Tracking number set"
        );
        Ok(order)
    }

    /// # Errors
    ///
    /// Returns `OrderError::NotFound` for unknown ids.
    pub fn update_notes(&mut self, id: OrderId, notes: &str) -> Result<Order> {
        let order = self.store.orders_mut(self.access).update_notes(id, notes)?;
        self.store.persist_orders();
        tracing::info!(actor = self.access.actor().name(), order_id = %id, "Order notes updated");
        Ok(order)
    }

    /// Remove an order. Its id is never handed out again.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` for unknown ids.
    pub fn delete(&mut self, id: OrderId) -> Result<Order> {
        let order = self
            .store
            .orders_mut(self.access)
            .delete(&id)
            .map_err(|_| OrderError::NotFound(id))?;
        self.store.persist_orders();
        tracing::info!(actor = self.access.actor().name(), order_id = %id, "Order deleted");
        Ok(order)
    }

    /// All orders as a pretty JSON array.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Import` if serialization fails.
    pub fn export(&self) -> Result<String> {
        Ok(interchange::export_orders(self.store.orders())?)
    }

    /// Replace every order with the contents of `json`.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Import`; orders are unchanged on error.
    pub fn import(&mut self, json: &str) -> Result<usize> {
        let count = interchange::import_orders(self.store.orders_mut(self.access), json)?;
        self.store.persist_orders();
        tracing::info!(actor = self.access.actor().name(), count, "Orders replaced from import");
        Ok(count)
    }

    /// Backup snapshot named after `now`.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Import` if serialization fails.
    pub fn backup(&self, now: DateTime<Utc>) -> Result<BackupFile> {
        let snapshot = OrdersBackup::new(self.store.orders().list(), now);
        let contents = serde_json::to_string_pretty(&snapshot).map_err(InterchangeError::from)?;
        Ok(BackupFile {
            file_name: interchange::backup_file_name("orders", now),
            contents,
        })
    }
}
