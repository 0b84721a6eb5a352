//! Order repository.
//!
//! Ids come from a high-water mark: the largest id ever held, whether or not
//! that order still exists. Deleting the newest order never frees its id, and
//! importing a collection raises the mark to the imported maximum.

use thiserror::Error;

use eshop_core::{OrderId, OrderStatus, UserId};

use super::{Entity, MemoryRepository, Repository, RepositoryError};
use crate::models::order::{Order, OrderStats};

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &OrderId {
        &self.id
    }
}

/// Errors from order updates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("order {0} not found")]
    NotFound(OrderId),

    #[error("order {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Repository for orders.
#[derive(Debug, Clone, Default)]
pub struct OrderRepository {
    inner: MemoryRepository<Order>,
    high_water: OrderId,
}

impl OrderRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored orders and the last recorded high-water mark.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` on duplicate ids.
    pub fn from_orders(orders: Vec<Order>, high_water: OrderId) -> Result<Self, RepositoryError> {
        let high_water = max_id(&orders).max(high_water);
        Ok(Self {
            inner: MemoryRepository::from_entities(orders)?,
            high_water,
        })
    }

    /// Largest id ever assigned or imported.
    #[must_use]
    pub const fn high_water_mark(&self) -> OrderId {
        self.high_water
    }

    /// Id the next placed order will receive.
    #[must_use]
    pub const fn next_id(&self) -> OrderId {
        self.high_water.next()
    }

    /// Assign the next id to `order` and append it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the id is somehow taken.
    pub fn insert_new(&mut self, mut order: Order) -> Result<Order, RepositoryError> {
        order.id = self.next_id();
        self.add(order)
    }

    /// Orders placed by `user_id`.
    #[must_use]
    pub fn by_user(&self, user_id: UserId) -> Vec<Order> {
        self.inner.filter(|order| order.user_id == user_id)
    }

    /// Orders currently in `status`.
    #[must_use]
    pub fn by_status(&self, status: OrderStatus) -> Vec<Order> {
        self.inner.filter(|order| order.status == status)
    }

    #[must_use]
    pub fn stats(&self) -> OrderStats {
        OrderStats::from_orders(&self.inner.list())
    }

    /// Move an order to `status`, replacing its notes when `notes` is given.
    ///
    /// Setting the current status again succeeds and only touches the notes.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` for unknown ids and
    /// `OrderError::InvalidTransition` when the status table forbids the move.
    pub fn update_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
        notes: Option<&str>,
    ) -> Result<Order, OrderError> {
        self.modify(id, |order| {
            if !order.status.can_transition_to(status) {
                return Err(OrderError::InvalidTransition {
                    id,
                    from: order.status,
                    to: status,
                });
            }
            order.status = status;
            if let Some(notes) = notes.filter(|n| !n.is_empty()) {
                order.notes = Some(notes.to_owned());
            }
            Ok(())
        })
    }

    /// Set the carrier tracking number.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` for unknown ids.
    pub fn update_tracking_number(
        &mut self,
        id: OrderId,
        tracking_number: &str,
    ) -> Result<Order, OrderError> {
        self.modify(id, |order| {
            order.tracking_number = Some(tracking_number.to_owned());
            Ok(())
        })
    }

    /// Replace the admin notes; an empty string clears them.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` for unknown ids.
    pub fn update_notes(&mut self, id: OrderId, notes: &str) -> Result<Order, OrderError> {
        self.modify(id, |order| {
            order.notes = (!notes.is_empty()).then(|| notes.to_owned());
            Ok(())
        })
    }

    fn modify(
        &mut self,
        id: OrderId,
        change: impl FnOnce(&mut Order) -> Result<(), OrderError>,
    ) -> Result<Order, OrderError> {
        self.inner.modify(&id, change).map_err(|e| match e {
            OrderError::Repository(RepositoryError::NotFound) => OrderError::NotFound(id),
            other => other,
        })
    }
}

impl Repository<Order> for OrderRepository {
    fn get(&self, id: &OrderId) -> Option<Order> {
        self.inner.get(id)
    }

    fn list(&self) -> Vec<Order> {
        self.inner.list()
    }

    fn add(&mut self, order: Order) -> Result<Order, RepositoryError> {
        let order = self.inner.add(order)?;
        self.high_water = self.high_water.max(order.id);
        Ok(order)
    }

    /// Replace an order. A status change must follow the transition table.
    fn update(&mut self, order: Order) -> Result<Order, RepositoryError> {
        let current = self.inner.get(&order.id).ok_or(RepositoryError::NotFound)?;
        if !current.status.can_transition_to(order.status) {
            let refused = OrderError::InvalidTransition {
                id: order.id,
                from: current.status,
                to: order.status,
            };
            return Err(RepositoryError::Conflict(refused.to_string()));
        }
        self.inner.update(order)
    }

    fn delete(&mut self, id: &OrderId) -> Result<Order, RepositoryError> {
        self.inner.delete(id)
    }

    fn replace_all(&mut self, orders: Vec<Order>) -> Result<(), RepositoryError> {
        let imported_max = max_id(&orders);
        self.inner.replace_all(orders)?;
        self.high_water = self.high_water.max(imported_max);
        Ok(())
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

fn max_id(orders: &[Order]) -> OrderId {
    orders
        .iter()
        .map(|order| order.id)
        .max()
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::order::tests::sample_order;

    fn seeded() -> OrderRepository {
        let orders = (1001..=1007)
            .map(|id| sample_order(id, OrderStatus::Pending, 100))
            .collect();
        OrderRepository::from_orders(orders, OrderId::default()).unwrap()
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut repo = seeded();
        let placed = repo
            .insert_new(sample_order(0, OrderStatus::Pending, 100))
            .unwrap();
        assert_eq!(placed.id, OrderId::new(1008));

        repo.delete(&OrderId::new(1008)).unwrap();
        let next = repo
            .insert_new(sample_order(0, OrderStatus::Pending, 100))
            .unwrap();
        assert_eq!(next.id, OrderId::new(1009));
    }

    #[test]
    fn test_empty_repository_starts_at_one() {
        let mut repo = OrderRepository::new();
        let order = repo
            .insert_new(sample_order(0, OrderStatus::Pending, 1))
            .unwrap();
        assert_eq!(order.id, OrderId::new(1));
    }

    #[test]
    fn test_stored_high_water_survives_reload() {
        let orders = vec![sample_order(1001, OrderStatus::Pending, 1)];
        let repo = OrderRepository::from_orders(orders, OrderId::new(1010)).unwrap();
        assert_eq!(repo.next_id(), OrderId::new(1011));
    }

    #[test]
    fn test_replace_all_raises_mark() {
        let mut repo = seeded();
        repo.replace_all(vec![sample_order(2000, OrderStatus::Shipped, 1)])
            .unwrap();
        assert_eq!(repo.next_id(), OrderId::new(2001));

        repo.replace_all(Vec::new()).unwrap();
        assert_eq!(repo.next_id(), OrderId::new(2001));
    }

    #[test]
    fn test_update_status_follows_transition_table() {
        let mut repo = seeded();
        let id = OrderId::new(1001);

        let order = repo
            .update_status(id, OrderStatus::Processing, Some("Packed"))
            .unwrap();
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.notes.as_deref(), Some("Packed"));

        // Same status keeps notes when none are given.
        let order = repo.update_status(id, OrderStatus::Processing, None).unwrap();
        assert_eq!(order.notes.as_deref(), Some("Packed"));

        assert_eq!(
            repo.update_status(id, OrderStatus::Delivered, None),
            Err(OrderError::InvalidTransition {
                id,
                from: OrderStatus::Processing,
                to: OrderStatus::Delivered,
            })
        );
        assert_eq!(
            repo.get(&id).unwrap().status,
            OrderStatus::Processing
        );
    }

    #[test]
    fn test_update_cannot_bypass_transition_table() {
        let mut repo = seeded();
        let id = OrderId::new(1004);
        for status in [
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            repo.update_status(id, status, None).unwrap();
        }

        let mut reopened = repo.get(&id).unwrap();
        reopened.status = OrderStatus::Pending;
        assert!(matches!(
            repo.update(reopened),
            Err(RepositoryError::Conflict(_))
        ));
        assert_eq!(repo.get(&id).unwrap().status, OrderStatus::Delivered);

        // Changes that keep the status still go through.
        let mut edited = repo.get(&id).unwrap();
        edited.notes = Some("Signed by reception".to_owned());
        let edited = repo.update(edited).unwrap();
        assert_eq!(edited.status, OrderStatus::Delivered);
        assert_eq!(edited.notes.as_deref(), Some("Signed by reception"));

        let missing = sample_order(42, OrderStatus::Pending, 1);
        assert_eq!(repo.update(missing), Err(RepositoryError::NotFound));
    }

    #[test]
    fn test_cancelled_is_terminal() {
        let mut repo = seeded();
        let id = OrderId::new(1002);
        repo.update_status(id, OrderStatus::Cancelled, None).unwrap();
        assert!(matches!(
            repo.update_status(id, OrderStatus::Pending, None),
            Err(OrderError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_unknown_order() {
        let mut repo = seeded();
        assert_eq!(
            repo.update_tracking_number(OrderId::new(42), "TRK1"),
            Err(OrderError::NotFound(OrderId::new(42)))
        );
    }

    #[test]
    fn test_tracking_and_notes() {
        let mut repo = seeded();
        let id = OrderId::new(1003);
        let order = repo.update_tracking_number(id, "TRK123456789").unwrap();
        assert_eq!(order.tracking_number.as_deref(), Some("TRK123456789"));

        repo.update_notes(id, "Leave at door").unwrap();
        assert_eq!(repo.get(&id).unwrap().notes.as_deref(), Some("Leave at door"));
        repo.update_notes(id, "").unwrap();
        assert_eq!(repo.get(&id).unwrap().notes, None);
    }

    #[test]
    fn test_queries() {
        let mut repo = seeded();
        repo.update_status(OrderId::new(1001), OrderStatus::Processing, None)
            .unwrap();
        assert_eq!(repo.by_status(OrderStatus::Processing).len(), 1);
        assert_eq!(repo.by_status(OrderStatus::Pending).len(), 6);
        assert_eq!(repo.by_user(UserId::new(1)).len(), 7);
        assert!(repo.by_user(UserId::new(99)).is_empty());
        assert_eq!(repo.stats().total_orders, 7);
    }
}
