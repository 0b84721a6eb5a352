//! In-process repositories for products, users and orders.
//!
//! Collections are never handed out by reference: every read returns owned
//! clones, and every write goes through [`Repository`]. The [`crate::state`]
//! facade mirrors each collection into the persistent key/value store after
//! it changes.
//!
//! # Repositories
//!
//! - [`products::ProductRepository`] - catalog
//! - [`users::UserRepository`] - accounts, lookups by username and email
//! - [`orders::OrderRepository`] - orders with a never-reused id sequence

pub mod orders;
pub mod products;
pub mod users;

use std::fmt;

use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Stored data is inconsistent (e.g. duplicate ids in a loaded collection).
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate id or username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// A record with a unique id.
pub trait Entity: Clone {
    type Id: Clone + Eq + fmt::Debug + fmt::Display;

    fn id(&self) -> &Self::Id;
}

/// Basic CRUD over a collection of entities.
pub trait Repository<T: Entity> {
    /// Entity with `id`, if present.
    fn get(&self, id: &T::Id) -> Option<T>;

    /// All entities in insertion order.
    fn list(&self) -> Vec<T>;

    /// Insert a new entity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an entity with the same id exists.
    fn add(&mut self, entity: T) -> Result<T, RepositoryError>;

    /// Replace the entity with the same id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no entity has that id.
    fn update(&mut self, entity: T) -> Result<T, RepositoryError>;

    /// Remove and return the entity with `id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no entity has that id.
    fn delete(&mut self, id: &T::Id) -> Result<T, RepositoryError>;

    /// Replace the whole collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if `entities` contains duplicate
    /// ids; the collection is left unchanged.
    fn replace_all(&mut self, entities: Vec<T>) -> Result<(), RepositoryError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Insertion-ordered in-memory store.
#[derive(Debug, Clone)]
pub struct MemoryRepository<T> {
    items: Vec<T>,
}

impl<T> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> MemoryRepository<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository from stored entities.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if two entities share an id.
    pub fn from_entities(entities: Vec<T>) -> Result<Self, RepositoryError> {
        let mut repo = Self::new();
        repo.replace_all(entities).map_err(|e| match e {
            RepositoryError::Conflict(msg) => RepositoryError::DataCorruption(msg),
            other => other,
        })?;
        Ok(repo)
    }

    /// Entities matching `predicate`, in insertion order.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.items
            .iter()
            .filter(|item| predicate(item))
            .cloned()
            .collect()
    }

    /// First entity matching `predicate`.
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.items.iter().find(|item| predicate(item)).cloned()
    }

    /// Apply `change` to the entity with `id` and return the updated copy.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no entity has that id, or the
    /// error returned by `change` (the entity is then left unchanged).
    pub fn modify<E>(
        &mut self,
        id: &T::Id,
        change: impl FnOnce(&mut T) -> Result<(), E>,
    ) -> Result<T, E>
    where
        E: From<RepositoryError>,
    {
        let slot = self
            .items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or(RepositoryError::NotFound)?;
        let mut next = slot.clone();
        change(&mut next)?;
        *slot = next.clone();
        Ok(next)
    }

    fn position(&self, id: &T::Id) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }
}

impl<T: Entity> Repository<T> for MemoryRepository<T> {
    fn get(&self, id: &T::Id) -> Option<T> {
        self.items.iter().find(|item| item.id() == id).cloned()
    }

    fn list(&self) -> Vec<T> {
        self.items.clone()
    }

    fn add(&mut self, entity: T) -> Result<T, RepositoryError> {
        if self.position(entity.id()).is_some() {
            return Err(RepositoryError::Conflict(format!(
                "id {} already exists",
                entity.id()
            )));
        }
        self.items.push(entity.clone());
        Ok(entity)
    }

    fn update(&mut self, entity: T) -> Result<T, RepositoryError> {
        let slot = self
            .items
            .iter_mut()
            .find(|item| item.id() == entity.id())
            .ok_or(RepositoryError::NotFound)?;
        *slot = entity.clone();
        Ok(entity)
    }

    fn delete(&mut self, id: &T::Id) -> Result<T, RepositoryError> {
        let index = self.position(id).ok_or(RepositoryError::NotFound)?;
        Ok(self.items.remove(index))
    }

    fn replace_all(&mut self, entities: Vec<T>) -> Result<(), RepositoryError> {
        for (i, entity) in entities.iter().enumerate() {
            if entities
                .iter()
                .skip(i + 1)
                .any(|other| other.id() == entity.id())
            {
                return Err(RepositoryError::Conflict(format!(
                    "duplicate id {}",
                    entity.id()
                )));
            }
        }
        self.items = entities;
        Ok(())
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Item {
        id: u32,
        label: &'static str,
    }

    impl Entity for Item {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.id
        }
    }

    fn item(id: u32, label: &'static str) -> Item {
        Item { id, label }
    }

    #[test]
    fn test_crud() {
        let mut repo = MemoryRepository::new();
        repo.add(item(1, "a")).unwrap();
        repo.add(item(2, "b")).unwrap();
        assert_eq!(repo.len(), 2);

        assert!(matches!(
            repo.add(item(1, "dup")),
            Err(RepositoryError::Conflict(_))
        ));

        repo.update(item(2, "b2")).unwrap();
        assert_eq!(repo.get(&2).unwrap().label, "b2");
        assert_eq!(repo.update(item(9, "x")), Err(RepositoryError::NotFound));

        assert_eq!(repo.delete(&1).unwrap().label, "a");
        assert_eq!(repo.delete(&1), Err(RepositoryError::NotFound));
        assert_eq!(repo.list(), vec![item(2, "b2")]);
    }

    #[test]
    fn test_reads_are_copies() {
        let mut repo = MemoryRepository::new();
        repo.add(item(1, "a")).unwrap();
        let mut copy = repo.get(&1).unwrap();
        copy.label = "changed";
        assert_eq!(repo.get(&1).unwrap().label, "a");
    }

    #[test]
    fn test_replace_all_rejects_duplicates() {
        let mut repo = MemoryRepository::new();
        repo.add(item(1, "a")).unwrap();
        assert!(
            repo.replace_all(vec![item(5, "x"), item(5, "y")])
                .is_err()
        );
        assert_eq!(repo.list(), vec![item(1, "a")]);

        assert!(matches!(
            MemoryRepository::from_entities(vec![item(3, "x"), item(3, "y")]),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_modify_leaves_entity_on_error() {
        let mut repo = MemoryRepository::new();
        repo.add(item(1, "a")).unwrap();

        let result: Result<Item, RepositoryError> = repo.modify(&1, |it| {
            it.label = "changed";
            Err(RepositoryError::Conflict("nope".to_owned()))
        });
        assert!(result.is_err());
        assert_eq!(repo.get(&1).unwrap().label, "a");

        let updated: Result<Item, RepositoryError> = repo.modify(&1, |it| {
            it.label = "ok";
            Ok(())
        });
        assert_eq!(updated.unwrap().label, "ok");
    }
}
