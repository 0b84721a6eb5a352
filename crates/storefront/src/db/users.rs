//! User repository.
//!
//! Usernames and email addresses are unique across all users; [`add`] and
//! [`update`] enforce both.
//!
//! [`add`]: Repository::add
//! [`update`]: Repository::update

use eshop_core::{Email, UserId};

use super::{Entity, MemoryRepository, Repository, RepositoryError};
use crate::models::user::User;

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &UserId {
        &self.id
    }
}

/// Repository for user accounts.
#[derive(Debug, Clone, Default)]
pub struct UserRepository {
    inner: MemoryRepository<User>,
}

impl UserRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` on duplicate ids.
    pub fn from_users(users: Vec<User>) -> Result<Self, RepositoryError> {
        Ok(Self {
            inner: MemoryRepository::from_entities(users)?,
        })
    }

    /// Get a user by their username.
    #[must_use]
    pub fn get_by_username(&self, username: &str) -> Option<User> {
        self.inner.find(|user| user.username == username)
    }

    /// Get a user by their email address.
    #[must_use]
    pub fn get_by_email(&self, email: &Email) -> Option<User> {
        self.inner.find(|user| user.email == *email)
    }

    /// Id for the next new user: highest existing id plus one.
    #[must_use]
    pub fn next_id(&self) -> UserId {
        self.inner
            .list()
            .iter()
            .map(|user| user.id)
            .max()
            .unwrap_or_default()
            .next()
    }

    fn check_unique(&self, candidate: &User) -> Result<(), RepositoryError> {
        let clash = self.inner.find(|user| {
            user.id != candidate.id
                && (user.username == candidate.username || user.email == candidate.email)
        });
        match clash {
            Some(existing) if existing.username == candidate.username => Err(
                RepositoryError::Conflict("username already exists".to_owned()),
            ),
            Some(_) => Err(RepositoryError::Conflict("email already exists".to_owned())),
            None => Ok(()),
        }
    }
}

impl Repository<User> for UserRepository {
    fn get(&self, id: &UserId) -> Option<User> {
        self.inner.get(id)
    }

    fn list(&self) -> Vec<User> {
        self.inner.list()
    }

    fn add(&mut self, user: User) -> Result<User, RepositoryError> {
        self.check_unique(&user)?;
        self.inner.add(user)
    }

    fn update(&mut self, user: User) -> Result<User, RepositoryError> {
        self.check_unique(&user)?;
        self.inner.update(user)
    }

    fn delete(&mut self, id: &UserId) -> Result<User, RepositoryError> {
        self.inner.delete(id)
    }

    fn replace_all(&mut self, users: Vec<User>) -> Result<(), RepositoryError> {
        self.inner.replace_all(users)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}
